//! Store queries for the Scolaris backend

pub mod admins;
pub mod requests;
pub mod students;
