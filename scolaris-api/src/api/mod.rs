//! HTTP API handlers for scolaris-api

pub mod admin;
pub mod auth;
pub mod health;
pub mod import;
pub mod requests;
pub mod students;

pub use auth::{admin_auth, student_auth};
pub use health::health_routes;
