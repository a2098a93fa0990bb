//! Database initialization
//!
//! Opens (or creates) the SQLite database and ensures every table
//! exists. Table creation is idempotent; there is no migration
//! machinery beyond `CREATE TABLE IF NOT EXISTS`.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys (subject_results and document_requests cascade
    // from students)
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL allows concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    create_settings_table(&pool).await?;
    create_students_table(&pool).await?;
    create_subject_results_table(&pool).await?;
    create_admins_table(&pool).await?;
    create_document_requests_table(&pool).await?;

    Ok(pool)
}

async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_students_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS students (
            id TEXT PRIMARY KEY,
            student_number INTEGER NOT NULL UNIQUE,
            name TEXT NOT NULL DEFAULT '',
            given_name TEXT NOT NULL DEFAULT '',
            birth_date TEXT NOT NULL DEFAULT '',
            program TEXT NOT NULL DEFAULT '',
            academic_year TEXT NOT NULL DEFAULT '',
            email TEXT NOT NULL DEFAULT '',
            student_group TEXT NOT NULL DEFAULT '',
            level TEXT NOT NULL DEFAULT '',
            overall_average REAL NOT NULL DEFAULT 0,
            overall_result TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL DEFAULT '',
            updated_at TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_subject_results_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS subject_results (
            student_id TEXT NOT NULL REFERENCES students(id) ON DELETE CASCADE,
            slot INTEGER NOT NULL,
            subject_type TEXT NOT NULL DEFAULT '',
            code TEXT NOT NULL DEFAULT '',
            label TEXT NOT NULL DEFAULT '',
            grade REAL NOT NULL DEFAULT 0,
            outcome TEXT NOT NULL DEFAULT '',
            session TEXT NOT NULL DEFAULT '',
            jury_points REAL NOT NULL DEFAULT 0,
            PRIMARY KEY (student_id, slot)
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_admins_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS admins (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            name TEXT NOT NULL DEFAULT 'Administrator',
            created_at TEXT NOT NULL DEFAULT '',
            updated_at TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;
    Ok(())
}

async fn create_document_requests_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS document_requests (
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL REFERENCES students(id) ON DELETE CASCADE,
            document_type TEXT NOT NULL,
            custom_document_type TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            request_date TEXT NOT NULL DEFAULT '',
            completion_date TEXT,
            admin_notes TEXT NOT NULL DEFAULT '',
            rejection_reason TEXT,
            uploaded_filename TEXT,
            uploaded_original_name TEXT,
            uploaded_path TEXT,
            uploaded_size INTEGER,
            uploaded_at TEXT,
            created_at TEXT NOT NULL DEFAULT '',
            updated_at TEXT NOT NULL DEFAULT ''
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_document_requests_student_status \
         ON document_requests (student_id, status)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_document_requests_type \
         ON document_requests (document_type)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_document_requests_request_date \
         ON document_requests (request_date DESC)",
    )
    .execute(pool)
    .await?;

    Ok(())
}
