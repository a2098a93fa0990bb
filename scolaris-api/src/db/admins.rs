//! Administrator store queries

use chrono::Utc;
use scolaris_common::db::Admin;
use scolaris_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use tracing::info;
use uuid::Uuid;

fn admin_from_row(row: &SqliteRow) -> Admin {
    Admin {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        name: row.get("name"),
    }
}

/// Login lookup; callers are expected to lowercase/trim the email first
pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<Admin>> {
    let row = sqlx::query("SELECT id, email, password_hash, name FROM admins WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|row| admin_from_row(&row)))
}

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> Result<Option<Admin>> {
    let row = sqlx::query("SELECT id, email, password_hash, name FROM admins WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(|row| admin_from_row(&row)))
}

/// Create or refresh an administrator account (startup seeding)
///
/// Idempotent on email: an existing account gets its password hash
/// replaced, which doubles as a recovery path.
pub async fn seed(pool: &SqlitePool, email: &str, password_hash: &str) -> Result<()> {
    let email = email.trim().to_lowercase();
    let now = Utc::now().to_rfc3339();

    let existing: Option<(String,)> = sqlx::query_as("SELECT id FROM admins WHERE email = ?")
        .bind(&email)
        .fetch_optional(pool)
        .await?;

    match existing {
        Some((id,)) => {
            sqlx::query("UPDATE admins SET password_hash = ?, updated_at = ? WHERE id = ?")
                .bind(password_hash)
                .bind(&now)
                .bind(&id)
                .execute(pool)
                .await?;
            info!("Refreshed admin account: {}", email);
        }
        None => {
            sqlx::query(
                "INSERT INTO admins (id, email, password_hash, name, created_at, updated_at) \
                 VALUES (?, ?, ?, 'Administrator', ?, ?)",
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&email)
            .bind(password_hash)
            .bind(&now)
            .bind(&now)
            .execute(pool)
            .await?;
            info!("Created admin account: {}", email);
        }
    }

    Ok(())
}
