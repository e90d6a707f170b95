// src/db/users.rs
use crate::db::connection::Database;
use crate::errors::ServerError;
use chrono::Utc;
use rusqlite::params;

/// Registers a user record mirrored from the identity provider. Account
/// management itself lives outside this server.
pub fn create_user(db: &Database, email: &str, name: &str, role: &str) -> Result<i64, ServerError> {
    let now = Utc::now().timestamp_millis();

    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO users (email, name, role, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![email, name, role, now],
        )
        .map_err(|e| ServerError::DbError(format!("create user failed: {e}")))?;

        Ok(conn.last_insert_rowid())
    })
}
