//! Version-tracked schema migrations for the libSQL backend.
//!
//! Each migration has a version and a list of statements. `run` checks the
//! current version and applies only the new ones, in order.

use libsql::Connection;

use crate::error::StoreError;

struct Migration {
    version: i64,
    name: &'static str,
    statements: &'static [&'static str],
}

/// All migrations in order. Add new versions to the end.
static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "users",
    statements: &[
        "CREATE TABLE IF NOT EXISTS users (
            phone TEXT PRIMARY KEY,
            name TEXT,
            country TEXT,
            age INTEGER,
            gender TEXT,
            language TEXT,
            onboarding_stage TEXT NOT NULL DEFAULT 'none',
            message_history TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_users_stage ON users(onboarding_stage)",
    ],
}];

fn query_err(e: libsql::Error) -> StoreError {
    StoreError::Query(e.to_string())
}

/// Run all pending migrations on the given connection.
pub async fn run(conn: &Connection) -> Result<(), StoreError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS _migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL
        )",
        (),
    )
    .await
    .map_err(query_err)?;

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM _migrations", ())
        .await
        .map_err(query_err)?;
    let current: i64 = match rows.next().await.map_err(query_err)? {
        Some(row) => row.get(0).map_err(query_err)?,
        None => 0,
    };

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        for statement in migration.statements {
            conn.execute(statement, ()).await.map_err(query_err)?;
        }
        conn.execute(
            "INSERT INTO _migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
            libsql::params![
                migration.version,
                migration.name,
                chrono::Utc::now().to_rfc3339()
            ],
        )
        .await
        .map_err(query_err)?;
        tracing::debug!(version = migration.version, name = migration.name, "Migration applied");
    }

    Ok(())
}
