//! Database migrations
//!
//! Migrations are plain SQL applied in sequence. Each applied version is
//! recorded in the `_migrations` table so reopening an up-to-date database
//! is a no-op.

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::info;

/// Latest schema version
pub const CURRENT_VERSION: i64 = 2;

const CREATE_MIGRATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS _migrations (
    version INTEGER PRIMARY KEY,
    applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#;

/// Migration 1: users, sessions, and reservations
const MIGRATION_V1: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('client', 'trainer', 'manager')),
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_users_role ON users(role);

CREATE TABLE IF NOT EXISTS sessions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL CHECK (kind IN ('group', 'personal')),
    name TEXT,
    description TEXT,
    difficulty TEXT CHECK (difficulty IS NULL OR difficulty IN ('easy', 'medium', 'hard')),
    price REAL,
    trainer_id INTEGER NOT NULL REFERENCES users(id),
    start_time TIMESTAMP NOT NULL,
    duration_min INTEGER NOT NULL CHECK (duration_min > 0),
    capacity INTEGER NOT NULL CHECK (capacity > 0),
    status TEXT NOT NULL DEFAULT 'ACTIVE' CHECK (status IN ('ACTIVE', 'CANCELLED')),
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE INDEX IF NOT EXISTS idx_sessions_start_time ON sessions(start_time);
CREATE INDEX IF NOT EXISTS idx_sessions_trainer_id ON sessions(trainer_id);

CREATE TABLE IF NOT EXISTS reservations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    client_id INTEGER NOT NULL REFERENCES users(id),
    session_id INTEGER NOT NULL REFERENCES sessions(id),
    created_at TIMESTAMP NOT NULL,
    status TEXT NOT NULL DEFAULT 'ACTIVE' CHECK (status IN ('ACTIVE', 'CANCELLED'))
);

CREATE INDEX IF NOT EXISTS idx_reservations_session_id ON reservations(session_id);
CREATE INDEX IF NOT EXISTS idx_reservations_client_id ON reservations(client_id);
"#;

/// Migration 2: uniqueness backstop for active bookings.
///
/// The partial unique index admits at most one ACTIVE reservation per
/// (client, session) pair while leaving cancelled history rows free to
/// accumulate.
const MIGRATION_V2: &str = r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_reservations_active_pair
    ON reservations(client_id, session_id) WHERE status = 'ACTIVE';

CREATE INDEX IF NOT EXISTS idx_reservations_session_status
    ON reservations(session_id, status);
"#;

/// Schema version report
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    pub current_version: i64,
    pub latest_version: i64,
    pub needs_migration: bool,
}

async fn current_version(pool: &SqlitePool) -> Result<i64> {
    // MAX over an empty table yields a single NULL row
    let row: (Option<i64>,) = sqlx::query_as("SELECT MAX(version) FROM _migrations")
        .fetch_one(pool)
        .await
        .context("Failed to read schema version")?;
    Ok(row.0.unwrap_or(0))
}

async fn apply(pool: &SqlitePool, version: i64, sql: &str) -> Result<()> {
    sqlx::raw_sql(sql)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to apply migration {}", version))?;
    sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await
        .with_context(|| format!("Failed to record migration {}", version))?;
    info!(version, "Applied database migration");
    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    sqlx::raw_sql(CREATE_MIGRATIONS_TABLE)
        .execute(pool)
        .await
        .context("Failed to create migrations table")?;

    let version = current_version(pool).await?;

    if version < 1 {
        apply(pool, 1, MIGRATION_V1).await?;
    }
    if version < 2 {
        apply(pool, 2, MIGRATION_V2).await?;
    }

    Ok(())
}

/// Report where the schema stands relative to the latest migration
pub async fn migration_status(pool: &SqlitePool) -> Result<MigrationStatus> {
    sqlx::raw_sql(CREATE_MIGRATIONS_TABLE)
        .execute(pool)
        .await
        .context("Failed to create migrations table")?;
    let version = current_version(pool).await?;
    Ok(MigrationStatus {
        current_version: version,
        latest_version: CURRENT_VERSION,
        needs_migration: version < CURRENT_VERSION,
    })
}
