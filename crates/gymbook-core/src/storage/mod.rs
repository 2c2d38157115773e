//! Storage layer - SQLite persistence behind the booking store trait
//!
//! # Architecture
//!
//! - `database`: connection pool, pragmas, and lifecycle
//! - `migrations`: versioned schema migrations
//! - `store`: the `BookingStore` contract services depend on
//! - `sqlite`: the SQLite-backed implementation

pub mod database;
pub mod migrations;
pub mod sqlite;
pub mod store;

pub use database::{Database, DatabaseConfig, default_database_path};
pub use migrations::{CURRENT_VERSION, MigrationStatus, migration_status, run_migrations};
pub use sqlite::SqliteStore;
pub use store::BookingStore;
