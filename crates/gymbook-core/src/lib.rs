//! Gymbook Core Library
//!
//! This crate provides the core functionality for Gymbook, including:
//! - Domain model (users, sessions, reservations)
//! - Session catalog (create, edit, cancel, schedule queries)
//! - Reservation engine (capacity-safe booking and cancellation)
//! - Identity gateway (registration, login, profile management)
//! - Storage (SQLite with versioned migrations)
//! - Seed data for a ready-to-use weekly schedule

pub mod catalog;
pub mod config;
pub mod domain;
pub mod engine;
pub mod error;
pub mod identity;
pub mod seed;
pub mod storage;
pub mod validators;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::SessionCatalog;
    pub use crate::config::Config;
    pub use crate::domain::{Principal, Role};
    pub use crate::engine::ReservationEngine;
    pub use crate::error::{Error, Result};
    pub use crate::identity::IdentityGateway;
    pub use crate::storage::{BookingStore, Database, SqliteStore};
}
