//! Domain model for the booking core
//!
//! # Architecture
//!
//! - `user`: accounts, roles, and the authenticated principal
//! - `session`: bookable sessions and their lifecycle
//! - `reservation`: client bindings to sessions plus read-side projections
//! - `locking`: per-session locks serializing booking decisions

pub mod locking;
pub mod reservation;
pub mod session;
pub mod user;

pub use locking::SessionLocks;
pub use reservation::{ClientReservation, Participant, Reservation, ReservationStatus};
pub use session::{
    Difficulty, NewSession, Session, SessionAvailability, SessionChanges, SessionKind,
    SessionRecord, SessionStatus,
};
pub use user::{Principal, ProfileChanges, Role, User};
