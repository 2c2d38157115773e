//! Persistent store contract for the booking core
//!
//! The catalog, reservation engine, and identity gateway all consume this
//! trait rather than a concrete backend, so they can be exercised against
//! test doubles. The trait is object-safe; services hold an
//! `Arc<dyn BookingStore>`.

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::domain::reservation::{ClientReservation, Participant, Reservation, ReservationStatus};
use crate::domain::session::{Session, SessionRecord, SessionStatus};
use crate::domain::user::{Role, User};
use crate::error::Result;

/// Storage operations the booking core relies on
#[async_trait]
pub trait BookingStore: Send + Sync {
    // ========== Users ==========

    /// Insert a user and return the new id.
    ///
    /// A second insert with an email already on file fails with
    /// `Error::DuplicateEmail`.
    async fn insert_user(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<i64>;

    async fn user_by_id(&self, user_id: i64) -> Result<Option<User>>;

    async fn user_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Write back a user's editable columns (names, email, password hash)
    async fn update_user(&self, user: &User) -> Result<()>;

    async fn users_by_role(&self, role: Role) -> Result<Vec<User>>;

    // ========== Sessions ==========

    /// Insert a session and return the new id
    async fn insert_session(&self, record: &SessionRecord) -> Result<i64>;

    async fn session_by_id(&self, session_id: i64) -> Result<Option<Session>>;

    /// Write back a session's editable columns
    async fn update_session(&self, session: &Session) -> Result<()>;

    async fn set_session_status(&self, session_id: i64, status: SessionStatus) -> Result<()>;

    /// Whether any session already carries this (name, start) pair
    async fn session_exists(&self, name: &str, start_time: NaiveDateTime) -> Result<bool>;

    /// Sessions starting in `[from, to)`, ordered by start time
    async fn sessions_in_range(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Session>>;

    /// Sessions run by one trainer, ordered by start time
    async fn sessions_for_trainer(&self, trainer_id: i64) -> Result<Vec<Session>>;

    // ========== Reservations ==========

    /// Insert an ACTIVE reservation stamped with the current time.
    ///
    /// The active-pair unique index backs the duplicate check: a racing
    /// insert for the same (client, session) fails with
    /// `Error::DuplicateBooking`.
    async fn insert_reservation(&self, client_id: i64, session_id: i64) -> Result<i64>;

    async fn reservation_by_id(&self, reservation_id: i64) -> Result<Option<Reservation>>;

    /// The client's ACTIVE reservation for a session, if any
    async fn active_reservation(
        &self,
        client_id: i64,
        session_id: i64,
    ) -> Result<Option<Reservation>>;

    /// Count of ACTIVE reservations held against a session
    async fn active_reservation_count(&self, session_id: i64) -> Result<i64>;

    async fn set_reservation_status(
        &self,
        reservation_id: i64,
        status: ReservationStatus,
    ) -> Result<()>;

    /// Active roster for a session, ordered by last then first name
    async fn session_participants(&self, session_id: i64) -> Result<Vec<Participant>>;

    /// A client's full reservation history joined with session details,
    /// ordered by session start time
    async fn reservations_for_client(&self, client_id: i64) -> Result<Vec<ClientReservation>>;
}
