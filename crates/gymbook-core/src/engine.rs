//! Reservation engine
//!
//! The only writer of reservation rows. Booking runs its checks and the
//! insert under a per-session lock so two concurrent callers cannot both
//! take the last slot; bookings on different sessions proceed in parallel.
//! Cancellation is a single-row status flip and takes no lock.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::locking::SessionLocks;
use crate::domain::reservation::{ClientReservation, Participant, ReservationStatus};
use crate::domain::session::SessionStatus;
use crate::error::{Error, Result};
use crate::storage::BookingStore;

/// Service enforcing the booking invariants
#[derive(Clone)]
pub struct ReservationEngine {
    store: Arc<dyn BookingStore>,
    locks: Arc<SessionLocks>,
}

impl ReservationEngine {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self {
            store,
            locks: Arc::new(SessionLocks::new()),
        }
    }

    /// Book a session for a client and return the new reservation id.
    ///
    /// Under the session's lock, in order: resolve the session and require
    /// it ACTIVE, reject a duplicate active booking, reject a full session,
    /// then insert. Every check reads fresh store state, so the capacity
    /// ceiling holds under concurrency.
    pub async fn create_reservation(&self, client_id: i64, session_id: i64) -> Result<i64> {
        let _guard = self.locks.acquire(session_id).await;

        let session = self
            .store
            .session_by_id(session_id)
            .await?
            .ok_or(Error::InvalidSession)?;
        if session.status != SessionStatus::Active {
            debug!(client_id, session_id, "Booking rejected: session not active");
            return Err(Error::InvalidSession);
        }

        if self
            .store
            .active_reservation(client_id, session_id)
            .await?
            .is_some()
        {
            debug!(client_id, session_id, "Booking rejected: duplicate");
            return Err(Error::DuplicateBooking);
        }

        let reserved = self.store.active_reservation_count(session_id).await?;
        if reserved >= session.capacity {
            debug!(client_id, session_id, reserved, "Booking rejected: session full");
            return Err(Error::CapacityExceeded);
        }

        let reservation_id = self.store.insert_reservation(client_id, session_id).await?;
        info!(reservation_id, client_id, session_id, "Created reservation");
        Ok(reservation_id)
    }

    /// Cancel the client's own active reservation for a session.
    ///
    /// Fails with `NotFound` when the client holds no active reservation
    /// there. The row is kept as history; a later rebooking gets a fresh
    /// reservation id.
    pub async fn cancel_reservation(&self, client_id: i64, session_id: i64) -> Result<()> {
        let reservation = self
            .store
            .active_reservation(client_id, session_id)
            .await?
            .ok_or_else(|| Error::not_found("reservation for session", session_id))?;

        self.store
            .set_reservation_status(reservation.id, ReservationStatus::Cancelled)
            .await?;
        info!(reservation_id = reservation.id, client_id, session_id, "Cancelled reservation");
        Ok(())
    }

    /// Cancel a reservation by id, the administrative path.
    ///
    /// Idempotent: an already-cancelled reservation is a no-op success.
    pub async fn cancel_reservation_by_id(&self, reservation_id: i64) -> Result<()> {
        let reservation = self
            .store
            .reservation_by_id(reservation_id)
            .await?
            .ok_or_else(|| Error::not_found("reservation", reservation_id))?;

        if reservation.status == ReservationStatus::Cancelled {
            warn!(reservation_id, "Reservation already cancelled");
            return Ok(());
        }

        self.store
            .set_reservation_status(reservation_id, ReservationStatus::Cancelled)
            .await?;
        info!(reservation_id, "Cancelled reservation");
        Ok(())
    }

    /// Active roster for a session, ordered by last then first name
    pub async fn list_participants(&self, session_id: i64) -> Result<Vec<Participant>> {
        self.store.session_participants(session_id).await
    }

    /// A client's reservation history, cancelled rows included, ordered by
    /// session start time
    pub async fn reservations_for_client(&self, client_id: i64) -> Result<Vec<ClientReservation>> {
        self.store.reservations_for_client(client_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reservation::Reservation;
    use crate::domain::session::{Session, SessionKind, SessionRecord};
    use crate::domain::user::{Role, User};
    use crate::storage::{Database, SqliteStore};
    use async_trait::async_trait;
    use chrono::{NaiveDateTime, Utc};
    use std::sync::Mutex;

    // ========== Real-store tests ==========

    async fn setup() -> (Arc<SqliteStore>, ReservationEngine) {
        let db = Database::in_memory().await.unwrap();
        let store = Arc::new(SqliteStore::new(db.pool().clone()));
        let engine = ReservationEngine::new(store.clone());
        (store, engine)
    }

    async fn add_client(store: &SqliteStore, n: usize) -> i64 {
        store
            .insert_user("Client", "Test", &format!("client{}@gym.local", n), "hash", Role::Client)
            .await
            .unwrap()
    }

    async fn add_session(store: &SqliteStore, capacity: i64) -> i64 {
        let trainer = store
            .insert_user("Tomasz", "Tomasz", "trainer@gym.local", "hash", Role::Trainer)
            .await
            .unwrap();
        store
            .insert_session(&SessionRecord {
                kind: SessionKind::Group,
                name: Some("Yoga".to_string()),
                description: None,
                difficulty: None,
                price: Some(30.0),
                trainer_id: trainer,
                start_time: "2025-01-06T08:00:00".parse().unwrap(),
                duration_min: 60,
                capacity,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_reservation() {
        let (store, engine) = setup().await;
        let session = add_session(&store, 10).await;
        let client = add_client(&store, 1).await;

        let id = engine.create_reservation(client, session).await.unwrap();
        let reservation = store.reservation_by_id(id).await.unwrap().unwrap();
        assert!(reservation.is_active());
        assert_eq!(store.active_reservation_count(session).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_booking_rejected() {
        let (store, engine) = setup().await;
        let session = add_session(&store, 10).await;
        let client = add_client(&store, 1).await;

        engine.create_reservation(client, session).await.unwrap();
        let err = engine.create_reservation(client, session).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateBooking));
        assert_eq!(store.active_reservation_count(session).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_full_session_rejected() {
        let (store, engine) = setup().await;
        let session = add_session(&store, 1).await;
        let first = add_client(&store, 1).await;
        let second = add_client(&store, 2).await;

        engine.create_reservation(first, session).await.unwrap();
        let err = engine.create_reservation(second, session).await.unwrap_err();
        assert!(matches!(err, Error::CapacityExceeded));
    }

    #[tokio::test]
    async fn test_unknown_and_cancelled_sessions_rejected() {
        let (store, engine) = setup().await;
        let client = add_client(&store, 1).await;

        let err = engine.create_reservation(client, 999).await.unwrap_err();
        assert!(matches!(err, Error::InvalidSession));

        let session = add_session(&store, 10).await;
        store
            .set_session_status(session, SessionStatus::Cancelled)
            .await
            .unwrap();
        let err = engine.create_reservation(client, session).await.unwrap_err();
        assert!(matches!(err, Error::InvalidSession));
    }

    #[tokio::test]
    async fn test_cancel_then_rebook_gets_fresh_id() {
        let (store, engine) = setup().await;
        let session = add_session(&store, 10).await;
        let client = add_client(&store, 1).await;

        let first = engine.create_reservation(client, session).await.unwrap();
        engine.cancel_reservation(client, session).await.unwrap();
        assert_eq!(store.active_reservation_count(session).await.unwrap(), 0);

        let second = engine.create_reservation(client, session).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_cancel_without_active_reservation() {
        let (store, engine) = setup().await;
        let session = add_session(&store, 10).await;
        let client = add_client(&store, 1).await;

        let err = engine.cancel_reservation(client, session).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_cancel_by_id_is_idempotent() {
        let (store, engine) = setup().await;
        let session = add_session(&store, 10).await;
        let client = add_client(&store, 1).await;

        let id = engine.create_reservation(client, session).await.unwrap();
        engine.cancel_reservation_by_id(id).await.unwrap();
        engine.cancel_reservation_by_id(id).await.unwrap();

        let reservation = store.reservation_by_id(id).await.unwrap().unwrap();
        assert_eq!(reservation.status, ReservationStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_by_id_unknown() {
        let (_store, engine) = setup().await;
        let err = engine.cancel_reservation_by_id(424242).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_bookings_respect_capacity() {
        let (store, engine) = setup().await;
        let capacity = 3;
        let session = add_session(&store, capacity).await;

        let mut clients = Vec::new();
        for n in 0..8 {
            clients.push(add_client(&store, n).await);
        }

        let mut handles = Vec::new();
        for client in clients {
            let engine = engine.clone();
            handles.push(tokio::spawn(async move {
                engine.create_reservation(client, session).await
            }));
        }

        let mut successes = 0;
        let mut full = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(Error::CapacityExceeded) => full += 1,
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(successes, capacity);
        assert_eq!(full, 8 - capacity);
        assert_eq!(
            store.active_reservation_count(session).await.unwrap(),
            capacity
        );
    }

    // ========== Stub-store tests pinning the check order ==========

    struct StubStore {
        session: Option<Session>,
        has_duplicate: bool,
        active_count: i64,
        calls: Mutex<Vec<&'static str>>,
    }

    impl StubStore {
        fn new(session: Option<Session>, has_duplicate: bool, active_count: i64) -> Arc<Self> {
            Arc::new(Self {
                session,
                has_duplicate,
                active_count,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn log(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().unwrap().clone()
        }
    }

    fn stub_session(capacity: i64) -> Session {
        Session {
            id: 1,
            kind: SessionKind::Group,
            name: Some("Stub".to_string()),
            description: None,
            difficulty: None,
            price: None,
            trainer_id: 1,
            start_time: "2025-01-06T08:00:00".parse().unwrap(),
            duration_min: 60,
            capacity,
            status: SessionStatus::Active,
            created_at: Utc::now(),
        }
    }

    #[async_trait]
    impl BookingStore for StubStore {
        async fn session_by_id(&self, _session_id: i64) -> Result<Option<Session>> {
            self.log("session_by_id");
            Ok(self.session.clone())
        }

        async fn active_reservation(
            &self,
            client_id: i64,
            session_id: i64,
        ) -> Result<Option<Reservation>> {
            self.log("active_reservation");
            Ok(self.has_duplicate.then(|| Reservation {
                id: 1,
                client_id,
                session_id,
                created_at: Utc::now(),
                status: ReservationStatus::Active,
            }))
        }

        async fn active_reservation_count(&self, _session_id: i64) -> Result<i64> {
            self.log("active_reservation_count");
            Ok(self.active_count)
        }

        async fn insert_reservation(&self, _client_id: i64, _session_id: i64) -> Result<i64> {
            self.log("insert_reservation");
            Ok(99)
        }

        async fn insert_user(
            &self,
            _first_name: &str,
            _last_name: &str,
            _email: &str,
            _password_hash: &str,
            _role: Role,
        ) -> Result<i64> {
            unimplemented!()
        }

        async fn user_by_id(&self, _user_id: i64) -> Result<Option<User>> {
            unimplemented!()
        }

        async fn user_by_email(&self, _email: &str) -> Result<Option<User>> {
            unimplemented!()
        }

        async fn update_user(&self, _user: &User) -> Result<()> {
            unimplemented!()
        }

        async fn users_by_role(&self, _role: Role) -> Result<Vec<User>> {
            unimplemented!()
        }

        async fn insert_session(&self, _record: &SessionRecord) -> Result<i64> {
            unimplemented!()
        }

        async fn update_session(&self, _session: &Session) -> Result<()> {
            unimplemented!()
        }

        async fn set_session_status(&self, _session_id: i64, _status: SessionStatus) -> Result<()> {
            unimplemented!()
        }

        async fn session_exists(&self, _name: &str, _start_time: NaiveDateTime) -> Result<bool> {
            unimplemented!()
        }

        async fn sessions_in_range(
            &self,
            _from: NaiveDateTime,
            _to: NaiveDateTime,
        ) -> Result<Vec<Session>> {
            unimplemented!()
        }

        async fn sessions_for_trainer(&self, _trainer_id: i64) -> Result<Vec<Session>> {
            unimplemented!()
        }

        async fn reservation_by_id(&self, _reservation_id: i64) -> Result<Option<Reservation>> {
            unimplemented!()
        }

        async fn set_reservation_status(
            &self,
            _reservation_id: i64,
            _status: ReservationStatus,
        ) -> Result<()> {
            unimplemented!()
        }

        async fn session_participants(&self, _session_id: i64) -> Result<Vec<Participant>> {
            unimplemented!()
        }

        async fn reservations_for_client(&self, _client_id: i64) -> Result<Vec<ClientReservation>> {
            unimplemented!()
        }
    }

    #[tokio::test]
    async fn test_booking_checks_run_in_order() {
        let stub = StubStore::new(Some(stub_session(5)), false, 0);
        let engine = ReservationEngine::new(stub.clone());

        let id = engine.create_reservation(7, 1).await.unwrap();
        assert_eq!(id, 99);
        assert_eq!(
            stub.calls(),
            vec![
                "session_by_id",
                "active_reservation",
                "active_reservation_count",
                "insert_reservation"
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicate_wins_over_full_session() {
        // both rejections apply; the duplicate must be reported
        let stub = StubStore::new(Some(stub_session(1)), true, 1);
        let engine = ReservationEngine::new(stub.clone());

        let err = engine.create_reservation(7, 1).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateBooking));
        assert_eq!(stub.calls(), vec!["session_by_id", "active_reservation"]);
    }

    #[tokio::test]
    async fn test_full_session_stops_before_insert() {
        let stub = StubStore::new(Some(stub_session(1)), false, 1);
        let engine = ReservationEngine::new(stub.clone());

        let err = engine.create_reservation(7, 1).await.unwrap_err();
        assert!(matches!(err, Error::CapacityExceeded));
        assert_eq!(
            stub.calls(),
            vec!["session_by_id", "active_reservation", "active_reservation_count"]
        );
    }
}
