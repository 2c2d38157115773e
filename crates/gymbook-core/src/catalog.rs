//! Session catalog service
//!
//! Owns the session lifecycle (create, edit, cancel) and the read-side
//! schedule queries. Every listing annotates sessions with booking counts
//! computed at read time; nothing here mutates reservations.

use std::sync::Arc;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};
use tracing::{info, warn};

use crate::domain::session::{
    NewSession, Session, SessionAvailability, SessionChanges, SessionStatus,
};
use crate::domain::user::Role;
use crate::error::{Error, Result};
use crate::storage::BookingStore;
use crate::validators::SessionValidator;

/// Service owning session lifecycle and schedule queries
#[derive(Clone)]
pub struct SessionCatalog {
    store: Arc<dyn BookingStore>,
}

impl SessionCatalog {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// Create a session.
    ///
    /// Every field is validated before anything is written: the kind and
    /// difficulty against their allowed values, the start as a parsable
    /// timestamp, duration and capacity strictly positive, the trainer as
    /// an existing user holding the trainer role, and a supplied name as
    /// not colliding with an existing (name, start) pair.
    pub async fn create_session(&self, new: &NewSession) -> Result<i64> {
        let record = SessionValidator::validate_create(new)?;

        let trainer = self
            .store
            .user_by_id(record.trainer_id)
            .await?
            .ok_or_else(|| {
                Error::validation(
                    "trainer_id",
                    format!("No user with id {}", record.trainer_id),
                )
            })?;
        if trainer.role != Role::Trainer {
            return Err(Error::validation(
                "trainer_id",
                format!("User {} is not a trainer", record.trainer_id),
            ));
        }

        if let Some(name) = &record.name {
            if self.store.session_exists(name, record.start_time).await? {
                return Err(Error::validation(
                    "name",
                    "A session with this name and start time already exists",
                ));
            }
        }

        let id = self.store.insert_session(&record).await?;
        info!(session_id = id, kind = %record.kind, start = %record.start_time, "Created session");
        Ok(id)
    }

    /// Apply a partial edit to a session.
    ///
    /// Supplied fields are validated, then written together; unsupplied
    /// fields are left untouched. An empty change set is rejected before
    /// the session is even loaded. Shrinking capacity below the current
    /// booking count is allowed; existing reservations stand and the
    /// session simply shows no availability.
    pub async fn edit_session(&self, session_id: i64, changes: &SessionChanges) -> Result<()> {
        if changes.is_empty() {
            return Err(Error::NoChanges);
        }

        let mut session = self
            .store
            .session_by_id(session_id)
            .await?
            .ok_or_else(|| Error::not_found("session", session_id))?;

        if let Some(name) = &changes.name {
            SessionValidator::validate_name(name)?;
            session.name = Some(name.clone());
        }
        if let Some(description) = &changes.description {
            SessionValidator::validate_description(description)?;
            session.description = Some(description.clone());
        }
        if let Some(difficulty) = &changes.difficulty {
            session.difficulty = Some(SessionValidator::validate_difficulty(difficulty)?);
        }
        if let Some(price) = changes.price {
            SessionValidator::validate_price(price)?;
            session.price = Some(price);
        }
        if let Some(start) = &changes.start_time {
            session.start_time = SessionValidator::validate_start_time(start)?;
        }
        if let Some(duration) = changes.duration_min {
            SessionValidator::validate_duration(duration)?;
            session.duration_min = duration;
        }
        if let Some(capacity) = changes.capacity {
            SessionValidator::validate_capacity(capacity)?;
            session.capacity = capacity;
        }

        self.store.update_session(&session).await?;
        info!(session_id, "Updated session");
        Ok(())
    }

    /// Cancel a session.
    ///
    /// Idempotent: cancelling an already-cancelled session is a no-op.
    /// Existing reservations are left untouched so history survives; the
    /// status flip alone freezes new bookings.
    pub async fn cancel_session(&self, session_id: i64) -> Result<()> {
        let session = self
            .store
            .session_by_id(session_id)
            .await?
            .ok_or_else(|| Error::not_found("session", session_id))?;

        if session.status == SessionStatus::Cancelled {
            warn!(session_id, "Session already cancelled");
            return Ok(());
        }

        self.store
            .set_session_status(session_id, SessionStatus::Cancelled)
            .await?;
        info!(session_id, "Cancelled session");
        Ok(())
    }

    /// Open slots remaining on a session; 0 for an unknown session.
    ///
    /// Never negative, even when capacity was shrunk below the count of
    /// active reservations.
    pub async fn available_slots(&self, session_id: i64) -> Result<i64> {
        let Some(session) = self.store.session_by_id(session_id).await? else {
            return Ok(0);
        };
        let reserved = self.store.active_reservation_count(session_id).await?;
        Ok((session.capacity - reserved).max(0))
    }

    /// Sessions starting on one day, ordered by start time
    pub async fn sessions_for_date(&self, date: NaiveDate) -> Result<Vec<SessionAvailability>> {
        let from = date.and_time(NaiveTime::MIN);
        let sessions = self.store.sessions_in_range(from, from + Duration::days(1)).await?;
        self.annotate(sessions).await
    }

    /// Sessions in the week starting at `monday`, ordered by start time
    pub async fn sessions_for_week(&self, monday: NaiveDate) -> Result<Vec<SessionAvailability>> {
        let from = monday.and_time(NaiveTime::MIN);
        let sessions = self.store.sessions_in_range(from, from + Duration::days(7)).await?;
        self.annotate(sessions).await
    }

    /// Sessions run by one trainer, ordered by start time
    pub async fn sessions_for_trainer(&self, trainer_id: i64) -> Result<Vec<SessionAvailability>> {
        let sessions = self.store.sessions_for_trainer(trainer_id).await?;
        self.annotate(sessions).await
    }

    /// A week's sessions bucketed by weekday, Monday first
    pub async fn week_schedule(&self, monday: NaiveDate) -> Result<Vec<Vec<SessionAvailability>>> {
        let mut days: Vec<Vec<SessionAvailability>> = vec![Vec::new(); 7];
        for slot in self.sessions_for_week(monday).await? {
            let day = slot.session.start_time.weekday().num_days_from_monday() as usize;
            days[day].push(slot);
        }
        Ok(days)
    }

    async fn annotate(&self, sessions: Vec<Session>) -> Result<Vec<SessionAvailability>> {
        let mut annotated = Vec::with_capacity(sessions.len());
        for session in sessions {
            let reserved = self.store.active_reservation_count(session.id).await?;
            let available = (session.capacity - reserved).max(0);
            annotated.push(SessionAvailability {
                session,
                reserved,
                available,
            });
        }
        Ok(annotated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Database, SqliteStore};

    async fn setup() -> (Arc<SqliteStore>, SessionCatalog) {
        let db = Database::in_memory().await.unwrap();
        let store = Arc::new(SqliteStore::new(db.pool().clone()));
        let catalog = SessionCatalog::new(store.clone());
        (store, catalog)
    }

    async fn add_trainer(store: &SqliteStore) -> i64 {
        store
            .insert_user("Tomasz", "Tomasz", "tomasz@gym.local", "hash", Role::Trainer)
            .await
            .unwrap()
    }

    fn new_session(trainer_id: i64, start: &str) -> NewSession {
        NewSession {
            kind: "group".to_string(),
            trainer_id,
            start_time: start.to_string(),
            duration_min: 60,
            capacity: 10,
            name: Some("Yoga".to_string()),
            description: None,
            difficulty: Some("easy".to_string()),
            price: Some(30.0),
        }
    }

    #[tokio::test]
    async fn test_create_session() {
        let (store, catalog) = setup().await;
        let trainer = add_trainer(&store).await;

        let id = catalog
            .create_session(&new_session(trainer, "2025-01-06T08:00:00"))
            .await
            .unwrap();
        let session = store.session_by_id(id).await.unwrap().unwrap();
        assert_eq!(session.name.as_deref(), Some("Yoga"));
        assert!(session.is_active());
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_trainer() {
        let (_store, catalog) = setup().await;
        let err = catalog
            .create_session(&new_session(42, "2025-01-06T08:00:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "trainer_id"));
    }

    #[tokio::test]
    async fn test_create_rejects_non_trainer_owner() {
        let (store, catalog) = setup().await;
        let client = store
            .insert_user("Anna", "Nowak", "anna@gym.local", "hash", Role::Client)
            .await
            .unwrap();
        let err = catalog
            .create_session(&new_session(client, "2025-01-06T08:00:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "trainer_id"));
    }

    #[tokio::test]
    async fn test_create_rejects_duplicate_name_and_start() {
        let (store, catalog) = setup().await;
        let trainer = add_trainer(&store).await;
        catalog
            .create_session(&new_session(trainer, "2025-01-06T08:00:00"))
            .await
            .unwrap();

        let err = catalog
            .create_session(&new_session(trainer, "2025-01-06T08:00:00"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "name"));

        // same name at another time is fine
        catalog
            .create_session(&new_session(trainer, "2025-01-06T18:00:00"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_capacity() {
        let (store, catalog) = setup().await;
        let trainer = add_trainer(&store).await;

        for capacity in [0, -1] {
            let mut new = new_session(trainer, "2025-01-06T08:00:00");
            new.capacity = capacity;
            let err = catalog.create_session(&new).await.unwrap_err();
            assert!(matches!(err, Error::Validation { ref field, .. } if field == "capacity"));
        }
    }

    #[tokio::test]
    async fn test_edit_session() {
        let (store, catalog) = setup().await;
        let trainer = add_trainer(&store).await;
        let id = catalog
            .create_session(&new_session(trainer, "2025-01-06T08:00:00"))
            .await
            .unwrap();

        let changes = SessionChanges {
            name: Some("Evening yoga".to_string()),
            capacity: Some(12),
            difficulty: Some("medium".to_string()),
            ..Default::default()
        };
        catalog.edit_session(id, &changes).await.unwrap();

        let session = store.session_by_id(id).await.unwrap().unwrap();
        assert_eq!(session.name.as_deref(), Some("Evening yoga"));
        assert_eq!(session.capacity, 12);
        // untouched fields survive
        assert_eq!(session.price, Some(30.0));
        assert_eq!(session.duration_min, 60);
    }

    #[tokio::test]
    async fn test_edit_empty_change_set() {
        let (store, catalog) = setup().await;
        let trainer = add_trainer(&store).await;
        let id = catalog
            .create_session(&new_session(trainer, "2025-01-06T08:00:00"))
            .await
            .unwrap();

        let err = catalog
            .edit_session(id, &SessionChanges::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoChanges));
    }

    #[tokio::test]
    async fn test_edit_unknown_session() {
        let (_store, catalog) = setup().await;
        let changes = SessionChanges {
            capacity: Some(5),
            ..Default::default()
        };
        let err = catalog.edit_session(99, &changes).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_edit_invalid_capacity_writes_nothing() {
        let (store, catalog) = setup().await;
        let trainer = add_trainer(&store).await;
        let id = catalog
            .create_session(&new_session(trainer, "2025-01-06T08:00:00"))
            .await
            .unwrap();

        let changes = SessionChanges {
            name: Some("Changed".to_string()),
            capacity: Some(-1),
            ..Default::default()
        };
        let err = catalog.edit_session(id, &changes).await.unwrap_err();
        assert!(matches!(err, Error::Validation { ref field, .. } if field == "capacity"));

        let session = store.session_by_id(id).await.unwrap().unwrap();
        assert_eq!(session.name.as_deref(), Some("Yoga"), "no partial write");
    }

    #[tokio::test]
    async fn test_cancel_session_is_idempotent() {
        let (store, catalog) = setup().await;
        let trainer = add_trainer(&store).await;
        let id = catalog
            .create_session(&new_session(trainer, "2025-01-06T08:00:00"))
            .await
            .unwrap();

        catalog.cancel_session(id).await.unwrap();
        catalog.cancel_session(id).await.unwrap();

        let session = store.session_by_id(id).await.unwrap().unwrap();
        assert_eq!(session.status, SessionStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_cancel_unknown_session() {
        let (_store, catalog) = setup().await;
        let err = catalog.cancel_session(123).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_available_slots() {
        let (store, catalog) = setup().await;
        let trainer = add_trainer(&store).await;
        let id = catalog
            .create_session(&new_session(trainer, "2025-01-06T08:00:00"))
            .await
            .unwrap();

        assert_eq!(catalog.available_slots(id).await.unwrap(), 10);

        let client = store
            .insert_user("Anna", "Nowak", "anna@gym.local", "hash", Role::Client)
            .await
            .unwrap();
        store.insert_reservation(client, id).await.unwrap();
        assert_eq!(catalog.available_slots(id).await.unwrap(), 9);

        assert_eq!(catalog.available_slots(999).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_shrunk_capacity_never_reports_negative() {
        let (store, catalog) = setup().await;
        let trainer = add_trainer(&store).await;
        let id = catalog
            .create_session(&new_session(trainer, "2025-01-06T08:00:00"))
            .await
            .unwrap();

        for n in 0..3 {
            let client = store
                .insert_user("C", "Lient", &format!("c{}@gym.local", n), "hash", Role::Client)
                .await
                .unwrap();
            store.insert_reservation(client, id).await.unwrap();
        }

        let changes = SessionChanges {
            capacity: Some(2),
            ..Default::default()
        };
        catalog.edit_session(id, &changes).await.unwrap();

        assert_eq!(catalog.available_slots(id).await.unwrap(), 0);
        assert_eq!(
            store.active_reservation_count(id).await.unwrap(),
            3,
            "existing reservations stand"
        );
    }

    #[tokio::test]
    async fn test_sessions_for_date() {
        let (store, catalog) = setup().await;
        let trainer = add_trainer(&store).await;
        catalog
            .create_session(&new_session(trainer, "2025-01-06T08:00:00"))
            .await
            .unwrap();
        let mut other = new_session(trainer, "2025-01-07T08:00:00");
        other.name = Some("Pilates".to_string());
        catalog.create_session(&other).await.unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let sessions = catalog.sessions_for_date(date).await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].session.name.as_deref(), Some("Yoga"));
        assert_eq!(sessions[0].available, 10);
    }

    #[tokio::test]
    async fn test_week_schedule_buckets_by_weekday() {
        let (store, catalog) = setup().await;
        let trainer = add_trainer(&store).await;
        // 2025-01-06 is a Monday
        catalog
            .create_session(&new_session(trainer, "2025-01-06T08:00:00"))
            .await
            .unwrap();
        let mut wednesday = new_session(trainer, "2025-01-08T10:00:00");
        wednesday.name = Some("Crossfit".to_string());
        catalog.create_session(&wednesday).await.unwrap();
        let mut outside = new_session(trainer, "2025-01-13T08:00:00");
        outside.name = Some("NextWeek".to_string());
        catalog.create_session(&outside).await.unwrap();

        let monday = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let days = catalog.week_schedule(monday).await.unwrap();
        assert_eq!(days.len(), 7);
        assert_eq!(days[0].len(), 1);
        assert_eq!(days[0][0].session.name.as_deref(), Some("Yoga"));
        assert_eq!(days[2].len(), 1);
        assert_eq!(days[2][0].session.name.as_deref(), Some("Crossfit"));
        assert!(days[1].is_empty());
        assert!(days[6].is_empty());
    }
}
