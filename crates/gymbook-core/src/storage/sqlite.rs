//! SQLite implementation of the booking store

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::SqlitePool;

use crate::domain::reservation::{ClientReservation, Participant, Reservation, ReservationStatus};
use crate::domain::session::{Difficulty, Session, SessionKind, SessionRecord, SessionStatus};
use crate::domain::user::{Role, User};
use crate::error::{Error, Result};
use crate::storage::store::BookingStore;

/// Booking store backed by a SQLite pool
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Map a unique-constraint violation to a domain conflict error
fn map_unique_violation(err: sqlx::Error, on_conflict: Error) -> Error {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return on_conflict;
        }
    }
    Error::Database(err)
}

// ========== Row types ==========

#[derive(sqlx::FromRow)]
struct UserRow {
    id: i64,
    first_name: String,
    last_name: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> Result<User> {
        let role = Role::from_str(&self.role)
            .ok_or_else(|| Error::Parse(format!("Unknown role in database: {}", self.role)))?;
        Ok(User {
            id: self.id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password_hash: self.password_hash,
            role,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    id: i64,
    kind: String,
    name: Option<String>,
    description: Option<String>,
    difficulty: Option<String>,
    price: Option<f64>,
    trainer_id: i64,
    start_time: NaiveDateTime,
    duration_min: i64,
    capacity: i64,
    status: String,
    created_at: DateTime<Utc>,
}

impl SessionRow {
    fn into_session(self) -> Result<Session> {
        let kind = SessionKind::from_str(&self.kind)
            .ok_or_else(|| Error::Parse(format!("Unknown session kind in database: {}", self.kind)))?;
        let difficulty = self
            .difficulty
            .map(|d| {
                Difficulty::from_str(&d)
                    .ok_or_else(|| Error::Parse(format!("Unknown difficulty in database: {}", d)))
            })
            .transpose()?;
        let status = SessionStatus::from_str(&self.status)
            .ok_or_else(|| Error::Parse(format!("Unknown session status in database: {}", self.status)))?;
        Ok(Session {
            id: self.id,
            kind,
            name: self.name,
            description: self.description,
            difficulty,
            price: self.price,
            trainer_id: self.trainer_id,
            start_time: self.start_time,
            duration_min: self.duration_min,
            capacity: self.capacity,
            status,
            created_at: self.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ReservationRow {
    id: i64,
    client_id: i64,
    session_id: i64,
    created_at: DateTime<Utc>,
    status: String,
}

impl ReservationRow {
    fn into_reservation(self) -> Result<Reservation> {
        let status = ReservationStatus::from_str(&self.status).ok_or_else(|| {
            Error::Parse(format!("Unknown reservation status in database: {}", self.status))
        })?;
        Ok(Reservation {
            id: self.id,
            client_id: self.client_id,
            session_id: self.session_id,
            created_at: self.created_at,
            status,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ParticipantRow {
    client_id: i64,
    first_name: String,
    last_name: String,
    email: String,
}

impl ParticipantRow {
    fn into_participant(self) -> Participant {
        Participant {
            client_id: self.client_id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ClientReservationRow {
    reservation_id: i64,
    reserved_at: DateTime<Utc>,
    status: String,
    session_id: i64,
    session_name: Option<String>,
    session_start: NaiveDateTime,
    session_duration_min: i64,
    session_status: String,
}

impl ClientReservationRow {
    fn into_client_reservation(self) -> Result<ClientReservation> {
        let status = ReservationStatus::from_str(&self.status).ok_or_else(|| {
            Error::Parse(format!("Unknown reservation status in database: {}", self.status))
        })?;
        let session_status = SessionStatus::from_str(&self.session_status).ok_or_else(|| {
            Error::Parse(format!("Unknown session status in database: {}", self.session_status))
        })?;
        Ok(ClientReservation {
            reservation_id: self.reservation_id,
            reserved_at: self.reserved_at,
            status,
            session_id: self.session_id,
            session_name: self.session_name,
            session_start: self.session_start,
            session_duration_min: self.session_duration_min,
            session_status,
        })
    }
}

// ========== Store implementation ==========

#[async_trait]
impl BookingStore for SqliteStore {
    async fn insert_user(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password_hash: &str,
        role: Role,
    ) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO users (first_name, last_name, email, password_hash, role)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(first_name)
        .bind(last_name)
        .bind(email)
        .bind(password_hash)
        .bind(role.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, Error::DuplicateEmail))?;
        Ok(result.last_insert_rowid())
    }

    async fn user_by_id(&self, user_id: i64) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, first_name, last_name, email, password_hash, role, created_at
             FROM users WHERE id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserRow::into_user).transpose()
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(
            "SELECT id, first_name, last_name, email, password_hash, role, created_at
             FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        row.map(UserRow::into_user).transpose()
    }

    async fn update_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            "UPDATE users SET first_name = ?, last_name = ?, email = ?, password_hash = ?
             WHERE id = ?",
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.id)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, Error::DuplicateEmail))?;
        Ok(())
    }

    async fn users_by_role(&self, role: Role) -> Result<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(
            "SELECT id, first_name, last_name, email, password_hash, role, created_at
             FROM users WHERE role = ? ORDER BY id",
        )
        .bind(role.as_str())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(UserRow::into_user).collect()
    }

    async fn insert_session(&self, record: &SessionRecord) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO sessions
                 (kind, name, description, difficulty, price, trainer_id,
                  start_time, duration_min, capacity, status)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(record.kind.as_str())
        .bind(&record.name)
        .bind(&record.description)
        .bind(record.difficulty.map(|d| d.as_str()))
        .bind(record.price)
        .bind(record.trainer_id)
        .bind(record.start_time)
        .bind(record.duration_min)
        .bind(record.capacity)
        .bind(SessionStatus::Active.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    async fn session_by_id(&self, session_id: i64) -> Result<Option<Session>> {
        let row: Option<SessionRow> = sqlx::query_as(
            "SELECT id, kind, name, description, difficulty, price, trainer_id,
                    start_time, duration_min, capacity, status, created_at
             FROM sessions WHERE id = ?",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(SessionRow::into_session).transpose()
    }

    async fn update_session(&self, session: &Session) -> Result<()> {
        sqlx::query(
            "UPDATE sessions
             SET name = ?, description = ?, difficulty = ?, price = ?,
                 start_time = ?, duration_min = ?, capacity = ?
             WHERE id = ?",
        )
        .bind(&session.name)
        .bind(&session.description)
        .bind(session.difficulty.map(|d| d.as_str()))
        .bind(session.price)
        .bind(session.start_time)
        .bind(session.duration_min)
        .bind(session.capacity)
        .bind(session.id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn set_session_status(&self, session_id: i64, status: SessionStatus) -> Result<()> {
        sqlx::query("UPDATE sessions SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(session_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn session_exists(&self, name: &str, start_time: NaiveDateTime) -> Result<bool> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM sessions WHERE name = ? AND start_time = ?")
                .bind(name)
                .bind(start_time)
                .fetch_one(&self.pool)
                .await?;
        Ok(row.0 > 0)
    }

    async fn sessions_in_range(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Session>> {
        let rows: Vec<SessionRow> = sqlx::query_as(
            "SELECT id, kind, name, description, difficulty, price, trainer_id,
                    start_time, duration_min, capacity, status, created_at
             FROM sessions
             WHERE start_time >= ? AND start_time < ?
             ORDER BY start_time ASC",
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(SessionRow::into_session).collect()
    }

    async fn sessions_for_trainer(&self, trainer_id: i64) -> Result<Vec<Session>> {
        let rows: Vec<SessionRow> = sqlx::query_as(
            "SELECT id, kind, name, description, difficulty, price, trainer_id,
                    start_time, duration_min, capacity, status, created_at
             FROM sessions
             WHERE trainer_id = ?
             ORDER BY start_time ASC",
        )
        .bind(trainer_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(SessionRow::into_session).collect()
    }

    async fn insert_reservation(&self, client_id: i64, session_id: i64) -> Result<i64> {
        let result = sqlx::query(
            "INSERT INTO reservations (client_id, session_id, created_at, status)
             VALUES (?, ?, ?, ?)",
        )
        .bind(client_id)
        .bind(session_id)
        .bind(Utc::now())
        .bind(ReservationStatus::Active.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, Error::DuplicateBooking))?;
        Ok(result.last_insert_rowid())
    }

    async fn reservation_by_id(&self, reservation_id: i64) -> Result<Option<Reservation>> {
        let row: Option<ReservationRow> = sqlx::query_as(
            "SELECT id, client_id, session_id, created_at, status
             FROM reservations WHERE id = ?",
        )
        .bind(reservation_id)
        .fetch_optional(&self.pool)
        .await?;
        row.map(ReservationRow::into_reservation).transpose()
    }

    async fn active_reservation(
        &self,
        client_id: i64,
        session_id: i64,
    ) -> Result<Option<Reservation>> {
        let row: Option<ReservationRow> = sqlx::query_as(
            "SELECT id, client_id, session_id, created_at, status
             FROM reservations
             WHERE client_id = ? AND session_id = ? AND status = ?",
        )
        .bind(client_id)
        .bind(session_id)
        .bind(ReservationStatus::Active.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.map(ReservationRow::into_reservation).transpose()
    }

    async fn active_reservation_count(&self, session_id: i64) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM reservations WHERE session_id = ? AND status = ?",
        )
        .bind(session_id)
        .bind(ReservationStatus::Active.as_str())
        .fetch_one(&self.pool)
        .await?;
        Ok(row.0)
    }

    async fn set_reservation_status(
        &self,
        reservation_id: i64,
        status: ReservationStatus,
    ) -> Result<()> {
        sqlx::query("UPDATE reservations SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(reservation_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn session_participants(&self, session_id: i64) -> Result<Vec<Participant>> {
        let rows: Vec<ParticipantRow> = sqlx::query_as(
            "SELECT u.id AS client_id, u.first_name, u.last_name, u.email
             FROM reservations r
             JOIN users u ON u.id = r.client_id
             WHERE r.session_id = ? AND r.status = ?
             ORDER BY u.last_name, u.first_name",
        )
        .bind(session_id)
        .bind(ReservationStatus::Active.as_str())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ParticipantRow::into_participant).collect())
    }

    async fn reservations_for_client(&self, client_id: i64) -> Result<Vec<ClientReservation>> {
        let rows: Vec<ClientReservationRow> = sqlx::query_as(
            "SELECT r.id AS reservation_id,
                    r.created_at AS reserved_at,
                    r.status AS status,
                    s.id AS session_id,
                    s.name AS session_name,
                    s.start_time AS session_start,
                    s.duration_min AS session_duration_min,
                    s.status AS session_status
             FROM reservations r
             JOIN sessions s ON s.id = r.session_id
             WHERE r.client_id = ?
             ORDER BY s.start_time ASC",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter()
            .map(ClientReservationRow::into_client_reservation)
            .collect()
    }
}
