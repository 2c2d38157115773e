//! Reservation entity and read-side projections

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::session::SessionStatus;

/// Lifecycle status of a reservation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReservationStatus {
    /// Holds a slot and counts against capacity
    Active,
    /// Released; kept for history, never counts against capacity
    Cancelled,
}

impl ReservationStatus {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Some(Self::Active),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Cancelled => "CANCELLED",
        }
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A client's binding to a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reservation {
    /// Unique reservation ID; a rebooking after cancellation gets a fresh one
    pub id: i64,
    /// The booking client
    pub client_id: i64,
    /// The booked session
    pub session_id: i64,
    /// When the reservation was made
    pub created_at: DateTime<Utc>,
    /// Lifecycle status
    pub status: ReservationStatus,
}

impl Reservation {
    /// Whether the reservation still holds a slot
    pub fn is_active(&self) -> bool {
        self.status == ReservationStatus::Active
    }
}

/// Roster entry for a session; covers ACTIVE reservations only
#[derive(Debug, Clone, Serialize)]
pub struct Participant {
    pub client_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl Participant {
    /// Full display name
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A client's reservation joined with its session details, for history views
#[derive(Debug, Clone, Serialize)]
pub struct ClientReservation {
    pub reservation_id: i64,
    pub reserved_at: DateTime<Utc>,
    pub status: ReservationStatus,
    pub session_id: i64,
    pub session_name: Option<String>,
    pub session_start: NaiveDateTime,
    pub session_duration_min: i64,
    pub session_status: SessionStatus,
}
