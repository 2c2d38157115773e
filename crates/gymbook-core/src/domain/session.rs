//! Gym session entity and related types

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of bookable session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionKind {
    /// Scheduled group class with a shared roster
    Group,
    /// One-on-one personal training slot
    Personal,
}

impl SessionKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "group" => Some(Self::Group),
            "personal" => Some(Self::Personal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Personal => "personal",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SessionStatus {
    /// Open for booking
    Active,
    /// Cancelled; kept for history, rejects new bookings
    Cancelled,
}

impl SessionStatus {
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

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Difficulty rating for group classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "medium" => Some(Self::Medium),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A bookable session on the schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Unique session ID
    pub id: i64,
    /// Kind of session
    pub kind: SessionKind,
    /// Display name; personal training slots usually have none
    pub name: Option<String>,
    /// Free-form description
    pub description: Option<String>,
    /// Difficulty rating, group classes only
    pub difficulty: Option<Difficulty>,
    /// Price per booking
    pub price: Option<f64>,
    /// The trainer running the session
    pub trainer_id: i64,
    /// Local start timestamp, no timezone attached
    pub start_time: NaiveDateTime,
    /// Duration in minutes
    pub duration_min: i64,
    /// Hard ceiling on concurrent active reservations
    pub capacity: i64,
    /// Lifecycle status
    pub status: SessionStatus,
    /// When the session was created
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session accepts new bookings
    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}

/// Input for creating a session.
///
/// Enum-valued fields arrive as raw strings and are validated before
/// anything is written.
#[derive(Debug, Clone)]
pub struct NewSession {
    pub kind: String,
    pub trainer_id: i64,
    pub start_time: String,
    pub duration_min: i64,
    pub capacity: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<String>,
    pub price: Option<f64>,
}

/// A validated session ready for insertion
#[derive(Debug, Clone)]
pub struct SessionRecord {
    pub kind: SessionKind,
    pub name: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub price: Option<f64>,
    pub trainer_id: i64,
    pub start_time: NaiveDateTime,
    pub duration_min: i64,
    pub capacity: i64,
}

/// Partial session edit; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct SessionChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub difficulty: Option<String>,
    pub price: Option<f64>,
    pub start_time: Option<String>,
    pub duration_min: Option<i64>,
    pub capacity: Option<i64>,
}

impl SessionChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.difficulty.is_none()
            && self.price.is_none()
            && self.start_time.is_none()
            && self.duration_min.is_none()
            && self.capacity.is_none()
    }
}

/// A session annotated with booking counts computed at read time
#[derive(Debug, Clone, Serialize)]
pub struct SessionAvailability {
    pub session: Session,
    /// Count of ACTIVE reservations
    pub reserved: i64,
    /// Open slots, never negative even if capacity was shrunk below the count
    pub available: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_kind_from_str() {
        assert_eq!(SessionKind::from_str("group"), Some(SessionKind::Group));
        assert_eq!(SessionKind::from_str("Personal"), Some(SessionKind::Personal));
        assert_eq!(SessionKind::from_str("swim"), None);
    }

    #[test]
    fn test_session_status_roundtrip() {
        assert_eq!(SessionStatus::from_str("ACTIVE"), Some(SessionStatus::Active));
        assert_eq!(SessionStatus::from_str("cancelled"), Some(SessionStatus::Cancelled));
        assert_eq!(SessionStatus::from_str("done"), None);
        assert_eq!(SessionStatus::Active.as_str(), "ACTIVE");
        assert_eq!(SessionStatus::Cancelled.as_str(), "CANCELLED");
    }

    #[test]
    fn test_difficulty_from_str() {
        assert_eq!(Difficulty::from_str("easy"), Some(Difficulty::Easy));
        assert_eq!(Difficulty::from_str("MEDIUM"), Some(Difficulty::Medium));
        assert_eq!(Difficulty::from_str("extreme"), None);
    }

    #[test]
    fn test_session_changes_is_empty() {
        assert!(SessionChanges::default().is_empty());
        let changes = SessionChanges {
            capacity: Some(15),
            ..Default::default()
        };
        assert!(!changes.is_empty());
    }
}
