//! Session field validation

use chrono::NaiveDateTime;

use crate::domain::session::{Difficulty, NewSession, SessionKind, SessionRecord};
use crate::error::{Error, Result};

/// Maximum session name length
const MAX_NAME_LENGTH: usize = 100;

/// Maximum description length
const MAX_DESCRIPTION_LENGTH: usize = 1000;

/// Validator for session creation and edits
pub struct SessionValidator;

impl SessionValidator {
    /// Parse and validate the session kind
    pub fn validate_kind(kind: &str) -> Result<SessionKind> {
        SessionKind::from_str(kind).ok_or_else(|| {
            Error::validation(
                "kind",
                format!("Unknown session kind '{}'. Allowed: group, personal", kind),
            )
        })
    }

    /// Names must be non-empty and reasonably short
    pub fn validate_name(name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::validation("name", "Session name cannot be empty"));
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(Error::validation(
                "name",
                format!("Session name cannot exceed {} characters", MAX_NAME_LENGTH),
            ));
        }
        Ok(())
    }

    pub fn validate_description(description: &str) -> Result<()> {
        if description.len() > MAX_DESCRIPTION_LENGTH {
            return Err(Error::validation(
                "description",
                format!("Description cannot exceed {} characters", MAX_DESCRIPTION_LENGTH),
            ));
        }
        Ok(())
    }

    /// Parse and validate the difficulty rating
    pub fn validate_difficulty(difficulty: &str) -> Result<Difficulty> {
        Difficulty::from_str(difficulty).ok_or_else(|| {
            Error::validation(
                "difficulty",
                format!(
                    "Unknown difficulty '{}'. Allowed: easy, medium, hard",
                    difficulty
                ),
            )
        })
    }

    pub fn validate_price(price: f64) -> Result<()> {
        if price <= 0.0 {
            return Err(Error::validation("price", "Price must be greater than zero"));
        }
        Ok(())
    }

    /// Parse the start timestamp.
    ///
    /// Accepts ISO 8601 ("2025-01-06T08:00:00") and the shorter
    /// "2025-01-06 08:00" form.
    pub fn validate_start_time(start: &str) -> Result<NaiveDateTime> {
        if let Ok(parsed) = start.parse::<NaiveDateTime>() {
            return Ok(parsed);
        }
        NaiveDateTime::parse_from_str(start, "%Y-%m-%d %H:%M").map_err(|_| {
            Error::validation(
                "start_time",
                format!(
                    "Cannot parse '{}' as a timestamp. Expected YYYY-MM-DDTHH:MM:SS or YYYY-MM-DD HH:MM",
                    start
                ),
            )
        })
    }

    pub fn validate_duration(duration_min: i64) -> Result<()> {
        if duration_min <= 0 {
            return Err(Error::validation(
                "duration_min",
                "Duration must be greater than zero",
            ));
        }
        Ok(())
    }

    pub fn validate_capacity(capacity: i64) -> Result<()> {
        if capacity <= 0 {
            return Err(Error::validation(
                "capacity",
                "Capacity must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Validate every field of a new session and build the insertable record.
    ///
    /// Fails on the first violation; nothing is written by the caller when
    /// this returns an error.
    pub fn validate_create(new: &NewSession) -> Result<SessionRecord> {
        let kind = Self::validate_kind(&new.kind)?;
        if let Some(name) = &new.name {
            Self::validate_name(name)?;
        }
        if let Some(description) = &new.description {
            Self::validate_description(description)?;
        }
        let difficulty = match &new.difficulty {
            Some(difficulty) => Some(Self::validate_difficulty(difficulty)?),
            None => None,
        };
        if let Some(price) = new.price {
            Self::validate_price(price)?;
        }
        let start_time = Self::validate_start_time(&new.start_time)?;
        Self::validate_duration(new.duration_min)?;
        Self::validate_capacity(new.capacity)?;

        Ok(SessionRecord {
            kind,
            name: new.name.clone(),
            description: new.description.clone(),
            difficulty,
            price: new.price,
            trainer_id: new.trainer_id,
            start_time,
            duration_min: new.duration_min,
            capacity: new.capacity,
        })
    }
}
