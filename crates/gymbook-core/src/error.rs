//! Error types for Gymbook

use thiserror::Error;

/// Result type alias using Gymbook's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Gymbook operations
#[derive(Error, Debug)]
pub enum Error {
    // ========== Input errors ==========
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("No changes to apply")]
    NoChanges,

    // ========== Booking errors ==========
    #[error("This session is not open for booking")]
    InvalidSession,

    #[error("You already have a reservation for this session")]
    DuplicateBooking,

    #[error("No slots available")]
    CapacityExceeded,

    #[error("This email address is already taken")]
    DuplicateEmail,

    // ========== Auth errors ==========
    #[error("Invalid email or password")]
    Auth,

    // ========== Infrastructure errors ==========
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Build a validation error for a named input field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Build a not-found error for an entity looked up by id
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }

    /// Stable error code for scripting and logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "E100",
            Self::NotFound { .. } => "E101",
            Self::NoChanges => "E102",
            Self::InvalidSession => "E200",
            Self::DuplicateBooking => "E201",
            Self::CapacityExceeded => "E202",
            Self::DuplicateEmail => "E203",
            Self::Auth => "E400",
            Self::Database(_) => "E500",
            Self::Io(_) => "E501",
            Self::Parse(_) => "E502",
        }
    }

    /// Recovery suggestion shown by the CLI, when one exists
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::InvalidSession => Some("Run 'gymbook sessions day' to see open sessions".to_string()),
            Self::DuplicateBooking => Some("Run 'gymbook reservations list' to see your bookings".to_string()),
            Self::CapacityExceeded => Some("Run 'gymbook sessions week' to find another session".to_string()),
            Self::DuplicateEmail => Some("Run 'gymbook login' if this account is yours".to_string()),
            Self::Auth => Some("Check the email and password, or run 'gymbook register'".to_string()),
            _ => None,
        }
    }
}
