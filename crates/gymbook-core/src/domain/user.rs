//! User accounts, roles, and the authenticated principal

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role assigned to an account, fixed at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Client,
    Trainer,
    Manager,
}

impl Role {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "client" => Some(Self::Client),
            "trainer" => Some(Self::Trainer),
            "manager" => Some(Self::Manager),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Client => "client",
            Self::Trainer => "trainer",
            Self::Manager => "manager",
        }
    }

    /// Managers own the session lifecycle
    pub fn can_manage_sessions(&self) -> bool {
        matches!(self, Self::Manager)
    }

    /// Trainers and managers may read session rosters
    pub fn can_view_participants(&self) -> bool {
        matches!(self, Self::Trainer | Self::Manager)
    }

    /// Only clients hold reservations of their own
    pub fn can_book(&self) -> bool {
        matches!(self, Self::Client)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID
    pub id: i64,
    /// First name, stored title-cased
    pub first_name: String,
    /// Last name, stored title-cased
    pub last_name: String,
    /// Email, stored trimmed and lowercased, unique across accounts
    pub email: String,
    /// Argon2id hash of the password, never exposed to callers
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Role fixed at creation
    pub role: Role,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Full display name
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// An authenticated actor; the authorization context every operation runs under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// The authenticated user's ID
    pub id: i64,
    /// The authenticated user's role
    pub role: Role,
}

impl Principal {
    pub fn new(id: i64, role: Role) -> Self {
        Self { id, role }
    }
}

/// Partial profile edit; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    /// New password in plaintext, hashed before storage
    pub password: Option<String>,
}

impl ProfileChanges {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.password.is_none()
    }
}
