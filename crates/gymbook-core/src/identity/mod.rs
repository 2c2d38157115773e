//! Identity gateway
//!
//! Registers accounts, authenticates principals, and owns profile edits.
//! The catalog and engine trust the `Principal` this gateway produces;
//! role-based capability checks happen at the call boundary.

pub mod password;

use std::sync::Arc;

use tracing::info;

use crate::domain::user::{Principal, ProfileChanges, Role, User};
use crate::error::{Error, Result};
use crate::storage::BookingStore;
use crate::validators::UserValidator;

use password::{hash_password, verify_password};

/// Normalize an email for storage and lookup
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Trim and title-case a name: "anna maria" becomes "Anna Maria"
fn normalize_name(name: &str) -> String {
    let trimmed = name.trim();
    let mut normalized = String::with_capacity(trimmed.len());
    let mut at_word_start = true;
    for c in trimmed.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                normalized.extend(c.to_uppercase());
                at_word_start = false;
            } else {
                normalized.extend(c.to_lowercase());
            }
        } else {
            normalized.push(c);
            at_word_start = true;
        }
    }
    normalized
}

/// Service producing authenticated principals and managing accounts
#[derive(Clone)]
pub struct IdentityGateway {
    store: Arc<dyn BookingStore>,
}

impl IdentityGateway {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// Register a new client account and return its id
    pub async fn register(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<i64> {
        self.create_user(first_name, last_name, email, password, Role::Client)
            .await
    }

    /// Create an account with an explicit role.
    ///
    /// Same pipeline as `register`: validation, normalization, duplicate
    /// email check, then hashed insert. Used by seeding and staff
    /// provisioning.
    pub async fn create_user(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
        role: Role,
    ) -> Result<i64> {
        UserValidator::validate_register(first_name, last_name, email, password)?;

        let email = normalize_email(email);
        if self.store.user_by_email(&email).await?.is_some() {
            return Err(Error::DuplicateEmail);
        }

        let password_hash = hash_password(password)?;
        let id = self
            .store
            .insert_user(
                &normalize_name(first_name),
                &normalize_name(last_name),
                &email,
                &password_hash,
                role,
            )
            .await?;
        info!(user_id = id, role = %role, "Created user");
        Ok(id)
    }

    /// Authenticate by email and password.
    ///
    /// Unknown email and wrong password yield the same error, so accounts
    /// cannot be enumerated through the login path.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Principal> {
        let email = normalize_email(email);
        let Some(user) = self.store.user_by_email(&email).await? else {
            return Err(Error::Auth);
        };
        if !verify_password(password, &user.password_hash)? {
            return Err(Error::Auth);
        }
        Ok(Principal::new(user.id, user.role))
    }

    /// Look up a user by id
    pub async fn user(&self, user_id: i64) -> Result<User> {
        self.store
            .user_by_id(user_id)
            .await?
            .ok_or_else(|| Error::not_found("user", user_id))
    }

    /// Apply a profile edit for the owning user.
    ///
    /// Only supplied fields change. Values equal to what is already on
    /// file are dropped; if nothing effective remains the edit is rejected
    /// with `NoChanges`. A new email must not belong to another account.
    pub async fn update_profile(&self, user_id: i64, changes: &ProfileChanges) -> Result<()> {
        if changes.is_empty() {
            return Err(Error::NoChanges);
        }

        let mut user = self
            .store
            .user_by_id(user_id)
            .await?
            .ok_or_else(|| Error::not_found("user", user_id))?;

        let mut touched = false;

        if let Some(first) = &changes.first_name {
            UserValidator::validate_name("first_name", first)?;
            let first = normalize_name(first);
            if first != user.first_name {
                user.first_name = first;
                touched = true;
            }
        }
        if let Some(last) = &changes.last_name {
            UserValidator::validate_name("last_name", last)?;
            let last = normalize_name(last);
            if last != user.last_name {
                user.last_name = last;
                touched = true;
            }
        }
        if let Some(email) = &changes.email {
            UserValidator::validate_email(email)?;
            let email = normalize_email(email);
            if email != user.email {
                if let Some(existing) = self.store.user_by_email(&email).await? {
                    if existing.id != user_id {
                        return Err(Error::DuplicateEmail);
                    }
                }
                user.email = email;
                touched = true;
            }
        }
        if let Some(new_password) = &changes.password {
            UserValidator::validate_password(new_password)?;
            user.password_hash = hash_password(new_password)?;
            touched = true;
        }

        if !touched {
            return Err(Error::NoChanges);
        }

        self.store.update_user(&user).await?;
        info!(user_id, "Updated profile");
        Ok(())
    }

    /// Users holding the trainer role, ordered by id
    pub async fn trainers(&self) -> Result<Vec<User>> {
        self.store.users_by_role(Role::Trainer).await
    }
}
