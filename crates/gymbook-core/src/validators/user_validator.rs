//! Account field validation

use crate::error::{Error, Result};

/// Minimum password length
const MIN_PASSWORD_LENGTH: usize = 6;

/// Maximum name length
const MAX_NAME_LENGTH: usize = 100;

/// Validator for registration and profile edits
pub struct UserValidator;

impl UserValidator {
    /// Names must be non-empty after trimming
    pub fn validate_name(field: &'static str, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(Error::validation(field, "Name cannot be empty"));
        }
        if name.len() > MAX_NAME_LENGTH {
            return Err(Error::validation(
                field,
                format!("Name cannot exceed {} characters", MAX_NAME_LENGTH),
            ));
        }
        Ok(())
    }

    /// Structural email check: one '@' with non-empty parts, no whitespace
    pub fn validate_email(email: &str) -> Result<()> {
        let email = email.trim();
        let valid = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && !email.contains(char::is_whitespace)
            }
            None => false,
        };
        if !valid {
            return Err(Error::validation("email", "Not a valid email address"));
        }
        Ok(())
    }

    pub fn validate_password(password: &str) -> Result<()> {
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(Error::validation(
                "password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
            ));
        }
        Ok(())
    }

    /// Validate every registration field at once
    pub fn validate_register(
        first_name: &str,
        last_name: &str,
        email: &str,
        password: &str,
    ) -> Result<()> {
        Self::validate_name("first_name", first_name)?;
        Self::validate_name("last_name", last_name)?;
        Self::validate_email(email)?;
        Self::validate_password(password)?;
        Ok(())
    }
}
