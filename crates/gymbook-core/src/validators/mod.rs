//! Input validation for catalog and identity operations

pub mod session_validator;
pub mod user_validator;

pub use session_validator::SessionValidator;
pub use user_validator::UserValidator;
