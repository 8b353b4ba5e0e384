//! User identity types.
//!
//! Purpose: validated account primitives shared by the auth, profile, and
//! notification flows. Construction goes through fallible constructors so
//! adapters can only hand the domain well-formed values.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation failures raised by user constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserValidationError {
    /// The display name is empty after trimming.
    #[error("name must not be empty")]
    EmptyName,
    /// The display name exceeds the storage limit.
    #[error("name must be at most 100 characters")]
    NameTooLong,
    /// The email address is not plausibly formed.
    #[error("email address is not valid")]
    InvalidEmail,
}

/// Validated email address, stored lower-cased.
///
/// Validation is deliberately shallow (non-empty local part and domain with a
/// dot); deliverability is the mail system's problem, not ours.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parse and normalise an email address.
    ///
    /// # Errors
    /// Returns [`UserValidationError::InvalidEmail`] when the shape is wrong.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let value = raw.as_ref().trim().to_lowercase();
        let Some((local, domain)) = value.split_once('@') else {
            return Err(UserValidationError::InvalidEmail);
        };
        if local.is_empty() || domain.is_empty() || !domain.contains('.') {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(value))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

/// Validated display name (non-empty, at most 100 characters).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserName(String);

impl UserName {
    /// Trim and validate a display name.
    ///
    /// # Errors
    /// Returns a [`UserValidationError`] when empty or too long.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let value = raw.as_ref().trim();
        if value.is_empty() {
            return Err(UserValidationError::EmptyName);
        }
        if value.chars().count() > 100 {
            return Err(UserValidationError::NameTooLong);
        }
        Ok(Self(value.to_owned()))
    }
}

impl AsRef<str> for UserName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for UserName {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserName> for String {
    fn from(value: UserName) -> Self {
        value.0
    }
}

/// A registered account.
///
/// The password hash lives in [`crate::domain::auth::PasswordHash`] records
/// owned by the user repository; it never travels with this entity.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// Primary key.
    pub id: Uuid,
    /// Display name shown to other members.
    pub name: UserName,
    /// Unique login identifier.
    pub email: EmailAddress,
    /// Optional free-text bio shown on the profile.
    pub bio: Option<String>,
    /// Account creation time.
    pub created_at: DateTime<Utc>,
}
