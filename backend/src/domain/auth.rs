//! Credential types and password hashing.
//!
//! Purpose: keep argon2 usage in one place. Services verify and mint
//! [`PasswordHash`] values; the raw password never leaves this module except
//! inside the transient request structs.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash as PhcHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

use super::user::{EmailAddress, UserName, UserValidationError};

const MIN_PASSWORD_LENGTH: usize = 8;

/// Validation failures raised by credential constructors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CredentialValidationError {
    /// The password is shorter than the minimum length.
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,
    /// The password is empty.
    #[error("password must not be empty")]
    EmptyPassword,
    /// A user field failed validation.
    #[error(transparent)]
    User(#[from] UserValidationError),
}

/// A plaintext password accepted from a request body.
///
/// ## Invariants
/// - Non-empty; at least [`MIN_PASSWORD_LENGTH`] characters for new passwords.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    /// Accept any non-empty password (login and current-password checks).
    pub fn for_login(raw: impl Into<String>) -> Result<Self, CredentialValidationError> {
        let value = raw.into();
        if value.is_empty() {
            return Err(CredentialValidationError::EmptyPassword);
        }
        Ok(Self(value))
    }

    /// Accept a password for account creation or change, enforcing length.
    pub fn for_signup(raw: impl Into<String>) -> Result<Self, CredentialValidationError> {
        let value = raw.into();
        if value.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(CredentialValidationError::PasswordTooShort);
        }
        Ok(Self(value))
    }

    fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password(***)")
    }
}

/// Stored argon2id hash in PHC string form (`$argon2id$...`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hash a password with a fresh random salt.
    ///
    /// # Errors
    /// Surfaces argon2 parameter failures as opaque strings; these indicate
    /// a programming error rather than bad input.
    pub fn derive(password: &Password) -> Result<Self, String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| err.to_string())?;
        Ok(Self(hash.to_string()))
    }

    /// Wrap a hash loaded from storage.
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Constant-behaviour verification of a candidate password.
    pub fn verify(&self, password: &Password) -> bool {
        let Ok(parsed) = PhcHash::new(&self.0) else {
            return false;
        };
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    /// The PHC string persisted by the user repository.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validated login credentials.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    /// Normalised login email.
    pub email: EmailAddress,
    /// Submitted password.
    pub password: Password,
}

impl LoginCredentials {
    /// Validate raw login fields.
    pub fn try_from_parts(
        email: &str,
        password: &str,
    ) -> Result<Self, CredentialValidationError> {
        Ok(Self {
            email: EmailAddress::new(email)?,
            password: Password::for_login(password)?,
        })
    }
}

/// Validated signup payload.
#[derive(Debug, Clone)]
pub struct SignupDetails {
    /// Display name.
    pub name: UserName,
    /// Normalised login email.
    pub email: EmailAddress,
    /// Submitted password (length-checked).
    pub password: Password,
}

impl SignupDetails {
    /// Validate raw signup fields.
    pub fn try_from_parts(
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Self, CredentialValidationError> {
        Ok(Self {
            name: UserName::new(name)?,
            email: EmailAddress::new(email)?,
            password: Password::for_signup(password)?,
        })
    }
}
