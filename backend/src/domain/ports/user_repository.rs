//! Port for account persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::auth::PasswordHash;
use crate::domain::user::{EmailAddress, User, UserName};

/// Errors raised by user repository adapters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UserRepositoryError {
    /// Repository connection could not be established.
    #[error("user repository connection failed: {message}")]
    Connection {
        /// Adapter-supplied failure description.
        message: String,
    },
    /// Query or mutation failed during execution.
    #[error("user repository query failed: {message}")]
    Query {
        /// Adapter-supplied failure description.
        message: String,
    },
    /// The email address is already registered.
    #[error("email address is already registered")]
    DuplicateEmail,
}

impl UserRepositoryError {
    /// Construct a connection failure.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Construct a query failure.
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Payload for inserting a new account.
#[derive(Debug, Clone)]
pub struct NewUserRecord {
    /// Pre-generated primary key.
    pub id: Uuid,
    /// Display name.
    pub name: UserName,
    /// Unique login email.
    pub email: EmailAddress,
    /// Argon2 PHC hash of the password.
    pub password_hash: PasswordHash,
}

/// Stored credentials looked up at login time.
#[derive(Debug, Clone)]
pub struct StoredCredentials {
    /// Account id.
    pub user_id: Uuid,
    /// Stored argon2 hash.
    pub password_hash: PasswordHash,
}

/// Aggregate counters shown on the profile page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProfileStats {
    /// Sessions the user finished.
    pub completed_sessions: i64,
    /// Badges the user holds.
    pub earned_badges: i64,
}

/// Port for account reads and writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account and activate the given plan for it, atomically.
    async fn create_account(
        &self,
        record: &NewUserRecord,
        basic_plan_id: Uuid,
    ) -> Result<User, UserRepositoryError>;

    /// Find an account by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserRepositoryError>;

    /// Find an account by its normalised email.
    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserRepositoryError>;

    /// Load stored credentials for a login attempt.
    async fn credentials_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError>;

    /// Load the stored password hash for a password change.
    async fn password_hash(&self, id: Uuid)
    -> Result<Option<PasswordHash>, UserRepositoryError>;

    /// Update name and bio, returning the refreshed account when it exists.
    async fn update_profile<'a>(
        &self,
        id: Uuid,
        name: &UserName,
        bio: Option<&'a str>,
    ) -> Result<Option<User>, UserRepositoryError>;

    /// Replace the stored password hash.
    async fn update_password(
        &self,
        id: Uuid,
        hash: &PasswordHash,
    ) -> Result<(), UserRepositoryError>;

    /// Ids of every account except `excluded` (broadcast notifications).
    async fn list_ids_except(&self, excluded: Uuid) -> Result<Vec<Uuid>, UserRepositoryError>;

    /// Aggregate profile counters.
    async fn profile_stats(&self, id: Uuid) -> Result<ProfileStats, UserRepositoryError>;
}
