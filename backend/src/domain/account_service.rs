//! Account use-cases: signup, login, profile, password changes.

use std::sync::Arc;

use uuid::Uuid;

use super::auth::{LoginCredentials, Password, PasswordHash, SignupDetails};
use super::error::Error;
use super::ports::{
    ChallengeRepository, ChallengeRepositoryError, EarnedBadge, NewUserRecord,
    SubscriptionRepository, SubscriptionRepositoryError, UserRepository, UserRepositoryError,
};
use super::user::{User, UserName};

fn map_user_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::DuplicateEmail => {
            Error::conflict("an account with this email already exists")
        }
    }
}

fn map_subscription_error(error: SubscriptionRepositoryError) -> Error {
    match error {
        SubscriptionRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("subscription repository unavailable: {message}"))
        }
        SubscriptionRepositoryError::Query { message } => {
            Error::internal(format!("subscription repository error: {message}"))
        }
    }
}

fn map_challenge_error(error: ChallengeRepositoryError) -> Error {
    match error {
        ChallengeRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("challenge repository unavailable: {message}"))
        }
        ChallengeRepositoryError::Query { message } => {
            Error::internal(format!("challenge repository error: {message}"))
        }
    }
}

/// Profile page payload.
#[derive(Debug, Clone)]
pub struct ProfileView {
    /// The account itself.
    pub user: User,
    /// Sessions the user finished.
    pub completed_sessions: i64,
    /// Badges the user holds.
    pub earned_badges: i64,
    /// Up to six most recent badges.
    pub recent_badges: Vec<EarnedBadge>,
}

/// How many recent badges the profile page shows.
const RECENT_BADGE_LIMIT: i64 = 6;

/// Account service over the user, subscription, and badge ports.
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    challenges: Arc<dyn ChallengeRepository>,
}

impl AccountService {
    /// Create the service from its ports.
    pub fn new(
        users: Arc<dyn UserRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        challenges: Arc<dyn ChallengeRepository>,
    ) -> Self {
        Self {
            users,
            subscriptions,
            challenges,
        }
    }

    /// Register a new account and activate the free Basic plan for it.
    ///
    /// # Errors
    /// `conflict` when the email is taken; repository failures otherwise.
    pub async fn signup(&self, details: SignupDetails) -> Result<User, Error> {
        if self
            .users
            .find_by_email(&details.email)
            .await
            .map_err(map_user_error)?
            .is_some()
        {
            return Err(Error::conflict("an account with this email already exists"));
        }

        let basic_plan = self
            .subscriptions
            .ensure_basic_plan()
            .await
            .map_err(map_subscription_error)?;

        let password_hash = PasswordHash::derive(&details.password)
            .map_err(|err| Error::internal(format!("password hashing failed: {err}")))?;

        let record = NewUserRecord {
            id: Uuid::new_v4(),
            name: details.name,
            email: details.email,
            password_hash,
        };

        self.users
            .create_account(&record, basic_plan.id)
            .await
            .map_err(map_user_error)
    }

    /// Verify credentials and return the account id.
    ///
    /// Unknown emails and wrong passwords produce the same `unauthorized`
    /// error so the endpoint does not leak which accounts exist.
    pub async fn login(&self, credentials: LoginCredentials) -> Result<Uuid, Error> {
        let stored = self
            .users
            .credentials_by_email(&credentials.email)
            .await
            .map_err(map_user_error)?;

        match stored {
            Some(stored) if stored.password_hash.verify(&credentials.password) => {
                Ok(stored.user_id)
            }
            _ => Err(Error::unauthorized("invalid credentials")),
        }
    }

    /// Assemble the profile page for a user.
    pub async fn profile(&self, user_id: Uuid) -> Result<ProfileView, Error> {
        let user = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("user not found"))?;

        let stats = self
            .users
            .profile_stats(user_id)
            .await
            .map_err(map_user_error)?;

        let recent_badges = self
            .challenges
            .recent_badges(user_id, RECENT_BADGE_LIMIT)
            .await
            .map_err(map_challenge_error)?;

        Ok(ProfileView {
            user,
            completed_sessions: stats.completed_sessions,
            earned_badges: stats.earned_badges,
            recent_badges,
        })
    }

    /// Update display name and bio.
    pub async fn update_profile(
        &self,
        user_id: Uuid,
        name: UserName,
        bio: Option<String>,
    ) -> Result<User, Error> {
        self.users
            .update_profile(user_id, &name, bio.as_deref())
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("user not found"))
    }

    /// Verify the current password and store a new hash.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        current: Password,
        new: Password,
    ) -> Result<(), Error> {
        let stored = self
            .users
            .password_hash(user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found("user not found"))?;

        if !stored.verify(&current) {
            return Err(Error::invalid_request("current password is incorrect"));
        }

        let new_hash = PasswordHash::derive(&new)
            .map_err(|err| Error::internal(format!("password hashing failed: {err}")))?;

        self.users
            .update_password(user_id, &new_hash)
            .await
            .map_err(map_user_error)
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
