//! PostgreSQL-backed `UserRepository` implementation using Diesel.

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::result::DatabaseErrorKind;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::auth::PasswordHash;
use crate::domain::ports::{
    NewUserRecord, ProfileStats, StoredCredentials, UserRepository, UserRepositoryError,
};
use crate::domain::session::ParticipantStatus;
use crate::domain::subscription::{BillingCycle, PaymentMethod};
use crate::domain::user::{EmailAddress, User, UserName};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewSubscriptionRow, NewUserRow, ProfileUpdate, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::{session_participants, user_badges, user_subscriptions, users};

/// Diesel-backed implementation of the user repository port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> UserRepositoryError {
    map_pool_error(error, UserRepositoryError::connection)
}

fn map_diesel(error: diesel::result::Error) -> UserRepositoryError {
    // The only unique constraint reachable through this repository is the
    // email column.
    if matches!(
        &error,
        diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
    ) {
        return UserRepositoryError::DuplicateEmail;
    }
    map_diesel_error(
        error,
        UserRepositoryError::query,
        UserRepositoryError::connection,
    )
}

/// Convert a database row into a validated domain user.
fn row_to_user(row: UserRow) -> Result<User, UserRepositoryError> {
    let UserRow {
        id,
        name,
        email,
        password_hash: _,
        bio,
        created_at,
        updated_at: _,
    } = row;

    Ok(User {
        id,
        name: UserName::new(name)
            .map_err(|err| UserRepositoryError::query(format!("stored name invalid: {err}")))?,
        email: EmailAddress::new(email)
            .map_err(|err| UserRepositoryError::query(format!("stored email invalid: {err}")))?,
        bio,
        created_at,
    })
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn create_account(
        &self,
        record: &NewUserRecord,
        basic_plan_id: Uuid,
    ) -> Result<User, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let new_user = NewUserRow {
            id: record.id,
            name: record.name.as_ref(),
            email: record.email.as_ref(),
            password_hash: record.password_hash.as_str(),
        };
        let new_subscription = NewSubscriptionRow {
            id: Uuid::new_v4(),
            user_id: record.id,
            plan_id: basic_plan_id,
            start_date: Utc::now(),
            end_date: None,
            is_active: true,
            billing_cycle: BillingCycle::Monthly.as_str(),
            payment_method: PaymentMethod::Free.as_str(),
        };

        let row = conn
            .transaction::<UserRow, diesel::result::Error, _>(|conn| {
                async move {
                    let row = diesel::insert_into(users::table)
                        .values(&new_user)
                        .returning(UserRow::as_returning())
                        .get_result::<UserRow>(conn)
                        .await?;

                    diesel::insert_into(user_subscriptions::table)
                        .values(&new_subscription)
                        .execute(conn)
                        .await?;

                    Ok(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel)?;

        row_to_user(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = users::table
            .find(id)
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_user).transpose()
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_user).transpose()
    }

    async fn credentials_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = users::table
            .filter(users::email.eq(email.as_ref()))
            .select((users::id, users::password_hash))
            .first::<(Uuid, String)>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        Ok(row.map(|(user_id, hash)| StoredCredentials {
            user_id,
            password_hash: PasswordHash::from_stored(hash),
        }))
    }

    async fn password_hash(
        &self,
        id: Uuid,
    ) -> Result<Option<PasswordHash>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let hash = users::table
            .find(id)
            .select(users::password_hash)
            .first::<String>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        Ok(hash.map(PasswordHash::from_stored))
    }

    async fn update_profile<'a>(
        &self,
        id: Uuid,
        name: &UserName,
        bio: Option<&'a str>,
    ) -> Result<Option<User>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let update = ProfileUpdate {
            name: name.as_ref(),
            bio,
            updated_at: Utc::now(),
        };
        let row = diesel::update(users::table.find(id))
            .set(&update)
            .returning(UserRow::as_returning())
            .get_result::<UserRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_user).transpose()
    }

    async fn update_password(
        &self,
        id: Uuid,
        hash: &PasswordHash,
    ) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        diesel::update(users::table.find(id))
            .set((
                users::password_hash.eq(hash.as_str()),
                users::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel)
    }

    async fn list_ids_except(&self, excluded: Uuid) -> Result<Vec<Uuid>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        users::table
            .filter(users::id.ne(excluded))
            .select(users::id)
            .load::<Uuid>(&mut conn)
            .await
            .map_err(map_diesel)
    }

    async fn profile_stats(&self, id: Uuid) -> Result<ProfileStats, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let completed_sessions = session_participants::table
            .filter(session_participants::user_id.eq(id))
            .filter(session_participants::status.eq(ParticipantStatus::Completed.as_str()))
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(map_diesel)?;

        let earned_badges = user_badges::table
            .filter(user_badges::user_id.eq(id))
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(map_diesel)?;

        Ok(ProfileStats {
            completed_sessions,
            earned_badges,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn unique_violation_on_email_maps_to_duplicate() {
        let error = diesel::result::Error::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value violates unique constraint \"users_email_key\"".to_owned()),
        );
        assert_eq!(map_diesel(error), UserRepositoryError::DuplicateEmail);
    }

    #[rstest]
    fn other_database_errors_map_to_query() {
        let error = diesel::result::Error::NotFound;
        assert!(matches!(
            map_diesel(error),
            UserRepositoryError::Query { .. }
        ));
    }

    #[rstest]
    fn invalid_stored_email_is_a_query_error() {
        let row = UserRow {
            id: Uuid::new_v4(),
            name: "Valid Name".to_owned(),
            email: "not-an-email".to_owned(),
            password_hash: "$argon2id$stub".to_owned(),
            bio: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let error = row_to_user(row).expect_err("invalid email rejected");
        assert!(error.to_string().contains("stored email invalid"));
    }
}
