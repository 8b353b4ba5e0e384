//! PostgreSQL-backed `ChallengeRepository` implementation using Diesel.
//!
//! Badge awards upsert the catalogue row by name and tolerate the
//! (user, badge) uniqueness conflict so repeat awards are no-ops.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::challenge::{Badge, BadgeSpec, Challenge, ChallengeStatus, UserChallenge};
use crate::domain::ports::{
    ChallengeRepository, ChallengeRepositoryError, ChallengeWithProgress, CompletedChallenge,
    EarnedBadge, NewChallengeRecord, ProgressUpdate,
};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{
    BadgeRow, ChallengeRow, NewBadgeRow, NewChallengeRow, NewUserBadgeRow, NewUserChallengeRow,
    UserChallengeRow, UserChallengeUpdate,
};
use super::pool::{DbPool, PoolError};
use super::schema::{badges, challenges, user_badges, user_challenges};

/// Diesel-backed implementation of the challenge repository port.
#[derive(Clone)]
pub struct DieselChallengeRepository {
    pool: DbPool,
}

impl DieselChallengeRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> ChallengeRepositoryError {
    map_pool_error(error, ChallengeRepositoryError::connection)
}

fn map_diesel(error: diesel::result::Error) -> ChallengeRepositoryError {
    map_diesel_error(
        error,
        ChallengeRepositoryError::query,
        ChallengeRepositoryError::connection,
    )
}

fn row_to_challenge(row: ChallengeRow) -> Result<Challenge, ChallengeRepositoryError> {
    Ok(Challenge {
        id: row.id,
        title: row.title,
        description: row.description,
        goal_target: row.goal_target,
        reward_points: row.reward_points,
        status: ChallengeStatus::from_str(&row.status).map_err(|err| {
            ChallengeRepositoryError::query(format!("stored challenge status invalid: {err}"))
        })?,
        team_id: row.team_id,
        created_at: row.created_at,
    })
}

fn row_to_user_challenge(row: UserChallengeRow) -> UserChallenge {
    UserChallenge {
        user_id: row.user_id,
        challenge_id: row.challenge_id,
        progress: row.progress,
        completed: row.completed,
        completed_at: row.completed_at,
    }
}

fn row_to_badge(row: BadgeRow) -> Badge {
    Badge {
        id: row.id,
        name: row.name,
        description: row.description,
        image_url: row.image_url,
    }
}

#[async_trait]
impl ChallengeRepository for DieselChallengeRepository {
    async fn create(
        &self,
        record: &NewChallengeRecord,
    ) -> Result<Challenge, ChallengeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let new_challenge = NewChallengeRow {
            id: record.id,
            title: &record.title,
            description: &record.description,
            goal_target: record.goal_target,
            reward_points: record.reward_points,
            status: ChallengeStatus::Active.as_str(),
            team_id: record.team_id,
        };
        let row = diesel::insert_into(challenges::table)
            .values(&new_challenge)
            .returning(ChallengeRow::as_returning())
            .get_result::<ChallengeRow>(&mut conn)
            .await
            .map_err(map_diesel)?;

        row_to_challenge(row)
    }

    async fn list_active_with_progress(
        &self,
        for_user: Uuid,
    ) -> Result<Vec<ChallengeWithProgress>, ChallengeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let challenge_rows: Vec<ChallengeRow> = challenges::table
            .filter(challenges::status.eq(ChallengeStatus::Active.as_str()))
            .order(challenges::reward_points.asc())
            .select(ChallengeRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        let progress_rows: Vec<UserChallengeRow> = user_challenges::table
            .filter(user_challenges::user_id.eq(for_user))
            .select(UserChallengeRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        let mut progress_by_challenge: HashMap<Uuid, UserChallenge> = progress_rows
            .into_iter()
            .map(|row| (row.challenge_id, row_to_user_challenge(row)))
            .collect();

        challenge_rows
            .into_iter()
            .map(|row| {
                let challenge = row_to_challenge(row)?;
                let progress = progress_by_challenge.remove(&challenge.id);
                Ok(ChallengeWithProgress {
                    challenge,
                    progress,
                })
            })
            .collect()
    }

    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<Challenge>, ChallengeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = challenges::table
            .find(id)
            .select(ChallengeRow::as_select())
            .first::<ChallengeRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_challenge).transpose()
    }

    async fn find_user_challenge(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
    ) -> Result<Option<UserChallenge>, ChallengeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = user_challenges::table
            .find((user_id, challenge_id))
            .select(UserChallengeRow::as_select())
            .first::<UserChallengeRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        Ok(row.map(row_to_user_challenge))
    }

    async fn join(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
    ) -> Result<(), ChallengeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = NewUserChallengeRow {
            user_id,
            challenge_id,
            progress: 0,
            completed: false,
            completed_at: None,
        };
        diesel::insert_into(user_challenges::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel)
    }

    async fn upsert_progress(
        &self,
        update: &ProgressUpdate,
    ) -> Result<UserChallenge, ChallengeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let insert = NewUserChallengeRow {
            user_id: update.user_id,
            challenge_id: update.challenge_id,
            progress: update.progress,
            completed: update.completed,
            completed_at: update.completed_at,
        };
        let changes = UserChallengeUpdate {
            progress: update.progress,
            completed: update.completed,
            completed_at: update.completed_at,
            updated_at: Utc::now(),
        };

        let row = diesel::insert_into(user_challenges::table)
            .values(&insert)
            .on_conflict((user_challenges::user_id, user_challenges::challenge_id))
            .do_update()
            .set(&changes)
            .returning(UserChallengeRow::as_returning())
            .get_result::<UserChallengeRow>(&mut conn)
            .await
            .map_err(map_diesel)?;

        Ok(row_to_user_challenge(row))
    }

    async fn award_badge(
        &self,
        user_id: Uuid,
        spec: &BadgeSpec,
    ) -> Result<bool, ChallengeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let new_badge = NewBadgeRow {
            id: Uuid::new_v4(),
            name: spec.name,
            description: spec.description,
            image_url: spec.image_url,
        };

        conn.transaction::<bool, diesel::result::Error, _>(|conn| {
            async move {
                // Upsert the catalogue row; an existing name wins.
                let badge_id = match diesel::insert_into(badges::table)
                    .values(&new_badge)
                    .on_conflict(badges::name)
                    .do_nothing()
                    .returning(badges::id)
                    .get_result::<Uuid>(conn)
                    .await
                    .optional()?
                {
                    Some(id) => id,
                    None => {
                        badges::table
                            .filter(badges::name.eq(new_badge.name))
                            .select(badges::id)
                            .first::<Uuid>(conn)
                            .await?
                    }
                };

                let inserted = diesel::insert_into(user_badges::table)
                    .values(&NewUserBadgeRow { user_id, badge_id })
                    .on_conflict((user_badges::user_id, user_badges::badge_id))
                    .do_nothing()
                    .execute(conn)
                    .await?;

                Ok(inserted > 0)
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel)
    }

    async fn recent_badges(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<EarnedBadge>, ChallengeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<(BadgeRow, DateTime<Utc>)> = user_badges::table
            .inner_join(badges::table)
            .filter(user_badges::user_id.eq(user_id))
            .order(user_badges::earned_at.desc())
            .limit(limit)
            .select((BadgeRow::as_select(), user_badges::earned_at))
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        Ok(rows
            .into_iter()
            .map(|(badge, earned_at)| EarnedBadge {
                badge: row_to_badge(badge),
                earned_at,
            })
            .collect())
    }

    async fn completed_count_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<i64, ChallengeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        user_challenges::table
            .filter(user_challenges::user_id.eq(user_id))
            .filter(user_challenges::completed.eq(true))
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(map_diesel)
    }

    async fn recent_completions(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<CompletedChallenge>, ChallengeRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<(Uuid, String, Option<DateTime<Utc>>)> = user_challenges::table
            .inner_join(challenges::table)
            .filter(user_challenges::user_id.eq(user_id))
            .filter(user_challenges::completed.eq(true))
            .filter(user_challenges::completed_at.ge(since))
            .order(user_challenges::completed_at.desc())
            .limit(limit)
            .select((
                challenges::id,
                challenges::title,
                user_challenges::completed_at,
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        Ok(rows
            .into_iter()
            .filter_map(|(challenge_id, title, completed_at)| {
                completed_at.map(|completed_at| CompletedChallenge {
                    challenge_id,
                    title,
                    completed_at,
                })
            })
            .collect())
    }
}
