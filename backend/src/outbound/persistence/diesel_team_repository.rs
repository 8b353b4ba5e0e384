//! PostgreSQL-backed `TeamRepository` implementation using Diesel.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::challenge::ChallengeStatus;
use crate::domain::ports::{
    NewTeamMessage, NewTeamRecord, TeamMemberProfile, TeamMessageWithSender, TeamOverview,
    TeamRepository, TeamRepositoryError,
};
use crate::domain::team::{Team, TeamMember, TeamMessage, TeamRole, TeamStatus};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{
    NewTeamMemberRow, NewTeamMessageRow, NewTeamRow, TeamMemberRow, TeamMessageRow, TeamRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{challenges, team_members, team_messages, teams, users};

/// Diesel-backed implementation of the team repository port.
#[derive(Clone)]
pub struct DieselTeamRepository {
    pool: DbPool,
}

impl DieselTeamRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> TeamRepositoryError {
    map_pool_error(error, TeamRepositoryError::connection)
}

fn map_diesel(error: diesel::result::Error) -> TeamRepositoryError {
    map_diesel_error(
        error,
        TeamRepositoryError::query,
        TeamRepositoryError::connection,
    )
}

fn parse_stored<T: FromStr>(value: &str, what: &str) -> Result<T, TeamRepositoryError>
where
    T::Err: std::fmt::Display,
{
    T::from_str(value)
        .map_err(|err| TeamRepositoryError::query(format!("stored {what} invalid: {err}")))
}

fn row_to_team(row: TeamRow) -> Result<Team, TeamRepositoryError> {
    Ok(Team {
        id: row.id,
        name: row.name,
        description: row.description,
        status: parse_stored::<TeamStatus>(&row.status, "team status")?,
        max_members: row.max_members,
        entry_fee_kes: row.entry_fee_kes,
        created_at: row.created_at,
    })
}

fn row_to_member(row: TeamMemberRow) -> Result<TeamMember, TeamRepositoryError> {
    Ok(TeamMember {
        team_id: row.team_id,
        user_id: row.user_id,
        role: parse_stored::<TeamRole>(&row.role, "team role")?,
        joined_at: row.joined_at,
    })
}

fn message_with_sender(
    row: TeamMessageRow,
    sender_name: String,
    sender_email: String,
) -> TeamMessageWithSender {
    TeamMessageWithSender {
        message: TeamMessage {
            id: row.id,
            team_id: row.team_id,
            sender_id: row.sender_id,
            content: row.content,
            sent_at: row.sent_at,
        },
        sender_name,
        sender_email,
    }
}

#[async_trait]
impl TeamRepository for DieselTeamRepository {
    async fn create(&self, record: &NewTeamRecord) -> Result<Team, TeamRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let new_team = NewTeamRow {
            id: record.id,
            name: &record.name,
            description: &record.description,
            status: TeamStatus::Active.as_str(),
            max_members: record.max_members,
            entry_fee_kes: record.entry_fee_kes,
        };
        let leader = NewTeamMemberRow {
            team_id: record.id,
            user_id: record.created_by,
            role: TeamRole::Leader.as_str(),
        };

        let row = conn
            .transaction::<TeamRow, diesel::result::Error, _>(|conn| {
                async move {
                    let row = diesel::insert_into(teams::table)
                        .values(&new_team)
                        .returning(TeamRow::as_returning())
                        .get_result::<TeamRow>(conn)
                        .await?;

                    diesel::insert_into(team_members::table)
                        .values(&leader)
                        .execute(conn)
                        .await?;

                    Ok(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel)?;

        row_to_team(row)
    }

    async fn list_overviews(&self) -> Result<Vec<TeamOverview>, TeamRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let team_rows: Vec<TeamRow> = teams::table
            .order(teams::created_at.desc())
            .select(TeamRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        let member_rows: Vec<(TeamMemberRow, String, String)> = team_members::table
            .inner_join(users::table)
            .select((TeamMemberRow::as_select(), users::name, users::email))
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        let challenge_rows: Vec<(Option<Uuid>, String)> = challenges::table
            .filter(challenges::team_id.is_not_null())
            .select((challenges::team_id, challenges::status))
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        let mut members_by_team: HashMap<Uuid, Vec<TeamMemberProfile>> = HashMap::new();
        for (row, name, email) in member_rows {
            let role = parse_stored::<TeamRole>(&row.role, "team role")?;
            members_by_team
                .entry(row.team_id)
                .or_default()
                .push(TeamMemberProfile {
                    user_id: row.user_id,
                    name,
                    email,
                    role,
                });
        }

        let mut active_by_team: HashMap<Uuid, i64> = HashMap::new();
        let mut completed_by_team: HashMap<Uuid, i64> = HashMap::new();
        for (team_id, status) in challenge_rows {
            let Some(team_id) = team_id else { continue };
            if status == ChallengeStatus::Active.as_str() {
                *active_by_team.entry(team_id).or_insert(0) += 1;
            } else if status == ChallengeStatus::Completed.as_str() {
                *completed_by_team.entry(team_id).or_insert(0) += 1;
            }
        }

        team_rows
            .into_iter()
            .map(|row| {
                let team = row_to_team(row)?;
                let members = members_by_team.remove(&team.id).unwrap_or_default();
                let overview = TeamOverview {
                    active_challenges: active_by_team.get(&team.id).copied().unwrap_or(0),
                    completed_challenges: completed_by_team.get(&team.id).copied().unwrap_or(0),
                    members,
                    team,
                };
                Ok(overview)
            })
            .collect()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Team>, TeamRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = teams::table
            .find(id)
            .select(TeamRow::as_select())
            .first::<TeamRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_team).transpose()
    }

    async fn member_count(&self, team_id: Uuid) -> Result<i64, TeamRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        team_members::table
            .filter(team_members::team_id.eq(team_id))
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(map_diesel)
    }

    async fn find_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<TeamMember>, TeamRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = team_members::table
            .find((team_id, user_id))
            .select(TeamMemberRow::as_select())
            .first::<TeamMemberRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_member).transpose()
    }

    async fn members(&self, team_id: Uuid) -> Result<Vec<TeamMember>, TeamRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<TeamMemberRow> = team_members::table
            .filter(team_members::team_id.eq(team_id))
            .order(team_members::joined_at.asc())
            .select(TeamMemberRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows.into_iter().map(row_to_member).collect()
    }

    async fn leader(&self, team_id: Uuid) -> Result<Option<TeamMember>, TeamRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = team_members::table
            .filter(team_members::team_id.eq(team_id))
            .filter(team_members::role.eq(TeamRole::Leader.as_str()))
            .select(TeamMemberRow::as_select())
            .first::<TeamMemberRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_member).transpose()
    }

    async fn add_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        role: TeamRole,
    ) -> Result<(), TeamRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let member = NewTeamMemberRow {
            team_id,
            user_id,
            role: role.as_str(),
        };
        diesel::insert_into(team_members::table)
            .values(&member)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel)
    }

    async fn remove_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), TeamRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        diesel::delete(team_members::table.find((team_id, user_id)))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel)
    }

    async fn delete(&self, team_id: Uuid) -> Result<(), TeamRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        conn.transaction::<(), diesel::result::Error, _>(|conn| {
            async move {
                diesel::delete(
                    team_messages::table.filter(team_messages::team_id.eq(team_id)),
                )
                .execute(conn)
                .await?;
                diesel::delete(team_members::table.filter(team_members::team_id.eq(team_id)))
                    .execute(conn)
                    .await?;
                diesel::delete(teams::table.find(team_id)).execute(conn).await?;
                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel)
    }

    async fn membership_count_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<i64, TeamRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        team_members::table
            .filter(team_members::user_id.eq(user_id))
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(map_diesel)
    }

    async fn messages(
        &self,
        team_id: Uuid,
    ) -> Result<Vec<TeamMessageWithSender>, TeamRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<(TeamMessageRow, String, String)> = team_messages::table
            .inner_join(users::table)
            .filter(team_messages::team_id.eq(team_id))
            .order(team_messages::sent_at.desc())
            .select((TeamMessageRow::as_select(), users::name, users::email))
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        Ok(rows
            .into_iter()
            .map(|(row, name, email)| message_with_sender(row, name, email))
            .collect())
    }

    async fn add_message(
        &self,
        record: &NewTeamMessage,
    ) -> Result<TeamMessageWithSender, TeamRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let new_message = NewTeamMessageRow {
            id: record.id,
            team_id: record.team_id,
            sender_id: record.sender_id,
            content: &record.content,
        };
        let row = diesel::insert_into(team_messages::table)
            .values(&new_message)
            .returning(TeamMessageRow::as_returning())
            .get_result::<TeamMessageRow>(&mut conn)
            .await
            .map_err(map_diesel)?;

        let (name, email) = users::table
            .find(record.sender_id)
            .select((users::name, users::email))
            .first::<(String, String)>(&mut conn)
            .await
            .map_err(map_diesel)?;

        Ok(message_with_sender(row, name, email))
    }
}
