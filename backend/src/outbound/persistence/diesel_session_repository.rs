//! PostgreSQL-backed `SessionRepository` implementation using Diesel.
//!
//! Multi-row transitions (create with host enrolment, join with stale-row
//! purge, completion) run inside transactions so capacity and status checks
//! never observe half-applied state.

use std::collections::{HashMap, HashSet};
use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use uuid::Uuid;

use crate::domain::ports::{
    NewSessionRecord, SessionDashboard, SessionListing, SessionRepository,
    SessionRepositoryError,
};
use crate::domain::session::{
    Difficulty, LearningSession, MeetingDetails, ParticipantRole, ParticipantStatus,
    SessionParticipant, SessionStatus,
};

use super::error_mapping::{map_diesel_error, map_pool_error};
use super::models::{NewParticipantRow, NewSessionRow, ParticipantRow, SessionRow};
use super::pool::{DbPool, PoolError};
use super::schema::{learning_sessions, session_participants};

const ACTIVE_STATUSES: [&str; 2] = ["JOINED", "IN_PROGRESS"];
const TERMINAL_STATUSES: [&str; 2] = ["COMPLETED", "CANCELLED"];

/// Diesel-backed implementation of the session repository port.
#[derive(Clone)]
pub struct DieselSessionRepository {
    pool: DbPool,
}

impl DieselSessionRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool(error: PoolError) -> SessionRepositoryError {
    map_pool_error(error, SessionRepositoryError::connection)
}

fn map_diesel(error: diesel::result::Error) -> SessionRepositoryError {
    map_diesel_error(
        error,
        SessionRepositoryError::query,
        SessionRepositoryError::connection,
    )
}

fn parse_stored<T: FromStr>(value: &str, what: &str) -> Result<T, SessionRepositoryError>
where
    T::Err: std::fmt::Display,
{
    T::from_str(value)
        .map_err(|err| SessionRepositoryError::query(format!("stored {what} invalid: {err}")))
}

/// Convert a database row into a domain session.
fn row_to_session(row: SessionRow) -> Result<LearningSession, SessionRepositoryError> {
    let SessionRow {
        id,
        title,
        description,
        start_time,
        end_time,
        duration_minutes,
        max_participants,
        difficulty,
        status,
        meet_link,
        calendar_event_id,
        created_by,
        created_at,
        updated_at: _,
    } = row;

    Ok(LearningSession {
        id,
        title,
        description,
        start_time,
        end_time,
        duration_minutes,
        max_participants,
        difficulty: parse_stored::<Difficulty>(&difficulty, "difficulty")?,
        status: parse_stored::<SessionStatus>(&status, "session status")?,
        meet_link,
        calendar_event_id,
        created_by,
        created_at,
    })
}

fn row_to_participant(row: ParticipantRow) -> Result<SessionParticipant, SessionRepositoryError> {
    Ok(SessionParticipant {
        id: row.id,
        session_id: row.session_id,
        user_id: row.user_id,
        role: parse_stored::<ParticipantRole>(&row.role, "participant role")?,
        status: parse_stored::<ParticipantStatus>(&row.status, "participant status")?,
        joined_at: row.joined_at,
    })
}

#[async_trait]
impl SessionRepository for DieselSessionRepository {
    async fn create(
        &self,
        record: &NewSessionRecord,
    ) -> Result<LearningSession, SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let new_session = NewSessionRow {
            id: record.id,
            title: &record.title,
            description: &record.description,
            start_time: record.start_time,
            end_time: record.end_time,
            duration_minutes: record.duration_minutes,
            max_participants: record.max_participants,
            difficulty: record.difficulty.as_str(),
            status: SessionStatus::Scheduled.as_str(),
            created_by: record.created_by,
        };
        let host = NewParticipantRow {
            id: Uuid::new_v4(),
            session_id: record.id,
            user_id: record.created_by,
            role: ParticipantRole::Host.as_str(),
            status: ParticipantStatus::Joined.as_str(),
        };

        let row = conn
            .transaction::<SessionRow, diesel::result::Error, _>(|conn| {
                async move {
                    let row = diesel::insert_into(learning_sessions::table)
                        .values(&new_session)
                        .returning(SessionRow::as_returning())
                        .get_result::<SessionRow>(conn)
                        .await?;

                    diesel::insert_into(session_participants::table)
                        .values(&host)
                        .execute(conn)
                        .await?;

                    Ok(row)
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel)?;

        row_to_session(row)
    }

    async fn list_all(
        &self,
        for_user: Uuid,
    ) -> Result<Vec<SessionListing>, SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<SessionRow> = learning_sessions::table
            .order(learning_sessions::start_time.desc())
            .select(SessionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        let active_rows: Vec<(Uuid, Uuid)> = session_participants::table
            .filter(session_participants::status.eq_any(ACTIVE_STATUSES))
            .select((
                session_participants::session_id,
                session_participants::user_id,
            ))
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        let mut counts: HashMap<Uuid, i64> = HashMap::new();
        let mut joined: HashSet<Uuid> = HashSet::new();
        for (session_id, user_id) in active_rows {
            *counts.entry(session_id).or_insert(0) += 1;
            if user_id == for_user {
                joined.insert(session_id);
            }
        }

        rows.into_iter()
            .map(|row| {
                let session = row_to_session(row)?;
                let active_participants = counts.get(&session.id).copied().unwrap_or(0);
                let listing = SessionListing {
                    joined: joined.contains(&session.id),
                    active_participants,
                    session,
                };
                Ok(listing)
            })
            .collect()
    }

    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<LearningSession>, SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = learning_sessions::table
            .find(id)
            .select(SessionRow::as_select())
            .first::<SessionRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_session).transpose()
    }

    async fn active_participant_count(
        &self,
        session_id: Uuid,
    ) -> Result<i64, SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        session_participants::table
            .filter(session_participants::session_id.eq(session_id))
            .filter(session_participants::status.eq_any(ACTIVE_STATUSES))
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(map_diesel)
    }

    async fn find_active_participation(
        &self,
        session_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<SessionParticipant>, SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let row = session_participants::table
            .filter(session_participants::session_id.eq(session_id))
            .filter(session_participants::user_id.eq(user_id))
            .filter(session_participants::status.eq_any(ACTIVE_STATUSES))
            .select(ParticipantRow::as_select())
            .first::<ParticipantRow>(&mut conn)
            .await
            .optional()
            .map_err(map_diesel)?;

        row.map(row_to_participant).transpose()
    }

    async fn join(
        &self,
        session_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let participant = NewParticipantRow {
            id: Uuid::new_v4(),
            session_id,
            user_id,
            role: ParticipantRole::Participant.as_str(),
            status: ParticipantStatus::Joined.as_str(),
        };

        conn.transaction::<(), diesel::result::Error, _>(|conn| {
            async move {
                // Drop stale terminal rows so the unique active row can be
                // recreated after a previous completion or cancellation.
                diesel::delete(
                    session_participants::table
                        .filter(session_participants::session_id.eq(session_id))
                        .filter(session_participants::user_id.eq(user_id))
                        .filter(session_participants::status.eq_any(TERMINAL_STATUSES)),
                )
                .execute(conn)
                .await?;

                diesel::insert_into(session_participants::table)
                    .values(&participant)
                    .execute(conn)
                    .await?;

                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel)
    }

    async fn participants(
        &self,
        session_id: Uuid,
    ) -> Result<Vec<SessionParticipant>, SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let rows: Vec<ParticipantRow> = session_participants::table
            .filter(session_participants::session_id.eq(session_id))
            .order(session_participants::joined_at.asc())
            .select(ParticipantRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows.into_iter().map(row_to_participant).collect()
    }

    async fn set_meeting(
        &self,
        session_id: Uuid,
        meeting: &MeetingDetails,
    ) -> Result<(), SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        diesel::update(learning_sessions::table.find(session_id))
            .set((
                learning_sessions::meet_link.eq(&meeting.meet_link),
                learning_sessions::calendar_event_id.eq(&meeting.event_id),
                learning_sessions::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel)
    }

    async fn mark_started(&self, session_id: Uuid) -> Result<(), SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        diesel::update(learning_sessions::table.find(session_id))
            .set((
                learning_sessions::status.eq(SessionStatus::InProgress.as_str()),
                learning_sessions::updated_at.eq(Utc::now()),
            ))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel)
    }

    async fn complete(
        &self,
        session_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;
        let now = Utc::now();

        conn.transaction::<(), diesel::result::Error, _>(|conn| {
            async move {
                diesel::update(learning_sessions::table.find(session_id))
                    .set((
                        learning_sessions::status.eq(SessionStatus::Completed.as_str()),
                        learning_sessions::updated_at.eq(now),
                    ))
                    .execute(conn)
                    .await?;

                diesel::update(
                    session_participants::table
                        .filter(session_participants::session_id.eq(session_id))
                        .filter(session_participants::user_id.eq(user_id)),
                )
                .set((
                    session_participants::status.eq(ParticipantStatus::Completed.as_str()),
                    session_participants::updated_at.eq(now),
                ))
                .execute(conn)
                .await?;

                Ok(())
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel)
    }

    async fn completed_count_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<i64, SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        session_participants::table
            .filter(session_participants::user_id.eq(user_id))
            .filter(session_participants::status.eq(ParticipantStatus::Completed.as_str()))
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(map_diesel)
    }

    async fn dashboard_stats(
        &self,
        user_id: Uuid,
    ) -> Result<SessionDashboard, SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let created: Vec<(Uuid, String)> = learning_sessions::table
            .filter(learning_sessions::created_by.eq(user_id))
            .select((learning_sessions::id, learning_sessions::status))
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        let joined: Vec<(Uuid, String)> = session_participants::table
            .inner_join(learning_sessions::table)
            .filter(session_participants::user_id.eq(user_id))
            .select((learning_sessions::id, learning_sessions::status))
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        let mut statuses: HashMap<Uuid, String> = HashMap::new();
        for (id, status) in created.into_iter().chain(joined) {
            statuses.insert(id, status);
        }
        let total_sessions = statuses.len() as i64;
        let completed_sessions = statuses
            .values()
            .filter(|status| status.as_str() == SessionStatus::Completed.as_str())
            .count() as i64;

        let active_joined = session_participants::table
            .inner_join(learning_sessions::table)
            .filter(session_participants::user_id.eq(user_id))
            .filter(session_participants::status.eq(ParticipantStatus::Joined.as_str()))
            .filter(learning_sessions::status.eq(SessionStatus::InProgress.as_str()))
            .count()
            .get_result::<i64>(&mut conn)
            .await
            .map_err(map_diesel)?;

        Ok(SessionDashboard {
            total_sessions,
            completed_sessions,
            active_joined,
        })
    }

    async fn upcoming_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<LearningSession>, SessionRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool)?;

        let participating = session_participants::table
            .filter(session_participants::user_id.eq(user_id))
            .select(session_participants::session_id);

        let rows: Vec<SessionRow> = learning_sessions::table
            .filter(
                learning_sessions::created_by
                    .eq(user_id)
                    .or(learning_sessions::id.eq_any(participating)),
            )
            .filter(learning_sessions::status.eq(SessionStatus::Scheduled.as_str()))
            .filter(learning_sessions::start_time.ge(Utc::now()))
            .order(learning_sessions::start_time.asc())
            .limit(limit)
            .select(SessionRow::as_select())
            .load(&mut conn)
            .await
            .map_err(map_diesel)?;

        rows.into_iter().map(row_to_session).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn valid_row() -> SessionRow {
        let start = Utc::now();
        SessionRow {
            id: Uuid::new_v4(),
            title: "t".to_owned(),
            description: "d".to_owned(),
            start_time: start,
            end_time: start,
            duration_minutes: 60,
            max_participants: 10,
            difficulty: "INTERMEDIATE".to_owned(),
            status: "SCHEDULED".to_owned(),
            meet_link: None,
            calendar_event_id: None,
            created_by: Uuid::new_v4(),
            created_at: start,
            updated_at: start,
        }
    }

    #[rstest]
    fn row_conversion_parses_enums(valid_row: SessionRow) {
        let session = row_to_session(valid_row).expect("valid row converts");
        assert_eq!(session.status, SessionStatus::Scheduled);
        assert_eq!(session.difficulty, Difficulty::Intermediate);
    }

    #[rstest]
    fn row_conversion_rejects_unknown_status(mut valid_row: SessionRow) {
        valid_row.status = "PAUSED".to_owned();
        let error = row_to_session(valid_row).expect_err("unknown status rejected");
        assert!(error.to_string().contains("stored session status invalid"));
    }

    #[rstest]
    fn pool_errors_become_connection_errors() {
        let error = map_pool(PoolError::checkout("no connections"));
        assert!(matches!(error, SessionRepositoryError::Connection { .. }));
    }
}
