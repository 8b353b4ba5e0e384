//! Port for team, membership, and team-chat persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::team::{Team, TeamMember, TeamMessage, TeamRole};

use super::macros::define_port_error;

define_port_error! {
    /// Errors raised by team repository adapters.
    pub enum TeamRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "team repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "team repository query failed: {message}",
    }
}

/// Payload for inserting a new team.
#[derive(Debug, Clone)]
pub struct NewTeamRecord {
    /// Pre-generated primary key.
    pub id: Uuid,
    /// Team name.
    pub name: String,
    /// What the team is about.
    pub description: String,
    /// Membership cap.
    pub max_members: i32,
    /// Optional joining fee in whole KES.
    pub entry_fee_kes: Option<i64>,
    /// Founding leader.
    pub created_by: Uuid,
}

/// A member as shown in team listings.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamMemberProfile {
    /// Member user id.
    pub user_id: Uuid,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Leader or regular member.
    pub role: TeamRole,
}

/// A team joined with members and challenge counters.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamOverview {
    /// The team itself.
    pub team: Team,
    /// Current members with profile fields.
    pub members: Vec<TeamMemberProfile>,
    /// Team challenges still active.
    pub active_challenges: i64,
    /// Team challenges completed.
    pub completed_challenges: i64,
}

/// A chat message joined with sender profile fields.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamMessageWithSender {
    /// The message itself.
    pub message: TeamMessage,
    /// Sender display name.
    pub sender_name: String,
    /// Sender email.
    pub sender_email: String,
}

/// Payload for posting a chat message.
#[derive(Debug, Clone)]
pub struct NewTeamMessage {
    /// Pre-generated primary key.
    pub id: Uuid,
    /// Target team.
    pub team_id: Uuid,
    /// Author.
    pub sender_id: Uuid,
    /// Message body.
    pub content: String,
}

/// Port for team reads and writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TeamRepository: Send + Sync {
    /// Insert a team and enrol the creator as leader, atomically.
    async fn create(&self, record: &NewTeamRecord) -> Result<Team, TeamRepositoryError>;

    /// All teams, newest first, with members and challenge counters.
    async fn list_overviews(&self) -> Result<Vec<TeamOverview>, TeamRepositoryError>;

    /// Find a team by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Team>, TeamRepositoryError>;

    /// Current member count.
    async fn member_count(&self, team_id: Uuid) -> Result<i64, TeamRepositoryError>;

    /// Find a membership row.
    async fn find_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<TeamMember>, TeamRepositoryError>;

    /// All membership rows of a team.
    async fn members(&self, team_id: Uuid) -> Result<Vec<TeamMember>, TeamRepositoryError>;

    /// The team's leader row, if any.
    async fn leader(&self, team_id: Uuid) -> Result<Option<TeamMember>, TeamRepositoryError>;

    /// Insert a membership row.
    async fn add_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
        role: TeamRole,
    ) -> Result<(), TeamRepositoryError>;

    /// Delete a membership row.
    async fn remove_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), TeamRepositoryError>;

    /// Delete a team and its dependent rows.
    async fn delete(&self, team_id: Uuid) -> Result<(), TeamRepositoryError>;

    /// How many teams the user belongs to.
    async fn membership_count_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<i64, TeamRepositoryError>;

    /// Chat messages, newest first, with sender profiles.
    async fn messages(
        &self,
        team_id: Uuid,
    ) -> Result<Vec<TeamMessageWithSender>, TeamRepositoryError>;

    /// Insert a chat message and return it joined with the sender profile.
    async fn add_message(
        &self,
        record: &NewTeamMessage,
    ) -> Result<TeamMessageWithSender, TeamRepositoryError>;
}
