//! Team use-cases: listing, creation, membership, chat, and paid joins.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use super::challenge::TEAM_PLAYER_BADGE;
use super::error::Error;
use super::notification::{NewNotification, NotificationKind, RelatedEntity};
use super::payment::TeamPayment;
use super::phone::PhoneNumber;
use super::ports::{
    ChallengeRepository, ChallengeRepositoryError, NewTeamMessage, NewTeamPayment, NewTeamRecord,
    NotificationRepository, NotificationRepositoryError, PaymentGateway, PaymentGatewayError,
    PaymentRepository, PaymentRepositoryError, StkPushRequest, TeamMessageWithSender,
    TeamOverview, TeamRepository, TeamRepositoryError, UserRepository, UserRepositoryError,
};
use super::team::{Team, TeamRole, validate_max_members};

fn map_team_error(error: TeamRepositoryError) -> Error {
    match error {
        TeamRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("team repository unavailable: {message}"))
        }
        TeamRepositoryError::Query { message } => {
            Error::internal(format!("team repository error: {message}"))
        }
    }
}

fn map_user_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        other => Error::internal(format!("user repository error: {other}")),
    }
}

fn map_notification_error(error: NotificationRepositoryError) -> Error {
    match error {
        NotificationRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("notification repository unavailable: {message}"))
        }
        NotificationRepositoryError::Query { message } => {
            Error::internal(format!("notification repository error: {message}"))
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

fn map_payment_error(error: PaymentRepositoryError) -> Error {
    match error {
        PaymentRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("payment repository unavailable: {message}"))
        }
        PaymentRepositoryError::Query { message } => {
            Error::internal(format!("payment repository error: {message}"))
        }
    }
}

fn map_gateway_error(error: PaymentGatewayError) -> Error {
    Error::service_unavailable(format!("payment provider unavailable: {error}"))
}

/// Validated payload for creating a team.
#[derive(Debug, Clone)]
pub struct TeamDraft {
    /// Team name.
    pub name: String,
    /// What the team is about.
    pub description: String,
    /// Membership cap.
    pub max_members: i32,
    /// Optional joining fee in whole KES.
    pub entry_fee_kes: Option<i64>,
}

/// Result of leaving a team.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TeamDeparture {
    /// The member was removed; the team lives on.
    Left,
    /// The leader was the last member, so the team was deleted.
    TeamDeleted,
}

/// Team service over the team, user, badge, notification, and payment ports.
#[derive(Clone)]
pub struct TeamService {
    teams: Arc<dyn TeamRepository>,
    users: Arc<dyn UserRepository>,
    challenges: Arc<dyn ChallengeRepository>,
    notifications: Arc<dyn NotificationRepository>,
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
}

impl TeamService {
    /// Create the service from its ports.
    pub fn new(
        teams: Arc<dyn TeamRepository>,
        users: Arc<dyn UserRepository>,
        challenges: Arc<dyn ChallengeRepository>,
        notifications: Arc<dyn NotificationRepository>,
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            teams,
            users,
            challenges,
            notifications,
            payments,
            gateway,
        }
    }

    /// All teams with members and challenge counters.
    pub async fn list(&self) -> Result<Vec<TeamOverview>, Error> {
        self.teams.list_overviews().await.map_err(map_team_error)
    }

    /// Create a team led by the caller and announce it to everyone else.
    pub async fn create(&self, user_id: Uuid, draft: TeamDraft) -> Result<Team, Error> {
        let name = draft.name.trim().to_owned();
        let description = draft.description.trim().to_owned();
        if name.is_empty() || description.is_empty() {
            return Err(Error::invalid_request("name and description are required"));
        }
        let max_members = validate_max_members(draft.max_members)
            .map_err(Error::invalid_request)?;
        if draft.entry_fee_kes.is_some_and(|fee| fee < 0) {
            return Err(Error::invalid_request("entry fee must not be negative"));
        }

        let record = NewTeamRecord {
            id: Uuid::new_v4(),
            name,
            description,
            max_members,
            entry_fee_kes: draft.entry_fee_kes,
            created_by: user_id,
        };
        let team = self.teams.create(&record).await.map_err(map_team_error)?;

        let creator = self.display_name(user_id).await?;
        let others = self
            .users
            .list_ids_except(user_id)
            .await
            .map_err(map_user_error)?;
        let batch: Vec<NewNotification> = others
            .into_iter()
            .map(|recipient| {
                NewNotification::about(
                    recipient,
                    NotificationKind::TeamCreated,
                    "New Team Created",
                    format!("{creator} created a new team: \"{}\"", team.name),
                    RelatedEntity::Team,
                    team.id,
                )
            })
            .collect();
        if !batch.is_empty() {
            self.notifications
                .insert_many(&batch)
                .await
                .map_err(map_notification_error)?;
        }

        Ok(team)
    }

    /// Join a free team directly.
    pub async fn join(&self, user_id: Uuid, team_id: Uuid) -> Result<(), Error> {
        let team = self.find_team(team_id).await?;

        if team.requires_payment() {
            return Err(Error::invalid_request(
                "this team charges an entry fee; initiate a payment to join",
            )
            .with_details(json!({
                "code": "payment_required",
                "entryFeeKes": team.entry_fee_kes,
            })));
        }

        self.check_joinable(&team, user_id).await?;

        self.teams
            .add_member(team_id, user_id, TeamRole::Member)
            .await
            .map_err(map_team_error)?;

        self.after_member_joined(&team, user_id).await
    }

    /// Initiate an STK push for a fee-charging team.
    ///
    /// Membership is granted by the payment callback once the provider
    /// reports success; this only records the pending payment.
    pub async fn initiate_join_payment(
        &self,
        user_id: Uuid,
        team_id: Uuid,
        phone_number: PhoneNumber,
    ) -> Result<TeamPayment, Error> {
        let team = self.find_team(team_id).await?;

        let Some(fee) = team.entry_fee_kes.filter(|fee| *fee > 0) else {
            return Err(Error::invalid_request("this team is free to join"));
        };

        self.check_joinable(&team, user_id).await?;

        let reference: String = format!("TEAM-{}", team_id.simple());
        let ack = self
            .gateway
            .initiate_stk_push(&StkPushRequest {
                phone_number: phone_number.clone(),
                amount_kes: fee,
                account_reference: reference,
                description: "Team fee".to_owned(),
            })
            .await
            .map_err(map_gateway_error)?;

        self.payments
            .create_team_payment(&NewTeamPayment {
                id: Uuid::new_v4(),
                team_id,
                user_id,
                amount_kes: fee,
                phone_number,
                checkout_request_id: ack.checkout_request_id,
            })
            .await
            .map_err(map_payment_error)
    }

    /// Grant membership after a settled payment and run the join side effects.
    pub(crate) async fn admit_paid_member(
        &self,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), Error> {
        let team = self.find_team(team_id).await?;
        if self
            .teams
            .find_member(team_id, user_id)
            .await
            .map_err(map_team_error)?
            .is_some()
        {
            return Ok(());
        }
        self.teams
            .add_member(team_id, user_id, TeamRole::Member)
            .await
            .map_err(map_team_error)?;
        self.after_member_joined(&team, user_id).await
    }

    /// Leave a team; leaders may only leave (and thereby delete) a team they
    /// are the last member of.
    pub async fn leave(&self, user_id: Uuid, team_id: Uuid) -> Result<TeamDeparture, Error> {
        let team = self.find_team(team_id).await?;

        let membership = self
            .teams
            .find_member(team_id, user_id)
            .await
            .map_err(map_team_error)?
            .ok_or_else(|| Error::invalid_request("you are not a member of this team"))?;

        if membership.role == TeamRole::Leader {
            let count = self
                .teams
                .member_count(team_id)
                .await
                .map_err(map_team_error)?;
            if count > 1 {
                return Err(Error::invalid_request(
                    "team leaders cannot leave while other members remain; transfer leadership first",
                ));
            }
            self.teams.delete(team_id).await.map_err(map_team_error)?;
            return Ok(TeamDeparture::TeamDeleted);
        }

        self.teams
            .remove_member(team_id, user_id)
            .await
            .map_err(map_team_error)?;

        let leaver = self.display_name(user_id).await?;
        let remaining = self.teams.members(team_id).await.map_err(map_team_error)?;
        let batch: Vec<NewNotification> = remaining
            .iter()
            .filter(|member| member.user_id != user_id)
            .map(|member| {
                NewNotification::about(
                    member.user_id,
                    NotificationKind::TeamMemberLeft,
                    "Team Member Left",
                    format!("{leaver} has left the team \"{}\"", team.name),
                    RelatedEntity::Team,
                    team_id,
                )
            })
            .collect();
        if !batch.is_empty() {
            self.notifications
                .insert_many(&batch)
                .await
                .map_err(map_notification_error)?;
        }

        Ok(TeamDeparture::Left)
    }

    /// Chat history, newest first.
    pub async fn messages(&self, team_id: Uuid) -> Result<Vec<TeamMessageWithSender>, Error> {
        let _ = self.find_team(team_id).await?;
        self.teams.messages(team_id).await.map_err(map_team_error)
    }

    /// Post a chat message; members only.
    pub async fn post_message(
        &self,
        user_id: Uuid,
        team_id: Uuid,
        content: String,
    ) -> Result<TeamMessageWithSender, Error> {
        let content = content.trim().to_owned();
        if content.is_empty() {
            return Err(Error::invalid_request("message content is required"));
        }

        let team = self.find_team(team_id).await?;
        if self
            .teams
            .find_member(team_id, user_id)
            .await
            .map_err(map_team_error)?
            .is_none()
        {
            return Err(Error::forbidden(
                "you must be a team member to send messages",
            ));
        }

        let message = self
            .teams
            .add_message(&NewTeamMessage {
                id: Uuid::new_v4(),
                team_id,
                sender_id: user_id,
                content,
            })
            .await
            .map_err(map_team_error)?;

        let members = self.teams.members(team_id).await.map_err(map_team_error)?;
        let batch: Vec<NewNotification> = members
            .iter()
            .filter(|member| member.user_id != user_id)
            .map(|member| {
                NewNotification::about(
                    member.user_id,
                    NotificationKind::TeamMessage,
                    "New Team Message",
                    format!(
                        "{} sent a message in the team chat",
                        message.sender_name
                    ),
                    RelatedEntity::Team,
                    team.id,
                )
            })
            .collect();
        if !batch.is_empty() {
            self.notifications
                .insert_many(&batch)
                .await
                .map_err(map_notification_error)?;
        }

        Ok(message)
    }

    async fn find_team(&self, team_id: Uuid) -> Result<Team, Error> {
        self.teams
            .find_by_id(team_id)
            .await
            .map_err(map_team_error)?
            .ok_or_else(|| Error::not_found("team not found"))
    }

    async fn check_joinable(&self, team: &Team, user_id: Uuid) -> Result<(), Error> {
        let count = self
            .teams
            .member_count(team.id)
            .await
            .map_err(map_team_error)?;
        if !team.has_capacity(count) {
            return Err(Error::invalid_request("team is full"));
        }
        if self
            .teams
            .find_member(team.id, user_id)
            .await
            .map_err(map_team_error)?
            .is_some()
        {
            return Err(Error::conflict("already a member of this team"));
        }
        Ok(())
    }

    async fn after_member_joined(&self, team: &Team, user_id: Uuid) -> Result<(), Error> {
        let memberships = self
            .teams
            .membership_count_for_user(user_id)
            .await
            .map_err(map_team_error)?;
        if memberships == 1 {
            let awarded = self
                .challenges
                .award_badge(user_id, &TEAM_PLAYER_BADGE)
                .await
                .map_err(map_challenge_error)?;
            if awarded {
                self.notifications
                    .insert(&NewNotification::plain(
                        user_id,
                        NotificationKind::BadgeEarned,
                        "Badge Earned!",
                        format!(
                            "Congratulations! You've earned the {} badge for joining your first team!",
                            TEAM_PLAYER_BADGE.name
                        ),
                    ))
                    .await
                    .map_err(map_notification_error)?;
            }
        }

        if let Some(leader) = self.teams.leader(team.id).await.map_err(map_team_error)? {
            if leader.user_id != user_id {
                let joiner = self.display_name(user_id).await?;
                self.notifications
                    .insert(&NewNotification::about(
                        leader.user_id,
                        NotificationKind::TeamJoined,
                        "New Team Member",
                        format!("{joiner} has joined your team \"{}\"", team.name),
                        RelatedEntity::Team,
                        team.id,
                    ))
                    .await
                    .map_err(map_notification_error)?;
            }
        }

        Ok(())
    }

    async fn display_name(&self, user_id: Uuid) -> Result<String, Error> {
        Ok(self
            .users
            .find_by_id(user_id)
            .await
            .map_err(map_user_error)?
            .map_or_else(|| "A user".to_owned(), |user| user.name.to_string()))
    }
}

#[cfg(test)]
#[path = "team_service_tests.rs"]
mod tests;
