//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use super::schema::{
    badges, challenges, learning_sessions, notifications, session_participants,
    subscription_payments, subscription_plans, team_members, team_messages, team_payments,
    teams, user_badges, user_challenges, user_subscriptions, users,
};

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[expect(dead_code, reason = "credentials are loaded through a narrower select")]
    pub password_hash: String,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    #[expect(dead_code, reason = "schema field read for completeness")]
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
}

/// Changeset for profile updates.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ProfileUpdate<'a> {
    pub name: &'a str,
    pub bio: Option<&'a str>,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Learning sessions
// ---------------------------------------------------------------------------

/// Row struct for reading from the learning_sessions table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = learning_sessions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SessionRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub max_participants: i32,
    pub difficulty: String,
    pub status: String,
    pub meet_link: Option<String>,
    pub calendar_event_id: Option<String>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    #[expect(dead_code, reason = "schema field read for completeness")]
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new session records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = learning_sessions)]
pub(crate) struct NewSessionRow<'a> {
    pub id: Uuid,
    pub title: &'a str,
    pub description: &'a str,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i32,
    pub max_participants: i32,
    pub difficulty: &'a str,
    pub status: &'a str,
    pub created_by: Uuid,
}

/// Row struct for reading from the session_participants table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = session_participants)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ParticipantRow {
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub status: String,
    pub joined_at: DateTime<Utc>,
    #[expect(dead_code, reason = "schema field read for completeness")]
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for enrolling a participant.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = session_participants)]
pub(crate) struct NewParticipantRow<'a> {
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub role: &'a str,
    pub status: &'a str,
}

// ---------------------------------------------------------------------------
// Teams
// ---------------------------------------------------------------------------

/// Row struct for reading from the teams table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = teams)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TeamRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub status: String,
    pub max_members: i32,
    pub entry_fee_kes: Option<i64>,
    pub created_at: DateTime<Utc>,
    #[expect(dead_code, reason = "schema field read for completeness")]
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new team records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = teams)]
pub(crate) struct NewTeamRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub description: &'a str,
    pub status: &'a str,
    pub max_members: i32,
    pub entry_fee_kes: Option<i64>,
}

/// Row struct for reading from the team_members table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = team_members)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TeamMemberRow {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: String,
    pub joined_at: DateTime<Utc>,
}

/// Insertable struct for enrolling a team member.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = team_members)]
pub(crate) struct NewTeamMemberRow<'a> {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: &'a str,
}

/// Row struct for reading from the team_messages table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = team_messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TeamMessageRow {
    pub id: Uuid,
    pub team_id: Uuid,
    pub sender_id: Uuid,
    pub content: String,
    pub sent_at: DateTime<Utc>,
}

/// Insertable struct for posting a team message.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = team_messages)]
pub(crate) struct NewTeamMessageRow<'a> {
    pub id: Uuid,
    pub team_id: Uuid,
    pub sender_id: Uuid,
    pub content: &'a str,
}

// ---------------------------------------------------------------------------
// Challenges and badges
// ---------------------------------------------------------------------------

/// Row struct for reading from the challenges table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = challenges)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ChallengeRow {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub goal_target: i32,
    pub reward_points: i32,
    pub status: String,
    pub team_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    #[expect(dead_code, reason = "schema field read for completeness")]
    pub updated_at: DateTime<Utc>,
}

/// Insertable struct for creating new challenge records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = challenges)]
pub(crate) struct NewChallengeRow<'a> {
    pub id: Uuid,
    pub title: &'a str,
    pub description: &'a str,
    pub goal_target: i32,
    pub reward_points: i32,
    pub status: &'a str,
    pub team_id: Option<Uuid>,
}

/// Row struct for reading from the user_challenges table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = user_challenges)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserChallengeRow {
    pub user_id: Uuid,
    pub challenge_id: Uuid,
    pub progress: i32,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    #[expect(dead_code, reason = "schema field read for completeness")]
    pub updated_at: DateTime<Utc>,
}

/// Insertable/upsert struct for progress rows.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_challenges)]
pub(crate) struct NewUserChallengeRow {
    pub user_id: Uuid,
    pub challenge_id: Uuid,
    pub progress: i32,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Changeset applied when a progress row already exists.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = user_challenges)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserChallengeUpdate {
    pub progress: i32,
    pub completed: bool,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

/// Row struct for reading from the badges table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = badges)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BadgeRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub image_url: String,
}

/// Insertable struct for the badge catalogue.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = badges)]
pub(crate) struct NewBadgeRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub description: &'a str,
    pub image_url: &'a str,
}

/// Insertable struct for awarding a badge.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_badges)]
pub(crate) struct NewUserBadgeRow {
    pub user_id: Uuid,
    pub badge_id: Uuid,
}

// ---------------------------------------------------------------------------
// Subscriptions and payments
// ---------------------------------------------------------------------------

/// Row struct for reading from the subscription_plans table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = subscription_plans)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PlanRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price_monthly_kes: i64,
    pub price_yearly_kes: i64,
    pub max_sessions_per_week: i32,
    pub can_create_private_teams: bool,
    pub has_priority_booking: bool,
    pub has_advanced_analytics: bool,
}

/// Insertable struct for seeding plans.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = subscription_plans)]
pub(crate) struct NewPlanRow<'a> {
    pub id: Uuid,
    pub name: &'a str,
    pub description: &'a str,
    pub price_monthly_kes: i64,
    pub price_yearly_kes: i64,
    pub max_sessions_per_week: i32,
    pub can_create_private_teams: bool,
    pub has_priority_booking: bool,
    pub has_advanced_analytics: bool,
}

/// Row struct for reading from the user_subscriptions table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = user_subscriptions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SubscriptionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub billing_cycle: String,
    pub payment_method: String,
}

/// Insertable struct for activating a subscription.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_subscriptions)]
pub(crate) struct NewSubscriptionRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: Option<DateTime<Utc>>,
    pub is_active: bool,
    pub billing_cycle: &'a str,
    pub payment_method: &'a str,
}

/// Row struct for reading from the subscription_payments table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = subscription_payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct SubscriptionPaymentRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub amount_kes: i64,
    pub currency: String,
    pub status: String,
    pub phone_number: String,
    pub checkout_request_id: String,
    pub receipt_number: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for recording an initiated subscription payment.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = subscription_payments)]
pub(crate) struct NewSubscriptionPaymentRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub amount_kes: i64,
    pub currency: &'a str,
    pub status: &'a str,
    pub phone_number: &'a str,
    pub checkout_request_id: &'a str,
}

/// Row struct for reading from the team_payments table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = team_payments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct TeamPaymentRow {
    pub id: Uuid,
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub amount_kes: i64,
    pub status: String,
    pub phone_number: String,
    pub checkout_request_id: String,
    pub receipt_number: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for recording an initiated team payment.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = team_payments)]
pub(crate) struct NewTeamPaymentRow<'a> {
    pub id: Uuid,
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub amount_kes: i64,
    pub status: &'a str,
    pub phone_number: &'a str,
    pub checkout_request_id: &'a str,
}

// ---------------------------------------------------------------------------
// Notifications
// ---------------------------------------------------------------------------

/// Row struct for reading from the notifications table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = notifications)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct NotificationRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub message: String,
    pub kind: String,
    pub related_entity: Option<String>,
    pub related_entity_id: Option<Uuid>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Insertable struct for creating notifications.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = notifications)]
pub(crate) struct NewNotificationRow<'a> {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: &'a str,
    pub message: &'a str,
    pub kind: &'a str,
    pub related_entity: Option<&'a str>,
    pub related_entity_id: Option<Uuid>,
}
