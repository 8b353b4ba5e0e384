//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the deployed schema exactly; Diesel uses them
//! for type-safe SQL generation. Regenerate with `diesel print-schema` when
//! the schema changes.

diesel::table! {
    /// Registered accounts.
    users (id) {
        /// Primary key: UUID v4 identifier.
        id -> Uuid,
        /// Display name.
        name -> Varchar,
        /// Unique login email, stored lower-cased.
        email -> Varchar,
        /// Argon2 PHC password hash.
        password_hash -> Text,
        /// Optional profile bio.
        bio -> Nullable<Text>,
        /// Record creation timestamp.
        created_at -> Timestamptz,
        /// Last modification timestamp.
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Scheduled learning meetings.
    learning_sessions (id) {
        id -> Uuid,
        title -> Varchar,
        description -> Text,
        start_time -> Timestamptz,
        end_time -> Timestamptz,
        duration_minutes -> Int4,
        max_participants -> Int4,
        difficulty -> Varchar,
        status -> Varchar,
        meet_link -> Nullable<Text>,
        calendar_event_id -> Nullable<Text>,
        created_by -> Uuid,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Session membership rows; one active row per (session, user).
    session_participants (id) {
        id -> Uuid,
        session_id -> Uuid,
        user_id -> Uuid,
        role -> Varchar,
        status -> Varchar,
        joined_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Learning teams.
    teams (id) {
        id -> Uuid,
        name -> Varchar,
        description -> Text,
        status -> Varchar,
        max_members -> Int4,
        /// Joining fee in whole KES; null means free.
        entry_fee_kes -> Nullable<Int8>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Team membership; composite key (team, user).
    team_members (team_id, user_id) {
        team_id -> Uuid,
        user_id -> Uuid,
        role -> Varchar,
        joined_at -> Timestamptz,
    }
}

diesel::table! {
    /// Team chat messages.
    team_messages (id) {
        id -> Uuid,
        team_id -> Uuid,
        sender_id -> Uuid,
        content -> Text,
        sent_at -> Timestamptz,
    }
}

diesel::table! {
    /// Gamified challenges.
    challenges (id) {
        id -> Uuid,
        title -> Varchar,
        description -> Text,
        goal_target -> Int4,
        reward_points -> Int4,
        status -> Varchar,
        team_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-user challenge progress; composite key (user, challenge).
    user_challenges (user_id, challenge_id) {
        user_id -> Uuid,
        challenge_id -> Uuid,
        progress -> Int4,
        completed -> Bool,
        completed_at -> Nullable<Timestamptz>,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Badge catalogue, keyed by unique name.
    badges (id) {
        id -> Uuid,
        name -> Varchar,
        description -> Text,
        image_url -> Text,
    }
}

diesel::table! {
    /// Badges held by users; composite key (user, badge).
    user_badges (user_id, badge_id) {
        user_id -> Uuid,
        badge_id -> Uuid,
        earned_at -> Timestamptz,
    }
}

diesel::table! {
    /// Purchasable subscription tiers.
    subscription_plans (id) {
        id -> Uuid,
        name -> Varchar,
        description -> Text,
        /// Whole KES; zero means free.
        price_monthly_kes -> Int8,
        price_yearly_kes -> Int8,
        max_sessions_per_week -> Int4,
        can_create_private_teams -> Bool,
        has_priority_booking -> Bool,
        has_advanced_analytics -> Bool,
    }
}

diesel::table! {
    /// Subscriptions; at most one active row per user.
    user_subscriptions (id) {
        id -> Uuid,
        user_id -> Uuid,
        plan_id -> Uuid,
        start_date -> Timestamptz,
        end_date -> Nullable<Timestamptz>,
        is_active -> Bool,
        billing_cycle -> Varchar,
        payment_method -> Varchar,
    }
}

diesel::table! {
    /// Subscription purchases awaiting or past settlement.
    subscription_payments (id) {
        id -> Uuid,
        user_id -> Uuid,
        plan_id -> Uuid,
        amount_kes -> Int8,
        currency -> Varchar,
        status -> Varchar,
        phone_number -> Varchar,
        checkout_request_id -> Varchar,
        receipt_number -> Nullable<Varchar>,
        completed_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Team joining fees awaiting or past settlement.
    team_payments (id) {
        id -> Uuid,
        team_id -> Uuid,
        user_id -> Uuid,
        amount_kes -> Int8,
        status -> Varchar,
        phone_number -> Varchar,
        checkout_request_id -> Varchar,
        receipt_number -> Nullable<Varchar>,
        completed_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// In-app notifications.
    notifications (id) {
        id -> Uuid,
        user_id -> Uuid,
        title -> Varchar,
        message -> Text,
        kind -> Varchar,
        related_entity -> Nullable<Varchar>,
        related_entity_id -> Nullable<Uuid>,
        read -> Bool,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(learning_sessions -> users (created_by));
diesel::joinable!(session_participants -> learning_sessions (session_id));
diesel::joinable!(session_participants -> users (user_id));
diesel::joinable!(team_members -> teams (team_id));
diesel::joinable!(team_members -> users (user_id));
diesel::joinable!(team_messages -> teams (team_id));
diesel::joinable!(team_messages -> users (sender_id));
diesel::joinable!(challenges -> teams (team_id));
diesel::joinable!(user_challenges -> challenges (challenge_id));
diesel::joinable!(user_challenges -> users (user_id));
diesel::joinable!(user_badges -> badges (badge_id));
diesel::joinable!(user_badges -> users (user_id));
diesel::joinable!(user_subscriptions -> subscription_plans (plan_id));
diesel::joinable!(user_subscriptions -> users (user_id));
diesel::joinable!(subscription_payments -> subscription_plans (plan_id));
diesel::joinable!(subscription_payments -> users (user_id));
diesel::joinable!(team_payments -> teams (team_id));
diesel::joinable!(team_payments -> users (user_id));
diesel::joinable!(notifications -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    learning_sessions,
    session_participants,
    teams,
    team_members,
    team_messages,
    challenges,
    user_challenges,
    badges,
    user_badges,
    subscription_plans,
    user_subscriptions,
    subscription_payments,
    team_payments,
    notifications,
);
