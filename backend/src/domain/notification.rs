//! In-app notification records.
//!
//! Services emit notifications as a side effect of state changes; this module
//! only defines the record shape and the stable kind codes clients key off.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::session::{UnknownVariant, string_enum};

string_enum! {
    /// Stable notification kind codes consumed by the frontend.
    pub enum NotificationKind {
        /// A session the user created was persisted.
        SessionCreated => "SESSION_CREATED",
        /// Someone joined a session the user hosts.
        SessionJoined => "SESSION_JOINED",
        /// A session the user participates in has started.
        SessionStarted => "SESSION_STARTED",
        /// A participant completed a session the user hosts.
        SessionCompleted => "SESSION_COMPLETED",
        /// A new team appeared on the platform.
        TeamCreated => "TEAM_CREATED",
        /// Someone joined a team the user leads.
        TeamJoined => "TEAM_JOINED",
        /// A member left a team the user belongs to.
        TeamMemberLeft => "TEAM_MEMBER_LEFT",
        /// A message was posted in a team the user belongs to.
        TeamMessage => "TEAM_MESSAGE",
        /// The user earned a badge.
        BadgeEarned => "BADGE_EARNED",
        /// The user completed a challenge.
        ChallengeCompleted => "CHALLENGE_COMPLETED",
        /// Subscription state changed.
        Subscription => "SUBSCRIPTION",
        /// A payment settled (either way).
        Payment => "PAYMENT",
    }
}

string_enum! {
    /// Entity kinds a notification may reference.
    pub enum RelatedEntity {
        /// A learning session.
        Session => "SESSION",
        /// A team.
        Team => "TEAM",
        /// A challenge.
        Challenge => "CHALLENGE",
        /// A subscription.
        Subscription => "SUBSCRIPTION",
        /// A payment record.
        Payment => "PAYMENT",
    }
}

/// A notification delivered to one user.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    /// Primary key.
    pub id: Uuid,
    /// Recipient.
    pub user_id: Uuid,
    /// Short headline.
    pub title: String,
    /// Full message body.
    pub message: String,
    /// Stable kind code.
    pub kind: NotificationKind,
    /// Optional referenced entity kind.
    pub related_entity: Option<RelatedEntity>,
    /// Optional referenced entity id.
    pub related_entity_id: Option<Uuid>,
    /// Whether the user has read it.
    pub read: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Payload used when services enqueue a notification.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    /// Recipient.
    pub user_id: Uuid,
    /// Short headline.
    pub title: String,
    /// Full message body.
    pub message: String,
    /// Stable kind code.
    pub kind: NotificationKind,
    /// Optional referenced entity kind.
    pub related_entity: Option<RelatedEntity>,
    /// Optional referenced entity id.
    pub related_entity_id: Option<Uuid>,
}

impl NewNotification {
    /// Build a notification without a related entity.
    pub fn plain(
        user_id: Uuid,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            title: title.into(),
            message: message.into(),
            kind,
            related_entity: None,
            related_entity_id: None,
        }
    }

    /// Build a notification referencing an entity.
    pub fn about(
        user_id: Uuid,
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        entity: RelatedEntity,
        entity_id: Uuid,
    ) -> Self {
        Self {
            user_id,
            title: title.into(),
            message: message.into(),
            kind,
            related_entity: Some(entity),
            related_entity_id: Some(entity_id),
        }
    }
}
