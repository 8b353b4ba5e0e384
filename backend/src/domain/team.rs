//! Team entities and membership rules.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::session::{UnknownVariant, string_enum};

/// Smallest permitted team.
pub const MIN_TEAM_MEMBERS: i32 = 2;

/// Largest permitted team.
pub const MAX_TEAM_MEMBERS: i32 = 10;

string_enum! {
    /// Lifecycle of a team.
    pub enum TeamStatus {
        /// Open and visible.
        Active => "ACTIVE",
        /// Retired; kept for history.
        Archived => "ARCHIVED",
    }
}

string_enum! {
    /// Role of a member within a team.
    pub enum TeamRole {
        /// The founding member; gatekeeps destructive actions.
        Leader => "LEADER",
        /// A regular member.
        Member => "MEMBER",
    }
}

/// A learning team.
#[derive(Debug, Clone, PartialEq)]
pub struct Team {
    /// Primary key.
    pub id: Uuid,
    /// Team name shown in listings.
    pub name: String,
    /// What the team is about.
    pub description: String,
    /// Lifecycle status.
    pub status: TeamStatus,
    /// Membership cap (within [`MIN_TEAM_MEMBERS`]..=[`MAX_TEAM_MEMBERS`]).
    pub max_members: i32,
    /// Joining fee in whole KES; `None` means the team is free to join.
    pub entry_fee_kes: Option<i64>,
    /// Record creation time.
    pub created_at: DateTime<Utc>,
}

impl Team {
    /// Whether joining this team requires a completed payment.
    pub fn requires_payment(&self) -> bool {
        self.entry_fee_kes.is_some_and(|fee| fee > 0)
    }

    /// Whether `member_count` leaves room for one more member.
    pub fn has_capacity(&self, member_count: i64) -> bool {
        member_count < i64::from(self.max_members)
    }
}

/// Membership row linking a user to a team.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamMember {
    /// Team this row belongs to.
    pub team_id: Uuid,
    /// Member user id.
    pub user_id: Uuid,
    /// Leader or regular member.
    pub role: TeamRole,
    /// Join time.
    pub joined_at: DateTime<Utc>,
}

/// A message posted to a team's chat.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamMessage {
    /// Primary key.
    pub id: Uuid,
    /// Team the message belongs to.
    pub team_id: Uuid,
    /// Author user id.
    pub sender_id: Uuid,
    /// Message body.
    pub content: String,
    /// Send time.
    pub sent_at: DateTime<Utc>,
}

/// Validate a requested membership cap.
///
/// # Errors
/// Returns the human-readable constraint when outside the permitted range.
pub fn validate_max_members(value: i32) -> Result<i32, String> {
    if (MIN_TEAM_MEMBERS..=MAX_TEAM_MEMBERS).contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "team size must be between {MIN_TEAM_MEMBERS} and {MAX_TEAM_MEMBERS} members"
        ))
    }
}
