//! Learning-session entities and lifecycle rules.
//!
//! Purpose: the scheduled-meeting aggregate (distinct from the HTTP auth
//! session) together with the status machine guarding join, start, and
//! complete transitions.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

/// How far before the scheduled start a host may start the session.
pub const START_WINDOW_MINUTES: i64 = 30;

/// Default participant cap when the creator does not supply one.
pub const DEFAULT_MAX_PARTICIPANTS: i32 = 10;

/// Parse failure for the session enums.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value: {value}")]
pub struct UnknownVariant {
    /// The rejected raw value.
    pub value: String,
}

macro_rules! string_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident { $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize, utoipa::ToSchema,
        )]
        #[serde(rename_all = "SCREAMING_SNAKE_CASE")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Stable storage representation.
            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $text, )+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $text => Ok(Self::$variant), )+
                    other => Err(UnknownVariant { value: other.to_owned() }),
                }
            }
        }
    };
}

pub(crate) use string_enum;

string_enum! {
    /// Lifecycle of a learning session.
    pub enum SessionStatus {
        /// Created and open for joining.
        Scheduled => "SCHEDULED",
        /// Started by the host.
        InProgress => "IN_PROGRESS",
        /// Finished.
        Completed => "COMPLETED",
        /// Abandoned before completion.
        Cancelled => "CANCELLED",
    }
}

string_enum! {
    /// Advertised difficulty of a session.
    pub enum Difficulty {
        /// No prior knowledge expected.
        Beginner => "BEGINNER",
        /// Some familiarity expected.
        Intermediate => "INTERMEDIATE",
        /// Experienced learners.
        Advanced => "ADVANCED",
    }
}

string_enum! {
    /// Role of a participant within a session.
    pub enum ParticipantRole {
        /// The session creator.
        Host => "HOST",
        /// A regular attendee.
        Participant => "PARTICIPANT",
    }
}

string_enum! {
    /// Lifecycle of a participation row.
    pub enum ParticipantStatus {
        /// Enrolled and counted against capacity.
        Joined => "JOINED",
        /// Attending a running session.
        InProgress => "IN_PROGRESS",
        /// Finished the session.
        Completed => "COMPLETED",
        /// Dropped out.
        Cancelled => "CANCELLED",
    }
}

impl ParticipantStatus {
    /// Whether this row counts against session capacity.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Joined | Self::InProgress)
    }
}

/// Meeting details returned by the calendar integration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingDetails {
    /// Join link shared with participants.
    pub meet_link: String,
    /// Calendar event id, kept for later deletion.
    pub event_id: String,
}

/// A scheduled learning meeting.
#[derive(Debug, Clone, PartialEq)]
pub struct LearningSession {
    /// Primary key.
    pub id: Uuid,
    /// Short headline shown in listings.
    pub title: String,
    /// Longer description of the session content.
    pub description: String,
    /// Scheduled start.
    pub start_time: DateTime<Utc>,
    /// Derived end (`start_time + duration`).
    pub end_time: DateTime<Utc>,
    /// Planned length in minutes.
    pub duration_minutes: i32,
    /// Capacity limit for active participants.
    pub max_participants: i32,
    /// Advertised difficulty.
    pub difficulty: Difficulty,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Video-meeting link, once one exists.
    pub meet_link: Option<String>,
    /// Calendar event backing the meeting link.
    pub calendar_event_id: Option<String>,
    /// Creator (host) user id.
    pub created_by: Uuid,
    /// Record creation time.
    pub created_at: DateTime<Utc>,
}

/// Why a start attempt was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StartRefusal {
    /// Only the creator may start a session.
    #[error("only the session creator can start the session")]
    NotCreator,
    /// The session is not in the startable state.
    #[error("session cannot be started from status {status}")]
    WrongStatus {
        /// Current session status.
        status: SessionStatus,
    },
    /// The start window has not opened yet.
    #[error("session cannot be started earlier than {earliest}")]
    TooEarly {
        /// Earliest permitted start instant.
        earliest: DateTime<Utc>,
    },
}

impl LearningSession {
    /// Earliest instant at which the host may start this session.
    pub fn earliest_start(&self) -> DateTime<Utc> {
        self.start_time - Duration::minutes(START_WINDOW_MINUTES)
    }

    /// Check the start transition for `user_id` at `now`.
    ///
    /// # Errors
    /// Returns the applicable [`StartRefusal`]; ordering matters — identity
    /// first, then status, then the time window, matching the API contract.
    pub fn check_start(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<(), StartRefusal> {
        if self.created_by != user_id {
            return Err(StartRefusal::NotCreator);
        }
        if self.status != SessionStatus::Scheduled {
            return Err(StartRefusal::WrongStatus {
                status: self.status,
            });
        }
        let earliest = self.earliest_start();
        if now < earliest {
            return Err(StartRefusal::TooEarly { earliest });
        }
        Ok(())
    }

    /// Whether `active_participants` leaves room for one more.
    pub fn has_capacity(&self, active_participants: i64) -> bool {
        active_participants < i64::from(self.max_participants)
    }
}

/// A user's membership of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionParticipant {
    /// Primary key.
    pub id: Uuid,
    /// Session this row belongs to.
    pub session_id: Uuid,
    /// Participating user.
    pub user_id: Uuid,
    /// Host or regular participant.
    pub role: ParticipantRole,
    /// Participation lifecycle status.
    pub status: ParticipantStatus,
    /// Enrolment time.
    pub joined_at: DateTime<Utc>,
}
