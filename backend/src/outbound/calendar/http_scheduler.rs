//! Reqwest-backed Google Calendar meeting scheduler.
//!
//! Authenticates as a service account (RS256-signed JWT exchanged for an
//! access token) and inserts events with a `hangoutsMeet` conference request.
//! Every failure path logs and yields `None` so meeting creation stays
//! optional for the session flows driving it.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use rand::Rng;
use rand::distributions::Alphanumeric;
use reqwest::{Client, Url};
use serde::Serialize;
use tracing::{debug, error};

use crate::domain::ports::{MeetingRequest, MeetingScheduler};
use crate::domain::session::MeetingDetails;

use super::dto::{
    ConferenceDataDto, ConferenceSolutionKeyDto, CreateConferenceRequestDto, EventRequestDto,
    EventResponseDto, EventTimeDto, TokenResponseDto,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar";
const TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const API_BASE: &str = "https://www.googleapis.com/calendar/v3";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const TOKEN_LIFETIME_SECONDS: i64 = 3600;

/// Service-account credentials for the calendar integration.
#[derive(Debug, Clone)]
pub struct CalendarConfig {
    /// Service account email (the JWT issuer).
    pub client_email: String,
    /// PEM-encoded RSA private key.
    pub private_key_pem: String,
    /// Calendar to insert events into; `primary` by default.
    pub calendar_id: String,
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    exp: i64,
    iat: i64,
}

/// Calendar scheduler speaking HTTP via reqwest.
pub struct CalendarHttpScheduler {
    client: Client,
    config: CalendarConfig,
    encoding_key: EncodingKey,
}

impl std::fmt::Debug for CalendarHttpScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalendarHttpScheduler")
            .field("client", &self.client)
            .field("config", &self.config)
            .field("encoding_key", &"<redacted>")
            .finish()
    }
}

impl CalendarHttpScheduler {
    /// Build a scheduler from service-account credentials.
    ///
    /// # Errors
    /// Returns a descriptive string when the private key cannot be parsed or
    /// the HTTP client cannot be constructed; callers fall back to the
    /// disabled scheduler in that case.
    pub fn new(config: CalendarConfig) -> Result<Self, String> {
        let encoding_key = EncodingKey::from_rsa_pem(config.private_key_pem.as_bytes())
            .map_err(|err| format!("invalid calendar private key: {err}"))?;
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|err| format!("calendar http client: {err}"))?;
        Ok(Self {
            client,
            config,
            encoding_key,
        })
    }

    async fn access_token(&self) -> Option<String> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            iss: &self.config.client_email,
            scope: CALENDAR_SCOPE,
            aud: TOKEN_URI,
            exp: now + TOKEN_LIFETIME_SECONDS,
            iat: now,
        };
        let assertion = match encode(&Header::new(Algorithm::RS256), &claims, &self.encoding_key)
        {
            Ok(assertion) => assertion,
            Err(err) => {
                error!(error = %err, "failed to sign calendar service-account JWT");
                return None;
            }
        };

        let response = self
            .client
            .post(TOKEN_URI)
            .form(&[
                ("grant_type", JWT_BEARER_GRANT),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await;

        let response = match response {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                error!(status = %response.status(), "calendar token request rejected");
                return None;
            }
            Err(err) => {
                error!(error = %err, "calendar token request failed");
                return None;
            }
        };

        match response.json::<TokenResponseDto>().await {
            Ok(dto) => dto.access_token,
            Err(err) => {
                error!(error = %err, "calendar token response could not be decoded");
                None
            }
        }
    }

    fn events_url(&self) -> Option<Url> {
        let raw = format!(
            "{API_BASE}/calendars/{}/events?conferenceDataVersion=1",
            self.config.calendar_id
        );
        match Url::parse(&raw) {
            Ok(url) => Some(url),
            Err(err) => {
                error!(error = %err, "calendar events url invalid");
                None
            }
        }
    }

    fn event_url(&self, event_id: &str) -> Option<Url> {
        let raw = format!(
            "{API_BASE}/calendars/{}/events/{event_id}",
            self.config.calendar_id
        );
        Url::parse(&raw).ok()
    }
}

fn conference_request_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(16)
        .map(char::from)
        .collect()
}

#[async_trait]
impl MeetingScheduler for CalendarHttpScheduler {
    async fn schedule_meeting(&self, request: &MeetingRequest) -> Option<MeetingDetails> {
        let token = self.access_token().await?;
        let url = self.events_url()?;

        let description = format!(
            "Learning session: {}\n\nParticipants can join using this link.",
            request.title
        );
        let payload = EventRequestDto {
            summary: &request.title,
            description: &description,
            start: EventTimeDto {
                date_time: request.start_time.to_rfc3339(),
                time_zone: "UTC",
            },
            end: EventTimeDto {
                date_time: request.end_time.to_rfc3339(),
                time_zone: "UTC",
            },
            conference_data: ConferenceDataDto {
                create_request: CreateConferenceRequestDto {
                    request_id: conference_request_id(),
                    conference_solution_key: ConferenceSolutionKeyDto {
                        kind: "hangoutsMeet",
                    },
                },
            },
            // Attendees are deliberately omitted; the link is shared through
            // the app, which avoids domain-wide delegation requirements.
            visibility: "public",
            guests_can_modify: true,
            guests_can_see_other_guests: true,
        };

        debug!(title = %request.title, "creating calendar event with meet link");
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await;

        let response = match response {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                error!(status = %response.status(), "calendar event insert rejected");
                return None;
            }
            Err(err) => {
                error!(error = %err, "calendar event insert failed");
                return None;
            }
        };

        let dto = match response.json::<EventResponseDto>().await {
            Ok(dto) => dto,
            Err(err) => {
                error!(error = %err, "calendar event response could not be decoded");
                return None;
            }
        };

        match (dto.hangout_link, dto.id) {
            (Some(meet_link), Some(event_id)) => Some(MeetingDetails {
                meet_link,
                event_id,
            }),
            _ => {
                error!("calendar event response carried no meet link");
                None
            }
        }
    }

    async fn cancel_meeting(&self, event_id: &str) {
        let Some(token) = self.access_token().await else {
            return;
        };
        let Some(url) = self.event_url(event_id) else {
            return;
        };

        if let Err(err) = self.client.delete(url).bearer_auth(token).send().await {
            error!(error = %err, event_id, "calendar event deletion failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn conference_request_ids_are_unique_alphanumerics() {
        let first = conference_request_id();
        let second = conference_request_id();
        assert_eq!(first.len(), 16);
        assert!(first.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(first, second);
    }

    #[rstest]
    fn scheduler_rejects_a_malformed_private_key() {
        let err = CalendarHttpScheduler::new(CalendarConfig {
            client_email: "svc@project.iam.gserviceaccount.com".to_owned(),
            private_key_pem: "not a pem".to_owned(),
            calendar_id: "primary".to_owned(),
        })
        .expect_err("bad key rejected");
        assert!(err.contains("invalid calendar private key"));
    }
}
