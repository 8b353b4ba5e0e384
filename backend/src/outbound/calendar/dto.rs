//! Wire types for the Google Calendar events API.

use serde::{Deserialize, Serialize};

/// OAuth token endpoint response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponseDto {
    pub access_token: Option<String>,
}

/// Event insert request body (the subset this service sends).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventRequestDto<'a> {
    pub summary: &'a str,
    pub description: &'a str,
    pub start: EventTimeDto<'a>,
    pub end: EventTimeDto<'a>,
    pub conference_data: ConferenceDataDto<'a>,
    pub visibility: &'a str,
    pub guests_can_modify: bool,
    pub guests_can_see_other_guests: bool,
}

/// Event time boundary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventTimeDto<'a> {
    pub date_time: String,
    pub time_zone: &'a str,
}

/// Conference creation request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConferenceDataDto<'a> {
    pub create_request: CreateConferenceRequestDto<'a>,
}

/// Inner conference request with its idempotency id.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CreateConferenceRequestDto<'a> {
    pub request_id: String,
    pub conference_solution_key: ConferenceSolutionKeyDto<'a>,
}

/// Conference solution selector (`hangoutsMeet`).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConferenceSolutionKeyDto<'a> {
    #[serde(rename = "type")]
    pub kind: &'a str,
}

/// Event insert response (the subset this service reads).
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventResponseDto {
    pub id: Option<String>,
    pub hangout_link: Option<String>,
}
