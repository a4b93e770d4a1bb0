//! Meetings API endpoints
//!
//! Listing, viewing, creating and soft-deleting meetings. There is no way to edit a meeting once
//! it is created.

use axum::Extension;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::meetings;
use crate::meetings::Meeting;
use crate::meetings::MeetingDetails;
use crate::meetings::MeetingDraft;
use crate::meetings::MeetingFilter;
use crate::meetings::MeetingSummary;
use crate::meetings::Related;
use crate::storage::AuditEntry;
use crate::storage::Database;
use crate::users::Role;

use super::AuditTrail;
use super::CurrentUser;
use super::Error;
use super::Form;
use super::PathParameters;
use super::QueryParameters;
use super::Success;
use super::parse_optional_text;

/// Meeting response going to the user, as it is stored
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingResponse {
    pub id: Uuid,
    pub agenda: String,
    pub attendees: Vec<Uuid>,
    pub attendees_lead: Vec<Uuid>,
    pub location: Option<String>,
    pub related: Related,
    pub date_time: Option<String>,
    pub notes: Option<String>,
    pub create_by: Uuid,
    pub timestamp: NaiveDateTime,
    pub deleted: bool,
}

impl MeetingResponse {
    /// Create a response from a [`Meeting`](Meeting)
    fn from_meeting(meeting: Meeting) -> Self {
        Self {
            id: meeting.id,
            agenda: meeting.agenda,
            attendees: meeting.attendees,
            attendees_lead: meeting.attendees_lead,
            location: meeting.location,
            related: meeting.related,
            date_time: meeting.date_time,
            notes: meeting.notes,
            create_by: meeting.create_by,
            timestamp: meeting.timestamp,
            deleted: meeting.deleted,
        }
    }
}

/// List all meetings, optionally filtered by the query string
///
/// Soft-deleted meetings are never listed, a `deleted` query parameter is ignored.
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     'http://localhost:6000/api/meetings?related=Lead'
/// ```
///
/// Response:
/// ```json
/// { "data": [ { "id": "<uuid>", "agenda": "Kick-off", "createdByName": "Jane Doe" ... } ] }
/// ```
pub async fn list(
    Extension(storage): Extension<Database>,
    current_user: CurrentUser,
    QueryParameters(filter): QueryParameters<MeetingFilter>,
) -> Result<Success<Vec<MeetingSummary>>, Error> {
    current_user.role.is_allowed(Role::Manager)?;

    let meetings = meetings::list_meetings(&storage, &filter).await?;

    Ok(Success::ok(meetings))
}

/// View a single meeting, with attendees, leads and creator resolved
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/meetings/<uuid>
/// ```
///
/// Response:
/// ```json
/// { "data": { "id": "<uuid>", "attendees": [ { "fullName": "Alice Adams" } ] ... } }
/// ```
pub async fn single(
    Extension(storage): Extension<Database>,
    current_user: CurrentUser,
    PathParameters(meeting_id): PathParameters<String>,
) -> Result<Success<MeetingDetails>, Error> {
    current_user.role.is_allowed(Role::Manager)?;

    let meeting = meetings::view_meeting(&storage, &meeting_id).await?;

    Ok(Success::ok(meeting))
}

/// Create meeting form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetingForm {
    /// Required
    agenda: Option<String>,

    #[serde(default)]
    attendees: Vec<Uuid>,

    #[serde(default)]
    attendees_lead: Vec<Uuid>,

    location: Option<String>,

    /// Defaults to `None`
    #[serde(default)]
    related: Related,

    date_time: Option<String>,

    notes: Option<String>,

    /// Defaults to the current user
    create_by: Option<Uuid>,
}

/// Create a meeting based on the [`CreateMeetingForm`](CreateMeetingForm) form
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "agenda": "Kick-off", "related": "Contact", "attendees": ["<uuid>"] }' \
///     http://localhost:6000/api/meetings
/// ```
///
/// Response
/// ```json
/// { "data": { "id": "<uuid>", "agenda": "Kick-off", "deleted": false ... } }
/// ```
pub async fn create(
    audit_trail: AuditTrail,
    Extension(storage): Extension<Database>,
    current_user: CurrentUser,
    Form(form): Form<CreateMeetingForm>,
) -> Result<Success<MeetingResponse>, Error> {
    current_user.role.is_allowed(Role::Manager)?;

    let draft = MeetingDraft {
        agenda: form.agenda,
        attendees: form.attendees,
        attendees_lead: form.attendees_lead,
        location: parse_optional_text(form.location),
        related: form.related,
        date_time: parse_optional_text(form.date_time),
        notes: parse_optional_text(form.notes),
        create_by: Some(form.create_by.unwrap_or(current_user.id)),
    };

    let meeting = meetings::create_meeting(&storage, &draft).await?;

    audit_trail
        .register(AuditEntry::CreateMeeting(&meeting))
        .await;

    Ok(Success::created(MeetingResponse::from_meeting(meeting)))
}

/// Response of soft-deleting a single meeting
#[derive(Debug, Serialize)]
pub struct DeleteMeetingResponse {
    message: &'static str,
    meeting: MeetingResponse,
}

/// Soft-delete a meeting
///
/// Deleting an already deleted meeting succeeds again
///
/// Request:
/// ```sh
/// curl -v -XDELETE \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/meetings/<uuid>
/// ```
pub async fn delete(
    audit_trail: AuditTrail,
    Extension(storage): Extension<Database>,
    current_user: CurrentUser,
    PathParameters(meeting_id): PathParameters<String>,
) -> Result<Success<DeleteMeetingResponse>, Error> {
    current_user.role.is_allowed(Role::Manager)?;

    let meeting = meetings::delete_meeting(&storage, &meeting_id).await?;

    audit_trail
        .register(AuditEntry::DeleteMeeting(&meeting))
        .await;

    Ok(Success::ok(DeleteMeetingResponse {
        message: "Meeting marked as deleted",
        meeting: MeetingResponse::from_meeting(meeting),
    }))
}

/// Response of soft-deleting multiple meetings
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteManyResponse {
    message: String,
    modified_count: u64,
}

/// Soft-delete multiple meetings
///
/// The body is a JSON array of meeting IDs. Unknown IDs are ignored as long as at least one
/// meeting matches.
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '["<uuid>", "<uuid>"]' \
///     http://localhost:6000/api/meetings/delete-many
/// ```
///
/// Response
/// ```json
/// { "data": { "message": "2 meetings marked as deleted", "modifiedCount": 2 } }
/// ```
pub async fn delete_many(
    audit_trail: AuditTrail,
    Extension(storage): Extension<Database>,
    current_user: CurrentUser,
    Form(body): Form<Value>,
) -> Result<Success<DeleteManyResponse>, Error> {
    current_user.role.is_allowed(Role::Manager)?;

    let meeting_ids = parse_meeting_ids(body)?;

    let outcome = meetings::delete_meetings(&storage, &meeting_ids).await?;

    audit_trail
        .register(AuditEntry::DeleteMeetings(&outcome.meeting_ids))
        .await;

    Ok(Success::ok(DeleteManyResponse {
        message: format!("{} meetings marked as deleted", outcome.modified),
        modified_count: outcome.modified,
    }))
}

/// Parse the body of [`delete_many`](delete_many), it has to be an array of strings
fn parse_meeting_ids(body: Value) -> Result<Vec<String>, Error> {
    let Value::Array(ids) = body else {
        return Err(Error::bad_request("Invalid or empty meeting IDs"));
    };

    ids.into_iter()
        .map(|id| match id {
            Value::String(id) => Ok(id),
            other => Err(Error::bad_request("Invalid identifier").with_description(other)),
        })
        .collect()
}
