//! Meetings
//!
//! Meeting records with their read-side shaping and soft-delete semantics. A meeting is never
//! updated in place, except for its `deleted` flag, and never removed from storage.

use chrono::naive::NaiveDateTime;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::storage;

pub use listing::MeetingSummary;
pub use listing::list_meetings;
pub use mutations::MeetingDraft;
pub use mutations::create_meeting;
pub use mutations::delete_meeting;
pub use mutations::delete_meetings;
pub use resolver::MeetingDetails;
pub use resolver::view_meeting;

mod listing;
mod mutations;
mod resolver;

/// Which attendee list of a meeting is in use
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq, Serialize)]
pub enum Related {
    /// `attendees` holds the contacts
    Contact,

    /// `attendees_lead` holds the leads
    Lead,

    /// Neither list is in use
    #[default]
    None,
}

/// A meeting as it is stored
#[derive(Clone, Debug)]
pub struct Meeting {
    /// Meeting ID
    pub id: Uuid,

    /// What the meeting is about
    pub agenda: String,

    /// Referenced contacts, in the order they were picked
    pub attendees: Vec<Uuid>,

    /// Referenced leads, in the order they were picked
    pub attendees_lead: Vec<Uuid>,

    /// Where the meeting takes place
    pub location: Option<String>,

    /// Which attendee list is in use
    pub related: Related,

    /// When the meeting takes place, as entered
    pub date_time: Option<String>,

    /// Free text notes
    pub notes: Option<String>,

    /// The user that created the meeting
    pub create_by: Uuid,

    /// Creation date
    pub timestamp: NaiveDateTime,

    /// Soft-delete flag
    pub deleted: bool,
}

/// Caller supplied filter for listing meetings
///
/// Every field that is set must match. There is no `deleted` field, listing only
/// ever returns meetings that are not soft-deleted, whatever the caller asks for.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingFilter {
    /// Exact agenda
    pub agenda: Option<String>,

    /// Exact location
    pub location: Option<String>,

    /// Attendee list in use
    pub related: Option<Related>,

    /// Exact date-time text
    pub date_time: Option<String>,

    /// Exact notes
    pub notes: Option<String>,

    /// Creator of the meeting
    pub create_by: Option<Uuid>,

    /// Meeting has this contact as attendee
    pub attendees: Option<Uuid>,

    /// Meeting has this lead as attendee
    pub attendees_lead: Option<Uuid>,
}

impl MeetingFilter {
    /// Does the meeting match all fields of the filter?
    ///
    /// Does NOT look at the soft-delete, that is up to the storage
    pub fn matches(&self, meeting: &Meeting) -> bool {
        fn same<T: PartialEq>(wanted: Option<&T>, actual: &T) -> bool {
            wanted.is_none_or(|wanted| wanted == actual)
        }

        fn same_text(wanted: Option<&String>, actual: Option<&String>) -> bool {
            wanted.is_none_or(|wanted| actual == Some(wanted))
        }

        same_text(self.agenda.as_ref(), Some(&meeting.agenda))
            && same_text(self.location.as_ref(), meeting.location.as_ref())
            && same(self.related.as_ref(), &meeting.related)
            && same_text(self.date_time.as_ref(), meeting.date_time.as_ref())
            && same_text(self.notes.as_ref(), meeting.notes.as_ref())
            && same(self.create_by.as_ref(), &meeting.create_by)
            && self
                .attendees
                .is_none_or(|contact_id| meeting.attendees.contains(&contact_id))
            && self
                .attendees_lead
                .is_none_or(|lead_id| meeting.attendees_lead.contains(&lead_id))
    }
}

/// Meeting operation errors
#[derive(Debug, Error)]
pub enum Error {
    /// Missing required field or empty batch input
    #[error("{0}")]
    Validation(String),

    /// Identifier that can not be parsed
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// No matching meeting(s)
    #[error("{0}")]
    NotFound(String),

    /// The storage failed to answer
    #[error(transparent)]
    Storage(#[from] storage::Error),
}

/// Result type for all meeting operations
pub type Result<T> = core::result::Result<T, Error>;

/// Parse an identifier as given by a caller
pub fn parse_identifier(id: &str) -> Result<Uuid> {
    Uuid::parse_str(id.trim()).map_err(|_| Error::InvalidIdentifier(id.to_string()))
}
