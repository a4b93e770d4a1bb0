//! Contacts
//!
//! People a meeting can be held with, referenced by `Meeting::attendees`

use chrono::naive::NaiveDateTime;
use uuid::Uuid;

/// A contact of the CRM
#[derive(Clone, Debug)]
pub struct Contact {
    /// Contact ID
    pub id: Uuid,

    /// The ID of the user that created it
    #[allow(dead_code)] // only read back by storage
    pub user_id: Uuid,

    /// Full name, shown on meetings
    pub full_name: String,

    /// Optional email address
    pub email: Option<String>,

    /// Creation date
    pub created_at: NaiveDateTime,
}
