//! Leads
//!
//! Prospects a meeting can be held with, referenced by `Meeting::attendees_lead`

use chrono::naive::NaiveDateTime;
use uuid::Uuid;

/// A lead of the CRM
#[derive(Clone, Debug)]
pub struct Lead {
    /// Lead ID
    pub id: Uuid,

    /// The ID of the user that created it
    #[allow(dead_code)] // only read back by storage
    pub user_id: Uuid,

    /// Name of the lead, shown on meetings
    pub lead_name: String,

    /// Optional email address
    pub lead_email: Option<String>,

    /// Creation date
    pub created_at: NaiveDateTime,
}
