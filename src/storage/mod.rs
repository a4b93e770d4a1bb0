//! All things related to the storage of users, contacts, leads and meetings

use std::future::Future;
use std::net::IpAddr;

use thiserror::Error;
use uuid::Uuid;

use crate::contacts::Contact;
use crate::leads::Lead;
use crate::meetings::Meeting;
use crate::meetings::MeetingFilter;
use crate::meetings::Related;
use crate::users::Role;
use crate::users::User;

#[cfg(not(feature = "postgres"))]
pub use memory::Memory;
#[cfg(feature = "postgres")]
pub use postgres::Postgres;

#[cfg(not(feature = "postgres"))]
mod memory;
#[cfg(feature = "postgres")]
mod postgres;

/// The storage used by the app
#[cfg(not(feature = "postgres"))]
pub type Database = Memory;

/// The storage used by the app
#[cfg(feature = "postgres")]
pub type Database = Postgres;

/// Setup the storage
#[cfg(not(feature = "postgres"))]
#[allow(clippy::unused_async)]
pub async fn setup() -> anyhow::Result<Database> {
    Ok(Memory::new())
}

/// Setup the storage
///
/// Use the `DATABASE_URL` environment variable
#[cfg(feature = "postgres")]
pub async fn setup() -> anyhow::Result<Database> {
    Postgres::new().await
}

/// Storage errors
#[derive(Debug, Error)]
pub enum Error {
    /// A connection error with the storage
    #[error("Connection error: {0}")]
    Connection(String),
}

/// Result type for all storage interactions
pub type Result<T> = core::result::Result<T, Error>;

/// Values to create a User
pub struct CreateUserValues<'a> {
    /// The initial session ID for the user
    pub session_id: &'a Uuid,

    /// The role of the user
    pub role: Role,

    /// The username
    pub username: &'a str,

    /// The hashed password
    pub hashed_password: &'a str,

    /// First name, used in display names
    pub first_name: &'a str,

    /// Last name, used in display names
    pub last_name: &'a str,
}

/// Values to create a Contact
pub struct CreateContactValues<'a> {
    /// User creating the contact
    pub user: &'a User,

    /// Full name of the contact
    pub full_name: &'a str,

    /// Email address of the contact
    pub email: Option<&'a str>,
}

/// Values to create a Lead
pub struct CreateLeadValues<'a> {
    /// User creating the lead
    pub user: &'a User,

    /// Name of the lead
    pub lead_name: &'a str,

    /// Email address of the lead
    pub lead_email: Option<&'a str>,
}

/// Values to create a Meeting
///
/// Validated values, the ID and timestamp are assigned by the storage
pub struct CreateMeetingValues<'a> {
    /// What the meeting is about
    pub agenda: &'a str,

    /// Referenced contacts
    pub attendees: &'a [Uuid],

    /// Referenced leads
    pub attendees_lead: &'a [Uuid],

    /// Where the meeting takes place
    pub location: Option<&'a str>,

    /// Which attendee list is in use
    pub related: Related,

    /// When the meeting takes place
    pub date_time: Option<&'a str>,

    /// Free text notes
    pub notes: Option<&'a str>,

    /// The user creating the meeting
    pub create_by: &'a Uuid,
}

/// Counts of a soft-delete over multiple meetings
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BatchDeleteSummary {
    /// Meetings with a matching ID, deleted or not
    pub matched: u64,

    /// Meetings whose flag actually changed
    pub modified: u64,
}

/// Possible audit trail entry types
pub enum AuditEntry<'a> {
    /// User is created
    CreateUser(&'a User),

    /// Contact is created
    CreateContact(&'a Contact),

    /// Lead is created
    CreateLead(&'a Lead),

    /// Meeting is created
    CreateMeeting(&'a Meeting),

    /// Meeting is soft-deleted
    DeleteMeeting(&'a Meeting),

    /// Multiple meetings are soft-deleted at once
    DeleteMeetings(&'a [Uuid]),
}

/// Storage with all supported operations
pub trait Storage: Clone + Send + Sync + 'static {
    /// Find any single user
    fn find_any_single_user(&self) -> impl Future<Output = Result<Option<User>>> + Send;

    /// Finds all users
    fn find_all_users(&self) -> impl Future<Output = Result<Vec<User>>> + Send;

    /// Finds a single user by its username
    fn find_single_user_by_username(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<User>>> + Send;

    /// Finds a single user by its ID
    fn find_single_user_by_id(
        &self,
        id: &Uuid,
    ) -> impl Future<Output = Result<Option<User>>> + Send;

    /// Finds all users with one of the given IDs
    fn find_all_users_by_ids(
        &self,
        ids: &[Uuid],
    ) -> impl Future<Output = Result<Vec<User>>> + Send;

    /// Create a single user
    fn create_user(&self, values: &CreateUserValues)
    -> impl Future<Output = Result<User>> + Send;

    /// Find all contacts
    fn find_all_contacts(&self) -> impl Future<Output = Result<Vec<Contact>>> + Send;

    /// Find all contacts with one of the given IDs, in no particular order
    fn find_all_contacts_by_ids(
        &self,
        ids: &[Uuid],
    ) -> impl Future<Output = Result<Vec<Contact>>> + Send;

    /// Create a contact
    fn create_contact(
        &self,
        values: &CreateContactValues,
    ) -> impl Future<Output = Result<Contact>> + Send;

    /// Find all leads
    fn find_all_leads(&self) -> impl Future<Output = Result<Vec<Lead>>> + Send;

    /// Find all leads with one of the given IDs, in no particular order
    fn find_all_leads_by_ids(&self, ids: &[Uuid])
    -> impl Future<Output = Result<Vec<Lead>>> + Send;

    /// Create a lead
    fn create_lead(&self, values: &CreateLeadValues) -> impl Future<Output = Result<Lead>> + Send;

    /// Find all meetings matching the filter
    ///
    /// Respects the soft-delete, regardless of the filter
    fn find_all_meetings(
        &self,
        filter: &MeetingFilter,
    ) -> impl Future<Output = Result<Vec<Meeting>>> + Send;

    /// Find a single meeting by ID
    ///
    /// DOES NOT respect the soft-delete, handle with care
    fn find_single_meeting_by_id_unchecked(
        &self,
        id: &Uuid,
    ) -> impl Future<Output = Result<Option<Meeting>>> + Send;

    /// Create a meeting, not deleted
    fn create_meeting(
        &self,
        values: &CreateMeetingValues,
    ) -> impl Future<Output = Result<Meeting>> + Send;

    /// Soft-delete a meeting, returns the updated meeting
    ///
    /// Returns `None` when the meeting is not in storage (anymore)
    fn delete_meeting(
        &self,
        meeting: &Meeting,
    ) -> impl Future<Output = Result<Option<Meeting>>> + Send;

    /// Soft-delete all meetings with one of the given IDs in one go
    fn delete_meetings(
        &self,
        ids: &[Uuid],
    ) -> impl Future<Output = Result<BatchDeleteSummary>> + Send;

    /// Register a creative/destructive action on the audit trail
    fn register_audit_trail(
        &self,
        user: &User,
        entry: &AuditEntry,
        ip_address: Option<&IpAddr>,
    ) -> impl Future<Output = Result<()>> + Send;
}
