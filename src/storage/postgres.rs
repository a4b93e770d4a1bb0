//! Postgres storage
//!
//! Only compiled with the `postgres` feature, migrations live in `migrations/`

use std::net::IpAddr;
use std::time::Duration;

use anyhow::Context;
use chrono::NaiveDateTime;
use sqlx::FromRow;
use sqlx::PgPool;
use sqlx::QueryBuilder;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::ipnetwork::IpNetwork;
use uuid::Uuid;

use crate::contacts::Contact;
use crate::leads::Lead;
use crate::meetings::Meeting;
use crate::meetings::MeetingFilter;
use crate::meetings::Related;
use crate::users::Role;
use crate::users::User;
use crate::utils::env_var;

use super::AuditEntry;
use super::BatchDeleteSummary;
use super::CreateContactValues;
use super::CreateLeadValues;
use super::CreateMeetingValues;
use super::CreateUserValues;
use super::Error;
use super::Result;
use super::Storage;

/// Migrator to run migrations on startup
static MIGRATOR: Migrator = sqlx::migrate!();

/// Columns of the users table, in the order of [`SqlxUser`](SqlxUser)
const USER_COLUMNS: &str =
    "id, session_id, username, hashed_password, role, first_name, last_name, created_at";

/// Columns of the meetings table, in the order of [`SqlxMeeting`](SqlxMeeting)
const MEETING_COLUMNS: &str = "id, agenda, attendees, attendees_lead, location, related, \
    date_time, notes, create_by, timestamp, deleted";

/// Postgres type for user role
#[derive(Clone, Copy, PartialEq, Debug, sqlx::Type)]
#[sqlx(type_name = "user_role_type")]
#[sqlx(rename_all = "kebab-case")]
enum UserRoleType {
    Admin,
    Manager,
}

impl From<Role> for UserRoleType {
    fn from(role: Role) -> Self {
        match role {
            Role::Admin => Self::Admin,
            Role::Manager => Self::Manager,
        }
    }
}

impl From<UserRoleType> for Role {
    fn from(role: UserRoleType) -> Self {
        match role {
            UserRoleType::Admin => Self::Admin,
            UserRoleType::Manager => Self::Manager,
        }
    }
}

/// Postgres type for the attendee list in use
#[derive(Clone, Copy, PartialEq, Debug, sqlx::Type)]
#[sqlx(type_name = "meeting_related_type")]
enum MeetingRelatedType {
    Contact,
    Lead,
    None,
}

impl From<Related> for MeetingRelatedType {
    fn from(related: Related) -> Self {
        match related {
            Related::Contact => Self::Contact,
            Related::Lead => Self::Lead,
            Related::None => Self::None,
        }
    }
}

impl From<MeetingRelatedType> for Related {
    fn from(related: MeetingRelatedType) -> Self {
        match related {
            MeetingRelatedType::Contact => Self::Contact,
            MeetingRelatedType::Lead => Self::Lead,
            MeetingRelatedType::None => Self::None,
        }
    }
}

/// Postgres type for audit trail entry type
#[derive(PartialEq, Debug, sqlx::Type)]
#[sqlx(type_name = "audit_trail_entry_type")]
#[sqlx(rename_all = "kebab-case")]
enum AuditEntryType {
    CreateUser,
    CreateContact,
    CreateLead,
    CreateMeeting,
    DeleteMeeting,
    DeleteMeetings,
}

impl AuditEntryType {
    /// Create audit entry type from audit entry
    fn from_audit_entry(entry: &AuditEntry) -> Self {
        match entry {
            AuditEntry::CreateUser(_) => Self::CreateUser,
            AuditEntry::CreateContact(_) => Self::CreateContact,
            AuditEntry::CreateLead(_) => Self::CreateLead,
            AuditEntry::CreateMeeting(_) => Self::CreateMeeting,
            AuditEntry::DeleteMeeting(_) => Self::DeleteMeeting,
            AuditEntry::DeleteMeetings(_) => Self::DeleteMeetings,
        }
    }
}

/// Postgres storage
#[derive(Clone)]
pub struct Postgres {
    /// Pool of connections
    connection_pool: PgPool,
}

impl Postgres {
    /// Create Postgres storage
    ///
    /// Use the `DATABASE_URL` environment variable
    ///
    /// Migrations will be run
    pub async fn new() -> anyhow::Result<Self> {
        let database_connection_string =
            env_var("DATABASE_URL").context("`DATABASE_URL` is not set")?;

        let connection_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_connection_string)
            .await
            .context("Could not connect to the database")?;

        Self::new_with_pool(connection_pool).await
    }

    /// Create Postgres storage with existing pool
    ///
    /// Migrations will be run
    pub async fn new_with_pool(connection_pool: PgPool) -> anyhow::Result<Self> {
        MIGRATOR
            .run(&connection_pool)
            .await
            .context("Migrations could not run")?;

        Ok(Self { connection_pool })
    }

    /// Fetch all users matching the `WHERE` clause
    async fn fetch_users(
        &self,
        query: &mut QueryBuilder<'_, sqlx::Postgres>,
    ) -> Result<Vec<User>> {
        let users = query
            .build_query_as::<SqlxUser>()
            .fetch_all(&self.connection_pool)
            .await
            .map_err(connection_error)?;

        Ok(users.into_iter().map(User::from).collect())
    }
}

/// Postgres version of user
#[derive(FromRow)]
struct SqlxUser {
    id: Uuid,
    session_id: Uuid,
    username: String,
    hashed_password: String,
    role: UserRoleType,
    first_name: String,
    last_name: String,
    created_at: NaiveDateTime,
}

impl From<SqlxUser> for User {
    fn from(user: SqlxUser) -> Self {
        Self {
            id: user.id,
            session_id: user.session_id,
            username: user.username,
            hashed_password: user.hashed_password,
            role: user.role.into(),
            first_name: user.first_name,
            last_name: user.last_name,
            created_at: user.created_at,
        }
    }
}

/// Postgres version of contact
#[derive(FromRow)]
struct SqlxContact {
    id: Uuid,
    user_id: Uuid,
    full_name: String,
    email: Option<String>,
    created_at: NaiveDateTime,
}

impl From<SqlxContact> for Contact {
    fn from(contact: SqlxContact) -> Self {
        Self {
            id: contact.id,
            user_id: contact.user_id,
            full_name: contact.full_name,
            email: contact.email,
            created_at: contact.created_at,
        }
    }
}

/// Postgres version of lead
#[derive(FromRow)]
struct SqlxLead {
    id: Uuid,
    user_id: Uuid,
    lead_name: String,
    lead_email: Option<String>,
    created_at: NaiveDateTime,
}

impl From<SqlxLead> for Lead {
    fn from(lead: SqlxLead) -> Self {
        Self {
            id: lead.id,
            user_id: lead.user_id,
            lead_name: lead.lead_name,
            lead_email: lead.lead_email,
            created_at: lead.created_at,
        }
    }
}

/// Postgres version of meeting
#[derive(FromRow)]
struct SqlxMeeting {
    id: Uuid,
    agenda: String,
    attendees: Vec<Uuid>,
    attendees_lead: Vec<Uuid>,
    location: Option<String>,
    related: MeetingRelatedType,
    date_time: Option<String>,
    notes: Option<String>,
    create_by: Uuid,
    timestamp: NaiveDateTime,
    deleted: bool,
}

impl From<SqlxMeeting> for Meeting {
    fn from(meeting: SqlxMeeting) -> Self {
        Self {
            id: meeting.id,
            agenda: meeting.agenda,
            attendees: meeting.attendees,
            attendees_lead: meeting.attendees_lead,
            location: meeting.location,
            related: meeting.related.into(),
            date_time: meeting.date_time,
            notes: meeting.notes,
            create_by: meeting.create_by,
            timestamp: meeting.timestamp,
            deleted: meeting.deleted,
        }
    }
}

impl Storage for Postgres {
    async fn find_any_single_user(&self) -> Result<Option<User>> {
        let mut query = QueryBuilder::new(format!(
            "SELECT {USER_COLUMNS} FROM users LIMIT 1"
        ));

        Ok(self.fetch_users(&mut query).await?.into_iter().next())
    }

    async fn find_all_users(&self) -> Result<Vec<User>> {
        let mut query = QueryBuilder::new(format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at"
        ));

        self.fetch_users(&mut query).await
    }

    async fn find_single_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let mut query = QueryBuilder::new(format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = "
        ));
        query.push_bind(username).push(" LIMIT 1");

        Ok(self.fetch_users(&mut query).await?.into_iter().next())
    }

    async fn find_single_user_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        let mut query = QueryBuilder::new(format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = "
        ));
        query.push_bind(id).push(" LIMIT 1");

        Ok(self.fetch_users(&mut query).await?.into_iter().next())
    }

    async fn find_all_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        let mut query = QueryBuilder::new(format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = ANY("
        ));
        query.push_bind(ids).push(")");

        self.fetch_users(&mut query).await
    }

    async fn create_user(&self, values: &CreateUserValues<'_>) -> Result<User> {
        let user = sqlx::query_as::<_, SqlxUser>(&format!(
            r"
            INSERT INTO users (id, session_id, username, hashed_password, role, first_name, last_name)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(Uuid::new_v4())
        .bind(values.session_id)
        .bind(values.username)
        .bind(values.hashed_password)
        .bind(UserRoleType::from(values.role))
        .bind(values.first_name)
        .bind(values.last_name)
        .fetch_one(&self.connection_pool)
        .await
        .map(User::from)
        .map_err(connection_error)?;

        Ok(user)
    }

    async fn find_all_contacts(&self) -> Result<Vec<Contact>> {
        let contacts = sqlx::query_as::<_, SqlxContact>(
            r"
            SELECT id, user_id, full_name, email, created_at
            FROM contacts
            ORDER BY created_at DESC
            ",
        )
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(contacts.into_iter().map(Contact::from).collect())
    }

    async fn find_all_contacts_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Contact>> {
        let contacts = sqlx::query_as::<_, SqlxContact>(
            r"
            SELECT id, user_id, full_name, email, created_at
            FROM contacts
            WHERE id = ANY($1)
            ",
        )
        .bind(ids)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(contacts.into_iter().map(Contact::from).collect())
    }

    async fn create_contact(&self, values: &CreateContactValues<'_>) -> Result<Contact> {
        let contact = sqlx::query_as::<_, SqlxContact>(
            r"
            INSERT INTO contacts (id, user_id, full_name, email)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, full_name, email, created_at
            ",
        )
        .bind(Uuid::new_v4())
        .bind(values.user.id)
        .bind(values.full_name)
        .bind(values.email)
        .fetch_one(&self.connection_pool)
        .await
        .map(Contact::from)
        .map_err(connection_error)?;

        Ok(contact)
    }

    async fn find_all_leads(&self) -> Result<Vec<Lead>> {
        let leads = sqlx::query_as::<_, SqlxLead>(
            r"
            SELECT id, user_id, lead_name, lead_email, created_at
            FROM leads
            ORDER BY created_at DESC
            ",
        )
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(leads.into_iter().map(Lead::from).collect())
    }

    async fn find_all_leads_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Lead>> {
        let leads = sqlx::query_as::<_, SqlxLead>(
            r"
            SELECT id, user_id, lead_name, lead_email, created_at
            FROM leads
            WHERE id = ANY($1)
            ",
        )
        .bind(ids)
        .fetch_all(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(leads.into_iter().map(Lead::from).collect())
    }

    async fn create_lead(&self, values: &CreateLeadValues<'_>) -> Result<Lead> {
        let lead = sqlx::query_as::<_, SqlxLead>(
            r"
            INSERT INTO leads (id, user_id, lead_name, lead_email)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, lead_name, lead_email, created_at
            ",
        )
        .bind(Uuid::new_v4())
        .bind(values.user.id)
        .bind(values.lead_name)
        .bind(values.lead_email)
        .fetch_one(&self.connection_pool)
        .await
        .map(Lead::from)
        .map_err(connection_error)?;

        Ok(lead)
    }

    async fn find_all_meetings(&self, filter: &MeetingFilter) -> Result<Vec<Meeting>> {
        // the soft-delete clause goes first, the filter can only narrow it down
        let mut query = QueryBuilder::new(format!(
            "SELECT {MEETING_COLUMNS} FROM meetings WHERE deleted = FALSE"
        ));

        if let Some(agenda) = &filter.agenda {
            query.push(" AND agenda = ").push_bind(agenda);
        }
        if let Some(location) = &filter.location {
            query.push(" AND location = ").push_bind(location);
        }
        if let Some(related) = filter.related {
            query
                .push(" AND related = ")
                .push_bind(MeetingRelatedType::from(related));
        }
        if let Some(date_time) = &filter.date_time {
            query.push(" AND date_time = ").push_bind(date_time);
        }
        if let Some(notes) = &filter.notes {
            query.push(" AND notes = ").push_bind(notes);
        }
        if let Some(create_by) = filter.create_by {
            query.push(" AND create_by = ").push_bind(create_by);
        }
        if let Some(contact_id) = filter.attendees {
            query
                .push(" AND ")
                .push_bind(contact_id)
                .push(" = ANY(attendees)");
        }
        if let Some(lead_id) = filter.attendees_lead {
            query
                .push(" AND ")
                .push_bind(lead_id)
                .push(" = ANY(attendees_lead)");
        }

        query.push(" ORDER BY timestamp DESC");

        let meetings = query
            .build_query_as::<SqlxMeeting>()
            .fetch_all(&self.connection_pool)
            .await
            .map_err(connection_error)?;

        Ok(meetings.into_iter().map(Meeting::from).collect())
    }

    async fn find_single_meeting_by_id_unchecked(&self, id: &Uuid) -> Result<Option<Meeting>> {
        let meeting = sqlx::query_as::<_, SqlxMeeting>(&format!(
            "SELECT {MEETING_COLUMNS} FROM meetings WHERE id = $1 LIMIT 1"
        ))
        .bind(id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(meeting.map(Meeting::from))
    }

    async fn create_meeting(&self, values: &CreateMeetingValues<'_>) -> Result<Meeting> {
        let meeting = sqlx::query_as::<_, SqlxMeeting>(&format!(
            r"
            INSERT INTO meetings (
                id, agenda, attendees, attendees_lead, location, related, date_time, notes, create_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {MEETING_COLUMNS}
            "
        ))
        .bind(Uuid::new_v4())
        .bind(values.agenda)
        .bind(values.attendees)
        .bind(values.attendees_lead)
        .bind(values.location)
        .bind(MeetingRelatedType::from(values.related))
        .bind(values.date_time)
        .bind(values.notes)
        .bind(values.create_by)
        .fetch_one(&self.connection_pool)
        .await
        .map(Meeting::from)
        .map_err(connection_error)?;

        Ok(meeting)
    }

    async fn delete_meeting(&self, meeting: &Meeting) -> Result<Option<Meeting>> {
        let meeting = sqlx::query_as::<_, SqlxMeeting>(&format!(
            r"
            UPDATE meetings
            SET deleted = TRUE
            WHERE id = $1
            RETURNING {MEETING_COLUMNS}
            "
        ))
        .bind(meeting.id)
        .fetch_optional(&self.connection_pool)
        .await
        .map_err(connection_error)?
        .map(Meeting::from);

        Ok(meeting)
    }

    async fn delete_meetings(&self, ids: &[Uuid]) -> Result<BatchDeleteSummary> {
        let (matched, modified) = sqlx::query_as::<_, (i64, i64)>(
            r"
            WITH matched AS (
                SELECT id, deleted
                FROM meetings
                WHERE id = ANY($1)
            ), modified AS (
                UPDATE meetings
                SET deleted = TRUE
                WHERE id IN (SELECT id FROM matched WHERE deleted = FALSE)
                RETURNING id
            )
            SELECT
                (SELECT COUNT(*) FROM matched) AS matched,
                (SELECT COUNT(*) FROM modified) AS modified
            ",
        )
        .bind(ids)
        .fetch_one(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(BatchDeleteSummary {
            matched: u64::try_from(matched).unwrap_or_default(),
            modified: u64::try_from(modified).unwrap_or_default(),
        })
    }

    async fn register_audit_trail(
        &self,
        created_by: &User,
        entry: &AuditEntry<'_>,
        ip_address: Option<&IpAddr>,
    ) -> Result<()> {
        let (user_id, contact_id, lead_id, meeting_ids) = match entry {
            AuditEntry::CreateUser(user) => (Some(user.id), None, None, Vec::new()),
            AuditEntry::CreateContact(contact) => (None, Some(contact.id), None, Vec::new()),
            AuditEntry::CreateLead(lead) => (None, None, Some(lead.id), Vec::new()),
            AuditEntry::CreateMeeting(meeting) | AuditEntry::DeleteMeeting(meeting) => {
                (None, None, None, vec![meeting.id])
            }
            AuditEntry::DeleteMeetings(ids) => (None, None, None, ids.to_vec()),
        };

        sqlx::query(
            r"
            INSERT INTO audit_trail (
                id, type, created_by, user_id, contact_id, lead_id, meeting_ids, ip_address
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ",
        )
        .bind(Uuid::new_v4())
        .bind(AuditEntryType::from_audit_entry(entry))
        .bind(created_by.id)
        .bind(user_id)
        .bind(contact_id)
        .bind(lead_id)
        .bind(meeting_ids)
        .bind(ip_address.copied().map(IpNetwork::from))
        .execute(&self.connection_pool)
        .await
        .map_err(connection_error)?;

        Ok(())
    }
}

/// Convert `SQLx` to storage connection error
fn connection_error<E>(err: E) -> Error
where
    E: std::error::Error,
{
    Error::Connection(err.to_string())
}
