//! Memory storage
//!
//! Will be destroyed on system shutdown

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::contacts::Contact;
use crate::leads::Lead;
use crate::meetings::Meeting;
use crate::meetings::MeetingFilter;
use crate::users::User;

use super::AuditEntry;
use super::BatchDeleteSummary;
use super::CreateContactValues;
use super::CreateLeadValues;
use super::CreateMeetingValues;
use super::CreateUserValues;
use super::Result;
use super::Storage;

/// An in-memory storage
///
/// Will be destroyed on system shutdown
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// All users in storage
    users: Arc<Mutex<HashMap<Uuid, User>>>,

    /// All contacts in storage
    contacts: Arc<Mutex<HashMap<Uuid, Contact>>>,

    /// All leads in storage
    leads: Arc<Mutex<HashMap<Uuid, Lead>>>,

    /// All meetings in storage
    meetings: Arc<Mutex<HashMap<Uuid, Meeting>>>,
}

impl Memory {
    /// Create a new empty Memory storage
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for Memory {
    async fn find_any_single_user(&self) -> Result<Option<User>> {
        Ok(self.users.lock().await.values().next().cloned())
    }

    async fn find_all_users(&self) -> Result<Vec<User>> {
        let mut users = self
            .users
            .lock()
            .await
            .values()
            .cloned()
            .collect::<Vec<User>>();

        users.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        Ok(users)
    }

    async fn find_single_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .await
            .values()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn find_single_user_by_id(&self, id: &Uuid) -> Result<Option<User>> {
        Ok(self.users.lock().await.get(id).cloned())
    }

    async fn find_all_users_by_ids(&self, ids: &[Uuid]) -> Result<Vec<User>> {
        let users = self.users.lock().await;

        Ok(ids.iter().filter_map(|id| users.get(id)).cloned().collect())
    }

    async fn create_user(&self, values: &CreateUserValues<'_>) -> Result<User> {
        let user = User {
            id: Uuid::new_v4(),
            session_id: *values.session_id,
            username: values.username.to_string(),
            hashed_password: values.hashed_password.to_string(),
            role: values.role,
            first_name: values.first_name.to_string(),
            last_name: values.last_name.to_string(),
            created_at: Utc::now().naive_utc(),
        };

        self.users.lock().await.insert(user.id, user.clone());

        Ok(user)
    }

    async fn find_all_contacts(&self) -> Result<Vec<Contact>> {
        let mut contacts = self
            .contacts
            .lock()
            .await
            .values()
            .cloned()
            .collect::<Vec<Contact>>();

        contacts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(contacts)
    }

    async fn find_all_contacts_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Contact>> {
        let contacts = self.contacts.lock().await;

        Ok(ids
            .iter()
            .filter_map(|id| contacts.get(id))
            .cloned()
            .collect())
    }

    async fn create_contact(&self, values: &CreateContactValues<'_>) -> Result<Contact> {
        let contact = Contact {
            id: Uuid::new_v4(),
            user_id: values.user.id,
            full_name: values.full_name.to_string(),
            email: values.email.map(ToString::to_string),
            created_at: Utc::now().naive_utc(),
        };

        self.contacts
            .lock()
            .await
            .insert(contact.id, contact.clone());

        Ok(contact)
    }

    async fn find_all_leads(&self) -> Result<Vec<Lead>> {
        let mut leads = self
            .leads
            .lock()
            .await
            .values()
            .cloned()
            .collect::<Vec<Lead>>();

        leads.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(leads)
    }

    async fn find_all_leads_by_ids(&self, ids: &[Uuid]) -> Result<Vec<Lead>> {
        let leads = self.leads.lock().await;

        Ok(ids.iter().filter_map(|id| leads.get(id)).cloned().collect())
    }

    async fn create_lead(&self, values: &CreateLeadValues<'_>) -> Result<Lead> {
        let lead = Lead {
            id: Uuid::new_v4(),
            user_id: values.user.id,
            lead_name: values.lead_name.to_string(),
            lead_email: values.lead_email.map(ToString::to_string),
            created_at: Utc::now().naive_utc(),
        };

        self.leads.lock().await.insert(lead.id, lead.clone());

        Ok(lead)
    }

    async fn find_all_meetings(&self, filter: &MeetingFilter) -> Result<Vec<Meeting>> {
        let mut meetings = self
            .meetings
            .lock()
            .await
            .values()
            .filter(|meeting| !meeting.deleted && filter.matches(meeting))
            .cloned()
            .collect::<Vec<Meeting>>();

        meetings.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

        Ok(meetings)
    }

    async fn find_single_meeting_by_id_unchecked(&self, id: &Uuid) -> Result<Option<Meeting>> {
        Ok(self.meetings.lock().await.get(id).cloned())
    }

    async fn create_meeting(&self, values: &CreateMeetingValues<'_>) -> Result<Meeting> {
        let meeting = Meeting {
            id: Uuid::new_v4(),
            agenda: values.agenda.to_string(),
            attendees: values.attendees.to_vec(),
            attendees_lead: values.attendees_lead.to_vec(),
            location: values.location.map(ToString::to_string),
            related: values.related,
            date_time: values.date_time.map(ToString::to_string),
            notes: values.notes.map(ToString::to_string),
            create_by: *values.create_by,
            timestamp: Utc::now().naive_utc(),
            deleted: false,
        };

        self.meetings
            .lock()
            .await
            .insert(meeting.id, meeting.clone());

        Ok(meeting)
    }

    async fn delete_meeting(&self, meeting: &Meeting) -> Result<Option<Meeting>> {
        Ok(self
            .meetings
            .lock()
            .await
            .get_mut(&meeting.id)
            .map(|meeting| {
                meeting.deleted = true;

                meeting.clone()
            }))
    }

    async fn delete_meetings(&self, ids: &[Uuid]) -> Result<BatchDeleteSummary> {
        let mut meetings = self.meetings.lock().await;

        let mut summary = BatchDeleteSummary::default();

        for meeting in meetings.values_mut().filter(|meeting| ids.contains(&meeting.id)) {
            summary.matched += 1;

            if !meeting.deleted {
                meeting.deleted = true;
                summary.modified += 1;
            }
        }

        Ok(summary)
    }

    async fn register_audit_trail(
        &self,
        _created_by: &User,
        _entry: &AuditEntry<'_>,
        _ip_address: Option<&IpAddr>,
    ) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::meetings::Related;

    use super::*;

    fn values(create_by: &Uuid) -> CreateMeetingValues<'_> {
        CreateMeetingValues {
            agenda: "Quarterly review",
            attendees: &[],
            attendees_lead: &[],
            location: None,
            related: Related::None,
            date_time: Some("2099-01-15T09:30"),
            notes: None,
            create_by,
        }
    }

    #[tokio::test]
    async fn test_delete_meeting_not_in_storage() {
        let storage = Memory::new();
        let create_by = Uuid::new_v4();

        let other = Memory::new()
            .create_meeting(&values(&create_by))
            .await
            .unwrap();

        let deleted = storage.delete_meeting(&other).await.unwrap();

        assert!(deleted.is_none());
    }

    #[tokio::test]
    async fn test_delete_meeting_marks_deleted() {
        let storage = Memory::new();
        let create_by = Uuid::new_v4();

        let meeting = storage.create_meeting(&values(&create_by)).await.unwrap();
        let deleted = storage.delete_meeting(&meeting).await.unwrap().unwrap();

        assert_eq!(meeting.id, deleted.id);
        assert!(deleted.deleted);

        let stored = storage
            .find_single_meeting_by_id_unchecked(&meeting.id)
            .await
            .unwrap()
            .unwrap();
        assert!(stored.deleted);
    }

    #[tokio::test]
    async fn test_delete_meetings_summary() {
        let storage = Memory::new();
        let create_by = Uuid::new_v4();

        let one = storage.create_meeting(&values(&create_by)).await.unwrap();
        let two = storage.create_meeting(&values(&create_by)).await.unwrap();
        storage.delete_meeting(&two).await.unwrap();

        let summary = storage
            .delete_meetings(&[one.id, two.id, Uuid::new_v4()])
            .await
            .unwrap();

        assert_eq!(2, summary.matched);
        assert_eq!(1, summary.modified);
    }
}
