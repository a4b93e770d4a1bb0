//! Relationship resolver
//!
//! Expands the references of a meeting (contacts, leads and the creator) into the summaries
//! shown on a single meeting.

use std::collections::HashMap;
use std::collections::HashSet;

use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use crate::contacts::Contact;
use crate::leads::Lead;
use crate::storage::Storage;
use crate::users::User;

use super::Error;
use super::Meeting;
use super::Related;
use super::Result;
use super::parse_identifier;

/// Contact as shown on a meeting
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeSummary {
    /// Full name of the contact
    pub full_name: String,
}

impl AttendeeSummary {
    fn from_contact(contact: Contact) -> Self {
        Self {
            full_name: contact.full_name,
        }
    }
}

/// Lead as shown on a meeting
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadSummary {
    /// Name of the lead
    pub lead_name: String,
}

impl LeadSummary {
    fn from_lead(lead: Lead) -> Self {
        Self {
            lead_name: lead.lead_name,
        }
    }
}

/// A single meeting with its references resolved
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingDetails {
    pub id: Uuid,
    pub agenda: String,
    pub location: Option<String>,
    pub related: Related,
    pub date_time: Option<String>,
    pub notes: Option<String>,
    pub timestamp: NaiveDateTime,
    pub deleted: bool,
    pub attendees: Vec<AttendeeSummary>,
    pub attendees_lead: Vec<LeadSummary>,

    /// `null` when the creator can not be found
    pub created_by_name: Option<String>,
}

/// View a single meeting, with its attendees, leads and creator resolved
///
/// Soft-deleted meetings can still be viewed.
pub async fn view_meeting<S: Storage>(storage: &S, id: &str) -> Result<MeetingDetails> {
    let id = parse_identifier(id)?;

    let meeting = storage
        .find_single_meeting_by_id_unchecked(&id)
        .await?
        .ok_or_else(|| Error::NotFound("Meeting not found".to_string()))?;

    let attendees = resolve_attendees(storage, &meeting).await?;
    let attendees_lead = resolve_leads(storage, &meeting).await?;
    let created_by_name = resolve_creator_name(storage, &meeting.create_by).await?;

    tracing::debug!(
        "Resolved meeting {id}: {} attendees, {} leads",
        attendees.len(),
        attendees_lead.len()
    );

    Ok(build_details(
        meeting,
        attendees,
        attendees_lead,
        created_by_name,
    ))
}

/// Resolve the contacts of a meeting into summaries
async fn resolve_attendees<S: Storage>(
    storage: &S,
    meeting: &Meeting,
) -> Result<Vec<AttendeeSummary>> {
    let contacts = storage.find_all_contacts_by_ids(&meeting.attendees).await?;

    Ok(in_reference_order(&meeting.attendees, contacts, |contact| contact.id)
        .into_iter()
        .map(AttendeeSummary::from_contact)
        .collect())
}

/// Resolve the leads of a meeting into summaries
async fn resolve_leads<S: Storage>(storage: &S, meeting: &Meeting) -> Result<Vec<LeadSummary>> {
    let leads = storage
        .find_all_leads_by_ids(&meeting.attendees_lead)
        .await?;

    Ok(in_reference_order(&meeting.attendees_lead, leads, |lead| lead.id)
        .into_iter()
        .map(LeadSummary::from_lead)
        .collect())
}

/// Resolve the display name of the creator, if the creator still exists
async fn resolve_creator_name<S: Storage>(storage: &S, user_id: &Uuid) -> Result<Option<String>> {
    let users = storage
        .find_all_users_by_ids(std::slice::from_ref(user_id))
        .await?;

    Ok(users.first().map(User::full_name))
}

/// Put the found entities in the order of the references
///
/// Dangling references are skipped and every entity shows up once, at its first reference.
fn in_reference_order<T>(references: &[Uuid], found: Vec<T>, id_of: fn(&T) -> Uuid) -> Vec<T> {
    let mut found = found
        .into_iter()
        .map(|entity| (id_of(&entity), entity))
        .collect::<HashMap<Uuid, T>>();

    let mut seen = HashSet::new();

    references
        .iter()
        .filter(|id| seen.insert(**id))
        .filter_map(|id| found.remove(id))
        .collect()
}

/// Shape a meeting and its resolved references for display
fn build_details(
    meeting: Meeting,
    attendees: Vec<AttendeeSummary>,
    attendees_lead: Vec<LeadSummary>,
    created_by_name: Option<String>,
) -> MeetingDetails {
    MeetingDetails {
        id: meeting.id,
        agenda: meeting.agenda,
        location: meeting.location,
        related: meeting.related,
        date_time: meeting.date_time,
        notes: meeting.notes,
        timestamp: meeting.timestamp,
        deleted: meeting.deleted,
        attendees,
        attendees_lead,
        created_by_name,
    }
}

#[cfg(all(test, not(feature = "postgres")))]
mod tests {
    use crate::storage::CreateContactValues;
    use crate::storage::CreateLeadValues;
    use crate::storage::CreateMeetingValues;
    use crate::storage::CreateUserValues;
    use crate::storage::Memory;
    use crate::users::Role;

    use super::*;

    async fn create_user(storage: &Memory, first_name: &str, last_name: &str) -> User {
        let values = CreateUserValues {
            session_id: &Uuid::new_v4(),
            role: Role::Manager,
            username: &format!("{first_name}.{last_name}"),
            hashed_password: "not-a-hash",
            first_name,
            last_name,
        };

        storage.create_user(&values).await.unwrap()
    }

    async fn create_contact(storage: &Memory, user: &User, full_name: &str) -> Contact {
        let values = CreateContactValues {
            user,
            full_name,
            email: None,
        };

        storage.create_contact(&values).await.unwrap()
    }

    async fn create_meeting(
        storage: &Memory,
        attendees: &[Uuid],
        attendees_lead: &[Uuid],
        create_by: &Uuid,
    ) -> Meeting {
        let values = CreateMeetingValues {
            agenda: "Kick-off",
            attendees,
            attendees_lead,
            location: Some("Room 2"),
            related: Related::Contact,
            date_time: Some("2026-11-02T09:30"),
            notes: None,
            create_by,
        };

        storage.create_meeting(&values).await.unwrap()
    }

    #[tokio::test]
    async fn test_view_resolves_attendees_and_creator() {
        let storage = Memory::new();

        let user = create_user(&storage, "Jane", "Doe").await;
        let contact_a = create_contact(&storage, &user, "Alice Adams").await;
        let contact_b = create_contact(&storage, &user, "Bob Brown").await;

        let meeting = create_meeting(&storage, &[contact_a.id, contact_b.id], &[], &user.id).await;

        let details = view_meeting(&storage, &meeting.id.to_string())
            .await
            .unwrap();

        assert_eq!(meeting.id, details.id);
        assert_eq!("Kick-off", details.agenda);
        assert_eq!(
            vec![
                AttendeeSummary {
                    full_name: "Alice Adams".to_string()
                },
                AttendeeSummary {
                    full_name: "Bob Brown".to_string()
                },
            ],
            details.attendees
        );
        assert!(details.attendees_lead.is_empty());
        assert_eq!(Some("Jane Doe".to_string()), details.created_by_name);
    }

    #[tokio::test]
    async fn test_view_resolves_leads() {
        let storage = Memory::new();

        let user = create_user(&storage, "Jane", "Doe").await;
        let values = CreateLeadValues {
            user: &user,
            lead_name: "Acme Corp",
            lead_email: Some("sales@acme.test"),
        };
        let lead = storage.create_lead(&values).await.unwrap();

        let meeting = create_meeting(&storage, &[], &[lead.id], &user.id).await;

        let details = view_meeting(&storage, &meeting.id.to_string())
            .await
            .unwrap();

        assert_eq!(
            vec![LeadSummary {
                lead_name: "Acme Corp".to_string()
            }],
            details.attendees_lead
        );
    }

    #[tokio::test]
    async fn test_view_skips_dangling_references() {
        let storage = Memory::new();

        let user = create_user(&storage, "Jane", "Doe").await;
        let contact = create_contact(&storage, &user, "Alice Adams").await;

        let meeting = create_meeting(
            &storage,
            &[Uuid::new_v4(), contact.id, contact.id],
            &[Uuid::new_v4()],
            &Uuid::new_v4(),
        )
        .await;

        let details = view_meeting(&storage, &meeting.id.to_string())
            .await
            .unwrap();

        assert_eq!(1, details.attendees.len());
        assert!(details.attendees_lead.is_empty());
        assert_eq!(None, details.created_by_name);
    }

    #[tokio::test]
    async fn test_view_deleted_meeting() {
        let storage = Memory::new();

        let user = create_user(&storage, "Jane", "Doe").await;
        let meeting = create_meeting(&storage, &[], &[], &user.id).await;
        storage.delete_meeting(&meeting).await.unwrap();

        let details = view_meeting(&storage, &meeting.id.to_string())
            .await
            .unwrap();

        assert!(details.deleted);
    }

    #[tokio::test]
    async fn test_view_unknown_meeting() {
        let storage = Memory::new();

        let result = view_meeting(&storage, &Uuid::new_v4().to_string()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));

        let result = view_meeting(&storage, "not-an-id").await;
        assert!(matches!(result, Err(Error::InvalidIdentifier(_))));
    }

    #[test]
    fn test_in_reference_order() {
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();
        let dangling = Uuid::new_v4();

        let ordered = in_reference_order(
            &[second, dangling, first, second],
            vec![first, second],
            |id| *id,
        );

        assert_eq!(vec![second, first], ordered);
    }
}
