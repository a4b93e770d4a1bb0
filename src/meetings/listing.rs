//! Listing of meetings

use std::collections::HashMap;

use chrono::NaiveDateTime;
use serde::Serialize;
use uuid::Uuid;

use crate::storage::Storage;
use crate::users::User;

use super::Meeting;
use super::MeetingFilter;
use super::Related;
use super::Result;

/// A meeting in a list
///
/// The raw creator reference is replaced by the name of the creator
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingSummary {
    pub id: Uuid,
    pub agenda: String,
    pub attendees: Vec<Uuid>,
    pub attendees_lead: Vec<Uuid>,
    pub location: Option<String>,
    pub related: Related,
    pub date_time: Option<String>,
    pub notes: Option<String>,
    pub timestamp: NaiveDateTime,
    pub deleted: bool,
    pub created_by_name: Option<String>,
}

impl MeetingSummary {
    fn from_meeting(meeting: Meeting, created_by_name: Option<String>) -> Self {
        Self {
            id: meeting.id,
            agenda: meeting.agenda,
            attendees: meeting.attendees,
            attendees_lead: meeting.attendees_lead,
            location: meeting.location,
            related: meeting.related,
            date_time: meeting.date_time,
            notes: meeting.notes,
            timestamp: meeting.timestamp,
            deleted: meeting.deleted,
            created_by_name,
        }
    }
}

/// List all meetings that are not soft-deleted and match the filter
pub async fn list_meetings<S: Storage>(
    storage: &S,
    filter: &MeetingFilter,
) -> Result<Vec<MeetingSummary>> {
    let meetings = storage.find_all_meetings(filter).await?;

    let mut creator_ids = meetings
        .iter()
        .map(|meeting| meeting.create_by)
        .collect::<Vec<Uuid>>();
    creator_ids.sort_unstable();
    creator_ids.dedup();

    let creator_names = storage
        .find_all_users_by_ids(&creator_ids)
        .await?
        .iter()
        .map(|user| (user.id, User::full_name(user)))
        .collect::<HashMap<Uuid, String>>();

    tracing::debug!("Listing {} meetings", meetings.len());

    Ok(meetings
        .into_iter()
        .map(|meeting| {
            let created_by_name = creator_names.get(&meeting.create_by).cloned();

            MeetingSummary::from_meeting(meeting, created_by_name)
        })
        .collect())
}

#[cfg(all(test, not(feature = "postgres")))]
mod tests {
    use crate::storage::CreateMeetingValues;
    use crate::storage::CreateUserValues;
    use crate::storage::Memory;
    use crate::users::Role;

    use super::*;

    async fn create_meeting(storage: &Memory, related: Related, create_by: &Uuid) -> Meeting {
        let values = CreateMeetingValues {
            agenda: "Weekly sync",
            attendees: &[],
            attendees_lead: &[],
            location: None,
            related,
            date_time: None,
            notes: None,
            create_by,
        };

        storage.create_meeting(&values).await.unwrap()
    }

    #[tokio::test]
    async fn test_list_resolves_creator_name() {
        let storage = Memory::new();

        let values = CreateUserValues {
            session_id: &Uuid::new_v4(),
            role: Role::Manager,
            username: "jane",
            hashed_password: "not-a-hash",
            first_name: "Jane",
            last_name: "Doe",
        };
        let user = storage.create_user(&values).await.unwrap();

        let known = create_meeting(&storage, Related::None, &user.id).await;
        let unknown = create_meeting(&storage, Related::None, &Uuid::new_v4()).await;

        let meetings = list_meetings(&storage, &MeetingFilter::default())
            .await
            .unwrap();

        assert_eq!(2, meetings.len());

        let summary = meetings.iter().find(|m| m.id == known.id).unwrap();
        assert_eq!(Some("Jane Doe".to_string()), summary.created_by_name);

        let summary = meetings.iter().find(|m| m.id == unknown.id).unwrap();
        assert_eq!(None, summary.created_by_name);
    }

    #[tokio::test]
    async fn test_list_never_returns_deleted_meetings() {
        let storage = Memory::new();
        let user_id = Uuid::new_v4();

        let kept = create_meeting(&storage, Related::Lead, &user_id).await;
        let deleted = create_meeting(&storage, Related::Lead, &user_id).await;
        create_meeting(&storage, Related::Contact, &user_id).await;

        storage.delete_meeting(&deleted).await.unwrap();

        let filter = MeetingFilter {
            related: Some(Related::Lead),
            ..MeetingFilter::default()
        };

        let meetings = list_meetings(&storage, &filter).await.unwrap();

        assert_eq!(1, meetings.len());
        assert_eq!(kept.id, meetings[0].id);
        assert!(meetings.iter().all(|meeting| !meeting.deleted));
    }
}
