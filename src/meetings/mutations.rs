//! Creating and soft-deleting meetings

use chrono::NaiveDateTime;
use chrono::Timelike;
use chrono::Utc;
use uuid::Uuid;

use crate::storage::CreateMeetingValues;
use crate::storage::Storage;

use super::Error;
use super::Meeting;
use super::Related;
use super::Result;
use super::parse_identifier;

/// Meeting as proposed by a caller, not yet validated
#[derive(Clone, Debug, Default)]
pub struct MeetingDraft {
    /// Required, can not be blank
    pub agenda: Option<String>,
    pub attendees: Vec<Uuid>,
    pub attendees_lead: Vec<Uuid>,
    pub location: Option<String>,
    pub related: Related,

    /// Required, `YYYY-MM-DDTHH:MM` with optional seconds, not in the past
    pub date_time: Option<String>,
    pub notes: Option<String>,

    /// Required, the user on whose behalf the meeting is created
    pub create_by: Option<Uuid>,
}

/// Result of soft-deleting multiple meetings
#[derive(Clone, Debug)]
pub struct DeleteManyOutcome {
    /// The requested IDs, parsed
    pub meeting_ids: Vec<Uuid>,

    /// Meetings that were not deleted before
    pub modified: u64,
}

/// Accepted layouts of `dateTime`, as sent by a `datetime-local` input
const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

/// Parse the date and time of a meeting and make sure it is not before `now`
///
/// Only whole minutes are compared, a meeting planned for the current minute is accepted.
fn parse_date_time(date_time: Option<&str>, now: NaiveDateTime) -> Result<NaiveDateTime> {
    let date_time = date_time
        .map(str::trim)
        .filter(|date_time| !date_time.is_empty())
        .ok_or_else(|| Error::Validation("Date and time is required".to_string()))?;

    let parsed = DATE_TIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(date_time, format).ok())
        .ok_or_else(|| Error::Validation("Invalid date and time".to_string()))?;

    let current_minute = now
        .with_second(0)
        .and_then(|minute| minute.with_nanosecond(0))
        .unwrap_or(now);

    if parsed < current_minute {
        return Err(Error::Validation(
            "Date and time can not be in the past".to_string(),
        ));
    }

    Ok(parsed)
}

/// Create a meeting from a draft
///
/// The storage assigns the ID and timestamp, the meeting starts out not deleted.
pub async fn create_meeting<S: Storage>(storage: &S, draft: &MeetingDraft) -> Result<Meeting> {
    let agenda = draft
        .agenda
        .as_deref()
        .map(str::trim)
        .filter(|agenda| !agenda.is_empty())
        .ok_or_else(|| Error::Validation("Agenda is required".to_string()))?;

    let create_by = draft
        .create_by
        .as_ref()
        .ok_or_else(|| Error::Validation("Creator is required".to_string()))?;

    let date_time = draft.date_time.as_deref().map(str::trim);
    parse_date_time(date_time, Utc::now().naive_utc())?;

    let values = CreateMeetingValues {
        agenda,
        attendees: &draft.attendees,
        attendees_lead: &draft.attendees_lead,
        location: draft.location.as_deref(),
        related: draft.related,
        date_time,
        notes: draft.notes.as_deref(),
        create_by,
    };

    let meeting = storage.create_meeting(&values).await?;

    tracing::debug!("Created meeting {} by {}", meeting.id, meeting.create_by);

    Ok(meeting)
}

/// Soft-delete a single meeting
///
/// Deleting an already deleted meeting succeeds again, only unknown IDs are not found.
pub async fn delete_meeting<S: Storage>(storage: &S, id: &str) -> Result<Meeting> {
    let id = parse_identifier(id)?;

    let meeting = storage
        .find_single_meeting_by_id_unchecked(&id)
        .await?
        .ok_or_else(|| Error::NotFound("Meeting not found".to_string()))?;

    if meeting.deleted {
        tracing::debug!("Meeting {id} was already deleted");
    }

    storage
        .delete_meeting(&meeting)
        .await?
        .ok_or_else(|| Error::NotFound("Meeting not found".to_string()))
}

/// Soft-delete multiple meetings at once
///
/// Fails when no ID is given or when none of the IDs belong to a meeting. IDs of unknown
/// meetings are otherwise ignored.
pub async fn delete_meetings<S: Storage>(
    storage: &S,
    ids: &[String],
) -> Result<DeleteManyOutcome> {
    if ids.is_empty() {
        return Err(Error::Validation("Invalid or empty meeting IDs".to_string()));
    }

    let ids = ids
        .iter()
        .map(|id| parse_identifier(id))
        .collect::<Result<Vec<Uuid>>>()?;

    let summary = storage.delete_meetings(&ids).await?;

    if summary.matched == 0 {
        return Err(Error::NotFound("No matching meetings found".to_string()));
    }

    tracing::debug!(
        "Deleted {} of {} matched meetings",
        summary.modified,
        summary.matched
    );

    Ok(DeleteManyOutcome {
        meeting_ids: ids,
        modified: summary.modified,
    })
}

#[cfg(all(test, not(feature = "postgres")))]
mod tests {
    use chrono::NaiveDate;

    use crate::meetings::MeetingFilter;
    use crate::meetings::list_meetings;
    use crate::storage::Memory;

    use super::*;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 18)
            .and_then(|date| date.and_hms_milli_opt(12, 0, 30, 250))
            .unwrap()
    }

    fn draft() -> MeetingDraft {
        MeetingDraft {
            agenda: Some("Contract renewal".to_string()),
            related: Related::Contact,
            attendees: vec![Uuid::new_v4()],
            date_time: Some("2099-12-01T14:00".to_string()),
            create_by: Some(Uuid::new_v4()),
            ..MeetingDraft::default()
        }
    }

    #[tokio::test]
    async fn test_create_meeting() {
        let storage = Memory::new();
        let draft = draft();

        let meeting = create_meeting(&storage, &draft).await.unwrap();

        assert_eq!("Contract renewal", meeting.agenda);
        assert_eq!(draft.attendees, meeting.attendees);
        assert_eq!(draft.create_by, Some(meeting.create_by));
        assert!(!meeting.deleted);

        let stored = storage
            .find_single_meeting_by_id_unchecked(&meeting.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(meeting.timestamp, stored.timestamp);
    }

    #[tokio::test]
    async fn test_create_meeting_requires_agenda() {
        let storage = Memory::new();

        let missing = MeetingDraft {
            agenda: None,
            ..draft()
        };
        let result = create_meeting(&storage, &missing).await;
        assert!(matches!(result, Err(Error::Validation(_))));

        let blank = MeetingDraft {
            agenda: Some("   ".to_string()),
            ..draft()
        };
        let result = create_meeting(&storage, &blank).await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_meeting_requires_date_time() {
        let storage = Memory::new();

        for date_time in [None, Some(""), Some("  ")] {
            let without = MeetingDraft {
                date_time: date_time.map(str::to_string),
                ..draft()
            };
            let result = create_meeting(&storage, &without).await;

            match result {
                Err(Error::Validation(message)) => {
                    assert_eq!("Date and time is required", message);
                }
                other => panic!("Unexpected result: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_create_meeting_rejects_past_date_time() {
        let storage = Memory::new();

        let past = MeetingDraft {
            date_time: Some("2001-01-01T09:00".to_string()),
            ..draft()
        };
        let result = create_meeting(&storage, &past).await;

        match result {
            Err(Error::Validation(message)) => {
                assert_eq!("Date and time can not be in the past", message);
            }
            other => panic!("Unexpected result: {other:?}"),
        }

        let meetings = list_meetings(&storage, &MeetingFilter::default())
            .await
            .unwrap();
        assert!(meetings.is_empty());
    }

    #[tokio::test]
    async fn test_create_meeting_rejects_invalid_date_time() {
        let storage = Memory::new();

        for date_time in ["tomorrow", "2099-13-01T10:00", "2099-12-01", "01/12/2099 10:00"] {
            let invalid = MeetingDraft {
                date_time: Some(date_time.to_string()),
                ..draft()
            };
            let result = create_meeting(&storage, &invalid).await;

            assert!(
                matches!(result, Err(Error::Validation(ref message)) if message == "Invalid date and time"),
                "{date_time} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_create_meeting_trims_date_time() {
        let storage = Memory::new();

        let padded = MeetingDraft {
            date_time: Some(" 2099-12-01T14:00:30 ".to_string()),
            ..draft()
        };
        let meeting = create_meeting(&storage, &padded).await.unwrap();

        assert_eq!(Some("2099-12-01T14:00:30"), meeting.date_time.as_deref());
    }

    #[test]
    fn test_parse_date_time_compares_whole_minutes() {
        let now = noon();

        assert!(parse_date_time(Some("2026-10-18T12:00"), now).is_ok());
        assert!(parse_date_time(Some("2026-10-18T12:00:00"), now).is_ok());
        assert!(parse_date_time(Some("2026-10-18T12:01"), now).is_ok());
        assert!(parse_date_time(Some("2026-10-18T11:59"), now).is_err());
        assert!(parse_date_time(Some("2026-10-18T11:59:59"), now).is_err());
    }

    #[tokio::test]
    async fn test_create_meeting_requires_creator() {
        let storage = Memory::new();

        let anonymous = MeetingDraft {
            create_by: None,
            ..draft()
        };
        let result = create_meeting(&storage, &anonymous).await;

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_meeting_is_idempotent() {
        let storage = Memory::new();
        let meeting = create_meeting(&storage, &draft()).await.unwrap();
        let id = meeting.id.to_string();

        let deleted = delete_meeting(&storage, &id).await.unwrap();
        assert!(deleted.deleted);

        let deleted = delete_meeting(&storage, &id).await.unwrap();
        assert!(deleted.deleted);

        let meetings = list_meetings(&storage, &MeetingFilter::default())
            .await
            .unwrap();
        assert!(meetings.is_empty());
    }

    #[tokio::test]
    async fn test_delete_unknown_meeting() {
        let storage = Memory::new();

        let result = delete_meeting(&storage, &Uuid::new_v4().to_string()).await;
        assert!(matches!(result, Err(Error::NotFound(_))));

        let result = delete_meeting(&storage, "some-id").await;
        assert!(matches!(result, Err(Error::InvalidIdentifier(_))));
    }

    #[tokio::test]
    async fn test_delete_meetings_requires_ids() {
        let storage = Memory::new();

        let result = delete_meetings(&storage, &[]).await;

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_meetings_unknown_ids() {
        let storage = Memory::new();
        create_meeting(&storage, &draft()).await.unwrap();

        let ids = vec![Uuid::new_v4().to_string(), Uuid::new_v4().to_string()];
        let result = delete_meetings(&storage, &ids).await;

        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_meetings_counts_only_modified() {
        let storage = Memory::new();
        let one = create_meeting(&storage, &draft()).await.unwrap();
        let two = create_meeting(&storage, &draft()).await.unwrap();
        let three = create_meeting(&storage, &draft()).await.unwrap();

        delete_meeting(&storage, &three.id.to_string())
            .await
            .unwrap();

        let ids = vec![
            one.id.to_string(),
            two.id.to_string(),
            three.id.to_string(),
            Uuid::new_v4().to_string(),
        ];
        let outcome = delete_meetings(&storage, &ids).await.unwrap();

        assert_eq!(2, outcome.modified);
        assert_eq!(4, outcome.meeting_ids.len());

        let meetings = list_meetings(&storage, &MeetingFilter::default())
            .await
            .unwrap();
        assert!(meetings.is_empty());
    }

    #[tokio::test]
    async fn test_delete_meetings_invalid_id() {
        let storage = Memory::new();
        let meeting = create_meeting(&storage, &draft()).await.unwrap();

        let ids = vec![meeting.id.to_string(), "some-id".to_string()];
        let result = delete_meetings(&storage, &ids).await;

        assert!(matches!(result, Err(Error::InvalidIdentifier(_))));
    }
}
