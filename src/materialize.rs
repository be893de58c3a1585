//! Turning residual assignments into creatable event payloads

use crate::course::Assignment;
use crate::event::{CalendarEvent, EventDate, EventPayload, ReminderOverride, Reminders};

/// The fixed display color of every event we create
const EVENT_COLOR_ID: &str = "8";

/// Reminder offsets, in minutes before the event: 24h and 48h
const REMINDER_MINUTES: [u32; 2] = [24 * 60, 24 * 120];

/// Build the event body for one residual assignment.
///
/// The event is all-day on the due *date* (not date-time), in the same timezone the
/// assignment's due date was converted to. The description carries the course name
/// and the local due time, since the all-day rendering drops the time itself.
pub fn payload_for(assignment: &Assignment) -> EventPayload {
    let due = assignment.due();
    let time_zone = due.timezone().name();
    let date = EventDate::all_day(due.date_naive(), time_zone);

    EventPayload {
        summary: assignment.name().to_string(),
        description: format!("{}\n\nDue at : {}", assignment.course_name(), due.time()),
        color_id: EVENT_COLOR_ID.to_string(),
        start: date.clone(),
        end: date,
        reminders: Reminders {
            use_default: false,
            overrides: REMINDER_MINUTES.iter().map(|m| ReminderOverride::popup(*m)).collect(),
        },
    }
}

/// Whether an identical event already exists, either among the events fetched this
/// run or among the payloads submitted earlier in the current batch.
///
/// "Identical" is field-for-field equality of the constructed payload, so this only
/// blocks exact repeats; a duplicate with different formatting sails through.
pub fn is_duplicate(payload: &EventPayload, fetched: &[CalendarEvent], submitted: &[EventPayload]) -> bool {
    fetched.iter().any(|event| event.matches_payload(payload))
        || submitted.iter().any(|previous| previous == payload)
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::TimeZone;
    use chrono_tz::America::New_York;

    fn hw3() -> Assignment {
        let due = New_York.with_ymd_and_hms(2024, 10, 10, 23, 59, 0).unwrap();
        Assignment::new("HW3", due, "CS 101")
    }

    #[test]
    fn payload_is_an_all_day_event_on_the_due_date() {
        let payload = payload_for(&hw3());

        assert_eq!(payload.summary, "HW3");
        assert_eq!(payload.description, "CS 101\n\nDue at : 23:59:00");
        assert_eq!(payload.color_id, "8");
        assert_eq!(payload.start, payload.end);
        assert_eq!(payload.start.date.unwrap().to_string(), "2024-10-10");
        assert_eq!(payload.start.date_time, None);
        assert_eq!(payload.start.time_zone.as_deref(), Some("America/New_York"));
        assert!(payload.reminders.use_default == false);
        let minutes: Vec<u32> = payload.reminders.overrides.iter().map(|o| o.minutes).collect();
        assert_eq!(minutes, vec![1440, 2880]);
        assert!(payload.reminders.overrides.iter().all(|o| o.method == "popup"));
    }

    #[test]
    fn duplicate_guard_blocks_exact_payload_repeats() {
        let payload = payload_for(&hw3());

        // Not present anywhere: goes through
        assert!(is_duplicate(&payload, &[], &[]) == false);

        // Already submitted in this batch: blocked
        let submitted = vec![payload.clone()];
        assert!(is_duplicate(&payload, &[], &submitted));

        // Present in the fetched snapshot: blocked. Running the materializer twice
        // against the same snapshot must not create a second identical event.
        let as_fetched: CalendarEvent =
            serde_json::from_value(serde_json::to_value(&payload).unwrap()).unwrap();
        assert!(is_duplicate(&payload, &[as_fetched], &[]));
    }

    #[test]
    fn a_differently_formatted_event_is_not_considered_a_duplicate() {
        let payload = payload_for(&hw3());
        let existing = CalendarEvent {
            summary: "HW3 (CS 101)".to_string(),
            ..CalendarEvent::default()
        };
        assert!(is_duplicate(&payload, &[existing], &[]) == false);
    }
}
