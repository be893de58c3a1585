//! Calendar events: the ones we fetch, and the ones we are about to create

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The start or end of an event.
///
/// The calendar service uses `date` for all-day events and `dateTime` for timed ones.
/// We only ever *create* all-day events, but fetched events can be either.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EventDate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

impl EventDate {
    /// An all-day date in the given timezone
    pub fn all_day(date: NaiveDate, time_zone: &str) -> Self {
        Self {
            date: Some(date),
            date_time: None,
            time_zone: Some(time_zone.to_string()),
        }
    }
}

/// A single reminder, `minutes` before the event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReminderOverride {
    pub method: String,
    pub minutes: u32,
}

impl ReminderOverride {
    pub fn popup(minutes: u32) -> Self {
        Self {
            method: "popup".to_string(),
            minutes,
        }
    }
}

/// The reminder settings of an event
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminders {
    pub use_default: bool,
    pub overrides: Vec<ReminderOverride>,
}

/// The body we submit to the calendar service to create an event.
///
/// Equality is field-for-field, so that two payloads built from the same assignment
/// compare equal. This is what the duplicate guard uses.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    pub summary: String,
    pub description: String,
    pub color_id: String,
    pub start: EventDate,
    pub end: EventDate,
    pub reminders: Reminders,
}

/// An event fetched from the calendar service.
///
/// The service owns many more fields than these; we only deserialize the ones the
/// reconciler and the duplicate guard look at, and treat everything as read-only.
#[derive(Clone, Debug, PartialEq, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CalendarEvent {
    pub summary: String,
    pub description: Option<String>,
    pub color_id: Option<String>,
    pub start: Option<EventDate>,
    pub end: Option<EventDate>,
    pub reminders: Option<Reminders>,
}

impl CalendarEvent {
    /// The event title (the service calls this field "summary")
    pub fn title(&self) -> &str {
        &self.summary
    }

    /// Whether this fetched event is, field for field, the event that `payload` would create
    pub fn matches_payload(&self, payload: &EventPayload) -> bool {
        self.summary == payload.summary
            && self.description.as_deref() == Some(payload.description.as_str())
            && self.color_id.as_deref() == Some(payload.color_id.as_str())
            && self.start.as_ref() == Some(&payload.start)
            && self.end.as_ref() == Some(&payload.end)
            && self.reminders.as_ref() == Some(&payload.reminders)
    }
}

/// What the calendar service answers to a successful creation
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreatedEvent {
    pub id: String,
    pub html_link: Option<String>,
}
