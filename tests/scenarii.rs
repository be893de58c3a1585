//! Helpers to build sync scenarios over the in-memory sources
//!
//! Scenarios share a fixed "now" so that due dates can be realistic constants instead
//! of offsets from the wall clock.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;

use corkboard::mocks::{InMemoryCalendarSource, InMemoryCourseSource};
use corkboard::{Assignment, CalendarEvent, Course, CourseId, EventPayload, Provider};

pub const TZ: Tz = chrono_tz::America::New_York;

/// The instant every scenario pretends the sync runs at
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 9, 1, 12, 0, 0).unwrap()
}

/// An assignment due at 23:59 local time on the given day
pub fn assignment(course_name: &str, name: &str, year: i32, month: u32, day: u32) -> Assignment {
    let due = TZ.with_ymd_and_hms(year, month, day, 23, 59, 0).unwrap();
    Assignment::new(name, due, course_name)
}

pub fn course(id: CourseId, name: &str, assignments: Vec<Assignment>) -> Course {
    let mut course = Course::new(id, name);
    course.set_assignments(assignments);
    course
}

/// A fetched event of which only the title matters
pub fn event(title: &str) -> CalendarEvent {
    CalendarEvent {
        summary: title.to_string(),
        ..CalendarEvent::default()
    }
}

/// What a payload we created looks like once fetched back from the calendar service
pub fn as_fetched(payload: &EventPayload) -> CalendarEvent {
    serde_json::from_value(serde_json::to_value(payload).unwrap()).unwrap()
}

/// A provider over in-memory sources, tracking every given course
pub fn provider(
    courses: Vec<Course>,
    events: Vec<CalendarEvent>,
) -> Provider<InMemoryCourseSource, InMemoryCalendarSource> {
    let tracked = courses.iter().map(|course| course.id()).collect();
    Provider::new(
        InMemoryCourseSource::new(courses),
        InMemoryCalendarSource::new(events),
        tracked,
    )
}
