use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::course::{Assignment, Course, CourseId};
use crate::error::Error;
use crate::event::{CalendarEvent, CreatedEvent, EventPayload};

/// A source of courses and assignments (usually the LMS REST API).
#[async_trait]
pub trait CourseSource {
    /// Returns the courses the user is actively enrolled in, without assignments.
    /// A failure here means the course service is unreachable as a whole, which aborts the run.
    async fn get_courses(&self) -> Result<Vec<Course>, Error>;

    /// Returns the upcoming, unsubmitted assignments of one course, with due dates
    /// already converted to the institution's timezone. Only assignments strictly due
    /// after `now` are returned; `now` is established once per run by the caller.
    async fn get_upcoming_assignments(
        &self,
        course_id: CourseId,
        course_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Assignment>, Error>;
}

/// A calendar that can be text-searched and appended to (usually an online calendar API).
#[async_trait]
pub trait CalendarSource {
    /// Text-search the calendar for events starting at or after `min_start`,
    /// ordered by start time. Read-only.
    async fn search_events(
        &self,
        text: &str,
        min_start: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, Error>;

    /// Create one event. Independent of any other creation; failures are reported
    /// per-assignment by the caller.
    async fn insert_event(&self, payload: &EventPayload) -> Result<CreatedEvent, Error>;
}
