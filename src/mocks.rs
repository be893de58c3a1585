//! In-memory sources, used by the integration tests
//!
//! [`InMemoryCourseSource`] and [`InMemoryCalendarSource`] implement the same traits
//! as the real HTTP clients, so a [`Provider`](crate::Provider) can run a whole sync
//! against canned data. [`MockBehaviour`] tweaks how they behave, so that a given
//! test can make some of their functions fail.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::course::{Assignment, Course, CourseId};
use crate::error::Error;
use crate::event::{CalendarEvent, CreatedEvent, EventPayload};
use crate::traits::{CalendarSource, CourseSource};

/// Behaviour tweaks for the in-memory sources.
///
/// So that a function fails _n_ times after _m_ initial successes, set `(m, n)` for
/// the suited parameter.
#[derive(Default, Clone, Debug)]
pub struct MockBehaviour {
    /// If this is true, every action will be allowed
    pub is_suspended: bool,

    // From the CourseSource trait
    pub get_courses_behaviour: (u32, u32),
    pub get_upcoming_assignments_behaviour: (u32, u32),

    // From the CalendarSource trait
    pub search_events_behaviour: (u32, u32),
    pub insert_event_behaviour: (u32, u32),
}

impl MockBehaviour {
    pub fn new() -> Self {
        Self::default()
    }

    /// Suspend this mock behaviour until you call `resume`
    pub fn suspend(&mut self) {
        self.is_suspended = true;
    }
    /// Make this behaviour active again
    pub fn resume(&mut self) {
        self.is_suspended = false;
    }

    pub fn can_get_courses(&mut self) -> Result<(), Error> {
        if self.is_suspended {
            return Ok(());
        }
        decrement(&mut self.get_courses_behaviour, "get_courses")
    }
    pub fn can_get_upcoming_assignments(&mut self) -> Result<(), Error> {
        if self.is_suspended {
            return Ok(());
        }
        decrement(&mut self.get_upcoming_assignments_behaviour, "get_upcoming_assignments")
    }
    pub fn can_search_events(&mut self) -> Result<(), Error> {
        if self.is_suspended {
            return Ok(());
        }
        decrement(&mut self.search_events_behaviour, "search_events")
    }
    pub fn can_insert_event(&mut self) -> Result<(), Error> {
        if self.is_suspended {
            return Ok(());
        }
        decrement(&mut self.insert_event_behaviour, "insert_event")
    }
}

/// Return Ok(()) in case the value is `(1+, _)` or `(_, 0)`, or return Err and decrement otherwise
fn decrement(value: &mut (u32, u32), descr: &str) -> Result<(), Error> {
    let remaining_successes = value.0;
    let remaining_failures = value.1;

    if remaining_successes > 0 {
        value.0 -= 1;
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    } else if remaining_failures > 0 {
        value.1 -= 1;
        log::debug!("Mock behaviour: failing a {} ({:?})", descr, value);
        Err(Error::TransientFetch(format!(
            "mocked behaviour requires this {} to fail this time ({:?})",
            descr, value
        )))
    } else {
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    }
}

/// A [`CourseSource`] that serves canned courses and assignments.
pub struct InMemoryCourseSource {
    courses: Vec<Course>,
    /// Courses whose assignment fetch fails with a transient error
    failing_course_ids: HashSet<CourseId>,
    behaviour: Arc<Mutex<MockBehaviour>>,
}

impl InMemoryCourseSource {
    /// `courses` come with their assignments already attached; the due-date filter is
    /// still applied at fetch time, like the real client does.
    pub fn new(courses: Vec<Course>) -> Self {
        Self {
            courses,
            failing_course_ids: HashSet::new(),
            behaviour: Arc::new(Mutex::new(MockBehaviour::new())),
        }
    }

    /// Make the assignment fetch of one course fail (a mocked 500)
    pub fn fail_assignments_for(mut self, course_id: CourseId) -> Self {
        self.failing_course_ids.insert(course_id);
        self
    }

    pub fn with_behaviour(mut self, behaviour: Arc<Mutex<MockBehaviour>>) -> Self {
        self.behaviour = behaviour;
        self
    }
}

#[async_trait]
impl CourseSource for InMemoryCourseSource {
    async fn get_courses(&self) -> Result<Vec<Course>, Error> {
        self.behaviour.lock().unwrap().can_get_courses()?;
        Ok(self
            .courses
            .iter()
            .map(|course| Course::new(course.id(), course.name()))
            .collect())
    }

    async fn get_upcoming_assignments(
        &self,
        course_id: CourseId,
        course_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Assignment>, Error> {
        self.behaviour.lock().unwrap().can_get_upcoming_assignments()?;
        if self.failing_course_ids.contains(&course_id) {
            return Err(Error::TransientFetch(format!(
                "mocked fetch failure for course {}",
                course_name
            )));
        }

        let course = self
            .courses
            .iter()
            .find(|course| course.id() == course_id)
            .ok_or_else(|| Error::MalformedData(format!("unknown course {}", course_id)))?;

        Ok(course
            .assignments()
            .iter()
            .filter(|assignment| assignment.due().with_timezone(&Utc) > now)
            .cloned()
            .collect())
    }
}

/// A [`CalendarSource`] over a plain vector of events.
///
/// Searches ignore the query text and return every event (a real service scopes the
/// answer with its own text index); inserted payloads are recorded so tests can
/// inspect what a sync would have created.
pub struct InMemoryCalendarSource {
    events: Vec<CalendarEvent>,
    created: Mutex<Vec<EventPayload>>,
    behaviour: Arc<Mutex<MockBehaviour>>,
}

impl InMemoryCalendarSource {
    pub fn new(events: Vec<CalendarEvent>) -> Self {
        Self {
            events,
            created: Mutex::new(Vec::new()),
            behaviour: Arc::new(Mutex::new(MockBehaviour::new())),
        }
    }

    pub fn with_behaviour(mut self, behaviour: Arc<Mutex<MockBehaviour>>) -> Self {
        self.behaviour = behaviour;
        self
    }

    /// The payloads that have been inserted so far
    pub fn created(&self) -> Vec<EventPayload> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl CalendarSource for InMemoryCalendarSource {
    async fn search_events(
        &self,
        _text: &str,
        _min_start: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, Error> {
        self.behaviour.lock().unwrap().can_search_events()?;
        Ok(self.events.clone())
    }

    async fn insert_event(&self, payload: &EventPayload) -> Result<CreatedEvent, Error> {
        self.behaviour
            .lock()
            .unwrap()
            .can_insert_event()
            .map_err(|err| Error::Creation(err.to_string()))?;

        let mut created = self.created.lock().unwrap();
        created.push(payload.clone());
        Ok(CreatedEvent {
            id: format!("mock-event-{}", created.len()),
            html_link: Some(format!("https://calendar.example.org/event/{}", created.len())),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mock_behaviour() {
        let mut ok = MockBehaviour::new();
        assert!(ok.can_get_courses().is_ok());
        assert!(ok.can_get_courses().is_ok());
        assert!(ok.can_search_events().is_ok());

        let mut custom = MockBehaviour {
            get_courses_behaviour: (0, 1),
            insert_event_behaviour: (1, 2),
            ..MockBehaviour::default()
        };
        assert!(custom.can_get_courses().is_err());
        assert!(custom.can_get_courses().is_ok());
        assert!(custom.can_insert_event().is_ok());
        assert!(custom.can_insert_event().is_err());
        assert!(custom.can_insert_event().is_err());
        assert!(custom.can_insert_event().is_ok());

        custom.suspend();
        assert!(custom.can_get_courses().is_ok());
        custom.resume();
    }
}
