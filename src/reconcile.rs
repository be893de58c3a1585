//! The reconciler: matches fetched assignments against existing calendar events
//!
//! This is the centerpiece of the crate. Given the per-course assignments and the
//! unioned list of events fetched this run, it removes from each course every
//! assignment that is already represented by an event, leaving only the *residual*
//! assignments that still need an event created.

use std::collections::HashSet;

use crate::course::Course;
use crate::event::CalendarEvent;
use crate::matching::MatchPolicy;

/// Remove from every course the assignments that are already represented by a
/// fetched calendar event, according to `policy`.
///
/// After this returns, each course's assignment list is its residual: only
/// assignments for which no event title matched, in their original relative order.
///
/// The removal rule is deliberately quirky, inherited behavior that callers may rely
/// on: a matched name removes at most *one* assignment for the whole run, the first
/// occurrence in course iteration order. So if two courses both have an assignment
/// named "Quiz 1" and one event matches that name, only the first course's copy is
/// removed and the second course's copy stays in the residual. Same thing within a
/// single course: duplicate names lose only their first occurrence. See the tests at
/// the bottom of this file before "fixing" any of this.
pub fn reconcile(courses: &mut [Course], events: &[CalendarEvent], policy: &dyn MatchPolicy) {
    // Names that already triggered a removal in an earlier course
    let mut removed_names: HashSet<String> = HashSet::new();

    for course in courses.iter_mut() {
        let matched = matched_names(course, events, policy);
        log::debug!(
            "[{}] {} assignment name(s) already have a calendar event",
            course.name(),
            matched.len()
        );

        for name in matched {
            if removed_names.contains(&name) {
                log::debug!(
                    "[{}] \"{}\" was already removed for an earlier course, keeping this copy",
                    course.name(),
                    name
                );
                continue;
            }
            if course.remove_first_named(&name) {
                removed_names.insert(name);
            }
        }
    }
}

/// The names of this course's assignments that some event title matches,
/// each name listed once, in assignment order.
fn matched_names(course: &Course, events: &[CalendarEvent], policy: &dyn MatchPolicy) -> Vec<String> {
    let mut matched = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for assignment in course.assignments() {
        if seen.contains(assignment.name()) {
            continue;
        }
        if events.iter().any(|event| policy.matches(event.title(), assignment.name())) {
            seen.insert(assignment.name());
            matched.push(assignment.name().to_string());
        }
    }
    matched
}
