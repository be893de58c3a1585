//! Courses and their assignments, as fetched from the course service

use chrono::DateTime;
use chrono_tz::Tz;

/// The identifier the course service gives to a course
pub type CourseId = u64;

/// A gradable item with a name and a due date.
///
/// Immutable once constructed. Its due date has already been converted to the
/// institution's timezone. Equality is structural (all fields), which is what the
/// in-batch duplicate guard relies on.
#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    name: String,
    due: DateTime<Tz>,
    course_name: String,
}

impl Assignment {
    pub fn new<S: ToString, T: ToString>(name: S, due: DateTime<Tz>, course_name: T) -> Self {
        Self {
            name: name.to_string(),
            due,
            course_name: course_name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The due date, in the institution's timezone
    pub fn due(&self) -> &DateTime<Tz> {
        &self.due
    }

    pub fn course_name(&self) -> &str {
        &self.course_name
    }
}

/// An enrollment unit from the course service, with the upcoming assignments that were
/// fetched for it during the current run.
///
/// Courses are rebuilt from live API responses on every run, nothing is persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct Course {
    id: CourseId,
    name: String,
    assignments: Vec<Assignment>,
}

impl Course {
    pub fn new<S: ToString>(id: CourseId, name: S) -> Self {
        Self {
            id,
            name: name.to_string(),
            assignments: Vec::new(),
        }
    }

    pub fn id(&self) -> CourseId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn assignments(&self) -> &[Assignment] {
        &self.assignments
    }

    pub fn add_assignment(&mut self, assignment: Assignment) {
        self.assignments.push(assignment);
    }

    /// Replace the assignment list, e.g. with the output of a fetch
    pub fn set_assignments(&mut self, assignments: Vec<Assignment>) {
        self.assignments = assignments;
    }

    /// Remove the first assignment that has this exact name.
    ///
    /// Returns whether something was removed. If several assignments share the same
    /// name, only the first one goes away, the others are left untouched.
    pub fn remove_first_named(&mut self, name: &str) -> bool {
        match self.assignments.iter().position(|a| a.name() == name) {
            Some(index) => {
                self.assignments.remove(index);
                true
            }
            None => false,
        }
    }
}
