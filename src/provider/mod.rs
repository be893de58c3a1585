//! This module drives one sync run across its two sources
//!
//! A [`Provider`] combines a [`CourseSource`] and a [`CalendarSource`] and runs the
//! whole pipeline: fetch upcoming assignments per tracked course, search the calendar
//! per course, reconcile the two, and create events for the residual assignments.
//! Every run is built from scratch out of live API responses; there is no state
//! shared between runs, and no state shared across courses besides the run summary.

use std::fmt::{Display, Formatter};

use chrono::{DateTime, Utc};

use crate::course::CourseId;
use crate::error::Error;
use crate::materialize::{is_duplicate, payload_for};
use crate::matching::{MatchPolicy, TitleContains};
use crate::reconcile::reconcile;
use crate::traits::{CalendarSource, CourseSource};

pub mod sync_progress;
use sync_progress::{FeedbackSender, SyncEvent, SyncProgress, SyncStage};

/// One event successfully created (or planned, in a dry run)
#[derive(Clone, Debug)]
pub struct CreatedAssignment {
    pub assignment: String,
    pub course: String,
    /// The link the calendar service answered with; `None` in a dry run
    pub html_link: Option<String>,
}

/// A course that could not be fully processed, and at which stage it failed
#[derive(Clone, Debug)]
pub struct CourseFailure {
    pub course: String,
    pub stage: SyncStage,
    pub error: String,
}

/// An assignment whose event creation was rejected
#[derive(Clone, Debug)]
pub struct CreationFailure {
    pub assignment: String,
    pub course: String,
    pub error: String,
}

/// What happened during one sync run.
///
/// Nothing that went wrong is ever swallowed: every skipped course and failed
/// creation ends up in here.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub created: Vec<CreatedAssignment>,
    /// Residual assignments that were not created because an identical event already exists
    pub skipped_duplicates: Vec<String>,
    pub course_failures: Vec<CourseFailure>,
    pub creation_failures: Vec<CreationFailure>,
    /// Whether this was a dry run (nothing was actually submitted)
    pub dry_run: bool,
}

impl RunSummary {
    pub fn is_success(&self) -> bool {
        self.course_failures.is_empty() && self.creation_failures.is_empty()
    }
}

impl Display for RunSummary {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let verb = if self.dry_run { "would be created" } else { "created" };
        writeln!(f, "{} event(s) {}, {} duplicate(s) skipped", self.created.len(), verb, self.skipped_duplicates.len())?;
        for created in &self.created {
            match &created.html_link {
                Some(link) => writeln!(f, "  + [{}] {} ({})", created.course, created.assignment, link)?,
                None => writeln!(f, "  + [{}] {}", created.course, created.assignment)?,
            }
        }
        for failure in &self.course_failures {
            writeln!(f, "  ! course {} failed while {}: {}", failure.course, failure.stage, failure.error)?;
        }
        for failure in &self.creation_failures {
            writeln!(f, "  ! creation of [{}] {} failed: {}", failure.course, failure.assignment, failure.error)?;
        }
        Ok(())
    }
}

/// A sync pipeline over a course source and a calendar, which is able to bring the
/// calendar in sync with the assignments.
///
/// Usually, `courses` is a [`CanvasClient`](crate::canvas::CanvasClient) and
/// `calendar` a [`GoogleCalendarClient`](crate::gcal::GoogleCalendarClient). \
/// However, both can be replaced by the in-memory sources from [`crate::mocks`],
/// which is how the integration tests run whole syncs without a network.
pub struct Provider<C, G>
where
    C: CourseSource,
    G: CalendarSource,
{
    courses: C,
    calendar: G,
    /// The user-tracked course IDs; an empty list tracks every active course
    tracked: Vec<CourseId>,
    /// An optional further restriction for this provider's runs (e.g. from a trigger request)
    restrict: Option<Vec<CourseId>>,
    policy: Box<dyn MatchPolicy + Send + Sync>,
    dry_run: bool,
}

impl<C, G> Provider<C, G>
where
    C: CourseSource,
    G: CalendarSource,
{
    /// Create a provider over the two sources, with the default title-substring
    /// matching policy.
    pub fn new(courses: C, calendar: G, tracked: Vec<CourseId>) -> Self {
        Self {
            courses,
            calendar,
            tracked,
            restrict: None,
            policy: Box::new(TitleContains),
            dry_run: false,
        }
    }

    /// Replace the matching policy that decides whether an event represents an assignment
    pub fn with_policy<P: MatchPolicy + Send + Sync + 'static>(mut self, policy: P) -> Self {
        self.policy = Box::new(policy);
        self
    }

    /// Restrict the next runs to a subset of the tracked courses
    pub fn restricted_to(mut self, course_ids: Vec<CourseId>) -> Self {
        self.restrict = Some(course_ids);
        self
    }

    /// In a dry run, the pipeline runs fully but nothing is submitted to the calendar
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Returns the course source
    pub fn course_source(&self) -> &C {
        &self.courses
    }
    /// Returns the calendar source
    pub fn calendar_source(&self) -> &G {
        &self.calendar
    }

    /// Run one sync.
    ///
    /// Only an authentication failure (or a completely unreachable course service)
    /// makes this return `Err`. Partial failures are reported in the summary, and
    /// running again later simply picks up whatever is still missing.
    pub async fn sync(&self) -> Result<RunSummary, Error> {
        let mut progress = SyncProgress::new();
        self.run_sync(Utc::now(), &mut progress).await
    }

    /// Run one sync, and provide feedback to the user about the progress.
    ///
    /// See [`Self::sync`]
    pub async fn sync_with_feedback(&self, feedback_sender: FeedbackSender) -> Result<RunSummary, Error> {
        let mut progress = SyncProgress::new_with_feedback_channel(feedback_sender);
        self.run_sync(Utc::now(), &mut progress).await
    }

    /// Run one sync as if the current time was `now`.
    ///
    /// "Now" is established once per run and passed through every stage, so the
    /// up-coming filter and the calendar lower bound always agree.
    pub async fn sync_at(&self, now: DateTime<Utc>) -> Result<RunSummary, Error> {
        let mut progress = SyncProgress::new();
        self.run_sync(now, &mut progress).await
    }

    async fn run_sync(&self, now: DateTime<Utc>, progress: &mut SyncProgress) -> Result<RunSummary, Error> {
        progress.info("Starting a sync.");
        progress.feedback(SyncEvent::Started);

        let mut summary = RunSummary::default();
        summary.dry_run = self.dry_run;

        let mut courses = self.courses.get_courses().await?;
        if self.tracked.is_empty() == false {
            courses.retain(|course| self.tracked.contains(&course.id()));
        }
        if let Some(restrict) = &self.restrict {
            courses.retain(|course| restrict.contains(&course.id()));
        }
        progress.info(&format!("Syncing {} tracked course(s)", courses.len()));

        // Stage 1: fetch the upcoming assignments of every tracked course
        let mut fetched = Vec::new();
        for mut course in courses {
            progress.feedback(SyncEvent::InProgress {
                stage: SyncStage::FetchingAssignments,
                details: course.name().to_string(),
            });
            match self.courses.get_upcoming_assignments(course.id(), course.name(), now).await {
                Ok(assignments) => {
                    course.set_assignments(assignments);
                    fetched.push(course);
                }
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    progress.warn(&format!(
                        "Unable to fetch assignments for {}: {}. Skipping this course.",
                        course.name(),
                        err
                    ));
                    summary.course_failures.push(CourseFailure {
                        course: course.name().to_string(),
                        stage: SyncStage::FetchingAssignments,
                        error: err.to_string(),
                    });
                }
            }
        }

        // Stage 2: search the calendar, scoped by course name, into one flat union.
        // This must complete for every course before reconciling starts.
        let mut events = Vec::new();
        for course in &fetched {
            progress.feedback(SyncEvent::InProgress {
                stage: SyncStage::QueryingCalendar,
                details: course.name().to_string(),
            });
            match self.calendar.search_events(course.name(), now).await {
                Ok(found) => events.extend(found),
                Err(err) if err.is_fatal() => return Err(err),
                Err(err) => {
                    progress.warn(&format!(
                        "Unable to query the calendar for {}: {}. Its assignments may be re-created as duplicates.",
                        course.name(),
                        err
                    ));
                    summary.course_failures.push(CourseFailure {
                        course: course.name().to_string(),
                        stage: SyncStage::QueryingCalendar,
                        error: err.to_string(),
                    });
                }
            }
        }

        // Stage 3: reconcile, leaving only the residual assignments
        progress.feedback(SyncEvent::InProgress {
            stage: SyncStage::Reconciling,
            details: format!("{} event(s) fetched", events.len()),
        });
        reconcile(&mut fetched, &events, self.policy.as_ref());

        // Stage 4: create one event per residual assignment
        let mut submitted = Vec::new();
        for course in &fetched {
            if course.assignments().is_empty() {
                progress.info(&format!("[{}] No assignments to add, everything up to date", course.name()));
                continue;
            }
            for assignment in course.assignments() {
                let payload = payload_for(assignment);
                if is_duplicate(&payload, &events, &submitted) {
                    progress.debug(&format!(
                        "[{}] An identical event for \"{}\" already exists, skipping it",
                        course.name(),
                        assignment.name()
                    ));
                    summary.skipped_duplicates.push(assignment.name().to_string());
                    continue;
                }

                progress.feedback(SyncEvent::InProgress {
                    stage: SyncStage::CreatingEvents,
                    details: assignment.name().to_string(),
                });

                if self.dry_run {
                    progress.info(&format!("[{}] Would add \"{}\"", course.name(), assignment.name()));
                    summary.created.push(CreatedAssignment {
                        assignment: assignment.name().to_string(),
                        course: course.name().to_string(),
                        html_link: None,
                    });
                    submitted.push(payload);
                    continue;
                }

                match self.calendar.insert_event(&payload).await {
                    Ok(created) => {
                        progress.info(&format!(
                            "[{}] Assignment added: {}",
                            course.name(),
                            created.html_link.as_deref().unwrap_or(&created.id)
                        ));
                        summary.created.push(CreatedAssignment {
                            assignment: assignment.name().to_string(),
                            course: course.name().to_string(),
                            html_link: created.html_link,
                        });
                        submitted.push(payload);
                    }
                    Err(err) if err.is_fatal() => return Err(err),
                    Err(err) => {
                        progress.warn(&format!(
                            "[{}] Unable to add \"{}\": {}",
                            course.name(),
                            assignment.name(),
                            err
                        ));
                        summary.creation_failures.push(CreationFailure {
                            assignment: assignment.name().to_string(),
                            course: course.name().to_string(),
                            error: err.to_string(),
                        });
                    }
                }
            }
        }

        progress.info("Sync ended");
        progress.feedback(SyncEvent::Finished {
            success: summary.is_success() && progress.is_success(),
        });

        Ok(summary)
    }
}
