//! This crate synchronizes assignment due-dates from a learning-management service
//! into an online calendar.
//!
//! It provides a client for the course service in the [`canvas`] module and one for the
//! calendar service in the [`gcal`] module, both usable stand-alone.
//!
//! Because the two services share no identifier that would link an assignment to the
//! event it produced, the crate reconciles them heuristically: an assignment is
//! considered already scheduled when its name appears inside the title of some fetched
//! event (see [`matching`] and [`reconcile`]). \
//! These two sources are tied together by a [`Provider`](provider::Provider), which
//! runs the whole pipeline (fetch, query, reconcile, create) and reports everything it
//! did (and failed to do) in a [`RunSummary`](provider::RunSummary). Syncs are batch
//! reconciliations: runs are independent, one-way, and safe to repeat.

pub mod traits;

pub mod course;
pub use course::{Assignment, Course, CourseId};
pub mod event;
pub use event::{CalendarEvent, CreatedEvent, EventPayload};
pub mod matching;
pub mod reconcile;
pub mod materialize;
pub mod provider;
pub use provider::{Provider, RunSummary};

pub mod canvas;
pub mod gcal;

pub mod config;
pub mod error;
pub use error::Error;

pub mod mocks;

/// The usual production pairing: a course service REST client and a calendar REST client
pub type LmsCalendarProvider = Provider<canvas::CanvasClient, gcal::GoogleCalendarClient>;
