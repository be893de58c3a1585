//! Utilities to track the progression of a sync run

use std::fmt::{Display, Error, Formatter};

/// The pipeline stage a sync run is currently in.
///
/// Stages are strict barriers: the reconciler only runs once the full fetch and the
/// full query outputs have been collected.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SyncStage {
    /// Pulling upcoming assignments from the course service
    FetchingAssignments,
    /// Searching the calendar for already-scheduled events
    QueryingCalendar,
    /// Matching assignments against events
    Reconciling,
    /// Creating events for the residual assignments
    CreatingEvents,
}

impl Display for SyncStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            SyncStage::FetchingAssignments => write!(f, "fetching assignments"),
            SyncStage::QueryingCalendar => write!(f, "querying the calendar"),
            SyncStage::Reconciling => write!(f, "reconciling"),
            SyncStage::CreatingEvents => write!(f, "creating events"),
        }
    }
}

/// An event that happens during a sync
#[derive(Clone, Debug)]
pub enum SyncEvent {
    /// Sync has not started
    NotStarted,
    /// Sync has just started but no course is handled yet
    Started,
    /// Sync is in progress
    InProgress { stage: SyncStage, details: String },
    /// Sync is finished
    Finished { success: bool },
}

impl Display for SyncEvent {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        match self {
            SyncEvent::NotStarted => write!(f, "Not started"),
            SyncEvent::Started => write!(f, "Sync has started..."),
            SyncEvent::InProgress { stage, details } => write!(f, "[{}] {}...", stage, details),
            SyncEvent::Finished { success } => match success {
                true => write!(f, "Sync successfully finished"),
                false => write!(f, "Sync finished with errors"),
            },
        }
    }
}

impl Default for SyncEvent {
    fn default() -> Self {
        Self::NotStarted
    }
}

/// See [`feedback_channel`]
pub type FeedbackSender = tokio::sync::watch::Sender<SyncEvent>;
/// See [`feedback_channel`]
pub type FeedbackReceiver = tokio::sync::watch::Receiver<SyncEvent>;

/// Create a feedback channel, that can be used to retrieve the current progress of a sync run
pub fn feedback_channel() -> (FeedbackSender, FeedbackReceiver) {
    tokio::sync::watch::channel(SyncEvent::default())
}

/// A structure that tracks the progression and the errors that happen during a sync
pub struct SyncProgress {
    n_errors: u32,
    feedback_channel: Option<FeedbackSender>,
}

impl SyncProgress {
    pub fn new() -> Self {
        Self {
            n_errors: 0,
            feedback_channel: None,
        }
    }
    pub fn new_with_feedback_channel(channel: FeedbackSender) -> Self {
        Self {
            n_errors: 0,
            feedback_channel: Some(channel),
        }
    }

    pub fn is_success(&self) -> bool {
        self.n_errors == 0
    }

    /// Log an error
    pub fn error(&mut self, text: &str) {
        log::error!("{}", text);
        self.n_errors += 1;
    }
    /// Log a warning
    pub fn warn(&mut self, text: &str) {
        log::warn!("{}", text);
        self.n_errors += 1;
    }
    /// Log an info
    pub fn info(&mut self, text: &str) {
        log::info!("{}", text);
    }
    /// Log a debug message
    pub fn debug(&mut self, text: &str) {
        log::debug!("{}", text);
    }
    /// Send an event as a feedback to the listener (if any).
    pub fn feedback(&mut self, event: SyncEvent) {
        if let Some(sender) = self.feedback_channel.as_ref() {
            let _ = sender.send(event);
        }
    }
}
