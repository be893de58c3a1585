//! The error taxonomy of a sync run
//!
//! Only [`Error::Auth`] (and a completely unreachable course service) should ever abort
//! a whole run. Everything else is attached to the offending course or assignment and
//! surfaced in the run summary.

use thiserror::Error;

/// Errors that can happen while talking to the course or calendar services.
#[derive(Debug, Error)]
pub enum Error {
    /// A credential is missing, invalid or could not be refreshed. This is fatal for the run.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A network problem or a 5xx on a single request. Retried a few times, then the
    /// affected course is skipped and reported.
    #[error("transient fetch failure: {0}")]
    TransientFetch(String),

    /// The response did not have the expected shape.
    #[error("malformed data: {0}")]
    MalformedData(String),

    /// An event creation was rejected. The rest of the batch still runs.
    #[error("event creation failed: {0}")]
    Creation(String),

    /// A problem with the local configuration or credential files.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Whether this error should abort the whole run instead of being recorded
    /// against a single course or assignment.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Auth(_) => true,
            _ => false,
        }
    }
}
