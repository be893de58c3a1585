//! Run configuration, loaded from a JSON file
//!
//! The only state that survives between runs lives in three small files: this
//! configuration, the course service bearer token, and the calendar credential blob
//! (see [`crate::gcal::token`]). Everything else is rebuilt from live API responses.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::course::CourseId;
use crate::error::Error;

fn default_calendar_id() -> String {
    "primary".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

/// Everything a sync run needs to know about its surroundings.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the course service, e.g. `https://myschool.instructure.com`
    pub course_service_url: Url,
    /// File holding the course service bearer token (plain text)
    pub course_token_file: PathBuf,
    /// File holding the calendar service OAuth2 credential blob (JSON)
    pub calendar_credential_file: PathBuf,
    /// Which calendar to sync into
    #[serde(default = "default_calendar_id")]
    pub calendar_id: String,
    /// The institution's timezone, IANA name (e.g. `America/New_York`).
    /// Due dates arrive in UTC and are converted into this zone.
    pub timezone: String,
    /// File listing the tracked course IDs, one integer per line
    pub tracked_courses_file: PathBuf,
    /// Per-request timeout; expiry counts as a per-course failure, not a fatal abort
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Config {
    /// Load a configuration from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let file = std::fs::File::open(path)
            .map_err(|err| Error::Config(format!("unable to open {:?}: {}", path, err)))?;
        serde_json::from_reader(file)
            .map_err(|err| Error::Config(format!("unable to parse {:?}: {}", path, err)))
    }

    pub fn timezone(&self) -> Result<Tz, Error> {
        Tz::from_str(&self.timezone)
            .map_err(|err| Error::Config(format!("invalid timezone {:?}: {}", self.timezone, err)))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Read the bearer token for the course service, trimming surrounding whitespace
    pub fn course_token(&self) -> Result<String, Error> {
        let raw = std::fs::read_to_string(&self.course_token_file).map_err(|err| {
            Error::Config(format!("unable to read {:?}: {}", self.course_token_file, err))
        })?;
        let token = raw.trim().to_string();
        if token.is_empty() {
            return Err(Error::Auth(format!(
                "course token file {:?} is empty",
                self.course_token_file
            )));
        }
        Ok(token)
    }

    /// Read the tracked course IDs from the user-editable list
    pub fn tracked_courses(&self) -> Result<Vec<CourseId>, Error> {
        read_tracked_courses(&self.tracked_courses_file)
    }
}

/// Parse a tracked-courses file: one course ID per line, non-numeric lines ignored.
pub fn read_tracked_courses(path: &Path) -> Result<Vec<CourseId>, Error> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| Error::Config(format!("unable to read {:?}: {}", path, err)))?;

    let mut ids = Vec::new();
    for line in content.lines() {
        match line.trim().parse::<CourseId>() {
            Ok(id) => ids.push(id),
            Err(_) => {
                if line.trim().is_empty() == false {
                    log::debug!("Ignoring non-numeric line in {:?}: {:?}", path, line);
                }
            }
        }
    }
    Ok(ids)
}
