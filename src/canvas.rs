//! The course service client (a Canvas-style LMS REST API)
//!
//! Fetches active courses and, per course, the upcoming assignments that still need
//! to be worked on: a non-null due date, strictly in the future, and not submitted yet.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use url::Url;

use crate::course::{Assignment, Course, CourseId};
use crate::error::Error;
use crate::traits::CourseSource;

/// The fixed format the course service uses for due dates (always UTC)
const DUE_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// How many times a failed request is retried before the course is given up on
const MAX_RETRIES: u32 = 2;
/// Pause between retries
const RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Deserialize)]
struct CourseEntry {
    id: CourseId,
    name: String,
}

#[derive(Debug, Deserialize)]
struct AssignmentEntry {
    name: String,
    due_at: Option<String>,
    #[serde(default)]
    has_submitted_submissions: bool,
}

/// A [`CourseSource`] that fetches its data from the course service REST API.
pub struct CanvasClient {
    base_url: Url,
    token: String,
    timezone: Tz,
    http: reqwest::Client,
}

impl CanvasClient {
    /// Create a client. This does not start a connection.
    ///
    /// `token` is the bearer token; `timezone` is the institution's zone, which due
    /// dates are converted into before any "is it in the future" comparison.
    pub fn new<T: ToString>(base_url: Url, token: T, timezone: Tz, timeout: Duration) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| Error::Config(format!("unable to build an HTTP client: {}", err)))?;

        Ok(Self {
            base_url,
            token: token.to_string(),
            timezone,
            http,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        self.base_url
            .join(path)
            .map_err(|err| Error::Config(format!("invalid course service URL: {}", err)))
    }

    /// Issue a GET, retrying a few times on network errors and 5xx answers.
    /// 401/403 are authentication failures and are never retried.
    async fn get_with_retry(&self, url: Url, query: &[(&str, &str)]) -> Result<reqwest::Response, Error> {
        let mut attempt = 0;
        loop {
            let sent = self
                .http
                .get(url.clone())
                .query(query)
                .bearer_auth(&self.token)
                .send()
                .await;

            let failure = match sent {
                Ok(response) => {
                    let status = response.status();
                    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                        return Err(Error::Auth(format!(
                            "course service answered {} for {}",
                            status, url
                        )));
                    }
                    if status.is_success() {
                        return Ok(response);
                    }
                    format!("course service answered {} for {}", status, url)
                }
                Err(err) => format!("request to {} failed: {}", url, err),
            };

            if attempt >= MAX_RETRIES {
                return Err(Error::TransientFetch(failure));
            }
            attempt += 1;
            log::warn!("{}. Retrying ({}/{})...", failure, attempt, MAX_RETRIES);
            tokio::time::sleep(RETRY_DELAY).await;
        }
    }

    /// Fetch a list endpoint, tolerating malformed entries: anything in the array
    /// that is not an object of the expected shape is logged and skipped.
    async fn get_entries<E: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, &str)],
    ) -> Result<Vec<E>, Error> {
        let response = self.get_with_retry(url.clone(), query).await?;
        let values: Vec<serde_json::Value> = response
            .json()
            .await
            .map_err(|err| Error::MalformedData(format!("{} did not answer a JSON list: {}", url, err)))?;

        let mut entries = Vec::new();
        for value in values {
            if value.is_object() == false {
                log::warn!("Skipping a non-object entry from {}: {}", url, value);
                continue;
            }
            match serde_json::from_value(value) {
                Ok(entry) => entries.push(entry),
                Err(err) => log::warn!("Skipping a malformed entry from {}: {}", url, err),
            }
        }
        Ok(entries)
    }
}

#[async_trait]
impl CourseSource for CanvasClient {
    async fn get_courses(&self) -> Result<Vec<Course>, Error> {
        let url = self.endpoint("/api/v1/courses")?;
        let query = [("enrollment_state", "active"), ("state[]", "active")];

        let entries: Vec<CourseEntry> = self.get_entries(url, &query).await?;
        log::info!("The course service lists {} active course(s)", entries.len());

        Ok(entries
            .into_iter()
            .map(|entry| Course::new(entry.id, entry.name))
            .collect())
    }

    async fn get_upcoming_assignments(
        &self,
        course_id: CourseId,
        course_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Assignment>, Error> {
        let url = self.endpoint(&format!("/api/v1/courses/{}/assignments", course_id))?;
        let query = [("per_page", "100")];

        let entries: Vec<AssignmentEntry> = self.get_entries(url, &query).await?;

        let mut assignments = Vec::new();
        for entry in entries {
            let due_at = match entry.due_at {
                None => continue,
                Some(due_at) => due_at,
            };
            let due_utc = match NaiveDateTime::parse_from_str(&due_at, DUE_AT_FORMAT) {
                Ok(naive) => naive.and_utc(),
                Err(err) => {
                    log::warn!(
                        "[{}] Skipping \"{}\": unparseable due date {:?} ({})",
                        course_name, entry.name, due_at, err
                    );
                    continue;
                }
            };
            if due_utc <= now {
                continue;
            }
            if entry.has_submitted_submissions {
                continue;
            }
            assignments.push(Assignment::new(
                entry.name,
                due_utc.with_timezone(&self.timezone),
                course_name,
            ));
        }

        log::debug!("[{}] {} upcoming assignment(s)", course_name, assignments.len());
        Ok(assignments)
    }
}
