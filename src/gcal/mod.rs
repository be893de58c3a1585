//! The calendar service client (a Google-Calendar-style REST API)
//!
//! Read side: a single-field text search scoped to events starting at or after a
//! lower time bound. Write side: one insert per event to create. Authentication goes
//! through the persisted OAuth2 credential in [`token`].

pub mod token;

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use tokio::sync::Mutex;
use url::Url;

use crate::error::Error;
use crate::event::{CalendarEvent, CreatedEvent, EventPayload};
use crate::traits::CalendarSource;
use token::TokenStore;

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/calendar/v3/";

#[derive(Debug, Default, Deserialize)]
struct EventsPage {
    #[serde(default)]
    items: Vec<CalendarEvent>,
}

/// A [`CalendarSource`] backed by the calendar service REST API.
pub struct GoogleCalendarClient {
    base_url: Url,
    calendar_id: String,
    http: reqwest::Client,
    // The store rewrites its backing file on refresh, hence the lock
    token_store: Mutex<TokenStore>,
}

impl GoogleCalendarClient {
    /// Create a client from the persisted credential blob. This does not start a connection.
    pub fn new<S: ToString>(credential_file: &Path, calendar_id: S, timeout: Duration) -> Result<Self, Error> {
        let token_store = TokenStore::from_file(credential_file)?;
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| Error::Config(format!("unable to build an HTTP client: {}", err)))?;

        Ok(Self {
            base_url: Url::parse(DEFAULT_BASE_URL).unwrap(/* the default base URL is valid */),
            calendar_id: calendar_id.to_string(),
            http,
            token_store: Mutex::new(token_store),
        })
    }

    /// Point this client at another API base (e.g. a test server)
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    fn events_url(&self) -> Result<Url, Error> {
        self.base_url
            .join(&format!("calendars/{}/events", self.calendar_id))
            .map_err(|err| Error::Config(format!("invalid calendar id {:?}: {}", self.calendar_id, err)))
    }

    async fn access_token(&self) -> Result<String, Error> {
        let mut store = self.token_store.lock().await;
        store.access_token(&self.http, Utc::now()).await
    }
}

#[async_trait]
impl CalendarSource for GoogleCalendarClient {
    async fn search_events(
        &self,
        text: &str,
        min_start: DateTime<Utc>,
    ) -> Result<Vec<CalendarEvent>, Error> {
        let url = self.events_url()?;
        let access_token = self.access_token().await?;
        let time_min = min_start.to_rfc3339_opts(SecondsFormat::Secs, true);

        let response = self
            .http
            .get(url.clone())
            .query(&[
                ("timeMin", time_min.as_str()),
                ("q", text),
                ("singleEvents", "true"),
                ("orderBy", "startTime"),
            ])
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|err| Error::TransientFetch(format!("event search failed: {}", err)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Auth(format!("calendar service answered {}", status)));
        }
        if status.is_success() == false {
            return Err(Error::TransientFetch(format!(
                "calendar service answered {} to a search for {:?}",
                status, text
            )));
        }

        let page: EventsPage = response
            .json()
            .await
            .map_err(|err| Error::MalformedData(format!("unexpected event list answer: {}", err)))?;

        log::debug!("Search for {:?} returned {} event(s)", text, page.items.len());
        Ok(page.items)
    }

    async fn insert_event(&self, payload: &EventPayload) -> Result<CreatedEvent, Error> {
        let url = self.events_url()?;
        let access_token = self.access_token().await?;

        let response = self
            .http
            .post(url)
            .bearer_auth(access_token)
            .json(payload)
            .send()
            .await
            .map_err(|err| Error::Creation(format!("insert of {:?} failed: {}", payload.summary, err)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(Error::Auth(format!("calendar service answered {}", status)));
        }
        if status.is_success() == false {
            return Err(Error::Creation(format!(
                "calendar service answered {} to the insert of {:?}",
                status, payload.summary
            )));
        }

        response
            .json()
            .await
            .map_err(|err| Error::MalformedData(format!("unexpected insert answer: {}", err)))
    }
}
