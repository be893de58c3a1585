//! The persisted calendar credential
//!
//! The calendar service authenticates with an OAuth2 credential obtained offline. We
//! hold it in a small JSON blob on disk, refresh the access token through the token
//! endpoint whenever it is about to expire, and rewrite the blob after each refresh.
//! This is the only state this crate persists besides its configuration.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::Error;

/// How close to its expiry an access token is still considered usable
const EXPIRY_MARGIN_SECONDS: i64 = 60;

/// The content of the credential blob
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoredCredential {
    pub access_token: String,
    pub refresh_token: String,
    pub client_id: String,
    pub client_secret: String,
    pub token_uri: Url,
    pub expiry: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access_token: String,
    expires_in: i64,
}

/// A credential blob and the file backing it.
#[derive(Debug)]
pub struct TokenStore {
    backing_file: PathBuf,
    credential: StoredCredential,
}

impl TokenStore {
    /// Load the credential blob. A missing or unreadable blob is an authentication
    /// failure: this crate never runs the interactive consent flow itself.
    pub fn from_file(path: &Path) -> Result<Self, Error> {
        let file = std::fs::File::open(path)
            .map_err(|err| Error::Auth(format!("unable to open credential file {:?}: {}", path, err)))?;
        let credential = serde_json::from_reader(file)
            .map_err(|err| Error::Auth(format!("unable to parse credential file {:?}: {}", path, err)))?;

        Ok(Self {
            backing_file: PathBuf::from(path),
            credential,
        })
    }

    /// Store the current credential back to its backing file
    fn save_to_file(&self) {
        let path = &self.backing_file;
        let file = match std::fs::File::create(path) {
            Err(err) => {
                log::warn!("Unable to save credential file {:?}: {}", path, err);
                return;
            }
            Ok(f) => f,
        };

        if let Err(err) = serde_json::to_writer(file, &self.credential) {
            log::warn!("Unable to serialize the credential: {}", err);
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + Duration::seconds(EXPIRY_MARGIN_SECONDS) >= self.credential.expiry
    }

    /// Return a usable access token, transparently refreshing it first if it is
    /// expired. A refresh failure is fatal for the run.
    pub async fn access_token(
        &mut self,
        http: &reqwest::Client,
        now: DateTime<Utc>,
    ) -> Result<String, Error> {
        if self.is_expired(now) == false {
            return Ok(self.credential.access_token.clone());
        }

        log::info!("The calendar access token has expired, refreshing it...");
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", self.credential.refresh_token.as_str()),
            ("client_id", self.credential.client_id.as_str()),
            ("client_secret", self.credential.client_secret.as_str()),
        ];

        let response = http
            .post(self.credential.token_uri.clone())
            .form(&params)
            .send()
            .await
            .map_err(|err| Error::Auth(format!("token refresh request failed: {}", err)))?;

        let status = response.status();
        if status.is_success() == false {
            return Err(Error::Auth(format!("token endpoint answered {}", status)));
        }

        let refreshed: RefreshResponse = response
            .json()
            .await
            .map_err(|err| Error::Auth(format!("unexpected token endpoint answer: {}", err)))?;

        self.credential.access_token = refreshed.access_token;
        self.credential.expiry = now + Duration::seconds(refreshed.expires_in);
        self.save_to_file();

        Ok(self.credential.access_token.clone())
    }
}
