//! Twitter v1.1 REST client.
//!
//! Only the two endpoints the grant workflow needs:
//! `GET users/show.json` and `POST direct_messages/events/new.json`.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::oauth::{self, percent_encode, OAuthCredentials};
use crate::{Profile, Result, SocialApi, SocialError};

/// Production API root.
pub const TWITTER_API_URL: &str = "https://api.twitter.com/1.1";

/// Per-request timeout unless the caller picks another.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// "User not found."
const ERR_USER_NOT_FOUND: i64 = 50;
/// "User has been suspended."
const ERR_USER_SUSPENDED: i64 = 63;
/// "You cannot send messages to users who are not following you."
const ERR_NOT_FOLLOWING: i64 = 150;
/// "You cannot send messages to this user."
const ERR_CANNOT_MESSAGE: i64 = 349;

/// OAuth 1.0a user-context Twitter client.
#[derive(Clone, Debug)]
pub struct TwitterClient {
    api_url: String,
    credentials: OAuthCredentials,
    http: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct TwitterUser {
    id_str: String,
    screen_name: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    profile_image_url_https: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

impl From<TwitterUser> for Profile {
    fn from(user: TwitterUser) -> Self {
        Self {
            id: user.id_str,
            screen_name: user.screen_name,
            name: user.name,
            avatar_url: user.profile_image_url_https,
        }
    }
}

/// Map a failed response to the error taxonomy.
fn classify_error(status: reqwest::StatusCode, body: &str, subject: &str) -> SocialError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let first = parsed.errors.first();
    let code = first.map(|e| e.code);
    let message = first
        .map(|e| e.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string());

    match (status.as_u16(), code) {
        (_, Some(ERR_USER_NOT_FOUND | ERR_USER_SUSPENDED)) | (404, _) => {
            SocialError::NotFound(subject.to_string())
        }
        (_, Some(ERR_CANNOT_MESSAGE | ERR_NOT_FOLLOWING)) | (403, _) => {
            SocialError::Rejected(message)
        }
        (status, _) => SocialError::Api { status, message },
    }
}

impl TwitterClient {
    /// Create a client against `api_url` (normally [`TWITTER_API_URL`]).
    pub fn new(api_url: impl Into<String>, credentials: OAuthCredentials) -> Result<Self> {
        Self::with_timeout(api_url, credentials, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Like [`TwitterClient::new`], with every request bounded by `timeout`.
    pub fn with_timeout(
        api_url: impl Into<String>,
        credentials: OAuthCredentials,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("waxbadges/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| SocialError::Http(e.to_string()))?;
        Ok(Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            credentials,
            http,
        })
    }

    async fn read_response(response: reqwest::Response, subject: &str) -> Result<String> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SocialError::Http(e.to_string()))?;
        if status.is_success() {
            Ok(text)
        } else {
            Err(classify_error(status, &text, subject))
        }
    }
}

#[async_trait]
impl SocialApi for TwitterClient {
    async fn get_profile(&self, handle: &str) -> Result<Profile> {
        let url = format!("{}/users/show.json", self.api_url);
        let auth =
            oauth::authorization_header(&self.credentials, "GET", &url, &[("screen_name", handle)])?;
        debug!(%handle, "looking up profile");

        let response = self
            .http
            .get(format!("{url}?screen_name={}", percent_encode(handle)))
            .header(reqwest::header::AUTHORIZATION, auth)
            .send()
            .await
            .map_err(|e| SocialError::Http(e.to_string()))?;

        let body = Self::read_response(response, handle).await?;
        let user: TwitterUser = serde_json::from_str(&body)
            .map_err(|e| SocialError::Decode(format!("users/show: {e}")))?;
        Ok(user.into())
    }

    async fn send_direct_message(&self, text: &str, handle: &str) -> Result<()> {
        let recipient = self.get_profile(handle).await?;

        let url = format!("{}/direct_messages/events/new.json", self.api_url);
        let auth = oauth::authorization_header(&self.credentials, "POST", &url, &[])?;
        let body = json!({
            "event": {
                "type": "message_create",
                "message_create": {
                    "target": {"recipient_id": recipient.id},
                    "message_data": {"text": text}
                }
            }
        });

        let response = self
            .http
            .post(&url)
            .header(reqwest::header::AUTHORIZATION, auth)
            .json(&body)
            .send()
            .await
            .map_err(|e| SocialError::Http(e.to_string()))?;

        Self::read_response(response, handle).await?;
        info!(%handle, recipient_id = %recipient.id, "direct message sent");
        Ok(())
    }
}
