//! # waxbadges-social
//!
//! The social network side of achievement granting: looking up a user's
//! public profile and sending them a direct message.
//!
//! - [`SocialApi`] — the capability the grant workflow depends on
//! - [`oauth`] — OAuth 1.0a HMAC-SHA1 request signing
//! - [`twitter`] — Twitter v1.1 REST implementation

pub mod oauth;
pub mod twitter;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use oauth::OAuthCredentials;
pub use twitter::TwitterClient;

/// Error types for social API calls.
#[derive(Debug, thiserror::Error)]
pub enum SocialError {
    /// The handle does not resolve to an account.
    #[error("user not found: {0}")]
    NotFound(String),

    /// The platform refused the action, e.g. the recipient does not accept
    /// direct messages from the sender.
    #[error("rejected by platform: {0}")]
    Rejected(String),

    /// Any other non-success API response.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The HTTP request could not be completed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// A response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// Request signing failed.
    #[error("signing error: {0}")]
    Signing(String),
}

pub type Result<T> = std::result::Result<T, SocialError>;

/// Public profile data for one account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    /// Platform-assigned numeric id, as a string.
    pub id: String,
    pub screen_name: String,
    /// Display name.
    pub name: String,
    /// HTTPS avatar image URL, if the account has one.
    pub avatar_url: Option<String>,
}

/// Profile lookup and direct messaging.
#[async_trait]
pub trait SocialApi: Send + Sync {
    /// Look up the profile for a bare handle (no sigil).
    async fn get_profile(&self, handle: &str) -> Result<Profile>;

    /// Send `text` as a direct message to the bare handle.
    async fn send_direct_message(&self, text: &str, handle: &str) -> Result<()>;
}
