//! Settings file (`local_settings.toml`).
//!
//! Section and key names are accepted in lower case or in the upper-case
//! spelling of older settings files (`[TWITTER] CONSUMER_KEY = ...`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use waxbadges_crypto::PrivateKey;
use waxbadges_social::twitter::TWITTER_API_URL;
use waxbadges_social::OAuthCredentials;
use waxbadges_types::{POA_BASE_URL, WAX_CONTRACT, WAX_URL};
use waxbadges_workflow::config::DEFAULT_PERMISSION;
use waxbadges_workflow::{GrantConfig, VisibilityPolicy};

/// Default settings path, relative to the working directory.
pub const DEFAULT_SETTINGS_PATH: &str = "local_settings.toml";

/// Errors raised while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("cannot read settings file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse settings file: {0}")]
    Parse(#[from] toml::de::Error),

    /// A required key is absent or empty.
    #[error("missing setting {0}")]
    Missing(&'static str),

    #[error("invalid setting {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Complete settings file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default, alias = "TWITTER")]
    pub twitter: TwitterSettings,
    #[serde(default, alias = "WAX")]
    pub wax: WaxSettings,
    #[serde(default, alias = "WORKFLOW")]
    pub workflow: WorkflowSettings,
    #[serde(default, alias = "ADVANCED")]
    pub advanced: AdvancedSettings,
}

/// Twitter app and user credentials.
#[derive(Clone, Deserialize)]
pub struct TwitterSettings {
    #[serde(default, alias = "CONSUMER_KEY")]
    pub consumer_key: String,
    #[serde(default, alias = "CONSUMER_SECRET")]
    pub consumer_secret: String,
    #[serde(default, alias = "ACCESS_TOKEN")]
    pub access_token: String,
    #[serde(default, alias = "ACCESS_SECRET")]
    pub access_secret: String,
    #[serde(default = "default_api_url", alias = "API_URL")]
    pub api_url: String,
}

/// Ledger account and endpoint.
#[derive(Clone, Deserialize)]
pub struct WaxSettings {
    /// WIF or `PVT_K1_` key of the signing account.
    #[serde(default, alias = "PRIVATE_KEY")]
    pub private_key: String,
    #[serde(default, alias = "ACCOUNT_NAME")]
    pub account_name: String,
    #[serde(default = "default_chain_url", alias = "CHAIN_URL")]
    pub chain_url: String,
    #[serde(default = "default_contract", alias = "CONTRACT")]
    pub contract: String,
    #[serde(default = "default_permission", alias = "PERMISSION")]
    pub permission: String,
}

/// Timeouts and polling.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowSettings {
    #[serde(default = "default_table_timeout", alias = "TABLE_TIMEOUT_SECS")]
    pub table_timeout_secs: u64,
    #[serde(default = "default_expiration", alias = "EXPIRATION_SECS")]
    pub expiration_secs: u64,
    #[serde(default = "default_visibility_attempts", alias = "VISIBILITY_ATTEMPTS")]
    pub visibility_attempts: u32,
    #[serde(default = "default_visibility_interval", alias = "VISIBILITY_INTERVAL_MS")]
    pub visibility_interval_ms: u64,
    #[serde(default = "default_visibility_timeout", alias = "VISIBILITY_TIMEOUT_SECS")]
    pub visibility_timeout_secs: u64,
    #[serde(default = "default_poa_base_url", alias = "POA_BASE_URL")]
    pub poa_base_url: String,
}

/// Advanced settings.
#[derive(Debug, Clone, Deserialize)]
pub struct AdvancedSettings {
    /// Log level: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level", alias = "LOG_LEVEL")]
    pub log_level: String,
}

// Default value functions

fn default_api_url() -> String {
    TWITTER_API_URL.to_string()
}

fn default_chain_url() -> String {
    WAX_URL.to_string()
}

fn default_contract() -> String {
    WAX_CONTRACT.to_string()
}

fn default_permission() -> String {
    DEFAULT_PERMISSION.to_string()
}

fn default_table_timeout() -> u64 {
    30
}

fn default_expiration() -> u64 {
    60
}

fn default_visibility_attempts() -> u32 {
    3
}

fn default_visibility_interval() -> u64 {
    1000
}

fn default_visibility_timeout() -> u64 {
    10
}

fn default_poa_base_url() -> String {
    POA_BASE_URL.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TwitterSettings {
    fn default() -> Self {
        Self {
            consumer_key: String::new(),
            consumer_secret: String::new(),
            access_token: String::new(),
            access_secret: String::new(),
            api_url: default_api_url(),
        }
    }
}

impl std::fmt::Debug for TwitterSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwitterSettings")
            .field("consumer_key", &self.consumer_key)
            .field("access_token", &self.access_token)
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

impl Default for WaxSettings {
    fn default() -> Self {
        Self {
            private_key: String::new(),
            account_name: String::new(),
            chain_url: default_chain_url(),
            contract: default_contract(),
            permission: default_permission(),
        }
    }
}

impl std::fmt::Debug for WaxSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaxSettings")
            .field("account_name", &self.account_name)
            .field("chain_url", &self.chain_url)
            .field("contract", &self.contract)
            .field("permission", &self.permission)
            .finish_non_exhaustive()
    }
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            table_timeout_secs: default_table_timeout(),
            expiration_secs: default_expiration(),
            visibility_attempts: default_visibility_attempts(),
            visibility_interval_ms: default_visibility_interval(),
            visibility_timeout_secs: default_visibility_timeout(),
            poa_base_url: default_poa_base_url(),
        }
    }
}

impl Default for AdvancedSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn required(key: &'static str, value: &str) -> Result<(), SettingsError> {
    if value.trim().is_empty() {
        Err(SettingsError::Missing(key))
    } else {
        Ok(())
    }
}

impl Settings {
    /// Read and validate the settings file at `path`.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse and validate settings text.
    pub fn parse(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        required("twitter.consumer_key", &self.twitter.consumer_key)?;
        required("twitter.consumer_secret", &self.twitter.consumer_secret)?;
        required("twitter.access_token", &self.twitter.access_token)?;
        required("twitter.access_secret", &self.twitter.access_secret)?;
        required("wax.private_key", &self.wax.private_key)?;
        required("wax.account_name", &self.wax.account_name)?;
        if self.workflow.visibility_attempts == 0 {
            return Err(SettingsError::Invalid {
                key: "workflow.visibility_attempts",
                reason: "must be at least 1".into(),
            });
        }
        let timeout_ms = self.workflow.visibility_timeout_secs.saturating_mul(1000);
        if timeout_ms == 0 || timeout_ms < self.workflow.visibility_interval_ms {
            return Err(SettingsError::Invalid {
                key: "workflow.visibility_timeout_secs",
                reason: format!(
                    "must be non-zero and cover one {} ms interval",
                    self.workflow.visibility_interval_ms
                ),
            });
        }
        Ok(())
    }

    /// Twitter OAuth credentials.
    pub fn credentials(&self) -> OAuthCredentials {
        OAuthCredentials {
            consumer_key: self.twitter.consumer_key.clone(),
            consumer_secret: self.twitter.consumer_secret.clone(),
            access_token: self.twitter.access_token.clone(),
            access_secret: self.twitter.access_secret.clone(),
        }
    }

    /// The explicit workflow configuration.
    pub fn grant_config(&self) -> Result<GrantConfig, SettingsError> {
        let private_key =
            PrivateKey::parse(self.wax.private_key.trim()).map_err(|e| SettingsError::Invalid {
                key: "wax.private_key",
                reason: e.to_string(),
            })?;
        let invalid = |key: &'static str| {
            move |e: waxbadges_workflow::GrantError| SettingsError::Invalid {
                key,
                reason: e.to_string(),
            }
        };

        let mut config = GrantConfig::new(self.wax.account_name.trim(), private_key)
            .map_err(invalid("wax.account_name"))?
            .with_contract(&self.wax.contract)
            .map_err(invalid("wax.contract"))?
            .with_permission(&self.wax.permission)
            .map_err(invalid("wax.permission"))?;

        let workflow = &self.workflow;
        config.table_timeout = Duration::from_secs(workflow.table_timeout_secs);
        config.expiration = Duration::from_secs(workflow.expiration_secs);
        config.visibility = VisibilityPolicy {
            attempts: workflow.visibility_attempts,
            interval: Duration::from_millis(workflow.visibility_interval_ms),
            timeout: Duration::from_secs(workflow.visibility_timeout_secs),
        };
        config.poa_base_url = workflow.poa_base_url.clone();
        Ok(config)
    }
}
