//! Explicit workflow configuration.
//!
//! Built once at startup and handed to every step by reference.

use std::time::Duration;

use waxbadges_chain::Name;
use waxbadges_crypto::PrivateKey;
use waxbadges_types::{
    ECOSYSTEMS_TABLE, POA_BASE_URL, TABLE_QUERY_TIMEOUT_SECS, TRANSACTION_EXPIRATION_SECS,
    WAX_CONTRACT,
};

use crate::visibility::VisibilityPolicy;
use crate::{GrantError, Result};

/// Permission the signing account authorizes writes with by default.
pub const DEFAULT_PERMISSION: &str = "active";

/// Everything the workflow needs to read, sign and notify.
#[derive(Clone, Debug)]
pub struct GrantConfig {
    /// Signing account; must own the target ecosystem.
    pub account: Name,
    /// Permission used in each action's authorization.
    pub permission: Name,
    /// Contract holding the ecosystems table and actions.
    pub contract: Name,
    /// Table of ecosystem rows.
    pub ecosystems_table: Name,
    pub private_key: PrivateKey,
    /// Per-query timeout for table reads.
    pub table_timeout: Duration,
    /// How long after submission a transaction stays valid.
    pub expiration: Duration,
    /// Re-read policy after registering a user.
    pub visibility: VisibilityPolicy,
    /// Base of Proof-of-Achievement links.
    pub poa_base_url: String,
}

fn name(field: &str, text: &str) -> Result<Name> {
    Name::new(text).map_err(|e| GrantError::InvalidInput(format!("{field}: {e}")))
}

impl GrantConfig {
    /// Configuration for `account` with the production contract and defaults.
    pub fn new(account: &str, private_key: PrivateKey) -> Result<Self> {
        Ok(Self {
            account: name("account", account)?,
            permission: name("permission", DEFAULT_PERMISSION)?,
            contract: name("contract", WAX_CONTRACT)?,
            ecosystems_table: name("table", ECOSYSTEMS_TABLE)?,
            private_key,
            table_timeout: Duration::from_secs(TABLE_QUERY_TIMEOUT_SECS),
            expiration: Duration::from_secs(TRANSACTION_EXPIRATION_SECS),
            visibility: VisibilityPolicy::default(),
            poa_base_url: POA_BASE_URL.to_string(),
        })
    }

    /// Override the contract account.
    pub fn with_contract(mut self, contract: &str) -> Result<Self> {
        self.contract = name("contract", contract)?;
        Ok(self)
    }

    /// Override the authorizing permission.
    pub fn with_permission(mut self, permission: &str) -> Result<Self> {
        self.permission = name("permission", permission)?;
        Ok(self)
    }
}
