//! The `grantach` write.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;
use waxbadges_chain::Ledger;

use crate::action::{submit_action, GrantArgs};
use crate::{GrantConfig, GrantError, Result};

/// Which achievement goes to which roster entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GrantTarget {
    pub ecosystem_id: u32,
    pub user_id: u32,
    pub category_id: u32,
    pub achievement_id: u32,
}

/// Record the grant on the ledger, stamped with `granted_at` in whole
/// seconds (truncated).
///
/// Unconditional: an identical earlier grant is not looked for.
pub async fn grant_achievement(
    ledger: &dyn Ledger,
    config: &GrantConfig,
    target: GrantTarget,
    granted_at: DateTime<Utc>,
) -> Result<Value> {
    let timestamp = u32::try_from(granted_at.timestamp())
        .map_err(|_| GrantError::InvalidInput(format!("timestamp {granted_at} outside u32")))?;

    let args = GrantArgs {
        ecosystem_owner: config.account,
        ecosystem_id: target.ecosystem_id,
        user_id: target.user_id,
        category_id: target.category_id,
        achievement_id: target.achievement_id,
        timestamp,
    };
    let response = submit_action(ledger, config, &args).await?;
    info!(
        user_id = target.user_id,
        category_id = target.category_id,
        achievement_id = target.achievement_id,
        "achievement granted"
    );
    Ok(response)
}
