//! Roster lookup and registration of new users.

use serde_json::Value;
use tracing::info;
use waxbadges_chain::Ledger;
use waxbadges_social::SocialApi;
use waxbadges_types::{Ecosystem, Handle};

use crate::action::{submit_action, AddUserArgs};
use crate::ecosystem::fetch_ecosystem;
use crate::visibility::wait_until_visible;
use crate::{GrantConfig, GrantError, Result};

/// Size suffix Twitter appends to the default 48x48 avatar.
const SMALL_AVATAR_SUFFIX: &str = "_normal";

/// Index of `handle` in the ecosystem's roster, ignoring case.
///
/// The first match wins.
pub fn find_user_index(ecosystem: &Ecosystem, handle: &Handle) -> Option<u32> {
    ecosystem
        .users
        .iter()
        .position(|user| handle.matches(&user.userid))
        .and_then(|index| u32::try_from(index).ok())
}

/// Full-size avatar URL: the small-size suffix removed, nothing else touched.
pub fn derive_avatar_url(image_url: &str) -> String {
    image_url.replace(SMALL_AVATAR_SUFFIX, "")
}

/// A freshly registered user.
#[derive(Clone, Debug)]
pub struct Provisioned {
    /// Roster index assigned by the ledger.
    pub user_id: u32,
    /// The ecosystem as re-read after registration.
    pub ecosystem: Ecosystem,
    /// Node response to the `adduser` transaction.
    pub response: Value,
}

/// Register `handle` in the ecosystem and wait until the ledger shows it.
///
/// Call only after [`find_user_index`] came back empty.
pub async fn provision_user(
    ledger: &dyn Ledger,
    social: &dyn SocialApi,
    config: &GrantConfig,
    ecosystem: &Ecosystem,
    handle: &Handle,
) -> Result<Provisioned> {
    let ecosystem_id = u32::try_from(ecosystem.key).map_err(|_| {
        GrantError::InvalidInput(format!("ecosystem key {} exceeds u32", ecosystem.key))
    })?;

    let profile = social
        .get_profile(handle.bare())
        .await
        .map_err(|source| GrantError::ProfileLookup {
            handle: handle.mention().to_string(),
            source,
        })?;
    let image_url = profile.avatar_url.unwrap_or_default();
    info!(avatar_url = %image_url, "avatar found");
    let avatarurl = derive_avatar_url(&image_url);

    let args = AddUserArgs {
        ecosystem_owner: config.account,
        ecosystem_id,
        user_name: handle.mention().to_string(),
        userid: handle.mention().to_string(),
        avatarurl,
    };
    let response = submit_action(ledger, config, &args).await?;

    let (user_id, refreshed) =
        wait_until_visible(&config.visibility, handle.mention(), move || async move {
            let ecosystem = fetch_ecosystem(ledger, config, ecosystem_id).await?;
            Ok(find_user_index(&ecosystem, handle).map(|index| (index, ecosystem)))
        })
        .await?;

    info!(user_id, handle = %handle, "user registered");
    Ok(Provisioned {
        user_id,
        ecosystem: refreshed,
        response,
    })
}
