//! Proof-of-Achievement links and the congratulation message.

use waxbadges_social::SocialApi;
use waxbadges_types::{Ecosystem, Handle};

use crate::ecosystem::validate_indices;
use crate::grant::GrantTarget;
use crate::{GrantError, Result};

/// `<base>/<ecosystem key>/<category>/<achievement>/<user>`
pub fn poa_link(base_url: &str, ecosystem_key: u64, target: &GrantTarget) -> String {
    format!(
        "{}/{ecosystem_key}/{}/{}/{}",
        base_url.trim_end_matches('/'),
        target.category_id,
        target.achievement_id,
        target.user_id
    )
}

/// Message text announcing the grant, built from the already-fetched
/// ecosystem.
pub fn compose_message(ecosystem: &Ecosystem, target: &GrantTarget, link: &str) -> Result<String> {
    let achievement = validate_indices(ecosystem, target.category_id, target.achievement_id)?;
    Ok(format!(
        "You've earned the \"{}\" achievement from \"{}\"!\n\n\
         It will live forever on the WAX blockchain! \
         Here's your shareable Proof-of-Achievement link.\n\n\
         {link}",
        achievement.name, ecosystem.name
    ))
}

/// Send `text` to the handle as a direct message.
pub async fn notify(social: &dyn SocialApi, handle: &Handle, text: &str) -> Result<()> {
    social
        .send_direct_message(text, handle.bare())
        .await
        .map_err(|source| GrantError::MessageDelivery {
            handle: handle.mention().to_string(),
            source,
        })
}
