//! One grant, end to end.

use chrono::Utc;
use serde_json::Value;
use tracing::info;
use waxbadges_chain::Ledger;
use waxbadges_social::SocialApi;
use waxbadges_types::Handle;

use crate::ecosystem::{fetch_ecosystem, validate_indices, validate_ownership};
use crate::grant::{grant_achievement, GrantTarget};
use crate::notify::{compose_message, notify, poa_link};
use crate::provision::{find_user_index, provision_user};
use crate::{GrantConfig, Result};

/// What the operator asked for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrantRequest {
    /// Social handle, with or without the leading sigil.
    pub handle: String,
    pub ecosystem_id: u32,
    pub category_id: u32,
    pub achievement_id: u32,
    /// Send the recipient a direct message with the proof link.
    pub send_dm: bool,
}

/// What a successful run did.
#[derive(Clone, Debug)]
pub struct GrantOutcome {
    pub handle: Handle,
    /// Roster index the grant was recorded against.
    pub user_id: u32,
    /// Response to `adduser`, when the user had to be registered.
    pub add_user_response: Option<Value>,
    pub grant_response: Value,
    pub poa_link: String,
    /// A direct message went out.
    pub notified: bool,
}

impl GrantOutcome {
    /// Whether this run registered the user.
    pub fn created_user(&self) -> bool {
        self.add_user_response.is_some()
    }
}

/// Runs grants against a ledger and a social network.
pub struct Granter<'a> {
    ledger: &'a dyn Ledger,
    social: &'a dyn SocialApi,
    config: &'a GrantConfig,
}

impl<'a> Granter<'a> {
    pub fn new(ledger: &'a dyn Ledger, social: &'a dyn SocialApi, config: &'a GrantConfig) -> Self {
        Self {
            ledger,
            social,
            config,
        }
    }

    /// Validate, register the user if needed, grant, then optionally notify.
    ///
    /// Stops at the first failure. A user registered before a later step
    /// fails stays registered.
    pub async fn run(&self, request: &GrantRequest) -> Result<GrantOutcome> {
        let handle = Handle::parse(&request.handle)?;

        let mut ecosystem = fetch_ecosystem(self.ledger, self.config, request.ecosystem_id).await?;
        validate_ownership(&ecosystem, self.config.account)?;
        validate_indices(&ecosystem, request.category_id, request.achievement_id)?;

        let (user_id, add_user_response) = match find_user_index(&ecosystem, &handle) {
            Some(user_id) => {
                info!(user_id, %handle, "existing user");
                (user_id, None)
            }
            None => {
                let provisioned =
                    provision_user(self.ledger, self.social, self.config, &ecosystem, &handle)
                        .await?;
                ecosystem = provisioned.ecosystem;
                (provisioned.user_id, Some(provisioned.response))
            }
        };

        let target = GrantTarget {
            ecosystem_id: request.ecosystem_id,
            user_id,
            category_id: request.category_id,
            achievement_id: request.achievement_id,
        };
        let grant_response =
            grant_achievement(self.ledger, self.config, target, Utc::now()).await?;

        let link = poa_link(&self.config.poa_base_url, ecosystem.key, &target);
        let notified = if request.send_dm {
            let text = compose_message(&ecosystem, &target, &link)?;
            notify(self.social, &handle, &text).await?;
            info!(%handle, "notification sent");
            true
        } else {
            false
        };

        Ok(GrantOutcome {
            handle,
            user_id,
            add_user_response,
            grant_response,
            poa_link: link,
            notified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{config, ecosystem_row, StubLedger, StubSocial};
    use crate::GrantError;

    fn request(handle: &str, send_dm: bool) -> GrantRequest {
        GrantRequest {
            handle: handle.into(),
            ecosystem_id: 5,
            category_id: 0,
            achievement_id: 2,
            send_dm,
        }
    }

    #[tokio::test]
    async fn test_existing_user_only_grants() {
        let ledger = StubLedger::with_row(ecosystem_row());
        let social = StubSocial::default();
        let config = config();

        let outcome = Granter::new(&ledger, &social, &config)
            .run(&request("@Erin", false))
            .await
            .expect("granted");
        assert_eq!(outcome.user_id, 2);
        assert!(!outcome.created_user());
        assert!(!outcome.notified);
        assert_eq!(outcome.poa_link, "https://explorer.waxbadges.com/poa/5/0/2/2");
        assert_eq!(ledger.pushed().len(), 1);
        assert!(social.lookups.lock().expect("lock").is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_user_with_notification() {
        let ledger = StubLedger::with_row(ecosystem_row());
        let social = StubSocial::with_profile("bob", "https://pbs.twimg.com/1/bob_normal.jpg");
        let config = config();

        let outcome = Granter::new(&ledger, &social, &config)
            .run(&request("bob", true))
            .await
            .expect("granted");
        assert_eq!(outcome.user_id, 4);
        assert!(outcome.created_user());
        assert!(outcome.notified);

        let names: Vec<String> = ledger
            .pushed()
            .iter()
            .map(|t| t.actions[0].name.to_string())
            .collect();
        assert_eq!(names, ["adduser", "grantach"]);

        let sent = social.sent.lock().expect("lock");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "bob");
        assert!(sent[0].1.ends_with("/poa/5/0/2/4"));
    }

    #[tokio::test]
    async fn test_empty_handle_rejected_before_any_call() {
        let ledger = StubLedger::with_row(ecosystem_row());
        let social = StubSocial::default();
        let config = config();

        let err = Granter::new(&ledger, &social, &config)
            .run(&request("@", false))
            .await
            .expect_err("empty");
        assert!(matches!(err, GrantError::InvalidInput(_)));
        assert!(ledger.pushed().is_empty());
    }
}
