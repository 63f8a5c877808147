//! Contract action arguments and the encode-sign-broadcast write path.

use serde::Serialize;
use serde_json::Value;
use tracing::info;
use waxbadges_chain::{Action, Ledger, Name, PermissionLevel, Transaction};
use waxbadges_types::{ACTION_ADD_USER, ACTION_GRANT_ACHIEVEMENT};

use crate::{GrantConfig, GrantError, Result};

/// `adduser(name ecosystem_owner, uint32 ecosystem_id, string user_name, string userid, string avatarurl)`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AddUserArgs {
    pub ecosystem_owner: Name,
    pub ecosystem_id: u32,
    pub user_name: String,
    pub userid: String,
    pub avatarurl: String,
}

/// `grantach(name ecosystem_owner, uint32 ecosystem_id, uint32 user_id, uint32 category_id, uint32 achievement_id, uint32 timestamp)`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GrantArgs {
    pub ecosystem_owner: Name,
    pub ecosystem_id: u32,
    pub user_id: u32,
    pub category_id: u32,
    pub achievement_id: u32,
    /// Unix seconds, truncated.
    pub timestamp: u32,
}

/// A contract action the workflow can submit.
pub trait ContractAction: Serialize {
    /// Action name on the contract.
    const NAME: &'static str;
}

impl ContractAction for AddUserArgs {
    const NAME: &'static str = ACTION_ADD_USER;
}

impl ContractAction for GrantArgs {
    const NAME: &'static str = ACTION_GRANT_ACHIEVEMENT;
}

/// Encode `args`, wrap them in a transaction authorized by the configured
/// account, sign and broadcast.
///
/// Every failure along the way is [`GrantError::Transaction`].
pub async fn submit_action<A: ContractAction + Sync>(
    ledger: &dyn Ledger,
    config: &GrantConfig,
    args: &A,
) -> Result<Value> {
    let failed = |source| GrantError::Transaction {
        action: A::NAME.to_string(),
        source,
    };

    let name = Name::new(A::NAME).map_err(failed)?;
    let json = serde_json::to_value(args)
        .map_err(|e| GrantError::InvalidInput(format!("{} args: {e}", A::NAME)))?;
    let data = ledger
        .encode_action_args(config.contract, name, &json)
        .await
        .map_err(failed)?;

    let action = Action {
        account: config.contract,
        name,
        authorization: vec![PermissionLevel {
            actor: config.account,
            permission: config.permission,
        }],
        data,
    };
    let ttl = chrono::Duration::from_std(config.expiration)
        .map_err(|e| GrantError::InvalidInput(format!("expiration: {e}")))?;
    let transaction = Transaction::expiring_in(ttl, vec![action]);

    let response = ledger
        .sign_and_broadcast(&transaction, &config.private_key)
        .await
        .map_err(failed)?;
    info!(action = A::NAME, %response, "transaction accepted");
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{config, StubLedger};
    use chrono::Utc;
    use serde_json::json;

    fn grant_args() -> GrantArgs {
        GrantArgs {
            ecosystem_owner: Name::new("alice").expect("name"),
            ecosystem_id: 5,
            user_id: 4,
            category_id: 0,
            achievement_id: 2,
            timestamp: 1_528_000_000,
        }
    }

    #[test]
    fn test_args_serialize_with_contract_field_names() {
        let value = serde_json::to_value(grant_args()).expect("json");
        assert_eq!(
            value,
            json!({
                "ecosystem_owner": "alice",
                "ecosystem_id": 5,
                "user_id": 4,
                "category_id": 0,
                "achievement_id": 2,
                "timestamp": 1_528_000_000
            })
        );

        let add = AddUserArgs {
            ecosystem_owner: Name::new("alice").expect("name"),
            ecosystem_id: 5,
            user_name: "@Bob".into(),
            userid: "@Bob".into(),
            avatarurl: "https://pbs.twimg.com/a.jpg".into(),
        };
        let value = serde_json::to_value(add).expect("json");
        assert_eq!(value["user_name"], "@Bob");
        assert_eq!(value["userid"], "@Bob");
        assert_eq!(value["avatarurl"], "https://pbs.twimg.com/a.jpg");
    }

    #[tokio::test]
    async fn test_submit_builds_authorized_transaction() {
        let ledger = StubLedger::default();
        let before = Utc::now();
        let resp = submit_action(&ledger, &config(), &grant_args())
            .await
            .expect("submitted");
        assert_eq!(resp["transaction_id"], "trx1");

        let pushed = ledger.pushed();
        assert_eq!(pushed.len(), 1);
        let trx = &pushed[0];
        assert_eq!(trx.actions.len(), 1);

        let action = &trx.actions[0];
        assert_eq!(action.account.to_string(), "waxbadgesftw");
        assert_eq!(action.name.to_string(), "grantach");
        assert_eq!(action.authorization.len(), 1);
        assert_eq!(action.authorization[0].actor.to_string(), "alice");
        assert_eq!(action.authorization[0].permission.to_string(), "active");

        let args: serde_json::Value = serde_json::from_slice(&action.data).expect("args");
        assert_eq!(args["user_id"], 4);

        let ttl = (trx.expiration - before).num_seconds();
        assert!((59..=61).contains(&ttl), "expiration {ttl}s from submission");
    }

    #[tokio::test]
    async fn test_rejection_is_transaction_error() {
        let ledger = StubLedger {
            reject: Some("assertion failure with message: Invalid user_id".into()),
            ..StubLedger::default()
        };
        let err = submit_action(&ledger, &config(), &grant_args())
            .await
            .expect_err("rejected");
        match err {
            GrantError::Transaction { action, source } => {
                assert_eq!(action, "grantach");
                assert!(source.to_string().contains("Invalid user_id"));
            }
            other => unreachable!("unexpected error: {other:?}"),
        }
    }
}
