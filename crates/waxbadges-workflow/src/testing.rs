//! In-memory doubles for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use waxbadges_chain::{ChainError, Ledger, Name, TableQuery, Transaction};
use waxbadges_crypto::PrivateKey;
use waxbadges_social::{Profile, SocialApi, SocialError};

use crate::GrantConfig;

pub(crate) const DEV_PRIVATE_WIF: &str = "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3";

pub(crate) fn config() -> GrantConfig {
    GrantConfig::new("alice", PrivateKey::parse(DEV_PRIVATE_WIF).expect("key")).expect("config")
}

/// Ecosystem 5 owned by alice: two categories (3 and 1 achievements), four users.
pub(crate) fn ecosystem_row() -> Value {
    json!({
        "key": 5,
        "account": "alice",
        "name": "Alice's Arcade",
        "categories": [
            {"name": "Basics", "achievements": [
                {"name": "First Steps"}, {"name": "Regular"}, {"name": "Veteran"}
            ]},
            {"name": "Secrets", "achievements": [{"name": "Hidden Room"}]}
        ],
        "users": [
            {"user_name": "@carol", "userid": "@carol", "avatarurl": ""},
            {"user_name": "@dave", "userid": "@dave", "avatarurl": ""},
            {"user_name": "@erin", "userid": "@erin", "avatarurl": ""},
            {"user_name": "@frank", "userid": "@frank", "avatarurl": ""}
        ]
    })
}

#[derive(Default)]
pub(crate) struct StubLedger {
    pub rows: Mutex<Vec<Value>>,
    pub pushed: Mutex<Vec<Transaction>>,
    pub reject: Option<String>,
    /// Registrations are accepted but never show up in reads.
    pub drop_writes: bool,
    /// Serve every row regardless of the requested bounds.
    pub ignore_bounds: bool,
}

impl StubLedger {
    pub fn with_row(row: Value) -> Self {
        Self {
            rows: Mutex::new(vec![row]),
            ..Self::default()
        }
    }

    pub fn pushed(&self) -> Vec<Transaction> {
        self.pushed.lock().expect("lock").clone()
    }
}

#[async_trait]
impl Ledger for StubLedger {
    async fn fetch_table(&self, query: &TableQuery) -> waxbadges_chain::Result<Vec<Value>> {
        let rows = self.rows.lock().expect("lock");
        Ok(rows
            .iter()
            .filter(|row| {
                self.ignore_bounds || Some(row["key"].to_string()) == query.lower_bound
            })
            .take(query.limit as usize)
            .cloned()
            .collect())
    }

    async fn encode_action_args(
        &self,
        _contract: Name,
        _action: Name,
        args: &Value,
    ) -> waxbadges_chain::Result<Vec<u8>> {
        serde_json::to_vec(args).map_err(|e| ChainError::Serialization(e.to_string()))
    }

    async fn sign_and_broadcast(
        &self,
        transaction: &Transaction,
        _key: &PrivateKey,
    ) -> waxbadges_chain::Result<Value> {
        if let Some(message) = &self.reject {
            return Err(ChainError::Rpc {
                endpoint: "push_transaction".into(),
                status: 500,
                message: message.clone(),
            });
        }
        let mut pushed = self.pushed.lock().expect("lock");
        pushed.push(transaction.clone());

        for action in &transaction.actions {
            if action.name.to_string() != "adduser" || self.drop_writes {
                continue;
            }
            let args: Value = serde_json::from_slice(&action.data).expect("json args");
            let mut rows = self.rows.lock().expect("lock");
            for row in rows.iter_mut() {
                if row["key"] == args["ecosystem_id"] {
                    if let Some(users) = row["users"].as_array_mut() {
                        users.push(json!({
                            "user_name": args["user_name"],
                            "userid": args["userid"],
                            "avatarurl": args["avatarurl"]
                        }));
                    }
                }
            }
        }
        Ok(json!({"transaction_id": format!("trx{}", pushed.len())}))
    }
}

#[derive(Default)]
pub(crate) struct StubSocial {
    pub profiles: Vec<Profile>,
    pub refuse_dms: bool,
    pub sent: Mutex<Vec<(String, String)>>,
    pub lookups: Mutex<Vec<String>>,
}

impl StubSocial {
    pub fn with_profile(screen_name: &str, avatar_url: &str) -> Self {
        Self {
            profiles: vec![Profile {
                id: "42".into(),
                screen_name: screen_name.into(),
                name: screen_name.into(),
                avatar_url: Some(avatar_url.into()),
            }],
            ..Self::default()
        }
    }
}

#[async_trait]
impl SocialApi for StubSocial {
    async fn get_profile(&self, handle: &str) -> waxbadges_social::Result<Profile> {
        self.lookups.lock().expect("lock").push(handle.to_string());
        self.profiles
            .iter()
            .find(|p| p.screen_name.eq_ignore_ascii_case(handle))
            .cloned()
            .ok_or_else(|| SocialError::NotFound(handle.to_string()))
    }

    async fn send_direct_message(&self, text: &str, handle: &str) -> waxbadges_social::Result<()> {
        if self.refuse_dms {
            return Err(SocialError::Rejected("closed DMs".into()));
        }
        self.sent
            .lock()
            .expect("lock")
            .push((handle.to_string(), text.to_string()));
        Ok(())
    }
}
