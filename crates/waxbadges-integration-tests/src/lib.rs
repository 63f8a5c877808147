//! Integration test support for the grant workflow.
//!
//! [`FakeLedger`] and [`FakeSocial`] stand in for the chain and Twitter.
//! Both record every call so tests can assert on what was (and was not)
//! attempted.
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p waxbadges-integration-tests
//! ```

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{json, Value};
use waxbadges_chain::{ChainError, Ledger, Name, TableQuery, Transaction};
use waxbadges_crypto::PrivateKey;
use waxbadges_social::{Profile, SocialApi, SocialError};
use waxbadges_workflow::{GrantConfig, VisibilityPolicy};

/// Well-known development key, never funded on mainnet.
pub const DEV_PRIVATE_WIF: &str = "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3";

/// Workflow configuration signing as `account` with the dev key.
pub fn grant_config(account: &str) -> GrantConfig {
    let key = PrivateKey::parse(DEV_PRIVATE_WIF).expect("dev key parses");
    let mut config = GrantConfig::new(account, key).expect("valid account");
    config.visibility = VisibilityPolicy {
        attempts: 3,
        interval: std::time::Duration::from_secs(1),
        timeout: std::time::Duration::from_secs(10),
    };
    config
}

/// Ecosystem 5 owned by `owner`.
///
/// Category 0 has three achievements, category 1 has one. The roster holds
/// four users, so the next registration gets index 4.
pub fn ecosystem_row(owner: &str) -> Value {
    json!({
        "key": 5,
        "account": owner,
        "name": "Alice's Arcade",
        "description": "Retro games",
        "categories": [
            {"name": "Basics", "achievements": [
                {"name": "First Steps", "description": "Play once"},
                {"name": "Regular", "description": "Play ten times"},
                {"name": "Veteran", "description": "Play a hundred times"}
            ]},
            {"name": "Secrets", "achievements": [
                {"name": "Hidden Room", "description": "Find it"}
            ]}
        ],
        "users": [
            {"user_name": "@carol", "userid": "@carol", "avatarurl": ""},
            {"user_name": "@dave", "userid": "@dave", "avatarurl": ""},
            {"user_name": "@erin", "userid": "@erin", "avatarurl": ""},
            {"user_name": "@frank", "userid": "@frank", "avatarurl": ""}
        ]
    })
}

/// Append a roster entry to an ecosystem row.
pub fn with_user(mut row: Value, userid: &str) -> Value {
    if let Some(users) = row["users"].as_array_mut() {
        users.push(json!({"user_name": userid, "userid": userid, "avatarurl": ""}));
    }
    row
}

/// One call made against [`FakeLedger`].
#[derive(Clone, Debug, PartialEq)]
pub enum LedgerCall {
    FetchTable { table: String, key: Option<String> },
    Encode { action: String, args: Value },
    Broadcast { actions: Vec<String> },
}

/// An accepted action, with its arguments decoded back to JSON.
#[derive(Clone, Debug, PartialEq)]
pub struct Submitted {
    pub action: String,
    pub actor: String,
    pub permission: String,
    pub args: Value,
}

struct PendingUser {
    ecosystem_key: Value,
    entry: Value,
    /// Reads that still miss the entry.
    hidden_reads: u32,
}

#[derive(Default)]
struct LedgerState {
    rows: Vec<Value>,
    pending: Vec<PendingUser>,
    calls: Vec<LedgerCall>,
    submitted: Vec<Submitted>,
}

/// In-memory ledger.
///
/// Action arguments are "encoded" as JSON bytes. `adduser` appends to the
/// roster after a configurable number of reads; `grantach` is only recorded.
#[derive(Default)]
pub struct FakeLedger {
    state: Mutex<LedgerState>,
    visibility_lag: u32,
    rejected_actions: Vec<String>,
}

impl FakeLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `row` from the ecosystems table.
    pub fn with_ecosystem(self, row: Value) -> Self {
        self.lock().rows.push(row);
        self
    }

    /// Registrations stay invisible for this many reads.
    pub fn with_visibility_lag(mut self, reads: u32) -> Self {
        self.visibility_lag = reads;
        self
    }

    /// Refuse transactions containing `action`.
    pub fn rejecting(mut self, action: &str) -> Self {
        self.rejected_actions.push(action.to_string());
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LedgerState> {
        self.state.lock().expect("fake ledger lock")
    }

    pub fn calls(&self) -> Vec<LedgerCall> {
        self.lock().calls.clone()
    }

    /// Accepted actions in submission order.
    pub fn submitted(&self) -> Vec<Submitted> {
        self.lock().submitted.clone()
    }

    pub fn submitted_actions(&self) -> Vec<String> {
        self.submitted().into_iter().map(|s| s.action).collect()
    }

    pub fn table_reads(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, LedgerCall::FetchTable { .. }))
            .count()
    }

    /// Current roster of the ecosystem with `key`, pending entries excluded.
    pub fn roster(&self, key: u64) -> Vec<String> {
        self.lock()
            .rows
            .iter()
            .filter(|row| row["key"] == key)
            .flat_map(|row| row["users"].as_array().cloned().unwrap_or_default())
            .filter_map(|user| user["userid"].as_str().map(str::to_string))
            .collect()
    }
}

#[async_trait]
impl Ledger for FakeLedger {
    async fn fetch_table(&self, query: &TableQuery) -> waxbadges_chain::Result<Vec<Value>> {
        let mut state = self.lock();
        state.calls.push(LedgerCall::FetchTable {
            table: query.table.to_string(),
            key: query.lower_bound.clone(),
        });

        let mut visible = Vec::new();
        state.pending.retain_mut(|pending| {
            if pending.hidden_reads == 0 {
                visible.push((pending.ecosystem_key.clone(), pending.entry.clone()));
                false
            } else {
                pending.hidden_reads -= 1;
                true
            }
        });
        for (key, entry) in visible {
            for row in state.rows.iter_mut().filter(|row| row["key"] == key) {
                if let Some(users) = row["users"].as_array_mut() {
                    users.push(entry.clone());
                }
            }
        }

        Ok(state
            .rows
            .iter()
            .filter(|row| Some(row["key"].to_string()) == query.lower_bound)
            .take(query.limit as usize)
            .cloned()
            .collect())
    }

    async fn encode_action_args(
        &self,
        _contract: Name,
        action: Name,
        args: &Value,
    ) -> waxbadges_chain::Result<Vec<u8>> {
        self.lock().calls.push(LedgerCall::Encode {
            action: action.to_string(),
            args: args.clone(),
        });
        serde_json::to_vec(args).map_err(|e| ChainError::Serialization(e.to_string()))
    }

    async fn sign_and_broadcast(
        &self,
        transaction: &Transaction,
        _key: &PrivateKey,
    ) -> waxbadges_chain::Result<Value> {
        let mut state = self.lock();
        let actions: Vec<String> = transaction
            .actions
            .iter()
            .map(|a| a.name.to_string())
            .collect();
        state.calls.push(LedgerCall::Broadcast {
            actions: actions.clone(),
        });

        if let Some(action) = actions.iter().find(|a| self.rejected_actions.contains(a)) {
            return Err(ChainError::Rpc {
                endpoint: "push_transaction".into(),
                status: 500,
                message: format!("assertion failure with message: {action} refused"),
            });
        }

        for action in &transaction.actions {
            let args: Value = serde_json::from_slice(&action.data)
                .map_err(|e| ChainError::Decode(e.to_string()))?;
            let authorization = action.authorization.first();
            state.submitted.push(Submitted {
                action: action.name.to_string(),
                actor: authorization.map(|a| a.actor.to_string()).unwrap_or_default(),
                permission: authorization
                    .map(|a| a.permission.to_string())
                    .unwrap_or_default(),
                args: args.clone(),
            });

            if action.name.to_string() == "adduser" {
                state.pending.push(PendingUser {
                    ecosystem_key: args["ecosystem_id"].clone(),
                    entry: json!({
                        "user_name": args["user_name"],
                        "userid": args["userid"],
                        "avatarurl": args["avatarurl"]
                    }),
                    hidden_reads: self.visibility_lag,
                });
            }
        }

        let id = state.submitted.len();
        Ok(json!({
            "transaction_id": format!("{id:064x}"),
            "processed": {"receipt": {"status": "executed"}}
        }))
    }
}

/// One call made against [`FakeSocial`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SocialCall {
    GetProfile { handle: String },
    SendDirectMessage { handle: String, text: String },
}

/// In-memory social network keyed by lower-cased screen name.
#[derive(Default)]
pub struct FakeSocial {
    profiles: HashMap<String, Profile>,
    refuse_dms: bool,
    calls: Mutex<Vec<SocialCall>>,
}

impl FakeSocial {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a profile with the given secure avatar URL.
    pub fn with_profile(mut self, screen_name: &str, id: &str, avatar_url: Option<&str>) -> Self {
        self.profiles.insert(
            screen_name.to_lowercase(),
            Profile {
                id: id.to_string(),
                screen_name: screen_name.to_string(),
                name: screen_name.to_string(),
                avatar_url: avatar_url.map(str::to_string),
            },
        );
        self
    }

    /// Every recipient has closed DMs.
    pub fn refusing_dms(mut self) -> Self {
        self.refuse_dms = true;
        self
    }

    pub fn calls(&self) -> Vec<SocialCall> {
        self.calls.lock().expect("fake social lock").clone()
    }

    /// `(handle, text)` of every delivered message.
    pub fn sent_messages(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SocialCall::SendDirectMessage { handle, text } => Some((handle, text)),
                SocialCall::GetProfile { .. } => None,
            })
            .collect()
    }

    fn record(&self, call: SocialCall) {
        self.calls.lock().expect("fake social lock").push(call);
    }
}

#[async_trait]
impl SocialApi for FakeSocial {
    async fn get_profile(&self, handle: &str) -> waxbadges_social::Result<Profile> {
        self.record(SocialCall::GetProfile {
            handle: handle.to_string(),
        });
        self.profiles
            .get(&handle.to_lowercase())
            .cloned()
            .ok_or_else(|| SocialError::NotFound(handle.to_string()))
    }

    async fn send_direct_message(&self, text: &str, handle: &str) -> waxbadges_social::Result<()> {
        if !self.profiles.contains_key(&handle.to_lowercase()) {
            return Err(SocialError::NotFound(handle.to_string()));
        }
        if self.refuse_dms {
            return Err(SocialError::Rejected(
                "You cannot send messages to this user.".into(),
            ));
        }
        self.record(SocialCall::SendDirectMessage {
            handle: handle.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }
}
