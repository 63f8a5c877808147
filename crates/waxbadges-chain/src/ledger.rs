//! The ledger capability the grant workflow is written against.
//!
//! [`ChainClient`] implements it over HTTP; tests substitute in-memory
//! doubles without touching the workflow.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};
use waxbadges_crypto::PrivateKey;

use crate::name::Name;
use crate::rpc::{ChainClient, GetTableRows, PackedTransaction};
use crate::transaction::{signing_digest, TaposRef, Transaction};
use crate::{ChainError, Result};

/// A bounded read of one contract table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableQuery {
    pub code: Name,
    pub scope: String,
    pub table: Name,
    pub lower_bound: Option<String>,
    pub upper_bound: Option<String>,
    pub limit: u32,
    pub timeout: Duration,
}

impl TableQuery {
    /// At most one row whose primary key equals `key`, scoped to the contract.
    pub fn by_primary_key(code: Name, table: Name, key: u64, timeout: Duration) -> Self {
        Self {
            code,
            scope: code.to_string(),
            table,
            lower_bound: Some(key.to_string()),
            upper_bound: Some(key.to_string()),
            limit: 1,
            timeout,
        }
    }
}

/// Reads, argument encoding and signed writes against the ledger.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Rows matching `query`, at most `query.limit` of them.
    async fn fetch_table(&self, query: &TableQuery) -> Result<Vec<Value>>;

    /// Encode `args` for `contract::action` into the action's binary payload.
    async fn encode_action_args(&self, contract: Name, action: Name, args: &Value)
        -> Result<Vec<u8>>;

    /// Sign `transaction` with `key` and broadcast it, returning the node's response.
    async fn sign_and_broadcast(&self, transaction: &Transaction, key: &PrivateKey)
        -> Result<Value>;
}

#[async_trait]
impl Ledger for ChainClient {
    async fn fetch_table(&self, query: &TableQuery) -> Result<Vec<Value>> {
        let request = GetTableRows {
            code: query.code,
            scope: &query.scope,
            table: query.table,
            json: true,
            lower_bound: query.lower_bound.as_deref(),
            upper_bound: query.upper_bound.as_deref(),
            limit: query.limit,
        };
        let rows = self.get_table_rows(&request, Some(query.timeout)).await?;
        debug!(table = %query.table, rows = rows.rows.len(), "table rows fetched");
        Ok(rows.rows)
    }

    async fn encode_action_args(
        &self,
        contract: Name,
        action: Name,
        args: &Value,
    ) -> Result<Vec<u8>> {
        self.abi_json_to_bin(contract, action, args).await
    }

    async fn sign_and_broadcast(
        &self,
        transaction: &Transaction,
        key: &PrivateKey,
    ) -> Result<Value> {
        let info = self.get_info().await?;
        let tapos = TaposRef::from_block_id(&info.last_irreversible_block_id)?;

        let chain_id: [u8; 32] = hex::decode(&info.chain_id)
            .ok()
            .and_then(|bytes| bytes.try_into().ok())
            .ok_or_else(|| ChainError::Decode(format!("bad chain_id {:?}", info.chain_id)))?;

        let packed = transaction.pack(&tapos)?;
        let digest = signing_digest(&chain_id, &packed);
        let signature = key.sign_digest(&digest)?;

        info!(
            expiration = %transaction.expiration_string(),
            ref_block = info.last_irreversible_block_num,
            signer = %key.public_key(),
            "broadcasting transaction"
        );

        self.push_transaction(&PackedTransaction::new(&packed, vec![signature.to_string()]))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transaction::{Action, PermissionLevel};
    use chrono::{TimeZone, Utc};
    use waxbadges_crypto::Signature;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const DEV_PRIVATE_WIF: &str = "5KQwrPbwdL6PhXujxW37FSSQZ1JiwsST4cqQzDeyXtP79zkvFD3";
    const CHAIN_ID: &str = "1064487b3cd1a897ce03ae5b6a865651747e2e152090f99c1d19d44e01aea5a4";
    const LIB_ID: &str = "00bc614e3b9aca00c0ffee1100000000000000000000000000000000000000aa";

    fn name(s: &str) -> Name {
        Name::new(s).expect("valid name")
    }

    #[test]
    fn test_by_primary_key_bounds() {
        let query = TableQuery::by_primary_key(
            name("waxbadgesftw"),
            name("ecosystems"),
            5,
            Duration::from_secs(30),
        );
        assert_eq!(query.scope, "waxbadgesftw");
        assert_eq!(query.lower_bound.as_deref(), Some("5"));
        assert_eq!(query.upper_bound.as_deref(), Some("5"));
        assert_eq!(query.limit, 1);
    }

    #[tokio::test]
    async fn test_sign_and_broadcast_pushes_recoverable_signature() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chain/get_info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "chain_id": CHAIN_ID,
                "head_block_num": 12345700,
                "last_irreversible_block_num": 12345678,
                "last_irreversible_block_id": LIB_ID
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/v1/chain/push_transaction"))
            .respond_with(ResponseTemplate::new(202).set_body_json(serde_json::json!({
                "transaction_id": "ab".repeat(32),
                "processed": {"receipt": {"status": "executed"}}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ChainClient::new(server.uri()).expect("client");
        let key = PrivateKey::parse(DEV_PRIVATE_WIF).expect("key");
        let trx = Transaction::new(
            Utc.with_ymd_and_hms(2018, 6, 1, 12, 0, 0).single().expect("date"),
            vec![Action {
                account: name("waxbadgesftw"),
                name: name("grantach"),
                authorization: vec![PermissionLevel {
                    actor: name("alice"),
                    permission: name("active"),
                }],
                data: vec![0xde, 0xad, 0xbe, 0xef],
            }],
        );

        let resp = client.sign_and_broadcast(&trx, &key).await.expect("pushed");
        assert_eq!(resp["processed"]["receipt"]["status"], "executed");

        let requests = server.received_requests().await.expect("recording enabled");
        let push = requests
            .iter()
            .find(|r| r.url.path() == "/v1/chain/push_transaction")
            .expect("push request");
        let body: Value = serde_json::from_slice(&push.body).expect("json body");

        let packed = hex::decode(body["packed_trx"].as_str().expect("packed_trx")).expect("hex");
        let tapos = TaposRef::from_block_id(LIB_ID).expect("tapos");
        assert_eq!(packed, trx.pack(&tapos).expect("pack"));
        assert_eq!(body["compression"], "none");

        let mut chain_id = [0u8; 32];
        chain_id.copy_from_slice(&hex::decode(CHAIN_ID).expect("hex"));
        let digest = signing_digest(&chain_id, &packed);
        let sig = Signature::parse(body["signatures"][0].as_str().expect("signature"))
            .expect("SIG_K1_");
        assert_eq!(sig.recover(&digest).expect("recover"), key.public_key());
    }

    #[tokio::test]
    async fn test_bad_chain_id_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chain/get_info"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "chain_id": "abcd",
                "head_block_num": 1,
                "last_irreversible_block_num": 1,
                "last_irreversible_block_id": LIB_ID
            })))
            .mount(&server)
            .await;

        let client = ChainClient::new(server.uri()).expect("client");
        let key = PrivateKey::parse(DEV_PRIVATE_WIF).expect("key");
        let trx = Transaction::new(Utc::now(), vec![]);
        assert!(matches!(
            client.sign_and_broadcast(&trx, &key).await,
            Err(ChainError::Decode(_))
        ));
    }
}
