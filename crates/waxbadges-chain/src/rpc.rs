//! HTTP client for the chain API (`/v1/chain/*`).
//!
//! Every endpoint is a JSON POST. Non-2xx responses carry a structured error
//! body whose most specific message is surfaced in [`ChainError::Rpc`].

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::name::Name;
use crate::{ChainError, Result};

/// Default per-request timeout when the caller does not supply one.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Chain API client.
#[derive(Clone, Debug)]
pub struct ChainClient {
    base_url: String,
    http: reqwest::Client,
}

/// Subset of `get_info` used to build transactions.
#[derive(Clone, Debug, Deserialize)]
pub struct ChainInfo {
    pub chain_id: String,
    pub head_block_num: u32,
    pub last_irreversible_block_num: u32,
    pub last_irreversible_block_id: String,
}

/// `get_table_rows` request body.
#[derive(Debug, Serialize)]
pub struct GetTableRows<'a> {
    pub code: Name,
    pub scope: &'a str,
    pub table: Name,
    pub json: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower_bound: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper_bound: Option<&'a str>,
    pub limit: u32,
}

/// `get_table_rows` response.
#[derive(Debug, Deserialize)]
pub struct TableRows {
    #[serde(default)]
    pub rows: Vec<Value>,
    /// Boolean on older nodes, next-key string on newer ones.
    #[serde(default)]
    pub more: Value,
}

#[derive(Debug, Serialize)]
struct AbiJsonToBin<'a> {
    code: Name,
    action: Name,
    args: &'a Value,
}

#[derive(Debug, Deserialize)]
struct BinArgs {
    binargs: String,
}

/// `push_transaction` request body.
#[derive(Debug, Serialize)]
pub struct PackedTransaction {
    pub signatures: Vec<String>,
    pub compression: &'static str,
    pub packed_context_free_data: String,
    pub packed_trx: String,
}

impl PackedTransaction {
    /// Wrap packed bytes and their signatures, uncompressed.
    pub fn new(packed_trx: &[u8], signatures: Vec<String>) -> Self {
        Self {
            signatures,
            compression: "none",
            packed_context_free_data: String::new(),
            packed_trx: hex::encode(packed_trx),
        }
    }
}

/// Error body returned by nodes on failure.
#[derive(Debug, Default, Deserialize)]
struct NodeError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    error: Option<NodeErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct NodeErrorDetail {
    #[serde(default)]
    what: String,
    #[serde(default)]
    details: Vec<NodeErrorLine>,
}

#[derive(Debug, Default, Deserialize)]
struct NodeErrorLine {
    #[serde(default)]
    message: String,
}

/// Most specific human-readable message in a node error body.
fn node_error_message(body: &str) -> String {
    let Ok(parsed) = serde_json::from_str::<NodeError>(body) else {
        return body.trim().to_string();
    };
    let detail = parsed.error.unwrap_or_default();
    detail
        .details
        .into_iter()
        .map(|d| d.message)
        .find(|m| !m.is_empty())
        .or_else(|| Some(detail.what).filter(|w| !w.is_empty()))
        .or_else(|| Some(parsed.message).filter(|m| !m.is_empty()))
        .unwrap_or_else(|| body.trim().to_string())
}

impl ChainClient {
    /// Create a client for the node at `base_url` (no trailing `/v1`).
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .user_agent(concat!("waxbadges/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChainError::Http(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    /// The node URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post<B, R>(&self, endpoint: &str, body: &B, timeout: Option<Duration>) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}/v1/chain/{endpoint}", self.base_url);
        debug!(%url, "chain request");

        let mut request = self.http.post(&url).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ChainError::Http(format!("{endpoint}: {e}")))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ChainError::Http(format!("{endpoint}: {e}")))?;

        if !status.is_success() {
            return Err(ChainError::Rpc {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                message: node_error_message(&text),
            });
        }

        serde_json::from_str(&text).map_err(|e| ChainError::Decode(format!("{endpoint}: {e}")))
    }

    /// Chain id and reference block.
    pub async fn get_info(&self) -> Result<ChainInfo> {
        self.post("get_info", &serde_json::json!({}), None).await
    }

    /// Query contract table rows as JSON.
    pub async fn get_table_rows(
        &self,
        request: &GetTableRows<'_>,
        timeout: Option<Duration>,
    ) -> Result<TableRows> {
        self.post("get_table_rows", request, timeout).await
    }

    /// Encode action arguments with the contract's on-chain ABI.
    pub async fn abi_json_to_bin(&self, code: Name, action: Name, args: &Value) -> Result<Vec<u8>> {
        let body = AbiJsonToBin { code, action, args };
        let resp: BinArgs = self.post("abi_json_to_bin", &body, None).await?;
        hex::decode(&resp.binargs)
            .map_err(|e| ChainError::Decode(format!("abi_json_to_bin: binargs not hex: {e}")))
    }

    /// Broadcast a signed, packed transaction.
    pub async fn push_transaction(&self, trx: &PackedTransaction) -> Result<Value> {
        self.post("push_transaction", trx, None).await
    }
}
