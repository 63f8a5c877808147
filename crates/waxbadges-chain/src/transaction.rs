//! Transactions, TaPoS references and signing digests.
//!
//! ## Packed layout
//!
//! ```text
//! Transaction {
//!     expiration:          u32,        // UTC seconds
//!     ref_block_num:       u16,        // low 16 bits of the reference block number
//!     ref_block_prefix:    u32,        // bytes 8..12 of the reference block id
//!     max_net_usage_words: varuint32,  // 0 = no limit
//!     max_cpu_usage_ms:    u8,         // 0 = no limit
//!     delay_sec:           varuint32,
//!     context_free_actions: vector<Action>,
//!     actions:             vector<Action>,
//!     transaction_extensions: vector<..>,
//! }
//! ```

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

use crate::name::Name;
use crate::wire::Packer;
use crate::{ChainError, Result};

/// An `actor@permission` authorization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionLevel {
    pub actor: Name,
    pub permission: Name,
}

/// One contract action with its binary-encoded arguments.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Contract account.
    pub account: Name,
    /// Action name.
    pub name: Name,
    pub authorization: Vec<PermissionLevel>,
    /// ABI-encoded arguments, hex in JSON.
    #[serde_as(as = "Hex")]
    pub data: Vec<u8>,
}

/// An unsigned transaction as built by the workflow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// The chain drops the transaction if it is not included by this time.
    #[serde(with = "time_point_sec")]
    pub expiration: DateTime<Utc>,
    pub actions: Vec<Action>,
}

/// Reference-block fields binding a transaction to one fork.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TaposRef {
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
}

impl TaposRef {
    /// Derive the reference from a hex block id.
    ///
    /// The first four bytes of a block id are the big-endian block number.
    pub fn from_block_id(block_id: &str) -> Result<Self> {
        let bytes = hex::decode(block_id)
            .map_err(|e| ChainError::Decode(format!("block id is not hex: {e}")))?;
        if bytes.len() != 32 {
            return Err(ChainError::Decode(format!(
                "block id must be 32 bytes, got {}",
                bytes.len()
            )));
        }
        let block_num = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        Ok(Self {
            ref_block_num: (block_num & 0xffff) as u16,
            ref_block_prefix: u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]),
        })
    }
}

impl Transaction {
    /// A transaction expiring at `expiration`, truncated to whole seconds.
    pub fn new(expiration: DateTime<Utc>, actions: Vec<Action>) -> Self {
        let secs = expiration.timestamp();
        let expiration = Utc.timestamp_opt(secs, 0).single().unwrap_or(expiration);
        Self {
            expiration,
            actions,
        }
    }

    /// A transaction expiring `ttl` from now.
    pub fn expiring_in(ttl: Duration, actions: Vec<Action>) -> Self {
        Self::new(Utc::now() + ttl, actions)
    }

    /// Expiration in the `YYYY-MM-DDTHH:MM:SS` form nodes expect.
    pub fn expiration_string(&self) -> String {
        self.expiration.format(time_point_sec::FORMAT).to_string()
    }

    /// Pack for signing and broadcast.
    pub fn pack(&self, tapos: &TaposRef) -> Result<Vec<u8>> {
        let expiration = u32::try_from(self.expiration.timestamp()).map_err(|_| {
            ChainError::Serialization(format!(
                "expiration {} outside u32 seconds",
                self.expiration
            ))
        })?;

        let mut p = Packer::new();
        p.u32(expiration)
            .u16(tapos.ref_block_num)
            .u32(tapos.ref_block_prefix)
            .varuint32(0) // max_net_usage_words
            .u8(0) // max_cpu_usage_ms
            .varuint32(0) // delay_sec
            .varuint32(0); // context_free_actions

        p.len_prefix(self.actions.len())?;
        for action in &self.actions {
            p.name(action.account).name(action.name);
            p.len_prefix(action.authorization.len())?;
            for auth in &action.authorization {
                p.name(auth.actor).name(auth.permission);
            }
            p.bytes(&action.data)?;
        }

        p.varuint32(0); // transaction_extensions
        Ok(p.into_bytes())
    }
}

/// Digest the chain expects signatures over.
///
/// `sha256(chain_id || packed_trx || sha256(context_free_data))`, where an
/// empty context-free section contributes 32 zero bytes.
pub fn signing_digest(chain_id: &[u8; 32], packed_trx: &[u8]) -> [u8; 32] {
    waxbadges_crypto::hash::sha256_concat(&[chain_id.as_slice(), packed_trx, [0u8; 32].as_slice()])
}

/// Second-resolution UTC timestamps without a zone suffix.
mod time_point_sec {
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&value.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let text = String::deserialize(deserializer)?;
        let naive = NaiveDateTime::parse_from_str(text.trim_end_matches('Z'), FORMAT)
            .map_err(serde::de::Error::custom)?;
        Ok(Utc.from_utc_datetime(&naive))
    }
}
