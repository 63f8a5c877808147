//! # waxbadges-chain
//!
//! Client side of the WAX ledger.
//!
//! This crate provides everything the grant workflow needs from the chain:
//!
//! - **Account names** (64-bit base32 encoding) via [`name`]
//! - **Binary packing** primitives via [`wire`]
//! - **Transactions**, TaPoS headers and signing digests via [`transaction`]
//! - **HTTP RPC** against a nodeos-compatible endpoint via [`rpc`]
//! - The **[`Ledger`] capability** the workflow is written against via [`ledger`]
//!
//! ## Write path
//!
//! ```text
//! action args (JSON)
//!     |  abi_json_to_bin
//!     v
//! Action { account, name, authorization, data }
//!     |  TaPoS header from get_info
//!     v
//! packed transaction  -- sha256(chain_id || packed || 0^32) --> SIG_K1_
//!     |  push_transaction
//!     v
//! node response
//! ```

pub mod ledger;
pub mod name;
pub mod rpc;
pub mod transaction;
pub mod wire;

pub use ledger::{Ledger, TableQuery};
pub use name::Name;
pub use rpc::ChainClient;
pub use transaction::{Action, PermissionLevel, Transaction};

/// Error types for ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// Account or action name is not a valid 64-bit name.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// The HTTP request could not be completed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// The node answered with an error body.
    #[error("node rejected {endpoint} ({status}): {message}")]
    Rpc {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// A response body did not have the expected shape.
    #[error("unexpected response: {0}")]
    Decode(String),

    /// Signing the transaction failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] waxbadges_crypto::CryptoError),

    /// A transaction could not be packed.
    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type Result<T> = std::result::Result<T, ChainError>;
