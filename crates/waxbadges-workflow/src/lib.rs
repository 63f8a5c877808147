//! # waxbadges-workflow
//!
//! Grants one achievement to one social identity.
//!
//! ```text
//! Handle ──> fetch ecosystem ──> ownership ──> indices
//!                                                 │
//!              ┌── roster hit ────────────────────┤
//!              │                                  │ roster miss
//!              │                  profile ──> adduser ──> wait until visible
//!              │                                                  │
//!              └──────────────> grantach <────────────────────────┘
//!                                  │
//!                                  └──> direct message (optional)
//! ```
//!
//! Both external services are reached only through the [`Ledger`] and
//! [`SocialApi`] capabilities, so the whole pipeline runs against doubles
//! in tests.
//!
//! [`Ledger`]: waxbadges_chain::Ledger
//! [`SocialApi`]: waxbadges_social::SocialApi

pub mod action;
pub mod config;
pub mod ecosystem;
pub mod grant;
pub mod notify;
pub mod pipeline;
pub mod provision;
pub mod visibility;

#[cfg(test)]
pub(crate) mod testing;

use waxbadges_chain::ChainError;
use waxbadges_social::SocialError;
use waxbadges_types::HandleError;

pub use config::GrantConfig;
pub use pipeline::{GrantOutcome, GrantRequest, Granter};
pub use visibility::VisibilityPolicy;

/// Which index of the request was out of range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexKind {
    Category,
    Achievement,
}

impl std::fmt::Display for IndexKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Category => f.write_str("category_id"),
            Self::Achievement => f.write_str("achievement_id"),
        }
    }
}

/// Error types for the grant workflow.
///
/// Every variant aborts the run; nothing is retried internally.
#[derive(Debug, thiserror::Error)]
pub enum GrantError {
    /// The request itself is unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// No ecosystem row has the requested key.
    #[error("ecosystem {0} not found")]
    NotFound(u32),

    /// The signing account does not own the ecosystem.
    #[error("ecosystem {ecosystem_id} is owned by {owner:?}, not {expected:?}")]
    OwnershipMismatch {
        ecosystem_id: u64,
        owner: String,
        expected: String,
    },

    /// Category or achievement index past the end of its list.
    #[error("invalid {kind}: {index} (ecosystem has {len})")]
    OutOfRange {
        kind: IndexKind,
        index: u32,
        len: usize,
    },

    /// The handle does not resolve to a social profile.
    #[error("profile lookup for {handle} failed: {source}")]
    ProfileLookup {
        handle: String,
        #[source]
        source: SocialError,
    },

    /// The ledger refused to encode or accept a write.
    #[error("{action} transaction failed: {source}")]
    Transaction {
        action: String,
        #[source]
        source: ChainError,
    },

    /// A write was accepted but its effect never became readable.
    #[error("{subject} not visible on the ledger after {attempts} attempt(s)")]
    Consistency { subject: String, attempts: u32 },

    /// The notification could not be delivered.
    #[error("direct message to {handle} failed: {source}")]
    MessageDelivery {
        handle: String,
        #[source]
        source: SocialError,
    },

    /// A ledger read failed.
    #[error("ledger read failed: {0}")]
    Ledger(#[from] ChainError),

    /// An ecosystem row did not decode.
    #[error("malformed ecosystem row: {0}")]
    MalformedEcosystem(String),
}

impl From<HandleError> for GrantError {
    fn from(e: HandleError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}

/// Convenience result type for the grant workflow.
pub type Result<T> = std::result::Result<T, GrantError>;
