//! # waxbadges-types
//!
//! Shared domain types used across the WAXBadges workspace.
//! The ledger entities mirror the rows of the `waxbadgesftw` contract's
//! `ecosystems` table; nothing here talks to the network.

pub mod ecosystem;
pub mod identity;

pub use ecosystem::{Achievement, Category, Ecosystem, User};
pub use identity::{Handle, HandleError};

/// Contract account that owns the `ecosystems` table and the write actions.
pub const WAX_CONTRACT: &str = "waxbadgesftw";

/// Public WAX mainnet RPC endpoint.
pub const WAX_URL: &str = "https://chain.wax.io";

/// Table holding one row per ecosystem, keyed by ecosystem id.
pub const ECOSYSTEMS_TABLE: &str = "ecosystems";

/// Action registering a new user in an ecosystem's roster.
pub const ACTION_ADD_USER: &str = "adduser";

/// Action recording an achievement grant.
pub const ACTION_GRANT_ACHIEVEMENT: &str = "grantach";

/// Base path of the shareable Proof-of-Achievement links.
pub const POA_BASE_URL: &str = "https://explorer.waxbadges.com/poa";

/// Leading sigil of a Twitter mention.
pub const HANDLE_SIGIL: char = '@';

/// Transactions expire this many seconds after they are built.
pub const TRANSACTION_EXPIRATION_SECS: u64 = 60;

/// Read timeout for ledger table queries, in seconds.
pub const TABLE_QUERY_TIMEOUT_SECS: u64 = 30;
