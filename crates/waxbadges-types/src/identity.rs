//! Social identity handles.
//!
//! A handle arrives from the command line either bare (`bob`) or as a
//! mention (`@bob`). Profile lookups and direct messages use the bare form;
//! the ledger roster stores and matches the mention form.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::HANDLE_SIGIL;

/// Errors raised while resolving a handle.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HandleError {
    /// Nothing left once the sigil was stripped.
    #[error("identity handle is empty")]
    Empty,
}

/// A resolved social identity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handle {
    bare: String,
    mention: String,
}

impl Handle {
    /// Resolve a raw handle, stripping one leading sigil if present.
    pub fn parse(raw: &str) -> Result<Self, HandleError> {
        let bare = raw.strip_prefix(HANDLE_SIGIL).unwrap_or(raw);
        if bare.is_empty() {
            return Err(HandleError::Empty);
        }
        Ok(Self {
            bare: bare.to_string(),
            mention: format!("{HANDLE_SIGIL}{bare}"),
        })
    }

    /// The handle without its sigil, as the social API expects it.
    pub fn bare(&self) -> &str {
        &self.bare
    }

    /// The sigil-prefixed canonical form stored on the ledger.
    pub fn mention(&self) -> &str {
        &self.mention
    }

    /// Whether a stored roster identity refers to this handle.
    ///
    /// Comparison ignores letter case; storage keeps the original case.
    pub fn matches(&self, stored: &str) -> bool {
        stored.to_lowercase() == self.mention.to_lowercase()
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mention)
    }
}

impl std::str::FromStr for Handle {
    type Err = HandleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
