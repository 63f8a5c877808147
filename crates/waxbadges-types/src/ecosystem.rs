//! Ecosystem rows of the `ecosystems` table.
//!
//! Rows are read fresh on every run and never written back from here; the
//! contract owns all mutation. Unknown columns are ignored so newer contract
//! revisions still decode.

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr, PickFirst};

/// A namespaced collection of categories, achievements and users owned by
/// one ledger account.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ecosystem {
    /// Primary key. Nodes render 64-bit integers either as numbers or strings.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub key: u64,
    /// Owning account.
    pub account: String,
    /// Display name.
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub assetbaseurl: String,
    #[serde(default)]
    pub logoassetname: String,
    #[serde(default)]
    pub categories: Vec<Category>,
    /// Position in this list is the user's permanent `user_id`.
    #[serde(default)]
    pub users: Vec<User>,
}

/// An ordered group of achievements, referenced by zero-based index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub achievements: Vec<Achievement>,
}

/// A grantable achievement, referenced by index within its category.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub assetname: String,
}

/// A roster entry.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Caller-chosen display name.
    #[serde(default, alias = "name")]
    pub user_name: String,
    /// Identity key, the sigil-prefixed handle for Twitter users.
    pub userid: String,
    #[serde(default)]
    pub avatarurl: String,
}

impl Ecosystem {
    /// Decode a raw table row.
    pub fn from_row(row: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(row)
    }

    /// Category at `category_id`, if in range.
    pub fn category(&self, category_id: u32) -> Option<&Category> {
        self.categories.get(category_id as usize)
    }

    /// Achievement at `achievement_id` within `category_id`, if both are in range.
    pub fn achievement(&self, category_id: u32, achievement_id: u32) -> Option<&Achievement> {
        self.category(category_id)
            .and_then(|c| c.achievements.get(achievement_id as usize))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row() -> serde_json::Value {
        serde_json::json!({
            "key": 5,
            "account": "alice",
            "name": "Alice's Arcade",
            "description": "Retro high scores",
            "website": "https://arcade.example",
            "assetbaseurl": "https://arcade.example/assets",
            "logoassetname": "logo.png",
            "categories": [
                {"name": "Scores", "achievements": [
                    {"name": "First Blood", "description": "", "assetname": "a.png", "maxquantity": 0},
                    {"name": "Combo", "description": "", "assetname": "b.png"},
                    {"name": "Perfect", "description": "", "assetname": "c.png"}
                ]},
                {"name": "Social", "achievements": []}
            ],
            "users": [
                {"user_name": "@Carol", "userid": "@Carol", "avatarurl": "https://img/c.png"}
            ]
        })
    }

    #[test]
    fn test_decode_row() {
        let eco = Ecosystem::from_row(sample_row()).expect("decode");
        assert_eq!(eco.key, 5);
        assert_eq!(eco.account, "alice");
        assert_eq!(eco.categories.len(), 2);
        assert_eq!(eco.categories[0].achievements.len(), 3);
        assert_eq!(eco.users[0].userid, "@Carol");
    }

    #[test]
    fn test_decode_string_key() {
        let mut row = sample_row();
        row["key"] = serde_json::json!("18446744073709551615");
        let eco = Ecosystem::from_row(row).expect("decode");
        assert_eq!(eco.key, u64::MAX);
    }

    #[test]
    fn test_decode_minimal_row() {
        let row = serde_json::json!({"key": 1, "account": "bob", "name": "Bob"});
        let eco = Ecosystem::from_row(row).expect("decode");
        assert!(eco.categories.is_empty());
        assert!(eco.users.is_empty());
    }

    #[test]
    fn test_missing_account_is_error() {
        let row = serde_json::json!({"key": 1, "name": "Bob"});
        assert!(Ecosystem::from_row(row).is_err());
    }

    #[test]
    fn test_index_lookups() {
        let eco = Ecosystem::from_row(sample_row()).expect("decode");
        assert_eq!(eco.achievement(0, 2).map(|a| a.name.as_str()), Some("Perfect"));
        assert!(eco.achievement(0, 3).is_none());
        assert!(eco.achievement(1, 0).is_none());
        assert!(eco.category(2).is_none());
    }
}
