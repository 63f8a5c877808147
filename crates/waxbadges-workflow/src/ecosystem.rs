//! Ledger reads and pre-write validation of an ecosystem.

use tracing::debug;
use waxbadges_chain::{Ledger, Name, TableQuery};
use waxbadges_types::{Achievement, Ecosystem};

use crate::{GrantConfig, GrantError, IndexKind, Result};

/// Read the ecosystem whose key is `ecosystem_id`.
///
/// Asks for at most one row. An empty result, or a row with a different key,
/// is [`GrantError::NotFound`].
pub async fn fetch_ecosystem(
    ledger: &dyn Ledger,
    config: &GrantConfig,
    ecosystem_id: u32,
) -> Result<Ecosystem> {
    let query = TableQuery::by_primary_key(
        config.contract,
        config.ecosystems_table,
        u64::from(ecosystem_id),
        config.table_timeout,
    );
    let row = ledger
        .fetch_table(&query)
        .await?
        .into_iter()
        .next()
        .ok_or(GrantError::NotFound(ecosystem_id))?;

    let ecosystem =
        Ecosystem::from_row(row).map_err(|e| GrantError::MalformedEcosystem(e.to_string()))?;
    if ecosystem.key != u64::from(ecosystem_id) {
        return Err(GrantError::NotFound(ecosystem_id));
    }

    debug!(
        ecosystem_id,
        name = %ecosystem.name,
        users = ecosystem.users.len(),
        "ecosystem fetched"
    );
    Ok(ecosystem)
}

/// Refuse to sign for an ecosystem `account` does not own.
pub fn validate_ownership(ecosystem: &Ecosystem, account: Name) -> Result<()> {
    let expected = account.to_string();
    if ecosystem.account != expected {
        return Err(GrantError::OwnershipMismatch {
            ecosystem_id: ecosystem.key,
            owner: ecosystem.account.clone(),
            expected,
        });
    }
    Ok(())
}

/// Check both indices and return the achievement they select.
pub fn validate_indices(
    ecosystem: &Ecosystem,
    category_id: u32,
    achievement_id: u32,
) -> Result<&Achievement> {
    let category = ecosystem
        .category(category_id)
        .ok_or(GrantError::OutOfRange {
            kind: IndexKind::Category,
            index: category_id,
            len: ecosystem.categories.len(),
        })?;
    category
        .achievements
        .get(achievement_id as usize)
        .ok_or(GrantError::OutOfRange {
            kind: IndexKind::Achievement,
            index: achievement_id,
            len: category.achievements.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{config, ecosystem_row, StubLedger};
    use serde_json::json;

    fn ecosystem() -> Ecosystem {
        Ecosystem::from_row(ecosystem_row()).expect("row")
    }

    #[tokio::test]
    async fn test_fetch_existing() {
        let ledger = StubLedger::with_row(ecosystem_row());
        let eco = fetch_ecosystem(&ledger, &config(), 5).await.expect("found");
        assert_eq!(eco.key, 5);
        assert_eq!(eco.account, "alice");
        assert_eq!(eco.users.len(), 4);
    }

    #[tokio::test]
    async fn test_fetch_missing_is_not_found() {
        let ledger = StubLedger::with_row(ecosystem_row());
        let err = fetch_ecosystem(&ledger, &config(), 6).await.expect_err("missing");
        assert!(matches!(err, GrantError::NotFound(6)));
    }

    #[tokio::test]
    async fn test_fetch_row_with_other_key_is_not_found() {
        let mut row = ecosystem_row();
        row["key"] = json!(6);
        let ledger = StubLedger {
            ignore_bounds: true,
            ..StubLedger::with_row(row)
        };
        let err = fetch_ecosystem(&ledger, &config(), 5).await.expect_err("wrong row");
        assert!(matches!(err, GrantError::NotFound(5)));
    }

    #[test]
    fn test_ownership_keeps_wide_key() {
        let mut eco = ecosystem();
        eco.key = u64::from(u32::MAX) + 6;
        let err = validate_ownership(&eco, Name::new("mallory").expect("name"))
            .expect_err("not owner");
        assert!(matches!(
            err,
            GrantError::OwnershipMismatch { ecosystem_id, .. } if ecosystem_id == u64::from(u32::MAX) + 6
        ));
    }

    #[tokio::test]
    async fn test_fetch_malformed_row() {
        let ledger = StubLedger::with_row(json!({"key": 5, "categories": "nope"}));
        let err = fetch_ecosystem(&ledger, &config(), 5).await.expect_err("malformed");
        assert!(matches!(err, GrantError::MalformedEcosystem(_)));
    }

    #[test]
    fn test_ownership() {
        let eco = ecosystem();
        validate_ownership(&eco, Name::new("alice").expect("name")).expect("owner");

        let err = validate_ownership(&eco, Name::new("mallory").expect("name"))
            .expect_err("not owner");
        match err {
            GrantError::OwnershipMismatch {
                ecosystem_id,
                owner,
                expected,
            } => {
                assert_eq!(ecosystem_id, 5);
                assert_eq!(owner, "alice");
                assert_eq!(expected, "mallory");
            }
            other => unreachable!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_index_boundaries() {
        let eco = ecosystem();
        assert_eq!(validate_indices(&eco, 1, 0).expect("last category").name, "Hidden Room");
        assert_eq!(validate_indices(&eco, 0, 2).expect("last achievement").name, "Veteran");

        assert!(matches!(
            validate_indices(&eco, 2, 0),
            Err(GrantError::OutOfRange { kind: IndexKind::Category, index: 2, len: 2 })
        ));
        assert!(matches!(
            validate_indices(&eco, 0, 3),
            Err(GrantError::OutOfRange { kind: IndexKind::Achievement, index: 3, len: 3 })
        ));
        assert!(matches!(
            validate_indices(&eco, 1, 1),
            Err(GrantError::OutOfRange { kind: IndexKind::Achievement, index: 1, len: 1 })
        ));
    }
}
