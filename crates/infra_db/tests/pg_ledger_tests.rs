//! PostgreSQL ledger store integration tests
//!
//! These start a PostgreSQL container and need a local Docker daemon:
//!
//! ```text
//! cargo test -p infra_db -- --ignored
//! ```

use std::sync::Arc;

use chrono::Utc;
use core_kernel::{Currency, Money, PortError, UserId};
use domain_investment::{Investment, InvestmentQuery, LedgerError, LedgerStore};
use domain_property::{Property, PropertyType};
use infra_db::PgLedgerStore;
use test_utils::database::create_isolated_test_database;
use test_utils::database::TestDatabase;
use test_utils::{NewPropertyBuilder, TemporalFixtures};

async fn store_with(property: &Property) -> (TestDatabase, Arc<PgLedgerStore>) {
    let db = create_isolated_test_database()
        .await
        .expect("Failed to create test database");
    let store = Arc::new(PgLedgerStore::new(db.pool().clone()));
    store.insert_property(property).await.unwrap();
    (db, store)
}

fn three_share_project() -> Property {
    NewPropertyBuilder::new()
        .with_type(PropertyType::Project)
        .with_price(Money::from_units(30_000, Currency::USD))
        .with_total_shares(3)
        .register()
}

fn open(property: &Property, shares: u32) -> Investment {
    Investment::open(
        UserId::new(),
        property,
        shares,
        Some(TemporalFixtures::purchase_day()),
        Utc::now(),
    )
    .unwrap()
}

mod reservation_tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_last_shares_go_to_one_buyer() {
        let property = three_share_project();
        let (_db, store) = store_with(&property).await;
        let first = open(&property, 2);
        let second = open(&property, 2);

        let (a, b) = tokio::join!(
            {
                let store = store.clone();
                let first = first.clone();
                async move { store.reserve_and_record(&first).await }
            },
            {
                let store = store.clone();
                let second = second.clone();
                async move { store.reserve_and_record(&second).await }
            }
        );

        let outcomes = [a, b];
        assert_eq!(outcomes.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(outcomes.iter().any(|r| matches!(
            r,
            Err(LedgerError::InsufficientShares { requested: 2, available: 1 })
        )));

        let stored = store.get_property(property.id()).await.unwrap();
        assert_eq!(stored.available_shares(), 1);
        let recorded = store
            .list_investments(InvestmentQuery::for_property(property.id()))
            .await
            .unwrap();
        assert_eq!(recorded.len(), 1);
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_failed_insert_rolls_back_share_decrement() {
        let property = three_share_project();
        let (_db, store) = store_with(&property).await;
        let investment = open(&property, 1);
        store.reserve_and_record(&investment).await.unwrap();

        // Same investment id again: the decrement succeeds, the insert does not
        let result = store.reserve_and_record(&investment).await;
        assert!(matches!(result, Err(LedgerError::Store(_))));

        let stored = store.get_property(property.id()).await.unwrap();
        assert_eq!(stored.available_shares(), 2);
        assert_eq!(stored.version(), property.version() + 1);
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_unknown_property_is_not_found() {
        let property = three_share_project();
        let (_db, store) = store_with(&property).await;
        let stray = NewPropertyBuilder::new().register();

        let result = store.reserve_and_record(&open(&stray, 1)).await;
        assert!(matches!(result, Err(LedgerError::PropertyNotFound(id)) if id == stray.id()));
    }
}

mod cancellation_tests {
    use super::*;

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_stale_cancel_leaves_inventory_untouched() {
        let property = three_share_project();
        let (_db, store) = store_with(&property).await;
        let mut investment = open(&property, 2);
        store.reserve_and_record(&investment).await.unwrap();
        let stored_version = investment.version();

        investment.cancel(Utc::now()).unwrap();
        let stale = store.cancel_and_release(&investment, stored_version + 1).await;
        assert!(matches!(stale, Err(LedgerError::ConcurrentModification { .. })));
        assert_eq!(store.get_property(property.id()).await.unwrap().available_shares(), 1);

        let released = store.cancel_and_release(&investment, stored_version).await.unwrap();
        assert_eq!(released.available_shares(), 3);
        assert!(released.total_invested().is_zero());
        assert!(store.get_investment(investment.id()).await.unwrap().is_cancelled());
    }

    #[tokio::test]
    #[ignore = "requires Docker"]
    async fn test_guarded_update_rejects_stale_version() {
        let property = three_share_project();
        let (_db, store) = store_with(&property).await;
        let investment = open(&property, 1);
        store.reserve_and_record(&investment).await.unwrap();

        let err = store
            .update_investment(&investment, investment.version() + 7)
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::VersionConflict { .. }));

        let missing = open(&property, 1);
        let err = store
            .update_investment(&missing, missing.version())
            .await
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound { .. }));
    }
}
