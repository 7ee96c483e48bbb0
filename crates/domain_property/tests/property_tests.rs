//! Integration tests for domain_property

use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use core_kernel::{Currency, Money, PropertyId};

use domain_property::{
    can_reserve, compute_share_terms, generate_installment_schedule, release, reserve,
    InstallmentFrequency, InventoryError, NewProperty, Property, PropertyError, PropertyStatus,
    PropertyType, TermsUpdate,
};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_property(property_type: PropertyType, total_shares: u32) -> NewProperty {
    NewProperty {
        property_type,
        title: "Palm Residences".to_string(),
        location: "Riyadh".to_string(),
        bundle_items: if property_type == PropertyType::Bundle {
            vec![PropertyId::new(), PropertyId::new()]
        } else {
            Vec::new()
        },
        price: Money::from_units(1_000_000, Currency::USD),
        total_shares,
        advancement_percent: dec!(20),
        number_of_installments: 10,
        installment_frequency: InstallmentFrequency::Monthly,
        max_shares_per_user: None,
    }
}

// ============================================================================
// Calculator Tests
// ============================================================================

mod calculator_tests {
    use super::*;

    #[test]
    fn test_worked_example_for_five_shares() {
        let terms = compute_share_terms(
            Money::from_units(1_000_000, Currency::USD),
            100,
            dec!(20),
            10,
        )
        .unwrap();

        assert_eq!(terms.share_price.times(5).amount(), dec!(50000));
        assert_eq!(terms.share_down_payment.times(5).amount(), dec!(10000));
        assert_eq!(terms.share_installment_amount.times(5).amount(), dec!(4000));
    }

    #[test]
    fn test_rounding_residual_is_not_redistributed() {
        let terms = compute_share_terms(
            Money::from_units(1_000_000, Currency::USD),
            3,
            dec!(10),
            12,
        )
        .unwrap();

        assert_eq!(terms.share_price.amount(), dec!(333333));
        assert_ne!(terms.share_price.times(3).amount(), dec!(1000000));
    }

    #[test]
    fn test_frequency_months() {
        assert_eq!(InstallmentFrequency::Monthly.months(), 1);
        assert_eq!(InstallmentFrequency::Quarterly.months(), 3);
        assert_eq!(InstallmentFrequency::SemiAnnual.months(), 6);
        assert_eq!(InstallmentFrequency::Annual.months(), 12);
    }

    #[test]
    fn test_semi_annual_schedule_from_month_end() {
        let schedule = generate_installment_schedule(
            date(2024, 8, 31),
            Money::from_units(800, Currency::USD),
            3,
            InstallmentFrequency::SemiAnnual,
        )
        .unwrap();

        assert_eq!(schedule[0].due_date, date(2024, 8, 31));
        assert_eq!(schedule[1].due_date, date(2025, 2, 28));
        assert_eq!(schedule[2].due_date, date(2025, 8, 31));
    }

    #[test]
    fn test_annual_advance_from_leap_day() {
        let due = InstallmentFrequency::Annual.advance(date(2024, 2, 29), 4).unwrap();
        assert_eq!(due, date(2028, 2, 29));
    }
}

// ============================================================================
// Property Lifecycle Tests
// ============================================================================

mod property_lifecycle_tests {
    use super::*;

    #[test]
    fn test_register_each_type() {
        for property_type in [PropertyType::Single, PropertyType::Project, PropertyType::Bundle] {
            let property = Property::register(new_property(property_type, 100), Utc::now()).unwrap();
            assert_eq!(property.property_type(), property_type);
            assert_eq!(property.available_shares(), 100);
            assert_eq!(property.funding_percentage(), Decimal::ZERO);
        }
    }

    #[test]
    fn test_bundle_without_items_rejected() {
        let mut new = new_property(PropertyType::Bundle, 10);
        new.bundle_items.clear();
        assert!(matches!(
            Property::register(new, Utc::now()),
            Err(PropertyError::Validation(_))
        ));
    }

    #[test]
    fn test_blank_title_rejected() {
        let mut new = new_property(PropertyType::Single, 10);
        new.title = "   ".to_string();
        assert!(Property::register(new, Utc::now()).is_err());
    }

    #[test]
    fn test_update_terms_recomputes_share_amounts() {
        let mut property = Property::register(new_property(PropertyType::Project, 100), Utc::now()).unwrap();
        let version = property.version();

        property
            .update_terms(
                TermsUpdate {
                    advancement_percent: Some(dec!(50)),
                    number_of_installments: Some(5),
                    ..Default::default()
                },
                Utc::now(),
            )
            .unwrap();

        assert_eq!(property.share_price().amount(), dec!(10000));
        assert_eq!(property.share_down_payment().amount(), dec!(5000));
        assert_eq!(property.share_installment_amount().amount(), dec!(1000));
        assert_eq!(property.version(), version + 1);
    }

    #[test]
    fn test_invalid_terms_update_leaves_property_unchanged() {
        let mut property = Property::register(new_property(PropertyType::Single, 100), Utc::now()).unwrap();
        let before = property.clone();

        let result = property.update_terms(
            TermsUpdate {
                advancement_percent: Some(dec!(150)),
                ..Default::default()
            },
            Utc::now(),
        );

        assert!(result.is_err());
        assert_eq!(property, before);
    }

    #[test]
    fn test_currency_change_rejected() {
        let mut property = Property::register(new_property(PropertyType::Single, 100), Utc::now()).unwrap();
        let result = property.update_terms(
            TermsUpdate {
                price: Some(Money::from_units(1_000_000, Currency::EUR)),
                ..Default::default()
            },
            Utc::now(),
        );
        assert!(matches!(result, Err(PropertyError::Validation(_))));
    }

    #[test]
    fn test_status_advances_only_after_funding() {
        let mut property = Property::register(new_property(PropertyType::Single, 2), Utc::now()).unwrap();
        let result = property.advance_status(PropertyStatus::UnderConstruction, Utc::now());
        assert_eq!(
            result,
            Err(PropertyError::InvalidStatusTransition {
                from: PropertyStatus::Available,
                to: PropertyStatus::UnderConstruction,
            })
        );

        let amount = property.share_price().times(2);
        reserve(&mut property, 2, amount, 0, Utc::now()).unwrap();
        property
            .advance_status(PropertyStatus::UnderConstruction, Utc::now())
            .unwrap();
        assert!(property.advance_status(PropertyStatus::Exited, Utc::now()).is_err());
    }

    #[test]
    fn test_deactivated_property_is_not_investable() {
        let mut property = Property::register(new_property(PropertyType::Single, 10), Utc::now()).unwrap();
        property.deactivate(Utc::now());
        assert!(matches!(
            can_reserve(&property, 1, 0),
            Err(InventoryError::NotInvestable { status: PropertyStatus::Available, .. })
        ));
    }
}

// ============================================================================
// Inventory Tests
// ============================================================================

mod inventory_tests {
    use super::*;

    #[test]
    fn test_cap_ignored_for_bundles() {
        let mut new = new_property(PropertyType::Bundle, 10);
        new.max_shares_per_user = Some(1);
        let property = Property::register(new, Utc::now()).unwrap();
        assert!(can_reserve(&property, 5, 3).is_ok());
    }

    #[test]
    fn test_funding_percentage() {
        let mut property = Property::register(new_property(PropertyType::Project, 3), Utc::now()).unwrap();
        let amount = property.share_price();
        reserve(&mut property, 1, amount, 0, Utc::now()).unwrap();
        assert_eq!(property.funding_percentage(), dec!(33.33));
        assert_eq!(property.shares_sold(), 1);
        assert_eq!(property.remaining_shares(), 2);
    }

    #[test]
    fn test_reserve_rejects_foreign_currency() {
        let mut property = Property::register(new_property(PropertyType::Project, 3), Utc::now()).unwrap();
        let result = reserve(&mut property, 1, Money::from_units(1, Currency::GBP), 0, Utc::now());
        assert!(matches!(result, Err(InventoryError::Money(_))));
        assert_eq!(property.available_shares(), 3);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;

    fn frequency() -> impl Strategy<Value = InstallmentFrequency> {
        prop_oneof![
            Just(InstallmentFrequency::Monthly),
            Just(InstallmentFrequency::Quarterly),
            Just(InstallmentFrequency::SemiAnnual),
            Just(InstallmentFrequency::Annual),
        ]
    }

    proptest! {
        #[test]
        fn share_terms_are_deterministic_whole_and_non_negative(
            price in 1i64..100_000_000,
            shares in 1u32..10_000,
            percent in 0u32..=100,
            installments in 1u32..240,
        ) {
            let price = Money::from_units(price, Currency::USD);
            let percent = Decimal::from(percent);
            let first = compute_share_terms(price, shares, percent, installments).unwrap();
            let second = compute_share_terms(price, shares, percent, installments).unwrap();

            prop_assert_eq!(first, second);
            for amount in [first.share_price, first.share_down_payment, first.share_installment_amount] {
                prop_assert!(amount.is_whole());
                prop_assert!(!amount.is_negative());
            }
            prop_assert!(first.share_down_payment.amount() <= first.share_price.amount());
        }

        #[test]
        fn schedule_is_contiguous_and_ordered(
            day in 1u32..=31,
            count in 0u32..120,
            frequency in frequency(),
        ) {
            let start = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
            let amount = Money::from_units(800, Currency::USD);
            let schedule = generate_installment_schedule(start, amount, count, frequency).unwrap();

            prop_assert_eq!(schedule.len() as u32, count);
            for (i, row) in schedule.iter().enumerate() {
                prop_assert_eq!(row.installment_number, i as u32 + 1);
                prop_assert_eq!(row.amount, amount);
            }
            for pair in schedule.windows(2) {
                prop_assert!(pair[0].due_date < pair[1].due_date);
            }
        }

        #[test]
        fn reserve_and_release_conserve_shares(
            total in 1u32..200,
            ops in prop::collection::vec((any::<bool>(), 1u32..20), 0..50),
        ) {
            let mut property = Property::register(new_property(PropertyType::Project, total), Utc::now()).unwrap();
            let mut held: Vec<u32> = Vec::new();

            for (is_reserve, shares) in ops {
                if is_reserve {
                    let amount = property.share_price().times(shares);
                    if reserve(&mut property, shares, amount, 0, Utc::now()).is_ok() {
                        held.push(shares);
                    }
                } else if let Some(shares) = held.pop() {
                    let amount = property.share_price().times(shares);
                    release(&mut property, shares, amount, Utc::now()).unwrap();
                }
                let sold: u32 = held.iter().sum();
                prop_assert_eq!(property.available_shares() + sold, total);
                prop_assert_eq!(property.status() == PropertyStatus::Funded, property.available_shares() == 0);
            }
        }
    }
}
