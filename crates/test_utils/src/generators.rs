//! Property-Based Test Generators
//!
//! Proptest strategies that only produce inputs the ledger accepts.

use chrono::{Duration, NaiveDate};
use core_kernel::{Currency, Money, PropertyId};
use domain_property::{InstallmentFrequency, NewProperty, PropertyType};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for generating Currency values
pub fn currency_strategy() -> impl Strategy<Value = Currency> {
    prop_oneof![
        Just(Currency::USD),
        Just(Currency::EUR),
        Just(Currency::GBP),
        Just(Currency::AED),
        Just(Currency::SAR),
        Just(Currency::EGP),
    ]
}

/// Whole-unit property prices from 1,000 to 100,000,000
pub fn price_strategy() -> impl Strategy<Value = Money> {
    (1_000i64..100_000_000i64, currency_strategy())
        .prop_map(|(units, currency)| Money::from_units(units, currency))
}

pub fn total_shares_strategy() -> impl Strategy<Value = u32> {
    1u32..1_000u32
}

/// Advancement percentages 0.00 to 100.00
pub fn advancement_percent_strategy() -> impl Strategy<Value = Decimal> {
    (0u32..=10_000u32).prop_map(|n| Decimal::new(n as i64, 2))
}

pub fn installment_count_strategy() -> impl Strategy<Value = u32> {
    1u32..=120u32
}

pub fn frequency_strategy() -> impl Strategy<Value = InstallmentFrequency> {
    prop_oneof![
        Just(InstallmentFrequency::Monthly),
        Just(InstallmentFrequency::Quarterly),
        Just(InstallmentFrequency::SemiAnnual),
        Just(InstallmentFrequency::Annual),
    ]
}

/// Dates between 2020 and roughly 2040
pub fn date_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..7_300i64).prop_map(|days| {
        NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default() + Duration::days(days)
    })
}

/// Valid registration requests for Single and Project properties
pub fn new_property_strategy() -> impl Strategy<Value = NewProperty> {
    (
        prop_oneof![Just(PropertyType::Single), Just(PropertyType::Project)],
        price_strategy(),
        total_shares_strategy(),
        advancement_percent_strategy(),
        installment_count_strategy(),
        frequency_strategy(),
    )
        .prop_map(
            |(property_type, price, total_shares, advancement_percent, count, frequency)| NewProperty {
                property_type,
                title: "Generated".to_string(),
                location: String::new(),
                bundle_items: Vec::<PropertyId>::new(),
                price,
                total_shares,
                advancement_percent,
                number_of_installments: count,
                installment_frequency: frequency,
                max_shares_per_user: None,
            },
        )
}

/// Share requests against a property of `total_shares`, possibly oversized
pub fn share_requests_strategy(total_shares: u32, max_requests: usize) -> impl Strategy<Value = Vec<u32>> {
    proptest::collection::vec(1u32..=total_shares.max(1) + 2, 1..=max_requests.max(1))
}
