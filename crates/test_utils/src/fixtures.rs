//! Pre-built Test Fixtures
//!
//! Ready-to-use ledger data. Values are fixed so expected amounts can be
//! written down by hand in tests.

use chrono::{DateTime, NaiveDate, Utc};
use core_kernel::{Currency, FixedClock, Money, UserId};
use domain_property::{InstallmentFrequency, NewProperty, PropertyType};
use rust_decimal_macros::dec;

use crate::builders::NewPropertyBuilder;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// Standard property price: 50,000 USD
    pub fn usd_property_price() -> Money {
        Money::from_units(50_000, Currency::USD)
    }

    /// Price that does not divide evenly into 3 shares
    pub fn usd_uneven_price() -> Money {
        Money::from_units(100_000, Currency::USD)
    }

    pub fn aed_property_price() -> Money {
        Money::from_units(1_500_000, Currency::AED)
    }

    pub fn usd_zero() -> Money {
        Money::zero(Currency::USD)
    }

    /// A gateway charge in the wrong currency
    pub fn eur_100() -> Money {
        Money::new(dec!(100), Currency::EUR)
    }
}

/// Fixture for temporal test data
pub struct TemporalFixtures;

impl TemporalFixtures {
    /// Purchase day used across ledger tests (Jan 15, 2025)
    pub fn purchase_day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    pub fn purchase_time() -> DateTime<Utc> {
        Self::purchase_day().and_hms_opt(12, 0, 0).unwrap().and_utc()
    }

    /// A month-end date for clamping checks (Jan 31, 2025)
    pub fn month_end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
    }

    /// Leap-year month end (Jan 31, 2024)
    pub fn leap_month_end() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()
    }

    /// Clock frozen on [`TemporalFixtures::purchase_day`]
    pub fn clock() -> FixedClock {
        FixedClock::on(Self::purchase_day())
    }
}

/// Fixture for identifiers
pub struct IdFixtures;

impl IdFixtures {
    pub fn investor() -> UserId {
        UserId::new()
    }

    /// `count` distinct investors
    pub fn investors(count: usize) -> Vec<UserId> {
        (0..count).map(|_| UserId::new()).collect()
    }
}

/// Fixture for property registration requests
pub struct PropertyFixtures;

impl PropertyFixtures {
    /// 50,000 USD project in 10 shares, 20% down, 10 monthly installments
    ///
    /// Share terms: price 5,000, down payment 1,000, installment 400.
    pub fn project() -> NewProperty {
        NewPropertyBuilder::new().build()
    }

    /// Same terms as [`PropertyFixtures::project`] as a Single unit
    pub fn single() -> NewProperty {
        NewPropertyBuilder::new()
            .with_type(PropertyType::Single)
            .build()
    }

    /// Two-unit bundle with the standard terms
    pub fn bundle() -> NewProperty {
        NewPropertyBuilder::new().bundle_of(2).build()
    }

    /// Quarterly project priced in AED
    pub fn aed_quarterly_project() -> NewProperty {
        NewPropertyBuilder::new()
            .with_price(MoneyFixtures::aed_property_price())
            .with_total_shares(100)
            .with_installments(8, InstallmentFrequency::Quarterly)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain_property::Property;

    #[test]
    fn test_project_fixture_terms() {
        let property = Property::register(PropertyFixtures::project(), TemporalFixtures::purchase_time()).unwrap();
        assert_eq!(property.share_price().amount(), dec!(5000));
        assert_eq!(property.share_down_payment().amount(), dec!(1000));
        assert_eq!(property.share_installment_amount().amount(), dec!(400));
    }

    #[test]
    fn test_bundle_fixture_has_items() {
        assert_eq!(PropertyFixtures::bundle().bundle_items.len(), 2);
    }
}
