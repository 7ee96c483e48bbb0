//! Unit tests for the Money module
//!
//! Tests cover money creation, half-up rounding, arithmetic and the
//! helpers the ledger uses for share pricing and payment progress.

use core_kernel::{Money, Currency, MoneyError, Rate};
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_new_rounds_to_four_decimal_places() {
        let m = Money::new(dec!(100.123456789), Currency::USD);
        assert_eq!(m.amount(), dec!(100.1235));
    }

    #[test]
    fn test_from_minor_converts_cents_correctly() {
        let m = Money::from_minor(10050, Currency::USD);
        assert_eq!(m.amount(), dec!(100.50));
    }

    #[test]
    fn test_from_units_is_whole() {
        let m = Money::from_units(1_000_000, Currency::AED);
        assert_eq!(m.amount(), dec!(1000000));
        assert!(m.is_whole());
        assert_eq!(m.currency(), Currency::AED);
    }

    #[test]
    fn test_zero_is_neither_positive_nor_negative() {
        let m = Money::zero(Currency::EUR);
        assert!(m.is_zero());
        assert!(!m.is_positive());
        assert!(!m.is_negative());
    }
}

mod rounding {
    use super::*;

    #[test]
    fn test_midpoint_rounds_up() {
        // Banker's rounding would give 2 here
        let m = Money::new(dec!(2.5), Currency::USD);
        assert_eq!(m.round_to_unit().amount(), dec!(3));
    }

    #[test]
    fn test_below_midpoint_rounds_down() {
        let m = Money::new(dec!(33333.3333), Currency::USD);
        assert_eq!(m.round_to_unit().amount(), dec!(33333));
    }

    #[test]
    fn test_round_half_up_to_cents() {
        let m = Money::new(dec!(10.005), Currency::USD);
        assert_eq!(m.round_half_up(2).amount(), dec!(10.01));
    }

    #[test]
    fn test_rounding_preserves_currency() {
        let m = Money::new(dec!(99.9), Currency::SAR);
        assert_eq!(m.round_to_unit().currency(), Currency::SAR);
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_checked_sub_currency_mismatch() {
        let a = Money::from_units(10, Currency::USD);
        let b = Money::from_units(5, Currency::GBP);
        assert_eq!(
            a.checked_sub(&b),
            Err(MoneyError::CurrencyMismatch("USD".to_string(), "GBP".to_string()))
        );
    }

    #[test]
    fn test_times_share_count() {
        let share_price = Money::from_units(10_000, Currency::USD);
        assert_eq!(share_price.times(5), Money::from_units(50_000, Currency::USD));
        assert!(share_price.times(0).is_zero());
    }

    #[test]
    fn test_min() {
        let a = Money::from_units(3, Currency::USD);
        let b = Money::from_units(7, Currency::USD);
        assert_eq!(a.min(b), a);
        assert_eq!(b.min(a), a);
    }
}

mod percentages {
    use super::*;

    #[test]
    fn test_percentage_of_total() {
        let paid = Money::from_units(1, Currency::USD);
        let total = Money::from_units(3, Currency::USD);
        assert_eq!(paid.percentage_of(&total).unwrap(), dec!(33.33));
    }

    #[test]
    fn test_percentage_of_currency_mismatch() {
        let paid = Money::from_units(1, Currency::USD);
        let total = Money::from_units(3, Currency::EUR);
        assert!(paid.percentage_of(&total).is_err());
    }

    #[test]
    fn test_rate_round_trip() {
        let rate = Rate::from_percentage(dec!(12.5));
        assert_eq!(rate.as_decimal(), dec!(0.125));
        assert_eq!(rate.as_percentage(), dec!(12.5));
        assert_eq!(rate.to_string(), "12.5%");
    }
}

mod display {
    use super::*;

    #[test]
    fn test_display_uses_symbol_and_two_places() {
        let m = Money::from_units(2000, Currency::USD);
        assert_eq!(m.to_string(), "$ 2000.00");
    }
}
