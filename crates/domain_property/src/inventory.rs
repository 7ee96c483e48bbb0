//! Share inventory
//!
//! The only code allowed to change a property's `available_shares`,
//! `total_invested` and the Available/Funded status. Callers are expected to
//! serialize calls per property (a per-property lock or a locked database row);
//! within that critical section each function is all-or-nothing.
//!
//! # Conservation
//!
//! For every property, at all times:
//!
//! ```text
//! available_shares + sum(shares of non-cancelled investments) == total_shares
//! ```

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use core_kernel::Money;

use crate::error::InventoryError;
use crate::property::{Property, PropertyStatus, PropertyType};

/// Checks whether `requested` shares may be reserved by a user who already
/// holds `existing_user_shares` active shares of this property
///
/// Checks run in a fixed order: quantity, investability, availability and
/// then the per-user cap (Single properties only).
pub fn can_reserve(
    property: &Property,
    requested: u32,
    existing_user_shares: u32,
) -> Result<(), InventoryError> {
    if requested == 0 {
        return Err(InventoryError::InvalidQuantity);
    }
    if !property.is_investable() {
        return Err(InventoryError::NotInvestable {
            property_id: property.id(),
            status: property.status(),
        });
    }
    if requested > property.available_shares {
        return Err(InventoryError::InsufficientShares {
            requested,
            available: property.available_shares,
        });
    }
    if property.property_type() == PropertyType::Single {
        if let Some(cap) = property.max_shares_per_user() {
            if existing_user_shares.saturating_add(requested) > cap {
                return Err(InventoryError::PerUserCapExceeded {
                    cap,
                    held: existing_user_shares,
                    requested,
                });
            }
        }
    }
    Ok(())
}

/// Reserves `shares` and records `amount` as invested
///
/// Re-runs [`can_reserve`] first. The property becomes Funded when its last
/// share is taken.
///
/// # Errors
///
/// Any `can_reserve` failure, or a currency mismatch on `amount`; the
/// property is untouched on error
pub fn reserve(
    property: &mut Property,
    shares: u32,
    amount: Money,
    existing_user_shares: u32,
    now: DateTime<Utc>,
) -> Result<(), InventoryError> {
    can_reserve(property, shares, existing_user_shares)?;
    let total_invested = property.total_invested.checked_add(&amount)?;

    property.available_shares -= shares;
    property.total_invested = total_invested;
    if property.available_shares == 0 {
        property.status = PropertyStatus::Funded;
        info!(property_id = %property.id(), "Property fully funded");
    }
    property.touch(now);

    debug!(
        property_id = %property.id(),
        shares,
        available = property.available_shares,
        "Shares reserved"
    );
    Ok(())
}

/// Returns `shares` to the inventory and removes `amount` from the invested total
///
/// Available shares never exceed `total_shares` and the invested total never
/// drops below zero. A Funded property with shares available again goes back
/// to Available.
pub fn release(
    property: &mut Property,
    shares: u32,
    amount: Money,
    now: DateTime<Utc>,
) -> Result<(), InventoryError> {
    let remaining = property.total_invested.checked_sub(&amount)?;

    property.available_shares = property
        .available_shares
        .saturating_add(shares)
        .min(property.total_shares());
    property.total_invested = if remaining.is_negative() {
        Money::zero(remaining.currency())
    } else {
        remaining
    };
    if property.status == PropertyStatus::Funded && property.available_shares > 0 {
        property.status = PropertyStatus::Available;
        info!(property_id = %property.id(), "Property reopened for investment");
    }
    property.touch(now);

    debug!(
        property_id = %property.id(),
        shares,
        available = property.available_shares,
        "Shares released"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculator::InstallmentFrequency;
    use crate::property::NewProperty;
    use core_kernel::Currency;
    use rust_decimal_macros::dec;

    fn property(total_shares: u32, cap: Option<u32>) -> Property {
        Property::register(
            NewProperty {
                property_type: PropertyType::Single,
                title: "Test".to_string(),
                location: "Cairo".to_string(),
                bundle_items: Vec::new(),
                price: Money::from_units(10_000 * i64::from(total_shares), Currency::USD),
                total_shares,
                advancement_percent: dec!(20),
                number_of_installments: 10,
                installment_frequency: InstallmentFrequency::Monthly,
                max_shares_per_user: cap,
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn usd(units: i64) -> Money {
        Money::from_units(units, Currency::USD)
    }

    #[test]
    fn test_reserve_decrements_and_funds() {
        let mut p = property(3, None);
        reserve(&mut p, 2, usd(20_000), 0, Utc::now()).unwrap();
        assert_eq!(p.available_shares(), 1);
        assert_eq!(p.status(), PropertyStatus::Available);

        reserve(&mut p, 1, usd(10_000), 0, Utc::now()).unwrap();
        assert_eq!(p.available_shares(), 0);
        assert_eq!(p.status(), PropertyStatus::Funded);
        assert_eq!(p.total_invested(), usd(30_000));
    }

    #[test]
    fn test_failed_reserve_leaves_property_untouched() {
        let mut p = property(3, None);
        let before = p.clone();
        let err = reserve(&mut p, 4, usd(40_000), 0, Utc::now()).unwrap_err();
        assert_eq!(err, InventoryError::InsufficientShares { requested: 4, available: 3 });
        assert_eq!(p, before);
    }

    #[test]
    fn test_cap_applies_per_user() {
        let mut p = property(2, Some(1));
        assert_eq!(
            reserve(&mut p, 2, usd(20_000), 0, Utc::now()),
            Err(InventoryError::PerUserCapExceeded { cap: 1, held: 0, requested: 2 })
        );
        reserve(&mut p, 1, usd(10_000), 0, Utc::now()).unwrap();
        assert!(matches!(
            can_reserve(&p, 1, 1),
            Err(InventoryError::PerUserCapExceeded { .. })
        ));
        reserve(&mut p, 1, usd(10_000), 0, Utc::now()).unwrap();
    }

    #[test]
    fn test_funded_property_reports_not_investable_before_shortage() {
        let mut p = property(1, None);
        reserve(&mut p, 1, usd(10_000), 0, Utc::now()).unwrap();
        assert!(matches!(
            can_reserve(&p, 5, 0),
            Err(InventoryError::NotInvestable { status: PropertyStatus::Funded, .. })
        ));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let p = property(3, None);
        assert_eq!(can_reserve(&p, 0, 0), Err(InventoryError::InvalidQuantity));
    }

    #[test]
    fn test_release_reopens_funded_property() {
        let mut p = property(2, None);
        reserve(&mut p, 2, usd(20_000), 0, Utc::now()).unwrap();
        release(&mut p, 1, usd(10_000), Utc::now()).unwrap();
        assert_eq!(p.available_shares(), 1);
        assert_eq!(p.status(), PropertyStatus::Available);
        assert_eq!(p.total_invested(), usd(10_000));
    }

    #[test]
    fn test_release_is_clamped() {
        let mut p = property(2, None);
        release(&mut p, 5, usd(99_000), Utc::now()).unwrap();
        assert_eq!(p.available_shares(), 2);
        assert!(p.total_invested().is_zero());
    }
}
