//! Reservation checks shared by every store adapter
//!
//! Stores call [`apply_reservation`] inside their per-property critical
//! section, against the freshly loaded property, so that the decision to
//! take shares is made on current inventory rather than the caller's snapshot.

use core_kernel::{PropertyId, UserId};
use domain_property::{reserve, Property, PropertyType};

use crate::error::LedgerError;
use crate::investment::Investment;

/// Shares a user holds in a property across non-cancelled investments
pub fn active_user_shares<'a>(
    investments: impl IntoIterator<Item = &'a Investment>,
    user_id: UserId,
    property_id: PropertyId,
) -> u32 {
    investments
        .into_iter()
        .filter(|inv| inv.user_id() == user_id && inv.property_id() == property_id)
        .filter(|inv| !inv.is_cancelled())
        .map(|inv| inv.shares_invested())
        .sum()
}

/// Re-validates and reserves the shares of a new investment
///
/// Fails with `ConcurrentModification` when the snapshot the investment was
/// built from is stale: the property's share terms changed, or the schedule
/// was started on the expectation of taking the last shares and that no
/// longer holds. Any other failure is the inventory's own verdict.
pub fn apply_reservation(
    property: &mut Property,
    investment: &Investment,
    existing_user_shares: u32,
) -> Result<(), LedgerError> {
    if !investment.is_priced_from(property) {
        return Err(LedgerError::concurrent("Property", property.id()));
    }
    let expects_funding = property.property_type() != PropertyType::Project
        && investment.is_schedule_activated();
    if expects_funding && property.available_shares() != investment.shares_invested() {
        return Err(LedgerError::concurrent("Property", property.id()));
    }

    reserve(
        property,
        investment.shares_invested(),
        investment.total_investment(),
        existing_user_shares,
        investment.created_at(),
    )?;
    Ok(())
}
