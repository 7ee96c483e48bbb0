//! Share terms and installment schedules
//!
//! Pure functions that derive per-share amounts from a property's financial
//! terms and lay out the installment due dates for an investment.
//!
//! # Rounding
//!
//! Every step rounds half-up to whole currency units, starting from the
//! previous step's rounded value:
//!
//! ```text
//! share_price         = round(price / total_shares)
//! share_down_payment  = round(share_price * advancement_percent / 100)
//! share_installment   = round((share_price - share_down_payment) / installments)
//! ```
//!
//! `share_price * total_shares` may differ from `price` by the rounding
//! residual; the residual is not redistributed.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{add_months, Money, Rate, TemporalError};

use crate::error::PropertyError;

/// Installment payment frequency
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentFrequency {
    /// Every month
    Monthly,
    /// Every 3 months
    Quarterly,
    /// Every 6 months
    SemiAnnual,
    /// Every 12 months
    Annual,
}

impl InstallmentFrequency {
    /// Returns the number of calendar months in one period
    pub fn months(&self) -> u32 {
        match self {
            InstallmentFrequency::Monthly => 1,
            InstallmentFrequency::Quarterly => 3,
            InstallmentFrequency::SemiAnnual => 6,
            InstallmentFrequency::Annual => 12,
        }
    }

    /// Advances `date` by `periods` whole periods
    ///
    /// Day-of-month overflow clamps to the last day of the target month.
    pub fn advance(&self, date: NaiveDate, periods: u32) -> Result<NaiveDate, TemporalError> {
        let months = self.months().checked_mul(periods).ok_or_else(|| {
            TemporalError::OutOfRange(format!("{} periods of {} months", periods, self.months()))
        })?;
        add_months(date, months)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InstallmentFrequency::Monthly => "monthly",
            InstallmentFrequency::Quarterly => "quarterly",
            InstallmentFrequency::SemiAnnual => "semi_annual",
            InstallmentFrequency::Annual => "annual",
        }
    }
}

impl std::fmt::Display for InstallmentFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-share amounts derived from a property's terms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareTerms {
    pub share_price: Money,
    pub share_down_payment: Money,
    pub share_installment_amount: Money,
}

/// One row of a generated installment schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledInstallment {
    /// 1-based position in the schedule
    pub installment_number: u32,
    pub amount: Money,
    pub due_date: NaiveDate,
}

/// Computes the per-share price, down payment and installment amount
///
/// # Arguments
///
/// * `price` - Total property price, must be positive
/// * `total_shares` - Number of shares the property is split into
/// * `advancement_percent` - Down payment share of the price, 0 to 100
/// * `number_of_installments` - Installments after the down payment
///
/// # Errors
///
/// Returns `PropertyError::Validation` for out-of-range inputs
///
/// # Example
///
/// ```rust
/// use core_kernel::{Currency, Money};
/// use domain_property::compute_share_terms;
/// use rust_decimal_macros::dec;
///
/// let terms = compute_share_terms(
///     Money::from_units(1_000_000, Currency::USD), 100, dec!(20), 10,
/// ).unwrap();
/// assert_eq!(terms.share_installment_amount.amount(), dec!(800));
/// ```
pub fn compute_share_terms(
    price: Money,
    total_shares: u32,
    advancement_percent: Decimal,
    number_of_installments: u32,
) -> Result<ShareTerms, PropertyError> {
    if !price.is_positive() {
        return Err(PropertyError::validation("price must be positive"));
    }
    if total_shares == 0 {
        return Err(PropertyError::validation("total_shares must be at least 1"));
    }
    if advancement_percent < Decimal::ZERO || advancement_percent > dec!(100) {
        return Err(PropertyError::validation(
            "advancement_percent must be between 0 and 100",
        ));
    }
    if number_of_installments == 0 {
        return Err(PropertyError::validation(
            "number_of_installments must be at least 1",
        ));
    }

    // Each step rounds half-up to a whole unit before the next one uses it
    let currency = price.currency();
    let share_price = Money::whole_units(price.amount() / Decimal::from(total_shares), currency);
    let advancement = Rate::from_percentage(advancement_percent);
    let share_down_payment = Money::whole_units(share_price.amount() * advancement.as_decimal(), currency);
    let share_installment_amount = Money::whole_units(
        (share_price - share_down_payment).amount() / Decimal::from(number_of_installments),
        currency,
    );

    Ok(ShareTerms {
        share_price,
        share_down_payment,
        share_installment_amount,
    })
}

/// Lays out `count` installments starting at `start_date`
///
/// Installment `i` is due `i - 1` periods after `start_date`. Each offset is
/// taken from `start_date` itself, so clamping in one month never shifts the
/// following due dates.
pub fn generate_installment_schedule(
    start_date: NaiveDate,
    per_installment_amount: Money,
    count: u32,
    frequency: InstallmentFrequency,
) -> Result<Vec<ScheduledInstallment>, PropertyError> {
    (1..=count)
        .map(|installment_number| {
            let due_date = frequency.advance(start_date, installment_number - 1)?;
            Ok(ScheduledInstallment {
                installment_number,
                amount: per_installment_amount,
                due_date,
            })
        })
        .collect()
}
