//! Investment aggregate
//!
//! An investment records one user's purchase of shares in one property,
//! the amounts snapshotted at purchase and the state of every payment.
//!
//! # State Machine
//!
//! - (new) -> Pending on creation
//! - Pending -> Active when the down payment is paid and a schedule exists
//! - Pending -> Cancelled while no payment has been made
//! - Active -> Completed when the last installment is paid
//!
//! # Invariants
//!
//! - `status == Completed` iff the down payment and every generated
//!   installment are paid
//! - Installments are generated once, when `first_installment_date` goes
//!   from unset to set
//! - Investments are never deleted; cancellation is a status

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{InstallmentId, InvestmentId, Money, PropertyId, UserId};
use domain_property::{generate_installment_schedule, InstallmentFrequency, Property};

use crate::error::LedgerError;
use crate::installment::Installment;

/// Investment lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentStatus {
    Pending,
    Active,
    Completed,
    Cancelled,
}

impl InvestmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestmentStatus::Pending => "pending",
            InvestmentStatus::Active => "active",
            InvestmentStatus::Completed => "completed",
            InvestmentStatus::Cancelled => "cancelled",
        }
    }

    /// Parses the stored representation
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(InvestmentStatus::Pending),
            "active" => Some(InvestmentStatus::Active),
            "completed" => Some(InvestmentStatus::Completed),
            "cancelled" => Some(InvestmentStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for InvestmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a completed gateway charge
///
/// When `amount` is present it must equal the amount being settled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub transaction_id: String,
    pub amount: Option<Money>,
}

impl PaymentReceipt {
    pub fn new(transaction_id: impl Into<String>) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            amount: None,
        }
    }

    pub fn with_amount(mut self, amount: Money) -> Self {
        self.amount = Some(amount);
        self
    }

    fn check(&self, expected: Money) -> Result<(), LedgerError> {
        if self.transaction_id.trim().is_empty() {
            return Err(LedgerError::validation("transaction_id must not be empty"));
        }
        match self.amount {
            Some(actual) if actual != expected => {
                Err(LedgerError::AmountMismatch { expected, actual })
            }
            _ => Ok(()),
        }
    }
}

/// The Investment aggregate root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    id: InvestmentId,
    user_id: UserId,
    property_id: PropertyId,
    shares_invested: u32,
    share_price_at_purchase: Money,
    total_investment: Money,
    down_payment: Money,
    down_payment_paid: bool,
    down_payment_date: Option<NaiveDate>,
    down_payment_transaction_id: Option<String>,
    installment_amount: Money,
    number_of_installments: u32,
    installment_frequency: InstallmentFrequency,
    first_installment_date: Option<NaiveDate>,
    installments: Vec<Installment>,
    status: InvestmentStatus,
    /// Version for optimistic concurrency; bumped by every mutation
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl Investment {
    /// Opens a Pending investment priced from the property's current share terms
    ///
    /// When `first_installment_date` is given the installment schedule is
    /// generated immediately.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Validation` if `shares` is zero
    pub fn open(
        user_id: UserId,
        property: &Property,
        shares: u32,
        first_installment_date: Option<NaiveDate>,
        now: DateTime<Utc>,
    ) -> Result<Self, LedgerError> {
        if shares == 0 {
            return Err(LedgerError::validation("shares requested must be at least 1"));
        }

        let mut investment = Self {
            id: InvestmentId::new_v7(),
            user_id,
            property_id: property.id(),
            shares_invested: shares,
            share_price_at_purchase: property.share_price(),
            total_investment: property.share_price().times(shares),
            down_payment: property.share_down_payment().times(shares),
            down_payment_paid: false,
            down_payment_date: None,
            down_payment_transaction_id: None,
            installment_amount: property.share_installment_amount().times(shares),
            number_of_installments: property.number_of_installments(),
            installment_frequency: property.installment_frequency(),
            first_installment_date: None,
            installments: Vec::new(),
            status: InvestmentStatus::Pending,
            version: 1,
            created_at: now,
            updated_at: now,
            cancelled_at: None,
        };
        if let Some(date) = first_installment_date {
            investment.generate_schedule(date)?;
        }
        Ok(investment)
    }

    pub fn id(&self) -> InvestmentId {
        self.id
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn property_id(&self) -> PropertyId {
        self.property_id
    }

    pub fn shares_invested(&self) -> u32 {
        self.shares_invested
    }

    pub fn share_price_at_purchase(&self) -> Money {
        self.share_price_at_purchase
    }

    pub fn total_investment(&self) -> Money {
        self.total_investment
    }

    pub fn down_payment(&self) -> Money {
        self.down_payment
    }

    pub fn down_payment_paid(&self) -> bool {
        self.down_payment_paid
    }

    pub fn down_payment_date(&self) -> Option<NaiveDate> {
        self.down_payment_date
    }

    pub fn down_payment_transaction_id(&self) -> Option<&str> {
        self.down_payment_transaction_id.as_deref()
    }

    pub fn installment_amount(&self) -> Money {
        self.installment_amount
    }

    pub fn number_of_installments(&self) -> u32 {
        self.number_of_installments
    }

    pub fn installment_frequency(&self) -> InstallmentFrequency {
        self.installment_frequency
    }

    pub fn first_installment_date(&self) -> Option<NaiveDate> {
        self.first_installment_date
    }

    pub fn installments(&self) -> &[Installment] {
        &self.installments
    }

    pub fn installment(&self, id: InstallmentId) -> Option<&Installment> {
        self.installments.iter().find(|i| i.id() == id)
    }

    pub fn status(&self) -> InvestmentStatus {
        self.status
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn cancelled_at(&self) -> Option<DateTime<Utc>> {
        self.cancelled_at
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == InvestmentStatus::Cancelled
    }

    /// Pending or Active
    pub fn is_open(&self) -> bool {
        matches!(self.status, InvestmentStatus::Pending | InvestmentStatus::Active)
    }

    pub fn is_schedule_activated(&self) -> bool {
        self.first_installment_date.is_some()
    }

    /// Returns true if the amounts were priced from the property's current terms
    pub fn is_priced_from(&self, property: &Property) -> bool {
        self.property_id == property.id()
            && self.share_price_at_purchase == property.share_price()
            && self.down_payment == property.share_down_payment().times(self.shares_invested)
            && self.installment_amount
                == property.share_installment_amount().times(self.shares_invested)
            && self.number_of_installments == property.number_of_installments()
            && self.installment_frequency == property.installment_frequency()
    }

    /// Sum of everything the schedule asks for: the down payment plus every
    /// installment
    pub fn total_payable(&self) -> Money {
        self.down_payment + self.installment_amount.times(self.number_of_installments)
    }

    /// Down payment (if paid) plus all paid installments
    pub fn total_paid(&self) -> Money {
        let installments: Money = self
            .installments
            .iter()
            .filter(|i| i.is_paid())
            .map(|i| i.amount())
            .fold(Money::zero(self.down_payment.currency()), |acc, m| acc + m);
        if self.down_payment_paid {
            installments + self.down_payment
        } else {
            installments
        }
    }

    /// `total_investment - total_paid`, never below zero
    ///
    /// The schedule may ask for a little more than `total_investment` after
    /// whole-unit rounding; that residual is not reconciled here.
    pub fn remaining_amount(&self) -> Money {
        let remaining = self.total_investment - self.total_paid();
        if remaining.is_negative() {
            Money::zero(remaining.currency())
        } else {
            remaining
        }
    }

    /// Percentage of `total_payable` already paid, 2 decimal places
    pub fn payment_progress(&self) -> Decimal {
        self.total_paid()
            .percentage_of(&self.total_payable())
            .unwrap_or(Decimal::ZERO)
    }

    pub fn paid_installments_count(&self) -> usize {
        self.installments.iter().filter(|i| i.is_paid()).count()
    }

    /// First Pending installment already due on `today`
    pub fn next_due_installment(&self, today: NaiveDate) -> Option<&Installment> {
        self.installments
            .iter()
            .find(|i| i.is_pending() && i.due_date() <= today)
    }

    /// Records the down payment
    ///
    /// # Errors
    ///
    /// - `NotPending` if the investment is cancelled
    /// - `AlreadyPaid` if the down payment was already recorded
    /// - `AmountMismatch` if the receipt carries a different amount
    pub fn pay_down_payment(&mut self, receipt: PaymentReceipt, now: DateTime<Utc>) -> Result<(), LedgerError> {
        if self.is_cancelled() {
            return Err(LedgerError::NotPending { status: self.status });
        }
        if self.down_payment_paid {
            return Err(LedgerError::AlreadyPaid("Down payment".to_string()));
        }
        receipt.check(self.down_payment)?;

        self.down_payment_paid = true;
        self.down_payment_date = Some(now.date_naive());
        self.down_payment_transaction_id = Some(receipt.transaction_id);
        self.recompute_status();
        self.touch(now);
        Ok(())
    }

    /// Records payment of one installment
    ///
    /// # Errors
    ///
    /// - `NotPending` if the investment is cancelled
    /// - `InstallmentNotFound` if no installment has this id
    /// - `AlreadyPaid` if the installment was already paid
    /// - `DownPaymentOutstanding` if the down payment is still unpaid
    /// - `AmountMismatch` if the receipt carries a different amount
    pub fn pay_installment(
        &mut self,
        installment_id: InstallmentId,
        receipt: PaymentReceipt,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        if self.is_cancelled() {
            return Err(LedgerError::NotPending { status: self.status });
        }
        let index = self
            .installments
            .iter()
            .position(|i| i.id() == installment_id)
            .ok_or(LedgerError::InstallmentNotFound(installment_id))?;
        let installment = &self.installments[index];
        if installment.is_paid() {
            return Err(LedgerError::AlreadyPaid(format!(
                "Installment {}",
                installment.installment_number()
            )));
        }
        if !self.down_payment_paid {
            return Err(LedgerError::DownPaymentOutstanding);
        }
        receipt.check(installment.amount())?;

        self.installments[index].mark_paid(receipt.transaction_id, now.date_naive());
        self.recompute_status();
        self.touch(now);
        Ok(())
    }

    /// Generates the installment schedule starting at `first_date`
    ///
    /// Returns `Ok(false)` without changes when the schedule already exists.
    ///
    /// # Errors
    ///
    /// Returns `NotPending` unless the investment is Pending
    pub fn activate_schedule(&mut self, first_date: NaiveDate, now: DateTime<Utc>) -> Result<bool, LedgerError> {
        if self.is_schedule_activated() {
            return Ok(false);
        }
        if self.status != InvestmentStatus::Pending {
            return Err(LedgerError::NotPending { status: self.status });
        }
        self.generate_schedule(first_date)?;
        self.recompute_status();
        self.touch(now);
        Ok(true)
    }

    /// Cancels an unpaid Pending investment
    ///
    /// The caller must release the reserved shares in the same atomic unit.
    ///
    /// # Errors
    ///
    /// - `PaymentsAlreadyMade` if anything has been paid
    /// - `NotPending` if the investment is not Pending
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), LedgerError> {
        if self.down_payment_paid || self.paid_installments_count() > 0 {
            return Err(LedgerError::PaymentsAlreadyMade);
        }
        if self.status != InvestmentStatus::Pending {
            return Err(LedgerError::NotPending { status: self.status });
        }
        for installment in &mut self.installments {
            installment.mark_cancelled();
        }
        self.status = InvestmentStatus::Cancelled;
        self.cancelled_at = Some(now);
        self.touch(now);
        Ok(())
    }

    fn generate_schedule(&mut self, first_date: NaiveDate) -> Result<(), LedgerError> {
        let rows = generate_installment_schedule(
            first_date,
            self.installment_amount,
            self.number_of_installments,
            self.installment_frequency,
        )?;
        self.installments = rows.iter().map(Installment::from_schedule).collect();
        self.first_installment_date = Some(first_date);
        Ok(())
    }

    fn recompute_status(&mut self) {
        if self.is_cancelled() {
            return;
        }
        let scheduled = self.is_schedule_activated();
        self.status = if !self.down_payment_paid || !scheduled {
            InvestmentStatus::Pending
        } else if self.installments.iter().all(|i| i.is_paid()) {
            InvestmentStatus::Completed
        } else {
            InvestmentStatus::Active
        };
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.updated_at = now;
    }
}
