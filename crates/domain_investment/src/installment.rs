//! Installments owned by an investment

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{InstallmentId, Money};
use domain_property::ScheduledInstallment;

/// Installment lifecycle status
///
/// `Overdue` is a read-time classification of a Pending installment whose due
/// date has passed. It is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstallmentStatus {
    Pending,
    Paid,
    Overdue,
    Cancelled,
}

impl InstallmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstallmentStatus::Pending => "pending",
            InstallmentStatus::Paid => "paid",
            InstallmentStatus::Overdue => "overdue",
            InstallmentStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One scheduled payment of an investment
///
/// Once paid the record never changes again.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    id: InstallmentId,
    installment_number: u32,
    amount: Money,
    due_date: NaiveDate,
    status: InstallmentStatus,
    paid_date: Option<NaiveDate>,
    transaction_id: Option<String>,
}

impl Installment {
    pub(crate) fn from_schedule(row: &ScheduledInstallment) -> Self {
        Self {
            id: InstallmentId::new_v7(),
            installment_number: row.installment_number,
            amount: row.amount,
            due_date: row.due_date,
            status: InstallmentStatus::Pending,
            paid_date: None,
            transaction_id: None,
        }
    }

    pub fn id(&self) -> InstallmentId {
        self.id
    }

    pub fn installment_number(&self) -> u32 {
        self.installment_number
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    /// Stored status; never `Overdue`
    pub fn status(&self) -> InstallmentStatus {
        self.status
    }

    pub fn paid_date(&self) -> Option<NaiveDate> {
        self.paid_date
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    pub fn is_paid(&self) -> bool {
        self.status == InstallmentStatus::Paid
    }

    pub fn is_pending(&self) -> bool {
        self.status == InstallmentStatus::Pending
    }

    /// Pending and due strictly before `today`
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.is_pending() && self.due_date < today
    }

    /// Status as seen on `today`, with Overdue derived from the due date
    pub fn status_on(&self, today: NaiveDate) -> InstallmentStatus {
        if self.is_overdue(today) {
            InstallmentStatus::Overdue
        } else {
            self.status
        }
    }

    pub(crate) fn mark_paid(&mut self, transaction_id: String, paid_date: NaiveDate) {
        self.status = InstallmentStatus::Paid;
        self.paid_date = Some(paid_date);
        self.transaction_id = Some(transaction_id);
    }

    pub(crate) fn mark_cancelled(&mut self) {
        if self.is_pending() {
            self.status = InstallmentStatus::Cancelled;
        }
    }
}
