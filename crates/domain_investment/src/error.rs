//! Investment ledger errors
//!
//! Every failure a ledger operation can report. Validation runs before any
//! mutation, so an error means nothing was persisted.

use thiserror::Error;

use core_kernel::{InstallmentId, InvestmentId, Money, MoneyError, PortError, PropertyId, TemporalError};
use domain_property::{InventoryError, PropertyError, PropertyStatus};

use crate::investment::InvestmentStatus;

/// Errors that can occur in the investment ledger
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Property does not exist or has been deactivated
    #[error("Property not found: {0}")]
    PropertyNotFound(PropertyId),

    #[error("Property {property_id} is not open for investment (status: {status})")]
    PropertyNotInvestable {
        property_id: PropertyId,
        status: PropertyStatus,
    },

    #[error("Insufficient shares: requested {requested}, available {available}")]
    InsufficientShares {
        requested: u32,
        available: u32,
    },

    #[error("Per-user share cap exceeded: cap {cap}, already held {held}, requested {requested}")]
    PerUserCapExceeded {
        cap: u32,
        held: u32,
        requested: u32,
    },

    /// The down payment or installment has already been settled
    #[error("{0} is already paid")]
    AlreadyPaid(String),

    #[error("Installment not found: {0}")]
    InstallmentNotFound(InstallmentId),

    #[error("Amount mismatch: expected {expected}, received {actual}")]
    AmountMismatch {
        expected: Money,
        actual: Money,
    },

    #[error("Investment cannot be cancelled after payments have been made")]
    PaymentsAlreadyMade,

    #[error("Investment is not pending (status: {status})")]
    NotPending {
        status: InvestmentStatus,
    },

    /// Installments cannot be paid before the down payment
    #[error("Down payment must be paid before installments")]
    DownPaymentOutstanding,

    /// A concurrent writer changed the record; the operation may be retried
    #[error("Concurrent modification of {entity} {id}")]
    ConcurrentModification {
        entity: String,
        id: String,
    },

    #[error("Investment not found: {0}")]
    InvestmentNotFound(InvestmentId),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: PropertyStatus,
        to: PropertyStatus,
    },

    #[error("Calculation error: {0}")]
    Calculation(String),

    #[error("Store error: {0}")]
    Store(#[source] PortError),
}

impl LedgerError {
    /// Creates a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        LedgerError::Validation(message.into())
    }

    /// Creates a concurrent modification error
    pub fn concurrent(entity: impl Into<String>, id: impl std::fmt::Display) -> Self {
        LedgerError::ConcurrentModification {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Returns true if repeating the operation against fresh state may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            LedgerError::ConcurrentModification { .. } => true,
            LedgerError::Store(err) => err.is_transient(),
            _ => false,
        }
    }

    /// Returns a stable machine-readable code for this error kind
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::PropertyNotFound(_) => "PROPERTY_NOT_FOUND",
            LedgerError::PropertyNotInvestable { .. } => "PROPERTY_NOT_INVESTABLE",
            LedgerError::InsufficientShares { .. } => "INSUFFICIENT_SHARES",
            LedgerError::PerUserCapExceeded { .. } => "PER_USER_CAP_EXCEEDED",
            LedgerError::AlreadyPaid(_) => "ALREADY_PAID",
            LedgerError::InstallmentNotFound(_) => "INSTALLMENT_NOT_FOUND",
            LedgerError::AmountMismatch { .. } => "AMOUNT_MISMATCH",
            LedgerError::PaymentsAlreadyMade => "PAYMENTS_ALREADY_MADE",
            LedgerError::NotPending { .. } => "NOT_PENDING",
            LedgerError::DownPaymentOutstanding => "DOWN_PAYMENT_OUTSTANDING",
            LedgerError::ConcurrentModification { .. } => "CONCURRENT_MODIFICATION",
            LedgerError::InvestmentNotFound(_) => "INVESTMENT_NOT_FOUND",
            LedgerError::Validation(_) => "VALIDATION_ERROR",
            LedgerError::InvalidStatusTransition { .. } => "INVALID_STATUS_TRANSITION",
            LedgerError::Calculation(_) => "CALCULATION_ERROR",
            LedgerError::Store(_) => "STORE_ERROR",
        }
    }
}

impl From<InventoryError> for LedgerError {
    fn from(err: InventoryError) -> Self {
        match err {
            InventoryError::InvalidQuantity => {
                LedgerError::validation("shares requested must be at least 1")
            }
            InventoryError::NotInvestable { property_id, status } => {
                LedgerError::PropertyNotInvestable { property_id, status }
            }
            InventoryError::InsufficientShares { requested, available } => {
                LedgerError::InsufficientShares { requested, available }
            }
            InventoryError::PerUserCapExceeded { cap, held, requested } => {
                LedgerError::PerUserCapExceeded { cap, held, requested }
            }
            InventoryError::Money(err) => LedgerError::Calculation(err.to_string()),
        }
    }
}

impl From<PropertyError> for LedgerError {
    fn from(err: PropertyError) -> Self {
        match err {
            PropertyError::Validation(message) => LedgerError::Validation(message),
            PropertyError::InvalidStatusTransition { from, to } => {
                LedgerError::InvalidStatusTransition { from, to }
            }
            PropertyError::Calculation(message) => LedgerError::Calculation(message),
        }
    }
}

impl From<PortError> for LedgerError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::VersionConflict { entity_type, id, .. } => {
                LedgerError::ConcurrentModification { entity: entity_type, id }
            }
            other => LedgerError::Store(other),
        }
    }
}

impl From<MoneyError> for LedgerError {
    fn from(err: MoneyError) -> Self {
        LedgerError::Calculation(err.to_string())
    }
}

impl From<TemporalError> for LedgerError {
    fn from(err: TemporalError) -> Self {
        LedgerError::Calculation(err.to_string())
    }
}
