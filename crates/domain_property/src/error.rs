//! Property domain errors

use core_kernel::{MoneyError, PropertyId, TemporalError};
use thiserror::Error;

use crate::property::PropertyStatus;

/// Errors raised while registering or changing a property
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PropertyError {
    /// Input failed validation; nothing was changed
    #[error("Validation error: {0}")]
    Validation(String),

    /// Requested lifecycle transition is not allowed
    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition {
        from: PropertyStatus,
        to: PropertyStatus,
    },

    #[error("Calculation error: {0}")]
    Calculation(String),
}

impl PropertyError {
    /// Creates a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        PropertyError::Validation(message.into())
    }
}

impl From<MoneyError> for PropertyError {
    fn from(err: MoneyError) -> Self {
        PropertyError::Calculation(err.to_string())
    }
}

impl From<TemporalError> for PropertyError {
    fn from(err: TemporalError) -> Self {
        PropertyError::Calculation(err.to_string())
    }
}

/// Errors raised by share inventory checks and mutations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error("Share quantity must be at least 1")]
    InvalidQuantity,

    /// Property is inactive or not in the Available status
    #[error("Property {property_id} is not open for investment (status: {status})")]
    NotInvestable {
        property_id: PropertyId,
        status: PropertyStatus,
    },

    #[error("Insufficient shares: requested {requested}, available {available}")]
    InsufficientShares {
        requested: u32,
        available: u32,
    },

    #[error("Per-user cap exceeded: cap {cap}, already held {held}, requested {requested}")]
    PerUserCapExceeded {
        cap: u32,
        held: u32,
        requested: u32,
    },

    #[error(transparent)]
    Money(#[from] MoneyError),
}
