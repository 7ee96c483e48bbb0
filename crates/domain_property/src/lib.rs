//! Property Domain
//!
//! This crate models the investable side of the share ledger: properties
//! sold as a fixed number of equal shares, the arithmetic that turns a
//! property's financial terms into per-share amounts and installment
//! schedules, and the share inventory that guards against overselling.
//!
//! # Key Concepts
//!
//! - **Property**: A Single unit, a multi-year Project or a Bundle of units
//! - **Share Terms**: Per-share price, down payment and installment amount
//! - **Share Inventory**: `available_shares` and `total_invested`, mutated only
//!   through [`inventory::reserve`] and [`inventory::release`]
//!
//! # Worked Example
//!
//! - Price: 1,000,000 over 100 shares
//! - Advancement: 20%, 10 installments
//! - Share price 10,000, down payment 2,000, installment 800

pub mod property;
pub mod calculator;
pub mod inventory;
pub mod error;

pub use property::{NewProperty, Property, PropertyStatus, PropertyType, TermsUpdate};
pub use calculator::{
    compute_share_terms, generate_installment_schedule, InstallmentFrequency,
    ScheduledInstallment, ShareTerms,
};
pub use inventory::{can_reserve, release, reserve};
pub use error::{InventoryError, PropertyError};
