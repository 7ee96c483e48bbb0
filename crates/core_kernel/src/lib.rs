//! Core Kernel - Foundational types for the share ledger
//!
//! This crate provides the building blocks shared by every ledger crate:
//! - Money types with precise decimal arithmetic and half-up rounding
//! - Calendar arithmetic for installment due dates and an injectable clock
//! - Strongly-typed identifiers
//! - Port abstractions for persistence adapters

pub mod money;
pub mod temporal;
pub mod identifiers;
pub mod ports;

pub use money::{Money, Currency, MoneyError, Rate};
pub use temporal::{add_months, Clock, DateRange, FixedClock, SystemClock, TemporalError};
pub use identifiers::{PropertyId, InvestmentId, InstallmentId, UserId};
pub use ports::{PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth};
