//! Investment Ledger Domain
//!
//! This crate records users' share purchases, their down payments and
//! installment schedules, and the orchestration that keeps a property's
//! share inventory consistent under concurrent requests.
//!
//! # Architecture
//!
//! - **Entities**: `Investment` owns its `Installment`s
//! - **Ports**: `LedgerStore` with two atomic units (reserve and cancel)
//! - **Services**: `InvestmentService` for writes, `PaymentScheduleService`
//!   for the read-only schedule view
//!
//! # Investment Lifecycle
//!
//! ```text
//! Pending -> Active -> Completed
//!        \-> Cancelled
//! ```
//!
//! An investment becomes Active once its down payment is paid and its
//! schedule has started, and Completed once every installment is paid.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_investment::{InMemoryLedgerStore, InvestmentService, PaymentReceipt};
//!
//! let service = InvestmentService::new(Arc::new(InMemoryLedgerStore::new()), clock);
//! let investment = service.create_investment(user_id, property_id, 2).await?;
//! service
//!     .pay_down_payment(user_id, investment.id(), PaymentReceipt::new("txn-001"))
//!     .await?;
//! ```

pub mod error;
pub mod installment;
pub mod investment;
pub mod totals;
pub mod reservation;
pub mod ports;
pub mod adapters;
pub mod schedule;
pub mod services;

pub use error::LedgerError;
pub use installment::{Installment, InstallmentStatus};
pub use investment::{Investment, InvestmentStatus, PaymentReceipt};
pub use totals::CurrencyTotals;
pub use reservation::{active_user_shares, apply_reservation};
pub use ports::{InvestmentQuery, LedgerStore};
pub use adapters::InMemoryLedgerStore;
pub use schedule::{
    build_schedule, PaymentSchedule, PaymentScheduleService, ScheduleFilter, ScheduleLine,
    ScheduleLineKind, ScheduleSummary,
};
pub use services::{ActivationFailure, ActivationReport, InvestmentService, PortfolioSummary};
