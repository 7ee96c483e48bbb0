//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! share ledger test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built test data for common entities
//! - `builders`: Builder patterns for properties and in-memory ledgers
//! - `assertions`: Ledger invariant checks with readable failure messages
//! - `generators`: Property-based test data generators
//! - `database`: PostgreSQL test containers with the ledger schema

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;
pub mod database;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
