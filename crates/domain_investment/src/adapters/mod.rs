//! Store adapters that live alongside the domain
//!
//! - **InMemoryLedgerStore**: single-process store for tests and for running
//!   the API without a database
//!
//! The PostgreSQL adapter lives in `infra_db`.

pub mod memory;

pub use memory::InMemoryLedgerStore;
