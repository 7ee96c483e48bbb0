//! Port adapters backed by PostgreSQL

pub mod ledger;

pub use ledger::PgLedgerStore;
