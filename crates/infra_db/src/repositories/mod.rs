//! Repositories: row types and SQL, one module per table group

pub mod ledger;

pub use ledger::{InvestmentRow, PropertyRow};
