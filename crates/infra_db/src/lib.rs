//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the share ledger using SQLx.
//!
//! # Architecture
//!
//! - **Repositories**: row types and runtime-checked SQL
//! - **Adapters**: `PgLedgerStore`, the `LedgerStore` port implementation
//!
//! Properties and investments are stored as JSONB documents alongside the
//! indexed columns (`status`, `user_id`, `property_id`, `available_shares`,
//! `version`) that lookups and guarded updates need.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PgLedgerStore};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/share_ledger")).await?;
//! run_migrations(&pool).await?;
//! let store = PgLedgerStore::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{create_pool, run_migrations, DatabaseConfig, DatabasePool};
pub use error::DatabaseError;
pub use adapters::PgLedgerStore;
