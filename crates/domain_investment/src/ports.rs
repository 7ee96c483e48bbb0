//! Ledger Ports
//!
//! The persistence interface the ledger needs. Adapters:
//!
//! - **In-memory** ([`crate::adapters::memory`]): a single process, used by
//!   tests and by the API when no database is configured
//! - **PostgreSQL** (`infra_db`): row locks and guarded updates
//!
//! # Atomic Units
//!
//! Two operations touch a property and an investment together and must be
//! all-or-nothing:
//!
//! - [`LedgerStore::reserve_and_record`]: take shares and write the new investment
//! - [`LedgerStore::cancel_and_release`]: write the cancelled investment and
//!   return its shares
//!
//! Every other write is a compare-and-swap on the record's `version`.
//!
//! # Usage
//!
//! ```rust,ignore
//! let store: Arc<dyn LedgerStore> = match config.database_url {
//!     Some(url) => Arc::new(PgLedgerStore::new(create_pool(&url).await?)),
//!     None => Arc::new(InMemoryLedgerStore::new()),
//! };
//! ```

use async_trait::async_trait;

use core_kernel::{DomainPort, HealthCheckable, InvestmentId, PortError, PropertyId, UserId};
use domain_property::Property;

use crate::error::LedgerError;
use crate::investment::{Investment, InvestmentStatus};

/// Filter for listing investments
#[derive(Debug, Clone, Default)]
pub struct InvestmentQuery {
    pub user_id: Option<UserId>,
    pub property_id: Option<PropertyId>,
    /// Statuses to include; empty means all
    pub statuses: Vec<InvestmentStatus>,
}

impl InvestmentQuery {
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            user_id: Some(user_id),
            ..Default::default()
        }
    }

    pub fn for_property(property_id: PropertyId) -> Self {
        Self {
            property_id: Some(property_id),
            ..Default::default()
        }
    }

    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = InvestmentStatus>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    /// Restricts to Pending and Active investments
    pub fn open_only(self) -> Self {
        self.with_statuses([InvestmentStatus::Pending, InvestmentStatus::Active])
    }

    pub fn matches(&self, investment: &Investment) -> bool {
        self.user_id.map_or(true, |id| investment.user_id() == id)
            && self.property_id.map_or(true, |id| investment.property_id() == id)
            && (self.statuses.is_empty() || self.statuses.contains(&investment.status()))
    }
}

/// Persistence port for properties and investments
///
/// Results of `list_investments` are ordered by creation time, oldest first.
#[async_trait]
pub trait LedgerStore: DomainPort + HealthCheckable {
    // ========================================================================
    // Properties
    // ========================================================================

    async fn insert_property(&self, property: &Property) -> Result<(), PortError>;

    /// Loads a property, active or not
    async fn get_property(&self, id: PropertyId) -> Result<Property, PortError>;

    /// Writes `property` if the stored version still equals `expected_version`
    ///
    /// # Errors
    ///
    /// `PortError::VersionConflict` when another writer got there first
    async fn update_property(&self, property: &Property, expected_version: u64) -> Result<(), PortError>;

    // ========================================================================
    // Investments
    // ========================================================================

    async fn get_investment(&self, id: InvestmentId) -> Result<Investment, PortError>;

    async fn list_investments(&self, query: InvestmentQuery) -> Result<Vec<Investment>, PortError>;

    /// Writes `investment` if the stored version still equals `expected_version`
    ///
    /// # Errors
    ///
    /// `PortError::VersionConflict` when another writer got there first
    async fn update_investment(&self, investment: &Investment, expected_version: u64) -> Result<(), PortError>;

    // ========================================================================
    // Atomic units
    // ========================================================================

    /// Reserves the investment's shares and records the investment as one unit
    ///
    /// Serialized per property. The store reloads the property and the user's
    /// active shares, then applies [`crate::reservation::apply_reservation`].
    /// Returns the property as updated.
    ///
    /// # Errors
    ///
    /// `PropertyNotFound`, any reservation error, or `Store` on I/O failure.
    /// Nothing is written on error.
    async fn reserve_and_record(&self, investment: &Investment) -> Result<Property, LedgerError>;

    /// Persists a cancelled investment and releases its shares as one unit
    ///
    /// Returns the property as updated.
    ///
    /// # Errors
    ///
    /// `ConcurrentModification` if the stored investment version differs from
    /// `expected_version`; nothing is written on error
    async fn cancel_and_release(
        &self,
        investment: &Investment,
        expected_version: u64,
    ) -> Result<Property, LedgerError>;
}
