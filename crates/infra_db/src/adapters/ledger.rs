//! PostgreSQL Ledger Store
//!
//! Implements the `LedgerStore` port on top of the ledger repository.
//!
//! # Atomic Units
//!
//! `reserve_and_record` and `cancel_and_release` each run in one transaction
//! that starts by locking the property row (`SELECT ... FOR UPDATE`), so all
//! inventory changes for a property are serialized. The share decrement is a
//! guarded `UPDATE` whose `rows_affected` is checked before the investment is
//! inserted; any error rolls the whole transaction back.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PgLedgerStore};
//!
//! let pool = create_pool(DatabaseConfig::new(url)).await?;
//! run_migrations(&pool).await?;
//! let store: Arc<dyn LedgerStore> = Arc::new(PgLedgerStore::new(pool));
//! ```

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    DomainPort, HealthCheckResult, HealthCheckable, InvestmentId, PortError, PropertyId,
};
use domain_investment::{apply_reservation, Investment, InvestmentQuery, LedgerError, LedgerStore};
use domain_property::{release, Property};

use crate::error::DatabaseError;
use crate::repositories::ledger::{self as repo, InvestmentRow, PropertyRow};

/// PostgreSQL-backed implementation of [`LedgerStore`]
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn store_error(error: DatabaseError) -> LedgerError {
    LedgerError::from(PortError::from(error))
}

fn version(value: u64) -> Result<i64, DatabaseError> {
    i64::try_from(value)
        .map_err(|_| DatabaseError::SerializationError(format!("version {} out of range", value)))
}

impl DomainPort for PgLedgerStore {}

#[async_trait]
impl HealthCheckable for PgLedgerStore {
    /// Runs `SELECT 1` against the pool
    async fn health_check(&self) -> HealthCheckResult {
        let start = std::time::Instant::now();
        let result = sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(_) => HealthCheckResult::healthy("postgres-ledger-store", latency_ms),
            Err(e) => HealthCheckResult::unhealthy(
                "postgres-ledger-store",
                format!("Database error: {}", e),
            ),
        }
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    #[instrument(skip(self, property), fields(property_id = %property.id()))]
    async fn insert_property(&self, property: &Property) -> Result<(), PortError> {
        let row = PropertyRow::from_domain(property)?;
        repo::insert_property(&self.pool, &row).await?;
        Ok(())
    }

    async fn get_property(&self, id: PropertyId) -> Result<Property, PortError> {
        let row = repo::fetch_property(&self.pool, *id.as_uuid())
            .await?
            .ok_or_else(|| DatabaseError::not_found("Property", id))?;
        Ok(row.into_domain()?)
    }

    #[instrument(skip(self, property), fields(property_id = %property.id()))]
    async fn update_property(&self, property: &Property, expected_version: u64) -> Result<(), PortError> {
        let row = PropertyRow::from_domain(property)?;
        if repo::update_property(&self.pool, &row, version(expected_version)?).await? {
            return Ok(());
        }
        match repo::fetch_property(&self.pool, row.property_id).await? {
            Some(_) => Err(PortError::version_conflict("Property", property.id(), expected_version)),
            None => Err(PortError::not_found("Property", property.id())),
        }
    }

    async fn get_investment(&self, id: InvestmentId) -> Result<Investment, PortError> {
        let row = repo::fetch_investment(&self.pool, *id.as_uuid())
            .await?
            .ok_or_else(|| DatabaseError::not_found("Investment", id))?;
        Ok(row.into_domain()?)
    }

    async fn list_investments(&self, query: InvestmentQuery) -> Result<Vec<Investment>, PortError> {
        let rows = repo::list_investments(&self.pool, &query).await?;
        debug!(count = rows.len(), "Investments listed");
        rows.into_iter()
            .map(|row| row.into_domain().map_err(PortError::from))
            .collect()
    }

    #[instrument(skip(self, investment), fields(investment_id = %investment.id()))]
    async fn update_investment(&self, investment: &Investment, expected_version: u64) -> Result<(), PortError> {
        let row = InvestmentRow::from_domain(investment)?;
        if repo::update_investment(&self.pool, &row, version(expected_version)?).await? {
            return Ok(());
        }
        match repo::fetch_investment(&self.pool, row.investment_id).await? {
            Some(_) => Err(PortError::version_conflict(
                "Investment",
                investment.id(),
                expected_version,
            )),
            None => Err(PortError::not_found("Investment", investment.id())),
        }
    }

    #[instrument(skip(self, investment), fields(investment_id = %investment.id(), property_id = %investment.property_id()))]
    async fn reserve_and_record(&self, investment: &Investment) -> Result<Property, LedgerError> {
        let property_id = investment.property_id();
        let mut tx = self.pool.begin().await.map_err(|e| store_error(e.into()))?;

        let mut property = repo::lock_property(&mut *tx, *property_id.as_uuid())
            .await
            .map_err(store_error)?
            .ok_or(LedgerError::PropertyNotFound(property_id))?
            .into_domain()
            .map_err(store_error)?;
        if !property.is_active() {
            return Err(LedgerError::PropertyNotFound(property_id));
        }

        let existing = repo::active_user_shares(
            &mut *tx,
            *investment.user_id().as_uuid(),
            *property_id.as_uuid(),
        )
        .await
        .map_err(store_error)?;

        apply_reservation(&mut property, investment, existing)?;

        let property_row = PropertyRow::from_domain(&property).map_err(store_error)?;
        let investment_row = InvestmentRow::from_domain(investment).map_err(store_error)?;
        if !repo::take_shares(&mut *tx, &property_row, investment_row.shares_invested)
            .await
            .map_err(store_error)?
        {
            return Err(LedgerError::concurrent("Property", property_id));
        }

        repo::insert_investment(&mut *tx, &investment_row)
            .await
            .map_err(store_error)?;

        tx.commit().await.map_err(|e| store_error(e.into()))?;
        debug!(available = property.available_shares(), "Reservation recorded");
        Ok(property)
    }

    #[instrument(skip(self, investment), fields(investment_id = %investment.id()))]
    async fn cancel_and_release(
        &self,
        investment: &Investment,
        expected_version: u64,
    ) -> Result<Property, LedgerError> {
        if !investment.is_cancelled() {
            return Err(LedgerError::validation("only a cancelled investment can release shares"));
        }
        let property_id = investment.property_id();
        let mut tx = self.pool.begin().await.map_err(|e| store_error(e.into()))?;

        let mut property = repo::lock_property(&mut *tx, *property_id.as_uuid())
            .await
            .map_err(store_error)?
            .ok_or(LedgerError::PropertyNotFound(property_id))?
            .into_domain()
            .map_err(store_error)?;
        let property_version = property.version();

        let investment_row = InvestmentRow::from_domain(investment).map_err(store_error)?;
        let expected = version(expected_version).map_err(store_error)?;
        if !repo::update_investment(&mut *tx, &investment_row, expected)
            .await
            .map_err(store_error)?
        {
            return Err(LedgerError::concurrent("Investment", investment.id()));
        }

        release(
            &mut property,
            investment.shares_invested(),
            investment.total_investment(),
            investment.cancelled_at().unwrap_or(investment.updated_at()),
        )?;
        let property_row = PropertyRow::from_domain(&property).map_err(store_error)?;
        let expected = version(property_version).map_err(store_error)?;
        if !repo::update_property(&mut *tx, &property_row, expected)
            .await
            .map_err(store_error)?
        {
            return Err(LedgerError::concurrent("Property", property_id));
        }

        tx.commit().await.map_err(|e| store_error(e.into()))?;
        debug!(available = property.available_shares(), "Shares released");
        Ok(property)
    }
}
