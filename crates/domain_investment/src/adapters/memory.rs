//! In-memory ledger store
//!
//! All state sits behind one `tokio::sync::RwLock`. Both atomic units run
//! entirely under the write guard, which serializes them per property (and
//! across properties) and makes their effects visible to readers at once.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use core_kernel::{
    DomainPort, HealthCheckResult, HealthCheckable, InvestmentId, PortError, PropertyId,
};
use domain_property::{release, Property};

use crate::error::LedgerError;
use crate::investment::Investment;
use crate::ports::{InvestmentQuery, LedgerStore};
use crate::reservation::{active_user_shares, apply_reservation};

#[derive(Debug, Default)]
struct LedgerState {
    properties: HashMap<PropertyId, Property>,
    investments: HashMap<InvestmentId, Investment>,
}

/// In-memory implementation of [`LedgerStore`]
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: RwLock<LedgerState>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored investments, cancelled ones included
    pub async fn investment_count(&self) -> usize {
        self.state.read().await.investments.len()
    }
}

impl DomainPort for InMemoryLedgerStore {}

#[async_trait]
impl HealthCheckable for InMemoryLedgerStore {
    async fn health_check(&self) -> HealthCheckResult {
        let mut result = HealthCheckResult::healthy("memory-ledger-store", 0);
        result.message = Some("In-memory store always healthy".to_string());
        result
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn insert_property(&self, property: &Property) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        if state.properties.contains_key(&property.id()) {
            return Err(PortError::conflict(format!(
                "Property {} already exists",
                property.id()
            )));
        }
        state.properties.insert(property.id(), property.clone());
        Ok(())
    }

    async fn get_property(&self, id: PropertyId) -> Result<Property, PortError> {
        self.state
            .read()
            .await
            .properties
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Property", id))
    }

    async fn update_property(&self, property: &Property, expected_version: u64) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        let stored = state
            .properties
            .get_mut(&property.id())
            .ok_or_else(|| PortError::not_found("Property", property.id()))?;
        if stored.version() != expected_version {
            return Err(PortError::version_conflict("Property", property.id(), expected_version));
        }
        *stored = property.clone();
        Ok(())
    }

    async fn get_investment(&self, id: InvestmentId) -> Result<Investment, PortError> {
        self.state
            .read()
            .await
            .investments
            .get(&id)
            .cloned()
            .ok_or_else(|| PortError::not_found("Investment", id))
    }

    async fn list_investments(&self, query: InvestmentQuery) -> Result<Vec<Investment>, PortError> {
        let state = self.state.read().await;
        let mut results: Vec<Investment> = state
            .investments
            .values()
            .filter(|inv| query.matches(inv))
            .cloned()
            .collect();
        results.sort_by(|a, b| a.created_at().cmp(&b.created_at()).then(a.id().cmp(&b.id())));
        Ok(results)
    }

    async fn update_investment(&self, investment: &Investment, expected_version: u64) -> Result<(), PortError> {
        let mut state = self.state.write().await;
        let stored = state
            .investments
            .get_mut(&investment.id())
            .ok_or_else(|| PortError::not_found("Investment", investment.id()))?;
        if stored.version() != expected_version {
            return Err(PortError::version_conflict(
                "Investment",
                investment.id(),
                expected_version,
            ));
        }
        *stored = investment.clone();
        Ok(())
    }

    async fn reserve_and_record(&self, investment: &Investment) -> Result<Property, LedgerError> {
        let mut state = self.state.write().await;
        if state.investments.contains_key(&investment.id()) {
            return Err(LedgerError::Store(PortError::conflict(format!(
                "Investment {} already exists",
                investment.id()
            ))));
        }

        let existing = active_user_shares(
            state.investments.values(),
            investment.user_id(),
            investment.property_id(),
        );
        let mut property = state
            .properties
            .get(&investment.property_id())
            .filter(|p| p.is_active())
            .cloned()
            .ok_or(LedgerError::PropertyNotFound(investment.property_id()))?;

        apply_reservation(&mut property, investment, existing)?;

        state.properties.insert(property.id(), property.clone());
        state.investments.insert(investment.id(), investment.clone());
        debug!(
            investment_id = %investment.id(),
            property_id = %property.id(),
            available = property.available_shares(),
            "Reservation recorded"
        );
        Ok(property)
    }

    async fn cancel_and_release(
        &self,
        investment: &Investment,
        expected_version: u64,
    ) -> Result<Property, LedgerError> {
        if !investment.is_cancelled() {
            return Err(LedgerError::validation("only a cancelled investment can release shares"));
        }
        let mut state = self.state.write().await;
        let stored_version = state
            .investments
            .get(&investment.id())
            .map(|inv| inv.version())
            .ok_or(LedgerError::InvestmentNotFound(investment.id()))?;
        if stored_version != expected_version {
            return Err(LedgerError::concurrent("Investment", investment.id()));
        }

        let mut property = state
            .properties
            .get(&investment.property_id())
            .cloned()
            .ok_or(LedgerError::PropertyNotFound(investment.property_id()))?;
        release(
            &mut property,
            investment.shares_invested(),
            investment.total_investment(),
            investment.cancelled_at().unwrap_or(investment.updated_at()),
        )?;

        state.properties.insert(property.id(), property.clone());
        state.investments.insert(investment.id(), investment.clone());
        Ok(property)
    }
}
