//! Investment orchestration
//!
//! `InvestmentService` is the entry point for every ledger write. It
//! validates against a snapshot of the property, prices the investment,
//! hands the atomic reservation to the store, and starts installment
//! schedules once a property is funded.
//!
//! A `ConcurrentModification` from the store is retried once against fresh
//! state before it is returned to the caller.

use std::future::Future;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use core_kernel::{Clock, InstallmentId, InvestmentId, PropertyId, UserId};
use domain_property::{can_reserve, NewProperty, Property, PropertyStatus, PropertyType, TermsUpdate};

use crate::error::LedgerError;
use crate::investment::{Investment, InvestmentStatus, PaymentReceipt};
use crate::ports::{InvestmentQuery, LedgerStore};
use crate::reservation::active_user_shares;
use crate::totals::CurrencyTotals;

/// Result of one schedule activation batch
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationReport {
    pub property_id: PropertyId,
    /// First installment date given to every investment in the batch
    pub basis_date: NaiveDate,
    pub activated: Vec<InvestmentId>,
    /// Already activated by an earlier or concurrent run
    pub skipped: Vec<InvestmentId>,
    pub failed: Vec<ActivationFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivationFailure {
    pub investment_id: InvestmentId,
    pub reason: String,
}

/// Totals across a user's investments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioSummary {
    pub user_id: UserId,
    /// Non-cancelled investments
    pub investment_count: usize,
    pub pending_count: usize,
    pub active_count: usize,
    pub completed_count: usize,
    pub property_count: usize,
    pub total_shares: u32,
    pub total_invested: CurrencyTotals,
    pub total_paid: CurrencyTotals,
    pub total_remaining: CurrencyTotals,
}

/// Runs `operation`, and once more if it fails with `ConcurrentModification`
async fn retry_once<T, F, Fut>(operation: &'static str, mut attempt: F) -> Result<T, LedgerError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LedgerError>>,
{
    match attempt().await {
        Err(err @ LedgerError::ConcurrentModification { .. }) => {
            debug!(operation, error = %err, "Retrying after concurrent modification");
            attempt().await
        }
        other => other,
    }
}

/// Orchestrates property registration, reservations, payments and
/// schedule activation
pub struct InvestmentService {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
}

impl InvestmentService {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Registers a property with derived share terms and full inventory
    pub async fn register_property(&self, new: NewProperty) -> Result<Property, LedgerError> {
        let property = Property::register(new, self.clock.now())?;
        self.store.insert_property(&property).await?;
        info!(
            property_id = %property.id(),
            property_type = %property.property_type(),
            total_shares = property.total_shares(),
            share_price = %property.share_price(),
            "Property registered"
        );
        Ok(property)
    }

    /// Loads an active property
    pub async fn get_property(&self, property_id: PropertyId) -> Result<Property, LedgerError> {
        match self.store.get_property(property_id).await {
            Ok(property) if property.is_active() => Ok(property),
            Ok(_) => Err(LedgerError::PropertyNotFound(property_id)),
            Err(err) if err.is_not_found() => Err(LedgerError::PropertyNotFound(property_id)),
            Err(err) => Err(err.into()),
        }
    }

    /// Recomputes the property's per-share terms from new financial terms
    ///
    /// Investments already made keep the amounts they were priced at.
    pub async fn recompute_property_terms(
        &self,
        property_id: PropertyId,
        update: TermsUpdate,
    ) -> Result<Property, LedgerError> {
        retry_once("recompute_property_terms", move || {
            self.try_recompute_terms(property_id, update.clone())
        })
        .await
    }

    async fn try_recompute_terms(&self, property_id: PropertyId, update: TermsUpdate) -> Result<Property, LedgerError> {
        let mut property = self.get_property(property_id).await?;
        let expected = property.version();
        property.update_terms(update, self.clock.now())?;
        self.store.update_property(&property, expected).await?;
        info!(
            property_id = %property_id,
            share_price = %property.share_price(),
            share_down_payment = %property.share_down_payment(),
            share_installment_amount = %property.share_installment_amount(),
            "Property terms recomputed"
        );
        Ok(property)
    }

    /// Moves a funded property along Funded -> UnderConstruction -> Completed -> Exited
    pub async fn advance_property_status(
        &self,
        property_id: PropertyId,
        target: PropertyStatus,
    ) -> Result<Property, LedgerError> {
        retry_once("advance_property_status", move || {
            self.try_advance_status(property_id, target)
        })
        .await
    }

    async fn try_advance_status(&self, property_id: PropertyId, target: PropertyStatus) -> Result<Property, LedgerError> {
        let mut property = self.get_property(property_id).await?;
        let expected = property.version();
        property.advance_status(target, self.clock.now())?;
        self.store.update_property(&property, expected).await?;
        Ok(property)
    }

    // ========================================================================
    // Investments
    // ========================================================================

    /// Buys `shares` of a property for a user
    ///
    /// The schedule starts one period from today for Projects, and for
    /// Single/Bundle properties only when this purchase takes the last
    /// shares. Whenever a schedule starts or the property becomes Funded,
    /// every Pending investment on the property without a schedule is
    /// activated as well.
    ///
    /// # Errors
    ///
    /// `PropertyNotFound`, `PropertyNotInvestable`, `InsufficientShares`,
    /// `PerUserCapExceeded` or `Validation`, with nothing reserved
    pub async fn create_investment(
        &self,
        user_id: UserId,
        property_id: PropertyId,
        shares: u32,
    ) -> Result<Investment, LedgerError> {
        let (investment, property) = retry_once("create_investment", move || {
            self.try_create_investment(user_id, property_id, shares)
        })
        .await?;

        info!(
            investment_id = %investment.id(),
            user_id = %user_id,
            property_id = %property_id,
            shares,
            total_investment = %investment.total_investment(),
            available = property.available_shares(),
            "Investment created"
        );

        if investment.is_schedule_activated() || property.status() == PropertyStatus::Funded {
            match self.run_activation(&property).await {
                Ok(report) if report.activated.contains(&investment.id()) => {
                    return self.load_investment(investment.id()).await;
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(
                        property_id = %property_id,
                        error = %err,
                        "Schedule activation after reservation failed"
                    );
                }
            }
        }
        Ok(investment)
    }

    async fn try_create_investment(
        &self,
        user_id: UserId,
        property_id: PropertyId,
        shares: u32,
    ) -> Result<(Investment, Property), LedgerError> {
        let property = self.get_property(property_id).await?;
        let existing = active_user_shares(
            &self
                .store
                .list_investments(InvestmentQuery::for_property(property_id))
                .await?,
            user_id,
            property_id,
        );
        if let Err(err) = can_reserve(&property, shares, existing) {
            let err = LedgerError::from(err);
            warn!(
                user_id = %user_id,
                property_id = %property_id,
                shares,
                error = %err,
                "Investment rejected"
            );
            return Err(err);
        }

        let today = self.clock.today();
        let first_installment_date = match property.property_type() {
            PropertyType::Project => Some(self.basis_date(&property, today)?),
            PropertyType::Single | PropertyType::Bundle
                if shares == property.available_shares() =>
            {
                Some(self.basis_date(&property, today)?)
            }
            PropertyType::Single | PropertyType::Bundle => None,
        };

        let investment = Investment::open(
            user_id,
            &property,
            shares,
            first_installment_date,
            self.clock.now(),
        )?;
        let property = self.store.reserve_and_record(&investment).await?;
        Ok((investment, property))
    }

    /// Starts the schedule of every Pending, not yet activated investment on
    /// a funded property (or any Project)
    ///
    /// Each investment is activated and persisted on its own; a failure is
    /// logged and recorded in the report without stopping the batch. Safe to
    /// call repeatedly.
    pub async fn activate_property_schedules(&self, property_id: PropertyId) -> Result<ActivationReport, LedgerError> {
        let property = self.get_property(property_id).await?;
        if property.property_type() != PropertyType::Project && !property.is_fully_funded() {
            return Err(LedgerError::validation(format!(
                "property {} is not fully funded",
                property_id
            )));
        }
        self.run_activation(&property).await
    }

    async fn run_activation(&self, property: &Property) -> Result<ActivationReport, LedgerError> {
        let basis_date = self.basis_date(property, self.clock.today())?;
        let candidates = self
            .store
            .list_investments(
                InvestmentQuery::for_property(property.id())
                    .with_statuses([InvestmentStatus::Pending]),
            )
            .await?;

        let mut report = ActivationReport {
            property_id: property.id(),
            basis_date,
            activated: Vec::new(),
            skipped: Vec::new(),
            failed: Vec::new(),
        };

        for candidate in candidates {
            if candidate.is_schedule_activated() {
                continue;
            }
            let investment_id = candidate.id();
            match retry_once("activate_schedule", move || self.activate_one(investment_id, basis_date)).await {
                Ok(true) => report.activated.push(investment_id),
                Ok(false) => report.skipped.push(investment_id),
                Err(err) => {
                    warn!(
                        investment_id = %investment_id,
                        property_id = %property.id(),
                        error = %err,
                        "Schedule activation failed"
                    );
                    report.failed.push(ActivationFailure {
                        investment_id,
                        reason: err.to_string(),
                    });
                }
            }
        }

        info!(
            property_id = %property.id(),
            basis_date = %basis_date,
            activated = report.activated.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Schedule activation finished"
        );
        Ok(report)
    }

    async fn activate_one(&self, investment_id: InvestmentId, basis_date: NaiveDate) -> Result<bool, LedgerError> {
        let mut investment = self.load_investment(investment_id).await?;
        let expected = investment.version();
        if !investment.activate_schedule(basis_date, self.clock.now())? {
            return Ok(false);
        }
        self.store.update_investment(&investment, expected).await?;
        Ok(true)
    }

    /// Records the down payment of a user's investment
    pub async fn pay_down_payment(
        &self,
        user_id: UserId,
        investment_id: InvestmentId,
        receipt: PaymentReceipt,
    ) -> Result<Investment, LedgerError> {
        let transaction_id = receipt.transaction_id.clone();
        let investment = retry_once("pay_down_payment", move || {
            self.try_pay_down_payment(user_id, investment_id, receipt.clone())
        })
        .await?;

        info!(
            investment_id = %investment_id,
            transaction_id = %transaction_id,
            amount = %investment.down_payment(),
            status = %investment.status(),
            "Down payment recorded"
        );
        Ok(investment)
    }

    async fn try_pay_down_payment(
        &self,
        user_id: UserId,
        investment_id: InvestmentId,
        receipt: PaymentReceipt,
    ) -> Result<Investment, LedgerError> {
        let mut investment = self.get_investment(user_id, investment_id).await?;
        let expected = investment.version();
        investment.pay_down_payment(receipt, self.clock.now())?;
        self.store.update_investment(&investment, expected).await?;
        Ok(investment)
    }

    /// Records payment of one installment of a user's investment
    pub async fn pay_installment(
        &self,
        user_id: UserId,
        investment_id: InvestmentId,
        installment_id: InstallmentId,
        receipt: PaymentReceipt,
    ) -> Result<Investment, LedgerError> {
        let transaction_id = receipt.transaction_id.clone();
        let investment = retry_once("pay_installment", move || {
            self.try_pay_installment(user_id, investment_id, installment_id, receipt.clone())
        })
        .await?;

        info!(
            investment_id = %investment_id,
            installment_id = %installment_id,
            transaction_id = %transaction_id,
            status = %investment.status(),
            "Installment paid"
        );
        Ok(investment)
    }

    async fn try_pay_installment(
        &self,
        user_id: UserId,
        investment_id: InvestmentId,
        installment_id: InstallmentId,
        receipt: PaymentReceipt,
    ) -> Result<Investment, LedgerError> {
        let mut investment = self.get_investment(user_id, investment_id).await?;
        let expected = investment.version();
        investment.pay_installment(installment_id, receipt, self.clock.now())?;
        self.store.update_investment(&investment, expected).await?;
        Ok(investment)
    }

    /// Cancels an unpaid Pending investment and returns its shares
    pub async fn cancel_investment(&self, user_id: UserId, investment_id: InvestmentId) -> Result<Investment, LedgerError> {
        let (investment, property) = retry_once("cancel_investment", move || {
            self.try_cancel_investment(user_id, investment_id)
        })
        .await?;

        info!(
            investment_id = %investment_id,
            property_id = %property.id(),
            shares = investment.shares_invested(),
            available = property.available_shares(),
            "Investment cancelled"
        );
        Ok(investment)
    }

    async fn try_cancel_investment(
        &self,
        user_id: UserId,
        investment_id: InvestmentId,
    ) -> Result<(Investment, Property), LedgerError> {
        let mut investment = self.get_investment(user_id, investment_id).await?;
        let expected = investment.version();
        investment.cancel(self.clock.now())?;
        let property = self.store.cancel_and_release(&investment, expected).await?;
        Ok((investment, property))
    }

    /// Loads an investment owned by `user_id`
    ///
    /// Someone else's investment is reported as not found.
    pub async fn get_investment(&self, user_id: UserId, investment_id: InvestmentId) -> Result<Investment, LedgerError> {
        let investment = self.load_investment(investment_id).await?;
        if investment.user_id() != user_id {
            return Err(LedgerError::InvestmentNotFound(investment_id));
        }
        Ok(investment)
    }

    pub async fn list_user_investments(&self, user_id: UserId) -> Result<Vec<Investment>, LedgerError> {
        Ok(self
            .store
            .list_investments(InvestmentQuery::for_user(user_id))
            .await?)
    }

    pub async fn list_property_investments(&self, property_id: PropertyId) -> Result<Vec<Investment>, LedgerError> {
        self.get_property(property_id).await?;
        Ok(self
            .store
            .list_investments(InvestmentQuery::for_property(property_id))
            .await?)
    }

    /// Summarizes a user's non-cancelled investments
    pub async fn portfolio_summary(&self, user_id: UserId) -> Result<PortfolioSummary, LedgerError> {
        let investments: Vec<Investment> = self
            .list_user_investments(user_id)
            .await?
            .into_iter()
            .filter(|inv| !inv.is_cancelled())
            .collect();

        let mut properties: Vec<PropertyId> = investments.iter().map(|inv| inv.property_id()).collect();
        properties.sort();
        properties.dedup();

        let count = |status: InvestmentStatus| investments.iter().filter(|inv| inv.status() == status).count();

        Ok(PortfolioSummary {
            user_id,
            investment_count: investments.len(),
            pending_count: count(InvestmentStatus::Pending),
            active_count: count(InvestmentStatus::Active),
            completed_count: count(InvestmentStatus::Completed),
            property_count: properties.len(),
            total_shares: investments.iter().map(|inv| inv.shares_invested()).sum(),
            total_invested: investments.iter().map(|inv| inv.total_investment()).collect(),
            total_paid: investments.iter().map(|inv| inv.total_paid()).collect(),
            total_remaining: investments.iter().map(|inv| inv.remaining_amount()).collect(),
        })
    }

    async fn load_investment(&self, investment_id: InvestmentId) -> Result<Investment, LedgerError> {
        match self.store.get_investment(investment_id).await {
            Ok(investment) => Ok(investment),
            Err(err) if err.is_not_found() => Err(LedgerError::InvestmentNotFound(investment_id)),
            Err(err) => Err(err.into()),
        }
    }

    fn basis_date(&self, property: &Property, today: NaiveDate) -> Result<NaiveDate, LedgerError> {
        Ok(property.installment_frequency().advance(today, 1)?)
    }
}
