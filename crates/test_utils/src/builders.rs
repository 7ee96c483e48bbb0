//! Test Data Builders
//!
//! Builders let tests name only the fields they care about and take
//! defaults for the rest.

use std::sync::Arc;

use chrono::NaiveDate;
use core_kernel::{Clock, FixedClock, InvestmentId, Money, PropertyId, UserId};
use domain_investment::{
    InMemoryLedgerStore, Investment, InvestmentQuery, InvestmentService, LedgerError,
    LedgerStore, PaymentReceipt, PaymentScheduleService,
};
use domain_property::{InstallmentFrequency, NewProperty, Property, PropertyType};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::fixtures::{MoneyFixtures, TemporalFixtures};

/// Builder for property registration requests
///
/// Defaults to a 50,000 USD project in 10 shares, 20% down, 10 monthly
/// installments, no per-user cap.
pub struct NewPropertyBuilder {
    property_type: PropertyType,
    title: String,
    location: String,
    bundle_items: Vec<PropertyId>,
    price: Money,
    total_shares: u32,
    advancement_percent: Decimal,
    number_of_installments: u32,
    installment_frequency: InstallmentFrequency,
    max_shares_per_user: Option<u32>,
}

impl Default for NewPropertyBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl NewPropertyBuilder {
    pub fn new() -> Self {
        Self {
            property_type: PropertyType::Project,
            title: "Harbour Point".to_string(),
            location: "Lisbon".to_string(),
            bundle_items: Vec::new(),
            price: MoneyFixtures::usd_property_price(),
            total_shares: 10,
            advancement_percent: dec!(20),
            number_of_installments: 10,
            installment_frequency: InstallmentFrequency::Monthly,
            max_shares_per_user: None,
        }
    }

    /// Sets the property type; bundle items are cleared for non-bundles
    pub fn with_type(mut self, property_type: PropertyType) -> Self {
        self.property_type = property_type;
        if property_type != PropertyType::Bundle {
            self.bundle_items.clear();
        }
        self
    }

    /// Makes this a bundle of `items` fresh units
    pub fn bundle_of(mut self, items: usize) -> Self {
        self.property_type = PropertyType::Bundle;
        self.bundle_items = (0..items).map(|_| PropertyId::new()).collect();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_price(mut self, price: Money) -> Self {
        self.price = price;
        self
    }

    pub fn with_total_shares(mut self, total_shares: u32) -> Self {
        self.total_shares = total_shares;
        self
    }

    pub fn with_advancement_percent(mut self, percent: Decimal) -> Self {
        self.advancement_percent = percent;
        self
    }

    pub fn with_installments(mut self, count: u32, frequency: InstallmentFrequency) -> Self {
        self.number_of_installments = count;
        self.installment_frequency = frequency;
        self
    }

    /// Per-user share cap; projects reject one at registration
    pub fn with_cap(mut self, max_shares_per_user: u32) -> Self {
        self.max_shares_per_user = Some(max_shares_per_user);
        self
    }

    pub fn build(self) -> NewProperty {
        NewProperty {
            property_type: self.property_type,
            title: self.title,
            location: self.location,
            bundle_items: self.bundle_items,
            price: self.price,
            total_shares: self.total_shares,
            advancement_percent: self.advancement_percent,
            number_of_installments: self.number_of_installments,
            installment_frequency: self.installment_frequency,
            max_shares_per_user: self.max_shares_per_user,
        }
    }

    /// Builds and registers the property in memory
    pub fn register(self) -> Property {
        Property::register(self.build(), TemporalFixtures::purchase_time())
            .expect("builder defaults form a valid property")
    }
}

/// An in-memory ledger with its services wired to a frozen clock
pub struct TestLedger {
    pub store: Arc<InMemoryLedgerStore>,
    pub service: Arc<InvestmentService>,
    clock: Arc<FixedClock>,
}

impl Default for TestLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl TestLedger {
    /// Ledger frozen on [`TemporalFixtures::purchase_day`]
    pub fn new() -> Self {
        Self::on(TemporalFixtures::purchase_day())
    }

    pub fn on(date: NaiveDate) -> Self {
        let store = Arc::new(InMemoryLedgerStore::new());
        let clock = Arc::new(FixedClock::on(date));
        let service = Arc::new(InvestmentService::new(store.clone(), clock.clone()));
        Self { store, service, clock }
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Schedule service over the same store, as seen on `date`
    pub fn schedules_on(&self, date: NaiveDate) -> PaymentScheduleService {
        PaymentScheduleService::new(self.store.clone(), Arc::new(FixedClock::on(date)))
    }

    pub async fn register(&self, new: NewProperty) -> Property {
        self.service
            .register_property(new)
            .await
            .expect("property registration failed")
    }

    pub async fn property(&self, id: PropertyId) -> Property {
        self.service.get_property(id).await.expect("property not found")
    }

    pub async fn invest(&self, user_id: UserId, property_id: PropertyId, shares: u32) -> Result<Investment, LedgerError> {
        self.service.create_investment(user_id, property_id, shares).await
    }

    /// Every investment recorded against `property_id`, cancelled ones included
    pub async fn investments_for(&self, property_id: PropertyId) -> Vec<Investment> {
        self.store
            .list_investments(InvestmentQuery::for_property(property_id))
            .await
            .expect("listing investments failed")
    }

    /// Pays the down payment and then every installment in order
    pub async fn pay_everything(&self, user_id: UserId, investment_id: InvestmentId) -> Result<Investment, LedgerError> {
        let mut investment = self.service.get_investment(user_id, investment_id).await?;
        if !investment.down_payment_paid() {
            investment = self
                .service
                .pay_down_payment(user_id, investment_id, PaymentReceipt::new(format!("dp-{}", investment_id)))
                .await?;
        }
        let unpaid: Vec<_> = investment
            .installments()
            .iter()
            .filter(|i| !i.is_paid())
            .map(|i| (i.id(), i.installment_number()))
            .collect();
        for (installment_id, number) in unpaid {
            investment = self
                .service
                .pay_installment(
                    user_id,
                    investment_id,
                    installment_id,
                    PaymentReceipt::new(format!("inst-{}-{}", investment_id, number)),
                )
                .await?;
        }
        Ok(investment)
    }
}
