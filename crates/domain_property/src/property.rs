//! Property aggregate
//!
//! A property is sold as `total_shares` equal shares. Its financial terms
//! determine the per-share amounts every new investment snapshots, and its
//! inventory fields track how many shares remain.
//!
//! # Invariants
//!
//! - `0 <= available_shares <= total_shares`
//! - `status == Funded` whenever `available_shares` reaches 0 from Available
//! - `property_type` and `total_shares` never change after registration
//! - Derived share terms change only through [`Property::update_terms`]

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tracing::info;

use core_kernel::{Currency, Money, PropertyId};

use crate::calculator::{compute_share_terms, InstallmentFrequency, ShareTerms};
use crate::error::PropertyError;

/// Kinds of investable property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    /// A single completed unit; schedules start once fully funded
    Single,
    /// A multi-year development; schedules start at purchase
    Project,
    /// A package of Single units sold together
    Bundle,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Single => "single",
            PropertyType::Project => "project",
            PropertyType::Bundle => "bundle",
        }
    }
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Property lifecycle status
///
/// Available -> Funded happens only through the share inventory. The later
/// stages are advanced explicitly by an operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyStatus {
    Available,
    Funded,
    UnderConstruction,
    Completed,
    Exited,
}

impl PropertyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyStatus::Available => "available",
            PropertyStatus::Funded => "funded",
            PropertyStatus::UnderConstruction => "under_construction",
            PropertyStatus::Completed => "completed",
            PropertyStatus::Exited => "exited",
        }
    }

    /// Returns the status an operator may advance to from this one
    pub fn next(&self) -> Option<PropertyStatus> {
        match self {
            PropertyStatus::Funded => Some(PropertyStatus::UnderConstruction),
            PropertyStatus::UnderConstruction => Some(PropertyStatus::Completed),
            PropertyStatus::Completed => Some(PropertyStatus::Exited),
            PropertyStatus::Available | PropertyStatus::Exited => None,
        }
    }
}

impl std::fmt::Display for PropertyStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Input for registering a property
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewProperty {
    pub property_type: PropertyType,
    pub title: String,
    pub location: String,
    /// Single properties making up a Bundle; empty otherwise
    pub bundle_items: Vec<PropertyId>,
    pub price: Money,
    pub total_shares: u32,
    pub advancement_percent: Decimal,
    pub number_of_installments: u32,
    pub installment_frequency: InstallmentFrequency,
    pub max_shares_per_user: Option<u32>,
}

/// Changes to a property's financial terms
///
/// Unset fields keep their current value. Existing investments keep the
/// amounts they snapshotted at purchase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TermsUpdate {
    pub price: Option<Money>,
    pub advancement_percent: Option<Decimal>,
    pub number_of_installments: Option<u32>,
    pub installment_frequency: Option<InstallmentFrequency>,
}

impl TermsUpdate {
    pub fn is_empty(&self) -> bool {
        self.price.is_none()
            && self.advancement_percent.is_none()
            && self.number_of_installments.is_none()
            && self.installment_frequency.is_none()
    }
}

/// The Property aggregate root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Property {
    id: PropertyId,
    property_type: PropertyType,
    title: String,
    location: String,
    bundle_items: Vec<PropertyId>,
    is_active: bool,
    price: Money,
    total_shares: u32,
    advancement_percent: Decimal,
    number_of_installments: u32,
    installment_frequency: InstallmentFrequency,
    share_price: Money,
    share_down_payment: Money,
    share_installment_amount: Money,
    pub(crate) available_shares: u32,
    pub(crate) total_invested: Money,
    max_shares_per_user: Option<u32>,
    pub(crate) status: PropertyStatus,
    /// Version for optimistic concurrency; bumped by every mutation
    version: u64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Property {
    /// Registers a new property with its derived share terms computed and
    /// every share available
    ///
    /// # Errors
    ///
    /// Returns `PropertyError::Validation` if any term is out of range or the
    /// type-specific fields are inconsistent
    pub fn register(new: NewProperty, now: DateTime<Utc>) -> Result<Self, PropertyError> {
        if new.title.trim().is_empty() {
            return Err(PropertyError::validation("title must not be empty"));
        }
        match new.property_type {
            PropertyType::Bundle if new.bundle_items.is_empty() => {
                return Err(PropertyError::validation("a bundle needs at least one item"));
            }
            PropertyType::Single | PropertyType::Project if !new.bundle_items.is_empty() => {
                return Err(PropertyError::validation(
                    "bundle_items is only allowed for bundles",
                ));
            }
            _ => {}
        }
        match new.max_shares_per_user {
            Some(_) if new.property_type == PropertyType::Project => {
                return Err(PropertyError::validation(
                    "max_shares_per_user must be unset for projects",
                ));
            }
            Some(0) => {
                return Err(PropertyError::validation(
                    "max_shares_per_user must be at least 1",
                ));
            }
            _ => {}
        }

        let terms = compute_share_terms(
            new.price,
            new.total_shares,
            new.advancement_percent,
            new.number_of_installments,
        )?;

        Ok(Self {
            id: PropertyId::new_v7(),
            property_type: new.property_type,
            title: new.title,
            location: new.location,
            bundle_items: new.bundle_items,
            is_active: true,
            price: new.price,
            total_shares: new.total_shares,
            advancement_percent: new.advancement_percent,
            number_of_installments: new.number_of_installments,
            installment_frequency: new.installment_frequency,
            share_price: terms.share_price,
            share_down_payment: terms.share_down_payment,
            share_installment_amount: terms.share_installment_amount,
            available_shares: new.total_shares,
            total_invested: Money::zero(new.price.currency()),
            max_shares_per_user: new.max_shares_per_user,
            status: PropertyStatus::Available,
            version: 1,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn id(&self) -> PropertyId {
        self.id
    }

    pub fn property_type(&self) -> PropertyType {
        self.property_type
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn bundle_items(&self) -> &[PropertyId] {
        &self.bundle_items
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn price(&self) -> Money {
        self.price
    }

    pub fn currency(&self) -> Currency {
        self.price.currency()
    }

    pub fn total_shares(&self) -> u32 {
        self.total_shares
    }

    pub fn advancement_percent(&self) -> Decimal {
        self.advancement_percent
    }

    pub fn number_of_installments(&self) -> u32 {
        self.number_of_installments
    }

    pub fn installment_frequency(&self) -> InstallmentFrequency {
        self.installment_frequency
    }

    pub fn share_price(&self) -> Money {
        self.share_price
    }

    pub fn share_down_payment(&self) -> Money {
        self.share_down_payment
    }

    pub fn share_installment_amount(&self) -> Money {
        self.share_installment_amount
    }

    /// Returns the current per-share terms as one value
    pub fn share_terms(&self) -> ShareTerms {
        ShareTerms {
            share_price: self.share_price,
            share_down_payment: self.share_down_payment,
            share_installment_amount: self.share_installment_amount,
        }
    }

    pub fn available_shares(&self) -> u32 {
        self.available_shares
    }

    pub fn total_invested(&self) -> Money {
        self.total_invested
    }

    /// Per-user share cap; only enforced for Single properties
    pub fn max_shares_per_user(&self) -> Option<u32> {
        self.max_shares_per_user
    }

    pub fn status(&self) -> PropertyStatus {
        self.status
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn shares_sold(&self) -> u32 {
        self.total_shares - self.available_shares
    }

    pub fn remaining_shares(&self) -> u32 {
        self.available_shares
    }

    /// Percentage of shares sold, rounded half-up to 2 decimal places
    pub fn funding_percentage(&self) -> Decimal {
        if self.total_shares == 0 {
            return Decimal::ZERO;
        }
        (Decimal::from(self.shares_sold()) * dec!(100) / Decimal::from(self.total_shares))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
    }

    /// Returns true if new shares may be reserved right now
    pub fn is_investable(&self) -> bool {
        self.is_active && self.status == PropertyStatus::Available
    }

    pub fn is_fully_funded(&self) -> bool {
        self.available_shares == 0
    }

    /// Replaces the financial terms and recomputes the per-share amounts
    ///
    /// # Errors
    ///
    /// Returns `PropertyError::Validation` if the update is empty, changes
    /// currency or yields invalid terms; the property is left unchanged
    pub fn update_terms(&mut self, update: TermsUpdate, now: DateTime<Utc>) -> Result<(), PropertyError> {
        if update.is_empty() {
            return Err(PropertyError::validation("terms update has no changes"));
        }
        let price = update.price.unwrap_or(self.price);
        if price.currency() != self.price.currency() {
            return Err(PropertyError::validation(format!(
                "price currency {} does not match property currency {}",
                price.currency(),
                self.price.currency()
            )));
        }
        let advancement_percent = update.advancement_percent.unwrap_or(self.advancement_percent);
        let number_of_installments = update
            .number_of_installments
            .unwrap_or(self.number_of_installments);

        let terms = compute_share_terms(
            price,
            self.total_shares,
            advancement_percent,
            number_of_installments,
        )?;

        self.price = price;
        self.advancement_percent = advancement_percent;
        self.number_of_installments = number_of_installments;
        if let Some(frequency) = update.installment_frequency {
            self.installment_frequency = frequency;
        }
        self.apply_terms(terms);
        self.touch(now);
        Ok(())
    }

    /// Moves a funded property to its next lifecycle stage
    ///
    /// # Errors
    ///
    /// Returns `PropertyError::InvalidStatusTransition` unless `target` is the
    /// direct successor of the current status
    pub fn advance_status(&mut self, target: PropertyStatus, now: DateTime<Utc>) -> Result<(), PropertyError> {
        if self.status.next() != Some(target) {
            return Err(PropertyError::InvalidStatusTransition {
                from: self.status,
                to: target,
            });
        }
        info!(
            property_id = %self.id,
            from = %self.status,
            to = %target,
            "Property status advanced"
        );
        self.status = target;
        self.touch(now);
        Ok(())
    }

    /// Soft-deletes the property; it can no longer be invested in
    pub fn deactivate(&mut self, now: DateTime<Utc>) {
        if self.is_active {
            self.is_active = false;
            self.touch(now);
        }
    }

    fn apply_terms(&mut self, terms: ShareTerms) {
        self.share_price = terms.share_price;
        self.share_down_payment = terms.share_down_payment;
        self.share_installment_amount = terms.share_installment_amount;
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.version += 1;
        self.updated_at = now;
    }
}
