//! Property DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::{Currency, Money, PropertyId};
use domain_property::{
    InstallmentFrequency, NewProperty, Property, PropertyStatus, PropertyType, TermsUpdate,
};

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePropertyRequest {
    pub property_type: PropertyType,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 200))]
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub bundle_items: Vec<Uuid>,
    pub price: Decimal,
    pub currency: Currency,
    #[validate(range(min = 1))]
    pub total_shares: u32,
    pub advancement_percent: Decimal,
    #[validate(range(min = 1, max = 600))]
    pub number_of_installments: u32,
    pub installment_frequency: InstallmentFrequency,
    #[validate(range(min = 1))]
    pub max_shares_per_user: Option<u32>,
}

impl From<CreatePropertyRequest> for NewProperty {
    fn from(request: CreatePropertyRequest) -> Self {
        NewProperty {
            property_type: request.property_type,
            title: request.title,
            location: request.location,
            bundle_items: request.bundle_items.into_iter().map(PropertyId::from).collect(),
            price: Money::new(request.price, request.currency),
            total_shares: request.total_shares,
            advancement_percent: request.advancement_percent,
            number_of_installments: request.number_of_installments,
            installment_frequency: request.installment_frequency,
            max_shares_per_user: request.max_shares_per_user,
        }
    }
}

/// New financial terms; the price is in the property's own currency
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTermsRequest {
    pub price: Option<Decimal>,
    pub advancement_percent: Option<Decimal>,
    #[validate(range(min = 1, max = 600))]
    pub number_of_installments: Option<u32>,
    pub installment_frequency: Option<InstallmentFrequency>,
}

impl UpdateTermsRequest {
    pub fn into_update(self, currency: Currency) -> TermsUpdate {
        TermsUpdate {
            price: self.price.map(|amount| Money::new(amount, currency)),
            advancement_percent: self.advancement_percent,
            number_of_installments: self.number_of_installments,
            installment_frequency: self.installment_frequency,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct AdvanceStatusRequest {
    pub status: PropertyStatus,
}

#[derive(Debug, Serialize)]
pub struct PropertyResponse {
    pub id: PropertyId,
    pub property_type: PropertyType,
    pub title: String,
    pub location: String,
    pub status: PropertyStatus,
    pub price: Money,
    pub total_shares: u32,
    pub available_shares: u32,
    pub shares_sold: u32,
    pub funding_percentage: Decimal,
    pub total_invested: Money,
    pub share_price: Money,
    pub share_down_payment: Money,
    pub share_installment_amount: Money,
    pub advancement_percent: Decimal,
    pub number_of_installments: u32,
    pub installment_frequency: InstallmentFrequency,
    pub max_shares_per_user: Option<u32>,
    pub version: u64,
    pub updated_at: DateTime<Utc>,
}

impl From<&Property> for PropertyResponse {
    fn from(property: &Property) -> Self {
        Self {
            id: property.id(),
            property_type: property.property_type(),
            title: property.title().to_string(),
            location: property.location().to_string(),
            status: property.status(),
            price: property.price(),
            total_shares: property.total_shares(),
            available_shares: property.available_shares(),
            shares_sold: property.shares_sold(),
            funding_percentage: property.funding_percentage(),
            total_invested: property.total_invested(),
            share_price: property.share_price(),
            share_down_payment: property.share_down_payment(),
            share_installment_amount: property.share_installment_amount(),
            advancement_percent: property.advancement_percent(),
            number_of_installments: property.number_of_installments(),
            installment_frequency: property.installment_frequency(),
            max_shares_per_user: property.max_shares_per_user(),
            version: property.version(),
            updated_at: property.updated_at(),
        }
    }
}
