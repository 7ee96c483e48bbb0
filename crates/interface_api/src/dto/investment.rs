//! Investment DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use core_kernel::Money;
use domain_investment::{Investment, PaymentReceipt};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateInvestmentRequest {
    pub property_id: Uuid,
    #[validate(range(min = 1))]
    pub shares: u32,
}

/// A completed gateway charge
#[derive(Debug, Deserialize, Validate)]
pub struct PaymentRequest {
    #[validate(length(min = 1, max = 128))]
    pub transaction_id: String,
    /// Charged amount, checked against the amount due when present
    pub amount: Option<Money>,
}

impl From<PaymentRequest> for PaymentReceipt {
    fn from(request: PaymentRequest) -> Self {
        let receipt = PaymentReceipt::new(request.transaction_id);
        match request.amount {
            Some(amount) => receipt.with_amount(amount),
            None => receipt,
        }
    }
}

/// An investment with its payment totals
#[derive(Debug, Serialize)]
pub struct InvestmentResponse {
    #[serde(flatten)]
    pub investment: Investment,
    pub total_payable: Money,
    pub total_paid: Money,
    pub remaining_amount: Money,
    pub payment_progress: Decimal,
}

impl From<Investment> for InvestmentResponse {
    fn from(investment: Investment) -> Self {
        Self {
            total_payable: investment.total_payable(),
            total_paid: investment.total_paid(),
            remaining_amount: investment.remaining_amount(),
            payment_progress: investment.payment_progress(),
            investment,
        }
    }
}
