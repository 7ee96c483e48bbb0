//! Per-currency money totals for summaries spanning several investments

use serde::{Deserialize, Serialize};

use core_kernel::{Currency, Money};

/// Running totals kept separately for each currency
///
/// Amounts in different currencies are never added together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyTotals(Vec<Money>);

impl CurrencyTotals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, amount: Money) {
        match self.0.iter_mut().find(|m| m.currency() == amount.currency()) {
            Some(total) => *total = *total + amount,
            None => self.0.push(amount),
        }
    }

    /// Total for one currency; zero when nothing was added in it
    pub fn get(&self, currency: Currency) -> Money {
        self.0
            .iter()
            .find(|m| m.currency() == currency)
            .copied()
            .unwrap_or_else(|| Money::zero(currency))
    }

    pub fn amounts(&self) -> &[Money] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Money> for CurrencyTotals {
    fn from_iter<I: IntoIterator<Item = Money>>(iter: I) -> Self {
        let mut totals = Self::new();
        for amount in iter {
            totals.add(amount);
        }
        totals
    }
}
