//! Payment schedule queries
//!
//! A read-only view across a user's open investments: one line for each
//! unpaid down payment and one for each installment, filtered and sorted by
//! due date.
//!
//! # Line Rules
//!
//! - Only Pending and Active investments contribute lines
//! - The down payment line is due on the investment's creation date and is
//!   listed only while unpaid and only if it satisfies the filter
//! - Overdue: Pending and due before today
//! - Upcoming(days): Pending and due within `[today, today + days]`

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use core_kernel::{Clock, DateRange, InstallmentId, InvestmentId, Money, PropertyId, UserId};

use crate::error::LedgerError;
use crate::installment::{Installment, InstallmentStatus};
use crate::investment::Investment;
use crate::ports::{InvestmentQuery, LedgerStore};
use crate::totals::CurrencyTotals;

/// Which schedule lines to return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "filter", content = "days")]
pub enum ScheduleFilter {
    /// Every line
    All,
    /// Unpaid lines, overdue ones included
    Pending,
    /// Unpaid lines due before today
    Overdue,
    /// Unpaid lines due within the next `days` days, today included
    Upcoming(u32),
    /// Paid installments
    Paid,
}

impl ScheduleFilter {
    /// Default look-ahead window for `Upcoming`
    pub const DEFAULT_UPCOMING_DAYS: u32 = 30;

    /// Parses a filter name as used in query strings
    pub fn parse(name: &str, days: Option<u32>) -> Option<Self> {
        match name {
            "all" => Some(ScheduleFilter::All),
            "pending" => Some(ScheduleFilter::Pending),
            "overdue" => Some(ScheduleFilter::Overdue),
            "upcoming" => Some(ScheduleFilter::Upcoming(
                days.unwrap_or(Self::DEFAULT_UPCOMING_DAYS),
            )),
            "paid" => Some(ScheduleFilter::Paid),
            _ => None,
        }
    }

    fn accepts_unpaid(&self, due_date: NaiveDate, today: NaiveDate) -> bool {
        match self {
            ScheduleFilter::All | ScheduleFilter::Pending => true,
            ScheduleFilter::Overdue => due_date < today,
            ScheduleFilter::Upcoming(days) => DateRange::starting_at(today, *days)
                .map(|window| window.contains(due_date))
                .unwrap_or(false),
            ScheduleFilter::Paid => false,
        }
    }

    fn accepts_installment(&self, installment: &Installment, today: NaiveDate) -> bool {
        match installment.status() {
            InstallmentStatus::Paid => matches!(self, ScheduleFilter::All | ScheduleFilter::Paid),
            InstallmentStatus::Pending => self.accepts_unpaid(installment.due_date(), today),
            InstallmentStatus::Cancelled | InstallmentStatus::Overdue => {
                matches!(self, ScheduleFilter::All)
            }
        }
    }
}

/// What a schedule line is for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleLineKind {
    DownPayment,
    Installment,
}

/// One payment in a user's schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleLine {
    pub investment_id: InvestmentId,
    pub property_id: PropertyId,
    pub kind: ScheduleLineKind,
    pub installment_id: Option<InstallmentId>,
    /// 0 for the down payment
    pub installment_number: u32,
    pub amount: Money,
    pub due_date: NaiveDate,
    /// Status as of the query date
    pub status: InstallmentStatus,
    pub paid_date: Option<NaiveDate>,
    pub transaction_id: Option<String>,
}

impl ScheduleLine {
    pub fn is_unpaid(&self) -> bool {
        matches!(self.status, InstallmentStatus::Pending | InstallmentStatus::Overdue)
    }
}

/// Aggregates over the returned lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub line_count: usize,
    /// Sum of the unpaid listed lines
    pub total_outstanding: CurrencyTotals,
    pub overdue_count: usize,
    pub overdue_amount: CurrencyTotals,
    /// Earliest due date among unpaid listed lines
    pub next_due_date: Option<NaiveDate>,
}

/// A user's payment schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentSchedule {
    pub as_of: NaiveDate,
    pub filter: ScheduleFilter,
    pub items: Vec<ScheduleLine>,
    pub summary: ScheduleSummary,
}

/// Builds the schedule view of `investments` as of `today`
///
/// Investments that are not Pending or Active are ignored.
pub fn build_schedule(investments: &[Investment], filter: ScheduleFilter, today: NaiveDate) -> PaymentSchedule {
    let mut items = Vec::new();

    for investment in investments.iter().filter(|inv| inv.is_open()) {
        if !investment.down_payment_paid() {
            let due_date = investment.created_at().date_naive();
            if filter.accepts_unpaid(due_date, today) {
                items.push(ScheduleLine {
                    investment_id: investment.id(),
                    property_id: investment.property_id(),
                    kind: ScheduleLineKind::DownPayment,
                    installment_id: None,
                    installment_number: 0,
                    amount: investment.down_payment(),
                    due_date,
                    status: if due_date < today {
                        InstallmentStatus::Overdue
                    } else {
                        InstallmentStatus::Pending
                    },
                    paid_date: None,
                    transaction_id: None,
                });
            }
        }

        for installment in investment.installments() {
            if !filter.accepts_installment(installment, today) {
                continue;
            }
            items.push(ScheduleLine {
                investment_id: investment.id(),
                property_id: investment.property_id(),
                kind: ScheduleLineKind::Installment,
                installment_id: Some(installment.id()),
                installment_number: installment.installment_number(),
                amount: installment.amount(),
                due_date: installment.due_date(),
                status: installment.status_on(today),
                paid_date: installment.paid_date(),
                transaction_id: installment.transaction_id().map(str::to_string),
            });
        }
    }

    items.sort_by(|a, b| {
        a.due_date
            .cmp(&b.due_date)
            .then(a.investment_id.cmp(&b.investment_id))
            .then(a.installment_number.cmp(&b.installment_number))
    });

    let summary = summarize(&items);
    PaymentSchedule {
        as_of: today,
        filter,
        items,
        summary,
    }
}

fn summarize(items: &[ScheduleLine]) -> ScheduleSummary {
    let mut summary = ScheduleSummary {
        line_count: items.len(),
        ..Default::default()
    };
    for line in items.iter().filter(|l| l.is_unpaid()) {
        summary.total_outstanding.add(line.amount);
        if line.status == InstallmentStatus::Overdue {
            summary.overdue_count += 1;
            summary.overdue_amount.add(line.amount);
        }
        summary.next_due_date = Some(match summary.next_due_date {
            Some(current) => current.min(line.due_date),
            None => line.due_date,
        });
    }
    summary
}

/// Serves payment schedule queries from the store
pub struct PaymentScheduleService {
    store: Arc<dyn LedgerStore>,
    clock: Arc<dyn Clock>,
}

impl PaymentScheduleService {
    pub fn new(store: Arc<dyn LedgerStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Returns the user's schedule lines matching `filter`
    pub async fn get_schedule(&self, user_id: UserId, filter: ScheduleFilter) -> Result<PaymentSchedule, LedgerError> {
        let investments = self
            .store
            .list_investments(InvestmentQuery::for_user(user_id).open_only())
            .await?;
        let schedule = build_schedule(&investments, filter, self.clock.today());
        debug!(
            user_id = %user_id,
            filter = ?filter,
            lines = schedule.items.len(),
            "Payment schedule built"
        );
        Ok(schedule)
    }
}
