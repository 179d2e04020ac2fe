//! Deterministic merge of bill, sale, and return events.
//!
//! Events are ordered by `(date, priority)` with a stable sort, so events that
//! tie on both keys keep their input order. Within one day:
//!
//! 1. manufacturing bills (units arrive),
//! 2. every other bill (costs land on units already received),
//! 3. known-cost sales (they move the average before it is used),
//! 4. computed sales (they draw on the average),
//! 5. returns.

use chrono::NaiveDate;

use super::types::{BillEvent, ComputeSaleRequest, KnownCostFact};

/// Same-day ordering of timeline events. Declaration order is the sort order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimelinePriority {
    /// Manufacturing bill.
    ManufacturingBill,
    /// Any other bill event.
    OtherBill,
    /// Sale with a caller-supplied cost.
    KnownSale,
    /// Sale whose cost is computed from the running average.
    ComputeSale,
    /// Return with a caller-supplied cost.
    KnownReturn,
}

/// One event on the merged timeline, borrowing from the replay inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimelineEvent<'a> {
    /// A bill event.
    Bill(&'a BillEvent),
    /// A known-cost sale.
    KnownSale(&'a KnownCostFact),
    /// A sale to cost from the average.
    ComputeSale(&'a ComputeSaleRequest),
    /// A known-cost return.
    KnownReturn(&'a KnownCostFact),
}

impl TimelineEvent<'_> {
    /// Event date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        match self {
            Self::Bill(bill) => bill.date(),
            Self::KnownSale(fact) | Self::KnownReturn(fact) => fact.date,
            Self::ComputeSale(request) => request.date,
        }
    }

    /// Same-day priority.
    #[must_use]
    pub const fn priority(&self) -> TimelinePriority {
        match self {
            Self::Bill(BillEvent::Manufacturing { .. }) => TimelinePriority::ManufacturingBill,
            Self::Bill(_) => TimelinePriority::OtherBill,
            Self::KnownSale(_) => TimelinePriority::KnownSale,
            Self::ComputeSale(_) => TimelinePriority::ComputeSale,
            Self::KnownReturn(_) => TimelinePriority::KnownReturn,
        }
    }
}

/// Merges all inputs into one timeline sorted by `(date, priority)`.
#[must_use]
pub fn build_timeline<'a>(
    bills: &'a [BillEvent],
    known_sales: &'a [KnownCostFact],
    known_returns: &'a [KnownCostFact],
    compute_sales: &'a [ComputeSaleRequest],
) -> Vec<TimelineEvent<'a>> {
    let mut timeline: Vec<TimelineEvent<'a>> = bills
        .iter()
        .map(TimelineEvent::Bill)
        .chain(known_sales.iter().map(TimelineEvent::KnownSale))
        .chain(compute_sales.iter().map(TimelineEvent::ComputeSale))
        .chain(known_returns.iter().map(TimelineEvent::KnownReturn))
        .collect();

    // `sort_by_key` is stable.
    timeline.sort_by_key(|event| (event.date(), event.priority()));
    timeline
}
