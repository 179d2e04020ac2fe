//! Property-based tests for the inventory replay.
//!
//! - Conservation: applied units add up, and units never go negative
//! - Ordering determinism: permuting tied inputs does not change the outcome

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use proptest::prelude::*;

use cogsbook_shared::types::{ComponentCosts, CostComponent};

use super::block::LedgerBlock;
use super::replay::InventoryLedger;
use super::types::{BillEvent, ComputeSaleRequest, KnownCostFact, ParsedBills};

const SKUS: [&str; 3] = ["A", "B", "C"];

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
}

fn sku_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(SKUS.to_vec())
}

fn manufacturing_strategy() -> impl Strategy<Value = BillEvent> {
    (1u32..10, sku_strategy(), 1i64..50, 0i64..100_000).prop_map(|(d, sku, units, cost)| {
        BillEvent::Manufacturing {
            date: day(d),
            po_number: "PO".into(),
            sku: sku.into(),
            units,
            cost_cents: cost,
        }
    })
}

fn compute_strategy() -> impl Strategy<Value = ComputeSaleRequest> {
    (1u32..10, sku_strategy(), 1i64..30, 0u32..1000).prop_map(|(d, sku, units, n)| {
        ComputeSaleRequest {
            date: day(d),
            order_id: format!("C-{n}"),
            sku: sku.into(),
            units,
        }
    })
}

fn known_strategy() -> impl Strategy<Value = KnownCostFact> {
    (1u32..10, sku_strategy(), 1i64..10, 0i64..5_000, 0u32..1000).prop_map(
        |(d, sku, units, cost, n)| KnownCostFact {
            date: day(d),
            order_id: format!("K-{n}"),
            sku: sku.into(),
            units,
            cost: ComponentCosts::single(CostComponent::Manufacturing, cost),
        },
    )
}

fn scenario_strategy() -> impl Strategy<
    Value = (
        Vec<BillEvent>,
        Vec<KnownCostFact>,
        Vec<KnownCostFact>,
        Vec<ComputeSaleRequest>,
    ),
> {
    (
        prop::collection::vec(manufacturing_strategy(), 0..12),
        prop::collection::vec(known_strategy(), 0..6),
        prop::collection::vec(known_strategy(), 0..6),
        prop::collection::vec(compute_strategy(), 0..12),
    )
}

fn parsed(events: Vec<BillEvent>) -> ParsedBills {
    ParsedBills {
        events,
        po_units_by_sku: BTreeMap::new(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Final units equal received + returned - (sold units that were applied).
    #[test]
    fn prop_units_are_conserved(
        (bills, known_sales, known_returns, computes) in scenario_strategy(),
    ) {
        let outcome = InventoryLedger::replay(&parsed(bills.clone()), &known_sales, &known_returns, &computes)
            .unwrap();

        for sku in SKUS {
            let received: i64 = bills
                .iter()
                .filter_map(|b| match b {
                    BillEvent::Manufacturing { sku: s, units, .. } if s == sku => Some(*units),
                    _ => None,
                })
                .sum();
            let returned: i64 = known_returns.iter().filter(|f| f.sku == sku).map(|f| f.units).sum();
            let requested_known: i64 = known_sales.iter().filter(|f| f.sku == sku).map(|f| f.units).sum();
            let blocked_known: i64 = outcome
                .blocks
                .iter()
                .filter_map(|b| match b {
                    LedgerBlock::NegativeInventory { sku: s, order_id, requested_units, .. }
                        if s == sku && order_id.starts_with("K-") => Some(*requested_units),
                    _ => None,
                })
                .sum();
            let computed: i64 = outcome.sale_costs.iter().filter(|c| c.sku == sku).map(|c| c.units).sum();

            let expected = received + returned - (requested_known - blocked_known) - computed;
            prop_assert_eq!(outcome.snapshot.units(sku), expected);
            prop_assert!(outcome.snapshot.units(sku) >= 0);
        }
    }

    /// Computed sales never remove more value than a component held.
    #[test]
    fn prop_computed_cost_bounded_by_received_value(
        bills in prop::collection::vec(manufacturing_strategy(), 1..12),
        computes in prop::collection::vec(compute_strategy(), 1..12),
    ) {
        let outcome = InventoryLedger::replay(&parsed(bills.clone()), &[], &[], &computes).unwrap();
        for sku in SKUS {
            let received: i64 = bills
                .iter()
                .filter_map(|b| match b {
                    BillEvent::Manufacturing { sku: s, cost_cents, .. } if s == sku => Some(*cost_cents),
                    _ => None,
                })
                .sum();
            let removed: i64 = outcome
                .sale_costs
                .iter()
                .filter(|c| c.sku == sku)
                .map(|c| c.cost.manufacturing)
                .sum();
            prop_assert!(removed >= 0);
            prop_assert_eq!(removed + outcome.snapshot.value(sku).manufacturing, received);
        }
    }

    /// Reversing the input arrays only changes the order of events that tie on
    /// `(date, priority)`; with one event per key the outcome is identical.
    #[test]
    fn prop_outcome_independent_of_untied_input_order(
        (bills, known_sales, known_returns, computes) in scenario_strategy(),
    ) {
        // Give every event a unique date so no two events tie.
        let mut d = 0u32;
        let mut next_day = || {
            d += 1;
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::Days::new(u64::from(d))
        };
        let bills: Vec<BillEvent> = bills
            .into_iter()
            .map(|b| match b {
                BillEvent::Manufacturing { po_number, sku, units, cost_cents, .. } => {
                    BillEvent::Manufacturing { date: next_day(), po_number, sku, units, cost_cents }
                }
                other => other,
            })
            .collect();
        let known_sales: Vec<_> = known_sales.into_iter().map(|f| KnownCostFact { date: next_day(), ..f }).collect();
        let known_returns: Vec<_> = known_returns.into_iter().map(|f| KnownCostFact { date: next_day(), ..f }).collect();
        let computes: Vec<_> = computes.into_iter().map(|c| ComputeSaleRequest { date: next_day(), ..c }).collect();

        let forward = InventoryLedger::replay(&parsed(bills.clone()), &known_sales, &known_returns, &computes).unwrap();

        let rev = |v: &[KnownCostFact]| v.iter().rev().cloned().collect::<Vec<_>>();
        let reversed_bills: Vec<_> = bills.iter().rev().cloned().collect();
        let reversed_computes: Vec<_> = computes.iter().rev().cloned().collect();
        let backward = InventoryLedger::replay(
            &parsed(reversed_bills),
            &rev(&known_sales),
            &rev(&known_returns),
            &reversed_computes,
        )
        .unwrap();

        prop_assert_eq!(forward, backward);
    }

    /// Same-day bills permuted among themselves yield the same snapshot and
    /// block list, because receipts on one `(date, priority)` key commute.
    #[test]
    fn prop_same_day_bill_permutation_is_invisible(
        bills in prop::collection::vec(manufacturing_strategy(), 1..10),
        computes in prop::collection::vec(compute_strategy(), 0..8),
    ) {
        let same_day: Vec<BillEvent> = bills
            .into_iter()
            .map(|b| match b {
                BillEvent::Manufacturing { po_number, sku, units, cost_cents, .. } => {
                    BillEvent::Manufacturing { date: day(1), po_number, sku, units, cost_cents }
                }
                other => other,
            })
            .collect();
        let later_sales: Vec<_> = computes
            .into_iter()
            .map(|c| ComputeSaleRequest { date: day(c.date.day0() + 2), ..c })
            .collect();

        let forward = InventoryLedger::replay(&parsed(same_day.clone()), &[], &[], &later_sales).unwrap();
        let reversed: Vec<_> = same_day.into_iter().rev().collect();
        let backward = InventoryLedger::replay(&parsed(reversed), &[], &[], &later_sales).unwrap();

        prop_assert_eq!(forward.snapshot, backward.snapshot);
        prop_assert_eq!(forward.blocks, backward.blocks);
        prop_assert_eq!(forward.sale_costs, backward.sale_costs);
    }
}
