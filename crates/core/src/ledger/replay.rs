//! Weighted-average inventory replay.
//!
//! `InventoryLedger::replay` folds the merged timeline into a fresh snapshot.
//! Nothing survives between calls; the snapshot is owned by the outcome.

use std::collections::BTreeMap;

use tracing::debug;

use cogsbook_shared::types::{Cents, ComponentCosts, CostComponent};

use super::block::LedgerBlock;
use super::error::LedgerError;
use super::timeline::{TimelineEvent, build_timeline};
use super::types::{
    BillEvent, ComputeSaleRequest, KnownCostFact, LedgerSnapshot, ParsedBills, SaleCost,
};
use crate::allocation::{AllocationError, allocate};

/// Result of one replay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayOutcome {
    /// Final per-SKU state.
    pub snapshot: LedgerSnapshot,
    /// Cost removed for each computed sale, in timeline order.
    pub sale_costs: Vec<SaleCost>,
    /// Blocks in the order they were encountered.
    pub blocks: Vec<LedgerBlock>,
}

/// The replay engine. Owns its snapshot exclusively for one run.
#[derive(Debug, Default)]
pub struct InventoryLedger {
    snapshot: LedgerSnapshot,
    sale_costs: Vec<SaleCost>,
    blocks: Vec<LedgerBlock>,
}

impl InventoryLedger {
    /// Replays bills, known sales, known returns and computed sales.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError` if any unit count is non-positive or any PO unit
    /// weight is negative. No partial replay happens in that case.
    pub fn replay(
        bills: &ParsedBills,
        known_sales: &[KnownCostFact],
        known_returns: &[KnownCostFact],
        compute_sales: &[ComputeSaleRequest],
    ) -> Result<ReplayOutcome, LedgerError> {
        validate_inputs(bills, known_sales, known_returns, compute_sales)?;

        let timeline = build_timeline(&bills.events, known_sales, known_returns, compute_sales);
        let mut ledger = Self::default();
        for event in timeline {
            ledger.apply(event, &bills.po_units_by_sku);
        }

        debug!(
            skus = ledger.snapshot.len(),
            sale_costs = ledger.sale_costs.len(),
            blocks = ledger.blocks.len(),
            "ledger replay finished"
        );

        Ok(ReplayOutcome {
            snapshot: ledger.snapshot,
            sale_costs: ledger.sale_costs,
            blocks: ledger.blocks,
        })
    }

    fn apply(&mut self, event: TimelineEvent<'_>, po_units: &BTreeMap<String, BTreeMap<String, i64>>) {
        match event {
            TimelineEvent::Bill(bill) => self.apply_bill(bill, po_units),
            TimelineEvent::KnownSale(fact) => self.apply_known_sale(fact),
            TimelineEvent::ComputeSale(request) => self.apply_compute_sale(request),
            TimelineEvent::KnownReturn(fact) => {
                let state = self.snapshot.state_mut(&fact.sku);
                state.units += fact.units;
                state.value += fact.cost;
            }
        }
    }

    fn apply_bill(&mut self, bill: &BillEvent, po_units: &BTreeMap<String, BTreeMap<String, i64>>) {
        match bill {
            // Brand costs go through the brand P&L path, not inventory.
            BillEvent::BrandCost { .. } => {}
            BillEvent::Manufacturing {
                sku,
                units,
                cost_cents,
                ..
            } => {
                let state = self.snapshot.state_mut(sku);
                state.units += units;
                state.value.manufacturing += cost_cents;
            }
            BillEvent::ComponentCost {
                po_number,
                sku,
                component,
                cost_cents,
                ..
            } => self.apply_component_cost(po_number, sku, *component, *cost_cents),
            BillEvent::PooledCost {
                po_number,
                component,
                cost_cents,
                ..
            } => self.apply_pooled_cost(po_number, *component, *cost_cents, po_units),
        }
    }

    fn apply_component_cost(
        &mut self,
        po_number: &str,
        sku: &str,
        component: CostComponent,
        cost_cents: Cents,
    ) {
        if self.snapshot.units(sku) <= 0 {
            self.block(LedgerBlock::LateCostOnHandZero {
                sku: sku.to_string(),
                po_number: po_number.to_string(),
                component,
                cost_cents,
            });
            return;
        }
        *self.snapshot.state_mut(sku).value.get_mut(component) += cost_cents;
    }

    fn apply_pooled_cost(
        &mut self,
        po_number: &str,
        component: CostComponent,
        cost_cents: Cents,
        po_units: &BTreeMap<String, BTreeMap<String, i64>>,
    ) {
        let weights: Vec<(&str, i64)> = po_units
            .get(po_number)
            .map(|skus| skus.iter().map(|(sku, units)| (sku.as_str(), *units)).collect())
            .unwrap_or_default();

        let shares = match allocate(cost_cents, &weights) {
            Ok(shares) => shares,
            Err(err) => {
                let reason = match err {
                    AllocationError::EmptyWeights => "has no SKU units".to_string(),
                    AllocationError::ZeroTotalWeight => "has zero units ordered".to_string(),
                    other => other.to_string(),
                };
                self.block(LedgerBlock::MissingCostBasis {
                    sku: None,
                    order_id: None,
                    po_number: Some(po_number.to_string()),
                    details: format!(
                        "Cannot spread {component} cost of {cost_cents} cents: PO {po_number} {reason}"
                    ),
                });
                return;
            }
        };

        for (sku, share) in shares {
            if share != 0 {
                self.apply_component_cost(po_number, sku, component, share);
            }
        }
    }

    fn apply_known_sale(&mut self, fact: &KnownCostFact) {
        let on_hand = self.snapshot.units(&fact.sku);
        if fact.units > on_hand {
            self.block(LedgerBlock::NegativeInventory {
                sku: fact.sku.clone(),
                order_id: fact.order_id.clone(),
                requested_units: fact.units,
                on_hand_units: on_hand,
            });
            return;
        }
        let state = self.snapshot.state_mut(&fact.sku);
        state.units -= fact.units;
        state.value -= fact.cost;
    }

    fn apply_compute_sale(&mut self, request: &ComputeSaleRequest) {
        let on_hand = self.snapshot.units(&request.sku);
        if on_hand <= 0 {
            self.block(LedgerBlock::MissingCostBasis {
                sku: Some(request.sku.clone()),
                order_id: Some(request.order_id.clone()),
                po_number: None,
                details: format!(
                    "Order {} sold {} units of {} with no units on hand to cost against",
                    request.order_id, request.units, request.sku
                ),
            });
            return;
        }
        if request.units > on_hand {
            self.block(LedgerBlock::NegativeInventory {
                sku: request.sku.clone(),
                order_id: request.order_id.clone(),
                requested_units: request.units,
                on_hand_units: on_hand,
            });
            return;
        }

        let state = self.snapshot.state_mut(&request.sku);
        let removed = proportional_removal(&state.value, request.units, on_hand);
        state.units -= request.units;
        state.value -= removed;

        self.sale_costs.push(SaleCost {
            date: request.date,
            order_id: request.order_id.clone(),
            sku: request.sku.clone(),
            units: request.units,
            cost: removed,
        });
    }

    fn block(&mut self, block: LedgerBlock) {
        debug!(code = %block.code(), sku = ?block.sku(), "ledger block");
        self.blocks.push(block);
    }
}

/// Value to remove from `held` when `units` of `on_hand` leave inventory.
///
/// Each component is split independently between the sold and kept slices;
/// the kept slice absorbs the remainder.
fn proportional_removal(held: &ComponentCosts, units: i64, on_hand: i64) -> ComponentCosts {
    ComponentCosts::from_fn(|component| {
        let value = held.get(component);
        let sold = allocate(value, &[("sold", units), ("kept", on_hand - units)])
            .map_or(0, |shares| shares[0].1);
        clamp_removal(sold, value)
    })
}

/// Never remove more than is held for a component, and never flip its sign.
pub(crate) fn clamp_removal(removed: Cents, held: Cents) -> Cents {
    if held >= 0 {
        removed.clamp(0, held)
    } else {
        removed.clamp(held, 0)
    }
}

fn validate_inputs(
    bills: &ParsedBills,
    known_sales: &[KnownCostFact],
    known_returns: &[KnownCostFact],
    compute_sales: &[ComputeSaleRequest],
) -> Result<(), LedgerError> {
    let invalid = |context: String, units: i64| LedgerError::InvalidUnits { context, units };

    for bill in &bills.events {
        if let BillEvent::Manufacturing {
            po_number,
            sku,
            units,
            ..
        } = bill
            && *units <= 0
        {
            return Err(invalid(format!("manufacturing bill {po_number} ({sku})"), *units));
        }
    }
    for (po_number, skus) in &bills.po_units_by_sku {
        if let Some((sku, units)) = skus.iter().find(|(_, units)| **units < 0) {
            return Err(LedgerError::NegativePoUnits {
                po_number: po_number.clone(),
                sku: sku.clone(),
                units: *units,
            });
        }
    }
    for fact in known_sales {
        if fact.units <= 0 {
            return Err(invalid(format!("known sale {} ({})", fact.order_id, fact.sku), fact.units));
        }
    }
    for fact in known_returns {
        if fact.units <= 0 {
            return Err(invalid(format!("known return {} ({})", fact.order_id, fact.sku), fact.units));
        }
    }
    for request in compute_sales {
        if request.units <= 0 {
            return Err(invalid(
                format!("compute sale {} ({})", request.order_id, request.sku),
                request.units,
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    use crate::blocks::BlockCode;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 2, d).unwrap()
    }

    fn manufacturing(d: u32, po: &str, sku: &str, units: i64, cost: Cents) -> BillEvent {
        BillEvent::Manufacturing {
            date: day(d),
            po_number: po.into(),
            sku: sku.into(),
            units,
            cost_cents: cost,
        }
    }

    fn compute(d: u32, order: &str, sku: &str, units: i64) -> ComputeSaleRequest {
        ComputeSaleRequest {
            date: day(d),
            order_id: order.into(),
            sku: sku.into(),
            units,
        }
    }

    fn known(d: u32, order: &str, sku: &str, units: i64, cost: ComponentCosts) -> KnownCostFact {
        KnownCostFact {
            date: day(d),
            order_id: order.into(),
            sku: sku.into(),
            units,
            cost,
        }
    }

    fn bills(events: Vec<BillEvent>) -> ParsedBills {
        ParsedBills {
            events,
            po_units_by_sku: BTreeMap::new(),
        }
    }

    #[test]
    fn test_compute_sale_removes_average_cost() {
        let bills = bills(vec![manufacturing(1, "PO-1", "X", 100, 10_000)]);
        let sales = vec![compute(2, "O-1", "X", 40)];

        let outcome = InventoryLedger::replay(&bills, &[], &[], &sales).unwrap();

        assert!(outcome.blocks.is_empty());
        assert_eq!(outcome.sale_costs.len(), 1);
        assert_eq!(outcome.sale_costs[0].cost.manufacturing, 4_000);
        assert_eq!(outcome.snapshot.units("X"), 60);
        assert_eq!(outcome.snapshot.value("X").manufacturing, 6_000);
    }

    #[test]
    fn test_compute_sale_without_stock_is_missing_cost_basis() {
        let sales = vec![compute(2, "O-1", "Y", 10)];

        let outcome = InventoryLedger::replay(&ParsedBills::default(), &[], &[], &sales).unwrap();

        assert_eq!(outcome.blocks.len(), 1);
        assert_eq!(outcome.blocks[0].code(), BlockCode::MissingCostBasis);
        assert!(outcome.sale_costs.is_empty());
        assert_eq!(outcome.snapshot.units("Y"), 0);
    }

    #[test]
    fn test_compute_sale_beyond_stock_is_negative_inventory() {
        let bills = bills(vec![manufacturing(1, "PO-1", "X", 3, 300)]);
        let sales = vec![compute(2, "O-1", "X", 5)];

        let outcome = InventoryLedger::replay(&bills, &[], &[], &sales).unwrap();

        assert_eq!(outcome.blocks.len(), 1);
        assert_eq!(outcome.blocks[0].code(), BlockCode::NegativeInventory);
        assert_eq!(outcome.snapshot.units("X"), 3);
        assert_eq!(outcome.snapshot.value("X").manufacturing, 300);
    }

    #[test]
    fn test_known_sale_beyond_stock_is_not_applied() {
        let bills = bills(vec![manufacturing(1, "PO-1", "X", 3, 300)]);
        let sales = vec![known(
            2,
            "O-1",
            "X",
            5,
            ComponentCosts::single(CostComponent::Manufacturing, 500),
        )];

        let outcome = InventoryLedger::replay(&bills, &sales, &[], &[]).unwrap();

        assert_eq!(
            outcome.blocks,
            vec![LedgerBlock::NegativeInventory {
                sku: "X".into(),
                order_id: "O-1".into(),
                requested_units: 5,
                on_hand_units: 3,
            }]
        );
        assert_eq!(outcome.snapshot.units("X"), 3);
        assert_eq!(outcome.snapshot.value("X").manufacturing, 300);
    }

    #[test]
    fn test_known_sale_and_return_apply_supplied_cost() {
        let bills = bills(vec![manufacturing(1, "PO-1", "X", 10, 1_000)]);
        let cost = ComponentCosts::single(CostComponent::Manufacturing, 250);
        let sales = vec![known(2, "O-1", "X", 2, cost)];
        let returns = vec![known(3, "O-1", "X", 1, ComponentCosts::single(CostComponent::Manufacturing, 125))];

        let outcome = InventoryLedger::replay(&bills, &sales, &returns, &[]).unwrap();

        assert!(outcome.blocks.is_empty());
        assert_eq!(outcome.snapshot.units("X"), 9);
        assert_eq!(outcome.snapshot.value("X").manufacturing, 875);
    }

    #[test]
    fn test_return_applies_even_with_zero_on_hand() {
        let returns = vec![known(1, "O-1", "R", 2, ComponentCosts::single(CostComponent::Duty, 40))];
        let outcome = InventoryLedger::replay(&ParsedBills::default(), &[], &returns, &[]).unwrap();
        assert!(outcome.blocks.is_empty());
        assert_eq!(outcome.snapshot.units("R"), 2);
        assert_eq!(outcome.snapshot.value("R").duty, 40);
    }

    #[test]
    fn test_component_cost_before_units_is_late() {
        let bills = bills(vec![
            BillEvent::ComponentCost {
                date: day(1),
                po_number: "PO-1".into(),
                sku: "Z".into(),
                component: CostComponent::Freight,
                cost_cents: 500,
            },
            manufacturing(2, "PO-1", "Z", 10, 1_000),
        ]);

        let outcome = InventoryLedger::replay(&bills, &[], &[], &[]).unwrap();

        assert_eq!(outcome.blocks.len(), 1);
        assert_eq!(outcome.blocks[0].code(), BlockCode::LateCostOnHandZero);
        assert_eq!(outcome.snapshot.value("Z").freight, 0);
        assert_eq!(outcome.snapshot.units("Z"), 10);
    }

    #[test]
    fn test_same_day_component_cost_lands_after_manufacturing() {
        let bills = bills(vec![
            BillEvent::ComponentCost {
                date: day(1),
                po_number: "PO-1".into(),
                sku: "Z".into(),
                component: CostComponent::Freight,
                cost_cents: 500,
            },
            manufacturing(1, "PO-1", "Z", 10, 1_000),
        ]);

        let outcome = InventoryLedger::replay(&bills, &[], &[], &[]).unwrap();

        assert!(outcome.blocks.is_empty());
        assert_eq!(outcome.snapshot.value("Z").freight, 500);
    }

    #[test]
    fn test_pooled_cost_split_by_po_units() {
        let mut parsed = bills(vec![
            manufacturing(1, "PO-1", "A", 30, 3_000),
            manufacturing(1, "PO-1", "B", 10, 1_000),
            BillEvent::PooledCost {
                date: day(2),
                po_number: "PO-1".into(),
                component: CostComponent::Freight,
                cost_cents: 1_001,
            },
        ]);
        parsed.po_units_by_sku.insert(
            "PO-1".into(),
            BTreeMap::from([("A".to_string(), 30), ("B".to_string(), 10)]),
        );

        let outcome = InventoryLedger::replay(&parsed, &[], &[], &[]).unwrap();

        assert!(outcome.blocks.is_empty());
        // 1001 * 30/40 = 750.75 -> 750; B absorbs the remainder.
        assert_eq!(outcome.snapshot.value("A").freight, 750);
        assert_eq!(outcome.snapshot.value("B").freight, 251);
    }

    #[test]
    fn test_pooled_cost_reports_each_sku_without_stock() {
        let mut parsed = bills(vec![
            manufacturing(1, "PO-1", "A", 1, 100),
            BillEvent::PooledCost {
                date: day(2),
                po_number: "PO-1".into(),
                component: CostComponent::Duty,
                cost_cents: 200,
            },
        ]);
        parsed.po_units_by_sku.insert(
            "PO-1".into(),
            BTreeMap::from([("A".to_string(), 1), ("B".to_string(), 1)]),
        );

        let outcome = InventoryLedger::replay(&parsed, &[], &[], &[]).unwrap();

        assert_eq!(outcome.snapshot.value("A").duty, 100);
        assert_eq!(
            outcome.blocks,
            vec![LedgerBlock::LateCostOnHandZero {
                sku: "B".into(),
                po_number: "PO-1".into(),
                component: CostComponent::Duty,
                cost_cents: 100,
            }]
        );
    }

    #[test]
    fn test_pooled_cost_for_unknown_po_is_missing_cost_basis() {
        let parsed = bills(vec![BillEvent::PooledCost {
            date: day(2),
            po_number: "PO-404".into(),
            component: CostComponent::Freight,
            cost_cents: 200,
        }]);

        let outcome = InventoryLedger::replay(&parsed, &[], &[], &[]).unwrap();

        assert_eq!(outcome.blocks.len(), 1);
        assert_eq!(outcome.blocks[0].code(), BlockCode::MissingCostBasis);
    }

    #[test]
    fn test_brand_cost_is_ignored() {
        let parsed = bills(vec![BillEvent::BrandCost {
            date: day(1),
            brand: "Acme".into(),
            amount_cents: 900,
        }]);
        let outcome = InventoryLedger::replay(&parsed, &[], &[], &[]).unwrap();
        assert!(outcome.snapshot.is_empty());
        assert!(outcome.blocks.is_empty());
    }

    #[test]
    fn test_selling_everything_drains_all_value() {
        let parsed = bills(vec![
            manufacturing(1, "PO-1", "X", 3, 1_000),
            BillEvent::ComponentCost {
                date: day(1),
                po_number: "PO-1".into(),
                sku: "X".into(),
                component: CostComponent::Freight,
                cost_cents: 7,
            },
        ]);
        let sales = vec![compute(2, "O-1", "X", 1), compute(3, "O-2", "X", 2)];

        let outcome = InventoryLedger::replay(&parsed, &[], &[], &sales).unwrap();

        // 1000/3 -> 333, 7/3 -> 2 on the first sale; the last sale takes the rest.
        assert_eq!(outcome.sale_costs[0].cost.manufacturing, 333);
        assert_eq!(outcome.sale_costs[0].cost.freight, 2);
        assert_eq!(outcome.sale_costs[1].cost.manufacturing, 667);
        assert_eq!(outcome.sale_costs[1].cost.freight, 5);
        assert_eq!(outcome.snapshot.units("X"), 0);
        assert!(outcome.snapshot.value("X").is_zero());
    }

    #[test]
    fn test_clamp_removal_never_exceeds_held() {
        assert_eq!(clamp_removal(12, 10), 10);
        assert_eq!(clamp_removal(-3, 10), 0);
        assert_eq!(clamp_removal(4, 10), 4);
        assert_eq!(clamp_removal(-12, -10), -10);
        assert_eq!(clamp_removal(3, -10), 0);
        assert_eq!(clamp_removal(0, 0), 0);
    }

    #[test]
    fn test_removal_from_negative_component_stays_within_held() {
        // A known sale carried more freight than was held, leaving freight negative.
        let parsed = bills(vec![manufacturing(1, "PO-1", "X", 10, 1_000)]);
        let known_sales = vec![known(
            2,
            "O-1",
            "X",
            5,
            ComponentCosts {
                manufacturing: 500,
                freight: 9,
                ..ComponentCosts::ZERO
            },
        )];
        let sales = vec![compute(3, "O-2", "X", 3)];

        let outcome = InventoryLedger::replay(&parsed, &known_sales, &[], &sales).unwrap();

        let removed = outcome.sale_costs[0].cost;
        assert_eq!(removed.manufacturing, 300);
        // -9 * 3/5 = -5.4 -> -5, within [-9, 0].
        assert_eq!(removed.freight, -5);
        assert_eq!(outcome.snapshot.value("X").freight, -4);
    }

    #[test]
    fn test_invalid_units_rejected_before_replay() {
        let parsed = bills(vec![manufacturing(1, "PO-1", "X", 0, 100)]);
        let err = InventoryLedger::replay(&parsed, &[], &[], &[]).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_UNITS");

        let sales = vec![compute(1, "O-1", "X", -2)];
        let err = InventoryLedger::replay(&ParsedBills::default(), &[], &[], &sales).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidUnits { units: -2, .. }));
    }

    #[test]
    fn test_negative_po_units_rejected() {
        let mut parsed = ParsedBills::default();
        parsed
            .po_units_by_sku
            .insert("PO-1".into(), BTreeMap::from([("A".to_string(), -1)]));
        let err = InventoryLedger::replay(&parsed, &[], &[], &[]).unwrap_err();
        assert_eq!(err.error_code(), "NEGATIVE_PO_UNITS");
    }

    #[test]
    fn test_blocks_accumulate_in_timeline_order() {
        let sales = vec![compute(5, "late", "Q", 1), compute(1, "early", "Q", 1)];
        let outcome = InventoryLedger::replay(&ParsedBills::default(), &[], &[], &sales).unwrap();
        let orders: Vec<_> = outcome
            .blocks
            .iter()
            .map(|b| match b {
                LedgerBlock::MissingCostBasis { order_id, .. } => order_id.clone().unwrap(),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(orders, vec!["early", "late"]);
    }
}
