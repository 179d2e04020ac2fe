//! Turning settlement sales and refunds into ledger inputs against history.

use std::collections::BTreeSet;

use tracing::debug;

use cogsbook_shared::types::ComponentCosts;

use super::types::{LedgerHistory, SettlementRefund, SettlementSale};
use crate::allocation::allocate;
use crate::blocks::ProcessingBlock;
use crate::ledger::{ComputeSaleRequest, KnownCostFact};

fn same_line(fact: &KnownCostFact, order_id: &str, sku: &str) -> bool {
    fact.order_id == order_id && fact.sku == sku
}

/// Sales not yet costed, as compute requests.
///
/// A sale whose `(order_id, sku)` is already in history, or repeats an
/// earlier line of the same invoice, is reported and dropped.
pub fn sales_to_compute(
    sales: &[SettlementSale],
    history: &LedgerHistory,
    blocks: &mut Vec<ProcessingBlock>,
) -> Vec<ComputeSaleRequest> {
    let mut seen: BTreeSet<(&str, &str)> = BTreeSet::new();
    let mut requests = Vec::with_capacity(sales.len());

    for sale in sales {
        let key = (sale.order_id.as_str(), sale.sku.as_str());
        let costed = history
            .known_sales
            .iter()
            .any(|fact| same_line(fact, key.0, key.1));
        if costed || !seen.insert(key) {
            blocks.push(ProcessingBlock::OrderAlreadyProcessed {
                order_id: sale.order_id.clone(),
                sku: sale.sku.clone(),
            });
            continue;
        }
        requests.push(ComputeSaleRequest {
            date: sale.date,
            order_id: sale.order_id.clone(),
            sku: sale.sku.clone(),
            units: sale.units,
        });
    }
    requests
}

/// Refunds matched to costed sales, as known returns.
///
/// `known_sales` is every sale with a settled cost: history plus any sales
/// costed earlier in the same run. Only sales dated on or before the refund
/// count. A refund returns the original sale's per-unit cost: each component
/// of the sale cost is split between the returned units and the rest, the
/// returned slice taking the truncated share.
pub fn refunds_to_returns(
    refunds: &[SettlementRefund],
    known_sales: &[KnownCostFact],
    known_returns: &[KnownCostFact],
    blocks: &mut Vec<ProcessingBlock>,
) -> Vec<KnownCostFact> {
    let mut returns: Vec<KnownCostFact> = Vec::new();

    for refund in refunds {
        let (order_id, sku) = (refund.order_id.as_str(), refund.sku.as_str());
        let sales: Vec<&KnownCostFact> = known_sales
            .iter()
            .filter(|fact| same_line(fact, order_id, sku) && fact.date <= refund.date)
            .collect();
        if sales.is_empty() {
            blocks.push(ProcessingBlock::RefundUnmatched {
                order_id: refund.order_id.clone(),
                sku: refund.sku.clone(),
            });
            continue;
        }

        let sold_units: i64 = sales.iter().map(|f| f.units).sum();
        let sold_cost = sales
            .iter()
            .fold(ComponentCosts::ZERO, |acc, f| acc + f.cost);
        let returned_units: i64 = known_returns
            .iter()
            .chain(returns.iter())
            .filter(|fact| same_line(fact, order_id, sku))
            .map(|fact| fact.units)
            .sum();
        let refundable_units = sold_units - returned_units;

        if refund.units <= 0 || refund.units > refundable_units {
            blocks.push(ProcessingBlock::RefundPartial {
                order_id: refund.order_id.clone(),
                sku: refund.sku.clone(),
                requested_units: refund.units,
                refundable_units,
            });
            continue;
        }

        let cost = ComponentCosts::from_fn(|component| {
            allocate(
                sold_cost.get(component),
                &[("returned", refund.units), ("kept", sold_units - refund.units)],
            )
            .map_or(0, |shares| shares[0].1)
        });
        debug!(order_id, sku, units = refund.units, "refund matched to costed sale");

        returns.push(KnownCostFact {
            date: refund.date,
            order_id: refund.order_id.clone(),
            sku: refund.sku.clone(),
            units: refund.units,
            cost,
        });
    }
    returns
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::BlockCode;
    use chrono::NaiveDate;
    use cogsbook_shared::types::CostComponent;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn history() -> LedgerHistory {
        LedgerHistory {
            known_sales: vec![KnownCostFact {
                date: day(1),
                order_id: "111-A".into(),
                sku: "ACME-1".into(),
                units: 3,
                cost: ComponentCosts {
                    manufacturing: 1_000,
                    freight: 100,
                    duty: 0,
                    accessory: 0,
                },
            }],
            known_returns: Vec::new(),
        }
    }

    fn match_refunds(
        refunds: &[SettlementRefund],
        history: &LedgerHistory,
        blocks: &mut Vec<ProcessingBlock>,
    ) -> Vec<KnownCostFact> {
        refunds_to_returns(refunds, &history.known_sales, &history.known_returns, blocks)
    }

    fn refund(order_id: &str, sku: &str, units: i64) -> SettlementRefund {
        SettlementRefund {
            date: day(10),
            order_id: order_id.into(),
            sku: sku.into(),
            units,
        }
    }

    #[test]
    fn test_already_costed_sale_is_dropped() {
        let sales = vec![
            SettlementSale {
                date: day(9),
                order_id: "111-A".into(),
                sku: "ACME-1".into(),
                units: 3,
            },
            SettlementSale {
                date: day(9),
                order_id: "222-B".into(),
                sku: "ACME-1".into(),
                units: 1,
            },
        ];
        let mut blocks = Vec::new();

        let requests = sales_to_compute(&sales, &history(), &mut blocks);

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].order_id, "222-B");
        assert_eq!(blocks[0].code(), BlockCode::OrderAlreadyProcessed);
    }

    #[test]
    fn test_duplicate_sale_line_in_one_invoice() {
        let sale = SettlementSale {
            date: day(9),
            order_id: "333-C".into(),
            sku: "ACME-1".into(),
            units: 1,
        };
        let mut blocks = Vec::new();

        let requests = sales_to_compute(&[sale.clone(), sale], &LedgerHistory::default(), &mut blocks);

        assert_eq!(requests.len(), 1);
        assert_eq!(blocks.len(), 1);
    }

    #[test]
    fn test_refund_returns_proportional_cost() {
        let mut blocks = Vec::new();

        let returns = match_refunds(&[refund("111-A", "ACME-1", 1)], &history(), &mut blocks);

        assert!(blocks.is_empty());
        assert_eq!(returns.len(), 1);
        assert_eq!(returns[0].cost.get(CostComponent::Manufacturing), 333);
        assert_eq!(returns[0].cost.get(CostComponent::Freight), 33);
    }

    #[test]
    fn test_full_refund_returns_full_cost() {
        let mut blocks = Vec::new();

        let returns = match_refunds(&[refund("111-A", "ACME-1", 3)], &history(), &mut blocks);

        assert_eq!(returns[0].cost.manufacturing, 1_000);
        assert_eq!(returns[0].cost.freight, 100);
    }

    #[test]
    fn test_unmatched_refund() {
        let mut blocks = Vec::new();

        let returns = match_refunds(&[refund("999-Z", "ACME-1", 1)], &history(), &mut blocks);

        assert!(returns.is_empty());
        assert_eq!(
            blocks,
            vec![ProcessingBlock::RefundUnmatched {
                order_id: "999-Z".into(),
                sku: "ACME-1".into(),
            }]
        );
    }

    #[test]
    fn test_refund_beyond_remaining_units_is_partial() {
        let mut history = history();
        history.known_returns.push(KnownCostFact {
            date: day(5),
            order_id: "111-A".into(),
            sku: "ACME-1".into(),
            units: 2,
            cost: ComponentCosts::ZERO,
        });
        let mut blocks = Vec::new();

        let returns = match_refunds(&[refund("111-A", "ACME-1", 2)], &history, &mut blocks);

        assert!(returns.is_empty());
        assert_eq!(
            blocks,
            vec![ProcessingBlock::RefundPartial {
                order_id: "111-A".into(),
                sku: "ACME-1".into(),
                requested_units: 2,
                refundable_units: 1,
            }]
        );
    }

    #[test]
    fn test_refunds_in_one_invoice_share_the_remaining_units() {
        let mut blocks = Vec::new();
        let refunds = [refund("111-A", "ACME-1", 2), refund("111-A", "ACME-1", 2)];

        let returns = match_refunds(&refunds, &history(), &mut blocks);

        assert_eq!(returns.len(), 1);
        assert_eq!(blocks[0].code(), BlockCode::RefundPartial);
    }

    #[test]
    fn test_refund_dated_before_its_sale_is_unmatched() {
        let mut blocks = Vec::new();
        let mut early = refund("111-A", "ACME-1", 1);
        early.date = NaiveDate::from_ymd_opt(2025, 2, 28).unwrap();

        let returns = match_refunds(&[early], &history(), &mut blocks);

        assert!(returns.is_empty());
        assert_eq!(blocks[0].code(), BlockCode::RefundUnmatched);
    }
}
