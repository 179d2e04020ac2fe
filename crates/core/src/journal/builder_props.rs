//! Property-based tests for the journal builders.
//!
//! - Balance: every built entry has equal debits and credits, whatever
//!   subset of accounts is missing from the chart
//! - Amounts: no line carries a negative amount

use std::collections::BTreeMap;

use chrono::NaiveDate;
use proptest::prelude::*;

use cogsbook_shared::types::{ComponentCosts, CostComponent};
use cogsbook_shared::{AccountMapping, ComponentAccounts, PnlAccounts};

use super::builder::{build_cogs_lines, build_pnl_lines};
use super::chart::{Account, ChartOfAccounts};
use super::entry::JournalEntryPreview;
use crate::fees::{BrandAmount, FeeBucket};

const BRANDS: [&str; 3] = ["Acme", "Nova", "Zephyr"];

fn component_accounts(prefix: &str) -> ComponentAccounts {
    ComponentAccounts {
        manufacturing: Some(format!("{prefix}-mfg")),
        freight: Some(format!("{prefix}-frt")),
        duty: Some(format!("{prefix}-duty")),
        accessory: Some(format!("{prefix}-acc")),
    }
}

fn mapping() -> AccountMapping {
    AccountMapping {
        inventory: component_accounts("inv"),
        cogs: component_accounts("cogs"),
        pnl: PnlAccounts {
            amazon_sales: Some("pnl-sales".into()),
            seller_fees: Some("pnl-fees".into()),
            ..PnlAccounts::default()
        },
    }
}

/// Every brand sub-account, minus the ones `drop` selects.
fn chart(drop: &[bool]) -> ChartOfAccounts {
    let mapping = mapping();
    let mut accounts = Vec::new();
    for brand in BRANDS {
        for component in CostComponent::ALL {
            for parent in [mapping.inventory.get(component), mapping.cogs.get(component)]
                .into_iter()
                .flatten()
            {
                accounts.push(Account {
                    id: format!("{parent}-{brand}"),
                    name: format!("{} - {brand}", component.label()),
                    parent_id: Some(parent.to_string()),
                });
            }
        }
        for (bucket, parent) in [
            (FeeBucket::AmazonSales, "pnl-sales"),
            (FeeBucket::SellerFees, "pnl-fees"),
        ] {
            accounts.push(Account {
                id: format!("{parent}-{brand}"),
                name: format!("{} - {brand}", bucket.label()),
                parent_id: Some(parent.to_string()),
            });
        }
    }
    let kept = accounts
        .into_iter()
        .enumerate()
        .filter(|(i, _)| !drop.get(*i).copied().unwrap_or(false))
        .map(|(_, a)| a)
        .collect();
    ChartOfAccounts::new(kept)
}

fn costs_strategy() -> impl Strategy<Value = ComponentCosts> {
    prop::array::uniform4(-50_000i64..50_000).prop_map(|[m, f, d, a]| ComponentCosts {
        manufacturing: m,
        freight: f,
        duty: d,
        accessory: a,
    })
}

fn entry(lines: Vec<super::entry::JournalLine>) -> JournalEntryPreview {
    JournalEntryPreview {
        txn_date: NaiveDate::from_ymd_opt(2025, 4, 30).unwrap(),
        doc_number: "TEST".into(),
        private_note: String::new(),
        lines,
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_cogs_entry_is_balanced(
        costs in prop::collection::vec(costs_strategy(), 3),
        drop in prop::collection::vec(any::<bool>(), 30),
    ) {
        let cogs_by_brand: BTreeMap<String, ComponentCosts> = BRANDS
            .iter()
            .zip(costs)
            .map(|(b, c)| ((*b).to_string(), c))
            .collect();
        let brands: Vec<String> = BRANDS.iter().map(|b| (*b).to_string()).collect();
        let mut blocks = Vec::new();

        let lines = build_cogs_lines(&cogs_by_brand, &brands, &mapping(), &chart(&drop), &mut blocks);
        let entry = entry(lines);

        prop_assert!(entry.is_balanced());
        prop_assert!(entry.validate_balanced().is_ok());
    }

    #[test]
    fn prop_pnl_entry_is_balanced(
        amounts in prop::collection::vec((0usize..3, -20_000i64..20_000), 0..12),
        drop in prop::collection::vec(any::<bool>(), 30),
    ) {
        let mut allocations: BTreeMap<FeeBucket, Vec<BrandAmount>> = BTreeMap::new();
        for (i, (brand, amount)) in amounts.into_iter().enumerate() {
            let bucket = match i % 3 {
                0 => FeeBucket::AmazonSales,
                1 => FeeBucket::SellerFees,
                _ => FeeBucket::Promotions,
            };
            allocations.entry(bucket).or_default().push(BrandAmount {
                brand: BRANDS[brand].to_string(),
                amount_cents: amount,
            });
        }
        let mut blocks = Vec::new();

        let lines = build_pnl_lines(&allocations, &mapping(), &chart(&drop), &mut blocks);
        let entry = entry(lines);

        prop_assert!(entry.lines.iter().all(|l| l.amount_cents >= 0));
        prop_assert!(entry.is_balanced());
    }
}
