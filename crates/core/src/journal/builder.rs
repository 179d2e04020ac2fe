//! Journal line builders for COGS and P&L reclass entries.
//!
//! Both builders emit lines in pairs and skip a pair entirely when either
//! side cannot be resolved, so their output is always balanced.

use std::collections::BTreeMap;

use tracing::debug;

use cogsbook_shared::AccountMapping;
use cogsbook_shared::types::{Cents, ComponentCosts, CostComponent};

use super::chart::ChartOfAccounts;
use super::entry::{JournalLine, PostingType};
use crate::blocks::ProcessingBlock;
use crate::fees::{BrandAmount, FeeBucket};

/// Resolves a brand sub-account, recording a block if it is missing.
fn resolve_sub_account(
    chart: &ChartOfAccounts,
    parent_id: &str,
    account_name: &str,
    brand: &str,
    blocks: &mut Vec<ProcessingBlock>,
) -> Option<(String, String)> {
    if let Some(account) = chart.find_sub_account(parent_id, account_name) {
        return Some((account.id.clone(), account.name.clone()));
    }
    blocks.push(ProcessingBlock::MissingBrandSubaccount {
        parent_account_id: parent_id.to_string(),
        account_name: account_name.to_string(),
        brand: brand.to_string(),
    });
    None
}

/// Debit `debit`, credit `credit`, for `amount` (already non-negative).
fn line_pair(
    debit: (String, String),
    credit: (String, String),
    amount: Cents,
    description: &str,
) -> [JournalLine; 2] {
    [
        JournalLine {
            account_id: debit.0,
            account_name: debit.1,
            posting_type: PostingType::Debit,
            amount_cents: amount,
            description: description.to_string(),
        },
        JournalLine {
            account_id: credit.0,
            account_name: credit.1,
            posting_type: PostingType::Credit,
            amount_cents: amount,
            description: description.to_string(),
        },
    ]
}

/// `brands` first, then any other brand present in `totals`.
fn brand_order<'a, V>(brands: &'a [String], totals: &'a BTreeMap<String, V>) -> Vec<&'a str> {
    let mut order: Vec<&str> = brands.iter().map(String::as_str).collect();
    for brand in totals.keys() {
        if !order.contains(&brand.as_str()) {
            order.push(brand);
        }
    }
    order
}

/// Builds COGS lines from per-brand component totals.
///
/// A positive total moves value out of inventory into COGS. A negative total
/// (net returns) moves it back.
pub fn build_cogs_lines(
    cogs_by_brand: &BTreeMap<String, ComponentCosts>,
    brands: &[String],
    mapping: &AccountMapping,
    chart: &ChartOfAccounts,
    blocks: &mut Vec<ProcessingBlock>,
) -> Vec<JournalLine> {
    let mut lines = Vec::new();

    for brand in brand_order(brands, cogs_by_brand) {
        let Some(costs) = cogs_by_brand.get(brand) else {
            continue;
        };
        for (component, amount) in costs.iter() {
            if amount == 0 {
                continue;
            }
            let inventory_parent = mapping.inventory.get(component);
            let cogs_parent = mapping.cogs.get(component);
            let (Some(inventory_parent), Some(cogs_parent)) = (inventory_parent, cogs_parent) else {
                if inventory_parent.is_none() {
                    blocks.push(missing_mapping("inventory", component, brand));
                }
                if cogs_parent.is_none() {
                    blocks.push(missing_mapping("cogs", component, brand));
                }
                continue;
            };

            let account_name = format!("{} - {brand}", component.label());
            let inventory = resolve_sub_account(chart, inventory_parent, &account_name, brand, blocks);
            let cogs = resolve_sub_account(chart, cogs_parent, &account_name, brand, blocks);
            let (Some(inventory), Some(cogs)) = (inventory, cogs) else {
                continue;
            };

            let description = format!("{} COGS - {brand}", component.label());
            let pair = if amount > 0 {
                line_pair(cogs, inventory, amount, &description)
            } else {
                line_pair(inventory, cogs, amount.abs(), &description)
            };
            lines.extend(pair);
        }
    }
    lines
}

fn missing_mapping(side: &str, component: CostComponent, brand: &str) -> ProcessingBlock {
    let key = match component {
        CostComponent::Manufacturing => "manufacturing",
        CostComponent::Freight => "freight",
        CostComponent::Duty => "duty",
        CostComponent::Accessory => "accessory",
    };
    ProcessingBlock::MissingAccountMapping {
        mapping_key: format!("{side}.{key}"),
        brand: brand.to_string(),
    }
}

/// Builds P&L reclass lines moving bucket amounts onto brand sub-accounts.
///
/// Buckets without a configured parent are not journaled. A positive amount
/// debits the parent and credits the brand; a negative amount reverses that.
pub fn build_pnl_lines(
    allocations: &BTreeMap<FeeBucket, Vec<BrandAmount>>,
    mapping: &AccountMapping,
    chart: &ChartOfAccounts,
    blocks: &mut Vec<ProcessingBlock>,
) -> Vec<JournalLine> {
    let mut lines = Vec::new();

    for (bucket, amounts) in allocations {
        let Some(parent_id) = bucket.parent_account(&mapping.pnl) else {
            debug!(bucket = %bucket, key = bucket.mapping_key(), "bucket has no parent account, skipped");
            continue;
        };
        let parent = (parent_id.to_string(), chart.display_name(parent_id).to_string());

        for BrandAmount {
            brand,
            amount_cents,
        } in amounts
        {
            if *amount_cents == 0 {
                continue;
            }
            let account_name = format!("{} - {brand}", bucket.label());
            let Some(sub_account) = resolve_sub_account(chart, parent_id, &account_name, brand, blocks)
            else {
                continue;
            };

            let description = format!("{} - {brand}", bucket.label());
            let pair = if *amount_cents > 0 {
                line_pair(parent.clone(), sub_account, *amount_cents, &description)
            } else {
                line_pair(sub_account, parent.clone(), amount_cents.abs(), &description)
            };
            lines.extend(pair);
        }
    }
    lines
}
