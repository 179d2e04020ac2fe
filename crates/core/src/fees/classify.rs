//! Settlement row classification and brand attribution.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use cogsbook_shared::types::Cents;

use super::brand::BrandLookup;
use super::bucket::{FeeBucket, bucket_for};
use crate::allocation::allocate;
use crate::blocks::ProcessingBlock;

/// One line item from a settlement report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRow {
    /// Settlement invoice the row belongs to.
    pub invoice_id: String,
    /// Marketplace, such as `US`.
    pub market: String,
    /// Line-item description used for classification.
    pub description: String,
    /// SKU, when the row is for a specific product.
    #[serde(default)]
    pub sku: Option<String>,
    /// Units on the row.
    #[serde(default)]
    pub quantity: i64,
    /// Net amount in cents.
    pub net_amount_cents: Cents,
}

/// A brand's share of a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandAmount {
    /// Brand.
    pub brand: String,
    /// Amount in cents.
    pub amount_cents: Cents,
}

/// Result of classifying one invoice's rows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeClassification {
    /// Per bucket, the nonzero brand amounts.
    pub allocations: BTreeMap<FeeBucket, Vec<BrandAmount>>,
    /// Units sold per brand, the weights used for SKU-less rows.
    pub units_sold_by_brand: Vec<(String, i64)>,
    /// Rows that could not be attributed.
    pub blocks: Vec<ProcessingBlock>,
}

impl FeeClassification {
    /// Amount attributed to `brand` under `bucket`.
    #[must_use]
    pub fn amount(&self, bucket: FeeBucket, brand: &str) -> Cents {
        self.allocations
            .get(&bucket)
            .and_then(|amounts| amounts.iter().find(|a| a.brand == brand))
            .map_or(0, |a| a.amount_cents)
    }
}

/// Rows that cannot be classified together.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassifyError {
    /// Rows span more than one invoice.
    #[error("Settlement rows span invoices {expected} and {found}")]
    InvoiceMismatch {
        /// Invoice of the header or first row.
        expected: String,
        /// Conflicting invoice.
        found: String,
    },

    /// Rows span more than one market.
    #[error("Settlement rows span markets {expected} and {found}")]
    MarketMismatch {
        /// Market of the header or first row.
        expected: String,
        /// Conflicting market.
        found: String,
    },
}

impl ClassifyError {
    /// Returns the error code for reporting.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvoiceMismatch { .. } => "INVOICE_MISMATCH",
            Self::MarketMismatch { .. } => "MARKET_MISMATCH",
        }
    }
}

/// Brand totals accumulated per bucket, in a stable brand order.
struct BrandLedger {
    order: Vec<String>,
    totals: BTreeMap<FeeBucket, BTreeMap<String, Cents>>,
}

impl BrandLedger {
    fn new(order: Vec<String>) -> Self {
        Self {
            order,
            totals: BTreeMap::new(),
        }
    }

    fn add(&mut self, bucket: FeeBucket, brand: &str, amount: Cents) {
        if !self.order.iter().any(|b| b == brand) {
            self.order.push(brand.to_string());
        }
        *self
            .totals
            .entry(bucket)
            .or_default()
            .entry(brand.to_string())
            .or_default() += amount;
    }

    fn finish(self) -> BTreeMap<FeeBucket, Vec<BrandAmount>> {
        let Self { order, totals } = self;
        totals
            .into_iter()
            .filter_map(|(bucket, by_brand)| {
                let amounts: Vec<BrandAmount> = order
                    .iter()
                    .filter_map(|brand| {
                        let amount = by_brand.get(brand).copied().unwrap_or(0);
                        (amount != 0).then(|| BrandAmount {
                            brand: brand.clone(),
                            amount_cents: amount,
                        })
                    })
                    .collect();
                (!amounts.is_empty()).then_some((bucket, amounts))
            })
            .collect()
    }
}

/// Checks that every row belongs to the given invoice and market.
///
/// # Errors
///
/// Returns the first `InvoiceMismatch` or `MarketMismatch` found.
pub fn check_rows_match(
    rows: &[SettlementRow],
    invoice_id: &str,
    market: &str,
) -> Result<(), ClassifyError> {
    for row in rows {
        if row.invoice_id != invoice_id {
            return Err(ClassifyError::InvoiceMismatch {
                expected: invoice_id.to_string(),
                found: row.invoice_id.clone(),
            });
        }
        if row.market != market {
            return Err(ClassifyError::MarketMismatch {
                expected: market.to_string(),
                found: row.market.clone(),
            });
        }
    }
    Ok(())
}

/// Classifies settlement rows into buckets and attributes them to brands.
///
/// Rows with a SKU go wholly to that SKU's brand. Rows without one are spread
/// across all brands by units sold on this invoice. Descriptions no rule
/// recognises are dropped.
///
/// # Errors
///
/// Returns `ClassifyError` if the rows do not share one invoice and one market.
pub fn classify(
    rows: &[SettlementRow],
    brands: &dyn BrandLookup,
) -> Result<FeeClassification, ClassifyError> {
    let Some(first) = rows.first() else {
        return Ok(FeeClassification::default());
    };
    check_rows_match(rows, &first.invoice_id, &first.market)?;

    let units_sold_by_brand = units_sold_by_brand(rows, brands);
    let mut ledger = BrandLedger::new(brands.all_brands());
    let mut blocks = Vec::new();

    for row in rows {
        let Some(bucket) = bucket_for(&row.description) else {
            debug!(description = %row.description, "unclassified settlement row dropped");
            continue;
        };

        match &row.sku {
            Some(sku) => match brands.brand_for_sku(sku) {
                Some(brand) => ledger.add(bucket, &brand, row.net_amount_cents),
                None => blocks.push(ProcessingBlock::MissingSkuMapping {
                    sku: sku.clone(),
                    context: format!("settlement row \"{}\"", row.description),
                }),
            },
            None => match allocate(row.net_amount_cents, &units_sold_by_brand) {
                Ok(shares) => {
                    for (brand, share) in shares {
                        if share != 0 {
                            ledger.add(bucket, &brand, share);
                        }
                    }
                }
                Err(err) => {
                    debug!(error = %err, description = %row.description, "pooled row not allocated");
                    blocks.push(ProcessingBlock::PnlAllocationError {
                        bucket,
                        description: row.description.clone(),
                        amount_cents: row.net_amount_cents,
                    });
                }
            },
        }
    }

    Ok(FeeClassification {
        allocations: ledger.finish(),
        units_sold_by_brand,
        blocks,
    })
}

/// Units sold per brand from Amazon Sales rows that carry a SKU.
///
/// Every brand from `all_brands` appears, even with zero units. Brands only
/// reachable through the SKU map are appended in first-seen order.
fn units_sold_by_brand(rows: &[SettlementRow], brands: &dyn BrandLookup) -> Vec<(String, i64)> {
    let mut weights: Vec<(String, i64)> = brands.all_brands().into_iter().map(|b| (b, 0)).collect();

    for row in rows {
        if bucket_for(&row.description) != Some(FeeBucket::AmazonSales) || row.quantity <= 0 {
            continue;
        }
        let Some(brand) = row.sku.as_deref().and_then(|sku| brands.brand_for_sku(sku)) else {
            continue;
        };
        match weights.iter_mut().find(|(b, _)| *b == brand) {
            Some((_, units)) => *units += row.quantity,
            None => weights.push((brand, row.quantity)),
        }
    }
    weights
}
