//! Processing blocks.
//!
//! A block is a structured, non-throwing report of something wrong with the
//! data behind a settlement run. Some codes only warn; the rest stop the run
//! from being posted. The split lives in [`BlockCode::is_blocking`].

use std::fmt;

use serde::{Deserialize, Serialize};

use cogsbook_shared::types::{Cents, CostComponent};

use crate::fees::FeeBucket;
use crate::ledger::LedgerBlock;

/// Every block code a run can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BlockCode {
    /// No account mapping is configured at all.
    MissingSetup,
    /// A settlement row or sale names a SKU with no known brand.
    MissingSkuMapping,
    /// A parent account needed for a posting is not mapped.
    MissingAccountMapping,
    /// A brand sub-account does not exist in the chart of accounts.
    MissingBrandSubaccount,
    /// The invoice was already posted with identical input.
    AlreadyProcessed,
    /// The invoice was already posted with different input.
    InvoiceConflict,
    /// A sale was already costed by an earlier run.
    OrderAlreadyProcessed,
    /// A refund has no matching costed sale.
    RefundUnmatched,
    /// A refund returns more units than are left to return.
    RefundPartial,
    /// Bills could not be fetched.
    BillsFetchError,
    /// Bills could not be parsed.
    BillsParseError,
    /// A pooled fee could not be spread across brands.
    PnlAllocationError,
    /// A component cost arrived for a SKU with nothing on hand.
    LateCostOnHandZero,
    /// A sale or pooled cost had no cost basis.
    MissingCostBasis,
    /// A sale asked for more units than are on hand.
    NegativeInventory,
}

impl BlockCode {
    /// All codes, in declaration order.
    pub const ALL: [Self; 15] = [
        Self::MissingSetup,
        Self::MissingSkuMapping,
        Self::MissingAccountMapping,
        Self::MissingBrandSubaccount,
        Self::AlreadyProcessed,
        Self::InvoiceConflict,
        Self::OrderAlreadyProcessed,
        Self::RefundUnmatched,
        Self::RefundPartial,
        Self::BillsFetchError,
        Self::BillsParseError,
        Self::PnlAllocationError,
        Self::LateCostOnHandZero,
        Self::MissingCostBasis,
        Self::NegativeInventory,
    ];

    /// Returns the wire representation of the code.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MissingSetup => "MISSING_SETUP",
            Self::MissingSkuMapping => "MISSING_SKU_MAPPING",
            Self::MissingAccountMapping => "MISSING_ACCOUNT_MAPPING",
            Self::MissingBrandSubaccount => "MISSING_BRAND_SUBACCOUNT",
            Self::AlreadyProcessed => "ALREADY_PROCESSED",
            Self::InvoiceConflict => "INVOICE_CONFLICT",
            Self::OrderAlreadyProcessed => "ORDER_ALREADY_PROCESSED",
            Self::RefundUnmatched => "REFUND_UNMATCHED",
            Self::RefundPartial => "REFUND_PARTIAL",
            Self::BillsFetchError => "BILLS_FETCH_ERROR",
            Self::BillsParseError => "BILLS_PARSE_ERROR",
            Self::PnlAllocationError => "PNL_ALLOCATION_ERROR",
            Self::LateCostOnHandZero => "LATE_COST_ON_HAND_ZERO",
            Self::MissingCostBasis => "MISSING_COST_BASIS",
            Self::NegativeInventory => "NEGATIVE_INVENTORY",
        }
    }

    /// Returns true if a run carrying this code must not be posted.
    ///
    /// Adding a code forces a decision here: there is no wildcard arm.
    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        match self {
            Self::MissingSetup
            | Self::MissingSkuMapping
            | Self::MissingAccountMapping
            | Self::MissingBrandSubaccount
            | Self::AlreadyProcessed
            | Self::InvoiceConflict
            | Self::OrderAlreadyProcessed
            | Self::RefundUnmatched
            | Self::RefundPartial
            | Self::BillsFetchError
            | Self::BillsParseError
            | Self::NegativeInventory => true,
            Self::PnlAllocationError | Self::LateCostOnHandZero | Self::MissingCostBasis => false,
        }
    }
}

impl fmt::Display for BlockCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A block raised anywhere in a settlement run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingBlock {
    /// No account mapping is configured.
    MissingSetup,
    /// A SKU has no brand.
    MissingSkuMapping {
        /// The unmapped SKU.
        sku: String,
        /// Where the SKU was seen.
        context: String,
    },
    /// A parent account is missing from the mapping.
    MissingAccountMapping {
        /// Mapping key, such as `cogs.freight`.
        mapping_key: String,
        /// Brand whose posting needed it.
        brand: String,
    },
    /// A brand sub-account is missing from the chart of accounts.
    MissingBrandSubaccount {
        /// Parent the sub-account should live under.
        parent_account_id: String,
        /// Expected sub-account name.
        account_name: String,
        /// Brand.
        brand: String,
    },
    /// Same invoice, same input, already posted.
    AlreadyProcessed {
        /// Invoice.
        invoice_id: String,
        /// Hash of this run's input.
        processing_hash: String,
    },
    /// Same invoice, different input, already posted.
    InvoiceConflict {
        /// Invoice.
        invoice_id: String,
        /// Hash recorded when the invoice was posted.
        existing_hash: String,
        /// Hash of this run's input.
        processing_hash: String,
    },
    /// A sale was already costed.
    OrderAlreadyProcessed {
        /// Order.
        order_id: String,
        /// SKU.
        sku: String,
    },
    /// A refund has no costed sale to reverse.
    RefundUnmatched {
        /// Order.
        order_id: String,
        /// SKU.
        sku: String,
    },
    /// A refund returns more units than remain refundable.
    RefundPartial {
        /// Order.
        order_id: String,
        /// SKU.
        sku: String,
        /// Units the refund asks to return.
        requested_units: i64,
        /// Units sold and not yet returned.
        refundable_units: i64,
    },
    /// The bill source could not be reached.
    BillsFetchError {
        /// Upstream error text.
        details: String,
    },
    /// The bill source returned unreadable data.
    BillsParseError {
        /// Upstream error text.
        details: String,
    },
    /// A SKU-less row could not be spread across brands.
    PnlAllocationError {
        /// Bucket the row classified into.
        bucket: FeeBucket,
        /// Row description.
        description: String,
        /// Amount left unallocated.
        amount_cents: Cents,
    },
    /// See [`LedgerBlock::MissingCostBasis`].
    MissingCostBasis {
        /// SKU.
        sku: Option<String>,
        /// Order.
        order_id: Option<String>,
        /// PO.
        po_number: Option<String>,
        /// What was missing.
        details: String,
    },
    /// See [`LedgerBlock::NegativeInventory`].
    NegativeInventory {
        /// SKU.
        sku: String,
        /// Order.
        order_id: String,
        /// Units requested.
        requested_units: i64,
        /// Units on hand.
        on_hand_units: i64,
    },
    /// See [`LedgerBlock::LateCostOnHandZero`].
    LateCostOnHandZero {
        /// SKU.
        sku: String,
        /// PO.
        po_number: String,
        /// Component.
        component: CostComponent,
        /// Amount not applied.
        cost_cents: Cents,
    },
}

impl ProcessingBlock {
    /// Returns the block code.
    #[must_use]
    pub const fn code(&self) -> BlockCode {
        match self {
            Self::MissingSetup => BlockCode::MissingSetup,
            Self::MissingSkuMapping { .. } => BlockCode::MissingSkuMapping,
            Self::MissingAccountMapping { .. } => BlockCode::MissingAccountMapping,
            Self::MissingBrandSubaccount { .. } => BlockCode::MissingBrandSubaccount,
            Self::AlreadyProcessed { .. } => BlockCode::AlreadyProcessed,
            Self::InvoiceConflict { .. } => BlockCode::InvoiceConflict,
            Self::OrderAlreadyProcessed { .. } => BlockCode::OrderAlreadyProcessed,
            Self::RefundUnmatched { .. } => BlockCode::RefundUnmatched,
            Self::RefundPartial { .. } => BlockCode::RefundPartial,
            Self::BillsFetchError { .. } => BlockCode::BillsFetchError,
            Self::BillsParseError { .. } => BlockCode::BillsParseError,
            Self::PnlAllocationError { .. } => BlockCode::PnlAllocationError,
            Self::MissingCostBasis { .. } => BlockCode::MissingCostBasis,
            Self::NegativeInventory { .. } => BlockCode::NegativeInventory,
            Self::LateCostOnHandZero { .. } => BlockCode::LateCostOnHandZero,
        }
    }

    /// Returns true if this block stops the run from being posted.
    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        self.code().is_blocking()
    }

    /// Human-readable description.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::MissingSetup => "No account mapping is configured".to_string(),
            Self::MissingSkuMapping { sku, context } => {
                format!("SKU {sku} has no brand mapping ({context})")
            }
            Self::MissingAccountMapping { mapping_key, brand } => {
                format!("Account mapping {mapping_key} is not configured (needed for {brand})")
            }
            Self::MissingBrandSubaccount {
                parent_account_id,
                account_name,
                ..
            } => format!("Sub-account \"{account_name}\" not found under account {parent_account_id}"),
            Self::AlreadyProcessed { invoice_id, .. } => {
                format!("Invoice {invoice_id} was already processed with identical input")
            }
            Self::InvoiceConflict {
                invoice_id,
                existing_hash,
                processing_hash,
            } => format!(
                "Invoice {invoice_id} was processed with different input ({existing_hash} != {processing_hash})"
            ),
            Self::OrderAlreadyProcessed { order_id, sku } => {
                format!("Order {order_id} ({sku}) was already costed by an earlier run")
            }
            Self::RefundUnmatched { order_id, sku } => {
                format!("Refund for order {order_id} ({sku}) has no costed sale")
            }
            Self::RefundPartial {
                order_id,
                sku,
                requested_units,
                refundable_units,
            } => format!(
                "Refund for order {order_id} ({sku}) returns {requested_units} units but only {refundable_units} remain refundable"
            ),
            Self::BillsFetchError { details } => format!("Failed to fetch bills: {details}"),
            Self::BillsParseError { details } => format!("Failed to parse bills: {details}"),
            Self::PnlAllocationError {
                bucket,
                description,
                amount_cents,
            } => format!(
                "Cannot spread {amount_cents} cents of {bucket} (\"{description}\") across brands: no units sold"
            ),
            Self::MissingCostBasis { details, .. } => details.clone(),
            Self::NegativeInventory {
                sku,
                order_id,
                requested_units,
                on_hand_units,
            } => format!(
                "Order {order_id} needs {requested_units} units of {sku} but only {on_hand_units} on hand"
            ),
            Self::LateCostOnHandZero {
                sku,
                po_number,
                component,
                cost_cents,
            } => format!(
                "{component} cost of {cost_cents} cents on {po_number} arrived for {sku} with zero units on hand"
            ),
        }
    }
}

impl From<LedgerBlock> for ProcessingBlock {
    fn from(block: LedgerBlock) -> Self {
        match block {
            LedgerBlock::MissingCostBasis {
                sku,
                order_id,
                po_number,
                details,
            } => Self::MissingCostBasis {
                sku,
                order_id,
                po_number,
                details,
            },
            LedgerBlock::NegativeInventory {
                sku,
                order_id,
                requested_units,
                on_hand_units,
            } => Self::NegativeInventory {
                sku,
                order_id,
                requested_units,
                on_hand_units,
            },
            LedgerBlock::LateCostOnHandZero {
                sku,
                po_number,
                component,
                cost_cents,
            } => Self::LateCostOnHandZero {
                sku,
                po_number,
                component,
                cost_cents,
            },
        }
    }
}

/// Returns true if any block stops posting.
#[must_use]
pub fn has_blocking(blocks: &[ProcessingBlock]) -> bool {
    blocks.iter().any(ProcessingBlock::is_blocking)
}
