//! Reportable ledger conditions.
//!
//! Blocks are data, not errors: replay records them and keeps going.

use serde::{Deserialize, Serialize};

use cogsbook_shared::types::{Cents, CostComponent};

use crate::blocks::BlockCode;

/// A condition found while replaying the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerBlock {
    /// No cost basis exists to value the event.
    MissingCostBasis {
        /// SKU involved, when the event names one.
        sku: Option<String>,
        /// Order involved, for sales.
        order_id: Option<String>,
        /// PO involved, for pooled costs.
        po_number: Option<String>,
        /// What was missing.
        details: String,
    },
    /// A sale asked for more units than are on hand.
    NegativeInventory {
        /// SKU.
        sku: String,
        /// Order.
        order_id: String,
        /// Units requested.
        requested_units: i64,
        /// Units on hand when the sale was replayed.
        on_hand_units: i64,
    },
    /// A component cost arrived for a SKU with nothing on hand.
    LateCostOnHandZero {
        /// SKU.
        sku: String,
        /// PO the cost was billed under.
        po_number: String,
        /// Component of the cost.
        component: CostComponent,
        /// Amount that could not be applied.
        cost_cents: Cents,
    },
}

impl LedgerBlock {
    /// Returns the block code.
    #[must_use]
    pub const fn code(&self) -> BlockCode {
        match self {
            Self::MissingCostBasis { .. } => BlockCode::MissingCostBasis,
            Self::NegativeInventory { .. } => BlockCode::NegativeInventory,
            Self::LateCostOnHandZero { .. } => BlockCode::LateCostOnHandZero,
        }
    }

    /// SKU the block is about, if any.
    #[must_use]
    pub fn sku(&self) -> Option<&str> {
        match self {
            Self::MissingCostBasis { sku, .. } => sku.as_deref(),
            Self::NegativeInventory { sku, .. } | Self::LateCostOnHandZero { sku, .. } => {
                Some(sku)
            }
        }
    }

    /// Human-readable description.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
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
