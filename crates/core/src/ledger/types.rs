//! Inventory ledger domain types.
//!
//! Inputs arrive from external parsers (bills, settlement facts); outputs are
//! the per-SKU snapshot and the cost removed for each computed sale.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use cogsbook_shared::types::{Cents, ComponentCosts, CostComponent};

/// Units and value held for one SKU.
///
/// Units and value move together: a state with zero units has no meaningful
/// cost basis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryState {
    /// Units on hand.
    pub units: i64,
    /// Value held, per cost component.
    pub value: ComponentCosts,
}

/// Per-SKU inventory state for one processing run.
///
/// Keyed by SKU in sorted order so serialized snapshots are deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LedgerSnapshot {
    states: BTreeMap<String, InventoryState>,
}

impl LedgerSnapshot {
    /// Returns the state held for a SKU, if any event ever touched it.
    #[must_use]
    pub fn get(&self, sku: &str) -> Option<&InventoryState> {
        self.states.get(sku)
    }

    /// Units on hand for a SKU (zero when unknown).
    #[must_use]
    pub fn units(&self, sku: &str) -> i64 {
        self.states.get(sku).map_or(0, |s| s.units)
    }

    /// Value held for a SKU (zero when unknown).
    #[must_use]
    pub fn value(&self, sku: &str) -> ComponentCosts {
        self.states.get(sku).map_or(ComponentCosts::ZERO, |s| s.value)
    }

    /// Iterates SKUs and their states in SKU order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &InventoryState)> {
        self.states.iter().map(|(sku, state)| (sku.as_str(), state))
    }

    /// Number of SKUs tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns true if no SKU has been touched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Total units across all SKUs.
    #[must_use]
    pub fn total_units(&self) -> i64 {
        self.states.values().map(|s| s.units).sum()
    }

    pub(crate) fn state_mut(&mut self, sku: &str) -> &mut InventoryState {
        self.states.entry(sku.to_string()).or_default()
    }
}

/// A cost event parsed from a vendor bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BillEvent {
    /// Brand-level cost with no inventory effect.
    BrandCost {
        /// Bill date.
        date: NaiveDate,
        /// Brand the cost belongs to.
        brand: String,
        /// Amount in cents.
        amount_cents: Cents,
    },
    /// Manufacturing cost for units received under a PO.
    Manufacturing {
        /// Bill date.
        date: NaiveDate,
        /// Purchase order number.
        po_number: String,
        /// SKU received.
        sku: String,
        /// Units received (must be positive).
        units: i64,
        /// Manufacturing cost in cents.
        cost_cents: Cents,
    },
    /// A named component cost tied to one SKU.
    ComponentCost {
        /// Bill date.
        date: NaiveDate,
        /// Purchase order number.
        po_number: String,
        /// SKU the cost applies to.
        sku: String,
        /// Component the cost belongs to.
        component: CostComponent,
        /// Amount in cents.
        cost_cents: Cents,
    },
    /// A component cost for a whole PO, split across its SKUs by units ordered.
    PooledCost {
        /// Bill date.
        date: NaiveDate,
        /// Purchase order number.
        po_number: String,
        /// Component the cost belongs to.
        component: CostComponent,
        /// Amount in cents.
        cost_cents: Cents,
    },
}

impl BillEvent {
    /// Bill date.
    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        match self {
            Self::BrandCost { date, .. }
            | Self::Manufacturing { date, .. }
            | Self::ComponentCost { date, .. }
            | Self::PooledCost { date, .. } => *date,
        }
    }
}

/// Bill events plus the PO unit breakdown used to spread pooled costs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedBills {
    /// Bill events in parse order.
    #[serde(default)]
    pub events: Vec<BillEvent>,
    /// Units ordered per SKU, per PO.
    #[serde(default)]
    pub po_units_by_sku: BTreeMap<String, BTreeMap<String, i64>>,
}

/// A sale or return whose unit cost is already known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownCostFact {
    /// Event date.
    pub date: NaiveDate,
    /// Marketplace order ID.
    pub order_id: String,
    /// SKU.
    pub sku: String,
    /// Units (must be positive).
    pub units: i64,
    /// Total cost for those units, per component.
    pub cost: ComponentCosts,
}

/// A sale whose cost must be derived from the running average.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComputeSaleRequest {
    /// Sale date.
    pub date: NaiveDate,
    /// Marketplace order ID.
    pub order_id: String,
    /// SKU.
    pub sku: String,
    /// Units sold (must be positive).
    pub units: i64,
}

/// Cost basis removed from inventory for one computed sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleCost {
    /// Sale date.
    pub date: NaiveDate,
    /// Marketplace order ID.
    pub order_id: String,
    /// SKU.
    pub sku: String,
    /// Units sold.
    pub units: i64,
    /// Cost removed, per component.
    pub cost: ComponentCosts,
}

impl SaleCost {
    /// Converts the computed cost into a known-cost fact for later runs.
    #[must_use]
    pub fn to_known_fact(&self) -> KnownCostFact {
        KnownCostFact {
            date: self.date,
            order_id: self.order_id.clone(),
            sku: self.sku.clone(),
            units: self.units,
            cost: self.cost,
        }
    }
}
