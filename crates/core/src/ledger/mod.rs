//! Weighted-average inventory costing ledger.
//!
//! This module implements the inventory replay:
//! - Domain types for bills, sale/return facts and snapshots
//! - Deterministic timeline ordering
//! - Replay with weighted-average cost removal
//! - Reportable ledger blocks and hard input errors

pub mod block;
pub mod error;
pub mod replay;
pub mod timeline;
pub mod types;

#[cfg(test)]
mod replay_props;

pub use block::LedgerBlock;
pub use error::LedgerError;
pub use replay::{InventoryLedger, ReplayOutcome};
pub use timeline::{TimelineEvent, TimelinePriority, build_timeline};
pub use types::{
    BillEvent, ComputeSaleRequest, InventoryState, KnownCostFact, LedgerSnapshot, ParsedBills,
    SaleCost,
};
