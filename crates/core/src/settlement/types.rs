//! Settlement run inputs and outputs.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cogsbook_shared::types::RunId;

use crate::blocks::{ProcessingBlock, has_blocking};
use crate::fees::SettlementRow;
use crate::journal::JournalEntryPreview;
use crate::ledger::{KnownCostFact, LedgerSnapshot, SaleCost};

/// A sale line from the settlement report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementSale {
    /// Posting date.
    pub date: NaiveDate,
    /// Amazon order.
    pub order_id: String,
    /// SKU sold.
    pub sku: String,
    /// Units sold.
    pub units: i64,
}

/// A refund line from the settlement report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementRefund {
    /// Posting date.
    pub date: NaiveDate,
    /// Order being refunded.
    pub order_id: String,
    /// SKU returned.
    pub sku: String,
    /// Units returned.
    pub units: i64,
}

/// Everything parsed from one settlement invoice.
///
/// The canonical JSON of this struct is the idempotency key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettlementInput {
    /// Settlement invoice.
    pub invoice_id: String,
    /// Marketplace.
    pub market: String,
    /// Date the journals are posted on.
    pub txn_date: NaiveDate,
    /// Line items for fee classification.
    #[serde(default)]
    pub rows: Vec<SettlementRow>,
    /// Sales to cost.
    #[serde(default)]
    pub sales: Vec<SettlementSale>,
    /// Refunds to reverse.
    #[serde(default)]
    pub refunds: Vec<SettlementRefund>,
}

/// Cost facts from earlier posted runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerHistory {
    /// Sales already costed.
    #[serde(default)]
    pub known_sales: Vec<KnownCostFact>,
    /// Returns already costed.
    #[serde(default)]
    pub known_returns: Vec<KnownCostFact>,
}

/// Why the bill source could not supply events.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "details", rename_all = "snake_case")]
pub enum BillsError {
    /// The source was unreachable.
    #[error("bill fetch failed: {0}")]
    Fetch(String),
    /// The source returned data that could not be parsed.
    #[error("bill parse failed: {0}")]
    Parse(String),
}

impl From<BillsError> for ProcessingBlock {
    fn from(err: BillsError) -> Self {
        match err {
            BillsError::Fetch(details) => Self::BillsFetchError { details },
            BillsError::Parse(details) => Self::BillsParseError { details },
        }
    }
}

/// Result of previewing one invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingOutcome {
    /// Run identifier.
    pub run_id: RunId,
    /// Invoice.
    pub invoice_id: String,
    /// Idempotency key for the invoice input.
    pub processing_hash: String,
    /// Inventory after replay. Empty when the ledger stage was skipped.
    pub snapshot: LedgerSnapshot,
    /// Costed sales from this run.
    pub sale_costs: Vec<SaleCost>,
    /// Returns costed in this run.
    pub return_costs: Vec<KnownCostFact>,
    /// COGS journal, if there is anything to post.
    pub cogs_entry: Option<JournalEntryPreview>,
    /// P&L reclass journal, if there is anything to post.
    pub pnl_entry: Option<JournalEntryPreview>,
    /// Every block raised, in stage order.
    pub blocks: Vec<ProcessingBlock>,
}

impl ProcessingOutcome {
    /// Returns true when no block stops posting.
    #[must_use]
    pub fn can_post(&self) -> bool {
        !has_blocking(&self.blocks)
    }
}
