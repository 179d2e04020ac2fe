//! JSON run file consumed by the preview CLI.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use cogsbook_core::fees::StaticBrandLookup;
use cogsbook_core::journal::ChartOfAccounts;
use cogsbook_core::ledger::ParsedBills;
use cogsbook_core::settlement::{BillsError, LedgerHistory, SettlementInput, SettlementJob};
use cogsbook_shared::AppError;

/// Bills as exported by the bill source: either events or the failure.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BillsPayload {
    /// The source failed.
    Failed {
        /// Failure reported by the source.
        error: BillsError,
    },
    /// Parsed events.
    Parsed(ParsedBills),
}

impl Default for BillsPayload {
    fn default() -> Self {
        Self::Parsed(ParsedBills::default())
    }
}

impl BillsPayload {
    fn into_result(self) -> Result<ParsedBills, BillsError> {
        match self {
            Self::Failed { error } => Err(error),
            Self::Parsed(bills) => Ok(bills),
        }
    }
}

/// Everything one CLI invocation previews.
#[derive(Debug, Clone, Deserialize)]
pub struct RunFile {
    /// Chart of accounts.
    #[serde(default)]
    pub chart: ChartOfAccounts,
    /// SKU to brand map and brand order.
    #[serde(default)]
    pub brands: StaticBrandLookup,
    /// Previously posted cost facts.
    #[serde(default)]
    pub history: LedgerHistory,
    /// Bills shared by every invoice in the file.
    #[serde(default)]
    pub bills: BillsPayload,
    /// Invoices already posted, with their processing hash.
    #[serde(default)]
    pub posted: BTreeMap<String, String>,
    /// Invoices to preview.
    pub invoices: Vec<SettlementInput>,
}

impl RunFile {
    /// Reads and decodes a run file.
    pub fn read(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| AppError::Input(format!("{}: {e}", path.display())))?;
        Self::parse(&raw)
    }

    /// Decodes a run file from JSON text.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        Ok(serde_json::from_str(raw)?)
    }

    /// One job per invoice, each with its own copy of the bills.
    pub fn jobs(&self) -> Vec<SettlementJob> {
        let bills = self.bills.clone().into_result();
        self.invoices
            .iter()
            .map(|input| SettlementJob {
                input: input.clone(),
                bills: bills.clone(),
            })
            .collect()
    }
}
