//! Settlement processing error types.

use thiserror::Error;

use crate::blocks::BlockCode;
use crate::fees::ClassifyError;
use crate::journal::JournalError;
use crate::ledger::LedgerError;

/// Hard failures of a settlement run. Data problems are blocks instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    /// Settlement rows were inconsistent.
    #[error(transparent)]
    Classify(#[from] ClassifyError),

    /// Ledger inputs were structurally invalid.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// A built journal broke its invariants.
    #[error(transparent)]
    Journal(#[from] JournalError),

    /// The input could not be serialized for hashing.
    #[error("Failed to serialize settlement input: {0}")]
    Serialize(String),

    /// The run carries blocking codes and cannot be marked posted.
    #[error("Invoice {invoice_id} cannot be posted: {}", format_codes(.codes))]
    NotPostable {
        /// Invoice.
        invoice_id: String,
        /// Blocking codes on the run.
        codes: Vec<BlockCode>,
    },

    /// The invoice was already recorded with another hash.
    #[error("Invoice {invoice_id} is already recorded with hash {existing_hash}")]
    AlreadyRecorded {
        /// Invoice.
        invoice_id: String,
        /// Hash on record.
        existing_hash: String,
    },
}

fn format_codes(codes: &[BlockCode]) -> String {
    codes
        .iter()
        .map(BlockCode::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

impl SettlementError {
    /// Returns the error code for reporting.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Classify(err) => err.error_code(),
            Self::Ledger(err) => err.error_code(),
            Self::Journal(err) => err.error_code(),
            Self::Serialize(_) => "SERIALIZE_ERROR",
            Self::NotPostable { .. } => "NOT_POSTABLE",
            Self::AlreadyRecorded { .. } => "ALREADY_RECORDED",
        }
    }
}
