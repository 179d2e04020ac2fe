//! Idempotency records for posted invoices.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use sha2::{Digest, Sha256};

use super::error::SettlementError;
use super::types::SettlementInput;

/// Hex SHA-256 of the canonical JSON of `input`.
///
/// Field order is fixed by the struct and every collection is a `Vec`, so the
/// same input always serializes to the same bytes.
///
/// # Errors
///
/// Returns `SettlementError::Serialize` if the input cannot be serialized.
pub fn processing_hash(input: &SettlementInput) -> Result<String, SettlementError> {
    let canonical =
        serde_json::to_vec(input).map_err(|e| SettlementError::Serialize(e.to_string()))?;
    Ok(format!("{:x}", Sha256::digest(&canonical)))
}

/// What a store knows about an invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessedStatus {
    /// Never posted.
    New,
    /// Posted with this exact input.
    Same,
    /// Posted with different input; carries the recorded hash.
    Conflict(String),
}

/// Records which invoices were posted, keyed by invoice ID.
pub trait ProcessedStore: Send + Sync {
    /// Hash recorded for `invoice_id`, if any.
    fn lookup(&self, invoice_id: &str) -> Option<String>;

    /// Records a posted invoice.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::AlreadyRecorded` if the invoice already has
    /// a different hash. Recording the same hash twice is a no-op.
    fn record(&self, invoice_id: &str, processing_hash: &str) -> Result<(), SettlementError>;

    /// Compares `processing_hash` against the record for `invoice_id`.
    fn status(&self, invoice_id: &str, processing_hash: &str) -> ProcessedStatus {
        match self.lookup(invoice_id) {
            None => ProcessedStatus::New,
            Some(existing) if existing == processing_hash => ProcessedStatus::Same,
            Some(existing) => ProcessedStatus::Conflict(existing),
        }
    }
}

/// Process-local store. Safe to share across parallel previews.
#[derive(Debug, Default)]
pub struct InMemoryProcessedStore {
    records: DashMap<String, String>,
}

impl InMemoryProcessedStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of recorded invoices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl ProcessedStore for InMemoryProcessedStore {
    fn lookup(&self, invoice_id: &str) -> Option<String> {
        self.records.get(invoice_id).map(|hash| hash.value().clone())
    }

    fn record(&self, invoice_id: &str, processing_hash: &str) -> Result<(), SettlementError> {
        match self.records.entry(invoice_id.to_string()) {
            Entry::Occupied(existing) if existing.get() != processing_hash => {
                Err(SettlementError::AlreadyRecorded {
                    invoice_id: invoice_id.to_string(),
                    existing_hash: existing.get().clone(),
                })
            }
            Entry::Occupied(_) => Ok(()),
            Entry::Vacant(slot) => {
                slot.insert(processing_hash.to_string());
                Ok(())
            }
        }
    }
}
