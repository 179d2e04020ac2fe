//! Ledger error types.
//!
//! These are structural input failures raised before replay starts. Data
//! problems found during replay are `LedgerBlock`s instead.

use thiserror::Error;

/// Errors that reject a replay outright.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// A unit count was zero or negative.
    #[error("Unit count must be positive, got {units} for {context}")]
    InvalidUnits {
        /// Which input carried the bad count.
        context: String,
        /// The offending count.
        units: i64,
    },

    /// A PO unit weight was negative.
    #[error("PO {po_number} lists negative units ({units}) for SKU {sku}")]
    NegativePoUnits {
        /// Purchase order number.
        po_number: String,
        /// SKU.
        sku: String,
        /// The offending count.
        units: i64,
    },
}

impl LedgerError {
    /// Returns the error code for reporting.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidUnits { .. } => "INVALID_UNITS",
            Self::NegativePoUnits { .. } => "NEGATIVE_PO_UNITS",
        }
    }
}
