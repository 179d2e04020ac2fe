//! Settlement processing runs.
//!
//! One run turns a settlement invoice into COGS and P&L journal previews:
//! idempotency check, sale and refund matching against history, ledger
//! replay, fee classification, then journal building.
//!
//! # Modules
//!
//! - `types` - Run inputs, history and the processing outcome
//! - `history` - Sale de-duplication and refund matching
//! - `store` - Processing hash and posted-invoice records
//! - `processor` - The orchestrating `SettlementProcessor`
//! - `error` - Hard run failures

pub mod error;
pub mod history;
pub mod processor;
pub mod store;
pub mod types;


pub use error::SettlementError;
pub use history::{refunds_to_returns, sales_to_compute};
pub use processor::{SettlementJob, SettlementProcessor};
pub use store::{InMemoryProcessedStore, ProcessedStatus, ProcessedStore, processing_hash};
pub use types::{
    BillsError, LedgerHistory, ProcessingOutcome, SettlementInput, SettlementRefund,
    SettlementSale,
};
