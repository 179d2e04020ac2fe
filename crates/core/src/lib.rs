//! Core costing logic for Cogsbook.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Settlement and bill data come in as plain values; journal previews and
//! blocks go out.
//!
//! # Modules
//!
//! - `allocation` - Proportional split with exact-remainder closure
//! - `ledger` - Weighted-average inventory replay
//! - `fees` - Settlement fee classification and brand attribution
//! - `journal` - COGS and P&L journal previews
//! - `blocks` - Processing block codes and payloads
//! - `settlement` - Settlement run orchestration and idempotency

pub mod allocation;
pub mod blocks;
pub mod fees;
pub mod journal;
pub mod ledger;
pub mod settlement;

pub use blocks::{BlockCode, ProcessingBlock};
pub use settlement::{ProcessingOutcome, SettlementError, SettlementProcessor};
