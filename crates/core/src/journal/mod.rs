//! Journal previews for COGS and settlement P&L reclasses.
//!
//! # Modules
//!
//! - `chart` - Flat chart of accounts with brand sub-account lookup
//! - `entry` - Journal line and entry previews, balance checks
//! - `builder` - COGS and P&L line builders

pub mod builder;
pub mod chart;
pub mod entry;

#[cfg(test)]
mod builder_props;

pub use builder::{build_cogs_lines, build_pnl_lines};
pub use chart::{Account, ChartOfAccounts};
pub use entry::{JournalEntryPreview, JournalError, JournalLine, JournalTotals, PostingType};
