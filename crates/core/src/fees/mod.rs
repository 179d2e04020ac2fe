//! Settlement fee classification.
//!
//! Settlement line items are classified into fixed P&L buckets by an ordered
//! description rule table, then attributed to brands.

pub mod brand;
pub mod bucket;
pub mod classify;

pub use brand::{BrandLookup, StaticBrandLookup};
pub use bucket::{FEE_RULES, FeeBucket, FeeRule, Match, bucket_for};
pub use classify::{
    BrandAmount, ClassifyError, FeeClassification, SettlementRow, check_rows_match, classify,
};
