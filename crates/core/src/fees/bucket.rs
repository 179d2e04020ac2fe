//! Fee buckets and the ordered description rules that select them.

use std::fmt;

use serde::{Deserialize, Serialize};

use cogsbook_shared::PnlAccounts;

/// A P&L bucket a settlement line item can land in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeBucket {
    /// Product sales.
    AmazonSales,
    /// Refunded sales.
    AmazonRefunds,
    /// Amazon reimbursing lost or damaged FBA inventory.
    FbaInventoryReimbursement,
    /// Referral and selling fees.
    SellerFees,
    /// AWD warehousing fees.
    AwdFees,
    /// Fulfillment fees.
    FbaFees,
    /// Monthly and long-term storage.
    StorageFees,
    /// Sponsored ads.
    AdvertisingCosts,
    /// Coupons and promotional rebates.
    Promotions,
}

impl FeeBucket {
    /// All buckets, in declaration order.
    pub const ALL: [Self; 9] = [
        Self::AmazonSales,
        Self::AmazonRefunds,
        Self::FbaInventoryReimbursement,
        Self::SellerFees,
        Self::AwdFees,
        Self::FbaFees,
        Self::StorageFees,
        Self::AdvertisingCosts,
        Self::Promotions,
    ];

    /// Account label used to name brand sub-accounts.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::AmazonSales => "Amazon Sales",
            Self::AmazonRefunds => "Amazon Refunds",
            Self::FbaInventoryReimbursement => "Amazon FBA Inventory Reimbursement",
            Self::SellerFees => "Amazon Seller Fees",
            Self::AwdFees => "Amazon FBA Fees - AWD",
            Self::FbaFees => "Amazon FBA Fees",
            Self::StorageFees => "Amazon Storage Fees",
            Self::AdvertisingCosts => "Amazon Advertising Costs",
            Self::Promotions => "Amazon Promotions",
        }
    }

    /// Key of the bucket's parent account in the `accounts.pnl` mapping.
    #[must_use]
    pub const fn mapping_key(&self) -> &'static str {
        match self {
            Self::AmazonSales => "pnl.amazon_sales",
            Self::AmazonRefunds => "pnl.amazon_refunds",
            Self::FbaInventoryReimbursement => "pnl.fba_inventory_reimbursement",
            Self::SellerFees => "pnl.seller_fees",
            Self::AwdFees => "pnl.awd_fees",
            Self::FbaFees => "pnl.fba_fees",
            Self::StorageFees => "pnl.storage_fees",
            Self::AdvertisingCosts => "pnl.advertising_costs",
            Self::Promotions => "pnl.promotions",
        }
    }

    /// Configured parent account, if any.
    #[must_use]
    pub fn parent_account<'a>(&self, accounts: &'a PnlAccounts) -> Option<&'a str> {
        let parent = match self {
            Self::AmazonSales => &accounts.amazon_sales,
            Self::AmazonRefunds => &accounts.amazon_refunds,
            Self::FbaInventoryReimbursement => &accounts.fba_inventory_reimbursement,
            Self::SellerFees => &accounts.seller_fees,
            Self::AwdFees => &accounts.awd_fees,
            Self::FbaFees => &accounts.fba_fees,
            Self::StorageFees => &accounts.storage_fees,
            Self::AdvertisingCosts => &accounts.advertising_costs,
            Self::Promotions => &accounts.promotions,
        };
        parent.as_deref()
    }
}

impl fmt::Display for FeeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// How a rule pattern is compared to a description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Match {
    /// Description starts with the pattern.
    Prefix,
    /// Description equals the pattern.
    Exact,
}

/// One classification rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeRule {
    /// Comparison mode.
    pub kind: Match,
    /// Pattern, compared case-sensitively.
    pub pattern: &'static str,
    /// Bucket selected on a hit.
    pub bucket: FeeBucket,
}

impl FeeRule {
    const fn prefix(pattern: &'static str, bucket: FeeBucket) -> Self {
        Self {
            kind: Match::Prefix,
            pattern,
            bucket,
        }
    }

    const fn exact(pattern: &'static str, bucket: FeeBucket) -> Self {
        Self {
            kind: Match::Exact,
            pattern,
            bucket,
        }
    }

    /// Returns true if the rule selects `description`.
    #[must_use]
    pub fn matches(&self, description: &str) -> bool {
        match self.kind {
            Match::Prefix => description.starts_with(self.pattern),
            Match::Exact => description == self.pattern,
        }
    }
}

/// Classification rules, evaluated top to bottom. First hit wins.
///
/// The AWD rule must stay ahead of the general FBA rule; every AWD
/// description also starts with `"Amazon FBA Fees"`.
pub const FEE_RULES: &[FeeRule] = &[
    FeeRule::exact("Amazon Sales", FeeBucket::AmazonSales),
    FeeRule::prefix("Amazon Sales - ", FeeBucket::AmazonSales),
    FeeRule::exact("Amazon Refunds", FeeBucket::AmazonRefunds),
    FeeRule::prefix("Amazon Refunds - ", FeeBucket::AmazonRefunds),
    FeeRule::prefix("Amazon FBA Inventory Reimbursement", FeeBucket::FbaInventoryReimbursement),
    FeeRule::prefix("Amazon Seller Fees", FeeBucket::SellerFees),
    FeeRule::prefix("Amazon FBA Fees - AWD ", FeeBucket::AwdFees),
    FeeRule::prefix("Amazon FBA Fees", FeeBucket::FbaFees),
    FeeRule::prefix("Amazon Storage Fees", FeeBucket::StorageFees),
    FeeRule::prefix("Amazon Advertising Costs", FeeBucket::AdvertisingCosts),
    FeeRule::prefix("Amazon Promotions", FeeBucket::Promotions),
];

/// Classifies a description. `None` means no rule matched.
#[must_use]
pub fn bucket_for(description: &str) -> Option<FeeBucket> {
    FEE_RULES
        .iter()
        .find(|rule| rule.matches(description))
        .map(|rule| rule.bucket)
}
