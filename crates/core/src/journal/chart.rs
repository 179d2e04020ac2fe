//! Flat chart of accounts as supplied by the accounting package.

use serde::{Deserialize, Serialize};

/// One account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account ID in the accounting package.
    pub id: String,
    /// Display name. Brand sub-accounts follow `"{Label} - {Brand}"`.
    pub name: String,
    /// Parent account ID for sub-accounts.
    #[serde(default)]
    pub parent_id: Option<String>,
}

/// The chart of accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartOfAccounts {
    accounts: Vec<Account>,
}

impl ChartOfAccounts {
    /// Wraps a list of accounts.
    #[must_use]
    pub const fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }

    /// Account by ID.
    #[must_use]
    pub fn account(&self, id: &str) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    /// Direct child of `parent_id` named exactly `name` (case-sensitive).
    #[must_use]
    pub fn find_sub_account(&self, parent_id: &str, name: &str) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|a| a.parent_id.as_deref() == Some(parent_id) && a.name == name)
    }

    /// Display name for an account ID, falling back to the ID itself.
    #[must_use]
    pub fn display_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.account(id).map_or(id, |a| a.name.as_str())
    }

    /// Number of accounts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Returns true if the chart is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}
