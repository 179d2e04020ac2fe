//! Journal line and entry previews.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use cogsbook_shared::types::Cents;

/// Posting side of a journal line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostingType {
    /// Debit.
    Debit,
    /// Credit.
    Credit,
}

/// One journal line. Amounts are always non-negative.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalLine {
    /// Account posted to.
    pub account_id: String,
    /// Account name at preview time.
    pub account_name: String,
    /// Debit or credit.
    pub posting_type: PostingType,
    /// Amount in cents.
    pub amount_cents: Cents,
    /// Line memo.
    pub description: String,
}

/// Debit and credit totals of an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalTotals {
    /// Sum of debit lines.
    pub debits: Cents,
    /// Sum of credit lines.
    pub credits: Cents,
}

/// A journal entry ready to be posted by an external client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntryPreview {
    /// Transaction date.
    pub txn_date: NaiveDate,
    /// Document number, unique per invoice and entry kind.
    pub doc_number: String,
    /// Note carried onto the posted entry.
    pub private_note: String,
    /// Lines in build order.
    pub lines: Vec<JournalLine>,
}

/// Journal invariant violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JournalError {
    /// Debits and credits differ.
    #[error("Journal {doc_number} is unbalanced: debits ({debits}) != credits ({credits})")]
    Unbalanced {
        /// Entry document number.
        doc_number: String,
        /// Total debits in cents.
        debits: Cents,
        /// Total credits in cents.
        credits: Cents,
    },

    /// A line carries a negative amount.
    #[error("Journal line for account {account_id} has negative amount {amount_cents}")]
    NegativeAmount {
        /// Account of the offending line.
        account_id: String,
        /// The amount.
        amount_cents: Cents,
    },
}

impl JournalError {
    /// Returns the error code for reporting.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unbalanced { .. } => "JOURNAL_UNBALANCED",
            Self::NegativeAmount { .. } => "JOURNAL_NEGATIVE_AMOUNT",
        }
    }
}

impl JournalEntryPreview {
    /// Debit and credit totals.
    #[must_use]
    pub fn totals(&self) -> JournalTotals {
        self.lines
            .iter()
            .fold(JournalTotals::default(), |mut totals, line| {
                match line.posting_type {
                    PostingType::Debit => totals.debits += line.amount_cents,
                    PostingType::Credit => totals.credits += line.amount_cents,
                }
                totals
            })
    }

    /// Returns true if debits equal credits.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        let totals = self.totals();
        totals.debits == totals.credits
    }

    /// Returns true if the entry has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Checks the entry's invariants.
    ///
    /// # Errors
    ///
    /// Returns `JournalError` if any line is negative or the entry is unbalanced.
    pub fn validate_balanced(&self) -> Result<(), JournalError> {
        if let Some(line) = self.lines.iter().find(|l| l.amount_cents < 0) {
            return Err(JournalError::NegativeAmount {
                account_id: line.account_id.clone(),
                amount_cents: line.amount_cents,
            });
        }
        let totals = self.totals();
        if totals.debits != totals.credits {
            return Err(JournalError::Unbalanced {
                doc_number: self.doc_number.clone(),
                debits: totals.debits,
                credits: totals.credits,
            });
        }
        Ok(())
    }
}
