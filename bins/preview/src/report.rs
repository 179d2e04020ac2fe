//! Rendering preview results.

use std::fmt::Write as _;

use serde::Serialize;

use cogsbook_core::journal::{JournalEntryPreview, PostingType};
use cogsbook_core::{ProcessingOutcome, SettlementError};
use cogsbook_shared::types::format_cents;

/// One invoice's result, as printed.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InvoiceReport {
    /// The preview was built. It may still carry blocks.
    Previewed {
        /// Whether the run may be posted.
        can_post: bool,
        /// The full outcome.
        #[serde(flatten)]
        outcome: Box<ProcessingOutcome>,
    },
    /// The run failed outright.
    Failed {
        /// Invoice.
        invoice_id: String,
        /// Machine-readable code.
        error_code: &'static str,
        /// Error text.
        error: String,
    },
}

impl InvoiceReport {
    /// Wraps a processor result.
    pub fn new(invoice_id: &str, result: Result<ProcessingOutcome, SettlementError>) -> Self {
        match result {
            Ok(outcome) => Self::Previewed {
                can_post: outcome.can_post(),
                outcome: Box::new(outcome),
            },
            Err(err) => Self::Failed {
                invoice_id: invoice_id.to_string(),
                error_code: err.error_code(),
                error: err.to_string(),
            },
        }
    }

    /// Returns true if the invoice can be posted as previewed.
    pub fn is_postable(&self) -> bool {
        matches!(self, Self::Previewed { can_post: true, .. })
    }
}

fn render_entry(out: &mut String, title: &str, entry: Option<&JournalEntryPreview>) {
    let Some(entry) = entry else {
        let _ = writeln!(out, "  {title}: none");
        return;
    };
    let totals = entry.totals();
    let _ = writeln!(
        out,
        "  {title} {} ({} lines, {} / {})",
        entry.doc_number,
        entry.lines.len(),
        format_cents(totals.debits),
        format_cents(totals.credits)
    );
    for line in &entry.lines {
        let side = match line.posting_type {
            PostingType::Debit => "Dr",
            PostingType::Credit => "Cr",
        };
        let _ = writeln!(
            out,
            "    {side} {:<40} {:>12}",
            line.account_name,
            format_cents(line.amount_cents)
        );
    }
}

/// Human-readable summary of every report.
pub fn render_text(reports: &[InvoiceReport]) -> String {
    let mut out = String::new();
    for report in reports {
        match report {
            InvoiceReport::Previewed { can_post, outcome } => {
                let status = if *can_post { "ready" } else { "blocked" };
                let _ = writeln!(out, "{} [{status}] hash {}", outcome.invoice_id, outcome.processing_hash);
                render_entry(&mut out, "COGS", outcome.cogs_entry.as_ref());
                render_entry(&mut out, "P&L", outcome.pnl_entry.as_ref());
                for block in &outcome.blocks {
                    let _ = writeln!(out, "  ! {} {}", block.code(), block.message());
                }
            }
            InvoiceReport::Failed {
                invoice_id,
                error_code,
                error,
            } => {
                let _ = writeln!(out, "{invoice_id} [failed] {error_code}: {error}");
            }
        }
    }
    out
}
