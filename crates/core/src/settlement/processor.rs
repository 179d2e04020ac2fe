//! Settlement run orchestration.

use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use cogsbook_shared::types::{ComponentCosts, RunId};
use cogsbook_shared::{AccountMapping, ProcessingConfig};

use super::error::SettlementError;
use super::history::{refunds_to_returns, sales_to_compute};
use super::store::{ProcessedStatus, ProcessedStore, processing_hash};
use super::types::{
    BillsError, LedgerHistory, ProcessingOutcome, SettlementInput, SettlementRefund,
};
use crate::blocks::{BlockCode, ProcessingBlock};
use crate::fees::{BrandLookup, check_rows_match, classify};
use crate::journal::{
    ChartOfAccounts, JournalEntryPreview, JournalLine, build_cogs_lines, build_pnl_lines,
};
use crate::ledger::{
    ComputeSaleRequest, InventoryLedger, KnownCostFact, LedgerSnapshot, ParsedBills, ReplayOutcome,
    SaleCost,
};

/// One invoice to preview in a batch.
#[derive(Debug, Clone)]
pub struct SettlementJob {
    /// Parsed settlement data.
    pub input: SettlementInput,
    /// Bills as delivered by the bill source.
    pub bills: Result<ParsedBills, BillsError>,
}

/// Builds journal previews for settlement invoices.
///
/// Previews are pure apart from the idempotency lookup; nothing is recorded
/// until [`SettlementProcessor::mark_posted`] is called.
pub struct SettlementProcessor {
    mapping: AccountMapping,
    processing: ProcessingConfig,
    brands: Arc<dyn BrandLookup>,
    store: Arc<dyn ProcessedStore>,
}

impl SettlementProcessor {
    /// Creates a processor.
    #[must_use]
    pub fn new(
        mapping: AccountMapping,
        processing: ProcessingConfig,
        brands: Arc<dyn BrandLookup>,
        store: Arc<dyn ProcessedStore>,
    ) -> Self {
        Self {
            mapping,
            processing,
            brands,
            store,
        }
    }

    /// Previews one invoice.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError` for structurally invalid input: rows whose
    /// invoice or market differs from the input header, non-positive unit
    /// counts, or an unbalanced journal. Everything else is reported as blocks on the outcome.
    pub fn preview(
        &self,
        input: &SettlementInput,
        bills: &Result<ParsedBills, BillsError>,
        history: &LedgerHistory,
        chart: &ChartOfAccounts,
    ) -> Result<ProcessingOutcome, SettlementError> {
        check_rows_match(&input.rows, &input.invoice_id, &input.market)?;
        let run_id = RunId::new();
        let processing_hash = processing_hash(input)?;
        let mut outcome = ProcessingOutcome {
            run_id,
            invoice_id: input.invoice_id.clone(),
            processing_hash,
            snapshot: LedgerSnapshot::default(),
            sale_costs: Vec::new(),
            return_costs: Vec::new(),
            cogs_entry: None,
            pnl_entry: None,
            blocks: Vec::new(),
        };

        match self.store.status(&input.invoice_id, &outcome.processing_hash) {
            ProcessedStatus::New => {}
            ProcessedStatus::Same => {
                outcome.blocks.push(ProcessingBlock::AlreadyProcessed {
                    invoice_id: input.invoice_id.clone(),
                    processing_hash: outcome.processing_hash.clone(),
                });
                return Ok(finish(outcome));
            }
            ProcessedStatus::Conflict(existing_hash) => {
                outcome.blocks.push(ProcessingBlock::InvoiceConflict {
                    invoice_id: input.invoice_id.clone(),
                    existing_hash,
                    processing_hash: outcome.processing_hash.clone(),
                });
                return Ok(finish(outcome));
            }
        }

        let journals_enabled = !self.mapping.is_empty();
        if !journals_enabled {
            outcome.blocks.push(ProcessingBlock::MissingSetup);
        }

        let classification = classify(&input.rows, self.brands.as_ref())?;
        outcome.blocks.extend(classification.blocks.iter().cloned());

        let compute_sales = sales_to_compute(&input.sales, history, &mut outcome.blocks);

        let brand_order = self.brands.all_brands();

        match bills {
            Err(err) => {
                debug!(invoice_id = %input.invoice_id, error = %err, "bills unavailable, ledger stage skipped");
                outcome.blocks.push(err.clone().into());
                // Unmatched refunds are still reported.
                let _ = refunds_to_returns(
                    &input.refunds,
                    &history.known_sales,
                    &history.known_returns,
                    &mut outcome.blocks,
                );
            }
            Ok(bills) => {
                let (replay, new_returns) =
                    replay_with_refunds(bills, history, &input.refunds, &compute_sales, &mut outcome.blocks)?;
                outcome
                    .blocks
                    .extend(replay.blocks.into_iter().map(ProcessingBlock::from));
                outcome.snapshot = replay.snapshot;
                outcome.sale_costs = replay.sale_costs;
                outcome.return_costs = new_returns;

                if journals_enabled {
                    let cogs_by_brand =
                        self.cogs_by_brand(&outcome.sale_costs, &outcome.return_costs, &mut outcome.blocks);
                    let lines = build_cogs_lines(
                        &cogs_by_brand,
                        &brand_order,
                        &self.mapping,
                        chart,
                        &mut outcome.blocks,
                    );
                    outcome.cogs_entry = build_entry(
                        input,
                        &self.processing.cogs_doc_prefix,
                        "COGS",
                        run_id,
                        lines,
                    )?;
                }
            }
        }

        if journals_enabled {
            let lines = build_pnl_lines(
                &classification.allocations,
                &self.mapping,
                chart,
                &mut outcome.blocks,
            );
            outcome.pnl_entry = build_entry(
                input,
                &self.processing.pnl_doc_prefix,
                "P&L reclass",
                run_id,
                lines,
            )?;
        }

        Ok(finish(outcome))
    }

    /// Previews many invoices in parallel against the same history and chart.
    ///
    /// Results are returned in job order.
    pub fn preview_batch(
        &self,
        jobs: &[SettlementJob],
        history: &LedgerHistory,
        chart: &ChartOfAccounts,
    ) -> Vec<Result<ProcessingOutcome, SettlementError>> {
        jobs.par_iter()
            .map(|job| self.preview(&job.input, &job.bills, history, chart))
            .collect()
    }

    /// Records a previewed run as posted.
    ///
    /// # Errors
    ///
    /// Returns `SettlementError::NotPostable` if the run has blocking codes,
    /// or `SettlementError::AlreadyRecorded` if the invoice was posted with
    /// different input.
    pub fn mark_posted(&self, outcome: &ProcessingOutcome) -> Result<(), SettlementError> {
        if !outcome.can_post() {
            let mut codes: Vec<BlockCode> = outcome
                .blocks
                .iter()
                .filter(|b| b.is_blocking())
                .map(ProcessingBlock::code)
                .collect();
            codes.sort();
            codes.dedup();
            return Err(SettlementError::NotPostable {
                invoice_id: outcome.invoice_id.clone(),
                codes,
            });
        }
        self.store
            .record(&outcome.invoice_id, &outcome.processing_hash)?;
        info!(
            invoice_id = %outcome.invoice_id,
            run_id = %outcome.run_id,
            "settlement marked posted"
        );
        Ok(())
    }

    /// Net COGS per brand: costed sales minus costed returns.
    fn cogs_by_brand(
        &self,
        sale_costs: &[SaleCost],
        return_costs: &[KnownCostFact],
        blocks: &mut Vec<ProcessingBlock>,
    ) -> BTreeMap<String, ComponentCosts> {
        let mut totals: BTreeMap<String, ComponentCosts> = BTreeMap::new();
        let signed = sale_costs
            .iter()
            .map(|s| (&s.sku, &s.order_id, s.cost))
            .chain(return_costs.iter().map(|r| (&r.sku, &r.order_id, -r.cost)));

        for (sku, order_id, cost) in signed {
            match self.brands.brand_for_sku(sku) {
                Some(brand) => *totals.entry(brand).or_default() += cost,
                None => blocks.push(ProcessingBlock::MissingSkuMapping {
                    sku: sku.clone(),
                    context: format!("COGS for order {order_id}"),
                }),
            }
        }
        totals
    }
}

/// Replays the ledger with this run's refunds as returns.
///
/// Refunds are matched against history first. A refund of a sale costed in
/// this same run only matches once that sale has a cost, and a matched return
/// can move the cost of later sales, so matching and replay repeat until the
/// returns stop changing. Each pass settles at least one more return in date
/// order, which bounds the passes by the refund count.
fn replay_with_refunds(
    bills: &ParsedBills,
    history: &LedgerHistory,
    refunds: &[SettlementRefund],
    compute_sales: &[ComputeSaleRequest],
    blocks: &mut Vec<ProcessingBlock>,
) -> Result<(ReplayOutcome, Vec<KnownCostFact>), SettlementError> {
    let replay_returning = |returns: &[KnownCostFact]| {
        let known_returns: Vec<KnownCostFact> =
            history.known_returns.iter().chain(returns).cloned().collect();
        InventoryLedger::replay(bills, &history.known_sales, &known_returns, compute_sales)
    };

    let mut pass_blocks = Vec::new();
    let mut returns = refunds_to_returns(
        refunds,
        &history.known_sales,
        &history.known_returns,
        &mut pass_blocks,
    );
    let mut replay = replay_returning(&returns)?;

    for pass in 1..=refunds.len() {
        let known_sales: Vec<KnownCostFact> = history
            .known_sales
            .iter()
            .cloned()
            .chain(replay.sale_costs.iter().map(SaleCost::to_known_fact))
            .collect();
        pass_blocks.clear();
        let next = refunds_to_returns(refunds, &known_sales, &history.known_returns, &mut pass_blocks);
        if next == returns {
            break;
        }
        debug!(pass, returns = next.len(), "refunds matched to sales costed in this run, replaying");
        replay = replay_returning(&next)?;
        returns = next;
    }

    blocks.append(&mut pass_blocks);
    Ok((replay, returns))
}

/// Wraps built lines into an entry. No lines means no entry.
fn build_entry(
    input: &SettlementInput,
    prefix: &str,
    kind: &str,
    run_id: RunId,
    lines: Vec<JournalLine>,
) -> Result<Option<JournalEntryPreview>, SettlementError> {
    if lines.is_empty() {
        return Ok(None);
    }
    let entry = JournalEntryPreview {
        txn_date: input.txn_date,
        doc_number: format!("{prefix}-{}", input.invoice_id),
        private_note: format!(
            "{kind} for settlement {} ({}), run {run_id}",
            input.invoice_id, input.market
        ),
        lines,
    };
    entry.validate_balanced()?;
    Ok(Some(entry))
}

fn finish(outcome: ProcessingOutcome) -> ProcessingOutcome {
    let mut blocking = outcome.blocks.iter().filter(|b| b.is_blocking()).map(ProcessingBlock::code);
    info!(
        invoice_id = %outcome.invoice_id,
        run_id = %outcome.run_id,
        sale_costs = outcome.sale_costs.len(),
        blocks = outcome.blocks.len(),
        "settlement preview built"
    );
    if let Some(first) = blocking.next() {
        warn!(
            invoice_id = %outcome.invoice_id,
            code = %first,
            others = blocking.count(),
            "settlement preview cannot be posted"
        );
    }
    outcome
}
