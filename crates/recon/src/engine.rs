use std::collections::BTreeSet;

use crate::consolidate::{append_bucket, consolidate, PageSink};
use crate::leftover::{leftovers, Leftovers};
use crate::model::{ConsolidationReport, LedgerInput, LedgerOutcome};
use crate::pool::DocumentPool;
use crate::reconcile::reconcile;
use crate::report::{LedgerSummary, LeftoverSummary};
use crate::state::RunState;

/// Everything one ledger produced, for the caller to persist.
#[derive(Debug)]
pub struct LedgerRun<'p> {
    pub outcome: LedgerOutcome<'p>,
    pub consolidation: ConsolidationReport,
    /// Pool buckets this ledger never mentioned.
    pub leftovers: Leftovers<'p>,
    pub summary: LedgerSummary,
}

/// Reconcile one ledger, fill `sink` with its bundle, and commit its keys to
/// `state`.
///
/// Call once per ledger, in discovery order. A ledger that could not be read
/// never reaches here; record it with [`RunState::record_failure`] instead.
pub fn process_ledger<'p, S: PageSink>(
    state: &mut RunState,
    pool: &'p DocumentPool,
    ledger: &LedgerInput,
    sink: &mut S,
) -> LedgerRun<'p> {
    log::info!("{}: {} rows", ledger.name, ledger.rows.len());

    let mut outcome = reconcile(&ledger.name, &ledger.rows, pool, state);
    let consolidation = consolidate(&mut outcome, sink, state);
    state.commit(&outcome);

    let mentioned: BTreeSet<_> = outcome.mentioned_keys().cloned().collect();
    let left = leftovers(pool, &mentioned);
    let summary = LedgerSummary::new(&outcome, &consolidation, &left);
    state.record_summary(summary.clone());

    LedgerRun {
        outcome,
        consolidation,
        leftovers: left,
        summary,
    }
}

/// The run-wide leftover bundle.
#[derive(Debug)]
pub struct LeftoverRun<'p> {
    pub leftovers: Leftovers<'p>,
    pub consolidation: ConsolidationReport,
    pub summary: LeftoverSummary,
}

/// After the last ledger: fill `sink` with every bucket no successful ledger
/// mentioned, largest first.
pub fn finish_run<'p, S: PageSink>(
    state: &mut RunState,
    pool: &'p DocumentPool,
    sink: &mut S,
) -> LeftoverRun<'p> {
    let left = leftovers(pool, state.seen());
    let mut consolidation = ConsolidationReport::default();
    for (_, bucket) in left.buckets() {
        append_bucket(bucket, sink, state, &mut consolidation);
    }
    log::info!(
        "{} documents under {} counterparties never mentioned ({} pages)",
        left.document_count(),
        left.key_count(),
        consolidation.pages
    );

    let summary = LeftoverSummary::new(&left, &consolidation);
    LeftoverRun {
        leftovers: left,
        consolidation,
        summary,
    }
}
