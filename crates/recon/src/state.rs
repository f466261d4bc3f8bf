use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::model::{CanonicalKey, LedgerOutcome};
use crate::report::{FailedLedger, LedgerSummary};

const DEFAULT_PROGRESS_EVERY: usize = 500;

/// Cross-ledger state of one run.
///
/// Ledgers are processed strictly one after another: every mutation takes
/// `&mut self`. `consumed` and `seen` are append-only for the life of the run.
#[derive(Debug)]
pub struct RunState {
    consumed: BTreeSet<CanonicalKey>,
    seen: BTreeSet<CanonicalKey>,
    unreadable: BTreeMap<PathBuf, String>,
    ledgers: Vec<LedgerSummary>,
    failed: Vec<FailedLedger>,
    progress_every: usize,
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

impl RunState {
    pub fn new() -> Self {
        Self::with_progress_every(DEFAULT_PROGRESS_EVERY)
    }

    pub fn with_progress_every(progress_every: usize) -> Self {
        Self {
            consumed: BTreeSet::new(),
            seen: BTreeSet::new(),
            unreadable: BTreeMap::new(),
            ledgers: Vec::new(),
            failed: Vec::new(),
            progress_every: progress_every.max(1),
        }
    }

    /// Apply a fully reconciled ledger: its matched keys become consumed and
    /// every key it mentions becomes seen.
    pub fn commit(&mut self, outcome: &LedgerOutcome<'_>) {
        self.consumed.extend(outcome.matched_keys().cloned());
        self.seen.extend(outcome.mentioned_keys().cloned());
    }

    pub fn is_consumed(&self, key: &CanonicalKey) -> bool {
        self.consumed.contains(key)
    }

    pub fn consumed(&self) -> &BTreeSet<CanonicalKey> {
        &self.consumed
    }

    /// Keys mentioned by any successfully processed ledger.
    pub fn seen(&self) -> &BTreeSet<CanonicalKey> {
        &self.seen
    }

    /// Remember a document the page sink could not open, so it is skipped
    /// without retrying for the rest of the run.
    pub fn mark_unreadable(&mut self, path: &Path, reason: impl Into<String>) {
        self.unreadable
            .entry(path.to_path_buf())
            .or_insert_with(|| reason.into());
    }

    pub fn is_unreadable(&self, path: &Path) -> bool {
        self.unreadable.contains_key(path)
    }

    pub fn unreadable(&self) -> &BTreeMap<PathBuf, String> {
        &self.unreadable
    }

    pub fn record_summary(&mut self, summary: LedgerSummary) {
        self.ledgers.push(summary);
    }

    /// A ledger that aborted. It leaves `consumed` and `seen` untouched.
    pub fn record_failure(&mut self, ledger: impl Into<String>, error: &dyn std::fmt::Display) {
        let ledger = ledger.into();
        log::warn!("{ledger}: skipped: {error}");
        self.failed.push(FailedLedger {
            ledger,
            error: error.to_string(),
        });
    }

    pub fn summaries(&self) -> &[LedgerSummary] {
        &self.ledgers
    }

    pub fn failures(&self) -> &[FailedLedger] {
        &self.failed
    }

    pub fn progress_every(&self) -> usize {
        self.progress_every
    }
}
