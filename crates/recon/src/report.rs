//! Serializable run report.
//!
//! The JSON shape is a contract for scripts: fields are only ever added.

use std::path::Path;

use serde::Serialize;

use crate::leftover::Leftovers;
use crate::model::{CanonicalKey, ConsolidationReport, LedgerOutcome, UnreadableDocument};
use crate::pool::PoolStats;
use crate::state::RunState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedLedger {
    pub ledger: String,
    pub error: String,
}

/// What one successfully reconciled ledger produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LedgerSummary {
    pub ledger: String,
    pub prefix: String,
    pub rows: usize,
    pub matched_rows: usize,
    pub missing_rows: usize,
    /// 1-based data row indices, duplicates included.
    pub flagged_rows: Vec<usize>,
    pub duplicate_counterparties: Vec<(CanonicalKey, usize)>,
    pub newly_consumed: Vec<CanonicalKey>,
    pub pages: usize,
    pub documents_appended: usize,
    pub skipped_documents: Vec<UnreadableDocument>,
    pub leftover_keys: usize,
    pub leftover_documents: usize,
}

impl LedgerSummary {
    pub fn new(
        outcome: &LedgerOutcome<'_>,
        consolidation: &ConsolidationReport,
        leftovers: &Leftovers<'_>,
    ) -> Self {
        let matched_rows = outcome.rows.iter().filter(|r| r.result.is_matched()).count();
        Self {
            ledger: outcome.ledger.clone(),
            prefix: outcome.prefix.clone(),
            rows: outcome.rows.len(),
            matched_rows,
            missing_rows: outcome.rows.len() - matched_rows,
            flagged_rows: consolidation.flagged_rows.clone(),
            duplicate_counterparties: outcome
                .duplicate_counts
                .iter()
                .map(|(k, n)| (k.clone(), *n))
                .collect(),
            newly_consumed: outcome.newly_consumed.clone(),
            pages: consolidation.pages,
            documents_appended: consolidation.documents_appended,
            skipped_documents: consolidation.skipped.clone(),
            leftover_keys: leftovers.key_count(),
            leftover_documents: leftovers.document_count(),
        }
    }

    /// Human-readable lines, one fact each.
    pub fn lines(&self, header_row: usize) -> Vec<String> {
        let mut lines = vec![format!(
            "{}: {} rows, {} matched, {} missing, {} pages from {} documents",
            self.ledger, self.rows, self.matched_rows, self.missing_rows, self.pages, self.documents_appended
        )];
        if !self.duplicate_counterparties.is_empty() {
            lines.push(format!(
                "  repeated counterparties: {}",
                self.duplicate_counterparties
                    .iter()
                    .map(|(k, n)| format!("{k}×{n}"))
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        if !self.flagged_rows.is_empty() {
            let sheet_rows: Vec<String> = self
                .flagged_rows
                .iter()
                .map(|r| (r + header_row).to_string())
                .collect();
            lines.push(format!("  rows without documents: {}", sheet_rows.join(", ")));
        }
        for doc in &self.skipped_documents {
            lines.push(format!("  unreadable: {} ({})", doc.path.display(), doc.reason));
        }
        if self.leftover_keys > 0 {
            lines.push(format!(
                "  {} documents under {} counterparties not mentioned",
                self.leftover_documents, self.leftover_keys
            ));
        }
        lines
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunMeta {
    pub tool_version: String,
    /// RFC 3339, UTC.
    pub run_at: String,
    pub root: String,
}

impl RunMeta {
    pub fn now(root: &Path) -> Self {
        Self {
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
            root: root.display().to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LeftoverSummary {
    pub keys: usize,
    pub documents: usize,
    pub pages: usize,
    pub skipped_documents: Vec<UnreadableDocument>,
}

impl LeftoverSummary {
    pub fn new(leftovers: &Leftovers<'_>, consolidation: &ConsolidationReport) -> Self {
        Self {
            keys: leftovers.key_count(),
            documents: leftovers.document_count(),
            pages: consolidation.pages,
            skipped_documents: consolidation.skipped.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub meta: RunMeta,
    pub pool: PoolStats,
    pub ledgers: Vec<LedgerSummary>,
    pub failed: Vec<FailedLedger>,
    pub leftovers: LeftoverSummary,
}

impl RunReport {
    pub fn new(meta: RunMeta, pool: PoolStats, state: &RunState, leftovers: LeftoverSummary) -> Self {
        Self {
            meta,
            pool,
            ledgers: state.summaries().to_vec(),
            failed: state.failures().to_vec(),
            leftovers,
        }
    }

    pub fn flagged_rows(&self) -> usize {
        self.ledgers.iter().map(|l| l.flagged_rows.len()).sum()
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
