use std::collections::HashSet;
use std::path::Path;

use crate::error::ReconError;
use crate::model::{ConsolidationReport, DocumentRecord, LedgerOutcome, MatchResult, UnreadableDocument};
use crate::state::RunState;

/// The document-format side of consolidation: "append all pages of this
/// document to the bundle being built".
///
/// The engine decides which documents go in and in what order; the sink owns
/// the binary format.
pub trait PageSink {
    /// Append every page of the document at `path`, returning how many pages
    /// were appended. An error leaves the bundle unchanged.
    fn append_document(&mut self, path: &Path) -> Result<usize, String>;
}

/// Build one ledger's bundle.
///
/// Rows are walked in order. The first row of a matched key appends its whole
/// bucket; inherited duplicate rows append nothing. Every Missing row,
/// duplicates included, is flagged.
///
/// A key whose bucket contributes no readable document is demoted in
/// `outcome`: its rows become Missing and are flagged, and it leaves
/// `newly_consumed`, so a later ledger still gets a chance at it.
pub fn consolidate<S: PageSink>(
    outcome: &mut LedgerOutcome<'_>,
    sink: &mut S,
    state: &mut RunState,
) -> ConsolidationReport {
    let mut report = ConsolidationReport::default();
    let mut empty = HashSet::new();

    for row in &mut outcome.rows {
        match row.result {
            MatchResult::Matched(bucket) if row.is_first_occurrence() => {
                if append_bucket(bucket, sink, state, &mut report) == 0 {
                    empty.insert(row.key.clone());
                    row.result = MatchResult::Missing { row: row.row };
                    report.flagged_rows.push(row.row);
                }
            }
            MatchResult::Matched(_) => {
                if empty.contains(&row.key) {
                    let first = row.duplicate_of.unwrap_or(row.row);
                    row.result = MatchResult::Missing { row: first };
                    report.flagged_rows.push(row.row);
                }
            }
            MatchResult::Missing { .. } => report.flagged_rows.push(row.row),
        }
    }

    if !empty.is_empty() {
        log::warn!(
            "{}: {} counterparties have no readable document",
            outcome.ledger,
            empty.len()
        );
        outcome.newly_consumed.retain(|key| !empty.contains(key));
    }
    if !report.flagged_rows.is_empty() {
        log::warn!(
            "{}: {} row(s) without documents: {:?}",
            outcome.ledger,
            report.flagged_rows.len(),
            report.flagged_rows
        );
    }
    report
}

/// Append the documents of one bucket in order, skipping (and remembering)
/// any the sink cannot open. Returns how many documents went in.
pub fn append_bucket<S: PageSink>(
    bucket: &[DocumentRecord],
    sink: &mut S,
    state: &mut RunState,
    report: &mut ConsolidationReport,
) -> usize {
    let mut appended = 0;
    for doc in bucket {
        if state.is_unreadable(doc.path()) {
            continue;
        }
        match sink.append_document(doc.path()) {
            Ok(pages) => {
                report.pages += pages;
                report.documents_appended += 1;
                appended += 1;
            }
            Err(reason) => {
                let err = ReconError::UnreadableDocument {
                    path: doc.path.clone(),
                    reason: reason.clone(),
                };
                log::warn!("skipping {err}");
                state.mark_unreadable(doc.path(), reason.clone());
                report.skipped.push(UnreadableDocument {
                    path: doc.path.clone(),
                    reason,
                });
            }
        }
    }
    appended
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    use super::PageSink;

    /// In-memory sink: page counts by file name, anything unknown is unreadable.
    #[derive(Debug, Default)]
    pub struct MemorySink {
        pub pages_by_name: HashMap<String, usize>,
        pub appended: Vec<PathBuf>,
        pub pages: Vec<String>,
        pub attempts: usize,
    }

    impl MemorySink {
        pub fn with(docs: &[(&str, usize)]) -> Self {
            Self {
                pages_by_name: docs.iter().map(|(n, p)| (n.to_string(), *p)).collect(),
                ..Self::default()
            }
        }
    }

    impl PageSink for MemorySink {
        fn append_document(&mut self, path: &Path) -> Result<usize, String> {
            self.attempts += 1;
            let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
            let count = *self
                .pages_by_name
                .get(&name)
                .ok_or_else(|| format!("cannot parse {name}"))?;
            for page in 1..=count {
                self.pages.push(format!("{name}#{page}"));
            }
            self.appended.push(path.to_path_buf());
            Ok(count)
        }
    }
}
