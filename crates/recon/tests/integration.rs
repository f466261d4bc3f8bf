use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ledgerdoc_recon::model::MatchResult;
use ledgerdoc_recon::{
    finish_run, process_ledger, DocumentPool, LedgerInput, LedgerRow, PageSink, RunState,
};

/// Sink that records page labels instead of writing a document.
#[derive(Default)]
struct PageLog {
    page_counts: HashMap<PathBuf, usize>,
    pages: Vec<String>,
}

impl PageLog {
    fn new(pool_pages: &[(&str, usize)]) -> Self {
        Self {
            page_counts: pool_pages
                .iter()
                .map(|(p, n)| (PathBuf::from(p), *n))
                .collect(),
            pages: Vec::new(),
        }
    }
}

impl PageSink for PageLog {
    fn append_document(&mut self, path: &Path) -> Result<usize, String> {
        let n = *self
            .page_counts
            .get(path)
            .ok_or_else(|| format!("{} is not a document", path.display()))?;
        for page in 1..=n {
            self.pages.push(format!("{}:{page}", path.display()));
        }
        Ok(n)
    }
}

fn ledger(name: &str, subjects: &[&str]) -> LedgerInput {
    LedgerInput {
        name: name.to_string(),
        rows: subjects
            .iter()
            .enumerate()
            .map(|(i, s)| LedgerRow::new(i + 1, *s))
            .collect(),
    }
}

const DOCS: &[(&str, usize)] = &[
    ("scans/发票_ACME.pdf", 2),
    ("scans/收据_ACME_20240105093000.pdf", 1),
    ("scans/发票_Beta Ltd.pdf", 4),
    ("scans/发票_（Gamma）.pdf", 1),
];

fn pool() -> DocumentPool {
    DocumentPool::from_paths(DOCS.iter().map(|(p, _)| *p))
}

// -------------------------------------------------------------------------
// End-to-end scenarios
// -------------------------------------------------------------------------

#[test]
fn scenario_a_two_documents_three_pages() {
    let pool = pool();
    let mut state = RunState::new();
    let mut sink = PageLog::new(DOCS);

    let run = process_ledger(&mut state, &pool, &ledger("应收账款_1.xlsx", &["INV_ACME"]), &mut sink);

    assert!(run.outcome.rows[0].result.is_matched());
    assert_eq!(run.consolidation.pages, 3);
    assert!(run.consolidation.flagged_rows.is_empty());
    assert_eq!(
        sink.pages,
        vec![
            "scans/发票_ACME.pdf:1",
            "scans/发票_ACME.pdf:2",
            "scans/收据_ACME_20240105093000.pdf:1",
        ]
    );
}

#[test]
fn scenario_b_missing_row_writes_nothing() {
    let pool = pool();
    let mut state = RunState::new();
    let mut sink = PageLog::new(DOCS);

    let run = process_ledger(&mut state, &pool, &ledger("应收账款_1.xlsx", &["INV_UNKNOWN"]), &mut sink);

    assert_eq!(run.outcome.rows[0].result, MatchResult::Missing { row: 1 });
    assert_eq!(run.consolidation.flagged_rows, vec![1]);
    assert!(run.consolidation.is_empty());
    assert!(sink.pages.is_empty());
    // UNKNOWN is still seen, even with no documents.
    assert!(state.seen().iter().any(|k| k.as_str() == "UNKNOWN"));
}

#[test]
fn scenario_c_second_ledger_reuses_documents() {
    let pool = pool();
    let mut state = RunState::new();

    let mut first_sink = PageLog::new(DOCS);
    let first = process_ledger(&mut state, &pool, &ledger("应收账款_1.xlsx", &["INV_ACME"]), &mut first_sink);
    assert_eq!(first.summary.newly_consumed.len(), 1);

    let mut second_sink = PageLog::new(DOCS);
    let second = process_ledger(
        &mut state,
        &pool,
        &ledger("预付账款_1.xlsx", &["PAY_acme", "PAY_Beta Ltd"]),
        &mut second_sink,
    );
    assert!(second.outcome.rows[0].result.is_matched());
    assert_eq!(second.consolidation.pages, 3 + 4);
    let newly: Vec<&str> = second.summary.newly_consumed.iter().map(|k| k.as_str()).collect();
    assert_eq!(newly, vec!["BETALTD"]);

    let mut leftover_sink = PageLog::new(DOCS);
    let done = finish_run(&mut state, &pool, &mut leftover_sink);
    let keys: Vec<&str> = done.leftovers.keys().map(|k| k.as_str()).collect();
    assert_eq!(keys, vec!["GAMMA"]);
    assert_eq!(leftover_sink.pages, vec!["scans/发票_（Gamma）.pdf:1"]);
}

// -------------------------------------------------------------------------
// Run-level properties
// -------------------------------------------------------------------------

#[test]
fn duplicate_rows_append_bucket_once() {
    let pool = pool();
    let mut state = RunState::new();
    let mut sink = PageLog::new(DOCS);

    let run = process_ledger(
        &mut state,
        &pool,
        &ledger("l.xlsx", &["A_ACME", "B_Beta Ltd", "C_ ＡＣＭＥ"]),
        &mut sink,
    );
    assert_eq!(run.outcome.rows[2].result, run.outcome.rows[0].result);
    assert_eq!(sink.pages.len(), 3 + 4);
    assert_eq!(run.summary.duplicate_counterparties.len(), 1);
}

#[test]
fn identical_runs_produce_identical_page_order() {
    let run_once = || {
        let pool = pool();
        let mut state = RunState::new();
        let mut sink = PageLog::new(DOCS);
        process_ledger(
            &mut state,
            &pool,
            &ledger("l.xlsx", &["x_Gamma", "x_NONE", "x_ACME", "x_BETALTD"]),
            &mut sink,
        );
        let mut leftover = PageLog::new(DOCS);
        finish_run(&mut state, &pool, &mut leftover);
        (sink.pages, leftover.pages)
    };
    assert_eq!(run_once(), run_once());
}

#[test]
fn leftovers_and_seen_partition_pool_keys() {
    let pool = pool();
    let mut state = RunState::new();
    let mut sink = PageLog::new(DOCS);
    process_ledger(&mut state, &pool, &ledger("l.xlsx", &["x_ACME", "x_NOPE"]), &mut sink);

    let mut leftover = PageLog::new(DOCS);
    let done = finish_run(&mut state, &pool, &mut leftover);
    for key in pool.keys() {
        let is_left = done.leftovers.keys().any(|k| k == key);
        let is_seen = state.seen().contains(key);
        assert!(is_left ^ is_seen, "{key}: left={is_left} seen={is_seen}");
    }
}

#[test]
fn unreadable_document_reported_and_skipped() {
    let pool = DocumentPool::from_paths(["scans/发票_ACME.pdf", "scans/broken_ACME_20240101000000.pdf"]);
    let mut state = RunState::new();
    let mut sink = PageLog::new(&[("scans/发票_ACME.pdf", 2)]);

    let run = process_ledger(&mut state, &pool, &ledger("l.xlsx", &["x_ACME"]), &mut sink);
    assert_eq!(run.consolidation.pages, 2);
    assert_eq!(run.summary.skipped_documents.len(), 1);
    assert!(run.outcome.rows[0].result.is_matched());
    assert_eq!(state.unreadable().len(), 1);
}

#[test]
fn counterparty_with_only_unreadable_documents_stays_flagged() {
    let pool = DocumentPool::from_paths(["scans/发票_ACME.pdf", "scans/发票_Broken.pdf"]);
    let mut state = RunState::new();
    let mut sink = PageLog::new(&[("scans/发票_ACME.pdf", 2)]);

    let run = process_ledger(
        &mut state,
        &pool,
        &ledger("预付账款_1.xlsx", &["x_ACME", "x_Broken", "y_BROKEN"]),
        &mut sink,
    );
    assert_eq!(run.summary.flagged_rows, vec![2, 3]);
    assert_eq!(run.summary.matched_rows, 1);
    assert_eq!(run.summary.skipped_documents.len(), 1);
    assert_eq!(run.outcome.newly_consumed.len(), 1);
    assert!(!run.outcome.rows[1].result.is_matched());

    // Mentioned, so it is not a leftover either.
    let mut leftover = PageLog::new(&[]);
    let done = finish_run(&mut state, &pool, &mut leftover);
    assert_eq!(done.summary.keys, 0);
    assert!(leftover.pages.is_empty());
}
