use std::collections::{BTreeMap, HashMap};

use crate::error::ReconError;
use crate::model::{CanonicalKey, LedgerOutcome, LedgerRow, MatchResult, RowMatch};
use crate::normalize::key_from_subject;
use crate::pool::DocumentPool;
use crate::state::RunState;

/// Resolve every row of one ledger against the pool.
///
/// Row order is preserved. The first row carrying a key performs the bucket
/// lookup; later rows with the same key inherit that result and are counted
/// as duplicates. Rows whose key is empty are Missing on their own and are
/// never grouped with each other.
///
/// `state` is only read here (to tell newly consumed keys from ones an
/// earlier ledger already took); [`RunState::commit`] applies the outcome.
pub fn reconcile<'p>(
    ledger: &str,
    rows: &[LedgerRow],
    pool: &'p DocumentPool,
    state: &RunState,
) -> LedgerOutcome<'p> {
    let mut first_seen: HashMap<CanonicalKey, (usize, MatchResult<'p>)> = HashMap::new();
    let mut occurrences: BTreeMap<CanonicalKey, usize> = BTreeMap::new();
    let mut newly_consumed = Vec::new();
    let mut matched = Vec::with_capacity(rows.len());

    for (n, row) in rows.iter().enumerate() {
        if n > 0 && n % state.progress_every() == 0 {
            log::debug!("{ledger}: {n} of {} rows matched", rows.len());
        }

        let key = row
            .subject
            .as_deref()
            .map(key_from_subject)
            .unwrap_or_default();

        if key.is_empty() {
            let origin = row.subject.clone().unwrap_or_default();
            log::debug!("{ledger}: row {}: {}", row.index, ReconError::EmptyNormalizedKey { origin });
            matched.push(RowMatch {
                row: row.index,
                key,
                result: MatchResult::Missing { row: row.index },
                duplicate_of: None,
            });
            continue;
        }

        *occurrences.entry(key.clone()).or_insert(0) += 1;

        if let Some(&(first_row, result)) = first_seen.get(&key) {
            matched.push(RowMatch {
                row: row.index,
                key,
                result,
                duplicate_of: Some(first_row),
            });
            continue;
        }

        let result = match pool.bucket(key.as_str()) {
            Some(bucket) if !bucket.is_empty() => {
                if !state.is_consumed(&key) {
                    newly_consumed.push(key.clone());
                }
                MatchResult::Matched(bucket)
            }
            _ => MatchResult::Missing { row: row.index },
        };
        first_seen.insert(key.clone(), (row.index, result));
        matched.push(RowMatch {
            row: row.index,
            key,
            result,
            duplicate_of: None,
        });
    }

    occurrences.retain(|_, count| *count > 1);
    if !occurrences.is_empty() {
        log::info!(
            "{ledger}: repeated counterparties: {}",
            occurrences
                .iter()
                .map(|(k, n)| format!("{k}×{n}"))
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    LedgerOutcome {
        ledger: ledger.to_string(),
        prefix: ledger_prefix(ledger),
        rows: matched,
        duplicate_counts: occurrences,
        newly_consumed,
    }
}

/// Output-name prefix of a ledger: its base name up to the first underscore
/// (`应收账款_2024Q1.xlsx` -> `应收账款`), or the whole stem without one.
pub fn ledger_prefix(ledger: &str) -> String {
    let base = ledger.rsplit(['/', '\\']).next().unwrap_or(ledger);
    let stem = match base.rfind('.') {
        Some(dot) if dot > 0 => &base[..dot],
        _ => base,
    };
    stem.split('_').next().unwrap_or(stem).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn pool(names: &[&str]) -> DocumentPool {
        DocumentPool::from_paths(names.iter().map(PathBuf::from))
    }

    fn rows(subjects: &[&str]) -> Vec<LedgerRow> {
        subjects
            .iter()
            .enumerate()
            .map(|(i, s)| LedgerRow::new(i + 1, *s))
            .collect()
    }

    #[test]
    fn matched_and_missing_rows() {
        let p = pool(&["发票_ACME.pdf", "收据_ACME_20240105093000.pdf"]);
        let state = RunState::new();
        let out = reconcile("应收_1.xlsx", &rows(&["INV_ACME", "INV_UNKNOWN"]), &p, &state);

        assert_eq!(out.rows.len(), 2);
        match out.rows[0].result {
            MatchResult::Matched(bucket) => assert_eq!(bucket.len(), 2),
            other => panic!("expected match, got {other:?}"),
        }
        assert_eq!(out.rows[1].result, MatchResult::Missing { row: 2 });
        assert_eq!(out.flagged_rows(), vec![2]);
        assert_eq!(out.newly_consumed, vec![key("ACME")]);
    }

    #[test]
    fn duplicates_inherit_first_result() {
        let p = pool(&["a_ACME.pdf"]);
        let state = RunState::new();
        let out = reconcile(
            "l.xlsx",
            &rows(&["INV_ACME", "INV_NOPE", "PAY_ ａｃｍｅ ", "X_NOPE"]),
            &p,
            &state,
        );

        assert_eq!(out.rows[2].result, out.rows[0].result);
        assert_eq!(out.rows[2].duplicate_of, Some(1));
        assert_eq!(out.rows[3].result, MatchResult::Missing { row: 2 });
        assert_eq!(out.rows[3].duplicate_of, Some(2));

        // Flagging is per row: both NOPE rows are flagged.
        assert_eq!(out.flagged_rows(), vec![2, 4]);
        assert_eq!(out.duplicate_counts.get(&key("ACME")), Some(&2));
        assert_eq!(out.duplicate_counts.get(&key("NOPE")), Some(&2));
        assert_eq!(out.newly_consumed, vec![key("ACME")]);
    }

    #[test]
    fn empty_key_never_matches() {
        // A document whose name normalizes to nothing must not act as a wildcard.
        let p = pool(&["x_().pdf", "a_ACME.pdf"]);
        let state = RunState::new();
        let mut input = rows(&["INV_", "INV_()"]);
        input.push(LedgerRow { index: 3, subject: None, fields: vec![] });
        let out = reconcile("l.xlsx", &input, &p, &state);

        assert!(out.rows.iter().all(|r| !r.result.is_matched()));
        assert!(out.rows.iter().all(|r| r.duplicate_of.is_none()));
        assert_eq!(out.flagged_rows(), vec![1, 2, 3]);
        assert!(out.duplicate_counts.is_empty());
        assert_eq!(out.mentioned_keys().count(), 0);
    }

    #[test]
    fn already_consumed_key_is_not_newly_consumed() {
        let p = pool(&["a_ACME.pdf"]);
        let mut state = RunState::new();
        let first = reconcile("a.xlsx", &rows(&["INV_ACME"]), &p, &state);
        state.commit(&first);

        let second = reconcile("b.xlsx", &rows(&["INV_ACME"]), &p, &state);
        assert!(second.rows[0].result.is_matched());
        assert!(second.newly_consumed.is_empty());
    }

    #[test]
    fn prefix_is_text_before_first_underscore() {
        assert_eq!(ledger_prefix("应收账款_2024Q1.xlsx"), "应收账款");
        assert_eq!(ledger_prefix("dir/预付账款_a_b.xls"), "预付账款");
        assert_eq!(ledger_prefix("ledger.csv"), "ledger");
        assert_eq!(ledger_prefix(".hidden"), ".hidden");
    }

    fn key(s: &str) -> CanonicalKey {
        crate::normalize(s)
    }
}
