//! Counterparty identity normalization.
//!
//! Ledger subjects and document file names spell the same counterparty in
//! different ways (full-width letters, stray spaces, brackets, dashes). Both
//! are reduced to a [`CanonicalKey`] and joined by exact equality.

use unicode_normalization::UnicodeNormalization;

use crate::model::CanonicalKey;

/// Bracket and punctuation characters dropped from keys.
const STRIPPED: &[char] = &[
    '(', ')', '（', '）', '【', '】', '[', ']', '{', '}', '「', '」', '『', '』', '“', '”', '"',
    '\'', '、', '，', '．', '·', '•', '-', '—',
];

/// Length of the timestamp segments some scanners append to file names.
const TIMESTAMP_DIGITS: usize = 14;

/// Normalize a raw counterparty string into its canonical key.
///
/// NFKC width folding, all whitespace removed, [`STRIPPED`] removed, then
/// upper-cased. Idempotent: upper-casing can leave text that NFKC would
/// rewrite again, so passes repeat until the output is stable.
pub fn normalize(raw: &str) -> CanonicalKey {
    let mut out = normalize_pass(raw);
    loop {
        let next = normalize_pass(&out);
        if next == out {
            break;
        }
        out = next;
    }
    CanonicalKey(out)
}

fn normalize_pass(raw: &str) -> String {
    raw.nfkc()
        .filter(|c| !c.is_whitespace() && !STRIPPED.contains(c))
        .collect::<String>()
        .to_uppercase()
}

/// Key for a missing cell.
pub fn normalize_opt(raw: Option<&str>) -> CanonicalKey {
    raw.map(normalize).unwrap_or_default()
}

/// Key from a ledger subject such as `应收账款_ACME Ltd`: the text after the
/// first underscore, or the whole field when there is none.
pub fn key_from_subject(subject: &str) -> CanonicalKey {
    let counterparty = subject
        .split_once('_')
        .map(|(_, rest)| rest)
        .unwrap_or(subject);
    normalize(counterparty)
}

/// Key from a document file stem such as `发票_ACME_20240105093000`.
///
/// Exactly two segments: the second one. Otherwise the last segment that is
/// not a 14-digit timestamp, or the whole stem when every segment is one.
pub fn key_from_filename(stem: &str) -> CanonicalKey {
    let parts: Vec<&str> = stem.split('_').collect();
    if parts.len() == 2 {
        return normalize(parts[1]);
    }
    parts
        .iter()
        .rev()
        .find(|part| !is_timestamp(part))
        .map(|part| normalize(part))
        .unwrap_or_else(|| normalize(stem))
}

/// `YYYYMMDDhhmmss`-shaped segment: exactly 14 ASCII digits.
fn is_timestamp(segment: &str) -> bool {
    segment.len() == TIMESTAMP_DIGITS && segment.bytes().all(|b| b.is_ascii_digit())
}
