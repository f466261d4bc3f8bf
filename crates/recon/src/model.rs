use std::borrow::Borrow;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

// ---------------------------------------------------------------------------
// Keys
// ---------------------------------------------------------------------------

/// Normalized counterparty identity. Two raw strings name the same
/// counterparty iff their keys are equal.
///
/// Only [`crate::normalize`] builds keys from raw text, so every key in the
/// system is already in canonical form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct CanonicalKey(pub(crate) String);

impl CanonicalKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The empty key never matches a document bucket.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for CanonicalKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// A supporting document discovered by the pool scan. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentRecord {
    pub path: PathBuf,
    pub key: CanonicalKey,
}

impl DocumentRecord {
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// One data row of a ledger.
///
/// `index` is 1-based over data rows (the header is not counted). `fields`
/// holds the row's other cells untouched; the engine never reads them.
#[derive(Debug, Clone, PartialEq)]
pub struct LedgerRow {
    pub index: usize,
    pub subject: Option<String>,
    pub fields: Vec<String>,
}

impl LedgerRow {
    pub fn new(index: usize, subject: impl Into<String>) -> Self {
        Self {
            index,
            subject: Some(subject.into()),
            fields: Vec::new(),
        }
    }
}

/// A ledger as handed to the engine: its file name plus its rows in order.
#[derive(Debug, Clone)]
pub struct LedgerInput {
    pub name: String,
    pub rows: Vec<LedgerRow>,
}

// ---------------------------------------------------------------------------
// Matching
// ---------------------------------------------------------------------------

/// Match state of one ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchResult<'p> {
    /// The counterparty's bucket, in scan order.
    Matched(&'p [DocumentRecord]),
    /// No documents; `row` is the row that resolved the key first.
    Missing { row: usize },
}

impl MatchResult<'_> {
    pub fn is_matched(&self) -> bool {
        matches!(self, Self::Matched(_))
    }
}

/// Per-row record produced by the reconciler.
#[derive(Debug, Clone, PartialEq)]
pub struct RowMatch<'p> {
    pub row: usize,
    pub key: CanonicalKey,
    pub result: MatchResult<'p>,
    /// First row in this ledger with the same key, when this row repeats it.
    pub duplicate_of: Option<usize>,
}

impl RowMatch<'_> {
    /// True for the row that performed the bucket lookup for its key.
    pub fn is_first_occurrence(&self) -> bool {
        self.duplicate_of.is_none()
    }
}

/// Everything one ledger contributes to the run, before it is committed to
/// [`crate::RunState`].
#[derive(Debug, Clone)]
pub struct LedgerOutcome<'p> {
    pub ledger: String,
    pub prefix: String,
    pub rows: Vec<RowMatch<'p>>,
    /// Rows per key, only for keys that occur more than once.
    pub duplicate_counts: BTreeMap<CanonicalKey, usize>,
    /// Keys this ledger consumed before any earlier ledger did.
    pub newly_consumed: Vec<CanonicalKey>,
}

impl<'p> LedgerOutcome<'p> {
    /// Row indices to highlight: every row whose result is Missing,
    /// duplicates included.
    pub fn flagged_rows(&self) -> Vec<usize> {
        self.rows
            .iter()
            .filter(|r| !r.result.is_matched())
            .map(|r| r.row)
            .collect()
    }

    /// Matched keys in first-seen row order.
    pub fn matched_keys(&self) -> impl Iterator<Item = &CanonicalKey> {
        self.rows
            .iter()
            .filter(|r| r.is_first_occurrence() && r.result.is_matched())
            .map(|r| &r.key)
    }

    /// Every non-empty key the ledger mentions.
    pub fn mentioned_keys(&self) -> impl Iterator<Item = &CanonicalKey> {
        self.rows
            .iter()
            .filter(|r| r.is_first_occurrence() && !r.key.is_empty())
            .map(|r| &r.key)
    }
}

/// A document the page sink could not open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnreadableDocument {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of building one bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsolidationReport {
    pub pages: usize,
    pub documents_appended: usize,
    pub flagged_rows: Vec<usize>,
    pub skipped: Vec<UnreadableDocument>,
}

impl ConsolidationReport {
    /// Bundles with no pages are not written.
    pub fn is_empty(&self) -> bool {
        self.pages == 0
    }
}
