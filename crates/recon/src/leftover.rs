use std::collections::BTreeSet;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::model::{CanonicalKey, DocumentRecord};
use crate::pool::DocumentPool;

/// The part of a pool whose keys were never mentioned.
///
/// Buckets are ordered by descending document count, ties by ascending key.
#[derive(Debug, Clone)]
pub struct Leftovers<'p> {
    buckets: Vec<(&'p CanonicalKey, &'p [DocumentRecord])>,
}

impl<'p> Leftovers<'p> {
    pub fn buckets(&self) -> &[(&'p CanonicalKey, &'p [DocumentRecord])] {
        &self.buckets
    }

    pub fn keys(&self) -> impl Iterator<Item = &'p CanonicalKey> + '_ {
        self.buckets.iter().map(|(k, _)| *k)
    }

    pub fn key_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn document_count(&self) -> usize {
        self.buckets.iter().map(|(_, docs)| docs.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Documents in bundle order.
    pub fn documents(&self) -> impl Iterator<Item = &'p DocumentRecord> + '_ {
        self.buckets.iter().flat_map(|(_, docs)| docs.iter())
    }
}

/// `pool.keys - seen`. A key that was mentioned but never matched counts as
/// seen and is not a leftover.
pub fn leftovers<'p>(pool: &'p DocumentPool, seen: &BTreeSet<CanonicalKey>) -> Leftovers<'p> {
    let mut buckets: Vec<_> = pool
        .buckets()
        .filter(|(key, _)| !seen.contains(*key))
        .collect();
    buckets.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(b.0)));
    Leftovers { buckets }
}

/// Wording of the leftover listing file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingWords {
    /// Header before the total count.
    pub total: String,
    /// Unit after counts.
    pub unit: String,
}

impl Default for ListingWords {
    fn default() -> Self {
        Self {
            total: "未匹配 PDF 总计".to_string(),
            unit: "张".to_string(),
        }
    }
}

/// Render the listing text:
///
/// ```text
/// 未匹配 PDF 总计 3 张
///
/// ACME (2 张)
///   scans/a_ACME.pdf
///   scans/b_ACME.pdf
///
/// ```
pub fn render_listing(leftovers: &Leftovers<'_>, words: &ListingWords) -> String {
    let mut out = String::new();
    let _ = write!(out, "{} {} {}\n\n", words.total, leftovers.document_count(), words.unit);
    for (key, docs) in leftovers.buckets() {
        let _ = writeln!(out, "{key} ({} {})", docs.len(), words.unit);
        for doc in docs.iter() {
            let _ = writeln!(out, "  {}", doc.path().display());
        }
        out.push('\n');
    }
    out
}
