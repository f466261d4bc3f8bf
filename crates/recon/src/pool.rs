use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::ReconError;
use crate::model::{CanonicalKey, DocumentRecord};
use crate::normalize::key_from_filename;

/// Documents grouped by counterparty key.
///
/// Buckets keep scan order, and keys keep the order in which their first
/// document was scanned. Documents whose name yields an empty key are held
/// apart in `unbucketed` and can never be matched.
#[derive(Debug, Default, Clone)]
pub struct DocumentPool {
    buckets: Vec<(CanonicalKey, Vec<DocumentRecord>)>,
    index: HashMap<CanonicalKey, usize>,
    unbucketed: Vec<PathBuf>,
}

impl DocumentPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a pool from paths in scan order, deriving each key from the
    /// file stem.
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut pool = Self::new();
        for path in paths {
            pool.insert(path.into());
        }
        log::info!("document pool: {} documents in {} buckets", pool.len(), pool.bucket_count());
        pool
    }

    /// Add one document at the end of its bucket.
    pub fn insert(&mut self, path: PathBuf) {
        let key = key_from_filename(&file_stem(&path));
        if key.is_empty() {
            let origin = path.display().to_string();
            log::debug!("not bucketed: {}", ReconError::EmptyNormalizedKey { origin });
            self.unbucketed.push(path);
            return;
        }

        let record = DocumentRecord { path, key: key.clone() };
        match self.index.get(&key) {
            Some(&slot) => self.buckets[slot].1.push(record),
            None => {
                self.index.insert(key.clone(), self.buckets.len());
                self.buckets.push((key, vec![record]));
            }
        }
    }

    /// The bucket for `key`. The empty key never has one.
    pub fn bucket(&self, key: &str) -> Option<&[DocumentRecord]> {
        if key.is_empty() {
            return None;
        }
        self.index
            .get(key)
            .map(|&slot| self.buckets[slot].1.as_slice())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.bucket(key).is_some()
    }

    /// Keys with their buckets, in first-scanned order.
    pub fn buckets(&self) -> impl Iterator<Item = (&CanonicalKey, &[DocumentRecord])> {
        self.buckets.iter().map(|(k, docs)| (k, docs.as_slice()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &CanonicalKey> {
        self.buckets.iter().map(|(k, _)| k)
    }

    /// Number of bucketed documents.
    pub fn len(&self) -> usize {
        self.buckets.iter().map(|(_, docs)| docs.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    pub fn unbucketed(&self) -> &[PathBuf] {
        &self.unbucketed
    }

    pub fn stats(&self) -> PoolStats {
        let mut multi_document: Vec<(CanonicalKey, usize)> = self
            .buckets
            .iter()
            .filter(|(_, docs)| docs.len() > 1)
            .map(|(k, docs)| (k.clone(), docs.len()))
            .collect();
        multi_document.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        PoolStats {
            documents: self.len(),
            buckets: self.bucket_count(),
            unbucketed: self.unbucketed.len(),
            multi_document,
        }
    }
}

/// File name without its last extension; extension-less names pass through.
fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    pub documents: usize,
    pub buckets: usize,
    pub unbucketed: usize,
    /// Counterparties with more than one document, largest first.
    pub multi_document: Vec<(CanonicalKey, usize)>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(names: &[&str]) -> DocumentPool {
        DocumentPool::from_paths(names.iter().map(|n| PathBuf::from(format!("scans/{n}"))))
    }

    #[test]
    fn groups_by_key_in_scan_order() {
        let p = pool(&[
            "发票_ACME.pdf",
            "发票_Beta Ltd.pdf",
            "收据_ＡＣＭＥ_20240105093000.pdf",
        ]);
        assert_eq!(p.len(), 3);
        assert_eq!(p.bucket_count(), 2);

        let acme = p.bucket("ACME").unwrap();
        assert_eq!(acme.len(), 2);
        assert_eq!(acme[0].path, PathBuf::from("scans/发票_ACME.pdf"));
        assert_eq!(acme[1].path, PathBuf::from("scans/收据_ＡＣＭＥ_20240105093000.pdf"));
        assert!(acme.iter().all(|d| d.key.as_str() == "ACME"));

        let keys: Vec<&str> = p.keys().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["ACME", "BETALTD"]);
    }

    #[test]
    fn empty_key_documents_are_unbucketed() {
        let p = pool(&["x_().pdf", "发票_ACME.pdf"]);
        assert_eq!(p.len(), 1);
        assert_eq!(p.unbucketed().len(), 1);
        assert!(p.bucket("").is_none());
        assert!(!p.contains_key(""));
    }

    #[test]
    fn extensionless_file_uses_whole_name() {
        let p = pool(&["发票_ACME"]);
        assert!(p.contains_key("ACME"));
    }

    #[test]
    fn stats_list_multi_document_counterparties() {
        let p = pool(&[
            "a_B.pdf", "a_A.pdf", "b_A.pdf", "c_C.pdf", "d_C.pdf", "e_C.pdf", "f_B.pdf",
        ]);
        let stats = p.stats();
        assert_eq!(stats.documents, 7);
        assert_eq!(stats.buckets, 3);
        let multi: Vec<(&str, usize)> =
            stats.multi_document.iter().map(|(k, n)| (k.as_str(), *n)).collect();
        assert_eq!(multi, vec![("C", 3), ("A", 2), ("B", 2)]);
    }
}
