// Document tree scan and ledger discovery

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use ledgerdoc_recon::config::{DocumentsConfig, LedgerConfig, OutputConfig};
use ledgerdoc_recon::{DocumentPool, RunConfig};

use crate::error::IoError;

/// Why a file under the root was left out of the pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanStats {
    pub files_seen: usize,
    pub lock_files: usize,
    pub own_outputs: usize,
    pub unreadable: usize,
}

/// Candidate documents under `documents.root`, depth-first with each
/// directory's entries in file-name order.
pub fn scan_documents(
    documents: &DocumentsConfig,
    output: &OutputConfig,
    progress_every: usize,
) -> Result<(Vec<PathBuf>, ScanStats), IoError> {
    let root = &documents.root;
    if !root.is_dir() {
        return Err(IoError::open(root, "not a directory"));
    }

    let extension = documents.extension.trim_start_matches('.');
    let magic = documents.magic.as_bytes();
    let mut stats = ScanStats::default();
    let mut found = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("scan: {e}");
                stats.unreadable += 1;
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        stats.files_seen += 1;
        if stats.files_seen % progress_every.max(1) == 0 {
            log::debug!("scan: {} files checked, {} documents", stats.files_seen, found.len());
        }

        let name = entry.file_name().to_string_lossy();
        if !documents.lock_prefix.is_empty() && name.starts_with(documents.lock_prefix.as_str()) {
            log::debug!("scan: skipping lock file {}", entry.path().display());
            stats.lock_files += 1;
            continue;
        }
        if output.is_own_output(&name) {
            log::debug!("scan: skipping earlier output {}", entry.path().display());
            stats.own_outputs += 1;
            continue;
        }

        match is_candidate(entry.path(), extension, magic) {
            Ok(true) => found.push(entry.into_path()),
            Ok(false) => {}
            Err(e) => {
                log::debug!("scan: cannot sniff {}: {e}", entry.path().display());
                stats.unreadable += 1;
            }
        }
    }

    log::info!("scan: {} documents under {}", found.len(), root.display());
    Ok((found, stats))
}

/// Matching extension, or a file whose first bytes are `magic`.
fn is_candidate(path: &Path, extension: &str, magic: &[u8]) -> std::io::Result<bool> {
    let has_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(extension));
    if has_extension {
        return Ok(true);
    }
    if magic.is_empty() {
        return Ok(false);
    }

    let mut head = Vec::with_capacity(magic.len());
    File::open(path)?
        .take(magic.len() as u64)
        .read_to_end(&mut head)?;
    Ok(head == magic)
}

/// Scan the document root and bucket what it finds.
pub fn build_pool(config: &RunConfig) -> Result<(DocumentPool, ScanStats), IoError> {
    let (paths, stats) = scan_documents(&config.documents, &config.output, config.run.progress_every)?;
    Ok((DocumentPool::from_paths(paths), stats))
}

/// Ledger files directly inside the ledger directory, sorted by file name.
pub fn discover_ledgers(
    dir: &Path,
    ledger: &LedgerConfig,
    documents: &DocumentsConfig,
    output: &OutputConfig,
) -> Result<Vec<PathBuf>, IoError> {
    let entries = std::fs::read_dir(dir).map_err(|e| IoError::open(dir, e))?;

    let mut ledgers = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| IoError::open(dir, e))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !documents.lock_prefix.is_empty() && name.starts_with(documents.lock_prefix.as_str()) {
            continue;
        }
        if output.is_own_output(&name) {
            continue;
        }
        let wanted = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| ledger.extensions.iter().any(|x| x.eq_ignore_ascii_case(e)));
        if wanted {
            ledgers.push(path);
        }
    }

    ledgers.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    log::info!("{} ledger(s) in {}", ledgers.len(), dir.display());
    Ok(ledgers)
}
