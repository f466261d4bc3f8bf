//! `ledgerdoc scan`: pool statistics without touching any ledger.

use std::path::PathBuf;

use ledgerdoc_io::build_pool;
use ledgerdoc_recon::RunConfig;

use crate::util::count_table;
use crate::CliError;

/// Counterparties shown in the human listing.
const TOP_COUNTERPARTIES: usize = 20;

pub fn cmd_scan(root: PathBuf, json: bool) -> Result<(), CliError> {
    if !root.is_dir() {
        return Err(CliError::usage(format!("{} is not a directory", root.display())));
    }

    let mut config = RunConfig::default();
    config.documents.root = root;
    let (pool, scan) = build_pool(&config)?;
    let stats = pool.stats();

    if json {
        let value = serde_json::json!({
            "root": config.documents.root.display().to_string(),
            "documents": stats.documents,
            "buckets": stats.buckets,
            "unbucketed": stats.unbucketed,
            "multi_document": stats.multi_document,
            "skipped": scan,
        });
        let text = serde_json::to_string_pretty(&value)
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{text}");
        return Ok(());
    }

    println!(
        "{} documents, {} counterparties, {} without a counterparty",
        stats.documents, stats.buckets, stats.unbucketed
    );
    if scan.lock_files + scan.own_outputs + scan.unreadable > 0 {
        println!(
            "skipped: {} lock files, {} earlier outputs, {} unreadable",
            scan.lock_files, scan.own_outputs, scan.unreadable
        );
    }
    if !stats.multi_document.is_empty() {
        println!("counterparties with several documents:");
        let top = stats
            .multi_document
            .iter()
            .take(TOP_COUNTERPARTIES)
            .map(|(key, n)| (key.as_str(), *n));
        for line in count_table(top, 40) {
            println!("{line}");
        }
        if stats.multi_document.len() > TOP_COUNTERPARTIES {
            println!("  ... {} more", stats.multi_document.len() - TOP_COUNTERPARTIES);
        }
    }
    Ok(())
}
