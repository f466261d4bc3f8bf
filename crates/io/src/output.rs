// Per-ledger and run-wide output files

use std::path::{Path, PathBuf};

use ledgerdoc_recon::config::OutputConfig;
use ledgerdoc_recon::{render_listing, LedgerRun, Leftovers, ListingWords, RunConfig, RunReport};

use crate::error::IoError;
use crate::ledger::LedgerSheet;
use crate::pdf::PdfBundle;
use crate::xlsx;

/// Where one ledger's outputs go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerOutputs {
    pub bundle: PathBuf,
    pub annotated: PathBuf,
    pub listing: PathBuf,
}

impl LedgerOutputs {
    pub fn new(dir: &Path, prefix: &str, output: &OutputConfig) -> Self {
        let [bundle, annotated, listing] = output.outputs_for(prefix);
        Self {
            bundle: dir.join(bundle),
            annotated: dir.join(annotated),
            listing: dir.join(listing),
        }
    }
}

/// Which files were actually produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Written {
    pub bundle: Option<PathBuf>,
    pub annotated: Option<PathBuf>,
    pub listing: Option<PathBuf>,
}

/// Persist everything one ledger produced: bundle (when it has pages),
/// annotated copy, and leftover listing (when anything is left over).
pub fn write_ledger_outputs(
    run: &LedgerRun<'_>,
    sheet: &LedgerSheet,
    bundle: PdfBundle,
    config: &RunConfig,
) -> Result<Written, IoError> {
    let dir = config.output_dir();
    let paths = LedgerOutputs::new(&dir, &run.outcome.prefix, &config.output);
    let mut written = Written::default();

    if bundle.save(&paths.bundle)? {
        written.bundle = Some(paths.bundle);
    }

    xlsx::write_annotated(
        sheet,
        &run.consolidation.flagged_rows,
        config.ledger.header_row,
        config.output.highlight_rgb()?,
        &paths.annotated,
    )?;
    log::info!("wrote {}", paths.annotated.display());
    written.annotated = Some(paths.annotated);

    if write_listing(&paths.listing, &run.leftovers, &config.output.listing)? {
        written.listing = Some(paths.listing);
    }
    Ok(written)
}

/// Write the leftover listing; nothing is written when there are no leftovers.
pub fn write_listing(path: &Path, leftovers: &Leftovers<'_>, words: &ListingWords) -> Result<bool, IoError> {
    if leftovers.is_empty() {
        return Ok(false);
    }
    std::fs::write(path, render_listing(leftovers, words)).map_err(|e| IoError::write(path, e))?;
    log::info!("wrote {} ({} documents)", path.display(), leftovers.document_count());
    Ok(true)
}

pub fn write_report(path: &Path, report: &RunReport) -> Result<(), IoError> {
    let json = report.to_json_pretty().map_err(|e| IoError::write(path, e))?;
    std::fs::write(path, json + "\n").map_err(|e| IoError::write(path, e))?;
    log::info!("wrote {}", path.display());
    Ok(())
}
