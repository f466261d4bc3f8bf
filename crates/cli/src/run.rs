//! `ledgerdoc run` and `ledgerdoc check-config`.

use std::path::{Path, PathBuf};

use clap::Args;

use ledgerdoc_io::{build_pool, discover_ledgers, load_ledger, write_ledger_outputs, write_report, PdfBundle};
use ledgerdoc_recon::{finish_run, process_ledger, RunConfig, RunMeta, RunReport, RunState};

use crate::exit_codes::{EXIT_LEDGER_FAILED, EXIT_NO_LEDGERS, EXIT_STRICT_UNMATCHED};
use crate::util::count_table;
use crate::CliError;

#[derive(Args)]
pub struct RunArgs {
    /// TOML config file; relative paths inside it resolve against its directory
    #[arg(long, short = 'c', env = "LEDGERDOC_CONFIG")]
    config: Option<PathBuf>,

    /// Directory tree holding the scanned documents
    #[arg(long)]
    root: Option<PathBuf>,

    /// Directory holding the ledgers (defaults to the root)
    #[arg(long)]
    ledger_dir: Option<PathBuf>,

    /// Directory for all outputs (defaults to the root)
    #[arg(long)]
    out: Option<PathBuf>,

    /// Header of the counterparty column
    #[arg(long, value_name = "NAME")]
    column: Option<String>,

    /// Write the JSON run report to this file
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Print the JSON run report on stdout instead of the human summary
    #[arg(long)]
    json: bool,

    /// Exit 7 when any ledger row has no supporting document
    #[arg(long)]
    strict: bool,
}

/// Load the config file (or defaults) and apply command-line overrides.
fn resolve_config(args: &RunArgs) -> Result<RunConfig, CliError> {
    let mut config = match &args.config {
        Some(path) => load_config_file(path)?,
        None => RunConfig::default(),
    };

    if let Some(root) = &args.root {
        config.documents.root = root.clone();
    }
    if let Some(dir) = &args.ledger_dir {
        config.ledger.dir = Some(dir.clone());
    }
    if let Some(dir) = &args.out {
        config.output.dir = Some(dir.clone());
    }
    if let Some(column) = &args.column {
        config.ledger.subject_column = column.clone();
    }
    if let Some(report) = &args.report {
        config.output.report_json = Some(report.clone());
    }

    config.validate().map_err(|e| CliError::config(e.to_string()))?;
    Ok(config)
}

fn load_config_file(path: &Path) -> Result<RunConfig, CliError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::io(format!("cannot read config {}: {e}", path.display())))?;
    let mut config = RunConfig::from_toml(&text)
        .map_err(|e| CliError::config(format!("{}: {e}", path.display())))?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    let rebase = |p: &mut PathBuf| {
        if p.is_relative() {
            *p = base.join(&*p);
        }
    };
    rebase(&mut config.documents.root);
    for p in [&mut config.ledger.dir, &mut config.output.dir, &mut config.output.report_json]
        .into_iter()
        .flatten()
    {
        rebase(p);
    }
    Ok(config)
}

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let config = resolve_config(&args)?;

    let root = &config.documents.root;
    if !root.is_dir() {
        return Err(CliError::usage(format!("document root {} is not a directory", root.display()))
            .with_hint("pass --root or set documents.root in the config"));
    }

    let (pool, scan) = build_pool(&config)?;
    log::info!(
        "{} documents in {} counterparties ({} lock files, {} earlier outputs skipped)",
        pool.len(),
        pool.bucket_count(),
        scan.lock_files,
        scan.own_outputs
    );

    let ledger_dir = config.ledger_dir();
    let ledgers = discover_ledgers(&ledger_dir, &config.ledger, &config.documents, &config.output)?;
    if ledgers.is_empty() {
        return Err(CliError::new(
            EXIT_NO_LEDGERS,
            format!("no ledgers found in {}", ledger_dir.display()),
        )
        .with_hint(format!(
            "ledgers are files ending in .{}; use --ledger-dir to point elsewhere",
            config.ledger.extensions.join(", .")
        )));
    }

    let output_dir = config.output_dir();
    std::fs::create_dir_all(&output_dir)
        .map_err(|e| CliError::io(format!("cannot create {}: {e}", output_dir.display())))?;

    let mut state = RunState::with_progress_every(config.run.progress_every);
    for path in &ledgers {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let (sheet, input) = match load_ledger(path, &config.ledger) {
            Ok(loaded) => loaded,
            Err(e) => {
                state.record_failure(name, &e);
                continue;
            }
        };

        let mut bundle = PdfBundle::new();
        let run = process_ledger(&mut state, &pool, &input, &mut bundle);
        // Matching already committed; only the files are missing.
        if let Err(e) = write_ledger_outputs(&run, &sheet, bundle, &config) {
            state.record_failure(name, &e);
        }
    }

    let mut leftover = PdfBundle::new();
    let done = finish_run(&mut state, &pool, &mut leftover);
    leftover.save(&output_dir.join(&config.output.leftover_bundle))?;

    let report = RunReport::new(RunMeta::now(root), pool.stats(), &state, done.summary);
    if let Some(path) = &config.output.report_json {
        write_report(path, &report)?;
    }

    if args.json {
        let json = report
            .to_json_pretty()
            .map_err(|e| CliError::general(format!("JSON serialization error: {e}")))?;
        println!("{json}");
    } else {
        print_summary(&report, config.ledger.header_row);
    }

    if !report.failed.is_empty() {
        return Err(CliError::new(
            EXIT_LEDGER_FAILED,
            format!("{} of {} ledger(s) failed", report.failed.len(), ledgers.len()),
        ));
    }
    let flagged = report.flagged_rows();
    if args.strict && flagged > 0 {
        return Err(CliError::new(
            EXIT_STRICT_UNMATCHED,
            format!("{flagged} ledger row(s) without documents"),
        )
        .with_hint("the highlighted rows are in each <prefix>-标记处理后Excel文件.xlsx"));
    }
    Ok(())
}

/// Human summary on stderr.
fn print_summary(report: &RunReport, header_row: usize) {
    for ledger in &report.ledgers {
        for line in ledger.lines(header_row) {
            eprintln!("{line}");
        }
    }
    for failed in &report.failed {
        eprintln!("{}: FAILED: {}", failed.ledger, failed.error);
    }

    let left = &report.leftovers;
    if left.keys == 0 {
        eprintln!("every document was mentioned by a ledger");
    } else {
        eprintln!(
            "never mentioned: {} documents under {} counterparties, {} pages bundled",
            left.documents, left.keys, left.pages
        );
    }

    if report.flagged_rows() > 0 {
        eprintln!("rows without documents:");
        let rows = report.ledgers.iter().map(|l| (l.ledger.as_str(), l.flagged_rows.len()));
        for line in count_table(rows, 40) {
            eprintln!("{line}");
        }
    }
}

pub fn cmd_check_config(file: PathBuf) -> Result<(), CliError> {
    let config = load_config_file(&file)?;
    eprintln!(
        "valid: documents under {}, ledgers in {}, subject column '{}'",
        config.documents.root.display(),
        config.ledger_dir().display(),
        config.ledger.subject_column,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: RunArgs,
    }

    fn args(argv: &[&str]) -> RunArgs {
        let mut full = vec!["ledgerdoc"];
        full.extend_from_slice(argv);
        Harness::parse_from(full).args
    }

    #[test]
    fn flags_override_defaults() {
        let config = resolve_config(&args(&[
            "--root",
            "/scans",
            "--out",
            "/out",
            "--column",
            "往来单位",
            "--report",
            "/out/run.json",
        ]))
        .unwrap();
        assert_eq!(config.documents.root, PathBuf::from("/scans"));
        assert_eq!(config.output_dir(), PathBuf::from("/out"));
        assert_eq!(config.ledger_dir(), PathBuf::from("/scans"));
        assert_eq!(config.ledger.subject_column, "往来单位");
        assert_eq!(config.output.report_json, Some(PathBuf::from("/out/run.json")));
    }

    #[test]
    fn empty_column_is_a_config_error() {
        let err = resolve_config(&args(&["--column", " "])).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_CONFIG);
    }

    #[test]
    fn config_paths_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledgerdoc.toml");
        std::fs::write(
            &path,
            "[documents]\nroot = \"scans\"\n\n[output]\ndir = \"/abs/out\"\n",
        )
        .unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.documents.root, dir.path().join("scans"));
        assert_eq!(config.output.dir, Some(PathBuf::from("/abs/out")));
        assert_eq!(config.ledger.dir, None);
    }

    #[test]
    fn missing_config_file_is_io() {
        let err = load_config_file(Path::new("/nonexistent/ledgerdoc.toml")).unwrap_err();
        assert_eq!(err.code, crate::exit_codes::EXIT_IO);
    }
}
