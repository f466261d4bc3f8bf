// ledgerdoc: reconcile accounting ledgers against a folder of scanned documents

mod exit_codes;
mod run;
mod scan;
mod util;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use exit_codes::{EXIT_CONFIG, EXIT_ERROR, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "ledgerdoc")]
#[command(about = "Match ledger rows to scanned documents and bundle them per ledger")]
#[command(version)]
struct Cli {
    /// Log every file decision and progress tick
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile every ledger in a directory against the document pool
    #[command(after_help = "\
Examples:
  ledgerdoc run --root ./2024-scans
  ledgerdoc run --config ledgerdoc.toml
  ledgerdoc run --root . --ledger-dir ./ledgers --out ./out
  ledgerdoc run --root . --column 'Counterparty' --report run.json
  ledgerdoc run --root . --json --strict

Outputs per ledger (prefix = ledger file name up to the first '_'):
  <prefix>-排序后合并PDF文件.pdf     matched documents, in row order
  <prefix>-标记处理后Excel文件.xlsx  ledger copy, rows without documents highlighted
  <prefix>-未匹配PDF清单.txt         documents this ledger never mentions
and once per run: 未使用到的PDF合并后文件.pdf")]
    Run(run::RunArgs),

    /// Scan the document root and show how documents group by counterparty
    #[command(after_help = "\
Examples:
  ledgerdoc scan --root ./2024-scans
  ledgerdoc scan --root . --json")]
    Scan {
        /// Directory tree holding the scanned documents
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Print pool statistics as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Validate a config file without running
    #[command(after_help = "\
Examples:
  ledgerdoc check-config ledgerdoc.toml")]
    CheckConfig {
        /// Path to the TOML config file
        file: PathBuf,
    },
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,ledgerdoc=debug,ledgerdoc_recon=debug,ledgerdoc_io=debug")
    } else if quiet {
        EnvFilter::new("warn")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    // `log` records from the library crates are bridged by try_init.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Run(args) => run::cmd_run(args),
        Commands::Scan { root, json } => scan::cmd_scan(root, json),
        Commands::CheckConfig { file } => run::cmd_check_config(file),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            log::debug!("exit {code} ({})", exit_codes::describe(code));
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(EXIT_CONFIG, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_IO, msg)
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

impl From<ledgerdoc_io::IoError> for CliError {
    fn from(err: ledgerdoc_io::IoError) -> Self {
        match err {
            ledgerdoc_io::IoError::Ledger(e) => Self::config(e.to_string()),
            other => Self::io(other.to_string()),
        }
    }
}
