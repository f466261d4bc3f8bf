//! `ledgerdoc-recon`: ledger to scanned-document reconciliation engine.
//!
//! Pure engine crate: receives document paths and ledger rows, decides which
//! documents belong to which ledger and in what order. Reading spreadsheets
//! and writing PDFs is left to collaborators behind [`PageSink`].

pub mod config;
pub mod consolidate;
pub mod engine;
pub mod error;
pub mod leftover;
pub mod model;
pub mod normalize;
pub mod pool;
pub mod reconcile;
pub mod report;
pub mod state;

pub use config::RunConfig;
pub use consolidate::PageSink;
pub use engine::{finish_run, process_ledger, LedgerRun, LeftoverRun};
pub use error::ReconError;
pub use leftover::{leftovers, render_listing, Leftovers, ListingWords};
pub use model::{CanonicalKey, DocumentRecord, LedgerInput, LedgerRow, MatchResult};
pub use normalize::normalize;
pub use pool::DocumentPool;
pub use report::{LedgerSummary, RunMeta, RunReport};
pub use state::RunState;
