// File I/O around the reconciliation engine: document scan, ledger import,
// PDF bundles, annotated ledgers, listings and reports.

pub mod csv;
pub mod error;
pub mod ledger;
pub mod output;
pub mod pdf;
pub mod scan;
pub mod xlsx;

pub use error::IoError;
pub use ledger::{load_ledger, Cell, LedgerSheet};
pub use output::{write_ledger_outputs, write_listing, write_report, LedgerOutputs, Written};
pub use pdf::PdfBundle;
pub use scan::{build_pool, discover_ledgers, ScanStats};
