use std::fmt;
use std::path::{Path, PathBuf};

use ledgerdoc_recon::ReconError;

#[derive(Debug)]
pub enum IoError {
    /// A file or directory could not be opened or listed.
    Open { path: PathBuf, reason: String },
    /// A file opened but its contents could not be parsed.
    Read { path: PathBuf, reason: String },
    /// An output could not be written.
    Write { path: PathBuf, reason: String },
    /// The ledger was read but does not have the shape the engine needs.
    Ledger(ReconError),
}

impl IoError {
    pub fn open(path: &Path, reason: impl fmt::Display) -> Self {
        Self::Open {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn read(path: &Path, reason: impl fmt::Display) -> Self {
        Self::Read {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn write(path: &Path, reason: impl fmt::Display) -> Self {
        Self::Write {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, reason } => write!(f, "cannot open {}: {reason}", path.display()),
            Self::Read { path, reason } => write!(f, "cannot read {}: {reason}", path.display()),
            Self::Write { path, reason } => write!(f, "cannot write {}: {reason}", path.display()),
            Self::Ledger(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for IoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Ledger(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ReconError> for IoError {
    fn from(e: ReconError) -> Self {
        Self::Ledger(e)
    }
}
