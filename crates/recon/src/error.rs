use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (empty column name, bad colour, etc.).
    ConfigValidation(String),
    /// The ledger has no counterparty column with the configured name.
    MissingRequiredColumn { ledger: String, column: String },
    /// A candidate document could not be opened for page extraction.
    UnreadableDocument { path: PathBuf, reason: String },
    /// A ledger field or document name normalized to the empty key.
    EmptyNormalizedKey { origin: String },
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingRequiredColumn { ledger, column } => {
                write!(f, "ledger '{ledger}': missing required column '{column}'")
            }
            Self::UnreadableDocument { path, reason } => {
                write!(f, "unreadable document {}: {reason}", path.display())
            }
            Self::EmptyNormalizedKey { origin } => {
                write!(f, "'{origin}' normalizes to an empty counterparty key")
            }
        }
    }
}

impl std::error::Error for ReconError {}
