use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ReconError;
use crate::leftover::ListingWords;

const MAX_MAGIC_LEN: usize = 16;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Everything a run can be told. Every field has a default, so an empty
/// file (or no file) is a valid config.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    pub documents: DocumentsConfig,
    pub ledger: LedgerConfig,
    pub output: OutputConfig,
    pub run: RunSection,
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct DocumentsConfig {
    /// Directory tree scanned for documents.
    pub root: PathBuf,
    /// Extension (case-insensitive, no dot) that marks a candidate.
    pub extension: String,
    /// Leading bytes that mark a candidate regardless of extension.
    pub magic: String,
    /// File-name prefix of editor lock files, which are skipped.
    pub lock_prefix: String,
}

impl Default for DocumentsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            extension: "pdf".to_string(),
            magic: "%PDF-".to_string(),
            lock_prefix: "~$".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// Directory holding ledger files. Defaults to the document root.
    pub dir: Option<PathBuf>,
    /// Header of the counterparty column.
    pub subject_column: String,
    /// Worksheet name; the first sheet when unset.
    pub sheet: Option<String>,
    /// 1-based sheet row holding the headers.
    pub header_row: usize,
    pub extensions: Vec<String>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            dir: None,
            subject_column: "科目名称".to_string(),
            sheet: None,
            header_row: 1,
            extensions: ["xlsx", "xlsm", "xls", "ods", "csv"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Where outputs are written. Defaults to the document root.
    pub dir: Option<PathBuf>,
    pub bundle_suffix: String,
    pub annotated_suffix: String,
    pub listing_suffix: String,
    pub leftover_bundle: String,
    /// RGB hex, no `#`.
    pub highlight_color: String,
    pub report_json: Option<PathBuf>,
    pub listing: ListingWords,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: None,
            bundle_suffix: "-排序后合并PDF文件.pdf".to_string(),
            annotated_suffix: "-标记处理后Excel文件.xlsx".to_string(),
            listing_suffix: "-未匹配PDF清单.txt".to_string(),
            leftover_bundle: "未使用到的PDF合并后文件.pdf".to_string(),
            highlight_color: "FF0000".to_string(),
            report_json: None,
            listing: ListingWords::default(),
        }
    }
}

impl OutputConfig {
    /// Every file name this tool can write for a ledger with `prefix`.
    pub fn outputs_for(&self, prefix: &str) -> [String; 3] {
        [
            format!("{prefix}{}", self.bundle_suffix),
            format!("{prefix}{}", self.annotated_suffix),
            format!("{prefix}{}", self.listing_suffix),
        ]
    }

    /// True when `name` looks like something this tool wrote, so scans can
    /// leave it alone.
    pub fn is_own_output(&self, name: &str) -> bool {
        name == self.leftover_bundle
            || [&self.bundle_suffix, &self.annotated_suffix, &self.listing_suffix]
                .iter()
                .any(|suffix| name.ends_with(suffix.as_str()))
    }

    /// Highlight colour as `0xRRGGBB`.
    pub fn highlight_rgb(&self) -> Result<u32, ReconError> {
        parse_rgb(&self.highlight_color)
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSection {
    /// Rows or documents between progress log lines.
    pub progress_every: usize,
}

impl Default for RunSection {
    fn default() -> Self {
        Self { progress_every: 500 }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl RunConfig {
    pub fn from_toml(input: &str) -> Result<Self, ReconError> {
        let config: RunConfig =
            toml::from_str(input).map_err(|e| ReconError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ReconError> {
        if self.ledger.subject_column.trim().is_empty() {
            return Err(ReconError::ConfigValidation(
                "ledger.subject_column must not be empty".into(),
            ));
        }

        let magic = self.documents.magic.len();
        if magic == 0 || magic > MAX_MAGIC_LEN {
            return Err(ReconError::ConfigValidation(format!(
                "documents.magic must be 1..={MAX_MAGIC_LEN} bytes, got {magic}"
            )));
        }

        if self.documents.extension.trim_start_matches('.').is_empty() {
            return Err(ReconError::ConfigValidation(
                "documents.extension must not be empty".into(),
            ));
        }

        if self.ledger.header_row == 0 {
            return Err(ReconError::ConfigValidation(
                "ledger.header_row is 1-based, got 0".into(),
            ));
        }

        if self.ledger.extensions.is_empty() {
            return Err(ReconError::ConfigValidation(
                "ledger.extensions must list at least one extension".into(),
            ));
        }

        for (field, value) in [
            ("output.bundle_suffix", &self.output.bundle_suffix),
            ("output.annotated_suffix", &self.output.annotated_suffix),
            ("output.listing_suffix", &self.output.listing_suffix),
            ("output.leftover_bundle", &self.output.leftover_bundle),
        ] {
            if value.is_empty() {
                return Err(ReconError::ConfigValidation(format!("{field} must not be empty")));
            }
        }

        self.output.highlight_rgb()?;

        if self.run.progress_every == 0 {
            return Err(ReconError::ConfigValidation(
                "run.progress_every must be at least 1".into(),
            ));
        }

        Ok(())
    }

    /// Ledger directory, falling back to the document root.
    pub fn ledger_dir(&self) -> PathBuf {
        self.ledger.dir.clone().unwrap_or_else(|| self.documents.root.clone())
    }

    /// Output directory, falling back to the document root.
    pub fn output_dir(&self) -> PathBuf {
        self.output.dir.clone().unwrap_or_else(|| self.documents.root.clone())
    }
}

fn parse_rgb(hex: &str) -> Result<u32, ReconError> {
    let digits = hex.trim_start_matches('#');
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(ReconError::ConfigValidation(format!(
            "output.highlight_color must be 6 hex digits, got '{hex}'"
        )));
    }
    u32::from_str_radix(digits, 16)
        .map_err(|e| ReconError::ConfigValidation(format!("output.highlight_color: {e}")))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
