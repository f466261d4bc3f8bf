//! CLI Exit Code Registry
//!
//! This is the single source of truth for all CLI exit codes.
//! Exit codes are part of the shell contract: scripts rely on them.
//!
//! | Code | Meaning                                               |
//! |------|-------------------------------------------------------|
//! | 0    | Success                                               |
//! | 1    | General error (unspecified)                           |
//! | 2    | CLI usage error (bad args)                            |
//! | 3    | Config file invalid                                   |
//! | 4    | I/O failure (document root, output directory, report) |
//! | 5    | No ledgers found                                      |
//! | 6    | Run completed, but at least one ledger failed         |
//! | 7    | `--strict` and some ledger rows have no documents     |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Document what triggers it
//! 3. Update the table above

// =============================================================================
// Universal (0-2)
// =============================================================================

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

// =============================================================================
// Run (3-9)
// =============================================================================

/// Config file could not be parsed or failed validation.
pub const EXIT_CONFIG: u8 = 3;

/// Document root unreadable, output directory or report not writable.
pub const EXIT_IO: u8 = 4;

/// The ledger directory holds no ledger files.
pub const EXIT_NO_LEDGERS: u8 = 5;

/// At least one ledger was skipped (unreadable, missing subject column,
/// outputs not written). The other ledgers and the leftover bundle were
/// still produced.
pub const EXIT_LEDGER_FAILED: u8 = 6;

/// `--strict` was given and at least one row has no supporting document.
pub const EXIT_STRICT_UNMATCHED: u8 = 7;

/// Human-readable name for an exit code, for `--help` and error output.
pub fn describe(code: u8) -> &'static str {
    match code {
        EXIT_SUCCESS => "success",
        EXIT_ERROR => "error",
        EXIT_USAGE => "usage error",
        EXIT_CONFIG => "invalid config",
        EXIT_IO => "i/o error",
        EXIT_NO_LEDGERS => "no ledgers",
        EXIT_LEDGER_FAILED => "ledger failed",
        EXIT_STRICT_UNMATCHED => "unmatched rows",
        _ => "unknown",
    }
}
