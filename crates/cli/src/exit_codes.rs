//! CLI Exit Code Registry
//!
//! Single source of truth for `fleetpay` exit codes. Scripts that drive the
//! weekly run branch on these, so a code never changes meaning once shipped.
//!
//! | Code | Meaning                                                     |
//! |------|-------------------------------------------------------------|
//! | 0    | Success                                                     |
//! | 1    | General error (unspecified)                                 |
//! | 2    | Usage error (bad arguments, no export supplied, bad week)   |
//! | 3    | Schema error: an export or summary lacks required columns   |
//! | 4    | Computation error: unparseable amount, row without a driver |
//! | 5    | Not found: week, driver report or archive absent            |
//! | 6    | Recon config invalid or unreadable                          |
//! | 7    | I/O error reading exports or writing the history store      |
//!
//! # Adding New Exit Codes
//!
//! 1. Add the constant
//! 2. Update the table above
//! 3. Map the error onto it in `main.rs`

/// Success - command completed without errors.
pub const EXIT_SUCCESS: u8 = 0;

/// General error - unspecified failure.
/// Avoid using this; prefer a specific error code.
pub const EXIT_ERROR: u8 = 1;

/// Usage error - bad arguments, missing required options.
pub const EXIT_USAGE: u8 = 2;

/// An uploaded export (or a stored summary) is missing required headers.
/// Nothing was written.
pub const EXIT_SCHEMA: u8 = 3;

/// A row could not be aggregated: non-numeric amount, or amounts without a
/// driver name.
pub const EXIT_COMPUTATION: u8 = 4;

/// The requested week or artifact is not in the history store.
pub const EXIT_NOT_FOUND: u8 = 5;

/// Recon config TOML failed to parse or validate.
pub const EXIT_CONFIG: u8 = 6;

pub const EXIT_IO: u8 = 7;
