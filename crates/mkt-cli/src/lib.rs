//! # mkt-cli: Command-Line Interface for the Marketplace Tree Schemas
//!
//! Provides the `mkt` binary:
//!
//! ```bash
//! mkt validate menus/main.yaml --schema navigation
//! mkt validate pages/home.json --schema component --format json --strip-unknown
//! mkt schemas
//! mkt -vv --log-format json validate menus/main.yaml --schema navigation
//! ```
//!
//! ## Exit Codes
//!
//! - `0`: the document is valid.
//! - `1`: the document failed validation.
//! - `2`: operational error (unreadable file, bad config, unparsable input).
//!
//! ## Crate Policy
//!
//! - Argument parsing lives in the subcommand modules; validation logic
//!   lives in `mkt-schema`.
//! - Handlers return their output as text so it can be asserted on in tests.

pub mod config;
pub mod logging;
pub mod schemas;
pub mod validate;

/// The document is valid.
pub const EXIT_OK: u8 = 0;

/// The document failed validation.
pub const EXIT_INVALID: u8 = 1;

/// The document could not be checked at all.
pub const EXIT_OPERATIONAL_ERROR: u8 = 2;
