//! The crate's single error type.
//!
//! Internally almost everything is `Option`-based (see `parser.rs`): a
//! missing byte, an unknown subformat and a dangling offset are all "this
//! read failed," and the difference rarely matters to whoever is walking
//! the table. `Error` only exists at the handful of boundaries (`parse_gpos`,
//! `parse_gsub`, `parse_gdef`) that must report a hard failure rather than
//! quietly treating it as "nothing here."

use core::fmt;

/// A fatal error encountered while parsing a top-level table.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[allow(missing_docs)]
pub enum Error {
    /// The table's version field was not one this crate understands.
    UnsupportedVersion,
    /// An offset or length read past the end of the table, or the table
    /// was too short to contain its own header.
    Malformed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::UnsupportedVersion => write!(f, "unsupported table version"),
            Error::Malformed => write!(f, "table data is truncated or internally inconsistent"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Shorthand for `Result<T, Error>`.
pub type Result<T> = core::result::Result<T, Error>;
