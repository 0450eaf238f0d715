//! Error types produced by the ingest crate.
//!
//! Only file-level problems surface as errors. Row-level problems (a row with
//! neither name nor phone, an enum value nobody recognises) are not errors at
//! all: they come back as [`InvalidRow`](crate::InvalidRow) values so the
//! batch can keep going and report them.
//!
//! | Error | Fatal for | Description |
//! |-------|-----------|-------------|
//! | [`MalformedFile`](IngestError::MalformedFile) | whole batch | header row plus at least one data row required |
//! | [`Parse`](IngestError::Parse) | whole batch | the delimited text could not be tokenized |
//!
//! ```rust
//! use ingest::{parse_table, IngestError};
//!
//! match parse_table("Name,Phone\n") {
//!     Err(IngestError::MalformedFile { non_empty_lines }) => assert_eq!(non_empty_lines, 1),
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```
use thiserror::Error;

/// Errors that abort parsing of an uploaded lead file.
///
/// The enum is marked `#[non_exhaustive]`; match with a catch-all arm.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum IngestError {
    /// The file does not contain a header row followed by at least one data row.
    ///
    /// Blank and whitespace-only lines do not count.
    #[error("malformed file: expected a header row and at least one data row, found {non_empty_lines} non-empty line(s)")]
    MalformedFile { non_empty_lines: usize },

    /// The delimited text could not be tokenized.
    ///
    /// `line` is 1-based over the non-empty lines of the file.
    #[error("failed to parse line {line}: {message}")]
    Parse { line: usize, message: String },
}
