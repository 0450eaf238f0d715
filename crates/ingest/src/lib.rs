//! Lead Ingest Layer
//!
//! This is where an uploaded lead sheet enters the import pipeline. We take a
//! schema-free, header-row text file, split it into rows, and map every row
//! onto the fixed canonical lead schema.
//!
//! ## What we do here
//!
//! - **Parse the file** - header row + data rows, blank lines ignored, quotes
//!   and padding stripped. A file with no data rows is rejected outright.
//! - **Resolve headers** - `Name`, `fullname`, `Phone`, `Priority`... all land
//!   on one of five canonical columns. Unknown columns are dropped.
//! - **Resolve enum values** - legacy spellings (`high`, `new`, ...) go
//!   through per-field synonym tables. Values nobody recognises are kept,
//!   lower-cased, rather than guessed at.
//! - **Reject empty rows** - no name and no phone means no lead. This is the
//!   only thing that produces an [`InvalidRow`].
//!
//! ## Main entry points
//!
//! [`parse_table`] turns text into [`RawRow`]s, [`normalize_row`] turns one
//! row into a [`CanonicalLead`], and [`normalize_rows`] does the whole batch,
//! partitioning leads from invalid rows.
//!
//! ## Example
//!
//! ```
//! use ingest::{normalize_rows, parse_table, LeadType, NormalizerConfig};
//!
//! let rows = parse_table("Name,Phone,Priority\nAsha,9999999999,high\n,,low\n").unwrap();
//! let batch = normalize_rows(&rows, &NormalizerConfig::default());
//!
//! assert_eq!(batch.leads.len(), 1);
//! assert_eq!(batch.leads[0].lead_type, LeadType::Hot);
//! assert_eq!(batch.invalid[0].reason, "missing name and phone");
//! ```
use std::time::Instant;

use tracing::{debug, info, Level};

mod config;
mod error;
mod fields;
mod table;
mod types;

pub use crate::config::{ConfigError, NormalizerConfig};
pub use crate::error::IngestError;
pub use crate::fields::{
    normalize_row, resolve_call_status, resolve_header, resolve_lead_type, MISSING_NAME_AND_PHONE,
};
pub use crate::table::{lead_template_csv, parse_table, TEMPLATE_HEADERS};
pub use crate::types::{
    normalize_phone, CallStatus, CanonicalLead, InvalidRow, LeadField, LeadType, ProjectId,
    RawCell, RawRow, UnknownVariant,
};

/// Result of normalizing a whole batch: leads and rejects, each in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedBatch {
    pub leads: Vec<CanonicalLead>,
    pub invalid: Vec<InvalidRow>,
}

impl NormalizedBatch {
    pub fn total(&self) -> usize {
        self.leads.len() + self.invalid.len()
    }
}

/// Normalize every row, partitioning canonical leads from invalid rows.
pub fn normalize_rows(rows: &[RawRow], cfg: &NormalizerConfig) -> NormalizedBatch {
    let start = Instant::now();
    let span = tracing::span!(Level::DEBUG, "ingest.normalize", rows = rows.len());
    let _guard = span.enter();

    let mut batch = NormalizedBatch::default();
    for row in rows {
        match normalize_row(row, cfg) {
            Ok(lead) => batch.leads.push(lead),
            Err(invalid) => {
                debug!(line = invalid.row.line, reason = %invalid.reason, "row_invalid");
                batch.invalid.push(invalid);
            }
        }
    }

    info!(
        leads = batch.leads.len(),
        invalid = batch.invalid.len(),
        elapsed_micros = start.elapsed().as_micros() as u64,
        "normalize_complete"
    );
    batch
}

/// Parse and normalize an uploaded file in one go.
pub fn ingest_text(text: &str, cfg: &NormalizerConfig) -> Result<NormalizedBatch, IngestError> {
    let rows = parse_table(text)?;
    Ok(normalize_rows(&rows, cfg))
}
