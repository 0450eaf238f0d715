//! Workspace umbrella crate for the leadflow lead import pipeline.
//!
//! This crate stitches together sheet ingestion, project matching,
//! deduplication and store submission so callers can turn an uploaded lead
//! sheet into an [`ImportReport`] with a single [`BatchImporter`] call.

pub use ingest::{
    CallStatus, CanonicalLead, ConfigError, IngestError, InvalidRow, LeadField, LeadType,
    NormalizedBatch, NormalizerConfig, ProjectId, RawRow, lead_template_csv, normalize_phone,
    normalize_row, normalize_rows, parse_table,
};
pub use matcher::{
    MatchError, MatchTier, ProjectMatch, ProjectMatcher, ProjectRegistryEntry, ProjectResolution,
    resolve_project,
};

pub mod config;
pub mod dedup;
pub mod importer;
pub mod metrics;
pub mod report;
pub mod store;

pub use crate::config::{ConfigLoadError, LeadflowConfig};
pub use crate::dedup::{
    DedupKey, DedupOptions, DedupOutcome, DuplicateRecord, DuplicateStage, NO_PROJECT, dedupe,
};
pub use crate::importer::{BatchImporter, ImportConfig, PreparedBatch, SubmissionMode};
pub use crate::metrics::{ImportMetrics, set_import_metrics};
pub use crate::report::{
    ImportOutcome, ImportReport, NOT_CREATED_BY_STORE, ReconciliationReporter, RowFailure,
};
pub use crate::store::{
    BulkCreateResponse, InMemoryLeadStore, LeadStore, PersistedDuplicate, ProjectRegistry,
    StaticProjectRegistry, StoreError, StoreErrorKind, StoredLead,
};

use std::error::Error;
use std::fmt;

/// Errors that abort an import before anything is submitted.
///
/// Everything that goes wrong for a single row is recorded in the
/// [`ImportReport`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    Ingest(IngestError),
    Config(ConfigError),
    Registry(StoreError),
}

impl fmt::Display for ImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportError::Ingest(err) => write!(f, "ingest failure: {err}"),
            ImportError::Config(err) => write!(f, "invalid import configuration: {err}"),
            ImportError::Registry(err) => write!(f, "project registry unavailable: {err}"),
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ImportError::Ingest(err) => Some(err),
            ImportError::Config(err) => Some(err),
            ImportError::Registry(err) => Some(err),
        }
    }
}

impl From<IngestError> for ImportError {
    fn from(value: IngestError) -> Self {
        ImportError::Ingest(value)
    }
}

impl From<ConfigError> for ImportError {
    fn from(value: ConfigError) -> Self {
        ImportError::Config(value)
    }
}
