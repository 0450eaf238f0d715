//! Batch import orchestration.
//!
//! Parse, normalize, resolve projects, dedupe, submit, report. Everything up
//! to submission is synchronous and in-memory; the only suspension points are
//! the awaited store calls.
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use ingest::{CanonicalLead, IngestError, NormalizerConfig, RawRow, normalize_rows, parse_table};
use matcher::{ProjectMatcher, ProjectRegistryEntry};
use serde::{Deserialize, Serialize};
use tracing::{Instrument, debug, info, info_span, warn};

use crate::ImportError;
use crate::dedup::{DedupOptions, dedupe};
use crate::metrics::MetricsSpan;
use crate::report::{ImportReport, ReconciliationReporter, RowFailure};
use crate::store::{LeadStore, PersistedDuplicate, ProjectRegistry, StoreErrorKind};

/// How accepted leads are handed to the store.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum SubmissionMode {
    /// One `create_bulk` call; the store reports its own duplicates.
    #[default]
    Bulk,
    /// One `create_lead` call per lead, each awaited before the next.
    Sequential,
}

impl SubmissionMode {
    pub fn as_str(self) -> &'static str {
        match self {
            SubmissionMode::Bulk => "bulk",
            SubmissionMode::Sequential => "sequential",
        }
    }
}

impl fmt::Display for SubmissionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bulk" => Ok(SubmissionMode::Bulk),
            "sequential" => Ok(SubmissionMode::Sequential),
            other => Err(format!("unknown submission mode \"{other}\"")),
        }
    }
}

/// Everything that shapes one import.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportConfig {
    pub normalizer: NormalizerConfig,
    pub dedupe: DedupOptions,
    pub mode: SubmissionMode,
}

impl ImportConfig {
    pub fn with_mode(mut self, mode: SubmissionMode) -> Self {
        self.mode = mode;
        self
    }
}

/// Leads ready for submission plus the report built so far.
#[derive(Debug)]
pub struct PreparedBatch {
    pub leads: Vec<CanonicalLead>,
    pub reporter: ReconciliationReporter,
}

/// Runs one import end to end.
#[derive(Debug, Clone, Default)]
pub struct BatchImporter {
    config: ImportConfig,
}

impl BatchImporter {
    pub fn new(config: ImportConfig) -> Result<Self, ImportError> {
        config.normalizer.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ImportConfig {
        &self.config
    }

    /// Import an uploaded file, loading the project registry first.
    ///
    /// A registry failure aborts before anything is submitted.
    pub async fn import_batch(
        &self,
        text: &str,
        registry: &dyn ProjectRegistry,
        store: &dyn LeadStore,
    ) -> Result<ImportReport, ImportError> {
        let projects = registry
            .list_projects()
            .await
            .map_err(ImportError::Registry)?;
        self.import_text(text, &projects, store).await
    }

    /// Import an uploaded file against an already loaded registry.
    pub async fn import_text(
        &self,
        text: &str,
        registry: &[ProjectRegistryEntry],
        store: &dyn LeadStore,
    ) -> Result<ImportReport, ImportError> {
        let metrics = MetricsSpan::start();
        let rows = match parse_table(text) {
            Ok(rows) => {
                if let Some(span) = metrics {
                    span.record_parse(Ok(()));
                }
                rows
            }
            Err(err) => {
                warn!(error = %err, "import_malformed_file");
                if let Some(span) = metrics {
                    span.record_parse(Err(err.clone()));
                }
                return Err(err.into());
            }
        };
        self.import_rows(&rows, registry, store).await
    }

    /// Import already parsed rows.
    pub async fn import_rows(
        &self,
        rows: &[RawRow],
        registry: &[ProjectRegistryEntry],
        store: &dyn LeadStore,
    ) -> Result<ImportReport, ImportError> {
        if rows.is_empty() {
            return Err(IngestError::MalformedFile { non_empty_lines: 1 }.into());
        }

        let span = info_span!(
            "leadflow.import",
            rows = rows.len(),
            projects = registry.len(),
            mode = %self.config.mode
        );
        async move {
            let started = Instant::now();
            let metrics = MetricsSpan::start();

            let PreparedBatch { leads, mut reporter } = self.prepare(rows, registry);
            match self.config.mode {
                SubmissionMode::Bulk => submit_bulk(&leads, store, &mut reporter).await,
                SubmissionMode::Sequential => {
                    submit_sequential(&leads, store, &mut reporter).await
                }
            }

            let report = reporter.finish();
            info!(
                total = report.total_uploaded,
                accepted = report.accepted.len(),
                saved = report.successfully_saved,
                csv_duplicates = report.csv_duplicates_removed.len(),
                database_duplicates = report.database_duplicates_skipped,
                invalid = report.invalid_rows.len(),
                failed = report.other_failures,
                outcome = %report.outcome(),
                elapsed_micros = started.elapsed().as_micros() as u64,
                "import_complete"
            );
            if let Some(span) = metrics {
                span.record_import(report.outcome());
            }
            Ok(report)
        }
        .instrument(span)
        .await
    }

    /// Normalize, resolve and dedupe, without touching the store.
    ///
    /// After this step `total_uploaded == accepted + duplicates + invalid`.
    pub fn prepare(&self, rows: &[RawRow], registry: &[ProjectRegistryEntry]) -> PreparedBatch {
        let mut reporter = ReconciliationReporter::new();
        reporter.uploaded(rows.len());

        let batch = normalize_rows(rows, &self.config.normalizer);
        for invalid in &batch.invalid {
            debug!(line = invalid.row.line, reason = %invalid.reason, "import_row_invalid");
        }
        reporter.invalid(batch.invalid);

        let matcher = ProjectMatcher::new(registry.iter().cloned());
        let mut leads = batch.leads;
        for lead in &mut leads {
            matcher.apply(lead);
        }

        let deduped = dedupe(leads, self.config.dedupe);
        for dup in &deduped.duplicates {
            debug!(phone = %dup.phone, project = %dup.project, "import_duplicate_intra_batch");
        }
        reporter
            .intra_batch_duplicates(deduped.duplicates)
            .accepted(&deduped.unique);

        PreparedBatch {
            leads: deduped.unique,
            reporter,
        }
    }
}

async fn submit_bulk(
    leads: &[CanonicalLead],
    store: &dyn LeadStore,
    reporter: &mut ReconciliationReporter,
) {
    if leads.is_empty() {
        return;
    }

    let metrics = MetricsSpan::start();
    let failure_reason = match store.create_bulk(leads).await {
        Ok(response) if response.success => {
            if let Some(span) = metrics {
                span.record_submission(Ok(()));
            }
            if let Some(validation) = &response.validation {
                for dup in &validation.database_duplicate_details {
                    debug!(
                        name = %dup.name,
                        phone = %dup.phone,
                        project = %dup.project,
                        "import_duplicate_persisted"
                    );
                }
            }
            reporter.bulk_response(response);
            return;
        }
        Ok(response) => {
            if let Some(span) = metrics {
                span.record_submission(Err(StoreErrorKind::Rejected));
            }
            response
                .error
                .unwrap_or_else(|| "bulk create rejected by store".to_string())
        }
        Err(err) => {
            if let Some(span) = metrics {
                span.record_submission(Err(err.kind));
            }
            err.to_string()
        }
    };

    warn!(rows = leads.len(), reason = %failure_reason, "import_bulk_failed");
    for lead in leads {
        reporter.failed(RowFailure::for_lead(lead, failure_reason.clone()));
    }
}

async fn submit_sequential(
    leads: &[CanonicalLead],
    store: &dyn LeadStore,
    reporter: &mut ReconciliationReporter,
) {
    for lead in leads {
        let metrics = MetricsSpan::start();
        let result = store.create_lead(lead).await;
        if let Some(span) = metrics {
            span.record_submission(result.as_ref().map(|_| ()).map_err(|err| err.kind));
        }

        match result {
            Ok(_) => {
                reporter.saved(1);
            }
            Err(err) if err.is_already_exists() => {
                debug!(
                    name = %lead.full_name,
                    phone = %lead.contact_number,
                    "import_duplicate_persisted"
                );
                reporter.persisted_duplicate(PersistedDuplicate::for_lead(lead, err.message));
            }
            Err(err) => {
                warn!(
                    name = %lead.full_name,
                    phone = %lead.contact_number,
                    error = %err,
                    "import_row_failed"
                );
                reporter.failed(RowFailure::for_lead(lead, err.to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ImportOutcome;
    use crate::store::{InMemoryLeadStore, StaticProjectRegistry, StoreError};
    use async_trait::async_trait;
    use ingest::{LeadType, ProjectId};

    fn registry() -> Vec<ProjectRegistryEntry> {
        vec![
            ProjectRegistryEntry::new("p-sky", "Skyline Towers")
                .with_keywords(["skyline", "tower"]),
            ProjectRegistryEntry::new("p-ocean", "Oceanview"),
        ]
    }

    struct DownStore;

    #[async_trait]
    impl LeadStore for DownStore {
        async fn create_lead(
            &self,
            _lead: &CanonicalLead,
        ) -> Result<crate::store::StoredLead, StoreError> {
            Err(StoreError::transport("connection refused"))
        }

        async fn create_bulk(
            &self,
            _leads: &[CanonicalLead],
        ) -> Result<crate::store::BulkCreateResponse, StoreError> {
            Err(StoreError::transport("connection refused"))
        }
    }

    struct DownRegistry;

    #[async_trait]
    impl ProjectRegistry for DownRegistry {
        async fn list_projects(&self) -> Result<Vec<ProjectRegistryEntry>, StoreError> {
            Err(StoreError::transport("registry unavailable"))
        }
    }

    #[test]
    fn submission_mode_parses() {
        assert_eq!("Bulk".parse::<SubmissionMode>(), Ok(SubmissionMode::Bulk));
        assert_eq!(
            " sequential ".parse::<SubmissionMode>(),
            Ok(SubmissionMode::Sequential)
        );
        assert!("parallel".parse::<SubmissionMode>().is_err());
    }

    #[test]
    fn prepare_balances_before_submission() {
        let importer = BatchImporter::default();
        let rows = parse_table(
            "Name,Phone,Priority,project_name\n\
             Asha,9999999999,high,Skyline\n\
             Asha Dup,9999999999,low,Skyline\n\
             ,,high,Skyline\n\
             Ravi,9999999999,low,Oceanview\n",
        )
        .unwrap();

        let prepared = importer.prepare(&rows, &registry());
        assert_eq!(prepared.leads.len(), 2);
        assert_eq!(prepared.leads[0].lead_type, LeadType::Hot);
        assert_eq!(prepared.leads[0].project_id, Some(ProjectId::new("p-sky")));
        assert_eq!(prepared.leads[1].project_id, Some(ProjectId::new("p-ocean")));
        assert_eq!(prepared.reporter.accepted_count(), 2);

        let report = prepared.reporter.finish();
        assert_eq!(report.total_uploaded, 4);
        assert_eq!(report.csv_duplicates_removed.len(), 1);
        assert_eq!(report.invalid_rows.len(), 1);
    }

    #[tokio::test]
    async fn bulk_import_saves_survivors() {
        let importer = BatchImporter::default();
        let store = InMemoryLeadStore::new();
        let report = importer
            .import_text("Name,Phone\nAsha,1\nRavi,2\n", &registry(), &store)
            .await
            .unwrap();
        assert_eq!(report.successfully_saved, 2);
        assert_eq!(report.outcome(), ImportOutcome::Complete);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn malformed_file_submits_nothing() {
        let importer = BatchImporter::default();
        let store = InMemoryLeadStore::new();
        let err = importer
            .import_text("Name,Phone\n\n", &registry(), &store)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ImportError::Ingest(IngestError::MalformedFile { .. })
        ));
        assert!(store.is_empty());

        let err = importer.import_rows(&[], &registry(), &store).await.unwrap_err();
        assert!(matches!(
            err,
            ImportError::Ingest(IngestError::MalformedFile { .. })
        ));
    }

    #[tokio::test]
    async fn whole_bulk_failure_fails_every_row() {
        let importer = BatchImporter::default();
        let report = importer
            .import_text("Name,Phone\nAsha,1\nRavi,2\n", &registry(), &DownStore)
            .await
            .unwrap();
        assert_eq!(report.other_failures, 2);
        assert_eq!(report.failed_rows.len(), 2);
        assert_eq!(report.outcome(), ImportOutcome::Failed);
        assert!(report.final_message.contains("Asha (1), Ravi (2)"));
        assert!(report.is_balanced());
    }

    #[tokio::test]
    async fn sequential_failures_do_not_abort() {
        let config = ImportConfig::default().with_mode(SubmissionMode::Sequential);
        let importer = BatchImporter::new(config).unwrap();
        let store = InMemoryLeadStore::new().with_failing_phone("1");
        let report = importer
            .import_text("Name,Phone\nAsha,1\nRavi,2\n", &registry(), &store)
            .await
            .unwrap();
        assert_eq!(report.successfully_saved, 1);
        assert_eq!(report.other_failures, 1);
        assert_eq!(report.failed_rows[0].name, "Asha");
        assert_eq!(report.outcome(), ImportOutcome::Partial);
    }

    #[tokio::test]
    async fn bulk_row_failure_is_named() {
        let importer = BatchImporter::default();
        let store = InMemoryLeadStore::new().with_failing_phone("2");
        let report = importer
            .import_text("Name,Phone\nAsha,1\nRavi,2\n", &registry(), &store)
            .await
            .unwrap();
        assert_eq!(report.successfully_saved, 1);
        assert_eq!(report.other_failures, 1);
        assert_eq!(report.failed_rows[0].name, "Ravi");
        assert_eq!(
            report.final_message,
            "Import partially complete: 1 of 2 lead(s) saved, 1 failed. Failed: Ravi (2)."
        );
        assert!(report.is_balanced());
    }

    #[tokio::test]
    async fn registry_failure_aborts_before_submission() {
        let importer = BatchImporter::default();
        let store = InMemoryLeadStore::new();
        let err = importer
            .import_batch("Name,Phone\nAsha,1\n", &DownRegistry, &store)
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::Registry(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn import_batch_uses_registry_collaborator() {
        let importer = BatchImporter::default();
        let store = InMemoryLeadStore::new();
        let registry = StaticProjectRegistry::new(registry());
        let report = importer
            .import_batch("Name,Phone,Project\nAsha,1,skyl\n", &registry, &store)
            .await
            .unwrap();
        assert_eq!(report.accepted[0].project_name, "Skyline Towers");
    }
}
