use std::io::Write;

use async_trait::async_trait;
use leadflow::{
    BatchImporter, BulkCreateResponse, CallStatus, CanonicalLead, ConfigLoadError, ImportError,
    ImportOutcome, InMemoryLeadStore, IngestError, LeadStore, LeadType, LeadflowConfig,
    ProjectRegistry, ProjectRegistryEntry, StoreError, StoreErrorKind, StoredLead,
    SubmissionMode,
};
use tempfile::NamedTempFile;

/// Store adapter over a collaborator that only reports bare error strings.
struct LegacyMessageStore {
    existing_phone: &'static str,
}

#[async_trait]
impl LeadStore for LegacyMessageStore {
    async fn create_lead(&self, lead: &CanonicalLead) -> Result<StoredLead, StoreError> {
        if lead.normalized_phone() == self.existing_phone {
            Err(StoreError::from_message("Lead with this phone already exists"))
        } else {
            Err(StoreError::from_message("Internal server error"))
        }
    }

    async fn create_bulk(
        &self,
        _leads: &[CanonicalLead],
    ) -> Result<BulkCreateResponse, StoreError> {
        Ok(BulkCreateResponse {
            success: false,
            data: Default::default(),
            validation: None,
            error: Some("bulk endpoint disabled".into()),
        })
    }
}

struct UnavailableRegistry;

#[async_trait]
impl ProjectRegistry for UnavailableRegistry {
    async fn list_projects(&self) -> Result<Vec<ProjectRegistryEntry>, StoreError> {
        Err(StoreError::transport("registry timed out"))
    }
}

#[tokio::test]
async fn header_only_file_is_malformed() {
    let store = InMemoryLeadStore::new();
    let result = BatchImporter::default()
        .import_text("Name,Phone,Priority\n\n   \n", &[], &store)
        .await;

    match result {
        Err(ImportError::Ingest(IngestError::MalformedFile { non_empty_lines })) => {
            assert_eq!(non_empty_lines, 1)
        }
        other => panic!("expected MalformedFile, got {other:?}"),
    }
    assert!(store.is_empty());
}

#[tokio::test]
async fn empty_file_is_malformed() {
    let store = InMemoryLeadStore::new();
    let result = BatchImporter::default().import_text("", &[], &store).await;
    assert!(matches!(
        result,
        Err(ImportError::Ingest(IngestError::MalformedFile { non_empty_lines: 0 }))
    ));
}

#[tokio::test]
async fn unknown_enum_value_is_kept_lowercased() {
    let store = InMemoryLeadStore::new();
    let report = BatchImporter::default()
        .import_text(
            "Name,Phone,Priority,Status\nAsha,9999999999,Warm,Voicemail\nRavi,2,HIGH,\n",
            &[],
            &store,
        )
        .await
        .expect("import runs");

    assert!(report.invalid_rows.is_empty());
    assert_eq!(report.accepted.len(), 2);
    assert_eq!(report.accepted[0].lead_type, LeadType::Other("warm".into()));
    assert_eq!(report.accepted[0].call_status, CallStatus::Other("voicemail".into()));
    assert_eq!(report.accepted[1].lead_type, LeadType::Hot);
    assert_eq!(report.successfully_saved, 2);
    assert_eq!(store.leads()[0].lead.lead_type.as_str(), "warm");
}

#[tokio::test]
async fn bulk_transport_failure_names_the_row() {
    let store = InMemoryLeadStore::new().with_failing_phone("88888 88888");
    let report = BatchImporter::default()
        .import_text("Name,Phone\nAsha,9999999999\nRavi,8888888888\n", &[], &store)
        .await
        .expect("row failures never abort the batch");

    assert_eq!(report.successfully_saved, 1);
    assert_eq!(report.other_failures, 1);
    assert_eq!(report.failed_rows.len(), 1);
    assert!(report.final_message.contains("Ravi (8888888888)"));
    assert_eq!(report.outcome(), ImportOutcome::Partial);
    assert!(report.is_balanced());
}

#[tokio::test]
async fn legacy_messages_are_classified_in_sequential_mode() {
    let importer = BatchImporter::new(
        leadflow::ImportConfig::default().with_mode(SubmissionMode::Sequential),
    )
    .expect("valid config");
    let store = LegacyMessageStore {
        existing_phone: "111",
    };
    let report = importer
        .import_text("Name,Phone\nAsha,111\nRavi,222\n", &[], &store)
        .await
        .expect("row errors never abort the batch");

    assert_eq!(report.database_duplicates_skipped, 1);
    assert_eq!(report.other_failures, 1);
    assert_eq!(report.failed_rows[0].name, "Ravi");
    assert_eq!(report.failed_rows[0].reason, "rejected: Internal server error");
    assert_eq!(report.outcome(), ImportOutcome::Failed);
    assert!(report.is_balanced());
}

#[tokio::test]
async fn rejected_bulk_call_fails_each_row() {
    let store = LegacyMessageStore {
        existing_phone: "",
    };
    let report = BatchImporter::default()
        .import_text("Name,Phone\nAsha,111\nRavi,222\n", &[], &store)
        .await
        .expect("bulk rejection is reported, not thrown");

    assert_eq!(report.other_failures, 2);
    assert!(report
        .failed_rows
        .iter()
        .all(|f| f.reason == "bulk endpoint disabled"));
    assert_eq!(report.outcome(), ImportOutcome::Failed);
}

#[tokio::test]
async fn registry_outage_aborts_import() {
    let store = InMemoryLeadStore::new();
    let result = BatchImporter::default()
        .import_batch("Name,Phone\nAsha,1\n", &UnavailableRegistry, &store)
        .await;

    match result {
        Err(ImportError::Registry(err)) => assert_eq!(err.kind, StoreErrorKind::Transport),
        other => panic!("expected registry error, got {other:?}"),
    }
    assert!(store.is_empty());
}

#[test]
fn config_with_bad_alias_table_fails_to_load() {
    let mut file = NamedTempFile::new().expect("temp file");
    writeln!(file, "version: \"1.0\"\nnormalizer:\n  header_aliases:\n    \"  \": full_name")
        .expect("write config");

    let err = LeadflowConfig::from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigLoadError::Validation(_)));
}

#[test]
fn malformed_yaml_is_a_parse_error() {
    let err = LeadflowConfig::from_yaml("version: [unterminated").unwrap_err();
    assert!(matches!(err, ConfigLoadError::YamlParse(_)));
}
