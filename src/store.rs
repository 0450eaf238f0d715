//! Collaborator seams: the persistence layer and the project registry.
//!
//! The pipeline owns no durable state. Leads are handed to a [`LeadStore`],
//! projects come from a [`ProjectRegistry`]. Both are async traits so real
//! implementations can sit on top of an HTTP client; [`InMemoryLeadStore`]
//! and [`StaticProjectRegistry`] are the in-process versions used by the CLI
//! and the tests.
use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ingest::CanonicalLead;
use matcher::{MatchError, ProjectRegistryEntry, registry_from_json};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::dedup::{DedupKey, project_label};

/// Substring legacy collaborators put in duplicate-lead error messages.
const ALREADY_EXISTS_MARKER: &str = "already exists";

/// What kind of failure a collaborator reported.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StoreErrorKind {
    /// The lead is already stored. Expected during imports; not a failure.
    AlreadyExists,
    /// The store refused the record for another reason.
    Rejected,
    /// The call itself failed.
    Transport,
}

impl fmt::Display for StoreErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StoreErrorKind::AlreadyExists => "already_exists",
            StoreErrorKind::Rejected => "rejected",
            StoreErrorKind::Transport => "transport",
        };
        f.write_str(s)
    }
}

/// Error returned by a collaborator call, classified by [`StoreErrorKind`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct StoreError {
    pub kind: StoreErrorKind,
    pub message: String,
}

impl StoreError {
    pub fn new(kind: StoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::AlreadyExists, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Rejected, message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(StoreErrorKind::Transport, message)
    }

    /// Classify a bare error message from a collaborator that has no error codes.
    ///
    /// Only adapters over such collaborators should need this; anything that
    /// can report a kind should construct the error directly.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        let kind = if message.to_lowercase().contains(ALREADY_EXISTS_MARKER) {
            StoreErrorKind::AlreadyExists
        } else {
            StoreErrorKind::Rejected
        };
        Self { kind, message }
    }

    pub fn is_already_exists(&self) -> bool {
        self.kind == StoreErrorKind::AlreadyExists
    }
}

/// A lead as held by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredLead {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub lead: CanonicalLead,
}

/// A lead the store refused because it already holds one with the same key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersistedDuplicate {
    pub name: String,
    pub phone: String,
    pub project: String,
    pub reason: String,
}

impl PersistedDuplicate {
    pub fn for_lead(lead: &CanonicalLead, reason: impl Into<String>) -> Self {
        Self {
            name: lead.full_name.clone(),
            phone: lead.contact_number.clone(),
            project: project_label(lead).to_string(),
            reason: reason.into(),
        }
    }
}

/// Response of a bulk create, in the store's wire shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreateResponse {
    pub success: bool,
    #[serde(default)]
    pub data: BulkCreateData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<BulkValidation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BulkCreateData {
    pub created: usize,
    #[serde(default)]
    pub leads: Vec<CanonicalLead>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BulkValidation {
    pub summary: BulkSummary,
    #[serde(default)]
    pub database_duplicate_details: Vec<PersistedDuplicate>,
    #[serde(default)]
    pub csv_duplicate_details: Vec<CsvDuplicateDetail>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BulkSummary {
    pub total_uploaded: usize,
    pub successfully_saved: usize,
    pub database_duplicates_skipped: usize,
    #[serde(default)]
    pub final_message: String,
}

/// A duplicate the store found inside one bulk request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CsvDuplicateDetail {
    pub phone: String,
    pub project: String,
}

/// Persistence collaborator.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Create one lead. A lead that is already stored fails with
    /// [`StoreErrorKind::AlreadyExists`].
    async fn create_lead(&self, lead: &CanonicalLead) -> Result<StoredLead, StoreError>;

    /// Create many leads in one call, with the store's own duplicate check
    /// against what it already holds.
    async fn create_bulk(&self, leads: &[CanonicalLead]) -> Result<BulkCreateResponse, StoreError>;
}

/// Canonical project registry collaborator.
#[async_trait]
pub trait ProjectRegistry: Send + Sync {
    async fn list_projects(&self) -> Result<Vec<ProjectRegistryEntry>, StoreError>;
}

#[derive(Default)]
struct StoreState {
    leads: Vec<StoredLead>,
    keys: HashSet<DedupKey>,
}

/// An in-memory [`LeadStore`] keyed the same way as intra-batch dedup.
#[derive(Default)]
pub struct InMemoryLeadStore {
    state: RwLock<StoreState>,
    failing_phones: HashSet<String>,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the store, as if these leads had been imported earlier.
    pub fn with_existing(leads: impl IntoIterator<Item = CanonicalLead>) -> Self {
        let store = Self::new();
        if let Ok(mut state) = store.state.write() {
            for lead in leads {
                insert(&mut state, lead);
            }
        }
        store
    }

    /// Make every create for this phone fail with a transport error.
    pub fn with_failing_phone(mut self, phone: &str) -> Self {
        self.failing_phones.insert(ingest::normalize_phone(phone));
        self
    }

    /// Snapshot of everything stored, in insertion order.
    pub fn leads(&self) -> Vec<StoredLead> {
        match self.state.read() {
            Ok(state) => state.leads.clone(),
            Err(poisoned) => poisoned.into_inner().leads.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.leads().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_fault(&self, lead: &CanonicalLead) -> Result<(), StoreError> {
        if self.failing_phones.contains(&lead.normalized_phone()) {
            return Err(StoreError::transport(format!(
                "connection reset while creating lead {}",
                lead.display_name()
            )));
        }
        Ok(())
    }
}

fn insert(state: &mut StoreState, lead: CanonicalLead) -> StoredLead {
    state.keys.insert(DedupKey::for_lead(&lead));
    let stored = StoredLead {
        id: Uuid::new_v4(),
        created_at: Utc::now(),
        lead,
    };
    state.leads.push(stored.clone());
    stored
}

fn already_exists_reason(lead: &CanonicalLead) -> String {
    format!(
        "lead with phone {} already exists in project {}",
        lead.contact_number,
        project_label(lead)
    )
}

#[async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn create_lead(&self, lead: &CanonicalLead) -> Result<StoredLead, StoreError> {
        self.check_fault(lead)?;
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::transport("poisoned lock"))?;
        if state.keys.contains(&DedupKey::for_lead(lead)) {
            return Err(StoreError::already_exists(already_exists_reason(lead)));
        }
        Ok(insert(&mut state, lead.clone()))
    }

    async fn create_bulk(&self, leads: &[CanonicalLead]) -> Result<BulkCreateResponse, StoreError> {
        let mut state = self
            .state
            .write()
            .map_err(|_| StoreError::transport("poisoned lock"))?;

        let mut request_keys = HashSet::new();
        let mut created = Vec::new();
        let mut database_duplicates = Vec::new();
        let mut csv_duplicates = Vec::new();
        let mut failed = 0usize;

        for lead in leads {
            let key = DedupKey::for_lead(lead);
            if request_keys.contains(&key) {
                csv_duplicates.push(CsvDuplicateDetail {
                    phone: lead.contact_number.clone(),
                    project: project_label(lead).to_string(),
                });
                continue;
            }
            if state.keys.contains(&key) {
                database_duplicates
                    .push(PersistedDuplicate::for_lead(lead, already_exists_reason(lead)));
                continue;
            }
            if let Err(err) = self.check_fault(lead) {
                warn!(phone = %lead.contact_number, error = %err, "bulk_lead_not_created");
                failed += 1;
                continue;
            }
            request_keys.insert(key);
            created.push(insert(&mut state, lead.clone()).lead);
        }

        let summary = BulkSummary {
            total_uploaded: leads.len(),
            successfully_saved: created.len(),
            database_duplicates_skipped: database_duplicates.len(),
            final_message: format!(
                "{} saved, {} already existed, {} failed",
                created.len(),
                database_duplicates.len(),
                failed
            ),
        };

        Ok(BulkCreateResponse {
            success: true,
            data: BulkCreateData {
                created: created.len(),
                leads: created,
            },
            validation: Some(BulkValidation {
                summary,
                database_duplicate_details: database_duplicates,
                csv_duplicate_details: csv_duplicates,
            }),
            error: None,
        })
    }
}

/// A fixed, in-process project registry.
#[derive(Debug, Clone, Default)]
pub struct StaticProjectRegistry {
    entries: Vec<ProjectRegistryEntry>,
}

impl StaticProjectRegistry {
    pub fn new(entries: Vec<ProjectRegistryEntry>) -> Self {
        Self { entries }
    }

    pub fn from_json(json: &str) -> Result<Self, MatchError> {
        Ok(Self::new(registry_from_json(json)?))
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, MatchError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|err| {
            MatchError::InvalidRegistry(format!("failed to read {}: {err}", path.display()))
        })?;
        Self::from_json(&json)
    }

    pub fn entries(&self) -> &[ProjectRegistryEntry] {
        &self.entries
    }
}

#[async_trait]
impl ProjectRegistry for StaticProjectRegistry {
    async fn list_projects(&self) -> Result<Vec<ProjectRegistryEntry>, StoreError> {
        Ok(self.entries.clone())
    }
}
