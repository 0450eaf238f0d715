//! Intra-batch duplicate removal.
//!
//! Two leads are duplicates when they share a [`DedupKey`]: the resolved
//! project id (or the shared [`NO_PROJECT`] bucket) plus the phone reduced to
//! its digits. The first occurrence in upload order survives. Nothing here
//! knows about previously stored leads; that check belongs to the store.
use std::collections::HashSet;

use ingest::CanonicalLead;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Bucket shared by every lead whose project did not resolve.
pub const NO_PROJECT: &str = "no-project";

/// Where a duplicate was caught.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateStage {
    /// Within the uploaded file, before any store call.
    IntraBatch,
    /// By the store, against leads it already holds.
    Persisted,
}

/// Append-only log entry for a dropped duplicate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DuplicateRecord {
    pub phone: String,
    pub project: String,
    pub reason: String,
    pub stage: DuplicateStage,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DedupKey {
    pub project: String,
    pub phone: String,
}

impl DedupKey {
    pub fn for_lead(lead: &CanonicalLead) -> Self {
        let project = lead
            .project_id
            .as_ref()
            .map(|id| id.as_str().to_string())
            .unwrap_or_else(|| NO_PROJECT.to_string());
        Self {
            project,
            phone: lead.normalized_phone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DedupOptions {
    /// Whether leads without any phone digits take part in deduplication.
    ///
    /// With `true`, two phone-less leads in the same project bucket collapse
    /// into one, exactly like two leads sharing a number. With `false`, they
    /// are always kept.
    ///
    /// Default: `true`
    pub dedupe_blank_phones: bool,
}

impl Default for DedupOptions {
    fn default() -> Self {
        Self {
            dedupe_blank_phones: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DedupOutcome {
    pub unique: Vec<CanonicalLead>,
    pub duplicates: Vec<DuplicateRecord>,
}

/// Label used for a lead's project in duplicate reasons and reports.
pub fn project_label(lead: &CanonicalLead) -> &str {
    if lead.project_name.is_empty() {
        NO_PROJECT
    } else {
        &lead.project_name
    }
}

/// Drop every lead whose key was already seen earlier in `leads`.
pub fn dedupe(leads: Vec<CanonicalLead>, opts: DedupOptions) -> DedupOutcome {
    let mut seen: HashSet<DedupKey> = HashSet::with_capacity(leads.len());
    let mut outcome = DedupOutcome {
        unique: Vec::with_capacity(leads.len()),
        duplicates: Vec::new(),
    };

    for lead in leads {
        let key = DedupKey::for_lead(&lead);
        if key.phone.is_empty() && !opts.dedupe_blank_phones {
            outcome.unique.push(lead);
            continue;
        }
        if seen.contains(&key) {
            let project = project_label(&lead).to_string();
            debug!(phone = %key.phone, project = %project, "duplicate_intra_batch");
            outcome.duplicates.push(DuplicateRecord {
                phone: lead.contact_number.clone(),
                reason: format!("duplicate phone within project {project}"),
                project,
                stage: DuplicateStage::IntraBatch,
            });
        } else {
            seen.insert(key);
            outcome.unique.push(lead);
        }
    }

    outcome
}
