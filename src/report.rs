//! Reconciliation report for one import.
//!
//! [`ReconciliationReporter`] is created at the start of an import and
//! threaded through each stage, which records what it accepted, dropped or
//! failed. [`ReconciliationReporter::finish`] folds that into the immutable
//! [`ImportReport`] handed back to the caller.
use std::collections::HashMap;
use std::fmt;

use ingest::{CanonicalLead, InvalidRow, normalize_phone};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::dedup::{DuplicateRecord, DuplicateStage, project_label};
use crate::store::{BulkCreateResponse, PersistedDuplicate};

/// Reason recorded for a bulk-submitted lead the store neither created nor
/// reported as a duplicate.
pub const NOT_CREATED_BY_STORE: &str = "not created by the store";

/// A submitted lead the store failed to create for a reason other than a duplicate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RowFailure {
    pub name: String,
    pub phone: String,
    pub reason: String,
}

impl RowFailure {
    pub fn for_lead(lead: &CanonicalLead, reason: impl Into<String>) -> Self {
        Self {
            name: lead.full_name.clone(),
            phone: lead.contact_number.clone(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for RowFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.phone)
    }
}

/// Overall verdict on an import.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImportOutcome {
    /// Every uploaded row was saved.
    Complete,
    /// Something was saved or already stored, and something else was not.
    Partial,
    /// Leads were submitted, none were saved, and at least one failed.
    Failed,
    /// No lead survived to submission.
    NothingToImport,
}

impl ImportOutcome {
    fn headline(self) -> &'static str {
        match self {
            ImportOutcome::Complete => "Import complete",
            ImportOutcome::Partial => "Import partially complete",
            ImportOutcome::Failed => "Import failed",
            ImportOutcome::NothingToImport => "Nothing to import",
        }
    }
}

impl fmt::Display for ImportOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.headline())
    }
}

/// Final, caller-facing result of one import.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub total_uploaded: usize,
    /// Leads that survived normalization and dedup and were submitted.
    pub accepted: Vec<CanonicalLead>,
    pub csv_duplicates_removed: Vec<DuplicateRecord>,
    pub invalid_rows: Vec<InvalidRow>,
    pub successfully_saved: usize,
    pub database_duplicates_skipped: usize,
    pub database_duplicate_details: Vec<PersistedDuplicate>,
    pub other_failures: usize,
    pub failed_rows: Vec<RowFailure>,
    pub outcome: ImportOutcome,
    pub final_message: String,
}

impl ImportReport {
    pub fn outcome(&self) -> ImportOutcome {
        self.outcome
    }

    /// Every dropped duplicate, intra-batch first, then those the store reported.
    pub fn duplicates(&self) -> Vec<DuplicateRecord> {
        self.csv_duplicates_removed
            .iter()
            .cloned()
            .chain(
                self.database_duplicate_details
                    .iter()
                    .map(|d| DuplicateRecord {
                        phone: d.phone.clone(),
                        project: d.project.clone(),
                        reason: d.reason.clone(),
                        stage: DuplicateStage::Persisted,
                    }),
            )
            .collect()
    }

    /// Both accounting identities hold.
    pub fn is_balanced(&self) -> bool {
        let accepted = self.accepted.len();
        let dropped = self.csv_duplicates_removed.len() + self.invalid_rows.len();
        self.total_uploaded == accepted + dropped
            && self.successfully_saved + self.database_duplicates_skipped + self.other_failures
                == accepted
    }
}

/// Pipeline-scoped builder for an [`ImportReport`].
#[derive(Debug, Default)]
pub struct ReconciliationReporter {
    total_uploaded: usize,
    accepted: Vec<CanonicalLead>,
    csv_duplicates: Vec<DuplicateRecord>,
    invalid: Vec<InvalidRow>,
    saved: usize,
    persisted_duplicates: usize,
    persisted_details: Vec<PersistedDuplicate>,
    failures: Vec<RowFailure>,
}

impl ReconciliationReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn uploaded(&mut self, rows: usize) -> &mut Self {
        self.total_uploaded += rows;
        self
    }

    pub fn invalid(&mut self, rows: impl IntoIterator<Item = InvalidRow>) -> &mut Self {
        self.invalid.extend(rows);
        self
    }

    pub fn intra_batch_duplicates(
        &mut self,
        dups: impl IntoIterator<Item = DuplicateRecord>,
    ) -> &mut Self {
        self.csv_duplicates.extend(dups);
        self
    }

    pub fn accepted(&mut self, leads: &[CanonicalLead]) -> &mut Self {
        self.accepted.extend_from_slice(leads);
        self
    }

    pub fn saved(&mut self, count: usize) -> &mut Self {
        self.saved += count;
        self
    }

    pub fn persisted_duplicate(&mut self, detail: PersistedDuplicate) -> &mut Self {
        self.persisted_duplicates += 1;
        self.persisted_details.push(detail);
        self
    }

    pub fn failed(&mut self, failure: RowFailure) -> &mut Self {
        self.failures.push(failure);
        self
    }

    /// Fold a bulk create response for the leads recorded as accepted.
    ///
    /// The validation summary is authoritative for counts when present;
    /// otherwise `data.created` and the detail lists are used. Duplicates the
    /// store found inside the request itself are counted with the persisted
    /// duplicates, since the store refused them for the same reason.
    ///
    /// When `data.leads` itemizes every created lead, accepted leads that are
    /// neither created nor listed as duplicates are recorded as named
    /// failures. Otherwise they can only be inferred as a count in
    /// [`finish`](Self::finish).
    pub fn bulk_response(&mut self, response: BulkCreateResponse) -> &mut Self {
        let saved_before = self.saved;
        let details_before = self.persisted_details.len();
        let created = response.data.leads;

        match response.validation {
            Some(validation) => {
                self.saved += validation.summary.successfully_saved;
                self.persisted_duplicates += validation
                    .summary
                    .database_duplicates_skipped
                    .max(validation.database_duplicate_details.len());
                self.persisted_details
                    .extend(validation.database_duplicate_details);

                self.persisted_duplicates += validation.csv_duplicate_details.len();
                self.persisted_details
                    .extend(validation.csv_duplicate_details.into_iter().map(|d| {
                        PersistedDuplicate {
                            name: String::new(),
                            reason: format!("duplicate phone within project {}", d.project),
                            phone: d.phone,
                            project: d.project,
                        }
                    }));
            }
            None => self.saved += response.data.created,
        }

        if created.len() >= self.saved - saved_before {
            let mut settled: HashMap<(String, String), usize> = HashMap::new();
            let listed = created
                .iter()
                .map(|lead| (lead.normalized_phone(), project_label(lead).to_string()))
                .chain(
                    self.persisted_details[details_before..]
                        .iter()
                        .map(|d| (normalize_phone(&d.phone), d.project.clone())),
                );
            for key in listed {
                *settled.entry(key).or_default() += 1;
            }

            let unsettled: Vec<RowFailure> = self
                .accepted
                .iter()
                .filter(|lead| {
                    let key = (lead.normalized_phone(), project_label(lead).to_string());
                    match settled.get_mut(&key) {
                        Some(n) if *n > 0 => {
                            *n -= 1;
                            false
                        }
                        _ => true,
                    }
                })
                .map(|lead| RowFailure::for_lead(lead, NOT_CREATED_BY_STORE))
                .collect();
            self.failures.extend(unsettled);
        }
        self
    }

    /// Number of leads recorded as accepted so far.
    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    pub fn finish(mut self) -> ImportReport {
        let accepted = self.accepted.len();
        let failed = self.failures.len();
        let resolved = self.saved + self.persisted_duplicates + failed;
        if resolved > accepted {
            warn!(
                accepted,
                saved = self.saved,
                duplicates = self.persisted_duplicates,
                failed,
                "store_counts_exceed_submitted"
            );
            // Named failures and itemized duplicates outrank bare counts.
            self.persisted_duplicates = self
                .persisted_duplicates
                .min(accepted.saturating_sub(failed));
            self.persisted_details.truncate(self.persisted_duplicates);
            self.saved = self
                .saved
                .min(accepted.saturating_sub(failed + self.persisted_duplicates));
        }
        // Submitted rows the store neither saved nor reported as duplicates.
        let resolved = self.saved + self.persisted_duplicates + failed;
        let other_failures = failed + accepted.saturating_sub(resolved);

        let outcome = if accepted == 0 {
            ImportOutcome::NothingToImport
        } else if self.saved == 0 && other_failures > 0 {
            ImportOutcome::Failed
        } else if self.saved == self.total_uploaded && other_failures == 0 {
            ImportOutcome::Complete
        } else {
            ImportOutcome::Partial
        };

        let final_message = compose_message(
            outcome,
            self.total_uploaded,
            self.saved,
            self.persisted_duplicates,
            self.csv_duplicates.len(),
            self.invalid.len(),
            other_failures,
            &self.failures,
        );

        ImportReport {
            total_uploaded: self.total_uploaded,
            accepted: self.accepted,
            csv_duplicates_removed: self.csv_duplicates,
            invalid_rows: self.invalid,
            successfully_saved: self.saved,
            database_duplicates_skipped: self.persisted_duplicates,
            database_duplicate_details: self.persisted_details,
            other_failures,
            failed_rows: self.failures,
            outcome,
            final_message,
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn compose_message(
    outcome: ImportOutcome,
    total: usize,
    saved: usize,
    persisted_duplicates: usize,
    csv_duplicates: usize,
    invalid: usize,
    other_failures: usize,
    failures: &[RowFailure],
) -> String {
    let mut message = format!("{outcome}: {saved} of {total} lead(s) saved");

    let parts = [
        (persisted_duplicates, "already in the database"),
        (csv_duplicates, "duplicate(s) removed from the file"),
        (invalid, "invalid row(s) skipped"),
        (other_failures, "failed"),
    ];
    for (count, label) in parts {
        if count > 0 {
            message.push_str(&format!(", {count} {label}"));
        }
    }
    message.push('.');

    if !failures.is_empty() {
        let named: Vec<String> = failures.iter().map(ToString::to_string).collect();
        message.push_str(&format!(" Failed: {}.", named.join(", ")));
    }
    message
}
