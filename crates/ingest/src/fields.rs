//! Header and value resolution onto the canonical lead schema.
//!
//! # Resolution Flow
//!
//! ```text
//! RawRow
//!    │
//!    ▼
//! ┌─────────────────────────────────────┐
//! │ 1. Headers                          │
//! │    - lower-case + trim              │
//! │    - alias table, unknown dropped   │
//! │    - first non-empty value wins     │
//! ├─────────────────────────────────────┤
//! │ 2. Presence                         │
//! │    - name and phone both empty      │
//! │      → InvalidRow                   │
//! ├─────────────────────────────────────┤
//! │ 3. Enum values                      │
//! │    - synonym (as typed, then lower) │
//! │    - canonical spelling             │
//! │    - blank → pending                │
//! │    - anything else kept lower-cased │
//! └─────────────────────────────────────┘
//!    │
//!    ▼
//! CanonicalLead
//! ```
use std::collections::BTreeMap;

use crate::config::NormalizerConfig;
use crate::types::{CallStatus, CanonicalLead, InvalidRow, LeadField, LeadType, RawRow};

/// Reason attached to rows that carry neither a name nor a phone.
pub const MISSING_NAME_AND_PHONE: &str = "missing name and phone";

/// Map one raw header onto a canonical column, if the alias table knows it.
pub fn resolve_header(header: &str, cfg: &NormalizerConfig) -> Option<LeadField> {
    let key = header.trim().to_lowercase();
    cfg.header_aliases.get(&key).copied()
}

/// Normalize a raw row into a [`CanonicalLead`].
///
/// Pure: the result depends only on the row and the tables in `cfg`. The only
/// way a row is refused is carrying neither a name nor a phone.
pub fn normalize_row(row: &RawRow, cfg: &NormalizerConfig) -> Result<CanonicalLead, InvalidRow> {
    let fields = collect_fields(row, cfg);
    let take = |field: LeadField| fields.get(&field).cloned().unwrap_or_default();

    let full_name = take(LeadField::FullName);
    let contact_number = take(LeadField::ContactNumber);
    if full_name.is_empty() && contact_number.is_empty() {
        return Err(invalid(row, MISSING_NAME_AND_PHONE));
    }

    let lead_type = resolve_lead_type(fields.get(&LeadField::LeadType).map(String::as_str), cfg);
    let call_status =
        resolve_call_status(fields.get(&LeadField::CallStatus).map(String::as_str), cfg);

    Ok(CanonicalLead {
        full_name,
        contact_number,
        lead_type,
        call_status,
        project_name: take(LeadField::ProjectName),
        project_id: None,
    })
}

/// Resolve a `lead_type` cell. Blank or missing resolves to `pending`;
/// unrecognised spellings come back lower-cased as [`LeadType::Other`].
pub fn resolve_lead_type(raw: Option<&str>, cfg: &NormalizerConfig) -> LeadType {
    resolve_value(raw, &cfg.lead_type_synonyms)
}

/// Resolve a `call_status` cell. Same rules as [`resolve_lead_type`].
pub fn resolve_call_status(raw: Option<&str>, cfg: &NormalizerConfig) -> CallStatus {
    resolve_value(raw, &cfg.call_status_synonyms)
}

fn collect_fields(row: &RawRow, cfg: &NormalizerConfig) -> BTreeMap<LeadField, String> {
    let mut fields = BTreeMap::new();
    for cell in &row.cells {
        let Some(field) = resolve_header(&cell.header, cfg) else {
            continue;
        };
        let value = sanitize(&cell.value, cfg.strip_control_chars);
        if value.is_empty() {
            continue;
        }
        fields.entry(field).or_insert(value);
    }
    fields
}

fn resolve_value<T>(raw: Option<&str>, synonyms: &BTreeMap<String, T>) -> T
where
    T: Clone + Default + From<String>,
{
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return T::default();
    };
    if let Some(hit) = synonyms.get(raw) {
        return hit.clone();
    }
    let lowered = raw.to_lowercase();
    if let Some(hit) = synonyms.get(&lowered) {
        return hit.clone();
    }
    T::from(lowered)
}

fn sanitize(value: &str, strip_control_chars: bool) -> String {
    if strip_control_chars {
        value
            .chars()
            .filter(|c| !c.is_ascii_control())
            .collect::<String>()
            .trim()
            .to_string()
    } else {
        value.trim().to_string()
    }
}

fn invalid(row: &RawRow, reason: &str) -> InvalidRow {
    InvalidRow {
        row: row.clone(),
        reason: reason.to_string(),
    }
}
