//! Core data model types for the ingest crate.
//!
//! These types describe one uploaded row before and after normalization:
//!
//! ```text
//! RawRow
//! ├── line: usize (1-based over non-empty lines, header = 1)
//! └── cells: Vec<RawCell { header, value }>   (arbitrary headers, file order)
//!
//!         ↓ normalize_row()
//!
//! CanonicalLead                               or   InvalidRow
//! ├── full_name: String                            ├── row: RawRow
//! ├── contact_number: String (as typed)            └── reason: String
//! ├── lead_type: LeadType (canonical or Other)
//! ├── call_status: CallStatus (canonical or Other)
//! ├── project_name: String (free text or canonical)
//! └── project_id: Option<ProjectId>
//! ```
//!
//! A `CanonicalLead` is built once by the normalizer. The only fields touched
//! afterwards are `project_id`/`project_name`, which the project matcher fills
//! in when the free text resolves to a registry entry.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One cell of an uploaded row: the header it sat under and its trimmed value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawCell {
    pub header: String,
    pub value: String,
}

/// One data line of an uploaded file, keyed by whatever headers the file had.
///
/// Cells keep file order and duplicates; the normalizer decides which header
/// wins. Raw rows only live for the duration of one import.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based line number among the non-empty lines of the file.
    pub line: usize,
    pub cells: Vec<RawCell>,
}

impl RawRow {
    pub fn new(line: usize) -> Self {
        Self {
            line,
            cells: Vec::new(),
        }
    }

    /// Builder-style helper, mostly for tests and adapters.
    pub fn with(mut self, header: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(header, value);
        self
    }

    pub fn push(&mut self, header: impl Into<String>, value: impl Into<String>) {
        self.cells.push(RawCell {
            header: header.into(),
            value: value.into(),
        });
    }

    /// Value of the first cell whose header matches exactly.
    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|cell| cell.header == header)
            .map(|cell| cell.value.as_str())
    }

}

/// The canonical columns every uploaded header is mapped onto.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum LeadField {
    FullName,
    ContactNumber,
    LeadType,
    CallStatus,
    ProjectName,
}

impl LeadField {
    pub const ALL: [LeadField; 5] = [
        LeadField::FullName,
        LeadField::ContactNumber,
        LeadField::LeadType,
        LeadField::CallStatus,
        LeadField::ProjectName,
    ];

    /// Canonical column name, which is also a recognised header alias.
    pub fn as_str(self) -> &'static str {
        match self {
            LeadField::FullName => "full_name",
            LeadField::ContactNumber => "contact_number",
            LeadField::LeadType => "lead_type",
            LeadField::CallStatus => "call_status",
            LeadField::ProjectName => "project_name",
        }
    }
}

impl fmt::Display for LeadField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string names no canonical enum variant.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown {field} \"{value}\"")]
pub struct UnknownVariant {
    pub field: LeadField,
    pub value: String,
}

/// Lead classification.
///
/// Spellings outside the canonical set are kept, lower-cased, as
/// [`LeadType::Other`]. Serializes as the bare string either way.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum LeadType {
    #[default]
    Pending,
    Hot,
    Cold,
    Fake,
    Connected,
    Other(String),
}

impl LeadType {
    pub fn as_str(&self) -> &str {
        match self {
            LeadType::Pending => "pending",
            LeadType::Hot => "hot",
            LeadType::Cold => "cold",
            LeadType::Fake => "fake",
            LeadType::Connected => "connected",
            LeadType::Other(value) => value,
        }
    }
}

impl FromStr for LeadType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(LeadType::Pending),
            "hot" => Ok(LeadType::Hot),
            "cold" => Ok(LeadType::Cold),
            "fake" => Ok(LeadType::Fake),
            "connected" => Ok(LeadType::Connected),
            other => Err(UnknownVariant {
                field: LeadField::LeadType,
                value: other.to_string(),
            }),
        }
    }
}

impl From<String> for LeadType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(LeadType::Other(value))
    }
}

impl From<LeadType> for String {
    fn from(value: LeadType) -> Self {
        match value {
            LeadType::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for LeadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outreach status of a lead. Unknown spellings are kept as [`CallStatus::Other`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum CallStatus {
    #[default]
    Pending,
    Connected,
    NotConnected,
    Callback,
    Completed,
    Other(String),
}

impl CallStatus {
    pub fn as_str(&self) -> &str {
        match self {
            CallStatus::Pending => "pending",
            CallStatus::Connected => "connected",
            CallStatus::NotConnected => "not_connected",
            CallStatus::Callback => "callback",
            CallStatus::Completed => "completed",
            CallStatus::Other(value) => value,
        }
    }
}

impl FromStr for CallStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CallStatus::Pending),
            "connected" => Ok(CallStatus::Connected),
            "not_connected" => Ok(CallStatus::NotConnected),
            "callback" => Ok(CallStatus::Callback),
            "completed" => Ok(CallStatus::Completed),
            other => Err(UnknownVariant {
                field: LeadField::CallStatus,
                value: other.to_string(),
            }),
        }
    }
}

impl From<String> for CallStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or(CallStatus::Other(value))
    }
}

impl From<CallStatus> for String {
    fn from(value: CallStatus) -> Self {
        match value {
            CallStatus::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque reference to a project in the canonical registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A validated lead on the fixed canonical schema.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalLead {
    pub full_name: String,
    /// Phone as typed in the source; see [`CanonicalLead::normalized_phone`].
    pub contact_number: String,
    pub lead_type: LeadType,
    pub call_status: CallStatus,
    /// Free text from the file, or the registry's canonical name once resolved.
    #[serde(default)]
    pub project_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<ProjectId>,
}

impl CanonicalLead {
    pub fn normalized_phone(&self) -> String {
        normalize_phone(&self.contact_number)
    }

    /// Label used when naming this lead in messages: the name, else the phone.
    pub fn display_name(&self) -> &str {
        if self.full_name.is_empty() {
            &self.contact_number
        } else {
            &self.full_name
        }
    }

    /// Render the lead back onto canonical headers.
    ///
    /// Normalizing the result yields the same lead (minus `project_id`, which
    /// only the project matcher sets).
    pub fn to_raw_row(&self, line: usize) -> RawRow {
        RawRow::new(line)
            .with(LeadField::FullName.as_str(), self.full_name.clone())
            .with(LeadField::ContactNumber.as_str(), self.contact_number.clone())
            .with(LeadField::LeadType.as_str(), self.lead_type.as_str())
            .with(LeadField::CallStatus.as_str(), self.call_status.as_str())
            .with(LeadField::ProjectName.as_str(), self.project_name.clone())
    }
}

/// A row the normalizer refused, with the reason it was refused.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[error("row {}: {reason}", row.line)]
pub struct InvalidRow {
    pub row: RawRow,
    pub reason: String,
}

/// Strip every non-digit character from a phone number.
///
/// ```rust
/// assert_eq!(ingest::normalize_phone("+91 (999) 999-9999"), "919999999999");
/// ```
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}
