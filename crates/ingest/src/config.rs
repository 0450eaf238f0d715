//! Configuration types for the field normalizer.
//!
//! [`NormalizerConfig`] carries the header alias table and the per-field
//! synonym tables. The defaults cover the spellings seen in exported lead
//! sheets; deployments extend them rather than replace them.
//!
//! ```rust
//! use ingest::{LeadField, LeadType, NormalizerConfig};
//!
//! let config = NormalizerConfig::default()
//!     .with_header_alias("mobile", LeadField::ContactNumber)
//!     .with_lead_type_synonym("urgent", LeadType::Hot);
//!
//! config.validate().expect("valid config");
//! ```
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{CallStatus, LeadField, LeadType};

/// Errors returned by [`NormalizerConfig::validate`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("header alias must not be empty")]
    EmptyAlias,

    /// Aliases are matched against lower-cased, trimmed headers, so any other
    /// spelling could never match.
    #[error("header alias \"{0}\" must be lower-case and trimmed")]
    UnnormalizedAlias(String),

    #[error("{field} synonym must not be empty")]
    EmptySynonym { field: LeadField },
}

/// Tables driving header and enum-value resolution.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NormalizerConfig {
    /// Lower-cased, trimmed header → canonical column.
    pub header_aliases: BTreeMap<String, LeadField>,

    /// Raw `lead_type` spelling → canonical value.
    ///
    /// Looked up with the value as typed first, then lower-cased.
    pub lead_type_synonyms: BTreeMap<String, LeadType>,

    /// Raw `call_status` spelling → canonical value.
    pub call_status_synonyms: BTreeMap<String, CallStatus>,

    /// Whether to strip ASCII control characters (0x00-0x1F, 0x7F) from cell
    /// values before resolution.
    ///
    /// Default: `true`
    #[serde(default = "default_true")]
    pub strip_control_chars: bool,
}

fn default_true() -> bool {
    true
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        let header_aliases = [
            ("name", LeadField::FullName),
            ("full_name", LeadField::FullName),
            ("fullname", LeadField::FullName),
            ("full name", LeadField::FullName),
            ("phone", LeadField::ContactNumber),
            ("contact", LeadField::ContactNumber),
            ("contact_number", LeadField::ContactNumber),
            ("priority", LeadField::LeadType),
            ("type", LeadField::LeadType),
            ("lead_type", LeadField::LeadType),
            ("status", LeadField::CallStatus),
            ("call_status", LeadField::CallStatus),
            ("project", LeadField::ProjectName),
            ("project_name", LeadField::ProjectName),
            ("project-name", LeadField::ProjectName),
        ];

        let lead_type_synonyms = [
            ("high", LeadType::Hot),
            ("medium", LeadType::Connected),
            ("low", LeadType::Cold),
        ];

        let call_status_synonyms = [
            ("new", CallStatus::Pending),
            ("hot", CallStatus::Connected),
            ("cold", CallStatus::NotConnected),
        ];

        Self {
            header_aliases: header_aliases
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            lead_type_synonyms: lead_type_synonyms
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            call_status_synonyms: call_status_synonyms
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
            strip_control_chars: true,
        }
    }
}

impl NormalizerConfig {
    /// Add or replace a header alias. The alias is lower-cased and trimmed.
    pub fn with_header_alias(mut self, alias: &str, field: LeadField) -> Self {
        self.header_aliases.insert(alias.trim().to_lowercase(), field);
        self
    }

    pub fn with_lead_type_synonym(mut self, spelling: &str, value: LeadType) -> Self {
        self.lead_type_synonyms.insert(spelling.trim().to_string(), value);
        self
    }

    pub fn with_call_status_synonym(mut self, spelling: &str, value: CallStatus) -> Self {
        self.call_status_synonyms.insert(spelling.trim().to_string(), value);
        self
    }

    /// Check that every table entry can actually be hit.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for alias in self.header_aliases.keys() {
            if alias.is_empty() {
                return Err(ConfigError::EmptyAlias);
            }
            if alias.trim() != alias || alias.to_lowercase() != *alias {
                return Err(ConfigError::UnnormalizedAlias(alias.clone()));
            }
        }
        if self.lead_type_synonyms.keys().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::EmptySynonym {
                field: LeadField::LeadType,
            });
        }
        if self.call_status_synonyms.keys().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::EmptySynonym {
                field: LeadField::CallStatus,
            });
        }
        Ok(())
    }
}
