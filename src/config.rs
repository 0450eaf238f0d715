//! YAML configuration file support for leadflow.
//!
//! One file configures every stage of an import. Every section is optional;
//! alias and synonym tables are merged over the built-in defaults rather than
//! replacing them.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! # leadflow import configuration
//! version: "1.0"
//! name: "north region sheets"
//!
//! normalizer:
//!   strip_control_chars: true
//!   header_aliases:
//!     mobile: contact_number
//!     customer: full_name
//!     site: project_name
//!   lead_type_synonyms:
//!     urgent: hot
//!     junk: fake
//!   call_status_synonyms:
//!     "call back": callback
//!
//! dedupe:
//!   dedupe_blank_phones: true
//!
//! submission:
//!   mode: "sequential"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use ingest::{CallStatus, LeadField, LeadType, NormalizerConfig};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dedup::DedupOptions;
use crate::importer::{ImportConfig, SubmissionMode};

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration for an import
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LeadflowConfig {
    /// Configuration format version
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub normalizer: NormalizerYamlConfig,

    #[serde(default)]
    pub dedupe: DedupYamlConfig,

    #[serde(default)]
    pub submission: SubmissionYamlConfig,
}

impl LeadflowConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: LeadflowConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.normalizer.to_normalizer_config()?;
        Ok(())
    }

    /// Build the runtime configuration, defaults first, file entries on top.
    pub fn to_import_config(&self) -> Result<ImportConfig, ConfigLoadError> {
        Ok(ImportConfig {
            normalizer: self.normalizer.to_normalizer_config()?,
            dedupe: DedupOptions {
                dedupe_blank_phones: self.dedupe.dedupe_blank_phones,
            },
            mode: self.submission.mode,
        })
    }
}

impl Default for LeadflowConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            normalizer: NormalizerYamlConfig::default(),
            dedupe: DedupYamlConfig::default(),
            submission: SubmissionYamlConfig::default(),
        }
    }
}

/// Normalizer YAML configuration. Entries extend the built-in tables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerYamlConfig {
    #[serde(default = "true_value")]
    pub strip_control_chars: bool,

    #[serde(default)]
    pub header_aliases: BTreeMap<String, LeadField>,

    #[serde(default)]
    pub lead_type_synonyms: BTreeMap<String, LeadType>,

    #[serde(default)]
    pub call_status_synonyms: BTreeMap<String, CallStatus>,
}

impl NormalizerYamlConfig {
    fn to_normalizer_config(&self) -> Result<NormalizerConfig, ConfigLoadError> {
        let mut config = NormalizerConfig {
            strip_control_chars: self.strip_control_chars,
            ..NormalizerConfig::default()
        };
        for (alias, field) in &self.header_aliases {
            config = config.with_header_alias(alias, *field);
        }
        for (raw, value) in &self.lead_type_synonyms {
            config = config.with_lead_type_synonym(raw, value.clone());
        }
        for (raw, value) in &self.call_status_synonyms {
            config = config.with_call_status_synonym(raw, value.clone());
        }

        config
            .validate()
            .map_err(|err| ConfigLoadError::Validation(format!("normalizer: {err}")))?;
        Ok(config)
    }
}

impl Default for NormalizerYamlConfig {
    fn default() -> Self {
        Self {
            strip_control_chars: true,
            header_aliases: BTreeMap::new(),
            lead_type_synonyms: BTreeMap::new(),
            call_status_synonyms: BTreeMap::new(),
        }
    }
}

/// Dedupe YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupYamlConfig {
    #[serde(default = "true_value")]
    pub dedupe_blank_phones: bool,
}

impl Default for DedupYamlConfig {
    fn default() -> Self {
        Self {
            dedupe_blank_phones: true,
        }
    }
}

/// Submission YAML configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubmissionYamlConfig {
    #[serde(default)]
    pub mode: SubmissionMode,
}

fn true_value() -> bool {
    true
}
