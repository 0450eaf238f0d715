use std::collections::HashSet;

use ingest::ProjectId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One project as supplied by the registry collaborator. Read-only here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectRegistryEntry {
    pub id: ProjectId,
    /// Canonical display name.
    pub name: String,
    /// Extra spellings that should resolve to this project.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
}

impl ProjectRegistryEntry {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ProjectId::new(id),
            name: name.into(),
            keywords: Vec::new(),
        }
    }

    pub fn with_keywords<I, S>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keywords.extend(keywords.into_iter().map(Into::into));
        self
    }
}

/// Which rule produced a match. Earlier variants take priority.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MatchTier {
    /// Case-insensitive equality with the canonical name.
    Exact,
    /// A keyword contains the input, or the input contains a keyword.
    Keyword,
    /// The name contains the input, or the input contains the name.
    Partial,
}

/// A successful resolution against the registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProjectMatch {
    pub id: ProjectId,
    pub name: String,
    pub tier: MatchTier,
}

/// Outcome of resolving one free-text project reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectResolution {
    Resolved(ProjectMatch),
    Unresolved,
}

impl ProjectResolution {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ProjectResolution::Resolved(_))
    }

    pub fn into_match(self) -> Option<ProjectMatch> {
        match self {
            ProjectResolution::Resolved(hit) => Some(hit),
            ProjectResolution::Unresolved => None,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MatchError {
    #[error("registry entry at position {position} has an empty id")]
    EmptyProjectId { position: usize },

    #[error("project id \"{0}\" appears more than once in the registry")]
    DuplicateProjectId(ProjectId),

    #[error("invalid registry document: {0}")]
    InvalidRegistry(String),
}

/// Check the invariants the matcher relies on: non-empty, unique ids.
pub fn validate_registry(registry: &[ProjectRegistryEntry]) -> Result<(), MatchError> {
    let mut seen = HashSet::with_capacity(registry.len());
    for (position, entry) in registry.iter().enumerate() {
        if entry.id.as_str().trim().is_empty() {
            return Err(MatchError::EmptyProjectId { position });
        }
        if !seen.insert(&entry.id) {
            return Err(MatchError::DuplicateProjectId(entry.id.clone()));
        }
    }
    Ok(())
}

/// Parse a registry from the JSON array returned by `listProjects()`.
pub fn registry_from_json(json: &str) -> Result<Vec<ProjectRegistryEntry>, MatchError> {
    let registry: Vec<ProjectRegistryEntry> =
        serde_json::from_str(json).map_err(|err| MatchError::InvalidRegistry(err.to_string()))?;
    validate_registry(&registry)?;
    Ok(registry)
}
