use ingest::CanonicalLead;
use tracing::debug;

use crate::types::{MatchTier, ProjectMatch, ProjectRegistryEntry, ProjectResolution};

#[cfg(test)]
mod tests;

/// Registry entry with its comparison keys lower-cased once up front.
///
/// Only the input text is trimmed; the registry name is compared as stored.
#[derive(Debug, Clone)]
struct PreparedEntry {
    entry: ProjectRegistryEntry,
    name_key: String,
    keyword_keys: Vec<String>,
}

impl PreparedEntry {
    fn new(entry: ProjectRegistryEntry) -> Self {
        let name_key = entry.name.to_lowercase();
        let keyword_keys = entry
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self {
            entry,
            name_key,
            keyword_keys,
        }
    }

    fn matches(&self, tier: MatchTier, needle: &str) -> bool {
        match tier {
            MatchTier::Exact => !self.name_key.is_empty() && self.name_key == needle,
            MatchTier::Keyword => self
                .keyword_keys
                .iter()
                .any(|k| needle.contains(k.as_str()) || k.contains(needle)),
            MatchTier::Partial => {
                !self.name_key.is_empty()
                    && (self.name_key.contains(needle) || needle.contains(self.name_key.as_str()))
            }
        }
    }
}

/// Resolves free-text project references against a fixed registry.
///
/// Tiers are tried in priority order ([`MatchTier::Exact`], then
/// [`MatchTier::Keyword`], then [`MatchTier::Partial`]); within a tier the
/// first entry in registry order wins. There is no similarity scoring.
#[derive(Debug, Clone, Default)]
pub struct ProjectMatcher {
    entries: Vec<PreparedEntry>,
}

impl ProjectMatcher {
    pub fn new(registry: impl IntoIterator<Item = ProjectRegistryEntry>) -> Self {
        Self {
            entries: registry.into_iter().map(PreparedEntry::new).collect(),
        }
    }

    /// Resolve one project reference.
    ///
    /// Blank input never resolves: the empty string is a substring of every
    /// name and would otherwise pick the first registry entry.
    pub fn resolve(&self, text: &str) -> ProjectResolution {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return ProjectResolution::Unresolved;
        }

        for tier in [MatchTier::Exact, MatchTier::Keyword, MatchTier::Partial] {
            if let Some(hit) = self.entries.iter().find(|e| e.matches(tier, &needle)) {
                debug!(input = %text, project_id = %hit.entry.id, ?tier, "project_resolved");
                return ProjectResolution::Resolved(ProjectMatch {
                    id: hit.entry.id.clone(),
                    name: hit.entry.name.clone(),
                    tier,
                });
            }
        }

        debug!(input = %text, "project_unresolved");
        ProjectResolution::Unresolved
    }

    /// Resolve `lead.project_name` in place.
    ///
    /// On a hit the lead takes the registry id and canonical name. On a miss
    /// the free text stays in `project_name` and `project_id` stays empty.
    pub fn apply(&self, lead: &mut CanonicalLead) -> Option<MatchTier> {
        let hit = self.resolve(&lead.project_name).into_match()?;
        lead.project_id = Some(hit.id);
        lead.project_name = hit.name;
        Some(hit.tier)
    }
}

/// One-off resolution without building a reusable [`ProjectMatcher`].
pub fn resolve_project(text: &str, registry: &[ProjectRegistryEntry]) -> ProjectResolution {
    ProjectMatcher::new(registry.iter().cloned()).resolve(text)
}
