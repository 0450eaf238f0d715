//! # Project Matcher (`matcher`)
//!
//! ## Purpose
//!
//! Uploaded lead sheets reference projects by whatever the sales team typed:
//! `"Skyline"`, `"skyline towers ph-2"`, `"SKYL"`. `matcher` turns that free
//! text into a reference to an entry of the canonical project registry, or
//! reports that nothing matched.
//!
//! ## Core Types
//!
//! - [`ProjectRegistryEntry`]: id, canonical name and optional keywords, as
//!   supplied by the registry collaborator.
//! - [`ProjectMatcher`]: registry prepared for repeated lookups.
//! - [`MatchTier`]: which rule produced the hit:
//!   - `Exact`: case-insensitive equality with the name.
//!   - `Keyword`: keyword and input contain one another.
//!   - `Partial`: name and input contain one another.
//! - [`ProjectResolution`]: `Resolved(ProjectMatch)` or `Unresolved`.
//!
//! Tiers are strict: an exact hit anywhere in the registry beats a keyword
//! hit on an earlier entry. Inside a tier, registry order decides.
//!
//! ## Example Usage
//!
//! ```
//! use matcher::{MatchTier, ProjectMatcher, ProjectRegistryEntry, ProjectResolution};
//!
//! let matcher = ProjectMatcher::new(vec![
//!     ProjectRegistryEntry::new("p1", "Skyline Towers").with_keywords(["skyline", "tower"]),
//!     ProjectRegistryEntry::new("p2", "Oceanview"),
//! ]);
//!
//! match matcher.resolve("skyl") {
//!     ProjectResolution::Resolved(hit) => {
//!         assert_eq!(hit.name, "Skyline Towers");
//!         assert_eq!(hit.tier, MatchTier::Keyword);
//!     }
//!     ProjectResolution::Unresolved => unreachable!(),
//! }
//! ```

pub mod engine;
pub mod types;

pub use crate::engine::{resolve_project, ProjectMatcher};
pub use crate::types::{
    registry_from_json, validate_registry, MatchError, MatchTier, ProjectMatch,
    ProjectRegistryEntry, ProjectResolution,
};
