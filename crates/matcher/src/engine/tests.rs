use super::*;

use ingest::{CallStatus, LeadType, ProjectId};

fn registry() -> Vec<ProjectRegistryEntry> {
    vec![
        ProjectRegistryEntry::new("p-sky", "Skyline Towers").with_keywords(["skyline", "tower"]),
        ProjectRegistryEntry::new("p-ocean", "Oceanview"),
        ProjectRegistryEntry::new("p-green", "Green Acres").with_keywords(["garden"]),
    ]
}

fn lead_with_project(project: &str) -> CanonicalLead {
    CanonicalLead {
        full_name: "Asha".into(),
        contact_number: "9999999999".into(),
        lead_type: LeadType::Pending,
        call_status: CallStatus::Pending,
        project_name: project.into(),
        project_id: None,
    }
}

fn resolved(res: ProjectResolution) -> ProjectMatch {
    match res {
        ProjectResolution::Resolved(hit) => hit,
        ProjectResolution::Unresolved => panic!("expected a resolved project"),
    }
}

#[test]
fn exact_match_is_case_insensitive() {
    let matcher = ProjectMatcher::new(registry());
    let hit = resolved(matcher.resolve("  OCEANVIEW "));
    assert_eq!(hit.id, ProjectId::new("p-ocean"));
    assert_eq!(hit.tier, MatchTier::Exact);
}

#[test]
fn keyword_substring_resolves() {
    // "skyl" is a substring of the keyword "skyline".
    let matcher = ProjectMatcher::new(registry());
    let hit = resolved(matcher.resolve("skyl"));
    assert_eq!(hit.name, "Skyline Towers");
    assert_eq!(hit.tier, MatchTier::Keyword);
}

#[test]
fn input_containing_keyword_resolves() {
    let matcher = ProjectMatcher::new(registry());
    let hit = resolved(matcher.resolve("Rooftop garden block"));
    assert_eq!(hit.id, ProjectId::new("p-green"));
    assert_eq!(hit.tier, MatchTier::Keyword);
}

#[test]
fn partial_name_match_is_last_resort() {
    let matcher = ProjectMatcher::new(registry());
    let hit = resolved(matcher.resolve("ocean"));
    assert_eq!(hit.id, ProjectId::new("p-ocean"));
    assert_eq!(hit.tier, MatchTier::Partial);

    let hit = resolved(matcher.resolve("Oceanview Phase 2"));
    assert_eq!(hit.tier, MatchTier::Partial);
}

#[test]
fn exact_beats_earlier_partial_entry() {
    let matcher = ProjectMatcher::new(vec![
        ProjectRegistryEntry::new("p-long", "Skyline Towers"),
        ProjectRegistryEntry::new("p-short", "Skyline"),
    ]);
    let hit = resolved(matcher.resolve("skyline"));
    assert_eq!(hit.id, ProjectId::new("p-short"));
    assert_eq!(hit.tier, MatchTier::Exact);
}

#[test]
fn exact_beats_earlier_keyword_entry() {
    let matcher = ProjectMatcher::new(vec![
        ProjectRegistryEntry::new("p-a", "Alpha").with_keywords(["oceanview"]),
        ProjectRegistryEntry::new("p-b", "Oceanview"),
    ]);
    let hit = resolved(matcher.resolve("Oceanview"));
    assert_eq!(hit.id, ProjectId::new("p-b"));
}

#[test]
fn ties_within_tier_follow_registry_order() {
    let matcher = ProjectMatcher::new(vec![
        ProjectRegistryEntry::new("p-1", "Sky Gardens"),
        ProjectRegistryEntry::new("p-2", "Sky Heights"),
    ]);
    let hit = resolved(matcher.resolve("sky"));
    assert_eq!(hit.id, ProjectId::new("p-1"));
}

#[test]
fn blank_and_unknown_inputs_stay_unresolved() {
    let matcher = ProjectMatcher::new(registry());
    assert_eq!(matcher.resolve("   "), ProjectResolution::Unresolved);
    assert_eq!(matcher.resolve("Riverside"), ProjectResolution::Unresolved);
    assert_eq!(
        ProjectMatcher::default().resolve("Skyline"),
        ProjectResolution::Unresolved
    );
}

#[test]
fn blank_keywords_are_ignored() {
    let matcher = ProjectMatcher::new(vec![
        ProjectRegistryEntry::new("p-1", "Alpha").with_keywords(["", "  "]),
    ]);
    assert_eq!(matcher.resolve("zeta"), ProjectResolution::Unresolved);
}

#[test]
fn apply_fills_id_and_canonical_name() {
    let matcher = ProjectMatcher::new(registry());
    let mut lead = lead_with_project("skyline");
    assert_eq!(matcher.apply(&mut lead), Some(MatchTier::Keyword));
    assert_eq!(lead.project_id, Some(ProjectId::new("p-sky")));
    assert_eq!(lead.project_name, "Skyline Towers");
}

#[test]
fn apply_keeps_free_text_on_miss() {
    let matcher = ProjectMatcher::new(registry());
    let mut lead = lead_with_project("Riverside");
    assert_eq!(matcher.apply(&mut lead), None);
    assert_eq!(lead.project_id, None);
    assert_eq!(lead.project_name, "Riverside");
}

#[test]
fn free_function_matches_engine() {
    let registry = registry();
    assert!(resolve_project("tower", &registry).is_resolved());
    assert!(!resolve_project("", &registry).is_resolved());
}

#[test]
fn registry_name_is_compared_untrimmed() {
    let matcher = ProjectMatcher::new(vec![ProjectRegistryEntry::new("p-pad", "Oceanview ")]);
    let hit = resolved(matcher.resolve(" oceanview"));
    assert_eq!(hit.id, ProjectId::new("p-pad"));
    assert_eq!(hit.tier, MatchTier::Partial);
    assert_eq!(hit.name, "Oceanview ");
}
