//! Status aggregation and statistics.
//!
//! Pure functions over already-loaded records. Nothing here touches the
//! filesystem or fails: absent optional data degrades to a default.

use crate::models::{
    channel, probe, FlagshipProject, HealthCheck, HealthSummary, HealthTier, IntegrationStats,
    ProjectStats, Probes, PublicationStatus, RepositoryManifest, RoadmapSummary, Status,
};
use std::collections::HashMap;

/// Lower bound (inclusive) of the healthy tier, in percent.
pub const HEALTHY_THRESHOLD: f64 = 80.0;

/// Lower bound (inclusive) of the degraded tier, in percent.
pub const DEGRADED_THRESHOLD: f64 = 50.0;

/// Compute summary figures over the flagship projects.
///
/// `active` counts both `Active` and `In Progress`. `In Preparation` and
/// `Concept` have their own buckets, matched exactly.
pub fn compute_project_stats(projects: &[FlagshipProject]) -> ProjectStats {
    let mut stats = ProjectStats {
        total: projects.len(),
        ..ProjectStats::default()
    };

    for project in projects {
        match project.status.as_str() {
            Status::ACTIVE | Status::IN_PROGRESS => stats.active += 1,
            Status::IN_PREPARATION => stats.in_prep += 1,
            Status::CONCEPT => stats.concept += 1,
            _ => {}
        }

        *stats
            .by_track
            .entry(project.track_key().to_string())
            .or_insert(0) += 1;
    }

    stats
}

/// Compute the share of repositories whose status is exactly `Active`.
///
/// Unlike [`compute_project_stats`], `In Progress` does not count here.
pub fn compute_health_summary(manifests: &[RepositoryManifest]) -> HealthSummary {
    let total_repos = manifests.len();
    let active_repos = manifests
        .iter()
        .filter(|m| m.status.is(Status::ACTIVE))
        .count();

    let health_percent = if total_repos > 0 {
        active_repos as f64 / total_repos as f64 * 100.0
    } else {
        0.0
    };

    HealthSummary {
        total_repos,
        active_repos,
        health_percent,
    }
}

/// Classify a health percentage.
pub fn compute_health_tier(health_percent: f64) -> HealthTier {
    if health_percent >= HEALTHY_THRESHOLD {
        HealthTier::Healthy
    } else if health_percent >= DEGRADED_THRESHOLD {
        HealthTier::Degraded
    } else {
        HealthTier::Critical
    }
}

/// Run the four per-repository checks, in display order.
///
/// "Status Updated" always passes: a manifest that loaded at all is
/// treated as current, and there is no timestamp to compare against.
pub fn classify_health_checks(manifest: &RepositoryManifest) -> Vec<HealthCheck> {
    vec![
        HealthCheck::new("GitHub URL", manifest.repo_url().is_some()),
        HealthCheck::new("Spec Document", manifest.spec_location.is_some()),
        HealthCheck::new("Dashboard", manifest.dashboard_location.is_some()),
        HealthCheck::new("Status Updated", true),
    ]
}

/// Compute the Nyquist integration figures.
///
/// `armada_result_count` is counted by the loader; it is zero when the
/// results directory does not exist.
pub fn compute_integration_stats(
    probes: &Probes,
    publication_status: &PublicationStatus,
    armada_result_count: usize,
) -> IntegrationStats {
    IntegrationStats {
        connected: probe_passed(probes, probe::NYQUIST_STATUS),
        armada_runs: armada_result_count,
        workshop_ready: publication_status.completion(channel::WORKSHOP),
        arxiv_progress: publication_status.completion(channel::ARXIV),
    }
}

/// The connection checks shown on the integration panel, in display order.
///
/// A probe absent from the map counts as failed.
pub fn integration_checks(probes: &Probes) -> Vec<HealthCheck> {
    [
        ("NYQUIST_STATUS.json", probe::NYQUIST_STATUS),
        ("Personas Directory", probe::PERSONAS),
        ("Experiments Directory", probe::EXPERIMENTS),
        ("S7 Armada Directory", probe::ARMADA_DIR),
        ("Publication Status", probe::PUBLICATION_STATUS),
    ]
    .into_iter()
    .map(|(name, key)| HealthCheck::new(name, probe_passed(probes, key)))
    .collect()
}

fn probe_passed(probes: &Probes, key: &str) -> bool {
    probes.get(key).copied().unwrap_or(false)
}

/// Order track counts by count (highest first), then by name.
pub fn sorted_track_counts(by_track: &HashMap<String, usize>) -> Vec<(String, usize)> {
    let mut tracks: Vec<(String, usize)> = by_track
        .iter()
        .map(|(track, count)| (track.clone(), *count))
        .collect();

    tracks.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    tracks
}

/// Count projects per raw status, highest count first.
pub fn status_distribution(projects: &[FlagshipProject]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for project in projects {
        *counts.entry(project.status.as_str()).or_default() += 1;
    }

    let mut dist: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(status, count)| (status.to_string(), count))
        .collect();

    dist.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    dist
}

/// Percentage of projects that are `Complete` or `Active`.
pub fn completion_percent(projects: &[FlagshipProject]) -> f64 {
    if projects.is_empty() {
        return 0.0;
    }

    let done = projects
        .iter()
        .filter(|p| p.status.is(Status::COMPLETE) || p.status.is(Status::ACTIVE))
        .count();

    done as f64 / projects.len() as f64 * 100.0
}

/// Projects currently being worked on (active plus in preparation).
pub fn in_flight_count(stats: &ProjectStats) -> usize {
    stats.active + stats.in_prep
}

/// Projects under way: `In Preparation` plus `In Progress`.
///
/// Unlike [`ProjectStats::active`], `Active` is not counted.
pub fn in_progress_count(projects: &[FlagshipProject]) -> usize {
    projects
        .iter()
        .filter(|p| p.status.is(Status::IN_PREPARATION) || p.status.is(Status::IN_PROGRESS))
        .count()
}

/// Compute the roadmap's progress summary.
pub fn compute_roadmap_summary(
    manifests: &[RepositoryManifest],
    projects: &[FlagshipProject],
) -> RoadmapSummary {
    RoadmapSummary {
        repos_active: compute_health_summary(manifests).active_repos,
        projects_in_progress: in_progress_count(projects),
        concepts_defined: compute_project_stats(projects).concept,
    }
}

/// Filter projects by exact status and/or track.
pub fn filter_projects<'a>(
    projects: &'a [FlagshipProject],
    status: Option<&str>,
    track: Option<&str>,
) -> Vec<&'a FlagshipProject> {
    projects
        .iter()
        .filter(|p| status.map_or(true, |s| p.status.is(s)))
        .filter(|p| track.map_or(true, |t| p.track.as_deref() == Some(t)))
        .collect()
}

/// Find a manifest by display name (or repository identifier).
pub fn find_manifest<'a>(
    manifests: &'a [RepositoryManifest],
    name: &str,
) -> Option<&'a RepositoryManifest> {
    manifests
        .iter()
        .find(|m| m.name() == name)
        .or_else(|| manifests.iter().find(|m| m.repo == name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PublicationChannel;
    use proptest::prelude::*;

    fn project(status: &str) -> FlagshipProject {
        FlagshipProject::new(format!("{} project", status), status)
    }

    fn manifest(status: &str) -> RepositoryManifest {
        RepositoryManifest::new(format!("{}-repo", status.to_lowercase()), status)
    }

    #[test]
    fn test_project_stats_scenario() {
        let projects = vec![
            project("Active"),
            project("In Progress"),
            project("In Preparation"),
            project("Concept"),
        ];

        let stats = compute_project_stats(&projects);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.active, 2);
        assert_eq!(stats.in_prep, 1);
        assert_eq!(stats.concept, 1);
        assert_eq!(stats.by_track.len(), 1);
        assert_eq!(stats.by_track.get("Unknown"), Some(&4));
    }

    #[test]
    fn test_active_and_in_progress_share_counter() {
        assert_eq!(compute_project_stats(&[project("Active")]).active, 1);
        assert_eq!(compute_project_stats(&[project("In Progress")]).active, 1);
        assert_eq!(compute_project_stats(&[project("In Progress")]).in_prep, 0);
        assert_eq!(compute_project_stats(&[project("In Preparation")]).active, 0);
    }

    #[test]
    fn test_named_buckets_do_not_double_count() {
        let projects = vec![
            project("Active"),
            project("In Preparation"),
            project("Concept"),
            project("Archived"),
        ];

        let stats = compute_project_stats(&projects);

        assert_eq!(stats.active + stats.in_prep + stats.concept, 3);
        assert_eq!(stats.total, 4);
    }

    #[test]
    fn test_status_match_is_exact() {
        let projects = vec![
            project("active"),
            project("In Prep"),
            project("In Preparation "),
            project("Concepts"),
        ];

        let stats = compute_project_stats(&projects);

        assert_eq!(stats.active, 0);
        assert_eq!(stats.in_prep, 0);
        assert_eq!(stats.concept, 0);
    }

    #[test]
    fn test_project_stats_empty() {
        let stats = compute_project_stats(&[]);
        assert_eq!(stats, ProjectStats::default());
        assert!(stats.by_track.is_empty());
    }

    #[test]
    fn test_by_track_groups_missing_as_unknown() {
        let projects = vec![
            project("Active").with_track("Research / Theory"),
            project("Concept").with_track("Research / Theory"),
            project("Concept"),
        ];

        let stats = compute_project_stats(&projects);

        assert_eq!(stats.by_track.get("Research / Theory"), Some(&2));
        assert_eq!(stats.by_track.get("Unknown"), Some(&1));
    }

    #[test]
    fn test_health_summary_scenario() {
        let manifests = vec![manifest("Active"), manifest("Incubating"), manifest("Active")];

        let summary = compute_health_summary(&manifests);

        assert_eq!(summary.total_repos, 3);
        assert_eq!(summary.active_repos, 2);
        assert!((summary.health_percent - 200.0 / 3.0).abs() < 1e-9);
        assert_eq!(compute_health_tier(summary.health_percent), HealthTier::Degraded);
    }

    #[test]
    fn test_health_summary_empty() {
        let summary = compute_health_summary(&[]);
        assert_eq!(summary.total_repos, 0);
        assert_eq!(summary.active_repos, 0);
        assert_eq!(summary.health_percent, 0.0);
    }

    #[test]
    fn test_health_summary_ignores_in_progress() {
        let summary = compute_health_summary(&[manifest("In Progress"), manifest("Active")]);
        assert_eq!(summary.active_repos, 1);
        assert_eq!(summary.health_percent, 50.0);
    }

    #[test]
    fn test_health_tier_boundaries() {
        assert_eq!(compute_health_tier(100.0), HealthTier::Healthy);
        assert_eq!(compute_health_tier(80.0), HealthTier::Healthy);
        assert_eq!(compute_health_tier(79.999), HealthTier::Degraded);
        assert_eq!(compute_health_tier(79.9), HealthTier::Degraded);
        assert_eq!(compute_health_tier(50.0), HealthTier::Degraded);
        assert_eq!(compute_health_tier(49.999), HealthTier::Critical);
        assert_eq!(compute_health_tier(49.9), HealthTier::Critical);
        assert_eq!(compute_health_tier(0.0), HealthTier::Critical);
    }

    #[test]
    fn test_health_checks_order_and_url_sentinel() {
        let mut m = RepositoryManifest::new("nyquist", "Active");
        m.url_repo = Some("TBD".to_string());

        let checks = classify_health_checks(&m);
        let names: Vec<&str> = checks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["GitHub URL", "Spec Document", "Dashboard", "Status Updated"]
        );
        assert!(!checks[0].passed);

        m.url_repo = Some("https://example.com/x".to_string());
        assert!(classify_health_checks(&m)[0].passed);
    }

    #[test]
    fn test_health_checks_locations() {
        let mut m = RepositoryManifest::new("nyquist", "Active");
        let checks = classify_health_checks(&m);
        assert!(!checks[1].passed);
        assert!(!checks[2].passed);

        m.spec_location = Some(serde_json::json!("docs/SPEC.md"));
        m.dashboard_location = Some(serde_json::json!({"path": "dashboard/"}));
        let checks = classify_health_checks(&m);
        assert!(checks[1].passed);
        assert!(checks[2].passed);
    }

    #[test]
    fn test_status_updated_always_passes() {
        let bare = RepositoryManifest::new("x", "Archived");
        assert!(classify_health_checks(&bare)[3].passed);

        let mut full = RepositoryManifest::new("y", "Active");
        full.url_repo = Some("https://example.com/y".to_string());
        full.spec_location = Some(serde_json::json!("SPEC.md"));
        assert!(classify_health_checks(&full)[3].passed);
    }

    #[test]
    fn test_integration_stats() {
        let mut probes = Probes::new();
        probes.insert(probe::NYQUIST_STATUS.to_string(), true);

        let mut publications = PublicationStatus::default();
        publications.publications.insert(
            "workshop".to_string(),
            PublicationChannel {
                completion: Some(0.85),
                status: Some("Ready".to_string()),
            },
        );

        let stats = compute_integration_stats(&probes, &publications, 12);

        assert!(stats.connected);
        assert_eq!(stats.armada_runs, 12);
        assert_eq!(stats.workshop_ready, 0.85);
        assert_eq!(stats.arxiv_progress, 0.0);
    }

    #[test]
    fn test_integration_stats_defaults() {
        let stats = compute_integration_stats(&Probes::new(), &PublicationStatus::default(), 0);
        assert_eq!(stats, IntegrationStats::default());
    }

    #[test]
    fn test_integration_checks_missing_probe_fails() {
        let mut probes = Probes::new();
        probes.insert(probe::PERSONAS.to_string(), true);

        let checks = integration_checks(&probes);

        assert_eq!(checks.len(), 5);
        assert_eq!(checks[0].name, "NYQUIST_STATUS.json");
        assert!(!checks[0].passed);
        assert!(checks[1].passed);
        assert!(checks.iter().skip(2).all(|c| !c.passed));
    }

    #[test]
    fn test_sorted_track_counts() {
        let by_track: HashMap<String, usize> = [
            ("Biomedical Research".to_string(), 1),
            ("Research / Theory".to_string(), 3),
            ("Governance / Democracy".to_string(), 1),
        ]
        .into_iter()
        .collect();

        let sorted = sorted_track_counts(&by_track);

        assert_eq!(sorted[0], ("Research / Theory".to_string(), 3));
        assert_eq!(sorted[1].0, "Biomedical Research");
        assert_eq!(sorted[2].0, "Governance / Democracy");
    }

    #[test]
    fn test_status_distribution() {
        let projects = vec![
            project("Concept"),
            project("Active"),
            project("Concept"),
            project("Ready to Run"),
        ];

        let dist = status_distribution(&projects);

        assert_eq!(dist[0], ("Concept".to_string(), 2));
        assert_eq!(dist.len(), 3);
        assert_eq!(dist.iter().map(|(_, c)| c).sum::<usize>(), 4);
    }

    #[test]
    fn test_completion_percent() {
        assert_eq!(completion_percent(&[]), 0.0);
        let projects = vec![
            project("Complete"),
            project("Active"),
            project("In Progress"),
            project("Concept"),
        ];
        assert_eq!(completion_percent(&projects), 50.0);
    }

    #[test]
    fn test_in_flight_count() {
        let stats = compute_project_stats(&[
            project("Active"),
            project("In Preparation"),
            project("Concept"),
        ]);
        assert_eq!(in_flight_count(&stats), 2);
    }

    #[test]
    fn test_in_progress_count_excludes_active() {
        let projects = vec![
            project("Active"),
            project("In Progress"),
            project("In Preparation"),
            project("Concept"),
            project("Complete"),
        ];
        assert_eq!(in_progress_count(&projects), 2);
        assert_eq!(in_progress_count(&[]), 0);
    }

    #[test]
    fn test_roadmap_summary() {
        let manifests = vec![manifest("Active"), manifest("In Progress"), manifest("Active")];
        let projects = vec![
            project("Active"),
            project("In Preparation"),
            project("Concept"),
            project("Concept"),
        ];

        let summary = compute_roadmap_summary(&manifests, &projects);

        assert_eq!(
            summary,
            RoadmapSummary {
                repos_active: 2,
                projects_in_progress: 1,
                concepts_defined: 2,
            }
        );
        assert_eq!(compute_roadmap_summary(&[], &[]), RoadmapSummary::default());
    }

    #[test]
    fn test_filter_projects() {
        let projects = vec![
            project("Active").with_track("Research / Theory"),
            project("Concept").with_track("Research / Theory"),
            project("Active").with_track("Biomedical Research"),
            project("Active"),
        ];

        assert_eq!(filter_projects(&projects, None, None).len(), 4);
        assert_eq!(filter_projects(&projects, Some("Active"), None).len(), 3);
        assert_eq!(
            filter_projects(&projects, Some("Active"), Some("Research / Theory")).len(),
            1
        );
        assert_eq!(filter_projects(&projects, None, Some("Unknown")).len(), 0);
    }

    #[test]
    fn test_find_manifest() {
        let mut named = RepositoryManifest::new("nyquist", "Active");
        named.display_name = Some("Nyquist Consciousness".to_string());
        let manifests = vec![named, RepositoryManifest::new("pan-handlers", "Active")];

        assert_eq!(
            find_manifest(&manifests, "Nyquist Consciousness").map(|m| m.repo.as_str()),
            Some("nyquist")
        );
        assert_eq!(
            find_manifest(&manifests, "nyquist").map(|m| m.repo.as_str()),
            Some("nyquist")
        );
        assert!(find_manifest(&manifests, "missing").is_none());
    }

    fn status_strategy() -> impl Strategy<Value = String> {
        prop_oneof![
            Just("Active".to_string()),
            Just("Complete".to_string()),
            Just("Incubating".to_string()),
            Just("Concept".to_string()),
            Just("Archived".to_string()),
            Just("In Progress".to_string()),
            Just("In Preparation".to_string()),
            "[A-Za-z ]{0,12}",
        ]
    }

    fn project_strategy() -> impl Strategy<Value = FlagshipProject> {
        (
            status_strategy(),
            proptest::option::of(prop_oneof![
                Just("Research / Theory".to_string()),
                Just("Biomedical Research".to_string()),
                "[a-z]{1,6}",
            ]),
        )
            .prop_map(|(status, track)| {
                let mut p = FlagshipProject::new("p", status);
                p.track = track;
                p
            })
    }

    proptest! {
        #[test]
        fn prop_total_matches_length(projects in proptest::collection::vec(project_strategy(), 0..40)) {
            let stats = compute_project_stats(&projects);
            prop_assert_eq!(stats.total, projects.len());
        }

        #[test]
        fn prop_named_buckets_bounded_by_total(projects in proptest::collection::vec(project_strategy(), 0..40)) {
            let stats = compute_project_stats(&projects);
            prop_assert!(stats.active + stats.in_prep + stats.concept <= stats.total);
        }

        #[test]
        fn prop_by_track_sums_to_total(projects in proptest::collection::vec(project_strategy(), 0..40)) {
            let stats = compute_project_stats(&projects);
            prop_assert_eq!(stats.by_track.values().sum::<usize>(), stats.total);
        }

        #[test]
        fn prop_stats_are_deterministic(projects in proptest::collection::vec(project_strategy(), 0..40)) {
            let first = compute_project_stats(&projects);
            let second = compute_project_stats(&projects);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn prop_health_percent_in_range(statuses in proptest::collection::vec(status_strategy(), 0..40)) {
            let manifests: Vec<RepositoryManifest> = statuses
                .into_iter()
                .enumerate()
                .map(|(i, s)| RepositoryManifest::new(format!("repo-{}", i), s))
                .collect();
            let summary = compute_health_summary(&manifests);
            prop_assert!(summary.active_repos <= summary.total_repos);
            prop_assert!((0.0..=100.0).contains(&summary.health_percent));
        }

        #[test]
        fn prop_tier_is_monotonic(a in 0.0f64..=100.0, b in 0.0f64..=100.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(compute_health_tier(lo) <= compute_health_tier(hi));
        }
    }
}
