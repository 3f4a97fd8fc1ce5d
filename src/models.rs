//! Data models for the federation dashboard.
//!
//! This module contains the records parsed from the hall's JSON files
//! (manifests, flagship projects, publication status) and the typed
//! outputs produced by the aggregator.

use crate::error::StatsError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Grouping key used for flagship projects with no track.
pub const UNKNOWN_TRACK: &str = "Unknown";

/// Sentinel meaning "repository URL not yet set".
pub const URL_PLACEHOLDER: &str = "TBD";

/// Names of the filesystem probes supplied to the aggregator.
pub mod probe {
    pub const NYQUIST_STATUS: &str = "nyquist_status";
    pub const PERSONAS: &str = "nyquist_personas";
    pub const EXPERIMENTS: &str = "nyquist_experiments";
    pub const ARMADA_DIR: &str = "s7_armada_dir";
    pub const PUBLICATION_STATUS: &str = "publication_status";
}

/// Well-known publication channels.
pub mod channel {
    pub const WORKSHOP: &str = "workshop";
    pub const ARXIV: &str = "arxiv";
}

/// Filesystem existence probes keyed by probe name.
pub type Probes = BTreeMap<String, bool>;

/// Status label of a repository or project.
///
/// This is an open set: the constants below are the labels the dashboard
/// knows how to style, and anything else is carried through unchanged and
/// rendered with the generic badge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Status(String);

impl Status {
    pub const ACTIVE: &'static str = "Active";
    pub const COMPLETE: &'static str = "Complete";
    pub const INCUBATING: &'static str = "Incubating";
    pub const CONCEPT: &'static str = "Concept";
    pub const ARCHIVED: &'static str = "Archived";
    pub const IN_PROGRESS: &'static str = "In Progress";
    pub const IN_PREPARATION: &'static str = "In Preparation";
    pub const UNKNOWN: &'static str = "Unknown";

    /// Creates a status from any label.
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// The status used when a record carries none.
    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Exact, case-sensitive comparison against a label.
    pub fn is(&self, label: &str) -> bool {
        self.0 == label
    }

    /// Returns the badge text shown next to a record.
    ///
    /// Labels without a badge of their own are shown as written.
    pub fn badge(&self) -> String {
        match self.0.as_str() {
            Self::ACTIVE => "ACTIVE".to_string(),
            Self::COMPLETE => "COMPLETE".to_string(),
            Self::INCUBATING => "INCUBATING".to_string(),
            Self::CONCEPT => "CONCEPT".to_string(),
            Self::ARCHIVED => "ARCHIVED".to_string(),
            Self::IN_PROGRESS => "IN PROGRESS".to_string(),
            Self::IN_PREPARATION => "IN PREP".to_string(),
            other => other.to_string(),
        }
    }

    /// Returns the palette colour for this status.
    pub fn color(&self) -> &'static str {
        match self.0.as_str() {
            Self::ACTIVE | Self::IN_PROGRESS => "#00ff41",
            Self::COMPLETE => "#2a9d8f",
            Self::INCUBATING => "#ffd700",
            Self::CONCEPT | Self::IN_PREPARATION => "#f4a261",
            _ => "#666666",
        }
    }

    /// Returns the roadmap marker: under way, done, or not started.
    pub fn roadmap_icon(&self) -> &'static str {
        match self.0.as_str() {
            Self::IN_PREPARATION | Self::IN_PROGRESS => "🟢",
            Self::COMPLETE => "✅",
            _ => "🟡",
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Status {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Returns the colour associated with a flagship track.
pub fn track_color(track: &str) -> &'static str {
    match track {
        "Research / Theory" => "#9b59b6",
        "Education / Healthcare" => "#3498db",
        "Governance / Democracy" => "#e74c3c",
        "Intelligence / Governance" => "#2a9d8f",
        "Biomedical Research" => "#27ae60",
        "Justice / Social Systems" => "#f4a261",
        _ => "#666666",
    }
}

/// The three pillars describing a repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Pillars {
    pub purpose: Option<String>,
    pub methods: Option<String>,
    pub outputs: Option<String>,
}

/// Contact block of a manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Contact {
    pub primary: Option<String>,
}

/// Links attached to a sub-project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectLinks {
    pub docs: Option<String>,
    pub paper: Option<String>,
    pub dashboard: Option<String>,
}

impl ProjectLinks {
    pub fn is_empty(&self) -> bool {
        self.docs.is_none() && self.paper.is_none() && self.dashboard.is_none()
    }
}

/// A project listed inside a repository manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SubProject {
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub status: Option<Status>,
    pub summary: Option<String>,
    pub links: Option<ProjectLinks>,
}

/// One repository manifest as it appears on disk, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawManifest {
    pub repo: Option<String>,
    pub display_name: Option<String>,
    pub status: Option<Status>,
    pub role: Option<String>,
    pub owner: Option<String>,
    pub tags: Option<Vec<String>>,
    pub summary: Option<String>,
    pub url_repo: Option<String>,
    pub url_dashboard: Option<String>,
    pub spec_location: Option<serde_json::Value>,
    pub dashboard_location: Option<serde_json::Value>,
    pub last_updated: Option<String>,
    pub contact: Option<Contact>,
    pub pillars: Option<Pillars>,
    pub projects: Option<Vec<SubProject>>,
}

/// A validated repository manifest.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositoryManifest {
    /// Repository identifier; the only required field.
    pub repo: String,
    pub display_name: Option<String>,
    pub status: Status,
    pub role: Option<String>,
    pub owner: Option<String>,
    pub tags: Vec<String>,
    pub summary: Option<String>,
    pub url_repo: Option<String>,
    pub url_dashboard: Option<String>,
    pub spec_location: Option<serde_json::Value>,
    pub dashboard_location: Option<serde_json::Value>,
    pub last_updated: Option<String>,
    pub contact: Option<Contact>,
    pub pillars: Option<Pillars>,
    pub projects: Vec<SubProject>,
}

impl RepositoryManifest {
    /// Display name, falling back to the repository identifier.
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.repo)
    }

    /// The repository URL, unless it is absent or the placeholder.
    pub fn repo_url(&self) -> Option<&str> {
        self.url_repo
            .as_deref()
            .filter(|url| !url.is_empty() && *url != URL_PLACEHOLDER)
    }
}

#[cfg(test)]
impl RepositoryManifest {
    /// Creates a manifest with only an identifier and a status.
    pub fn new(repo: impl Into<String>, status: impl Into<Status>) -> Self {
        Self::try_from(RawManifest {
            repo: Some(repo.into()),
            status: Some(status.into()),
            ..RawManifest::default()
        })
        .expect("repo is set")
    }
}

impl TryFrom<RawManifest> for RepositoryManifest {
    type Error = StatsError;

    fn try_from(raw: RawManifest) -> Result<Self, Self::Error> {
        let repo = non_blank(raw.repo).ok_or(StatsError::missing("repository manifest", "repo"))?;

        Ok(Self {
            repo,
            display_name: raw.display_name,
            status: raw.status.unwrap_or_default(),
            role: raw.role,
            owner: raw.owner,
            tags: raw.tags.unwrap_or_default(),
            summary: raw.summary,
            url_repo: raw.url_repo,
            url_dashboard: raw.url_dashboard,
            spec_location: raw.spec_location.filter(|v| !v.is_null()),
            dashboard_location: raw.dashboard_location.filter(|v| !v.is_null()),
            last_updated: raw.last_updated,
            contact: raw.contact,
            pillars: raw.pillars,
            projects: raw.projects.unwrap_or_default(),
        })
    }
}

/// A flagship project entry as it appears on disk, before validation.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawFlagshipProject {
    pub title: Option<String>,
    pub status: Option<Status>,
    pub track: Option<String>,
    pub owner: Option<String>,
    pub tagline: Option<String>,
    pub summary: Option<String>,
    pub why_exists: Option<String>,
    pub vision: Option<String>,
    pub next_action: Option<String>,
    pub current_phase: Option<String>,
    pub milestones: Option<Vec<String>>,
    pub nyquist_contribution: Option<Vec<String>>,
}

/// A validated flagship project.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagshipProject {
    pub title: String,
    pub status: Status,
    pub track: Option<String>,
    pub owner: Option<String>,
    pub tagline: Option<String>,
    pub summary: Option<String>,
    pub why_exists: Option<String>,
    pub vision: Option<String>,
    pub next_action: Option<String>,
    pub current_phase: Option<String>,
    pub milestones: Vec<String>,
    pub nyquist_contribution: Vec<String>,
}

impl FlagshipProject {
    /// Track used for grouping; absent tracks group under `"Unknown"`.
    pub fn track_key(&self) -> &str {
        self.track.as_deref().unwrap_or(UNKNOWN_TRACK)
    }
}

#[cfg(test)]
impl FlagshipProject {
    /// Creates a project with only a title and a status.
    pub fn new(title: impl Into<String>, status: impl Into<Status>) -> Self {
        Self::try_from(RawFlagshipProject {
            title: Some(title.into()),
            status: Some(status.into()),
            ..RawFlagshipProject::default()
        })
        .expect("title is set")
    }

    /// Sets the track.
    pub fn with_track(mut self, track: impl Into<String>) -> Self {
        self.track = Some(track.into());
        self
    }
}

impl TryFrom<RawFlagshipProject> for FlagshipProject {
    type Error = StatsError;

    fn try_from(raw: RawFlagshipProject) -> Result<Self, Self::Error> {
        let title = non_blank(raw.title).ok_or(StatsError::missing("flagship project", "title"))?;

        Ok(Self {
            title,
            status: raw.status.unwrap_or_default(),
            track: raw.track,
            owner: raw.owner,
            tagline: raw.tagline,
            summary: raw.summary,
            why_exists: raw.why_exists,
            vision: raw.vision,
            next_action: raw.next_action,
            current_phase: raw.current_phase,
            milestones: raw.milestones.unwrap_or_default(),
            nyquist_contribution: raw.nyquist_contribution.unwrap_or_default(),
        })
    }
}

/// The `meta` block of the projects file, passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectsMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub philosophy: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawProjectsFile {
    pub flagship_projects: Option<Vec<RawFlagshipProject>>,
    pub meta: Option<ProjectsMeta>,
}

/// The flagship projects collection.
///
/// Entries that fail validation are set aside in `rejected` with their
/// zero-based position; the rest of the file is still usable.
#[derive(Debug, Default)]
pub struct ProjectsFile {
    pub flagship_projects: Vec<FlagshipProject>,
    pub meta: Option<ProjectsMeta>,
    pub rejected: Vec<(usize, StatsError)>,
}

impl From<RawProjectsFile> for ProjectsFile {
    fn from(raw: RawProjectsFile) -> Self {
        let mut file = ProjectsFile {
            meta: raw.meta,
            ..ProjectsFile::default()
        };

        for (index, entry) in raw.flagship_projects.unwrap_or_default().into_iter().enumerate() {
            match FlagshipProject::try_from(entry) {
                Ok(project) => file.flagship_projects.push(project),
                Err(e) => file.rejected.push((index, e)),
            }
        }

        file
    }
}

/// Progress on one publication channel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicationChannel {
    pub completion: Option<f64>,
    pub status: Option<String>,
}

impl PublicationChannel {
    /// Completion in `[0, 1]`; absent or non-finite values read as zero.
    pub fn completion(&self) -> f64 {
        match self.completion {
            Some(c) if c.is_finite() => c.clamp(0.0, 1.0),
            _ => 0.0,
        }
    }

    /// Status text, empty when unknown.
    pub fn status(&self) -> &str {
        self.status.as_deref().unwrap_or("")
    }
}

/// Publication progress keyed by channel name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublicationStatus {
    pub publications: BTreeMap<String, PublicationChannel>,
}

impl PublicationStatus {
    /// Completion of a channel, `0.0` when absent.
    pub fn completion(&self, name: &str) -> f64 {
        self.publications
            .get(name)
            .map(PublicationChannel::completion)
            .unwrap_or(0.0)
    }
}

/// Summary figures over the flagship projects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectStats {
    /// Number of projects.
    pub total: usize,
    /// Projects that are `Active` or `In Progress`.
    pub active: usize,
    /// Projects that are `In Preparation`.
    pub in_prep: usize,
    /// Projects that are `Concept`.
    pub concept: usize,
    /// Project count per track. Key order is unspecified.
    pub by_track: HashMap<String, usize>,
}

/// Share of repositories that are active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthSummary {
    pub total_repos: usize,
    pub active_repos: usize,
    /// `active_repos / total_repos * 100`, or zero with no repositories.
    pub health_percent: f64,
}

/// Three-level classification of federation health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthTier {
    /// Below 50%
    Critical,
    /// 50% up to but excluding 80%
    Degraded,
    /// 80% and above
    Healthy,
}

impl fmt::Display for HealthTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HealthTier::Healthy => write!(f, "Healthy"),
            HealthTier::Degraded => write!(f, "Degraded"),
            HealthTier::Critical => write!(f, "Critical"),
        }
    }
}

impl HealthTier {
    /// Returns the palette colour for the tier.
    pub fn color(&self) -> &'static str {
        match self {
            HealthTier::Healthy => "#00ff41",
            HealthTier::Degraded => "#f4a261",
            HealthTier::Critical => "#e74c3c",
        }
    }

    /// Returns an emoji representation of the tier.
    pub fn emoji(&self) -> &'static str {
        match self {
            HealthTier::Healthy => "🟢",
            HealthTier::Degraded => "🟡",
            HealthTier::Critical => "🔴",
        }
    }
}

/// One named pass/fail check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub name: String,
    pub passed: bool,
}

impl HealthCheck {
    pub fn new(name: impl Into<String>, passed: bool) -> Self {
        Self {
            name: name.into(),
            passed,
        }
    }
}

/// Health checks for one repository manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoHealth {
    pub repo: String,
    pub name: String,
    pub status: Status,
    /// Palette colour of `status`.
    pub color: String,
    pub checks: Vec<HealthCheck>,
}

/// Connection figures for the Nyquist integration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegrationStats {
    pub connected: bool,
    pub armada_runs: usize,
    pub workshop_ready: f64,
    pub arxiv_progress: f64,
}

/// Headline figures for the roadmap page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadmapSummary {
    /// Repositories whose status is exactly `Active`.
    pub repos_active: usize,
    /// Flagship projects that are `In Preparation` or `In Progress`.
    pub projects_in_progress: usize,
    /// Flagship projects that are `Concept`.
    pub concepts_defined: usize,
}

/// Everything a dashboard render needs, computed once from a snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub title: String,
    pub philosophy: String,
    pub generated_at: DateTime<Utc>,
    pub meta: Option<ProjectsMeta>,
    pub project_stats: ProjectStats,
    /// `by_track` ordered by count, then name.
    pub tracks: Vec<(String, usize)>,
    pub status_distribution: Vec<(String, usize)>,
    pub completion_percent: f64,
    pub health: HealthSummary,
    pub tier: HealthTier,
    pub tier_color: String,
    pub repos: Vec<RepoHealth>,
    pub manifests: Vec<RepositoryManifest>,
    pub projects: Vec<FlagshipProject>,
    pub integration: IntegrationStats,
    pub integration_checks: Vec<HealthCheck>,
    pub roadmap: RoadmapSummary,
    pub publications: PublicationStatus,
    pub warnings: Vec<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
