//! Data loading for the federation dashboard.
//!
//! This module is the only place that touches the filesystem. It reads the
//! hall's JSON files, probes for the Nyquist integration paths, and hands
//! the aggregator a [`Snapshot`] of already-parsed records.

use crate::config::ResolvedPaths;
use crate::error::StatsError;
use crate::models::{
    probe, FlagshipProject, Probes, ProjectsFile, ProjectsMeta, PublicationStatus,
    RawManifest, RawProjectsFile, RepositoryManifest,
};
use moka::sync::Cache;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Sub-directory of the armada directory holding result files.
const ARMADA_RESULTS_DIR: &str = "armada_results";

/// Result of loading the manifests directory.
#[derive(Debug, Clone, Default)]
pub struct ManifestLoad {
    /// Manifests that parsed, in file-name order.
    pub manifests: Vec<RepositoryManifest>,
    /// One line per file that was skipped.
    pub warnings: Vec<String>,
}

/// Every input the aggregator needs, loaded at one point in time.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub projects: Vec<FlagshipProject>,
    pub meta: Option<ProjectsMeta>,
    pub manifests: Vec<RepositoryManifest>,
    pub publications: PublicationStatus,
    pub probes: Probes,
    pub armada_runs: usize,
    pub warnings: Vec<String>,
}

/// Reads the hall's data files.
#[derive(Debug, Clone)]
pub struct DataLoader {
    paths: ResolvedPaths,
}

impl DataLoader {
    /// Create a new loader over resolved paths.
    pub fn new(paths: ResolvedPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &ResolvedPaths {
        &self.paths
    }

    /// Load the flagship projects file.
    ///
    /// Returns `Ok(None)` when the file does not exist. Entries without a
    /// title are left in [`ProjectsFile::rejected`].
    pub fn load_projects(&self) -> Result<Option<ProjectsFile>, StatsError> {
        let path = &self.paths.projects_file;

        if !path.exists() {
            return Ok(None);
        }

        let raw: RawProjectsFile = read_json(path)?;
        let projects = ProjectsFile::from(raw);
        debug!(
            "Loaded {} flagship projects from {} ({} rejected)",
            projects.flagship_projects.len(),
            path.display(),
            projects.rejected.len()
        );

        Ok(Some(projects))
    }

    /// Load every `*.json` manifest directly inside the manifests directory.
    ///
    /// Files that fail to parse are skipped and reported as warnings.
    pub fn load_manifests(&self) -> ManifestLoad {
        let mut load = ManifestLoad::default();

        for path in json_files_in(&self.paths.manifests_dir) {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();

            let parsed = read_json::<RawManifest>(&path).and_then(RepositoryManifest::try_from);

            match parsed {
                Ok(manifest) => load.manifests.push(manifest),
                Err(e) => {
                    warn!("Failed to load {}: {}", name, e);
                    load.warnings.push(format!("Failed to load {}: {}", name, e));
                }
            }
        }

        load
    }

    /// Load the publication status, defaulting when the file is absent.
    pub fn load_publication_status(&self) -> Result<PublicationStatus, StatsError> {
        let path = &self.paths.publication_status;

        if !path.exists() {
            debug!("No publication status at {}", path.display());
            return Ok(PublicationStatus::default());
        }

        read_json(path)
    }

    /// Probe the integration paths for existence.
    pub fn probe_paths(&self) -> Probes {
        [
            (probe::NYQUIST_STATUS, &self.paths.nyquist_status),
            (probe::PERSONAS, &self.paths.personas_dir),
            (probe::EXPERIMENTS, &self.paths.experiments_dir),
            (probe::ARMADA_DIR, &self.paths.armada_dir),
            (probe::PUBLICATION_STATUS, &self.paths.publication_status),
        ]
        .into_iter()
        .map(|(key, path)| (key.to_string(), path.exists()))
        .collect()
    }

    /// Count armada result files; zero when the directory is absent.
    pub fn count_armada_results(&self) -> usize {
        json_files_in(&self.paths.armada_dir.join(ARMADA_RESULTS_DIR)).len()
    }

    /// Critical paths that do not exist, as `key: path` lines.
    pub fn validate_paths(&self) -> Vec<String> {
        self.paths
            .critical()
            .into_iter()
            .filter(|(_, path)| !path.exists())
            .map(|(key, path)| format!("{}: {}", key, path.display()))
            .collect()
    }

    /// Load everything, turning failures into warnings.
    pub fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::default();

        let projects_path = self.paths.projects_file.display();

        match self.load_projects() {
            Ok(Some(file)) => {
                for (index, e) in &file.rejected {
                    let msg = format!(
                        "Skipped flagship project #{} in {}: {}",
                        index, projects_path, e
                    );
                    warn!("{}", msg);
                    snapshot.warnings.push(msg);
                }
                snapshot.projects = file.flagship_projects;
                snapshot.meta = file.meta;
            }
            Ok(None) => {
                let msg = format!("projects.json not found at: {}", projects_path);
                warn!("{}", msg);
                snapshot.warnings.push(msg);
            }
            Err(e) => {
                let msg = format!("Failed to load {}: {}", projects_path, e);
                warn!("{}", msg);
                snapshot.warnings.push(msg);
            }
        }

        let manifests = self.load_manifests();
        snapshot.manifests = manifests.manifests;
        snapshot.warnings.extend(manifests.warnings);

        match self.load_publication_status() {
            Ok(publications) => snapshot.publications = publications,
            Err(e) => {
                let msg = format!(
                    "Failed to load {}: {}",
                    self.paths.publication_status.display(),
                    e
                );
                warn!("{}", msg);
                snapshot.warnings.push(msg);
            }
        }

        snapshot.probes = self.probe_paths();
        snapshot.armada_runs = self.count_armada_results();

        info!(
            "Loaded {} projects, {} manifests ({} warnings)",
            snapshot.projects.len(),
            snapshot.manifests.len(),
            snapshot.warnings.len()
        );

        snapshot
    }
}

/// A loader behind a time-boxed cache.
///
/// The whole [`Snapshot`] is cached under a single key, so one render
/// always sees inputs read at the same moment.
#[derive(Debug)]
pub struct DataStore {
    loader: DataLoader,
    cache: Cache<(), Arc<Snapshot>>,
}

impl DataStore {
    pub fn new(loader: DataLoader, ttl: Duration) -> Self {
        Self {
            loader,
            cache: Cache::builder().max_capacity(1).time_to_live(ttl).build(),
        }
    }

    /// The current snapshot, reloaded once the TTL has passed.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.cache.get_with((), || {
            debug!("Snapshot cache miss, loading");
            Arc::new(self.loader.snapshot())
        })
    }
}

/// Read and parse one JSON file.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StatsError> {
    let content = fs::read_to_string(path).map_err(|source| StatsError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&content).map_err(|source| StatsError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// `*.json` files directly inside `dir`, sorted by name.
fn json_files_in(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                debug!("Cannot read entry in {}: {}", dir.display(), e);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|ext| ext.to_str()) == Some("json"))
        .collect();

    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PathsConfig;
    use tempfile::TempDir;

    fn fixture_loader() -> DataLoader {
        let hall = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/nyquist/Pan_Handlers");
        let paths = PathsConfig {
            hall_root: hall,
            ..PathsConfig::default()
        };
        DataLoader::new(paths.resolve())
    }

    fn empty_loader() -> (TempDir, DataLoader) {
        let dir = TempDir::new().unwrap();
        let hall = dir.path().join("hall");
        fs::create_dir_all(&hall).unwrap();
        let paths = PathsConfig {
            hall_root: hall,
            ..PathsConfig::default()
        };
        (dir, DataLoader::new(paths.resolve()))
    }

    #[test]
    fn test_load_fixture_projects() {
        let projects = fixture_loader().load_projects().unwrap().unwrap();
        assert_eq!(projects.flagship_projects.len(), 5);
        assert!(projects
            .meta
            .and_then(|m| m.philosophy)
            .is_some());
    }

    #[test]
    fn test_load_fixture_manifests_skips_bad_files() {
        let load = fixture_loader().load_manifests();

        let repos: Vec<&str> = load.manifests.iter().map(|m| m.repo.as_str()).collect();
        assert_eq!(repos, vec!["cfa", "nyquist-consciousness", "pan-handlers"]);

        assert_eq!(load.warnings.len(), 1);
        assert!(load.warnings[0].contains("untitled.json"));
        assert!(load.warnings[0].contains("repo"));
    }

    #[test]
    fn test_fixture_probes_and_armada() {
        let loader = fixture_loader();
        let probes = loader.probe_paths();

        assert_eq!(probes.get(probe::NYQUIST_STATUS), Some(&true));
        assert_eq!(probes.get(probe::PERSONAS), Some(&true));
        assert_eq!(probes.get(probe::ARMADA_DIR), Some(&true));
        assert_eq!(loader.count_armada_results(), 3);
        assert!(loader.validate_paths().is_empty());
    }

    #[test]
    fn test_fixture_publication_status() {
        let status = fixture_loader().load_publication_status().unwrap();
        assert_eq!(status.completion("workshop"), 0.9);
        assert_eq!(status.completion("arxiv"), 0.4);
    }

    #[test]
    fn test_missing_files_degrade() {
        let (_dir, loader) = empty_loader();

        assert!(loader.load_projects().unwrap().is_none());
        assert!(loader.load_manifests().manifests.is_empty());
        assert_eq!(
            loader.load_publication_status().unwrap(),
            PublicationStatus::default()
        );
        assert_eq!(loader.count_armada_results(), 0);
        assert!(loader.probe_paths().values().all(|exists| !exists));

        let missing = loader.validate_paths();
        assert_eq!(missing.len(), 2);
        assert!(missing[0].starts_with("projects_file:"));
    }

    #[test]
    fn test_snapshot_collects_warnings() {
        let (dir, loader) = empty_loader();
        fs::write(dir.path().join("publication_status.json"), "not json").unwrap();

        let snapshot = loader.snapshot();

        assert!(snapshot.projects.is_empty());
        assert_eq!(snapshot.warnings.len(), 2);
        assert!(snapshot.warnings[0].contains("projects.json not found"));
        assert!(snapshot.warnings[1].starts_with("Failed to load "));
        assert!(snapshot.warnings[1].contains("publication_status.json"));
        assert!(snapshot.warnings[1].contains("Malformed JSON"));
    }

    #[test]
    fn test_malformed_projects_file_is_error() {
        let (_dir, loader) = empty_loader();
        fs::write(
            &loader.paths().projects_file,
            r#"{"flagship_projects": {"title": "not a list"}}"#,
        )
        .unwrap();

        assert!(matches!(
            loader.load_projects(),
            Err(StatsError::Json { .. })
        ));

        let snapshot = loader.snapshot();
        assert!(snapshot.projects.is_empty());
        assert!(snapshot.warnings[0].starts_with("Failed to load "));
        assert!(snapshot.warnings[0].contains("projects.json: Malformed JSON"));
    }

    #[test]
    fn test_armada_count_ignores_other_files() {
        let (_dir, loader) = empty_loader();
        let results = loader.paths().armada_dir.join(ARMADA_RESULTS_DIR);
        fs::create_dir_all(results.join("nested")).unwrap();
        fs::write(results.join("run_001.json"), "{}").unwrap();
        fs::write(results.join("notes.md"), "").unwrap();
        fs::write(results.join("nested/run_002.json"), "{}").unwrap();

        assert_eq!(loader.count_armada_results(), 1);
    }

    #[test]
    fn test_store_caches_until_ttl() {
        let (_dir, loader) = empty_loader();
        let manifests_dir = loader.paths().manifests_dir.clone();
        let store = DataStore::new(loader, Duration::from_millis(300));

        let first = store.snapshot();
        assert!(first.manifests.is_empty());

        fs::create_dir_all(&manifests_dir).unwrap();
        fs::write(manifests_dir.join("a.json"), r#"{"repo": "a", "status": "Active"}"#).unwrap();

        let cached = store.snapshot();
        assert!(Arc::ptr_eq(&first, &cached));
        assert!(cached.manifests.is_empty());

        std::thread::sleep(Duration::from_millis(600));
        let reloaded = store.snapshot();
        assert!(!Arc::ptr_eq(&first, &reloaded));
        assert_eq!(reloaded.manifests.len(), 1);
    }

    #[test]
    fn test_untitled_project_is_skipped_with_warning() {
        let (_dir, loader) = empty_loader();
        fs::write(
            &loader.paths().projects_file,
            r#"{"flagship_projects": [
                {"title": "A", "status": "Active"},
                {"title": "B", "status": "In Progress"},
                {"title": "C", "status": "Concept"},
                {"status": "Concept"}
            ]}"#,
        )
        .unwrap();

        let snapshot = loader.snapshot();

        assert_eq!(snapshot.projects.len(), 3);
        assert_eq!(snapshot.warnings.len(), 1);
        let warning = &snapshot.warnings[0];
        assert!(warning.starts_with("Skipped flagship project #3 in "));
        assert!(warning.contains("projects.json"));
        assert!(warning.contains("`title`"));
    }
}
