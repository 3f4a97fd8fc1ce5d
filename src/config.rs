//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.panstats.toml` files. The resolved configuration is built once at
//! start-up and passed down explicitly.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name.
pub const CONFIG_FILE: &str = ".panstats.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Data file locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// Read cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Report settings.
    #[serde(default)]
    pub report: ReportConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Write the report here instead of stdout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PathBuf>,
}

/// Locations of the hall's data files.
///
/// `projects_file` and `manifests_dir` are relative to `hall_root`;
/// `repo_root` is relative to `hall_root` and the Nyquist paths are
/// relative to `repo_root`. Absolute paths are used as given.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_hall_root")]
    pub hall_root: PathBuf,

    #[serde(default = "default_repo_root")]
    pub repo_root: PathBuf,

    #[serde(default = "default_projects_file")]
    pub projects_file: PathBuf,

    #[serde(default = "default_manifests_dir")]
    pub manifests_dir: PathBuf,

    #[serde(default = "default_nyquist_status")]
    pub nyquist_status: PathBuf,

    #[serde(default = "default_personas_dir")]
    pub personas_dir: PathBuf,

    #[serde(default = "default_experiments_dir")]
    pub experiments_dir: PathBuf,

    #[serde(default = "default_armada_dir")]
    pub armada_dir: PathBuf,

    #[serde(default = "default_publication_status")]
    pub publication_status: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            hall_root: default_hall_root(),
            repo_root: default_repo_root(),
            projects_file: default_projects_file(),
            manifests_dir: default_manifests_dir(),
            nyquist_status: default_nyquist_status(),
            personas_dir: default_personas_dir(),
            experiments_dir: default_experiments_dir(),
            armada_dir: default_armada_dir(),
            publication_status: default_publication_status(),
        }
    }
}

fn default_hall_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_repo_root() -> PathBuf {
    PathBuf::from("..")
}

fn default_projects_file() -> PathBuf {
    PathBuf::from("projects.json")
}

fn default_manifests_dir() -> PathBuf {
    PathBuf::from("manifests")
}

fn default_nyquist_status() -> PathBuf {
    PathBuf::from("NYQUIST_STATUS.json")
}

fn default_personas_dir() -> PathBuf {
    PathBuf::from("personas")
}

fn default_experiments_dir() -> PathBuf {
    PathBuf::from("experiments")
}

fn default_armada_dir() -> PathBuf {
    PathBuf::from("experiments/temporal_stability/S7_ARMADA")
}

fn default_publication_status() -> PathBuf {
    PathBuf::from("publication_status.json")
}

/// Paths joined against their roots, ready for the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub hall_root: PathBuf,
    pub repo_root: PathBuf,
    pub projects_file: PathBuf,
    pub manifests_dir: PathBuf,
    pub nyquist_status: PathBuf,
    pub personas_dir: PathBuf,
    pub experiments_dir: PathBuf,
    pub armada_dir: PathBuf,
    pub publication_status: PathBuf,
}

impl PathsConfig {
    /// Join every path against its root.
    pub fn resolve(&self) -> ResolvedPaths {
        let hall_root = self.hall_root.clone();
        let repo_root = hall_root.join(&self.repo_root);

        ResolvedPaths {
            projects_file: hall_root.join(&self.projects_file),
            manifests_dir: hall_root.join(&self.manifests_dir),
            nyquist_status: repo_root.join(&self.nyquist_status),
            personas_dir: repo_root.join(&self.personas_dir),
            experiments_dir: repo_root.join(&self.experiments_dir),
            armada_dir: repo_root.join(&self.armada_dir),
            publication_status: repo_root.join(&self.publication_status),
            hall_root,
            repo_root,
        }
    }
}

impl ResolvedPaths {
    /// Every path with its config key, in display order.
    pub fn entries(&self) -> Vec<(&'static str, &Path)> {
        vec![
            ("hall_root", self.hall_root.as_path()),
            ("repo_root", self.repo_root.as_path()),
            ("projects_file", self.projects_file.as_path()),
            ("manifests_dir", self.manifests_dir.as_path()),
            ("nyquist_status", self.nyquist_status.as_path()),
            ("personas_dir", self.personas_dir.as_path()),
            ("experiments_dir", self.experiments_dir.as_path()),
            ("armada_dir", self.armada_dir.as_path()),
            ("publication_status", self.publication_status.as_path()),
        ]
    }

    /// Paths the dashboard cannot work without.
    pub fn critical(&self) -> Vec<(&'static str, &Path)> {
        vec![
            ("hall_root", self.hall_root.as_path()),
            ("projects_file", self.projects_file.as_path()),
            ("manifests_dir", self.manifests_dir.as_path()),
        ]
    }
}

/// Read cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long loaded data stays valid, in seconds.
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: default_ttl_seconds(),
        }
    }
}

fn default_ttl_seconds() -> u64 {
    60
}

/// Report generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Report heading.
    #[serde(default = "default_title")]
    pub title: String,

    /// Shown when the projects file carries no philosophy.
    #[serde(default = "default_philosophy")]
    pub philosophy: String,

    /// Longest summary shown before truncating.
    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,

    /// Maximum tags shown per repository.
    #[serde(default = "default_max_tags")]
    pub max_tags: usize,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            philosophy: default_philosophy(),
            summary_max_chars: default_summary_max_chars(),
            max_tags: default_max_tags(),
        }
    }
}

fn default_title() -> String {
    "Pan Handlers Federation".to_string()
}

fn default_philosophy() -> String {
    "Building better systems without waiting for institutions.".to_string()
}

fn default_summary_max_chars() -> usize {
    150
}

fn default_max_tags() -> usize {
    4
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref root) = args.root {
            self.paths.hall_root = root.clone();
        }

        if let Some(ref output) = args.output {
            self.general.output = Some(output.clone());
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
