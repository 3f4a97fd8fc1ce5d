//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::models::HealthTier;
use clap::Parser;
use std::path::PathBuf;

/// panstats - status rollups for the Pan Handlers federation
///
/// Reads the hall's manifests, flagship projects, and publication status
/// and renders the dashboard figures as a Markdown or JSON report.
///
/// Examples:
///   panstats --root ./Pan_Handlers
///   panstats --root ./Pan_Handlers --page health --fail-below degraded
///   panstats --page tracker --status "In Progress" --format json
///   panstats --page roadmap
///   panstats --watch 30 --output hall.md
///   panstats --check-paths
///   panstats --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Hall root directory (holds projects.json and manifests/)
    ///
    /// Overrides `paths.hall_root` from the config file.
    #[arg(short, long, value_name = "DIR", env = "PANSTATS_ROOT")]
    pub root: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .panstats.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Write the report to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Pages to render (comma-separated)
    #[arg(
        short,
        long,
        value_name = "PAGES",
        value_delimiter = ',',
        default_value = "all"
    )]
    pub page: Vec<Page>,

    /// Only show flagship projects with this exact status on the tracker page
    #[arg(long, value_name = "STATUS")]
    pub status: Option<String>,

    /// Only show flagship projects on this exact track on the tracker page
    #[arg(long, value_name = "TRACK")]
    pub track: Option<String>,

    /// Append a detail view of one repository (display name or repo id)
    #[arg(long, value_name = "NAME")]
    pub repo: Option<String>,

    /// Exit with code 2 when federation health is below this tier
    ///
    /// Values: healthy, degraded
    #[arg(long, value_name = "TIER")]
    pub fail_below: Option<TierThreshold>,

    /// Re-render every N seconds until interrupted
    ///
    /// Data is re-read once the cache TTL has passed.
    #[arg(long, value_name = "SECS")]
    pub watch: Option<u64>,

    /// Print every configured path and whether it exists, then exit
    #[arg(long)]
    pub check_paths: bool,

    /// Generate a default .panstats.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Dashboard page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, clap::ValueEnum)]
pub enum Page {
    /// Federation overview
    Overview,
    /// Repository health checks
    Health,
    /// Flagship project tracker
    Tracker,
    /// Nyquist integration
    Integration,
    /// Cross-repository roadmap
    Roadmap,
    /// Every page
    All,
}

impl Page {
    /// Concrete pages in display order, with `All` expanded and duplicates removed.
    pub fn expand(pages: &[Page]) -> Vec<Page> {
        let mut expanded: Vec<Page> = if pages.is_empty() || pages.contains(&Page::All) {
            vec![
                Page::Overview,
                Page::Health,
                Page::Tracker,
                Page::Integration,
                Page::Roadmap,
            ]
        } else {
            pages.to_vec()
        };

        expanded.sort();
        expanded.dedup();
        expanded
    }
}

/// Health threshold for --fail-below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum TierThreshold {
    Healthy,
    Degraded,
}

impl From<TierThreshold> for HealthTier {
    fn from(threshold: TierThreshold) -> Self {
        match threshold {
            TierThreshold::Healthy => HealthTier::Healthy,
            TierThreshold::Degraded => HealthTier::Degraded,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if self.watch == Some(0) {
            return Err("Watch interval must be at least 1 second".to_string());
        }

        if self.watch.is_some() && self.fail_below.is_some() {
            return Err("Cannot use --fail-below together with --watch".to_string());
        }

        if let Some(ref root) = self.root {
            if !root.exists() {
                return Err(format!("Hall root does not exist: {}", root.display()));
            }
            if !root.is_dir() {
                return Err(format!("Hall root is not a directory: {}", root.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// The pages to render.
    pub fn pages(&self) -> Vec<Page> {
        Page::expand(&self.page)
    }
}
