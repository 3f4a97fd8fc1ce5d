//! panstats - status rollups for the Pan Handlers federation
//!
//! A CLI tool that reads the hall's manifests, flagship projects, and
//! publication status and renders the dashboard figures as a report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (config, unreadable output, missing critical paths)
//!   2 - Federation health below the --fail-below threshold

mod analysis;
mod cli;
mod config;
mod error;
mod loader;
mod models;
mod report;

use anyhow::{Context, Result};
use cli::{Args, OutputFormat};
use config::{Config, CONFIG_FILE};
use loader::{DataLoader, DataStore};
use models::HealthTier;
use report::RenderOptions;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Initialize logging
    init_logging(&args);

    info!("panstats v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args) {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .panstats.toml.
fn handle_init_config() -> Result<()> {
    let path = std::path::Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Edit it to point at your hall and Nyquist directories.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// `RUST_LOG` takes precedence when set. Logs go to stderr so the report
/// on stdout stays clean.
fn init_logging(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level().as_str().to_lowercase()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the report workflow. Returns the process exit code.
fn run(args: Args) -> Result<i32> {
    // Load configuration
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let paths = config.paths.resolve();
    debug!("Resolved paths: {:?}", paths);

    let loader = DataLoader::new(paths);

    if args.check_paths {
        return Ok(handle_check_paths(&loader));
    }

    for missing in loader.validate_paths() {
        warn!("Missing critical path: {}", missing);
    }

    let store = DataStore::new(loader, Duration::from_secs(config.cache.ttl_seconds));

    let mut options = RenderOptions::new(args.pages(), &config.report);
    options.status = args.status.clone();
    options.track = args.track.clone();
    options.repo = args.repo.clone();

    match args.watch {
        Some(interval) => run_watch(&args, &config, &store, &options, interval),
        None => {
            let tier = render_once(&args, &config, &store, &options)?;
            Ok(check_threshold(&args, tier))
        }
    }
}

/// Render one report from the store and emit it. Returns the health tier.
fn render_once(
    args: &Args,
    config: &Config,
    store: &DataStore,
    options: &RenderOptions,
) -> Result<HealthTier> {
    let snapshot = store.snapshot();
    let dashboard = report::build_report(&snapshot, &config.report);

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&dashboard)?,
        OutputFormat::Markdown => report::generate_markdown_report(&dashboard, options),
    };

    match config.general.output {
        Some(ref path) => {
            std::fs::write(path, &output)
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            info!("Report saved to: {}", path.display());
        }
        None => println!("{}", output),
    }

    info!(
        "Health {:.0}% ({}), {} repos, {} flagship projects",
        dashboard.health.health_percent,
        dashboard.tier,
        dashboard.health.total_repos,
        dashboard.project_stats.total
    );

    Ok(dashboard.tier)
}

/// Handle --watch: re-render on an interval until interrupted.
fn run_watch(
    args: &Args,
    config: &Config,
    store: &DataStore,
    options: &RenderOptions,
    interval: u64,
) -> Result<i32> {
    info!(
        "Watching every {}s (cache TTL {}s); press Ctrl-C to stop",
        interval, config.cache.ttl_seconds
    );

    loop {
        render_once(args, config, store, options)?;
        std::thread::sleep(Duration::from_secs(interval));
    }
}

/// Handle --check-paths: list configured paths, report missing critical ones.
fn handle_check_paths(loader: &DataLoader) -> i32 {
    println!("\n=== PANSTATS CONFIGURATION ===");
    println!("All Paths:");
    for (key, path) in loader.paths().entries() {
        let exists = if path.exists() { "✓" } else { "✗" };
        println!("  {} {}: {}", exists, key, path.display());
    }

    let missing = loader.validate_paths();
    if missing.is_empty() {
        println!("\n✓ All critical paths exist");
        0
    } else {
        println!("\n⚠️  WARNING: Missing critical paths:");
        for path in &missing {
            println!("  - {}", path);
        }
        1
    }
}

/// Compare the health tier against --fail-below.
fn check_threshold(args: &Args, tier: HealthTier) -> i32 {
    if let Some(threshold) = args.fail_below {
        let required = HealthTier::from(threshold);
        if tier < required {
            eprintln!(
                "\n⛔ Federation health is {} (below {}). Failing (exit code 2).",
                tier, required
            );
            return 2;
        }
    }

    0
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    // Try default location
    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
