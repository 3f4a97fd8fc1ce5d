//! Markdown and JSON dashboard generation.
//!
//! The aggregator computes every figure once in [`build_report`]; the
//! section generators below only format those typed outputs.

use crate::analysis::{
    classify_health_checks, completion_percent, compute_health_summary, compute_health_tier,
    compute_integration_stats, compute_project_stats, compute_roadmap_summary, filter_projects,
    find_manifest, in_flight_count, integration_checks, sorted_track_counts, status_distribution,
};
use crate::cli::Page;
use crate::config::ReportConfig;
use crate::loader::Snapshot;
use crate::models::{
    track_color, DashboardReport, FlagshipProject, HealthCheck, RepoHealth, RepositoryManifest,
    Status, SubProject,
};
use anyhow::Result;
use chrono::Utc;

/// What to render and how much of it.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub pages: Vec<Page>,
    /// Tracker filter on exact status.
    pub status: Option<String>,
    /// Tracker filter on exact track.
    pub track: Option<String>,
    /// Repository to show in the project view.
    pub repo: Option<String>,
    pub summary_max_chars: usize,
    pub max_tags: usize,
}

impl RenderOptions {
    pub fn new(pages: Vec<Page>, config: &ReportConfig) -> Self {
        Self {
            pages,
            status: None,
            track: None,
            repo: None,
            summary_max_chars: config.summary_max_chars,
            max_tags: config.max_tags,
        }
    }
}

/// Run every aggregation over a snapshot.
pub fn build_report(snapshot: &Snapshot, config: &ReportConfig) -> DashboardReport {
    let project_stats = compute_project_stats(&snapshot.projects);
    let health = compute_health_summary(&snapshot.manifests);

    let repos = snapshot
        .manifests
        .iter()
        .map(|m| RepoHealth {
            repo: m.repo.clone(),
            name: m.name().to_string(),
            status: m.status.clone(),
            color: m.status.color().to_string(),
            checks: classify_health_checks(m),
        })
        .collect();

    let tier = compute_health_tier(health.health_percent);

    let philosophy = snapshot
        .meta
        .as_ref()
        .and_then(|meta| meta.philosophy.clone())
        .unwrap_or_else(|| config.philosophy.clone());

    DashboardReport {
        title: config.title.clone(),
        philosophy,
        generated_at: Utc::now(),
        meta: snapshot.meta.clone(),
        tracks: sorted_track_counts(&project_stats.by_track),
        status_distribution: status_distribution(&snapshot.projects),
        completion_percent: completion_percent(&snapshot.projects),
        project_stats,
        tier,
        tier_color: tier.color().to_string(),
        health,
        repos,
        manifests: snapshot.manifests.clone(),
        projects: snapshot.projects.clone(),
        integration: compute_integration_stats(
            &snapshot.probes,
            &snapshot.publications,
            snapshot.armada_runs,
        ),
        integration_checks: integration_checks(&snapshot.probes),
        roadmap: compute_roadmap_summary(&snapshot.manifests, &snapshot.projects),
        publications: snapshot.publications.clone(),
        warnings: snapshot.warnings.clone(),
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(report: &DashboardReport, options: &RenderOptions) -> String {
    let mut output = String::new();

    // Title
    output.push_str(&format!("# 🍳 {}\n\n", report.title));
    output.push_str(&format!("> {}\n\n", report.philosophy));

    output.push_str(&generate_warnings_section(&report.warnings));

    for page in &options.pages {
        let section = match page {
            Page::Overview => generate_overview_section(report, options),
            Page::Health => generate_health_section(report),
            Page::Tracker => generate_tracker_section(report, options),
            Page::Integration => generate_integration_section(report),
            Page::Roadmap => generate_roadmap_section(report),
            Page::All => String::new(),
        };
        output.push_str(&section);
    }

    if let Some(ref name) = options.repo {
        output.push_str(&generate_project_view_section(&report.manifests, name));
    }

    output.push_str(&generate_footer(report));

    output
}

/// Generate the loader warnings section.
fn generate_warnings_section(warnings: &[String]) -> String {
    if warnings.is_empty() {
        return String::new();
    }

    let mut section = String::new();

    section.push_str("## ⚠️ Warnings\n\n");
    for warning in warnings {
        section.push_str(&format!("- {}\n", warning));
    }
    section.push('\n');

    section
}

/// Generate the overview page.
fn generate_overview_section(report: &DashboardReport, options: &RenderOptions) -> String {
    let mut section = String::new();

    section.push_str("## Overview\n\n");

    let tunnel = if report.integration.connected { "🟢" } else { "🔴" };
    section.push_str(
        "| Repos Connected | Active Repos | Flagship Projects | Active Projects | Workshop Ready | Nyquist Tunnel |\n",
    );
    section.push_str("|:---:|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | {} | {} |\n\n",
        report.health.total_repos,
        report.health.active_repos,
        report.project_stats.total,
        in_flight_count(&report.project_stats),
        format_fraction(report.integration.workshop_ready),
        tunnel
    ));

    // Connected repositories
    section.push_str("### Connected Repositories\n\n");
    if report.manifests.is_empty() {
        section.push_str("No repository manifests loaded. Add manifests to `manifests/`.\n\n");
    } else {
        for manifest in &report.manifests {
            section.push_str(&generate_repo_card(manifest, options));
        }
    }

    // Status distribution
    if !report.status_distribution.is_empty() {
        section.push_str("### Projects by Status\n\n");
        section.push_str("| Status | Projects |\n");
        section.push_str("|:---|:---:|\n");
        for (status, count) in &report.status_distribution {
            section.push_str(&format!("| {} | {} |\n", Status::new(status.as_str()).badge(), count));
        }
        section.push('\n');
    }

    section.push_str(&generate_tracks_table(&report.tracks));

    section
}

/// Generate a card for one repository.
fn generate_repo_card(manifest: &RepositoryManifest, options: &RenderOptions) -> String {
    let mut card = String::new();

    card.push_str(&format!(
        "#### {} `{}`\n\n",
        manifest.name(),
        manifest.status.badge()
    ));
    card.push_str(&format!(
        "- **Role:** {}\n",
        manifest.role.as_deref().unwrap_or("N/A")
    ));
    card.push_str(&format!(
        "- **Owner:** {}\n",
        manifest.owner.as_deref().unwrap_or("N/A")
    ));
    if let Some(url) = manifest.repo_url() {
        card.push_str(&format!("- **GitHub:** [{}]({})\n", manifest.repo, url));
    }

    let tags: Vec<String> = manifest
        .tags
        .iter()
        .take(options.max_tags)
        .map(|t| format!("`{}`", t))
        .collect();
    if !tags.is_empty() {
        card.push_str(&format!("- **Tags:** {}\n", tags.join(" ")));
    }

    let summary = manifest.summary.as_deref().unwrap_or("No description.");
    card.push_str(&format!(
        "\n{}\n\n",
        truncate(summary, options.summary_max_chars)
    ));

    card
}

/// Generate the by-track table.
fn generate_tracks_table(tracks: &[(String, usize)]) -> String {
    if tracks.is_empty() {
        return String::new();
    }

    let mut table = String::new();

    table.push_str("### Projects by Track\n\n");
    table.push_str("| Track | Projects | Colour |\n");
    table.push_str("|:---|:---:|:---:|\n");
    for (track, count) in tracks {
        table.push_str(&format!(
            "| {} | {} | `{}` |\n",
            track,
            count,
            track_color(track)
        ));
    }
    table.push('\n');

    table
}

/// Generate the federation health page.
fn generate_health_section(report: &DashboardReport) -> String {
    let mut section = String::new();

    section.push_str("## Federation Health\n\n");
    section.push_str("| Overall Health | Tier | Total Repos | Active |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {:.0}% | {} {} | {} | {} |\n\n",
        report.health.health_percent,
        report.tier.emoji(),
        report.tier,
        report.health.total_repos,
        report.health.active_repos
    ));

    section.push_str("### Repository Status\n\n");
    if report.repos.is_empty() {
        section.push_str("No repository manifests found.\n\n");
        return section;
    }

    for repo in &report.repos {
        section.push_str(&format!("#### {} — {}\n\n", repo.name, repo.status));
        section.push_str(&format_checks(&repo.checks, "⚠️"));
        section.push('\n');
    }

    section
}

/// Generate the flagship project tracker page.
fn generate_tracker_section(report: &DashboardReport, options: &RenderOptions) -> String {
    let mut section = String::new();
    let stats = &report.project_stats;

    section.push_str("## Project Tracker\n\n");
    section.push_str("| Total | Active | In Prep | Concept | Completion |\n");
    section.push_str("|:---:|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} | {:.0}% |\n\n",
        stats.total, stats.active, stats.in_prep, stats.concept, report.completion_percent
    ));

    let filtered = filter_projects(
        &report.projects,
        options.status.as_deref(),
        options.track.as_deref(),
    );

    if let Some(ref status) = options.status {
        section.push_str(&format!("*Status: {}*\n\n", status));
    }
    if let Some(ref track) = options.track {
        section.push_str(&format!("*Track: {}*\n\n", track));
    }

    if filtered.is_empty() {
        section.push_str("No projects match the selected filters.\n\n");
    } else {
        for project in filtered {
            section.push_str(&generate_project_block(project));
        }
    }

    section.push_str(&generate_tracks_table(&report.tracks));

    if let Some(ref meta) = report.meta {
        section.push_str(&format!(
            "*Last updated: {}*\n\n",
            meta.last_updated.as_deref().unwrap_or("Unknown")
        ));
    }

    section
}

/// Generate the block for one flagship project.
fn generate_project_block(project: &FlagshipProject) -> String {
    let mut block = String::new();

    block.push_str(&format!(
        "### {} `{}`\n\n",
        project.title,
        project.status.badge()
    ));

    if let Some(ref tagline) = project.tagline {
        block.push_str(&format!("*\"{}\"*\n\n", tagline));
    }

    block.push_str(&format!(
        "- **Track:** {}\n",
        project.track.as_deref().unwrap_or("TBD")
    ));
    block.push_str(&format!(
        "- **Lead:** {}\n",
        project.owner.as_deref().unwrap_or("TBD")
    ));
    block.push_str(&format!(
        "- **Current Phase:** {}\n\n",
        project.current_phase.as_deref().unwrap_or("N/A")
    ));

    block.push_str(&format!(
        "{}\n\n",
        project.summary.as_deref().unwrap_or("No summary available.")
    ));

    if let Some(ref why) = project.why_exists {
        block.push_str(&format!("**Why it exists:** {}\n\n", why));
    }

    if !project.milestones.is_empty() {
        block.push_str("**Milestones:**\n\n");
        for milestone in &project.milestones {
            block.push_str(&format!("- {}\n", milestone));
        }
        block.push('\n');
    }

    if let Some(ref next) = project.next_action {
        block.push_str(&format!("> **Next action:** {}\n\n", next));
    }

    if !project.nyquist_contribution.is_empty() {
        block.push_str("**Nyquist contribution:**\n\n");
        for item in &project.nyquist_contribution {
            block.push_str(&format!("- {}\n", item));
        }
        block.push('\n');
    }

    if let Some(ref vision) = project.vision {
        block.push_str(&format!("**Vision:** *{}*\n\n", vision));
    }

    block.push_str("---\n\n");

    block
}

/// Generate the detail view for one repository.
fn generate_project_view_section(manifests: &[RepositoryManifest], name: &str) -> String {
    let mut section = String::new();

    section.push_str("## 🔍 Project View\n\n");

    if manifests.is_empty() {
        section.push_str("No repositories loaded. Add manifests to `manifests/`.\n\n");
        return section;
    }

    let Some(manifest) = find_manifest(manifests, name) else {
        section.push_str(&format!("Repository not found: `{}`\n\n", name));
        return section;
    };

    section.push_str(&format!(
        "### {} `{}`\n\n",
        manifest.name(),
        manifest.status.badge()
    ));
    section.push_str(&format!(
        "- **Role:** {}\n",
        manifest.role.as_deref().unwrap_or("N/A")
    ));
    section.push_str(&format!(
        "- **Owner:** {}\n",
        manifest.owner.as_deref().unwrap_or("N/A")
    ));
    section.push_str(&format!(
        "- **Last Updated:** {}\n\n",
        manifest.last_updated.as_deref().unwrap_or("N/A")
    ));

    section.push_str(&format!(
        "{}\n\n",
        manifest.summary.as_deref().unwrap_or("No description available.")
    ));

    if !manifest.tags.is_empty() {
        let tags: Vec<String> = manifest.tags.iter().map(|t| format!("`{}`", t)).collect();
        section.push_str(&format!("**Tags:** {}\n\n", tags.join(" ")));
    }

    let mut links = Vec::new();
    if let Some(url) = manifest.repo_url() {
        links.push(format!("- 📂 [GitHub Repository]({})", url));
    }
    if let Some(url) = manifest.url_dashboard.as_deref().filter(|u| !u.is_empty()) {
        links.push(format!("- 📊 [Dashboard]({})", url));
    }
    if !links.is_empty() {
        section.push_str("#### Links\n\n");
        section.push_str(&links.join("\n"));
        section.push_str("\n\n");
    }

    if let Some(ref contact) = manifest.contact {
        section.push_str(&format!(
            "**Contact:** {}\n\n",
            contact.primary.as_deref().unwrap_or("N/A")
        ));
    }

    if let Some(ref pillars) = manifest.pillars {
        section.push_str("#### 🏛️ Pillars\n\n");
        section.push_str("| Purpose | Methods | Outputs |\n");
        section.push_str("|:---|:---|:---|\n");
        section.push_str(&format!(
            "| {} | {} | {} |\n\n",
            pillars.purpose.as_deref().unwrap_or("N/A"),
            pillars.methods.as_deref().unwrap_or("N/A"),
            pillars.outputs.as_deref().unwrap_or("N/A")
        ));
    }

    section.push_str("#### 📋 Projects\n\n");
    if manifest.projects.is_empty() {
        section.push_str("No projects defined in this repository's manifest.\n\n");
    } else {
        for project in &manifest.projects {
            section.push_str(&generate_sub_project(project));
        }
    }

    section
}

fn generate_sub_project(project: &SubProject) -> String {
    let mut block = String::new();
    let status = project.status.clone().unwrap_or_default();

    block.push_str(&format!(
        "- **{}** ({}) `{}`: {}\n",
        project.title.as_deref().unwrap_or("Untitled"),
        project.kind.as_deref().unwrap_or("Project"),
        status.badge(),
        project.summary.as_deref().unwrap_or("No description.")
    ));

    if let Some(links) = project.links.as_ref().filter(|l| !l.is_empty()) {
        for (label, link) in [
            ("Docs", &links.docs),
            ("Paper", &links.paper),
            ("Dashboard", &links.dashboard),
        ] {
            if let Some(link) = link {
                block.push_str(&format!("  - {}: `{}`\n", label, link));
            }
        }
    }

    block
}

/// Generate the Nyquist integration page.
fn generate_integration_section(report: &DashboardReport) -> String {
    let mut section = String::new();
    let stats = &report.integration;

    section.push_str("## Nyquist Integration\n\n");
    section.push_str("| Connected | Armada Runs | Workshop Ready | arXiv Progress |\n");
    section.push_str("|:---:|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} | {} |\n\n",
        if stats.connected { "Yes" } else { "No" },
        stats.armada_runs,
        format_fraction(stats.workshop_ready),
        format_fraction(stats.arxiv_progress)
    ));

    section.push_str("### Connection Status\n\n");
    section.push_str(&format_checks(&report.integration_checks, "❌"));
    section.push('\n');

    if !report.publications.publications.is_empty() {
        section.push_str("### Publications\n\n");
        section.push_str("| Channel | Completion | Status |\n");
        section.push_str("|:---|:---:|:---|\n");
        for (name, channel) in &report.publications.publications {
            section.push_str(&format!(
                "| {} | {} | {} |\n",
                name,
                format_fraction(channel.completion()),
                channel.status()
            ));
        }
        section.push('\n');
    }

    section
}

/// Longest next action shown on the roadmap.
const NEXT_ACTION_MAX_CHARS: usize = 50;

/// Generate the global roadmap page.
fn generate_roadmap_section(report: &DashboardReport) -> String {
    let mut section = String::new();

    section.push_str("## 🗺️ Global Roadmap\n\n");

    section.push_str("### 🌐 Cross-Repository Initiatives\n\n");
    if report.projects.is_empty() {
        section.push_str("No flagship projects loaded.\n\n");
    } else {
        for project in &report.projects {
            section.push_str(&format!(
                "- {} **{}**: {}\n",
                project.status.roadmap_icon(),
                project.title,
                project.track.as_deref().unwrap_or("N/A")
            ));
            section.push_str(&format!(
                "  - **Status:** {} | **Lead:** {} | **Next Action:** {}\n",
                project.status,
                project.owner.as_deref().unwrap_or("TBD"),
                truncate(
                    project.next_action.as_deref().unwrap_or("TBD"),
                    NEXT_ACTION_MAX_CHARS
                )
            ));
        }
        section.push('\n');
    }

    let summary = &report.roadmap;
    section.push_str("### 📈 Progress Summary\n\n");
    section.push_str("| Repos Active | Projects In Progress | Concepts Defined |\n");
    section.push_str("|:---:|:---:|:---:|\n");
    section.push_str(&format!(
        "| {} | {} | {} |\n\n",
        summary.repos_active, summary.projects_in_progress, summary.concepts_defined
    ));

    section
}

/// Generate the report footer.
fn generate_footer(report: &DashboardReport) -> String {
    let mut footer = String::new();

    footer.push_str("---\n\n");
    footer.push_str(&format!(
        "*Last refreshed: {}*\n",
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    footer
}

/// Generate a JSON report.
pub fn generate_json_report(report: &DashboardReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}

fn format_checks(checks: &[HealthCheck], fail_icon: &str) -> String {
    checks
        .iter()
        .map(|c| {
            let icon = if c.passed { "✅" } else { fail_icon };
            format!("- {} {}\n", icon, c.name)
        })
        .collect()
}

/// Format a `[0, 1]` fraction as a whole percentage, truncating.
fn format_fraction(fraction: f64) -> String {
    format!("{}%", (fraction * 100.0).trunc() as u32)
}

/// Cut `text` to `max` characters, marking the cut with an ellipsis.
fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() > max {
        let cut: String = text.chars().take(max).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
