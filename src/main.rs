//! Wayback-Mirror main entry point
//!
//! This is the command-line interface for rebuilding an archived site snapshot.

use anyhow::Context;
use chrono::NaiveDateTime;
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use wayback_mirror::config::{load_config, override_output_directory, Config};
use wayback_mirror::crawler::{replay_url, run_archive};
use wayback_mirror::output::print_summary;

/// Wayback-Mirror: rebuilds an archived website as a browsable static site
///
/// Wayback-Mirror enumerates the captures of one site around a snapshot
/// timestamp, downloads pages and assets, and rewrites every reference so
/// the result works offline.
#[derive(Parser, Debug)]
#[command(name = "wayback-mirror")]
#[command(version = "1.0.0")]
#[command(about = "Rebuilds an archived website snapshot as a static site", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Override the output directory from the configuration
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Validate config and show what would be archived without fetching anything
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = load_config(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;

    if let Some(output) = cli.output {
        override_output_directory(&mut config, &output.to_string_lossy())
            .context("Invalid --output directory")?;
    }

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let summary = run_archive(config).await.context("Archive failed")?;
    if !cli.quiet {
        print_summary(&summary);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("wayback_mirror=info,warn"),
            1 => EnvFilter::new("wayback_mirror=debug,info"),
            2 => EnvFilter::new("wayback_mirror=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the validated configuration
fn handle_dry_run(config: &Config) {
    println!("=== Wayback-Mirror Dry Run ===\n");

    println!("Site:");
    println!("  Domain: {}", config.site.domain);
    println!("  Title: {}", config.site.display_title());
    println!("  Entry page: {}", config.site.entry_url);
    println!(
        "  Snapshot: {} ({})",
        config.site.snapshot,
        describe_snapshot(&config.site.snapshot)
    );
    println!(
        "  Entry capture: {}",
        replay_url(
            &config.archive.replay_endpoint,
            &config.site.snapshot,
            &config.site.entry_url
        )
    );

    println!("\nCrawler:");
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Asset workers: {}", config.crawler.asset_workers);
    println!("  Request timeout: {}s", config.crawler.request_timeout);
    println!(
        "  External assets: {}",
        if config.crawler.mirror_external_assets {
            "mirrored"
        } else {
            "left on the web"
        }
    );
    println!("  User agent: {}", config.user_agent.header_value());

    println!("\nArchive:");
    println!("  Index: {}", config.archive.index_endpoint);
    println!("  Replay: {}", config.archive.replay_endpoint);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);

    println!("\n✓ Configuration is valid");
}

/// Formats a snapshot timestamp for humans, padding missing time digits
fn describe_snapshot(snapshot: &str) -> String {
    NaiveDateTime::parse_from_str(&format!("{:0<14}", snapshot), "%Y%m%d%H%M%S")
        .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| "unparseable".to_string())
}
