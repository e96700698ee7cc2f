//! Registry-Harvest main entry point
//!
//! This is the command-line interface for the Registry-Harvest crawler.

use anyhow::Context;
use clap::Parser;
use registry_harvest::challenge::ConsoleSignal;
use registry_harvest::config::{compute_config_hash, parse_config, validate, Config};
use registry_harvest::crawler::{run_crawl, CrawlCoordinator};
use registry_harvest::driver::HttpDriver;
use registry_harvest::evidence::OutputLayout;
use registry_harvest::output::{print_report, summary_file_name, write_markdown_summary};
use registry_harvest::HarvestError;
use std::fs::{File, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Registry-Harvest: a resilient business-registry crawler
///
/// Registry-Harvest searches a business-registry portal for each configured
/// term, opens the first results, and saves every entity it can structure.
/// Pages it cannot structure are kept as raw markup for later review.
#[derive(Parser, Debug)]
#[command(name = "registry-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A resilient business-registry crawler", long_about = None)]
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

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,

    /// Search for this term instead of the configured ones (repeatable)
    #[arg(long = "term", value_name = "TERM")]
    terms: Vec<String>,

    /// Override the number of result rows visited per term
    #[arg(long, value_name = "N")]
    max_rows: Option<usize>,

    /// Override the output directory
    #[arg(long, value_name = "DIR")]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let content = std::fs::read_to_string(&cli.config)
        .with_context(|| format!("Failed to read configuration {}", cli.config.display()))?;
    let mut config = parse_config(&content)
        .with_context(|| format!("Failed to parse configuration {}", cli.config.display()))?;
    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid configuration")?;
    let config_hash = compute_config_hash(&cli.config)?;

    if cli.dry_run {
        setup_logging(cli.verbose, cli.quiet, None);
        handle_dry_run(&config, &config_hash);
        return Ok(());
    }

    let layout = OutputLayout::create(&config.output.directory).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output.directory.display()
        )
    })?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(layout.log_file())
        .with_context(|| format!("Failed to open session log {}", layout.log_file().display()))?;
    setup_logging(cli.verbose, cli.quiet, Some(log_file));

    tracing::info!(
        path = %cli.config.display(),
        hash = %config_hash,
        "Configuration loaded successfully"
    );

    handle_crawl(config, config_hash, layout).await
}

/// Replaces configured values with the ones given on the command line
fn apply_overrides(config: &mut Config, cli: &Cli) {
    if !cli.terms.is_empty() {
        config.crawl.search_terms = cli.terms.clone();
    }
    if let Some(max_rows) = cli.max_rows {
        config.crawl.max_rows_per_term = max_rows;
    }
    if let Some(output) = &cli.output {
        config.output.directory = output.clone();
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Console output always; the session log file when one is given.
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<File>) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("registry_harvest=info,warn"),
            1 => EnvFilter::new("registry_harvest=debug,info"),
            2 => EnvFilter::new("registry_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let file_layer = log_file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(Mutex::new(file))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false),
        )
        .with(file_layer)
        .init();
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config, config_hash: &str) {
    println!("=== Registry-Harvest Dry Run ===\n");

    println!("Portal:");
    println!("  Homepage: {}", config.portal.home_url);
    println!("  Search page: {}", config.portal.search_url);

    println!("\nCrawl:");
    println!("  Rows per term: {}", config.crawl.max_rows_per_term);
    println!(
        "  Settle delay: {}ms + up to {}ms jitter",
        config.timing.settle_ms, config.timing.jitter_ms
    );
    match config.timing.challenge_timeout() {
        Some(limit) => println!("  Challenge wait: up to {}s", limit.as_secs()),
        None => println!("  Challenge wait: until cleared"),
    }

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory.display());
    println!("  Filename limit: {}", config.output.filename_limit);

    println!("\nSearch Terms ({}):", config.crawl.search_terms.len());
    for term in &config.crawl.search_terms {
        println!("  - {}", term);
    }

    println!("\n✓ Configuration is valid (hash: {})", config_hash);
    println!(
        "✓ Would open up to {} detail pages",
        config.crawl.search_terms.len() * config.crawl.max_rows_per_term
    );
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: String, layout: OutputLayout) -> anyhow::Result<()> {
    let driver = HttpDriver::new(&config.browser.user_agent)?;
    let mut coordinator =
        CrawlCoordinator::new(&config, config_hash, driver, Box::new(ConsoleSignal::new()))?;

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    match run_crawl(&mut coordinator, shutdown).await {
        Ok(report) => {
            print_report(&report);

            let summary_path = layout.root().join(summary_file_name(&report.run_timestamp));
            match write_markdown_summary(&report, &summary_path) {
                Ok(()) => println!("\n✓ Summary written to: {}", summary_path.display()),
                Err(e) => tracing::error!(error = %e, "Failed to write markdown summary"),
            }

            tracing::info!(companies = report.total_successes, "Crawl completed");
            Ok(())
        }
        Err(HarvestError::Interrupted) => {
            println!(
                "\nCrawl interrupted. Records saved so far are in {}",
                layout.root().display()
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "Crawl failed");
            Err(e.into())
        }
    }
}
