//! Site-Scout main entry point
//!
//! This is the command-line interface for the Site-Scout content auditor.

use anyhow::{bail, Context};
use clap::Parser;
use site_scout::config::{load_config_with_hash, Config};
use site_scout::crawler::{crawl, Seed};
use site_scout::output::format_report;
use site_scout::ScoutError;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Site-Scout: a sitemap-seeded content and keyword auditor
///
/// Site-Scout finds a site's sitemap, walks the site breadth-first within
/// its domain, and records each page's title, description, category and
/// keyword counts for later querying.
#[derive(Parser, Debug)]
#[command(name = "site-scout")]
#[command(version)]
#[command(about = "A sitemap-seeded content and keyword auditor", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Homepage URL to audit (prompted for if omitted)
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Comma-separated keywords and phrases (prompted for if omitted)
    #[arg(long, value_name = "LIST")]
    keywords: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and input, then exit without crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics for the latest run and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.stats {
        return handle_stats(&config);
    }

    let seed = read_seed(cli.url, cli.keywords)?;

    if cli.dry_run {
        handle_dry_run(&config, &seed);
        return Ok(());
    }

    handle_crawl(&config, &config_hash, &seed).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("site_scout=info,warn"),
            1 => EnvFilter::new("site_scout=debug,info"),
            2 => EnvFilter::new("site_scout=trace,debug"),
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

/// Builds the seed from flags, prompting on stdin for anything missing
fn read_seed(url: Option<String>, keywords: Option<String>) -> anyhow::Result<Seed> {
    let stdin = io::stdin();
    let mut input = stdin.lock();

    let url = match url {
        Some(url) => url,
        None => prompt(&mut input, "Enter the homepage URL: ")?,
    };
    let keywords = match keywords {
        Some(keywords) => keywords,
        None => prompt(
            &mut input,
            "Enter keywords/phrases separated by commas (e.g., keyword1, keyword2): ",
        )?,
    };

    let seed = Seed::new(&url, &keywords)
        .with_context(|| format!("Invalid homepage URL: {}", url.trim()))?;
    if seed.keywords.is_empty() {
        tracing::warn!("No keywords given; pages will be recorded with empty keyword profiles");
    }
    Ok(seed)
}

fn prompt(input: &mut impl BufRead, message: &str) -> anyhow::Result<String> {
    print!("{}", message);
    io::stdout().flush().context("Failed to write prompt")?;

    let mut line = String::new();
    input.read_line(&mut line).context("Failed to read input")?;
    Ok(line.trim().to_string())
}

/// Handles the --dry-run mode: shows what would be audited
fn handle_dry_run(config: &Config, seed: &Seed) {
    println!("=== Site-Scout Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Connect timeout: {}s", config.crawler.connect_timeout_secs);
    match config.crawler.deadline() {
        Some(deadline) => println!("  Crawl deadline: {}s", deadline.as_secs()),
        None => println!("  Crawl deadline: none"),
    }
    match config.crawler.page_limit() {
        Some(max) => println!("  Max pages: {}", max),
        None => println!("  Max pages: unbounded"),
    }

    println!("\nUser Agent: {}", config.user_agent.header_value());
    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    println!("\nAudit:");
    println!("  Homepage: {}", seed.homepage_url);
    println!("  Base domain: {}", seed.base_domain);
    println!("  Keywords ({}):", seed.keywords.len());
    for keyword in &seed.keywords {
        println!("    * {}", keyword);
    }
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    use site_scout::output::{load_statistics, print_statistics};
    use site_scout::storage::SqliteStorage;
    use std::path::Path;

    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .context("Failed to open database")?;

    match load_statistics(&storage).context("Failed to load statistics")? {
        Some(stats) => print_statistics(&stats),
        None => println!("No audit runs found in database"),
    }

    Ok(())
}

/// Handles the main audit operation
async fn handle_crawl(config: &Config, config_hash: &str, seed: &Seed) -> anyhow::Result<()> {
    tracing::info!(
        "Auditing {} (base domain {}) for {} keywords",
        seed.homepage_url,
        seed.base_domain,
        seed.keywords.len()
    );

    match crawl(config, config_hash, seed).await {
        Ok(outcome) => {
            print!("{}", format_report(outcome.run_id, &outcome.report));
            Ok(())
        }
        Err(ScoutError::SitemapNotFound { homepage }) => {
            bail!("No sitemap URL could be found for {}; nothing was crawled", homepage)
        }
        Err(e) => Err(e).context("Audit failed"),
    }
}
