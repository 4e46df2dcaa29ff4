//! Curlew main entry point
//!
//! Command-line interface for the feed-card enrichment pipeline.

use anyhow::Context;
use clap::Parser;
use curlew::cards::load_cards;
use curlew::config::{default_config, load_config_with_hash, Config};
use curlew::output::{print_statistics, JsonFileSink, PipelineStats, RecordSink};
use curlew::pipeline::Orchestrator;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Curlew: a feed-card enrichment pipeline
///
/// Curlew takes the card records extracted from a news feed, resolves each
/// card's tracking redirect to its original source URL, fetches the source
/// pages under global and per-host concurrency limits, cleans the extracted
/// text, and writes the enriched record set for delivery.
#[derive(Parser, Debug)]
#[command(name = "curlew")]
#[command(version = "1.0.0")]
#[command(about = "Enrich feed cards with resolved URLs and cleaned source text", long_about = None)]
struct Cli {
    /// Path to the JSON card records produced by the extraction step
    #[arg(short, long, value_name = "CARDS")]
    input: PathBuf,

    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Write the output records to this path instead of the configured one
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate configuration and input, show what would run, and exit
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) =
                load_config_with_hash(path).context("failed to load configuration")?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            default_config().context("failed to build default configuration")?
        }
    };

    if let Some(path) = &cli.output {
        config.output.records_path = path.display().to_string();
    }

    let cards = load_cards(&cli.input)
        .with_context(|| format!("failed to load cards from {}", cli.input.display()))?;
    tracing::info!("Loaded {} cards from {}", cards.len(), cli.input.display());

    if cli.dry_run {
        handle_dry_run(&config, cards.len());
        return Ok(());
    }

    let orchestrator = Orchestrator::new(config.clone())?;

    // A single interrupt stops admitting new requests; in-flight ones drain
    // and the partial record set is still written.
    let cancel = orchestrator.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, draining in-flight requests");
            cancel.cancel();
        }
    });

    let report = orchestrator.run(cards).await;

    let sink = JsonFileSink::new(&config.output.records_path);
    sink.deliver(&report.items)
        .context("failed to write output records")?;

    if !cli.quiet {
        let stats = PipelineStats::from_items(&report.items);
        print_statistics(&stats);
    }

    if let Some(reason) = report.fatal {
        anyhow::bail!("pipeline ended with fatal condition: {}", reason);
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("curlew=info,warn"),
            1 => EnvFilter::new("curlew=debug,info"),
            2 => EnvFilter::new("curlew=trace,debug"),
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

/// Handles the --dry-run mode: validates inputs and shows what would run
fn handle_dry_run(config: &Config, card_count: usize) {
    println!("=== Curlew Dry Run ===\n");

    println!("Pipeline:");
    println!("  Resolve concurrency: {}", config.pipeline.resolve_concurrency);
    println!("  Fetch concurrency: {}", config.pipeline.fetch_concurrency);
    println!("  Per-host concurrency: {}", config.pipeline.per_host_concurrency);
    println!("  Max attempts: {}", config.pipeline.max_attempts);
    println!(
        "  Backoff: {}ms base, {}ms cap",
        config.pipeline.base_backoff_ms, config.pipeline.max_backoff_ms
    );

    println!("\nHTTP:");
    println!("  Request timeout: {}s", config.http.request_timeout_secs);
    println!("  Connect timeout: {}s", config.http.connect_timeout_secs);
    println!("  Max body bytes: {}", config.http.max_body_bytes);
    println!("  User agents in pool: {}", config.http.user_agents.len());

    println!("\nFeed rules:");
    if config.feed.feed_host.is_empty() {
        println!("  Feed host: (none)");
    } else {
        println!("  Feed host: {}", config.feed.feed_host);
    }
    println!("  Blocked hosts ({}):", config.feed.blocked_hosts.len());
    for pattern in &config.feed.blocked_hosts {
        println!("    - {}", pattern);
    }

    println!("\nCleaning:");
    println!(
        "  Text budget: {} chars, {} lines (minimum {} chars)",
        config.cleaning.max_text_chars,
        config.cleaning.max_text_lines,
        config.cleaning.min_text_chars
    );
    println!("  Junk patterns: {}", config.cleaning.junk_patterns.len());

    println!("\nOutput:");
    println!("  Records: {}", config.output.records_path);

    println!("\n✓ Configuration is valid");
    println!("✓ Would process {} cards", card_count);
}
