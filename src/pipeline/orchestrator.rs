//! Pipeline orchestration
//!
//! The orchestrator owns the limiters and the item collection for one run
//! and drives the stages in order: resolve every tracking URL, fetch every
//! resolved source page, clean every fetched text. Each stage finishes for
//! the whole batch before the next one starts, and the final report lists
//! every input item in input order with its best-known state.
//!
//! Per-item failures never abort a run. The only fatal conditions are an
//! HTTP client that cannot be built and a stage task that dies; both leave
//! the partial results intact and surface a single fatal reason.

use crate::cards::CardRecord;
use crate::cleaning::TextCleaner;
use crate::config::Config;
use crate::limiter::HostLimiter;
use crate::pipeline::fetcher::{build_http_client, fetch_stage};
use crate::pipeline::resolver::resolve_stage;
use crate::pipeline::FeedItem;
use crate::retry::RetryPolicy;
use crate::CurlewError;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Outcome of one pipeline run
///
/// `items` parallels the input batch: same length, same order, no drops.
#[derive(Debug)]
pub struct PipelineReport {
    /// Every input item with its final state
    pub items: Vec<FeedItem>,

    /// The single fatal condition, if the run could not complete normally
    pub fatal: Option<String>,
}

/// Handle for cancelling a running pipeline from another task
///
/// Cancelling closes both limiters: nothing new is admitted, in-flight
/// operations finish or fail, and the run returns its partial report.
#[derive(Clone)]
pub struct CancelHandle {
    resolve: Arc<HostLimiter>,
    fetch: Arc<HostLimiter>,
}

impl CancelHandle {
    /// Stops admitting new work; in-flight requests drain
    pub fn cancel(&self) {
        self.resolve.close();
        self.fetch.close();
    }

    /// Returns true once cancel() has been called
    pub fn is_cancelled(&self) -> bool {
        self.resolve.is_closed() && self.fetch.is_closed()
    }
}

/// Drives the resolve → fetch → clean stages over one batch
pub struct Orchestrator {
    config: Arc<Config>,
    client: Client,
    resolve_limiter: Arc<HostLimiter>,
    fetch_limiter: Arc<HostLimiter>,
    policy: RetryPolicy,
    cleaner: TextCleaner,
}

impl Orchestrator {
    /// Creates an orchestrator from a validated configuration
    ///
    /// Fails only if the HTTP client cannot be built; that is a fatal
    /// condition before any work starts.
    pub fn new(config: Config) -> Result<Self, CurlewError> {
        let client = build_http_client(&config.http).map_err(CurlewError::ClientBuild)?;

        // Resolution traffic all targets the feed host, so only the global
        // ceiling matters there; the per-host level is left wide.
        let resolve_limiter = Arc::new(HostLimiter::new(
            config.pipeline.resolve_concurrency,
            config.pipeline.resolve_concurrency,
        ));
        let fetch_limiter = Arc::new(HostLimiter::new(
            config.pipeline.fetch_concurrency,
            config.pipeline.per_host_concurrency,
        ));

        let policy = RetryPolicy::new(
            config.pipeline.max_attempts,
            Duration::from_millis(config.pipeline.base_backoff_ms),
            Duration::from_millis(config.pipeline.max_backoff_ms),
        );
        let cleaner = TextCleaner::from_config(&config.cleaning);

        Ok(Self {
            config: Arc::new(config),
            client,
            resolve_limiter,
            fetch_limiter,
            policy,
            cleaner,
        })
    }

    /// Returns a handle that can cancel this orchestrator's runs
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            resolve: Arc::clone(&self.resolve_limiter),
            fetch: Arc::clone(&self.fetch_limiter),
        }
    }

    /// Runs the full pipeline over a batch of cards
    ///
    /// Always returns a report covering every input item in input order.
    pub async fn run(&self, cards: Vec<CardRecord>) -> PipelineReport {
        let started = Instant::now();
        let mut items: Vec<FeedItem> = cards.into_iter().map(FeedItem::from_card).collect();
        let total = items.len();
        let mut fatal: Option<String> = None;

        tracing::info!(
            "Resolving {} tracking URLs (concurrency {})",
            total,
            self.config.pipeline.resolve_concurrency
        );
        let referer = if self.config.feed.referer.is_empty() {
            None
        } else {
            Some(self.config.feed.referer.as_str())
        };
        if let Err(reason) = resolve_stage(
            &self.client,
            &self.resolve_limiter,
            &self.policy,
            referer,
            &mut items,
        )
        .await
        {
            fatal.get_or_insert(reason);
        }

        // Every item must leave the stage terminal, even if a task died
        for item in items.iter_mut() {
            if item.resolved_url.is_none() && item.resolve_error.is_none() {
                item.resolve_error =
                    Some("resolve stage ended before this item completed".to_string());
            }
        }

        let resolved = items.iter().filter(|item| item.is_resolved()).count();
        tracing::info!(
            "Resolved {}/{} items in {:.1?}",
            resolved,
            total,
            started.elapsed()
        );

        tracing::info!(
            "Fetching {} source pages (global {}, per-host {})",
            resolved,
            self.config.pipeline.fetch_concurrency,
            self.config.pipeline.per_host_concurrency
        );
        let fetch_started = Instant::now();
        if let Err(reason) = fetch_stage(
            &self.client,
            &self.fetch_limiter,
            &self.policy,
            &self.config.http,
            &self.config.feed,
            &mut items,
        )
        .await
        {
            fatal.get_or_insert(reason);
        }

        for item in items.iter_mut() {
            if item.is_resolved() && item.raw_text.is_none() && item.fetch_error.is_none() {
                item.fetch_error =
                    Some("fetch stage ended before this item completed".to_string());
            }
        }

        tracing::info!(
            "Fetch stage done across {} hosts in {:.1?}",
            self.fetch_limiter.known_hosts(),
            fetch_started.elapsed()
        );

        // Cleaning is pure and cheap; one pass over the batch
        for item in items.iter_mut() {
            if let Some(raw) = item.raw_text.take() {
                item.text = Some(self.cleaner.clean(&raw));
            }
        }

        if let Some(reason) = &fatal {
            tracing::error!("Run ended with fatal condition: {}", reason);
        }
        tracing::info!(
            "Pipeline finished: {} items in {:.1?}",
            total,
            started.elapsed()
        );

        PipelineReport { items, fatal }
    }
}

/// Runs a complete enrichment pipeline
///
/// Convenience wrapper: builds an orchestrator from the configuration and
/// runs it over the batch.
///
/// # Example
///
/// ```no_run
/// use curlew::config::Config;
/// use curlew::cards::load_cards;
/// use curlew::pipeline::run_pipeline;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let cards = load_cards(Path::new("cards.json"))?;
/// let report = run_pipeline(Config::default(), cards).await?;
/// println!("{} items processed", report.items.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_pipeline(
    config: Config,
    cards: Vec<CardRecord>,
) -> Result<PipelineReport, CurlewError> {
    let orchestrator = Orchestrator::new(config)?;
    Ok(orchestrator.run(cards).await)
}
