//! Resolve stage: tracking URL → original source URL
//!
//! Every card carries a click-through URL on the feed site that redirects to
//! the real article. This stage follows those redirects for the whole batch
//! concurrently, bounded by the resolve limiter's global ceiling (there is no
//! per-host sub-limit here: every request starts at the same feed host).
//!
//! Only admission is throttled; all items are dispatched up front, and the
//! stage returns once every item is terminally resolved or failed.

use crate::limiter::HostLimiter;
use crate::pipeline::FeedItem;
use crate::retry::{
    classify_request_error, parse_retry_after, retryable_status, AttemptOutcome, RetryPolicy,
};
use crate::url::host_key;
use reqwest::header::{REFERER, RETRY_AFTER};
use reqwest::Client;
use std::sync::Arc;
use tokio::task::JoinSet;
use url::Url;

/// Resolves the whole batch, writing outcomes back into the items
///
/// Per-item failures are recorded on the item. The returned error is the
/// single fatal condition (a stage task died); the caller keeps the partial
/// results either way.
pub(crate) async fn resolve_stage(
    client: &Client,
    limiter: &Arc<HostLimiter>,
    policy: &RetryPolicy,
    referer: Option<&str>,
    items: &mut [FeedItem],
) -> Result<(), String> {
    let mut tasks: JoinSet<(usize, Result<Url, String>)> = JoinSet::new();
    let mut missing_url = Vec::new();

    for (index, item) in items.iter().enumerate() {
        if item.tracking_url.trim().is_empty() {
            missing_url.push(index);
            continue;
        }

        let client = client.clone();
        let limiter = Arc::clone(limiter);
        let policy = policy.clone();
        let referer = referer.map(str::to_string);
        let url = item.tracking_url.clone();

        tasks.spawn(async move {
            let result = resolve_one(&client, &limiter, &policy, referer.as_deref(), &url).await;
            (index, result)
        });
    }

    for index in missing_url {
        items[index].resolve_error = Some("card has no tracking URL".to_string());
    }

    let mut fatal = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Ok(resolved))) => {
                let item = &mut items[index];
                item.host = host_key(&resolved);
                item.resolved_url = Some(resolved);
            }
            Ok((index, Err(reason))) => {
                tracing::debug!("Resolve failed for {}: {}", items[index].tracking_url, reason);
                items[index].resolve_error = Some(reason);
            }
            Err(e) => {
                tracing::error!("Resolve task died: {}", e);
                fatal.get_or_insert_with(|| format!("resolve task died: {}", e));
            }
        }
    }

    match fatal {
        Some(reason) => Err(reason),
        None => Ok(()),
    }
}

/// Resolves one tracking URL under a global permit, retrying per policy
///
/// The permit is held across retries so backoff never admits extra traffic.
async fn resolve_one(
    client: &Client,
    limiter: &HostLimiter,
    policy: &RetryPolicy,
    referer: Option<&str>,
    url: &str,
) -> Result<Url, String> {
    let _permit = limiter
        .acquire_global()
        .await
        .map_err(|_| "cancelled before resolution started".to_string())?;

    let mut attempt = 1u32;
    loop {
        match resolve_attempt(client, referer, url).await {
            AttemptOutcome::Success(resolved) => return Ok(resolved),
            AttemptOutcome::Retryable { reason, retry_after } => {
                if !policy.should_retry(attempt) {
                    return Err(format!("{} (after {} attempts)", reason, attempt));
                }
                let delay = policy.delay(attempt, retry_after);
                tracing::debug!(
                    "Retrying resolve of {} in {:?} (attempt {}): {}",
                    url,
                    delay,
                    attempt,
                    reason
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            AttemptOutcome::Terminal { reason } => return Err(reason),
        }
    }
}

/// One resolution attempt: follow the redirect chain, classify the outcome
async fn resolve_attempt(
    client: &Client,
    referer: Option<&str>,
    url: &str,
) -> AttemptOutcome<Url> {
    let mut request = client.get(url);
    if let Some(referer) = referer {
        request = request.header(REFERER, referer);
    }

    match request.send().await {
        Ok(response) => {
            let status = response.status();

            if status.is_success() {
                return AttemptOutcome::Success(response.url().clone());
            }

            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .and_then(parse_retry_after);

            if retryable_status(status.as_u16()) {
                AttemptOutcome::Retryable {
                    reason: format!("HTTP {}", status.as_u16()),
                    retry_after,
                }
            } else {
                AttemptOutcome::Terminal {
                    reason: format!("HTTP {}", status.as_u16()),
                }
            }
        }
        Err(e) => classify_request_error(&e),
    }
}
