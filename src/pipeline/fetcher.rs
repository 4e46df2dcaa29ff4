//! Fetch stage: resolved source URL → raw page content
//!
//! Fetches every successfully resolved item concurrently, with admission
//! bounded by the fetch limiter: a global ceiling plus a per-host ceiling
//! (default 1, so each origin sees at most one request at a time no matter
//! how much global headroom exists). Permits are acquired global-first then
//! host, the same fixed order everywhere.
//!
//! Items whose resolved URL points back at the feed site or at a blocked
//! host are skipped without a request and surface the no-text marker.
//! Identical resolved URLs are fetched once per run and share the result.

use crate::config::{FeedConfig, HttpConfig};
use crate::limiter::HostLimiter;
use crate::pipeline::parser::{parse_page, FetchedPage};
use crate::pipeline::FeedItem;
use crate::retry::{
    classify_request_error, parse_retry_after, retryable_status, AttemptOutcome, RetryPolicy,
};
use crate::url::{extract_host, matches_any_pattern, matches_host_pattern};
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::header::{ACCEPT_LANGUAGE, CONTENT_TYPE, RETRY_AFTER, USER_AGENT};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use url::Url;

/// Builds the HTTP client shared by the resolve and fetch stages
///
/// Redirects are followed up to 10 hops (the resolve stage depends on this
/// to reach the final article URL). The default user agent is the first pool
/// entry; fetch requests rotate through the pool per request.
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    let user_agent = config
        .user_agents
        .first()
        .cloned()
        .unwrap_or_else(|| "curlew/1.0".to_string());

    let mut default_headers = reqwest::header::HeaderMap::new();
    if let Ok(value) = config.accept_language.parse() {
        default_headers.insert(ACCEPT_LANGUAGE, value);
    }

    Client::builder()
        .user_agent(user_agent)
        .default_headers(default_headers)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(reqwest::redirect::Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Shared state for one fetch stage run
struct FetchContext {
    client: Client,
    limiter: Arc<HostLimiter>,
    policy: RetryPolicy,
    http: HttpConfig,
}

/// Fetches all eligible items, writing outcomes back into the items
///
/// Per-item failures are recorded on the item; the returned error is the
/// single fatal condition (a stage task died).
pub(crate) async fn fetch_stage(
    client: &Client,
    limiter: &Arc<HostLimiter>,
    policy: &RetryPolicy,
    http: &HttpConfig,
    feed: &FeedConfig,
    items: &mut [FeedItem],
) -> Result<(), String> {
    let context = Arc::new(FetchContext {
        client: client.clone(),
        limiter: Arc::clone(limiter),
        policy: policy.clone(),
        http: http.clone(),
    });
    let cache: Arc<Mutex<HashMap<String, FetchedPage>>> = Arc::new(Mutex::new(HashMap::new()));

    let mut tasks: JoinSet<(usize, Result<FetchedPage, String>)> = JoinSet::new();
    let mut no_host = Vec::new();
    let mut skipped = Vec::new();

    for (index, item) in items.iter().enumerate() {
        let Some(url) = item.resolved_url.clone() else {
            continue;
        };

        let (Some(host_key), Some(host)) = (item.host.clone(), extract_host(&url)) else {
            no_host.push(index);
            continue;
        };

        if !feed.feed_host.is_empty() && matches_host_pattern(&feed.feed_host, &host) {
            tracing::debug!("Skipping {}: resolved back to the feed site", url);
            skipped.push(index);
            continue;
        }

        if matches_any_pattern(&feed.blocked_hosts, &host) {
            tracing::debug!("Skipping {}: host {} is blocked", url, host);
            skipped.push(index);
            continue;
        }

        let context = Arc::clone(&context);
        let cache = Arc::clone(&cache);
        tasks.spawn(async move {
            let result = fetch_one(&context, &cache, &url, &host_key).await;
            (index, result)
        });
    }

    for index in no_host {
        items[index].fetch_error = Some("resolved URL has no usable host".to_string());
    }
    // Skipped items still satisfy the per-item contract: empty raw text
    // becomes the no-text marker in the cleaning stage.
    for index in skipped {
        items[index].raw_text = Some(String::new());
    }

    let mut fatal = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, Ok(page))) => {
                let item = &mut items[index];
                item.raw_text = Some(page.raw_text);
                item.image_url = page.image_url;
                item.page_title = page.page_title;
            }
            Ok((index, Err(reason))) => {
                tracing::debug!(
                    "Fetch failed for item {}: {}",
                    items[index].id,
                    reason
                );
                items[index].fetch_error = Some(reason);
            }
            Err(e) => {
                tracing::error!("Fetch task died: {}", e);
                fatal.get_or_insert_with(|| format!("fetch task died: {}", e));
            }
        }
    }

    match fatal {
        Some(reason) => Err(reason),
        None => Ok(()),
    }
}

/// Fetches one page under global+host permits, retrying per policy
///
/// The permit pair is held across retries so a backing-off task keeps its
/// host slot instead of letting another task hammer the same origin.
async fn fetch_one(
    context: &FetchContext,
    cache: &Mutex<HashMap<String, FetchedPage>>,
    url: &Url,
    host_key: &str,
) -> Result<FetchedPage, String> {
    if context.limiter.is_closed() {
        return Err("cancelled before fetch started".to_string());
    }

    // Spread dispatch so a batch does not land on the network as one burst
    let (jitter_min, jitter_max) = (
        context.http.dispatch_jitter_min_ms,
        context.http.dispatch_jitter_max_ms,
    );
    if jitter_max > 0 {
        let jitter = rand::thread_rng().gen_range(jitter_min..=jitter_max);
        tokio::time::sleep(Duration::from_millis(jitter)).await;
    }

    if let Some(page) = cache.lock().await.get(url.as_str()).cloned() {
        tracing::debug!("Reusing fetched page for {}", url);
        return Ok(page);
    }

    let _permit = context
        .limiter
        .acquire(host_key)
        .await
        .map_err(|_| "cancelled before fetch started".to_string())?;

    // Second look now that the permit is held: with per-host concurrency 1,
    // a same-URL task that was in flight during the first check has finished
    // and populated the cache by the time this task gets the host slot.
    if let Some(page) = cache.lock().await.get(url.as_str()).cloned() {
        tracing::debug!("Reusing fetched page for {}", url);
        return Ok(page);
    }

    let mut attempt = 1u32;
    let page = loop {
        match fetch_attempt(context, url).await {
            AttemptOutcome::Success(page) => break page,
            AttemptOutcome::Retryable { reason, retry_after } => {
                if !context.policy.should_retry(attempt) {
                    return Err(format!("{} (after {} attempts)", reason, attempt));
                }
                let delay = context.policy.delay(attempt, retry_after);
                tracing::debug!(
                    "Retrying fetch of {} in {:?} (attempt {}): {}",
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
    };

    cache
        .lock()
        .await
        .insert(url.as_str().to_string(), page.clone());

    Ok(page)
}

/// One fetch attempt: GET the page, classify the outcome, parse the body
async fn fetch_attempt(context: &FetchContext, url: &Url) -> AttemptOutcome<FetchedPage> {
    let mut request = context.client.get(url.clone());

    // Rotate through the browser pool; the client-level agent is only the
    // fallback for a misconfigured empty pool
    if let Some(user_agent) = context.http.user_agents.choose(&mut rand::thread_rng()) {
        request = request.header(USER_AGENT, user_agent);
    }

    match request.send().await {
        Ok(response) => {
            let status = response.status();

            if !status.is_success() {
                let retry_after = response
                    .headers()
                    .get(RETRY_AFTER)
                    .and_then(|value| value.to_str().ok())
                    .and_then(parse_retry_after);

                return if retryable_status(status.as_u16()) {
                    AttemptOutcome::Retryable {
                        reason: format!("HTTP {}", status.as_u16()),
                        retry_after,
                    }
                } else {
                    AttemptOutcome::Terminal {
                        reason: format!("HTTP {}", status.as_u16()),
                    }
                };
            }

            if let Some(length) = response.content_length() {
                if length > context.http.max_body_bytes {
                    return AttemptOutcome::Terminal {
                        reason: format!("response body too large ({} bytes)", length),
                    };
                }
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .unwrap_or("")
                .to_string();

            // PDFs, images, raw feeds: nothing to clean, not an error
            if !content_type.is_empty() && !content_type.contains("html") {
                tracing::debug!("Skipping body of {}: content type {}", url, content_type);
                return AttemptOutcome::Success(FetchedPage::empty());
            }

            match response.text().await {
                Ok(body) => AttemptOutcome::Success(parse_page(&body)),
                Err(e) => classify_request_error(&e),
            }
        }
        Err(e) => classify_request_error(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardRecord;
    use crate::config::Config;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ARTICLE: &str = r#"<html>
        <head><meta property="og:image" content="https://cdn.test/pic.jpg?w=640" /></head>
        <body><p>Body paragraph long enough to be interesting for a test.</p></body>
    </html>"#;

    fn fast_http() -> HttpConfig {
        let mut http = Config::default().http;
        http.dispatch_jitter_min_ms = 0;
        http.dispatch_jitter_max_ms = 0;
        http
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(10))
    }

    fn resolved_item(id: &str, url: &str) -> FeedItem {
        let mut item = FeedItem::from_card(CardRecord {
            id: id.to_string(),
            title: format!("Item {}", id),
            url: format!("https://feed.test/click/{}/", id),
            source: None,
            time_iso: None,
        });
        let url = Url::parse(url).unwrap();
        item.host = crate::url::host_key(&url);
        item.resolved_url = Some(url);
        item
    }

    async fn run_stage(items: &mut [FeedItem], feed: &FeedConfig) {
        let client = Client::new();
        let limiter = Arc::new(HostLimiter::new(20, 1));
        fetch_stage(&client, &limiter, &fast_policy(), &fast_http(), feed, items)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_fetch_extracts_page_content() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/article/1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(ARTICLE)
                    .insert_header("content-type", "text/html; charset=utf-8"),
            )
            .mount(&server)
            .await;

        let mut items = vec![resolved_item("1", &format!("{}/article/1", server.uri()))];
        run_stage(&mut items, &FeedConfig::default()).await;

        assert!(items[0].fetch_error.is_none());
        assert!(items[0]
            .raw_text
            .as_deref()
            .unwrap()
            .contains("Body paragraph"));
        assert_eq!(items[0].image_url.as_deref(), Some("https://cdn.test/pic.jpg"));
    }

    #[tokio::test]
    async fn test_fetch_404_keeps_resolved_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/article/1"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let mut items = vec![resolved_item("1", &format!("{}/article/1", server.uri()))];
        run_stage(&mut items, &FeedConfig::default()).await;

        assert_eq!(items[0].fetch_error.as_deref(), Some("HTTP 404"));
        assert!(items[0].is_resolved());
        assert!(items[0].raw_text.is_none());
    }

    #[tokio::test]
    async fn test_fetch_503_retry_then_success() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/article/1"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/article/1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(ARTICLE)
                    .insert_header("content-type", "text/html"),
            )
            .mount(&server)
            .await;

        let mut items = vec![resolved_item("1", &format!("{}/article/1", server.uri()))];
        run_stage(&mut items, &FeedConfig::default()).await;

        assert!(items[0].fetch_error.is_none());
        assert!(items[0].raw_text.is_some());
    }

    #[tokio::test]
    async fn test_fetch_non_html_yields_empty_text() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc.pdf"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("%PDF-1.4")
                    .insert_header("content-type", "application/pdf"),
            )
            .mount(&server)
            .await;

        let mut items = vec![resolved_item("1", &format!("{}/doc.pdf", server.uri()))];
        run_stage(&mut items, &FeedConfig::default()).await;

        assert!(items[0].fetch_error.is_none());
        assert_eq!(items[0].raw_text.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_fetch_skips_blocked_host_without_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let host = Url::parse(&server.uri()).unwrap().host_str().unwrap().to_string();
        let feed = FeedConfig {
            feed_host: String::new(),
            referer: String::new(),
            blocked_hosts: vec![host],
        };

        let mut items = vec![resolved_item("1", &format!("{}/anything", server.uri()))];
        run_stage(&mut items, &feed).await;

        assert!(items[0].fetch_error.is_none());
        assert_eq!(items[0].raw_text.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_fetch_skips_feed_host() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let host = Url::parse(&server.uri()).unwrap().host_str().unwrap().to_string();
        let feed = FeedConfig {
            feed_host: host,
            referer: String::new(),
            blocked_hosts: Vec::new(),
        };

        let mut items = vec![resolved_item("1", &format!("{}/news/12345", server.uri()))];
        run_stage(&mut items, &feed).await;

        assert_eq!(items[0].raw_text.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_fetch_shares_result_for_identical_urls() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/article/shared"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(ARTICLE)
                    .insert_header("content-type", "text/html"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/article/shared", server.uri());
        let mut items = vec![resolved_item("1", &url), resolved_item("2", &url)];
        run_stage(&mut items, &FeedConfig::default()).await;

        assert!(items[0].raw_text.is_some());
        assert_eq!(items[0].raw_text, items[1].raw_text);
    }

    #[tokio::test]
    async fn test_fetch_unresolved_item_untouched() {
        let mut item = resolved_item("1", "https://unused.test/");
        item.resolved_url = None;
        item.host = None;
        item.resolve_error = Some("HTTP 404".to_string());

        let mut items = vec![item];
        run_stage(&mut items, &FeedConfig::default()).await;

        assert!(items[0].fetch_error.is_none());
        assert!(items[0].raw_text.is_none());
    }

    #[tokio::test]
    async fn test_fetch_item_without_usable_host() {
        let mut item = resolved_item("1", "https://unused.test/");
        item.host = None;

        let mut items = vec![item];
        run_stage(&mut items, &FeedConfig::default()).await;

        assert_eq!(
            items[0].fetch_error.as_deref(),
            Some("resolved URL has no usable host")
        );
    }
}
