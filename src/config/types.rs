use crate::cleaning::DEFAULT_JUNK_PATTERNS;
use serde::Deserialize;

/// Main configuration structure for Curlew
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub cleaning: CleaningConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            http: HttpConfig::default(),
            feed: FeedConfig::default(),
            cleaning: CleaningConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

/// Concurrency and retry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Concurrent redirect resolutions (global, no per-host sub-limit)
    #[serde(rename = "resolve-concurrency", default = "default_resolve_concurrency")]
    pub resolve_concurrency: usize,

    /// Concurrent page fetches across all hosts
    #[serde(rename = "fetch-concurrency", default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,

    /// Concurrent page fetches against a single host
    #[serde(rename = "per-host-concurrency", default = "default_per_host_concurrency")]
    pub per_host_concurrency: usize,

    /// Attempts per network operation, first try included
    #[serde(rename = "max-attempts", default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay before the first retry (milliseconds)
    #[serde(rename = "base-backoff-ms", default = "default_base_backoff_ms")]
    pub base_backoff_ms: u64,

    /// Upper bound on any single backoff delay (milliseconds)
    #[serde(rename = "max-backoff-ms", default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            resolve_concurrency: default_resolve_concurrency(),
            fetch_concurrency: default_fetch_concurrency(),
            per_host_concurrency: default_per_host_concurrency(),
            max_attempts: default_max_attempts(),
            base_backoff_ms: default_base_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

fn default_resolve_concurrency() -> usize {
    8
}

fn default_fetch_concurrency() -> usize {
    20
}

fn default_per_host_concurrency() -> usize {
    1
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_backoff_ms() -> u64 {
    500
}

fn default_max_backoff_ms() -> u64 {
    30_000
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    /// Whole-request timeout (seconds)
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Connection-establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs", default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Responses with a larger declared body are rejected
    #[serde(rename = "max-body-bytes", default = "default_max_body_bytes")]
    pub max_body_bytes: u64,

    /// Browser user-agent strings, one picked per fetch request
    #[serde(rename = "user-agents", default = "default_user_agents")]
    pub user_agents: Vec<String>,

    /// Accept-Language header sent with every request
    #[serde(rename = "accept-language", default = "default_accept_language")]
    pub accept_language: String,

    /// Lower bound of the random delay before each fetch dispatch (milliseconds)
    #[serde(rename = "dispatch-jitter-min-ms", default = "default_dispatch_jitter_min_ms")]
    pub dispatch_jitter_min_ms: u64,

    /// Upper bound of the random delay before each fetch dispatch (milliseconds)
    #[serde(rename = "dispatch-jitter-max-ms", default = "default_dispatch_jitter_max_ms")]
    pub dispatch_jitter_max_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            max_body_bytes: default_max_body_bytes(),
            user_agents: default_user_agents(),
            accept_language: default_accept_language(),
            dispatch_jitter_min_ms: default_dispatch_jitter_min_ms(),
            dispatch_jitter_max_ms: default_dispatch_jitter_max_ms(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_max_body_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_user_agents() -> Vec<String> {
    vec![
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36".to_string(),
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:124.0) Gecko/20100101 Firefox/124.0".to_string(),
        "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15".to_string(),
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/123.0.0.0 Safari/537.36".to_string(),
    ]
}

fn default_accept_language() -> String {
    "en-US,en;q=0.9".to_string()
}

fn default_dispatch_jitter_min_ms() -> u64 {
    600
}

fn default_dispatch_jitter_max_ms() -> u64 {
    1800
}

/// Feed-specific host rules
#[derive(Debug, Clone, Deserialize)]
pub struct FeedConfig {
    /// Host pattern of the feed site itself; items whose tracking redirect
    /// loops back to it are skipped with the no-text marker. Empty disables
    /// the rule.
    #[serde(rename = "feed-host", default)]
    pub feed_host: String,

    /// Referer header sent with resolve requests. Empty sends none.
    #[serde(default)]
    pub referer: String,

    /// Host patterns never fetched (items keep their resolved URL)
    #[serde(rename = "blocked-hosts", default)]
    pub blocked_hosts: Vec<String>,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            feed_host: String::new(),
            referer: String::new(),
            blocked_hosts: Vec::new(),
        }
    }
}

/// Text cleaning configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CleaningConfig {
    /// Character budget for cleaned text
    #[serde(rename = "max-text-chars", default = "default_max_text_chars")]
    pub max_text_chars: usize,

    /// Cleaned text under this length becomes the no-text marker
    #[serde(rename = "min-text-chars", default = "default_min_text_chars")]
    pub min_text_chars: usize,

    /// Maximum number of lines kept
    #[serde(rename = "max-text-lines", default = "default_max_text_lines")]
    pub max_text_lines: usize,

    /// Lines containing any of these substrings are dropped
    #[serde(rename = "junk-patterns", default = "default_junk_patterns")]
    pub junk_patterns: Vec<String>,
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            max_text_chars: default_max_text_chars(),
            min_text_chars: default_min_text_chars(),
            max_text_lines: default_max_text_lines(),
            junk_patterns: default_junk_patterns(),
        }
    }
}

fn default_max_text_chars() -> usize {
    6000
}

fn default_min_text_chars() -> usize {
    80
}

fn default_max_text_lines() -> usize {
    25
}

fn default_junk_patterns() -> Vec<String> {
    DEFAULT_JUNK_PATTERNS.iter().map(|s| s.to_string()).collect()
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the JSON record set written after a run
    #[serde(rename = "records-path", default = "default_records_path")]
    pub records_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            records_path: default_records_path(),
        }
    }
}

fn default_records_path() -> String {
    "out/records.json".to_string()
}
