use url::{Origin, Url};

/// Extracts the host from a URL
///
/// This function retrieves the host portion of a URL and converts it to
/// lowercase. If the URL has no host (data URLs, mailto, etc.), it returns
/// None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use curlew::url::extract_host;
///
/// let url = Url::parse("https://Example.COM/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Derives the per-host throttling key from a URL
///
/// The key is the URL's scheme plus authority (`https://example.com`, with
/// a non-default port included as `https://example.com:8443`). Two URLs with
/// the same key contend for the same per-host concurrency slot.
///
/// Returns None for URLs with an opaque origin (no usable authority), which
/// the fetch stage treats as a permanent error.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use curlew::url::host_key;
///
/// let url = Url::parse("https://News.Example.com/a/b?c=d").unwrap();
/// assert_eq!(host_key(&url), Some("https://news.example.com".to_string()));
/// ```
pub fn host_key(url: &Url) -> Option<String> {
    match url.origin() {
        Origin::Tuple(..) => Some(url.origin().ascii_serialization().to_lowercase()),
        Origin::Opaque(_) => None,
    }
}
