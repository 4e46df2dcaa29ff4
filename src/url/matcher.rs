/// Checks if a host matches a pattern
///
/// This function supports two types of patterns:
/// 1. Exact match: "example.com" matches only "example.com"
/// 2. Wildcard match: "*.example.com" matches:
///    - "example.com" (the bare host)
///    - "news.example.com" (single subdomain)
///    - "api.v2.example.com" (nested subdomains)
///
/// Hosts are expected to already be lowercase; the comparison itself is
/// case-sensitive.
///
/// # Examples
///
/// ```
/// use curlew::url::matches_host_pattern;
///
/// assert!(matches_host_pattern("example.com", "example.com"));
/// assert!(!matches_host_pattern("example.com", "other.com"));
///
/// assert!(matches_host_pattern("*.example.com", "example.com"));
/// assert!(matches_host_pattern("*.example.com", "news.example.com"));
/// assert!(!matches_host_pattern("*.example.com", "example.org"));
/// ```
pub fn matches_host_pattern(pattern: &str, host: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        // Wildcard pattern: matches the base host itself or any subdomain
        host == base || host.ends_with(&format!(".{}", base))
    } else {
        // Exact match only
        host == pattern
    }
}
