//! Run statistics
//!
//! Aggregates the final item states of one run for logging and the CLI
//! summary.

use crate::pipeline::{FeedItem, ItemState};

/// Counts of item outcomes for one run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Total number of items in the batch
    pub total: usize,

    /// Items with resolved URL, fetched page, and cleaned text
    pub enriched: usize,

    /// Items fetched successfully but yielding the no-text marker
    pub no_text: usize,

    /// Items that resolved but whose fetch failed
    pub fetch_failed: usize,

    /// Items whose tracking redirect could not be resolved
    pub resolve_failed: usize,
}

impl PipelineStats {
    /// Aggregates statistics from a finished item set
    pub fn from_items(items: &[FeedItem]) -> Self {
        let mut stats = Self {
            total: items.len(),
            ..Self::default()
        };

        for item in items {
            match item.state() {
                ItemState::Enriched => stats.enriched += 1,
                ItemState::NoText => stats.no_text += 1,
                ItemState::FetchFailed => stats.fetch_failed += 1,
                ItemState::ResolveFailed => stats.resolve_failed += 1,
            }
        }

        stats
    }

    /// Returns the share of fully enriched items as a percentage
    pub fn enrichment_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.enriched as f64 / self.total as f64) * 100.0
    }
}

/// Prints run statistics to stdout in a formatted manner
pub fn print_statistics(stats: &PipelineStats) {
    println!("=== Run Statistics ===\n");

    println!("Items: {}", stats.total);
    println!("  Enriched: {}", stats.enriched);
    println!("  Fetched, no usable text: {}", stats.no_text);
    println!("  Fetch failed: {}", stats.fetch_failed);
    println!("  Resolve failed: {}", stats.resolve_failed);
    println!();

    println!(
        "Enrichment rate: {:.1}% ({} / {} items)",
        stats.enrichment_rate(),
        stats.enriched,
        stats.total
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::CardRecord;
    use crate::cleaning::NO_TEXT_MARKER;
    use url::Url;

    fn item(id: &str) -> FeedItem {
        FeedItem::from_card(CardRecord {
            id: id.to_string(),
            title: String::new(),
            url: format!("https://feed.test/click/{}/", id),
            source: None,
            time_iso: None,
        })
    }

    #[test]
    fn test_from_items_counts_states() {
        let mut enriched = item("1");
        enriched.resolved_url = Some(Url::parse("https://a.test/x").unwrap());
        enriched.text = Some("Body.".to_string());

        let mut no_text = item("2");
        no_text.resolved_url = Some(Url::parse("https://b.test/x").unwrap());
        no_text.text = Some(NO_TEXT_MARKER.to_string());

        let mut fetch_failed = item("3");
        fetch_failed.resolved_url = Some(Url::parse("https://c.test/x").unwrap());
        fetch_failed.fetch_error = Some("HTTP 500 (after 3 attempts)".to_string());

        let mut resolve_failed = item("4");
        resolve_failed.resolve_error = Some("HTTP 404".to_string());

        let stats =
            PipelineStats::from_items(&[enriched, no_text, fetch_failed, resolve_failed]);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.enriched, 1);
        assert_eq!(stats.no_text, 1);
        assert_eq!(stats.fetch_failed, 1);
        assert_eq!(stats.resolve_failed, 1);
        assert!((stats.enrichment_rate() - 25.0).abs() < 0.01);
    }

    #[test]
    fn test_empty_run() {
        let stats = PipelineStats::from_items(&[]);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.enrichment_rate(), 0.0);
    }
}
