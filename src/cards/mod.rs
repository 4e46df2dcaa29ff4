//! Input boundary: card records from the extraction collaborator
//!
//! The pipeline does not scrape the feed page itself; an external extraction
//! step produces an ordered JSON array of card records. This module loads
//! that file, tolerates the extractor's field names, and drops duplicate
//! cards (the feed repeats entries while scrolling) before the pipeline
//! runs. Everything after this point preserves order and length.

use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while loading card records
#[derive(Debug, Error)]
pub enum CardError {
    #[error("Failed to read card file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse card JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// One raw card as produced by the extraction step
///
/// Only `id` and `url` drive the pipeline; `title`, `source`, and `time_iso`
/// are carried through to the output records untouched. A card with an empty
/// tracking URL stays in the batch and fails the resolve stage with a
/// terminal error instead of being dropped.
#[derive(Debug, Clone, Deserialize)]
pub struct CardRecord {
    /// Stable feed identifier of the entry
    #[serde(default, alias = "id_news")]
    pub id: String,

    /// Display title from the feed card
    #[serde(default)]
    pub title: String,

    /// Tracking (click-through) URL to resolve
    #[serde(default, alias = "url_abs")]
    pub url: String,

    /// Publisher label shown on the card
    #[serde(default)]
    pub source: Option<String>,

    /// Publication timestamp as extracted (ISO 8601, UTC)
    #[serde(default, alias = "published_at")]
    pub time_iso: Option<String>,
}

/// Loads card records from a JSON file
///
/// Duplicate ids are dropped, keeping the first occurrence; the relative
/// order of the survivors is unchanged.
pub fn load_cards(path: &Path) -> Result<Vec<CardRecord>, CardError> {
    let content = std::fs::read_to_string(path)?;
    let cards: Vec<CardRecord> = serde_json::from_str(&content)?;

    let total = cards.len();
    let cards = dedupe_cards(cards);
    let dropped = total - cards.len();
    if dropped > 0 {
        tracing::info!("Dropped {} duplicate cards ({} remain)", dropped, cards.len());
    }

    Ok(cards)
}

/// Drops cards whose id was already seen, keeping the first occurrence
///
/// Cards with an empty id cannot be told apart, so all of them are kept.
pub fn dedupe_cards(cards: Vec<CardRecord>) -> Vec<CardRecord> {
    let mut seen = HashSet::new();
    cards
        .into_iter()
        .filter(|card| card.id.is_empty() || seen.insert(card.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn card(id: &str, url: &str) -> CardRecord {
        CardRecord {
            id: id.to_string(),
            title: format!("Title {}", id),
            url: url.to_string(),
            source: None,
            time_iso: None,
        }
    }

    #[test]
    fn test_parse_card_json() {
        let json = r#"[
            {"id": "1", "title": "First", "url": "https://feed.test/click/1/", "source": "example.com", "time_iso": "2024-05-01T10:00:00Z"},
            {"id": "2", "title": "Second", "url": "https://feed.test/click/2/"}
        ]"#;

        let cards: Vec<CardRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].id, "1");
        assert_eq!(cards[0].source.as_deref(), Some("example.com"));
        assert_eq!(cards[1].source, None);
    }

    #[test]
    fn test_parse_extractor_field_names() {
        // The extraction script emits id_news/url_abs
        let json = r#"[{"id_news": "42", "title": "Aliased", "url_abs": "https://feed.test/click/42/"}]"#;

        let cards: Vec<CardRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(cards[0].id, "42");
        assert_eq!(cards[0].url, "https://feed.test/click/42/");
    }

    #[test]
    fn test_parse_missing_fields_default_empty() {
        let json = r#"[{"title": "No id or url"}]"#;

        let cards: Vec<CardRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(cards[0].id, "");
        assert_eq!(cards[0].url, "");
    }

    #[test]
    fn test_dedupe_keeps_first_occurrence() {
        let cards = vec![
            card("1", "https://feed.test/click/1/"),
            card("2", "https://feed.test/click/2/"),
            card("1", "https://feed.test/click/1-again/"),
        ];

        let deduped = dedupe_cards(cards);
        assert_eq!(deduped.len(), 2);
        assert_eq!(deduped[0].url, "https://feed.test/click/1/");
        assert_eq!(deduped[1].id, "2");
    }

    #[test]
    fn test_dedupe_keeps_all_empty_ids() {
        let cards = vec![card("", "https://a.test/"), card("", "https://b.test/")];
        assert_eq!(dedupe_cards(cards).len(), 2);
    }

    #[test]
    fn test_load_cards_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"[{"id": "1", "title": "T", "url": "https://feed.test/click/1/"}]"#)
            .unwrap();
        file.flush().unwrap();

        let cards = load_cards(file.path()).unwrap();
        assert_eq!(cards.len(), 1);
    }

    #[test]
    fn test_load_cards_malformed_json() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();
        file.flush().unwrap();

        assert!(matches!(load_cards(file.path()), Err(CardError::Parse(_))));
    }
}
