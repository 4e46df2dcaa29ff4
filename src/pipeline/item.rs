use crate::cards::CardRecord;
use crate::cleaning::NO_TEXT_MARKER;
use serde::Serialize;
use url::Url;

/// One feed entry tracked end-to-end through the pipeline
///
/// Items are created from card records in input order and keep that position
/// for the whole run; stages write their outcome back into the item's slot.
/// After the resolve stage exactly one of `resolved_url`/`resolve_error` is
/// set; after the fetch and clean stages every resolved item carries exactly
/// one of `text` (cleaned text or the no-text marker) and `fetch_error`.
#[derive(Debug, Clone, Serialize)]
pub struct FeedItem {
    /// Stable feed identifier
    pub id: String,

    /// Display title from the card
    pub title: String,

    /// Tracking (click-through) URL from the card
    pub tracking_url: String,

    /// Publisher label from the card, passed through untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// Publication timestamp from the card, passed through untouched
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_iso: Option<String>,

    /// Final source URL after following the tracking redirect
    pub resolved_url: Option<Url>,

    /// Per-host throttling key derived from the resolved URL
    #[serde(skip)]
    pub host: Option<String>,

    /// Raw extracted page text, consumed by the cleaning stage
    #[serde(skip)]
    pub raw_text: Option<String>,

    /// Cleaned article text, or the no-text marker
    pub text: Option<String>,

    /// Sanitized preview-image URL from the source page
    pub image_url: Option<String>,

    /// Source page title (og:title, falling back to <title>)
    pub page_title: Option<String>,

    /// Terminal resolve-stage failure reason
    pub resolve_error: Option<String>,

    /// Terminal fetch-stage failure reason
    pub fetch_error: Option<String>,
}

/// Final state of an item after a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemState {
    /// Resolved, fetched, and cleaned to non-empty text
    Enriched,

    /// Resolved and fetched, but the page yielded no usable text
    NoText,

    /// Resolved, but the fetch failed (resolved URL is still reported)
    FetchFailed,

    /// The tracking redirect could not be resolved
    ResolveFailed,
}

impl FeedItem {
    /// Creates a pending item from a card record
    pub fn from_card(card: CardRecord) -> Self {
        Self {
            id: card.id,
            title: card.title,
            tracking_url: card.url,
            source: card.source,
            time_iso: card.time_iso,
            resolved_url: None,
            host: None,
            raw_text: None,
            text: None,
            image_url: None,
            page_title: None,
            resolve_error: None,
            fetch_error: None,
        }
    }

    /// Returns true once the resolve stage succeeded for this item
    pub fn is_resolved(&self) -> bool {
        self.resolved_url.is_some()
    }

    /// Classifies the item's final state
    pub fn state(&self) -> ItemState {
        if self.resolve_error.is_some() {
            ItemState::ResolveFailed
        } else if self.fetch_error.is_some() {
            ItemState::FetchFailed
        } else if self.text.as_deref() == Some(NO_TEXT_MARKER) {
            ItemState::NoText
        } else {
            ItemState::Enriched
        }
    }
}
