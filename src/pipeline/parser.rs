//! Source page parser
//!
//! Turns a fetched HTML body into the raw material the enrichment needs:
//! block-level text (one line per element, ready for the cleaning pipeline),
//! a sanitized preview-image URL from `og:image`, and a page title from
//! `og:title` with a `<title>` fallback.

use scraper::{Html, Selector};

/// Image file extensions recognized when truncating a preview-image URL
const IMAGE_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp", ".tiff", ".svg", ".avif",
];

/// Pages shorter than this that carry an anti-bot interstitial phrase are
/// treated as having produced no text
const CHALLENGE_MAX_CHARS: usize = 400;
const CHALLENGE_PHRASE: &str = "Verifying you are human";

/// Extracted content of one fetched source page
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    /// Block-level text, one line per element
    pub raw_text: String,

    /// Sanitized preview-image URL
    pub image_url: Option<String>,

    /// Page title
    pub page_title: Option<String>,
}

impl FetchedPage {
    /// A page that yielded no content (non-HTML responses, interstitials)
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Parses a fetched HTML body
pub fn parse_page(html: &str) -> FetchedPage {
    let document = Html::parse_document(html);

    let mut raw_text = extract_text(&document);
    if raw_text.chars().count() < CHALLENGE_MAX_CHARS && raw_text.contains(CHALLENGE_PHRASE) {
        raw_text = String::new();
    }

    FetchedPage {
        raw_text,
        image_url: extract_preview_image(&document),
        page_title: extract_page_title(&document),
    }
}

/// Extracts block-level text from the document
///
/// Headings, paragraphs, and list items cover article bodies across the
/// long tail of news sites without dragging in scripts or styles. Nested
/// elements can emit duplicate lines; the cleaning pipeline drops those.
fn extract_text(document: &Html) -> String {
    let selector = match Selector::parse("p, h1, h2, h3, h4, h5, h6, li") {
        Ok(s) => s,
        Err(_) => return String::new(),
    };

    let mut lines = Vec::new();
    for element in document.select(&selector) {
        let text = element.text().collect::<Vec<_>>().join(" ");
        let text = text.trim();
        if !text.is_empty() {
            lines.push(text.to_string());
        }
    }

    lines.join("\n")
}

/// Extracts the page title: og:title content, falling back to <title>
fn extract_page_title(document: &Html) -> Option<String> {
    if let Ok(selector) = Selector::parse(r#"meta[property="og:title"]"#) {
        if let Some(content) = document
            .select(&selector)
            .next()
            .and_then(|element| element.value().attr("content"))
        {
            let content = content.trim();
            if !content.is_empty() {
                return Some(content.to_string());
            }
        }
    }

    let title_selector = Selector::parse("title").ok()?;
    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Extracts and sanitizes the preview image from og:image
fn extract_preview_image(document: &Html) -> Option<String> {
    let selector = Selector::parse(r#"meta[property="og:image"]"#).ok()?;
    let content = document
        .select(&selector)
        .next()
        .and_then(|element| element.value().attr("content"))?;
    sanitize_image_url(content)
}

/// Cleans a raw og:image value into a usable URL
///
/// CDN-decorated values get their `@png` suffix markers removed, and the URL
/// is truncated right after the first recognized image extension unless the
/// extension is a path segment (`.../image.png/socialcard`). Values that do
/// not resolve to an http(s) URL are rejected.
pub fn sanitize_image_url(raw: &str) -> Option<String> {
    let mut value = raw.trim().replace("@png", "");
    if value.is_empty() {
        return None;
    }

    let lower = value.to_ascii_lowercase();
    for ext in IMAGE_EXTENSIONS {
        if let Some(pos) = lower.find(ext) {
            let end = pos + ext.len();
            if value[end..].chars().next() != Some('/') {
                value.truncate(end);
            }
            break;
        }
    }

    if value.starts_with("http://") || value.starts_with("https://") {
        Some(value)
    } else {
        None
    }
}
