//! Text cleaning pipeline
//!
//! Fetched source pages arrive as blocks of extracted text full of
//! navigation fragments, subscription prompts, author bios, and half-loaded
//! widget captions. This module reduces that to the article body.
//!
//! The pipeline is a fixed sequence of line-level stages. Every stage is
//! total (it never fails, it only keeps or drops lines), and the sequence is
//! idempotent: running `clean` on its own output returns it unchanged. Text
//! that survives with too little substance is replaced by the no-text
//! marker, which is itself a fixed point of the pipeline.

mod patterns;

pub use patterns::DEFAULT_JUNK_PATTERNS;

use crate::config::CleaningConfig;
use std::collections::HashSet;

/// Emitted instead of cleaned text when a page yields nothing usable
pub const NO_TEXT_MARKER: &str = "---";

/// Punctuation accepted at the end of a kept line
const ACCEPTED_PUNCT: &[char] = &['.', ',', '?', '!', '"', ':', '\u{201D}', '\u{201C}'];

/// Closing characters looked through when finding the last meaningful char
const CLOSING_CHARS: &[char] = &['"', '\'', '\u{201D}', '\u{2019}', '»', ')', ']', '}'];

/// A run of this many consecutive lines without sentence punctuation marks
/// the start of the boilerplate tail (link lists, footers)
const TAIL_RUN: usize = 6;

/// Trailing lines shorter than this are dropped as junk
const SHORT_LINE_CHARS: usize = 60;

/// Minimum length of a line counted as sentence-like
const SENTENCE_MIN_CHARS: usize = 40;

/// Minimum number of spaces in a line counted as sentence-like
const SENTENCE_MIN_SPACES: usize = 4;

/// Line-level cleaning pipeline for fetched article text
#[derive(Debug, Clone)]
pub struct TextCleaner {
    /// Lowercased junk substrings; a line containing any of them is dropped
    junk: Vec<String>,

    /// Character budget for the cleaned text
    max_chars: usize,

    /// Results below this many characters become the no-text marker
    min_chars: usize,

    /// Maximum number of lines kept
    max_lines: usize,
}

impl TextCleaner {
    /// Creates a cleaner from explicit parts
    pub fn new(junk_patterns: &[String], max_chars: usize, min_chars: usize, max_lines: usize) -> Self {
        Self {
            junk: junk_patterns.iter().map(|p| p.to_lowercase()).collect(),
            max_chars,
            min_chars,
            max_lines,
        }
    }

    /// Creates a cleaner from the cleaning configuration section
    pub fn from_config(config: &CleaningConfig) -> Self {
        Self::new(
            &config.junk_patterns,
            config.max_text_chars,
            config.min_text_chars,
            config.max_text_lines,
        )
    }

    /// Cleans raw extracted text
    ///
    /// Stages, in order:
    /// 1. normalize line endings, collapse whitespace, drop empty lines
    /// 2. drop lines containing a junk pattern
    /// 3. cut everything from the first run of [`TAIL_RUN`] lines without
    ///    accepted punctuation
    /// 4. drop remaining lines without accepted punctuation
    /// 5. cap the line count
    /// 6. drop duplicate lines (case-insensitive, first kept)
    /// 7. truncate to the character budget at line granularity
    /// 8. pop trailing lines that are short or end with ':'
    /// 9. trim the lead-in to the first sentence-like region
    /// 10. replace anything under the minimum threshold with [`NO_TEXT_MARKER`]
    ///
    /// The output is a fixed point: `clean(clean(x)) == clean(x)`.
    pub fn clean(&self, raw: &str) -> String {
        let mut lines: Vec<String> = raw
            .replace("\r\n", "\n")
            .replace('\r', "\n")
            .split('\n')
            .map(normalize_space_line)
            .filter(|line| !line.is_empty())
            .collect();

        lines.retain(|line| !self.is_junk(line));

        // Link lists and footers show up as long runs of unpunctuated lines;
        // everything from the first such run onward is tail boilerplate.
        let mut run = 0;
        let mut cut_at = None;
        for (idx, line) in lines.iter().enumerate() {
            if ends_with_accepted_punct(line) {
                run = 0;
            } else {
                run += 1;
                if run >= TAIL_RUN {
                    cut_at = Some(idx + 1 - TAIL_RUN);
                    break;
                }
            }
        }
        if let Some(at) = cut_at {
            lines.truncate(at);
        }

        lines.retain(|line| ends_with_accepted_punct(line));

        lines.truncate(self.max_lines);

        let mut seen = HashSet::new();
        lines.retain(|line| seen.insert(line.to_lowercase()));

        // Whole lines only: a truncated sentence would just be re-dropped as
        // a short trailing line on the next run.
        let mut total = 0usize;
        let mut keep = 0usize;
        for line in &lines {
            let cost = line.chars().count() + usize::from(keep > 0);
            if total + cost > self.max_chars {
                break;
            }
            total += cost;
            keep += 1;
        }
        lines.truncate(keep);

        while let Some(last) = lines.last() {
            let short = last.trim().chars().count() < SHORT_LINE_CHARS;
            let dangling_colon = last_meaningful_char(last) == Some(':');
            if short || dangling_colon {
                lines.pop();
            } else {
                break;
            }
        }

        let start = find_lead_in(&lines);
        if start > 0 {
            lines.drain(..start);
        }

        let text = lines.join("\n");
        if text.chars().count() < self.min_chars {
            NO_TEXT_MARKER.to_string()
        } else {
            text
        }
    }

    fn is_junk(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        self.junk.iter().any(|pattern| lower.contains(pattern))
    }
}

/// Collapses tabs and whitespace runs inside a line and trims it
fn normalize_space_line(line: &str) -> String {
    line.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Finds the last meaningful character of a line
///
/// Trailing whitespace and closing quotes/brackets are skipped. A single
/// trailing comma is also looked through (so `he said "yes,"` is judged by
/// the quoted sentence, not the comma).
fn last_meaningful_char(line: &str) -> Option<char> {
    let chars: Vec<char> = line.chars().collect();
    let mut i = chars.len();

    while i > 0 && chars[i - 1].is_whitespace() {
        i -= 1;
    }
    while i > 0 && CLOSING_CHARS.contains(&chars[i - 1]) {
        i -= 1;
    }
    if i > 0 && chars[i - 1] == ',' {
        i -= 1;
        while i > 0 && CLOSING_CHARS.contains(&chars[i - 1]) {
            i -= 1;
        }
    }

    if i > 0 {
        Some(chars[i - 1])
    } else {
        None
    }
}

/// Returns true if the line ends in accepted punctuation
fn ends_with_accepted_punct(line: &str) -> bool {
    match last_meaningful_char(line) {
        Some(c) => ACCEPTED_PUNCT.contains(&c),
        None => false,
    }
}

/// Returns true if a line reads like body prose
///
/// A line ending with ':' counts unless it is the last line (a dangling
/// header). Otherwise the line must end a sentence and carry enough length
/// and words to not be a caption or menu entry.
fn is_sentence_like(line: &str, is_last: bool) -> bool {
    match last_meaningful_char(line) {
        Some(':') => !is_last,
        Some('.') | Some('!') | Some('?') => {
            line.chars().count() >= SENTENCE_MIN_CHARS
                && line.matches(' ').count() >= SENTENCE_MIN_SPACES
        }
        _ => false,
    }
}

/// Finds where the article body starts
///
/// Prefers the first window of three consecutive sentence-like lines, falls
/// back to the first sentence-like line, and keeps everything when neither
/// exists.
fn find_lead_in(lines: &[String]) -> usize {
    let n = lines.len();

    for i in 0..n {
        if i + 3 <= n && (i..i + 3).all(|j| is_sentence_like(&lines[j], j == n - 1)) {
            return i;
        }
    }

    for (i, line) in lines.iter().enumerate() {
        if is_sentence_like(line, i == n - 1) {
            return i;
        }
    }

    0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_cleaner() -> TextCleaner {
        let junk: Vec<String> = DEFAULT_JUNK_PATTERNS.iter().map(|s| s.to_string()).collect();
        TextCleaner::new(&junk, 6000, 80, 25)
    }

    fn long_sentence(tag: &str) -> String {
        format!(
            "The {} development continued through the quarter as analysts watched closely.",
            tag
        )
    }

    #[test]
    fn test_last_meaningful_char_plain() {
        assert_eq!(last_meaningful_char("Sentence ends here."), Some('.'));
        assert_eq!(last_meaningful_char("No punctuation"), Some('n'));
        assert_eq!(last_meaningful_char(""), None);
        assert_eq!(last_meaningful_char("   "), None);
    }

    #[test]
    fn test_last_meaningful_char_skips_closers() {
        assert_eq!(last_meaningful_char("he said \"enough.\""), Some('.'));
        assert_eq!(last_meaningful_char("(as reported.)"), Some('.'));
        assert_eq!(last_meaningful_char("quoted.\u{201D}"), Some('.'));
    }

    #[test]
    fn test_last_meaningful_char_looks_through_comma() {
        // The char before the comma decides the line's fate
        assert_eq!(last_meaningful_char("first clause,"), Some('e'));
        assert_eq!(last_meaningful_char("\u{201C}quoted sentence.\u{201D},"), Some('.'));
    }

    #[test]
    fn test_sentence_like() {
        assert!(is_sentence_like(&long_sentence("alpha"), false));
        assert!(is_sentence_like("A header introducing the article body:", false));
        assert!(!is_sentence_like("A header introducing the article body:", true));
        assert!(!is_sentence_like("Short.", false));
        assert!(!is_sentence_like("word word word", false));
    }

    #[test]
    fn test_clean_removes_junk_and_duplicates() {
        let raw = format!(
            "{}\nSubscribe to our newsletter today!\n{}\n{}\n",
            long_sentence("first"),
            long_sentence("second"),
            long_sentence("second"),
        );

        let cleaned = test_cleaner().clean(&raw);
        let lines: Vec<&str> = cleaned.split('\n').collect();

        assert!(!cleaned.to_lowercase().contains("subscribe"));
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], long_sentence("first"));
        assert_eq!(lines[1], long_sentence("second"));
    }

    #[test]
    fn test_clean_collapses_whitespace() {
        let raw = format!("The   spaced\tout  {}\r\n", long_sentence("alpha"));
        let cleaned = test_cleaner().clean(&raw);
        assert!(!cleaned.contains("  "));
        assert!(!cleaned.contains('\t'));
    }

    #[test]
    fn test_clean_cuts_unpunctuated_tail() {
        let mut input = vec![long_sentence("one"), long_sentence("two")];
        // Six menu-style lines in a row mark the tail
        for i in 0..6 {
            input.push(format!("Menu entry number {} without any ending", i));
        }
        input.push(long_sentence("never-reached"));

        let cleaned = test_cleaner().clean(&input.join("\n"));
        assert!(cleaned.contains("one"));
        assert!(cleaned.contains("two"));
        assert!(!cleaned.contains("never-reached"));
    }

    #[test]
    fn test_clean_drops_unpunctuated_lines() {
        let raw = format!(
            "{}\nBare widget caption fragment\n{}\n",
            long_sentence("kept-a"),
            long_sentence("kept-b"),
        );
        let cleaned = test_cleaner().clean(&raw);
        assert!(!cleaned.contains("widget caption"));
        assert!(cleaned.contains("kept-a"));
        assert!(cleaned.contains("kept-b"));
    }

    #[test]
    fn test_clean_caps_line_count() {
        let junk: Vec<String> = Vec::new();
        let cleaner = TextCleaner::new(&junk, 100_000, 1, 25);

        let input: Vec<String> = (0..40).map(|i| long_sentence(&format!("n{:02}", i))).collect();
        let cleaned = cleaner.clean(&input.join("\n"));

        assert_eq!(cleaned.split('\n').count(), 25);
    }

    #[test]
    fn test_clean_respects_char_budget() {
        let junk: Vec<String> = Vec::new();
        let cleaner = TextCleaner::new(&junk, 200, 1, 25);

        let input: Vec<String> = (0..10).map(|i| long_sentence(&format!("n{}", i))).collect();
        let cleaned = cleaner.clean(&input.join("\n"));

        assert!(cleaned.chars().count() <= 200);
        // Whole lines only: every kept line is intact
        for line in cleaned.split('\n') {
            assert!(line.ends_with('.'));
        }
    }

    #[test]
    fn test_clean_pops_short_trailing_lines() {
        let raw = format!("{}\n{}\nBy a staff reporter.\n", long_sentence("one"), long_sentence("two"));
        let cleaned = test_cleaner().clean(&raw);
        assert!(!cleaned.contains("staff reporter"));
        assert!(cleaned.ends_with('.'));
    }

    #[test]
    fn test_clean_trims_lead_in_navigation() {
        // The intro line ends a sentence but is too short to read as body
        // prose, so the lead-in trim starts the text at the first window of
        // three sentence-like lines.
        let raw = format!(
            "Markets section front page.\n{}\n{}\n{}\n",
            long_sentence("body-one"),
            long_sentence("body-two"),
            long_sentence("body-three"),
        );
        let cleaned = test_cleaner().clean(&raw);
        assert!(!cleaned.contains("Markets section"));
        assert!(cleaned.starts_with("The body-one"));
    }

    #[test]
    fn test_clean_empty_input_yields_marker() {
        assert_eq!(test_cleaner().clean(""), NO_TEXT_MARKER);
        assert_eq!(test_cleaner().clean("   \n\n  "), NO_TEXT_MARKER);
    }

    #[test]
    fn test_clean_thin_input_yields_marker() {
        assert_eq!(test_cleaner().clean("Too thin."), NO_TEXT_MARKER);
    }

    #[test]
    fn test_marker_is_fixed_point() {
        assert_eq!(test_cleaner().clean(NO_TEXT_MARKER), NO_TEXT_MARKER);
    }

    #[test]
    fn test_clean_is_idempotent() {
        let cleaner = test_cleaner();

        let inputs = vec![
            String::new(),
            NO_TEXT_MARKER.to_string(),
            "Too thin.".to_string(),
            format!(
                "Home news markets,\n{}\n{}\n{}\nSubscribe now!\nBy staff.",
                long_sentence("a"),
                long_sentence("b"),
                long_sentence("c"),
            ),
            (0..40).map(|i| long_sentence(&format!("x{:02}", i))).collect::<Vec<_>>().join("\n"),
            format!(
                "A header introducing the article body:\n{}\n{}\nlink one\nlink two\nlink three\nlink four\nlink five\nlink six",
                long_sentence("p"),
                long_sentence("q"),
            ),
            "\u{201C}Quoted statement stretching well past the length threshold, honestly.\u{201D}\nraw fragment\n".to_string(),
        ];

        for input in inputs {
            let once = cleaner.clean(&input);
            let twice = cleaner.clean(&once);
            assert_eq!(once, twice, "clean not idempotent for {:?}", input);
        }
    }
}
