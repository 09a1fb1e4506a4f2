//! Heading detection for single-line paragraphs.
//!
//! OCR output carries no font information worth trusting, so headings are
//! recognized from text shape alone: short all-caps lines, short lines ending
//! in a colon, section keywords and numbered section markers.

use lazy_static::lazy_static;
use regex::Regex;

/// Lines longer than this are never headings.
const MAX_HEADING_CHARS: usize = 100;

/// Upper bound for the all-caps and trailing-colon rules.
const SHORT_HEADING_CHARS: usize = 50;

lazy_static! {
    static ref SECTION_KEYWORD: Regex =
        Regex::new(r"(?i)^(chapter|section|part|introduction|conclusions?|appendix|abstract)\b")
            .expect("valid regex");
    static ref NUMBERED_SECTION: Regex =
        Regex::new(r"^(\d+(\.\d+)*\.?|[IVXLC]+\.)\s+\p{Lu}").expect("valid regex");
}

/// Decide whether a line of text looks like a heading.
///
/// # Examples
///
/// ```
/// use ocr_layout::layout::heading_detector::is_likely_heading;
///
/// assert!(is_likely_heading("TERMS AND CONDITIONS"));
/// assert!(is_likely_heading("Shipping address:"));
/// assert!(is_likely_heading("2.1 Scope"));
/// assert!(!is_likely_heading("The parcel arrived on time and intact."));
/// ```
pub fn is_likely_heading(text: &str) -> bool {
    let text = text.trim();
    let len = text.chars().count();
    if len == 0 || len > MAX_HEADING_CHARS {
        return false;
    }

    let short = len < SHORT_HEADING_CHARS;
    let has_letters = text.chars().any(char::is_alphabetic);
    let all_caps = has_letters && !text.chars().any(char::is_lowercase);

    (short && all_caps)
        || (short && text.ends_with(':'))
        || SECTION_KEYWORD.is_match(text)
        || NUMBERED_SECTION.is_match(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_caps() {
        assert!(is_likely_heading("INVOICE"));
        assert!(!is_likely_heading("12345"));
        assert!(!is_likely_heading(&"A".repeat(60)));
    }

    #[test]
    fn test_trailing_colon() {
        assert!(is_likely_heading("Notes:"));
        assert!(!is_likely_heading(&format!("{}:", "word ".repeat(12))));
    }

    #[test]
    fn test_section_keywords() {
        assert!(is_likely_heading("Chapter 3"));
        assert!(is_likely_heading("introduction to the method"));
        assert!(is_likely_heading("Conclusions"));
        assert!(!is_likely_heading("Partial results are shown below"));
    }

    #[test]
    fn test_numbered_sections() {
        assert!(is_likely_heading("1. Overview"));
        assert!(is_likely_heading("3.2.1 Error handling"));
        assert!(is_likely_heading("IV. Results"));
        assert!(!is_likely_heading("3 apples were sold"));
    }

    #[test]
    fn test_long_text_never_heading() {
        let long = format!("Chapter {}", "x".repeat(120));
        assert!(!is_likely_heading(&long));
        assert!(!is_likely_heading("   "));
    }
}
