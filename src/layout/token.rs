//! Recognized text fragments.
//!
//! [`RawToken`] is whatever the recognizer emitted, trusted for nothing.
//! [`Token`] is the validated value type every later stage consumes: its text
//! is non-empty, its box is finite with positive area and its confidence lies
//! in `[0, 1]`. The only way to get a `Token` is through [`Token::new`], so
//! downstream code never re-checks these invariants.

use std::cmp::Ordering;

use crate::error::{Error, Result};
use crate::geometry::Rect;
use serde::{Deserialize, Serialize};

/// Unvalidated recognizer output for one text fragment.
///
/// Box edges are pixels in source-image space, origin top-left.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawToken {
    /// Recognized text
    pub text: String,
    /// Left edge
    pub left: f32,
    /// Top edge
    pub top: f32,
    /// Right edge
    pub right: f32,
    /// Bottom edge
    pub bottom: f32,
    /// Recognizer confidence, nominally in `[0, 1]`
    pub confidence: f32,
}

impl RawToken {
    /// Create a raw token from text, box edges and confidence.
    pub fn new(
        text: impl Into<String>,
        left: f32,
        top: f32,
        right: f32,
        bottom: f32,
        confidence: f32,
    ) -> Self {
        Self {
            text: text.into(),
            left,
            top,
            right,
            bottom,
            confidence,
        }
    }

    /// The raw box as a [`Rect`], without validation.
    pub fn bbox(&self) -> Rect {
        Rect::from_points(self.left, self.top, self.right, self.bottom)
    }
}

/// A validated text fragment with position and confidence.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    text: String,
    bbox: Rect,
    confidence: f32,
}

impl Token {
    /// Build a token, enforcing its invariants.
    ///
    /// Interior whitespace runs are collapsed to one space and the text is
    /// trimmed. Confidence is clamped to `[0, 1]`; NaN becomes 0.
    ///
    /// # Errors
    ///
    /// * [`Error::InvalidInput`] when the cleaned text is empty
    /// * [`Error::DegenerateGeometry`] when the box is non-finite or has no area
    ///
    /// # Examples
    ///
    /// ```
    /// use ocr_layout::geometry::Rect;
    /// use ocr_layout::layout::Token;
    ///
    /// let token = Token::new("  Total \t due ", Rect::new(0.0, 0.0, 60.0, 12.0), 1.4).unwrap();
    /// assert_eq!(token.text(), "Total due");
    /// assert_eq!(token.confidence(), 1.0);
    /// ```
    pub fn new(text: &str, bbox: Rect, confidence: f32) -> Result<Self> {
        let text = collapse_whitespace(text);
        if text.is_empty() {
            return Err(Error::InvalidInput("token text is empty".to_string()));
        }

        if !bbox.is_well_formed() {
            return Err(Error::DegenerateGeometry {
                text,
                width: bbox.width,
                height: bbox.height,
            });
        }

        Ok(Self {
            text,
            bbox,
            confidence: clamp_confidence(confidence),
        })
    }

    /// Cleaned text, never empty.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Bounding box with positive area.
    pub fn bbox(&self) -> &Rect {
        &self.bbox
    }

    /// Confidence in `[0, 1]`.
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Total order over every field: top, left, extent, text, confidence.
    ///
    /// Only identical tokens compare equal, so sorting by it gives the same
    /// sequence whatever order the recognizer emitted tokens in.
    pub fn position_cmp(&self, other: &Token) -> Ordering {
        let (a, b) = (&self.bbox, &other.bbox);
        a.y.total_cmp(&b.y)
            .then(a.x.total_cmp(&b.x))
            .then(a.height.total_cmp(&b.height))
            .then(a.width.total_cmp(&b.width))
            .then_with(|| self.text.cmp(&other.text))
            .then(self.confidence.total_cmp(&other.confidence))
    }

    /// Box width divided by the number of characters.
    pub fn char_width(&self) -> f32 {
        self.bbox.width / self.text.chars().count().max(1) as f32
    }
}

impl TryFrom<&RawToken> for Token {
    type Error = Error;

    fn try_from(raw: &RawToken) -> Result<Self> {
        Token::new(&raw.text, raw.bbox(), raw.confidence)
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn clamp_confidence(confidence: f32) -> f32 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

/// Mean confidence over a set of tokens, 0.0 for none.
pub fn mean_confidence<'a>(tokens: impl IntoIterator<Item = &'a Token>) -> f32 {
    let (sum, count) = tokens
        .into_iter()
        .fold((0.0f32, 0usize), |(sum, count), t| (sum + t.confidence(), count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_collapses_whitespace() {
        let token = Token::new(" a \n  b ", Rect::new(0.0, 0.0, 10.0, 10.0), 0.5).unwrap();
        assert_eq!(token.text(), "a b");
    }

    #[test]
    fn test_token_rejects_blank_text() {
        let err = Token::new(" \t ", Rect::new(0.0, 0.0, 10.0, 10.0), 0.5).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_token_rejects_degenerate_box() {
        let err = Token::new("x", Rect::from_points(10.0, 0.0, 10.0, 10.0), 0.5).unwrap_err();
        assert!(matches!(err, Error::DegenerateGeometry { .. }));

        let err = Token::new("x", Rect::from_points(0.0, 10.0, 10.0, 5.0), 0.5).unwrap_err();
        assert!(matches!(err, Error::DegenerateGeometry { .. }));
    }

    #[test]
    fn test_token_clamps_confidence() {
        let bbox = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(Token::new("x", bbox, -0.3).unwrap().confidence(), 0.0);
        assert_eq!(Token::new("x", bbox, 7.0).unwrap().confidence(), 1.0);
        assert_eq!(Token::new("x", bbox, f32::NAN).unwrap().confidence(), 0.0);
        assert_eq!(Token::new("x", bbox, 0.42).unwrap().confidence(), 0.42);
    }

    #[test]
    fn test_raw_token_conversion() {
        let raw = RawToken::new("Name", 10.0, 20.0, 50.0, 32.0, 0.9);
        let token = Token::try_from(&raw).unwrap();
        assert_eq!(token.bbox().left(), 10.0);
        assert_eq!(token.bbox().bottom(), 32.0);
        assert_eq!(token.char_width(), 10.0);
    }

    #[test]
    fn test_position_order() {
        let at = |text: &str, x: f32, y: f32, confidence: f32| {
            Token::new(text, Rect::new(x, y, 10.0, 10.0), confidence).unwrap()
        };
        assert_eq!(at("a", 50.0, 0.0, 0.5).position_cmp(&at("a", 0.0, 5.0, 0.5)), Ordering::Less);
        assert_eq!(at("a", 0.0, 0.0, 0.5).position_cmp(&at("a", 9.0, 0.0, 0.5)), Ordering::Less);
        // Same box: text, then confidence
        assert_eq!(at("b", 0.0, 0.0, 0.1).position_cmp(&at("a", 0.0, 0.0, 0.9)), Ordering::Greater);
        assert_eq!(at("a", 0.0, 0.0, 0.1).position_cmp(&at("a", 0.0, 0.0, 0.9)), Ordering::Less);
        assert_eq!(at("a", 0.0, 0.0, 0.1).position_cmp(&at("a", 0.0, 0.0, 0.1)), Ordering::Equal);
    }

    #[test]
    fn test_mean_confidence() {
        let bbox = Rect::new(0.0, 0.0, 10.0, 10.0);
        let tokens = vec![
            Token::new("a", bbox, 0.5).unwrap(),
            Token::new("b", bbox, 1.0).unwrap(),
        ];
        assert_eq!(mean_confidence(&tokens), 0.75);
        let none: Vec<Token> = vec![];
        assert_eq!(mean_confidence(&none), 0.0);
    }
}
