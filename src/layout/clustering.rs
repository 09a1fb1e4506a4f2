//! Row clustering for layout reconstruction.
//!
//! Groups tokens into horizontal bands ("rows") that correspond to visual
//! text lines. The sweep is top-to-bottom by vertical center, so a skewed
//! line is still captured as long as each token's center stays inside the
//! growing band of the row it belongs to.

use crate::geometry::{median, Rect};
use crate::layout::token::{mean_confidence, Token};
use crate::pipeline::config::LayoutConfig;
use serde::Serialize;

/// Two tokens in one row whose horizontal overlap exceeds this fraction of
/// the narrower box are duplicate detections of the same text.
const DUPLICATE_OVERLAP: f32 = 0.5;

/// One visual text line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Row {
    /// Member tokens ordered left-to-right
    pub tokens: Vec<Token>,
    /// Union of member boxes
    pub bbox: Rect,
}

impl Row {
    /// Build a row from tokens already ordered left-to-right.
    ///
    /// Returns `None` for an empty token list.
    pub fn from_tokens(tokens: Vec<Token>) -> Option<Self> {
        let first = *tokens.first()?.bbox();
        let bbox = tokens.iter().skip(1).fold(first, |acc, t| acc.union(t.bbox()));
        Some(Self { tokens, bbox })
    }

    /// Top edge of the band.
    pub fn top(&self) -> f32 {
        self.bbox.top()
    }

    /// Bottom edge of the band.
    pub fn bottom(&self) -> f32 {
        self.bbox.bottom()
    }

    /// Left margin of the row.
    pub fn left(&self) -> f32 {
        self.bbox.left()
    }

    /// Band height.
    pub fn height(&self) -> f32 {
        self.bbox.height
    }

    /// Number of tokens in the row.
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Always false for rows built by the clusterer.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Token texts joined by single spaces.
    pub fn text(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.text())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Mean confidence of the row's tokens.
    pub fn confidence(&self) -> f32 {
        mean_confidence(&self.tokens)
    }
}

/// Page-wide typographic measurements used as scale references.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageMetrics {
    /// Median token box height
    pub median_token_height: f32,
    /// Median per-character width (token width / character count)
    pub median_char_width: f32,
}

impl PageMetrics {
    /// Measure a set of tokens. Empty input yields zero metrics.
    pub fn from_tokens(tokens: &[Token]) -> Self {
        let heights: Vec<f32> = tokens.iter().map(|t| t.bbox().height).collect();
        let char_widths: Vec<f32> = tokens.iter().map(Token::char_width).collect();
        Self {
            median_token_height: median(&heights).unwrap_or(0.0),
            median_char_width: median(&char_widths).unwrap_or(0.0),
        }
    }
}

/// Band of the row currently being built by the sweep.
struct OpenRow {
    tokens: Vec<Token>,
    top: f32,
    bottom: f32,
}

impl OpenRow {
    fn start(token: Token) -> Self {
        let (top, bottom) = (token.bbox().top(), token.bbox().bottom());
        Self {
            tokens: vec![token],
            top,
            bottom,
        }
    }

    /// Whether a vertical center falls inside the expanded band `[top - tol, bottom + tol)`.
    fn accepts(&self, center_y: f32, tolerance_factor: f32) -> bool {
        let heights: Vec<f32> = self.tokens.iter().map(|t| t.bbox().height).collect();
        let tolerance = tolerance_factor * median(&heights).unwrap_or(0.0);
        center_y >= self.top - tolerance && center_y < self.bottom + tolerance
    }

    fn push(&mut self, token: Token) {
        self.top = self.top.min(token.bbox().top());
        self.bottom = self.bottom.max(token.bbox().bottom());
        self.tokens.push(token);
    }

    fn close(self) -> Option<Row> {
        let mut tokens = self.tokens;
        tokens.sort_by(|a, b| {
            a.bbox()
                .left()
                .total_cmp(&b.bbox().left())
                .then_with(|| a.position_cmp(b))
        });
        Row::from_tokens(resolve_duplicates(tokens))
    }
}

/// Cluster tokens into rows.
///
/// A token joins the open row when its vertical center lies within the row's
/// band expanded by `config.row_tolerance` times the row's median token
/// height; otherwise the open row closes and a new one starts. Isolated
/// tokens become single-token rows, never dropped.
///
/// # Arguments
///
/// * `tokens` - Normalized tokens, in any order
/// * `config` - Supplies the row tolerance factor
///
/// # Returns
///
/// Rows ordered top-to-bottom, each with tokens ordered left-to-right.
///
/// # Examples
///
/// ```
/// use ocr_layout::geometry::Rect;
/// use ocr_layout::layout::{cluster_rows, Token};
/// use ocr_layout::LayoutConfig;
///
/// let tokens = vec![
///     Token::new("Hello", Rect::new(0.0, 0.0, 50.0, 12.0), 0.9).unwrap(),
///     Token::new("World", Rect::new(60.0, 1.0, 50.0, 12.0), 0.9).unwrap(),
///     Token::new("Next", Rect::new(0.0, 30.0, 40.0, 12.0), 0.9).unwrap(),
/// ];
/// let rows = cluster_rows(&tokens, &LayoutConfig::default());
/// assert_eq!(rows.len(), 2);
/// assert_eq!(rows[0].text(), "Hello World");
/// ```
pub fn cluster_rows(tokens: &[Token], config: &LayoutConfig) -> Vec<Row> {
    let mut order: Vec<&Token> = tokens.iter().collect();
    order.sort_by(|a, b| {
        a.bbox()
            .center()
            .y
            .total_cmp(&b.bbox().center().y)
            .then(a.bbox().left().total_cmp(&b.bbox().left()))
            .then_with(|| a.position_cmp(b))
    });

    let mut rows = vec![];
    let mut open: Option<OpenRow> = None;

    for token in order {
        let center_y = token.bbox().center().y;
        match open.as_mut() {
            Some(row) if row.accepts(center_y, config.row_tolerance) => {
                row.push(token.clone());
            },
            _ => {
                if let Some(row) = open.take().and_then(OpenRow::close) {
                    rows.push(row);
                }
                open = Some(OpenRow::start(token.clone()));
            },
        }
    }

    if let Some(row) = open.and_then(OpenRow::close) {
        rows.push(row);
    }

    rows.sort_by(|a, b| a.top().total_cmp(&b.top()));

    log::debug!("clustered {} tokens into {} rows", tokens.len(), rows.len());
    rows
}

/// Collapse duplicate detections within a left-ordered row.
///
/// Keeps the higher-confidence token of each overlapping pair; on a tie the
/// left-most (earlier) token wins.
fn resolve_duplicates(tokens: Vec<Token>) -> Vec<Token> {
    let mut kept: Vec<Token> = Vec::with_capacity(tokens.len());

    for token in tokens {
        if let Some(last) = kept.last_mut() {
            let narrower = last.bbox().width.min(token.bbox().width);
            if last.bbox().horizontal_overlap(token.bbox()) > DUPLICATE_OVERLAP * narrower {
                log::debug!(
                    "duplicate detection '{}' ({:.2}) vs '{}' ({:.2})",
                    last.text(),
                    last.confidence(),
                    token.text(),
                    token.confidence()
                );
                if token.confidence() > last.confidence() {
                    *last = token;
                }
                continue;
            }
        }
        kept.push(token);
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_token(text: &str, x: f32, y: f32, w: f32, h: f32) -> Token {
        Token::new(text, Rect::new(x, y, w, h), 0.9).unwrap()
    }

    fn texts(rows: &[Row]) -> Vec<String> {
        rows.iter().map(Row::text).collect()
    }

    #[test]
    fn test_single_token_single_row() {
        let rows = cluster_rows(&[mock_token("A", 0.0, 0.0, 10.0, 10.0)], &LayoutConfig::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 1);
    }

    #[test]
    fn test_two_lines() {
        let tokens = vec![
            mock_token("Foo", 0.0, 30.0, 30.0, 12.0),
            mock_token("World", 60.0, 1.0, 50.0, 12.0),
            mock_token("Hello", 0.0, 0.0, 50.0, 12.0),
            mock_token("Bar", 40.0, 31.0, 30.0, 12.0),
        ];
        let rows = cluster_rows(&tokens, &LayoutConfig::default());
        assert_eq!(texts(&rows), vec!["Hello World", "Foo Bar"]);
    }

    #[test]
    fn test_tokens_sorted_left_to_right() {
        let tokens = vec![
            mock_token("right", 100.0, 0.0, 40.0, 12.0),
            mock_token("left", 0.0, 2.0, 40.0, 12.0),
            mock_token("middle", 50.0, 1.0, 40.0, 12.0),
        ];
        let rows = cluster_rows(&tokens, &LayoutConfig::default());
        assert_eq!(texts(&rows), vec!["left middle right"]);
    }

    #[test]
    fn test_skewed_line_stays_together() {
        // Each token drifts down by 3px, within half a line height of the band
        let tokens: Vec<Token> = (0..5)
            .map(|i| mock_token("w", i as f32 * 30.0, i as f32 * 3.0, 25.0, 12.0))
            .collect();
        let rows = cluster_rows(&tokens, &LayoutConfig::default());
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].len(), 5);
    }

    #[test]
    fn test_outlier_becomes_own_row() {
        let tokens = vec![
            mock_token("a", 0.0, 0.0, 20.0, 10.0),
            mock_token("b", 30.0, 0.0, 20.0, 10.0),
            mock_token("footer", 0.0, 900.0, 50.0, 10.0),
        ];
        let rows = cluster_rows(&tokens, &LayoutConfig::default());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].text(), "footer");
    }

    #[test]
    fn test_duplicate_keeps_higher_confidence() {
        let tokens = vec![
            Token::new("Invoice", Rect::new(0.0, 0.0, 60.0, 12.0), 0.6).unwrap(),
            Token::new("lnvoice", Rect::new(2.0, 0.0, 60.0, 12.0), 0.4).unwrap(),
            Token::new("No", Rect::new(70.0, 0.0, 20.0, 12.0), 0.9).unwrap(),
        ];
        let rows = cluster_rows(&tokens, &LayoutConfig::default());
        assert_eq!(texts(&rows), vec!["Invoice No"]);

        let swapped = vec![
            Token::new("lnvoice", Rect::new(0.0, 0.0, 60.0, 12.0), 0.4).unwrap(),
            Token::new("Invoice", Rect::new(2.0, 0.0, 60.0, 12.0), 0.6).unwrap(),
        ];
        let rows = cluster_rows(&swapped, &LayoutConfig::default());
        assert_eq!(texts(&rows), vec!["Invoice"]);
    }

    #[test]
    fn test_equal_confidence_duplicate_ignores_input_order() {
        let a = Token::new("lnvoice", Rect::new(0.0, 0.0, 60.0, 12.0), 0.7).unwrap();
        let b = Token::new("Invoice", Rect::new(0.0, 0.0, 60.0, 12.0), 0.7).unwrap();
        let config = LayoutConfig::default();

        let forward = cluster_rows(&[a.clone(), b.clone()], &config);
        let backward = cluster_rows(&[b, a], &config);
        assert_eq!(texts(&forward), vec!["Invoice"]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_small_overlap_is_not_duplicate() {
        // 5px overlap on 40px-wide boxes stays under the duplicate threshold
        let tokens = vec![
            mock_token("one", 0.0, 0.0, 40.0, 12.0),
            mock_token("two", 35.0, 0.0, 40.0, 12.0),
        ];
        let rows = cluster_rows(&tokens, &LayoutConfig::default());
        assert_eq!(rows[0].len(), 2);
    }

    #[test]
    fn test_row_band_is_union() {
        let tokens = vec![
            mock_token("tall", 0.0, 0.0, 20.0, 20.0),
            mock_token("short", 30.0, 5.0, 20.0, 10.0),
        ];
        let rows = cluster_rows(&tokens, &LayoutConfig::default());
        assert_eq!(rows[0].top(), 0.0);
        assert_eq!(rows[0].bottom(), 20.0);
        assert_eq!(rows[0].left(), 0.0);
    }

    #[test]
    fn test_page_metrics() {
        let tokens = vec![
            mock_token("abcd", 0.0, 0.0, 40.0, 10.0),
            mock_token("ab", 0.0, 20.0, 20.0, 14.0),
            mock_token("abcdef", 0.0, 40.0, 120.0, 12.0),
        ];
        let metrics = PageMetrics::from_tokens(&tokens);
        assert_eq!(metrics.median_token_height, 12.0);
        assert_eq!(metrics.median_char_width, 10.0);
    }
}
