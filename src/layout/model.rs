//! The reconstructed document: ordered paragraphs and tables.
//!
//! A [`LayoutModel`] is the only artifact the pipeline returns. It is built
//! once, at the end of a run, and exposes read-only accessors; callers own it
//! outright and hand it to whatever renders the final document.

use crate::error::Result;
use crate::geometry::Rect;
use crate::layout::token::{mean_confidence, Token};
use serde::{Deserialize, Serialize};

/// One table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Member token texts joined by single spaces, left to right
    pub text: String,
    /// Mean of member token confidences, 0.0 when empty
    pub confidence: f32,
    /// Row index within the table
    pub row: usize,
    /// Column index within the table
    pub column: usize,
}

impl TableCell {
    /// Build a cell from the tokens assigned to it.
    pub fn from_tokens(row: usize, column: usize, tokens: &[&Token]) -> Self {
        let text = tokens
            .iter()
            .map(|t| t.text())
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            text,
            confidence: mean_confidence(tokens.iter().copied()),
            row,
            column,
        }
    }

    /// An empty cell.
    pub fn empty(row: usize, column: usize) -> Self {
        Self::from_tokens(row, column, &[])
    }

    /// True when no token landed in this cell.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// A detected table. Every row has the same number of cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Cells, row-major
    pub rows: Vec<Vec<TableCell>>,
    /// Mean confidence over every token in the table
    pub confidence: f32,
    /// Union of the member rows' boxes
    pub bbox: Rect,
}

impl Table {
    /// Create a table from a rectangular cell grid.
    pub fn new(rows: Vec<Vec<TableCell>>, confidence: f32, bbox: Rect) -> Self {
        debug_assert!(rows.windows(2).all(|pair| pair[0].len() == pair[1].len()));
        Self {
            rows,
            confidence,
            bbox,
        }
    }

    /// Number of rows.
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    /// Number of columns.
    pub fn num_columns(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    /// Cell at `(row, column)`, if in range.
    pub fn cell(&self, row: usize, column: usize) -> Option<&TableCell> {
        self.rows.get(row)?.get(column)
    }

    /// Share of cells holding text.
    pub fn fill_ratio(&self) -> f32 {
        let total = self.num_rows() * self.num_columns();
        if total == 0 {
            return 0.0;
        }
        let filled = self.rows.iter().flatten().filter(|c| !c.is_empty()).count();
        filled as f32 / total as f32
    }
}

/// A block of flowing text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// One entry per visual line, top to bottom
    pub lines: Vec<String>,
    /// Mean confidence over constituent tokens
    pub confidence: f32,
    /// Union of the member rows' boxes
    pub bbox: Rect,
    /// Short single-line text that reads like a heading
    #[serde(default)]
    pub is_heading: bool,
}

impl Paragraph {
    /// Lines joined by a single space.
    pub fn text(&self) -> String {
        self.lines.join(" ")
    }
}

/// A unit of top-level document structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    /// Flowing text
    Paragraph(Paragraph),
    /// Tabular grid
    Table(Table),
}

impl Block {
    /// Bounding box of the block.
    pub fn bbox(&self) -> &Rect {
        match self {
            Block::Paragraph(p) => &p.bbox,
            Block::Table(t) => &t.bbox,
        }
    }

    /// Top edge, the reading-order key.
    pub fn top(&self) -> f32 {
        self.bbox().top()
    }

    /// Aggregate confidence of the block.
    pub fn confidence(&self) -> f32 {
        match self {
            Block::Paragraph(p) => p.confidence,
            Block::Table(t) => t.confidence,
        }
    }

    /// The paragraph, if this is one.
    pub fn as_paragraph(&self) -> Option<&Paragraph> {
        match self {
            Block::Paragraph(p) => Some(p),
            Block::Table(_) => None,
        }
    }

    /// The table, if this is one.
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Block::Table(t) => Some(t),
            Block::Paragraph(_) => None,
        }
    }
}

/// Distribution of token confidences across a page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceSummary {
    /// Mean over all tokens
    pub mean: f32,
    /// Tokens above 0.8
    pub high: usize,
    /// Tokens within 0.5..=0.8
    pub medium: usize,
    /// Tokens below 0.5
    pub low: usize,
}

impl ConfidenceSummary {
    /// Summarize a set of tokens.
    pub fn from_tokens<'a>(tokens: impl IntoIterator<Item = &'a Token> + Clone) -> Self {
        let mut summary = Self {
            mean: mean_confidence(tokens.clone()),
            ..Default::default()
        };
        for token in tokens {
            match token.confidence() {
                c if c > 0.8 => summary.high += 1,
                c if c >= 0.5 => summary.medium += 1,
                _ => summary.low += 1,
            }
        }
        summary
    }

    /// Number of tokens summarized.
    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }
}

/// Counters collected while processing one page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessingStats {
    /// Tokens received from the recognizer
    pub raw_tokens: usize,
    /// Tokens present in the output
    pub tokens_kept: usize,
    /// Dropped for empty text
    pub dropped_empty: usize,
    /// Dropped for degenerate geometry
    pub dropped_degenerate: usize,
    /// Dropped below the confidence floor
    pub dropped_low_confidence: usize,
    /// Duplicate detections collapsed during row clustering
    pub duplicates_resolved: usize,
    /// Rows found
    pub rows: usize,
    /// Paragraph blocks emitted
    pub paragraphs: usize,
    /// Table blocks emitted
    pub tables: usize,
}

/// Final, immutable layout of one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutModel {
    blocks: Vec<Block>,
    confidence: f32,
    confidence_summary: ConfidenceSummary,
    stats: ProcessingStats,
}

impl LayoutModel {
    pub(crate) fn new(
        blocks: Vec<Block>,
        confidence_summary: ConfidenceSummary,
        stats: ProcessingStats,
    ) -> Self {
        Self {
            blocks,
            confidence: confidence_summary.mean,
            confidence_summary,
            stats,
        }
    }

    /// Blocks in reading order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Take ownership of the blocks.
    pub fn into_blocks(self) -> Vec<Block> {
        self.blocks
    }

    /// Mean confidence over every token in the output.
    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    /// Confidence distribution.
    pub fn confidence_summary(&self) -> &ConfidenceSummary {
        &self.confidence_summary
    }

    /// Processing counters.
    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }

    /// Paragraph blocks in reading order.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.blocks.iter().filter_map(Block::as_paragraph)
    }

    /// Table blocks in reading order.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.blocks.iter().filter_map(Block::as_table)
    }

    /// Render as plain text.
    ///
    /// Paragraph lines are newline-separated, table rows are tab-separated,
    /// and blocks are separated by a blank line.
    pub fn to_plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(|block| match block {
                Block::Paragraph(p) => p.lines.join("\n"),
                Block::Table(t) => t
                    .rows
                    .iter()
                    .map(|row| {
                        row.iter()
                            .map(|c| c.text.as_str())
                            .collect::<Vec<_>>()
                            .join("\t")
                    })
                    .collect::<Vec<_>>()
                    .join("\n"),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Serialize the blocks as JSON, tagged by `"type"`.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.blocks)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str, confidence: f32) -> Token {
        Token::new(text, Rect::new(0.0, 0.0, 10.0, 10.0), confidence).unwrap()
    }

    fn paragraph(lines: &[&str], y: f32) -> Paragraph {
        Paragraph {
            lines: lines.iter().map(|s| s.to_string()).collect(),
            confidence: 0.9,
            bbox: Rect::new(0.0, y, 100.0, 12.0),
            is_heading: false,
        }
    }

    fn table() -> Table {
        let a = token("a", 1.0);
        let b = token("b", 0.5);
        Table::new(
            vec![
                vec![TableCell::from_tokens(0, 0, &[&a]), TableCell::from_tokens(0, 1, &[&b])],
                vec![TableCell::from_tokens(1, 0, &[&a, &b]), TableCell::empty(1, 1)],
            ],
            0.75,
            Rect::new(0.0, 50.0, 100.0, 30.0),
        )
    }

    #[test]
    fn test_cell_aggregates_tokens() {
        let t = table();
        assert_eq!(t.cell(1, 0).unwrap().text, "a b");
        assert_eq!(t.cell(1, 0).unwrap().confidence, 0.75);
        assert!(t.cell(1, 1).unwrap().is_empty());
        assert_eq!(t.cell(1, 1).unwrap().confidence, 0.0);
        assert!(t.cell(2, 0).is_none());
        assert_eq!(t.fill_ratio(), 0.75);
    }

    #[test]
    fn test_confidence_summary_bands() {
        let tokens = vec![token("a", 0.95), token("b", 0.8), token("c", 0.5), token("d", 0.1)];
        let summary = ConfidenceSummary::from_tokens(&tokens);
        assert_eq!(summary.high, 1);
        assert_eq!(summary.medium, 2);
        assert_eq!(summary.low, 1);
        assert_eq!(summary.total(), 4);
        assert!((summary.mean - 0.5875).abs() < 1e-5);
    }

    #[test]
    fn test_plain_text() {
        let model = LayoutModel::new(
            vec![
                Block::Paragraph(paragraph(&["first line", "second line"], 0.0)),
                Block::Table(table()),
            ],
            ConfidenceSummary::default(),
            ProcessingStats::default(),
        );
        assert_eq!(model.to_plain_text(), "first line\nsecond line\n\na\tb\na b\t");
        assert_eq!(model.paragraphs().count(), 1);
        assert_eq!(model.tables().count(), 1);
    }

    #[test]
    fn test_json_shape() {
        let model = LayoutModel::new(
            vec![Block::Paragraph(paragraph(&["hi"], 0.0)), Block::Table(table())],
            ConfidenceSummary::default(),
            ProcessingStats::default(),
        );
        let value: serde_json::Value = serde_json::from_str(&model.to_json().unwrap()).unwrap();
        assert_eq!(value[0]["type"], "paragraph");
        assert_eq!(value[0]["lines"][0], "hi");
        assert_eq!(value[1]["type"], "table");
        assert_eq!(value[1]["rows"][0][1]["text"], "b");
        assert_eq!(value[1]["rows"][1][1]["confidence"], 0.0);
    }

    #[test]
    fn test_block_accessors() {
        let block = Block::Table(table());
        assert_eq!(block.top(), 50.0);
        assert_eq!(block.confidence(), 0.75);
        assert!(block.as_paragraph().is_none());
        assert!(block.as_table().is_some());
    }
}
