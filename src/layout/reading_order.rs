//! Reading order determination for reconstructed blocks.
//!
//! Paragraphs and tables are interleaved top to bottom. Image coordinates
//! have the origin at the top-left, so a smaller `top` reads first.

use std::cmp::Ordering;

use crate::layout::model::{Block, Paragraph, Table};

/// Interleave paragraphs and tables into reading order.
///
/// Blocks are ordered by their top edge, then by their left edge. Exact ties
/// keep paragraphs before tables and otherwise preserve input order, so the
/// result is fully deterministic.
///
/// # Arguments
///
/// * `paragraphs` - Assembled paragraphs
/// * `tables` - Accepted tables, each positioned at its first row
///
/// # Returns
///
/// All blocks, sorted into reading order.
///
/// # Examples
///
/// ```
/// use ocr_layout::geometry::Rect;
/// use ocr_layout::layout::model::Paragraph;
/// use ocr_layout::layout::reading_order::determine_reading_order;
///
/// let paragraph = |text: &str, y: f32| Paragraph {
///     lines: vec![text.to_string()],
///     confidence: 1.0,
///     bbox: Rect::new(0.0, y, 100.0, 12.0),
///     is_heading: false,
/// };
/// let blocks = determine_reading_order(vec![paragraph("second", 50.0), paragraph("first", 0.0)], vec![]);
/// assert_eq!(blocks[0].as_paragraph().unwrap().lines[0], "first");
/// ```
pub fn determine_reading_order(paragraphs: Vec<Paragraph>, tables: Vec<Table>) -> Vec<Block> {
    let mut blocks: Vec<Block> = paragraphs
        .into_iter()
        .map(Block::Paragraph)
        .chain(tables.into_iter().map(Block::Table))
        .collect();

    // Stable sort: paragraphs were chained first, so they win exact ties
    blocks.sort_by(precedence);
    blocks
}

/// Ordering of two blocks: top edge first, then left edge.
fn precedence(a: &Block, b: &Block) -> Ordering {
    a.top()
        .total_cmp(&b.top())
        .then(a.bbox().left().total_cmp(&b.bbox().left()))
}
