//! Paragraph assembly from residual rows.
//!
//! Rows that did not end up in a table are walked top to bottom and merged
//! into paragraphs while they stay close vertically and share a left margin.

use crate::layout::clustering::{PageMetrics, Row};
use crate::layout::heading_detector::is_likely_heading;
use crate::layout::model::{Paragraph, Table};
use crate::layout::token::mean_confidence;
use crate::pipeline::config::LayoutConfig;

/// Merge rows into paragraphs.
///
/// A row continues the open paragraph when all of the following hold:
/// - the vertical gap to the previous row is at most `config.paragraph_gap`
///   times the previous row's height
/// - the left margins differ by less than `config.margin_tolerance` times the
///   page's median character width
/// - no table's vertical extent lies between the two rows
///
/// # Arguments
///
/// * `rows` - Residual rows, top to bottom
/// * `tables` - Accepted tables, used as paragraph barriers
/// * `metrics` - Page measurements providing the character width scale
/// * `config` - Gap and margin factors, heading toggle
///
/// # Returns
///
/// Paragraphs in top-to-bottom order. Every row lands in exactly one.
pub fn assemble_paragraphs(
    rows: &[Row],
    tables: &[Table],
    metrics: &PageMetrics,
    config: &LayoutConfig,
) -> Vec<Paragraph> {
    let margin_tolerance = config.margin_tolerance * metrics.median_char_width;

    let mut paragraphs = vec![];
    let mut current: Vec<&Row> = vec![];

    for row in rows {
        if let Some(prev) = current.last() {
            if continues_paragraph(prev, row, tables, margin_tolerance, config) {
                current.push(row);
                continue;
            }
            paragraphs.push(build_paragraph(&current, config));
            current.clear();
        }
        current.push(row);
    }

    if !current.is_empty() {
        paragraphs.push(build_paragraph(&current, config));
    }

    log::debug!("assembled {} rows into {} paragraphs", rows.len(), paragraphs.len());
    paragraphs
}

fn continues_paragraph(
    prev: &Row,
    row: &Row,
    tables: &[Table],
    margin_tolerance: f32,
    config: &LayoutConfig,
) -> bool {
    let gap = row.top() - prev.bottom();
    if gap > config.paragraph_gap * prev.height() {
        return false;
    }

    if (row.left() - prev.left()).abs() >= margin_tolerance {
        return false;
    }

    let separated = tables
        .iter()
        .any(|t| t.bbox.top() < row.bottom() && t.bbox.bottom() > prev.top());
    !separated
}

fn build_paragraph(rows: &[&Row], config: &LayoutConfig) -> Paragraph {
    let lines: Vec<String> = rows.iter().map(|row| row.text()).collect();
    let confidence = mean_confidence(rows.iter().flat_map(|row| row.tokens.iter()));

    let first = rows[0].bbox;
    let bbox = rows.iter().skip(1).fold(first, |acc, row| acc.union(&row.bbox));

    let is_heading = config.detect_headings && lines.len() == 1 && is_likely_heading(&lines[0]);

    Paragraph {
        lines,
        confidence,
        bbox,
        is_heading,
    }
}
