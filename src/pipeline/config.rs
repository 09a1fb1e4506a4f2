//! Unified configuration for the layout reconstruction pipeline.
//!
//! Every heuristic threshold the stages use lives here, so behavior can be
//! tuned and tested without code changes. Defaults are empirical starting
//! points, validated against synthetic fixtures.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Layout reconstruction configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Row band expansion, as a fraction of the open row's median token height.
    pub row_tolerance: f32,

    /// Minimum horizontal overlap, as a fraction of the narrower span, for two
    /// token spans to share a table column.
    pub column_overlap: f32,

    /// Minimum fraction of non-empty cells for a candidate grid to be a table.
    pub min_table_fill: f32,

    /// Maximum vertical gap between rows of one paragraph, as a multiple of
    /// the previous row's height.
    pub paragraph_gap: f32,

    /// Maximum left-margin difference between rows of one paragraph, as a
    /// fraction of the page's median character width.
    pub margin_tolerance: f32,

    /// Tokens whose (clamped) confidence is below this are dropped.
    pub min_confidence: f32,

    /// Minimum rows for a table. Never below 2.
    pub min_table_rows: usize,

    /// Minimum columns for a table. Never below 2.
    pub min_table_columns: usize,

    /// Run table detection at all.
    pub detect_tables: bool,

    /// Flag short single-line paragraphs that look like headings.
    pub detect_headings: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutConfig {
    /// Create new configuration with defaults.
    pub fn new() -> Self {
        Self {
            row_tolerance: 0.5,
            column_overlap: 0.3,
            min_table_fill: 0.7,
            paragraph_gap: 1.5,
            margin_tolerance: 0.2,
            min_confidence: 0.0,
            min_table_rows: 2,
            min_table_columns: 2,
            detect_tables: true,
            detect_headings: true,
        }
    }

    /// Set the row band tolerance factor.
    pub fn with_row_tolerance(mut self, factor: f32) -> Self {
        self.row_tolerance = factor;
        self
    }

    /// Set the column overlap minimum fraction.
    pub fn with_column_overlap(mut self, fraction: f32) -> Self {
        self.column_overlap = fraction;
        self
    }

    /// Set the table cell-fill minimum fraction.
    pub fn with_min_table_fill(mut self, fraction: f32) -> Self {
        self.min_table_fill = fraction;
        self
    }

    /// Set the paragraph gap factor.
    pub fn with_paragraph_gap(mut self, factor: f32) -> Self {
        self.paragraph_gap = factor;
        self
    }

    /// Set the paragraph margin tolerance.
    pub fn with_margin_tolerance(mut self, factor: f32) -> Self {
        self.margin_tolerance = factor;
        self
    }

    /// Set the confidence floor.
    pub fn with_min_confidence(mut self, confidence: f32) -> Self {
        self.min_confidence = confidence;
        self
    }

    /// Set the minimum table dimensions.
    pub fn with_min_table_size(mut self, rows: usize, columns: usize) -> Self {
        self.min_table_rows = rows;
        self.min_table_columns = columns;
        self
    }

    /// Enable or disable table detection.
    pub fn with_table_detection(mut self, enable: bool) -> Self {
        self.detect_tables = enable;
        self
    }

    /// Enable or disable heading detection.
    pub fn with_heading_detection(mut self, enable: bool) -> Self {
        self.detect_headings = enable;
        self
    }

    /// Check every field against its legal range.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidConfig`] naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        let factors = [
            ("row_tolerance", self.row_tolerance),
            ("paragraph_gap", self.paragraph_gap),
            ("margin_tolerance", self.margin_tolerance),
        ];
        for (name, value) in factors {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::InvalidConfig(format!(
                    "{} must be a non-negative finite number, got {}",
                    name, value
                )));
            }
        }

        let fractions = [
            ("column_overlap", self.column_overlap),
            ("min_table_fill", self.min_table_fill),
            ("min_confidence", self.min_confidence),
        ];
        for (name, value) in fractions {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if self.min_table_rows < 2 || self.min_table_columns < 2 {
            return Err(Error::InvalidConfig(format!(
                "tables need at least 2 rows and 2 columns, got {}x{}",
                self.min_table_rows, self.min_table_columns
            )));
        }

        Ok(())
    }
}
