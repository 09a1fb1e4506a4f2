//! Layout reconstruction pipeline.
//!
//! ```text
//! RawToken[] (recognizer output)
//!     ↓
//! [normalize_tokens]      Empty → Normalized
//!     ↓
//! Token[]
//!     ↓
//! [cluster_rows]          → RowClustered
//!     ↓
//! Row[]
//!     ↓
//! [detect_tables]         → TableDetected
//!     ↓
//! Table[] + residual Row[]
//!     ↓
//! [assemble_paragraphs]   → Assembled
//!     ↓
//! [determine_reading_order]
//!     ↓
//! LayoutModel             → Final
//! ```
//!
//! Every stage is a pure function of the previous stage's output, so a page
//! is processed in a single pass and pages are independent of each other.

pub mod config;

pub use config::LayoutConfig;

use std::fmt;

use crate::error::Result;
use crate::layout::clustering::{cluster_rows, PageMetrics};
use crate::layout::model::{ConfidenceSummary, LayoutModel, ProcessingStats};
use crate::layout::normalizer::normalize_tokens;
use crate::layout::paragraph::assemble_paragraphs;
use crate::layout::reading_order::determine_reading_order;
use crate::layout::table_detector::{detect_tables, TableDetection};
use crate::layout::token::RawToken;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Progress of a single pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PipelineStage {
    /// Nothing processed yet
    Empty,
    /// Tokens validated and sorted
    Normalized,
    /// Tokens grouped into rows
    RowClustered,
    /// Tables split from flowing rows
    TableDetected,
    /// Paragraphs built
    Assembled,
    /// Layout model emitted
    Final,
}

impl PipelineStage {
    /// The stage that follows this one. `Final` is terminal.
    pub fn next(self) -> Self {
        match self {
            Self::Empty => Self::Normalized,
            Self::Normalized => Self::RowClustered,
            Self::RowClustered => Self::TableDetected,
            Self::TableDetected => Self::Assembled,
            Self::Assembled | Self::Final => Self::Final,
        }
    }

    /// Move to the next stage, logging the transition.
    fn advance(self) -> Self {
        let next = self.next();
        log::debug!("pipeline stage {} -> {}", self, next);
        next
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Empty => "empty",
            Self::Normalized => "normalized",
            Self::RowClustered => "row-clustered",
            Self::TableDetected => "table-detected",
            Self::Assembled => "assembled",
            Self::Final => "final",
        };
        f.write_str(name)
    }
}

/// The layout reconstruction pipeline.
///
/// Holds a validated configuration; processing itself keeps no state, so one
/// pipeline can be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct LayoutPipeline {
    config: LayoutConfig,
}

impl LayoutPipeline {
    /// Create a pipeline with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a pipeline with custom configuration.
    ///
    /// # Errors
    ///
    /// [`crate::Error::InvalidConfig`] when a threshold is out of range.
    pub fn with_config(config: LayoutConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get the current configuration.
    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// Reconstruct the layout of one page.
    ///
    /// # Errors
    ///
    /// [`crate::Error::InvalidInput`] when no usable token survives
    /// normalization. No partial model is ever returned.
    ///
    /// # Examples
    ///
    /// ```
    /// use ocr_layout::{LayoutPipeline, RawToken};
    ///
    /// let tokens = vec![
    ///     RawToken::new("Hello", 0.0, 0.0, 50.0, 12.0, 0.95),
    ///     RawToken::new("world", 56.0, 0.0, 100.0, 12.0, 0.90),
    /// ];
    /// let model = LayoutPipeline::new().process(&tokens).unwrap();
    /// assert_eq!(model.to_plain_text(), "Hello world");
    /// ```
    pub fn process(&self, raw: &[RawToken]) -> Result<LayoutModel> {
        let config = &self.config;
        let stage = PipelineStage::Empty;

        let normalized = normalize_tokens(raw, config)?;
        let stage = stage.advance();

        let metrics = PageMetrics::from_tokens(&normalized.tokens);
        let rows = cluster_rows(&normalized.tokens, config);
        let stage = stage.advance();

        let detection = if config.detect_tables {
            detect_tables(&rows, config)
        } else {
            TableDetection {
                tables: vec![],
                residual_rows: rows.clone(),
            }
        };
        let stage = stage.advance();

        let paragraphs =
            assemble_paragraphs(&detection.residual_rows, &detection.tables, &metrics, config);
        let stage = stage.advance();

        let tokens_kept: usize = rows.iter().map(|row| row.len()).sum();
        let summary = ConfidenceSummary::from_tokens(rows.iter().flat_map(|row| row.tokens.iter()));
        let report = normalized.report;
        let stats = ProcessingStats {
            raw_tokens: report.received,
            tokens_kept,
            dropped_empty: report.dropped_empty,
            dropped_degenerate: report.dropped_degenerate,
            dropped_low_confidence: report.dropped_low_confidence,
            duplicates_resolved: normalized.tokens.len() - tokens_kept,
            rows: rows.len(),
            paragraphs: paragraphs.len(),
            tables: detection.tables.len(),
        };

        let blocks = determine_reading_order(paragraphs, detection.tables);
        let model = LayoutModel::new(blocks, summary, stats);
        let stage = stage.advance();
        debug_assert_eq!(stage, PipelineStage::Final);

        log::debug!(
            "page reconstructed: {} blocks ({} paragraphs, {} tables), confidence {:.2}",
            model.blocks().len(),
            stats.paragraphs,
            stats.tables,
            model.confidence()
        );

        Ok(model)
    }

    /// Reconstruct several independent pages.
    ///
    /// Results are returned in input order, one per page. With the `parallel`
    /// feature the pages are processed on the rayon thread pool.
    pub fn process_pages(&self, pages: &[Vec<RawToken>]) -> Vec<Result<LayoutModel>> {
        #[cfg(feature = "parallel")]
        let results: Vec<Result<LayoutModel>> =
            pages.par_iter().map(|page| self.process(page)).collect();

        #[cfg(not(feature = "parallel"))]
        let results: Vec<Result<LayoutModel>> =
            pages.iter().map(|page| self.process(page)).collect();

        results
    }
}
