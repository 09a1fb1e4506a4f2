//! Layout reconstruction stages.
//!
//! Each stage consumes the previous stage's output by reference and returns a
//! fresh value:
//! - Token normalization (raw recognizer output → validated tokens)
//! - Row clustering (tokens → horizontal text lines)
//! - Table detection (rows → tables + residual rows)
//! - Paragraph assembly (residual rows → paragraphs)
//! - Reading order (paragraphs + tables → ordered blocks)

pub mod clustering;
pub mod heading_detector;
pub mod model;
pub mod normalizer;
pub mod paragraph;
pub mod reading_order;
pub mod table_detector;
pub mod token;

// Re-export main types
pub use clustering::{cluster_rows, PageMetrics, Row};
pub use model::{
    Block, ConfidenceSummary, LayoutModel, Paragraph, ProcessingStats, Table, TableCell,
};
pub use normalizer::{normalize_tokens, NormalizationReport, NormalizedTokens};
pub use paragraph::assemble_paragraphs;
pub use reading_order::determine_reading_order;
pub use table_detector::{detect_tables, ColumnBoundaries, ColumnSpan, TableDetection};
pub use token::{RawToken, Token};
