// Allow some clippy lints that are too pedantic for this project
#![allow(clippy::needless_range_loop)]

//! # OCR Layout
//!
//! Rebuilds document structure from the flat token stream an OCR engine
//! emits: each token is a piece of text, a bounding box and a confidence.
//! The crate infers reading order, paragraph breaks and tabular grids purely
//! from geometry and returns a [`LayoutModel`] of ordered paragraphs and
//! tables, ready for a document renderer.
//!
//! ## Pipeline
//!
//! - **Normalization**: drop empty and zero-area tokens, clamp confidence
//! - **Row clustering**: group tokens into visual lines, collapse duplicates
//! - **Table detection**: promote column-aligned row runs to tables
//! - **Paragraph assembly**: merge remaining lines by gap and left margin
//! - **Reading order**: interleave paragraphs and tables top to bottom
//!
//! Image acquisition, recognition and rendering are out of scope; the crate
//! does no I/O.
//!
//! ## Quick Start
//!
//! ```
//! use ocr_layout::{reconstruct_layout, Block, LayoutConfig, RawToken};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let tokens = vec![
//!     RawToken::new("Item", 0.0, 0.0, 40.0, 12.0, 0.97),
//!     RawToken::new("Qty", 120.0, 0.0, 150.0, 12.0, 0.95),
//!     RawToken::new("Bolts", 0.0, 20.0, 45.0, 32.0, 0.91),
//!     RawToken::new("12", 120.0, 20.0, 136.0, 32.0, 0.88),
//! ];
//!
//! let model = reconstruct_layout(&tokens, &LayoutConfig::default())?;
//! match &model.blocks()[0] {
//!     Block::Table(table) => assert_eq!(table.cell(1, 0).unwrap().text, "Bolts"),
//!     Block::Paragraph(_) => unreachable!(),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## License
//!
//! Licensed under either of:
//!
//! * Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <http://www.apache.org/licenses/LICENSE-2.0>)
//! * MIT license ([LICENSE-MIT](LICENSE-MIT) or <http://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]

// Error handling
pub mod error;

// Layout reconstruction
pub mod geometry;
pub mod layout;

// Pipeline orchestration
pub mod pipeline;

// Re-exports
pub use error::{Error, Result};
pub use layout::{
    Block, ConfidenceSummary, LayoutModel, Paragraph, ProcessingStats, RawToken, Table, TableCell,
    Token,
};
pub use pipeline::{LayoutConfig, LayoutPipeline, PipelineStage};

/// Reconstruct the layout of one page of OCR tokens.
///
/// Convenience wrapper around [`LayoutPipeline`].
///
/// # Errors
///
/// * [`Error::InvalidConfig`] when `config` fails validation
/// * [`Error::InvalidInput`] when no usable token is present
pub fn reconstruct_layout(tokens: &[RawToken], config: &LayoutConfig) -> Result<LayoutModel> {
    LayoutPipeline::with_config(config.clone())?.process(tokens)
}
