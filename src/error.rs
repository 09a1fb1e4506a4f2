//! Error types for layout reconstruction.
//!
//! Only [`Error::InvalidInput`] escapes the pipeline for a valid configuration.
//! Everything else that can go wrong with a single token or a single table
//! candidate is absorbed by a fallback policy (drop, demote, default).

/// Result type alias for layout operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during layout reconstruction.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No usable tokens after normalization ("no text detected")
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Bounding box with non-positive or non-finite extent
    #[error("Degenerate geometry for token '{text}': width={width}, height={height}")]
    DegenerateGeometry {
        /// Text of the offending token
        text: String,
        /// Computed box width
        width: f32,
        /// Computed box height
        height: f32,
    },

    /// Configuration value outside its legal range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// JSON export failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// True when the error means the page simply contained no text.
    ///
    /// Callers should report this as "no text found" rather than as a failure.
    pub fn is_no_text(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}
