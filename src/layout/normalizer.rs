//! Token normalization.
//!
//! First pipeline stage: turns raw recognizer output into validated
//! [`Token`]s sorted by `(top, left)`. Bad tokens are dropped and counted,
//! never fatal; only a page with no surviving tokens is an error.

use crate::error::{Error, Result};
use crate::layout::token::{RawToken, Token};
use crate::pipeline::config::LayoutConfig;

/// Counts of tokens dropped during normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NormalizationReport {
    /// Tokens received from the recognizer
    pub received: usize,
    /// Tokens whose text was empty or whitespace-only
    pub dropped_empty: usize,
    /// Tokens with non-finite or zero-area boxes
    pub dropped_degenerate: usize,
    /// Tokens below the configured confidence floor
    pub dropped_low_confidence: usize,
}

impl NormalizationReport {
    /// Number of tokens that survived.
    pub fn kept(&self) -> usize {
        self.received - self.dropped_empty - self.dropped_degenerate - self.dropped_low_confidence
    }
}

/// Output of the normalization stage.
#[derive(Debug, Clone)]
pub struct NormalizedTokens {
    /// Valid tokens sorted by `(top, left)`
    pub tokens: Vec<Token>,
    /// What was dropped and why
    pub report: NormalizationReport,
}

/// Validate and clean raw recognizer output.
///
/// # Arguments
///
/// * `raw` - Recognizer tokens, in any order
/// * `config` - Supplies the confidence floor
///
/// # Returns
///
/// The surviving tokens sorted top-to-bottom then left-to-right.
///
/// # Errors
///
/// [`Error::InvalidInput`] when no token survives; callers should treat it
/// as "no text detected".
///
/// # Examples
///
/// ```
/// use ocr_layout::layout::{normalize_tokens, RawToken};
/// use ocr_layout::LayoutConfig;
///
/// let raw = vec![
///     RawToken::new("world", 60.0, 0.0, 110.0, 12.0, 0.9),
///     RawToken::new("   ", 0.0, 0.0, 10.0, 12.0, 0.9),
///     RawToken::new("Hello", 0.0, 0.0, 50.0, 12.0, 0.9),
/// ];
/// let normalized = normalize_tokens(&raw, &LayoutConfig::default()).unwrap();
/// assert_eq!(normalized.tokens[0].text(), "Hello");
/// assert_eq!(normalized.report.dropped_empty, 1);
/// ```
pub fn normalize_tokens(raw: &[RawToken], config: &LayoutConfig) -> Result<NormalizedTokens> {
    let mut report = NormalizationReport {
        received: raw.len(),
        ..Default::default()
    };
    let mut tokens = Vec::with_capacity(raw.len());

    for (idx, raw_token) in raw.iter().enumerate() {
        match Token::try_from(raw_token) {
            Ok(token) if token.confidence() < config.min_confidence => {
                log::trace!(
                    "token[{}] '{}' below confidence floor ({:.2} < {:.2})",
                    idx,
                    token.text(),
                    token.confidence(),
                    config.min_confidence
                );
                report.dropped_low_confidence += 1;
            },
            Ok(token) => tokens.push(token),
            Err(err @ Error::DegenerateGeometry { .. }) => {
                log::warn!("dropping token[{}]: {}", idx, err);
                report.dropped_degenerate += 1;
            },
            Err(_) => {
                log::trace!("token[{}] has empty text", idx);
                report.dropped_empty += 1;
            },
        }
    }

    if tokens.is_empty() {
        return Err(Error::InvalidInput(format!(
            "no text detected ({} raw tokens, none usable)",
            report.received
        )));
    }

    // Only identical tokens tie, so input order never shows through
    tokens.sort_by(Token::position_cmp);

    log::debug!(
        "normalized {} of {} tokens (empty={}, degenerate={}, low_confidence={})",
        tokens.len(),
        report.received,
        report.dropped_empty,
        report.dropped_degenerate,
        report.dropped_low_confidence
    );

    Ok(NormalizedTokens { tokens, report })
}
