//! Error type shared by every fallible NLMeans2x operation.

use thiserror::Error;

/// Errors surfaced by filter construction and frame processing.
///
/// Configuration and format problems are always detected when the filter is
/// built, before any frame is requested. Per-pixel computation never fails
/// unless [`WeightPolicy::Reject`](crate::config::WeightPolicy) is selected.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NlmError {
    /// Invalid filter parameters or property map contents.
    #[error("NLMeans2x: {0}")]
    Configuration(String),

    /// Source clip or frame is not constant-dimension 32-bit float.
    #[error("NLMeans2x: {0}")]
    Format(String),

    /// Total similarity weight for a pixel was zero or not finite.
    #[error("NLMeans2x: degenerate weight sum at plane {plane}, row {row}, col {col}")]
    DegenerateWeight { plane: usize, row: usize, col: usize },

    /// The frame source has no frame with this index.
    #[error("NLMeans2x: frame {0} is not available")]
    FrameUnavailable(usize),
}

impl NlmError {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        NlmError::Configuration(msg.into())
    }

    pub(crate) fn format(msg: impl Into<String>) -> Self {
        NlmError::Format(msg.into())
    }
}

pub type NlmResult<T> = Result<T, NlmError>;
