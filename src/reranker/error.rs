use thiserror::Error;

#[derive(Debug, Error)]
pub enum RerankerError {
    #[error("failed to load reranker model: {reason}")]
    ModelLoadFailed { reason: String },

    #[error("reranker inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("tokenization failed: {reason}")]
    TokenizationFailed { reason: String },

    #[error("invalid reranker configuration: {reason}")]
    InvalidConfig { reason: String },

    /// Model output does not line up with the encoded pair batch.
    #[error("logit shape {actual:?} does not match {expected_rows} encoded sequences")]
    ShapeMismatch {
        expected_rows: usize,
        actual: Vec<usize>,
    },
}

impl From<candle_core::Error> for RerankerError {
    fn from(err: candle_core::Error) -> Self {
        RerankerError::InferenceFailed {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for RerankerError {
    fn from(err: std::io::Error) -> Self {
        RerankerError::ModelLoadFailed {
            reason: err.to_string(),
        }
    }
}
