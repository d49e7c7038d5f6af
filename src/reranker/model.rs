use candle_core::{DType, Tensor};

use crate::model::SequenceClassifier;

use super::error::RerankerError;
use super::types::EncodedBatch;

/// Forward pass of a sequence-classification cross-encoder.
///
/// Implementations return logits shaped `[rows]`, `[rows, 1]` or `[rows, 2]`
/// for the `rows` sequences of `batch`, one row per input row, in order.
/// Shared across requests behind an `Arc`; `forward` must not mutate state
/// visible to other callers.
pub trait CrossEncoderModel: Send + Sync {
    fn forward(&self, batch: &EncodedBatch) -> Result<Tensor, RerankerError>;

    /// Longest token row the model accepts, if it has a hard limit.
    fn max_input_len(&self) -> Option<usize> {
        None
    }
}

impl CrossEncoderModel for SequenceClassifier {
    fn forward(&self, batch: &EncodedBatch) -> Result<Tensor, RerankerError> {
        SequenceClassifier::forward(
            self,
            batch.input_ids(),
            batch.token_type_ids(),
            batch.attention_mask(),
        )
        .map_err(|e| RerankerError::InferenceFailed {
            reason: e.to_string(),
        })
    }

    fn max_input_len(&self) -> Option<usize> {
        SequenceClassifier::max_input_len(self)
    }
}

/// Deterministic stand-in used when no model directory is configured.
///
/// Emits a two-label head per row: `ln(1 + tokens)` as "relevant" and its
/// negation as "not relevant", where `tokens` counts unmasked positions.
#[derive(Debug, Clone, Copy, Default)]
pub struct StubModel;

impl CrossEncoderModel for StubModel {
    fn forward(&self, batch: &EncodedBatch) -> Result<Tensor, RerankerError> {
        let tokens = batch.attention_mask().to_dtype(DType::F32)?.sum(1)?;
        let relevant = tokens.affine(1.0, 1.0)?.log()?;
        let not_relevant = relevant.neg()?;
        Ok(Tensor::stack(&[&not_relevant, &relevant], 1)?)
    }
}
