//! Pair-batch codec.
//!
//! Owns the block layout shared by encoding and score extraction: for a batch
//! of `N` pairs the model sees `2N` rows, queries `0..N` followed by
//! candidates `N..2N`, so row `i` and row `N + i` both belong to pair `i`.
//! [`PairBatchCodec::encode`] and [`PairBatchCodec::decode`] are the only
//! places that know this; change them together or not at all.

use candle_core::{DType, Device, IndexOp, Tensor};
use tokenizers::Tokenizer;
use tracing::debug;

use crate::constants::{PAIR_BLOCKS, RELEVANT_CLASS};

use super::error::RerankerError;
use super::types::{EncodedBatch, PairBatch, ScoreVector};

/// Block whose logits are returned as pair scores.
const CANDIDATE_BLOCK: usize = 1;

#[derive(Debug, Clone, Copy, Default)]
pub struct PairBatchCodec;

impl PairBatchCodec {
    /// Flattens pairs into `2N` texts: all queries, then all candidates.
    pub fn flatten(batch: &PairBatch) -> Vec<&str> {
        let mut texts = Vec::with_capacity(PAIR_BLOCKS * batch.len());
        texts.extend(batch.queries());
        texts.extend(batch.candidates());
        texts
    }

    /// Tokenizes the flattened batch in one call and packs it into `[2N, L]`
    /// tensors on `device`.
    ///
    /// The tokenizer must pad to the batch's longest row (see
    /// [`crate::model::configure_batching`]); ragged output is rejected.
    pub fn encode(
        batch: &PairBatch,
        tokenizer: &Tokenizer,
        device: &Device,
    ) -> Result<EncodedBatch, RerankerError> {
        let pairs = batch.len();
        let texts = Self::flatten(batch);
        let rows = texts.len();

        if rows == 0 {
            let empty = Tensor::zeros((0, 0), DType::U32, device)?;
            return Ok(EncodedBatch {
                input_ids: empty.clone(),
                token_type_ids: empty.clone(),
                attention_mask: empty,
                pairs,
            });
        }

        let encodings =
            tokenizer
                .encode_batch(texts, true)
                .map_err(|e| RerankerError::TokenizationFailed {
                    reason: e.to_string(),
                })?;

        if encodings.len() != rows {
            return Err(RerankerError::TokenizationFailed {
                reason: format!("expected {} encodings, got {}", rows, encodings.len()),
            });
        }

        let seq_len = encodings.iter().map(|e| e.len()).max().unwrap_or(0);
        let mut ids = Vec::with_capacity(rows * seq_len);
        let mut mask = Vec::with_capacity(rows * seq_len);

        for encoding in &encodings {
            if encoding.len() != seq_len {
                return Err(RerankerError::TokenizationFailed {
                    reason: "tokenizer is not padding batches to a common length".to_string(),
                });
            }
            ids.extend_from_slice(encoding.get_ids());
            mask.extend_from_slice(encoding.get_attention_mask());
        }

        debug!(pairs, rows, seq_len, "Encoded pair batch");

        let input_ids = Tensor::from_vec(ids, (rows, seq_len), device)?;
        let attention_mask = Tensor::from_vec(mask, (rows, seq_len), device)?;
        let token_type_ids = input_ids.zeros_like()?;

        Ok(EncodedBatch {
            input_ids,
            token_type_ids,
            attention_mask,
            pairs,
        })
    }

    /// Recovers one score per pair from `[2N]`, `[2N, 1]` or `[2N, 2]` logits.
    ///
    /// Two-label heads contribute their "relevant" channel. The per-row logits
    /// are viewed as `[2, N]` and the candidate block is returned as-is (raw
    /// logits, no softmax).
    pub fn decode(logits: &Tensor, pairs: usize) -> Result<ScoreVector, RerankerError> {
        let expected_rows = PAIR_BLOCKS * pairs;
        let mismatch = || RerankerError::ShapeMismatch {
            expected_rows,
            actual: logits.dims().to_vec(),
        };

        let per_row = match logits.dims() {
            [rows] if *rows == expected_rows => logits.clone(),
            [rows, 1] if *rows == expected_rows => logits.squeeze(1)?,
            [rows, 2] if *rows == expected_rows => logits.i((.., RELEVANT_CLASS))?,
            _ => return Err(mismatch()),
        };

        let scores = per_row
            .to_dtype(DType::F32)?
            .reshape((PAIR_BLOCKS, pairs))?
            .i(CANDIDATE_BLOCK)?
            .to_vec1::<f32>()?;
        if scores.len() != pairs {
            return Err(mismatch());
        }

        Ok(ScoreVector::new(scores))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::stub_tokenizer;
    use crate::reranker::types::Pair;

    fn batch(pairs: &[(&str, &str)]) -> PairBatch {
        pairs.iter().map(|(q, c)| Pair::new(*q, *c)).collect()
    }

    #[test]
    fn test_flatten_places_queries_before_candidates() {
        let b = batch(&[("q0", "c0"), ("q1", "c1"), ("q2", "c2")]);
        assert_eq!(
            PairBatchCodec::flatten(&b),
            vec!["q0", "q1", "q2", "c0", "c1", "c2"]
        );
    }

    #[test]
    fn test_encode_shapes_and_padding() {
        let tokenizer = stub_tokenizer(16).unwrap();
        let b = batch(&[("short", "a much longer candidate"), ("", "x")]);

        let encoded = PairBatchCodec::encode(&b, &tokenizer, &Device::Cpu).unwrap();

        assert_eq!(encoded.pairs(), 2);
        assert_eq!(encoded.rows(), 4);
        assert_eq!(encoded.seq_len(), 4);
        assert_eq!(encoded.attention_mask().dims(), &[4, 4]);

        let mask = encoded.attention_mask().to_vec2::<u32>().unwrap();
        assert_eq!(mask[0], vec![1, 0, 0, 0]);
        assert_eq!(mask[1], vec![0, 0, 0, 0]);
        assert_eq!(mask[2], vec![1, 1, 1, 1]);
        assert_eq!(mask[3], vec![1, 0, 0, 0]);

        let type_ids = encoded.token_type_ids().to_vec2::<u32>().unwrap();
        assert!(type_ids.iter().flatten().all(|t| *t == 0));
    }

    #[test]
    fn test_encode_truncates_long_text() {
        let tokenizer = stub_tokenizer(3).unwrap();
        let long_query = vec!["word"; 50].join(" ");
        let b = batch(&[(long_query.as_str(), "candidate")]);

        let encoded = PairBatchCodec::encode(&b, &tokenizer, &Device::Cpu).unwrap();

        assert_eq!(encoded.rows(), 2);
        assert_eq!(encoded.seq_len(), 3);
    }

    #[test]
    fn test_encode_empty_batch_skips_tokenizer() {
        let tokenizer = stub_tokenizer(8).unwrap();
        let encoded = PairBatchCodec::encode(&PairBatch::default(), &tokenizer, &Device::Cpu)
            .unwrap();

        assert_eq!(encoded.pairs(), 0);
        assert_eq!(encoded.rows(), 0);
    }

    #[test]
    fn test_decode_two_label_head_takes_relevant_channel() {
        let logits = Tensor::from_vec(
            vec![0f32, 1., 0., 1., 0., 1., 0., 1.],
            (4, 2),
            &Device::Cpu,
        )
        .unwrap();

        let scores = PairBatchCodec::decode(&logits, 2).unwrap();
        assert_eq!(scores.as_slice(), &[1.0, 1.0]);
    }

    #[test]
    fn test_decode_returns_candidate_block_in_order() {
        // rows: q0, q1, q2, c0, c1, c2
        let logits = Tensor::from_vec(
            vec![10f32, 11., 12., 20., 21., 22.],
            (6, 1),
            &Device::Cpu,
        )
        .unwrap();

        let scores = PairBatchCodec::decode(&logits, 3).unwrap();
        assert_eq!(scores.as_slice(), &[20.0, 21.0, 22.0]);
    }

    #[test]
    fn test_decode_two_label_picks_candidate_rows() {
        let logits = Tensor::from_vec(
            vec![
                -1f32, 1., // q0
                -2., 2., // q1
                -3., 3., // c0
                -4., 4., // c1
            ],
            (4, 2),
            &Device::Cpu,
        )
        .unwrap();

        let scores = PairBatchCodec::decode(&logits, 2).unwrap();
        assert_eq!(scores.as_slice(), &[3.0, 4.0]);
    }

    #[test]
    fn test_decode_accepts_squeezed_logits() {
        let logits = Tensor::from_vec(vec![0.5f32, -0.5], 2, &Device::Cpu).unwrap();

        let scores = PairBatchCodec::decode(&logits, 1).unwrap();
        assert_eq!(scores.as_slice(), &[-0.5]);
    }

    #[test]
    fn test_decode_keeps_raw_logits() {
        let logits = Tensor::from_vec(vec![0f32, 0., -7.5, 12.25], (4, 1), &Device::Cpu).unwrap();

        let scores = PairBatchCodec::decode(&logits, 2).unwrap();
        assert_eq!(scores.as_slice(), &[-7.5, 12.25]);
    }

    #[test]
    fn test_decode_row_mismatch_is_an_error() {
        let logits = Tensor::from_vec(vec![0f32; 6], (3, 2), &Device::Cpu).unwrap();

        let err = PairBatchCodec::decode(&logits, 2).unwrap_err();
        match err {
            RerankerError::ShapeMismatch {
                expected_rows,
                actual,
            } => {
                assert_eq!(expected_rows, 4);
                assert_eq!(actual, vec![3, 2]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_unsupported_label_count_is_an_error() {
        let logits = Tensor::from_vec(vec![0f32; 12], (4, 3), &Device::Cpu).unwrap();

        assert!(matches!(
            PairBatchCodec::decode(&logits, 2),
            Err(RerankerError::ShapeMismatch { .. })
        ));
    }
}
