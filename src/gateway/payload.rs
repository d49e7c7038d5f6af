use serde::{Deserialize, Serialize};

use crate::gateway::error::GatewayError;
use crate::reranker::{Pair, PairBatch, ScoreVector};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PairPayload {
    pub query: String,
    pub candidate: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct RerankRequest {
    pub pairs: Vec<PairPayload>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RerankResponse {
    pub scores: Vec<f32>,
}

impl From<ScoreVector> for RerankResponse {
    fn from(scores: ScoreVector) -> Self {
        Self {
            scores: scores.into_vec(),
        }
    }
}

impl RerankRequest {
    pub fn into_batch(self) -> PairBatch {
        self.pairs
            .into_iter()
            .map(|p| Pair::new(p.query, p.candidate))
            .collect()
    }
}

/// Decodes and validates a `rerank` body into a [`PairBatch`].
///
/// Every pair needs string `query` and `candidate` fields (empty strings are
/// fine; missing, `null` or non-string values are not). Batches larger than
/// `max_pairs` are rejected before any tokenization happens.
pub fn normalize_request(
    body: serde_json::Value,
    max_pairs: usize,
) -> Result<PairBatch, GatewayError> {
    let request: RerankRequest = serde_json::from_value(body)
        .map_err(|e| GatewayError::InvalidRequest(format!("Invalid request schema: {}", e)))?;

    if request.pairs.len() > max_pairs {
        return Err(GatewayError::InvalidRequest(format!(
            "too many pairs: {} (limit {})",
            request.pairs.len(),
            max_pairs
        )));
    }

    Ok(request.into_batch())
}
