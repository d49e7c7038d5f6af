use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::debug;

use crate::gateway::error::GatewayError;
use crate::reranker::{PairBatch, Reranker, ScoreVector};

#[derive(Clone)]
pub struct HandlerState {
    pub reranker: Arc<Reranker>,

    /// Bounds concurrent forward passes on the model's device.
    pub inference_gate: Arc<Semaphore>,

    pub max_pairs: usize,
}

impl HandlerState {
    pub fn new(reranker: Arc<Reranker>, inference_concurrency: usize, max_pairs: usize) -> Self {
        Self {
            reranker,
            inference_gate: Arc::new(Semaphore::new(inference_concurrency.max(1))),
            max_pairs,
        }
    }

    /// Runs one reranking call on a blocking worker while holding a gate permit.
    ///
    /// The call is not cancelled if the client goes away; it runs to
    /// completion and the result is dropped.
    pub async fn rerank(&self, batch: PairBatch) -> Result<ScoreVector, GatewayError> {
        if batch.is_empty() {
            return Ok(ScoreVector::default());
        }

        let permit = self
            .inference_gate
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| GatewayError::InternalError(format!("inference gate closed: {}", e)))?;

        debug!(
            pairs = batch.len(),
            available_permits = self.inference_gate.available_permits(),
            "Acquired inference permit"
        );

        let reranker = Arc::clone(&self.reranker);
        let scores = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            reranker.rerank(&batch)
        })
        .await
        .map_err(|e| GatewayError::InternalError(format!("inference task failed: {}", e)))??;

        Ok(scores)
    }
}
