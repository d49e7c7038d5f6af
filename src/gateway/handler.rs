use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument};

use crate::constants::{CROSSRANK_STATUS_HEADER, CROSSRANK_STATUS_SCORED};
use crate::gateway::error::GatewayError;
use crate::gateway::payload::{RerankResponse, normalize_request};
use crate::gateway::state::HandlerState;
use crate::reranker::ScoreVector;

#[instrument(skip(state, body), fields(pairs = tracing::field::Empty))]
pub async fn rerank_handler(
    State(state): State<HandlerState>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Response, GatewayError> {
    let Json(body) = body.map_err(|e| GatewayError::InvalidRequest(e.body_text()))?;
    let batch = normalize_request(body, state.max_pairs)?;
    tracing::Span::current().record("pairs", batch.len());

    debug!(pairs = batch.len(), "Processing rerank request");

    let scores = state.rerank(batch).await?;

    Ok(make_response(scores))
}

pub(crate) fn make_response(scores: ScoreVector) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        CROSSRANK_STATUS_HEADER,
        HeaderValue::from_static(CROSSRANK_STATUS_SCORED),
    );

    (
        StatusCode::OK,
        headers,
        Json(RerankResponse::from(scores)),
    )
        .into_response()
}
