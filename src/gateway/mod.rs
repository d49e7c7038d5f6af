//! HTTP gateway (Axum) exposing the `rerank` operation.
//!
//! Used by the `crossrank` binary and the integration tests.

pub mod error;
pub mod handler;
pub mod payload;
pub mod state;


use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use handler::rerank_handler;
pub use payload::{PairPayload, RerankRequest, RerankResponse};
pub use state::HandlerState;

use crate::constants::{CROSSRANK_STATUS_HEADER, CROSSRANK_STATUS_HEALTHY, CROSSRANK_STATUS_READY};
use crate::model::device_label;

pub fn create_router_with_state(state: HandlerState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/rerank", post(rerank_handler))
        .route("/v1/rerank", post(rerank_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(serde::Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub model_mode: &'static str,
    pub device: &'static str,
    pub max_seq_len: usize,
    pub max_pairs: usize,
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        CROSSRANK_STATUS_HEADER,
        HeaderValue::from_static(CROSSRANK_STATUS_HEALTHY),
    );

    (
        StatusCode::OK,
        headers,
        Json(HealthResponse { status: "ok" }),
    )
        .into_response()
}

/// The model is loaded before the listener binds, so a serving process is
/// always ready; the body reports which model is answering.
#[tracing::instrument(skip(state))]
pub async fn ready_handler(State(state): State<HandlerState>) -> Response {
    let reranker = &state.reranker;
    let model_mode = if reranker.is_model_loaded() {
        "model"
    } else {
        "stub"
    };

    let mut headers = HeaderMap::new();
    headers.insert(
        CROSSRANK_STATUS_HEADER,
        HeaderValue::from_static(CROSSRANK_STATUS_READY),
    );

    (
        StatusCode::OK,
        headers,
        Json(ReadyResponse {
            status: "ok",
            model_mode,
            device: device_label(reranker.device()),
            max_seq_len: reranker.max_seq_len(),
            max_pairs: state.max_pairs,
        }),
    )
        .into_response()
}
