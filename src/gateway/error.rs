use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::constants::{
    CROSSRANK_STATUS_ERROR, CROSSRANK_STATUS_HEADER, CROSSRANK_STATUS_INVALID_REQUEST,
};
use crate::reranker::RerankerError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("reranking failed: {0}")]
    RerankFailed(#[from] RerankerError),

    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        // Server-side failures are logged in full; the client only sees a
        // fixed message.
        let (status, error_message, crossrank_status) = match &self {
            GatewayError::InvalidRequest(_) => (
                StatusCode::BAD_REQUEST,
                self.to_string(),
                CROSSRANK_STATUS_INVALID_REQUEST,
            ),
            GatewayError::RerankFailed(e) => {
                tracing::error!(error = %e, "Reranking failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error: reranking failed".to_string(),
                    CROSSRANK_STATUS_ERROR,
                )
            }
            GatewayError::InternalError(e) => {
                tracing::error!(error = %e, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                    CROSSRANK_STATUS_ERROR,
                )
            }
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            CROSSRANK_STATUS_HEADER,
            HeaderValue::from_static(crossrank_status),
        );

        let body = Json(ErrorResponse {
            error: error_message,
            code: status.as_u16(),
        });

        (status, headers, body).into_response()
    }
}
