//! HTTP client helpers for tests.

use crossrank::gateway::{PairPayload, RerankRequest, RerankResponse};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TestClient {
    client: reqwest::Client,
    base_url: String,
}

impl TestClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!("{}/{}", self.base_url, path)
    }

    /// Posts pairs to `/rerank` and returns the decoded scores plus the
    /// `x-crossrank-status` header.
    pub async fn rerank(&self, pairs: &[(&str, &str)]) -> Result<(Vec<f32>, String), TestClientError> {
        let request = RerankRequest {
            pairs: pairs
                .iter()
                .map(|(query, candidate)| PairPayload {
                    query: query.to_string(),
                    candidate: candidate.to_string(),
                })
                .collect(),
        };

        let response = self
            .client
            .post(self.url("/rerank"))
            .json(&request)
            .send()
            .await?;

        let status = response
            .headers()
            .get("x-crossrank-status")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        if !response.status().is_success() {
            return Err(TestClientError::Status {
                code: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: RerankResponse = response.json().await?;
        Ok((body.scores, status))
    }

    /// Posts a raw JSON body to `/rerank`.
    pub async fn rerank_raw(
        &self,
        body: serde_json::Value,
    ) -> Result<(u16, serde_json::Value), TestClientError> {
        let response = self
            .client
            .post(self.url("/rerank"))
            .json(&body)
            .send()
            .await?;
        let code = response.status().as_u16();
        let body = response.json().await?;
        Ok((code, body))
    }

    pub async fn get_json(&self, path: &str) -> Result<(u16, serde_json::Value), TestClientError> {
        let response = self.client.get(self.url(path)).send().await?;
        let code = response.status().as_u16();
        let body = response.json().await?;
        Ok((code, body))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TestClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status {code}: {body}")]
    Status { code: u16, body: String },
}
