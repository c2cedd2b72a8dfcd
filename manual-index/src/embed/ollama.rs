//! Ollama embedding provider implementation.
//!
//! Calls `POST {endpoint}/api/embeddings` with `reqwest::Client`. Text only.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{EmbedFuture, EmbedInput, Embedder};
use crate::errors::SearchError;

/// Configuration for the Ollama embedding backend.
#[derive(Clone, Debug)]
pub struct OllamaConfig {
    /// Base URL, e.g. `http://localhost:11434`.
    pub endpoint: String,
    /// Embedding model, e.g. `bge-m3`.
    pub model: String,
    /// Expected embedding dimension size.
    pub dim: usize,
    /// Per-request HTTP timeout.
    pub timeout: Duration,
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

/// Ollama embedding provider (async).
#[derive(Clone, Debug)]
pub struct OllamaEmbedder {
    client: reqwest::Client,
    url_embeddings: String,
    model: String,
    dim: usize,
}

impl OllamaEmbedder {
    /// # Errors
    /// Returns [`SearchError::Config`] for an empty/non-http endpoint or if the
    /// HTTP client cannot be built.
    pub fn new(cfg: OllamaConfig) -> Result<Self, SearchError> {
        let endpoint = cfg.endpoint.trim();
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(SearchError::Config(format!(
                "invalid Ollama endpoint: {:?}",
                cfg.endpoint
            )));
        }
        if cfg.model.trim().is_empty() {
            return Err(SearchError::Config("embedding model must not be empty".into()));
        }

        let client = reqwest::Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| SearchError::Config(format!("http client: {e}")))?;

        Ok(Self {
            client,
            url_embeddings: format!("{}/api/embeddings", endpoint.trim_end_matches('/')),
            model: cfg.model,
            dim: cfg.dim,
        })
    }

    #[instrument(skip_all, fields(model = %self.model, len = text.len()))]
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, SearchError> {
        if text.trim().is_empty() {
            return Err(SearchError::UnsupportedInput("text is empty".into()));
        }

        let resp = self
            .client
            .post(&self.url_embeddings)
            .json(&EmbeddingsRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| SearchError::Embedding(format!("transport: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(SearchError::Embedding(format!(
                "HTTP {status} from {}: {snippet}",
                self.url_embeddings
            )));
        }

        let parsed: EmbeddingsResponse = resp
            .json()
            .await
            .map_err(|e| SearchError::Embedding(format!("decode: {e}")))?;

        if parsed.embedding.len() != self.dim {
            return Err(SearchError::DimensionMismatch {
                got: parsed.embedding.len(),
                want: self.dim,
            });
        }

        debug!("embed::ollama ok dim={}", self.dim);
        Ok(parsed.embedding)
    }
}

impl Embedder for OllamaEmbedder {
    fn embed<'a>(&'a self, input: EmbedInput<'a>) -> EmbedFuture<'a> {
        Box::pin(async move {
            match input {
                EmbedInput::Text(text) => self.embed_text(text).await,
                EmbedInput::Image(_) => Err(SearchError::UnsupportedInput(
                    "ollama embedder only accepts text".into(),
                )),
            }
        })
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn cfg(endpoint: String, dim: usize) -> OllamaConfig {
        OllamaConfig {
            endpoint,
            model: "bge-m3".into(),
            dim,
            timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn returns_remote_embedding() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "embedding": [0.1, 0.2, 0.3] })),
            )
            .mount(&server)
            .await;

        let e = OllamaEmbedder::new(cfg(server.uri(), 3)).unwrap();
        let v = e.embed(EmbedInput::Text("brake fluid")).await.unwrap();
        assert_eq!(v, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn rejects_wrong_dimension_and_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "embedding": [1.0] })),
            )
            .mount(&server)
            .await;
        let e = OllamaEmbedder::new(cfg(server.uri(), 4)).unwrap();
        let err = e.embed(EmbedInput::Text("x")).await.unwrap_err();
        assert!(matches!(err, SearchError::DimensionMismatch { got: 1, want: 4 }));

        let failing = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
            .mount(&failing)
            .await;
        let e = OllamaEmbedder::new(cfg(failing.uri(), 4)).unwrap();
        let err = e.embed(EmbedInput::Text("x")).await.unwrap_err();
        assert!(matches!(err, SearchError::Embedding(msg) if msg.contains("model not loaded")));
    }

    #[test]
    fn rejects_bad_endpoint() {
        let err = OllamaEmbedder::new(cfg("localhost:11434".into(), 3)).unwrap_err();
        assert!(matches!(err, SearchError::Config(_)));
    }
}
