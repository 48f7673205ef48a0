// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama-shaped HTTP embedder: POST `/api/embeddings` with `{model, prompt}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use engram_core::{Embedder, EngramError};

/// Default Ollama endpoint.
const DEFAULT_BASE_URL: &str = "http://localhost:11434";

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

/// HTTP embedder for an Ollama-compatible `/api/embeddings` endpoint.
pub struct OllamaEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaEmbedder {
    /// Creates a new Ollama embedder. `url` overrides the default base URL.
    pub fn new(url: Option<String>, model: String) -> Result<Self, EngramError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| EngramError::Embedder {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            base_url: url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model,
        })
    }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EngramError> {
        let url = format!("{}/api/embeddings", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&EmbeddingsRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| EngramError::Embedder {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngramError::Embedder {
                message: format!("embeddings API returned {status}: {body}"),
                source: None,
            });
        }

        let parsed: EmbeddingsResponse =
            response.json().await.map_err(|e| EngramError::Embedder {
                message: format!("failed to parse embeddings response: {e}"),
                source: Some(Box::new(e)),
            })?;
        if parsed.embedding.is_empty() {
            return Err(EngramError::Embedder {
                message: "embeddings response contained an empty vector".into(),
                source: None,
            });
        }
        Ok(parsed.embedding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn embed_posts_model_and_prompt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .and(body_json(serde_json::json!({
                "model": "nomic-embed-text",
                "prompt": "hello world"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "embedding": [0.1, 0.2, 0.3]
            })))
            .mount(&server)
            .await;

        let embedder =
            OllamaEmbedder::new(Some(server.uri()), "nomic-embed-text".into()).unwrap();
        let vector = embedder.embed("hello world").await.unwrap();
        assert_eq!(vector, vec![0.1, 0.2, 0.3]);
    }

    #[tokio::test]
    async fn embed_surfaces_http_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(ResponseTemplate::new(500).set_body_string("model not loaded"))
            .mount(&server)
            .await;

        let embedder = OllamaEmbedder::new(Some(server.uri()), "m".into()).unwrap();
        let error = embedder.embed("text").await.unwrap_err();
        assert!(error.to_string().contains("500"), "got: {error}");
    }

    #[tokio::test]
    async fn embed_rejects_empty_vector() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/embeddings"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"embedding": []})),
            )
            .mount(&server)
            .await;

        let embedder = OllamaEmbedder::new(Some(server.uri()), "m".into()).unwrap();
        assert!(embedder.embed("text").await.is_err());
    }
}
