// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-shaped HTTP embedder: POST `/v1/embeddings` with bearer auth.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};

use engram_core::{Embedder, EngramError};

/// Default API base.
const DEFAULT_BASE_URL: &str = "https://api.openai.com";

#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingObject>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingObject {
    embedding: Vec<f32>,
}

/// HTTP embedder for an OpenAI-compatible `/v1/embeddings` endpoint.
pub struct OpenAiEmbedder {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OpenAiEmbedder {
    /// Creates a new embedder with the given bearer key.
    pub fn new(url: Option<String>, model: String, api_key: String) -> Result<Self, EngramError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| EngramError::Config(format!("invalid API key header value: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
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
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EngramError> {
        let url = format!("{}/v1/embeddings", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&EmbeddingsRequest {
                model: &self.model,
                input: text,
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
        parsed
            .data
            .into_iter()
            .next()
            .map(|object| object.embedding)
            .filter(|embedding| !embedding.is_empty())
            .ok_or_else(|| EngramError::Embedder {
                message: "embeddings response contained no vectors".into(),
                source: None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn embed_sends_bearer_auth() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .and(header("authorization", "Bearer sk-test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"embedding": [0.5, 0.5]}]
            })))
            .mount(&server)
            .await;

        let embedder = OpenAiEmbedder::new(
            Some(server.uri()),
            "text-embedding-3-small".into(),
            "sk-test".into(),
        )
        .unwrap();
        let vector = embedder.embed("hello").await.unwrap();
        assert_eq!(vector, vec![0.5, 0.5]);
    }

    #[tokio::test]
    async fn embed_surfaces_api_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid key"))
            .mount(&server)
            .await;

        let embedder =
            OpenAiEmbedder::new(Some(server.uri()), "m".into(), "bad".into()).unwrap();
        let error = embedder.embed("text").await.unwrap_err();
        assert!(error.to_string().contains("401"), "got: {error}");
    }

    #[tokio::test]
    async fn embed_rejects_missing_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/embeddings"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"data": []})),
            )
            .mount(&server)
            .await;

        let embedder =
            OpenAiEmbedder::new(Some(server.uri()), "m".into(), "sk".into()).unwrap();
        assert!(embedder.embed("text").await.is_err());
    }
}
