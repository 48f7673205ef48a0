// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ollama-shaped HTTP generator: POST `/api/generate` with `{model, prompt}`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use engram_core::{EngramError, LanguageModel};

/// Default Ollama endpoint.
const DEFAULT_BASE_URL: &str = "http://localhost:11434";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// HTTP generator for an Ollama-compatible `/api/generate` endpoint.
pub struct OllamaModel {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl OllamaModel {
    /// Creates a new Ollama generator. `url` overrides the default base URL.
    pub fn new(url: Option<String>, model: String, max_tokens: u32) -> Result<Self, EngramError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| EngramError::Llm {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(Self {
            client,
            base_url: url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model,
            max_tokens,
        })
    }
}

#[async_trait]
impl LanguageModel for OllamaModel {
    async fn generate(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, EngramError> {
        let url = format!("{}/api/generate", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&GenerateRequest {
                model: &self.model,
                prompt,
                system,
                stream: false,
                options: GenerateOptions {
                    num_predict: self.max_tokens,
                },
            })
            .send()
            .await
            .map_err(|e| EngramError::Llm {
                message: format!("HTTP request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EngramError::Llm {
                message: format!("generate API returned {status}: {body}"),
                source: None,
            });
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| EngramError::Llm {
            message: format!("failed to parse generate response: {e}"),
            source: Some(Box::new(e)),
        })?;
        Ok(parsed.response)
    }
}
