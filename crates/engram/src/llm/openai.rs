// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI-shaped chat completions generator with bearer auth.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};

use engram_core::{EngramError, LanguageModel};

/// Default API base.
const DEFAULT_BASE_URL: &str = "https://api.openai.com";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// HTTP generator for an OpenAI-compatible `/v1/chat/completions` endpoint.
pub struct OpenAiModel {
    client: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl OpenAiModel {
    /// Creates a new generator with the given bearer key.
    pub fn new(
        url: Option<String>,
        model: String,
        api_key: String,
        max_tokens: u32,
    ) -> Result<Self, EngramError> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| EngramError::Config(format!("invalid API key header value: {e}")))?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
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
impl LanguageModel for OpenAiModel {
    async fn generate(
        &self,
        prompt: &str,
        system: Option<&str>,
    ) -> Result<String, EngramError> {
        let url = format!(
            "{}/v1/chat/completions",
            self.base_url.trim_end_matches('/')
        );
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = system {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest {
                model: &self.model,
                max_tokens: self.max_tokens,
                messages,
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
                message: format!("chat API returned {status}: {body}"),
                source: None,
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| EngramError::Llm {
            message: format!("failed to parse chat response: {e}"),
            source: Some(Box::new(e)),
        })?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| EngramError::Llm {
                message: "chat response contained no message content".into(),
                source: None,
            })
    }
}
