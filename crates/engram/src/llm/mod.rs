// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Language model provider implementations and the config-tag factory.

pub mod anthropic;
pub mod ollama;
pub mod openai;

pub use anthropic::AnthropicModel;
pub use ollama::OllamaModel;
pub use openai::OpenAiModel;

use std::sync::Arc;

use engram_config::LlmConfig;
use engram_core::{EngramError, LanguageModel};

/// Build the language model selected by `config.provider`.
pub(crate) fn build_language_model(
    config: &LlmConfig,
) -> Result<Arc<dyn LanguageModel>, EngramError> {
    match config.provider.as_str() {
        "ollama" => Ok(Arc::new(OllamaModel::new(
            config.url.clone(),
            config.model.clone(),
            config.max_tokens,
        )?)),
        "anthropic" => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                EngramError::Config("llm.api_key is required for the anthropic provider".into())
            })?;
            Ok(Arc::new(AnthropicModel::new(
                config.url.clone(),
                config.model.clone(),
                api_key,
                config.max_tokens,
            )?))
        }
        "openai" => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                EngramError::Config("llm.api_key is required for the openai provider".into())
            })?;
            Ok(Arc::new(OpenAiModel::new(
                config.url.clone(),
                config.model.clone(),
                api_key,
                config.max_tokens,
            )?))
        }
        other => Err(EngramError::Config(format!(
            "unknown llm provider `{other}`"
        ))),
    }
}

/// True for HTTP status codes that indicate transient errors worth retrying.
pub(crate) fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503 | 529)
}
