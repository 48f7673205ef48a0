// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding provider implementations and the config-tag factory.

pub mod local;
pub mod ollama;
pub mod openai;

pub use local::LocalEmbedder;
pub use ollama::OllamaEmbedder;
pub use openai::OpenAiEmbedder;

use std::path::Path;
use std::sync::Arc;

use engram_config::EmbedderConfig;
use engram_core::{Embedder, EngramError};

/// Build the embedder selected by `config.provider`.
///
/// `default_data_dir` hosts local model files when `config.data_dir` is unset
/// (the store file's parent directory).
pub(crate) fn build_embedder(
    config: &EmbedderConfig,
    default_data_dir: &Path,
) -> Result<Arc<dyn Embedder>, EngramError> {
    match config.provider.as_str() {
        "local" => {
            let data_dir = config
                .data_dir
                .as_ref()
                .map(Into::into)
                .unwrap_or_else(|| default_data_dir.to_path_buf());
            Ok(Arc::new(LocalEmbedder::new(data_dir, config.model.clone())))
        }
        "ollama" => Ok(Arc::new(OllamaEmbedder::new(
            config.url.clone(),
            config.model.clone(),
        )?)),
        "openai" => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                EngramError::Config("embedder.api_key is required for the openai provider".into())
            })?;
            Ok(Arc::new(OpenAiEmbedder::new(
                config.url.clone(),
                config.model.clone(),
                api_key,
            )?))
        }
        other => Err(EngramError::Config(format!(
            "unknown embedder provider `{other}`"
        ))),
    }
}
