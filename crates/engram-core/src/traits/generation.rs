// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Language model adapter trait for text generation.

use async_trait::async_trait;

use crate::error::EngramError;

/// Adapter for single-shot text generation.
///
/// Used by the consolidation pipeline to summarize memory clusters.
/// The adapter is optional: a store without one simply skips summarization.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Generates a completion for `prompt`, optionally steered by a system prompt.
    async fn generate(&self, prompt: &str, system: Option<&str>)
        -> Result<String, EngramError>;
}
