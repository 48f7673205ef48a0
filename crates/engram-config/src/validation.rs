// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes: threshold ranges, recognized provider tags, required API keys.

use crate::model::EngramConfig;

/// Provider tags understood by the embedder factory.
pub const EMBEDDER_PROVIDERS: &[&str] = &["local", "ollama", "openai"];

/// Provider tags understood by the language model factory.
pub const LLM_PROVIDERS: &[&str] = &["ollama", "anthropic", "openai"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<String>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &EngramConfig) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if config.file.trim().is_empty() {
        errors.push("file must not be empty".to_string());
    }

    if !(0.0..=1.0).contains(&config.deduplicate_threshold) {
        errors.push(format!(
            "deduplicate_threshold must be within [0, 1], got {}",
            config.deduplicate_threshold
        ));
    }

    if config.max_memories == 0 {
        errors.push("max_memories must be at least 1".to_string());
    }

    let embedder = &config.embedder;
    if !EMBEDDER_PROVIDERS.contains(&embedder.provider.as_str()) {
        errors.push(format!(
            "embedder.provider `{}` is not recognized (expected one of: {})",
            embedder.provider,
            EMBEDDER_PROVIDERS.join(", ")
        ));
    }
    if embedder.provider == "openai" && embedder.api_key.is_none() {
        errors.push("embedder.api_key is required for the openai provider".to_string());
    }

    if let Some(llm) = &config.llm {
        if !LLM_PROVIDERS.contains(&llm.provider.as_str()) {
            errors.push(format!(
                "llm.provider `{}` is not recognized (expected one of: {})",
                llm.provider,
                LLM_PROVIDERS.join(", ")
            ));
        }
        if matches!(llm.provider.as_str(), "anthropic" | "openai") && llm.api_key.is_none() {
            errors.push(format!(
                "llm.api_key is required for the {} provider",
                llm.provider
            ));
        }
        if llm.max_tokens == 0 {
            errors.push("llm.max_tokens must be at least 1".to_string());
        }
    }

    let remember = config.auto_remember.settings();
    if !(0.0..=1.0).contains(&remember.min_importance) {
        errors.push(format!(
            "auto_remember.min_importance must be within [0, 1], got {}",
            remember.min_importance
        ));
    }

    let consolidate = config.auto_consolidate.settings();
    if !(0.0..=1.0).contains(&consolidate.cluster_threshold) {
        errors.push(format!(
            "auto_consolidate.cluster_threshold must be within [0, 1], got {}",
            consolidate.cluster_threshold
        ));
    }
    if consolidate.min_cluster_size < 2 {
        errors.push(format!(
            "auto_consolidate.min_cluster_size must be at least 2, got {}",
            consolidate.min_cluster_size
        ));
    }
    for (name, value) in [
        ("hot_days", consolidate.hot_days),
        ("warm_days", consolidate.warm_days),
        ("cold_days", consolidate.cold_days),
    ] {
        if value <= 0.0 || !value.is_finite() {
            errors.push(format!(
                "auto_consolidate.{name} must be a positive number, got {value}"
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LlmConfig, Toggle};

    fn valid_config() -> EngramConfig {
        EngramConfig {
            file: "agent.engram".into(),
            ..EngramConfig::default()
        }
    }

    #[test]
    fn default_config_with_file_is_valid() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn empty_file_is_rejected() {
        let config = EngramConfig::default();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("file")));
    }

    #[test]
    fn unknown_embedder_provider_is_rejected() {
        let mut config = valid_config();
        config.embedder.provider = "cohere".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("embedder.provider")));
    }

    #[test]
    fn openai_embedder_requires_api_key() {
        let mut config = valid_config();
        config.embedder.provider = "openai".into();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("embedder.api_key")));

        config.embedder.api_key = Some("sk-test".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn anthropic_llm_requires_api_key() {
        let mut config = valid_config();
        config.llm = Some(LlmConfig {
            provider: "anthropic".into(),
            model: "claude-haiku-4-5".into(),
            api_key: None,
            url: None,
            max_tokens: 512,
        });
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.contains("llm.api_key")));
    }

    #[test]
    fn ollama_llm_needs_no_api_key() {
        let mut config = valid_config();
        config.llm = Some(LlmConfig {
            provider: "ollama".into(),
            model: "llama3.2".into(),
            api_key: None,
            url: None,
            max_tokens: 512,
        });
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn out_of_range_thresholds_collect_all_errors() {
        let mut config = valid_config();
        config.deduplicate_threshold = 1.5;
        config.max_memories = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.len() >= 2, "expected both errors, got {errors:?}");
    }

    #[test]
    fn disabled_sections_still_validate_defaults() {
        let mut config = valid_config();
        config.auto_remember = Toggle::Switch(false);
        config.auto_consolidate = Toggle::Switch(false);
        assert!(validate_config(&config).is_ok());
    }
}
