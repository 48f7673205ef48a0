// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Merge order (later overrides earlier): compiled defaults, a TOML file,
//! then `ENGRAM_*` environment variables.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::EngramConfig;

/// Load configuration from `./engram.toml` with env var overrides.
pub fn load_config() -> Result<EngramConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(EngramConfig::default()))
        .merge(Toml::file("engram.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
///
/// Used for testing and for hosts that manage their own config sources.
pub fn load_config_from_str(toml_content: &str) -> Result<EngramConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(EngramConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<EngramConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(EngramConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `ENGRAM_EMBEDDER_API_KEY` must map to
/// `embedder.api_key`, not `embedder.api.key`.
fn env_provider() -> Env {
    Env::prefixed("ENGRAM_").map(|key| {
        // `key` is the lowercased env var name with the prefix stripped.
        // Example: ENGRAM_EMBEDDER_API_KEY -> "embedder_api_key"
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("embedder_", "embedder.", 1)
            .replacen("llm_", "llm.", 1)
            .replacen("auto_remember_", "auto_remember.", 1)
            .replacen("auto_consolidate_", "auto_consolidate.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.max_memories, 10_000);
        assert_eq!(config.embedder.provider, "local");
        assert!(config.llm.is_none());
    }

    #[test]
    fn toml_overrides_defaults() {
        let config = load_config_from_str(
            r#"
            file = "agent.engram"
            max_memories = 500
            deduplicate_threshold = 0.88

            [embedder]
            provider = "ollama"
            model = "nomic-embed-text"
            url = "http://localhost:11434"
            "#,
        )
        .unwrap();

        assert_eq!(config.file, "agent.engram");
        assert_eq!(config.max_memories, 500);
        assert_eq!(config.deduplicate_threshold, 0.88);
        assert_eq!(config.embedder.provider, "ollama");
        assert_eq!(config.embedder.url.as_deref(), Some("http://localhost:11434"));
    }

    #[test]
    fn auto_sections_accept_bare_boolean() {
        let config = load_config_from_str(
            r#"
            file = "agent.engram"
            auto_remember = false
            auto_consolidate = true
            "#,
        )
        .unwrap();

        assert!(!config.auto_remember.enabled());
        assert!(config.auto_consolidate.enabled());
        assert_eq!(config.auto_consolidate.settings().every_n_writes, 100);
    }

    #[test]
    fn auto_sections_accept_tables() {
        let config = load_config_from_str(
            r#"
            file = "agent.engram"

            [auto_remember]
            min_importance = 0.5
            default_tags = ["assistant"]

            [auto_consolidate]
            every_n_writes = 25
            interval_ms = 0
            "#,
        )
        .unwrap();

        let remember = config.auto_remember.settings();
        assert_eq!(remember.min_importance, 0.5);
        assert_eq!(remember.default_tags, vec!["assistant".to_string()]);

        let consolidate = config.auto_consolidate.settings();
        assert_eq!(consolidate.every_n_writes, 25);
        assert_eq!(consolidate.interval_ms, 0);
        // Unspecified keys keep their defaults.
        assert_eq!(consolidate.cluster_threshold, 0.78);
    }

    #[test]
    fn llm_section_parses() {
        let config = load_config_from_str(
            r#"
            file = "agent.engram"

            [llm]
            provider = "anthropic"
            model = "claude-haiku-4-5"
            api_key = "sk-test"
            max_tokens = 256
            "#,
        )
        .unwrap();

        let llm = config.llm.expect("llm section should be present");
        assert_eq!(llm.provider, "anthropic");
        assert_eq!(llm.model, "claude-haiku-4-5");
        assert_eq!(llm.max_tokens, 256);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let result = load_config_from_str(
            r#"
            file = "agent.engram"
            max_memoriez = 100
            "#,
        );
        assert!(result.is_err(), "typo'd key should fail extraction");
    }
}
