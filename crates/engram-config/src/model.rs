// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the engram memory system.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at load time. The `auto_remember` and `auto_consolidate`
//! sections additionally accept a bare boolean that toggles the subsystem
//! while keeping default settings.

use serde::{Deserialize, Serialize};

/// Top-level engram configuration.
///
/// Loaded from TOML with environment variable overrides, or constructed
/// programmatically by the embedding host. Every section except `file`
/// defaults to sensible values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngramConfig {
    /// Path to the store file. Must be non-empty.
    #[serde(default)]
    pub file: String,

    /// Embedding backend selection.
    #[serde(default)]
    pub embedder: EmbedderConfig,

    /// Summarization backend selection. `None` disables cluster summarization.
    #[serde(default)]
    pub llm: Option<LlmConfig>,

    /// Automatic turn classification settings, or a bare boolean toggle.
    #[serde(default)]
    pub auto_remember: Toggle<AutoRememberConfig>,

    /// Automatic consolidation cadence and thresholds, or a bare boolean toggle.
    #[serde(default)]
    pub auto_consolidate: Toggle<AutoConsolidateConfig>,

    /// Cosine similarity above which two memories are considered duplicates.
    #[serde(default = "default_deduplicate_threshold")]
    pub deduplicate_threshold: f64,

    /// Hard ceiling on the number of stored memories.
    #[serde(default = "default_max_memories")]
    pub max_memories: usize,

    /// Verbose logging of classifier verdicts and background consolidation.
    #[serde(default)]
    pub debug: bool,
}

impl Default for EngramConfig {
    fn default() -> Self {
        Self {
            file: String::new(),
            embedder: EmbedderConfig::default(),
            llm: None,
            auto_remember: Toggle::default(),
            auto_consolidate: Toggle::default(),
            deduplicate_threshold: default_deduplicate_threshold(),
            max_memories: default_max_memories(),
            debug: false,
        }
    }
}

fn default_deduplicate_threshold() -> f64 {
    0.92
}

fn default_max_memories() -> usize {
    10_000
}

/// A config section that can be written as a bare boolean or a full table.
///
/// `auto_remember = false` disables the subsystem; `[auto_remember]` with
/// keys configures it (and implies enabled). A bare `true` enables it with
/// all defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Toggle<T> {
    /// Bare boolean form: enable or disable with default settings.
    Switch(bool),
    /// Full table form: enabled, with explicit settings.
    Settings(T),
}

impl<T: Default> Default for Toggle<T> {
    fn default() -> Self {
        Toggle::Settings(T::default())
    }
}

impl<T: Default + Clone> Toggle<T> {
    /// Whether the subsystem is enabled.
    pub fn enabled(&self) -> bool {
        match self {
            Toggle::Switch(on) => *on,
            Toggle::Settings(_) => true,
        }
    }

    /// The effective settings (defaults when the bare-boolean form was used).
    pub fn settings(&self) -> T {
        match self {
            Toggle::Switch(_) => T::default(),
            Toggle::Settings(s) => s.clone(),
        }
    }
}

/// Embedding backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EmbedderConfig {
    /// Provider tag: "local", "ollama", or "openai".
    #[serde(default = "default_embedder_provider")]
    pub provider: String,

    /// Model identifier. For the local provider this names the ONNX model
    /// directory; for remote providers it is sent with each request.
    #[serde(default = "default_embedder_model")]
    pub model: String,

    /// API key for providers that require one.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL override for HTTP providers.
    #[serde(default)]
    pub url: Option<String>,

    /// Directory for local model files. Defaults to the store file's parent.
    #[serde(default)]
    pub data_dir: Option<String>,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            provider: default_embedder_provider(),
            model: default_embedder_model(),
            api_key: None,
            url: None,
            data_dir: None,
        }
    }
}

fn default_embedder_provider() -> String {
    "local".to_string()
}

fn default_embedder_model() -> String {
    "all-MiniLM-L6-v2".to_string()
}

/// Summarization backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LlmConfig {
    /// Provider tag: "ollama", "anthropic", or "openai".
    pub provider: String,

    /// Model identifier sent with each request.
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// API key for providers that require one.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base URL override.
    #[serde(default)]
    pub url: Option<String>,

    /// Maximum tokens per summarization response.
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,
}

fn default_llm_model() -> String {
    "llama3.2".to_string()
}

fn default_llm_max_tokens() -> u32 {
    512
}

/// Automatic turn classification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AutoRememberConfig {
    /// Use the pattern-based importance classifier. When false, processed
    /// turns are stored at default importance without signal scoring
    /// (the duplicate guard still applies).
    #[serde(default = "default_heuristic")]
    pub heuristic: bool,

    /// Minimum importance for a turn to be retained.
    #[serde(default = "default_min_importance")]
    pub min_importance: f64,

    /// Tags added to every automatically stored memory.
    #[serde(default)]
    pub default_tags: Vec<String>,
}

impl Default for AutoRememberConfig {
    fn default() -> Self {
        Self {
            heuristic: default_heuristic(),
            min_importance: default_min_importance(),
            default_tags: Vec::new(),
        }
    }
}

fn default_heuristic() -> bool {
    true
}

fn default_min_importance() -> f64 {
    0.3
}

/// Automatic consolidation cadence and curation thresholds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AutoConsolidateConfig {
    /// Run consolidation after this many accepted writes.
    #[serde(default = "default_every_n_writes")]
    pub every_n_writes: u32,

    /// Wall-clock consolidation interval in milliseconds. 0 disables the timer.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Smallest cluster eligible for summarization.
    #[serde(default = "default_min_cluster_size")]
    pub min_cluster_size: usize,

    /// Cosine similarity for greedy cluster membership.
    #[serde(default = "default_cluster_threshold")]
    pub cluster_threshold: f64,

    /// Adjusted age in days before a HOT memory becomes WARM.
    #[serde(default = "default_hot_days")]
    pub hot_days: f64,

    /// Adjusted age in days before a WARM memory becomes COLD.
    #[serde(default = "default_warm_days")]
    pub warm_days: f64,

    /// Adjusted age in days before a COLD memory is archived.
    #[serde(default = "default_cold_days")]
    pub cold_days: f64,
}

impl Default for AutoConsolidateConfig {
    fn default() -> Self {
        Self {
            every_n_writes: default_every_n_writes(),
            interval_ms: default_interval_ms(),
            min_cluster_size: default_min_cluster_size(),
            cluster_threshold: default_cluster_threshold(),
            hot_days: default_hot_days(),
            warm_days: default_warm_days(),
            cold_days: default_cold_days(),
        }
    }
}

fn default_every_n_writes() -> u32 {
    100
}

fn default_interval_ms() -> u64 {
    6 * 60 * 60 * 1000
}

fn default_min_cluster_size() -> usize {
    3
}

fn default_cluster_threshold() -> f64 {
    0.78
}

fn default_hot_days() -> f64 {
    7.0
}

fn default_warm_days() -> f64 {
    30.0
}

fn default_cold_days() -> f64 {
    365.0
}
