// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration for the engram memory system.
//!
//! Provides the serde config model, a Figment-based layered loader
//! (defaults, TOML file, `ENGRAM_*` environment variables), and semantic
//! validation run at store construction.

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::{
    AutoConsolidateConfig, AutoRememberConfig, EmbedderConfig, EngramConfig, LlmConfig, Toggle,
};
pub use validation::validate_config;
