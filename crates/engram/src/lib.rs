// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Self-curating embedded memory for conversational agents.
//!
//! A single-file persistent store of text memories with dense embeddings
//! that decides on its own what to retain, how to rank it at recall time,
//! and how to compact itself as it grows.
//!
//! ## Architecture
//!
//! - **Classifier**: pattern-based importance scoring of conversation turns
//! - **Recall**: cosine similarity fused with tier/importance boosts
//! - **Consolidator**: five-phase curation (decay, dedup, cluster, summarize, archive)
//! - **MemoryStore**: facade with lifecycle, triggers, and persistence
//! - **Embedders / LLMs**: local ONNX inference plus Ollama-, OpenAI-, and
//!   Anthropic-shaped HTTP backends, selected by config tag
//!
//! ```no_run
//! use engram::{MemoryStore, RecallOptions};
//! use engram_config::load_config_from_str;
//!
//! # async fn demo() -> Result<(), engram_core::EngramError> {
//! let config = load_config_from_str(r#"file = "agent.engram""#)
//!     .map_err(|e| engram_core::EngramError::Config(e.to_string()))?;
//! let store = MemoryStore::open(config)?;
//! store.init().await?;
//!
//! store.process("We decided to ship on Fridays", "Noted.").await?;
//! let hits = store.recall("release schedule", RecallOptions::default()).await?;
//! # let _ = hits;
//! store.close().await?;
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod consolidate;
pub mod embedders;
pub mod llm;
pub mod persist;
pub mod recall;
pub mod store;
pub mod types;
pub mod vector;

pub use classifier::Classifier;
pub use store::MemoryStore;
pub use types::{
    BootstrapContext, ConsolidationReport, ExportedMemory, Memory, MemoryMetadata, MemoryTier,
    RecallOptions, RememberOptions, ScoredMemory, StoreStats, TierCounts, Verdict,
};

// Re-export the pieces hosts need to implement custom backends.
pub use engram_config::EngramConfig;
pub use engram_core::{Embedder, EngramError, LanguageModel};
