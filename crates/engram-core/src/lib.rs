// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the engram memory system.
//!
//! This crate provides the foundational trait definitions and error types
//! used throughout the engram workspace. Backend adapters (embedding
//! providers, language models) implement traits defined here.

pub mod error;
pub mod traits;

// Re-export key items at crate root for ergonomic imports.
pub use error::EngramError;
pub use traits::{Embedder, LanguageModel};
