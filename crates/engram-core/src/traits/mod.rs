// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions for the engram backends.
//!
//! The store depends only on these two capability traits; the concrete
//! provider is selected from configuration at construction time and no
//! runtime re-binding exists.

pub mod embedding;
pub mod generation;

pub use embedding::Embedder;
pub use generation::LanguageModel;
