// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedding adapter trait for vector embedding generation.

use async_trait::async_trait;

use crate::error::EngramError;

/// Adapter for generating dense embedding vectors from text.
///
/// The store treats the vector length as whatever the first call returns
/// and assumes subsequent calls preserve it. Vectors are expected to be
/// L2-normalized so that cosine similarity reduces to a dot product.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generates an embedding for the given text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EngramError>;

    /// The vector length this embedder produces, when known up front.
    ///
    /// Remote backends that discover the dimension on the first call
    /// return `None`.
    fn dimensions(&self) -> Option<usize> {
        None
    }
}
