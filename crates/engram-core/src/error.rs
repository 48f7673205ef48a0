// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the engram memory system.

use thiserror::Error;

/// The primary error type used across all engram adapter traits and store operations.
#[derive(Debug, Error)]
pub enum EngramError {
    /// An API call was made before `init()` completed.
    #[error("store not initialized: call init() first")]
    NotInitialized,

    /// Configuration errors (unknown provider tag, missing API key, invalid thresholds).
    #[error("configuration error: {0}")]
    Config(String),

    /// Embedding backend errors (model load, tokenization, HTTP failure).
    #[error("embedder error: {message}")]
    Embedder {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Language model errors (API failure, malformed response).
    #[error("language model error: {message}")]
    Llm {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Persistence errors (directory creation, file write, serialization).
    #[error("persistence error: {message}")]
    Persistence {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_has_all_variants() {
        // Verify all 6 error variants exist and can be constructed.
        let _not_init = EngramError::NotInitialized;
        let _config = EngramError::Config("test".into());
        let _embedder = EngramError::Embedder {
            message: "test".into(),
            source: None,
        };
        let _llm = EngramError::Llm {
            message: "test".into(),
            source: Some(Box::new(std::io::Error::other("test"))),
        };
        let _persistence = EngramError::Persistence {
            message: "test".into(),
            source: None,
        };
        let _internal = EngramError::Internal("test".into());
    }

    #[test]
    fn error_display_includes_message() {
        let err = EngramError::Embedder {
            message: "dimension mismatch".into(),
            source: None,
        };
        assert!(err.to_string().contains("dimension mismatch"));

        let err = EngramError::NotInitialized;
        assert!(err.to_string().contains("init()"));
    }
}
