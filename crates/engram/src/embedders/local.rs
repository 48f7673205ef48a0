// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process ONNX embedder using all-MiniLM-L6-v2.
//!
//! Produces 384-dimensional L2-normalized embeddings on CPU with no external
//! API calls. Model and tokenizer files are fetched from HuggingFace on first
//! use and cached under the data directory.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use ndarray::Array2;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::TensorRef;
use tokio::sync::OnceCell;
use tracing::info;

use engram_core::{Embedder, EngramError};

use crate::vector::l2_normalize;

/// Embedding dimensions for all-MiniLM-L6-v2.
pub const EMBEDDING_DIM: usize = 384;

/// URLs for model files on HuggingFace (INT8 quantized).
const MODEL_URL: &str =
    "https://huggingface.co/onnx-community/all-MiniLM-L6-v2-ONNX/resolve/main/onnx/model_quantized.onnx";
const TOKENIZER_URL: &str =
    "https://huggingface.co/sentence-transformers/all-MiniLM-L6-v2/resolve/main/tokenizer.json";

/// Local ONNX embedder.
///
/// Inference state is created lazily on the first `embed` call so that
/// constructing a store never blocks on a model download.
pub struct LocalEmbedder {
    data_dir: PathBuf,
    model_name: String,
    state: OnceCell<InferenceState>,
}

/// Loaded session + tokenizer.
struct InferenceState {
    /// ONNX Runtime session (not Send, wrapped in Mutex for safety).
    session: Mutex<Session>,
    tokenizer: tokenizers::Tokenizer,
}

// Safety: Session is accessed through Mutex which provides synchronization.
// The tokenizer is thread-safe for encoding operations.
unsafe impl Send for InferenceState {}
unsafe impl Sync for InferenceState {}

impl LocalEmbedder {
    /// Creates a new local embedder rooted at `data_dir`.
    pub fn new(data_dir: PathBuf, model_name: String) -> Self {
        Self {
            data_dir,
            model_name,
            state: OnceCell::new(),
        }
    }

    /// Directory holding the model files.
    pub fn model_dir(&self) -> PathBuf {
        self.data_dir.join("models").join(&self.model_name)
    }

    fn model_path(&self) -> PathBuf {
        self.model_dir().join("model.onnx")
    }

    fn tokenizer_path(&self) -> PathBuf {
        self.model_dir().join("tokenizer.json")
    }

    /// True when both model and tokenizer files are on disk.
    pub fn is_model_available(&self) -> bool {
        self.model_path().exists() && self.tokenizer_path().exists()
    }

    /// Download model files on first run, then load the session and tokenizer.
    async fn load_state(&self) -> Result<InferenceState, EngramError> {
        if !self.is_model_available() {
            self.download_model().await?;
        }

        let tokenizer_path = self.tokenizer_path();
        let tokenizer = tokenizers::Tokenizer::from_file(&tokenizer_path).map_err(|e| {
            EngramError::Embedder {
                message: format!(
                    "failed to load tokenizer from {}: {e}",
                    tokenizer_path.display()
                ),
                source: None,
            }
        })?;

        let model_path = self.model_path();
        let session = Session::builder()
            .and_then(|b| Ok(b.with_optimization_level(GraphOptimizationLevel::Level3)?))
            .and_then(|b| Ok(b.with_intra_threads(1)?))
            .and_then(|mut b| b.commit_from_file(&model_path))
            .map_err(|e| EngramError::Embedder {
                message: format!("failed to load ONNX model from {}: {e}", model_path.display()),
                source: Some(Box::new(e)),
            })?;

        Ok(InferenceState {
            session: Mutex::new(session),
            tokenizer,
        })
    }

    /// Fetch model and tokenizer from HuggingFace into the data directory.
    async fn download_model(&self) -> Result<(), EngramError> {
        let model_dir = self.model_dir();
        tokio::fs::create_dir_all(&model_dir)
            .await
            .map_err(|e| EngramError::Embedder {
                message: format!("failed to create model directory: {e}"),
                source: Some(Box::new(e)),
            })?;

        info!("embedding model not found, downloading from HuggingFace");
        for (filename, url) in [("model.onnx", MODEL_URL), ("tokenizer.json", TOKENIZER_URL)] {
            let dest = model_dir.join(filename);
            if dest.exists() {
                continue;
            }
            match download_file(url, &dest).await {
                Ok(size) => info!("downloaded {filename} ({size} bytes)"),
                Err(error) => {
                    // Clean up partial download.
                    let _ = tokio::fs::remove_file(&dest).await;
                    return Err(error);
                }
            }
        }
        info!("embedding model ready at {}", model_dir.display());
        Ok(())
    }
}

#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EngramError> {
        let state = self.state.get_or_try_init(|| self.load_state()).await?;
        embed_text(state, text)
    }

    fn dimensions(&self) -> Option<usize> {
        Some(EMBEDDING_DIM)
    }
}

/// Run one inference pass: tokenize, forward, mean-pool, normalize.
fn embed_text(state: &InferenceState, text: &str) -> Result<Vec<f32>, EngramError> {
    let encoding = state
        .tokenizer
        .encode(text, true)
        .map_err(|e| EngramError::Embedder {
            message: format!("tokenization failed: {e}"),
            source: None,
        })?;

    let input_ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
    let attention_mask: Vec<i64> = encoding
        .get_attention_mask()
        .iter()
        .map(|&m| m as i64)
        .collect();
    let token_type_ids: Vec<i64> = encoding.get_type_ids().iter().map(|&t| t as i64).collect();
    let seq_len = input_ids.len();

    let tensor_err = |what: &'static str| {
        move |e: ndarray::ShapeError| EngramError::Embedder {
            message: format!("failed to shape {what} tensor: {e}"),
            source: Some(Box::new(e)),
        }
    };
    let input_ids_array =
        Array2::from_shape_vec((1, seq_len), input_ids).map_err(tensor_err("input_ids"))?;
    let attention_mask_array = Array2::from_shape_vec((1, seq_len), attention_mask.clone())
        .map_err(tensor_err("attention_mask"))?;
    let token_type_ids_array = Array2::from_shape_vec((1, seq_len), token_type_ids)
        .map_err(tensor_err("token_type_ids"))?;

    let mut session = state.session.lock().map_err(|e| EngramError::Embedder {
        message: format!("ONNX session lock poisoned: {e}"),
        source: None,
    })?;

    let ort_err = |message: String| EngramError::Embedder {
        message,
        source: None,
    };
    let input_ids_tensor = TensorRef::from_array_view(&input_ids_array)
        .map_err(|e| ort_err(format!("input_ids tensor: {e}")))?;
    let attention_mask_tensor = TensorRef::from_array_view(&attention_mask_array)
        .map_err(|e| ort_err(format!("attention_mask tensor: {e}")))?;
    let token_type_ids_tensor = TensorRef::from_array_view(&token_type_ids_array)
        .map_err(|e| ort_err(format!("token_type_ids tensor: {e}")))?;

    let outputs = session
        .run(ort::inputs![
            "input_ids" => input_ids_tensor,
            "attention_mask" => attention_mask_tensor,
            "token_type_ids" => token_type_ids_tensor
        ])
        .map_err(|e| ort_err(format!("ONNX inference failed: {e}")))?;

    // Output shape is [1, seq_len, hidden].
    let (shape, data) = outputs[0]
        .try_extract_tensor::<f32>()
        .map_err(|e| ort_err(format!("failed to extract output tensor: {e}")))?;
    let hidden_size = shape[shape.len() - 1] as usize;

    let pooled = mean_pool_with_attention(data, &attention_mask, seq_len, hidden_size);
    Ok(l2_normalize(&pooled))
}

/// Attention-masked mean pooling over token embeddings.
fn mean_pool_with_attention(
    embeddings: &[f32],
    attention_mask: &[i64],
    seq_len: usize,
    hidden_size: usize,
) -> Vec<f32> {
    let mut sum = vec![0.0f32; hidden_size];
    let mut count = 0.0f32;

    for i in 0..seq_len {
        if attention_mask[i] > 0 {
            for j in 0..hidden_size {
                sum[j] += embeddings[i * hidden_size + j];
            }
            count += 1.0;
        }
    }
    if count > 0.0 {
        for value in &mut sum {
            *value /= count;
        }
    }
    sum
}

/// Download a file from a URL to a local path.
async fn download_file(url: &str, dest: &Path) -> Result<usize, EngramError> {
    let response = reqwest::get(url).await.map_err(|e| EngramError::Embedder {
        message: format!("failed to download {url}: {e}"),
        source: Some(Box::new(e)),
    })?;

    if !response.status().is_success() {
        return Err(EngramError::Embedder {
            message: format!("download failed with status {}: {url}", response.status()),
            source: None,
        });
    }

    let bytes = response.bytes().await.map_err(|e| EngramError::Embedder {
        message: format!("failed to read response body from {url}: {e}"),
        source: Some(Box::new(e)),
    })?;

    let size = bytes.len();
    tokio::fs::write(dest, &bytes)
        .await
        .map_err(|e| EngramError::Embedder {
            message: format!("failed to write {}: {e}", dest.display()),
            source: Some(Box::new(e)),
        })?;
    Ok(size)
}
