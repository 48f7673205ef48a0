// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! On-disk codec for the engram trace container.
//!
//! The store file is a JSON document tagged `engram-trace`. Each memory node
//! carries the embedding, a `metadata` sub-object with the authoritative
//! field values, and `temporal`/`quality` mirrors of the same values. Load
//! merges both sources, preferring `metadata`; malformed nodes are skipped
//! so one bad record never blocks a session. Writes go through a temp file
//! and rename.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use engram_core::EngramError;

use crate::types::{Memory, MemoryMetadata, MemoryTier};

/// Format tag written into every store file.
pub const FORMAT_TAG: &str = "engram-trace";

/// Current container version.
const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct TraceFile {
    version: u32,
    format: String,
    memories: Vec<TraceNode>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TraceNode {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    embedding: Vec<f32>,
    #[serde(default)]
    metadata: NodeMetadata,
    #[serde(default)]
    temporal: Option<TemporalMirror>,
    #[serde(default)]
    quality: Option<QualityMirror>,
}

/// The authoritative per-memory attributes.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NodeMetadata {
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    importance: Option<f64>,
    #[serde(default)]
    tier: Option<MemoryTier>,
    #[serde(default)]
    created_at: Option<i64>,
    #[serde(default)]
    last_accessed: Option<i64>,
    #[serde(default)]
    access_count: Option<u32>,
    #[serde(default)]
    source: Option<String>,
    #[serde(flatten)]
    details: MemoryMetadata,
}

/// Top-level mirror of the timestamps and tier, kept for container
/// compatibility. Load prefers the metadata values.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemporalMirror {
    #[serde(default)]
    created: Option<i64>,
    #[serde(default)]
    modified: Option<i64>,
    #[serde(default)]
    accessed: Option<i64>,
    #[serde(default)]
    decay_tier: Option<MemoryTier>,
}

/// Top-level mirror of the importance score.
#[derive(Debug, Default, Serialize, Deserialize)]
struct QualityMirror {
    #[serde(default)]
    score: Option<f64>,
}

/// Load the memory set from `path`.
///
/// A missing, empty, or unparseable file yields an empty store with a
/// warning; corrupt nodes (missing id/content, wrong embedding length) are
/// skipped individually. Load failures are never fatal.
pub(crate) async fn load_store(path: &Path) -> Vec<Memory> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(error) => {
            debug!(path = %path.display(), %error, "no store file, starting empty");
            return Vec::new();
        }
    };
    if bytes.is_empty() {
        warn!(path = %path.display(), "store file is empty, starting empty");
        return Vec::new();
    }

    let trace: TraceFile = match serde_json::from_slice(&bytes) {
        Ok(trace) => trace,
        Err(error) => {
            warn!(path = %path.display(), %error, "store file failed to parse, starting empty");
            return Vec::new();
        }
    };

    let mut memories = Vec::with_capacity(trace.memories.len());
    let mut dimensions: Option<usize> = None;
    for (index, node) in trace.memories.into_iter().enumerate() {
        match node_to_memory(node, &mut dimensions) {
            Some(memory) => memories.push(memory),
            None => warn!(index, "skipping corrupt memory node"),
        }
    }
    memories
}

/// Persist the memory set to `path` atomically (temp file + rename).
pub(crate) async fn save_store(path: &Path, memories: &[Memory]) -> Result<(), EngramError> {
    let trace = TraceFile {
        version: FORMAT_VERSION,
        format: FORMAT_TAG.to_string(),
        memories: memories.iter().map(memory_to_node).collect(),
    };
    let json = serde_json::to_vec(&trace).map_err(|e| EngramError::Persistence {
        message: format!("failed to serialize store: {e}"),
        source: Some(Box::new(e)),
    })?;

    let tmp = tmp_path(path);
    tokio::fs::write(&tmp, &json)
        .await
        .map_err(|e| EngramError::Persistence {
            message: format!("failed to write {}: {e}", tmp.display()),
            source: Some(Box::new(e)),
        })?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| EngramError::Persistence {
            message: format!("failed to replace {}: {e}", path.display()),
            source: Some(Box::new(e)),
        })?;
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Decode one node, merging metadata with the temporal/quality mirrors.
/// Returns `None` for nodes that cannot be represented.
fn node_to_memory(node: TraceNode, dimensions: &mut Option<usize>) -> Option<Memory> {
    let id = node.id.filter(|id| !id.is_empty())?;
    let content = node.content?;
    if node.embedding.is_empty() {
        return None;
    }
    match dimensions {
        Some(expected) if node.embedding.len() != *expected => return None,
        Some(_) => {}
        None => *dimensions = Some(node.embedding.len()),
    }

    let temporal = node.temporal.unwrap_or_default();
    let quality = node.quality.unwrap_or_default();
    let metadata = node.metadata;

    let created_ms = metadata
        .created_at
        .or(temporal.created)
        .unwrap_or_else(|| Utc::now().timestamp_millis());
    let created_at = from_millis(created_ms);
    let accessed_ms = metadata
        .last_accessed
        .or(temporal.accessed)
        .unwrap_or(created_ms);
    // createdAt <= lastAccessed holds even for hand-edited files.
    let last_accessed = from_millis(accessed_ms.max(created_ms));

    Some(Memory {
        id,
        content,
        embedding: node.embedding,
        tags: metadata.tags.into_iter().collect::<BTreeSet<String>>(),
        importance: metadata
            .importance
            .or(quality.score)
            .unwrap_or(0.5)
            .clamp(0.0, 1.0),
        tier: metadata.tier.or(temporal.decay_tier).unwrap_or(MemoryTier::Hot),
        created_at,
        last_accessed,
        access_count: metadata.access_count.unwrap_or(0),
        source: metadata.source,
        metadata: metadata.details,
    })
}

fn memory_to_node(memory: &Memory) -> TraceNode {
    let created = memory.created_at.timestamp_millis();
    let accessed = memory.last_accessed.timestamp_millis();
    TraceNode {
        id: Some(memory.id.clone()),
        content: Some(memory.content.clone()),
        embedding: memory.embedding.clone(),
        metadata: NodeMetadata {
            tags: memory.tags.iter().cloned().collect(),
            importance: Some(memory.importance),
            tier: Some(memory.tier),
            created_at: Some(created),
            last_accessed: Some(accessed),
            access_count: Some(memory.access_count),
            source: memory.source.clone(),
            details: memory.metadata.clone(),
        },
        temporal: Some(TemporalMirror {
            created: Some(created),
            modified: Some(memory.metadata.consolidated_at.unwrap_or(created)),
            accessed: Some(accessed),
            decay_tier: Some(memory.tier),
        }),
        quality: Some(QualityMirror {
            score: Some(memory.importance),
        }),
    }
}

fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_else(Utc::now)
}
