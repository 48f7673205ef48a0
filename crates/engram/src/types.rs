// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Memory domain types for the engram store.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Lifecycle tier of a memory. Fresh memories start HOT and age forward
/// only: HOT → WARM → COLD → ARCHIVE. No backward transitions exist.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MemoryTier {
    Hot,
    Warm,
    Cold,
    Archive,
}

impl MemoryTier {
    /// Multiplicative recall boost applied when decay boosting is enabled.
    pub fn recall_boost(self) -> f32 {
        match self {
            MemoryTier::Hot => 1.10,
            MemoryTier::Warm => 1.00,
            MemoryTier::Cold => 0.95,
            MemoryTier::Archive => 0.85,
        }
    }

    /// The next tier in the aging order, if any.
    pub fn next(self) -> Option<MemoryTier> {
        match self {
            MemoryTier::Hot => Some(MemoryTier::Warm),
            MemoryTier::Warm => Some(MemoryTier::Cold),
            MemoryTier::Cold => Some(MemoryTier::Archive),
            MemoryTier::Archive => None,
        }
    }
}

/// Well-known metadata fields plus a spill map for user-supplied extras.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryMetadata {
    /// Why the classifier retained this memory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Number of memories merged into this one by summarization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consolidated_from: Option<usize>,

    /// When summarization produced this content (epoch milliseconds).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consolidated_at: Option<i64>,

    /// Set when the archive phase truncated the content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncated: Option<bool>,

    /// Content length in code points before archive truncation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_length: Option<usize>,

    /// User-supplied extras, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl MemoryMetadata {
    /// True when no field is set and the spill map is empty.
    pub fn is_empty(&self) -> bool {
        self.reason.is_none()
            && self.consolidated_from.is_none()
            && self.consolidated_at.is_none()
            && self.truncated.is_none()
            && self.original_length.is_none()
            && self.extra.is_empty()
    }
}

/// A single retained fact with its embedding and bookkeeping.
#[derive(Debug, Clone)]
pub struct Memory {
    /// Unique identifier, assigned at creation and never reused.
    pub id: String,
    /// The retained text, stored verbatim (truncated only by archiving).
    pub content: String,
    /// L2-normalized embedding vector. All memories in a store share one length.
    pub embedding: Vec<f32>,
    /// Tag set; duplicates collapsed, order irrelevant.
    pub tags: BTreeSet<String>,
    /// Importance in [0, 1]; non-decreasing under consolidation.
    pub importance: f64,
    /// Lifecycle tier.
    pub tier: MemoryTier,
    /// Creation instant (immutable).
    pub created_at: DateTime<Utc>,
    /// Updated on every successful recall hit.
    pub last_accessed: DateTime<Utc>,
    /// Number of recall hits.
    pub access_count: u32,
    /// Provenance tag ("auto", "manual", "consolidated", ...).
    pub source: Option<String>,
    /// Typed metadata plus user extras.
    pub metadata: MemoryMetadata,
}

impl Memory {
    /// Create a fresh HOT memory with the given content and embedding.
    pub fn new(content: String, embedding: Vec<f32>, importance: f64, now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            content,
            embedding,
            tags: BTreeSet::new(),
            importance: importance.clamp(0.0, 1.0),
            tier: MemoryTier::Hot,
            created_at: now,
            last_accessed: now,
            access_count: 0,
            source: None,
            metadata: MemoryMetadata::default(),
        }
    }

    /// Survivor-selection score used by deduplication and summarization.
    pub fn keep_score(&self) -> f64 {
        self.importance + 0.1 * f64::from(self.access_count)
    }
}

/// A memory returned from recall, with its boosted similarity score.
///
/// Scores are opaque ordering keys: boosts can push them above 1.0.
#[derive(Debug, Clone)]
pub struct ScoredMemory {
    pub memory: Memory,
    pub score: f32,
}

/// Options for [`crate::MemoryStore::recall`].
#[derive(Debug, Clone)]
pub struct RecallOptions {
    /// Maximum number of results.
    pub limit: usize,
    /// Minimum boosted score for inclusion.
    pub min_score: f32,
    /// Restrict candidates to these tiers.
    pub tiers: Option<Vec<MemoryTier>>,
    /// Restrict candidates to memories carrying at least one of these tags.
    pub tags: Option<Vec<String>>,
    /// Apply the tier recall boost.
    pub decay_boost: bool,
}

impl Default for RecallOptions {
    fn default() -> Self {
        Self {
            limit: 8,
            min_score: 0.15,
            tiers: None,
            tags: None,
            decay_boost: true,
        }
    }
}

/// Options for [`crate::MemoryStore::remember`].
#[derive(Debug, Clone)]
pub struct RememberOptions {
    /// Initial importance.
    pub importance: f64,
    /// Initial tag set.
    pub tags: Vec<String>,
    /// Provenance tag. Defaults to "manual".
    pub source: Option<String>,
    /// User-supplied metadata extras.
    pub metadata: BTreeMap<String, serde_json::Value>,
}

impl Default for RememberOptions {
    fn default() -> Self {
        Self {
            importance: 0.5,
            tags: Vec::new(),
            source: None,
            metadata: BTreeMap::new(),
        }
    }
}

/// Classifier output for one conversation turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    /// Whether the turn cleared the minimum importance bar.
    pub should_remember: bool,
    /// Importance in [0, 1] accumulated from signal rules.
    pub importance: f64,
    /// First matching rule's explanation.
    pub reason: String,
    /// Tags suggested by the matching rules.
    pub tags: Vec<String>,
}

impl Verdict {
    /// An immediate rejection with zero importance.
    pub(crate) fn reject(reason: &str) -> Self {
        Self {
            should_remember: false,
            importance: 0.0,
            reason: reason.to_string(),
            tags: Vec::new(),
        }
    }
}

/// Per-tier memory counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCounts {
    pub hot: usize,
    pub warm: usize,
    pub cold: usize,
    pub archive: usize,
}

impl TierCounts {
    /// Tally the tiers of a memory slice.
    pub fn tally(memories: &[Memory]) -> Self {
        let mut counts = TierCounts::default();
        for memory in memories {
            match memory.tier {
                MemoryTier::Hot => counts.hot += 1,
                MemoryTier::Warm => counts.warm += 1,
                MemoryTier::Cold => counts.cold += 1,
                MemoryTier::Archive => counts.archive += 1,
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.hot + self.warm + self.cold + self.archive
    }
}

/// Outcome summary of one consolidation pass.
#[derive(Debug, Clone, Serialize)]
pub struct ConsolidationReport {
    /// When the pass started.
    pub timestamp: DateTime<Utc>,
    /// Wall-clock duration of the pass in milliseconds.
    pub duration_ms: u64,
    /// Clusters that met the size threshold.
    pub clusters: usize,
    /// Memories removed by summarization (cluster size minus survivor).
    pub memories_merged: usize,
    /// Tier transitions applied by the decay phase.
    pub memories_decayed: usize,
    /// Contents truncated by the archive phase.
    pub memories_archived: usize,
    /// Memories removed as near-duplicates.
    pub duplicates_removed: usize,
    /// Tier histogram before the pass.
    pub tiers_before: TierCounts,
    /// Tier histogram after the pass.
    pub tiers_after: TierCounts,
}

/// Store statistics snapshot.
#[derive(Debug, Clone, Serialize)]
pub struct StoreStats {
    pub total: usize,
    pub tiers: TierCounts,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
    pub file_size_bytes: u64,
    pub last_consolidation: Option<DateTime<Utc>>,
    pub writes_since_consolidation: u32,
}

/// A memory as exposed by [`crate::MemoryStore::export`]: embedding
/// replaced by its length.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedMemory {
    pub id: String,
    pub content: String,
    pub embedding_length: usize,
    pub tags: Vec<String>,
    pub importance: f64,
    pub tier: MemoryTier,
    pub created_at: DateTime<Utc>,
    pub last_accessed: DateTime<Utc>,
    pub access_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "MemoryMetadata::is_empty")]
    pub metadata: MemoryMetadata,
}

impl From<&Memory> for ExportedMemory {
    fn from(memory: &Memory) -> Self {
        Self {
            id: memory.id.clone(),
            content: memory.content.clone(),
            embedding_length: memory.embedding.len(),
            tags: memory.tags.iter().cloned().collect(),
            importance: memory.importance,
            tier: memory.tier,
            created_at: memory.created_at,
            last_accessed: memory.last_accessed,
            access_count: memory.access_count,
            source: memory.source.clone(),
            metadata: memory.metadata.clone(),
        }
    }
}

/// Session-opening context assembled by [`crate::MemoryStore::bootstrap`].
#[derive(Debug, Clone)]
pub struct BootstrapContext {
    /// Concatenated contents of all four recall groups.
    pub context: String,
    pub identity: Vec<ScoredMemory>,
    pub priorities: Vec<ScoredMemory>,
    pub decisions: Vec<ScoredMemory>,
    pub preferences: Vec<ScoredMemory>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tier_display_roundtrip() {
        use std::str::FromStr;

        for tier in [
            MemoryTier::Hot,
            MemoryTier::Warm,
            MemoryTier::Cold,
            MemoryTier::Archive,
        ] {
            let s = tier.to_string();
            assert_eq!(MemoryTier::from_str(&s).unwrap(), tier);
        }
        assert_eq!(MemoryTier::Hot.to_string(), "hot");
    }

    #[test]
    fn tier_order_is_forward_only() {
        assert_eq!(MemoryTier::Hot.next(), Some(MemoryTier::Warm));
        assert_eq!(MemoryTier::Warm.next(), Some(MemoryTier::Cold));
        assert_eq!(MemoryTier::Cold.next(), Some(MemoryTier::Archive));
        assert_eq!(MemoryTier::Archive.next(), None);
    }

    #[test]
    fn tier_recall_boosts() {
        assert_eq!(MemoryTier::Hot.recall_boost(), 1.10);
        assert_eq!(MemoryTier::Warm.recall_boost(), 1.00);
        assert_eq!(MemoryTier::Cold.recall_boost(), 0.95);
        assert_eq!(MemoryTier::Archive.recall_boost(), 0.85);
    }

    #[test]
    fn keep_score_weighs_access_count() {
        let now = Utc::now();
        let mut memory = Memory::new("fact".into(), vec![1.0, 0.0], 0.5, now);
        assert_eq!(memory.keep_score(), 0.5);
        memory.access_count = 3;
        assert!((memory.keep_score() - 0.8).abs() < 1e-9);
    }

    #[test]
    fn new_memory_clamps_importance() {
        let now = Utc::now();
        let memory = Memory::new("fact".into(), vec![1.0], 7.0, now);
        assert_eq!(memory.importance, 1.0);
        let memory = Memory::new("fact".into(), vec![1.0], -1.0, now);
        assert_eq!(memory.importance, 0.0);
    }

    #[test]
    fn metadata_spill_map_roundtrips() {
        let mut metadata = MemoryMetadata {
            reason: Some("contains decision".into()),
            ..Default::default()
        };
        metadata
            .extra
            .insert("project".into(), serde_json::json!("engram"));

        let json = serde_json::to_string(&metadata).unwrap();
        assert!(json.contains("\"project\":\"engram\""));

        let parsed: MemoryMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, metadata);
    }

    #[test]
    fn metadata_is_empty() {
        assert!(MemoryMetadata::default().is_empty());
        let metadata = MemoryMetadata {
            truncated: Some(true),
            ..Default::default()
        };
        assert!(!metadata.is_empty());
    }

    #[test]
    fn tier_counts_tally() {
        let now = Utc::now();
        let mut memories = vec![
            Memory::new("a".into(), vec![1.0], 0.5, now),
            Memory::new("b".into(), vec![1.0], 0.5, now),
            Memory::new("c".into(), vec![1.0], 0.5, now),
        ];
        memories[1].tier = MemoryTier::Cold;
        memories[2].tier = MemoryTier::Archive;

        let counts = TierCounts::tally(&memories);
        assert_eq!(counts.hot, 1);
        assert_eq!(counts.cold, 1);
        assert_eq!(counts.archive, 1);
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn recall_options_defaults() {
        let opts = RecallOptions::default();
        assert_eq!(opts.limit, 8);
        assert_eq!(opts.min_score, 0.15);
        assert!(opts.decay_boost);
        assert!(opts.tiers.is_none());
        assert!(opts.tags.is_none());
    }

    #[test]
    fn exported_memory_drops_embedding() {
        let now = Utc::now();
        let memory = Memory::new("fact".into(), vec![0.0; 384], 0.5, now);
        let exported = ExportedMemory::from(&memory);
        assert_eq!(exported.embedding_length, 384);
        let json = serde_json::to_value(&exported).unwrap();
        assert!(json.get("embedding").is_none());
        assert_eq!(json["embeddingLength"], 384);
    }
}
