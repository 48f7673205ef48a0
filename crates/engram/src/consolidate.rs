// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The five-phase consolidation pipeline: decay, deduplicate, cluster,
//! summarize, archive.
//!
//! Each phase transforms the working set in place and reports a count.
//! Summarization is the only phase that calls out; per-cluster failures are
//! swallowed so a flaky model never loses data.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use engram_core::LanguageModel;

use crate::types::{ConsolidationReport, Memory, MemoryTier, TierCounts};
use crate::vector::cosine_similarity;

const MS_PER_DAY: f64 = 86_400_000.0;

/// System prompt for cluster summarization.
const SUMMARIZE_SYSTEM: &str = "You are a memory consolidation system. Output only the consolidated summary, nothing else. Be concise but preserve all key information.";

/// User prompt prefix; the cluster contents follow, separated by `\n---\n`.
const SUMMARIZE_PROMPT_PREFIX: &str = "Consolidate these related memories into a single concise summary. Preserve all important facts, decisions, and details. Remove redundancy.";

/// Curation thresholds, resolved from configuration by the store.
#[derive(Debug, Clone)]
pub struct ConsolidateParams {
    pub deduplicate_threshold: f64,
    pub cluster_threshold: f64,
    pub min_cluster_size: usize,
    pub hot_days: f64,
    pub warm_days: f64,
    pub cold_days: f64,
}

/// Run one full consolidation pass over the working set.
pub(crate) async fn run(
    memories: &mut Vec<Memory>,
    params: &ConsolidateParams,
    llm: Option<&dyn LanguageModel>,
    now: DateTime<Utc>,
) -> ConsolidationReport {
    let started = std::time::Instant::now();
    let tiers_before = TierCounts::tally(memories);

    let decayed = decay_phase(memories, params, now);
    let duplicates = dedup_phase(memories, params.deduplicate_threshold);
    let clusters = cluster_phase(memories, params);
    let cluster_count = clusters.len();
    let merged = match llm {
        Some(llm) => summarize_phase(memories, &clusters, llm, now).await,
        None => 0,
    };
    let archived = archive_phase(memories);

    let report = ConsolidationReport {
        timestamp: now,
        duration_ms: started.elapsed().as_millis() as u64,
        clusters: cluster_count,
        memories_merged: merged,
        memories_decayed: decayed,
        memories_archived: archived,
        duplicates_removed: duplicates,
        tiers_before,
        tiers_after: TierCounts::tally(memories),
    };
    debug!(
        decayed = report.memories_decayed,
        duplicates = report.duplicates_removed,
        clusters = report.clusters,
        merged = report.memories_merged,
        archived = report.memories_archived,
        total = memories.len(),
        "consolidation pass complete"
    );
    report
}

/// Phase 1: age memories forward through the tier order, at most one tier
/// per pass. Access slows aging; importance stretches the timeline.
fn decay_phase(memories: &mut [Memory], params: &ConsolidateParams, now: DateTime<Utc>) -> usize {
    let mut transitions = 0;
    for memory in memories.iter_mut() {
        let Some(next_tier) = memory.tier.next() else {
            continue;
        };
        let age_days = (now - memory.created_at).num_milliseconds() as f64 / MS_PER_DAY;
        let access_boost = (f64::from(memory.access_count) * 0.5).min(5.0);
        let importance_multiplier = 1.0 + 2.0 * memory.importance;
        let adjusted_age = (age_days - access_boost) / importance_multiplier;

        let threshold = match memory.tier {
            MemoryTier::Hot => params.hot_days,
            MemoryTier::Warm => params.warm_days,
            MemoryTier::Cold => params.cold_days,
            MemoryTier::Archive => unreachable!("archive has no next tier"),
        };
        if adjusted_age > threshold {
            memory.tier = next_tier;
            transitions += 1;
        }
    }
    transitions
}

/// Phase 2: remove the lower-keep-score member of every pair above the
/// duplicate threshold. Ties keep the earlier index.
///
/// O(n² · D), which is fine at this scale; the similarity relation is
/// static, so one pass over surviving pairs settles the set.
fn dedup_phase(memories: &mut Vec<Memory>, threshold: f64) -> usize {
    let n = memories.len();
    let mut removed = vec![false; n];
    for i in 0..n {
        if removed[i] {
            continue;
        }
        for j in (i + 1)..n {
            if removed[i] {
                break;
            }
            if removed[j] {
                continue;
            }
            let similarity = cosine_similarity(&memories[i].embedding, &memories[j].embedding);
            if f64::from(similarity) > threshold {
                if memories[i].keep_score() < memories[j].keep_score() {
                    removed[i] = true;
                } else {
                    removed[j] = true;
                }
            }
        }
    }

    let mut index = 0;
    memories.retain(|_| {
        let keep = !removed[index];
        index += 1;
        keep
    });
    removed.into_iter().filter(|r| *r).count()
}

/// Phase 3: greedy single-pass clustering of WARM and COLD memories.
///
/// Each unassigned candidate seeds a cluster and sweeps later candidates
/// whose similarity to the seed meets the threshold. Undersized clusters
/// are dissolved. HOT and ARCHIVE memories never participate.
fn cluster_phase(memories: &[Memory], params: &ConsolidateParams) -> Vec<Vec<usize>> {
    let candidates: Vec<usize> = memories
        .iter()
        .enumerate()
        .filter(|(_, m)| matches!(m.tier, MemoryTier::Warm | MemoryTier::Cold))
        .map(|(i, _)| i)
        .collect();

    let mut assigned = vec![false; memories.len()];
    let mut clusters = Vec::new();

    for (position, &seed) in candidates.iter().enumerate() {
        if assigned[seed] {
            continue;
        }
        let mut cluster = vec![seed];
        for &other in &candidates[position + 1..] {
            if assigned[other] {
                continue;
            }
            let similarity =
                cosine_similarity(&memories[seed].embedding, &memories[other].embedding);
            if f64::from(similarity) >= params.cluster_threshold {
                cluster.push(other);
                assigned[other] = true;
            }
        }
        if cluster.len() >= params.min_cluster_size {
            assigned[seed] = true;
            clusters.push(cluster);
        } else {
            for &member in &cluster[1..] {
                assigned[member] = false;
            }
        }
    }
    clusters
}

/// Phase 4: summarize each cluster into its best member, then drop the rest.
///
/// Summaries are requested against the pre-merge working set for every
/// cluster; rewrites and removals are applied only after all clusters
/// complete, so cluster indices stay valid throughout. A failed or
/// too-short response skips that cluster with no data loss.
async fn summarize_phase(
    memories: &mut Vec<Memory>,
    clusters: &[Vec<usize>],
    llm: &dyn LanguageModel,
    now: DateTime<Utc>,
) -> usize {
    struct PlannedMerge {
        survivor: usize,
        summary: String,
        importance: f64,
        members: usize,
    }

    let mut merges: Vec<PlannedMerge> = Vec::new();
    let mut removals: Vec<usize> = Vec::new();

    for cluster in clusters {
        let joined = cluster
            .iter()
            .map(|&i| memories[i].content.as_str())
            .collect::<Vec<_>>()
            .join("\n---\n");
        let prompt = format!("{SUMMARIZE_PROMPT_PREFIX}\n\n{joined}");

        let summary = match llm.generate(&prompt, Some(SUMMARIZE_SYSTEM)).await {
            Ok(response) => response.trim().to_string(),
            Err(error) => {
                warn!(%error, members = cluster.len(), "cluster summarization failed, skipping");
                continue;
            }
        };
        if summary.chars().count() < 10 {
            debug!(members = cluster.len(), "summary too short, skipping cluster");
            continue;
        }

        let mut survivor = cluster[0];
        for &member in &cluster[1..] {
            if memories[member].keep_score() > memories[survivor].keep_score() {
                survivor = member;
            }
        }
        let importance = cluster
            .iter()
            .map(|&i| memories[i].importance)
            .fold(0.0, f64::max);

        removals.extend(cluster.iter().copied().filter(|&i| i != survivor));
        merges.push(PlannedMerge {
            survivor,
            summary,
            importance,
            members: cluster.len(),
        });
    }

    let merged: usize = merges.iter().map(|m| m.members - 1).sum();

    for merge in &merges {
        let memory = &mut memories[merge.survivor];
        memory.content = merge.summary.clone();
        memory.tags.insert("consolidated".to_string());
        memory.importance = memory.importance.max(merge.importance);
        memory.metadata.consolidated_from = Some(merge.members);
        memory.metadata.consolidated_at = Some(now.timestamp_millis());
        memory.source = Some("consolidated".to_string());
    }

    removals.sort_unstable_by(|a, b| b.cmp(a));
    for index in removals {
        memories.remove(index);
    }
    merged
}

/// Phase 5: truncate long ARCHIVE-tier contents, sparing summarized memories.
fn archive_phase(memories: &mut [Memory]) -> usize {
    let mut changed = 0;
    for memory in memories.iter_mut() {
        if memory.tier != MemoryTier::Archive || memory.tags.contains("consolidated") {
            continue;
        }
        let length = memory.content.chars().count();
        if length <= 200 {
            continue;
        }
        let head: String = memory.content.chars().take(200).collect();
        memory.content = format!("{head}...");
        memory.metadata.truncated = Some(true);
        memory.metadata.original_length = Some(length);
        changed += 1;
    }
    changed
}
