// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Recall scoring: similarity search fused with tier/importance boosts.
//!
//! The scoring pass is pure over the memory slice; access bookkeeping is the
//! store's job. A future ANN index slots in behind [`score_all`] without
//! touching callers.

use crate::types::{Memory, RecallOptions};
use crate::vector::cosine_similarity;

/// Score every candidate memory against the query embedding.
///
/// Returns `(index, score)` pairs sorted by score descending, cut at
/// `min_score`, and truncated to `limit`. The sort is stable, so equal
/// scores keep insertion order.
pub(crate) fn score_all(
    memories: &[Memory],
    query: &[f32],
    options: &RecallOptions,
) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = memories
        .iter()
        .enumerate()
        .filter(|(_, memory)| matches_filters(memory, options))
        .filter_map(|(index, memory)| {
            if memory.embedding.len() != query.len() {
                return None;
            }
            let mut score = cosine_similarity(query, &memory.embedding);
            if options.decay_boost {
                score *= memory.tier.recall_boost();
            }
            score *= 1.0 + (memory.importance as f32) * 0.2;
            if score < options.min_score {
                return None;
            }
            Some((index, score))
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(options.limit);
    scored
}

/// Tier and tag candidate filters.
fn matches_filters(memory: &Memory, options: &RecallOptions) -> bool {
    if let Some(tiers) = &options.tiers {
        if !tiers.contains(&memory.tier) {
            return false;
        }
    }
    if let Some(tags) = &options.tags {
        if !tags.iter().any(|tag| memory.tags.contains(tag)) {
            return false;
        }
    }
    true
}
