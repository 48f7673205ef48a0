// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The store facade: lifecycle, in-memory index, and curation triggers.
//!
//! All mutable state lives behind one async mutex, so operations serialize
//! and each sees the completed effects of the previous one. External calls
//! (embedding, summarization, file I/O) are the only suspension points.
//! A dirty flag buffers writes; persistence happens on `close`, after every
//! consolidation, and on explicit `save`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::Mutex as StdMutex;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use engram_config::{AutoConsolidateConfig, AutoRememberConfig, EngramConfig};
use engram_core::{Embedder, EngramError, LanguageModel};

use crate::classifier::Classifier;
use crate::consolidate::{self, ConsolidateParams};
use crate::persist;
use crate::recall;
use crate::types::{
    BootstrapContext, ConsolidationReport, ExportedMemory, Memory, RecallOptions,
    RememberOptions, ScoredMemory, StoreStats, TierCounts, Verdict,
};
use crate::vector::l2_normalize;

/// Similarity above which `forget` deletes a memory when no threshold is given.
const DEFAULT_FORGET_THRESHOLD: f64 = 0.8;

/// Assistant text is capped at this many code points in the combined turn.
const ASSISTANT_SNIPPET_LEN: usize = 500;

/// Fixed bootstrap recall queries, run concurrently at session open.
const BOOTSTRAP_QUERIES: [&str; 4] = [
    "who the user is: name, role, identity, background",
    "current priorities, goals, and active work",
    "decisions made and plans agreed on",
    "user preferences, likes, dislikes, and working style",
];

/// Mutable store state, guarded by a single lock.
struct StoreInner {
    memories: Vec<Memory>,
    /// Embedding dimension, learned from the first vector seen.
    dimensions: Option<usize>,
    initialized: bool,
    dirty: bool,
    writes_since_consolidation: u32,
    last_consolidation: Option<DateTime<Utc>>,
}

/// Single-file persistent memory store for a conversational agent.
///
/// Construct with [`MemoryStore::open`] (config-selected backends) or
/// [`MemoryStore::with_adapters`] (host-supplied backends), then call
/// [`init`](MemoryStore::init) before any other operation.
pub struct MemoryStore {
    inner: Arc<Mutex<StoreInner>>,
    embedder: Arc<dyn Embedder>,
    llm: Option<Arc<dyn LanguageModel>>,
    classifier: Classifier,
    path: PathBuf,
    max_memories: usize,
    debug: bool,
    auto_remember_enabled: bool,
    auto_remember: AutoRememberConfig,
    auto_consolidate_enabled: bool,
    auto_consolidate: AutoConsolidateConfig,
    params: ConsolidateParams,
    timer: StdMutex<Option<JoinHandle<()>>>,
}

impl MemoryStore {
    /// Create a store with backends selected from the configuration.
    ///
    /// Validates the configuration and builds the embedding and language
    /// model providers; performs no I/O.
    pub fn open(config: EngramConfig) -> Result<Self, EngramError> {
        validate(&config)?;
        let store_path = PathBuf::from(&config.file);
        let data_dir = store_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let embedder = crate::embedders::build_embedder(&config.embedder, &data_dir)?;
        let llm = match &config.llm {
            Some(llm_config) => Some(crate::llm::build_language_model(llm_config)?),
            None => None,
        };
        Self::assemble(config, embedder, llm)
    }

    /// Create a store around host-supplied backend adapters.
    pub fn with_adapters(
        config: EngramConfig,
        embedder: Arc<dyn Embedder>,
        llm: Option<Arc<dyn LanguageModel>>,
    ) -> Result<Self, EngramError> {
        Self::assemble(config, embedder, llm)
    }

    fn assemble(
        config: EngramConfig,
        embedder: Arc<dyn Embedder>,
        llm: Option<Arc<dyn LanguageModel>>,
    ) -> Result<Self, EngramError> {
        validate(&config)?;
        let auto_remember = config.auto_remember.settings();
        let auto_consolidate = config.auto_consolidate.settings();
        let params = ConsolidateParams {
            deduplicate_threshold: config.deduplicate_threshold,
            cluster_threshold: auto_consolidate.cluster_threshold,
            min_cluster_size: auto_consolidate.min_cluster_size,
            hot_days: auto_consolidate.hot_days,
            warm_days: auto_consolidate.warm_days,
            cold_days: auto_consolidate.cold_days,
        };
        let classifier = Classifier::new(
            auto_remember.min_importance,
            config.deduplicate_threshold,
            auto_remember.heuristic,
        );

        Ok(Self {
            inner: Arc::new(Mutex::new(StoreInner {
                memories: Vec::new(),
                dimensions: embedder.dimensions(),
                initialized: false,
                dirty: false,
                writes_since_consolidation: 0,
                last_consolidation: None,
            })),
            embedder,
            llm,
            classifier,
            path: PathBuf::from(&config.file),
            max_memories: config.max_memories,
            debug: config.debug,
            auto_remember_enabled: config.auto_remember.enabled(),
            auto_remember,
            auto_consolidate_enabled: config.auto_consolidate.enabled(),
            auto_consolidate,
            params,
            timer: StdMutex::new(None),
        })
    }

    /// Ensure the parent directory, load the store file if present, and arm
    /// the consolidation timer. Idempotent.
    pub async fn init(&self) -> Result<(), EngramError> {
        {
            let mut inner = self.inner.lock().await;
            if inner.initialized {
                return Ok(());
            }
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    tokio::fs::create_dir_all(parent).await.map_err(|e| {
                        EngramError::Persistence {
                            message: format!(
                                "failed to create directory {}: {e}",
                                parent.display()
                            ),
                            source: Some(Box::new(e)),
                        }
                    })?;
                }
            }
            let memories = persist::load_store(&self.path).await;
            if let Some(first) = memories.first() {
                inner.dimensions = Some(first.embedding.len());
            }
            debug!(loaded = memories.len(), path = %self.path.display(), "store initialized");
            inner.memories = memories;
            inner.initialized = true;
        }

        if self.auto_consolidate_enabled && self.auto_consolidate.interval_ms != 0 {
            self.arm_timer();
        }
        Ok(())
    }

    /// Store a memory verbatim, without classification or duplicate checks.
    /// Returns the stored memory as appended.
    pub async fn remember(
        &self,
        content: &str,
        options: RememberOptions,
    ) -> Result<Memory, EngramError> {
        self.ensure_initialized().await?;
        let embedding = l2_normalize(&self.embedder.embed(content).await?);

        let mut inner = self.inner.lock().await;
        check_dimensions(&mut inner, &embedding)?;

        let now = Utc::now();
        let mut memory = Memory::new(content.to_string(), embedding, options.importance, now);
        memory.tags = options.tags.into_iter().collect();
        memory.source = Some(options.source.unwrap_or_else(|| "manual".to_string()));
        memory.metadata.extra = options.metadata;
        let stored = memory.clone();

        inner.memories.push(memory);
        inner.dirty = true;
        inner.writes_since_consolidation += 1;
        self.maybe_consolidate(&mut inner).await?;
        Ok(stored)
    }

    /// Feed one conversation turn through the classifier; store it when the
    /// verdict clears the configured bar. Returns the verdict either way.
    pub async fn process(&self, user: &str, assistant: &str) -> Result<Verdict, EngramError> {
        self.ensure_initialized().await?;
        if !self.auto_remember_enabled {
            return Ok(Verdict {
                should_remember: false,
                importance: 0.0,
                reason: "auto-remember disabled".to_string(),
                tags: Vec::new(),
            });
        }

        let combined = combined_turn(user, assistant);
        let embedding = l2_normalize(&self.embedder.embed(&combined).await?);

        let mut inner = self.inner.lock().await;
        check_dimensions(&mut inner, &embedding)?;

        let verdict = {
            let existing: Vec<&[f32]> = inner
                .memories
                .iter()
                .map(|m| m.embedding.as_slice())
                .collect();
            self.classifier
                .classify(user, assistant, Some(&embedding), &existing)
        };
        debug!(
            should_remember = verdict.should_remember,
            importance = verdict.importance,
            reason = %verdict.reason,
            "classified turn"
        );

        if verdict.should_remember {
            let now = Utc::now();
            let mut memory = Memory::new(combined, embedding, verdict.importance, now);
            memory.tags = verdict
                .tags
                .iter()
                .cloned()
                .chain(self.auto_remember.default_tags.iter().cloned())
                .collect();
            memory.source = Some("auto".to_string());
            memory.metadata.reason = Some(verdict.reason.clone());

            inner.memories.push(memory);
            inner.dirty = true;
            inner.writes_since_consolidation += 1;
            self.maybe_consolidate(&mut inner).await?;
        }
        Ok(verdict)
    }

    /// Similarity search with tier/importance/recency boosts.
    ///
    /// Every returned memory has its access counters updated before this
    /// call returns.
    pub async fn recall(
        &self,
        query: &str,
        options: RecallOptions,
    ) -> Result<Vec<ScoredMemory>, EngramError> {
        self.ensure_initialized().await?;
        let query_embedding = self.embedder.embed(query).await?;

        let mut inner = self.inner.lock().await;
        let hits = recall::score_all(&inner.memories, &query_embedding, &options);
        if hits.is_empty() {
            return Ok(Vec::new());
        }

        let now = Utc::now();
        let mut results = Vec::with_capacity(hits.len());
        for (index, score) in hits {
            let memory = &mut inner.memories[index];
            memory.access_count += 1;
            memory.last_accessed = now;
            results.push(ScoredMemory {
                memory: memory.clone(),
                score,
            });
        }
        inner.dirty = true;
        Ok(results)
    }

    /// Delete every memory whose similarity to the query exceeds `threshold`
    /// (default 0.8). Returns the number removed.
    pub async fn forget(
        &self,
        query: &str,
        threshold: Option<f64>,
    ) -> Result<usize, EngramError> {
        self.ensure_initialized().await?;
        let threshold = threshold.unwrap_or(DEFAULT_FORGET_THRESHOLD);
        let query_embedding = self.embedder.embed(query).await?;

        let mut inner = self.inner.lock().await;
        let before = inner.memories.len();
        inner.memories.retain(|memory| {
            f64::from(crate::vector::cosine_similarity(
                &query_embedding,
                &memory.embedding,
            )) <= threshold
        });
        let removed = before - inner.memories.len();
        if removed > 0 {
            inner.dirty = true;
            debug!(removed, "forgot memories matching query");
        }
        Ok(removed)
    }

    /// Run a full consolidation pass and persist the result.
    pub async fn consolidate(&self) -> Result<ConsolidationReport, EngramError> {
        self.ensure_initialized().await?;
        let mut inner = self.inner.lock().await;
        run_consolidation(
            &mut inner,
            self.llm.as_deref(),
            &self.params,
            &self.path,
            self.max_memories,
        )
        .await
    }

    /// Run the four fixed bootstrap recalls concurrently and assemble
    /// session-opening context.
    pub async fn bootstrap(&self) -> Result<BootstrapContext, EngramError> {
        self.ensure_initialized().await?;
        let options = || RecallOptions {
            limit: 4,
            min_score: 0.15,
            ..Default::default()
        };
        let (identity, priorities, decisions, preferences) = tokio::join!(
            self.recall(BOOTSTRAP_QUERIES[0], options()),
            self.recall(BOOTSTRAP_QUERIES[1], options()),
            self.recall(BOOTSTRAP_QUERIES[2], options()),
            self.recall(BOOTSTRAP_QUERIES[3], options()),
        );
        let (identity, priorities, decisions, preferences) =
            (identity?, priorities?, decisions?, preferences?);

        let mut context = String::new();
        for group in [&identity, &priorities, &decisions, &preferences] {
            for hit in group.iter() {
                context.push_str(&hit.memory.content);
                context.push('\n');
            }
        }
        Ok(BootstrapContext {
            context: context.trim_end().to_string(),
            identity,
            priorities,
            decisions,
            preferences,
        })
    }

    /// Counts, timestamps, file size, and curation bookkeeping.
    pub async fn stats(&self) -> Result<StoreStats, EngramError> {
        self.ensure_initialized().await?;
        let inner = self.inner.lock().await;
        let file_size_bytes = tokio::fs::metadata(&self.path)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        Ok(StoreStats {
            total: inner.memories.len(),
            tiers: TierCounts::tally(&inner.memories),
            oldest: inner.memories.iter().map(|m| m.created_at).min(),
            newest: inner.memories.iter().map(|m| m.created_at).max(),
            file_size_bytes,
            last_consolidation: inner.last_consolidation,
            writes_since_consolidation: inner.writes_since_consolidation,
        })
    }

    /// All memories with embeddings reduced to their length.
    pub async fn export(&self) -> Result<Vec<ExportedMemory>, EngramError> {
        self.ensure_initialized().await?;
        let inner = self.inner.lock().await;
        Ok(inner.memories.iter().map(ExportedMemory::from).collect())
    }

    /// Persist the store if there are unsaved changes.
    pub async fn save(&self) -> Result<(), EngramError> {
        self.ensure_initialized().await?;
        let mut inner = self.inner.lock().await;
        if inner.dirty {
            persist::save_store(&self.path, &inner.memories).await?;
            inner.dirty = false;
        }
        Ok(())
    }

    /// Stop the consolidation timer and persist any unsaved changes.
    pub async fn close(&self) -> Result<(), EngramError> {
        if let Some(handle) = self.timer.lock().expect("timer lock").take() {
            handle.abort();
        }
        let mut inner = self.inner.lock().await;
        if inner.initialized && inner.dirty {
            persist::save_store(&self.path, &inner.memories).await?;
            inner.dirty = false;
        }
        Ok(())
    }

    async fn ensure_initialized(&self) -> Result<(), EngramError> {
        let inner = self.inner.lock().await;
        if inner.initialized {
            Ok(())
        } else {
            Err(EngramError::NotInitialized)
        }
    }

    /// Run consolidation when the write threshold or the hard size limit
    /// is crossed.
    async fn maybe_consolidate(&self, inner: &mut StoreInner) -> Result<(), EngramError> {
        let over_threshold = self.auto_consolidate_enabled
            && inner.writes_since_consolidation >= self.auto_consolidate.every_n_writes;
        let over_limit = inner.memories.len() > self.max_memories;
        if over_threshold || over_limit {
            run_consolidation(
                inner,
                self.llm.as_deref(),
                &self.params,
                &self.path,
                self.max_memories,
            )
            .await?;
        }
        Ok(())
    }

    /// Spawn the interval-driven consolidation task. A tick with no writes
    /// since the last pass is skipped.
    fn arm_timer(&self) {
        let mut slot = self.timer.lock().expect("timer lock");
        if slot.is_some() {
            return;
        }
        let inner = Arc::clone(&self.inner);
        let llm = self.llm.clone();
        let params = self.params.clone();
        let path = self.path.clone();
        let max_memories = self.max_memories;
        let debug_enabled = self.debug;
        let period = std::time::Duration::from_millis(self.auto_consolidate.interval_ms);

        *slot = Some(tokio::spawn(async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let mut inner = inner.lock().await;
                if inner.writes_since_consolidation == 0 {
                    continue;
                }
                if let Err(error) = run_consolidation(
                    &mut inner,
                    llm.as_deref(),
                    &params,
                    &path,
                    max_memories,
                )
                .await
                {
                    if debug_enabled {
                        warn!(%error, "scheduled consolidation failed");
                    } else {
                        debug!(%error, "scheduled consolidation failed");
                    }
                }
            }
        }));
    }
}

impl Drop for MemoryStore {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.timer.lock() {
            if let Some(handle) = slot.take() {
                handle.abort();
            }
        }
    }
}

fn validate(config: &EngramConfig) -> Result<(), EngramError> {
    engram_config::validate_config(config)
        .map_err(|errors| EngramError::Config(errors.join("; ")))
}

/// The combined representation of one conversation turn, as embedded and
/// stored. Long assistant replies are cut at 500 code points.
fn combined_turn(user: &str, assistant: &str) -> String {
    let mut snippet: String = assistant.chars().take(ASSISTANT_SNIPPET_LEN).collect();
    if assistant.chars().count() > ASSISTANT_SNIPPET_LEN {
        snippet.push('…');
    }
    format!("User: {user}\nAssistant: {snippet}")
}

/// Learn the store dimension from the first vector; reject mismatches after.
fn check_dimensions(inner: &mut StoreInner, embedding: &[f32]) -> Result<(), EngramError> {
    match inner.dimensions {
        Some(expected) if embedding.len() != expected => Err(EngramError::Embedder {
            message: format!(
                "embedding dimension mismatch: store has {expected}, embedder returned {}",
                embedding.len()
            ),
            source: None,
        }),
        Some(_) => Ok(()),
        None => {
            inner.dimensions = Some(embedding.len());
            Ok(())
        }
    }
}

/// One consolidation run: transform the working set, enforce the size bound,
/// reset counters, persist.
async fn run_consolidation(
    inner: &mut StoreInner,
    llm: Option<&dyn LanguageModel>,
    params: &ConsolidateParams,
    path: &Path,
    max_memories: usize,
) -> Result<ConsolidationReport, EngramError> {
    let now = Utc::now();
    let report = consolidate::run(&mut inner.memories, params, llm, now).await;

    if inner.memories.len() > max_memories {
        let excess = inner.memories.len() - max_memories;
        evict_lowest_keep_score(&mut inner.memories, excess);
        warn!(
            evicted = excess,
            "store still over max_memories after consolidation; evicted lowest keep scores"
        );
    }

    inner.writes_since_consolidation = 0;
    inner.last_consolidation = Some(now);
    persist::save_store(path, &inner.memories).await?;
    inner.dirty = false;
    Ok(report)
}

/// Remove `count` memories with the lowest keep scores, earliest first on ties.
fn evict_lowest_keep_score(memories: &mut Vec<Memory>, count: usize) {
    for _ in 0..count {
        let worst = memories
            .iter()
            .enumerate()
            .min_by(|a, b| {
                a.1.keep_score()
                    .partial_cmp(&b.1.keep_score())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|(index, _)| index);
        match worst {
            Some(index) => {
                memories.remove(index);
            }
            None => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use engram_config::load_config_from_str;

    /// Deterministic embedder: a fixed-dimension bag-of-words hash, so equal
    /// texts embed identically and unrelated texts diverge.
    struct StubEmbedder {
        dimensions: usize,
    }

    #[async_trait]
    impl Embedder for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EngramError> {
            let mut vector = vec![0.0f32; self.dimensions];
            for word in text.to_lowercase().split_whitespace() {
                let mut hash: u64 = 1469598103934665603;
                for byte in word.bytes() {
                    hash ^= u64::from(byte);
                    hash = hash.wrapping_mul(1099511628211);
                }
                vector[(hash % self.dimensions as u64) as usize] += 1.0;
            }
            Ok(l2_normalize(&vector))
        }

        fn dimensions(&self) -> Option<usize> {
            Some(self.dimensions)
        }
    }

    /// An embedder whose vector length changes on every call.
    struct VaryingEmbedder {
        calls: StdMutex<usize>,
    }

    #[async_trait]
    impl Embedder for VaryingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EngramError> {
            let mut calls = self.calls.lock().unwrap();
            *calls += 1;
            Ok(vec![1.0; 2 + *calls])
        }
    }

    fn store_in(dir: &Path, extra_toml: &str) -> MemoryStore {
        let toml = format!(
            "file = \"{}\"\n{extra_toml}",
            dir.join("agent.engram").display()
        );
        let config = load_config_from_str(&toml).unwrap();
        MemoryStore::with_adapters(config, Arc::new(StubEmbedder { dimensions: 32 }), None)
            .unwrap()
    }

    #[tokio::test]
    async fn operations_before_init_fail() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), "");

        assert!(matches!(
            store.remember("fact", RememberOptions::default()).await,
            Err(EngramError::NotInitialized)
        ));
        assert!(matches!(
            store.recall("fact", RecallOptions::default()).await,
            Err(EngramError::NotInitialized)
        ));
        assert!(matches!(store.stats().await, Err(EngramError::NotInitialized)));
        assert!(matches!(
            store.consolidate().await,
            Err(EngramError::NotInitialized)
        ));
    }

    #[tokio::test]
    async fn init_is_idempotent_and_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        let config = load_config_from_str(&format!(
            "file = \"{}\"",
            nested.join("agent.engram").display()
        ))
        .unwrap();
        let store = MemoryStore::with_adapters(
            config,
            Arc::new(StubEmbedder { dimensions: 32 }),
            None,
        )
        .unwrap();

        store.init().await.unwrap();
        store.init().await.unwrap();
        assert!(nested.exists());
    }

    #[tokio::test]
    async fn dimension_mismatch_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from_str(&format!(
            "file = \"{}\"",
            dir.path().join("agent.engram").display()
        ))
        .unwrap();
        let store = MemoryStore::with_adapters(
            config,
            Arc::new(VaryingEmbedder {
                calls: StdMutex::new(0),
            }),
            None,
        )
        .unwrap();
        store.init().await.unwrap();

        store.remember("first", RememberOptions::default()).await.unwrap();
        let error = store
            .remember("second", RememberOptions::default())
            .await
            .unwrap_err();
        assert!(error.to_string().contains("dimension mismatch"), "got: {error}");
    }

    #[tokio::test]
    async fn combined_turn_truncates_assistant() {
        let long_reply = "x".repeat(800);
        let combined = combined_turn("short question", &long_reply);
        assert!(combined.starts_with("User: short question\nAssistant: "));
        let assistant_part = combined.split("Assistant: ").nth(1).unwrap();
        assert_eq!(assistant_part.chars().count(), 501, "500 code points plus ellipsis");
        assert!(assistant_part.ends_with('…'));

        let untouched = combined_turn("q", "a short answer");
        assert!(untouched.ends_with("a short answer"));
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_at_construction() {
        let config = load_config_from_str("file = \"\"").unwrap();
        let result = MemoryStore::with_adapters(
            config,
            Arc::new(StubEmbedder { dimensions: 32 }),
            None,
        );
        assert!(matches!(result, Err(EngramError::Config(_))));
    }

    #[tokio::test]
    async fn forced_eviction_enforces_hard_limit() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), "max_memories = 2\nauto_consolidate = false");
        store.init().await.unwrap();

        // Three distinct memories that neither dedup nor clustering touch.
        store
            .remember("alpha topic one", RememberOptions::default())
            .await
            .unwrap();
        store
            .remember("bravo subject two", RememberOptions::default())
            .await
            .unwrap();
        let mut options = RememberOptions::default();
        options.importance = 0.9;
        store
            .remember("charlie theme three", options)
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total, 2, "forced consolidation must enforce the bound");
    }

    #[tokio::test]
    async fn write_threshold_triggers_consolidation() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(
            dir.path(),
            "[auto_consolidate]\nevery_n_writes = 2\ninterval_ms = 0",
        );
        store.init().await.unwrap();

        store
            .remember("first distinct fact", RememberOptions::default())
            .await
            .unwrap();
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.writes_since_consolidation, 1);
        assert!(stats.last_consolidation.is_none());

        store
            .remember("second unrelated note", RememberOptions::default())
            .await
            .unwrap();
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.writes_since_consolidation, 0, "threshold hit resets counter");
        assert!(stats.last_consolidation.is_some());
    }

    #[tokio::test]
    async fn interval_timer_consolidates_after_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(
            dir.path(),
            "[auto_consolidate]\nevery_n_writes = 1000\ninterval_ms = 50",
        );
        store.init().await.unwrap();

        store
            .remember("a fact for the timer", RememberOptions::default())
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(400)).await;

        let stats = store.stats().await.unwrap();
        assert!(
            stats.last_consolidation.is_some(),
            "timer tick should have consolidated"
        );
        store.close().await.unwrap();
    }

    #[tokio::test]
    async fn close_persists_dirty_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent.engram");
        let store = store_in(dir.path(), "");
        store.init().await.unwrap();
        store
            .remember("persist me please", RememberOptions::default())
            .await
            .unwrap();
        assert!(!path.exists(), "writes are buffered until close/save");

        store.close().await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn close_before_init_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path(), "");
        store.close().await.unwrap();
        assert!(!dir.path().join("agent.engram").exists());
    }

    #[test]
    fn evict_removes_lowest_scores_first() {
        let now = Utc::now();
        let mut memories = vec![
            Memory::new("low".into(), vec![1.0], 0.1, now),
            Memory::new("high".into(), vec![1.0], 0.9, now),
            Memory::new("mid".into(), vec![1.0], 0.5, now),
        ];
        evict_lowest_keep_score(&mut memories, 2);
        assert_eq!(memories.len(), 1);
        assert_eq!(memories[0].content, "high");
    }
}
