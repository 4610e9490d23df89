// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide knowledge cache with a TTL and an injected clock.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use arc_swap::ArcSwapOption;
use chrono::{DateTime, TimeDelta, Utc};
use parley_core::Clock;

/// One built knowledge text.
#[derive(Debug)]
pub struct CachedKnowledge {
    pub text: Arc<str>,
    pub built_at: DateTime<Utc>,
    /// Invalidation generation the text was read under.
    pub generation: u64,
}

/// Single replaceable blob. Writes swap the whole value, readers never see
/// a partial write, and a reader racing a rebuild may get the old value.
///
/// Every [`invalidate`](KnowledgeCache::invalidate) starts a new generation.
/// An entry built from content read in an older generation is never fresh.
pub struct KnowledgeCache {
    slot: ArcSwapOption<CachedKnowledge>,
    generation: AtomicU64,
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
}

impl KnowledgeCache {
    pub fn new(ttl_secs: u64, clock: Arc<dyn Clock>) -> Self {
        let ttl = i64::try_from(ttl_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(TimeDelta::MAX);
        Self {
            slot: ArcSwapOption::empty(),
            generation: AtomicU64::new(0),
            ttl,
            clock,
        }
    }

    /// The cached entry if it has not expired or been invalidated.
    pub fn fresh(&self) -> Option<Arc<CachedKnowledge>> {
        let entry = self.slot.load_full()?;
        if entry.generation != self.generation() {
            return None;
        }
        let age = self.clock.now().signed_duration_since(entry.built_at);
        (age < self.ttl).then_some(entry)
    }

    /// Take this before reading content; pass it to [`store`](Self::store).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// The cached entry regardless of age.
    pub fn peek(&self) -> Option<Arc<CachedKnowledge>> {
        self.slot.load_full()
    }

    pub fn store(&self, text: String, generation: u64) -> Arc<CachedKnowledge> {
        let entry = Arc::new(CachedKnowledge {
            text: Arc::from(text),
            built_at: self.clock.now(),
            generation,
        });
        self.slot.store(Some(entry.clone()));
        entry
    }

    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.slot.store(None);
    }
}
