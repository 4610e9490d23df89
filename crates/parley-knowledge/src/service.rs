// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Knowledge service: fetch, format, compact, and cache.

use std::sync::Arc;

use parley_config::model::KnowledgeConfig;
use parley_core::{AiClient, Clock, ContentSource, ParleyError};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::aggregator::ContentAggregator;
use crate::cache::{CachedKnowledge, KnowledgeCache};
use crate::compaction::Compactor;
use crate::format::{KnowledgeInput, format_knowledge};

/// Owner of the aggregated knowledge text.
///
/// Push-invalidate, pull-rebuild: the host calls [`invalidate`] whenever a
/// content record changes and the next [`get_or_build`] rebuilds lazily.
///
/// [`invalidate`]: KnowledgeService::invalidate
/// [`get_or_build`]: KnowledgeService::get_or_build
pub struct KnowledgeService {
    config: KnowledgeConfig,
    aggregator: ContentAggregator,
    compactor: Compactor,
    cache: KnowledgeCache,
    build_lock: Mutex<()>,
}

impl KnowledgeService {
    pub fn new(
        config: KnowledgeConfig,
        source: Arc<dyn ContentSource>,
        ai: Option<Arc<dyn AiClient>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            aggregator: ContentAggregator::new(source, &config),
            compactor: Compactor::new(ai, config.compaction_threshold, config.hard_cap),
            cache: KnowledgeCache::new(config.cache_ttl_secs, clock),
            build_lock: Mutex::new(()),
            config,
        }
    }

    pub fn config(&self) -> &KnowledgeConfig {
        &self.config
    }

    /// The knowledge text, rebuilt when `force_rebuild` is set or the cached
    /// copy has expired. Disabled knowledge is always empty.
    pub async fn get_or_build(&self, force_rebuild: bool) -> Result<Arc<str>, ParleyError> {
        if !self.config.enabled {
            return Ok(Arc::from(""));
        }
        if !force_rebuild && let Some(entry) = self.cache.fresh() {
            return Ok(entry.text.clone());
        }

        // Concurrent misses wait for one build instead of each compacting.
        let _guard = self.build_lock.lock().await;
        if !force_rebuild && let Some(entry) = self.cache.fresh() {
            return Ok(entry.text.clone());
        }
        let generation = self.cache.generation();
        let text = self.build().await?;
        Ok(self.cache.store(text, generation).text.clone())
    }

    pub async fn rebuild(&self) -> Result<Arc<str>, ParleyError> {
        self.get_or_build(true).await
    }

    pub fn invalidate(&self) {
        self.cache.invalidate();
        debug!("knowledge cache invalidated");
    }

    /// Current cache entry without triggering a build.
    pub fn cached(&self) -> Option<Arc<CachedKnowledge>> {
        self.cache.peek()
    }

    async fn build(&self) -> Result<String, ParleyError> {
        let records = self.aggregator.fetch(&self.config.sources).await?;
        let categories = if self.config.include_categories {
            self.aggregator.categories().await?
        } else {
            Vec::new()
        };

        let text = format_knowledge(&KnowledgeInput {
            site: self.config.include_site_info.then_some(&self.config.site),
            categories: &categories,
            records: &records,
            custom_data: &self.config.custom_data,
        });
        let raw_size = text.len();
        let text = self.compactor.compact(text).await;
        info!(
            records = records.len(),
            raw_bytes = raw_size,
            final_bytes = text.len(),
            "knowledge base built"
        );
        Ok(text)
    }
}
