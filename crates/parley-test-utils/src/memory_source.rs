// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory content catalog.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use parley_core::types::{AdapterType, AttributeValue, Category, ContentRecord, HealthStatus};
use parley_core::{ContentSource, ParleyError, PluginAdapter};

/// A [`ContentSource`] over a fixed, replaceable set of records.
///
/// Counts `list_records` calls so tests can observe cache hits.
#[derive(Debug, Default)]
pub struct MemoryContentSource {
    records: Mutex<Vec<ContentRecord>>,
    attributes: HashMap<(u64, String), AttributeValue>,
    categories: Vec<Category>,
    list_calls: AtomicUsize,
    hold: Mutex<Option<ListHold>>,
}

/// Pauses one `list_records` call after it has read the records.
#[derive(Debug, Clone, Default)]
pub struct ListHold {
    read: Arc<Notify>,
    release: Arc<Notify>,
}

impl ListHold {
    /// Resolves once the held call has taken its snapshot.
    pub async fn wait_until_read(&self) {
        self.read.notified().await;
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

impl MemoryContentSource {
    pub fn new(records: Vec<ContentRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    /// Adds a custom attribute served by `get_attribute`.
    pub fn with_attribute(mut self, record_id: u64, key: &str, value: AttributeValue) -> Self {
        self.attributes.insert((record_id, key.to_string()), value);
        self
    }

    pub fn with_categories(mut self, categories: Vec<Category>) -> Self {
        self.categories = categories;
        self
    }

    /// Simulates host edits.
    pub fn replace_records(&self, records: Vec<ContentRecord>) {
        *self.records.lock().unwrap_or_else(|e| e.into_inner()) = records;
    }

    /// Holds the next `list_records` call until [`ListHold::release`].
    pub fn hold_next_list(&self) -> ListHold {
        let hold = ListHold::default();
        *self.hold.lock().unwrap_or_else(|e| e.into_inner()) = Some(hold.clone());
        hold
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginAdapter for MemoryContentSource {
    fn name(&self) -> &str {
        "memory-content"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ContentSource
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        Ok(())
    }
}

#[async_trait]
impl ContentSource for MemoryContentSource {
    async fn list_records(
        &self,
        category: &str,
        limit: usize,
        exclude_ids: &[u64],
    ) -> Result<Vec<ContentRecord>, ParleyError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let mut matching: Vec<ContentRecord> = self
            .records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|r| r.category == category && !exclude_ids.contains(&r.id))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.modified_at.cmp(&a.modified_at).then(b.id.cmp(&a.id)));
        matching.truncate(limit);

        let hold = self.hold.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(hold) = hold {
            hold.read.notify_one();
            hold.release.notified().await;
        }
        Ok(matching)
    }

    async fn get_attribute(
        &self,
        record_id: u64,
        key: &str,
    ) -> Result<Option<AttributeValue>, ParleyError> {
        if let Some(value) = self.attributes.get(&(record_id, key.to_string())) {
            return Ok(Some(value.clone()));
        }
        let records = self.records.lock().unwrap_or_else(|e| e.into_inner());
        Ok(records
            .iter()
            .find(|r| r.id == record_id)
            .and_then(|r| r.attributes.get(key).cloned()))
    }

    async fn get_categories(&self) -> Result<Vec<Category>, ParleyError> {
        Ok(self.categories.clone())
    }
}
