// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content aggregation: read selected categories from the host catalog.

use std::sync::Arc;

use parley_config::model::{KnowledgeConfig, SourceSelection};
use parley_core::types::Category;
use parley_core::{ContentSource, ParleyError};
use tracing::debug;

use crate::normalize::{BUILTIN_FIELDS, NormalizedRecord, normalize};

/// Reads and normalizes records from a [`ContentSource`]. Never writes.
pub struct ContentAggregator {
    source: Arc<dyn ContentSource>,
    max_content_length: usize,
    frontend_url: Option<String>,
    excluded_ids: Vec<u64>,
}

impl ContentAggregator {
    pub fn new(source: Arc<dyn ContentSource>, config: &KnowledgeConfig) -> Self {
        Self {
            source,
            max_content_length: config.max_content_length,
            frontend_url: config.frontend_url.clone(),
            excluded_ids: config.excluded_ids.clone(),
        }
    }

    /// Normalized records for every selection, in selection order.
    ///
    /// Within a category the source's order (most recently modified first) is
    /// kept. A category with no records contributes nothing.
    pub async fn fetch(
        &self,
        selections: &[SourceSelection],
    ) -> Result<Vec<NormalizedRecord>, ParleyError> {
        let mut out = Vec::new();
        for selection in selections {
            if selection.limit == 0 {
                continue;
            }
            let records = self
                .source
                .list_records(&selection.category, selection.limit, &self.excluded_ids)
                .await?;
            debug!(
                category = selection.category.as_str(),
                count = records.len(),
                "content records read"
            );

            let custom_fields: Vec<&str> = selection
                .fields
                .iter()
                .map(String::as_str)
                .filter(|f| !BUILTIN_FIELDS.contains(f))
                .collect();

            for record in records
                .iter()
                .filter(|r| !self.excluded_ids.contains(&r.id))
                .take(selection.limit)
            {
                let mut normalized = normalize(
                    record,
                    selection,
                    self.max_content_length,
                    self.frontend_url.as_deref(),
                );
                for field in &custom_fields {
                    if let Some(value) = self.source.get_attribute(record.id, field).await? {
                        let rendered = value.render();
                        if !rendered.is_empty() {
                            normalized.details.push((field.to_string(), rendered));
                        }
                    }
                }
                out.push(normalized);
            }
        }
        Ok(out)
    }

    /// Commerce categories that actually hold items.
    pub async fn categories(&self) -> Result<Vec<Category>, ParleyError> {
        let mut categories = self.source.get_categories().await?;
        categories.retain(|c| c.count > 0);
        Ok(categories)
    }
}
