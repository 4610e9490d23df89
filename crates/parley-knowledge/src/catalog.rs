// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Content source backed by a JSON catalog exported by the host.

use std::path::PathBuf;

use async_trait::async_trait;
use parley_core::types::{AdapterType, AttributeValue, Category, ContentRecord, HealthStatus};
use parley_core::{ContentSource, ParleyError, PluginAdapter};
use serde::{Deserialize, Serialize};

/// The exported catalog document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub records: Vec<ContentRecord>,
}

impl Catalog {
    /// Records of `category`, newest first, without excluded ids.
    pub fn select(&self, category: &str, limit: usize, exclude_ids: &[u64]) -> Vec<ContentRecord> {
        let mut matching: Vec<&ContentRecord> = self
            .records
            .iter()
            .filter(|r| r.category == category && !exclude_ids.contains(&r.id))
            .collect();
        // RFC 3339 strings in one offset sort chronologically; ties keep id order.
        matching.sort_by(|a, b| b.modified_at.cmp(&a.modified_at).then(b.id.cmp(&a.id)));
        matching.into_iter().take(limit).cloned().collect()
    }
}

/// Reads the catalog file on every call, so a host re-export followed by a
/// cache invalidation is picked up without a restart. A missing file is an
/// empty catalog.
pub struct FileContentSource {
    path: Option<PathBuf>,
}

impl FileContentSource {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    async fn load(&self) -> Result<Catalog, ParleyError> {
        let Some(path) = &self.path else {
            return Ok(Catalog::default());
        };
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "content catalog not found, treating as empty");
                return Ok(Catalog::default());
            }
            Err(e) => {
                return Err(ParleyError::Internal(format!(
                    "failed to read content catalog {}: {e}",
                    path.display()
                )));
            }
        };
        serde_json::from_slice(&bytes).map_err(|e| {
            ParleyError::Internal(format!("invalid content catalog {}: {e}", path.display()))
        })
    }
}

#[async_trait]
impl PluginAdapter for FileContentSource {
    fn name(&self) -> &str {
        "json-catalog"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::ContentSource
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        match self.load().await {
            Ok(_) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Degraded(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        Ok(())
    }
}

#[async_trait]
impl ContentSource for FileContentSource {
    async fn list_records(
        &self,
        category: &str,
        limit: usize,
        exclude_ids: &[u64],
    ) -> Result<Vec<ContentRecord>, ParleyError> {
        Ok(self.load().await?.select(category, limit, exclude_ids))
    }

    async fn get_attribute(
        &self,
        record_id: u64,
        key: &str,
    ) -> Result<Option<AttributeValue>, ParleyError> {
        let catalog = self.load().await?;
        Ok(catalog
            .records
            .into_iter()
            .find(|r| r.id == record_id)
            .and_then(|mut r| r.attributes.remove(key)))
    }

    async fn get_categories(&self) -> Result<Vec<Category>, ParleyError> {
        Ok(self.load().await?.categories)
    }
}
