// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only view of the host content catalog.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AttributeValue, Category, ContentRecord};

/// Adapter over the host's articles, pages, and products.
///
/// The catalog is never mutated through this trait.
#[async_trait]
pub trait ContentSource: PluginAdapter {
    /// Up to `limit` published records of `category`, most recently modified
    /// first, skipping any id in `exclude_ids`.
    async fn list_records(
        &self,
        category: &str,
        limit: usize,
        exclude_ids: &[u64],
    ) -> Result<Vec<ContentRecord>, ParleyError>;

    /// A single custom attribute of a record, if it has one.
    async fn get_attribute(
        &self,
        record_id: u64,
        key: &str,
    ) -> Result<Option<AttributeValue>, ParleyError>;

    /// Commerce categories with their item counts.
    async fn get_categories(&self) -> Result<Vec<Category>, ParleyError>;
}
