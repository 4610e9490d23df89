// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Knowledge pipeline for the Parley AI prompt.
//!
//! Reads the host content catalog through a [`parley_core::ContentSource`],
//! normalizes and formats it into bounded text, compacts it when it grows
//! past a threshold, and caches the result for the reply path.

pub mod aggregator;
pub mod cache;
pub mod catalog;
pub mod compaction;
pub mod format;
pub mod normalize;
pub mod prompt;
pub mod service;

pub use aggregator::ContentAggregator;
pub use catalog::{Catalog, FileContentSource};
pub use compaction::{Compactor, TRUNCATION_NOTICE, enforce_hard_cap};
pub use normalize::NormalizedRecord;
pub use prompt::build_system_prompt;
pub use service::KnowledgeService;
