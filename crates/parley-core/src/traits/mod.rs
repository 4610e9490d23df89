// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod ai;
pub mod classifier;
pub mod content;
pub mod notifier;
pub mod storage;

pub use adapter::PluginAdapter;
pub use ai::AiClient;
pub use classifier::NeedsHumanClassifier;
pub use content::ContentSource;
pub use notifier::Notifier;
pub use storage::StorageAdapter;
