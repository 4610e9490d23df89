// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Parley support chat.
//!
//! This crate provides the error type, the conversation and content domain
//! types, and the adapter traits that storage, AI, notification, and content
//! source implementations plug into.

pub mod clock;
pub mod error;
pub mod traits;
pub mod types;

pub use clock::{Clock, SystemClock, format_timestamp};
pub use error::ParleyError;
pub use types::{
    AdapterType, ConversationStatus, HandledBy, HealthStatus, SenderType, Visitor,
    VisitorProfile,
};

pub use traits::{
    AiClient, ContentSource, NeedsHumanClassifier, Notifier, PluginAdapter, StorageAdapter,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_trait_modules_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_storage_adapter<T: StorageAdapter>() {}
        fn _assert_ai_client<T: AiClient>() {}
        fn _assert_content_source<T: ContentSource>() {}
        fn _assert_notifier<T: Notifier>() {}
        fn _assert_classifier<T: NeedsHumanClassifier>() {}
    }

    #[test]
    fn adapter_type_round_trips() {
        use std::str::FromStr;

        for variant in [
            AdapterType::Provider,
            AdapterType::Storage,
            AdapterType::Notifier,
            AdapterType::ContentSource,
        ] {
            let parsed = AdapterType::from_str(&variant.to_string()).expect("should parse back");
            assert_eq!(variant, parsed);
        }
    }
}
