// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring of the production collaborators into a chat service.

use std::path::PathBuf;
use std::sync::Arc;

use parley_chat::{ChatDeps, ChatService};
use parley_config::ParleyConfig;
use parley_core::{AiClient, Clock, ParleyError, PluginAdapter, StorageAdapter, SystemClock};
use parley_gemini::GeminiProvider;
use parley_guard::AbuseGuard;
use parley_knowledge::{FileContentSource, KnowledgeService};
use parley_notify::build_notifier;
use parley_storage::SqliteStorage;
use tracing::info;

/// Every long-lived component of a running server.
pub struct App {
    pub storage: Arc<dyn StorageAdapter>,
    pub clock: Arc<dyn Clock>,
    pub chat: Arc<ChatService>,
}

/// The Gemini provider, or `None` when no API key is configured.
pub fn build_ai(config: &ParleyConfig) -> Result<Option<Arc<dyn AiClient>>, ParleyError> {
    let provider = GeminiProvider::new(&config.gemini)?;
    if provider.is_configured() {
        Ok(Some(Arc::new(provider)))
    } else {
        Ok(None)
    }
}

pub fn build_knowledge(
    config: &ParleyConfig,
    ai: Option<Arc<dyn AiClient>>,
    clock: Arc<dyn Clock>,
) -> Arc<KnowledgeService> {
    let source = FileContentSource::new(config.knowledge.catalog_path.as_ref().map(PathBuf::from));
    Arc::new(KnowledgeService::new(
        config.knowledge.clone(),
        Arc::new(source),
        ai,
        clock,
    ))
}

/// Opens storage (running migrations) and builds the chat service.
pub async fn build_app(config: &ParleyConfig) -> Result<App, ParleyError> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let storage: Arc<dyn StorageAdapter> = {
        let storage = SqliteStorage::new(config.storage.clone()).with_clock(clock.clone());
        storage.initialize().await?;
        Arc::new(storage)
    };
    let ai = build_ai(config)?;
    let notifier = build_notifier(&config.notify)?;
    let knowledge = build_knowledge(config, ai.clone(), clock.clone());
    let guard = Arc::new(AbuseGuard::new(
        storage.clone(),
        config.guard.clone(),
        clock.clone(),
    ));

    info!(
        ai = ai.is_some(),
        notifier = notifier.name(),
        database = %config.storage.database_path,
        "chat service assembled"
    );

    let chat = Arc::new(ChatService::new(
        config.chat.clone(),
        ChatDeps {
            storage: storage.clone(),
            guard,
            knowledge,
            ai,
            notifier,
            clock: clock.clone(),
        },
    ));

    Ok(App {
        storage,
        clock,
        chat,
    })
}
