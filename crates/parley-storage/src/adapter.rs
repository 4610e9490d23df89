// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite implementation of the StorageAdapter trait.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::debug;

use parley_config::model::StorageConfig;
use parley_core::types::{
    ChatStats, Conversation, ConversationDetail, ConversationFilter, ConversationPage,
    ConversationPatch, Message, SenderType, Visitor, VisitorOrigin, VisitorProfile,
};
use parley_core::{
    AdapterType, Clock, HealthStatus, ParleyError, PluginAdapter, StorageAdapter, SystemClock,
    format_timestamp,
};

use crate::database::Database;
use crate::queries;

/// SQLite-backed storage adapter.
///
/// Wraps a [`Database`] handle and delegates to the per-table query modules.
/// The database is opened on the first call to [`StorageAdapter::initialize`].
/// Every `*_at` column it writes is stamped from its [`Clock`].
pub struct SqliteStorage {
    config: StorageConfig,
    db: OnceCell<Database>,
    clock: Arc<dyn Clock>,
}

impl SqliteStorage {
    /// Create a new SqliteStorage. Nothing is opened until `initialize`.
    pub fn new(config: StorageConfig) -> Self {
        Self {
            config,
            db: OnceCell::new(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Wrap an already-open database, e.g. an in-memory one in tests.
    pub fn from_database(db: Database) -> Self {
        Self {
            config: StorageConfig {
                database_path: ":memory:".to_string(),
            },
            db: OnceCell::new_with(Some(db)),
            clock: Arc::new(SystemClock),
        }
    }

    /// Stamp rows from `clock` instead of the system clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> String {
        format_timestamp(self.clock.now())
    }

    fn db(&self) -> Result<&Database, ParleyError> {
        self.db.get().ok_or_else(|| ParleyError::Storage {
            source: "storage not initialized, call initialize() first".into(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SqliteStorage {
    fn name(&self) -> &str {
        "sqlite"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        let Ok(db) = self.db() else {
            return Ok(HealthStatus::Unhealthy("not initialized".to_string()));
        };
        db.connection()
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("SELECT 1;")?;
                Ok(())
            })
            .await
            .map_err(crate::database::map_tr_err)?;
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        if let Some(db) = self.db.get() {
            db.checkpoint().await?;
            debug!("shutdown: WAL checkpoint complete");
        }
        Ok(())
    }
}

#[async_trait]
impl StorageAdapter for SqliteStorage {
    async fn initialize(&self) -> Result<(), ParleyError> {
        let path = self.config.database_path.clone();
        let db = Database::open(&path).await?;
        self.db.set(db).map_err(|_| ParleyError::Storage {
            source: "storage already initialized".into(),
        })?;
        debug!(path = %self.config.database_path, "SQLite storage initialized");
        Ok(())
    }

    async fn close(&self) -> Result<(), ParleyError> {
        self.db()?.checkpoint().await?;
        debug!("WAL checkpoint complete");
        Ok(())
    }

    // --- Visitor operations ---

    async fn get_or_create_visitor(
        &self,
        token: &str,
        profile: &VisitorProfile,
        origin: &VisitorOrigin,
    ) -> Result<Visitor, ParleyError> {
        queries::visitors::get_or_create_visitor(self.db()?, token, profile, origin, &self.now())
            .await
    }

    async fn get_visitor(&self, token: &str) -> Result<Option<Visitor>, ParleyError> {
        queries::visitors::get_visitor(self.db()?, token).await
    }

    async fn update_visitor(
        &self,
        token: &str,
        profile: &VisitorProfile,
    ) -> Result<Option<Visitor>, ParleyError> {
        queries::visitors::update_visitor(self.db()?, token, profile, &self.now()).await
    }

    // --- Conversation operations ---

    async fn get_or_create_conversation(
        &self,
        visitor_id: i64,
    ) -> Result<Conversation, ParleyError> {
        queries::conversations::get_or_create_conversation(self.db()?, visitor_id, &self.now())
            .await
    }

    async fn get_conversation(&self, id: i64) -> Result<Option<ConversationDetail>, ParleyError> {
        queries::conversations::get_conversation(self.db()?, id).await
    }

    async fn list_conversations(
        &self,
        filter: &ConversationFilter,
    ) -> Result<ConversationPage, ParleyError> {
        queries::conversations::list_conversations(self.db()?, filter).await
    }

    async fn update_conversation(
        &self,
        id: i64,
        patch: &ConversationPatch,
    ) -> Result<bool, ParleyError> {
        queries::conversations::update_conversation(self.db()?, id, patch, &self.now()).await
    }

    // --- Message operations ---

    async fn append_message(
        &self,
        conversation_id: i64,
        sender: SenderType,
        body: &str,
        staff_id: Option<&str>,
    ) -> Result<Message, ParleyError> {
        queries::messages::append_message(
            self.db()?,
            conversation_id,
            sender,
            body,
            staff_id,
            &self.now(),
        )
        .await
    }

    async fn list_messages_after(
        &self,
        conversation_id: i64,
        after_id: i64,
    ) -> Result<Vec<Message>, ParleyError> {
        queries::messages::list_messages_after(self.db()?, conversation_id, after_id).await
    }

    async fn last_messages(
        &self,
        conversation_id: i64,
        limit: usize,
    ) -> Result<Vec<Message>, ParleyError> {
        queries::messages::last_messages(self.db()?, conversation_id, limit).await
    }

    async fn mark_read(
        &self,
        conversation_id: i64,
        sender: SenderType,
    ) -> Result<usize, ParleyError> {
        queries::messages::mark_read(self.db()?, conversation_id, sender).await
    }

    async fn unread_count(&self) -> Result<i64, ParleyError> {
        queries::messages::unread_count(self.db()?).await
    }

    async fn stats(&self, day_start: &str) -> Result<ChatStats, ParleyError> {
        queries::stats::stats(self.db()?, day_start).await
    }

    // --- Expiring key-value operations ---

    async fn kv_get(&self, key: &str, now_secs: i64) -> Result<Option<String>, ParleyError> {
        queries::kv::kv_get(self.db()?, key, now_secs).await
    }

    async fn kv_set(
        &self,
        key: &str,
        value: &str,
        ttl_secs: i64,
        now_secs: i64,
    ) -> Result<(), ParleyError> {
        queries::kv::kv_set(self.db()?, key, value, ttl_secs, now_secs).await
    }

    async fn kv_incr(&self, key: &str, ttl_secs: i64, now_secs: i64) -> Result<i64, ParleyError> {
        queries::kv::kv_incr(self.db()?, key, ttl_secs, now_secs).await
    }

    async fn kv_delete(&self, key: &str) -> Result<(), ParleyError> {
        queries::kv::kv_delete(self.db()?, key).await
    }

    async fn kv_purge_expired(&self, now_secs: i64) -> Result<usize, ParleyError> {
        queries::kv::kv_purge_expired(self.db()?, now_secs).await
    }
}
