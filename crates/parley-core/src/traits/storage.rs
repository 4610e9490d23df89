// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Storage adapter trait for persistence backends (SQLite, etc.).

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{
    ChatStats, ConversationDetail, ConversationFilter, ConversationPage, ConversationPatch,
    Conversation, Message, SenderType, Visitor, VisitorOrigin, VisitorProfile,
};

/// Adapter for storage and persistence backends.
///
/// Owns visitors, conversations, and messages, plus an expiring key-value
/// store used for rate-limit counters and bans. Timestamps passed as
/// `now_secs` are unix seconds from the caller's clock.
#[async_trait]
pub trait StorageAdapter: PluginAdapter {
    /// Initializes the storage backend (migrations, connection, etc.).
    async fn initialize(&self) -> Result<(), ParleyError>;

    /// Closes the storage backend, flushing pending writes.
    async fn close(&self) -> Result<(), ParleyError>;

    // --- Visitor operations ---

    /// Looks a visitor up by token, inserting it on a miss.
    ///
    /// Repeated calls with the same token never create duplicates. On a hit,
    /// only the non-empty profile fields are applied.
    async fn get_or_create_visitor(
        &self,
        token: &str,
        profile: &VisitorProfile,
        origin: &VisitorOrigin,
    ) -> Result<Visitor, ParleyError>;

    async fn get_visitor(&self, token: &str) -> Result<Option<Visitor>, ParleyError>;

    /// Merges non-empty profile fields; `None` when the token is unknown.
    async fn update_visitor(
        &self,
        token: &str,
        profile: &VisitorProfile,
    ) -> Result<Option<Visitor>, ParleyError>;

    // --- Conversation operations ---

    /// Returns the visitor's live (open or pending) conversation, creating an
    /// open, AI-handled one when none exists. Serialized per visitor.
    async fn get_or_create_conversation(&self, visitor_id: i64)
    -> Result<Conversation, ParleyError>;

    async fn get_conversation(&self, id: i64) -> Result<Option<ConversationDetail>, ParleyError>;

    async fn list_conversations(
        &self,
        filter: &ConversationFilter,
    ) -> Result<ConversationPage, ParleyError>;

    /// Applies `patch` and stamps `updated_at`. Returns false if `id` is unknown.
    async fn update_conversation(
        &self,
        id: i64,
        patch: &ConversationPatch,
    ) -> Result<bool, ParleyError>;

    // --- Message operations ---

    /// Inserts a message and bumps the conversation's `updated_at`.
    async fn append_message(
        &self,
        conversation_id: i64,
        sender: SenderType,
        body: &str,
        staff_id: Option<&str>,
    ) -> Result<Message, ParleyError>;

    /// Messages with `id > after_id`, ascending. The polling primitive.
    async fn list_messages_after(
        &self,
        conversation_id: i64,
        after_id: i64,
    ) -> Result<Vec<Message>, ParleyError>;

    /// The newest `limit` messages, returned oldest first.
    async fn last_messages(
        &self,
        conversation_id: i64,
        limit: usize,
    ) -> Result<Vec<Message>, ParleyError>;

    /// Flips every unread message from `sender` to read; returns how many changed.
    async fn mark_read(&self, conversation_id: i64, sender: SenderType)
    -> Result<usize, ParleyError>;

    /// Unread visitor messages across all conversations.
    async fn unread_count(&self) -> Result<i64, ParleyError>;

    /// Dashboard counters. `day_start` is an RFC 3339 timestamp for midnight.
    async fn stats(&self, day_start: &str) -> Result<ChatStats, ParleyError>;

    // --- Expiring key-value operations ---

    async fn kv_get(&self, key: &str, now_secs: i64) -> Result<Option<String>, ParleyError>;

    /// Replaces the whole value of `key`, expiring `ttl_secs` after `now_secs`.
    async fn kv_set(
        &self,
        key: &str,
        value: &str,
        ttl_secs: i64,
        now_secs: i64,
    ) -> Result<(), ParleyError>;

    /// Atomically increments a counter. The first increment (or the first
    /// after expiry) opens a window of `ttl_secs`; later ones keep its expiry.
    async fn kv_incr(&self, key: &str, ttl_secs: i64, now_secs: i64) -> Result<i64, ParleyError>;

    async fn kv_delete(&self, key: &str) -> Result<(), ParleyError>;

    /// Deletes expired rows; returns how many were removed.
    async fn kv_purge_expired(&self, now_secs: i64) -> Result<usize, ParleyError>;
}
