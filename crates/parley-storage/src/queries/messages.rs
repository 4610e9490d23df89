// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Message operations.

use parley_core::types::{Message, SenderType};
use parley_core::ParleyError;
use rusqlite::{TransactionBehavior, params};

use crate::database::Database;
use crate::models::{MESSAGE_COLUMNS, message_from_row};

/// Append a message and bump the conversation's `updated_at`.
///
/// Visitor messages are stored unread, every other sender is stored read.
pub async fn append_message(
    db: &Database,
    conversation_id: i64,
    sender: SenderType,
    body: &str,
    staff_id: Option<&str>,
    now: &str,
) -> Result<Message, ParleyError> {
    let body = body.to_string();
    let staff_id = staff_id.map(str::to_string);
    let now = now.to_string();

    let appended = db
        .connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let touched = tx.execute(
                "UPDATE conversations SET updated_at = ?1 WHERE id = ?2",
                params![now, conversation_id],
            )?;
            if touched == 0 {
                return Ok(None);
            }
            tx.execute(
                "INSERT INTO messages (conversation_id, sender_type, staff_id, body, is_read, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    conversation_id,
                    sender.to_string(),
                    staff_id,
                    body,
                    sender.initially_read(),
                    now,
                ],
            )?;
            let id = tx.last_insert_rowid();
            let message = tx.query_row(
                &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE id = ?1"),
                params![id],
                message_from_row,
            )?;
            tx.commit()?;
            Ok(Some(message))
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    appended.ok_or_else(|| ParleyError::conversation_not_found(conversation_id))
}

/// Messages with id greater than `after_id`, oldest first.
pub async fn list_messages_after(
    db: &Database,
    conversation_id: i64,
    after_id: i64,
) -> Result<Vec<Message>, ParleyError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE conversation_id = ?1 AND id > ?2 ORDER BY id ASC"
            ))?;
            let rows = stmt.query_map(params![conversation_id, after_id], message_from_row)?;
            rows.collect::<Result<Vec<_>, _>>()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// The most recent `limit` messages, returned oldest first.
pub async fn last_messages(
    db: &Database,
    conversation_id: i64,
    limit: usize,
) -> Result<Vec<Message>, ParleyError> {
    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {MESSAGE_COLUMNS} FROM messages
                 WHERE conversation_id = ?1 ORDER BY id DESC LIMIT ?2"
            ))?;
            let rows = stmt.query_map(params![conversation_id, limit], message_from_row)?;
            let mut messages = rows.collect::<Result<Vec<_>, _>>()?;
            messages.reverse();
            Ok(messages)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Mark every unread message from `sender` in the conversation as read.
pub async fn mark_read(
    db: &Database,
    conversation_id: i64,
    sender: SenderType,
) -> Result<usize, ParleyError> {
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE messages SET is_read = 1
                 WHERE conversation_id = ?1 AND sender_type = ?2 AND is_read = 0",
                params![conversation_id, sender.to_string()],
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Unread visitor messages across all conversations.
pub async fn unread_count(db: &Database) -> Result<i64, ParleyError> {
    db.connection()
        .call(|conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM messages WHERE sender_type = 'visitor' AND is_read = 0",
                [],
                |row| row.get::<_, i64>(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}
