// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row mappers between SQLite rows and the core domain types.

use std::str::FromStr;

use rusqlite::Row;
use rusqlite::types::Type;

pub use parley_core::types::{
    ChatStats, Conversation, ConversationDetail, ConversationSummary, Message, Visitor,
};

/// Column list matching [`visitor_from_row`].
pub(crate) const VISITOR_COLUMNS: &str =
    "id, token, name, email, phone, ip, user_agent, page_url, created_at, last_seen_at";

/// Column list matching [`conversation_from_row`], qualified with `c.`.
pub(crate) const CONVERSATION_COLUMNS: &str = "c.id, c.visitor_id, c.status, c.handled_by, \
     c.staff_id, c.rating, c.rating_comment, c.created_at, c.updated_at";

/// Column list matching [`message_from_row`].
pub(crate) const MESSAGE_COLUMNS: &str =
    "id, conversation_id, sender_type, staff_id, body, is_read, created_at";

/// Parse a TEXT column through `FromStr`, reporting failures as a conversion error.
fn parse_text<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let raw: String = row.get(idx)?;
    raw.parse::<T>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

pub(crate) fn visitor_from_row(row: &Row<'_>) -> rusqlite::Result<Visitor> {
    Ok(Visitor {
        id: row.get(0)?,
        token: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        phone: row.get(4)?,
        ip: row.get(5)?,
        user_agent: row.get(6)?,
        page_url: row.get(7)?,
        created_at: row.get(8)?,
        last_seen_at: row.get(9)?,
    })
}

/// Map a conversation starting at column `base`.
pub(crate) fn conversation_at(row: &Row<'_>, base: usize) -> rusqlite::Result<Conversation> {
    Ok(Conversation {
        id: row.get(base)?,
        visitor_id: row.get(base + 1)?,
        status: parse_text(row, base + 2)?,
        handled_by: parse_text(row, base + 3)?,
        staff_id: row.get(base + 4)?,
        rating: row.get(base + 5)?,
        rating_comment: row.get(base + 6)?,
        created_at: row.get(base + 7)?,
        updated_at: row.get(base + 8)?,
    })
}

pub(crate) fn conversation_from_row(row: &Row<'_>) -> rusqlite::Result<Conversation> {
    conversation_at(row, 0)
}

pub(crate) fn message_from_row(row: &Row<'_>) -> rusqlite::Result<Message> {
    Ok(Message {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        sender_type: parse_text(row, 2)?,
        staff_id: row.get(3)?,
        body: row.get(4)?,
        is_read: row.get(5)?,
        created_at: row.get(6)?,
    })
}
