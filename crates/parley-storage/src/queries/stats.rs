// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dashboard aggregates.

use parley_core::ParleyError;
use parley_core::types::ChatStats;
use rusqlite::params;

use crate::database::Database;

/// Compute dashboard counters. `day_start` is an ISO timestamp marking the
/// start of "today" in the operator's timezone.
///
/// The average response time pairs each visitor message since `day_start`
/// with the first AI or staff message after it in the same conversation.
pub async fn stats(db: &Database, day_start: &str) -> Result<ChatStats, ParleyError> {
    let day_start = day_start.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT
                     (SELECT COUNT(*) FROM conversations),
                     (SELECT COUNT(*) FROM conversations WHERE status = 'pending'),
                     (SELECT COUNT(*) FROM conversations
                      WHERE status = 'resolved' AND updated_at >= ?1),
                     (SELECT COUNT(*) FROM messages WHERE created_at >= ?1),
                     (SELECT COUNT(*) FROM messages WHERE sender_type = 'visitor' AND is_read = 0),
                     (SELECT AVG((julianday(r.created_at) - julianday(m.created_at)) * 86400.0)
                      FROM messages m
                      JOIN messages r ON r.id = (
                          SELECT MIN(r2.id) FROM messages r2
                          WHERE r2.conversation_id = m.conversation_id
                            AND r2.id > m.id
                            AND r2.sender_type IN ('ai', 'staff'))
                      WHERE m.sender_type = 'visitor' AND m.created_at >= ?1)",
                params![day_start],
                |row| {
                    Ok(ChatStats {
                        total_conversations: row.get(0)?,
                        pending_conversations: row.get(1)?,
                        resolved_today: row.get(2)?,
                        total_messages_today: row.get(3)?,
                        unread_count: row.get(4)?,
                        avg_response_time_secs: row.get(5)?,
                    })
                },
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}
