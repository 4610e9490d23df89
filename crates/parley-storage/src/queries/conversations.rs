// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation operations.

use parley_core::types::{
    Conversation, ConversationDetail, ConversationFilter, ConversationPage, ConversationPatch,
    ConversationSummary,
};
use parley_core::ParleyError;
use rusqlite::types::Value;
use rusqlite::{OptionalExtension, TransactionBehavior, params, params_from_iter};

use crate::database::Database;
use crate::models::{CONVERSATION_COLUMNS, conversation_at, conversation_from_row};

/// Result of a conversation update, decided inside the writer thread.
enum UpdateOutcome {
    Updated,
    Missing,
    /// Reopening would give the visitor a second live conversation.
    LiveConflict,
}

fn select_by_id(conn: &rusqlite::Connection, id: i64) -> rusqlite::Result<Option<Conversation>> {
    conn.query_row(
        &format!("SELECT {CONVERSATION_COLUMNS} FROM conversations c WHERE c.id = ?1"),
        params![id],
        conversation_from_row,
    )
    .optional()
}

/// Return the visitor's live conversation or open a new AI-handled one.
///
/// Runs inside an IMMEDIATE transaction on the single writer connection, and
/// the partial unique index on live conversations backs it up, so concurrent
/// first messages from one visitor converge on the same conversation.
pub async fn get_or_create_conversation(
    db: &Database,
    visitor_id: i64,
    now: &str,
) -> Result<Conversation, ParleyError> {
    let now = now.to_string();
    db.connection()
        .call(move |conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
            let existing = tx
                .query_row(
                    &format!(
                        "SELECT {CONVERSATION_COLUMNS} FROM conversations c
                         WHERE c.visitor_id = ?1 AND c.status IN ('open', 'pending')
                         ORDER BY c.id DESC LIMIT 1"
                    ),
                    params![visitor_id],
                    conversation_from_row,
                )
                .optional()?;

            let conversation = match existing {
                Some(c) => c,
                None => {
                    tx.execute(
                        "INSERT INTO conversations (visitor_id, status, handled_by, created_at, updated_at)
                         VALUES (?1, 'open', 'ai', ?2, ?2)",
                        params![visitor_id, now],
                    )?;
                    let id = tx.last_insert_rowid();
                    select_by_id(&tx, id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)?
                }
            };
            tx.commit()?;
            Ok(conversation)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Fetch a conversation joined with its visitor's contact fields.
pub async fn get_conversation(
    db: &Database,
    id: i64,
) -> Result<Option<ConversationDetail>, ParleyError> {
    db.connection()
        .call(move |conn| {
            conn.query_row(
                &format!(
                    "SELECT {CONVERSATION_COLUMNS}, v.token, v.name, v.email, v.phone
                     FROM conversations c JOIN visitors v ON v.id = c.visitor_id
                     WHERE c.id = ?1"
                ),
                params![id],
                |row| {
                    Ok(ConversationDetail {
                        conversation: conversation_at(row, 0)?,
                        visitor_token: row.get(9)?,
                        visitor_name: row.get(10)?,
                        visitor_email: row.get(11)?,
                        visitor_phone: row.get(12)?,
                    })
                },
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Escape LIKE wildcards so a search term matches literally.
fn like_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Staff inbox: newest activity first, with last message and unread count.
pub async fn list_conversations(
    db: &Database,
    filter: &ConversationFilter,
) -> Result<ConversationPage, ParleyError> {
    let page = filter.page.max(1);
    let per_page = filter.per_page.clamp(1, 100);
    let offset = i64::from(page - 1) * i64::from(per_page);

    let mut clauses = Vec::new();
    let mut values: Vec<Value> = Vec::new();
    if let Some(status) = filter.status {
        clauses.push("c.status = ?");
        values.push(Value::Text(status.to_string()));
    }
    if let Some(term) = filter.search.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        clauses.push("(v.name LIKE ? ESCAPE '\\' OR v.email LIKE ? ESCAPE '\\')");
        let pattern = like_pattern(term);
        values.push(Value::Text(pattern.clone()));
        values.push(Value::Text(pattern));
    }
    let where_sql = if clauses.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", clauses.join(" AND "))
    };

    db.connection()
        .call(move |conn| {
            let total: i64 = conn.query_row(
                &format!(
                    "SELECT COUNT(*) FROM conversations c
                     JOIN visitors v ON v.id = c.visitor_id {where_sql}"
                ),
                params_from_iter(values.iter()),
                |row| row.get(0),
            )?;

            let mut page_values = values.clone();
            page_values.push(Value::Integer(i64::from(per_page)));
            page_values.push(Value::Integer(offset));

            let mut stmt = conn.prepare(&format!(
                "SELECT {CONVERSATION_COLUMNS}, v.name, v.email,
                     (SELECT m.body FROM messages m WHERE m.conversation_id = c.id
                      ORDER BY m.id DESC LIMIT 1),
                     (SELECT COUNT(*) FROM messages m WHERE m.conversation_id = c.id
                      AND m.sender_type = 'visitor' AND m.is_read = 0)
                 FROM conversations c JOIN visitors v ON v.id = c.visitor_id
                 {where_sql}
                 ORDER BY c.updated_at DESC, c.id DESC
                 LIMIT ? OFFSET ?"
            ))?;
            let rows = stmt.query_map(params_from_iter(page_values.iter()), |row| {
                Ok(ConversationSummary {
                    conversation: conversation_at(row, 0)?,
                    visitor_name: row.get(9)?,
                    visitor_email: row.get(10)?,
                    last_message: row.get(11)?,
                    unread_count: row.get(12)?,
                })
            })?;
            let items = rows.collect::<Result<Vec<_>, _>>()?;

            Ok(ConversationPage {
                items,
                total,
                page,
                per_page,
            })
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Apply a partial update and stamp `updated_at`.
///
/// Returns `Ok(false)` for an unknown id. Moving a conversation back to a
/// live status while the visitor already has another live one is rejected
/// with [`ParleyError::Validation`].
pub async fn update_conversation(
    db: &Database,
    id: i64,
    patch: &ConversationPatch,
    now: &str,
) -> Result<bool, ParleyError> {
    let mut sets = vec!["updated_at = ?"];
    let mut values = vec![Value::Text(now.to_string())];
    if let Some(status) = patch.status {
        sets.push("status = ?");
        values.push(Value::Text(status.to_string()));
    }
    if let Some(handled_by) = patch.handled_by {
        sets.push("handled_by = ?");
        values.push(Value::Text(handled_by.to_string()));
    }
    if let Some(staff_id) = &patch.staff_id {
        sets.push("staff_id = ?");
        values.push(Value::Text(staff_id.clone()));
    }
    if let Some(rating) = patch.rating {
        sets.push("rating = ?");
        values.push(Value::Integer(i64::from(rating)));
    }
    if let Some(comment) = &patch.rating_comment {
        sets.push("rating_comment = ?");
        values.push(Value::Text(comment.clone()));
    }
    values.push(Value::Integer(id));
    let sql = format!("UPDATE conversations SET {} WHERE id = ?", sets.join(", "));

    let outcome = db
        .connection()
        .call(move |conn| match conn.execute(&sql, params_from_iter(values.iter())) {
            Ok(0) => Ok(UpdateOutcome::Missing),
            Ok(_) => Ok(UpdateOutcome::Updated),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
            {
                Ok(UpdateOutcome::LiveConflict)
            }
            Err(e) => Err(e),
        })
        .await
        .map_err(crate::database::map_tr_err)?;

    match outcome {
        UpdateOutcome::Updated => Ok(true),
        UpdateOutcome::Missing => Ok(false),
        UpdateOutcome::LiveConflict => Err(ParleyError::Validation(
            "visitor already has an open or pending conversation".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::visitors::get_or_create_visitor;
    use parley_core::types::{ConversationStatus, HandledBy, VisitorOrigin, VisitorProfile};

    const NOW: &str = "2026-03-02T09:00:00.000Z";

    async fn visitor(db: &Database, token: &str, name: Option<&str>) -> i64 {
        let profile = VisitorProfile {
            name: name.map(str::to_string),
            email: name.map(|n| format!("{}@example.com", n.to_lowercase())),
            ..Default::default()
        };
        get_or_create_visitor(db, token, &profile, &VisitorOrigin::default(), NOW)
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn second_call_reuses_live_conversation() {
        let db = Database::open_in_memory().await.unwrap();
        let vid = visitor(&db, "v_1_ccccccccc", None).await;

        let first = get_or_create_conversation(&db, vid, NOW).await.unwrap();
        assert_eq!(first.status, ConversationStatus::Open);
        assert_eq!(first.handled_by, HandledBy::Ai);

        let second = get_or_create_conversation(&db, vid, NOW).await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn pending_conversation_is_still_live() {
        let db = Database::open_in_memory().await.unwrap();
        let vid = visitor(&db, "v_1_ddddddddd", None).await;
        let c = get_or_create_conversation(&db, vid, NOW).await.unwrap();
        update_conversation(&db, c.id, &ConversationPatch::escalate(), NOW)
            .await
            .unwrap();
        assert_eq!(get_or_create_conversation(&db, vid, NOW).await.unwrap().id, c.id);
    }

    #[tokio::test]
    async fn resolved_conversation_starts_a_new_one() {
        let db = Database::open_in_memory().await.unwrap();
        let vid = visitor(&db, "v_1_eeeeeeeee", None).await;
        let old = get_or_create_conversation(&db, vid, NOW).await.unwrap();
        let patch = ConversationPatch {
            status: Some(ConversationStatus::Resolved),
            ..Default::default()
        };
        assert!(update_conversation(&db, old.id, &patch, NOW).await.unwrap());

        let new = get_or_create_conversation(&db, vid, NOW).await.unwrap();
        assert_ne!(old.id, new.id);
        assert_eq!(new.status, ConversationStatus::Open);
    }

    #[tokio::test]
    async fn concurrent_first_messages_converge() {
        let db = Database::open_in_memory().await.unwrap();
        let vid = visitor(&db, "v_1_fffffffff", None).await;

        let attempts = (0..8).map(|_| {
            let db = db.clone();
            tokio::spawn(async move { get_or_create_conversation(&db, vid, NOW).await.unwrap().id })
        });
        let ids: Vec<i64> = futures::future::join_all(attempts)
            .await
            .into_iter()
            .map(|r| r.unwrap())
            .collect();
        assert!(ids.windows(2).all(|w| w[0] == w[1]), "ids diverged: {ids:?}");
    }

    #[tokio::test]
    async fn reopening_while_another_is_live_is_rejected() {
        let db = Database::open_in_memory().await.unwrap();
        let vid = visitor(&db, "v_1_ggggggggg", None).await;
        let old = get_or_create_conversation(&db, vid, NOW).await.unwrap();
        let close = ConversationPatch {
            status: Some(ConversationStatus::Closed),
            ..Default::default()
        };
        update_conversation(&db, old.id, &close, NOW).await.unwrap();
        get_or_create_conversation(&db, vid, NOW).await.unwrap();

        let reopen = ConversationPatch {
            status: Some(ConversationStatus::Open),
            ..Default::default()
        };
        let err = update_conversation(&db, old.id, &reopen, NOW).await.unwrap_err();
        assert!(matches!(err, ParleyError::Validation(_)));
    }

    #[tokio::test]
    async fn update_unknown_conversation_returns_false() {
        let db = Database::open_in_memory().await.unwrap();
        let patch = ConversationPatch {
            rating: Some(4),
            ..Default::default()
        };
        assert!(!update_conversation(&db, 404, &patch, NOW).await.unwrap());
    }

    #[tokio::test]
    async fn detail_joins_visitor_fields() {
        let db = Database::open_in_memory().await.unwrap();
        let vid = visitor(&db, "v_1_hhhhhhhhh", Some("Binh")).await;
        let c = get_or_create_conversation(&db, vid, NOW).await.unwrap();

        let detail = get_conversation(&db, c.id).await.unwrap().unwrap();
        assert_eq!(detail.conversation.id, c.id);
        assert_eq!(detail.visitor_token, "v_1_hhhhhhhhh");
        assert_eq!(detail.visitor_name.as_deref(), Some("Binh"));
        assert!(get_conversation(&db, c.id + 100).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_filters_by_status_and_search() {
        let db = Database::open_in_memory().await.unwrap();
        let a = visitor(&db, "v_1_aaaaaaaa1", Some("Alice")).await;
        let b = visitor(&db, "v_1_bbbbbbbb2", Some("Bob")).await;
        let ca = get_or_create_conversation(&db, a, NOW).await.unwrap();
        get_or_create_conversation(&db, b, NOW).await.unwrap();
        update_conversation(&db, ca.id, &ConversationPatch::escalate(), "2026-03-02T09:05:00.000Z")
            .await
            .unwrap();

        let all = list_conversations(&db, &ConversationFilter::default())
            .await
            .unwrap();
        assert_eq!(all.total, 2);
        assert_eq!(all.items[0].conversation.id, ca.id, "most recently updated first");

        let pending = list_conversations(
            &db,
            &ConversationFilter {
                status: Some(ConversationStatus::Pending),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(pending.total, 1);
        assert_eq!(pending.items[0].visitor_name.as_deref(), Some("Alice"));

        let search = list_conversations(
            &db,
            &ConversationFilter {
                search: Some("bob@".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(search.total, 1);
        assert_eq!(search.items[0].visitor_name.as_deref(), Some("Bob"));
    }

    #[tokio::test]
    async fn list_paginates() {
        let db = Database::open_in_memory().await.unwrap();
        for i in 0..5 {
            let vid = visitor(&db, &format!("v_1_page0000{i}"), None).await;
            get_or_create_conversation(&db, vid, NOW).await.unwrap();
        }
        let page = list_conversations(
            &db,
            &ConversationFilter {
                page: 2,
                per_page: 2,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.page, 2);
    }

    #[tokio::test]
    async fn page_far_past_the_end_is_empty_and_harmless() {
        let db = Database::open_in_memory().await.unwrap();
        let vid = visitor(&db, "v_1_farpage00", None).await;
        get_or_create_conversation(&db, vid, NOW).await.unwrap();

        let page = list_conversations(
            &db,
            &ConversationFilter {
                page: u32::MAX,
                per_page: 100,
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(page.total, 1);
        assert!(page.items.is_empty());

        // The connection is still usable afterwards.
        let first = list_conversations(&db, &ConversationFilter::default())
            .await
            .unwrap();
        assert_eq!(first.items.len(), 1);
    }

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
    }
}
