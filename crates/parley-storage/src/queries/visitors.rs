// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Visitor operations.

use parley_core::types::{Visitor, VisitorOrigin, VisitorProfile};
use parley_core::ParleyError;
use rusqlite::{OptionalExtension, params};

use crate::database::Database;
use crate::models::{VISITOR_COLUMNS, visitor_from_row};

fn select_by_token(conn: &rusqlite::Connection, token: &str) -> rusqlite::Result<Option<Visitor>> {
    conn.query_row(
        &format!("SELECT {VISITOR_COLUMNS} FROM visitors WHERE token = ?1"),
        params![token],
        visitor_from_row,
    )
    .optional()
}

/// Insert the visitor on first sight, otherwise merge non-empty profile fields.
///
/// A single upsert keyed on the unique token, so concurrent calls for the same
/// token converge on one row. The first-seen origin is kept.
pub async fn get_or_create_visitor(
    db: &Database,
    token: &str,
    profile: &VisitorProfile,
    origin: &VisitorOrigin,
    now: &str,
) -> Result<Visitor, ParleyError> {
    let token = token.to_string();
    let profile = profile.normalized();
    let origin = origin.clone();
    let now = now.to_string();

    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO visitors
                     (token, name, email, phone, ip, user_agent, page_url, created_at, last_seen_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
                 ON CONFLICT(token) DO UPDATE SET
                     name = COALESCE(excluded.name, visitors.name),
                     email = COALESCE(excluded.email, visitors.email),
                     phone = COALESCE(excluded.phone, visitors.phone),
                     page_url = COALESCE(excluded.page_url, visitors.page_url),
                     ip = COALESCE(visitors.ip, excluded.ip),
                     user_agent = COALESCE(visitors.user_agent, excluded.user_agent),
                     last_seen_at = excluded.last_seen_at",
                params![
                    token,
                    profile.name,
                    profile.email,
                    profile.phone,
                    origin.ip,
                    origin.user_agent,
                    profile.page_url,
                    now,
                ],
            )?;
            select_by_token(conn, &token)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Look a visitor up by token.
pub async fn get_visitor(db: &Database, token: &str) -> Result<Option<Visitor>, ParleyError> {
    let token = token.to_string();
    db.connection()
        .call(move |conn| select_by_token(conn, &token))
        .await
        .map_err(crate::database::map_tr_err)
}

/// Merge non-empty profile fields into an existing visitor.
pub async fn update_visitor(
    db: &Database,
    token: &str,
    profile: &VisitorProfile,
    now: &str,
) -> Result<Option<Visitor>, ParleyError> {
    let token = token.to_string();
    let profile = profile.normalized();
    let now = now.to_string();

    db.connection()
        .call(move |conn| {
            let changed = conn.execute(
                "UPDATE visitors SET
                     name = COALESCE(?2, name),
                     email = COALESCE(?3, email),
                     phone = COALESCE(?4, phone),
                     page_url = COALESCE(?5, page_url),
                     last_seen_at = ?6
                 WHERE token = ?1",
                params![
                    token,
                    profile.name,
                    profile.email,
                    profile.phone,
                    profile.page_url,
                    now
                ],
            )?;
            if changed == 0 {
                return Ok(None);
            }
            select_by_token(conn, &token)
        })
        .await
        .map_err(crate::database::map_tr_err)
}
