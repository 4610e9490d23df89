// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Expiring key-value entries backing rate limits and abuse bans.
//!
//! Every operation takes the current Unix time explicitly. An entry whose
//! `expires_at` is at or before `now` is treated as absent.

use parley_core::ParleyError;
use rusqlite::{OptionalExtension, params};

use crate::database::Database;

pub async fn kv_get(db: &Database, key: &str, now: i64) -> Result<Option<String>, ParleyError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "SELECT value FROM kv_store WHERE key = ?1 AND expires_at > ?2",
                params![key, now],
                |row| row.get::<_, String>(0),
            )
            .optional()
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn kv_set(
    db: &Database,
    key: &str,
    value: &str,
    ttl_secs: i64,
    now: i64,
) -> Result<(), ParleyError> {
    let key = key.to_string();
    let value = value.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "INSERT INTO kv_store (key, value, expires_at) VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     expires_at = excluded.expires_at",
                params![key, value, now + ttl_secs],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Atomically increment a counter and return the new value.
///
/// A missing or expired counter restarts at 1 with a fresh window of
/// `ttl_secs`. A live counter keeps its original expiry, so the window is
/// fixed from the first hit rather than sliding.
pub async fn kv_incr(
    db: &Database,
    key: &str,
    ttl_secs: i64,
    now: i64,
) -> Result<i64, ParleyError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| {
            conn.query_row(
                "INSERT INTO kv_store (key, value, expires_at) VALUES (?1, '1', ?2 + ?3)
                 ON CONFLICT(key) DO UPDATE SET
                     value = CASE WHEN kv_store.expires_at <= ?2 THEN '1'
                                  ELSE CAST(CAST(kv_store.value AS INTEGER) + 1 AS TEXT) END,
                     expires_at = CASE WHEN kv_store.expires_at <= ?2 THEN ?2 + ?3
                                       ELSE kv_store.expires_at END
                 RETURNING CAST(value AS INTEGER)",
                params![key, now, ttl_secs],
                |row| row.get::<_, i64>(0),
            )
        })
        .await
        .map_err(crate::database::map_tr_err)
}

pub async fn kv_delete(db: &Database, key: &str) -> Result<(), ParleyError> {
    let key = key.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Delete expired entries, returning how many were removed.
pub async fn kv_purge_expired(db: &Database, now: i64) -> Result<usize, ParleyError> {
    db.connection()
        .call(move |conn| conn.execute("DELETE FROM kv_store WHERE expires_at <= ?1", params![now]))
        .await
        .map_err(crate::database::map_tr_err)
}
