// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-token and per-address rate limiting with ban escalation.
//!
//! Every counter lives in the storage layer's expiring key-value table, so
//! expiry is the only cleanup and counters are shared by every worker that
//! uses the same database.

use std::sync::Arc;

use parley_config::model::GuardConfig;
use parley_core::{Clock, ParleyError, StorageAdapter};
use tracing::{debug, info, warn};

use crate::token::{TokenError, validate_token};

/// Outcome of [`AbuseGuard::admit`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Admitted,
    Rejected(Rejection),
}

impl Verdict {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted)
    }

    /// Maps a rejection onto the error taxonomy: bad tokens are validation
    /// failures, everything else is a rate limit.
    pub fn into_result(self) -> Result<(), ParleyError> {
        match self {
            Self::Admitted => Ok(()),
            Self::Rejected(Rejection::InvalidToken(e)) => {
                Err(ParleyError::Validation(e.to_string()))
            }
            Self::Rejected(_) => Err(ParleyError::RateLimited),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    InvalidToken(TokenError),
    Banned,
    TokenLimit,
    AddressLimit,
}

fn ban_key(address: &str) -> String {
    format!("ban:{address}")
}

fn abuse_key(address: &str) -> String {
    format!("abuse:{address}")
}

fn token_key(token: &str) -> String {
    format!("rl:token:{token}")
}

fn address_key(address: &str) -> String {
    format!("rl:ip:{address}")
}

/// Admission control for inbound visitor messages.
pub struct AbuseGuard {
    storage: Arc<dyn StorageAdapter>,
    config: GuardConfig,
    clock: Arc<dyn Clock>,
}

impl AbuseGuard {
    pub fn new(
        storage: Arc<dyn StorageAdapter>,
        config: GuardConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            storage,
            config,
            clock,
        }
    }

    /// Decides whether `token` arriving from `address` may proceed.
    ///
    /// Order: token format and age, active ban, then the two fixed-window
    /// counters. Only limit rejections feed the abuse counter; reaching
    /// `ban_threshold` inside the abuse window bans the address.
    pub async fn admit(&self, token: &str, address: &str) -> Result<Verdict, ParleyError> {
        let now = self.clock.now_secs();

        if let Err(e) = validate_token(token, now, self.config.token_max_age_secs) {
            debug!(address, error = %e, "visitor token refused");
            return Ok(Verdict::Rejected(Rejection::InvalidToken(e)));
        }

        if self.storage.kv_get(&ban_key(address), now).await?.is_some() {
            debug!(address, "request from banned address");
            return Ok(Verdict::Rejected(Rejection::Banned));
        }

        let window = self.config.window_secs;
        let by_token = self.storage.kv_incr(&token_key(token), window, now).await?;
        let by_address = self
            .storage
            .kv_incr(&address_key(address), window, now)
            .await?;

        let rejection = if by_token > self.config.token_limit {
            Rejection::TokenLimit
        } else if by_address > self.config.address_limit {
            Rejection::AddressLimit
        } else {
            return Ok(Verdict::Admitted);
        };

        warn!(address, by_token, by_address, ?rejection, "rate limit exceeded");
        self.record_abuse(address, now).await?;
        Ok(Verdict::Rejected(rejection))
    }

    async fn record_abuse(&self, address: &str, now: i64) -> Result<(), ParleyError> {
        let strikes = self
            .storage
            .kv_incr(&abuse_key(address), self.config.abuse_window_secs, now)
            .await?;

        if strikes >= self.config.ban_threshold {
            self.storage
                .kv_set(&ban_key(address), "1", self.config.ban_secs, now)
                .await?;
            self.storage.kv_delete(&abuse_key(address)).await?;
            info!(
                address,
                strikes,
                ban_secs = self.config.ban_secs,
                "address banned for repeated rate-limit violations"
            );
        }
        Ok(())
    }

    /// Whether `address` is currently banned.
    pub async fn is_banned(&self, address: &str) -> Result<bool, ParleyError> {
        let now = self.clock.now_secs();
        Ok(self.storage.kv_get(&ban_key(address), now).await?.is_some())
    }

    /// Lifts a ban early.
    pub async fn unban(&self, address: &str) -> Result<(), ParleyError> {
        self.storage.kv_delete(&ban_key(address)).await?;
        self.storage.kv_delete(&abuse_key(address)).await
    }
}
