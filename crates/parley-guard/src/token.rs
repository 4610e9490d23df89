// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Self-certifying visitor tokens: `v_<unix-seconds>_<9 lowercase alnum>`.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v_(\d{1,12})_[a-z0-9]{9}$").unwrap());

/// Why a token was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("visitor token is malformed")]
    Malformed,

    #[error("visitor token is issued in the future")]
    FromFuture,

    #[error("visitor token has expired")]
    Expired,
}

/// Checks the format and the embedded issue time of `token`.
///
/// The issue time must satisfy `now - max_age <= issued <= now`. Returns the
/// issue time on success.
pub fn validate_token(token: &str, now_secs: i64, max_age_secs: i64) -> Result<i64, TokenError> {
    let captures = TOKEN_PATTERN.captures(token).ok_or(TokenError::Malformed)?;
    let issued: i64 = captures[1].parse().map_err(|_| TokenError::Malformed)?;

    if issued > now_secs {
        return Err(TokenError::FromFuture);
    }
    if issued < now_secs.saturating_sub(max_age_secs) {
        return Err(TokenError::Expired);
    }
    Ok(issued)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const THIRTY_DAYS: i64 = 30 * 24 * 3600;
    const NOW: i64 = 1_700_000_000 + 3600;

    #[test]
    fn well_formed_recent_token_is_accepted() {
        assert_eq!(
            validate_token("v_1700000000_abc123xyz", NOW, THIRTY_DAYS),
            Ok(1_700_000_000)
        );
    }

    #[test]
    fn future_timestamp_is_rejected() {
        assert_eq!(
            validate_token("v_9999999999_abc123xyz", NOW, THIRTY_DAYS),
            Err(TokenError::FromFuture)
        );
    }

    #[test]
    fn short_random_segment_is_rejected() {
        assert_eq!(
            validate_token("v_123_ab", NOW, THIRTY_DAYS),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn uppercase_and_extra_segments_are_rejected() {
        for token in [
            "v_1700000000_ABC123XYZ",
            "v_1700000000_abc123xyz_",
            "x_1700000000_abc123xyz",
            " v_1700000000_abc123xyz",
            "",
        ] {
            assert_eq!(
                validate_token(token, NOW, THIRTY_DAYS),
                Err(TokenError::Malformed),
                "{token:?}"
            );
        }
    }

    #[test]
    fn token_older_than_max_age_expires() {
        let issued = NOW - THIRTY_DAYS - 1;
        let token = format!("v_{issued}_abc123xyz");
        assert_eq!(
            validate_token(&token, NOW, THIRTY_DAYS),
            Err(TokenError::Expired)
        );

        let edge = format!("v_{}_abc123xyz", NOW - THIRTY_DAYS);
        assert!(validate_token(&edge, NOW, THIRTY_DAYS).is_ok());
    }

    proptest! {
        #[test]
        fn any_issue_time_inside_window_is_accepted(
            age in 0i64..THIRTY_DAYS,
            suffix in "[a-z0-9]{9}",
        ) {
            let token = format!("v_{}_{}", NOW - age, suffix);
            prop_assert_eq!(validate_token(&token, NOW, THIRTY_DAYS), Ok(NOW - age));
        }
    }
}
