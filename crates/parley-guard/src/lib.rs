// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Abuse controls for inbound visitor traffic.
//!
//! [`validate_token`] checks the self-certifying visitor token, and
//! [`AbuseGuard`] layers rate limits and temporary address bans on top.

pub mod guard;
pub mod token;

pub use guard::{AbuseGuard, Rejection, Verdict};
pub use token::{TokenError, validate_token};
