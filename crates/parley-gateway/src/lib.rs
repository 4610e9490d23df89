// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP gateway for the Parley support chat.
//!
//! Serves the public widget API (send, poll, profile, rating, status, widget
//! settings) and the bearer-protected staff API under `/api/v1`.

pub mod auth;
pub mod client_ip;
pub mod error;
pub mod handlers;
pub mod server;

pub use auth::AdminAuth;
pub use client_ip::{ClientAddress, TrustedProxies, resolve_client_ip};
pub use error::ApiError;
pub use server::{API_PREFIX, AppState, router, serve};
