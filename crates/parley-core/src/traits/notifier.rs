// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Staff notification trait.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::traits::adapter::PluginAdapter;

/// Delivers a plain-text notification to a staff recipient.
///
/// Callers treat delivery as fire-and-forget: an error is logged, never
/// propagated to the visitor.
#[async_trait]
pub trait Notifier: PluginAdapter {
    async fn notify(&self, recipient: &str, subject: &str, body: &str)
    -> Result<(), ParleyError>;
}
