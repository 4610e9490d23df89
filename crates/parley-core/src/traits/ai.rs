// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generative AI client trait.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AiRequest, AiResponse};

/// Timeout used by [`AiClient::test_connection`].
pub const CONNECTION_TEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Adapter for a request/response generative model.
#[async_trait]
pub trait AiClient: PluginAdapter {
    /// Whether credentials are present. An unconfigured client is never called.
    fn is_configured(&self) -> bool;

    /// Generates a single reply for `request`.
    ///
    /// Timeouts surface as [`ParleyError::Timeout`]; every other upstream
    /// failure as [`ParleyError::Provider`]. Implementations do not retry.
    async fn generate(&self, request: AiRequest) -> Result<AiResponse, ParleyError>;

    /// Sends a tiny prompt to prove the credentials and endpoint work.
    async fn test_connection(&self) -> Result<AiResponse, ParleyError> {
        self.generate(AiRequest {
            system_prompt: None,
            history: Vec::new(),
            message: "Reply with the single word: OK".to_string(),
            timeout: Some(CONNECTION_TEST_TIMEOUT),
        })
        .await
    }
}
