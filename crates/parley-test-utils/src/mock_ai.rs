// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted AI client for deterministic testing.
//!
//! `MockAiClient` implements `AiClient` by popping scripted outcomes from a
//! FIFO queue and recording every request it receives.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use parley_core::types::{AdapterType, AiRequest, AiResponse, HealthStatus, TokenUsage};
use parley_core::{AiClient, ParleyError, PluginAdapter};

/// Text returned when the script is empty.
pub const DEFAULT_REPLY: &str = "mock reply";

#[derive(Debug, Clone)]
enum Scripted {
    Reply { text: String, needs_human: bool },
    Failure(String),
    Timeout,
}

/// A mock AI client with a scripted response queue.
pub struct MockAiClient {
    configured: bool,
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<AiRequest>>,
}

impl MockAiClient {
    /// Configured client with an empty script.
    pub fn new() -> Self {
        Self::with_responses(Vec::new())
    }

    /// Configured client pre-loaded with plain replies.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            configured: true,
            script: Mutex::new(
                responses
                    .into_iter()
                    .map(|text| Scripted::Reply {
                        text,
                        needs_human: false,
                    })
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A client without credentials. Calling it is a test bug and fails.
    pub fn unconfigured() -> Self {
        Self {
            configured: false,
            ..Self::new()
        }
    }

    pub async fn push_reply(&self, text: &str) {
        self.push(Scripted::Reply {
            text: text.to_string(),
            needs_human: false,
        })
        .await;
    }

    /// A reply the provider itself flags as needing a human.
    pub async fn push_needs_human(&self, text: &str) {
        self.push(Scripted::Reply {
            text: text.to_string(),
            needs_human: true,
        })
        .await;
    }

    pub async fn push_failure(&self, message: &str) {
        self.push(Scripted::Failure(message.to_string())).await;
    }

    pub async fn push_timeout(&self) {
        self.push(Scripted::Timeout).await;
    }

    async fn push(&self, step: Scripted) {
        self.script.lock().await.push_back(step);
    }

    /// Every request received so far, failed ones included.
    pub async fn requests(&self) -> Vec<AiRequest> {
        self.requests.lock().await.clone()
    }
}

impl Default for MockAiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockAiClient {
    fn name(&self) -> &str {
        "mock-ai"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        Ok(())
    }
}

#[async_trait]
impl AiClient for MockAiClient {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn generate(&self, request: AiRequest) -> Result<AiResponse, ParleyError> {
        let timeout = request.timeout.unwrap_or(Duration::from_secs(30));
        self.requests.lock().await.push(request);

        if !self.configured {
            return Err(ParleyError::Provider {
                message: "mock AI client is not configured".into(),
                source: None,
            });
        }

        let step = self.script.lock().await.pop_front().unwrap_or(Scripted::Reply {
            text: DEFAULT_REPLY.to_string(),
            needs_human: false,
        });
        match step {
            Scripted::Reply { text, needs_human } => Ok(AiResponse {
                text,
                finish_reason: Some("STOP".into()),
                usage: TokenUsage {
                    prompt_tokens: 10,
                    output_tokens: 20,
                    total_tokens: 30,
                },
                needs_human,
            }),
            Scripted::Failure(message) => Err(ParleyError::Provider {
                message,
                source: None,
            }),
            Scripted::Timeout => Err(ParleyError::Timeout { duration: timeout }),
        }
    }
}
