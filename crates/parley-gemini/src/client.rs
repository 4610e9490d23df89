// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Gemini `generateContent` endpoint.

use std::time::Duration;

use parley_config::model::GeminiConfig;
use parley_core::ParleyError;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;

use crate::types::{ApiErrorResponse, GenerateContentRequest, GenerateContentResponse};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Thin wrapper over `reqwest` that owns the credentials and endpoint.
///
/// No retries: a failed call is reported once and the caller escalates.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: Option<SecretString>,
    model: String,
    base_url: String,
    default_timeout: Duration,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self, ParleyError> {
        let mut headers = HeaderMap::new();
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ParleyError::Provider {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(|k| SecretString::from(k.to_string()));

        Ok(Self {
            client,
            api_key,
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            default_timeout: Duration::from_secs(config.timeout_secs),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Sends one request. `timeout` falls back to the configured default.
    pub async fn generate_content(
        &self,
        request: &GenerateContentRequest,
        timeout: Option<Duration>,
    ) -> Result<GenerateContentResponse, ParleyError> {
        let Some(api_key) = &self.api_key else {
            return Err(ParleyError::Provider {
                message: "Gemini API key is not configured".into(),
                source: None,
            });
        };
        let timeout = timeout.unwrap_or(self.default_timeout);

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, api_key.expose_secret())
            .timeout(timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        let status = response.status();
        debug!(status = %status, model = %self.model, "generateContent response received");

        let body = response
            .text()
            .await
            .map_err(|e| transport_error(e, timeout))?;

        if !status.is_success() {
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) if !api_err.error.message.is_empty() => {
                    format!("Gemini API error ({status}): {}", api_err.error.message)
                }
                Ok(_) => format!("Gemini API error ({status}): Unknown API error"),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(ParleyError::Provider {
                message,
                source: None,
            });
        }

        serde_json::from_str(&body).map_err(|e| ParleyError::Provider {
            message: format!("failed to parse API response: {e}"),
            source: Some(Box::new(e)),
        })
    }
}

fn transport_error(e: reqwest::Error, timeout: Duration) -> ParleyError {
    if e.is_timeout() {
        ParleyError::Timeout { duration: timeout }
    } else {
        ParleyError::Provider {
            message: format!("HTTP request failed: {e}"),
            source: Some(Box::new(e)),
        }
    }
}
