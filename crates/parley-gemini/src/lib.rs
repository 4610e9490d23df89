// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini provider for the Parley support chat.
//!
//! [`GeminiProvider`] implements [`AiClient`] over the `generateContent`
//! endpoint: a single non-streaming call per visitor message, with the
//! knowledge-bearing system prompt sent as `systemInstruction`.

pub mod client;
pub mod types;

use async_trait::async_trait;
use parley_config::model::GeminiConfig;
use parley_core::types::{AdapterType, AiRequest, AiResponse, HealthStatus, TokenUsage, TurnRole};
use parley_core::{AiClient, ParleyError, PluginAdapter};
use tracing::{debug, info, warn};

use crate::client::GeminiClient;
use crate::types::{
    Content, GenerateContentRequest, GenerateContentResponse, GenerationConfig, SAFETY_CATEGORIES,
    SafetySetting,
};

/// Reply used when the model withholds an answer on safety grounds.
pub const SAFETY_FALLBACK_REPLY: &str = "I'm sorry, I can't help with that here. \
Please contact our staff and they will assist you.";

/// Gemini provider implementing [`AiClient`].
pub struct GeminiProvider {
    client: GeminiClient,
    generation: GenerationConfig,
    safety_threshold: String,
}

impl GeminiProvider {
    /// Builds a provider from configuration. A missing API key is allowed;
    /// the provider then reports itself unconfigured.
    pub fn new(config: &GeminiConfig) -> Result<Self, ParleyError> {
        let client = GeminiClient::new(config)?;

        if client.has_api_key() {
            info!(model = %config.model, "Gemini provider initialized");
        } else {
            warn!("Gemini API key not set, AI replies are disabled");
        }

        Ok(Self {
            client,
            generation: GenerationConfig {
                temperature: config.temperature,
                top_k: config.top_k,
                top_p: config.top_p,
                max_output_tokens: config.max_output_tokens,
            },
            safety_threshold: config.safety_threshold.clone(),
        })
    }

    /// History first, then the new user message.
    fn to_request(&self, request: &AiRequest) -> GenerateContentRequest {
        let mut contents: Vec<Content> = request
            .history
            .iter()
            .filter(|turn| !turn.text.trim().is_empty())
            .map(|turn| {
                let role = match turn.role {
                    TurnRole::User => "user",
                    TurnRole::Model => "model",
                };
                Content::text(Some(role), turn.text.clone())
            })
            .collect();
        contents.push(Content::text(Some("user"), request.message.clone()));

        let system_instruction = request
            .system_prompt
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(|p| Content::text(None, p));

        GenerateContentRequest {
            contents,
            system_instruction,
            generation_config: self.generation.clone(),
            safety_settings: SAFETY_CATEGORIES
                .iter()
                .map(|category| SafetySetting {
                    category: (*category).to_string(),
                    threshold: self.safety_threshold.clone(),
                })
                .collect(),
        }
    }
}

fn interpret(response: GenerateContentResponse) -> Result<AiResponse, ParleyError> {
    let usage = response
        .usage_metadata
        .map(|u| TokenUsage {
            prompt_tokens: u.prompt_token_count,
            output_tokens: u.candidates_token_count,
            total_tokens: u.total_token_count,
        })
        .unwrap_or_default();
    let finish_reason = response.finish_reason().map(str::to_string);
    let text = response.text().trim().to_string();

    if !text.is_empty() {
        return Ok(AiResponse {
            text,
            finish_reason,
            usage,
            needs_human: false,
        });
    }

    if finish_reason.as_deref() == Some("SAFETY") {
        warn!("Gemini withheld a reply on safety grounds");
        return Ok(AiResponse {
            text: SAFETY_FALLBACK_REPLY.to_string(),
            finish_reason,
            usage,
            needs_human: true,
        });
    }

    Err(ParleyError::Provider {
        message: format!(
            "empty response from Gemini (finish reason: {})",
            finish_reason.as_deref().unwrap_or("none")
        ),
        source: None,
    })
}

#[async_trait]
impl PluginAdapter for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Provider
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        if self.client.has_api_key() {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Degraded("API key not configured".into()))
        }
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        debug!("Gemini provider shutting down");
        Ok(())
    }
}

#[async_trait]
impl AiClient for GeminiProvider {
    fn is_configured(&self) -> bool {
        self.client.has_api_key()
    }

    async fn generate(&self, request: AiRequest) -> Result<AiResponse, ParleyError> {
        let body = self.to_request(&request);
        debug!(
            model = %self.client.model(),
            turns = body.contents.len(),
            "sending generateContent request"
        );
        let response = self.client.generate_content(&body, request.timeout).await?;
        interpret(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::types::HistoryTurn;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(base_url: &str) -> GeminiProvider {
        GeminiProvider::new(&GeminiConfig {
            api_key: Some("test-key".into()),
            base_url: base_url.to_string(),
            ..GeminiConfig::default()
        })
        .unwrap()
    }

    fn ai_request(message: &str) -> AiRequest {
        AiRequest {
            system_prompt: Some("You are the shop assistant.".into()),
            history: vec![
                HistoryTurn {
                    role: TurnRole::User,
                    text: "Do you ship abroad?".into(),
                },
                HistoryTurn {
                    role: TurnRole::Model,
                    text: "Only within the country.".into(),
                },
            ],
            message: message.into(),
            timeout: None,
        }
    }

    #[test]
    fn request_places_history_before_message() {
        let provider = provider("http://localhost");
        let body = provider.to_request(&ai_request("How long does it take?"));

        let roles: Vec<_> = body
            .contents
            .iter()
            .map(|c| c.role.as_deref().unwrap())
            .collect();
        assert_eq!(roles, vec!["user", "model", "user"]);
        assert_eq!(
            body.contents[2].parts[0].text.as_deref(),
            Some("How long does it take?")
        );
        assert_eq!(
            body.system_instruction.unwrap().parts[0].text.as_deref(),
            Some("You are the shop assistant.")
        );
        assert_eq!(body.safety_settings.len(), 4);
        assert!(
            body.safety_settings
                .iter()
                .all(|s| s.threshold == "BLOCK_MEDIUM_AND_ABOVE")
        );
    }

    #[test]
    fn blank_system_prompt_is_omitted() {
        let provider = provider("http://localhost");
        let mut request = ai_request("hi");
        request.system_prompt = Some("  ".into());
        assert!(provider.to_request(&request).system_instruction.is_none());
    }

    #[test]
    fn unconfigured_without_key() {
        let provider = GeminiProvider::new(&GeminiConfig::default()).unwrap();
        assert!(!provider.is_configured());
    }

    #[tokio::test]
    async fn generate_returns_text_and_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.0-flash:generateContent"))
            .and(body_partial_json(serde_json::json!({
                "systemInstruction": {"parts": [{"text": "You are the shop assistant."}]},
                "generationConfig": {"topK": 40, "maxOutputTokens": 1024}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{
                    "content": {"role": "model", "parts": [{"text": "  About three days.  "}]},
                    "finishReason": "STOP"
                }],
                "usageMetadata": {"promptTokenCount": 50, "candidatesTokenCount": 4, "totalTokenCount": 54}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = provider(&server.uri())
            .generate(ai_request("How long does it take?"))
            .await
            .unwrap();
        assert_eq!(response.text, "About three days.");
        assert_eq!(response.finish_reason.as_deref(), Some("STOP"));
        assert_eq!(response.usage.total_tokens, 54);
        assert!(!response.needs_human);
    }

    #[tokio::test]
    async fn safety_block_becomes_canned_handoff() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"finishReason": "SAFETY"}]
            })))
            .mount(&server)
            .await;

        let response = provider(&server.uri())
            .generate(ai_request("something unsafe"))
            .await
            .unwrap();
        assert_eq!(response.text, SAFETY_FALLBACK_REPLY);
        assert!(response.needs_human);
    }

    #[tokio::test]
    async fn empty_candidate_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "candidates": [{"content": {"parts": []}, "finishReason": "MAX_TOKENS"}]
            })))
            .mount(&server)
            .await;

        let err = provider(&server.uri())
            .generate(ai_request("hi"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("MAX_TOKENS"), "got {err}");
    }

    #[tokio::test]
    async fn request_timeout_override_applies() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(400))
                    .set_body_json(serde_json::json!({"candidates": []})),
            )
            .mount(&server)
            .await;

        let mut request = ai_request("hi");
        request.timeout = Some(Duration::from_millis(40));
        let err = provider(&server.uri()).generate(request).await.unwrap_err();
        assert!(matches!(err, ParleyError::Timeout { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn health_reflects_configuration() {
        let configured = provider("http://localhost");
        assert_eq!(configured.health_check().await.unwrap(), HealthStatus::Healthy);

        let bare = GeminiProvider::new(&GeminiConfig::default()).unwrap();
        assert!(matches!(
            bare.health_check().await.unwrap(),
            HealthStatus::Degraded(_)
        ));
    }
}
