// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The response orchestrator and the staff/visitor chat operations.

use std::str::FromStr;
use std::sync::Arc;

use parley_config::model::ChatConfig;
use parley_core::types::{
    AiRequest, AiResponse, ChatStats, ConversationDetail, ConversationFilter, ConversationPage,
    ConversationPatch, Conversation, HistoryTurn, Message, VisitorOrigin,
};
use parley_core::{
    AiClient, Clock, ConversationStatus, HandledBy, NeedsHumanClassifier, Notifier, ParleyError,
    SenderType, StorageAdapter, Visitor, VisitorProfile, format_timestamp,
};
use parley_guard::AbuseGuard;
use parley_knowledge::{KnowledgeService, build_system_prompt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::classifier::KeywordClassifier;
use crate::hours::{is_within_business_hours, local_day_start};
use crate::notification::staff_notification;

/// Address used for rate limiting when the caller's address is unknown.
const UNKNOWN_ADDRESS: &str = "unknown";

/// A visitor message as received from the widget.
#[derive(Debug, Clone, Default)]
pub struct InboundMessage {
    pub token: String,
    pub body: String,
    pub profile: VisitorProfile,
    /// Recorded on the visitor row.
    pub origin: VisitorOrigin,
    /// Address the abuse guard counts against.
    pub remote_addr: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SendOutcome {
    pub conversation_id: i64,
    pub message_id: i64,
    /// The AI reply, also visible to the next poll under the same id.
    pub ai_reply: Option<Message>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationState {
    pub status: ConversationStatus,
    pub handled_by: HandledBy,
    pub is_online: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatStatus {
    pub is_online: bool,
    pub offline_message: String,
    pub conversation: Option<ConversationState>,
}

/// A conversation with its full transcript, as shown to staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversationView {
    pub conversation: ConversationDetail,
    pub messages: Vec<Message>,
}

/// Collaborators the chat service is wired from.
pub struct ChatDeps {
    pub storage: Arc<dyn StorageAdapter>,
    pub guard: Arc<AbuseGuard>,
    pub knowledge: Arc<KnowledgeService>,
    pub ai: Option<Arc<dyn AiClient>>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}

/// Decides who answers each visitor message and records the outcome.
pub struct ChatService {
    config: ChatConfig,
    storage: Arc<dyn StorageAdapter>,
    guard: Arc<AbuseGuard>,
    knowledge: Arc<KnowledgeService>,
    ai: Option<Arc<dyn AiClient>>,
    notifier: Arc<dyn Notifier>,
    classifier: Arc<dyn NeedsHumanClassifier>,
    clock: Arc<dyn Clock>,
}

impl ChatService {
    pub fn new(config: ChatConfig, deps: ChatDeps) -> Self {
        Self {
            config,
            storage: deps.storage,
            guard: deps.guard,
            knowledge: deps.knowledge,
            ai: deps.ai,
            notifier: deps.notifier,
            classifier: Arc::new(KeywordClassifier::new()),
            clock: deps.clock,
        }
    }

    /// Swap the needs-human heuristic.
    pub fn with_classifier(mut self, classifier: Arc<dyn NeedsHumanClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn knowledge(&self) -> &Arc<KnowledgeService> {
        &self.knowledge
    }

    fn ai_ready(&self) -> Option<&Arc<dyn AiClient>> {
        if !self.config.auto_reply {
            return None;
        }
        self.ai.as_ref().filter(|ai| ai.is_configured())
    }

    fn clean_body(&self, body: &str) -> Result<String, ParleyError> {
        let body = body.trim();
        if body.is_empty() {
            return Err(ParleyError::Validation("message must not be empty".into()));
        }
        let len = body.chars().count();
        if len > self.config.max_message_length {
            return Err(ParleyError::Validation(format!(
                "message is too long ({len} characters, at most {})",
                self.config.max_message_length
            )));
        }
        Ok(body.to_string())
    }

    /// Accepts a visitor message and, when AI replies are enabled and the
    /// client is configured, answers it.
    ///
    /// Everything that can reject the request runs before the first write.
    /// Once the visitor message is stored, AI and notification failures only
    /// degrade the conversation to staff handling; storage failures still
    /// propagate.
    pub async fn handle_visitor_message(
        &self,
        inbound: InboundMessage,
    ) -> Result<SendOutcome, ParleyError> {
        let body = self.clean_body(&inbound.body)?;
        let address = inbound.remote_addr.as_deref().unwrap_or(UNKNOWN_ADDRESS);
        self.guard.admit(&inbound.token, address).await?.into_result()?;

        let visitor = self
            .storage
            .get_or_create_visitor(&inbound.token, &inbound.profile.normalized(), &inbound.origin)
            .await?;
        let conversation = self.storage.get_or_create_conversation(visitor.id).await?;
        let message = self
            .storage
            .append_message(conversation.id, SenderType::Visitor, &body, None)
            .await?;
        debug!(
            conversation_id = conversation.id,
            message_id = message.id,
            "visitor message stored"
        );

        let ai_reply = match self.ai_ready() {
            Some(ai) => {
                self.reply_with_ai(ai.as_ref(), &conversation, &visitor, &message)
                    .await?
            }
            None => {
                self.escalate(&conversation, &visitor, &body, "AI replies unavailable")
                    .await?;
                None
            }
        };

        Ok(SendOutcome {
            conversation_id: conversation.id,
            message_id: message.id,
            ai_reply,
        })
    }

    async fn reply_with_ai(
        &self,
        ai: &dyn AiClient,
        conversation: &Conversation,
        visitor: &Visitor,
        message: &Message,
    ) -> Result<Option<Message>, ParleyError> {
        let request = self.build_request(conversation.id, visitor, message).await?;

        let response = match ai.generate(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(conversation_id = conversation.id, error = %e, "AI reply failed");
                self.escalate(conversation, visitor, &message.body, "AI reply failed")
                    .await?;
                return Ok(None);
            }
        };

        let reply = self
            .storage
            .append_message(conversation.id, SenderType::Ai, &response.text, None)
            .await?;
        info!(
            conversation_id = conversation.id,
            message_id = reply.id,
            total_tokens = response.usage.total_tokens,
            "AI reply stored"
        );

        if self.needs_human(&response) {
            self.escalate(conversation, visitor, &message.body, "AI requested a human")
                .await?;
        }
        Ok(Some(reply))
    }

    fn needs_human(&self, response: &AiResponse) -> bool {
        response.needs_human || self.classifier.needs_human(&response.text)
    }

    async fn build_request(
        &self,
        conversation_id: i64,
        visitor: &Visitor,
        message: &Message,
    ) -> Result<AiRequest, ParleyError> {
        let limit = self.config.history_limit;
        let recent = self
            .storage
            .last_messages(conversation_id, limit + 1)
            .await?;
        let mut history: Vec<HistoryTurn> = recent
            .iter()
            .filter(|m| m.id != message.id)
            .filter_map(HistoryTurn::from_message)
            .collect();
        if history.len() > limit {
            history.drain(..history.len() - limit);
        }

        let knowledge = match self.knowledge.get_or_build(false).await {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "knowledge unavailable, answering without it");
                Arc::from("")
            }
        };
        let config = self.knowledge.config();
        let system_prompt =
            build_system_prompt(&config.site, &config.manual, &knowledge, Some(visitor));

        Ok(AiRequest {
            system_prompt: Some(system_prompt),
            history,
            message: message.body.clone(),
            timeout: None,
        })
    }

    /// Hands the conversation to staff and tells them about it.
    async fn escalate(
        &self,
        conversation: &Conversation,
        visitor: &Visitor,
        body: &str,
        reason: &str,
    ) -> Result<(), ParleyError> {
        self.storage
            .update_conversation(conversation.id, &ConversationPatch::escalate())
            .await?;
        info!(conversation_id = conversation.id, reason, "conversation handed to staff");
        self.notify_staff(conversation.id, visitor, body).await;
        Ok(())
    }

    async fn notify_staff(&self, conversation_id: i64, visitor: &Visitor, body: &str) {
        let Some(recipient) = self
            .config
            .notification_email
            .as_deref()
            .filter(|r| !r.trim().is_empty())
        else {
            debug!(conversation_id, "no notification address configured");
            return;
        };

        let site = &self.knowledge.config().site.name;
        let note = staff_notification(site, &self.config.admin_url, conversation_id, visitor, body);
        if let Err(e) = self
            .notifier
            .notify(recipient, &note.subject, &note.body)
            .await
        {
            warn!(conversation_id, error = %e, "staff notification failed");
        }
    }

    // --- Staff operations ---

    pub async fn handle_staff_reply(
        &self,
        conversation_id: i64,
        body: &str,
        staff_id: &str,
    ) -> Result<Message, ParleyError> {
        let body = self.clean_body(body)?;
        let staff_id = staff_id.trim();
        if staff_id.is_empty() {
            return Err(ParleyError::Validation("staff id must not be empty".into()));
        }
        if self.storage.get_conversation(conversation_id).await?.is_none() {
            return Err(ParleyError::conversation_not_found(conversation_id));
        }

        let message = self
            .storage
            .append_message(conversation_id, SenderType::Staff, &body, Some(staff_id))
            .await?;
        self.storage
            .update_conversation(
                conversation_id,
                &ConversationPatch {
                    handled_by: Some(HandledBy::Staff),
                    staff_id: Some(staff_id.to_string()),
                    ..ConversationPatch::default()
                },
            )
            .await?;
        self.storage
            .mark_read(conversation_id, SenderType::Visitor)
            .await?;

        info!(conversation_id, staff_id, message_id = message.id, "staff reply stored");
        Ok(message)
    }

    pub async fn update_status(
        &self,
        conversation_id: i64,
        status: ConversationStatus,
    ) -> Result<(), ParleyError> {
        let patch = ConversationPatch {
            status: Some(status),
            ..ConversationPatch::default()
        };
        if !self.storage.update_conversation(conversation_id, &patch).await? {
            return Err(ParleyError::conversation_not_found(conversation_id));
        }
        info!(conversation_id, %status, "conversation status updated");
        Ok(())
    }

    /// Conversation with its transcript; marks the visitor's messages read.
    pub async fn get_conversation(&self, id: i64) -> Result<ConversationView, ParleyError> {
        let Some(conversation) = self.storage.get_conversation(id).await? else {
            return Err(ParleyError::conversation_not_found(id));
        };
        self.storage.mark_read(id, SenderType::Visitor).await?;
        let messages = self.storage.list_messages_after(id, 0).await?;
        Ok(ConversationView {
            conversation,
            messages,
        })
    }

    pub async fn list_conversations(
        &self,
        filter: &ConversationFilter,
    ) -> Result<ConversationPage, ParleyError> {
        self.storage.list_conversations(filter).await
    }

    pub async fn stats(&self) -> Result<ChatStats, ParleyError> {
        let day_start = local_day_start(&self.config.business_hours, self.clock.now());
        self.storage.stats(&format_timestamp(day_start)).await
    }

    pub async fn unread_count(&self) -> Result<i64, ParleyError> {
        self.storage.unread_count().await
    }

    /// Runs the AI connection test. Fails with a validation error when no AI
    /// is configured.
    pub async fn test_ai(&self) -> Result<AiResponse, ParleyError> {
        match self.ai.as_ref().filter(|ai| ai.is_configured()) {
            Some(ai) => ai.test_connection().await,
            None => Err(ParleyError::Validation("AI is not configured".into())),
        }
    }

    // --- Visitor operations ---

    /// The polling primitive. An empty result for an unknown conversation is
    /// reported as not found.
    pub async fn list_messages(
        &self,
        conversation_id: i64,
        after_id: i64,
    ) -> Result<Vec<Message>, ParleyError> {
        let messages = self
            .storage
            .list_messages_after(conversation_id, after_id)
            .await?;
        if messages.is_empty() && self.storage.get_conversation(conversation_id).await?.is_none() {
            return Err(ParleyError::conversation_not_found(conversation_id));
        }
        Ok(messages)
    }

    pub async fn update_visitor(
        &self,
        token: &str,
        profile: &VisitorProfile,
    ) -> Result<Visitor, ParleyError> {
        if token.trim().is_empty() {
            return Err(ParleyError::Validation("visitor token is required".into()));
        }
        self.storage
            .update_visitor(token, &profile.normalized())
            .await?
            .ok_or_else(|| ParleyError::NotFound {
                entity: "visitor",
                id: token.to_string(),
            })
    }

    pub async fn rate_conversation(
        &self,
        conversation_id: i64,
        rating: i64,
        comment: Option<&str>,
    ) -> Result<(), ParleyError> {
        let rating = u8::try_from(rating)
            .ok()
            .filter(|r| (1..=5).contains(r))
            .ok_or_else(|| ParleyError::Validation("rating must be between 1 and 5".into()))?;

        let patch = ConversationPatch {
            rating: Some(rating),
            rating_comment: Some(comment.unwrap_or_default().trim().to_string()),
            ..ConversationPatch::default()
        };
        if !self.storage.update_conversation(conversation_id, &patch).await? {
            return Err(ParleyError::conversation_not_found(conversation_id));
        }
        debug!(conversation_id, rating, "conversation rated");
        Ok(())
    }

    pub async fn chat_status(
        &self,
        conversation_id: Option<i64>,
    ) -> Result<ChatStatus, ParleyError> {
        let is_online = is_within_business_hours(&self.config.business_hours, self.clock.now());
        let conversation = match conversation_id {
            Some(id) => self.storage.get_conversation(id).await?.map(|detail| ConversationState {
                status: detail.conversation.status,
                handled_by: detail.conversation.handled_by,
                is_online,
            }),
            None => None,
        };
        Ok(ChatStatus {
            is_online,
            offline_message: self.config.offline_message.clone(),
            conversation,
        })
    }
}

/// Parses a status name from an API request.
pub fn parse_status(value: &str) -> Result<ConversationStatus, ParleyError> {
    ConversationStatus::from_str(value.trim())
        .map_err(|_| ParleyError::Validation(format!("invalid status `{value}`")))
}
