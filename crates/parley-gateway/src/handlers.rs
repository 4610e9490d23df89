// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the widget and staff APIs.
//!
//! Every successful response carries `"success": true` next to its payload;
//! failures go through [`ApiError`].

use axum::{
    Json,
    extract::{Path, Query, State},
};
use parley_chat::{ChatStatus, InboundMessage, SendOutcome, parse_status};
use parley_config::model::QuickReply;
use parley_core::types::{ChatStats, ConversationFilter, ConversationPage, Message};
use parley_core::{ParleyError, Visitor, VisitorProfile};
use serde::{Deserialize, Serialize};

use crate::client_ip::ClientOrigin;
use crate::error::ApiError;
use crate::server::AppState;

/// Largest page the staff inbox may request.
const MAX_PER_PAGE: u32 = 100;

/// Staff id recorded when a reply does not name one.
const DEFAULT_STAFF_ID: &str = "staff";

/// Successful response envelope.
#[derive(Debug, Serialize)]
pub struct Success<T> {
    pub success: bool,
    #[serde(flatten)]
    pub body: T,
}

fn success<T>(body: T) -> Json<Success<T>> {
    Json(Success {
        success: true,
        body,
    })
}

#[derive(Debug, Serialize)]
pub struct Data<T> {
    pub data: T,
}

fn data<T>(data: T) -> Json<Success<Data<T>>> {
    success(Data { data })
}

#[derive(Debug, Serialize)]
pub struct Empty {}

// --- Public widget routes ---

/// Request body for POST /chat/send.
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    /// Visitor token issued by the widget.
    #[serde(default)]
    pub visitor_id: String,
    #[serde(default)]
    pub message: String,
    #[serde(flatten)]
    pub profile: VisitorProfile,
}

/// POST /chat/send
pub async fn send_message(
    State(state): State<AppState>,
    client: ClientOrigin,
    Json(body): Json<SendRequest>,
) -> Result<Json<Success<SendOutcome>>, ApiError> {
    let outcome = state
        .chat
        .handle_visitor_message(InboundMessage {
            token: body.visitor_id,
            body: body.message,
            profile: body.profile,
            origin: client.origin,
            remote_addr: client.remote,
        })
        .await?;
    Ok(success(outcome))
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub conversation_id: Option<i64>,
    #[serde(default)]
    pub after_id: i64,
}

#[derive(Debug, Serialize)]
pub struct MessageList {
    pub messages: Vec<Message>,
}

/// GET /chat/messages
pub async fn list_messages(
    State(state): State<AppState>,
    Query(query): Query<MessagesQuery>,
) -> Result<Json<Success<MessageList>>, ApiError> {
    let Some(conversation_id) = query.conversation_id.filter(|id| *id > 0) else {
        return Err(ApiError::BadRequest("conversation_id is required".into()));
    };
    let messages = state
        .chat
        .list_messages(conversation_id, query.after_id.max(0))
        .await?;
    Ok(success(MessageList { messages }))
}

/// Request body for POST /chat/visitor.
#[derive(Debug, Deserialize)]
pub struct VisitorRequest {
    #[serde(default)]
    pub visitor_id: String,
    #[serde(flatten)]
    pub profile: VisitorProfile,
}

#[derive(Debug, Serialize)]
pub struct VisitorResponse {
    pub visitor: Visitor,
}

/// POST /chat/visitor
pub async fn update_visitor(
    State(state): State<AppState>,
    Json(body): Json<VisitorRequest>,
) -> Result<Json<Success<VisitorResponse>>, ApiError> {
    let visitor = state
        .chat
        .update_visitor(&body.visitor_id, &body.profile)
        .await?;
    Ok(success(VisitorResponse { visitor }))
}

/// Request body for POST /chat/rate.
#[derive(Debug, Deserialize)]
pub struct RateRequest {
    pub conversation_id: i64,
    pub rating: i64,
    #[serde(default)]
    pub comment: Option<String>,
}

/// POST /chat/rate
pub async fn rate_conversation(
    State(state): State<AppState>,
    Json(body): Json<RateRequest>,
) -> Result<Json<Success<Empty>>, ApiError> {
    state
        .chat
        .rate_conversation(body.conversation_id, body.rating, body.comment.as_deref())
        .await?;
    Ok(success(Empty {}))
}

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub conversation_id: Option<i64>,
}

/// GET /chat/status
pub async fn chat_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<Success<ChatStatus>>, ApiError> {
    let status = state
        .chat
        .chat_status(query.conversation_id.filter(|id| *id > 0))
        .await?;
    Ok(success(status))
}

/// Widget settings in the shape the widget script reads.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetView {
    pub primary_color: String,
    pub background_color: String,
    pub text_color: String,
    pub border_color: String,
    pub title: String,
    pub subtitle: String,
    pub welcome_message: String,
    pub input_placeholder: String,
    pub send_button_text: String,
    pub quick_replies: Vec<QuickReply>,
    pub logo: Option<String>,
    pub position: String,
    pub auto_open: bool,
    pub show_quick_replies: bool,
}

/// GET /widget/config
pub async fn widget_config(State(state): State<AppState>) -> Json<Success<Data<WidgetView>>> {
    let w = &*state.widget;
    data(WidgetView {
        primary_color: w.primary_color.clone(),
        background_color: w.background_color.clone(),
        text_color: w.text_color.clone(),
        border_color: w.border_color.clone(),
        title: w.title.clone(),
        subtitle: w.subtitle.clone(),
        welcome_message: w.welcome_message.clone(),
        input_placeholder: w.input_placeholder.clone(),
        send_button_text: w.send_button_text.clone(),
        quick_replies: w.quick_replies.clone(),
        logo: w.logo.clone(),
        position: w.position.clone(),
        auto_open: w.auto_open,
        show_quick_replies: w.show_quick_replies,
    })
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<Success<HealthResponse>> {
    success(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.started_at.elapsed().as_secs(),
    })
}

// --- Admin routes ---

#[derive(Debug, Default, Deserialize)]
pub struct InboxQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl InboxQuery {
    fn into_filter(self) -> Result<ConversationFilter, ApiError> {
        let defaults = ConversationFilter::default();
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") | Some("all") => None,
            Some(s) => Some(parse_status(s)?),
        };
        Ok(ConversationFilter {
            status,
            search: self
                .search
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            page: self.page.filter(|p| *p > 0).unwrap_or(defaults.page),
            per_page: self
                .per_page
                .filter(|p| *p > 0)
                .unwrap_or(defaults.per_page)
                .min(MAX_PER_PAGE),
        })
    }
}

/// GET /admin/conversations
pub async fn admin_list_conversations(
    State(state): State<AppState>,
    Query(query): Query<InboxQuery>,
) -> Result<Json<Success<Data<ConversationPage>>>, ApiError> {
    let page = state.chat.list_conversations(&query.into_filter()?).await?;
    Ok(data(page))
}

/// GET /admin/conversations/{id}
pub async fn admin_get_conversation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Success<Data<parley_chat::ConversationView>>>, ApiError> {
    let view = state.chat.get_conversation(id).await?;
    Ok(data(view))
}

/// Request body for POST /admin/conversations/{id}/reply.
#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub staff_id: Option<String>,
}

/// POST /admin/conversations/{id}/reply
pub async fn admin_reply(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<ReplyRequest>,
) -> Result<Json<Success<Data<Message>>>, ApiError> {
    let staff_id = body.staff_id.as_deref().unwrap_or(DEFAULT_STAFF_ID);
    let message = state
        .chat
        .handle_staff_reply(id, &body.message, staff_id)
        .await?;
    Ok(data(message))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// POST /admin/conversations/{id}/status
pub async fn admin_update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<Success<Empty>>, ApiError> {
    let status = parse_status(&body.status)?;
    state.chat.update_status(id, status).await?;
    Ok(success(Empty {}))
}

#[derive(Debug, Deserialize)]
pub struct AfterQuery {
    #[serde(default)]
    pub after_id: i64,
}

/// GET /admin/conversations/{id}/messages
pub async fn admin_list_messages(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<AfterQuery>,
) -> Result<Json<Success<Data<MessageList>>>, ApiError> {
    let messages = state.chat.list_messages(id, query.after_id.max(0)).await?;
    Ok(data(MessageList { messages }))
}

/// GET /admin/stats
pub async fn admin_stats(
    State(state): State<AppState>,
) -> Result<Json<Success<Data<ChatStats>>>, ApiError> {
    Ok(data(state.chat.stats().await?))
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: i64,
}

/// GET /admin/unread-count
pub async fn admin_unread_count(
    State(state): State<AppState>,
) -> Result<Json<Success<Data<UnreadCount>>>, ApiError> {
    let count = state.chat.unread_count().await?;
    Ok(data(UnreadCount { count }))
}

#[derive(Debug, Serialize)]
pub struct AiTestResult {
    pub reply: String,
    pub finish_reason: Option<String>,
    pub total_tokens: u32,
}

/// POST /admin/test-ai
///
/// Provider failures are reported to staff verbatim as a 400, since the
/// point of the call is to diagnose the connection.
pub async fn admin_test_ai(
    State(state): State<AppState>,
) -> Result<Json<Success<Data<AiTestResult>>>, ApiError> {
    match state.chat.test_ai().await {
        Ok(response) => Ok(data(AiTestResult {
            reply: response.text,
            finish_reason: response.finish_reason,
            total_tokens: response.usage.total_tokens,
        })),
        Err(e @ (ParleyError::Provider { .. } | ParleyError::Timeout { .. })) => {
            tracing::warn!(error = %e, "AI connection test failed");
            Err(ApiError::BadRequest(format!("connection failed: {e}")))
        }
        Err(e) => Err(e.into()),
    }
}

/// POST /admin/knowledge/invalidate
pub async fn admin_invalidate_knowledge(State(state): State<AppState>) -> Json<Success<Empty>> {
    state.chat.knowledge().invalidate();
    success(Empty {})
}

#[derive(Debug, Serialize)]
pub struct KnowledgeSize {
    pub bytes: usize,
}

/// POST /admin/knowledge/rebuild
pub async fn admin_rebuild_knowledge(
    State(state): State<AppState>,
) -> Result<Json<Success<Data<KnowledgeSize>>>, ApiError> {
    let text = state.chat.knowledge().rebuild().await?;
    tracing::info!(bytes = text.len(), "knowledge rebuilt on request");
    Ok(data(KnowledgeSize { bytes: text.len() }))
}
