// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Parley components.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Provider,
    Storage,
    Notifier,
    ContentSource,
}

// --- Conversation domain ---

/// Who authored a message.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SenderType {
    Visitor,
    Ai,
    Staff,
    System,
}

impl SenderType {
    /// Visitor messages start unread; everything else is born read.
    pub fn initially_read(self) -> bool {
        self != SenderType::Visitor
    }
}

/// Lifecycle status of a conversation.
///
/// Any status may move to any other through an explicit staff action. The
/// system itself only ever moves a conversation to `Pending`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ConversationStatus {
    Open,
    Pending,
    Resolved,
    Closed,
}

impl ConversationStatus {
    /// Open and pending conversations are "live": a visitor has at most one.
    pub fn is_live(self) -> bool {
        matches!(self, Self::Open | Self::Pending)
    }
}

/// Which actor currently owns responding to a conversation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum HandledBy {
    Ai,
    Staff,
}

/// Optional, mutable visitor profile fields.
///
/// Empty strings are treated the same as absent values, so a merge never
/// overwrites a stored value with nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitorProfile {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub page_url: Option<String>,
}

impl VisitorProfile {
    /// Drop blank fields and trim the rest.
    pub fn normalized(&self) -> Self {
        fn clean(v: &Option<String>) -> Option<String> {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        }
        Self {
            name: clean(&self.name),
            email: clean(&self.email),
            phone: clean(&self.phone),
            page_url: clean(&self.page_url),
        }
    }

    pub fn is_empty(&self) -> bool {
        let n = self.normalized();
        n.name.is_none() && n.email.is_none() && n.phone.is_none() && n.page_url.is_none()
    }
}

/// Where a visitor request came from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitorOrigin {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// A visitor row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visitor {
    pub id: i64,
    /// Client-issued identity token (`v_<timestamp>_<9 alnum>`).
    pub token: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub page_url: Option<String>,
    pub created_at: String,
    pub last_seen_at: String,
}

/// A conversation row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub visitor_id: i64,
    pub status: ConversationStatus,
    pub handled_by: HandledBy,
    pub staff_id: Option<String>,
    pub rating: Option<u8>,
    pub rating_comment: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A conversation joined with the owning visitor's contact fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationDetail {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub visitor_token: String,
    pub visitor_name: Option<String>,
    pub visitor_email: Option<String>,
    pub visitor_phone: Option<String>,
}

/// One row of the staff inbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    #[serde(flatten)]
    pub conversation: Conversation,
    pub visitor_name: Option<String>,
    pub visitor_email: Option<String>,
    pub last_message: Option<String>,
    pub unread_count: i64,
}

/// Filter and pagination for the staff inbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationFilter {
    pub status: Option<ConversationStatus>,
    /// Substring match against visitor name or email.
    pub search: Option<String>,
    /// 1-based page number.
    pub page: u32,
    pub per_page: u32,
}

impl Default for ConversationFilter {
    fn default() -> Self {
        Self {
            status: None,
            search: None,
            page: 1,
            per_page: 20,
        }
    }
}

/// A page of inbox rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationPage {
    pub items: Vec<ConversationSummary>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
}

/// Partial update of a conversation. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationPatch {
    pub status: Option<ConversationStatus>,
    pub handled_by: Option<HandledBy>,
    pub staff_id: Option<String>,
    pub rating: Option<u8>,
    pub rating_comment: Option<String>,
}

impl ConversationPatch {
    /// Hand the conversation to staff and wait for a human.
    pub fn escalate() -> Self {
        Self {
            status: Some(ConversationStatus::Pending),
            handled_by: Some(HandledBy::Staff),
            ..Default::default()
        }
    }
}

/// A message row. `id` is the sole ordering key within a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub sender_type: SenderType,
    pub staff_id: Option<String>,
    #[serde(rename = "message")]
    pub body: String,
    pub is_read: bool,
    pub created_at: String,
}

/// Aggregate counters for the staff dashboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatStats {
    pub total_conversations: i64,
    pub pending_conversations: i64,
    pub resolved_today: i64,
    pub total_messages_today: i64,
    pub unread_count: i64,
    /// Mean seconds between a visitor message and the next AI/staff reply.
    pub avg_response_time_secs: Option<f64>,
}

// --- Content domain ---

/// A taxonomy term attached to a content record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermRef {
    pub id: u64,
    pub name: String,
    pub slug: String,
}

/// A commerce category as reported by the host catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub name: String,
    pub slug: String,
    /// Number of published items in the category.
    #[serde(default)]
    pub count: u64,
}

/// A supplemental, host-defined attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AttributeValue {
    Text(String),
    Url(String),
    Bool(bool),
    List(Vec<String>),
    /// A link to another record, rendered by its title.
    Reference { id: u64, title: String },
}

impl AttributeValue {
    /// Render the value as a single line of prompt text.
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) | Self::Url(s) => s.trim().to_string(),
            Self::Bool(true) => "Yes".to_string(),
            Self::Bool(false) => "No".to_string(),
            Self::List(items) => items
                .iter()
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(", "),
            Self::Reference { title, .. } => title.clone(),
        }
    }
}

/// A record read from the host content catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub id: u64,
    /// Content category key (`post`, `page`, `product`, or a custom type).
    pub category: String,
    pub title: String,
    #[serde(default)]
    pub slug: String,
    pub permalink: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub body: String,
    /// RFC 3339 modification time; records are read newest first.
    pub modified_at: String,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub in_stock: Option<bool>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub terms: Vec<TermRef>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Product attributes such as size or color.
    #[serde(default)]
    pub product_attributes: BTreeMap<String, Vec<String>>,
    /// Custom-field attributes keyed by their display label.
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

// --- AI domain ---

/// Conversation role as seen by the generative model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

/// One prior transcript turn sent as context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryTurn {
    pub role: TurnRole,
    pub text: String,
}

impl HistoryTurn {
    /// Map a stored message to a model turn. System notes are not sent.
    pub fn from_message(msg: &Message) -> Option<Self> {
        let role = match msg.sender_type {
            SenderType::Visitor => TurnRole::User,
            SenderType::Ai | SenderType::Staff => TurnRole::Model,
            SenderType::System => return None,
        };
        Some(Self {
            role,
            text: msg.body.clone(),
        })
    }
}

/// A single generation request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AiRequest {
    pub system_prompt: Option<String>,
    pub history: Vec<HistoryTurn>,
    pub message: String,
    /// Overrides the client's configured request timeout.
    pub timeout: Option<Duration>,
}

/// Token accounting reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub output_tokens: u32,
    pub total_tokens: u32,
}

/// A generation result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiResponse {
    pub text: String,
    pub finish_reason: Option<String>,
    pub usage: TokenUsage,
    /// Set by the provider when it could not answer (e.g. a safety block).
    pub needs_human: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn status_round_trips_lowercase() {
        for status in [
            ConversationStatus::Open,
            ConversationStatus::Pending,
            ConversationStatus::Resolved,
            ConversationStatus::Closed,
        ] {
            let s = status.to_string();
            assert_eq!(s, s.to_lowercase());
            assert_eq!(ConversationStatus::from_str(&s).unwrap(), status);
        }
        assert!(ConversationStatus::from_str("archived").is_err());
    }

    #[test]
    fn only_open_and_pending_are_live() {
        assert!(ConversationStatus::Open.is_live());
        assert!(ConversationStatus::Pending.is_live());
        assert!(!ConversationStatus::Resolved.is_live());
        assert!(!ConversationStatus::Closed.is_live());
    }

    #[test]
    fn visitor_messages_start_unread() {
        assert!(!SenderType::Visitor.initially_read());
        assert!(SenderType::Ai.initially_read());
        assert!(SenderType::Staff.initially_read());
        assert!(SenderType::System.initially_read());
    }

    #[test]
    fn profile_normalization_drops_blanks() {
        let p = VisitorProfile {
            name: Some("  Ana ".into()),
            email: Some("".into()),
            phone: Some("   ".into()),
            page_url: None,
        };
        let n = p.normalized();
        assert_eq!(n.name.as_deref(), Some("Ana"));
        assert!(n.email.is_none());
        assert!(n.phone.is_none());
        assert!(!p.is_empty());
        assert!(VisitorProfile::default().is_empty());
    }

    #[test]
    fn attribute_values_render_per_variant() {
        assert_eq!(AttributeValue::Bool(true).render(), "Yes");
        assert_eq!(AttributeValue::Bool(false).render(), "No");
        assert_eq!(
            AttributeValue::List(vec!["red".into(), " ".into(), "blue".into()]).render(),
            "red, blue"
        );
        assert_eq!(
            AttributeValue::Reference {
                id: 9,
                title: "Warranty".into()
            }
            .render(),
            "Warranty"
        );
        assert_eq!(
            AttributeValue::Url("https://x.test/a".into()).render(),
            "https://x.test/a"
        );
    }

    #[test]
    fn attribute_value_json_is_tagged() {
        let v: AttributeValue =
            serde_json::from_str(r#"{"type":"list","value":["a","b"]}"#).unwrap();
        assert_eq!(v, AttributeValue::List(vec!["a".into(), "b".into()]));
    }

    #[test]
    fn history_maps_senders_to_roles() {
        let mut msg = Message {
            id: 1,
            conversation_id: 1,
            sender_type: SenderType::Visitor,
            staff_id: None,
            body: "hi".into(),
            is_read: false,
            created_at: "2026-01-01T00:00:00.000Z".into(),
        };
        assert_eq!(HistoryTurn::from_message(&msg).unwrap().role, TurnRole::User);
        msg.sender_type = SenderType::Staff;
        assert_eq!(HistoryTurn::from_message(&msg).unwrap().role, TurnRole::Model);
        msg.sender_type = SenderType::System;
        assert!(HistoryTurn::from_message(&msg).is_none());
    }

    #[test]
    fn message_serializes_body_as_message() {
        let msg = Message {
            id: 3,
            conversation_id: 1,
            sender_type: SenderType::Ai,
            staff_id: None,
            body: "hello".into(),
            is_read: true,
            created_at: "2026-01-01T00:00:00.000Z".into(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["message"], "hello");
        assert_eq!(json["sender_type"], "ai");
    }
}
