// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation orchestration for the Parley support chat.
//!
//! [`ChatService`] takes a visitor message through the abuse guard and the
//! store, then decides whether the AI answers or staff are called in.

pub mod classifier;
pub mod hours;
pub mod notification;
pub mod service;

pub use classifier::KeywordClassifier;
pub use hours::is_within_business_hours;
pub use notification::{StaffNotification, staff_notification};
pub use service::{
    ChatDeps, ChatService, ChatStatus, ConversationState, ConversationView, InboundMessage,
    SendOutcome, parse_status,
};
