// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests of the response orchestrator over the test harness.

use std::collections::BTreeMap;

use parley_core::types::{ContentRecord, ConversationFilter, TurnRole};
use parley_core::{
    ConversationStatus, HandledBy, ParleyError, SenderType, StorageAdapter, VisitorProfile,
};
use parley_test_utils::{MockAiClient, STAFF_EMAIL, TestHarness};

fn post(id: u64, title: &str, body: &str) -> ContentRecord {
    ContentRecord {
        id,
        category: "post".into(),
        title: title.into(),
        slug: title.to_lowercase().replace(' ', "-"),
        permalink: format!("https://shop.example.com/?p={id}"),
        excerpt: String::new(),
        body: body.into(),
        modified_at: "2026-02-01T00:00:00Z".into(),
        price: None,
        in_stock: None,
        image: None,
        terms: Vec::new(),
        tags: Vec::new(),
        product_attributes: BTreeMap::new(),
        attributes: BTreeMap::new(),
    }
}

async fn conversation_count(h: &TestHarness) -> i64 {
    h.storage
        .list_conversations(&ConversationFilter::default())
        .await
        .unwrap()
        .total
}

#[tokio::test]
async fn ai_reply_is_returned_and_visible_to_polling() {
    let h = TestHarness::builder()
        .with_ai(MockAiClient::with_responses(vec![
            "Shipping takes three days.".into(),
        ]))
        .build()
        .await
        .unwrap();
    let token = h.next_token();

    let outcome = h
        .chat
        .handle_visitor_message(h.message(&token, "How long is shipping?"))
        .await
        .unwrap();
    let reply = outcome.ai_reply.expect("AI should answer");
    assert_eq!(reply.body, "Shipping takes three days.");
    assert_eq!(reply.sender_type, SenderType::Ai);

    // Polling after the visitor's own message yields exactly the reply, by id.
    let polled = h
        .chat
        .list_messages(outcome.conversation_id, outcome.message_id)
        .await
        .unwrap();
    assert_eq!(polled.len(), 1);
    assert_eq!(polled[0].id, reply.id);

    // Polling after the reply yields nothing new.
    assert!(
        h.chat
            .list_messages(outcome.conversation_id, reply.id)
            .await
            .unwrap()
            .is_empty()
    );

    let detail = h
        .storage
        .get_conversation(outcome.conversation_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(detail.conversation.status, ConversationStatus::Open);
    assert_eq!(detail.conversation.handled_by, HandledBy::Ai);
    assert!(h.notifier.sent().await.is_empty());
}

#[tokio::test]
async fn ai_timeout_falls_back_to_staff() {
    let h = TestHarness::builder().build().await.unwrap();
    h.ai().push_timeout().await;
    let token = h.next_token();

    let outcome = h
        .chat
        .handle_visitor_message(h.message(&token, "Is the store open on Sunday?"))
        .await
        .unwrap();
    assert!(outcome.ai_reply.is_none());
    let json = serde_json::to_value(&outcome).unwrap();
    assert!(json["ai_reply"].is_null());
    assert_eq!(json["conversation_id"], outcome.conversation_id);

    let detail = h
        .storage
        .get_conversation(outcome.conversation_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(detail.conversation.status, ConversationStatus::Pending);
    assert_eq!(detail.conversation.handled_by, HandledBy::Staff);

    let transcript = h
        .chat
        .list_messages(outcome.conversation_id, 0)
        .await
        .unwrap();
    assert_eq!(transcript.len(), 1, "no system note is appended");
    assert_eq!(transcript[0].body, "Is the store open on Sunday?");

    let sent = h.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, STAFF_EMAIL);
    assert_eq!(sent[0].subject, "[Test Shop] New message from a visitor");
}

#[tokio::test]
async fn upstream_error_text_never_reaches_the_visitor() {
    let h = TestHarness::builder().build().await.unwrap();
    h.ai().push_failure("API key not valid: AIza-secret").await;
    let token = h.next_token();

    let outcome = h
        .chat
        .handle_visitor_message(h.message(&token, "hello"))
        .await
        .unwrap();
    assert!(outcome.ai_reply.is_none());
    let transcript = h
        .chat
        .list_messages(outcome.conversation_id, 0)
        .await
        .unwrap();
    assert!(transcript.iter().all(|m| !m.body.contains("AIza")));
}

#[tokio::test]
async fn without_ai_every_message_goes_to_staff() {
    let h = TestHarness::builder().without_ai().build().await.unwrap();
    let token = h.next_token();

    let outcome = h
        .chat
        .handle_visitor_message(h.message(&token, "Anyone there?"))
        .await
        .unwrap();
    assert!(outcome.ai_reply.is_none());
    let detail = h
        .storage
        .get_conversation(outcome.conversation_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(detail.conversation.status, ConversationStatus::Pending);
    assert_eq!(detail.conversation.handled_by, HandledBy::Staff);
    assert_eq!(h.notifier.sent().await.len(), 1);
}

#[tokio::test]
async fn disabled_auto_reply_skips_a_configured_ai() {
    let h = TestHarness::builder()
        .configure(|c| c.chat.auto_reply = false)
        .build()
        .await
        .unwrap();
    let token = h.next_token();

    let outcome = h
        .chat
        .handle_visitor_message(h.message(&token, "hi"))
        .await
        .unwrap();
    assert!(outcome.ai_reply.is_none());
    assert!(h.ai().requests().await.is_empty());
}

#[tokio::test]
async fn unconfigured_ai_is_never_called() {
    let h = TestHarness::builder()
        .with_ai(MockAiClient::unconfigured())
        .build()
        .await
        .unwrap();
    let token = h.next_token();

    h.chat
        .handle_visitor_message(h.message(&token, "hi"))
        .await
        .unwrap();
    assert!(h.ai().requests().await.is_empty());
    assert_eq!(h.notifier.sent().await.len(), 1);
}

#[tokio::test]
async fn flagged_reply_is_kept_and_escalated() {
    let h = TestHarness::builder().build().await.unwrap();
    h.ai().push_needs_human("Please contact our staff.").await;
    let token = h.next_token();

    let outcome = h
        .chat
        .handle_visitor_message(h.message(&token, "something odd"))
        .await
        .unwrap();
    assert!(outcome.ai_reply.is_some());
    let detail = h
        .storage
        .get_conversation(outcome.conversation_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(detail.conversation.status, ConversationStatus::Pending);
    assert_eq!(detail.conversation.handled_by, HandledBy::Staff);
    assert_eq!(h.notifier.sent().await.len(), 1);
}

#[tokio::test]
async fn uncertain_wording_is_escalated() {
    let h = TestHarness::builder()
        .with_ai(MockAiClient::with_responses(vec![
            "Sorry, I don't know that one.".into(),
        ]))
        .build()
        .await
        .unwrap();
    let token = h.next_token();

    let outcome = h
        .chat
        .handle_visitor_message(h.message(&token, "What is the warranty on X?"))
        .await
        .unwrap();
    let detail = h
        .storage
        .get_conversation(outcome.conversation_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(detail.conversation.status, ConversationStatus::Pending);
}

#[tokio::test]
async fn ai_keeps_answering_after_a_staff_reply() {
    let h = TestHarness::builder()
        .with_ai(MockAiClient::with_responses(vec![
            "Hello! How can I help?".into(),
            "You're welcome!".into(),
        ]))
        .build()
        .await
        .unwrap();
    let token = h.next_token();

    let first = h
        .chat
        .handle_visitor_message(h.message(&token, "hello"))
        .await
        .unwrap();
    h.chat
        .handle_staff_reply(first.conversation_id, "Hi, this is Minh.", "minh")
        .await
        .unwrap();

    let second = h
        .chat
        .handle_visitor_message(h.message(&token, "thanks Minh"))
        .await
        .unwrap();
    assert_eq!(second.conversation_id, first.conversation_id);
    assert_eq!(
        second.ai_reply.map(|m| m.body).as_deref(),
        Some("You're welcome!")
    );
    assert_eq!(h.ai().requests().await.len(), 2);
    assert!(h.notifier.sent().await.is_empty());
}

#[tokio::test]
async fn staff_replied_conversation_without_ai_goes_to_staff() {
    let h = TestHarness::builder()
        .configure(|c| c.chat.auto_reply = false)
        .build()
        .await
        .unwrap();
    let token = h.next_token();

    let first = h
        .chat
        .handle_visitor_message(h.message(&token, "hello"))
        .await
        .unwrap();
    h.chat
        .handle_staff_reply(first.conversation_id, "Hi, this is Minh.", "minh")
        .await
        .unwrap();
    h.chat
        .update_status(first.conversation_id, ConversationStatus::Open)
        .await
        .unwrap();

    let second = h
        .chat
        .handle_visitor_message(h.message(&token, "one more question"))
        .await
        .unwrap();
    assert!(second.ai_reply.is_none());
    assert!(h.ai().requests().await.is_empty());

    let detail = h
        .storage
        .get_conversation(first.conversation_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(detail.conversation.status, ConversationStatus::Pending);
    assert_eq!(detail.conversation.handled_by, HandledBy::Staff);
    assert_eq!(h.notifier.sent().await.len(), 2);
}

#[tokio::test]
async fn request_carries_history_knowledge_and_visitor() {
    let h = TestHarness::builder()
        .with_records(vec![post(1, "Shipping policy", "We ship within 3 days.")])
        .build()
        .await
        .unwrap();
    let token = h.next_token();

    let mut first = h.message(&token, "Hi, I'm Lan");
    first.profile = VisitorProfile {
        name: Some("Lan".into()),
        ..VisitorProfile::default()
    };
    h.chat.handle_visitor_message(first).await.unwrap();
    h.chat
        .handle_visitor_message(h.message(&token, "How fast is shipping?"))
        .await
        .unwrap();

    let requests = h.ai().requests().await;
    assert_eq!(requests.len(), 2);
    let second = &requests[1];
    assert_eq!(second.message, "How fast is shipping?");
    let roles: Vec<TurnRole> = second.history.iter().map(|t| t.role).collect();
    assert_eq!(roles, vec![TurnRole::User, TurnRole::Model]);
    assert_eq!(second.history[0].text, "Hi, I'm Lan");

    let prompt = second.system_prompt.as_deref().unwrap();
    assert!(prompt.contains("Shipping policy"));
    assert!(prompt.contains("We ship within 3 days."));
    assert!(prompt.contains("- Name: Lan"));
}

#[tokio::test]
async fn history_is_bounded() {
    let h = TestHarness::builder()
        .configure(|c| c.chat.history_limit = 3)
        .build()
        .await
        .unwrap();
    let token = h.next_token();
    for i in 0..4 {
        h.chat
            .handle_visitor_message(h.message(&token, &format!("message {i}")))
            .await
            .unwrap();
    }
    let last = h.ai().requests().await.pop().unwrap();
    assert_eq!(last.history.len(), 3);
    assert_eq!(last.message, "message 3");
    assert_eq!(last.history.last().unwrap().role, TurnRole::Model);
}

#[tokio::test]
async fn invalid_input_writes_nothing() {
    let h = TestHarness::builder()
        .configure(|c| c.chat.max_message_length = 10)
        .build()
        .await
        .unwrap();
    let token = h.next_token();

    for body in ["", "   ", "this is far too long"] {
        let err = h
            .chat
            .handle_visitor_message(h.message(&token, body))
            .await
            .unwrap_err();
        assert!(matches!(err, ParleyError::Validation(_)), "{body:?}: {err:?}");
    }
    let err = h
        .chat
        .handle_visitor_message(h.message("v_123_ab", "hello"))
        .await
        .unwrap_err();
    assert!(matches!(err, ParleyError::Validation(_)));

    assert_eq!(conversation_count(&h).await, 0);
    assert!(h.storage.get_visitor(&token).await.unwrap().is_none());
}

#[tokio::test]
async fn rate_limited_messages_are_not_persisted() {
    let h = TestHarness::builder()
        .configure(|c| c.guard.token_limit = 2)
        .build()
        .await
        .unwrap();
    let token = h.next_token();

    let first = h
        .chat
        .handle_visitor_message(h.message(&token, "one"))
        .await
        .unwrap();
    h.chat
        .handle_visitor_message(h.message(&token, "two"))
        .await
        .unwrap();
    let err = h
        .chat
        .handle_visitor_message(h.message(&token, "three"))
        .await
        .unwrap_err();
    assert!(matches!(err, ParleyError::RateLimited));

    let bodies: Vec<String> = h
        .chat
        .list_messages(first.conversation_id, 0)
        .await
        .unwrap()
        .into_iter()
        .filter(|m| m.sender_type == SenderType::Visitor)
        .map(|m| m.body)
        .collect();
    assert_eq!(bodies, vec!["one", "two"]);
}

#[tokio::test]
async fn concurrent_first_messages_share_one_conversation() {
    let h = TestHarness::builder().without_ai().build().await.unwrap();
    let token = h.next_token();

    let sends = (0..4).map(|i| {
        let chat = h.chat.clone();
        let msg = h.message(&token, &format!("hello {i}"));
        tokio::spawn(async move { chat.handle_visitor_message(msg).await })
    });
    let outcomes = futures::future::join_all(sends).await;

    let ids: Vec<i64> = outcomes
        .into_iter()
        .map(|r| r.unwrap().unwrap().conversation_id)
        .collect();
    assert!(ids.windows(2).all(|w| w[0] == w[1]), "got {ids:?}");
    assert_eq!(conversation_count(&h).await, 1);
}

#[tokio::test]
async fn resolved_conversation_is_not_reused() {
    let h = TestHarness::builder().build().await.unwrap();
    let token = h.next_token();

    let first = h
        .chat
        .handle_visitor_message(h.message(&token, "hello"))
        .await
        .unwrap();
    h.chat
        .update_status(first.conversation_id, ConversationStatus::Resolved)
        .await
        .unwrap();
    let second = h
        .chat
        .handle_visitor_message(h.message(&token, "one more thing"))
        .await
        .unwrap();
    assert_ne!(second.conversation_id, first.conversation_id);
}
