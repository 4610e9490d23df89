// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests over HTTP: widget and staff console talking to one
//! server, with the AI, catalog, notifier and clock replaced by test doubles.

use std::collections::BTreeMap;
use std::net::{IpAddr, SocketAddr};

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use parley_core::types::ContentRecord;
use parley_core::{ConversationStatus, HandledBy, StorageAdapter};
use parley_gateway::{AdminAuth, AppState, router};
use parley_test_utils::{MockAiClient, STAFF_EMAIL, TestHarness};
use serde_json::{Value, json};
use tower::ServiceExt;

const ADMIN_TOKEN: &str = "e2e-admin";

struct Client {
    app: Router,
}

impl Client {
    fn new(h: &TestHarness) -> Self {
        let state = AppState::new(h.chat.clone(), h.config.widget.clone());
        Self {
            app: router(state, AdminAuth::new(Some(ADMIN_TOKEN.to_string()))),
        }
    }

    async fn request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let res = self.app.clone().oneshot(request).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn post(&self, uri: &str, body: Value, ip: &str, admin: bool) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .extension(ConnectInfo(SocketAddr::new(ip.parse::<IpAddr>().unwrap(), 40_000)));
        if admin {
            builder = builder.header("authorization", format!("Bearer {ADMIN_TOKEN}"));
        }
        self.request(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn get(&self, uri: &str, admin: bool) -> (StatusCode, Value) {
        let mut builder = Request::builder().method("GET").uri(uri);
        if admin {
            builder = builder.header("authorization", format!("Bearer {ADMIN_TOKEN}"));
        }
        self.request(builder.body(Body::empty()).unwrap()).await
    }

    async fn send(&self, token: &str, message: &str, ip: &str) -> (StatusCode, Value) {
        self.post(
            "/api/v1/chat/send",
            json!({"visitor_id": token, "message": message}),
            ip,
            false,
        )
        .await
    }

    async fn poll(&self, conversation_id: i64, after_id: i64) -> Vec<Value> {
        let (status, body) = self
            .get(
                &format!(
                    "/api/v1/chat/messages?conversation_id={conversation_id}&after_id={after_id}"
                ),
                false,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        body["messages"].as_array().cloned().unwrap_or_default()
    }
}

fn product(id: u64, title: &str, body: &str) -> ContentRecord {
    ContentRecord {
        id,
        category: "product".into(),
        title: title.into(),
        slug: title.to_lowercase().replace(' ', "-"),
        permalink: format!("https://shop.example.com/product/{id}"),
        excerpt: String::new(),
        body: body.into(),
        modified_at: "2026-02-10T08:00:00Z".into(),
        price: Some("249000".into()),
        in_stock: Some(true),
        image: None,
        terms: Vec::new(),
        tags: Vec::new(),
        product_attributes: BTreeMap::new(),
        attributes: BTreeMap::new(),
    }
}

#[tokio::test]
async fn ai_answers_then_hands_over_to_staff() {
    let h = TestHarness::builder()
        .with_records(vec![product(11, "Linen shirt", "Breathable linen shirt.")])
        .with_ai(MockAiClient::with_responses(vec![
            "The linen shirt costs 249000.".into(),
            "I don't know, let me transfer you to our staff.".into(),
            "Glad we could help!".into(),
        ]))
        .build()
        .await
        .unwrap();
    let client = Client::new(&h);
    let token = h.next_token();

    // 1. The AI answers from the catalog.
    let (status, first) = client
        .send(&token, "How much is the linen shirt?", "198.51.100.20")
        .await;
    assert_eq!(status, StatusCode::OK);
    let conversation_id = first["conversation_id"].as_i64().unwrap();
    assert_eq!(first["ai_reply"]["message"], "The linen shirt costs 249000.");
    let prompt = h.ai().requests().await[0].system_prompt.clone().unwrap();
    assert!(prompt.contains("Linen shirt"));

    // 2. An unsure answer escalates and notifies staff.
    let (_, second) = client.send(&token, "Can I return it after 60 days?", "198.51.100.20").await;
    assert_eq!(second["conversation_id"].as_i64(), Some(conversation_id));
    let detail = h.storage.get_conversation(conversation_id).await.unwrap().unwrap();
    assert_eq!(detail.conversation.status, ConversationStatus::Pending);
    assert_eq!(detail.conversation.handled_by, HandledBy::Staff);
    let sent = h.notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].recipient, STAFF_EMAIL);

    // 3. Staff find it in the pending inbox and reply.
    let (_, inbox) = client
        .get("/api/v1/admin/conversations?status=pending", true)
        .await;
    assert_eq!(inbox["data"]["items"][0]["id"].as_i64(), Some(conversation_id));
    let (status, reply) = client
        .post(
            &format!("/api/v1/admin/conversations/{conversation_id}/reply"),
            json!({"message": "Returns are accepted within 30 days.", "staff_id": "minh"}),
            "10.0.0.1",
            true,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let staff_message_id = reply["data"]["id"].as_i64().unwrap();

    // 4. The widget's poll picks up the staff reply exactly once.
    let last_seen = second["ai_reply"]["id"]
        .as_i64()
        .unwrap_or(second["message_id"].as_i64().unwrap());
    let polled = client.poll(conversation_id, last_seen).await;
    assert_eq!(polled.len(), 1);
    assert_eq!(polled[0]["id"].as_i64(), Some(staff_message_id));
    assert_eq!(polled[0]["sender_type"], "staff");
    assert!(client.poll(conversation_id, staff_message_id).await.is_empty());

    // 5. Auto-reply stays on, so the AI answers the next message too.
    let (_, third) = client.send(&token, "Thanks!", "198.51.100.20").await;
    assert_eq!(third["ai_reply"]["message"], "Glad we could help!");
    assert_eq!(h.ai().requests().await.len(), 3);
    let polled = client.poll(conversation_id, staff_message_id).await;
    let senders: Vec<&str> = polled
        .iter()
        .filter_map(|m| m["sender_type"].as_str())
        .collect();
    assert_eq!(senders, ["visitor", "ai"]);

    // 6. The visitor rates the conversation.
    let (status, _) = client
        .post(
            "/api/v1/chat/rate",
            json!({"conversation_id": conversation_id, "rating": 5, "comment": "fast"}),
            "198.51.100.20",
            false,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let detail = h.storage.get_conversation(conversation_id).await.unwrap().unwrap();
    assert_eq!(detail.conversation.rating, Some(5));
}

#[tokio::test]
async fn repeated_flooding_bans_the_address() {
    let h = TestHarness::builder()
        .configure(|c| {
            c.guard.token_limit = 1;
            c.guard.ban_threshold = 3;
        })
        .build()
        .await
        .unwrap();
    let client = Client::new(&h);
    let ip = "192.0.2.66";
    let token = h.next_token();

    assert_eq!(client.send(&token, "one", ip).await.0, StatusCode::OK);
    for _ in 0..3 {
        assert_eq!(
            client.send(&token, "again", ip).await.0,
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    // Banned: a fresh, valid token from the same address is still refused.
    let fresh = h.next_token();
    assert_eq!(
        client.send(&fresh, "hello?", ip).await.0,
        StatusCode::TOO_MANY_REQUESTS
    );
    assert!(h.guard.is_banned(ip).await.unwrap());

    // Another address is unaffected.
    assert_eq!(
        client.send(&fresh, "hello", "192.0.2.67").await.0,
        StatusCode::OK
    );
}

#[tokio::test]
async fn offline_without_ai_goes_straight_to_staff() {
    let h = TestHarness::builder().without_ai().build().await.unwrap();
    let client = Client::new(&h);
    let token = h.next_token();

    let (status, sent) = client.send(&token, "Is anyone there?", "198.51.100.30").await;
    assert_eq!(status, StatusCode::OK);
    assert!(sent["ai_reply"].is_null());
    let conversation_id = sent["conversation_id"].as_i64().unwrap();

    let (_, status_body) = client
        .get(
            &format!("/api/v1/chat/status?conversation_id={conversation_id}"),
            false,
        )
        .await;
    assert_eq!(status_body["conversation"]["status"], "pending");
    assert_eq!(status_body["conversation"]["handled_by"], "staff");

    let (_, stats) = client.get("/api/v1/admin/stats", true).await;
    assert_eq!(stats["data"]["pending_conversations"], 1);
    assert_eq!(stats["data"]["unread_count"], 1);
}
