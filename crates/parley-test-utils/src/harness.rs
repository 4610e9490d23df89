// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end chat testing.
//!
//! `TestHarness` wires an in-memory SQLite store, the scripted AI client, an
//! in-memory catalog, a recording notifier, and a manual clock into a real
//! [`ChatService`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parley_chat::{ChatDeps, ChatService, InboundMessage};
use parley_config::ParleyConfig;
use parley_core::types::{ContentRecord, VisitorOrigin};
use parley_core::{AiClient, Clock, ParleyError, StorageAdapter, VisitorProfile};
use parley_guard::AbuseGuard;
use parley_knowledge::KnowledgeService;
use parley_storage::{Database, SqliteStorage};

use crate::clock::ManualClock;
use crate::memory_source::MemoryContentSource;
use crate::mock_ai::MockAiClient;
use crate::notifier::RecordingNotifier;

/// Address every harness message claims to come from.
pub const TEST_ADDRESS: &str = "203.0.113.7";

/// Recipient configured for staff notifications.
pub const STAFF_EMAIL: &str = "staff@example.com";

/// Builder for [`TestHarness`].
pub struct TestHarnessBuilder {
    config: ParleyConfig,
    ai: Option<MockAiClient>,
    records: Vec<ContentRecord>,
    notifier: RecordingNotifier,
    clock: ManualClock,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        let mut config = ParleyConfig::default();
        config.chat.notification_email = Some(STAFF_EMAIL.to_string());
        config.knowledge.site.name = "Test Shop".to_string();
        Self {
            config,
            ai: Some(MockAiClient::new()),
            records: Vec::new(),
            notifier: RecordingNotifier::new(),
            clock: ManualClock::default(),
        }
    }

    /// Adjust the configuration before anything is built.
    pub fn configure(mut self, f: impl FnOnce(&mut ParleyConfig)) -> Self {
        f(&mut self.config);
        self
    }

    pub fn with_ai(mut self, ai: MockAiClient) -> Self {
        self.ai = Some(ai);
        self
    }

    /// No AI client at all, as when no API key is configured.
    pub fn without_ai(mut self) -> Self {
        self.ai = None;
        self
    }

    pub fn with_records(mut self, records: Vec<ContentRecord>) -> Self {
        self.records = records;
        self
    }

    pub fn with_notifier(mut self, notifier: RecordingNotifier) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_clock(mut self, clock: ManualClock) -> Self {
        self.clock = clock;
        self
    }

    pub async fn build(self) -> Result<TestHarness, ParleyError> {
        let clock = Arc::new(self.clock);
        let dyn_clock: Arc<dyn Clock> = clock.clone();
        let storage = Arc::new(
            SqliteStorage::from_database(Database::open_in_memory().await?)
                .with_clock(dyn_clock.clone()),
        );
        let ai = self.ai.map(Arc::new);
        let source = Arc::new(MemoryContentSource::new(self.records));
        let notifier = Arc::new(self.notifier);

        let dyn_storage: Arc<dyn StorageAdapter> = storage.clone();
        let dyn_ai: Option<Arc<dyn AiClient>> = ai.clone().map(|a| a as Arc<dyn AiClient>);

        let knowledge = Arc::new(KnowledgeService::new(
            self.config.knowledge.clone(),
            source.clone(),
            dyn_ai.clone(),
            dyn_clock.clone(),
        ));
        let guard = Arc::new(AbuseGuard::new(
            dyn_storage.clone(),
            self.config.guard.clone(),
            dyn_clock.clone(),
        ));
        let chat = Arc::new(ChatService::new(
            self.config.chat.clone(),
            ChatDeps {
                storage: dyn_storage,
                guard: guard.clone(),
                knowledge: knowledge.clone(),
                ai: dyn_ai,
                notifier: notifier.clone(),
                clock: dyn_clock,
            },
        ));

        Ok(TestHarness {
            config: self.config,
            storage,
            ai,
            source,
            notifier,
            clock,
            knowledge,
            guard,
            chat,
            tokens: AtomicU64::new(0),
        })
    }
}

/// A complete chat stack over in-memory collaborators.
pub struct TestHarness {
    pub config: ParleyConfig,
    pub storage: Arc<SqliteStorage>,
    pub ai: Option<Arc<MockAiClient>>,
    pub source: Arc<MemoryContentSource>,
    pub notifier: Arc<RecordingNotifier>,
    pub clock: Arc<ManualClock>,
    pub knowledge: Arc<KnowledgeService>,
    pub guard: Arc<AbuseGuard>,
    pub chat: Arc<ChatService>,
    tokens: AtomicU64,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// The scripted AI client. Panics when built `without_ai`.
    pub fn ai(&self) -> &MockAiClient {
        self.ai.as_deref().expect("harness was built without an AI client")
    }

    /// A fresh, valid visitor token issued a minute ago.
    pub fn next_token(&self) -> String {
        let n = self.tokens.fetch_add(1, Ordering::SeqCst);
        format!("v_{}_{n:0>9}", self.clock.now_secs() - 60)
    }

    pub fn message(&self, token: &str, body: &str) -> InboundMessage {
        InboundMessage {
            token: token.to_string(),
            body: body.to_string(),
            profile: VisitorProfile::default(),
            origin: VisitorOrigin {
                ip: Some(TEST_ADDRESS.to_string()),
                user_agent: Some("parley-tests".to_string()),
            },
            remote_addr: Some(TEST_ADDRESS.to_string()),
        }
    }
}
