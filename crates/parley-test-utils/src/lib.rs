// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Parley integration tests.
//!
//! Provides mock adapters and a test harness for fast, deterministic tests
//! without a network or a real content host.
//!
//! # Components
//!
//! - [`MockAiClient`] - scripted AI client that records requests
//! - [`MemoryContentSource`] - in-memory catalog with call counting
//! - [`ManualClock`] - clock that only moves when told to
//! - [`RecordingNotifier`] - captures staff notifications
//! - [`TestHarness`] - a full chat stack over the above

pub mod clock;
pub mod harness;
pub mod memory_source;
pub mod mock_ai;
pub mod notifier;

pub use clock::ManualClock;
pub use harness::{STAFF_EMAIL, TEST_ADDRESS, TestHarness, TestHarnessBuilder};
pub use memory_source::{ListHold, MemoryContentSource};
pub use mock_ai::{DEFAULT_REPLY, MockAiClient};
pub use notifier::{RecordingNotifier, SentNotification};
