// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pluggable "does this reply need a human?" decision.

/// Inspects AI output and decides whether staff must take over.
pub trait NeedsHumanClassifier: Send + Sync {
    fn needs_human(&self, reply: &str) -> bool;
}
