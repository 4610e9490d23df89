// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic "needs a human" detection on AI replies.
//!
//! Substring matching over a lower-cased reply. No model call, no network.

use parley_core::NeedsHumanClassifier;

/// Phrases that signal the AI is handing the conversation off or guessing.
const HANDOFF_PHRASES: &[&str] = &[
    "transfer you to",
    "transfer to staff",
    "contact staff",
    "contact our staff",
    "contact support",
    "cannot answer",
    "can't answer",
    "don't know",
    "do not know",
    "need more support",
    "staff will",
    "wait for staff",
    "no information",
    "not found",
    "need human",
    "human agent",
];

/// Keyword classifier used when the provider gives no explicit flag.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    phrases: Vec<String>,
}

impl KeywordClassifier {
    pub fn new() -> Self {
        Self::with_phrases(HANDOFF_PHRASES.iter().copied())
    }

    /// Replace the phrase list. Matching is case-insensitive.
    pub fn with_phrases<I, S>(phrases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            phrases: phrases
                .into_iter()
                .map(|p| p.as_ref().trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }
}

impl Default for KeywordClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl NeedsHumanClassifier for KeywordClassifier {
    fn needs_human(&self, reply: &str) -> bool {
        let lower = reply.to_lowercase();
        self.phrases.iter().any(|p| lower.contains(p.as_str()))
    }
}
