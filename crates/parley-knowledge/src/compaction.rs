// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Knowledge compaction: AI summarization above a size threshold, then a
//! hard byte cap.

use std::sync::Arc;

use parley_core::AiClient;
use parley_core::types::AiRequest;
use tracing::{info, warn};

/// Appended whenever the hard cap cuts the knowledge text.
pub const TRUNCATION_NOTICE: &str = "\n\n[NOTE: Data has been optimized and shortened. If information is not found, ask the customer to contact support directly.]";

/// Instruction for the summarization call.
const COMPACTION_PROMPT: &str = r#"You are a data summarizer for a customer-support assistant. Shorten the data below to about 20-30% of its size.

YOU MUST KEEP:
1. EVERY product and service name
2. EVERY price, exactly as written
3. Product categories
4. Contact details
5. Stock status (in stock / out of stock)

REMOVE:
- Long descriptions (keep one short sentence)
- Duplicate information
- Unimportant details

Format: keep the section headers (=== ... ===) but make the content brief."#;

/// Two-stage size governance for the knowledge text.
pub struct Compactor {
    ai: Option<Arc<dyn AiClient>>,
    threshold: usize,
    hard_cap: usize,
}

impl Compactor {
    pub fn new(ai: Option<Arc<dyn AiClient>>, threshold: usize, hard_cap: usize) -> Self {
        Self {
            ai,
            threshold,
            hard_cap,
        }
    }

    /// Summarize when over the threshold, then enforce the hard cap.
    ///
    /// Never fails: a missing, unconfigured, or failing AI leaves the text
    /// as it was before the hard cap is applied.
    pub async fn compact(&self, text: String) -> String {
        let summarized = self.summarize(text).await;
        enforce_hard_cap(summarized, self.hard_cap)
    }

    async fn summarize(&self, text: String) -> String {
        if text.len() <= self.threshold {
            return text;
        }
        let Some(ai) = self.ai.as_ref().filter(|ai| ai.is_configured()) else {
            warn!(
                size = text.len(),
                "knowledge over threshold but no AI configured, skipping compaction"
            );
            return text;
        };

        let request = AiRequest {
            system_prompt: Some(COMPACTION_PROMPT.to_string()),
            history: Vec::new(),
            message: format!("DATA:\n---\n{text}\n---\n\nSUMMARY:"),
            timeout: None,
        };

        match ai.generate(request).await {
            Ok(response) if !response.text.trim().is_empty() => {
                let original = text.len();
                let compacted = response.text.len();
                let ratio = 100.0 * (1.0 - compacted as f64 / original as f64);
                info!(
                    original_bytes = original,
                    compacted_bytes = compacted,
                    reduction_pct = ratio.round() as i64,
                    "knowledge compacted"
                );
                response.text
            }
            Ok(_) => {
                warn!("compaction returned empty text, keeping original");
                text
            }
            Err(e) => {
                warn!(error = %e, "compaction failed, keeping original");
                text
            }
        }
    }
}

/// Cut `text` so that it, plus [`TRUNCATION_NOTICE`], fits in `cap` bytes.
///
/// The cut lands on a UTF-8 character boundary. Text already within the cap
/// is returned unchanged. A cap smaller than the notice yields the notice alone.
pub fn enforce_hard_cap(text: String, cap: usize) -> String {
    if text.len() <= cap {
        return text;
    }
    let mut end = cap.saturating_sub(TRUNCATION_NOTICE.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    warn!(size = text.len(), cap, "knowledge still over hard cap, truncating");
    let mut out = String::with_capacity(end + TRUNCATION_NOTICE.len());
    out.push_str(&text[..end]);
    out.push_str(TRUNCATION_NOTICE);
    out
}
