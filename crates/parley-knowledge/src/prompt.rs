// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! System prompt assembly for visitor replies.

use std::fmt::Write;

use parley_config::model::SiteConfig;
use parley_core::Visitor;

/// Build the system instruction sent with every AI reply.
///
/// Layout: role and rules, then manual business information, then the
/// aggregated website data, then whatever is known about the visitor.
pub fn build_system_prompt(
    site: &SiteConfig,
    manual: &str,
    knowledge: &str,
    visitor: Option<&Visitor>,
) -> String {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "You are the customer-support assistant for the website \"{}\".",
        site.name
    );
    if !site.description.trim().is_empty() {
        let _ = writeln!(prompt, "Website description: {}", site.description.trim());
    }
    prompt.push_str(
        "\nIMPORTANT RULES:
1. Be friendly and professional, and answer in the customer's language
2. Keep answers short and easy to follow (2-3 paragraphs at most)
3. If you do not know the exact answer, say that you will transfer the customer to a staff member
4. Never guess or give inaccurate information
5. Always be polite and patient
6. If the customer asks for a human, say a staff member will join right away
7. When talking about a product, service, or article, include its link if available
8. Quote prices exactly as they appear in the data
9. Answer stock questions only from the data provided
10. For more detail, point the customer to the product or article link
",
    );

    let manual = manual.trim();
    if !manual.is_empty() {
        let _ = write!(prompt, "\n=== BUSINESS INFORMATION ===\n{manual}\n");
    }
    let knowledge = knowledge.trim();
    if !knowledge.is_empty() {
        let _ = write!(prompt, "\n=== WEBSITE DATA ===\n{knowledge}\n");
    }

    if let Some(visitor) = visitor {
        let facts: Vec<(&str, &str)> = [
            ("Name", visitor.name.as_deref()),
            ("Email", visitor.email.as_deref()),
            ("Phone", visitor.phone.as_deref()),
        ]
        .into_iter()
        .filter_map(|(label, value)| {
            value
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(|v| (label, v))
        })
        .collect();
        if !facts.is_empty() {
            prompt.push_str("\nCUSTOMER IN THIS CHAT:\n");
            for (label, value) in facts {
                let _ = writeln!(prompt, "- {label}: {value}");
            }
        }
    }

    prompt
}
