// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic rendering of aggregated content into prompt text.

use std::fmt::Write;

use parley_config::model::SiteConfig;
use parley_core::types::Category;

use crate::normalize::NormalizedRecord;

/// Everything that goes into the knowledge text.
#[derive(Debug, Clone, Copy, Default)]
pub struct KnowledgeInput<'a> {
    pub site: Option<&'a SiteConfig>,
    pub categories: &'a [Category],
    pub records: &'a [NormalizedRecord],
    pub custom_data: &'a str,
}

/// Render the knowledge text.
///
/// Sections appear in a fixed order: site info, commerce categories, one
/// section per record group (in first-seen order), then additional info.
/// Identical input always yields identical output.
pub fn format_knowledge(input: &KnowledgeInput<'_>) -> String {
    let mut out = String::new();

    if let Some(site) = input.site {
        out.push_str("=== WEBSITE INFO ===\n");
        let _ = writeln!(out, "Name: {}", site.name);
        for (label, value) in [
            ("Description", &site.description),
            ("Website", &site.url),
            ("Contact email", &site.contact_email),
        ] {
            if !value.trim().is_empty() {
                let _ = writeln!(out, "{label}: {}", value.trim());
            }
        }
        out.push('\n');
    }

    if !input.categories.is_empty() {
        out.push_str("=== PRODUCT CATEGORIES ===\n");
        for category in input.categories {
            let _ = writeln!(out, "- {} ({} products)", category.name, category.count);
        }
        out.push('\n');
    }

    let mut sections: Vec<&str> = Vec::new();
    for record in input.records {
        if !sections.contains(&record.section.as_str()) {
            sections.push(&record.section);
        }
    }
    for section in sections {
        let _ = writeln!(out, "=== {section} ===");
        for record in input.records.iter().filter(|r| r.section == section) {
            write_record(&mut out, record);
        }
        out.push('\n');
    }

    let custom = input.custom_data.trim();
    if !custom.is_empty() {
        out.push_str("=== ADDITIONAL INFO ===\n");
        out.push_str(custom);
        out.push('\n');
    }

    out.truncate(out.trim_end().len());
    out
}

fn write_record(out: &mut String, record: &NormalizedRecord) {
    let _ = writeln!(out, "\n[{}]", record.title);
    if let Some(summary) = &record.summary {
        let _ = writeln!(out, "{summary}");
    }
    for (label, value) in &record.details {
        let _ = writeln!(out, "{label}: {value}");
    }
    let _ = writeln!(out, "Link: {}", record.url);
}
