// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record normalization: truncation, public URLs, and detail lines.

use parley_config::model::SourceSelection;
use parley_core::types::ContentRecord;
use url::Url;

/// Appended to text cut by [`truncate_chars`].
pub const ELLIPSIS: &str = "...";

/// Wrap width handed to the HTML renderer. Lines are rejoined afterwards.
const PLAIN_TEXT_WIDTH: usize = 10_000;

/// Fields resolved from the record itself. Any other field name in a
/// selection is looked up through the content source as a custom attribute.
pub const BUILTIN_FIELDS: &[&str] = &[
    "title",
    "excerpt",
    "content",
    "description",
    "categories",
    "tags",
    "price",
    "stock",
    "attributes",
    "image",
    "custom",
];

/// A content record reduced to what the AI prompt needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRecord {
    pub id: u64,
    pub category: String,
    /// Section header the record is grouped under.
    pub section: String,
    pub title: String,
    pub url: String,
    /// Truncated body, excerpt, or description.
    pub summary: Option<String>,
    /// `label: value` lines in render order.
    pub details: Vec<(String, String)>,
}

/// Trim `text` and cut it to `max` characters, marking the cut with `...`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    let text = text.trim();
    match text.char_indices().nth(max) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}{ELLIPSIS}", &text[..cut]),
    }
}

/// Plain text of an HTML fragment with whitespace collapsed.
///
/// Editor comments and tags are dropped and entities decoded. Text without
/// markup is only whitespace-collapsed.
pub fn strip_markup(text: &str) -> String {
    let plain = if text.contains('<') || text.contains('&') {
        html2text::config::plain_no_decorate()
            .string_from_read(text.as_bytes(), PLAIN_TEXT_WIDTH)
            .unwrap_or_else(|_| text.to_string())
    } else {
        text.to_string()
    };
    plain.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Section header for a category unless the selection overrides it.
pub fn section_label(selection: &SourceSelection) -> String {
    if let Some(label) = selection.label.as_deref().map(str::trim)
        && !label.is_empty()
    {
        return label.to_uppercase();
    }
    match selection.category.as_str() {
        "product" => "PRODUCTS".to_string(),
        "post" => "POSTS".to_string(),
        "page" => "PAGES".to_string(),
        other => other.replace(['_', '-'], " ").to_uppercase(),
    }
}

/// The link shown to visitors.
///
/// Products link to the storefront as `/products/{slug}-{categoryId}?category={categorySlug}`
/// using their first category. Other records keep their permalink path with
/// the host swapped for the storefront host. Without a storefront URL the
/// permalink is returned untouched.
pub fn public_url(record: &ContentRecord, frontend_url: Option<&str>) -> String {
    let Some(base) = frontend_url.map(|u| u.trim_end_matches('/')).filter(|u| !u.is_empty())
    else {
        return record.permalink.clone();
    };

    if record.category == "product" {
        if record.slug.is_empty() {
            return record.permalink.clone();
        }
        return match record.terms.first() {
            Some(term) => format!(
                "{base}/products/{}-{}?category={}",
                record.slug, term.id, term.slug
            ),
            None => format!("{base}/products/{}", record.slug),
        };
    }

    swap_host(&record.permalink, base).unwrap_or_else(|| record.permalink.clone())
}

fn swap_host(permalink: &str, base: &str) -> Option<String> {
    let mut link = Url::parse(permalink).ok()?;
    let front = Url::parse(base).ok()?;
    let front_host = front.host_str()?;
    if link.host_str() == Some(front_host) {
        return Some(link.into());
    }
    link.set_host(Some(front_host)).ok()?;
    link.set_port(front.port()).ok()?;
    link.set_scheme(front.scheme()).ok()?;
    Some(link.into())
}

/// Normalize one record for `selection`. Custom attributes fetched from the
/// content source are appended by the aggregator.
pub fn normalize(
    record: &ContentRecord,
    selection: &SourceSelection,
    max_content_length: usize,
    frontend_url: Option<&str>,
) -> NormalizedRecord {
    let summary = [
        ("content", record.body.as_str()),
        ("excerpt", record.excerpt.as_str()),
        ("description", record.excerpt.as_str()),
        ("description", record.body.as_str()),
    ]
    .into_iter()
    .filter(|(field, _)| selection.wants(field))
    .map(|(_, text)| strip_markup(text))
    .find(|text| !text.is_empty())
    .map(|text| truncate_chars(&text, max_content_length));

    let mut details = Vec::new();
    if selection.wants("price")
        && let Some(price) = record.price.as_deref().filter(|p| !p.trim().is_empty())
    {
        details.push(("Price".to_string(), price.trim().to_string()));
    }
    if selection.wants("stock")
        && let Some(in_stock) = record.in_stock
    {
        let status = if in_stock { "In stock" } else { "Out of stock" };
        details.push(("Availability".to_string(), status.to_string()));
    }
    if selection.wants("categories") && !record.terms.is_empty() {
        let names: Vec<&str> = record.terms.iter().map(|t| t.name.as_str()).collect();
        details.push(("Categories".to_string(), names.join(", ")));
    }
    if selection.wants("tags") && !record.tags.is_empty() {
        details.push(("Tags".to_string(), record.tags.join(", ")));
    }
    if selection.wants("attributes") {
        for (name, values) in &record.product_attributes {
            if !values.is_empty() {
                details.push((name.clone(), values.join(", ")));
            }
        }
    }
    if selection.wants("custom") || selection.wants("attributes") {
        for (label, value) in &record.attributes {
            let rendered = value.render();
            if !rendered.is_empty() {
                details.push((label.clone(), rendered));
            }
        }
    }
    if selection.wants("image")
        && let Some(image) = record.image.as_deref().filter(|i| !i.is_empty())
    {
        details.push(("Image".to_string(), image.to_string()));
    }

    NormalizedRecord {
        id: record.id,
        category: record.category.clone(),
        section: section_label(selection),
        title: record.title.trim().to_string(),
        url: public_url(record, frontend_url),
        summary,
        details,
    }
}
