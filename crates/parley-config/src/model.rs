// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for Parley.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Top-level Parley configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParleyConfig {
    /// HTTP server and admin access settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Gemini API settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Conversation handling settings.
    #[serde(default)]
    pub chat: ChatConfig,

    /// Token validation, rate limit, and ban settings.
    #[serde(default)]
    pub guard: GuardConfig,

    /// Knowledge aggregation and compaction settings.
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Staff notification delivery settings.
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Chat widget theming and texts.
    #[serde(default)]
    pub widget: WidgetConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bearer token for the admin API. `None` locks every admin route.
    #[serde(default)]
    pub admin_token: Option<String>,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Reverse proxies whose forwarding headers are believed. Requests from
    /// any other peer are rate limited on the socket address.
    #[serde(default)]
    pub trusted_proxies: Vec<IpAddr>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            admin_token: None,
            log_level: default_log_level(),
            trusted_proxies: Vec::new(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Storage backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|d| d.join("parley").join("parley.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("parley.db"))
        .to_string_lossy()
        .to_string()
}

/// Gemini API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// API key. `None` leaves the AI unconfigured and routes every message to staff.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Model identifier.
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// API base URL (without the `/models/...` suffix).
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,

    /// Request timeout in seconds.
    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_top_k")]
    pub top_k: u32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    /// Upper bound on generated tokens per reply.
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Block threshold applied to every safety category.
    #[serde(default = "default_safety_threshold")]
    pub safety_threshold: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            base_url: default_gemini_base_url(),
            timeout_secs: default_ai_timeout_secs(),
            temperature: default_temperature(),
            top_k: default_top_k(),
            top_p: default_top_p(),
            max_output_tokens: default_max_output_tokens(),
            safety_threshold: default_safety_threshold(),
        }
    }
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_ai_timeout_secs() -> u64 {
    30
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_k() -> u32 {
    40
}

fn default_top_p() -> f32 {
    0.95
}

fn default_max_output_tokens() -> u32 {
    1024
}

fn default_safety_threshold() -> String {
    "BLOCK_MEDIUM_AND_ABOVE".to_string()
}

/// Conversation handling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ChatConfig {
    /// Let the AI answer inbound messages.
    #[serde(default = "default_true")]
    pub auto_reply: bool,

    /// Number of prior transcript messages sent to the AI.
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Maximum accepted message length in characters.
    #[serde(default = "default_max_message_length")]
    pub max_message_length: usize,

    /// Text shown by the widget outside business hours.
    #[serde(default)]
    pub offline_message: String,

    /// Where staff notifications go. `None` disables notifications.
    #[serde(default)]
    pub notification_email: Option<String>,

    /// Staff console URL used to build links in notifications.
    #[serde(default = "default_admin_url")]
    pub admin_url: String,

    #[serde(default)]
    pub business_hours: BusinessHoursConfig,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            auto_reply: true,
            history_limit: default_history_limit(),
            max_message_length: default_max_message_length(),
            offline_message: String::new(),
            notification_email: None,
            admin_url: default_admin_url(),
            business_hours: BusinessHoursConfig::default(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_history_limit() -> usize {
    10
}

fn default_max_message_length() -> usize {
    5000
}

fn default_admin_url() -> String {
    "http://127.0.0.1:3000/admin/conversations".to_string()
}

/// Staffed hours, `HH:MM` bounds inclusive. Empty bounds mean always online.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BusinessHoursConfig {
    #[serde(default = "default_hours_start")]
    pub start: String,

    #[serde(default = "default_hours_end")]
    pub end: String,

    /// Offset of the business's local time from UTC, in minutes.
    #[serde(default)]
    pub utc_offset_minutes: i32,
}

impl Default for BusinessHoursConfig {
    fn default() -> Self {
        Self {
            start: default_hours_start(),
            end: default_hours_end(),
            utc_offset_minutes: 0,
        }
    }
}

fn default_hours_start() -> String {
    "08:00".to_string()
}

fn default_hours_end() -> String {
    "17:00".to_string()
}

/// Abuse guard configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GuardConfig {
    /// Requests allowed per visitor token per window.
    #[serde(default = "default_token_limit")]
    pub token_limit: i64,

    /// Requests allowed per network address per window.
    #[serde(default = "default_address_limit")]
    pub address_limit: i64,

    /// Rate-limit window length in seconds.
    #[serde(default = "default_window_secs")]
    pub window_secs: i64,

    /// Oldest acceptable visitor token, in seconds.
    #[serde(default = "default_token_max_age_secs")]
    pub token_max_age_secs: i64,

    /// How long limit violations are remembered for escalation.
    #[serde(default = "default_abuse_window_secs")]
    pub abuse_window_secs: i64,

    /// Violations within the abuse window that trigger a ban.
    #[serde(default = "default_ban_threshold")]
    pub ban_threshold: i64,

    /// Ban length in seconds.
    #[serde(default = "default_ban_secs")]
    pub ban_secs: i64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            token_limit: default_token_limit(),
            address_limit: default_address_limit(),
            window_secs: default_window_secs(),
            token_max_age_secs: default_token_max_age_secs(),
            abuse_window_secs: default_abuse_window_secs(),
            ban_threshold: default_ban_threshold(),
            ban_secs: default_ban_secs(),
        }
    }
}

fn default_token_limit() -> i64 {
    30
}

fn default_address_limit() -> i64 {
    50
}

fn default_window_secs() -> i64 {
    60
}

fn default_token_max_age_secs() -> i64 {
    30 * 24 * 3600
}

fn default_abuse_window_secs() -> i64 {
    3600
}

fn default_ban_threshold() -> i64 {
    3
}

fn default_ban_secs() -> i64 {
    86_400
}

/// Knowledge aggregation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KnowledgeConfig {
    /// Feed aggregated host content to the AI.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// JSON catalog exported by the host. `None` means no synced content.
    #[serde(default)]
    pub catalog_path: Option<String>,

    /// Cache lifetime of the aggregated text, in seconds.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Byte size above which the AI is asked to summarize.
    #[serde(default = "default_compaction_threshold")]
    pub compaction_threshold: usize,

    /// Absolute byte cap of the final knowledge text.
    #[serde(default = "default_hard_cap")]
    pub hard_cap: usize,

    /// Character cap for each record's body text.
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,

    /// Public storefront URL used to rewrite record links.
    #[serde(default)]
    pub frontend_url: Option<String>,

    /// Record ids never fed to the AI.
    #[serde(default)]
    pub excluded_ids: Vec<u64>,

    /// Prepend the site identity block.
    #[serde(default = "default_true")]
    pub include_site_info: bool,

    /// Prepend the commerce category list.
    #[serde(default = "default_true")]
    pub include_categories: bool,

    /// Content categories to read.
    #[serde(default = "default_sources")]
    pub sources: Vec<SourceSelection>,

    /// Hand-written business information, always included.
    #[serde(default)]
    pub manual: String,

    /// Free-form extra facts appended under their own section.
    #[serde(default)]
    pub custom_data: String,

    #[serde(default)]
    pub site: SiteConfig,
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            catalog_path: None,
            cache_ttl_secs: default_cache_ttl_secs(),
            compaction_threshold: default_compaction_threshold(),
            hard_cap: default_hard_cap(),
            max_content_length: default_max_content_length(),
            frontend_url: None,
            excluded_ids: Vec::new(),
            include_site_info: true,
            include_categories: true,
            sources: default_sources(),
            manual: String::new(),
            custom_data: String::new(),
            site: SiteConfig::default(),
        }
    }
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_compaction_threshold() -> usize {
    100_000
}

fn default_hard_cap() -> usize {
    1_048_576
}

fn default_max_content_length() -> usize {
    300
}

fn default_sources() -> Vec<SourceSelection> {
    vec![
        SourceSelection::new("post", 15, &["title", "excerpt", "content", "categories", "tags"]),
        SourceSelection::new("page", 10, &["title", "content"]),
        SourceSelection::new(
            "product",
            25,
            &[
                "title",
                "description",
                "price",
                "categories",
                "attributes",
                "stock",
                "image",
            ],
        ),
    ]
}

/// One content category to aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SourceSelection {
    /// Category key as the host names it.
    pub category: String,

    /// Maximum records read.
    #[serde(default = "default_selection_limit")]
    pub limit: usize,

    /// Fields rendered into the knowledge text.
    #[serde(default)]
    pub fields: Vec<String>,

    /// Section header override; defaults from the category key.
    #[serde(default)]
    pub label: Option<String>,
}

impl SourceSelection {
    pub fn new(category: &str, limit: usize, fields: &[&str]) -> Self {
        Self {
            category: category.to_string(),
            limit,
            fields: fields.iter().map(|f| f.to_string()).collect(),
            label: None,
        }
    }

    pub fn wants(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}

fn default_selection_limit() -> usize {
    10
}

/// Site identity fed to the AI and used in notification subjects.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    #[serde(default = "default_site_name")]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub contact_email: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: default_site_name(),
            description: String::new(),
            url: String::new(),
            contact_email: String::new(),
        }
    }
}

fn default_site_name() -> String {
    "Parley".to_string()
}

/// SMTP notification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NotifyConfig {
    /// SMTP relay host. `None` logs notifications instead of mailing them.
    #[serde(default)]
    pub smtp_host: Option<String>,

    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,

    /// Transport security towards the relay.
    #[serde(default)]
    pub smtp_security: SmtpSecurity,

    #[serde(default)]
    pub smtp_username: Option<String>,

    #[serde(default)]
    pub smtp_password: Option<String>,

    /// Sender mailbox.
    #[serde(default = "default_from_address")]
    pub from_address: String,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            smtp_port: default_smtp_port(),
            smtp_security: SmtpSecurity::default(),
            smtp_username: None,
            smtp_password: None,
            from_address: default_from_address(),
        }
    }
}

fn default_smtp_port() -> u16 {
    587
}

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    /// Plain connection upgraded with STARTTLS (port 587).
    #[default]
    Starttls,
    /// Implicit TLS (port 465).
    Tls,
    /// No encryption. Only for local relays.
    None,
}

fn default_from_address() -> String {
    "Parley <noreply@localhost>".to_string()
}

/// Chat widget theming and texts, served verbatim to the widget.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WidgetConfig {
    #[serde(default = "default_primary_color")]
    pub primary_color: String,

    #[serde(default = "default_background_color")]
    pub background_color: String,

    #[serde(default = "default_text_color")]
    pub text_color: String,

    #[serde(default = "default_border_color")]
    pub border_color: String,

    #[serde(default = "default_widget_title")]
    pub title: String,

    #[serde(default = "default_widget_subtitle")]
    pub subtitle: String,

    #[serde(default = "default_welcome_message")]
    pub welcome_message: String,

    #[serde(default = "default_input_placeholder")]
    pub input_placeholder: String,

    #[serde(default = "default_send_button_text")]
    pub send_button_text: String,

    #[serde(default)]
    pub quick_replies: Vec<QuickReply>,

    #[serde(default)]
    pub logo: Option<String>,

    /// `bottom-right` or `bottom-left`.
    #[serde(default = "default_position")]
    pub position: String,

    #[serde(default)]
    pub auto_open: bool,

    #[serde(default = "default_true")]
    pub show_quick_replies: bool,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            primary_color: default_primary_color(),
            background_color: default_background_color(),
            text_color: default_text_color(),
            border_color: default_border_color(),
            title: default_widget_title(),
            subtitle: default_widget_subtitle(),
            welcome_message: default_welcome_message(),
            input_placeholder: default_input_placeholder(),
            send_button_text: default_send_button_text(),
            quick_replies: Vec::new(),
            logo: None,
            position: default_position(),
            auto_open: false,
            show_quick_replies: true,
        }
    }
}

fn default_primary_color() -> String {
    "#2563eb".to_string()
}

fn default_background_color() -> String {
    "#ffffff".to_string()
}

fn default_text_color() -> String {
    "#1f2937".to_string()
}

fn default_border_color() -> String {
    "#e5e7eb".to_string()
}

fn default_widget_title() -> String {
    "Chat with us".to_string()
}

fn default_widget_subtitle() -> String {
    "We usually reply within minutes".to_string()
}

fn default_welcome_message() -> String {
    "Hello! How can we help you today?".to_string()
}

fn default_input_placeholder() -> String {
    "Type your message...".to_string()
}

fn default_send_button_text() -> String {
    "Send".to_string()
}

fn default_position() -> String {
    "bottom-right".to_string()
}

/// A canned visitor message offered as a button.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QuickReply {
    pub id: String,
    pub text: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_defaults_match_deployment_values() {
        let g = GuardConfig::default();
        assert_eq!(g.token_limit, 30);
        assert_eq!(g.address_limit, 50);
        assert_eq!(g.window_secs, 60);
        assert_eq!(g.token_max_age_secs, 2_592_000);
        assert_eq!(g.ban_threshold, 3);
        assert_eq!(g.ban_secs, 86_400);
    }

    #[test]
    fn default_sources_cover_posts_pages_products() {
        let k = KnowledgeConfig::default();
        let names: Vec<_> = k.sources.iter().map(|s| s.category.as_str()).collect();
        assert_eq!(names, vec!["post", "page", "product"]);
        assert!(k.sources[2].wants("price"));
        assert!(!k.sources[1].wants("price"));
    }

    #[test]
    fn config_serializes_round_trip_through_toml() {
        let config = ParleyConfig::default();
        let text = toml::to_string(&config).expect("serialize");
        let back: ParleyConfig = toml::from_str(&text).expect("deserialize");
        assert_eq!(back.gemini.model, "gemini-2.0-flash");
        assert_eq!(back.knowledge.hard_cap, 1_048_576);
    }

    #[test]
    fn trusted_proxies_parse_as_addresses() {
        let config: ParleyConfig =
            toml::from_str("[server]\ntrusted_proxies = [\"10.0.0.1\", \"::1\"]\n").unwrap();
        assert_eq!(
            config.server.trusted_proxies,
            vec![
                "10.0.0.1".parse::<IpAddr>().unwrap(),
                "::1".parse::<IpAddr>().unwrap(),
            ]
        );
        assert!(ServerConfig::default().trusted_proxies.is_empty());

        let bad = toml::from_str::<ParleyConfig>("[server]\ntrusted_proxies = [\"proxy\"]\n");
        assert!(bad.is_err());
    }
}
