// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as well-formed business hours, positive limits, and non-empty paths.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::ParleyConfig;

/// Smallest hard cap that still leaves room for the truncation disclaimer.
const MIN_HARD_CAP: usize = 1024;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ParleyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    let host = config.server.host.trim();
    if host.is_empty() {
        fail("server.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "server.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    if config.gemini.timeout_secs == 0 {
        fail("gemini.timeout_secs must be at least 1".to_string());
    }

    if !(0.0..=2.0).contains(&config.gemini.temperature) {
        fail(format!(
            "gemini.temperature must be within 0.0..=2.0, got {}",
            config.gemini.temperature
        ));
    }

    if !(0.0..=1.0).contains(&config.gemini.top_p) {
        fail(format!(
            "gemini.top_p must be within 0.0..=1.0, got {}",
            config.gemini.top_p
        ));
    }

    if config.chat.max_message_length == 0 {
        fail("chat.max_message_length must be at least 1".to_string());
    }

    let hours = &config.chat.business_hours;
    for (name, value) in [("start", &hours.start), ("end", &hours.end)] {
        if !value.is_empty() && !is_hh_mm(value) {
            fail(format!(
                "chat.business_hours.{name} `{value}` must be HH:MM (24-hour)"
            ));
        }
    }

    if hours.utc_offset_minutes.abs() > 14 * 60 {
        fail(format!(
            "chat.business_hours.utc_offset_minutes must be within +/-840, got {}",
            hours.utc_offset_minutes
        ));
    }

    let guard = &config.guard;
    for (name, value) in [
        ("token_limit", guard.token_limit),
        ("address_limit", guard.address_limit),
        ("window_secs", guard.window_secs),
        ("token_max_age_secs", guard.token_max_age_secs),
        ("abuse_window_secs", guard.abuse_window_secs),
        ("ban_threshold", guard.ban_threshold),
        ("ban_secs", guard.ban_secs),
    ] {
        if value < 1 {
            fail(format!("guard.{name} must be at least 1, got {value}"));
        }
    }

    let knowledge = &config.knowledge;
    if knowledge.hard_cap < MIN_HARD_CAP {
        fail(format!(
            "knowledge.hard_cap must be at least {MIN_HARD_CAP} bytes, got {}",
            knowledge.hard_cap
        ));
    }

    if knowledge.max_content_length == 0 {
        fail("knowledge.max_content_length must be at least 1".to_string());
    }

    if let Some(url) = &knowledge.frontend_url
        && !(url.starts_with("http://") || url.starts_with("https://"))
    {
        fail(format!(
            "knowledge.frontend_url `{url}` must start with http:// or https://"
        ));
    }

    let mut seen = HashSet::new();
    for (i, source) in knowledge.sources.iter().enumerate() {
        if source.category.trim().is_empty() {
            fail(format!("knowledge.sources[{i}].category must not be empty"));
        } else if !seen.insert(source.category.as_str()) {
            fail(format!(
                "duplicate category `{}` in [[knowledge.sources]]",
                source.category
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// `HH:MM` with hours 00-23 and minutes 00-59.
pub fn is_hh_mm(value: &str) -> bool {
    let Some((h, m)) = value.split_once(':') else {
        return false;
    };
    if h.len() != 2 || m.len() != 2 {
        return false;
    }
    matches!((h.parse::<u8>(), m.parse::<u8>()), (Ok(h), Ok(m)) if h < 24 && m < 60)
}
