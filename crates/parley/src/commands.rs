// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot maintenance commands: `check-config`, `test-ai`,
//! `rebuild-knowledge`.

use std::sync::Arc;

use parley_config::ParleyConfig;
use parley_core::{AiClient, Clock, ParleyError, SystemClock};

use crate::app::{build_ai, build_knowledge};

/// Human-readable summary of a validated configuration.
pub fn config_summary(config: &ParleyConfig) -> String {
    let set = |b: bool| if b { "set" } else { "not set" };
    let mut lines = vec![
        format!("server:     {}:{}", config.server.host, config.server.port),
        format!(
            "admin API:  token {}",
            set(config.server.admin_token.is_some())
        ),
        format!("database:   {}", config.storage.database_path),
        format!(
            "AI:         {} (API key {})",
            config.gemini.model,
            set(config.gemini.api_key.as_deref().is_some_and(|k| !k.trim().is_empty()))
        ),
        format!(
            "auto-reply: {}",
            if config.chat.auto_reply { "on" } else { "off" }
        ),
    ];

    let hours = &config.chat.business_hours;
    if hours.start.is_empty() || hours.end.is_empty() {
        lines.push("hours:      always online".to_string());
    } else {
        lines.push(format!(
            "hours:      {}-{} (UTC{:+}min)",
            hours.start, hours.end, hours.utc_offset_minutes
        ));
    }

    lines.push(match config.notify.smtp_host.as_deref() {
        Some(host) if !host.trim().is_empty() => format!(
            "notify:     smtp {host}:{} -> {}",
            config.notify.smtp_port,
            config.chat.notification_email.as_deref().unwrap_or("(no recipient)")
        ),
        _ => "notify:     log only".to_string(),
    });

    let knowledge = &config.knowledge;
    lines.push(if knowledge.enabled {
        format!(
            "knowledge:  {} source(s), catalog {}",
            knowledge.sources.len(),
            knowledge.catalog_path.as_deref().unwrap_or("(none)")
        )
    } else {
        "knowledge:  disabled".to_string()
    });

    lines.join("\n")
}

/// Sends a connection test request to the configured model.
pub async fn test_ai(config: &ParleyConfig) -> Result<String, ParleyError> {
    let Some(ai) = build_ai(config)? else {
        return Err(ParleyError::Config(
            "gemini.api_key is not set (or PARLEY_GEMINI_API_KEY)".to_string(),
        ));
    };
    let response = ai.test_connection().await?;
    Ok(format!(
        "model {} replied: {} ({} tokens)",
        config.gemini.model,
        response.text.trim(),
        response.usage.total_tokens
    ))
}

/// Builds the knowledge text once and reports its size.
pub async fn rebuild_knowledge(config: &ParleyConfig) -> Result<String, ParleyError> {
    let ai = build_ai(config)?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let knowledge = build_knowledge(config, ai, clock);
    let text = knowledge.rebuild().await?;
    Ok(format!(
        "knowledge rebuilt: {} bytes ({} characters)",
        text.len(),
        text.chars().count()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_reports_missing_secrets() {
        let summary = config_summary(&ParleyConfig::default());
        assert!(summary.contains("token not set"));
        assert!(summary.contains("API key not set"));
        assert!(summary.contains("log only"));
    }

    #[test]
    fn summary_never_prints_secret_values() {
        let mut config = ParleyConfig::default();
        config.server.admin_token = Some("staff-secret".into());
        config.gemini.api_key = Some("AIza-secret".into());
        let summary = config_summary(&config);
        assert!(summary.contains("token set"));
        assert!(!summary.contains("staff-secret"));
        assert!(!summary.contains("AIza-secret"));
    }

    #[tokio::test]
    async fn test_ai_requires_a_key() {
        let err = test_ai(&ParleyConfig::default()).await.unwrap_err();
        assert!(matches!(err, ParleyError::Config(_)));
    }

    #[tokio::test]
    async fn rebuild_reads_the_catalog_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, r#"{"categories": [], "records": []}"#).unwrap();

        let mut config = ParleyConfig::default();
        config.knowledge.catalog_path = Some(path.display().to_string());
        config.knowledge.site.name = "Example Shop".into();

        let report = rebuild_knowledge(&config).await.unwrap();
        assert!(report.starts_with("knowledge rebuilt:"));
    }
}
