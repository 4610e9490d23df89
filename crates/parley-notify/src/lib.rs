// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Staff notification adapters.
//!
//! [`SmtpNotifier`] mails notifications through a relay; [`LogNotifier`]
//! only logs them and is used when no relay is configured.

pub mod logging;
pub mod smtp;

use std::sync::Arc;

use parley_config::model::NotifyConfig;
use parley_core::{Notifier, ParleyError};

pub use logging::LogNotifier;
pub use smtp::SmtpNotifier;

/// SMTP when a relay host is configured, otherwise the log notifier.
pub fn build_notifier(config: &NotifyConfig) -> Result<Arc<dyn Notifier>, ParleyError> {
    match config.smtp_host.as_deref().map(str::trim) {
        Some(host) if !host.is_empty() => Ok(Arc::new(SmtpNotifier::new(config)?)),
        _ => Ok(Arc::new(LogNotifier)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::PluginAdapter;

    #[tokio::test]
    async fn log_notifier_without_relay() {
        let notifier = build_notifier(&NotifyConfig::default()).unwrap();
        assert_eq!(notifier.name(), "log");
    }

    #[tokio::test]
    async fn smtp_notifier_with_relay() {
        let config = NotifyConfig {
            smtp_host: Some("smtp.example.com".into()),
            ..NotifyConfig::default()
        };
        let notifier = build_notifier(&config).unwrap();
        assert_eq!(notifier.name(), "smtp");
    }
}
