// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SMTP delivery through `lettre`.

use async_trait::async_trait;
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use parley_config::model::{NotifyConfig, SmtpSecurity};
use parley_core::types::{AdapterType, HealthStatus};
use parley_core::{Notifier, ParleyError, PluginAdapter};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

/// Mails staff notifications through a configured relay.
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    host: String,
}

impl std::fmt::Debug for SmtpNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpNotifier")
            .field("host", &self.host)
            .field("from", &self.from.to_string())
            .finish_non_exhaustive()
    }
}

fn notify_err(
    message: String,
    source: impl std::error::Error + Send + Sync + 'static,
) -> ParleyError {
    ParleyError::Notify {
        message,
        source: Some(Box::new(source)),
    }
}

impl SmtpNotifier {
    pub fn new(config: &NotifyConfig) -> Result<Self, ParleyError> {
        let host = config
            .smtp_host
            .as_deref()
            .map(str::trim)
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ParleyError::Config("notify.smtp_host is not set".into()))?;

        let from: Mailbox = config.from_address.parse().map_err(|e| {
            ParleyError::Config(format!(
                "notify.from_address `{}` is not a mailbox: {e}",
                config.from_address
            ))
        })?;

        let mut builder = match config.smtp_security {
            SmtpSecurity::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| notify_err(format!("invalid SMTP relay `{host}`: {e}"), e))?,
            SmtpSecurity::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| notify_err(format!("invalid SMTP relay `{host}`: {e}"), e))?,
            SmtpSecurity::None => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host),
        }
        .port(config.smtp_port);

        if let Some(username) = config.smtp_username.as_deref().filter(|u| !u.is_empty()) {
            let password = SecretString::from(config.smtp_password.clone().unwrap_or_default());
            builder = builder.credentials(Credentials::new(
                username.to_string(),
                password.expose_secret().to_string(),
            ));
        }

        info!(
            host,
            port = config.smtp_port,
            security = ?config.smtp_security,
            "SMTP notifier initialized"
        );

        Ok(Self {
            transport: builder.build(),
            from,
            host: host.to_string(),
        })
    }
}

#[async_trait]
impl PluginAdapter for SmtpNotifier {
    fn name(&self) -> &str {
        "smtp"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Notifier
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        match self.transport.test_connection().await {
            Ok(true) => Ok(HealthStatus::Healthy),
            Ok(false) => Ok(HealthStatus::Degraded(format!(
                "SMTP relay {} refused the connection test",
                self.host
            ))),
            Err(e) => Ok(HealthStatus::Unhealthy(format!(
                "SMTP relay {} unreachable: {e}",
                self.host
            ))),
        }
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        debug!("SMTP notifier shutting down");
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<(), ParleyError> {
        let to: Mailbox = recipient.parse().map_err(|e| {
            notify_err(format!("invalid notification recipient `{recipient}`"), e)
        })?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| notify_err(format!("failed to build notification: {e}"), e))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| notify_err(format!("SMTP delivery to {recipient} failed: {e}"), e))?;
        debug!(recipient, subject, "notification mailed");
        Ok(())
    }
}
