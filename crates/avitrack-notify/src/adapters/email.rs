use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::{Deserialize, Serialize};

use avitrack_common::types::DeliveryResult;
use avitrack_storage::{AlarmRow, UserRow};

use crate::error::NotifyError;
use crate::{alarm_body, alarm_title, NotificationAdapter};

/// SMTP settings, loaded from the `[notify.email]` config section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailSettings {
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub username: String,
    pub password: String,
    /// From address, e.g. `alarms@avitrack.example`.
    pub from: String,
}

fn default_smtp_port() -> u16 {
    587
}

/// Email adapter delivering alarm notifications over SMTP.
pub struct EmailAdapter {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: String,
}

impl EmailAdapter {
    pub fn new(settings: &EmailSettings) -> Result<Self, NotifyError> {
        settings
            .from
            .parse::<lettre::message::Mailbox>()
            .map_err(|e| NotifyError::InvalidConfig(format!("from address: {e}")))?;

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.smtp_host)
            .map_err(|e| NotifyError::InvalidConfig(format!("smtp relay: {e}")))?
            .port(settings.smtp_port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: settings.from.clone(),
        })
    }
}

#[async_trait]
impl NotificationAdapter for EmailAdapter {
    async fn send(&self, alarm: &AlarmRow, recipient: &UserRow) -> DeliveryResult {
        let Some(email) = recipient.email.as_deref() else {
            return DeliveryResult::failed(
                &recipient.id,
                self.adapter_name(),
                "recipient has no email address",
            );
        };

        let to = match format!("{} <{}>", recipient.full_name, email).parse() {
            Ok(mailbox) => mailbox,
            Err(e) => {
                return DeliveryResult::failed(
                    &recipient.id,
                    self.adapter_name(),
                    format!("invalid recipient address {email}: {e}"),
                );
            }
        };
        // Validated in new(), but parse() is the only way to get a Mailbox.
        let from = match self.from.parse() {
            Ok(mailbox) => mailbox,
            Err(e) => {
                return DeliveryResult::failed(
                    &recipient.id,
                    self.adapter_name(),
                    format!("invalid from address: {e}"),
                );
            }
        };

        let message = Message::builder()
            .from(from)
            .to(to)
            .subject(alarm_title(alarm))
            .header(ContentType::TEXT_PLAIN)
            .body(alarm_body(alarm));

        let message = match message {
            Ok(m) => m,
            Err(e) => {
                return DeliveryResult::failed(
                    &recipient.id,
                    self.adapter_name(),
                    format!("message build: {e}"),
                );
            }
        };

        match self.transport.send(message).await {
            Ok(_) => {
                tracing::debug!(
                    alarm_id = %alarm.id,
                    recipient = %recipient.username,
                    "Email notification delivered"
                );
                DeliveryResult::sent(&recipient.id, self.adapter_name())
            }
            Err(e) => {
                tracing::warn!(
                    alarm_id = %alarm.id,
                    recipient = %recipient.username,
                    error = %e,
                    "SMTP delivery failed"
                );
                DeliveryResult::failed(&recipient.id, self.adapter_name(), e.to_string())
            }
        }
    }

    fn adapter_name(&self) -> &str {
        "email"
    }
}
