use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use avitrack_common::types::DeliveryResult;
use avitrack_storage::{AlarmRow, UserRow};

use crate::error::NotifyError;
use crate::{alarm_body, alarm_title, NotificationAdapter};

/// FCM-style push settings, loaded from the `[notify.push]` config section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushSettings {
    /// Send endpoint, e.g. `https://fcm.googleapis.com/fcm/send`.
    pub endpoint: String,
    pub server_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    10
}

/// Push-notification adapter posting to an FCM-style HTTP endpoint.
///
/// Requires the recipient to have a registered device token; recipients
/// without one get a FAILED result rather than an error.
pub struct PushAdapter {
    client: reqwest::Client,
    endpoint: String,
    server_key: String,
}

impl PushAdapter {
    pub fn new(settings: &PushSettings) -> Result<Self, NotifyError> {
        if settings.endpoint.is_empty() {
            return Err(NotifyError::InvalidConfig("push endpoint is empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|e| NotifyError::InvalidConfig(format!("http client: {e}")))?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.clone(),
            server_key: settings.server_key.clone(),
        })
    }
}

#[async_trait]
impl NotificationAdapter for PushAdapter {
    async fn send(&self, alarm: &AlarmRow, recipient: &UserRow) -> DeliveryResult {
        let Some(token) = recipient.device_token.as_deref() else {
            return DeliveryResult::failed(
                &recipient.id,
                self.adapter_name(),
                "recipient has no device token",
            );
        };

        let payload = serde_json::json!({
            "to": token,
            "notification": {
                "title": alarm_title(alarm),
                "body": alarm_body(alarm),
            },
            "data": {
                "alarm_id": alarm.id,
                "alarm_type": alarm.alarm_type.as_str(),
                "priority": alarm.priority.as_str(),
                "farm_id": alarm.farm_id,
            },
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("key={}", self.server_key))
            .json(&payload)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => {
                tracing::debug!(
                    alarm_id = %alarm.id,
                    recipient = %recipient.username,
                    "Push notification delivered"
                );
                DeliveryResult::sent(&recipient.id, self.adapter_name())
            }
            Ok(resp) => {
                let status = resp.status();
                let body = resp.text().await.unwrap_or_default();
                tracing::warn!(
                    alarm_id = %alarm.id,
                    recipient = %recipient.username,
                    status = %status,
                    "Push endpoint rejected notification"
                );
                DeliveryResult::failed(
                    &recipient.id,
                    self.adapter_name(),
                    format!("push endpoint returned {status}: {body}"),
                )
            }
            Err(e) => {
                tracing::warn!(
                    alarm_id = %alarm.id,
                    recipient = %recipient.username,
                    error = %e,
                    "Push request failed"
                );
                DeliveryResult::failed(&recipient.id, self.adapter_name(), e.to_string())
            }
        }
    }

    fn adapter_name(&self) -> &str {
        "push"
    }
}
