//! Fan-out of alarm notifications to role-based recipients.

use std::sync::Arc;
use std::time::Duration;

use avitrack_common::types::{DeliveryResult, DeliveryStatus};
use avitrack_storage::{AlarmConfigRow, AlarmRow, FarmStore, UserRow};

use crate::registry::AdapterRegistry;
use crate::NotificationAdapter;

const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Resolves recipients for an alarm and delivers through the registry.
///
/// Every delivery attempt is recorded as a notification log row. A
/// single failed recipient never interrupts the fan-out, and a failed
/// log write is only traced: notifications are best-effort by contract.
pub struct NotificationDispatcher {
    store: Arc<FarmStore>,
    registry: AdapterRegistry,
    send_timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(store: Arc<FarmStore>, registry: AdapterRegistry) -> Self {
        Self {
            store,
            registry,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Notifies every recipient selected by the configuration's notify
    /// flags, through the default adapter.
    pub async fn send_alarm_notifications(
        &self,
        alarm: &AlarmRow,
        config: &AlarmConfigRow,
    ) -> Vec<DeliveryResult> {
        let recipients = match self.resolve_recipients(alarm, config).await {
            Ok(recipients) => recipients,
            Err(e) => {
                tracing::error!(
                    alarm_id = %alarm.id,
                    error = %e,
                    "Failed to resolve notification recipients"
                );
                return Vec::new();
            }
        };

        if recipients.is_empty() {
            tracing::debug!(alarm_id = %alarm.id, "No notification recipients selected");
            return Vec::new();
        }

        let adapter = self.registry.default_adapter();
        let mut results = Vec::with_capacity(recipients.len());
        for recipient in &recipients {
            results.push(self.deliver(&*adapter, alarm, recipient).await);
        }
        results
    }

    /// Notifies a single recipient, optionally through a named adapter.
    ///
    /// An unknown adapter name falls back to the default with a warning
    /// rather than failing: a stale channel name in an escalation target
    /// must not swallow the notification.
    pub async fn send_direct_notification(
        &self,
        alarm: &AlarmRow,
        recipient: &UserRow,
        adapter_override: Option<&str>,
    ) -> DeliveryResult {
        let adapter = match adapter_override {
            Some(name) => match self.registry.get(name) {
                Ok(adapter) => adapter,
                Err(e) => {
                    tracing::warn!(
                        alarm_id = %alarm.id,
                        adapter = name,
                        error = %e,
                        "Unknown adapter requested, falling back to default"
                    );
                    self.registry.default_adapter()
                }
            },
            None => self.registry.default_adapter(),
        };
        self.deliver(&*adapter, alarm, recipient).await
    }

    /// Collects the recipients the configuration asks for, deduplicated
    /// by user id (a veterinarian who also manages the farm gets one
    /// notification, not two).
    async fn resolve_recipients(
        &self,
        alarm: &AlarmRow,
        config: &AlarmConfigRow,
    ) -> anyhow::Result<Vec<UserRow>> {
        let farm = self
            .store
            .get_farm(&alarm.farm_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("farm {} not found", alarm.farm_id))?;

        let mut recipients: Vec<UserRow> = Vec::new();
        let mut push_unique = |user: UserRow, recipients: &mut Vec<UserRow>| {
            if user.is_active && !recipients.iter().any(|r| r.id == user.id) {
                recipients.push(user);
            }
        };

        if config.notify_farm_manager {
            if let Some(manager) = self.store.get_user(&farm.manager_id).await? {
                push_unique(manager, &mut recipients);
            }
        }
        if config.notify_veterinarian {
            if let Some(vet_id) = farm.veterinarian_id.as_deref() {
                if let Some(vet) = self.store.get_user(vet_id).await? {
                    push_unique(vet, &mut recipients);
                }
            }
        }
        if config.notify_galponeros {
            for worker in self.store.list_farm_galponeros(&alarm.farm_id).await? {
                push_unique(worker, &mut recipients);
            }
        }
        Ok(recipients)
    }

    async fn deliver(
        &self,
        adapter: &dyn NotificationAdapter,
        alarm: &AlarmRow,
        recipient: &UserRow,
    ) -> DeliveryResult {
        let result =
            match tokio::time::timeout(self.send_timeout, adapter.send(alarm, recipient)).await {
                Ok(result) => result,
                Err(_) => DeliveryResult::failed(
                    &recipient.id,
                    adapter.adapter_name(),
                    format!("delivery timed out after {:?}", self.send_timeout),
                ),
            };

        if let Err(e) = self
            .store
            .insert_notification_log(
                Some(&alarm.id),
                &result.recipient_id,
                &result.adapter,
                result.status,
                result.error.as_deref(),
            )
            .await
        {
            tracing::error!(
                alarm_id = %alarm.id,
                recipient = %recipient.username,
                error = %e,
                "Failed to record notification log"
            );
        }

        match result.status {
            DeliveryStatus::Sent => tracing::info!(
                alarm_id = %alarm.id,
                recipient = %recipient.username,
                adapter = %result.adapter,
                "Notification sent"
            ),
            DeliveryStatus::Failed => tracing::warn!(
                alarm_id = %alarm.id,
                recipient = %recipient.username,
                adapter = %result.adapter,
                error = result.error.as_deref().unwrap_or("unknown"),
                "Notification failed"
            ),
        }
        result
    }
}
