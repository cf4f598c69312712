//! Escalation of alarms left unresolved past their deadline.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use avitrack_common::types::{AlarmStatus, Role};
use avitrack_notify::dispatcher::NotificationDispatcher;
use avitrack_storage::{AlarmConfigRow, AlarmRow, FarmStore, UserRow};

/// Outcome of one escalation sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EscalationReport {
    pub checked: u64,
    pub escalated: u64,
    pub errors: u64,
}

/// Sweeps PENDING alarms and escalates the ones past their deadline.
///
/// The guarded PENDING → ESCALATED transition makes concurrent or
/// repeated sweeps safe: only the sweep that wins the transition writes
/// the audit row and notifies, and an alarm is never escalated twice.
pub struct EscalationEngine {
    store: Arc<FarmStore>,
    dispatcher: Arc<NotificationDispatcher>,
    default_after_hours: i64,
}

impl EscalationEngine {
    pub fn new(
        store: Arc<FarmStore>,
        dispatcher: Arc<NotificationDispatcher>,
        default_after_hours: i64,
    ) -> Self {
        Self {
            store,
            dispatcher,
            default_after_hours,
        }
    }

    pub async fn sweep(&self, now: DateTime<Utc>) -> EscalationReport {
        let pending = match self.store.list_pending_alarms().await {
            Ok(pending) => pending,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list pending alarms, aborting sweep");
                return EscalationReport {
                    errors: 1,
                    ..Default::default()
                };
            }
        };

        let mut report = EscalationReport::default();
        for alarm in &pending {
            report.checked += 1;
            match self.escalate_if_due(alarm, now).await {
                Ok(true) => report.escalated += 1,
                Ok(false) => {}
                Err(e) => {
                    report.errors += 1;
                    tracing::error!(alarm_id = %alarm.id, error = %e, "Escalation failed");
                }
            }
        }
        tracing::info!(
            checked = report.checked,
            escalated = report.escalated,
            errors = report.errors,
            "Escalation sweep finished"
        );
        report
    }

    async fn escalate_if_due(&self, alarm: &AlarmRow, now: DateTime<Utc>) -> anyhow::Result<bool> {
        let config = match alarm.configuration_id.as_deref() {
            Some(id) => self.store.get_alarm_config(id).await?,
            None => None,
        };
        let after_hours = config
            .as_ref()
            .map(|c| i64::from(c.escalate_after_hours))
            .unwrap_or(self.default_after_hours);
        if now - alarm.created_at < Duration::hours(after_hours) {
            return Ok(false);
        }

        // Resolve the target before touching the alarm: an escalation is a
        // handoff, and the audit row references a real user. With nobody to
        // hand off to, the alarm stays PENDING so the next sweep retries
        // once a target exists.
        let Some(target) = self.resolve_target(config.as_ref()).await? else {
            tracing::warn!(
                alarm_id = %alarm.id,
                "No active escalation target, leaving alarm pending"
            );
            return Ok(false);
        };

        let transitioned = self
            .store
            .transition_alarm(&alarm.id, &[AlarmStatus::Pending], AlarmStatus::Escalated)
            .await?;
        if !transitioned {
            // Another sweep (or a manual action) got there first.
            return Ok(false);
        }

        let reason = format!("unresolved for more than {after_hours} hours");
        self.store
            .insert_escalation(&alarm.id, &target.id, &reason)
            .await?;
        tracing::warn!(
            alarm_id = %alarm.id,
            target = %target.username,
            after_hours,
            "Alarm escalated"
        );

        self.dispatcher
            .send_direct_notification(alarm, &target, None)
            .await;
        Ok(true)
    }

    /// First active user holding the configured role, falling back to the
    /// first active admin when the configuration asks for it. Alarms
    /// without a configuration always hand off to an admin.
    async fn resolve_target(
        &self,
        config: Option<&AlarmConfigRow>,
    ) -> anyhow::Result<Option<UserRow>> {
        if let Some(name) = config.and_then(|c| c.escalation_role_name.as_deref()) {
            match name.parse::<Role>() {
                Ok(role) => {
                    if let Some(user) =
                        self.store.find_active_users_by_role(role).await?.into_iter().next()
                    {
                        return Ok(Some(user));
                    }
                }
                Err(e) => {
                    tracing::warn!(role = name, error = %e, "Unknown escalation role");
                }
            }
        }
        if !config.map_or(true, |c| c.escalate_to_admin) {
            return Ok(None);
        }
        Ok(self
            .store
            .find_active_users_by_role(Role::Admin)
            .await?
            .into_iter()
            .next())
    }
}
