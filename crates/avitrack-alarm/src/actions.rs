//! Manual alarm actions, gated by the role capability table.
//!
//! These are the store-level primitives an API layer sits on top of.
//! Each action checks the acting user's role, then relies on the guarded
//! status transitions so a concurrent sweep can never be double-applied.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use avitrack_common::types::{AlarmAction, AlarmStatus};
use avitrack_storage::{AlarmRow, FarmStore, UserRow};

use crate::error::ActionError;

pub struct AlarmActions {
    store: Arc<FarmStore>,
}

impl AlarmActions {
    pub fn new(store: Arc<FarmStore>) -> Self {
        Self { store }
    }

    /// Records who saw the alarm. Allowed for every role, on any alarm
    /// that is not yet resolved.
    pub async fn acknowledge(
        &self,
        alarm_id: &str,
        user: &UserRow,
        now: DateTime<Utc>,
    ) -> Result<AlarmRow, ActionError> {
        let alarm = self.authorize(alarm_id, user, AlarmAction::Acknowledge).await?;
        let changed = self
            .store
            .mark_alarm_acknowledged(alarm_id, &user.id, now)
            .await?;
        if !changed {
            return Err(ActionError::InvalidTransition {
                alarm_id: alarm_id.to_string(),
                status: alarm.status,
                action: AlarmAction::Acknowledge,
            });
        }
        tracing::info!(alarm_id, user = %user.username, "Alarm acknowledged");
        self.reload(alarm_id).await
    }

    /// Closes the alarm. Valid from PENDING and ESCALATED.
    pub async fn resolve(&self, alarm_id: &str, user: &UserRow) -> Result<AlarmRow, ActionError> {
        let alarm = self.authorize(alarm_id, user, AlarmAction::Resolve).await?;
        let changed = self
            .store
            .transition_alarm(
                alarm_id,
                &[AlarmStatus::Pending, AlarmStatus::Escalated],
                AlarmStatus::Resolved,
            )
            .await?;
        if !changed {
            return Err(ActionError::InvalidTransition {
                alarm_id: alarm_id.to_string(),
                status: alarm.status,
                action: AlarmAction::Resolve,
            });
        }
        tracing::info!(alarm_id, user = %user.username, "Alarm resolved");
        self.reload(alarm_id).await
    }

    /// Escalates ahead of the automatic sweep. Valid from PENDING only.
    pub async fn escalate(
        &self,
        alarm_id: &str,
        user: &UserRow,
        reason: &str,
    ) -> Result<AlarmRow, ActionError> {
        let alarm = self.authorize(alarm_id, user, AlarmAction::Escalate).await?;
        let changed = self
            .store
            .transition_alarm(alarm_id, &[AlarmStatus::Pending], AlarmStatus::Escalated)
            .await?;
        if !changed {
            return Err(ActionError::InvalidTransition {
                alarm_id: alarm_id.to_string(),
                status: alarm.status,
                action: AlarmAction::Escalate,
            });
        }
        self.store
            .insert_escalation(alarm_id, &user.id, reason)
            .await?;
        tracing::info!(alarm_id, user = %user.username, reason, "Alarm escalated manually");
        self.reload(alarm_id).await
    }

    async fn authorize(
        &self,
        alarm_id: &str,
        user: &UserRow,
        action: AlarmAction,
    ) -> Result<AlarmRow, ActionError> {
        if !user.role.can(action) {
            return Err(ActionError::Forbidden {
                role: user.role,
                action,
            });
        }
        self.store
            .get_alarm(alarm_id)
            .await?
            .ok_or_else(|| ActionError::NotFound(alarm_id.to_string()))
    }

    async fn reload(&self, alarm_id: &str) -> Result<AlarmRow, ActionError> {
        self.store
            .get_alarm(alarm_id)
            .await?
            .ok_or_else(|| ActionError::NotFound(alarm_id.to_string()))
    }
}
