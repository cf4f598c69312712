//! Notification delivery for alarm events, with pluggable adapter support.
//!
//! Alarms are fanned out to role-based recipients by the
//! [`dispatcher::NotificationDispatcher`], which resolves recipients from the
//! alarm configuration's notify flags and records every attempt as a
//! NotificationLog row. Built-in adapters: push (FCM-style HTTP), email
//! (SMTP), and a local-log fallback that never fails.

pub mod adapters;
pub mod dispatcher;
pub mod error;
pub mod registry;

#[cfg(test)]
mod tests;

use async_trait::async_trait;
use avitrack_common::types::DeliveryResult;
use avitrack_storage::{AlarmRow, UserRow};

/// A delivery channel for alarm notifications.
///
/// `send` is infallible by contract: transport failures are reported in the
/// returned [`DeliveryResult`], never raised, so one broken channel can
/// never abort an evaluation sweep.
#[async_trait]
pub trait NotificationAdapter: Send + Sync {
    /// Delivers the alarm to a single recipient.
    async fn send(&self, alarm: &AlarmRow, recipient: &UserRow) -> DeliveryResult;

    /// Adapter type name (e.g. `"push"`, `"email"`, `"local"`).
    fn adapter_name(&self) -> &str;
}

/// One-line summary used as the notification title.
pub(crate) fn alarm_title(alarm: &AlarmRow) -> String {
    format!("[avitrack][{}] {} alarm", alarm.priority, alarm.alarm_type)
}

/// Plain-text notification body.
pub(crate) fn alarm_body(alarm: &AlarmRow) -> String {
    format!(
        "Priority: {priority}\nStatus: {status}\nDetail: {description}\nDetected: {date}",
        priority = alarm.priority,
        status = alarm.status,
        description = alarm.description,
        date = alarm.source_date,
    )
}
