use async_trait::async_trait;

use avitrack_common::types::DeliveryResult;
use avitrack_storage::{AlarmRow, UserRow};

use crate::{alarm_body, alarm_title, NotificationAdapter};

/// Fallback adapter that emits the notification to the server log.
///
/// Always succeeds, which makes it the terminal link of the adapter
/// fallback chain: a deployment with no push or email configured still
/// records every notification somewhere an operator can see it.
#[derive(Debug, Default)]
pub struct LocalLogAdapter;

#[async_trait]
impl NotificationAdapter for LocalLogAdapter {
    async fn send(&self, alarm: &AlarmRow, recipient: &UserRow) -> DeliveryResult {
        tracing::info!(
            alarm_id = %alarm.id,
            recipient = %recipient.username,
            title = %alarm_title(alarm),
            body = %alarm_body(alarm),
            "Local notification"
        );
        DeliveryResult::sent(&recipient.id, self.adapter_name())
    }

    fn adapter_name(&self) -> &str {
        "local"
    }
}
