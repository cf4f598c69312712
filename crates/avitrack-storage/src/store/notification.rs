use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};

use avitrack_common::types::DeliveryStatus;

use crate::entities::notification_log::{self, Column, Entity};
use crate::store::FarmStore;

/// Delivery attempt row (`notification_logs` table, append-only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationLogRow {
    pub id: String,
    pub alarm_id: Option<String>,
    pub recipient_id: String,
    pub notification_type: String,
    pub status: DeliveryStatus,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NotificationLogFilter {
    pub alarm_id: Option<String>,
    pub recipient_id: Option<String>,
    pub status: Option<DeliveryStatus>,
}

fn to_row(m: notification_log::Model) -> Result<NotificationLogRow> {
    let status = match m.status.as_str() {
        "SENT" => DeliveryStatus::Sent,
        "FAILED" => DeliveryStatus::Failed,
        other => anyhow::bail!("unknown delivery status: {other}"),
    };
    Ok(NotificationLogRow {
        id: m.id,
        alarm_id: m.alarm_id,
        recipient_id: m.recipient_id,
        notification_type: m.notification_type,
        status,
        error_message: m.error_message,
        created_at: m.created_at.with_timezone(&Utc),
    })
}

impl FarmStore {
    pub async fn insert_notification_log(
        &self,
        alarm_id: Option<&str>,
        recipient_id: &str,
        notification_type: &str,
        status: DeliveryStatus,
        error_message: Option<&str>,
    ) -> Result<NotificationLogRow> {
        let am = notification_log::ActiveModel {
            id: Set(avitrack_common::id::next_id()),
            alarm_id: Set(alarm_id.map(str::to_string)),
            recipient_id: Set(recipient_id.to_string()),
            notification_type: Set(notification_type.to_string()),
            status: Set(status.as_str().to_string()),
            error_message: Set(error_message.map(str::to_string)),
            created_at: Set(Utc::now().fixed_offset()),
        };
        to_row(am.insert(self.db()).await?)
    }

    pub async fn list_notification_logs(
        &self,
        filter: &NotificationLogFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<NotificationLogRow>> {
        let rows = Self::filtered_logs(filter)
            .order_by(Column::CreatedAt, Order::Desc)
            .limit(limit)
            .offset(offset)
            .all(self.db())
            .await?;
        rows.into_iter().map(to_row).collect()
    }

    pub async fn count_notification_logs(&self, filter: &NotificationLogFilter) -> Result<u64> {
        Ok(Self::filtered_logs(filter).count(self.db()).await?)
    }

    fn filtered_logs(filter: &NotificationLogFilter) -> sea_orm::Select<Entity> {
        let mut q = Entity::find();
        if let Some(alarm_id) = &filter.alarm_id {
            q = q.filter(Column::AlarmId.eq(alarm_id));
        }
        if let Some(recipient_id) = &filter.recipient_id {
            q = q.filter(Column::RecipientId.eq(recipient_id));
        }
        if let Some(status) = filter.status {
            q = q.filter(Column::Status.eq(status.as_str()));
        }
        q
    }
}
