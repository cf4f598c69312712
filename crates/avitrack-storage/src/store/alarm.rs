use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use avitrack_common::types::{AlarmStatus, AlarmType, Priority};

use crate::entities::alarm::{self, Column, Entity};
use crate::entities::alarm_escalation;
use crate::store::FarmStore;

/// Alarm row (`alarms` table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmRow {
    pub id: String,
    pub alarm_type: AlarmType,
    pub description: String,
    pub priority: Priority,
    pub status: AlarmStatus,
    pub farm_id: String,
    pub flock_id: Option<String>,
    pub shed_id: Option<String>,
    pub inventory_item_id: Option<String>,
    pub configuration_id: Option<String>,
    pub source_type: String,
    pub source_id: String,
    pub source_date: NaiveDate,
    pub acknowledged_by: Option<String>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new alarm; status starts at PENDING.
#[derive(Debug, Clone)]
pub struct NewAlarm {
    pub alarm_type: AlarmType,
    pub description: String,
    pub priority: Priority,
    pub farm_id: String,
    pub flock_id: Option<String>,
    pub shed_id: Option<String>,
    pub inventory_item_id: Option<String>,
    pub configuration_id: Option<String>,
    pub source_type: String,
    pub source_id: String,
    pub source_date: NaiveDate,
}

/// Escalation audit row (`alarm_escalations` table, append-only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationRow {
    pub id: String,
    pub alarm_id: String,
    pub escalated_to: String,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

/// Listing filter for the management surface.
#[derive(Debug, Clone, Default)]
pub struct AlarmFilter {
    pub farm_id: Option<String>,
    pub status: Option<AlarmStatus>,
    pub priority: Option<Priority>,
    pub alarm_type: Option<AlarmType>,
}

/// Dashboard aggregates, counted over all alarms.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardCounts {
    pub total: u64,
    pub by_status: HashMap<String, u64>,
    pub by_priority: HashMap<String, u64>,
    pub by_type: HashMap<String, u64>,
}

fn to_row(m: alarm::Model) -> Result<AlarmRow> {
    Ok(AlarmRow {
        id: m.id,
        alarm_type: m.alarm_type.parse().map_err(anyhow::Error::msg)?,
        description: m.description,
        priority: m.priority.parse().map_err(anyhow::Error::msg)?,
        status: m.status.parse().map_err(anyhow::Error::msg)?,
        farm_id: m.farm_id,
        flock_id: m.flock_id,
        shed_id: m.shed_id,
        inventory_item_id: m.inventory_item_id,
        configuration_id: m.configuration_id,
        source_type: m.source_type,
        source_id: m.source_id,
        source_date: m.source_date,
        acknowledged_by: m.acknowledged_by,
        acknowledged_at: m.acknowledged_at.map(|t| t.with_timezone(&Utc)),
        created_at: m.created_at.with_timezone(&Utc),
    })
}

fn to_escalation(m: alarm_escalation::Model) -> EscalationRow {
    EscalationRow {
        id: m.id,
        alarm_id: m.alarm_id,
        escalated_to: m.escalated_to,
        reason: m.reason,
        created_at: m.created_at.with_timezone(&Utc),
    }
}

impl FarmStore {
    pub async fn insert_alarm(&self, new: &NewAlarm) -> Result<AlarmRow> {
        let now = Utc::now().fixed_offset();
        let am = alarm::ActiveModel {
            id: Set(avitrack_common::id::next_id()),
            alarm_type: Set(new.alarm_type.as_str().to_string()),
            description: Set(new.description.clone()),
            priority: Set(new.priority.as_str().to_string()),
            status: Set(AlarmStatus::Pending.as_str().to_string()),
            farm_id: Set(new.farm_id.clone()),
            flock_id: Set(new.flock_id.clone()),
            shed_id: Set(new.shed_id.clone()),
            inventory_item_id: Set(new.inventory_item_id.clone()),
            configuration_id: Set(new.configuration_id.clone()),
            source_type: Set(new.source_type.clone()),
            source_id: Set(new.source_id.clone()),
            source_date: Set(new.source_date),
            acknowledged_by: Set(None),
            acknowledged_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        to_row(am.insert(self.db()).await?)
    }

    pub async fn get_alarm(&self, id: &str) -> Result<Option<AlarmRow>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        model.map(to_row).transpose()
    }

    /// Non-resolved alarm matching the unified dedup key, if any.
    pub async fn find_open_alarm_by_source(
        &self,
        alarm_type: AlarmType,
        source_type: &str,
        source_id: &str,
        source_date: NaiveDate,
    ) -> Result<Option<AlarmRow>> {
        let model = Entity::find()
            .filter(Column::AlarmType.eq(alarm_type.as_str()))
            .filter(Column::SourceType.eq(source_type))
            .filter(Column::SourceId.eq(source_id))
            .filter(Column::SourceDate.eq(source_date))
            .filter(Column::Status.ne(AlarmStatus::Resolved.as_str()))
            .one(self.db())
            .await?;
        model.map(to_row).transpose()
    }

    /// Non-resolved STOCK alarm for an inventory item. Stock identity is the
    /// item, not a dated occurrence.
    pub async fn find_open_stock_alarm(&self, inventory_item_id: &str) -> Result<Option<AlarmRow>> {
        let model = Entity::find()
            .filter(Column::AlarmType.eq(AlarmType::Stock.as_str()))
            .filter(Column::InventoryItemId.eq(inventory_item_id))
            .filter(Column::Status.ne(AlarmStatus::Resolved.as_str()))
            .one(self.db())
            .await?;
        model.map(to_row).transpose()
    }

    /// In-place update used when a live stock alarm changes tier.
    pub async fn update_alarm_presentation(
        &self,
        id: &str,
        priority: Priority,
        description: &str,
        source_date: NaiveDate,
    ) -> Result<()> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        if let Some(m) = model {
            let mut am: alarm::ActiveModel = m.into();
            am.priority = Set(priority.as_str().to_string());
            am.description = Set(description.to_string());
            am.source_date = Set(source_date);
            am.updated_at = Set(Utc::now().fixed_offset());
            am.update(self.db()).await?;
        }
        Ok(())
    }

    /// Guarded state transition: moves the alarm to `to` only when its
    /// current status is one of `from`. Returns whether a row changed,
    /// which makes repeated sweeps no-ops on already-transitioned alarms.
    pub async fn transition_alarm(
        &self,
        id: &str,
        from: &[AlarmStatus],
        to: AlarmStatus,
    ) -> Result<bool> {
        let from_strs: Vec<&str> = from.iter().map(AlarmStatus::as_str).collect();
        let res = Entity::update_many()
            .col_expr(Column::Status, Expr::value(to.as_str()))
            .col_expr(Column::UpdatedAt, Expr::value(Utc::now().fixed_offset()))
            .filter(Column::Id.eq(id))
            .filter(Column::Status.is_in(from_strs))
            .exec(self.db())
            .await?;
        Ok(res.rows_affected > 0)
    }

    /// Record who acknowledged an alarm. Rejected on resolved alarms by the
    /// status filter; returns whether a row changed.
    pub async fn mark_alarm_acknowledged(
        &self,
        id: &str,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let res = Entity::update_many()
            .col_expr(Column::AcknowledgedBy, Expr::value(user_id))
            .col_expr(Column::AcknowledgedAt, Expr::value(now.fixed_offset()))
            .col_expr(Column::UpdatedAt, Expr::value(now.fixed_offset()))
            .filter(Column::Id.eq(id))
            .filter(Column::Status.ne(AlarmStatus::Resolved.as_str()))
            .exec(self.db())
            .await?;
        Ok(res.rows_affected > 0)
    }

    /// All alarms still in PENDING, oldest first, for the escalation sweep.
    pub async fn list_pending_alarms(&self) -> Result<Vec<AlarmRow>> {
        let rows = Entity::find()
            .filter(Column::Status.eq(AlarmStatus::Pending.as_str()))
            .order_by(Column::CreatedAt, Order::Asc)
            .all(self.db())
            .await?;
        rows.into_iter().map(to_row).collect()
    }

    pub async fn list_alarms(
        &self,
        filter: &AlarmFilter,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<AlarmRow>> {
        let rows = Self::filtered(filter)
            .order_by(Column::CreatedAt, Order::Desc)
            .limit(limit)
            .offset(offset)
            .all(self.db())
            .await?;
        rows.into_iter().map(to_row).collect()
    }

    pub async fn count_alarms(&self, filter: &AlarmFilter) -> Result<u64> {
        Ok(Self::filtered(filter).count(self.db()).await?)
    }

    fn filtered(filter: &AlarmFilter) -> sea_orm::Select<Entity> {
        let mut q = Entity::find();
        if let Some(farm_id) = &filter.farm_id {
            q = q.filter(Column::FarmId.eq(farm_id));
        }
        if let Some(status) = filter.status {
            q = q.filter(Column::Status.eq(status.as_str()));
        }
        if let Some(priority) = filter.priority {
            q = q.filter(Column::Priority.eq(priority.as_str()));
        }
        if let Some(alarm_type) = filter.alarm_type {
            q = q.filter(Column::AlarmType.eq(alarm_type.as_str()));
        }
        q
    }

    pub async fn dashboard_counts(&self) -> Result<DashboardCounts> {
        let total = Entity::find().count(self.db()).await?;
        let by_status = self.grouped_counts(Column::Status).await?;
        let by_priority = self.grouped_counts(Column::Priority).await?;
        let by_type = self.grouped_counts(Column::AlarmType).await?;
        Ok(DashboardCounts {
            total,
            by_status,
            by_priority,
            by_type,
        })
    }

    async fn grouped_counts(&self, column: Column) -> Result<HashMap<String, u64>> {
        let rows: Vec<(String, i64)> = Entity::find()
            .select_only()
            .column(column)
            .column_as(Column::Id.count(), "cnt")
            .group_by(column)
            .into_tuple()
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(|(k, v)| (k, v as u64)).collect())
    }

    // ---- alarm_escalations ----

    pub async fn insert_escalation(
        &self,
        alarm_id: &str,
        escalated_to: &str,
        reason: &str,
    ) -> Result<EscalationRow> {
        let am = alarm_escalation::ActiveModel {
            id: Set(avitrack_common::id::next_id()),
            alarm_id: Set(alarm_id.to_string()),
            escalated_to: Set(escalated_to.to_string()),
            reason: Set(reason.to_string()),
            created_at: Set(Utc::now().fixed_offset()),
        };
        Ok(to_escalation(am.insert(self.db()).await?))
    }

    pub async fn list_escalations_for_alarm(&self, alarm_id: &str) -> Result<Vec<EscalationRow>> {
        let rows = alarm_escalation::Entity::find()
            .filter(alarm_escalation::Column::AlarmId.eq(alarm_id))
            .order_by(alarm_escalation::Column::CreatedAt, Order::Asc)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(to_escalation).collect())
    }
}
