use anyhow::Result;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter, QuerySelect,
};
use serde::{Deserialize, Serialize};

use avitrack_common::types::AlarmType;

use crate::entities::alarm_configuration::{self, Column, Entity};
use crate::entities::farm;
use crate::store::{FarmRow, FarmStore};

/// Alarm configuration row (`alarm_configurations` table).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmConfigRow {
    pub id: String,
    pub farm_id: String,
    pub alarm_type: AlarmType,
    pub threshold_value: f64,
    pub critical_threshold: Option<f64>,
    pub evaluation_period_hours: i32,
    pub consecutive_occurrences: i32,
    pub notify_farm_manager: bool,
    pub notify_veterinarian: bool,
    pub notify_galponeros: bool,
    pub escalate_after_hours: i32,
    pub escalate_to_admin: bool,
    pub escalation_role_name: Option<String>,
    pub is_active: bool,
}

/// Defaults used when bootstrapping a configuration for a farm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmConfigDefaults {
    pub threshold_value: f64,
    pub critical_threshold: Option<f64>,
    pub evaluation_period_hours: i32,
    pub consecutive_occurrences: i32,
    pub notify_farm_manager: bool,
    pub notify_veterinarian: bool,
    pub notify_galponeros: bool,
    pub escalate_after_hours: i32,
    pub escalate_to_admin: bool,
    pub escalation_role_name: Option<String>,
}

fn to_row(m: alarm_configuration::Model) -> Result<AlarmConfigRow> {
    Ok(AlarmConfigRow {
        id: m.id,
        farm_id: m.farm_id,
        alarm_type: m.alarm_type.parse().map_err(anyhow::Error::msg)?,
        threshold_value: m.threshold_value,
        critical_threshold: m.critical_threshold,
        evaluation_period_hours: m.evaluation_period_hours,
        consecutive_occurrences: m.consecutive_occurrences,
        notify_farm_manager: m.notify_farm_manager,
        notify_veterinarian: m.notify_veterinarian,
        notify_galponeros: m.notify_galponeros,
        escalate_after_hours: m.escalate_after_hours,
        escalate_to_admin: m.escalate_to_admin,
        escalation_role_name: m.escalation_role_name,
        is_active: m.is_active,
    })
}

impl FarmStore {
    pub async fn insert_alarm_config(
        &self,
        farm_id: &str,
        alarm_type: AlarmType,
        defaults: &AlarmConfigDefaults,
    ) -> Result<AlarmConfigRow> {
        let now = Utc::now().fixed_offset();
        let am = alarm_configuration::ActiveModel {
            id: Set(avitrack_common::id::next_id()),
            farm_id: Set(farm_id.to_string()),
            alarm_type: Set(alarm_type.as_str().to_string()),
            threshold_value: Set(defaults.threshold_value),
            critical_threshold: Set(defaults.critical_threshold),
            evaluation_period_hours: Set(defaults.evaluation_period_hours),
            consecutive_occurrences: Set(defaults.consecutive_occurrences),
            notify_farm_manager: Set(defaults.notify_farm_manager),
            notify_veterinarian: Set(defaults.notify_veterinarian),
            notify_galponeros: Set(defaults.notify_galponeros),
            escalate_after_hours: Set(defaults.escalate_after_hours),
            escalate_to_admin: Set(defaults.escalate_to_admin),
            escalation_role_name: Set(defaults.escalation_role_name.clone()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        to_row(am.insert(self.db()).await?)
    }

    /// Get-or-create semantics for bootstrap tooling. Returns `(row, created)`.
    pub async fn get_or_create_alarm_config(
        &self,
        farm_id: &str,
        alarm_type: AlarmType,
        defaults: &AlarmConfigDefaults,
    ) -> Result<(AlarmConfigRow, bool)> {
        if let Some(existing) = self.find_active_config(farm_id, alarm_type).await? {
            return Ok((existing, false));
        }
        let row = self.insert_alarm_config(farm_id, alarm_type, defaults).await?;
        Ok((row, true))
    }

    pub async fn get_alarm_config(&self, id: &str) -> Result<Option<AlarmConfigRow>> {
        let model = Entity::find_by_id(id).one(self.db()).await?;
        model.map(to_row).transpose()
    }

    pub async fn find_active_config(
        &self,
        farm_id: &str,
        alarm_type: AlarmType,
    ) -> Result<Option<AlarmConfigRow>> {
        let model = Entity::find()
            .filter(Column::FarmId.eq(farm_id))
            .filter(Column::AlarmType.eq(alarm_type.as_str()))
            .filter(Column::IsActive.eq(true))
            .one(self.db())
            .await?;
        model.map(to_row).transpose()
    }

    pub async fn list_active_configs_for_farm(
        &self,
        farm_id: &str,
    ) -> Result<Vec<AlarmConfigRow>> {
        let rows = Entity::find()
            .filter(Column::FarmId.eq(farm_id))
            .filter(Column::IsActive.eq(true))
            .all(self.db())
            .await?;
        rows.into_iter().map(to_row).collect()
    }

    /// Farms that have at least one active alarm configuration.
    pub async fn list_farms_with_active_configs(&self) -> Result<Vec<FarmRow>> {
        let mut farm_ids: Vec<String> = Entity::find()
            .select_only()
            .column(Column::FarmId)
            .filter(Column::IsActive.eq(true))
            .into_tuple::<String>()
            .all(self.db())
            .await?;
        farm_ids.sort();
        farm_ids.dedup();
        if farm_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = farm::Entity::find()
            .filter(farm::Column::Id.is_in(farm_ids))
            .filter(farm::Column::IsActive.eq(true))
            .all(self.db())
            .await?;
        Ok(rows
            .into_iter()
            .map(|m| FarmRow {
                id: m.id,
                name: m.name,
                location: m.location,
                manager_id: m.manager_id,
                veterinarian_id: m.veterinarian_id,
                is_active: m.is_active,
            })
            .collect())
    }
}
