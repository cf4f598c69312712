use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "alarm_configurations")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub farm_id: String,
    pub alarm_type: String,
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
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
