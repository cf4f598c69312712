use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "alarms")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub alarm_type: String,
    pub description: String,
    pub priority: String,
    pub status: String,
    pub farm_id: String,
    pub flock_id: Option<String>,
    pub shed_id: Option<String>,
    pub inventory_item_id: Option<String>,
    pub configuration_id: Option<String>,
    pub source_type: String,
    pub source_id: String,
    pub source_date: Date,
    pub acknowledged_by: Option<String>,
    pub acknowledged_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
