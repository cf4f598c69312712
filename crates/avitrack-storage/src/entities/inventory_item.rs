use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "inventory_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub farm_id: String,
    pub shed_id: Option<String>,
    pub name: String,
    pub unit: String,
    pub current_stock: f64,
    pub daily_avg_consumption: f64,
    pub alert_threshold_days: i32,
    pub critical_threshold_days: i32,
    pub last_restock_date: Option<Date>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
