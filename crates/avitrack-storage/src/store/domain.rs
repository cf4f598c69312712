//! Read-mostly queries over the domain signal tables (farms, sheds, flocks,
//! daily records, inventory). The alarm engine only reads these; the insert
//! methods exist for bootstrap tooling and test fixtures.

use anyhow::Result;
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, EntityTrait, Order, QueryFilter, QueryOrder,
    QuerySelect,
};
use serde::{Deserialize, Serialize};

use avitrack_common::types::{Role, StockLevel, StockStatus};

use crate::entities::{
    breed_weight_reference, farm, flock, inventory_item, mortality_record, shed, user,
    weight_record,
};
use crate::store::FarmStore;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub device_token: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub email: Option<String>,
    pub device_token: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FarmRow {
    pub id: String,
    pub name: String,
    pub location: String,
    pub manager_id: String,
    pub veterinarian_id: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShedRow {
    pub id: String,
    pub farm_id: String,
    pub name: String,
    pub capacity: i32,
    pub assigned_worker_id: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlockRow {
    pub id: String,
    pub shed_id: String,
    pub arrival_date: NaiveDate,
    pub initial_quantity: i32,
    pub current_quantity: i32,
    pub breed: String,
    pub status: String,
}

impl FlockRow {
    pub fn age_days_on(&self, date: NaiveDate) -> i64 {
        (date - self.arrival_date).num_days()
    }
}

#[derive(Debug, Clone)]
pub struct NewFlock {
    pub shed_id: String,
    pub arrival_date: NaiveDate,
    pub initial_quantity: i32,
    pub current_quantity: i32,
    pub breed: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MortalityRecordRow {
    pub id: String,
    pub flock_id: String,
    pub date: NaiveDate,
    pub deaths: i32,
    pub cause: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewMortalityRecord {
    pub flock_id: String,
    pub date: NaiveDate,
    pub deaths: i32,
    pub cause: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightRecordRow {
    pub id: String,
    pub flock_id: String,
    pub date: NaiveDate,
    pub avg_weight_grams: f64,
    pub sample_size: i32,
}

#[derive(Debug, Clone)]
pub struct NewWeightRecord {
    pub flock_id: String,
    pub date: NaiveDate,
    pub avg_weight_grams: f64,
    pub sample_size: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItemRow {
    pub id: String,
    pub farm_id: String,
    pub shed_id: Option<String>,
    pub name: String,
    pub unit: String,
    pub current_stock: f64,
    pub daily_avg_consumption: f64,
    pub alert_threshold_days: i32,
    pub critical_threshold_days: i32,
    pub last_restock_date: Option<NaiveDate>,
}

impl InventoryItemRow {
    /// Derive the supply tier from remaining days of stock.
    pub fn stock_status(&self) -> StockStatus {
        if self.current_stock <= 0.0 {
            return StockStatus {
                level: StockLevel::OutOfStock,
                days_remaining: Some(0.0),
                message: "out of stock".to_string(),
            };
        }
        if self.daily_avg_consumption <= 0.0 {
            return StockStatus {
                level: StockLevel::Unknown,
                days_remaining: None,
                message: "no consumption history".to_string(),
            };
        }
        let days = self.current_stock / self.daily_avg_consumption;
        let level = if days <= f64::from(self.critical_threshold_days) {
            StockLevel::Critical
        } else if days <= f64::from(self.alert_threshold_days) {
            StockLevel::Low
        } else {
            StockLevel::Normal
        };
        StockStatus {
            level,
            days_remaining: Some(days),
            message: format!("{days:.1} days of supply left"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewInventoryItem {
    pub farm_id: String,
    pub shed_id: Option<String>,
    pub name: String,
    pub unit: String,
    pub current_stock: f64,
    pub daily_avg_consumption: f64,
    pub alert_threshold_days: i32,
    pub critical_threshold_days: i32,
}

fn to_user(m: user::Model) -> Result<UserRow> {
    Ok(UserRow {
        id: m.id,
        username: m.username,
        full_name: m.full_name,
        role: m.role.parse().map_err(anyhow::Error::msg)?,
        email: m.email,
        phone: m.phone,
        device_token: m.device_token,
        is_active: m.is_active,
    })
}

fn to_farm(m: farm::Model) -> FarmRow {
    FarmRow {
        id: m.id,
        name: m.name,
        location: m.location,
        manager_id: m.manager_id,
        veterinarian_id: m.veterinarian_id,
        is_active: m.is_active,
    }
}

fn to_shed(m: shed::Model) -> ShedRow {
    ShedRow {
        id: m.id,
        farm_id: m.farm_id,
        name: m.name,
        capacity: m.capacity,
        assigned_worker_id: m.assigned_worker_id,
        is_active: m.is_active,
    }
}

fn to_flock(m: flock::Model) -> FlockRow {
    FlockRow {
        id: m.id,
        shed_id: m.shed_id,
        arrival_date: m.arrival_date,
        initial_quantity: m.initial_quantity,
        current_quantity: m.current_quantity,
        breed: m.breed,
        status: m.status,
    }
}

fn to_mortality(m: mortality_record::Model) -> MortalityRecordRow {
    MortalityRecordRow {
        id: m.id,
        flock_id: m.flock_id,
        date: m.date,
        deaths: m.deaths,
        cause: m.cause,
    }
}

fn to_weight(m: weight_record::Model) -> WeightRecordRow {
    WeightRecordRow {
        id: m.id,
        flock_id: m.flock_id,
        date: m.date,
        avg_weight_grams: m.avg_weight_grams,
        sample_size: m.sample_size,
    }
}

fn to_item(m: inventory_item::Model) -> InventoryItemRow {
    InventoryItemRow {
        id: m.id,
        farm_id: m.farm_id,
        shed_id: m.shed_id,
        name: m.name,
        unit: m.unit,
        current_stock: m.current_stock,
        daily_avg_consumption: m.daily_avg_consumption,
        alert_threshold_days: m.alert_threshold_days,
        critical_threshold_days: m.critical_threshold_days,
        last_restock_date: m.last_restock_date,
    }
}

impl FarmStore {
    // ---- users ----

    pub async fn insert_user(&self, new: &NewUser) -> Result<UserRow> {
        let now = Utc::now().fixed_offset();
        let am = user::ActiveModel {
            id: Set(avitrack_common::id::next_id()),
            username: Set(new.username.clone()),
            full_name: Set(new.full_name.clone()),
            role: Set(new.role.as_str().to_string()),
            email: Set(new.email.clone()),
            phone: Set(None),
            device_token: Set(new.device_token.clone()),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        to_user(am.insert(self.db()).await?)
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<UserRow>> {
        let model = user::Entity::find_by_id(id).one(self.db()).await?;
        model.map(to_user).transpose()
    }

    pub async fn find_active_users_by_role(&self, role: Role) -> Result<Vec<UserRow>> {
        let rows = user::Entity::find()
            .filter(user::Column::Role.eq(role.as_str()))
            .filter(user::Column::IsActive.eq(true))
            .order_by(user::Column::Username, Order::Asc)
            .all(self.db())
            .await?;
        rows.into_iter().map(to_user).collect()
    }

    // ---- farms & sheds ----

    pub async fn insert_farm(
        &self,
        name: &str,
        location: &str,
        manager_id: &str,
        veterinarian_id: Option<&str>,
    ) -> Result<FarmRow> {
        let now = Utc::now().fixed_offset();
        let am = farm::ActiveModel {
            id: Set(avitrack_common::id::next_id()),
            name: Set(name.to_string()),
            location: Set(location.to_string()),
            manager_id: Set(manager_id.to_string()),
            veterinarian_id: Set(veterinarian_id.map(str::to_string)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(to_farm(am.insert(self.db()).await?))
    }

    pub async fn get_farm(&self, id: &str) -> Result<Option<FarmRow>> {
        let model = farm::Entity::find_by_id(id).one(self.db()).await?;
        Ok(model.map(to_farm))
    }

    pub async fn list_active_farms(&self) -> Result<Vec<FarmRow>> {
        let rows = farm::Entity::find()
            .filter(farm::Column::IsActive.eq(true))
            .order_by(farm::Column::Name, Order::Asc)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(to_farm).collect())
    }

    pub async fn insert_shed(
        &self,
        farm_id: &str,
        name: &str,
        capacity: i32,
        assigned_worker_id: Option<&str>,
    ) -> Result<ShedRow> {
        let now = Utc::now().fixed_offset();
        let am = shed::ActiveModel {
            id: Set(avitrack_common::id::next_id()),
            farm_id: Set(farm_id.to_string()),
            name: Set(name.to_string()),
            capacity: Set(capacity),
            assigned_worker_id: Set(assigned_worker_id.map(str::to_string)),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(to_shed(am.insert(self.db()).await?))
    }

    pub async fn get_shed(&self, id: &str) -> Result<Option<ShedRow>> {
        let model = shed::Entity::find_by_id(id).one(self.db()).await?;
        Ok(model.map(to_shed))
    }

    pub async fn list_sheds_for_farm(&self, farm_id: &str) -> Result<Vec<ShedRow>> {
        let rows = shed::Entity::find()
            .filter(shed::Column::FarmId.eq(farm_id))
            .filter(shed::Column::IsActive.eq(true))
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(to_shed).collect())
    }

    /// Distinct workers assigned to the farm's active sheds.
    pub async fn list_farm_galponeros(&self, farm_id: &str) -> Result<Vec<UserRow>> {
        let mut worker_ids: Vec<String> = shed::Entity::find()
            .select_only()
            .column(shed::Column::AssignedWorkerId)
            .filter(shed::Column::FarmId.eq(farm_id))
            .filter(shed::Column::IsActive.eq(true))
            .filter(shed::Column::AssignedWorkerId.is_not_null())
            .into_tuple::<Option<String>>()
            .all(self.db())
            .await?
            .into_iter()
            .flatten()
            .collect();
        worker_ids.sort();
        worker_ids.dedup();
        if worker_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = user::Entity::find()
            .filter(user::Column::Id.is_in(worker_ids))
            .filter(user::Column::IsActive.eq(true))
            .all(self.db())
            .await?;
        rows.into_iter().map(to_user).collect()
    }

    // ---- flocks & daily records ----

    pub async fn insert_flock(&self, new: &NewFlock) -> Result<FlockRow> {
        let now = Utc::now().fixed_offset();
        let am = flock::ActiveModel {
            id: Set(avitrack_common::id::next_id()),
            shed_id: Set(new.shed_id.clone()),
            arrival_date: Set(new.arrival_date),
            initial_quantity: Set(new.initial_quantity),
            current_quantity: Set(new.current_quantity),
            breed: Set(new.breed.clone()),
            status: Set("ACTIVE".to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(to_flock(am.insert(self.db()).await?))
    }

    pub async fn update_flock_quantity(&self, flock_id: &str, current_quantity: i32) -> Result<()> {
        let model = flock::Entity::find_by_id(flock_id).one(self.db()).await?;
        if let Some(m) = model {
            let mut am: flock::ActiveModel = m.into();
            am.current_quantity = Set(current_quantity);
            am.updated_at = Set(Utc::now().fixed_offset());
            am.update(self.db()).await?;
        }
        Ok(())
    }

    pub async fn get_flock(&self, id: &str) -> Result<Option<FlockRow>> {
        let model = flock::Entity::find_by_id(id).one(self.db()).await?;
        Ok(model.map(to_flock))
    }

    /// All flocks housed in the farm's sheds, regardless of status.
    pub async fn list_flocks_for_farm(&self, farm_id: &str) -> Result<Vec<FlockRow>> {
        let shed_ids: Vec<String> = shed::Entity::find()
            .select_only()
            .column(shed::Column::Id)
            .filter(shed::Column::FarmId.eq(farm_id))
            .into_tuple::<String>()
            .all(self.db())
            .await?;
        if shed_ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = flock::Entity::find()
            .filter(flock::Column::ShedId.is_in(shed_ids))
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(to_flock).collect())
    }

    pub async fn list_active_flocks_for_farm(&self, farm_id: &str) -> Result<Vec<FlockRow>> {
        let flocks = self.list_flocks_for_farm(farm_id).await?;
        Ok(flocks.into_iter().filter(|f| f.status == "ACTIVE").collect())
    }

    pub async fn insert_mortality_record(
        &self,
        new: &NewMortalityRecord,
    ) -> Result<MortalityRecordRow> {
        let now = Utc::now().fixed_offset();
        let am = mortality_record::ActiveModel {
            id: Set(avitrack_common::id::next_id()),
            flock_id: Set(new.flock_id.clone()),
            date: Set(new.date),
            deaths: Set(new.deaths),
            cause: Set(new.cause.clone()),
            notes: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(to_mortality(am.insert(self.db()).await?))
    }

    pub async fn list_mortality_records_in_range(
        &self,
        flock_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<MortalityRecordRow>> {
        let rows = mortality_record::Entity::find()
            .filter(mortality_record::Column::FlockId.eq(flock_id))
            .filter(mortality_record::Column::Date.gte(start))
            .filter(mortality_record::Column::Date.lte(end))
            .order_by(mortality_record::Column::Date, Order::Asc)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(to_mortality).collect())
    }

    pub async fn insert_weight_record(&self, new: &NewWeightRecord) -> Result<WeightRecordRow> {
        let now = Utc::now().fixed_offset();
        let am = weight_record::ActiveModel {
            id: Set(avitrack_common::id::next_id()),
            flock_id: Set(new.flock_id.clone()),
            date: Set(new.date),
            avg_weight_grams: Set(new.avg_weight_grams),
            sample_size: Set(new.sample_size),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(to_weight(am.insert(self.db()).await?))
    }

    pub async fn list_weight_records_in_range(
        &self,
        flock_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WeightRecordRow>> {
        let rows = weight_record::Entity::find()
            .filter(weight_record::Column::FlockId.eq(flock_id))
            .filter(weight_record::Column::Date.gte(start))
            .filter(weight_record::Column::Date.lte(end))
            .order_by(weight_record::Column::Date, Order::Asc)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(to_weight).collect())
    }

    // ---- breed weight references ----

    pub async fn insert_breed_reference(
        &self,
        breed: &str,
        age_days: i32,
        expected_weight_grams: f64,
    ) -> Result<()> {
        let am = breed_weight_reference::ActiveModel {
            id: Set(avitrack_common::id::next_id()),
            breed: Set(breed.to_string()),
            age_days: Set(age_days),
            expected_weight_grams: Set(expected_weight_grams),
        };
        am.insert(self.db()).await?;
        Ok(())
    }

    /// Reference weight for the closest tabulated age at or below `age_days`.
    pub async fn expected_weight_for(
        &self,
        breed: &str,
        age_days: i32,
    ) -> Result<Option<f64>> {
        let row = breed_weight_reference::Entity::find()
            .filter(breed_weight_reference::Column::Breed.eq(breed))
            .filter(breed_weight_reference::Column::AgeDays.lte(age_days))
            .order_by(breed_weight_reference::Column::AgeDays, Order::Desc)
            .one(self.db())
            .await?;
        Ok(row.map(|r| r.expected_weight_grams))
    }

    // ---- inventory ----

    pub async fn insert_inventory_item(&self, new: &NewInventoryItem) -> Result<InventoryItemRow> {
        let now = Utc::now().fixed_offset();
        let am = inventory_item::ActiveModel {
            id: Set(avitrack_common::id::next_id()),
            farm_id: Set(new.farm_id.clone()),
            shed_id: Set(new.shed_id.clone()),
            name: Set(new.name.clone()),
            unit: Set(new.unit.clone()),
            current_stock: Set(new.current_stock),
            daily_avg_consumption: Set(new.daily_avg_consumption),
            alert_threshold_days: Set(new.alert_threshold_days),
            critical_threshold_days: Set(new.critical_threshold_days),
            last_restock_date: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(to_item(am.insert(self.db()).await?))
    }

    pub async fn update_inventory_stock(&self, item_id: &str, current_stock: f64) -> Result<()> {
        let model = inventory_item::Entity::find_by_id(item_id)
            .one(self.db())
            .await?;
        if let Some(m) = model {
            let mut am: inventory_item::ActiveModel = m.into();
            am.current_stock = Set(current_stock);
            am.updated_at = Set(Utc::now().fixed_offset());
            am.update(self.db()).await?;
        }
        Ok(())
    }

    pub async fn get_inventory_item(&self, id: &str) -> Result<Option<InventoryItemRow>> {
        let model = inventory_item::Entity::find_by_id(id).one(self.db()).await?;
        Ok(model.map(to_item))
    }

    pub async fn list_inventory_items_for_farm(
        &self,
        farm_id: &str,
    ) -> Result<Vec<InventoryItemRow>> {
        let rows = inventory_item::Entity::find()
            .filter(inventory_item::Column::FarmId.eq(farm_id))
            .order_by(inventory_item::Column::Name, Order::Asc)
            .all(self.db())
            .await?;
        Ok(rows.into_iter().map(to_item).collect())
    }
}
