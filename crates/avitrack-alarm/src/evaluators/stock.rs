//! Inventory supply-level evaluation.
//!
//! Stock alarms track a condition, not an event: at most one live alarm
//! exists per inventory item, its presentation follows the current tier,
//! and it auto-resolves when supply recovers. This is the only evaluator
//! that resolves alarms on its own.

use chrono::NaiveDate;

use avitrack_common::types::{AlarmStatus, AlarmType, Priority, StockLevel, StockStatus};
use avitrack_storage::{AlarmConfigRow, AlarmRow, FarmRow, FarmStore, InventoryItemRow, NewAlarm};

use crate::error::EvalError;

pub async fn evaluate(
    store: &FarmStore,
    farm: &FarmRow,
    config: &AlarmConfigRow,
    today: NaiveDate,
) -> Result<Vec<AlarmRow>, EvalError> {
    let mut created = Vec::new();

    for item in store.list_inventory_items_for_farm(&farm.id).await? {
        let status = item.stock_status();
        let open = store.find_open_stock_alarm(&item.id).await?;

        match status.level {
            StockLevel::Normal | StockLevel::Unknown => {
                if let Some(alarm) = open {
                    let resolved = store
                        .transition_alarm(
                            &alarm.id,
                            &[AlarmStatus::Pending, AlarmStatus::Escalated],
                            AlarmStatus::Resolved,
                        )
                        .await?;
                    if resolved {
                        tracing::info!(
                            alarm_id = %alarm.id,
                            item = %item.name,
                            "Stock alarm auto-resolved, supply back to normal"
                        );
                    }
                }
            }
            StockLevel::Low | StockLevel::Critical | StockLevel::OutOfStock => {
                let priority = tier_priority(status.level);
                let description = describe(&item, &status);
                match open {
                    None => {
                        let alarm = store
                            .insert_alarm(&NewAlarm {
                                alarm_type: AlarmType::Stock,
                                description,
                                priority,
                                farm_id: farm.id.clone(),
                                flock_id: None,
                                shed_id: item.shed_id.clone(),
                                inventory_item_id: Some(item.id.clone()),
                                configuration_id: Some(config.id.clone()),
                                source_type: "inventory".into(),
                                source_id: item.id.clone(),
                                source_date: today,
                            })
                            .await?;
                        tracing::info!(
                            alarm_id = %alarm.id,
                            item = %item.name,
                            level = %status.level,
                            priority = %priority,
                            "Stock alarm created"
                        );
                        created.push(alarm);
                    }
                    Some(alarm) if alarm.priority != priority || alarm.description != description => {
                        store
                            .update_alarm_presentation(&alarm.id, priority, &description, today)
                            .await?;
                        tracing::info!(
                            alarm_id = %alarm.id,
                            item = %item.name,
                            level = %status.level,
                            "Stock alarm tier updated"
                        );
                    }
                    Some(_) => {}
                }
            }
        }
    }
    Ok(created)
}

fn tier_priority(level: StockLevel) -> Priority {
    match level {
        StockLevel::OutOfStock => Priority::Urgent,
        StockLevel::Critical => Priority::High,
        _ => Priority::Medium,
    }
}

fn describe(item: &InventoryItemRow, status: &StockStatus) -> String {
    let days = match status.days_remaining {
        Some(days) => format!("{days:.1} days of supply remaining"),
        None => "supply duration unknown".to_string(),
    };
    format!(
        "{name}: {message} ({stock:.1} {unit} in stock, {days})",
        name = item.name,
        message = status.message,
        stock = item.current_stock,
        unit = item.unit,
    )
}
