//! Weight-deviation evaluation against breed reference curves.

use chrono::NaiveDate;

use avitrack_common::types::{AlarmType, Priority};
use avitrack_storage::{AlarmConfigRow, AlarmRow, FarmRow, FarmStore, NewAlarm};

use crate::error::EvalError;
use crate::evaluators::window_start;

/// Compares each weight record in the window against the expected weight
/// for the flock's breed at the record's age. Records whose breed has no
/// tabulated reference are skipped with a log line; one unknown breed
/// must not stall the rest of the batch.
pub async fn evaluate(
    store: &FarmStore,
    farm: &FarmRow,
    config: &AlarmConfigRow,
    today: NaiveDate,
) -> Result<Vec<AlarmRow>, EvalError> {
    if config.threshold_value <= 0.0 {
        return Err(EvalError::Config {
            config_id: config.id.clone(),
            reason: format!(
                "deviation threshold must be positive, got {}",
                config.threshold_value
            ),
        });
    }

    let start = window_start(today, config.evaluation_period_hours);
    let mut created = Vec::new();

    for flock in store.list_active_flocks_for_farm(&farm.id).await? {
        let records = store
            .list_weight_records_in_range(&flock.id, start, today)
            .await?;
        for record in records {
            let age_days = flock.age_days_on(record.date);
            if age_days < 0 {
                tracing::warn!(
                    flock_id = %flock.id,
                    record_id = %record.id,
                    "Skipping weight record dated before flock arrival"
                );
                continue;
            }
            let Some(expected) = store
                .expected_weight_for(&flock.breed, age_days as i32)
                .await?
            else {
                tracing::warn!(
                    flock_id = %flock.id,
                    breed = %flock.breed,
                    age_days,
                    "No breed weight reference, skipping record"
                );
                continue;
            };
            if expected <= 0.0 {
                continue;
            }
            let deviation = (record.avg_weight_grams - expected).abs() / expected * 100.0;
            if deviation < config.threshold_value {
                continue;
            }

            let existing = store
                .find_open_alarm_by_source(
                    AlarmType::WeightDeviation,
                    "weight",
                    &record.id,
                    record.date,
                )
                .await?;
            if existing.is_some() {
                continue;
            }

            let priority = match config.critical_threshold {
                Some(critical) if deviation >= critical => Priority::High,
                _ => Priority::Medium,
            };
            let alarm = store
                .insert_alarm(&NewAlarm {
                    alarm_type: AlarmType::WeightDeviation,
                    description: format!(
                        "Average weight {avg:.0}g deviates {deviation:.1}% from the {breed} reference of {expected:.0}g at {age_days} days",
                        avg = record.avg_weight_grams,
                        breed = flock.breed,
                    ),
                    priority,
                    farm_id: farm.id.clone(),
                    flock_id: Some(flock.id.clone()),
                    shed_id: Some(flock.shed_id.clone()),
                    inventory_item_id: None,
                    configuration_id: Some(config.id.clone()),
                    source_type: "weight".into(),
                    source_id: record.id.clone(),
                    source_date: record.date,
                })
                .await?;
            tracing::info!(
                alarm_id = %alarm.id,
                flock_id = %flock.id,
                deviation = format!("{deviation:.1}"),
                priority = %priority,
                "Weight deviation alarm created"
            );
            created.push(alarm);
        }
    }
    Ok(created)
}
