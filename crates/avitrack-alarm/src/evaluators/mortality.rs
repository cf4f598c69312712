//! Mortality-rate evaluation over recent daily records.

use chrono::NaiveDate;

use avitrack_common::types::{AlarmType, Priority};
use avitrack_storage::{AlarmConfigRow, AlarmRow, FarmRow, FarmStore, NewAlarm};

use crate::error::EvalError;
use crate::evaluators::window_start;

/// Checks every mortality record in the evaluation window against the
/// configured daily-rate threshold.
///
/// The rate denominator is the flock size before the deaths were
/// subtracted (`current_quantity + deaths`), so a record is judged
/// against the population it actually decimated. Records that would
/// divide by zero are skipped.
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
                "mortality threshold must be positive, got {}",
                config.threshold_value
            ),
        });
    }

    let start = window_start(today, config.evaluation_period_hours);
    let mut created = Vec::new();

    for flock in store.list_active_flocks_for_farm(&farm.id).await? {
        let records = store
            .list_mortality_records_in_range(&flock.id, start, today)
            .await?;
        for record in records {
            let population = flock.current_quantity + record.deaths;
            if population <= 0 {
                tracing::warn!(
                    flock_id = %flock.id,
                    record_id = %record.id,
                    "Skipping mortality record with empty flock population"
                );
                continue;
            }
            let rate = f64::from(record.deaths) / f64::from(population) * 100.0;
            if rate < config.threshold_value {
                continue;
            }

            let existing = store
                .find_open_alarm_by_source(AlarmType::Mortality, "mortality", &record.id, record.date)
                .await?;
            if existing.is_some() {
                continue;
            }

            let priority = match config.critical_threshold {
                Some(critical) if rate >= critical => Priority::High,
                _ => Priority::Medium,
            };
            let alarm = store
                .insert_alarm(&NewAlarm {
                    alarm_type: AlarmType::Mortality,
                    description: format!(
                        "Mortality rate {rate:.2}% on {date} ({deaths} deaths in a flock of {population}) exceeds threshold {threshold}%",
                        date = record.date,
                        deaths = record.deaths,
                        threshold = config.threshold_value,
                    ),
                    priority,
                    farm_id: farm.id.clone(),
                    flock_id: Some(flock.id.clone()),
                    shed_id: Some(flock.shed_id.clone()),
                    inventory_item_id: None,
                    configuration_id: Some(config.id.clone()),
                    source_type: "mortality".into(),
                    source_id: record.id.clone(),
                    source_date: record.date,
                })
                .await?;
            tracing::info!(
                alarm_id = %alarm.id,
                flock_id = %flock.id,
                rate = format!("{rate:.2}"),
                priority = %priority,
                "Mortality alarm created"
            );
            created.push(alarm);
        }
    }
    Ok(created)
}
