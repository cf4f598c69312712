//! Detection of flocks with no mortality reporting in the look-back window.

use chrono::NaiveDate;

use avitrack_common::types::{AlarmType, Priority};
use avitrack_storage::{AlarmConfigRow, AlarmRow, FarmRow, FarmStore, NewAlarm};

use crate::error::EvalError;
use crate::evaluators::{window_days, window_start};

/// One alarm per silent flock per day: the dedup key is the flock id
/// with today's date, so the alarm re-fires on a new day if the flock
/// stays silent, but an evaluation re-run within the day is a no-op.
pub async fn evaluate(
    store: &FarmStore,
    farm: &FarmRow,
    config: &AlarmConfigRow,
    today: NaiveDate,
) -> Result<Vec<AlarmRow>, EvalError> {
    let start = window_start(today, config.evaluation_period_hours);
    let mut created = Vec::new();

    for flock in store.list_active_flocks_for_farm(&farm.id).await? {
        // Flocks younger than the window have nothing to report yet.
        if flock.age_days_on(today) < window_days(config.evaluation_period_hours) {
            continue;
        }
        let records = store
            .list_mortality_records_in_range(&flock.id, start, today)
            .await?;
        if !records.is_empty() {
            continue;
        }

        let existing = store
            .find_open_alarm_by_source(AlarmType::NoRecords, "flock", &flock.id, today)
            .await?;
        if existing.is_some() {
            continue;
        }

        let alarm = store
            .insert_alarm(&NewAlarm {
                alarm_type: AlarmType::NoRecords,
                description: format!(
                    "No mortality records since {start} for a flock of {quantity} birds",
                    quantity = flock.current_quantity,
                ),
                priority: Priority::Medium,
                farm_id: farm.id.clone(),
                flock_id: Some(flock.id.clone()),
                shed_id: Some(flock.shed_id.clone()),
                inventory_item_id: None,
                configuration_id: Some(config.id.clone()),
                source_type: "flock".into(),
                source_id: flock.id.clone(),
                source_date: today,
            })
            .await?;
        tracing::info!(
            alarm_id = %alarm.id,
            flock_id = %flock.id,
            "Missing-records alarm created"
        );
        created.push(alarm);
    }
    Ok(created)
}
