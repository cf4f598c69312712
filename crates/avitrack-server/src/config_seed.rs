//! `init-configs` bootstrap: gives every active farm a default alarm
//! configuration per alarm type, skipping types the farm already has an
//! active configuration for.

use avitrack_common::types::AlarmType;
use avitrack_storage::{AlarmConfigDefaults, FarmStore};

use crate::config::ConfigDefaults;

pub struct SeedReport {
    pub farms: u64,
    pub created: u64,
    pub skipped: u64,
}

pub async fn seed_alarm_configs(
    store: &FarmStore,
    defaults: &ConfigDefaults,
) -> anyhow::Result<SeedReport> {
    let farms = store.list_active_farms().await?;
    let mut report = SeedReport {
        farms: farms.len() as u64,
        created: 0,
        skipped: 0,
    };

    for farm in &farms {
        for alarm_type in AlarmType::ALL {
            let (_, created) = store
                .get_or_create_alarm_config(&farm.id, alarm_type, &defaults_for(alarm_type, defaults))
                .await?;
            if created {
                report.created += 1;
                tracing::info!(farm = %farm.name, alarm_type = %alarm_type, "Alarm configuration created");
            } else {
                report.skipped += 1;
            }
        }
    }
    Ok(report)
}

fn defaults_for(alarm_type: AlarmType, d: &ConfigDefaults) -> AlarmConfigDefaults {
    let base = AlarmConfigDefaults {
        threshold_value: 0.0,
        critical_threshold: None,
        evaluation_period_hours: 24,
        consecutive_occurrences: 1,
        notify_farm_manager: true,
        notify_veterinarian: false,
        notify_galponeros: false,
        escalate_after_hours: d.escalate_after_hours,
        escalate_to_admin: true,
        escalation_role_name: None,
    };
    match alarm_type {
        AlarmType::Mortality => AlarmConfigDefaults {
            threshold_value: d.mortality_threshold_pct,
            critical_threshold: Some(d.mortality_critical_pct),
            notify_veterinarian: true,
            ..base
        },
        AlarmType::WeightDeviation => AlarmConfigDefaults {
            threshold_value: d.weight_deviation_threshold_pct,
            critical_threshold: Some(d.weight_deviation_critical_pct),
            notify_veterinarian: true,
            ..base
        },
        // Stock thresholds live on the inventory items themselves.
        AlarmType::Stock => AlarmConfigDefaults {
            notify_galponeros: true,
            ..base
        },
        AlarmType::NoRecords => AlarmConfigDefaults {
            evaluation_period_hours: d.missing_records_hours,
            notify_galponeros: true,
            ..base
        },
    }
}
