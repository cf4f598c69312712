//! Evaluation engine driver: iterates farms and their active
//! configurations, dispatches to the per-type evaluators, and fans out
//! notifications for every alarm created.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use avitrack_common::types::AlarmType;
use avitrack_notify::dispatcher::NotificationDispatcher;
use avitrack_storage::{AlarmConfigRow, AlarmRow, FarmRow, FarmStore};

use crate::error::EvalError;
use crate::evaluators;

/// Outcome of evaluating one farm.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FarmEvalReport {
    pub alarms_created: u64,
    pub configs_failed: u64,
}

/// Outcome of a full evaluation sweep.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvalReport {
    pub farms_evaluated: u64,
    pub alarms_created: u64,
    pub errors: u64,
}

pub struct AlarmEngine {
    store: Arc<FarmStore>,
    dispatcher: Arc<NotificationDispatcher>,
}

impl AlarmEngine {
    pub fn new(store: Arc<FarmStore>, dispatcher: Arc<NotificationDispatcher>) -> Self {
        Self { store, dispatcher }
    }

    /// Evaluates every active farm. A farm whose sweep fails outright
    /// (storage unavailable) is counted as an error and the sweep moves
    /// on; the next tick retries it.
    pub async fn evaluate_all_farms(&self, now: DateTime<Utc>) -> EvalReport {
        let farms = match self.store.list_active_farms().await {
            Ok(farms) => farms,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list farms, aborting evaluation sweep");
                return EvalReport {
                    errors: 1,
                    ..Default::default()
                };
            }
        };

        let mut report = EvalReport::default();
        for farm in &farms {
            match self.evaluate_farm(farm, now).await {
                Ok(farm_report) => {
                    report.farms_evaluated += 1;
                    report.alarms_created += farm_report.alarms_created;
                    report.errors += farm_report.configs_failed;
                }
                Err(e) => {
                    report.errors += 1;
                    tracing::error!(farm = %farm.name, error = %e, "Farm evaluation failed");
                }
            }
        }
        tracing::info!(
            farms = report.farms_evaluated,
            created = report.alarms_created,
            errors = report.errors,
            "Evaluation sweep finished"
        );
        report
    }

    /// Runs every active configuration of one farm. Configuration and
    /// data errors are confined to their configuration; only listing the
    /// configurations themselves can fail the farm.
    pub async fn evaluate_farm(
        &self,
        farm: &FarmRow,
        now: DateTime<Utc>,
    ) -> Result<FarmEvalReport, EvalError> {
        let configs = self.store.list_active_configs_for_farm(&farm.id).await?;
        let mut report = FarmEvalReport::default();

        for config in &configs {
            match self.run_evaluator(farm, config, now).await {
                Ok(created) => {
                    report.alarms_created += created.len() as u64;
                    for alarm in &created {
                        self.dispatcher.send_alarm_notifications(alarm, config).await;
                    }
                }
                Err(e) => {
                    report.configs_failed += 1;
                    tracing::error!(
                        farm = %farm.name,
                        config_id = %config.id,
                        alarm_type = %config.alarm_type,
                        error = %e,
                        "Evaluator failed"
                    );
                }
            }
        }
        Ok(report)
    }

    async fn run_evaluator(
        &self,
        farm: &FarmRow,
        config: &AlarmConfigRow,
        now: DateTime<Utc>,
    ) -> Result<Vec<AlarmRow>, EvalError> {
        let today = now.date_naive();
        match config.alarm_type {
            AlarmType::Mortality => {
                evaluators::mortality::evaluate(&self.store, farm, config, today).await
            }
            AlarmType::Stock => evaluators::stock::evaluate(&self.store, farm, config, today).await,
            AlarmType::WeightDeviation => {
                evaluators::weight::evaluate(&self.store, farm, config, today).await
            }
            AlarmType::NoRecords => {
                evaluators::missing_records::evaluate(&self.store, farm, config, today).await
            }
        }
    }
}
