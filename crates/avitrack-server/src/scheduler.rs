//! Periodic sweeps: evaluation (hourly by default) and escalation
//! (4-hourly by default). Each tick is isolated; a failed sweep is
//! logged and retried on the next tick.

use std::sync::Arc;

use chrono::Utc;
use tokio::time::{interval, Duration, MissedTickBehavior};

use avitrack_alarm::engine::AlarmEngine;
use avitrack_alarm::escalation::EscalationEngine;

pub struct EvaluationScheduler {
    engine: Arc<AlarmEngine>,
    interval_secs: u64,
}

impl EvaluationScheduler {
    pub fn new(engine: Arc<AlarmEngine>, interval_secs: u64) -> Self {
        Self {
            engine,
            interval_secs,
        }
    }

    pub async fn run(&self) {
        tracing::info!(
            interval_secs = self.interval_secs,
            "Evaluation scheduler started"
        );
        let mut tick = interval(Duration::from_secs(self.interval_secs));
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tick.tick().await;
            let report = self.engine.evaluate_all_farms(Utc::now()).await;
            if report.errors > 0 {
                tracing::warn!(errors = report.errors, "Evaluation sweep had errors");
            }
        }
    }
}

pub struct EscalationScheduler {
    engine: Arc<EscalationEngine>,
    interval_secs: u64,
}

impl EscalationScheduler {
    pub fn new(engine: Arc<EscalationEngine>, interval_secs: u64) -> Self {
        Self {
            engine,
            interval_secs,
        }
    }

    pub async fn run(&self) {
        tracing::info!(
            interval_secs = self.interval_secs,
            "Escalation scheduler started"
        );
        let mut tick = interval(Duration::from_secs(self.interval_secs));
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tick.tick().await;
            let report = self.engine.sweep(Utc::now()).await;
            if report.errors > 0 {
                tracing::warn!(errors = report.errors, "Escalation sweep had errors");
            }
        }
    }
}
