use avitrack_common::types::{AlarmAction, AlarmStatus, Role};
use thiserror::Error;

/// Failure of a single evaluator run.
///
/// Config and data errors are isolated per configuration by the engine
/// driver; only storage errors abort a farm sweep.
#[derive(Debug, Error)]
pub enum EvalError {
    #[error("invalid configuration {config_id}: {reason}")]
    Config { config_id: String, reason: String },

    #[error("bad signal data for {entity}: {reason}")]
    Data { entity: String, reason: String },

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

/// Failure of a manual alarm action (acknowledge / resolve / escalate).
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("alarm {0} not found")]
    NotFound(String),

    #[error("role {role} may not {action}")]
    Forbidden { role: Role, action: AlarmAction },

    #[error("alarm {alarm_id} is {status}, cannot {action}")]
    InvalidTransition {
        alarm_id: String,
        status: AlarmStatus,
        action: AlarmAction,
    },

    #[error("storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
