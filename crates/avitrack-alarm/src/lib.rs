//! Alarm evaluation and escalation for poultry farms.
//!
//! The [`engine::AlarmEngine`] turns daily farm signals (mortality and
//! weight records, inventory levels, reporting gaps) into persisted
//! alarms, one evaluator per alarm type. The [`escalation::EscalationEngine`]
//! sweeps alarms left unresolved past their deadline, and
//! [`actions::AlarmActions`] exposes the manual acknowledge / resolve /
//! escalate surface. All of it is idempotent by dedup key, so schedulers
//! can re-run sweeps freely.

pub mod actions;
pub mod engine;
pub mod error;
pub mod escalation;
pub mod evaluators;


pub use actions::AlarmActions;
pub use engine::{AlarmEngine, EvalReport, FarmEvalReport};
pub use error::{ActionError, EvalError};
pub use escalation::{EscalationEngine, EscalationReport};
