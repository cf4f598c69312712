//! Server wiring: configuration, schedulers, and bootstrap tooling for
//! the alarm engine.

pub mod config;
pub mod config_seed;
pub mod scheduler;
