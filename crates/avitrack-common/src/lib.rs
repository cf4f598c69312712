//! Shared types for the AviTrack alarm engine: domain enums, priority and
//! state-machine definitions, and process-wide ID generation.

pub mod id;
pub mod types;
