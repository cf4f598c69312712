//! Persistence layer for the AviTrack alarm engine.
//!
//! [`FarmStore`] wraps a SeaORM connection (SQLite with WAL by default,
//! PostgreSQL via connection URL) and exposes typed row structs per table.
//! All alarm mutation goes through these methods so the dedup invariants
//! stay enforced in one place, backed by partial unique indexes in the
//! schema.

pub mod entities;
pub mod store;

#[cfg(test)]
mod tests;

pub use store::{
    AlarmConfigDefaults, AlarmConfigRow, AlarmFilter, AlarmRow, DashboardCounts, EscalationRow,
    FarmRow, FarmStore, FlockRow, InventoryItemRow, MortalityRecordRow, NewAlarm, NewFlock,
    NewInventoryItem, NewMortalityRecord, NewUser, NewWeightRecord, NotificationLogFilter,
    NotificationLogRow, ShedRow, UserRow, WeightRecordRow,
};
