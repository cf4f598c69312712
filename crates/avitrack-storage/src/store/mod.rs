use anyhow::Result;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};

pub mod alarm;
pub mod config;
pub mod domain;
pub mod notification;

pub use alarm::{AlarmFilter, AlarmRow, DashboardCounts, EscalationRow, NewAlarm};
pub use config::{AlarmConfigDefaults, AlarmConfigRow};
pub use domain::{
    FarmRow, FlockRow, InventoryItemRow, MortalityRecordRow, NewFlock, NewInventoryItem,
    NewMortalityRecord, NewUser, NewWeightRecord, ShedRow, UserRow, WeightRecordRow,
};
pub use notification::{NotificationLogFilter, NotificationLogRow};

/// Unified access layer over the farm database.
///
/// All methods are `async fn` on top of SeaORM. The connection URL comes
/// from the server configuration, e.g. `sqlite://data/avitrack.db?mode=rwc`
/// or `sqlite::memory:` in tests.
pub struct FarmStore {
    pub(crate) db: DatabaseConnection,
}

impl FarmStore {
    /// Connect and initialize the database, running all pending migrations.
    pub async fn connect(db_url: &str) -> Result<Self> {
        let mut opts = ConnectOptions::new(db_url.to_owned());
        // An in-memory SQLite database exists per connection; the pool must
        // not open a second one.
        if db_url.contains(":memory:") || db_url.contains("mode=memory") {
            opts.max_connections(1).min_connections(1);
        }
        let db = Database::connect(opts).await?;

        // WAL mode only applies to file-backed SQLite
        if db_url.starts_with("sqlite://") && !db_url.contains(":memory:") {
            db.execute_unprepared("PRAGMA journal_mode=WAL;").await?;
        }

        Migrator::up(&db, None).await?;
        tracing::info!(db_url = %db_url, "Initialized farm store");

        Ok(Self { db })
    }

    pub(crate) fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}
