use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m001_initial_schema"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Tables in dependency order
        manager.get_connection().execute_unprepared(UP_SQL).await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(DOWN_SQL)
            .await?;
        Ok(())
    }
}

const UP_SQL: &str = "
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY NOT NULL,
    username TEXT NOT NULL UNIQUE,
    full_name TEXT NOT NULL DEFAULT '',
    role TEXT NOT NULL,
    email TEXT,
    phone TEXT,
    device_token TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_users_role ON users(role);

CREATE TABLE IF NOT EXISTS farms (
    id TEXT PRIMARY KEY NOT NULL,
    name TEXT NOT NULL UNIQUE,
    location TEXT NOT NULL DEFAULT '',
    manager_id TEXT NOT NULL REFERENCES users(id),
    veterinarian_id TEXT REFERENCES users(id),
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS sheds (
    id TEXT PRIMARY KEY NOT NULL,
    farm_id TEXT NOT NULL REFERENCES farms(id),
    name TEXT NOT NULL,
    capacity INTEGER NOT NULL DEFAULT 0,
    assigned_worker_id TEXT REFERENCES users(id),
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_sheds_farm_id ON sheds(farm_id);

CREATE TABLE IF NOT EXISTS flocks (
    id TEXT PRIMARY KEY NOT NULL,
    shed_id TEXT NOT NULL REFERENCES sheds(id),
    arrival_date TEXT NOT NULL,
    initial_quantity INTEGER NOT NULL,
    current_quantity INTEGER NOT NULL,
    breed TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'ACTIVE',
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_flocks_shed_id ON flocks(shed_id);
CREATE INDEX IF NOT EXISTS idx_flocks_status ON flocks(status);

CREATE TABLE IF NOT EXISTS mortality_records (
    id TEXT PRIMARY KEY NOT NULL,
    flock_id TEXT NOT NULL REFERENCES flocks(id),
    date TEXT NOT NULL,
    deaths INTEGER NOT NULL,
    cause TEXT,
    notes TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (flock_id, date)
);
CREATE INDEX IF NOT EXISTS idx_mortality_flock_date ON mortality_records(flock_id, date);

CREATE TABLE IF NOT EXISTS weight_records (
    id TEXT PRIMARY KEY NOT NULL,
    flock_id TEXT NOT NULL REFERENCES flocks(id),
    date TEXT NOT NULL,
    avg_weight_grams REAL NOT NULL,
    sample_size INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE (flock_id, date)
);
CREATE INDEX IF NOT EXISTS idx_weight_flock_date ON weight_records(flock_id, date);

CREATE TABLE IF NOT EXISTS breed_weight_references (
    id TEXT PRIMARY KEY NOT NULL,
    breed TEXT NOT NULL,
    age_days INTEGER NOT NULL,
    expected_weight_grams REAL NOT NULL,
    UNIQUE (breed, age_days)
);

CREATE TABLE IF NOT EXISTS inventory_items (
    id TEXT PRIMARY KEY NOT NULL,
    farm_id TEXT NOT NULL REFERENCES farms(id),
    shed_id TEXT REFERENCES sheds(id),
    name TEXT NOT NULL,
    unit TEXT NOT NULL DEFAULT 'KG',
    current_stock REAL NOT NULL DEFAULT 0,
    daily_avg_consumption REAL NOT NULL DEFAULT 0,
    alert_threshold_days INTEGER NOT NULL DEFAULT 5,
    critical_threshold_days INTEGER NOT NULL DEFAULT 2,
    last_restock_date TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_inventory_farm_id ON inventory_items(farm_id);

CREATE TABLE IF NOT EXISTS alarm_configurations (
    id TEXT PRIMARY KEY NOT NULL,
    farm_id TEXT NOT NULL REFERENCES farms(id),
    alarm_type TEXT NOT NULL,
    threshold_value REAL NOT NULL,
    critical_threshold REAL,
    evaluation_period_hours INTEGER NOT NULL DEFAULT 24,
    consecutive_occurrences INTEGER NOT NULL DEFAULT 1,
    notify_farm_manager INTEGER NOT NULL DEFAULT 1,
    notify_veterinarian INTEGER NOT NULL DEFAULT 0,
    notify_galponeros INTEGER NOT NULL DEFAULT 0,
    escalate_after_hours INTEGER NOT NULL DEFAULT 24,
    escalate_to_admin INTEGER NOT NULL DEFAULT 1,
    escalation_role_name TEXT,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
-- At most one active configuration per (farm, alarm_type)
CREATE UNIQUE INDEX IF NOT EXISTS uq_alarm_configs_farm_type_active
    ON alarm_configurations(farm_id, alarm_type) WHERE is_active = 1;

CREATE TABLE IF NOT EXISTS alarms (
    id TEXT PRIMARY KEY NOT NULL,
    alarm_type TEXT NOT NULL,
    description TEXT NOT NULL,
    priority TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'PENDING',
    farm_id TEXT NOT NULL REFERENCES farms(id),
    flock_id TEXT,
    shed_id TEXT,
    inventory_item_id TEXT,
    configuration_id TEXT,
    source_type TEXT NOT NULL,
    source_id TEXT NOT NULL,
    source_date TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_alarms_farm_status ON alarms(farm_id, status);
CREATE INDEX IF NOT EXISTS idx_alarms_status_created ON alarms(status, created_at);
-- Dedup invariant: no two open alarms share the same source occurrence.
-- Closes the race between concurrent evaluators for the same record.
CREATE UNIQUE INDEX IF NOT EXISTS uq_alarms_open_source
    ON alarms(alarm_type, source_type, source_id, source_date)
    WHERE status != 'RESOLVED';
-- Stock single-liveness: at most one open alarm per inventory item.
CREATE UNIQUE INDEX IF NOT EXISTS uq_alarms_open_inventory_item
    ON alarms(alarm_type, inventory_item_id)
    WHERE status != 'RESOLVED' AND inventory_item_id IS NOT NULL;

CREATE TABLE IF NOT EXISTS alarm_escalations (
    id TEXT PRIMARY KEY NOT NULL,
    alarm_id TEXT NOT NULL REFERENCES alarms(id),
    escalated_to TEXT NOT NULL REFERENCES users(id),
    reason TEXT NOT NULL,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_escalations_alarm_id ON alarm_escalations(alarm_id);

CREATE TABLE IF NOT EXISTS notification_logs (
    id TEXT PRIMARY KEY NOT NULL,
    alarm_id TEXT,
    recipient_id TEXT NOT NULL,
    notification_type TEXT NOT NULL,
    status TEXT NOT NULL,
    error_message TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_notification_logs_alarm ON notification_logs(alarm_id);
CREATE INDEX IF NOT EXISTS idx_notification_logs_recipient ON notification_logs(recipient_id);
CREATE INDEX IF NOT EXISTS idx_notification_logs_created ON notification_logs(created_at DESC);
";

const DOWN_SQL: &str = "
DROP TABLE IF EXISTS notification_logs;
DROP TABLE IF EXISTS alarm_escalations;
DROP TABLE IF EXISTS alarms;
DROP TABLE IF EXISTS alarm_configurations;
DROP TABLE IF EXISTS inventory_items;
DROP TABLE IF EXISTS breed_weight_references;
DROP TABLE IF EXISTS weight_records;
DROP TABLE IF EXISTS mortality_records;
DROP TABLE IF EXISTS flocks;
DROP TABLE IF EXISTS sheds;
DROP TABLE IF EXISTS farms;
DROP TABLE IF EXISTS users;
";
