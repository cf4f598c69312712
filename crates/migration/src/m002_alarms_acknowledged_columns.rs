use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m002_alarms_acknowledged_columns"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                "ALTER TABLE alarms ADD COLUMN acknowledged_by TEXT;
                 ALTER TABLE alarms ADD COLUMN acknowledged_at TEXT;",
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                "ALTER TABLE alarms DROP COLUMN acknowledged_by;
                 ALTER TABLE alarms DROP COLUMN acknowledged_at;",
            )
            .await?;
        Ok(())
    }
}
