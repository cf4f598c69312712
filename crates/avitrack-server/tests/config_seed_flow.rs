use avitrack_common::types::AlarmType;
use avitrack_server::config::ConfigDefaults;
use avitrack_server::config_seed::seed_alarm_configs;
use avitrack_storage::{FarmStore, NewUser};

async fn file_store(dir: &tempfile::TempDir) -> FarmStore {
    avitrack_common::id::init(2, 1);
    let url = format!("sqlite://{}/avitrack.db?mode=rwc", dir.path().display());
    FarmStore::connect(&url).await.unwrap()
}

#[tokio::test]
async fn seeding_creates_one_config_per_farm_per_type_and_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(&dir).await;

    let manager = store
        .insert_user(&NewUser {
            username: "manager".into(),
            full_name: "Manager".into(),
            role: avitrack_common::types::Role::FarmManager,
            email: None,
            device_token: None,
        })
        .await
        .unwrap();
    store
        .insert_farm("granja-1", "Valle", &manager.id, None)
        .await
        .unwrap();
    store
        .insert_farm("granja-2", "Cauca", &manager.id, None)
        .await
        .unwrap();

    let defaults = ConfigDefaults::default();
    let first = seed_alarm_configs(&store, &defaults).await.unwrap();
    assert_eq!(first.farms, 2);
    assert_eq!(first.created, 2 * AlarmType::ALL.len() as u64);
    assert_eq!(first.skipped, 0);

    // Re-running creates nothing new.
    let second = seed_alarm_configs(&store, &defaults).await.unwrap();
    assert_eq!(second.created, 0);
    assert_eq!(second.skipped, 2 * AlarmType::ALL.len() as u64);
}

#[tokio::test]
async fn seeded_mortality_config_carries_the_tuned_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let store = file_store(&dir).await;

    let manager = store
        .insert_user(&NewUser {
            username: "manager".into(),
            full_name: "Manager".into(),
            role: avitrack_common::types::Role::FarmManager,
            email: None,
            device_token: None,
        })
        .await
        .unwrap();
    let farm = store
        .insert_farm("granja-1", "Valle", &manager.id, None)
        .await
        .unwrap();

    let defaults = ConfigDefaults {
        mortality_threshold_pct: 3.5,
        ..ConfigDefaults::default()
    };
    seed_alarm_configs(&store, &defaults).await.unwrap();

    let config = store
        .find_active_config(&farm.id, AlarmType::Mortality)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(config.threshold_value, 3.5);
    assert!(config.notify_veterinarian);
    assert_eq!(config.escalate_after_hours, 24);
}
