use chrono::{NaiveDate, Utc};

use avitrack_common::types::{AlarmStatus, AlarmType, DeliveryStatus, Priority, Role, StockLevel};

use crate::store::{
    AlarmConfigDefaults, AlarmFilter, FarmStore, NewAlarm, NewFlock, NewInventoryItem, NewUser,
    NotificationLogFilter,
};

async fn setup() -> FarmStore {
    avitrack_common::id::init(1, 1);
    FarmStore::connect("sqlite::memory:").await.unwrap()
}

fn stock_defaults() -> AlarmConfigDefaults {
    AlarmConfigDefaults {
        threshold_value: 0.0,
        critical_threshold: None,
        evaluation_period_hours: 24,
        consecutive_occurrences: 1,
        notify_farm_manager: true,
        notify_veterinarian: false,
        notify_galponeros: true,
        escalate_after_hours: 24,
        escalate_to_admin: true,
        escalation_role_name: None,
    }
}

async fn make_farm(store: &FarmStore, name: &str) -> (String, String) {
    let manager = store
        .insert_user(&NewUser {
            username: format!("{name}-manager"),
            full_name: "Manager".into(),
            role: Role::FarmManager,
            email: Some(format!("{name}@example.com")),
            device_token: None,
        })
        .await
        .unwrap();
    let farm = store
        .insert_farm(name, "Valle del Cauca", &manager.id, None)
        .await
        .unwrap();
    (farm.id, manager.id)
}

fn mortality_alarm(farm_id: &str, source_id: &str, date: NaiveDate) -> NewAlarm {
    NewAlarm {
        alarm_type: AlarmType::Mortality,
        description: "high mortality".into(),
        priority: Priority::Medium,
        farm_id: farm_id.to_string(),
        flock_id: None,
        shed_id: None,
        inventory_item_id: None,
        configuration_id: None,
        source_type: "mortality".into(),
        source_id: source_id.to_string(),
        source_date: date,
    }
}

#[tokio::test]
async fn config_get_or_create_is_idempotent() {
    let store = setup().await;
    let (farm_id, _) = make_farm(&store, "granja-1").await;

    let (first, created) = store
        .get_or_create_alarm_config(&farm_id, AlarmType::Stock, &stock_defaults())
        .await
        .unwrap();
    assert!(created);

    let (second, created) = store
        .get_or_create_alarm_config(&farm_id, AlarmType::Stock, &stock_defaults())
        .await
        .unwrap();
    assert!(!created);
    assert_eq!(first.id, second.id);

    let configs = store.list_active_configs_for_farm(&farm_id).await.unwrap();
    assert_eq!(configs.len(), 1);
}

#[tokio::test]
async fn open_alarm_dedup_index_rejects_duplicates() {
    let store = setup().await;
    let (farm_id, _) = make_farm(&store, "granja-2").await;
    let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

    store
        .insert_alarm(&mortality_alarm(&farm_id, "rec-1", date))
        .await
        .unwrap();

    // Same dedup key while the first alarm is open must be rejected by the
    // partial unique index.
    let dup = store
        .insert_alarm(&mortality_alarm(&farm_id, "rec-1", date))
        .await;
    assert!(dup.is_err());

    // A different source id is a different occurrence.
    store
        .insert_alarm(&mortality_alarm(&farm_id, "rec-2", date))
        .await
        .unwrap();
}

#[tokio::test]
async fn resolved_alarm_frees_the_dedup_key() {
    let store = setup().await;
    let (farm_id, _) = make_farm(&store, "granja-3").await;
    let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

    let alarm = store
        .insert_alarm(&mortality_alarm(&farm_id, "rec-1", date))
        .await
        .unwrap();
    let moved = store
        .transition_alarm(
            &alarm.id,
            &[AlarmStatus::Pending, AlarmStatus::Escalated],
            AlarmStatus::Resolved,
        )
        .await
        .unwrap();
    assert!(moved);

    // The index only covers non-resolved rows.
    store
        .insert_alarm(&mortality_alarm(&farm_id, "rec-1", date))
        .await
        .unwrap();
}

#[tokio::test]
async fn transition_guard_blocks_invalid_source_states() {
    let store = setup().await;
    let (farm_id, manager_id) = make_farm(&store, "granja-4").await;
    let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let alarm = store
        .insert_alarm(&mortality_alarm(&farm_id, "rec-1", date))
        .await
        .unwrap();

    // Pending -> Escalated works once.
    assert!(store
        .transition_alarm(&alarm.id, &[AlarmStatus::Pending], AlarmStatus::Escalated)
        .await
        .unwrap());
    // Re-escalation is a no-op: the row is no longer PENDING.
    assert!(!store
        .transition_alarm(&alarm.id, &[AlarmStatus::Pending], AlarmStatus::Escalated)
        .await
        .unwrap());

    // Escalated alarms remain resolvable.
    assert!(store
        .transition_alarm(
            &alarm.id,
            &[AlarmStatus::Pending, AlarmStatus::Escalated],
            AlarmStatus::Resolved,
        )
        .await
        .unwrap());

    // No transition out of RESOLVED, and no acknowledging it either.
    assert!(!store
        .transition_alarm(
            &alarm.id,
            &[AlarmStatus::Pending, AlarmStatus::Escalated],
            AlarmStatus::Escalated,
        )
        .await
        .unwrap());
    assert!(!store
        .mark_alarm_acknowledged(&alarm.id, &manager_id, Utc::now())
        .await
        .unwrap());
}

#[tokio::test]
async fn stock_alarm_single_liveness_per_item() {
    let store = setup().await;
    let (farm_id, _) = make_farm(&store, "granja-5").await;
    let item = store
        .insert_inventory_item(&NewInventoryItem {
            farm_id: farm_id.clone(),
            shed_id: None,
            name: "Concentrado".into(),
            unit: "KG".into(),
            current_stock: 10.0,
            daily_avg_consumption: 8.0,
            alert_threshold_days: 5,
            critical_threshold_days: 2,
        })
        .await
        .unwrap();

    let today = Utc::now().date_naive();
    let mut new = mortality_alarm(&farm_id, &item.id, today);
    new.alarm_type = AlarmType::Stock;
    new.source_type = "inventory".into();
    new.inventory_item_id = Some(item.id.clone());
    store.insert_alarm(&new).await.unwrap();

    let open = store.find_open_stock_alarm(&item.id).await.unwrap();
    assert!(open.is_some());

    // A second open alarm for the same item violates the partial index,
    // even on a different date.
    let mut second = new.clone();
    second.source_date = today.succ_opt().unwrap();
    assert!(store.insert_alarm(&second).await.is_err());
}

#[tokio::test]
async fn stock_status_tiers() {
    let store = setup().await;
    let (farm_id, _) = make_farm(&store, "granja-6").await;
    let mut item = store
        .insert_inventory_item(&NewInventoryItem {
            farm_id,
            shed_id: None,
            name: "Maíz".into(),
            unit: "KG".into(),
            current_stock: 100.0,
            daily_avg_consumption: 10.0,
            alert_threshold_days: 5,
            critical_threshold_days: 2,
        })
        .await
        .unwrap();

    assert_eq!(item.stock_status().level, StockLevel::Normal);

    item.current_stock = 40.0; // 4 days left
    assert_eq!(item.stock_status().level, StockLevel::Low);

    item.current_stock = 15.0; // 1.5 days left
    assert_eq!(item.stock_status().level, StockLevel::Critical);

    item.current_stock = 0.0;
    assert_eq!(item.stock_status().level, StockLevel::OutOfStock);

    item.current_stock = 50.0;
    item.daily_avg_consumption = 0.0;
    assert_eq!(item.stock_status().level, StockLevel::Unknown);
}

#[tokio::test]
async fn breed_reference_snaps_to_closest_lower_age() {
    let store = setup().await;
    store.insert_breed_reference("Ross 308", 7, 180.0).await.unwrap();
    store.insert_breed_reference("Ross 308", 14, 480.0).await.unwrap();
    store.insert_breed_reference("Ross 308", 21, 950.0).await.unwrap();

    assert_eq!(
        store.expected_weight_for("Ross 308", 16).await.unwrap(),
        Some(480.0)
    );
    assert_eq!(
        store.expected_weight_for("Ross 308", 21).await.unwrap(),
        Some(950.0)
    );
    assert_eq!(store.expected_weight_for("Ross 308", 3).await.unwrap(), None);
    assert_eq!(store.expected_weight_for("Cobb 500", 16).await.unwrap(), None);
}

#[tokio::test]
async fn notification_logs_filter_by_alarm_and_status() {
    let store = setup().await;
    let (farm_id, manager_id) = make_farm(&store, "granja-7").await;
    let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let alarm = store
        .insert_alarm(&mortality_alarm(&farm_id, "rec-1", date))
        .await
        .unwrap();

    store
        .insert_notification_log(Some(&alarm.id), &manager_id, "push", DeliveryStatus::Sent, None)
        .await
        .unwrap();
    store
        .insert_notification_log(
            Some(&alarm.id),
            &manager_id,
            "email",
            DeliveryStatus::Failed,
            Some("smtp timeout"),
        )
        .await
        .unwrap();

    let all = store
        .list_notification_logs(
            &NotificationLogFilter {
                alarm_id: Some(alarm.id.clone()),
                ..Default::default()
            },
            50,
            0,
        )
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let failed = store
        .list_notification_logs(
            &NotificationLogFilter {
                alarm_id: Some(alarm.id.clone()),
                status: Some(DeliveryStatus::Failed),
                ..Default::default()
            },
            50,
            0,
        )
        .await
        .unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].error_message.as_deref(), Some("smtp timeout"));
}

#[tokio::test]
async fn dashboard_counts_group_by_status_priority_type() {
    let store = setup().await;
    let (farm_id, _) = make_farm(&store, "granja-8").await;
    let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();

    let a = store
        .insert_alarm(&mortality_alarm(&farm_id, "rec-1", date))
        .await
        .unwrap();
    let mut high = mortality_alarm(&farm_id, "rec-2", date);
    high.priority = Priority::High;
    store.insert_alarm(&high).await.unwrap();
    store
        .transition_alarm(&a.id, &[AlarmStatus::Pending], AlarmStatus::Escalated)
        .await
        .unwrap();

    let counts = store.dashboard_counts().await.unwrap();
    assert_eq!(counts.total, 2);
    assert_eq!(counts.by_status.get("PENDING"), Some(&1));
    assert_eq!(counts.by_status.get("ESCALATED"), Some(&1));
    assert_eq!(counts.by_priority.get("MEDIUM"), Some(&1));
    assert_eq!(counts.by_priority.get("HIGH"), Some(&1));
    assert_eq!(counts.by_type.get("MORTALITY"), Some(&2));

    let filtered = store
        .list_alarms(
            &AlarmFilter {
                farm_id: Some(farm_id),
                status: Some(AlarmStatus::Pending),
                ..Default::default()
            },
            50,
            0,
        )
        .await
        .unwrap();
    assert_eq!(filtered.len(), 1);
}

#[tokio::test]
async fn galponeros_resolve_from_shed_assignments() {
    let store = setup().await;
    let (farm_id, _) = make_farm(&store, "granja-9").await;
    let w1 = store
        .insert_user(&NewUser {
            username: "galponero-1".into(),
            full_name: "Worker One".into(),
            role: Role::Galponero,
            email: None,
            device_token: Some("tok-1".into()),
        })
        .await
        .unwrap();
    let w2 = store
        .insert_user(&NewUser {
            username: "galponero-2".into(),
            full_name: "Worker Two".into(),
            role: Role::Galponero,
            email: None,
            device_token: None,
        })
        .await
        .unwrap();

    store.insert_shed(&farm_id, "Galpón A", 5000, Some(&w1.id)).await.unwrap();
    store.insert_shed(&farm_id, "Galpón B", 5000, Some(&w1.id)).await.unwrap();
    store.insert_shed(&farm_id, "Galpón C", 5000, Some(&w2.id)).await.unwrap();
    store.insert_shed(&farm_id, "Galpón D", 5000, None).await.unwrap();

    let workers = store.list_farm_galponeros(&farm_id).await.unwrap();
    assert_eq!(workers.len(), 2, "duplicate assignments collapse");
}

#[tokio::test]
async fn flock_queries_scope_to_farm() {
    let store = setup().await;
    let (farm_a, _) = make_farm(&store, "granja-10a").await;
    let (farm_b, _) = make_farm(&store, "granja-10b").await;
    let shed_a = store.insert_shed(&farm_a, "Galpón A", 5000, None).await.unwrap();
    let shed_b = store.insert_shed(&farm_b, "Galpón B", 5000, None).await.unwrap();

    let arrival = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
    store
        .insert_flock(&NewFlock {
            shed_id: shed_a.id.clone(),
            arrival_date: arrival,
            initial_quantity: 500,
            current_quantity: 500,
            breed: "Ross 308".into(),
        })
        .await
        .unwrap();
    store
        .insert_flock(&NewFlock {
            shed_id: shed_b.id,
            arrival_date: arrival,
            initial_quantity: 800,
            current_quantity: 800,
            breed: "Cobb 500".into(),
        })
        .await
        .unwrap();

    let flocks_a = store.list_flocks_for_farm(&farm_a).await.unwrap();
    assert_eq!(flocks_a.len(), 1);
    assert_eq!(flocks_a[0].shed_id, shed_a.id);
}
