use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use avitrack_common::types::{AlarmType, DeliveryResult, DeliveryStatus, Priority, Role};
use avitrack_storage::{
    AlarmConfigDefaults, AlarmRow, FarmStore, NewAlarm, NewUser, NotificationLogFilter, UserRow,
};

use crate::adapters::LocalLogAdapter;
use crate::dispatcher::NotificationDispatcher;
use crate::registry::AdapterRegistry;
use crate::NotificationAdapter;

/// Test adapter that fails for one configured recipient and succeeds
/// for everyone else.
struct FlakyAdapter {
    fail_for: String,
}

#[async_trait]
impl NotificationAdapter for FlakyAdapter {
    async fn send(&self, _alarm: &AlarmRow, recipient: &UserRow) -> DeliveryResult {
        if recipient.id == self.fail_for {
            DeliveryResult::failed(&recipient.id, self.adapter_name(), "simulated outage")
        } else {
            DeliveryResult::sent(&recipient.id, self.adapter_name())
        }
    }

    fn adapter_name(&self) -> &str {
        "push"
    }
}

struct SlowAdapter;

#[async_trait]
impl NotificationAdapter for SlowAdapter {
    async fn send(&self, _alarm: &AlarmRow, recipient: &UserRow) -> DeliveryResult {
        tokio::time::sleep(Duration::from_secs(60)).await;
        DeliveryResult::sent(&recipient.id, self.adapter_name())
    }

    fn adapter_name(&self) -> &str {
        "push"
    }
}

async fn setup() -> Arc<FarmStore> {
    avitrack_common::id::init(1, 2);
    Arc::new(FarmStore::connect("sqlite::memory:").await.unwrap())
}

async fn make_user(store: &FarmStore, username: &str, role: Role) -> UserRow {
    store
        .insert_user(&NewUser {
            username: username.to_string(),
            full_name: username.to_string(),
            role,
            email: Some(format!("{username}@example.com")),
            device_token: None,
        })
        .await
        .unwrap()
}

async fn make_alarm(store: &FarmStore, farm_id: &str) -> AlarmRow {
    store
        .insert_alarm(&NewAlarm {
            alarm_type: AlarmType::Mortality,
            description: "high mortality".into(),
            priority: Priority::High,
            farm_id: farm_id.to_string(),
            flock_id: None,
            shed_id: None,
            inventory_item_id: None,
            configuration_id: None,
            source_type: "mortality".into(),
            source_id: "flock-1".into(),
            source_date: NaiveDate::from_ymd_opt(2026, 8, 28).unwrap(),
        })
        .await
        .unwrap()
}

fn defaults(manager: bool, vet: bool, galponeros: bool) -> AlarmConfigDefaults {
    AlarmConfigDefaults {
        threshold_value: 5.0,
        critical_threshold: None,
        evaluation_period_hours: 24,
        consecutive_occurrences: 1,
        notify_farm_manager: manager,
        notify_veterinarian: vet,
        notify_galponeros: galponeros,
        escalate_after_hours: 24,
        escalate_to_admin: true,
        escalation_role_name: None,
    }
}

#[tokio::test]
async fn registry_default_prefers_push_over_local() {
    let registry = AdapterRegistry::new();
    assert_eq!(registry.default_adapter().adapter_name(), "local");

    let mut registry = AdapterRegistry::new();
    registry.register(Arc::new(FlakyAdapter {
        fail_for: String::new(),
    }));
    assert_eq!(registry.default_adapter().adapter_name(), "push");
}

#[tokio::test]
async fn registry_rejects_unknown_adapter_names() {
    let registry = AdapterRegistry::new();
    assert!(registry.get("local").is_ok());
    assert!(registry.get("carrier-pigeon").is_err());
}

#[tokio::test]
async fn local_adapter_always_succeeds() {
    let store = setup().await;
    let manager = make_user(&store, "manager", Role::FarmManager).await;
    let farm = store
        .insert_farm("granja", "Valle", &manager.id, None)
        .await
        .unwrap();
    let alarm = make_alarm(&store, &farm.id).await;

    let result = LocalLogAdapter.send(&alarm, &manager).await;
    assert_eq!(result.status, DeliveryStatus::Sent);
    assert!(result.error.is_none());
}

#[tokio::test]
async fn fan_out_resolves_recipients_and_dedups() {
    let store = setup().await;
    let manager = make_user(&store, "manager", Role::FarmManager).await;
    let vet = make_user(&store, "vet", Role::Veterinarian).await;
    let worker = make_user(&store, "worker", Role::Galponero).await;
    let farm = store
        .insert_farm("granja", "Valle", &manager.id, Some(&vet.id))
        .await
        .unwrap();
    // Two sheds assigned to the same worker: one notification only.
    store
        .insert_shed(&farm.id, "galpon-1", 1000, Some(&worker.id))
        .await
        .unwrap();
    store
        .insert_shed(&farm.id, "galpon-2", 1000, Some(&worker.id))
        .await
        .unwrap();
    let config = store
        .insert_alarm_config(&farm.id, AlarmType::Mortality, &defaults(true, true, true))
        .await
        .unwrap();
    let alarm = make_alarm(&store, &farm.id).await;

    let dispatcher = NotificationDispatcher::new(store.clone(), AdapterRegistry::new());
    let results = dispatcher.send_alarm_notifications(&alarm, &config).await;

    assert_eq!(results.len(), 3);
    let mut ids: Vec<&str> = results.iter().map(|r| r.recipient_id.as_str()).collect();
    ids.sort();
    let mut expected = vec![manager.id.as_str(), vet.id.as_str(), worker.id.as_str()];
    expected.sort();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn one_failed_recipient_does_not_stop_the_fan_out() {
    let store = setup().await;
    let manager = make_user(&store, "manager", Role::FarmManager).await;
    let vet = make_user(&store, "vet", Role::Veterinarian).await;
    let farm = store
        .insert_farm("granja", "Valle", &manager.id, Some(&vet.id))
        .await
        .unwrap();
    let config = store
        .insert_alarm_config(&farm.id, AlarmType::Mortality, &defaults(true, true, false))
        .await
        .unwrap();
    let alarm = make_alarm(&store, &farm.id).await;

    let mut registry = AdapterRegistry::new();
    registry.register(Arc::new(FlakyAdapter {
        fail_for: manager.id.clone(),
    }));
    let dispatcher = NotificationDispatcher::new(store.clone(), registry);

    let results = dispatcher.send_alarm_notifications(&alarm, &config).await;
    assert_eq!(results.len(), 2);
    let failed = results
        .iter()
        .find(|r| r.recipient_id == manager.id)
        .unwrap();
    assert_eq!(failed.status, DeliveryStatus::Failed);
    let sent = results.iter().find(|r| r.recipient_id == vet.id).unwrap();
    assert_eq!(sent.status, DeliveryStatus::Sent);
}

#[tokio::test]
async fn every_attempt_is_recorded_as_a_log_row() {
    let store = setup().await;
    let manager = make_user(&store, "manager", Role::FarmManager).await;
    let farm = store
        .insert_farm("granja", "Valle", &manager.id, None)
        .await
        .unwrap();
    let config = store
        .insert_alarm_config(&farm.id, AlarmType::Mortality, &defaults(true, false, false))
        .await
        .unwrap();
    let alarm = make_alarm(&store, &farm.id).await;

    let mut registry = AdapterRegistry::new();
    registry.register(Arc::new(FlakyAdapter {
        fail_for: manager.id.clone(),
    }));
    let dispatcher = NotificationDispatcher::new(store.clone(), registry);
    dispatcher.send_alarm_notifications(&alarm, &config).await;

    let logs = store
        .list_notification_logs(
            &NotificationLogFilter {
                alarm_id: Some(alarm.id.clone()),
                ..Default::default()
            },
            10,
            0,
        )
        .await
        .unwrap();
    assert_eq!(logs.len(), 1);
    assert_eq!(logs[0].recipient_id, manager.id);
    assert_eq!(logs[0].status, DeliveryStatus::Failed);
    assert_eq!(logs[0].notification_type, "push");
    assert_eq!(logs[0].error_message.as_deref(), Some("simulated outage"));
    assert!(logs[0].created_at <= Utc::now());
}

#[tokio::test]
async fn slow_adapter_is_cut_off_by_the_send_timeout() {
    let store = setup().await;
    let manager = make_user(&store, "manager", Role::FarmManager).await;
    let farm = store
        .insert_farm("granja", "Valle", &manager.id, None)
        .await
        .unwrap();
    let alarm = make_alarm(&store, &farm.id).await;

    let mut registry = AdapterRegistry::new();
    registry.register(Arc::new(SlowAdapter));
    let dispatcher = NotificationDispatcher::new(store.clone(), registry)
        .with_send_timeout(Duration::from_millis(50));

    let result = dispatcher
        .send_direct_notification(&alarm, &manager, None)
        .await;
    assert_eq!(result.status, DeliveryStatus::Failed);
    assert!(result.error.as_deref().unwrap_or("").contains("timed out"));
}

#[tokio::test]
async fn unknown_adapter_override_falls_back_to_default() {
    let store = setup().await;
    let manager = make_user(&store, "manager", Role::FarmManager).await;
    let farm = store
        .insert_farm("granja", "Valle", &manager.id, None)
        .await
        .unwrap();
    let alarm = make_alarm(&store, &farm.id).await;

    let dispatcher = NotificationDispatcher::new(store.clone(), AdapterRegistry::new());
    let result = dispatcher
        .send_direct_notification(&alarm, &manager, Some("carrier-pigeon"))
        .await;
    assert_eq!(result.status, DeliveryStatus::Sent);
    assert_eq!(result.adapter, "local");
}
