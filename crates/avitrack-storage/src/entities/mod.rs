pub mod alarm;
pub mod alarm_configuration;
pub mod alarm_escalation;
pub mod breed_weight_reference;
pub mod farm;
pub mod flock;
pub mod inventory_item;
pub mod mortality_record;
pub mod notification_log;
pub mod shed;
pub mod user;
pub mod weight_record;
