use serde::{Deserialize, Serialize};

use avitrack_notify::adapters::{EmailSettings, PushSettings};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// SeaORM connection URL. Defaults to a SQLite file under `data_dir`.
    #[serde(default)]
    pub database_url: Option<String>,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Evaluation sweep interval (default hourly).
    #[serde(default = "default_evaluation_interval_secs")]
    pub evaluation_interval_secs: u64,
    /// Escalation sweep interval (default every 4 hours).
    #[serde(default = "default_escalation_interval_secs")]
    pub escalation_interval_secs: u64,
    /// Escalation deadline for alarms without a configuration.
    #[serde(default = "default_escalate_after_hours")]
    pub default_escalate_after_hours: i64,

    #[serde(default)]
    pub notify: NotifyConfig,
    #[serde(default)]
    pub defaults: ConfigDefaults,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default)]
    pub push: Option<PushSettings>,
    #[serde(default)]
    pub email: Option<EmailSettings>,
    /// Upper bound on a single adapter call.
    #[serde(default = "default_send_timeout_secs")]
    pub send_timeout_secs: u64,
}

/// Default thresholds applied by `init-configs` to farms that have no
/// active configuration of a type yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigDefaults {
    #[serde(default = "default_mortality_threshold")]
    pub mortality_threshold_pct: f64,
    #[serde(default = "default_mortality_critical")]
    pub mortality_critical_pct: f64,
    #[serde(default = "default_weight_threshold")]
    pub weight_deviation_threshold_pct: f64,
    #[serde(default = "default_weight_critical")]
    pub weight_deviation_critical_pct: f64,
    #[serde(default = "default_missing_records_hours")]
    pub missing_records_hours: i32,
    #[serde(default = "default_escalate_after_hours_i32")]
    pub escalate_after_hours: i32,
}

impl Default for ConfigDefaults {
    fn default() -> Self {
        Self {
            mortality_threshold_pct: default_mortality_threshold(),
            mortality_critical_pct: default_mortality_critical(),
            weight_deviation_threshold_pct: default_weight_threshold(),
            weight_deviation_critical_pct: default_weight_critical(),
            missing_records_hours: default_missing_records_hours(),
            escalate_after_hours: default_escalate_after_hours_i32(),
        }
    }
}

fn default_data_dir() -> String {
    "./data".to_string()
}

fn default_evaluation_interval_secs() -> u64 {
    3600
}

fn default_escalation_interval_secs() -> u64 {
    4 * 3600
}

fn default_escalate_after_hours() -> i64 {
    24
}

fn default_escalate_after_hours_i32() -> i32 {
    24
}

fn default_send_timeout_secs() -> u64 {
    30
}

fn default_mortality_threshold() -> f64 {
    5.0
}

fn default_mortality_critical() -> f64 {
    10.0
}

fn default_weight_threshold() -> f64 {
    10.0
}

fn default_weight_critical() -> f64 {
    20.0
}

fn default_missing_records_hours() -> i32 {
    24
}

impl ServerConfig {
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn database_url(&self) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => format!("sqlite://{}/avitrack.db?mode=rwc", self.data_dir),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            data_dir: default_data_dir(),
            evaluation_interval_secs: default_evaluation_interval_secs(),
            escalation_interval_secs: default_escalation_interval_secs(),
            default_escalate_after_hours: default_escalate_after_hours(),
            notify: NotifyConfig::default(),
            defaults: ConfigDefaults::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_fills_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config.evaluation_interval_secs, 3600);
        assert_eq!(config.escalation_interval_secs, 4 * 3600);
        assert_eq!(config.default_escalate_after_hours, 24);
        assert!(config.notify.push.is_none());
        assert_eq!(config.database_url(), "sqlite://./data/avitrack.db?mode=rwc");
    }

    #[test]
    fn notify_sections_parse() {
        let config: ServerConfig = toml::from_str(
            r#"
            data_dir = "/var/lib/avitrack"

            [notify.push]
            endpoint = "https://fcm.googleapis.com/fcm/send"
            server_key = "secret"

            [notify.email]
            smtp_host = "smtp.example.com"
            username = "alarms"
            password = "hunter2"
            from = "alarms@example.com"

            [defaults]
            mortality_threshold_pct = 3.5
            "#,
        )
        .unwrap();
        let push = config.notify.push.unwrap();
        assert_eq!(push.endpoint, "https://fcm.googleapis.com/fcm/send");
        assert_eq!(push.timeout_secs, 10);
        let email = config.notify.email.unwrap();
        assert_eq!(email.smtp_port, 587);
        assert_eq!(config.defaults.mortality_threshold_pct, 3.5);
        assert_eq!(config.defaults.escalate_after_hours, 24);
    }
}
