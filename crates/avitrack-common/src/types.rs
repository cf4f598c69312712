use serde::{Deserialize, Serialize};

/// Kind of anomaly an alarm configuration watches for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmType {
    Mortality,
    WeightDeviation,
    Stock,
    NoRecords,
}

impl AlarmType {
    pub const ALL: [AlarmType; 4] = [
        AlarmType::Mortality,
        AlarmType::WeightDeviation,
        AlarmType::Stock,
        AlarmType::NoRecords,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmType::Mortality => "MORTALITY",
            AlarmType::WeightDeviation => "WEIGHT_DEVIATION",
            AlarmType::Stock => "STOCK",
            AlarmType::NoRecords => "NO_RECORDS",
        }
    }
}

impl std::fmt::Display for AlarmType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AlarmType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MORTALITY" => Ok(AlarmType::Mortality),
            "WEIGHT_DEVIATION" => Ok(AlarmType::WeightDeviation),
            "STOCK" => Ok(AlarmType::Stock),
            "NO_RECORDS" => Ok(AlarmType::NoRecords),
            _ => Err(format!("unknown alarm type: {s}")),
        }
    }
}

/// Alarm priority, ordered from lowest to highest.
///
/// The ordering drives dashboard sorting and the critical-threshold
/// priority bump in the evaluators.
///
/// # Examples
///
/// ```
/// use avitrack_common::types::Priority;
///
/// let p: Priority = "HIGH".parse().unwrap();
/// assert_eq!(p, Priority::High);
/// assert!(Priority::Urgent > Priority::Low);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "LOW",
            Priority::Medium => "MEDIUM",
            Priority::High => "HIGH",
            Priority::Urgent => "URGENT",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOW" => Ok(Priority::Low),
            "MEDIUM" => Ok(Priority::Medium),
            "HIGH" => Ok(Priority::High),
            "URGENT" => Ok(Priority::Urgent),
            _ => Err(format!("unknown priority: {s}")),
        }
    }
}

/// Alarm lifecycle state.
///
/// Transitions: `Pending -> Resolved`, `Pending -> Escalated -> Resolved`.
/// `Resolved` is terminal; escalated alarms stay manually resolvable but
/// are excluded from re-escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlarmStatus {
    Pending,
    Escalated,
    Resolved,
}

impl AlarmStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmStatus::Pending => "PENDING",
            AlarmStatus::Escalated => "ESCALATED",
            AlarmStatus::Resolved => "RESOLVED",
        }
    }

    /// Whether an alarm in this state still needs attention.
    pub fn is_open(&self) -> bool {
        !matches!(self, AlarmStatus::Resolved)
    }
}

impl std::fmt::Display for AlarmStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AlarmStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(AlarmStatus::Pending),
            "ESCALATED" => Ok(AlarmStatus::Escalated),
            "RESOLVED" => Ok(AlarmStatus::Resolved),
            _ => Err(format!("unknown alarm status: {s}")),
        }
    }
}

/// Derived inventory supply tier, from remaining days of stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StockLevel {
    OutOfStock,
    Critical,
    Low,
    Normal,
    Unknown,
}

impl StockLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockLevel::OutOfStock => "OUT_OF_STOCK",
            StockLevel::Critical => "CRITICAL",
            StockLevel::Low => "LOW",
            StockLevel::Normal => "NORMAL",
            StockLevel::Unknown => "UNKNOWN",
        }
    }

    /// Whether this tier should keep a stock alarm alive.
    pub fn is_alarming(&self) -> bool {
        matches!(
            self,
            StockLevel::OutOfStock | StockLevel::Critical | StockLevel::Low
        )
    }
}

impl std::fmt::Display for StockLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Computed stock standing for an inventory item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockStatus {
    pub level: StockLevel,
    /// Days of supply left at the current consumption rate; `None` when
    /// there is no consumption history.
    pub days_remaining: Option<f64>,
    pub message: String,
}

/// Closed set of user roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    FarmManager,
    Veterinarian,
    Galponero,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::FarmManager => "FARM_MANAGER",
            Role::Veterinarian => "VETERINARIAN",
            Role::Galponero => "GALPONERO",
        }
    }

    /// Capability table for the alarm management surface. Resolved once at
    /// the access-control boundary; evaluators never consult roles.
    pub fn can(&self, action: AlarmAction) -> bool {
        match action {
            AlarmAction::Acknowledge => true,
            AlarmAction::Resolve => !matches!(self, Role::Galponero),
            AlarmAction::Escalate => matches!(self, Role::Admin | Role::FarmManager),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ADMIN" => Ok(Role::Admin),
            "FARM_MANAGER" => Ok(Role::FarmManager),
            "VETERINARIAN" => Ok(Role::Veterinarian),
            "GALPONERO" => Ok(Role::Galponero),
            _ => Err(format!("unknown role: {s}")),
        }
    }
}

/// Manual action on an alarm, gated by [`Role::can`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmAction {
    Acknowledge,
    Resolve,
    Escalate,
}

impl std::fmt::Display for AlarmAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AlarmAction::Acknowledge => "acknowledge",
            AlarmAction::Resolve => "resolve",
            AlarmAction::Escalate => "escalate",
        })
    }
}

/// Outcome of one delivery attempt to one recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "SENT",
            DeliveryStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single adapter `send` call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub recipient_id: String,
    pub adapter: String,
    pub status: DeliveryStatus,
    pub error: Option<String>,
}

impl DeliveryResult {
    pub fn sent(recipient_id: &str, adapter: &str) -> Self {
        Self {
            recipient_id: recipient_id.to_string(),
            adapter: adapter.to_string(),
            status: DeliveryStatus::Sent,
            error: None,
        }
    }

    pub fn failed(recipient_id: &str, adapter: &str, error: impl Into<String>) -> Self {
        Self {
            recipient_id: recipient_id.to_string(),
            adapter: adapter.to_string(),
            status: DeliveryStatus::Failed,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_ordering_drives_sort() {
        let mut prios = vec![Priority::Medium, Priority::Urgent, Priority::Low, Priority::High];
        prios.sort();
        assert_eq!(
            prios,
            vec![Priority::Low, Priority::Medium, Priority::High, Priority::Urgent]
        );
    }

    #[test]
    fn enums_round_trip_their_db_strings() {
        for t in AlarmType::ALL {
            assert_eq!(t.as_str().parse::<AlarmType>().unwrap(), t);
        }
        assert_eq!("ESCALATED".parse::<AlarmStatus>().unwrap(), AlarmStatus::Escalated);
        assert!("bogus".parse::<AlarmStatus>().is_err());
    }

    #[test]
    fn resolved_is_terminal() {
        assert!(AlarmStatus::Pending.is_open());
        assert!(AlarmStatus::Escalated.is_open());
        assert!(!AlarmStatus::Resolved.is_open());
    }

    #[test]
    fn role_capability_table() {
        assert!(Role::Galponero.can(AlarmAction::Acknowledge));
        assert!(!Role::Galponero.can(AlarmAction::Resolve));
        assert!(!Role::Veterinarian.can(AlarmAction::Escalate));
        assert!(Role::Admin.can(AlarmAction::Escalate));
        assert!(Role::FarmManager.can(AlarmAction::Resolve));
    }
}
