use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::monitoring::types::ServiceStatus;

/// A monitored network endpoint owned by a user.
///
/// Monitoring state (`status`, `response_time_ms`, `last_checked`) is
/// mutated exclusively by the scheduler's write-back; everything else is
/// edited through CRUD.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: Option<i64>,
    pub user_id: i64,
    pub name: String,
    pub host: String,
    pub port: u16,
    /// Seconds between checks; always > 0 (enforced at creation).
    pub check_interval_seconds: u64,
    pub status: ServiceStatus,
    pub response_time_ms: Option<u64>,
    /// None until the first check; interpreted by the scheduler as
    /// "due immediately".
    pub last_checked: Option<SystemTime>,
    pub created_at: SystemTime,
}

impl Service {
    pub fn new(user_id: i64, name: String, host: String, port: u16) -> Self {
        Self {
            id: None,
            user_id,
            name,
            host,
            port,
            check_interval_seconds: 60,
            status: ServiceStatus::Unknown,
            response_time_ms: None,
            last_checked: None,
            created_at: SystemTime::now(),
        }
    }

    /// Convert SystemTime to unix seconds for storage
    pub fn timestamp_to_i64(time: SystemTime) -> i64 {
        time.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs() as i64
    }

    /// Convert unix seconds back to SystemTime
    pub fn i64_to_timestamp(timestamp: i64) -> SystemTime {
        UNIX_EPOCH + std::time::Duration::from_secs(timestamp.max(0) as u64)
    }
}

/// Directed dependency edge between two services.
///
/// Its status is always a pure function of the two endpoint statuses at the
/// last propagation pass; it holds no independent truth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConnection {
    pub id: Option<i64>,
    pub user_id: i64,
    pub source_id: i64,
    pub target_id: i64,
    pub status: ServiceStatus,
}

impl ServiceConnection {
    pub fn new(user_id: i64, source_id: i64, target_id: i64) -> Self {
        Self { id: None, user_id, source_id, target_id, status: ServiceStatus::Unknown }
    }
}

/// Kind of alert raised on a qualifying status transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    StatusChange,
    Recovery,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::StatusChange => "status_change",
            AlertKind::Recovery => "recovery",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "recovery" => AlertKind::Recovery,
            _ => AlertKind::StatusChange,
        }
    }
}

impl std::fmt::Display for AlertKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable alert record; only the externally-owned `acknowledged` flag
/// ever changes after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Option<i64>,
    pub user_id: i64,
    pub service_id: i64,
    pub kind: AlertKind,
    pub message: String,
    pub timestamp: SystemTime,
    pub acknowledged: bool,
}

impl Alert {
    pub fn new(user_id: i64, service_id: i64, kind: AlertKind, message: String) -> Self {
        Self {
            id: None,
            user_id,
            service_id,
            kind,
            message,
            timestamp: SystemTime::now(),
            acknowledged: false,
        }
    }
}
