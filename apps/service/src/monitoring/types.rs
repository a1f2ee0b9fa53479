use serde::{Deserialize, Serialize};

/// Classified status of a monitored service.
///
/// Statuses carry no severity ordering; transitions are evaluated pairwise
/// (old vs new) by the notifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Unknown,
    Online,
    Degraded,
    Offline,
}

impl ServiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceStatus::Unknown => "unknown",
            ServiceStatus::Online => "online",
            ServiceStatus::Degraded => "degraded",
            ServiceStatus::Offline => "offline",
        }
    }

    /// Parse a stored status string, falling back to `Unknown` for anything
    /// unrecognized (older rows, manual edits).
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "online" => ServiceStatus::Online,
            "degraded" => ServiceStatus::Degraded,
            "offline" => ServiceStatus::Offline,
            _ => ServiceStatus::Unknown,
        }
    }
}

impl std::fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single reachability probe.
///
/// Transport failures and timeouts collapse into `Unreachable`; any HTTP
/// response, including 4xx/5xx, is `Reachable` with its status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Reachable { http_status: u16, elapsed_ms: u64 },
    Unreachable,
}

impl ProbeOutcome {
    /// Response time to record for this outcome, if any.
    pub fn elapsed_ms(&self) -> Option<u64> {
        match self {
            ProbeOutcome::Reachable { elapsed_ms, .. } => Some(*elapsed_ms),
            ProbeOutcome::Unreachable => None,
        }
    }
}
