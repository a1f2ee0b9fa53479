use super::types::{ProbeOutcome, ServiceStatus};

/// Latency above which a reachable service counts as degraded.
pub const DEFAULT_DEGRADED_THRESHOLD_MS: u64 = 1000;

/// Maps a raw probe outcome to a service status.
///
/// Pure and synchronous; the only tunable is the latency threshold, HTTP
/// status ranges are fixed.
#[derive(Debug, Clone, Copy)]
pub struct Classifier {
    degraded_threshold_ms: u64,
}

impl Default for Classifier {
    fn default() -> Self {
        Self { degraded_threshold_ms: DEFAULT_DEGRADED_THRESHOLD_MS }
    }
}

impl Classifier {
    pub fn new(degraded_threshold_ms: u64) -> Self {
        Self { degraded_threshold_ms }
    }

    /// First match wins: unreachable or >= 400 is offline, redirects and
    /// slow responses (strictly above the threshold) are degraded,
    /// everything else is online.
    pub fn classify(&self, outcome: ProbeOutcome) -> ServiceStatus {
        match outcome {
            ProbeOutcome::Unreachable => ServiceStatus::Offline,
            ProbeOutcome::Reachable { http_status, .. } if http_status >= 400 => {
                ServiceStatus::Offline
            }
            ProbeOutcome::Reachable { http_status, elapsed_ms }
                if (300..=399).contains(&http_status)
                    || elapsed_ms > self.degraded_threshold_ms =>
            {
                ServiceStatus::Degraded
            }
            ProbeOutcome::Reachable { .. } => ServiceStatus::Online,
        }
    }
}
