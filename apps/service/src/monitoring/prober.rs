use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::debug;

use super::types::ProbeOutcome;

/// Default per-probe timeout.
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Prober trait so the scheduler can be exercised without the network.
#[async_trait::async_trait]
pub trait Probe: Send + Sync {
    /// Perform one reachability check against `host:port`.
    ///
    /// Never fails: transport errors and timeouts are part of the outcome,
    /// not errors for the caller to handle.
    async fn probe(&self, host: &str, port: u16) -> ProbeOutcome;
}

/// Build the request URL for a service target.
///
/// Scheme is inferred from the port: 443 means HTTPS, everything else is
/// plain HTTP with an explicit port.
pub fn probe_url(host: &str, port: u16) -> String {
    if port == 443 { format!("https://{host}") } else { format!("http://{host}:{port}") }
}

/// HTTP prober backed by a shared reqwest client with a bounded timeout.
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait::async_trait]
impl Probe for HttpProber {
    async fn probe(&self, host: &str, port: u16) -> ProbeOutcome {
        let url = probe_url(host, port);
        let start = Instant::now();

        match self.client.get(&url).send().await {
            // Any response counts as reachable; 4xx/5xx are for the
            // classifier to judge, not transport errors.
            Ok(response) => ProbeOutcome::Reachable {
                http_status: response.status().as_u16(),
                elapsed_ms: start.elapsed().as_millis() as u64,
            },
            Err(e) => {
                debug!(%url, error = %e, "probe unreachable");
                ProbeOutcome::Unreachable
            }
        }
    }
}
