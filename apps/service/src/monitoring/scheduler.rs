use std::sync::Arc;
use std::time::SystemTime;

use anyhow::Result;
use futures::StreamExt;
use tracing::{debug, error};

use super::classifier::Classifier;
use super::notifier::TransitionNotifier;
use super::prober::Probe;
use crate::database::Storage;
use crate::database::models::Service;

/// A service is due when it has never been checked, or when at least its
/// check interval has elapsed since the last check (inclusive).
pub fn is_due(service: &Service, now: SystemTime) -> bool {
    match service.last_checked {
        None => true,
        Some(last) => now
            .duration_since(last)
            .map(|elapsed| elapsed.as_secs() >= service.check_interval_seconds)
            .unwrap_or(false),
    }
}

/// Decides which services are due, fans out probes with bounded
/// concurrency, and writes results back through storage.
pub struct Scheduler {
    storage: Arc<dyn Storage>,
    prober: Arc<dyn Probe>,
    classifier: Classifier,
    notifier: Arc<TransitionNotifier>,
    max_concurrent_probes: usize,
}

impl Scheduler {
    pub fn new(
        storage: Arc<dyn Storage>,
        prober: Arc<dyn Probe>,
        classifier: Classifier,
        notifier: Arc<TransitionNotifier>,
        max_concurrent_probes: usize,
    ) -> Self {
        Self { storage, prober, classifier, notifier, max_concurrent_probes: max_concurrent_probes.max(1) }
    }

    /// One scheduling pass at `now`.
    ///
    /// A failure checking or persisting one service never aborts the batch;
    /// it is logged and the remaining services proceed. Only a failure to
    /// list services at all surfaces to the caller.
    pub async fn tick(&self, now: SystemTime) -> Result<()> {
        let services = self.storage.list_services().await?;
        let total = services.len();

        let due: Vec<Service> = services.into_iter().filter(|s| is_due(s, now)).collect();
        debug!(due = due.len(), total, "scheduler tick");

        futures::stream::iter(due)
            .for_each_concurrent(self.max_concurrent_probes, |service| async move {
                self.check_service(service, now).await;
            })
            .await;

        Ok(())
    }

    /// Probe one service and write the classified result back.
    ///
    /// Steps are strictly sequential per service: probe, classify, persist,
    /// then transition notification off the returned previous status.
    async fn check_service(&self, service: Service, now: SystemTime) {
        let Some(id) = service.id else {
            return;
        };

        let outcome = self.prober.probe(&service.host, service.port).await;
        let status = self.classifier.classify(outcome);
        let response_time_ms = outcome.elapsed_ms();

        match self.storage.update_service_status(id, status, response_time_ms, now).await {
            Ok(Some(writeback)) => {
                self.notifier
                    .on_status_written(&writeback.service, writeback.previous, status)
                    .await;
            }
            // Deleted mid-cycle; nothing to do.
            Ok(None) => debug!(service = %service.name, "service vanished before write-back"),
            Err(e) => {
                error!(service = %service.name, error = %e, "status write-back failed");
            }
        }
    }
}
