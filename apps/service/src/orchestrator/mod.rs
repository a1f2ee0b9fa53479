/// Orchestrator - wires the monitoring components together and drives the
/// periodic loop
///
/// One repeating timer invokes the scheduler and then the connection
/// propagator, fully decoupled from any request-handling surface. The
/// first tick fires immediately at startup; overlapping fires are skipped
/// rather than run concurrently.


use std::sync::Arc;
use std::time::{Duration, SystemTime};

use anyhow::Result;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

use crate::config::Config;
use crate::database::{LibsqlStorage, Storage, initialize_database};
use crate::monitoring::notifier::{NotificationSink, NullSink, WebhookSink};
use crate::monitoring::prober::{HttpProber, Probe};
use crate::monitoring::{Classifier, ConnectionPropagator, Scheduler, TransitionNotifier};
use crate::pool::LibsqlPool;

pub struct Orchestrator {
    config: Arc<Config>,
    scheduler: Scheduler,
    propagator: ConnectionPropagator,
}

impl Orchestrator {
    /// Create and run an orchestrator until the process exits.
    pub async fn start(config: Config, pool: LibsqlPool) -> Result<()> {
        let orchestrator = Self::new(config, pool).await?;
        orchestrator.run().await
    }

    async fn new(config: Config, pool: LibsqlPool) -> Result<Self> {
        let conn = pool.get().await?;
        info!("Initializing database schema...");
        initialize_database(&conn).await?;
        drop(conn);

        let storage: Arc<dyn Storage> = Arc::new(LibsqlStorage::new_from_pool(pool));

        let prober: Arc<dyn Probe> = Arc::new(HttpProber::new(Duration::from_secs(
            config.monitoring.probe_timeout_seconds,
        ))?);

        let sink: Arc<dyn NotificationSink> = match &config.notifications.webhook_url {
            Some(url) => Arc::new(WebhookSink::new(
                url.clone(),
                Duration::from_secs(config.monitoring.probe_timeout_seconds),
            )?),
            None => Arc::new(NullSink),
        };

        let notifier = Arc::new(TransitionNotifier::new(storage.clone(), sink));
        let scheduler = Scheduler::new(
            storage.clone(),
            prober,
            Classifier::new(config.monitoring.degraded_threshold_ms),
            notifier,
            config.monitoring.max_concurrent_probes,
        );
        let propagator = ConnectionPropagator::new(storage);

        Ok(Self { config: Arc::new(config), scheduler, propagator })
    }

    /// Run the monitoring loop forever.
    async fn run(&self) -> Result<()> {
        let period = Duration::from_secs(self.config.monitoring.tick_seconds.max(1));
        let mut timer = tokio::time::interval(period);
        // Single-flight: a tick that overruns the period causes the missed
        // fire to be skipped, never a second concurrent tick.
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(tick_seconds = period.as_secs(), "monitoring loop started");

        loop {
            // First tick completes immediately, so startup probes at once.
            timer.tick().await;
            self.run_tick().await;
        }
    }

    /// One tick: schedule due checks, then rederive edge statuses.
    /// Failures are logged; nothing may kill the loop.
    async fn run_tick(&self) {
        let now = SystemTime::now();

        if let Err(e) = self.scheduler.tick(now).await {
            error!(error = %e, "scheduler tick failed");
        }

        if let Err(e) = self.propagator.recompute_all().await {
            error!(error = %e, "connection propagation failed");
        }
    }
}
