use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, error, warn};

use super::types::ServiceStatus;
use crate::database::Storage;
use crate::database::models::{Alert, AlertKind, Service};

/// External notification sink (chat bot, webhook receiver, ...).
///
/// Best effort only: the return value is advisory and a failed delivery
/// never affects alert persistence or the status write-back.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, user_id: i64, message: &str) -> bool;
}

/// Sink used when no delivery endpoint is configured.
pub struct NullSink;

#[async_trait]
impl NotificationSink for NullSink {
    async fn notify(&self, _user_id: i64, _message: &str) -> bool {
        true
    }
}

/// Delivers notifications as JSON POSTs to a configured webhook URL.
pub struct WebhookSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl NotificationSink for WebhookSink {
    async fn notify(&self, user_id: i64, message: &str) -> bool {
        let payload = serde_json::json!({ "user_id": user_id, "message": message });
        match self.client.post(&self.url).json(&payload).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(url = %self.url, error = %e, "webhook delivery failed");
                false
            }
        }
    }
}

/// Decide whether a status change is operator-actionable.
///
/// Only two transitions qualify: anything-to-offline and
/// offline-to-online. Everything else, including repeat writes of the same
/// status, is silent.
pub fn qualifying_transition(old: ServiceStatus, new: ServiceStatus) -> Option<AlertKind> {
    if new == ServiceStatus::Offline && old != ServiceStatus::Offline {
        Some(AlertKind::StatusChange)
    } else if old == ServiceStatus::Offline && new == ServiceStatus::Online {
        Some(AlertKind::Recovery)
    } else {
        None
    }
}

/// Raises alerts and notifications for qualifying status transitions.
pub struct TransitionNotifier {
    storage: Arc<dyn Storage>,
    sink: Arc<dyn NotificationSink>,
}

impl TransitionNotifier {
    pub fn new(storage: Arc<dyn Storage>, sink: Arc<dyn NotificationSink>) -> Self {
        Self { storage, sink }
    }

    /// Invoked right after a status write-back, with the previous and the
    /// just-written status.
    ///
    /// Alert persistence happens first; the sink only fires once the alert
    /// record exists. Neither failure propagates to the caller.
    pub async fn on_status_written(
        &self,
        service: &Service,
        old: ServiceStatus,
        new: ServiceStatus,
    ) {
        let Some(kind) = qualifying_transition(old, new) else {
            return;
        };

        let message = match kind {
            AlertKind::StatusChange => format!("Service {} is offline", service.name),
            AlertKind::Recovery => format!("Service {} is now online", service.name),
        };

        let Some(service_id) = service.id else {
            return;
        };

        let alert = Alert::new(service.user_id, service_id, kind, message.clone());
        if let Err(e) = self.storage.create_alert(&alert).await {
            error!(service = %service.name, error = %e, "failed to persist alert");
            return;
        }
        debug!(service = %service.name, kind = %kind, "alert created");

        if !self.sink.notify(service.user_id, &message).await {
            warn!(service = %service.name, "notification delivery failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{MemoryStorage, RecordingSink};

    fn saved_service(id: i64) -> Service {
        let mut service = Service::new(9, "api".into(), "api.example.com".into(), 443);
        service.id = Some(id);
        service
    }

    #[test]
    fn only_offline_and_recovery_transitions_qualify() {
        use ServiceStatus::*;

        assert_eq!(qualifying_transition(Online, Offline), Some(AlertKind::StatusChange));
        assert_eq!(qualifying_transition(Degraded, Offline), Some(AlertKind::StatusChange));
        assert_eq!(qualifying_transition(Unknown, Offline), Some(AlertKind::StatusChange));
        assert_eq!(qualifying_transition(Offline, Online), Some(AlertKind::Recovery));

        // Repeat writes never alert.
        assert_eq!(qualifying_transition(Offline, Offline), None);
        assert_eq!(qualifying_transition(Online, Online), None);

        // The silent transitions.
        assert_eq!(qualifying_transition(Online, Degraded), None);
        assert_eq!(qualifying_transition(Degraded, Online), None);
        assert_eq!(qualifying_transition(Offline, Degraded), None);
        assert_eq!(qualifying_transition(Unknown, Online), None);
    }

    #[tokio::test]
    async fn offline_transition_creates_alert_and_notifies() {
        let storage = Arc::new(MemoryStorage::new());
        let sink = Arc::new(RecordingSink::new(true));
        let notifier = TransitionNotifier::new(storage.clone(), sink.clone());

        let service = saved_service(4);
        notifier
            .on_status_written(&service, ServiceStatus::Online, ServiceStatus::Offline)
            .await;

        let alerts = storage.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::StatusChange);
        assert_eq!(alerts[0].message, "Service api is offline");
        assert_eq!(alerts[0].service_id, 4);
        assert!(!alerts[0].acknowledged);

        assert_eq!(sink.deliveries(), vec![(9, "Service api is offline".to_string())]);
    }

    #[tokio::test]
    async fn recovery_transition_uses_recovery_message() {
        let storage = Arc::new(MemoryStorage::new());
        let sink = Arc::new(RecordingSink::new(true));
        let notifier = TransitionNotifier::new(storage.clone(), sink.clone());

        notifier
            .on_status_written(&saved_service(4), ServiceStatus::Offline, ServiceStatus::Online)
            .await;

        let alerts = storage.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].kind, AlertKind::Recovery);
        assert_eq!(alerts[0].message, "Service api is now online");
    }

    #[tokio::test]
    async fn silent_transition_touches_nothing() {
        let storage = Arc::new(MemoryStorage::new());
        let sink = Arc::new(RecordingSink::new(true));
        let notifier = TransitionNotifier::new(storage.clone(), sink.clone());

        notifier
            .on_status_written(&saved_service(4), ServiceStatus::Online, ServiceStatus::Degraded)
            .await;
        notifier
            .on_status_written(&saved_service(4), ServiceStatus::Offline, ServiceStatus::Offline)
            .await;

        assert!(storage.alerts().is_empty());
        assert!(sink.deliveries().is_empty());
    }

    #[tokio::test]
    async fn sink_failure_does_not_lose_the_alert() {
        let storage = Arc::new(MemoryStorage::new());
        let sink = Arc::new(RecordingSink::new(false));
        let notifier = TransitionNotifier::new(storage.clone(), sink.clone());

        notifier
            .on_status_written(&saved_service(4), ServiceStatus::Online, ServiceStatus::Offline)
            .await;

        assert_eq!(storage.alerts().len(), 1);
    }
}
