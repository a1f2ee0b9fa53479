//! Shared test doubles: an in-memory storage, a scripted prober, and a
//! recording notification sink.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::SystemTime;

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use crate::database::models::{Alert, Service, ServiceConnection};
use crate::database::{StatusWriteback, Storage};
use crate::monitoring::prober::Probe;
use crate::monitoring::types::{ProbeOutcome, ServiceStatus};

#[derive(Default)]
struct MemoryState {
    services: HashMap<i64, Service>,
    connections: HashMap<i64, ServiceConnection>,
    alerts: Vec<Alert>,
    connection_status_writes: Vec<(i64, ServiceStatus)>,
    failing_updates: Vec<i64>,
    vanishing_updates: Vec<i64>,
    next_id: i64,
}

impl MemoryState {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-memory `Storage` for unit tests.
pub struct MemoryStorage {
    state: Mutex<MemoryState>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self { state: Mutex::new(MemoryState::default()) }
    }

    pub fn add_service(&self, mut service: Service) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.allocate_id();
        service.id = Some(id);
        state.services.insert(id, service);
        id
    }

    pub fn add_connection(&self, mut connection: ServiceConnection) -> i64 {
        let mut state = self.state.lock().unwrap();
        let id = state.allocate_id();
        connection.id = Some(id);
        state.connections.insert(id, connection);
        id
    }

    pub fn service_by_name(&self, name: &str) -> Option<Service> {
        let state = self.state.lock().unwrap();
        state.services.values().find(|s| s.name == name).cloned()
    }

    pub fn connection_status(&self, id: i64) -> Option<ServiceStatus> {
        let state = self.state.lock().unwrap();
        state.connections.get(&id).map(|c| c.status)
    }

    /// Connection status writes observed, in order.
    pub fn connection_status_writes(&self) -> Vec<(i64, ServiceStatus)> {
        self.state.lock().unwrap().connection_status_writes.clone()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.state.lock().unwrap().alerts.clone()
    }

    /// Make every status write for `id` fail.
    pub fn fail_updates_for(&self, id: i64) {
        self.state.lock().unwrap().failing_updates.push(id);
    }

    /// Make the service disappear the moment its status is written, as if
    /// deleted mid-cycle.
    pub fn vanish_on_update(&self, id: i64) {
        self.state.lock().unwrap().vanishing_updates.push(id);
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn list_services(&self) -> Result<Vec<Service>> {
        let state = self.state.lock().unwrap();
        let mut services: Vec<Service> = state.services.values().cloned().collect();
        services.sort_by_key(|s| s.id);
        Ok(services)
    }

    async fn get_service(&self, id: i64) -> Result<Option<Service>> {
        Ok(self.state.lock().unwrap().services.get(&id).cloned())
    }

    async fn create_service(&self, service: &Service) -> Result<i64> {
        Ok(self.add_service(service.clone()))
    }

    async fn delete_service(&self, id: i64) -> Result<()> {
        self.state.lock().unwrap().services.remove(&id);
        Ok(())
    }

    async fn update_service_status(
        &self,
        id: i64,
        status: ServiceStatus,
        response_time_ms: Option<u64>,
        checked_at: SystemTime,
    ) -> Result<Option<StatusWriteback>> {
        let mut state = self.state.lock().unwrap();

        if state.failing_updates.contains(&id) {
            return Err(anyhow!("simulated write failure for service {id}"));
        }
        if state.vanishing_updates.contains(&id) {
            state.services.remove(&id);
            return Ok(None);
        }

        let Some(service) = state.services.get_mut(&id) else {
            return Ok(None);
        };

        let previous = service.status;
        service.status = status;
        service.response_time_ms = response_time_ms;
        service.last_checked = Some(checked_at);

        Ok(Some(StatusWriteback { previous, service: service.clone() }))
    }

    async fn list_connections(&self) -> Result<Vec<ServiceConnection>> {
        let state = self.state.lock().unwrap();
        let mut connections: Vec<ServiceConnection> = state.connections.values().cloned().collect();
        connections.sort_by_key(|c| c.id);
        Ok(connections)
    }

    async fn create_connection(&self, connection: &ServiceConnection) -> Result<i64> {
        Ok(self.add_connection(connection.clone()))
    }

    async fn update_connection_status(&self, id: i64, status: ServiceStatus) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.connection_status_writes.push((id, status));
        if let Some(connection) = state.connections.get_mut(&id) {
            connection.status = status;
        }
        Ok(())
    }

    async fn delete_connection(&self, id: i64) -> Result<()> {
        self.state.lock().unwrap().connections.remove(&id);
        Ok(())
    }

    async fn create_alert(&self, alert: &Alert) -> Result<i64> {
        let mut state = self.state.lock().unwrap();
        let id = state.allocate_id();
        let mut alert = alert.clone();
        alert.id = Some(id);
        state.alerts.push(alert);
        Ok(id)
    }

    async fn list_alerts_for_service(&self, service_id: i64, limit: usize) -> Result<Vec<Alert>> {
        let state = self.state.lock().unwrap();
        Ok(state
            .alerts
            .iter()
            .filter(|a| a.service_id == service_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

/// Prober driven by a host → outcome script; unscripted hosts are
/// unreachable. Records every probed host.
pub struct ScriptedProber {
    outcomes: Mutex<HashMap<String, ProbeOutcome>>,
    probed: Mutex<Vec<String>>,
}

impl ScriptedProber {
    pub fn new() -> Self {
        Self { outcomes: Mutex::new(HashMap::new()), probed: Mutex::new(Vec::new()) }
    }

    pub fn script(&self, host: &str, outcome: ProbeOutcome) {
        self.outcomes.lock().unwrap().insert(host.to_string(), outcome);
    }

    pub fn probed_hosts(&self) -> Vec<String> {
        self.probed.lock().unwrap().clone()
    }
}

#[async_trait]
impl Probe for ScriptedProber {
    async fn probe(&self, host: &str, _port: u16) -> ProbeOutcome {
        self.probed.lock().unwrap().push(host.to_string());
        self.outcomes
            .lock()
            .unwrap()
            .get(host)
            .copied()
            .unwrap_or(ProbeOutcome::Unreachable)
    }
}

/// Sink that records deliveries and answers with a fixed result.
pub struct RecordingSink {
    delivered: Mutex<Vec<(i64, String)>>,
    result: bool,
}

impl RecordingSink {
    pub fn new(result: bool) -> Self {
        Self { delivered: Mutex::new(Vec::new()), result }
    }

    pub fn deliveries(&self) -> Vec<(i64, String)> {
        self.delivered.lock().unwrap().clone()
    }
}

#[async_trait]
impl crate::monitoring::notifier::NotificationSink for RecordingSink {
    async fn notify(&self, user_id: i64, message: &str) -> bool {
        self.delivered.lock().unwrap().push((user_id, message.to_string()));
        self.result
    }
}
