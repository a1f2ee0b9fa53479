use std::sync::Arc;

use anyhow::Result;
use tracing::{info, warn};

use super::types::ServiceStatus;
use crate::database::Storage;
use crate::database::models::ServiceConnection;

/// Derive a connection's status from its two endpoint statuses.
///
/// First match wins; the rules are symmetric in source and target.
pub fn derive_edge_status(a: ServiceStatus, b: ServiceStatus) -> ServiceStatus {
    use ServiceStatus::*;

    if a == Online && b == Online {
        Online
    } else if a == Offline || b == Offline {
        Offline
    } else if a == Degraded || b == Degraded {
        Degraded
    } else {
        Unknown
    }
}

/// Recomputes every dependency edge's status after a scheduling pass.
///
/// Edges carry presentation-only state: writes are unconditional and
/// idempotent, and no alerts are raised here.
pub struct ConnectionPropagator {
    storage: Arc<dyn Storage>,
}

impl ConnectionPropagator {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// One pass over all connections. Per-edge failures are logged and
    /// skipped; only a failure to list the edges surfaces.
    pub async fn recompute_all(&self) -> Result<()> {
        let connections = self.storage.list_connections().await?;

        for connection in connections {
            if let Err(e) = self.recompute(&connection).await {
                warn!(connection = ?connection.id, error = %e, "edge recomputation failed");
            }
        }

        Ok(())
    }

    async fn recompute(&self, connection: &ServiceConnection) -> Result<()> {
        let Some(id) = connection.id else {
            return Ok(());
        };

        let source = self.storage.get_service(connection.source_id).await?;
        let target = self.storage.get_service(connection.target_id).await?;

        let (source, target) = match (source, target) {
            (Some(source), Some(target)) => (source, target),
            // Dangling edge: an endpoint was deleted. Repair by removing
            // the edge; no status write is attempted.
            _ => {
                info!(connection = id, "deleting dangling connection");
                return self.storage.delete_connection(id).await;
            }
        };

        let status = derive_edge_status(source.status, target.status);
        self.storage.update_connection_status(id, status).await
    }
}
