use anyhow::Result;
use async_trait::async_trait;
use libsql::params;
use std::time::SystemTime;

use super::models::{Alert, AlertKind, Service, ServiceConnection};
use crate::monitoring::types::ServiceStatus;
use crate::pool::LibsqlPool;
use crate::validation::validate_service;

/// Result of a status write-back: the previous status alongside the updated
/// record, so transition detection can run in the same call path without a
/// second read.
#[derive(Debug, Clone)]
pub struct StatusWriteback {
    pub previous: ServiceStatus,
    pub service: Service,
}

/// Persistence seam consumed by the monitoring core.
#[async_trait]
pub trait Storage: Send + Sync {
    /// All monitored services, across every owner.
    async fn list_services(&self) -> Result<Vec<Service>>;

    async fn get_service(&self, id: i64) -> Result<Option<Service>>;

    async fn create_service(&self, service: &Service) -> Result<i64>;

    async fn delete_service(&self, id: i64) -> Result<()>;

    /// Write back the result of a check, setting `last_checked` to
    /// `checked_at`. Returns `None` when the service no longer exists
    /// (deleted mid-cycle).
    async fn update_service_status(
        &self,
        id: i64,
        status: ServiceStatus,
        response_time_ms: Option<u64>,
        checked_at: SystemTime,
    ) -> Result<Option<StatusWriteback>>;

    async fn list_connections(&self) -> Result<Vec<ServiceConnection>>;

    async fn create_connection(&self, connection: &ServiceConnection) -> Result<i64>;

    async fn update_connection_status(&self, id: i64, status: ServiceStatus) -> Result<()>;

    async fn delete_connection(&self, id: i64) -> Result<()>;

    async fn create_alert(&self, alert: &Alert) -> Result<i64>;

    async fn list_alerts_for_service(&self, service_id: i64, limit: usize) -> Result<Vec<Alert>>;
}

/// LibSQL-backed storage
pub struct LibsqlStorage {
    pool: LibsqlPool,
}

impl LibsqlStorage {
    pub fn new_from_pool(pool: LibsqlPool) -> Self {
        Self { pool }
    }

    async fn get_conn(&self) -> Result<deadpool::managed::Object<crate::pool::LibsqlManager>> {
        Ok(self.pool.get().await?)
    }
}

const SERVICE_COLUMNS: &str = "id, user_id, name, host, port, check_interval_seconds, status, response_time_ms, last_checked, created_at";

fn service_from_row(row: &libsql::Row) -> Result<Service> {
    let status: String = row.get(6)?;
    Ok(Service {
        id: Some(row.get(0)?),
        user_id: row.get(1)?,
        name: row.get(2)?,
        host: row.get(3)?,
        port: row.get::<i64>(4)? as u16,
        check_interval_seconds: row.get::<i64>(5)?.max(1) as u64,
        status: ServiceStatus::from_str_lossy(&status),
        response_time_ms: row.get::<Option<i64>>(7)?.map(|v| v as u64),
        last_checked: row.get::<Option<i64>>(8)?.map(Service::i64_to_timestamp),
        created_at: Service::i64_to_timestamp(row.get(9)?),
    })
}

fn connection_from_row(row: &libsql::Row) -> Result<ServiceConnection> {
    let status: String = row.get(4)?;
    Ok(ServiceConnection {
        id: Some(row.get(0)?),
        user_id: row.get(1)?,
        source_id: row.get(2)?,
        target_id: row.get(3)?,
        status: ServiceStatus::from_str_lossy(&status),
    })
}

#[async_trait]
impl Storage for LibsqlStorage {
    async fn list_services(&self) -> Result<Vec<Service>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare(&format!("SELECT {SERVICE_COLUMNS} FROM services ORDER BY id"))
            .await?;

        let mut rows = stmt.query(()).await?;
        let mut services = Vec::new();
        while let Some(row) = rows.next().await? {
            services.push(service_from_row(&row)?);
        }
        Ok(services)
    }

    async fn get_service(&self, id: i64) -> Result<Option<Service>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare(&format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?"))
            .await?;

        let mut rows = stmt.query(params![id]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(service_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn create_service(&self, service: &Service) -> Result<i64> {
        validate_service(service)?;

        let conn = self.get_conn().await?;
        conn.execute(
            "INSERT INTO services (user_id, name, host, port, check_interval_seconds, status, response_time_ms, last_checked, created_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                service.user_id,
                service.name.clone(),
                service.host.clone(),
                service.port as i64,
                service.check_interval_seconds as i64,
                service.status.as_str(),
                service.response_time_ms.map(|v| v as i64),
                service.last_checked.map(Service::timestamp_to_i64),
                Service::timestamp_to_i64(service.created_at)
            ],
        )
        .await?;

        Ok(conn.last_insert_rowid())
    }

    async fn delete_service(&self, id: i64) -> Result<()> {
        let conn = self.get_conn().await?;
        conn.execute("DELETE FROM services WHERE id = ?", params![id]).await?;
        Ok(())
    }

    async fn update_service_status(
        &self,
        id: i64,
        status: ServiceStatus,
        response_time_ms: Option<u64>,
        checked_at: SystemTime,
    ) -> Result<Option<StatusWriteback>> {
        let conn = self.get_conn().await?;

        let mut stmt = conn
            .prepare(&format!("SELECT {SERVICE_COLUMNS} FROM services WHERE id = ?"))
            .await?;
        let mut rows = stmt.query(params![id]).await?;
        let Some(row) = rows.next().await? else {
            return Ok(None);
        };
        let mut service = service_from_row(&row)?;

        conn.execute(
            "UPDATE services SET status = ?, response_time_ms = ?, last_checked = ? WHERE id = ?",
            params![
                status.as_str(),
                response_time_ms.map(|v| v as i64),
                Service::timestamp_to_i64(checked_at),
                id
            ],
        )
        .await?;

        let previous = service.status;
        service.status = status;
        service.response_time_ms = response_time_ms;
        service.last_checked = Some(checked_at);

        Ok(Some(StatusWriteback { previous, service }))
    }

    async fn list_connections(&self) -> Result<Vec<ServiceConnection>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare("SELECT id, user_id, source_id, target_id, status FROM connections ORDER BY id")
            .await?;

        let mut rows = stmt.query(()).await?;
        let mut connections = Vec::new();
        while let Some(row) = rows.next().await? {
            connections.push(connection_from_row(&row)?);
        }
        Ok(connections)
    }

    async fn create_connection(&self, connection: &ServiceConnection) -> Result<i64> {
        let conn = self.get_conn().await?;
        conn.execute(
            "INSERT INTO connections (user_id, source_id, target_id, status, created_at) VALUES (?, ?, ?, ?, ?)",
            params![
                connection.user_id,
                connection.source_id,
                connection.target_id,
                connection.status.as_str(),
                Service::timestamp_to_i64(SystemTime::now())
            ],
        )
        .await?;

        Ok(conn.last_insert_rowid())
    }

    async fn update_connection_status(&self, id: i64, status: ServiceStatus) -> Result<()> {
        let conn = self.get_conn().await?;
        conn.execute(
            "UPDATE connections SET status = ? WHERE id = ?",
            params![status.as_str(), id],
        )
        .await?;
        Ok(())
    }

    async fn delete_connection(&self, id: i64) -> Result<()> {
        let conn = self.get_conn().await?;
        conn.execute("DELETE FROM connections WHERE id = ?", params![id]).await?;
        Ok(())
    }

    async fn create_alert(&self, alert: &Alert) -> Result<i64> {
        let conn = self.get_conn().await?;
        conn.execute(
            "INSERT INTO alerts (user_id, service_id, kind, message, timestamp, acknowledged) VALUES (?, ?, ?, ?, ?, ?)",
            params![
                alert.user_id,
                alert.service_id,
                alert.kind.as_str(),
                alert.message.clone(),
                Service::timestamp_to_i64(alert.timestamp),
                if alert.acknowledged { 1 } else { 0 }
            ],
        )
        .await?;

        Ok(conn.last_insert_rowid())
    }

    async fn list_alerts_for_service(&self, service_id: i64, limit: usize) -> Result<Vec<Alert>> {
        let conn = self.get_conn().await?;
        let mut stmt = conn
            .prepare("SELECT id, user_id, service_id, kind, message, timestamp, acknowledged FROM alerts WHERE service_id = ? ORDER BY timestamp DESC, id DESC LIMIT ?")
            .await?;

        let mut rows = stmt.query(params![service_id, limit as i64]).await?;
        let mut alerts = Vec::new();
        while let Some(row) = rows.next().await? {
            let kind: String = row.get(3)?;
            alerts.push(Alert {
                id: Some(row.get(0)?),
                user_id: row.get(1)?,
                service_id: row.get(2)?,
                kind: AlertKind::from_str_lossy(&kind),
                message: row.get(4)?,
                timestamp: Service::i64_to_timestamp(row.get(5)?),
                acknowledged: row.get::<i64>(6)? != 0,
            });
        }
        Ok(alerts)
    }
}
