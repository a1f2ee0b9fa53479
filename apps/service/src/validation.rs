//! Field validation for service records created through the storage layer.

use anyhow::{Result, anyhow};

use crate::database::models::Service;

/// Validate a service before it is persisted.
///
/// The scheduler relies on `check_interval_seconds > 0`; the prober relies
/// on the host being a bare hostname or address.
pub fn validate_service(service: &Service) -> Result<()> {
    let host = service.host.trim();

    if host.is_empty() {
        return Err(anyhow!("Service host must not be empty"));
    }

    if host.contains("://") || host.contains('/') {
        return Err(anyhow!("Service host must not embed a scheme or path: {}", host));
    }

    if host.contains(char::is_whitespace) {
        return Err(anyhow!("Service host must not contain whitespace: {}", host));
    }

    if service.port == 0 {
        return Err(anyhow!("Service port must be non-zero"));
    }

    if service.check_interval_seconds == 0 {
        return Err(anyhow!("Check interval must be at least one second"));
    }

    Ok(())
}
