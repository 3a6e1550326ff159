use std::sync::RwLock;

use chrono::{DateTime, Utc};

use crate::health::{HealthCheckable, HealthStatus};

struct Failure {
    at: DateTime<Utc>,
    message: String,
}

/// Tracks whether the latest supply computation for the configured network went through.
#[derive(Default)]
pub struct ServeHealth {
    last_failure: RwLock<Option<Failure>>,
}

impl ServeHealth {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self) {
        if let Ok(mut last_failure) = self.last_failure.write() {
            *last_failure = None;
        }
    }

    pub fn record_failure(&self, at: DateTime<Utc>, message: String) {
        if let Ok(mut last_failure) = self.last_failure.write() {
            *last_failure = Some(Failure { at, message });
        }
    }
}

impl HealthCheckable for ServeHealth {
    // Healthy until a computation fails, and again once one succeeds.
    fn health_status(&self) -> HealthStatus {
        match self.last_failure.read() {
            Ok(last_failure) => match last_failure.as_ref() {
                None => HealthStatus::Healthy,
                Some(Failure { at, message }) => HealthStatus::Unhealthy(Some(format!(
                    "supply computation failed at {}: {message}",
                    at.to_rfc3339()
                ))),
            },
            Err(_) => HealthStatus::Unhealthy(None),
        }
    }
}
