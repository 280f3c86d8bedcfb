use crate::config::{DEFAULT_STORE_TIMEOUT, Environment};
use crate::monitor::HealthMonitor;
use crate::store::RecordStore;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Shared handler state, registered once as `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub monitor: Arc<HealthMonitor>,
    pub environment: Environment,
    /// Bound on each store call made by a request handler.
    pub store_timeout: Duration,
    started_at: Instant,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RecordStore>,
        monitor: Arc<HealthMonitor>,
        environment: Environment,
    ) -> Self {
        Self {
            store,
            monitor,
            environment,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            started_at: Instant::now(),
        }
    }

    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }

    pub fn uptime(&self) -> Duration {
        self.started_at.elapsed()
    }
}
