//! Store health probing, on demand and on a timer.

use crate::models::{HealthCheckEvent, HealthReport, StoreConnection};
use crate::store::RecordStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{info, warn};

/// Runs pass/fail probes against a [`RecordStore`].
///
/// A probe pings the store, appends a [`HealthCheckEvent`], then reads back
/// the latest event and the event and record counts. The first failing step
/// ends the probe with an `unhealthy` report. The whole probe is bounded by
/// `probe_timeout`.
pub struct HealthMonitor {
    store: Arc<dyn RecordStore>,
    probe_timeout: Duration,
}

impl HealthMonitor {
    pub fn new(store: Arc<dyn RecordStore>, probe_timeout: Duration) -> Self {
        Self {
            store,
            probe_timeout,
        }
    }

    /// Probes the store and returns the report to the caller.
    pub async fn probe(&self) -> HealthReport {
        match time::timeout(self.probe_timeout, self.run_probe()).await {
            Ok(report) => report,
            Err(_) => HealthReport::unhealthy(
                StoreConnection::Inactive,
                format!(
                    "health probe timed out after {} ms",
                    self.probe_timeout.as_millis()
                ),
            ),
        }
    }

    /// Probes the store and logs the outcome. Failures are never propagated.
    pub async fn probe_scheduled(&self) -> HealthReport {
        let report = self.probe().await;
        if report.is_healthy() {
            info!(
                total_checks = report.total_checks_recorded,
                total_records = report.total_records,
                "scheduled health check passed"
            );
        } else {
            warn!(
                error = report.error.as_deref().unwrap_or("unknown"),
                "scheduled health check failed"
            );
        }
        report
    }

    async fn run_probe(&self) -> HealthReport {
        if let Err(e) = self.store.ping().await {
            return HealthReport::unhealthy(StoreConnection::Inactive, e.to_string());
        }

        let active = |e: crate::store::StoreError| {
            HealthReport::unhealthy(StoreConnection::Active, e.to_string())
        };

        if let Err(e) = self
            .store
            .record_health_check(HealthCheckEvent::healthy_now())
            .await
        {
            return active(e);
        }

        let latest = match self.store.latest_health_check().await {
            Ok(Some(event)) => event,
            Ok(None) => {
                return HealthReport::unhealthy(
                    StoreConnection::Active,
                    "health check event was written but could not be read back",
                );
            }
            Err(e) => return active(e),
        };
        let total_checks = match self.store.count_health_checks().await {
            Ok(count) => count,
            Err(e) => return active(e),
        };
        let total_records = match self.store.count_all().await {
            Ok(count) => count,
            Err(e) => return active(e),
        };

        HealthReport::healthy(latest.timestamp, total_checks, total_records)
    }
}

/// Starts the repeating probe task.
///
/// The first probe runs one `interval` after start. Abort the returned handle
/// on shutdown.
pub fn spawn_scheduler(monitor: Arc<HealthMonitor>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = interval.as_secs(), "health check scheduler started");

        loop {
            ticker.tick().await;
            monitor.probe_scheduled().await;
        }
    })
}
