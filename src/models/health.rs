use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StoreConnection {
    Active,
    Inactive,
}

/// One probe, appended to the health-check log collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckEvent {
    pub timestamp: DateTime<Utc>,
    pub status: HealthStatus,
}

impl HealthCheckEvent {
    pub fn healthy_now() -> Self {
        Self {
            timestamp: Utc::now(),
            status: HealthStatus::Healthy,
        }
    }
}

/// # Health Report
///
/// Outcome of a single store probe. The probe is pass/fail: any failed step
/// makes the whole report `unhealthy` and sets `error`.
///
/// ## Example JSON
/// ```json
/// {
///   "status": "healthy",
///   "storeConnection": "active",
///   "lastCheckTimestamp": "2024-03-10T15:30:45.123Z",
///   "totalChecksRecorded": 42,
///   "totalRecords": 17,
///   "timestamp": "2024-03-10T15:30:45.130Z"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,
    pub store_connection: StoreConnection,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub last_check_timestamp: Option<DateTime<Utc>>,
    pub total_checks_recorded: u64,
    pub total_records: u64,
    #[schema(value_type = String, format = DateTime)]
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    pub fn healthy(last_check: DateTime<Utc>, total_checks: u64, total_records: u64) -> Self {
        Self {
            status: HealthStatus::Healthy,
            store_connection: StoreConnection::Active,
            last_check_timestamp: Some(last_check),
            total_checks_recorded: total_checks,
            total_records,
            timestamp: Utc::now(),
            error: None,
        }
    }

    pub fn unhealthy(connection: StoreConnection, error: impl Into<String>) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            store_connection: connection,
            last_check_timestamp: None,
            total_checks_recorded: 0,
            total_records: 0,
            timestamp: Utc::now(),
            error: Some(error.into()),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

/// Body of `GET /`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    pub status: String,
    pub version: String,
    pub environment: String,
    /// Seconds since the process started serving.
    pub uptime: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_healthy_report_shape() {
        let last = Utc::now();
        let report = HealthReport::healthy(last, 3, 7);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["status"], "healthy");
        assert_eq!(json["storeConnection"], "active");
        assert_eq!(json["totalChecksRecorded"], 3);
        assert_eq!(json["totalRecords"], 7);
        assert!(json["lastCheckTimestamp"].is_string());
        assert!(json.get("error").is_none());
        assert!(report.is_healthy());
    }

    #[test]
    fn test_unhealthy_report_carries_error() {
        let report = HealthReport::unhealthy(StoreConnection::Inactive, "connection refused");
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["status"], "unhealthy");
        assert_eq!(json["storeConnection"], "inactive");
        assert_eq!(json["error"], "connection refused");
        assert!(json["lastCheckTimestamp"].is_null());
        assert!(!report.is_healthy());
    }
}
