//! HTTP client for the local status service and metric resolution

use crate::errors::{MonitorError, Result};
use chrono::NaiveDateTime;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Fallback confidence is clamped into this range.
const CONFIDENCE_FLOOR: f64 = 0.3;
const CONFIDENCE_CEIL: f64 = 0.95;

/// One domain's entry in the status service response.
///
/// The service owns this data; unknown fields are tolerated and the ones the
/// service is known to send are carried for logging.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StatusEntry {
    pub latency: Option<f64>,
    pub predicted: Option<f64>,
    pub confidence: Option<f64>,
    pub is_spike: bool,
    pub spike_severity: f64,
    pub last_update: Option<String>,
    pub suggested_server: Option<String>,
    pub improvement: Option<f64>,
}

impl StatusEntry {
    /// Parse the service's `last_update` timestamp (local time, no zone)
    pub fn last_update_at(&self) -> Option<NaiveDateTime> {
        self.last_update
            .as_deref()
            .and_then(|ts| NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M:%S").ok())
    }
}

/// Render-ready metrics for a single domain.
///
/// `None` in any field means the panel should show `-` for it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DomainMetrics {
    pub latency_ms: Option<u64>,
    pub predicted_ms: Option<u64>,
    pub confidence: Option<f64>,
}

impl DomainMetrics {
    /// The "no data" value, used to clear stale panel state
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Resolve the metrics to display for `domain` from a status response.
///
/// Latency and prediction are rounded to whole milliseconds. Confidence is
/// the server's value when present; otherwise, when both latency and
/// prediction are known, the fallback heuristic
/// `1 - |latency - predicted| / latency` clamped to [0.3, 0.95].
pub fn resolve_metrics(domain: &str, status: &HashMap<String, StatusEntry>) -> DomainMetrics {
    let Some(entry) = status.get(domain) else {
        return DomainMetrics::empty();
    };

    let confidence = entry.confidence.or_else(|| {
        match (entry.latency, entry.predicted) {
            (Some(latency), Some(predicted)) if latency > 0.0 => {
                Some(fallback_confidence(latency, predicted))
            }
            _ => None,
        }
    });

    DomainMetrics {
        latency_ms: entry.latency.map(|v| v.round() as u64),
        predicted_ms: entry.predicted.map(|v| v.round() as u64),
        confidence,
    }
}

fn fallback_confidence(latency: f64, predicted: f64) -> f64 {
    (1.0 - (latency - predicted).abs() / latency).clamp(CONFIDENCE_FLOOR, CONFIDENCE_CEIL)
}

/// HTTP client for the status service
#[derive(Debug, Clone)]
pub struct StatusClient {
    client: Client,
    service_url: String,
    timeout: Duration,
}

impl StatusClient {
    /// Create a new status service client
    pub fn new(service_url: String, http_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(http_timeout)
            .user_agent(format!("domain_monitor/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(MonitorError::Http)?;

        Ok(Self {
            client,
            service_url,
            timeout: http_timeout,
        })
    }

    /// Report a visited domain to the status service.
    ///
    /// The JSON acknowledgment body is ignored beyond the status code; a
    /// successful report is always followed by a status fetch at the caller.
    pub async fn report_website(&self, domain: &str) -> Result<()> {
        let url = format!("{}/api/add_website", self.service_url);

        debug!("Reporting visited domain {} to {}", domain, url);

        let response = timeout(
            self.timeout,
            self.client
                .post(&url)
                .json(&serde_json::json!({ "website": domain }))
                .send(),
        )
        .await
        .map_err(|_| MonitorError::Transport("add_website request timeout".to_string()))?
        .map_err(MonitorError::Http)?;

        self.check_response(response, "add_website").await?;
        Ok(())
    }

    /// Fetch the full status map, keyed by domain
    pub async fn fetch_status(&self) -> Result<HashMap<String, StatusEntry>> {
        let url = format!("{}/api/status", self.service_url);

        let response = timeout(self.timeout, self.client.get(&url).send())
            .await
            .map_err(|_| MonitorError::Transport("status request timeout".to_string()))?
            .map_err(MonitorError::Http)?;

        let response = self.check_response(response, "status").await?;
        let status: HashMap<String, StatusEntry> =
            response.json().await.map_err(MonitorError::Http)?;

        debug!("Fetched status for {} domains", status.len());
        Ok(status)
    }

    /// List the domains the status service is tracking
    pub async fn list_websites(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/websites", self.service_url);

        let response = timeout(self.timeout, self.client.get(&url).send())
            .await
            .map_err(|_| MonitorError::Transport("websites request timeout".to_string()))?
            .map_err(MonitorError::Http)?;

        let response = self.check_response(response, "websites").await?;
        let websites: Vec<String> = response.json().await.map_err(MonitorError::Http)?;
        Ok(websites)
    }

    /// Test connectivity to the status service
    pub async fn test_connectivity(&self) -> bool {
        match self.list_websites().await {
            Ok(websites) => {
                info!(
                    "Status service connectivity test successful, {} domains tracked",
                    websites.len()
                );
                true
            }
            Err(e) => {
                warn!("Status service connectivity test failed: {}", e);
                false
            }
        }
    }

    /// Map non-success responses to transport errors
    async fn check_response(&self, response: Response, endpoint: &str) -> Result<Response> {
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        let error_message = match status.as_u16() {
            400 => format!("Bad request for {}: {}", endpoint, error_body),
            404 => format!("Endpoint {} not found: {}", endpoint, error_body),
            500..=599 => format!("Status service error for {}: {}", endpoint, error_body),
            _ => format!(
                "Unexpected response {} for {}: {}",
                status, endpoint, error_body
            ),
        };

        Err(MonitorError::Transport(error_message))
    }
}
