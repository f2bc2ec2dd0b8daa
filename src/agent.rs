//! Monitor agent orchestration

use crate::config::Config;
use crate::errors::{MonitorError, Result};
use crate::events::{Event, Outbound};
use crate::session::{self, Effect, SessionState};
use crate::status::{resolve_metrics, DomainMetrics, StatusClient};
use crate::storage::StateStore;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Where the agent's outbound messages go. The bridge binary installs a
/// stdout sink; tests install an in-memory one.
#[async_trait]
pub trait UpdateSink: Send + Sync {
    async fn publish(&self, update: Outbound) -> Result<()>;
}

/// Monitor agent: owns the session state and executes the effects the pure
/// session core requests.
pub struct MonitorAgent {
    config: Config,
    state: SessionState,
    store: StateStore,
    client: StatusClient,
    sink: Arc<dyn UpdateSink>,
    session_id: String,
    events_handled: u64,
    reports_sent: u64,
}

impl MonitorAgent {
    /// Create a new monitor agent
    pub fn new(config: Config, sink: Arc<dyn UpdateSink>) -> Result<Self> {
        config.validate().map_err(MonitorError::Config)?;

        let client = StatusClient::new(config.service_url.clone(), config.http_timeout)?;
        let store = StateStore::new(config.state_path.clone());

        Ok(Self {
            config,
            state: SessionState::default(),
            store,
            client,
            sink,
            session_id: Uuid::new_v4().to_string(),
            events_handled: 0,
            reports_sent: 0,
        })
    }

    /// Start the agent: load the persisted flag and, when monitoring is
    /// already enabled, ask the host for its open tabs.
    pub async fn start(&mut self) -> Result<()> {
        let monitoring = self.store.load().await;
        self.state = SessionState::new(monitoring);

        info!(
            "Starting monitor agent {} (monitoring: {}, service: {})",
            self.session_id, monitoring, self.config.service_url
        );

        if !self.client.test_connectivity().await {
            warn!("Status service connectivity test failed, but continuing anyway");
        }

        if monitoring && self.config.scan_tabs_on_start {
            self.publish(Outbound::QueryTabs).await;
        }

        Ok(())
    }

    /// Handle one inbound event from the host
    pub async fn handle_event(&mut self, event: Event) {
        self.events_handled += 1;

        let effects = session::handle(event, &mut self.state);
        for effect in effects {
            self.run_effect(effect).await;
        }
    }

    async fn run_effect(&mut self, effect: Effect) {
        match effect {
            Effect::Publish(update) => self.publish(update).await,
            Effect::Report(domain) => self.report_and_relay(&domain).await,
            Effect::FetchStatus(domain) => self.relay_status(&domain).await,
            Effect::QueryTabs => self.publish(Outbound::QueryTabs).await,
            Effect::SaveState(is_monitoring) => {
                if let Err(e) = self.store.save(is_monitoring).await {
                    error!("Failed to persist monitoring state: {}", e);
                }
            }
        }
    }

    /// Report a visit, then relay the service's metrics for it.
    /// A failed report degrades to "no data" so the panel clears.
    async fn report_and_relay(&mut self, domain: &str) {
        match self.client.report_website(domain).await {
            Ok(()) => {
                self.reports_sent += 1;
                self.relay_status(domain).await;
            }
            Err(e) => {
                warn!("Failed to report {}: {}", domain, e);
                self.publish_metrics(DomainMetrics::empty()).await;
            }
        }
    }

    /// Fetch the status map and publish the domain's metrics, or nulls when
    /// the domain has no data or the request fails
    async fn relay_status(&mut self, domain: &str) {
        let metrics = match self.client.fetch_status().await {
            Ok(status) => {
                if let Some(ts) = status.get(domain).and_then(|entry| entry.last_update_at()) {
                    debug!("Status for {} last updated {}", domain, ts);
                }
                resolve_metrics(domain, &status)
            }
            Err(e) => {
                warn!("Failed to fetch status for {}: {}", domain, e);
                DomainMetrics::empty()
            }
        };

        self.publish_metrics(metrics).await;
    }

    async fn publish_metrics(&mut self, metrics: DomainMetrics) {
        self.publish(Outbound::UpdateLatency {
            latency: metrics.latency_ms,
        })
        .await;
        self.publish(Outbound::UpdatePrediction {
            prediction: metrics.predicted_ms,
        })
        .await;
        self.publish(Outbound::UpdateConfidence {
            confidence: metrics.confidence,
        })
        .await;
    }

    async fn publish(&mut self, update: Outbound) {
        if let Err(e) = self.sink.publish(update).await {
            error!("Failed to publish update: {}", e);
        }
    }

    /// Graceful shutdown logging
    pub fn shutdown(&self) {
        info!(
            "Monitor agent {} shutting down - {} events handled, {} visits reported",
            self.session_id, self.events_handled, self.reports_sent
        );
    }

    pub fn is_monitoring(&self) -> bool {
        self.state.is_monitoring()
    }

    pub fn last_domain(&self) -> Option<&str> {
        self.state.last_domain()
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;
    use tokio::sync::Mutex;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Default)]
    struct MemorySink {
        updates: Mutex<Vec<Outbound>>,
    }

    #[async_trait]
    impl UpdateSink for MemorySink {
        async fn publish(&self, update: Outbound) -> Result<()> {
            self.updates.lock().await.push(update);
            Ok(())
        }
    }

    impl MemorySink {
        async fn drain(&self) -> Vec<Outbound> {
            std::mem::take(&mut *self.updates.lock().await)
        }
    }

    fn test_config(server: &MockServer, dir: &tempfile::TempDir) -> Config {
        let mut config = Config::default();
        config.service_url = server.uri();
        config.state_path = dir
            .path()
            .join("state.json")
            .to_string_lossy()
            .into_owned();
        config.http_timeout = Duration::from_secs(1);
        config
    }

    async fn agent_with_sink(
        server: &MockServer,
        dir: &tempfile::TempDir,
    ) -> (MonitorAgent, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        let agent = MonitorAgent::new(test_config(server, dir), sink.clone()).unwrap();
        (agent, sink)
    }

    fn status_body() -> serde_json::Value {
        serde_json::json!({
            "example.com": {
                "latency": 120.0,
                "predicted": 100.0
            }
        })
    }

    #[tokio::test]
    async fn test_visit_reports_and_relays_metrics() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();

        Mock::given(method("POST"))
            .and(path("/api/add_website"))
            .and(body_json(serde_json::json!({ "website": "example.com" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "success": true
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status_body()))
            .mount(&server)
            .await;

        let (mut agent, sink) = agent_with_sink(&server, &dir).await;
        agent
            .handle_event(Event::ToggleMonitoring { is_monitoring: true })
            .await;
        sink.drain().await;

        agent
            .handle_event(Event::NavigationCompleted {
                url: "https://example.com/page".to_string(),
                frame_id: 0,
            })
            .await;

        let updates = sink.drain().await;
        assert_eq!(
            updates[0],
            Outbound::UpdateLastWebsite {
                website: "example.com".to_string(),
            }
        );
        assert_eq!(updates[1], Outbound::UpdateLatency { latency: Some(120) });
        assert_eq!(
            updates[2],
            Outbound::UpdatePrediction {
                prediction: Some(100),
            }
        );
        match &updates[3] {
            Outbound::UpdateConfidence {
                confidence: Some(confidence),
            } => {
                assert_eq!((confidence * 100.0).round() as u32, 83);
            }
            other => panic!("expected confidence update, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_internal_pages_make_no_network_calls() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();

        Mock::given(method("POST"))
            .and(path("/api/add_website"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let (mut agent, sink) = agent_with_sink(&server, &dir).await;
        agent
            .handle_event(Event::ToggleMonitoring { is_monitoring: true })
            .await;
        sink.drain().await;

        agent
            .handle_event(Event::NavigationCompleted {
                url: "chrome://extensions/".to_string(),
                frame_id: 0,
            })
            .await;

        assert!(sink.drain().await.is_empty());
    }

    #[tokio::test]
    async fn test_status_failure_publishes_nulls() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();

        Mock::given(method("POST"))
            .and(path("/api/add_website"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/status"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (mut agent, sink) = agent_with_sink(&server, &dir).await;
        agent
            .handle_event(Event::ToggleMonitoring { is_monitoring: true })
            .await;
        sink.drain().await;

        agent
            .handle_event(Event::NavigationCompleted {
                url: "https://example.com/".to_string(),
                frame_id: 0,
            })
            .await;

        let updates = sink.drain().await;
        assert!(updates.contains(&Outbound::UpdateLatency { latency: None }));
        assert!(updates.contains(&Outbound::UpdatePrediction { prediction: None }));
        assert!(updates.contains(&Outbound::UpdateConfidence { confidence: None }));
    }

    #[tokio::test]
    async fn test_unknown_domain_publishes_nulls() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();

        Mock::given(method("GET"))
            .and(path("/api/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let (mut agent, sink) = agent_with_sink(&server, &dir).await;
        agent
            .handle_event(Event::GetStatusForDomain {
                domain: "example.com".to_string(),
            })
            .await;

        let updates = sink.drain().await;
        assert_eq!(
            updates,
            vec![
                Outbound::UpdateLatency { latency: None },
                Outbound::UpdatePrediction { prediction: None },
                Outbound::UpdateConfidence { confidence: None },
            ]
        );
    }

    #[tokio::test]
    async fn test_status_request_does_not_report_a_visit() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();

        Mock::given(method("POST"))
            .and(path("/api/add_website"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/status"))
            .respond_with(ResponseTemplate::new(200).set_body_json(status_body()))
            .mount(&server)
            .await;

        let (mut agent, sink) = agent_with_sink(&server, &dir).await;
        agent
            .handle_event(Event::GetStatusForDomain {
                domain: "example.com".to_string(),
            })
            .await;

        let updates = sink.drain().await;
        assert!(updates.contains(&Outbound::UpdateLatency { latency: Some(120) }));
    }

    #[tokio::test]
    async fn test_start_with_persisted_flag_scans_tabs() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();

        let state_path = dir.path().join("state.json");
        tokio::fs::write(&state_path, r#"{"isMonitoring":true}"#)
            .await
            .unwrap();

        let sink = Arc::new(MemorySink::default());
        let mut config = test_config(&server, &dir);
        config.state_path = state_path.to_string_lossy().into_owned();
        let mut agent = MonitorAgent::new(config, sink.clone()).unwrap();

        agent.start().await.unwrap();

        assert!(agent.is_monitoring());
        assert!(sink.drain().await.contains(&Outbound::QueryTabs));
    }

    #[tokio::test]
    async fn test_toggle_persists_across_agents() {
        let server = MockServer::start().await;
        let dir = tempdir().unwrap();

        let (mut agent, _sink) = agent_with_sink(&server, &dir).await;
        agent
            .handle_event(Event::ToggleMonitoring { is_monitoring: true })
            .await;

        let sink = Arc::new(MemorySink::default());
        let mut next = MonitorAgent::new(test_config(&server, &dir), sink.clone()).unwrap();
        next.start().await.unwrap();
        assert!(next.is_monitoring());
    }
}
