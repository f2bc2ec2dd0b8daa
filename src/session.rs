//! Pure session core for the monitor agent
//!
//! Event handling is a pure transition: `(Event, SessionState)` produces a
//! new state plus a list of effects for the agent to execute. The host event
//! loop and all I/O stay outside this module, which keeps every monitoring
//! rule unit-testable without a runtime.

use crate::domain::extract_domain;
use crate::events::{Event, Outbound};
use tracing::{debug, warn};

/// Mutable session state owned by the monitor agent.
///
/// `monitoring` mirrors the persisted flag; `last_domain` is transient,
/// in-memory only.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SessionState {
    monitoring: bool,
    last_domain: Option<String>,
}

impl SessionState {
    pub fn new(monitoring: bool) -> Self {
        Self {
            monitoring,
            last_domain: None,
        }
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitoring
    }

    pub fn last_domain(&self) -> Option<&str> {
        self.last_domain.as_deref()
    }
}

/// Side effects requested by a session transition.
#[derive(Clone, Debug, PartialEq)]
pub enum Effect {
    /// Publish an outbound message to the panel/host
    Publish(Outbound),

    /// Report a visited domain to the status service, then relay its metrics
    Report(String),

    /// Relay metrics for a domain without reporting a visit
    FetchStatus(String),

    /// Ask the host for its open-tab snapshot
    QueryTabs,

    /// Persist the monitoring flag
    SaveState(bool),
}

/// Apply one inbound event to the session.
pub fn handle(event: Event, state: &mut SessionState) -> Vec<Effect> {
    let mut effects = Vec::new();

    match event {
        Event::NavigationCompleted { url, frame_id } => {
            // Sub-frame loads never count as a visit
            if frame_id == 0 {
                record_visit(&url, state, &mut effects);
            }
        }

        Event::TabUpdated { url, status } => {
            if status == "complete" {
                record_visit(&url, state, &mut effects);
            }
        }

        Event::TabActivated { url } => {
            // Keeps the displayed domain current whether or not monitoring
            // is enabled; activation alone is not a visit to report.
            match extract_domain(&url) {
                Ok(Some(domain)) => {
                    state.last_domain = Some(domain.clone());
                    effects.push(Effect::Publish(Outbound::UpdateLastWebsite {
                        website: domain,
                    }));
                }
                Ok(None) => debug!("Ignoring internal page activation: {}", url),
                Err(e) => warn!("Skipping tab activation: {}", e),
            }
        }

        Event::TabsSnapshot { urls } => {
            debug!("Registering {} open tabs", urls.len());
            for url in &urls {
                record_visit(url, state, &mut effects);
            }
        }

        Event::ToggleMonitoring { is_monitoring } => {
            let was_monitoring = state.monitoring;
            state.monitoring = is_monitoring;
            effects.push(Effect::SaveState(is_monitoring));

            if is_monitoring && !was_monitoring {
                effects.push(Effect::QueryTabs);
            }
        }

        Event::GetMonitoringState => {
            effects.push(Effect::Publish(Outbound::MonitoringState {
                is_monitoring: state.monitoring,
            }));

            // A freshly opened panel also needs the domain on display
            if let Some(domain) = &state.last_domain {
                effects.push(Effect::Publish(Outbound::UpdateLastWebsite {
                    website: domain.clone(),
                }));
            }
        }

        Event::GetStatusForDomain { domain } => {
            effects.push(Effect::FetchStatus(domain));
        }
    }

    effects
}

/// Record a visited URL: extract the domain, remember it, tell the panel,
/// and report it when monitoring is enabled.
fn record_visit(url: &str, state: &mut SessionState, effects: &mut Vec<Effect>) {
    let domain = match extract_domain(url) {
        Ok(Some(domain)) => domain,
        Ok(None) => {
            debug!("Ignoring internal page: {}", url);
            return;
        }
        Err(e) => {
            warn!("Skipping visit: {}", e);
            return;
        }
    };

    state.last_domain = Some(domain.clone());
    effects.push(Effect::Publish(Outbound::UpdateLastWebsite {
        website: domain.clone(),
    }));

    if state.monitoring {
        effects.push(Effect::Report(domain));
    }
}
