//! Display panel model
//!
//! Folds the agent's outbound messages into render-ready state: the
//! monitoring labels, `{value}ms` strings, and the color-banded confidence
//! percentage. The host UI draws whatever this model says.

use crate::events::{Event, Outbound};

/// Color band for the confidence display.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfidenceBand {
    Green,
    Yellow,
    Red,
    /// No confidence value to show
    Empty,
}

/// Everything the panel renders.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PanelState {
    monitoring: bool,
    website: Option<String>,
    latency_ms: Option<u64>,
    prediction_ms: Option<u64>,
    confidence: Option<f64>,
}

impl PanelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_monitoring(&self) -> bool {
        self.monitoring
    }

    pub fn website(&self) -> Option<&str> {
        self.website.as_deref()
    }

    /// Events to send when the panel opens: ask for the monitoring state,
    /// and refresh metrics for the domain already on display, if any.
    pub fn on_open(&self) -> Vec<Event> {
        let mut events = vec![Event::GetMonitoringState];
        if let Some(website) = &self.website {
            events.push(Event::GetStatusForDomain {
                domain: website.clone(),
            });
        }
        events
    }

    /// Flip monitoring from the panel's toggle control.
    ///
    /// Turning monitoring off clears all displayed metrics immediately,
    /// whatever the server last said. Returns the events to send to the
    /// agent; enabling with a domain on display also refreshes its metrics.
    pub fn toggle(&mut self) -> Vec<Event> {
        self.monitoring = !self.monitoring;

        if !self.monitoring {
            self.clear_metrics();
        }

        let mut events = vec![Event::ToggleMonitoring {
            is_monitoring: self.monitoring,
        }];

        if self.monitoring {
            if let Some(website) = &self.website {
                events.push(Event::GetStatusForDomain {
                    domain: website.clone(),
                });
            }
        }

        events
    }

    /// Fold one outbound message from the agent into the panel.
    pub fn apply(&mut self, update: &Outbound) {
        match update {
            Outbound::UpdateLastWebsite { website } => {
                self.website = Some(website.clone());
            }
            Outbound::UpdateLatency { latency } => {
                self.latency_ms = *latency;
            }
            Outbound::UpdatePrediction { prediction } => {
                self.prediction_ms = *prediction;
            }
            Outbound::UpdateConfidence { confidence } => {
                self.confidence = *confidence;
            }
            Outbound::MonitoringState { is_monitoring } => {
                self.monitoring = *is_monitoring;
            }
            // Addressed to the host, not the panel
            Outbound::QueryTabs => {}
        }
    }

    fn clear_metrics(&mut self) {
        self.latency_ms = None;
        self.prediction_ms = None;
        self.confidence = None;
    }

    pub fn status_label(&self) -> &'static str {
        if self.monitoring { "Active" } else { "Inactive" }
    }

    pub fn toggle_label(&self) -> &'static str {
        if self.monitoring {
            "Stop Monitoring"
        } else {
            "Start Monitoring"
        }
    }

    pub fn website_text(&self) -> String {
        self.website.clone().unwrap_or_else(|| "-".to_string())
    }

    pub fn latency_text(&self) -> String {
        format_ms(self.latency_ms)
    }

    pub fn prediction_text(&self) -> String {
        format_ms(self.prediction_ms)
    }

    /// Confidence as a whole percent, when known
    pub fn confidence_percent(&self) -> Option<u8> {
        self.confidence.map(|c| (c * 100.0).round() as u8)
    }

    pub fn confidence_text(&self) -> String {
        match self.confidence_percent() {
            Some(percent) => format!("{}%", percent),
            None => "-".to_string(),
        }
    }

    pub fn confidence_band(&self) -> ConfidenceBand {
        match self.confidence_percent() {
            Some(percent) if percent >= 80 => ConfidenceBand::Green,
            Some(percent) if percent >= 60 => ConfidenceBand::Yellow,
            Some(_) => ConfidenceBand::Red,
            None => ConfidenceBand::Empty,
        }
    }
}

fn format_ms(value: Option<u64>) -> String {
    match value {
        Some(ms) => format!("{}ms", ms),
        None => "-".to_string(),
    }
}
