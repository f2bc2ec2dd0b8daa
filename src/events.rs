//! Wire protocol between the host runtime, the monitor agent, and the panel
//!
//! Every message is a single JSON object discriminated by its `action` field.

use serde::{Deserialize, Serialize};

/// Inbound events delivered by the host runtime.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Event {
    /// Top-level navigation finished loading
    NavigationCompleted {
        url: String,
        #[serde(default)]
        frame_id: u64,
    },

    /// A tab changed state; only `status == "complete"` is acted on
    TabUpdated {
        url: String,
        #[serde(default)]
        status: String,
    },

    /// The user switched to another tab
    TabActivated { url: String },

    /// The host's answer to a `queryTabs` request
    TabsSnapshot { urls: Vec<String> },

    /// The panel toggled monitoring
    ToggleMonitoring { is_monitoring: bool },

    /// The panel asked for the current monitoring state
    GetMonitoringState,

    /// The panel asked for fresh metrics for a domain
    GetStatusForDomain { domain: String },
}

/// Outbound messages published by the monitor agent.
///
/// The three metric updates carry `null` payloads when the domain has no
/// data, which tells the panel to clear any stale value it is showing.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Outbound {
    /// The most recently visited domain changed
    UpdateLastWebsite { website: String },

    /// Measured latency for the current domain, in whole milliseconds
    UpdateLatency { latency: Option<u64> },

    /// Predicted latency for the current domain, in whole milliseconds
    UpdatePrediction { prediction: Option<u64> },

    /// Prediction confidence for the current domain, in [0, 1]
    UpdateConfidence { confidence: Option<f64> },

    /// Response to `getMonitoringState`
    MonitoringState { is_monitoring: bool },

    /// Ask the host for a snapshot of its currently open tabs
    QueryTabs,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_action_tags_match_protocol() {
        let event = Event::ToggleMonitoring { is_monitoring: true };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""action":"toggleMonitoring""#));
        assert!(json.contains(r#""isMonitoring":true"#));

        let event = Event::GetStatusForDomain {
            domain: "example.com".to_string(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""action":"getStatusForDomain""#));
    }

    #[test]
    fn test_parses_host_navigation_event() {
        let event: Event = serde_json::from_str(
            r#"{"action": "navigationCompleted", "url": "https://example.com/", "frameId": 0}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            Event::NavigationCompleted {
                url: "https://example.com/".to_string(),
                frame_id: 0,
            }
        );
    }

    #[test]
    fn test_null_metric_update_round_trips() {
        let update = Outbound::UpdateLatency { latency: None };
        let json = serde_json::to_string(&update).unwrap();
        assert_eq!(json, r#"{"action":"updateLatency","latency":null}"#);

        let parsed: Outbound = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, update);
    }

    #[test]
    fn test_query_tabs_is_a_bare_action() {
        let json = serde_json::to_string(&Outbound::QueryTabs).unwrap();
        assert_eq!(json, r#"{"action":"queryTabs"}"#);
    }
}
