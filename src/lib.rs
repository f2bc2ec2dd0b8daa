//! Domain Latency Monitor Library
//!
//! This library provides components for recording the domains a user visits
//! and relaying latency/prediction/confidence metrics from a local status
//! service to a display panel.

pub mod agent;
pub mod config;
pub mod domain;
pub mod errors;
pub mod events;
pub mod panel;
pub mod session;
pub mod status;
pub mod storage;

pub use agent::{MonitorAgent, UpdateSink};
pub use config::Config;
pub use errors::{MonitorError, Result};
pub use events::{Event, Outbound};
pub use panel::{ConfidenceBand, PanelState};
pub use session::{Effect, SessionState};
pub use status::{DomainMetrics, StatusClient, StatusEntry};
pub use storage::StateStore;
