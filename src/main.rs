//! Domain Monitor Bridge Binary
//!
//! Runs the monitor agent over newline-delimited JSON: host events arrive on
//! stdin, outbound panel/host messages leave on stdout, logs go to stderr.

use async_trait::async_trait;
use clap::Parser;
use domain_monitor::{Config, Event, MonitorAgent, Outbound, Result, UpdateSink};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "domain_monitor",
    version,
    about = "Records visited domains and relays latency predictions from a local status service"
)]
struct Cli {
    /// Base URL of the status service
    #[arg(long, env = "SERVICE_URL")]
    service_url: Option<String>,

    /// Path to the persisted monitoring state file
    #[arg(long, env = "STATE_PATH")]
    state_path: Option<String>,

    /// HTTP timeout in seconds for status service requests
    #[arg(long, env = "HTTP_TIMEOUT_SECONDS")]
    http_timeout_seconds: Option<u64>,

    /// Skip the open-tab scan when monitoring starts
    #[arg(long, env = "NO_TAB_SCAN")]
    no_tab_scan: bool,
}

impl Cli {
    fn into_config(self) -> Config {
        let mut config = Config::default();

        if let Some(service_url) = self.service_url {
            config.service_url = service_url;
        }
        if let Some(state_path) = self.state_path {
            config.state_path = state_path;
        }
        if let Some(seconds) = self.http_timeout_seconds {
            config.http_timeout = Duration::from_secs(seconds);
        }
        config.scan_tabs_on_start = !self.no_tab_scan;

        config
    }
}

/// Writes outbound messages one JSON object per line on stdout
struct StdoutSink {
    out: tokio::sync::Mutex<tokio::io::Stdout>,
}

impl StdoutSink {
    fn new() -> Self {
        Self {
            out: tokio::sync::Mutex::new(tokio::io::stdout()),
        }
    }
}

#[async_trait]
impl UpdateSink for StdoutSink {
    async fn publish(&self, update: Outbound) -> Result<()> {
        let line = serde_json::to_string(&update)?;

        let mut out = self.out.lock().await;
        out.write_all(line.as_bytes()).await?;
        out.write_all(b"\n").await?;
        out.flush().await?;
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    initialize_tracing();

    info!("Starting domain monitor v{}", env!("CARGO_PKG_VERSION"));

    let config = Cli::parse().into_config();

    if let Err(e) = config.validate() {
        error!("Configuration validation failed: {}", e);
        std::process::exit(1);
    }

    info!(
        "Monitor configuration - Service: {}, State: {}",
        config.service_url, config.state_path
    );

    let sink = Arc::new(StdoutSink::new());
    let mut agent = MonitorAgent::new(config, sink)?;
    agent.start().await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<Event>(line) {
                        Ok(event) => agent.handle_event(event).await,
                        Err(e) => warn!("Ignoring malformed event: {}", e),
                    }
                }
                Ok(None) => {
                    info!("Event stream closed");
                    break;
                }
                Err(e) => {
                    error!("Failed to read event stream: {}", e);
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    agent.shutdown();
    Ok(())
}

/// Initialize structured logging on stderr (stdout carries the protocol)
fn initialize_tracing() {
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr)
        .json();

    let filter_layer = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(&log_level))
        .unwrap();

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();
}
