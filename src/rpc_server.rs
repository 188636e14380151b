//! DevPulse bridge. Runs the tab coordinator behind newline-delimited JSON
//! on stdin/stdout, for a browser shell that owns the real extension APIs.
//!
//! Inbound:  {"event":"toggle","tabId":7,"url":"https://example.com"}
//!           {"event":"reply","id":3,"result":{"active":false}}
//! Outbound: {"id":3,"command":"sendMessage","tabId":7,"message":{"action":"ping"}}
//!           {"event":"toggled","tabId":7,"outcome":"shown","injected":true,"isPremium":false}
//!
//! Logs go to stderr; stdout carries the protocol only.

use std::io::{self, Stdout};
use std::rc::Rc;
use std::time::{Duration, Instant};

use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::{self, LocalSet};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use devpulse::services::bridge::{dispatch_event, rejection_report, BridgeEvent, StdioBridge};
use devpulse::services::coordinator::TabCoordinator;
use devpulse::services::settings_engine::{SettingsEngine, SettingsEngineTrait};

/// How long in-flight events may keep running once stdin has closed.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

type Bridge = Rc<StdioBridge<Stdout>>;
type Coordinator = TabCoordinator<Bridge, Bridge, Bridge>;

/// Simple rate limiter: max events per second.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    /// Returns true if the event is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        if self.window_start.elapsed().as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("DEVPULSE_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(coordinator: Rc<Coordinator>, bridge: Bridge) {
    let ready = json!({"event": "ready", "version": env!("CARGO_PKG_VERSION")});
    if let Err(e) = bridge.emit(&ready) {
        error!(error = %e, "stdout unavailable");
        return;
    }

    {
        let coordinator = coordinator.clone();
        task::spawn_local(async move {
            let paid = coordinator.refresh_entitlement().await;
            info!(paid, "entitlement loaded");
        });
    }

    // Replies are never rate-limited: a dropped reply would stall a toggle.
    let mut rate_limiter = RateLimiter::new(200);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let event: BridgeEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                let _ = bridge.emit(&json!({"event": "error", "error": format!("parse error: {}", e)}));
                continue;
            }
        };

        if !matches!(event, BridgeEvent::Reply { .. }) && !rate_limiter.check() {
            warn!("rate limit exceeded");
            let _ = bridge.emit(&rejection_report(&event, "rate limit exceeded"));
            continue;
        }

        let coordinator = coordinator.clone();
        let bridge = bridge.clone();
        task::spawn_local(async move {
            dispatch_event(&coordinator, &bridge, event).await;
        });
    }

    // No more replies can arrive: fail whatever is still waiting so the
    // spawned events can finish.
    let abandoned = bridge.close();
    info!(abandoned, "stdin closed, shutting down");
}

fn main() {
    init_logging();

    let config_path = std::env::var("DEVPULSE_CONFIG").ok();
    let mut settings_engine = SettingsEngine::new(config_path);
    let settings = match settings_engine.load() {
        Ok(settings) => settings,
        Err(e) => {
            warn!(error = %e, path = settings_engine.get_config_path(), "using default settings");
            settings_engine.get_settings().clone()
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "failed to build runtime");
            std::process::exit(1);
        }
    };

    let bridge: Bridge = Rc::new(StdioBridge::new(io::stdout()));
    let coordinator = Rc::new(TabCoordinator::new(
        bridge.clone(),
        bridge.clone(),
        bridge.clone(),
        settings.coordinator,
    ));

    let local = LocalSet::new();
    local.block_on(&runtime, run(coordinator, bridge));

    // Drain events still in flight.
    runtime.block_on(async {
        if tokio::time::timeout(SHUTDOWN_GRACE, local).await.is_err() {
            warn!(grace_ms = SHUTDOWN_GRACE.as_millis() as u64, "in-flight events abandoned at shutdown");
        }
    });
}
