use serde::{Deserialize, Serialize};

use super::metrics::HISTORY_MAX;

/// Top-level DevPulse settings container. Missing keys fall back to defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DevPulseSettings {
    pub coordinator: CoordinatorSettings,
    pub sampling: SamplingSettings,
}

/// Tab coordinator timing and origin rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CoordinatorSettings {
    /// Pause between a successful injection and the `init` send.
    pub settle_delay_ms: u64,
    /// Upper bound on the presence check round-trip.
    pub presence_timeout_ms: u64,
    /// Upper bound on every other coordinator → page send.
    pub message_timeout_ms: u64,
    /// URL prefixes whose pages load the instrumentation themselves.
    pub local_origins: Vec<String>,
    /// Instrumentation payload installed on demand.
    pub script_file: String,
    /// Re-fetch the entitlement when the cached value is older than this.
    /// `None` keeps it push-only.
    pub entitlement_revalidate_secs: Option<u64>,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            settle_delay_ms: 200,
            presence_timeout_ms: 500,
            message_timeout_ms: 2000,
            local_origins: vec![
                "http://localhost".to_string(),
                "http://127.0.0.1".to_string(),
            ],
            script_file: "content/devpulse.js".to_string(),
            entitlement_revalidate_secs: None,
        }
    }
}

/// Sampling engine throttles and buffer sizes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SamplingSettings {
    /// Samples kept per history buffer; values above 60 are capped.
    pub history_len: usize,
    pub fps_window_ms: f64,
    pub dom_interval_ms: f64,
    pub memory_interval_ms: f64,
    pub network_interval_ms: f64,
    pub long_task_window_ms: f64,
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            history_len: HISTORY_MAX,
            fps_window_ms: 1000.0,
            dom_interval_ms: 1000.0,
            memory_interval_ms: 2000.0,
            network_interval_ms: 2000.0,
            long_task_window_ms: 5000.0,
        }
    }
}
