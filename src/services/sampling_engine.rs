//! In-page metrics sampling engine.
//!
//! Two kinds of source feed one [`MetricsSnapshot`]:
//! - polled sources, advanced by [`SamplingEngine::tick`] at display-refresh
//!   cadence, each behind its own throttle;
//! - observer sources, pushed in by the `on_*` callbacks whenever the
//!   platform reports entries.
//!
//! Readers get the snapshot by reference. There is exactly one writer.

use std::collections::{HashSet, VecDeque};

use tracing::debug;

use crate::types::errors::ObserverError;
use crate::types::metrics::{
    LayoutShiftEntry, MetricsSnapshot, ObserverKind, PaintEntry, ResourceEntry,
    FIRST_CONTENTFUL_PAINT,
};
use crate::types::settings::SamplingSettings;

const BYTES_PER_MB: f64 = 1_048_576.0;

/// What the host page can report.
pub trait PagePlatform {
    /// Number of elements in the document.
    fn dom_node_count(&self) -> u64;
    /// Used JS heap in bytes, if the platform exposes it.
    fn used_heap_bytes(&self) -> Option<u64>;
    /// Current contents of the resource-timing buffer.
    fn resource_entries(&self) -> Vec<ResourceEntry>;
    /// Subscribe to an entry type. Fails when the platform does not support it.
    fn observe(&self, kind: ObserverKind) -> Result<(), ObserverError>;
}

/// Trailing-window counter with one delayed decrement per batch.
///
/// Each batch is queued as `(expiry, amount)` and subtracted once, the first
/// time the window is read at or after its expiry. Batches never interfere
/// with each other's expiry.
#[derive(Debug, Clone)]
pub struct LongTaskWindow {
    window_ms: f64,
    pending: VecDeque<(f64, u64)>,
    recent: u64,
}

impl LongTaskWindow {
    pub fn new(window_ms: f64) -> Self {
        Self {
            window_ms,
            pending: VecDeque::new(),
            recent: 0,
        }
    }

    /// Add a batch of `count` tasks observed at `now_ms`.
    pub fn record(&mut self, count: u64, now_ms: f64) {
        if count == 0 {
            return;
        }
        let expiry = now_ms + self.window_ms;
        // Keep the queue ordered by expiry even if callers' clocks interleave.
        let at = self.pending.partition_point(|&(e, _)| e <= expiry);
        self.pending.insert(at, (expiry, count));
        self.recent += count;
    }

    /// Drop every batch whose expiry is at or before `now_ms`; returns the count left.
    pub fn expire(&mut self, now_ms: f64) -> u64 {
        while let Some(&(expiry, amount)) = self.pending.front() {
            if expiry > now_ms {
                break;
            }
            self.pending.pop_front();
            self.recent = self.recent.saturating_sub(amount);
        }
        self.recent
    }

    pub fn recent(&self) -> u64 {
        self.recent
    }

    /// Batches still waiting for their decrement.
    pub fn pending_batches(&self) -> usize {
        self.pending.len()
    }
}

/// Aggregates polled and observed page signals into one snapshot.
pub struct SamplingEngine {
    settings: SamplingSettings,
    snapshot: MetricsSnapshot,
    fps_frames: u64,
    fps_window_start: Option<f64>,
    dom_last: Option<f64>,
    memory_last: Option<f64>,
    network_last: Option<f64>,
    long_tasks: LongTaskWindow,
    observing: HashSet<ObserverKind>,
}

impl SamplingEngine {
    pub fn new(settings: SamplingSettings) -> Self {
        Self {
            snapshot: MetricsSnapshot::with_history_len(settings.history_len),
            long_tasks: LongTaskWindow::new(settings.long_task_window_ms),
            settings,
            fps_frames: 0,
            fps_window_start: None,
            dom_last: None,
            memory_last: None,
            network_last: None,
            observing: HashSet::new(),
        }
    }

    /// The current snapshot. This is the live record, not a copy.
    pub fn snapshot(&self) -> &MetricsSnapshot {
        &self.snapshot
    }

    pub fn settings(&self) -> &SamplingSettings {
        &self.settings
    }

    pub fn is_observing(&self, kind: ObserverKind) -> bool {
        self.observing.contains(&kind)
    }

    /// Register every observer kind independently. An unsupported kind only
    /// leaves its own field untouched.
    pub fn init_observers<P: PagePlatform>(&mut self, platform: &P) {
        for kind in ObserverKind::ALL {
            match platform.observe(kind) {
                Ok(()) => {
                    self.observing.insert(kind);
                }
                Err(e) => debug!(error = %e, "observer not registered"),
            }
        }
    }

    /// One driver invocation. Each polled source advances only when its own
    /// interval has elapsed.
    pub fn tick<P: PagePlatform>(&mut self, now_ms: f64, platform: &P) -> &MetricsSnapshot {
        self.sample_fps(now_ms);

        if Self::due(&mut self.dom_last, now_ms, self.settings.dom_interval_ms) {
            let dom = platform.dom_node_count() as f64;
            self.snapshot.dom = dom;
            self.snapshot.dom_history.push(dom);
        }

        if Self::due(&mut self.memory_last, now_ms, self.settings.memory_interval_ms) {
            if let Some(bytes) = platform.used_heap_bytes() {
                let mb = (bytes as f64 / BYTES_PER_MB).round();
                self.snapshot.memory = mb;
                self.snapshot.memory_history.push(mb);
            }
        }

        if Self::due(&mut self.network_last, now_ms, self.settings.network_interval_ms) {
            let entries = platform.resource_entries();
            self.snapshot.net_requests = entries.len() as u64;
            self.snapshot.net_size = entries.iter().map(|e| e.transfer_size).sum();
        }

        self.expire(now_ms);
        &self.snapshot
    }

    /// Layout shifts caused by recent user input do not count.
    pub fn on_layout_shift(&mut self, entries: &[LayoutShiftEntry]) {
        if !self.is_observing(ObserverKind::LayoutShift) {
            return;
        }
        self.snapshot.cls += entries
            .iter()
            .filter(|e| !e.had_recent_input)
            .map(|e| e.value)
            .sum::<f64>();
    }

    /// A batch of `count` long tasks reported at `now_ms`.
    pub fn on_long_tasks(&mut self, count: u64, now_ms: f64) {
        if !self.is_observing(ObserverKind::LongTask) {
            return;
        }
        self.snapshot.long_tasks += count;
        self.long_tasks.record(count, now_ms);
        self.expire(now_ms);
    }

    /// Latest largest-contentful-paint candidate wins.
    pub fn on_largest_paint(&mut self, entries: &[PaintEntry]) {
        if !self.is_observing(ObserverKind::LargestContentfulPaint) {
            return;
        }
        if let Some(last) = entries.last() {
            self.snapshot.lcp = Some(last.start_time.round());
        }
    }

    /// First-contentful-paint is written once and then latched.
    pub fn on_paint(&mut self, entries: &[PaintEntry]) {
        if !self.is_observing(ObserverKind::Paint) || self.snapshot.fcp.is_some() {
            return;
        }
        if let Some(fcp) = entries.iter().find(|e| e.name == FIRST_CONTENTFUL_PAINT) {
            self.snapshot.fcp = Some(fcp.start_time.round());
        }
    }

    /// Apply every long-task decrement due at `now_ms`.
    pub fn expire(&mut self, now_ms: f64) {
        self.snapshot.long_tasks_recent = self.long_tasks.expire(now_ms);
    }

    fn sample_fps(&mut self, now_ms: f64) {
        self.fps_frames += 1;
        let start = *self.fps_window_start.get_or_insert(now_ms);
        if now_ms - start >= self.settings.fps_window_ms {
            let fps = self.fps_frames as f64;
            self.snapshot.fps = fps;
            self.snapshot.fps_history.push(fps);
            self.fps_frames = 0;
            self.fps_window_start = Some(now_ms);
        }
    }

    // Throttle check: true (and the timestamp advances) when never run or the
    // interval has elapsed.
    fn due(last: &mut Option<f64>, now_ms: f64, interval_ms: f64) -> bool {
        match *last {
            Some(at) if now_ms - at < interval_ms => false,
            _ => {
                *last = Some(now_ms);
                true
            }
        }
    }
}
