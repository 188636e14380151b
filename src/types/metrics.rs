use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Default number of samples kept per history buffer.
pub const HISTORY_MAX: usize = 60;

/// Bounded FIFO of recent samples. The oldest sample is evicted first once
/// the buffer is full.
///
/// Serializes as a plain array of samples. The capacity is not part of the
/// wire form: a deserialized buffer always has `HISTORY_MAX` capacity and
/// keeps the most recent `HISTORY_MAX` samples. Use [`HistoryBuffer::resized`]
/// to restore a smaller configured capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<f64>", from = "Vec<f64>")]
pub struct HistoryBuffer {
    samples: VecDeque<f64>,
    capacity: usize,
}

impl HistoryBuffer {
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_MAX)
    }

    /// A buffer holding at most `capacity` samples, clamped to `1..=HISTORY_MAX`.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.clamp(1, HISTORY_MAX);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, value: f64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(value);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Most recent sample, if any.
    pub fn latest(&self) -> Option<f64> {
        self.samples.back().copied()
    }

    /// Samples in arrival order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.samples.iter().copied().collect()
    }

    /// The same samples under a new capacity; the oldest are dropped if they
    /// no longer fit.
    pub fn resized(&self, capacity: usize) -> Self {
        let mut buffer = HistoryBuffer::with_capacity(capacity);
        for value in self.iter() {
            buffer.push(value);
        }
        buffer
    }
}

impl Default for HistoryBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl From<HistoryBuffer> for Vec<f64> {
    fn from(buffer: HistoryBuffer) -> Self {
        buffer.samples.into_iter().collect()
    }
}

impl From<Vec<f64>> for HistoryBuffer {
    fn from(values: Vec<f64>) -> Self {
        let mut buffer = HistoryBuffer::new();
        for value in values {
            buffer.push(value);
        }
        buffer
    }
}

/// The single shared record of page metrics served to the overlay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Frames counted over the last completed one-second window.
    pub fps: f64,
    pub fps_history: HistoryBuffer,
    /// Element count of the document.
    pub dom: f64,
    pub dom_history: HistoryBuffer,
    /// Used JS heap, whole megabytes.
    pub memory: f64,
    pub memory_history: HistoryBuffer,
    /// Cumulative layout-shift score, excluding input-driven shifts.
    pub cls: f64,
    pub long_tasks: u64,
    /// Long tasks reported in the trailing window.
    pub long_tasks_recent: u64,
    /// Largest contentful paint, rounded milliseconds.
    pub lcp: Option<f64>,
    /// First contentful paint, rounded milliseconds.
    pub fcp: Option<f64>,
    pub net_requests: u64,
    /// Cumulative transferred bytes across resource-timing entries.
    pub net_size: u64,
}

impl MetricsSnapshot {
    /// Empty snapshot whose history buffers hold `history_len` samples.
    pub fn with_history_len(history_len: usize) -> Self {
        Self {
            fps_history: HistoryBuffer::with_capacity(history_len),
            dom_history: HistoryBuffer::with_capacity(history_len),
            memory_history: HistoryBuffer::with_capacity(history_len),
            ..Self::default()
        }
    }

    /// Re-apply a configured history length, e.g. after deserializing.
    pub fn with_history_capacity(mut self, history_len: usize) -> Self {
        self.fps_history = self.fps_history.resized(history_len);
        self.dom_history = self.dom_history.resized(history_len);
        self.memory_history = self.memory_history.resized(history_len);
        self
    }
}

/// Performance signals the engine can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ObserverKind {
    LayoutShift,
    #[serde(rename = "longtask")]
    LongTask,
    LargestContentfulPaint,
    Paint,
}

impl ObserverKind {
    pub const ALL: [ObserverKind; 4] = [
        ObserverKind::LayoutShift,
        ObserverKind::LongTask,
        ObserverKind::LargestContentfulPaint,
        ObserverKind::Paint,
    ];

    /// Entry type name as reported by the platform.
    pub fn entry_type(&self) -> &'static str {
        match self {
            ObserverKind::LayoutShift => "layout-shift",
            ObserverKind::LongTask => "longtask",
            ObserverKind::LargestContentfulPaint => "largest-contentful-paint",
            ObserverKind::Paint => "paint",
        }
    }
}

/// A reported layout shift.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutShiftEntry {
    pub value: f64,
    pub had_recent_input: bool,
}

/// A paint or largest-contentful-paint entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaintEntry {
    pub name: String,
    pub start_time: f64,
}

/// Paint entry name that latches first-contentful-paint.
pub const FIRST_CONTENTFUL_PAINT: &str = "first-contentful-paint";

/// A resource-timing entry. Cross-origin entries without timing-allow report zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceEntry {
    #[serde(default)]
    pub transfer_size: u64,
}
