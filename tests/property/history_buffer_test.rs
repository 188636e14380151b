//! Property-based tests for the bounded history buffer.
//!
//! Pushing any number of samples keeps at most the capacity, in arrival
//! order, with the oldest samples discarded first.

use devpulse::services::sampling_engine::{PagePlatform, SamplingEngine};
use devpulse::types::errors::ObserverError;
use devpulse::types::metrics::{HistoryBuffer, MetricsSnapshot, ObserverKind, ResourceEntry, HISTORY_MAX};
use devpulse::types::settings::SamplingSettings;
use proptest::prelude::*;

struct BusyPage;

impl PagePlatform for BusyPage {
    fn dom_node_count(&self) -> u64 {
        500
    }

    fn used_heap_bytes(&self) -> Option<u64> {
        Some(64 * 1_048_576)
    }

    fn resource_entries(&self) -> Vec<ResourceEntry> {
        Vec::new()
    }

    fn observe(&self, _kind: ObserverKind) -> Result<(), ObserverError> {
        Ok(())
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn keeps_most_recent_samples_in_order(values in prop::collection::vec(-1e6f64..1e6, 0..200)) {
        let mut buffer = HistoryBuffer::new();
        for &v in &values {
            buffer.push(v);
            prop_assert!(buffer.len() <= HISTORY_MAX);
        }

        let keep = values.len().min(HISTORY_MAX);
        let expected = values[values.len() - keep..].to_vec();
        prop_assert_eq!(buffer.to_vec(), expected);
        prop_assert_eq!(buffer.latest(), values.last().copied());
    }

    #[test]
    fn configured_history_len_never_exceeds_max(history_len in 0usize..1000, ticks in 0u32..250) {
        let settings = SamplingSettings { history_len, ..SamplingSettings::default() };
        let mut engine = SamplingEngine::new(settings);
        let page = BusyPage;
        for i in 0..ticks {
            engine.tick(f64::from(i) * 2000.0, &page);
        }

        let snapshot = engine.snapshot();
        for buffer in [&snapshot.fps_history, &snapshot.dom_history, &snapshot.memory_history] {
            prop_assert!(buffer.len() <= HISTORY_MAX);
            prop_assert!(buffer.capacity() <= HISTORY_MAX);
        }
    }

    #[test]
    fn custom_capacity_is_respected(capacity in 1usize..20, count in 0usize..100) {
        let mut buffer = HistoryBuffer::with_capacity(capacity);
        for i in 0..count {
            buffer.push(i as f64);
        }
        prop_assert_eq!(buffer.len(), count.min(capacity));
        if count > 0 {
            let first = buffer.iter().next().unwrap();
            prop_assert_eq!(first, count.saturating_sub(capacity) as f64);
        }
    }
}

#[test]
fn test_sixty_one_pushes_evict_the_first() {
    let mut buffer = HistoryBuffer::new();
    for i in 0..61 {
        buffer.push(i as f64);
    }
    assert_eq!(buffer.len(), 60);
    assert_eq!(buffer.iter().next(), Some(1.0));
    assert_eq!(buffer.latest(), Some(60.0));
}

#[test]
fn test_zero_capacity_is_raised_to_one() {
    let mut buffer = HistoryBuffer::with_capacity(0);
    buffer.push(1.0);
    buffer.push(2.0);
    assert_eq!(buffer.capacity(), 1);
    assert_eq!(buffer.to_vec(), vec![2.0]);
}

#[test]
fn test_oversize_capacity_is_capped() {
    let mut buffer = HistoryBuffer::with_capacity(100);
    for i in 0..200 {
        buffer.push(i as f64);
    }
    assert_eq!(buffer.capacity(), HISTORY_MAX);
    assert_eq!(buffer.len(), HISTORY_MAX);
    assert_eq!(buffer.iter().next(), Some(140.0));
}

#[test]
fn test_deserialized_snapshot_regains_configured_capacity() {
    let mut snapshot = MetricsSnapshot::with_history_len(10);
    for i in 0..15 {
        snapshot.dom_history.push(i as f64);
    }

    let json = serde_json::to_string(&snapshot).unwrap();
    let decoded: MetricsSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(decoded.dom_history.capacity(), HISTORY_MAX);

    let restored = decoded.with_history_capacity(10);
    assert_eq!(restored, snapshot);
    assert_eq!(restored.dom_history.capacity(), 10);
    assert_eq!(restored.dom_history.iter().next(), Some(5.0));
}

#[test]
fn test_resize_keeps_newest_samples() {
    let mut buffer = HistoryBuffer::new();
    for i in 0..30 {
        buffer.push(i as f64);
    }
    let smaller = buffer.resized(5);
    assert_eq!(smaller.to_vec(), vec![25.0, 26.0, 27.0, 28.0, 29.0]);
}
