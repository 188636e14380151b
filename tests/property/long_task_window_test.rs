//! Property-based tests for the trailing long-task window.
//!
//! A batch of size k recorded at t contributes +k on [t, t + window) and is
//! subtracted exactly once at t + window, independently of other batches.

use devpulse::services::sampling_engine::LongTaskWindow;
use proptest::prelude::*;

const WINDOW_MS: f64 = 5000.0;

fn arb_batches() -> impl Strategy<Value = Vec<(u64, u64)>> {
    // (time offset in ms, batch size), times generated in order below
    prop::collection::vec((0u64..3000, 1u64..10), 1..30)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn recent_equals_sum_of_unexpired_batches(batches in arb_batches(), sample_offsets in prop::collection::vec(0u64..20_000, 1..20)) {
        let mut window = LongTaskWindow::new(WINDOW_MS);
        let mut t = 0u64;
        let mut recorded = Vec::new();
        for (gap, size) in &batches {
            t += gap;
            window.record(*size, t as f64);
            recorded.push((t, *size));
        }

        let mut sample_times: Vec<u64> = sample_offsets.iter().map(|p| t + p).collect();
        sample_times.sort_unstable();
        for now in sample_times {
            let expected: u64 = recorded
                .iter()
                .filter(|(at, _)| (now as f64) < *at as f64 + WINDOW_MS)
                .map(|(_, size)| size)
                .sum();
            prop_assert_eq!(window.expire(now as f64), expected);
        }
    }

    #[test]
    fn each_batch_reverts_exactly_once(size in 1u64..50, at in 0u64..10_000) {
        let mut window = LongTaskWindow::new(WINDOW_MS);
        let at = at as f64;
        window.record(size, at);

        prop_assert_eq!(window.expire(at), size);
        prop_assert_eq!(window.expire(at + WINDOW_MS - 1.0), size);
        prop_assert_eq!(window.expire(at + WINDOW_MS), 0);
        prop_assert_eq!(window.expire(at + 2.0 * WINDOW_MS), 0);
        prop_assert_eq!(window.pending_batches(), 0);
    }
}

#[test]
fn test_out_of_order_batches_expire_by_their_own_deadline() {
    let mut window = LongTaskWindow::new(WINDOW_MS);
    window.record(4, 2000.0);
    window.record(1, 1000.0);

    assert_eq!(window.expire(6000.0), 4);
    assert_eq!(window.expire(7000.0), 0);
}

#[test]
fn test_zero_sized_batch_is_ignored() {
    let mut window = LongTaskWindow::new(WINDOW_MS);
    window.record(0, 0.0);
    assert_eq!(window.pending_batches(), 0);
    assert_eq!(window.recent(), 0);
}
