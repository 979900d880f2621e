use std::thread;
use std::time::{Duration, Instant};

use proptest::prelude::*;

use winch_core::encoder::EncoderHandle;
use winch_core::mocks::ManualClock;
use winch_traits::Clock;

proptest! {
    // The count is exactly the signed sum of per-edge contributions, for any
    // sequence of A/B level pairs.
    #[test]
    fn count_is_signed_sum_of_edges(
        edges in proptest::collection::vec((any::<bool>(), any::<bool>()), 0..500)
    ) {
        let enc = EncoderHandle::new(Instant::now());
        let mut expected = 0i32;
        for &(a, b) in &edges {
            enc.record_edge(a, b, Instant::now());
            expected += if a == b { 1 } else { -1 };
        }
        prop_assert_eq!(enc.snapshot().count, expected);
    }
}

#[test]
fn each_edge_refreshes_last_change() {
    let clock = ManualClock::new();
    let enc = EncoderHandle::new(clock.now());

    clock.advance(Duration::from_millis(250));
    let t1 = clock.now();
    enc.record_edge(true, true, t1);
    assert_eq!(enc.snapshot().last_change, t1);

    clock.advance(Duration::from_millis(250));
    let t2 = clock.now();
    enc.record_edge(true, false, t2);
    assert_eq!(enc.snapshot().last_change, t2);
}

#[test]
fn concurrent_channels_stay_independent() {
    // Simultaneous edges on different channels touch disjoint state.
    let enc_a = EncoderHandle::new(Instant::now());
    let enc_b = EncoderHandle::new(Instant::now());

    let writer_a = {
        let enc = enc_a.clone();
        thread::spawn(move || {
            for _ in 0..10_000 {
                enc.record_edge(true, true, Instant::now());
            }
        })
    };
    let writer_b = {
        let enc = enc_b.clone();
        thread::spawn(move || {
            for _ in 0..10_000 {
                enc.record_edge(true, false, Instant::now());
            }
        })
    };
    writer_a.join().expect("writer a");
    writer_b.join().expect("writer b");

    assert_eq!(enc_a.snapshot().count, 10_000);
    assert_eq!(enc_b.snapshot().count, -10_000);
}

#[test]
fn snapshots_never_tear_under_load() {
    // A reader hammering snapshots while the writer advances by +1 per edge
    // must only ever observe values the writer actually produced.
    let enc = EncoderHandle::new(Instant::now());
    let writer = {
        let enc = enc.clone();
        thread::spawn(move || {
            for _ in 0..50_000 {
                enc.record_edge(false, false, Instant::now());
            }
        })
    };

    let mut last = 0i32;
    while !writer.is_finished() {
        let snap = enc.snapshot();
        assert!(snap.count >= last, "count went backwards: {} -> {}", last, snap.count);
        assert!(snap.count <= 50_000);
        last = snap.count;
    }
    writer.join().expect("writer");
    assert_eq!(enc.snapshot().count, 50_000);
}
