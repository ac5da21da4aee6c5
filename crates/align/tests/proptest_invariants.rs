// Property-based tests for the alignment invariants.
// CI: 256 cases (default). Soak: PROPTEST_CASES=10000 cargo test --release

use proptest::prelude::*;
use volsync_align::aligner::{align, forward_fill};
use volsync_align::config::{AlignConfig, AlignStrategy};
use volsync_align::model::{AlignedRow, Sample, SampleStore, SourceId};

fn config_256() -> ProptestConfig {
    ProptestConfig {
        cases: std::env::var("PROPTEST_CASES")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(256),
        failure_persistence: None,
        ..ProptestConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

/// Sorted samples with irregular gaps (including duplicates) and arbitrary volumes.
fn arb_series(source: SourceId) -> impl Strategy<Value = Vec<Sample>> {
    (0i64..1_000, prop::collection::vec((0i64..40, 0.0f64..1_000.0), 0..40)).prop_map(
        move |(start, steps)| {
            let mut t = start;
            steps
                .into_iter()
                .map(|(gap, volume)| {
                    t += gap;
                    Sample { source, timestamp: t, volume }
                })
                .collect()
        },
    )
}

fn arb_store() -> impl Strategy<Value = SampleStore> {
    (arb_series(SourceId::A), arb_series(SourceId::B)).prop_map(|(a, b)| SampleStore { a, b })
}

fn arb_strategy() -> impl Strategy<Value = AlignStrategy> {
    prop_oneof![
        Just(AlignStrategy::NearestForward),
        Just(AlignStrategy::NearestSymmetric),
        Just(AlignStrategy::ForwardFill),
    ]
}

fn config(strategy: AlignStrategy, tolerance_seconds: u32) -> AlignConfig {
    AlignConfig {
        strategy,
        tolerance_seconds,
        ..AlignConfig::default()
    }
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(config_256())]

    #[test]
    fn timestamps_non_decreasing(store in arb_store(), strategy in arb_strategy(), tol in 0u32..60) {
        let rows = align(&store, &config(strategy, tol));
        for w in rows.windows(2) {
            prop_assert!(w[0].timestamp <= w[1].timestamp);
        }
    }

    #[test]
    fn nearest_forward_matches_are_ahead_within_tolerance(store in arb_store(), tol in 0u32..60) {
        let rows = align(&store, &config(AlignStrategy::NearestForward, tol));
        prop_assert_eq!(rows.len(), store.a.len());
        for (r, a) in rows.iter().zip(&store.a) {
            prop_assert_eq!(r.timestamp, a.timestamp);
            prop_assert_eq!(r.value_a, Some(a.volume));
            if let Some(vb) = r.value_b {
                let witness = store.b.iter().any(|b| {
                    b.volume == vb && b.timestamp >= r.timestamp && b.timestamp - r.timestamp <= i64::from(tol)
                });
                prop_assert!(witness, "no B sample justifies value_b at {}", r.timestamp);
            }
        }
    }

    #[test]
    fn nearest_forward_only_absent_when_nothing_qualifies(store in arb_store(), tol in 0u32..60) {
        let rows = align(&store, &config(AlignStrategy::NearestForward, tol));
        for r in &rows {
            let candidate = store.b.iter().any(|b| {
                b.timestamp >= r.timestamp && b.timestamp - r.timestamp <= i64::from(tol)
            });
            prop_assert_eq!(r.value_b.is_some(), candidate);
        }
    }

    #[test]
    fn nearest_symmetric_picks_a_closest_candidate(store in arb_store(), tol in 0u32..60) {
        let rows = align(&store, &config(AlignStrategy::NearestSymmetric, tol));
        prop_assert_eq!(rows.len(), store.a.len());
        for r in &rows {
            let best = store
                .b
                .iter()
                .map(|b| (b.timestamp - r.timestamp).abs())
                .filter(|d| *d <= i64::from(tol))
                .min();
            match (r.value_b, best) {
                (None, None) => {}
                (Some(vb), Some(d)) => {
                    let witness = store.b.iter().any(|b| b.volume == vb && (b.timestamp - r.timestamp).abs() == d);
                    prop_assert!(witness);
                }
                (got, want) => prop_assert!(false, "value_b {:?} vs best distance {:?}", got, want),
            }
        }
    }

    #[test]
    fn forward_fill_carries_latest_values(store in arb_store()) {
        let rows = forward_fill(&store.a, &store.b);
        prop_assert_eq!(rows.len(), store.a.len() + store.b.len());

        // Once every sample at a timestamp has been emitted, each side holds
        // the most recent sample at or before that timestamp.
        let latest = |samples: &[Sample], t: i64| {
            samples.iter().filter(|s| s.timestamp <= t).last().map(|s| s.volume)
        };
        for (i, r) in rows.iter().enumerate() {
            let closes_group = rows.get(i + 1).map_or(true, |next| next.timestamp != r.timestamp);
            if closes_group {
                prop_assert_eq!(r.value_a, latest(&store.a, r.timestamp));
                prop_assert_eq!(r.value_b, latest(&store.b, r.timestamp));
            }
        }
    }

    #[test]
    fn forward_fill_matches_sorted_merge(store in arb_store()) {
        // Stable sort of A then B by (timestamp, A before B) gives the same event order.
        let mut events: Vec<&Sample> = store.a.iter().chain(store.b.iter()).collect();
        events.sort_by_key(|s| (s.timestamp, s.source));

        let (mut last_a, mut last_b) = (None, None);
        let expected: Vec<AlignedRow> = events
            .into_iter()
            .map(|s| {
                match s.source {
                    SourceId::A => last_a = Some(s.volume),
                    SourceId::B => last_b = Some(s.volume),
                }
                AlignedRow { timestamp: s.timestamp, value_a: last_a, value_b: last_b }
            })
            .collect();

        prop_assert_eq!(forward_fill(&store.a, &store.b), expected);
    }

    #[test]
    fn alignment_is_idempotent(store in arb_store(), strategy in arb_strategy(), tol in 0u32..60) {
        let cfg = config(strategy, tol);
        prop_assert_eq!(align(&store, &cfg), align(&store, &cfg));
    }
}
