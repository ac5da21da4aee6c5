//! Alignment strategies: merge two sorted sample sequences into one timeline.
//!
//! All strategies are pure and expect each input slice sorted ascending by
//! timestamp (as produced by [`crate::store::ingest`]). Unsorted input never
//! panics, it only loses the ordering guarantees.

use crate::config::{AlignConfig, AlignStrategy};
use crate::model::{AlignedRow, Sample, SampleStore, SourceId};

/// Align the two sequences of `store` using the configured strategy.
pub fn align(store: &SampleStore, config: &AlignConfig) -> Vec<AlignedRow> {
    let tolerance = u64::from(config.tolerance_seconds);
    let reference = config.reference_source;

    match config.strategy {
        AlignStrategy::NearestForward => {
            let (r, o) = (store.get(reference), store.get(reference.other()));
            nearest_rows(r, o, reference, &pair_forward(r, o, tolerance))
        }
        AlignStrategy::NearestSymmetric => {
            let (r, o) = (store.get(reference), store.get(reference.other()));
            nearest_rows(r, o, reference, &pair_symmetric(r, o, tolerance))
        }
        AlignStrategy::ForwardFill => forward_fill(&store.a, &store.b),
    }
}

/// For each reference sample, the index of the earliest `other` sample whose
/// timestamp is in `[ref, ref + tolerance]`.
///
/// The cursor only skips samples that are strictly behind the current
/// reference time; it stays on a match so that one `other` sample can pair
/// with several consecutive reference samples.
pub fn pair_forward(reference: &[Sample], other: &[Sample], tolerance: u64) -> Vec<Option<usize>> {
    let mut cursor = 0;

    reference
        .iter()
        .map(|r| {
            while let Some(o) = other.get(cursor) {
                if o.timestamp < r.timestamp {
                    cursor += 1;
                    continue;
                }
                return (o.timestamp.abs_diff(r.timestamp) <= tolerance).then_some(cursor);
            }
            None
        })
        .collect()
}

/// For each reference sample, the index of the `other` sample closest in time,
/// if within `tolerance`. Ties go to the earlier sample.
pub fn pair_symmetric(reference: &[Sample], other: &[Sample], tolerance: u64) -> Vec<Option<usize>> {
    let mut window_start = 0;

    reference
        .iter()
        .map(|r| {
            // Samples too far behind this reference are too far behind every later one.
            while let Some(o) = other.get(window_start) {
                if o.timestamp < r.timestamp && o.timestamp.abs_diff(r.timestamp) > tolerance {
                    window_start += 1;
                } else {
                    break;
                }
            }

            let mut best: Option<(usize, u64)> = None;
            for (offset, o) in other[window_start..].iter().enumerate() {
                let distance = o.timestamp.abs_diff(r.timestamp);
                if o.timestamp > r.timestamp && distance > tolerance {
                    break;
                }
                if distance <= tolerance && best.map_or(true, |(_, d)| distance < d) {
                    best = Some((window_start + offset, distance));
                }
            }
            best.map(|(index, _)| index)
        })
        .collect()
}

fn nearest_rows(
    reference: &[Sample],
    other: &[Sample],
    reference_source: SourceId,
    pairs: &[Option<usize>],
) -> Vec<AlignedRow> {
    reference
        .iter()
        .zip(pairs)
        .map(|(r, pair)| {
            let matched = pair.and_then(|i| other.get(i)).map(|o| o.volume);
            match reference_source {
                SourceId::A => AlignedRow {
                    timestamp: r.timestamp,
                    value_a: Some(r.volume),
                    value_b: matched,
                },
                SourceId::B => AlignedRow {
                    timestamp: r.timestamp,
                    value_a: matched,
                    value_b: Some(r.volume),
                },
            }
        })
        .collect()
}

/// Chronological merge of both sequences, one row per input sample.
///
/// Each row carries the last value seen so far for each source. On equal
/// timestamps the A sample is emitted first.
pub fn forward_fill(a: &[Sample], b: &[Sample]) -> Vec<AlignedRow> {
    let mut rows = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    let mut last_a = None;
    let mut last_b = None;

    loop {
        let take_a = match (a.get(i), b.get(j)) {
            (Some(sa), Some(sb)) => sa.timestamp <= sb.timestamp,
            (Some(_), None) => true,
            (None, Some(_)) => false,
            (None, None) => break,
        };

        let timestamp = if take_a {
            let s = &a[i];
            i += 1;
            last_a = Some(s.volume);
            s.timestamp
        } else {
            let s = &b[j];
            j += 1;
            last_b = Some(s.volume);
            s.timestamp
        };

        rows.push(AlignedRow {
            timestamp,
            value_a: last_a,
            value_b: last_b,
        });
    }

    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    fn samples(source: SourceId, points: &[(i64, f64)]) -> Vec<Sample> {
        points
            .iter()
            .map(|&(timestamp, volume)| Sample { source, timestamp, volume })
            .collect()
    }

    fn store(a: &[(i64, f64)], b: &[(i64, f64)]) -> SampleStore {
        SampleStore {
            a: samples(SourceId::A, a),
            b: samples(SourceId::B, b),
        }
    }

    fn config(strategy: AlignStrategy, tolerance_seconds: u32) -> AlignConfig {
        AlignConfig {
            strategy,
            tolerance_seconds,
            ..AlignConfig::default()
        }
    }

    fn row(timestamp: i64, value_a: Option<f64>, value_b: Option<f64>) -> AlignedRow {
        AlignedRow { timestamp, value_a, value_b }
    }

    #[test]
    fn nearest_forward_basic_pairing() {
        let s = store(&[(100, 5.0), (130, 6.0)], &[(105, 5.1)]);
        let rows = align(&s, &config(AlignStrategy::NearestForward, 10));
        assert_eq!(rows, vec![row(100, Some(5.0), Some(5.1)), row(130, Some(6.0), None)]);
    }

    #[test]
    fn nearest_forward_never_looks_back() {
        // B at 95 is 5s behind A: the forward variant ignores it.
        let s = store(&[(100, 5.0)], &[(95, 4.9)]);
        let rows = align(&s, &config(AlignStrategy::NearestForward, 10));
        assert_eq!(rows, vec![row(100, Some(5.0), None)]);
    }

    #[test]
    fn nearest_forward_picks_earliest_in_window() {
        let s = store(&[(100, 5.0)], &[(101, 5.1), (108, 5.2)]);
        let rows = align(&s, &config(AlignStrategy::NearestForward, 10));
        assert_eq!(rows[0].value_b, Some(5.1));
    }

    #[test]
    fn nearest_forward_reuses_match_for_consecutive_rows() {
        let s = store(&[(100, 1.0), (102, 2.0)], &[(105, 9.0)]);
        let rows = align(&s, &config(AlignStrategy::NearestForward, 10));
        assert_eq!(rows[0].value_b, Some(9.0));
        assert_eq!(rows[1].value_b, Some(9.0));
    }

    #[test]
    fn nearest_forward_zero_tolerance_requires_equal_timestamps() {
        let s = store(&[(100, 1.0), (200, 2.0)], &[(100, 1.5), (201, 2.5)]);
        let rows = align(&s, &config(AlignStrategy::NearestForward, 0));
        assert_eq!(rows[0].value_b, Some(1.5));
        assert_eq!(rows[1].value_b, None);
    }

    #[test]
    fn nearest_symmetric_looks_both_ways() {
        let s = store(&[(100, 5.0)], &[(95, 4.9), (108, 5.2)]);
        let rows = align(&s, &config(AlignStrategy::NearestSymmetric, 10));
        assert_eq!(rows[0].value_b, Some(4.9));
    }

    #[test]
    fn nearest_symmetric_tie_goes_to_earlier_sample() {
        let s = store(&[(100, 5.0)], &[(96, 4.0), (104, 6.0)]);
        let rows = align(&s, &config(AlignStrategy::NearestSymmetric, 10));
        assert_eq!(rows[0].value_b, Some(4.0));
    }

    #[test]
    fn nearest_symmetric_prefers_closer_later_sample() {
        let s = store(&[(100, 5.0)], &[(93, 4.0), (102, 6.0)]);
        let rows = align(&s, &config(AlignStrategy::NearestSymmetric, 10));
        assert_eq!(rows[0].value_b, Some(6.0));
    }

    #[test]
    fn variants_disagree_when_several_candidates_qualify() {
        let s = store(&[(100, 5.0)], &[(99, 4.0), (109, 6.0)]);
        let forward = align(&s, &config(AlignStrategy::NearestForward, 10));
        let symmetric = align(&s, &config(AlignStrategy::NearestSymmetric, 10));
        assert_eq!(forward[0].value_b, Some(6.0));
        assert_eq!(symmetric[0].value_b, Some(4.0));
    }

    #[test]
    fn reference_b_drives_cardinality() {
        let s = store(&[(100, 5.0), (130, 6.0), (160, 7.0)], &[(95, 4.8)]);
        let mut cfg = config(AlignStrategy::NearestForward, 10);
        cfg.reference_source = SourceId::B;
        let rows = align(&s, &cfg);
        assert_eq!(rows, vec![row(95, Some(5.0), Some(4.8))]);
    }

    #[test]
    fn empty_reference_gives_no_rows() {
        let s = store(&[], &[(10, 2.0)]);
        assert!(align(&s, &config(AlignStrategy::NearestForward, 10)).is_empty());
        assert!(align(&s, &config(AlignStrategy::NearestSymmetric, 10)).is_empty());
    }

    #[test]
    fn forward_fill_empty_a() {
        let s = store(&[], &[(10, 2.0)]);
        let rows = align(&s, &config(AlignStrategy::ForwardFill, 10));
        assert_eq!(rows, vec![row(10, None, Some(2.0))]);
    }

    #[test]
    fn forward_fill_carries_last_known_values() {
        let s = store(&[(10, 1.0), (30, 3.0)], &[(20, 2.0), (30, 2.5), (40, 4.0)]);
        let rows = align(&s, &config(AlignStrategy::ForwardFill, 0));
        assert_eq!(
            rows,
            vec![
                row(10, Some(1.0), None),
                row(20, Some(1.0), Some(2.0)),
                row(30, Some(3.0), Some(2.0)),
                row(30, Some(3.0), Some(2.5)),
                row(40, Some(3.0), Some(4.0)),
            ]
        );
    }

    #[test]
    fn single_samples_do_not_panic() {
        let s = store(&[(5, 1.0)], &[(5, 1.0)]);
        for strategy in [
            AlignStrategy::NearestForward,
            AlignStrategy::NearestSymmetric,
            AlignStrategy::ForwardFill,
        ] {
            let rows = align(&s, &config(strategy, 0));
            assert!(!rows.is_empty());
        }
    }

    #[test]
    fn extreme_timestamps_do_not_overflow() {
        let s = store(&[(i64::MAX, 1.0)], &[(i64::MIN, 2.0), (0, 3.0)]);
        let rows = align(&s, &config(AlignStrategy::NearestSymmetric, u32::MAX));
        assert_eq!(rows[0].value_b, None);
        let rows = align(&s, &config(AlignStrategy::NearestForward, u32::MAX));
        assert_eq!(rows[0].value_b, None);
    }
}
