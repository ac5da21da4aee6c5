use crate::model::{SampleStore, SourceId, Summary};

/// Build the latest-reading summary from the unaligned per-source sequences.
///
/// Works on the raw store rather than aligned rows so that a sample the
/// aligner could not pair still counts as the source's latest reading.
pub fn evaluate(store: &SampleStore, alert_threshold_percent: f64) -> Summary {
    let latest_a = store.latest(SourceId::A);
    let latest_b = store.latest(SourceId::B);

    let last_a = latest_a.map(|s| s.volume);
    let last_b = latest_b.map(|s| s.volume);

    let last_timestamp = match (latest_a, latest_b) {
        (Some(a), Some(b)) => Some(a.timestamp.max(b.timestamp)),
        (Some(a), None) => Some(a.timestamp),
        (None, Some(b)) => Some(b.timestamp),
        (None, None) => None,
    };

    let discrepancy_ratio = match (last_a, last_b) {
        (Some(a), Some(b)) => discrepancy_ratio(a, b),
        _ => None,
    };

    Summary {
        last_a,
        last_b,
        last_timestamp,
        discrepancy_ratio,
        alert: discrepancy_ratio.is_some_and(|r| exceeds_threshold(r, alert_threshold_percent)),
    }
}

/// `|a - b| / max(a, b)`, undefined when the larger reading is not positive.
pub fn discrepancy_ratio(a: f64, b: f64) -> Option<f64> {
    let max = a.max(b);
    if max > 0.0 {
        Some((a - b).abs() / max)
    } else {
        None
    }
}

/// Strict comparison: a ratio exactly at the threshold does not alert.
pub fn exceeds_threshold(ratio: f64, alert_threshold_percent: f64) -> bool {
    ratio > alert_threshold_percent / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Sample;

    fn store(a: &[(i64, f64)], b: &[(i64, f64)]) -> SampleStore {
        let to = |source, points: &[(i64, f64)]| {
            points
                .iter()
                .map(|&(timestamp, volume)| Sample { source, timestamp, volume })
                .collect()
        };
        SampleStore {
            a: to(SourceId::A, a),
            b: to(SourceId::B, b),
        }
    }

    #[test]
    fn threshold_boundary_does_not_alert() {
        let s = evaluate(&store(&[(10, 100.0)], &[(12, 92.0)]), 8.0);
        assert_eq!(s.discrepancy_ratio, Some(0.08));
        assert!(!s.alert);
    }

    #[test]
    fn above_threshold_alerts() {
        let s = evaluate(&store(&[(10, 100.0)], &[(12, 91.0)]), 8.0);
        assert_eq!(s.discrepancy_ratio, Some(0.09));
        assert!(s.alert);
    }

    #[test]
    fn ratio_uses_larger_reading_as_denominator() {
        let s = evaluate(&store(&[(10, 50.0)], &[(12, 100.0)]), 8.0);
        assert_eq!(s.discrepancy_ratio, Some(0.5));
    }

    #[test]
    fn equal_readings_give_zero_ratio() {
        let s = evaluate(&store(&[(10, 42.0)], &[(10, 42.0)]), 0.0);
        assert_eq!(s.discrepancy_ratio, Some(0.0));
        assert!(!s.alert);
    }

    #[test]
    fn one_empty_source_has_no_ratio() {
        let s = evaluate(&store(&[(10, 42.0)], &[]), 8.0);
        assert_eq!(s.last_a, Some(42.0));
        assert_eq!(s.last_b, None);
        assert_eq!(s.last_timestamp, Some(10));
        assert_eq!(s.discrepancy_ratio, None);
        assert!(!s.alert);
    }

    #[test]
    fn both_zero_has_no_ratio() {
        let s = evaluate(&store(&[(10, 0.0)], &[(11, 0.0)]), 8.0);
        assert_eq!(s.discrepancy_ratio, None);
    }

    #[test]
    fn empty_store() {
        let s = evaluate(&SampleStore::default(), 8.0);
        assert_eq!(
            s,
            Summary {
                last_a: None,
                last_b: None,
                last_timestamp: None,
                discrepancy_ratio: None,
                alert: false,
            }
        );
    }

    #[test]
    fn last_timestamp_is_latest_of_both() {
        let s = evaluate(&store(&[(10, 1.0), (50, 2.0)], &[(40, 2.0)]), 8.0);
        assert_eq!(s.last_timestamp, Some(50));
        assert_eq!(s.last_a, Some(2.0));
    }
}
