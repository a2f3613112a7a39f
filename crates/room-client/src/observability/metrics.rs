//! Metric definitions for the room client.
//!
//! Naming follows Prometheus conventions:
//! - `room_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! - `outcome`: `success` plus one value per `RoomError::kind()` (8 max)
//! - `from` / `to`: bounded by `SessionPhase` (5 values each)
//! - `status`: bounded by `ClassStatus` (3 values)

use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Record the outcome of a join attempt.
///
/// Metric: `room_join_attempts_total`
/// Labels: `outcome` (`success`, `auth`, `connection`, `cancelled`, ...)
pub fn record_join_attempt(outcome: &'static str) {
    counter!("room_join_attempts_total", "outcome" => outcome).increment(1);
}

/// Record time from `join()` to Connected.
///
/// Metric: `room_join_duration_seconds`
pub fn record_join_duration(duration: Duration) {
    histogram!("room_join_duration_seconds").record(duration.as_secs_f64());
}

/// Record a session phase change.
///
/// Metric: `room_phase_transitions_total`
/// Labels: `from`, `to`
pub fn record_phase_transition(from: &'static str, to: &'static str) {
    counter!("room_phase_transitions_total", "from" => from, "to" => to).increment(1);
}

/// Set the number of subscribed remote tracks.
///
/// Metric: `room_remote_tracks`
pub fn set_remote_tracks(count: usize) {
    // usize to f64 conversion is safe for realistic track counts
    #[allow(clippy::cast_precision_loss)]
    gauge!("room_remote_tracks").set(count as f64);
}

/// Record a status side-channel result.
///
/// Metric: `room_status_notifications_total`
/// Labels: `status` (starting, ongoing, scheduled), `outcome` (success, error, disabled)
pub fn record_status_notification(status: &'static str, outcome: &'static str) {
    counter!(
        "room_status_notifications_total",
        "status" => status,
        "outcome" => outcome
    )
    .increment(1);
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use metrics_util::debugging::{DebugValue, DebuggingRecorder};
    use metrics_util::MetricKind;

    #[test]
    fn test_metrics_recorded_with_expected_names() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_join_attempt("success");
            record_join_attempt("auth");
            record_join_duration(Duration::from_millis(120));
            record_phase_transition("idle", "authenticating");
            set_remote_tracks(3);
            record_status_notification("ongoing", "success");
        });

        let metrics = snapshotter.snapshot().into_vec();
        let names: Vec<(MetricKind, String)> = metrics
            .iter()
            .map(|(key, _, _, _)| (key.kind(), key.key().name().to_string()))
            .collect();

        assert!(names.contains(&(MetricKind::Counter, "room_join_attempts_total".to_string())));
        assert!(names.contains(&(MetricKind::Histogram, "room_join_duration_seconds".to_string())));
        assert!(names.contains(&(MetricKind::Counter, "room_phase_transitions_total".to_string())));
        assert!(names.contains(&(MetricKind::Gauge, "room_remote_tracks".to_string())));
        assert!(names.contains(&(
            MetricKind::Counter,
            "room_status_notifications_total".to_string()
        )));
    }

    #[test]
    fn test_join_attempts_split_by_outcome() {
        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();

        metrics::with_local_recorder(&recorder, || {
            record_join_attempt("success");
            record_join_attempt("success");
            record_join_attempt("cancelled");
        });

        let metrics = snapshotter.snapshot().into_vec();
        let success = metrics.iter().find(|(key, _, _, _)| {
            key.key().name() == "room_join_attempts_total"
                && key
                    .key()
                    .labels()
                    .any(|l| l.key() == "outcome" && l.value() == "success")
        });

        let (_, _, _, value) = success.expect("success counter recorded");
        assert_eq!(value, &DebugValue::Counter(2));
    }
}
