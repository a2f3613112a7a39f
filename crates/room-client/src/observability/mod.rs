//! Observability for the room client.
//!
//! # Privacy by Default
//!
//! Actor loops and request paths use `#[instrument(skip_all)]` with explicit
//! field allow-listing. Join credentials never appear in spans, events or
//! metric labels. Room names and identities are logged, not used as labels.
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Purpose |
//! |--------|------|--------|---------|
//! | `room_join_attempts_total` | Counter | `outcome` | Join results by outcome |
//! | `room_join_duration_seconds` | Histogram | none | Time from `join()` to Connected |
//! | `room_phase_transitions_total` | Counter | `from`, `to` | Session phase changes |
//! | `room_remote_tracks` | Gauge | none | Remote tracks currently subscribed |
//! | `room_status_notifications_total` | Counter | `status`, `outcome` | Status side-channel results |
//!
//! Installing an exporter is left to the embedding application.

pub mod metrics;

pub use metrics::{
    record_join_attempt, record_join_duration, record_phase_transition,
    record_status_notification, set_remote_tracks,
};
