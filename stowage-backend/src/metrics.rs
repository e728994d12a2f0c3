//! Entry store metrics.
//!
//! Enable the `metrics` feature to record them; without it every function
//! here compiles to a no-op.
//!
//! ## Naming Pattern
//!
//! All metrics follow the pattern: `stowage_entry_{operation}_{metric_type}`
//! and carry a `backend` label with the backend's [`label`](crate::Backend::label).

use std::time::Duration;

#[cfg(feature = "metrics")]
use std::time::Instant;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

/// Zero-cost timer for metrics collection.
///
/// When the `metrics` feature is enabled, this captures the start time.
/// When disabled, this is a zero-sized struct with no overhead.
pub struct Timer {
    #[cfg(feature = "metrics")]
    start: Instant,
}

impl Timer {
    #[inline]
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "metrics")]
            start: Instant::now(),
        }
    }

    /// Elapsed time since creation, `Duration::ZERO` without the `metrics` feature.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        #[cfg(feature = "metrics")]
        {
            self.start.elapsed()
        }
        #[cfg(not(feature = "metrics"))]
        {
            Duration::ZERO
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

/// How an entry read ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOutcome {
    Hit,
    Miss,
    Corrupt,
}

impl ReadOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            ReadOutcome::Hit => "hit",
            ReadOutcome::Miss => "miss",
            ReadOutcome::Corrupt => "corrupt",
        }
    }
}

#[cfg(feature = "metrics")]
lazy_static! {
    /// Metric name for entry reads, labelled by outcome.
    pub static ref ENTRY_READ_TOTAL: &'static str = {
        metrics::describe_counter!(
            "stowage_entry_read_total",
            "Total number of cache entry reads per backend and outcome."
        );
        "stowage_entry_read_total"
    };

    /// Metric name for entry read duration histogram.
    pub static ref ENTRY_READ_DURATION: &'static str = {
        metrics::describe_histogram!(
            "stowage_entry_read_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of cache entry reads in seconds."
        );
        "stowage_entry_read_duration_seconds"
    };

    /// Metric name for entry writes.
    pub static ref ENTRY_WRITE_TOTAL: &'static str = {
        metrics::describe_counter!(
            "stowage_entry_write_total",
            "Total number of cache entry writes per backend."
        );
        "stowage_entry_write_total"
    };

    /// Metric name for entry write duration histogram.
    pub static ref ENTRY_WRITE_DURATION: &'static str = {
        metrics::describe_histogram!(
            "stowage_entry_write_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of cache entry writes in seconds."
        );
        "stowage_entry_write_duration_seconds"
    };

    /// Metric name for entry purges, labelled by whether a key was removed.
    pub static ref ENTRY_PURGE_TOTAL: &'static str = {
        metrics::describe_counter!(
            "stowage_entry_purge_total",
            "Total number of cache entry purges per backend."
        );
        "stowage_entry_purge_total"
    };

    /// Metric name for store errors, labelled by operation.
    pub static ref ENTRY_ERRORS: &'static str = {
        metrics::describe_counter!(
            "stowage_entry_errors_total",
            "Total number of store errors per backend and operation."
        );
        "stowage_entry_errors_total"
    };
}

#[cfg(feature = "metrics")]
#[inline]
pub fn record_read(backend: &str, outcome: ReadOutcome, duration: Duration) {
    metrics::counter!(
        *ENTRY_READ_TOTAL,
        "backend" => backend.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);
    metrics::histogram!(*ENTRY_READ_DURATION, "backend" => backend.to_string())
        .record(duration.as_secs_f64());
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_read(_backend: &str, _outcome: ReadOutcome, _duration: Duration) {}

#[cfg(feature = "metrics")]
#[inline]
pub fn record_write(backend: &str, duration: Duration) {
    metrics::counter!(*ENTRY_WRITE_TOTAL, "backend" => backend.to_string()).increment(1);
    metrics::histogram!(*ENTRY_WRITE_DURATION, "backend" => backend.to_string())
        .record(duration.as_secs_f64());
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_write(_backend: &str, _duration: Duration) {}

#[cfg(feature = "metrics")]
#[inline]
pub fn record_purge(backend: &str, deleted: bool) {
    metrics::counter!(
        *ENTRY_PURGE_TOTAL,
        "backend" => backend.to_string(),
        "deleted" => if deleted { "true" } else { "false" }
    )
    .increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_purge(_backend: &str, _deleted: bool) {}

/// `operation` is one of `read`, `write`, `command`, `purge`.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_error(backend: &str, operation: &'static str) {
    metrics::counter!(
        *ENTRY_ERRORS,
        "backend" => backend.to_string(),
        "operation" => operation
    )
    .increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
pub fn record_error(_backend: &str, _operation: &'static str) {}
