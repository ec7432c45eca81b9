//! Domain types for error-budget projection.
//!
//! Timestamps on the input side are Unix seconds; plotted points carry
//! Unix milliseconds, which is what chart surfaces expect.

use serde::{Deserialize, Serialize};

/// Total number of errors allowed over the observation window.
pub type ErrorBudget = f64;

// ── Input ──────────────────────────────────────────────────────────

/// One historical time-series sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBucket {
    /// Unix timestamp (seconds) at which the bucket closes.
    pub end_time: i64,
    /// Errors observed in the bucket. Signed so corrupt upstream data
    /// can be detected rather than wrapped.
    pub error_count: i64,
}

impl ErrorBucket {
    pub fn new(end_time: i64, error_count: i64) -> Self {
        Self {
            end_time,
            error_count,
        }
    }
}

// ── Output ─────────────────────────────────────────────────────────

/// A single plotted point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Unix timestamp in milliseconds.
    pub x: i64,
    pub y: f64,
}

impl DataPoint {
    /// Build a point from a timestamp in seconds.
    ///
    /// `secs * 1000` must fit in an `i64`; `projector::validate` rejects
    /// buckets where it does not.
    pub fn at_secs(secs: i64, y: f64) -> Self {
        Self { x: secs * 1000, y }
    }
}

/// The five series produced by one projection, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesKind {
    Budget,
    Errors,
    Remaining,
    TrendErrors,
    TrendRemaining,
}

impl SeriesKind {
    pub const ALL: [SeriesKind; 5] = [
        SeriesKind::Budget,
        SeriesKind::Errors,
        SeriesKind::Remaining,
        SeriesKind::TrendErrors,
        SeriesKind::TrendRemaining,
    ];
}

/// Complete output of one projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeriesSet {
    /// Budget ceiling the series were computed against.
    pub error_budget: ErrorBudget,
    /// Mean errors per historical bucket, used for the forecast.
    pub average_errors_per_bucket: f64,
    /// Flat reference line spanning history and forecast.
    pub budget: Vec<DataPoint>,
    /// Cumulative errors per historical bucket.
    pub errors: Vec<DataPoint>,
    /// Remaining budget per historical bucket.
    pub remaining: Vec<DataPoint>,
    /// Forecast cumulative errors.
    pub trend_errors: Vec<DataPoint>,
    /// Forecast remaining budget.
    pub trend_remaining: Vec<DataPoint>,
}

impl SeriesSet {
    pub fn series(&self, kind: SeriesKind) -> &[DataPoint] {
        match kind {
            SeriesKind::Budget => &self.budget,
            SeriesKind::Errors => &self.errors,
            SeriesKind::Remaining => &self.remaining,
            SeriesKind::TrendErrors => &self.trend_errors,
            SeriesKind::TrendRemaining => &self.trend_remaining,
        }
    }

    /// Number of historical buckets that went into this set.
    pub fn historical_len(&self) -> usize {
        self.errors.len()
    }
}

// ── Accumulator ────────────────────────────────────────────────────

/// Running totals threaded through the historical and projection passes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionState {
    pub cumulative_errors: f64,
    /// Always within `[0, error_budget]`.
    pub remaining_budget: f64,
    /// Unix seconds of the last emitted point.
    pub current_timestamp: i64,
    pub bucket_count: u64,
}

impl ProjectionState {
    /// Initial state before the first bucket.
    pub fn new(error_budget: ErrorBudget, start: i64) -> Self {
        Self {
            cumulative_errors: 0.0,
            remaining_budget: error_budget,
            current_timestamp: start,
            bucket_count: 0,
        }
    }

    /// Fold one historical bucket into the state.
    pub fn step(self, bucket: &ErrorBucket) -> Self {
        let count = bucket.error_count as f64;
        Self {
            cumulative_errors: self.cumulative_errors + count,
            remaining_budget: (self.remaining_budget - count).max(0.0),
            current_timestamp: bucket.end_time,
            bucket_count: self.bucket_count + 1,
        }
    }

    /// Advance the forecast by one step of `errors`, `step_secs` later.
    pub fn advance(self, errors: f64, step_secs: i64) -> Self {
        Self {
            cumulative_errors: self.cumulative_errors + errors,
            remaining_budget: (self.remaining_budget - errors).max(0.0),
            current_timestamp: self.current_timestamp + step_secs,
            bucket_count: self.bucket_count,
        }
    }

    /// Mean errors per folded bucket; zero before any bucket.
    pub fn average_errors(&self) -> f64 {
        if self.bucket_count == 0 {
            0.0
        } else {
            self.cumulative_errors / self.bucket_count as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_accumulates_and_clamps() {
        let state = ProjectionState::new(50.0, 0)
            .step(&ErrorBucket::new(10, 20))
            .step(&ErrorBucket::new(20, 40));

        assert_eq!(state.cumulative_errors, 60.0);
        assert_eq!(state.remaining_budget, 0.0);
        assert_eq!(state.current_timestamp, 20);
        assert_eq!(state.bucket_count, 2);
    }

    #[test]
    fn advance_moves_clock_and_keeps_count() {
        let state = ProjectionState::new(10.0, 100)
            .step(&ErrorBucket::new(100, 4))
            .advance(4.0, 60);

        assert_eq!(state.cumulative_errors, 8.0);
        assert_eq!(state.remaining_budget, 2.0);
        assert_eq!(state.current_timestamp, 160);
        assert_eq!(state.bucket_count, 1);
    }

    #[test]
    fn average_of_empty_state_is_zero() {
        assert_eq!(ProjectionState::new(10.0, 0).average_errors(), 0.0);
    }

    #[test]
    fn point_converts_seconds_to_millis() {
        let p = DataPoint::at_secs(1_700_000_000, 3.5);
        assert_eq!(p.x, 1_700_000_000_000);
        assert_eq!(p.y, 3.5);
    }

    #[test]
    fn bucket_deserializes_from_json() {
        let bucket: ErrorBucket =
            serde_json::from_str(r#"{"end_time": 1000, "error_count": 7}"#).unwrap();
        assert_eq!(bucket, ErrorBucket::new(1000, 7));
    }
}
