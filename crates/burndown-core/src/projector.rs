//! Budget projector — history fold plus linear forecast.
//!
//! The historical pass folds [`ProjectionState::step`] over the buckets
//! and emits one point per bucket. The forecast then repeats the mean
//! errors-per-bucket for a fixed number of steps. The mean is a plain
//! arithmetic average over the whole window: no weighting, decay, or
//! seasonality. A decaying model would track recent incidents better
//! but is outside what this crate promises.
//!
//! The forecast clock is advanced before each point is emitted, so the
//! first forecast point lands one step after the last bucket and never
//! collides with it.

use tracing::debug;

use crate::config::ProjectionConfig;
use crate::error::{BudgetError, BudgetResult};
use crate::model::*;

/// Default forecast length.
pub const DEFAULT_STEPS: u32 = 20;

/// Default spacing between forecast points (one day).
pub const DEFAULT_STEP_SECS: i64 = 86_400;

/// Historical series produced by the first pass.
#[derive(Debug, Clone, PartialEq)]
pub struct History {
    pub budget: Vec<DataPoint>,
    pub errors: Vec<DataPoint>,
    pub remaining: Vec<DataPoint>,
}

/// Projects a budget and its error buckets into chart series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projector {
    steps: u32,
    step_secs: i64,
}

impl Default for Projector {
    fn default() -> Self {
        Self {
            steps: DEFAULT_STEPS,
            step_secs: DEFAULT_STEP_SECS,
        }
    }
}

impl Projector {
    /// Build a projector from config.
    pub fn new(config: &ProjectionConfig) -> BudgetResult<Self> {
        Ok(Self {
            steps: config.forecast_steps()?,
            step_secs: config.step_secs()?,
        })
    }

    /// Create a projector with explicit parameters (for testing).
    pub fn with_steps(steps: u32, step_secs: i64) -> Self {
        Self { steps, step_secs }
    }

    /// Run both passes and return the full series set.
    pub fn project(
        &self,
        error_budget: ErrorBudget,
        buckets: &[ErrorBucket],
    ) -> BudgetResult<SeriesSet> {
        let (state, history) = historical_pass(error_budget, buckets)?;
        self.check_horizon(state.current_timestamp)?;
        let average = state.average_errors();

        let History {
            mut budget,
            errors,
            remaining,
        } = history;

        let capacity = self.steps as usize;
        budget.reserve(capacity);
        let mut trend_errors = Vec::with_capacity(capacity);
        let mut trend_remaining = Vec::with_capacity(capacity);

        let mut state = state;
        for _ in 0..self.steps {
            state = state.advance(average, self.step_secs);
            let t = state.current_timestamp;
            budget.push(DataPoint::at_secs(t, error_budget));
            trend_errors.push(DataPoint::at_secs(t, state.cumulative_errors));
            trend_remaining.push(DataPoint::at_secs(t, state.remaining_budget));
        }

        debug!(
            buckets = state.bucket_count,
            average,
            cumulative = state.cumulative_errors,
            remaining = state.remaining_budget,
            steps = self.steps,
            "error budget projected"
        );

        Ok(SeriesSet {
            error_budget,
            average_errors_per_bucket: average,
            budget,
            errors,
            remaining,
            trend_errors,
            trend_remaining,
        })
    }

    /// The last forecast point, in milliseconds, must fit in an `i64`.
    fn check_horizon(&self, last_end_time: i64) -> BudgetResult<()> {
        i64::from(self.steps)
            .checked_mul(self.step_secs)
            .and_then(|span| last_end_time.checked_add(span))
            .and_then(|end| end.checked_mul(1000))
            .map(|_| ())
            .ok_or_else(|| {
                BudgetError::InvalidInput(format!(
                    "last bucket ending at {last_end_time} leaves no room for {} forecast steps of {}s",
                    self.steps, self.step_secs
                ))
            })
    }
}

/// Project with the default 20 one-day steps.
pub fn project(error_budget: ErrorBudget, buckets: &[ErrorBucket]) -> BudgetResult<SeriesSet> {
    Projector::default().project(error_budget, buckets)
}

/// Fold the buckets into a final state and the three historical series.
pub fn historical_pass(
    error_budget: ErrorBudget,
    buckets: &[ErrorBucket],
) -> BudgetResult<(ProjectionState, History)> {
    validate(error_budget, buckets)?;

    let mut history = History {
        budget: Vec::with_capacity(buckets.len()),
        errors: Vec::with_capacity(buckets.len()),
        remaining: Vec::with_capacity(buckets.len()),
    };

    let seed = ProjectionState::new(error_budget, buckets[0].end_time);
    let state = buckets.iter().fold(seed, |state, bucket| {
        let next = state.step(bucket);
        history
            .budget
            .push(DataPoint::at_secs(bucket.end_time, error_budget));
        history
            .errors
            .push(DataPoint::at_secs(bucket.end_time, next.cumulative_errors));
        history
            .remaining
            .push(DataPoint::at_secs(bucket.end_time, next.remaining_budget));
        next
    });

    Ok((state, history))
}

/// Check the projector's preconditions.
pub fn validate(error_budget: ErrorBudget, buckets: &[ErrorBucket]) -> BudgetResult<()> {
    if !error_budget.is_finite() || error_budget < 0.0 {
        return Err(BudgetError::InvalidInput(format!(
            "error budget must be a non-negative number, got {error_budget}"
        )));
    }
    if buckets.is_empty() {
        return Err(BudgetError::EmptyData);
    }
    for (i, bucket) in buckets.iter().enumerate() {
        if bucket.end_time.checked_mul(1000).is_none() {
            return Err(BudgetError::InvalidInput(format!(
                "bucket {i} end time {} is out of range",
                bucket.end_time
            )));
        }
        if bucket.error_count < 0 {
            return Err(BudgetError::InvalidInput(format!(
                "bucket {i} ending at {} has negative error count {}",
                bucket.end_time, bucket.error_count
            )));
        }
        if i > 0 && bucket.end_time <= buckets[i - 1].end_time {
            return Err(BudgetError::InvalidInput(format!(
                "bucket {i} ending at {} is not after {}",
                bucket.end_time,
                buckets[i - 1].end_time
            )));
        }
    }
    Ok(())
}

/// Timestamp (ms) of the first point whose remaining budget is zero,
/// looking at history first and then the forecast.
pub fn depletion_time(set: &SeriesSet) -> Option<i64> {
    set.remaining
        .iter()
        .chain(set.trend_remaining.iter())
        .find(|p| p.y <= 0.0)
        .map(|p| p.x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buckets(counts: &[i64]) -> Vec<ErrorBucket> {
        counts
            .iter()
            .enumerate()
            .map(|(i, &c)| ErrorBucket::new(1_000 + i as i64 * 3_600, c))
            .collect()
    }

    /// Deterministic pseudo-random counts for property checks.
    fn pseudo_counts(seed: u64, len: usize, max: i64) -> Vec<i64> {
        let mut x = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
        (0..len)
            .map(|_| {
                x = x.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                ((x >> 33) as i64) % (max + 1)
            })
            .collect()
    }

    fn strictly_ascending(points: &[DataPoint]) -> bool {
        points.windows(2).all(|w| w[0].x < w[1].x)
    }

    #[test]
    fn two_bucket_scenario() {
        let input = [
            ErrorBucket::new(1000, 30),
            ErrorBucket::new(1_086_400, 80),
        ];
        let set = project(100.0, &input).unwrap();

        assert_eq!(
            set.errors,
            vec![
                DataPoint { x: 1_000_000, y: 30.0 },
                DataPoint { x: 1_086_400_000, y: 110.0 },
            ]
        );
        assert_eq!(
            set.remaining,
            vec![
                DataPoint { x: 1_000_000, y: 70.0 },
                DataPoint { x: 1_086_400_000, y: 0.0 },
            ]
        );
        assert_eq!(set.average_errors_per_bucket, 55.0);
        assert_eq!(set.trend_errors[0], DataPoint { x: 1_172_800_000, y: 165.0 });
        assert_eq!(set.trend_remaining[0], DataPoint { x: 1_172_800_000, y: 0.0 });
    }

    #[test]
    fn single_zero_bucket_projects_flat() {
        let set = project(10.0, &[ErrorBucket::new(5000, 0)]).unwrap();

        assert_eq!(set.average_errors_per_bucket, 0.0);
        assert_eq!(set.trend_errors.len(), 20);
        assert!(set.trend_errors.iter().all(|p| p.y == 0.0));
        assert!(set.trend_remaining.iter().all(|p| p.y == 10.0));
        assert!(strictly_ascending(&set.trend_errors));
        assert_eq!(set.trend_errors[0].x, (5000 + 86_400) * 1000);
        assert_eq!(set.trend_errors[19].x, (5000 + 20 * 86_400) * 1000);
    }

    #[test]
    fn forecast_length_is_fixed() {
        for len in [1, 2, 17, 1000] {
            let set = project(500.0, &buckets(&vec![3; len])).unwrap();
            assert_eq!(set.trend_errors.len(), 20, "len {len}");
            assert_eq!(set.trend_remaining.len(), 20, "len {len}");
            assert_eq!(set.budget.len(), len + 20, "len {len}");
            assert_eq!(set.errors.len(), len);
            assert_eq!(set.remaining.len(), len);
        }
    }

    #[test]
    fn budget_line_is_constant() {
        let set = project(100.0, &buckets(&[1, 2, 3, 4, 5])).unwrap();
        assert_eq!(set.budget.len(), 25);
        assert!(set.budget.iter().all(|p| p.y == 100.0));
    }

    #[test]
    fn remaining_stays_within_budget() {
        for seed in 0..50 {
            let counts = pseudo_counts(seed, 1 + (seed as usize % 40), 25);
            let budget = (seed * 7 % 200) as f64;
            let set = project(budget, &buckets(&counts)).unwrap();

            for p in set.remaining.iter().chain(set.trend_remaining.iter()) {
                assert!(p.y >= 0.0 && p.y <= budget, "seed {seed}: {p:?}");
            }
        }
    }

    #[test]
    fn cumulative_errors_never_decrease() {
        for seed in 0..50 {
            let counts = pseudo_counts(seed, 1 + (seed as usize % 30), 40);
            let set = project(300.0, &buckets(&counts)).unwrap();

            let all: Vec<f64> = set
                .errors
                .iter()
                .chain(set.trend_errors.iter())
                .map(|p| p.y)
                .collect();
            assert!(all.windows(2).all(|w| w[0] <= w[1]), "seed {seed}");
        }
    }

    #[test]
    fn every_series_strictly_ascending() {
        let set = project(50.0, &buckets(&[5, 0, 9, 2])).unwrap();
        for kind in SeriesKind::ALL {
            assert!(strictly_ascending(set.series(kind)), "{kind:?}");
        }
        let last_history = set.errors.last().unwrap().x;
        assert!(set.trend_errors[0].x > last_history);
    }

    #[test]
    fn exhausted_budget_stays_at_zero() {
        let set = project(20.0, &buckets(&[5, 10, 10, 0, 1])).unwrap();

        let first_zero = set.remaining.iter().position(|p| p.y == 0.0).unwrap();
        assert_eq!(first_zero, 2);
        assert!(set.remaining[first_zero..].iter().all(|p| p.y == 0.0));
        assert!(set.trend_remaining.iter().all(|p| p.y == 0.0));
        assert_eq!(depletion_time(&set), Some(set.remaining[2].x));
    }

    #[test]
    fn depletion_found_in_forecast() {
        // 2 errors per bucket against a budget of 10: 6 left after history,
        // gone after the third forecast step.
        let set = project(10.0, &buckets(&[2, 2])).unwrap();
        assert_eq!(depletion_time(&set), Some(set.trend_remaining[2].x));
    }

    #[test]
    fn depletion_absent_when_budget_survives() {
        let set = project(1_000.0, &buckets(&[1, 1, 1])).unwrap();
        assert_eq!(depletion_time(&set), None);
    }

    #[test]
    fn historical_pass_reproduces_itself() {
        let input = buckets(&[4, 0, 12, 7, 30, 1]);
        let (_, first) = historical_pass(40.0, &input).unwrap();

        // Recover per-bucket counts from the cumulative line and replay.
        let mut previous = 0.0;
        let replay: Vec<ErrorBucket> = first
            .errors
            .iter()
            .map(|p| {
                let count = (p.y - previous) as i64;
                previous = p.y;
                ErrorBucket::new(p.x / 1000, count)
            })
            .collect();
        let (_, second) = historical_pass(40.0, &replay).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn custom_step_and_length() {
        let projector = Projector::with_steps(3, 3_600);
        let set = projector.project(10.0, &[ErrorBucket::new(0, 1)]).unwrap();

        let xs: Vec<i64> = set.trend_errors.iter().map(|p| p.x).collect();
        assert_eq!(xs, vec![3_600_000, 7_200_000, 10_800_000]);
        assert_eq!(set.budget.len(), 4);
    }

    #[test]
    fn projector_from_config() {
        let config = ProjectionConfig {
            steps: 5,
            step: "12h".to_string(),
        };
        let projector = Projector::new(&config).unwrap();
        assert_eq!(projector, Projector::with_steps(5, 43_200));
    }

    #[test]
    fn empty_buckets_rejected() {
        assert_eq!(project(10.0, &[]), Err(BudgetError::EmptyData));
    }

    #[test]
    fn negative_budget_rejected() {
        let err = project(-1.0, &buckets(&[1])).unwrap_err();
        assert!(matches!(err, BudgetError::InvalidInput(_)));
    }

    #[test]
    fn non_finite_budget_rejected() {
        assert!(project(f64::NAN, &buckets(&[1])).is_err());
        assert!(project(f64::INFINITY, &buckets(&[1])).is_err());
    }

    #[test]
    fn negative_count_rejected() {
        let err = project(10.0, &buckets(&[1, -3, 2])).unwrap_err();
        match err {
            BudgetError::InvalidInput(msg) => assert!(msg.contains("bucket 1"), "{msg}"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn out_of_order_buckets_rejected() {
        let input = [ErrorBucket::new(200, 1), ErrorBucket::new(100, 1)];
        assert!(matches!(
            project(10.0, &input),
            Err(BudgetError::InvalidInput(_))
        ));

        let duplicate = [ErrorBucket::new(100, 1), ErrorBucket::new(100, 1)];
        assert!(project(10.0, &duplicate).is_err());
    }

    #[test]
    fn out_of_range_end_time_rejected() {
        for end_time in [i64::MAX, i64::MIN, 100_000_000_000_000_000] {
            let err = project(10.0, &[ErrorBucket::new(end_time, 1)]).unwrap_err();
            match err {
                BudgetError::InvalidInput(msg) => assert!(msg.contains("out of range"), "{msg}"),
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn forecast_past_time_range_rejected() {
        // Converts to milliseconds, but 20 more days do not.
        let last = i64::MAX / 1000 - 86_400;
        let input = [ErrorBucket::new(last - 10, 1), ErrorBucket::new(last, 1)];
        assert!(historical_pass(10.0, &input).is_ok());
        assert!(matches!(
            project(10.0, &input),
            Err(BudgetError::InvalidInput(_))
        ));

        // A one-step forecast of the same length still fits.
        assert!(Projector::with_steps(1, 86_400).project(10.0, &input).is_ok());
    }

    #[test]
    fn projector_rejects_zero_steps_config() {
        let config = ProjectionConfig {
            steps: 0,
            step: "1d".to_string(),
        };
        assert!(matches!(
            Projector::new(&config),
            Err(BudgetError::Config(_))
        ));
    }

    #[test]
    fn zero_budget_is_valid() {
        let set = project(0.0, &buckets(&[0, 0])).unwrap();
        assert!(set.remaining.iter().all(|p| p.y == 0.0));
        assert!(set.budget.iter().all(|p| p.y == 0.0));
    }
}
