//! burndown-core — SLO error-budget model and projection.
//!
//! Turns a scalar error budget and a chronological series of error
//! buckets into five chart series: the flat budget line, cumulative
//! errors, remaining budget, and a linear forecast of both.
//!
//! # Pipeline
//!
//! ```text
//! (ErrorBudget, [ErrorBucket])
//!   ├── historical pass: fold ProjectionState::step over buckets
//!   ├── trend: cumulative_errors / bucket_count
//!   └── projection pass: N steps of average errors, one step apart
//!         → SeriesSet
//! ```

pub mod config;
pub mod error;
pub mod model;
pub mod projector;

pub use config::BurndownConfig;
pub use error::{BudgetError, BudgetResult, ErrorKind};
pub use model::*;
pub use projector::{Projector, depletion_time, project};
