//! Error types shared by the fetcher, projector, and dashboard.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for budget operations.
pub type BudgetResult<T> = Result<T, BudgetError>;

/// Errors that end a load-and-project cycle.
///
/// None of these are recovered from locally: the dashboard shows a
/// failure panel instead of a partial chart.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BudgetError {
    /// Upstream query service unreachable, failing, or returning an
    /// unexpected document.
    #[error("query failed: {0}")]
    Query(String),

    /// The query returned zero historical buckets.
    #[error("query returned no error buckets")]
    EmptyData,

    /// Negative budget, negative counts, or out-of-order buckets.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Coarse classification of a [`BudgetError`], used for display and
/// in the JSON API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Query,
    EmptyData,
    InvalidInput,
}

impl ErrorKind {
    pub fn label(&self) -> &'static str {
        match self {
            ErrorKind::Query => "Query failed",
            ErrorKind::EmptyData => "No data",
            ErrorKind::InvalidInput => "Invalid data",
        }
    }
}

impl BudgetError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BudgetError::Query(_) => ErrorKind::Query,
            BudgetError::EmptyData => ErrorKind::EmptyData,
            BudgetError::InvalidInput(_) | BudgetError::Config(_) => ErrorKind::InvalidInput,
        }
    }
}
