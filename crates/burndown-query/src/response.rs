//! Decoding of the GraphQL response envelope.
//!
//! Expected document:
//!
//! ```text
//! { "data": { "actor": { "account": {
//!     "a": { "results": [ { "a": <budget> } ] },
//!     "b": { "results": [ { "endTimeSeconds": <secs>, "b": <count> }, ... ] }
//! } } } }
//! ```

use serde::Deserialize;
use tracing::debug;

use burndown_core::{BudgetError, BudgetResult, ErrorBucket, ErrorBudget};

/// Budget scalar plus the chronological error buckets.
#[derive(Debug, Clone, PartialEq)]
pub struct BudgetData {
    pub error_budget: ErrorBudget,
    pub buckets: Vec<ErrorBucket>,
}

#[derive(Deserialize)]
struct Envelope {
    data: Option<Data>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct Data {
    actor: Actor,
}

#[derive(Deserialize)]
struct Actor {
    account: Account,
}

#[derive(Deserialize)]
struct Account {
    a: NrqlResults<BudgetRow>,
    b: NrqlResults<BucketRow>,
}

#[derive(Deserialize)]
struct NrqlResults<T> {
    results: Vec<T>,
}

#[derive(Deserialize)]
struct BudgetRow {
    a: f64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BucketRow {
    end_time_seconds: f64,
    b: f64,
}

/// Decode a response body into budget data.
///
/// Returns `Query` for GraphQL errors or a mismatched shape and
/// `EmptyData` when the timeseries has no buckets. Counts are passed
/// through as-is; sign checks belong to the projector.
pub fn decode_response(body: &[u8]) -> BudgetResult<BudgetData> {
    let envelope: Envelope = serde_json::from_slice(body)
        .map_err(|e| BudgetError::Query(format!("unexpected response shape: {e}")))?;

    if !envelope.errors.is_empty() {
        let messages: Vec<&str> = envelope.errors.iter().map(|e| e.message.as_str()).collect();
        return Err(BudgetError::Query(messages.join("; ")));
    }

    let account = envelope
        .data
        .ok_or_else(|| BudgetError::Query("response has no data".to_string()))?
        .actor
        .account;

    let error_budget = account
        .a
        .results
        .first()
        .map(|row| row.a)
        .ok_or_else(|| BudgetError::Query("budget result 'a' is empty".to_string()))?;

    let buckets = account
        .b
        .results
        .iter()
        .enumerate()
        .map(|(i, row)| {
            Ok(ErrorBucket::new(
                whole(row.end_time_seconds, "endTimeSeconds", i)?,
                whole(row.b, "b", i)?,
            ))
        })
        .collect::<BudgetResult<Vec<_>>>()?;

    if buckets.is_empty() {
        return Err(BudgetError::EmptyData);
    }

    debug!(error_budget, buckets = buckets.len(), "decoded budget response");
    Ok(BudgetData {
        error_budget,
        buckets,
    })
}

fn whole(value: f64, field: &str, index: usize) -> BudgetResult<i64> {
    if !value.is_finite() || value.fract() != 0.0 {
        return Err(BudgetError::Query(format!(
            "result {index}: {field} is not a whole number ({value})"
        )));
    }
    // 2^63 itself is out of range; `i64::MAX as f64` rounds up to it.
    if value < i64::MIN as f64 || value >= i64::MAX as f64 {
        return Err(BudgetError::Query(format!(
            "result {index}: {field} is out of range ({value})"
        )));
    }
    Ok(value as i64)
}
