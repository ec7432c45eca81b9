//! Query sources — where budget data comes from.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;

use tracing::debug;

use burndown_core::{BudgetError, BudgetResult};

use crate::response::{BudgetData, decode_response};

/// Boxed future returned by [`QuerySource::fetch`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A read-only provider of budget data.
///
/// Each call to `fetch` is one independent round trip.
pub trait QuerySource: Send + Sync {
    fn fetch(&self) -> BoxFuture<'_, BudgetResult<BudgetData>>;

    /// Short human-readable origin, for logs.
    fn describe(&self) -> String;
}

/// Reads a saved GraphQL response document from disk.
#[derive(Debug, Clone)]
pub struct FixtureSource {
    path: PathBuf,
}

impl FixtureSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl QuerySource for FixtureSource {
    fn fetch(&self) -> BoxFuture<'_, BudgetResult<BudgetData>> {
        Box::pin(async move {
            let body = tokio::fs::read(&self.path).await.map_err(|e| {
                BudgetError::Query(format!("read fixture {}: {e}", self.path.display()))
            })?;
            debug!(path = %self.path.display(), bytes = body.len(), "fixture loaded");
            decode_response(&body)
        })
    }

    fn describe(&self) -> String {
        format!("file://{}", self.path.display())
    }
}

/// Returns a fixed result on every fetch.
#[cfg(any(test, feature = "test-util"))]
#[derive(Debug, Clone)]
pub struct StaticSource {
    result: BudgetResult<BudgetData>,
}

#[cfg(any(test, feature = "test-util"))]
impl StaticSource {
    pub fn ok(data: BudgetData) -> Self {
        Self { result: Ok(data) }
    }

    pub fn failing(err: BudgetError) -> Self {
        Self { result: Err(err) }
    }
}

#[cfg(any(test, feature = "test-util"))]
impl QuerySource for StaticSource {
    fn fetch(&self) -> BoxFuture<'_, BudgetResult<BudgetData>> {
        let result = self.result.clone();
        Box::pin(async move { result })
    }

    fn describe(&self) -> String {
        "static".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burndown_core::ErrorBucket;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("burndown-{}-{name}", std::process::id()))
    }

    #[tokio::test]
    async fn fixture_source_decodes_file() {
        let path = temp_path("fixture.json");
        std::fs::write(
            &path,
            r#"{"data":{"actor":{"account":{
                "a":{"results":[{"a":42}]},
                "b":{"results":[{"endTimeSeconds":3600,"b":5}]}}}}}"#,
        )
        .unwrap();

        let source = FixtureSource::new(&path);
        let data = source.fetch().await.unwrap();
        assert_eq!(data.error_budget, 42.0);
        assert_eq!(data.buckets, vec![ErrorBucket::new(3600, 5)]);
        assert!(source.describe().starts_with("file://"));

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn missing_fixture_is_query_error() {
        let source = FixtureSource::new(temp_path("does-not-exist.json"));
        assert!(matches!(source.fetch().await, Err(BudgetError::Query(_))));
    }

    #[tokio::test]
    async fn static_source_repeats_result() {
        let source = StaticSource::failing(BudgetError::EmptyData);
        assert_eq!(source.fetch().await, Err(BudgetError::EmptyData));
        assert_eq!(source.fetch().await, Err(BudgetError::EmptyData));
    }
}
