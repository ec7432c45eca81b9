//! burndown-query — fetches the error budget and error buckets.
//!
//! One fetch is one GraphQL round trip that selects two aliased NRQL
//! results: `a`, the budget scalar, and `b`, the error timeseries.
//!
//! # Architecture
//!
//! ```text
//! QuerySource (trait)
//!   ├── HttpSource    → POST {"query": ...} over HTTP/1, with timeout
//!   └── FixtureSource → same response document read from disk
//!         └── decode_response() → BudgetData
//! ```
//!
//! Failures are surfaced immediately; nothing is retried.

pub mod client;
pub mod query;
pub mod response;
pub mod source;

pub use client::HttpSource;
pub use query::{build_query, request_body};
pub use response::{BudgetData, decode_response};
pub use source::{BoxFuture, FixtureSource, QuerySource};

#[cfg(any(test, feature = "test-util"))]
pub use source::StaticSource;
