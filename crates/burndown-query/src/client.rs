//! HTTP transport for the GraphQL query.
//!
//! Opens a plain TCP connection per fetch and speaks HTTP/1 over it.
//! The whole exchange (connect, send, read body) is bounded by the
//! configured timeout.

use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use tracing::{debug, warn};

use burndown_core::config::QueryConfig;
use burndown_core::{BudgetError, BudgetResult};

use crate::query::request_body;
use crate::response::{BudgetData, decode_response};
use crate::source::{BoxFuture, QuerySource};

/// Fetches budget data from a GraphQL endpoint over HTTP.
#[derive(Debug, Clone)]
pub struct HttpSource {
    /// `host:port` to connect to.
    address: String,
    /// Absolute request URI.
    uri: http::Uri,
    body: Bytes,
    timeout: Duration,
}

impl HttpSource {
    /// Build a source from query config. The request body is rendered
    /// once up front so config errors show at startup.
    pub fn new(config: &QueryConfig) -> BudgetResult<Self> {
        let uri: http::Uri = config
            .endpoint
            .parse()
            .map_err(|e| BudgetError::Config(format!("invalid endpoint '{}': {e}", config.endpoint)))?;

        if uri.scheme_str() != Some("http") {
            return Err(BudgetError::Config(format!(
                "endpoint '{}' must use http://",
                config.endpoint
            )));
        }
        let host = uri
            .host()
            .ok_or_else(|| BudgetError::Config(format!("endpoint '{}' has no host", config.endpoint)))?;
        let address = format!("{host}:{}", uri.port_u16().unwrap_or(80));

        Ok(Self {
            address,
            uri,
            body: Bytes::from(request_body(config)?),
            timeout: config.timeout()?,
        })
    }

    async fn round_trip(&self) -> BudgetResult<Bytes> {
        let stream = tokio::net::TcpStream::connect(self.address.as_str())
            .await
            .map_err(|e| BudgetError::Query(format!("connect {}: {e}", self.address)))?;

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| BudgetError::Query(format!("handshake with {}: {e}", self.address)))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "query connection closed with error");
            }
        });

        let req = http::Request::builder()
            .method("POST")
            .uri(&self.uri)
            .header("host", &self.address)
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .header("user-agent", "burndown-query/0.1")
            .body(Full::new(self.body.clone()))
            .map_err(|e| BudgetError::Query(format!("build request: {e}")))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| BudgetError::Query(format!("request to {} failed: {e}", self.uri)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(BudgetError::Query(format!(
                "{} answered {status}",
                self.uri
            )));
        }

        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| BudgetError::Query(format!("read response body: {e}")))?
            .to_bytes();
        Ok(body)
    }
}

impl QuerySource for HttpSource {
    fn fetch(&self) -> BoxFuture<'_, BudgetResult<BudgetData>> {
        Box::pin(async move {
            debug!(uri = %self.uri, "querying error budget");
            let body = match tokio::time::timeout(self.timeout, self.round_trip()).await {
                Ok(result) => result,
                Err(_) => Err(BudgetError::Query(format!(
                    "{} timed out after {:?}",
                    self.uri, self.timeout
                ))),
            }
            .inspect_err(|e| warn!(uri = %self.uri, error = %e, "error budget query failed"))?;

            decode_response(&body)
        })
    }

    fn describe(&self) -> String {
        self.uri.to_string()
    }
}
