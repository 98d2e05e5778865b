// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Single-query execution with bounded retry.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

#[cfg(feature = "telemetry")]
use crate::telemetry::metrics::GLOBAL_METRICS;

use super::transport::HttpTransport;
use super::QueryStrategy;
use crate::error::QueryError;
use crate::types::{MetricCounts, Query, QueryConfig};

/// Total attempts per query (one retry).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;

/// Runs one query at a time against the remote endpoint.
///
/// A transport error or a non-200 status uses up an attempt and is retried
/// immediately, with no backoff. A 200 response ends the loop whether or not
/// its body parses.
pub struct QueryExecutor {
    strategy: Box<dyn QueryStrategy>,
    transport: Arc<dyn HttpTransport>,
    max_attempts: u32,
}

impl QueryExecutor {
    /// Create an executor for a strategy and transport.
    pub fn new(strategy: Box<dyn QueryStrategy>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            strategy,
            transport,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Override the attempt budget (at least one attempt is always made).
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn strategy(&self) -> &dyn QueryStrategy {
        self.strategy.as_ref()
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run a query, degrading any failure to an empty result.
    pub async fn execute(&self, query: &Query, config: &QueryConfig) -> MetricCounts {
        match self.try_execute(query, config).await {
            Ok(counts) => counts,
            Err(e) => {
                warn!(
                    api = %self.strategy.generation(),
                    query = %query.description,
                    error = %e,
                    "Query failed, contributing no data"
                );
                MetricCounts::new()
            }
        }
    }

    /// Run a query and report why it failed, if it did.
    pub async fn try_execute(
        &self,
        query: &Query,
        config: &QueryConfig,
    ) -> Result<MetricCounts, QueryError> {
        let request = self.strategy.build_request(query, config);
        let generation = self.strategy.generation();
        let mut last_error = QueryError::NotConfigured("no attempt made".to_string());

        for attempt in 1..=self.max_attempts {
            let start = Instant::now();
            debug!(api = %generation, attempt, "Sending query");

            let outcome = self.transport.send(request.clone()).await;

            #[cfg(feature = "telemetry")]
            GLOBAL_METRICS.record_attempt(
                generation.as_str(),
                start.elapsed(),
                matches!(outcome, Ok(ref r) if r.is_ok()),
            );
            #[cfg(not(feature = "telemetry"))]
            let _ = start;

            match outcome {
                Ok(response) if response.is_ok() => {
                    let counts = self.strategy.parse_response(&response.body)?;
                    debug!(api = %generation, attempt, metrics = counts.len(), "Query succeeded");
                    return Ok(counts);
                }
                Ok(response) => {
                    debug!(api = %generation, attempt, status = response.status, "Non-success status");
                    last_error = QueryError::Status(response.status);
                }
                Err(e) => {
                    debug!(api = %generation, attempt, error = %e, "Transport failure");
                    last_error = e;
                }
            }

            if !last_error.is_retryable() {
                break;
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::insights::InsightsStrategy;
    use crate::client::transport::{HttpResponse, MockHttpTransport};

    const FACETS_BODY: &str = r#"{ "facets" : [ { "name": "this", "results": [ {"count": 5 } ] } ] }"#;

    fn config() -> QueryConfig {
        QueryConfig::new("acct1", "fakeApiKey", "fakeAppName", 1)
    }

    fn executor(transport: MockHttpTransport) -> QueryExecutor {
        QueryExecutor::new(
            Box::new(InsightsStrategy::new("http://fakehost")),
            Arc::new(transport),
        )
    }

    fn query() -> Query {
        Query::new("SELECT count(*) FROM Transaction WHERE appName = 'fakeAppName' FACET name")
    }

    #[tokio::test]
    async fn test_retry_once_after_transport_error() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .times(2)
            .returning(|_| Err(QueryError::Network("Failed".to_string())));

        let result = executor(transport).execute(&query(), &config()).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_retry_once_after_non_200_response() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .times(2)
            .returning(|_| Ok(HttpResponse::new(500, "")));

        let executor = executor(transport);
        let result = executor.try_execute(&query(), &config()).await;
        assert!(matches!(result, Err(QueryError::Status(500))));
    }

    #[tokio::test]
    async fn test_no_retry_after_success() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, FACETS_BODY)));

        let result = executor(transport).execute(&query(), &config()).await;
        assert_eq!(result.get("this"), Some(&5));
    }

    #[tokio::test]
    async fn test_failure_then_success() {
        let mut transport = MockHttpTransport::new();
        let mut seq = mockall::Sequence::new();
        transport
            .expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(QueryError::Network("connection reset".to_string())));
        transport
            .expect_send()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(HttpResponse::new(200, FACETS_BODY)));

        let result = executor(transport).execute(&query(), &config()).await;
        assert_eq!(result, MetricCounts::from([("this".to_string(), 5)]));
    }

    #[tokio::test]
    async fn test_parse_failure_is_not_retried() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, r#"{"unexpected": true}"#)));

        let executor = executor(transport);
        let result = executor.try_execute(&query(), &config()).await;
        assert!(matches!(result, Err(QueryError::Parse(_))));
    }

    #[tokio::test]
    async fn test_request_carries_query_key() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .withf(|request| {
                request.header("X-Query-Key") == Some("fakeApiKey")
                    && request.url.starts_with("http://fakehost/v1/accounts/acct1/query?nrql=")
            })
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, r#"{"facets":[]}"#)));

        let result = executor(transport).execute(&query(), &config()).await;
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_non_retryable_transport_error_stops() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .times(1)
            .returning(|_| Err(QueryError::NotConfigured("no client".to_string())));

        let executor = executor(transport);
        let result = executor.try_execute(&query(), &config()).await;
        assert!(matches!(result, Err(QueryError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_custom_attempt_budget() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_send()
            .times(3)
            .returning(|_| Ok(HttpResponse::new(503, "")));

        let executor = executor(transport).with_max_attempts(3);
        assert_eq!(executor.max_attempts(), 3);
        assert!(executor.execute(&query(), &config()).await.is_empty());
    }
}
