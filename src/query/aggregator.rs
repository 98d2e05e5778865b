// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Runs every query for a configuration and merges the results.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

#[cfg(feature = "telemetry")]
use crate::telemetry::metrics::GLOBAL_METRICS;

use super::builder::build_queries;
use crate::client::{create_executor, ApiGeneration, QueryExecutor, ReqwestTransport};
use crate::types::{merge_counts, MetricCounts, NoProgress, ProgressSink, QueryConfig};

/// Prefix of the status line reported before each query.
pub const PROGRESS_PREFIX: &str = "Running New Relic query: ";

/// Orchestrates builder and executor over a full window.
///
/// Queries run strictly one after another. A failed query contributes
/// nothing; it never aborts the refresh.
pub struct Aggregator {
    executor: QueryExecutor,
}

impl Aggregator {
    pub fn new(executor: QueryExecutor) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    /// Query all counts for a configuration.
    ///
    /// An inert configuration returns an empty mapping without touching the
    /// network; callers render that as "no data".
    pub async fn refresh(&self, config: &QueryConfig, progress: &dyn ProgressSink) -> MetricCounts {
        if config.is_inert() {
            debug!("Configuration incomplete, skipping refresh");
            return MetricCounts::new();
        }

        let start = Instant::now();
        let queries = build_queries(config);
        let mut totals = MetricCounts::new();

        for query in &queries {
            progress.report(&format!("{}{}", PROGRESS_PREFIX, query.description));
            let partial = self.executor.execute(query, config).await;
            merge_counts(&mut totals, partial);
        }

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("aggregator.refresh", start.elapsed());

        info!(
            app = %config.app_name(),
            queries = queries.len(),
            metrics = totals.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Refresh complete"
        );

        totals
    }
}

/// Query counts over HTTPS with the default transport.
///
/// Nothing can fail visibly here: a transport that cannot be built is
/// treated like every other failure and yields an empty mapping.
pub async fn fetch_counts(
    config: &QueryConfig,
    generation: ApiGeneration,
    base_url: Option<&str>,
    progress: Option<&dyn ProgressSink>,
) -> MetricCounts {
    let transport = match ReqwestTransport::new() {
        Ok(transport) => Arc::new(transport),
        Err(e) => {
            tracing::warn!(error = %e, "Could not create HTTP transport");
            return MetricCounts::new();
        }
    };

    let aggregator = Aggregator::new(create_executor(generation, base_url, transport));
    aggregator.refresh(config, progress.unwrap_or(&NoProgress)).await
}
