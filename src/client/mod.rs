// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! New Relic query clients.
//!
//! Two generations of the remote API are supported, each as a
//! [`QueryStrategy`] that knows how to build a request and parse its response:
//!
//! - [`insights::InsightsStrategy`] - GET with NRQL in the query string
//! - [`nerdgraph::NerdGraphStrategy`] - POST with a GraphQL body
//!
//! The [`QueryExecutor`] runs either strategy over a pluggable
//! [`HttpTransport`] and owns the retry policy.
//!
//! ```rust,ignore
//! use trace_metrics::client::{create_executor, ApiGeneration, ReqwestTransport};
//!
//! let transport = std::sync::Arc::new(ReqwestTransport::new()?);
//! let executor = create_executor(ApiGeneration::NerdGraph, None, transport);
//! let counts = executor.execute(&query, &config).await;
//! ```

pub mod executor;
pub mod insights;
pub mod nerdgraph;
pub mod transport;

pub use executor::{QueryExecutor, DEFAULT_MAX_ATTEMPTS};
pub use insights::InsightsStrategy;
pub use nerdgraph::NerdGraphStrategy;
pub use transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::query::builder::CUSTOM_TRANSACTION_PREFIX;
use crate::types::{MetricCounts, Query, QueryConfig};

/// Supported remote API generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiGeneration {
    /// Insights query API (GET)
    #[default]
    Insights,
    /// NerdGraph GraphQL API (POST)
    NerdGraph,
}

impl ApiGeneration {
    /// Get the default base URL for this generation.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            Self::Insights => insights::INSIGHTS_API_BASE_URL,
            Self::NerdGraph => nerdgraph::NERDGRAPH_BASE_URL,
        }
    }

    /// Short lowercase name, used as a metrics key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insights => "insights",
            Self::NerdGraph => "nerdgraph",
        }
    }
}

/// Error type for parsing an API generation from a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseApiGenerationError;

impl std::fmt::Display for ParseApiGenerationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid API generation (expected insights or nerdgraph)")
    }
}

impl std::error::Error for ParseApiGenerationError {}

impl std::str::FromStr for ApiGeneration {
    type Err = ParseApiGenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "insights" | "rest" | "v1" | "get" => Ok(Self::Insights),
            "nerdgraph" | "graphql" | "post" => Ok(Self::NerdGraph),
            _ => Err(ParseApiGenerationError),
        }
    }
}

impl std::fmt::Display for ApiGeneration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Insights => write!(f, "Insights"),
            Self::NerdGraph => write!(f, "NerdGraph"),
        }
    }
}

/// Request building and response parsing for one API generation.
pub trait QueryStrategy: Send + Sync {
    /// Which API this strategy speaks.
    fn generation(&self) -> ApiGeneration;

    /// Build the request for one query.
    fn build_request(&self, query: &Query, config: &QueryConfig) -> transport::HttpRequest;

    /// Parse a 200 response body into bare metric names and counts.
    ///
    /// Parsing is all-or-nothing: a structural problem anywhere fails the whole body.
    fn parse_response(&self, body: &str) -> Result<MetricCounts, QueryError>;
}

/// Strip the custom transaction prefix, yielding the bare metric name.
pub fn metric_name(event_name: &str) -> &str {
    event_name
        .strip_prefix(CUSTOM_TRANSACTION_PREFIX)
        .unwrap_or(event_name)
}

/// Add a raw event count under its bare metric name.
pub(crate) fn add_count(counts: &mut MetricCounts, event_name: &str, count: u64) {
    let entry = counts.entry(metric_name(event_name).to_string()).or_insert(0);
    *entry = entry.saturating_add(count);
}

/// Create the strategy for an API generation.
///
/// `base_url` overrides the generation's public endpoint (useful for proxies
/// and tests).
pub fn create_strategy(generation: ApiGeneration, base_url: Option<&str>) -> Box<dyn QueryStrategy> {
    let base_url = base_url.unwrap_or_else(|| generation.default_base_url());
    match generation {
        ApiGeneration::Insights => Box::new(InsightsStrategy::new(base_url)),
        ApiGeneration::NerdGraph => Box::new(NerdGraphStrategy::new(base_url)),
    }
}

/// Create an executor for an API generation over the given transport.
pub fn create_executor(
    generation: ApiGeneration,
    base_url: Option<&str>,
    transport: Arc<dyn HttpTransport>,
) -> QueryExecutor {
    QueryExecutor::new(create_strategy(generation, base_url), transport)
}
