// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Insights query API (GET + NRQL in the query string).
//!
//! Request:
//!
//! ```text
//! GET {base}/v1/accounts/{account}/query?nrql=<form-encoded NRQL>
//! X-Query-Key: <api key>
//! ```
//!
//! Response (faceted count query):
//!
//! ```json
//! { "facets": [ { "name": "WebTransaction/Custom/foo", "results": [ { "count": 5 } ] } ] }
//! ```

use serde::Deserialize;
use url::form_urlencoded;

use super::transport::HttpRequest;
use super::{add_count, ApiGeneration, QueryStrategy};
use crate::error::QueryError;
use crate::types::{MetricCounts, Query, QueryConfig};

/// Default Insights API base URL.
pub const INSIGHTS_API_BASE_URL: &str = "https://insights-api.newrelic.com";

/// Header carrying the query key.
pub const QUERY_KEY_HEADER: &str = "X-Query-Key";

/// GET-style strategy for the Insights query API.
#[derive(Debug, Clone)]
pub struct InsightsStrategy {
    base_url: String,
}

impl InsightsStrategy {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Account-scoped API URL, e.g. `https://insights-api.newrelic.com/v1/accounts/42`.
    pub fn account_url(&self, account_id: &str) -> String {
        format!("{}/v1/accounts/{}", self.base_url, account_id)
    }
}

impl Default for InsightsStrategy {
    fn default() -> Self {
        Self::new(INSIGHTS_API_BASE_URL)
    }
}

impl QueryStrategy for InsightsStrategy {
    fn generation(&self) -> ApiGeneration {
        ApiGeneration::Insights
    }

    fn build_request(&self, query: &Query, config: &QueryConfig) -> HttpRequest {
        let encoded: String = form_urlencoded::byte_serialize(query.nrql.as_bytes()).collect();
        let url = format!("{}/query?nrql={}", self.account_url(config.account_id()), encoded);
        HttpRequest::get(url).with_header(QUERY_KEY_HEADER, config.api_key())
    }

    fn parse_response(&self, body: &str) -> Result<MetricCounts, QueryError> {
        let response: FacetsResponse = serde_json::from_str(body)?;

        let mut counts = MetricCounts::new();
        for facet in response.facets {
            let result = facet.results.first().ok_or_else(|| {
                QueryError::Parse(format!("facet '{}' has no results", facet.name))
            })?;
            add_count(&mut counts, &facet.name, result.count);
        }
        Ok(counts)
    }
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct FacetsResponse {
    facets: Vec<Facet>,
}

#[derive(Debug, Deserialize)]
struct Facet {
    name: String,
    results: Vec<FacetResult>,
}

#[derive(Debug, Deserialize)]
struct FacetResult {
    count: u64,
}
