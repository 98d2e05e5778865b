// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! NerdGraph API (POST + GraphQL wrapping the NRQL query).
//!
//! The NRQL text is embedded as a GraphQL string argument and the whole
//! document is sent as the `query` member of a JSON body:
//!
//! ```text
//! {"query":"{actor{nrql(query:\"<nrql>\",accounts:<account>,timeout:200){results}}}","variables":""}
//! ```
//!
//! Results come back under `data.actor.nrql.results`, one object per facet
//! carrying `name` and `count`.

use serde::Deserialize;

use super::transport::HttpRequest;
use super::{add_count, ApiGeneration, QueryStrategy};
use crate::error::QueryError;
use crate::types::{MetricCounts, Query, QueryConfig};

/// Default NerdGraph base URL.
pub const NERDGRAPH_BASE_URL: &str = "https://api.newrelic.com";

/// Header carrying the user API key.
pub const API_KEY_HEADER: &str = "API-Key";

/// Server-side NRQL timeout in seconds.
const NRQL_TIMEOUT_SECS: u32 = 200;

/// POST-style strategy for the NerdGraph API.
#[derive(Debug, Clone)]
pub struct NerdGraphStrategy {
    base_url: String,
}

impl NerdGraphStrategy {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/graphql", self.base_url)
    }

    /// The GraphQL document for one NRQL query.
    pub fn graphql_document(nrql: &str, account_id: &str) -> String {
        format!(
            "{{actor{{nrql(query:{},accounts:{},timeout:{}){{results}}}}}}",
            graphql_string(nrql),
            account_id,
            NRQL_TIMEOUT_SECS
        )
    }
}

impl Default for NerdGraphStrategy {
    fn default() -> Self {
        Self::new(NERDGRAPH_BASE_URL)
    }
}

impl QueryStrategy for NerdGraphStrategy {
    fn generation(&self) -> ApiGeneration {
        ApiGeneration::NerdGraph
    }

    fn build_request(&self, query: &Query, config: &QueryConfig) -> HttpRequest {
        let body = serde_json::json!({
            "query": Self::graphql_document(&query.nrql, config.account_id()),
            "variables": "",
        });

        HttpRequest::post(self.endpoint(), body.to_string())
            .with_header(API_KEY_HEADER, config.api_key())
            .with_header("Content-Type", "application/json")
    }

    fn parse_response(&self, body: &str) -> Result<MetricCounts, QueryError> {
        let response: GraphResponse = serde_json::from_str(body)?;

        let mut counts = MetricCounts::new();
        for row in response.data.actor.nrql.results {
            add_count(&mut counts, &row.name, row.count);
        }
        Ok(counts)
    }
}

/// Quote a value as a GraphQL string literal.
fn graphql_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct GraphResponse {
    data: GraphData,
}

#[derive(Debug, Deserialize)]
struct GraphData {
    actor: GraphActor,
}

#[derive(Debug, Deserialize)]
struct GraphActor {
    nrql: NrqlResult,
}

#[derive(Debug, Deserialize)]
struct NrqlResult {
    results: Vec<ResultRow>,
}

#[derive(Debug, Deserialize)]
struct ResultRow {
    name: String,
    count: u64,
}
