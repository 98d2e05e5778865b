// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! End-to-end refresh tests over a scripted in-memory transport.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;

use trace_metrics::client::{HttpMethod, HttpRequest, HttpResponse};
use trace_metrics::{
    create_executor, merge_counts, Aggregator, ApiGeneration, HttpTransport, MetricCounts,
    NoProgress, QueryConfig, QueryError,
};

// ============================================================================
// Scripted Transport
// ============================================================================

/// Replays canned responses in order and records every request it sees.
#[derive(Default)]
struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse, QueryError>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    fn new(responses: Vec<Result<HttpResponse, QueryError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, QueryError> {
        self.requests.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(QueryError::Network("script exhausted".to_string())))
    }
}

fn facets(name: &str, count: u64) -> Result<HttpResponse, QueryError> {
    Ok(HttpResponse::new(
        200,
        format!(
            r#"{{"facets":[{{"name":"WebTransaction/Custom/{}","results":[{{"count":{}}}]}}]}}"#,
            name, count
        ),
    ))
}

fn nerdgraph_results(entries: &[(&str, u64)]) -> Result<HttpResponse, QueryError> {
    let results: Vec<String> = entries
        .iter()
        .map(|(name, count)| format!(r#"{{"name":"{}","count":{}}}"#, name, count))
        .collect();
    Ok(HttpResponse::new(
        200,
        format!(
            r#"{{"data":{{"actor":{{"nrql":{{"results":[{}]}}}}}}}}"#,
            results.join(",")
        ),
    ))
}

fn until(day: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2020, 11, day)
}

fn aggregator(generation: ApiGeneration, transport: Arc<ScriptedTransport>) -> Aggregator {
    Aggregator::new(create_executor(generation, Some("http://fakehost"), transport))
}

// ============================================================================
// Insights
// ============================================================================

#[tokio::test]
async fn test_two_day_window_sums_daily_counts() {
    let transport = ScriptedTransport::new(vec![facets("foo", 4), facets("foo", 6)]);
    let config = QueryConfig::new("acct1", "key1", "app1", 2).with_until_date(until(3));

    let progress = Mutex::new(Vec::new());
    let sink = |message: &str| progress.lock().unwrap().push(message.to_string());
    let counts = aggregator(ApiGeneration::Insights, transport.clone())
        .refresh(&config, &sink)
        .await;

    assert_eq!(counts, MetricCounts::from([("foo".to_string(), 10)]));

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.method == HttpMethod::Get));
    assert!(requests
        .iter()
        .all(|r| r.url.starts_with("http://fakehost/v1/accounts/acct1/query?nrql=")));
    assert!(requests.iter().all(|r| r.header("X-Query-Key") == Some("key1")));
    assert!(requests[0].url.contains("SINCE+%272020-11-01%27+UNTIL+%272020-11-02%27"));
    assert!(requests[1].url.contains("SINCE+%272020-11-02%27+UNTIL+%272020-11-03%27"));

    let progress = progress.into_inner().unwrap();
    assert_eq!(progress.len(), 2);
    assert!(progress[0].starts_with("Running New Relic query: appName = 'app1'"));
}

#[tokio::test]
async fn test_trailing_window_sends_one_query() {
    let transport = ScriptedTransport::new(vec![facets("checkout", 42)]);
    let config = QueryConfig::new("acct1", "key1", "app1", 7);

    let counts = aggregator(ApiGeneration::Insights, transport.clone())
        .refresh(&config, &NoProgress)
        .await;

    assert_eq!(counts.get("checkout"), Some(&42));
    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].url.contains("SINCE+7+days+ago"));
    assert!(requests[0].url.contains("LIMIT+1000"));
}

#[tokio::test]
async fn test_inert_configs_never_touch_the_network() {
    let configs = [
        QueryConfig::new("", "key1", "app1", 2),
        QueryConfig::new("acct1", "  ", "app1", 2),
        QueryConfig::new("acct1", "key1", "", 2),
        QueryConfig::new("acct1", "key1", "app1", 0).with_until_date(until(3)),
    ];

    for config in &configs {
        let transport = ScriptedTransport::new(vec![facets("foo", 1)]);
        let counts = aggregator(ApiGeneration::Insights, transport.clone())
            .refresh(config, &NoProgress)
            .await;

        assert!(counts.is_empty());
        assert!(transport.requests().is_empty());
    }
}

#[tokio::test]
async fn test_failed_day_degrades_coverage() {
    // Day one fails twice, day two answers on its retry.
    let transport = ScriptedTransport::new(vec![
        Err(QueryError::Network("connection refused".to_string())),
        Ok(HttpResponse::new(503, "")),
        Ok(HttpResponse::new(500, "")),
        facets("foo", 6),
    ]);
    let config = QueryConfig::new("acct1", "key1", "app1", 2).with_until_date(until(3));

    let counts = aggregator(ApiGeneration::Insights, transport.clone())
        .refresh(&config, &NoProgress)
        .await;

    assert_eq!(counts, MetricCounts::from([("foo".to_string(), 6)]));
    assert_eq!(transport.requests().len(), 4);
}

#[tokio::test]
async fn test_malformed_body_contributes_nothing() {
    let transport = ScriptedTransport::new(vec![
        Ok(HttpResponse::new(200, r#"{"facets": "nope"}"#)),
        facets("foo", 6),
    ]);
    let config = QueryConfig::new("acct1", "key1", "app1", 2).with_until_date(until(3));

    let counts = aggregator(ApiGeneration::Insights, transport.clone())
        .refresh(&config, &NoProgress)
        .await;

    assert_eq!(counts.get("foo"), Some(&6));
    assert_eq!(transport.requests().len(), 2);
}

#[tokio::test]
async fn test_huge_daily_counts_saturate() {
    let transport = ScriptedTransport::new(vec![facets("foo", u64::MAX), facets("foo", 6)]);
    let config = QueryConfig::new("acct1", "key1", "app1", 2).with_until_date(until(3));

    let counts = aggregator(ApiGeneration::Insights, transport)
        .refresh(&config, &NoProgress)
        .await;

    assert_eq!(counts.get("foo"), Some(&u64::MAX));
}

// ============================================================================
// NerdGraph
// ============================================================================

#[tokio::test]
async fn test_nerdgraph_window() {
    let transport = ScriptedTransport::new(vec![
        nerdgraph_results(&[("WebTransaction/Custom/foo", 4), ("WebTransaction/Custom/bar", 1)]),
        nerdgraph_results(&[("WebTransaction/Custom/foo", 6)]),
    ]);
    let config = QueryConfig::new("acct1", "key1", "app1", 2).with_until_date(until(3));

    let counts = aggregator(ApiGeneration::NerdGraph, transport.clone())
        .refresh(&config, &NoProgress)
        .await;

    assert_eq!(
        counts,
        MetricCounts::from([("foo".to_string(), 10), ("bar".to_string(), 1)])
    );

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    for request in &requests {
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, "http://fakehost/graphql");
        assert_eq!(request.header("API-Key"), Some("key1"));
        assert_eq!(request.header("Content-Type"), Some("application/json"));

        let body: serde_json::Value =
            serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
        let document = body["query"].as_str().unwrap();
        assert!(document.contains("accounts:acct1"));
        assert!(document.contains("appName = 'app1'"));
        assert_eq!(body["variables"], "");
    }
}

// ============================================================================
// Merge
// ============================================================================

#[test]
fn test_merge_is_order_independent() {
    let a = MetricCounts::from([("foo".to_string(), 4), ("bar".to_string(), 2)]);
    let b = MetricCounts::from([("foo".to_string(), 6)]);
    let c = MetricCounts::from([("baz".to_string(), 1), ("bar".to_string(), 3)]);

    let mut forward = MetricCounts::new();
    for partial in [a.clone(), b.clone(), c.clone()] {
        merge_counts(&mut forward, partial);
    }

    let mut backward = MetricCounts::new();
    for partial in [c, b, a] {
        merge_counts(&mut backward, partial);
    }

    assert_eq!(forward, backward);
    assert_eq!(forward.get("foo"), Some(&10));
    assert_eq!(forward.get("bar"), Some(&5));

    let mut with_empty = forward.clone();
    merge_counts(&mut with_empty, MetricCounts::new());
    assert_eq!(with_empty, forward);
}
