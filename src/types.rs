// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Core type definitions for trace-metrics.
//!
//! These types flow through a single refresh: a [`QueryConfig`] goes in,
//! a list of [`Query`] values is built from it, and a [`MetricCounts`]
//! mapping comes out. Nothing here outlives one refresh.

use std::collections::HashMap;
use std::fmt;

use chrono::NaiveDate;

/// Metric name to number of times the trace fired.
///
/// Insertion order carries no meaning; consumers sort as they see fit.
pub type MetricCounts = HashMap<String, u64>;

/// Add every count in `partial` to `total`, inserting names as needed.
///
/// A metric that fired on several days shows up in several partial results,
/// so counts are summed rather than overwritten. Sums saturate at `u64::MAX`.
pub fn merge_counts(total: &mut MetricCounts, partial: MetricCounts) {
    for (name, count) in partial {
        let entry = total.entry(name).or_insert(0);
        *entry = entry.saturating_add(count);
    }
}

// ============================================================================
// Query Configuration
// ============================================================================

/// Everything needed to query trace counts for one application.
///
/// Built fresh for every refresh from the user's preferences. A configuration
/// with a blank account, key or application, or a zero day count, is *inert*:
/// no query is ever sent for it and the refresh yields an empty mapping.
#[derive(Clone, PartialEq, Eq)]
pub struct QueryConfig {
    account_id: String,
    api_key: String,
    app_name: String,
    num_days: u32,
    until_date: Option<NaiveDate>,
}

impl QueryConfig {
    /// Create a new query configuration.
    pub fn new(
        account_id: impl Into<String>,
        api_key: impl Into<String>,
        app_name: impl Into<String>,
        num_days: u32,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            api_key: api_key.into(),
            app_name: app_name.into(),
            num_days,
            until_date: None,
        }
    }

    /// End the window at a fixed date instead of now.
    pub fn with_until_date(mut self, until_date: Option<NaiveDate>) -> Self {
        self.until_date = until_date;
        self
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn num_days(&self) -> u32 {
        self.num_days
    }

    pub fn until_date(&self) -> Option<NaiveDate> {
        self.until_date
    }

    /// True when no query may be issued for this configuration.
    pub fn is_inert(&self) -> bool {
        self.account_id.trim().is_empty()
            || self.api_key.trim().is_empty()
            || self.app_name.trim().is_empty()
            || self.num_days == 0
    }
}

impl fmt::Debug for QueryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryConfig")
            .field("account_id", &self.account_id)
            .field("api_key", &"<redacted>")
            .field("app_name", &self.app_name)
            .field("num_days", &self.num_days)
            .field("until_date", &self.until_date)
            .finish()
    }
}

// ============================================================================
// Queries
// ============================================================================

/// One NRQL query, ready to be handed to an executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// The NRQL text sent to the remote endpoint.
    pub nrql: String,
    /// Human-readable filter clause, shown while the query runs.
    pub description: String,
}

impl Query {
    /// Wrap NRQL text, deriving the description from its filter clause.
    pub fn new(nrql: impl Into<String>) -> Self {
        let nrql = nrql.into();
        let description = describe(&nrql);
        Self { nrql, description }
    }
}

/// The part of a query from `appName` up to `FACET`.
fn describe(nrql: &str) -> String {
    let start = nrql.find("appName").unwrap_or(0);
    let end = nrql[start..]
        .find("FACET")
        .map(|offset| start + offset)
        .unwrap_or(nrql.len());
    nrql[start..end].trim().to_string()
}

// ============================================================================
// Progress
// ============================================================================

/// Receives human-readable status lines while a refresh runs.
pub trait ProgressSink: Send + Sync {
    fn report(&self, message: &str);
}

impl<F> ProgressSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report(&self, message: &str) {
        self(message)
    }
}

/// Progress sink that drops every message.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _message: &str) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_merge_counts_is_additive() {
        let mut total = MetricCounts::new();
        merge_counts(&mut total, MetricCounts::from([("foo".to_string(), 3)]));
        merge_counts(
            &mut total,
            MetricCounts::from([("foo".to_string(), 2), ("bar".to_string(), 1)]),
        );

        assert_eq!(total.len(), 2);
        assert_eq!(total["foo"], 5);
        assert_eq!(total["bar"], 1);
    }

    #[test]
    fn test_merge_counts_saturates() {
        let mut total = MetricCounts::from([("foo".to_string(), u64::MAX)]);
        merge_counts(&mut total, MetricCounts::from([("foo".to_string(), 1)]));
        assert_eq!(total["foo"], u64::MAX);
    }

    #[test]
    fn test_merge_counts_order_independent() {
        let a = MetricCounts::from([("foo".to_string(), 3)]);
        let b = MetricCounts::from([("foo".to_string(), 2), ("bar".to_string(), 1)]);

        let mut forward = MetricCounts::new();
        merge_counts(&mut forward, a.clone());
        merge_counts(&mut forward, b.clone());

        let mut backward = MetricCounts::new();
        merge_counts(&mut backward, b);
        merge_counts(&mut backward, a);

        assert_eq!(forward, backward);
    }

    #[test]
    fn test_query_config_inert() {
        assert!(!QueryConfig::new("acct1", "key1", "app1", 1).is_inert());
        assert!(QueryConfig::new("", "key1", "app1", 1).is_inert());
        assert!(QueryConfig::new("acct1", "  ", "app1", 1).is_inert());
        assert!(QueryConfig::new("acct1", "key1", "", 1).is_inert());
        assert!(QueryConfig::new("acct1", "key1", "app1", 0).is_inert());
    }

    #[test]
    fn test_query_config_debug_redacts_key() {
        let config = QueryConfig::new("acct1", "super-secret", "app1", 7);
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
        assert!(debug.contains("app1"));
    }

    #[test]
    fn test_query_description() {
        let query = Query::new(
            "SELECT count(*) FROM Transaction WHERE appName = 'app1' SINCE 7 days ago FACET name LIMIT 1000",
        );
        assert_eq!(query.description, "appName = 'app1' SINCE 7 days ago");
    }

    #[test]
    fn test_query_description_without_markers() {
        let query = Query::new("SELECT 1");
        assert_eq!(query.description, "SELECT 1");
    }

    #[test]
    fn test_closure_progress_sink() {
        let seen = Mutex::new(Vec::new());
        let sink = |message: &str| seen.lock().unwrap().push(message.to_string());
        sink.report("one");
        sink.report("two");
        assert_eq!(*seen.lock().unwrap(), vec!["one", "two"]);
    }
}
