// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Browser links into New Relic Insights.
//!
//! These URLs are only ever opened by a human; nothing here is parsed back.

use url::{form_urlencoded, Url};

use crate::client::insights::INSIGHTS_API_BASE_URL;
use crate::query::builder::{escape_literal, CUSTOM_TRANSACTION_PREFIX};

/// Insights web UI host.
pub const INSIGHTS_WEB_URL: &str = "https://insights.newrelic.com";

/// Account-scoped Insights query API URL.
pub fn api_url(account_id: &str) -> String {
    format!("{}/v1/accounts/{}", INSIGHTS_API_BASE_URL, account_id)
}

/// Partial Insights query page URL; append an encoded NRQL query to it.
pub fn insights_url(account_id: &str) -> String {
    format!("{}/accounts/{}/query?query=", INSIGHTS_WEB_URL, account_id)
}

/// The NRQL shown in the browser for one metric.
pub fn browser_query(app_name: &str, metric: &str, num_days: u32) -> String {
    format!(
        "SELECT * from Transaction where appName = '{}' and name = '{}{}' since {} days ago",
        escape_literal(app_name),
        CUSTOM_TRANSACTION_PREFIX,
        escape_literal(metric),
        num_days
    )
}

/// Link to an Insights query view listing the transactions of one metric.
pub fn metric_link(
    account_id: &str,
    app_name: &str,
    metric: &str,
    num_days: u32,
) -> Result<Url, url::ParseError> {
    let encoded: String =
        form_urlencoded::byte_serialize(browser_query(app_name, metric, num_days).as_bytes()).collect();
    Url::parse(&format!("{}{}", insights_url(account_id), encoded))
}

#[cfg(test)]
mod tests {
    use super::*;

    const METRIC_NAME: &str = "some-metric-name";

    #[test]
    fn test_api_url() {
        assert_eq!(api_url("42"), "https://insights-api.newrelic.com/v1/accounts/42");
    }

    #[test]
    fn test_insights_url() {
        assert_eq!(
            insights_url("42"),
            "https://insights.newrelic.com/accounts/42/query?query="
        );
    }

    #[test]
    fn test_metric_link() {
        let link = metric_link("42", "app1", METRIC_NAME, 1).unwrap().to_string();

        assert!(link.starts_with("https://insights.newrelic.com/accounts/"));
        assert!(link.contains(METRIC_NAME));
        assert!(link.contains("since+1+days+ago"));
        assert!(link.contains("WebTransaction%2FCustom%2Fsome-metric-name"));
    }

    #[test]
    fn test_metric_link_follows_days() {
        let link = metric_link("42", "app1", METRIC_NAME, 7).unwrap().to_string();
        assert!(link.contains("since+7+days+ago"));
    }

    #[test]
    fn test_browser_query_escapes_quotes() {
        assert_eq!(
            browser_query("Joe's", "it's", 1),
            r"SELECT * from Transaction where appName = 'Joe\'s' and name = 'WebTransaction/Custom/it\'s' since 1 days ago"
        );
    }

    #[test]
    fn test_metric_link_decodes_to_query() {
        let link = metric_link("42", "app 1", "foo", 3).unwrap();
        let (key, value) = link.query_pairs().next().unwrap();
        assert_eq!(key, "query");
        assert_eq!(value, browser_query("app 1", "foo", 3));
    }
}
