// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! NRQL query construction.
//!
//! A trailing window ("the last N days") fits in one query. A window that ends
//! at a fixed date is split into one query per calendar day, because absolute
//! multi-day ranges have proven unreliable on the remote side; the per-day
//! partial counts are summed by the aggregator.

use chrono::{Days, NaiveDate};

use crate::types::{Query, QueryConfig};

/// Event name prefix used by custom `@Trace` transactions.
pub const CUSTOM_TRANSACTION_PREFIX: &str = "WebTransaction/Custom/";

/// Maximum number of facets requested per query.
pub const RESULT_LIMIT: u32 = 1000;

/// Build the ordered list of queries for a configuration.
///
/// With no until-date this is always a single query. With an until-date `D`
/// and `n` days it is `n` one-day windows, oldest first, tiling `[D - n, D]`.
/// Zero days with an until-date yields an empty list.
pub fn build_queries(config: &QueryConfig) -> Vec<Query> {
    match config.until_date() {
        None => vec![trailing_query(config.app_name(), config.num_days())],
        Some(until) => day_windows(until, config.num_days())
            .into_iter()
            .map(|(since, until)| window_query(config.app_name(), since, until))
            .collect(),
    }
}

/// Query for the trailing `num_days` days ending now.
pub fn trailing_query(app_name: &str, num_days: u32) -> Query {
    Query::new(format!(
        "{} AND appName = '{}' SINCE {} days ago FACET name LIMIT {}",
        select_clause(),
        escape_literal(app_name),
        num_days,
        RESULT_LIMIT
    ))
}

/// Query for the window from `since` to `until`.
pub fn window_query(app_name: &str, since: NaiveDate, until: NaiveDate) -> Query {
    Query::new(format!(
        "{} AND appName = '{}' SINCE '{}' UNTIL '{}' FACET name LIMIT {}",
        select_clause(),
        escape_literal(app_name),
        since.format("%Y-%m-%d"),
        until.format("%Y-%m-%d"),
        RESULT_LIMIT
    ))
}

/// Escape a value for use inside a single-quoted NRQL string.
pub fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// One-day `(since, until)` pairs covering `[until - num_days, until]`.
pub fn day_windows(until: NaiveDate, num_days: u32) -> Vec<(NaiveDate, NaiveDate)> {
    let Some(first) = until.checked_sub_days(Days::new(u64::from(num_days))) else {
        return Vec::new();
    };

    first
        .iter_days()
        .take(num_days as usize)
        .filter_map(|day| day.succ_opt().map(|next| (day, next)))
        .collect()
}

fn select_clause() -> String {
    format!(
        "SELECT count(*) FROM Transaction WHERE name LIKE '{}%'",
        CUSTOM_TRANSACTION_PREFIX
    )
}
