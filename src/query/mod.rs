// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Query building and aggregation.
//!
//! - [`builder`] - turns a [`QueryConfig`](crate::types::QueryConfig) into NRQL queries
//! - [`aggregator`] - runs the queries in order and sums the counts per metric

pub mod aggregator;
pub mod builder;

pub use aggregator::{fetch_counts, Aggregator, PROGRESS_PREFIX};
pub use builder::{build_queries, day_windows, escape_literal, CUSTOM_TRANSACTION_PREFIX, RESULT_LIMIT};
