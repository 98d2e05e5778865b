// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! trace-metrics - how often do your traces fire?
//!
//! Pairs the `@Trace(metricName = "...")` annotations found in a Java code
//! base with the counts New Relic recorded for them, querying either the
//! Insights query API or NerdGraph.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - [`types`] - Core type definitions (QueryConfig, Query, MetricCounts)
//! - [`error`] - Error types and result aliases
//! - [`config`] - Preference loading and merging
//! - [`query`] - Query building and the per-refresh aggregator
//! - [`client`] - HTTP transport, API strategies and the retrying executor
//! - [`traces`] - Source annotation scanner and the trace table
//! - [`links`] - Browser links into Insights
//! - [`telemetry`] - Tracing and metrics infrastructure
//!
//! # Example
//!
//! ```rust,ignore
//! use trace_metrics::config::{load_config, CliOptions};
//! use trace_metrics::query::fetch_counts;
//!
//! let prefs = load_config(Path::new("."), CliOptions::default())?;
//! let config = prefs.query_config(api_key);
//! let counts = fetch_counts(&config, prefs.api_generation, None, None).await;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod links;
pub mod query;
pub mod telemetry;
pub mod traces;
pub mod types;

// Re-export commonly used types at crate root
pub use client::{
    create_executor, create_strategy, ApiGeneration, HttpTransport, QueryExecutor, QueryStrategy,
    ReqwestTransport,
};
pub use error::{ConfigError, QueryError, Result, ScanError};
pub use query::{build_queries, fetch_counts, Aggregator};
pub use traces::{Trace, TraceScanner, TraceTable};
pub use types::{merge_counts, MetricCounts, NoProgress, ProgressSink, Query, QueryConfig};

/// trace-metrics version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
