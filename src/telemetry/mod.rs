// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Logging and metrics infrastructure.
//!
//! - **Tracing**: structured logging through `tracing` / `tracing-subscriber`
//! - **Metrics**: attempt counters and latency histograms per API generation
//!
//! # Usage
//!
//! Initialize telemetry at application startup:
//!
//! ```rust,ignore
//! use trace_metrics::telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(&TelemetryConfig::default())?;
//! ```
//!
//! API keys are never recorded as span or event fields.

mod init;
pub mod metrics;

pub use init::{init_telemetry, TelemetryConfig, TelemetryGuard};
pub use metrics::{AttemptMetrics, Histogram, Metrics, MetricsSnapshot, OperationMetrics, GLOBAL_METRICS};
