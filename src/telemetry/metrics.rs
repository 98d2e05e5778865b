// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Metrics collection for query monitoring.
//!
//! Lightweight in-process counters and latency histograms; no exporter.
//! Attempts are tracked per API generation, whole operations (a refresh, a
//! scan) by name.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use std::time::{Duration, Instant};

use once_cell::sync::Lazy;

/// Global metrics instance.
pub static GLOBAL_METRICS: Lazy<Metrics> = Lazy::new(Metrics::new);

/// Central metrics collection.
#[derive(Debug)]
pub struct Metrics {
    /// Request attempts by API generation.
    attempts: RwLock<HashMap<String, AttemptMetrics>>,

    /// General operation metrics.
    operations: RwLock<HashMap<String, OperationMetrics>>,

    /// Start time for calculating uptime.
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector.
    pub fn new() -> Self {
        Self {
            attempts: RwLock::new(HashMap::new()),
            operations: RwLock::new(HashMap::new()),
            start_time: Instant::now(),
        }
    }

    /// Record one HTTP attempt against an API.
    pub fn record_attempt(&self, api: &str, duration: Duration, success: bool) {
        let mut attempts = self.attempts.write().unwrap_or_else(PoisonError::into_inner);
        let metrics = attempts.entry(api.to_string()).or_default();
        metrics.record(duration, success);
    }

    /// Record a generic operation.
    pub fn record_operation(&self, name: &str, duration: Duration) {
        let mut ops = self.operations.write().unwrap_or_else(PoisonError::into_inner);
        let metrics = ops.entry(name.to_string()).or_default();
        metrics.record(duration);
    }

    /// Get attempt metrics for an API.
    pub fn attempt_metrics(&self, api: &str) -> Option<AttemptMetrics> {
        self.attempts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(api)
            .cloned()
    }

    /// Get metrics for a specific operation.
    pub fn operation_metrics(&self, name: &str) -> Option<OperationMetrics> {
        self.operations
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Get uptime since metrics were initialized.
    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Take a snapshot of all metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let attempts = self.attempts.read().unwrap_or_else(PoisonError::into_inner);
        let operations = self.operations.read().unwrap_or_else(PoisonError::into_inner);

        MetricsSnapshot {
            attempts: attempts.clone(),
            operations: operations.clone(),
            uptime: self.uptime(),
        }
    }

    /// Reset all metrics.
    pub fn reset(&self) {
        self.attempts.write().unwrap_or_else(PoisonError::into_inner).clear();
        self.operations.write().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Request attempts against one API.
#[derive(Debug, Clone)]
pub struct AttemptMetrics {
    /// Total number of attempts.
    pub attempts: u64,

    /// Attempts answered with HTTP 200.
    pub successes: u64,

    /// Transport failures and non-200 answers.
    pub failures: u64,

    /// Latency distribution.
    pub latency: OperationMetrics,
}

impl AttemptMetrics {
    pub fn new() -> Self {
        Self {
            attempts: 0,
            successes: 0,
            failures: 0,
            latency: OperationMetrics::new(),
        }
    }

    /// Record an attempt.
    pub fn record(&mut self, duration: Duration, success: bool) {
        self.attempts += 1;
        if success {
            self.successes += 1;
        } else {
            self.failures += 1;
        }
        self.latency.record(duration);
    }

    /// Calculate success rate (0.0 to 1.0).
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            1.0
        } else {
            self.successes as f64 / self.attempts as f64
        }
    }
}

impl Default for AttemptMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Generic operation metrics with histogram.
#[derive(Debug, Clone)]
pub struct OperationMetrics {
    /// Number of operations.
    pub count: u64,

    /// Total duration.
    pub total_duration: Duration,

    /// Minimum duration.
    pub min_duration: Duration,

    /// Maximum duration.
    pub max_duration: Duration,

    /// Histogram buckets for latency distribution.
    pub histogram: Histogram,
}

impl OperationMetrics {
    /// Create new operation metrics.
    pub fn new() -> Self {
        Self {
            count: 0,
            total_duration: Duration::ZERO,
            min_duration: Duration::MAX,
            max_duration: Duration::ZERO,
            histogram: Histogram::default(),
        }
    }

    /// Record an operation.
    pub fn record(&mut self, duration: Duration) {
        self.count += 1;
        self.total_duration += duration;
        self.min_duration = self.min_duration.min(duration);
        self.max_duration = self.max_duration.max(duration);
        self.histogram.record(duration);
    }

    /// Calculate average duration.
    pub fn avg_duration(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            self.total_duration / self.count as u32
        }
    }
}

impl Default for OperationMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple histogram with fixed buckets for latency tracking.
#[derive(Debug, Clone)]
pub struct Histogram {
    /// Bucket boundaries in milliseconds.
    buckets: Vec<u64>,

    /// Count per bucket (last one is overflow).
    counts: Vec<u64>,
}

impl Histogram {
    /// Create a histogram with custom bucket boundaries (in milliseconds).
    pub fn with_buckets(buckets: Vec<u64>) -> Self {
        let counts = vec![0; buckets.len() + 1];
        Self { buckets, counts }
    }

    /// Record a duration value.
    pub fn record(&mut self, duration: Duration) {
        let millis = duration.as_millis() as u64;
        let bucket_idx = self
            .buckets
            .iter()
            .position(|&b| millis <= b)
            .unwrap_or(self.buckets.len());
        self.counts[bucket_idx] += 1;
    }

    /// Get counts for each bucket.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Get bucket boundaries.
    pub fn buckets(&self) -> &[u64] {
        &self.buckets
    }

    /// Calculate approximate percentile (p50, p90, p99, etc.).
    pub fn percentile(&self, p: f64) -> Duration {
        let total: u64 = self.counts.iter().sum();
        if total == 0 {
            return Duration::ZERO;
        }

        let target = (total as f64 * p / 100.0).ceil() as u64;
        let mut cumulative = 0u64;

        for (i, &count) in self.counts.iter().enumerate() {
            cumulative += count;
            if cumulative >= target {
                let millis = if i < self.buckets.len() {
                    self.buckets[i]
                } else {
                    self.buckets.last().copied().unwrap_or(0) * 2
                };
                return Duration::from_millis(millis);
            }
        }

        Duration::ZERO
    }

    /// Get p50 (median) latency.
    pub fn p50(&self) -> Duration {
        self.percentile(50.0)
    }

    /// Get p99 latency.
    pub fn p99(&self) -> Duration {
        self.percentile(99.0)
    }
}

impl Default for Histogram {
    fn default() -> Self {
        // 10ms, 50ms, 100ms, 250ms, 500ms, 1s, 2.5s, 5s, 10s, 30s
        Self::with_buckets(vec![10, 50, 100, 250, 500, 1_000, 2_500, 5_000, 10_000, 30_000])
    }
}

/// A snapshot of all metrics at a point in time.
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    /// Attempt metrics by API generation.
    pub attempts: HashMap<String, AttemptMetrics>,

    /// Operation metrics by name.
    pub operations: HashMap<String, OperationMetrics>,

    /// Uptime when snapshot was taken.
    pub uptime: Duration,
}

impl MetricsSnapshot {
    /// Format as a human-readable report.
    pub fn format_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Query Metrics ===\n\n");
        report.push_str(&format!("Uptime: {:.2?}\n\n", self.uptime));

        if !self.attempts.is_empty() {
            report.push_str("Requests:\n");
            let mut apis: Vec<_> = self.attempts.iter().collect();
            apis.sort_by(|a, b| a.0.cmp(b.0));
            for (api, metrics) in apis {
                report.push_str(&format!(
                    "  {}: {} attempts, {:.1}% success, avg {:.2?}, p99 {:.2?}\n",
                    api,
                    metrics.attempts,
                    metrics.success_rate() * 100.0,
                    metrics.latency.avg_duration(),
                    metrics.latency.histogram.p99()
                ));
            }
            report.push('\n');
        }

        if !self.operations.is_empty() {
            report.push_str("Operations:\n");
            let mut ops: Vec<_> = self.operations.iter().collect();
            ops.sort_by(|a, b| a.0.cmp(b.0));
            for (name, metrics) in ops {
                report.push_str(&format!(
                    "  {}: {} ops, avg {:.2?}, max {:.2?}\n",
                    name,
                    metrics.count,
                    metrics.avg_duration(),
                    metrics.max_duration
                ));
            }
        }

        report
    }
}
