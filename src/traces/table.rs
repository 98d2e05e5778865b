// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! The trace table shown to the user.
//!
//! The table owns its rows; a refresh hands it a [`MetricCounts`] value and
//! the table applies it. An empty result means "no data" (not configured, or
//! every query failed) and renders as `--` rather than as zero.

use std::cmp::Reverse;

use super::Trace;
use crate::types::MetricCounts;

/// Placeholder shown when a refresh produced no data at all.
pub const NO_DATA: &str = "--";

/// One trace with its hit count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceRow {
    pub trace: Trace,
    /// Count from the last refresh; `None` until one produced data.
    pub hits: Option<u64>,
}

impl TraceRow {
    /// Hit count as displayed: `1,234`, or `--` when there is no data.
    pub fn hits_display(&self) -> String {
        self.hits
            .map(format_count)
            .unwrap_or_else(|| NO_DATA.to_string())
    }
}

/// Row orderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Source order (file, then line).
    #[default]
    File,
    /// Metric name, alphabetical.
    Name,
    /// Most hits first; rows without data last.
    Hits,
}

/// All known traces and their latest counts.
#[derive(Debug, Clone, Default)]
pub struct TraceTable {
    rows: Vec<TraceRow>,
}

impl TraceTable {
    pub fn new(traces: Vec<Trace>) -> Self {
        Self {
            rows: traces
                .into_iter()
                .map(|trace| TraceRow { trace, hits: None })
                .collect(),
        }
    }

    pub fn rows(&self) -> &[TraceRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Fill in counts from a refresh result.
    ///
    /// Traces missing from a non-empty result did not fire and get zero.
    pub fn apply_counts(&mut self, counts: &MetricCounts) {
        let no_data = counts.is_empty();
        for row in &mut self.rows {
            row.hits = if no_data {
                None
            } else {
                Some(counts.get(&row.trace.metric_name).copied().unwrap_or(0))
            };
        }
    }

    pub fn sort(&mut self, order: SortOrder) {
        match order {
            SortOrder::File => self
                .rows
                .sort_by(|a, b| (&a.trace.file, a.trace.line).cmp(&(&b.trace.file, b.trace.line))),
            SortOrder::Name => self
                .rows
                .sort_by(|a, b| a.trace.metric_name.cmp(&b.trace.metric_name)),
            SortOrder::Hits => self
                .rows
                .sort_by_key(|row| (Reverse(row.hits), row.trace.metric_name.clone())),
        }
    }

    /// Counts for metrics that fired but match no known trace.
    pub fn unmatched<'a>(&self, counts: &'a MetricCounts) -> Vec<(&'a str, u64)> {
        let mut unmatched: Vec<_> = counts
            .iter()
            .filter(|(name, _)| !self.rows.iter().any(|r| &r.trace.metric_name == *name))
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        unmatched.sort();
        unmatched
    }
}

/// Format a count with thousands separators.
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TraceTable {
        TraceTable::new(vec![
            Trace::new("placeOrder", "src/OrderService.java", 7),
            Trace::new("cancelOrder", "src/OrderService.java", 13),
            Trace::new("audit", "src/Audit.java", 3),
        ])
    }

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_000), "1,000");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn test_rows_start_without_data() {
        let table = table();
        assert_eq!(table.len(), 3);
        assert!(table.rows().iter().all(|r| r.hits_display() == NO_DATA));
    }

    #[test]
    fn test_apply_counts() {
        let mut table = table();
        table.apply_counts(&MetricCounts::from([("placeOrder".to_string(), 12_345)]));

        assert_eq!(table.rows()[0].hits_display(), "12,345");
        assert_eq!(table.rows()[1].hits_display(), "0");
        assert_eq!(table.rows()[2].hits, Some(0));
    }

    #[test]
    fn test_empty_counts_show_placeholder() {
        let mut table = table();
        table.apply_counts(&MetricCounts::from([("placeOrder".to_string(), 1)]));
        table.apply_counts(&MetricCounts::new());
        assert!(table.rows().iter().all(|r| r.hits.is_none()));
    }

    #[test]
    fn test_sort_orders() {
        let mut table = table();
        table.apply_counts(&MetricCounts::from([
            ("cancelOrder".to_string(), 5),
            ("audit".to_string(), 9),
        ]));

        table.sort(SortOrder::Hits);
        let names: Vec<_> = table.rows().iter().map(|r| r.trace.metric_name.as_str()).collect();
        assert_eq!(names, vec!["audit", "cancelOrder", "placeOrder"]);

        table.sort(SortOrder::Name);
        assert_eq!(table.rows()[0].trace.metric_name, "audit");

        table.sort(SortOrder::File);
        assert_eq!(table.rows()[0].trace.file.to_str(), Some("src/Audit.java"));
        assert_eq!(table.rows()[1].trace.line, 7);
    }

    #[test]
    fn test_unmatched_counts() {
        let table = table();
        let counts = MetricCounts::from([
            ("placeOrder".to_string(), 1),
            ("legacyJob".to_string(), 4),
        ]);
        assert_eq!(table.unmatched(&counts), vec![("legacyJob", 4)]);
    }
}
