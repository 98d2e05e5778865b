// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Trace points found in source code, and the table that pairs them with counts.
//!
//! - [`scanner`] - finds `@Trace(metricName = "...")` annotations in a project
//! - [`table`] - one row per trace, filled in from a refresh result

pub mod scanner;
pub mod table;

pub use scanner::{TraceScanner, DEFAULT_INCLUDE};
pub use table::{SortOrder, TraceRow, TraceTable, NO_DATA};

use std::path::{Path, PathBuf};

/// A source annotation naming a trace metric.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    /// Metric name given in the annotation.
    pub metric_name: String,
    /// File containing the annotation.
    pub file: PathBuf,
    /// 1-based line of the annotation.
    pub line: usize,
}

impl Trace {
    pub fn new(metric_name: impl Into<String>, file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            metric_name: metric_name.into(),
            file: file.into(),
            line,
        }
    }

    /// File name without its directory.
    pub fn file_name(&self) -> String {
        self.file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.file.to_string_lossy().to_string())
    }

    /// Path relative to `root`, or the full path if it lies elsewhere.
    pub fn relative_to(&self, root: &Path) -> PathBuf {
        self.file
            .strip_prefix(root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| self.file.clone())
    }
}
