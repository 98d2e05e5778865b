// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Source scanning for New Relic `@Trace` annotations.
//!
//! Only annotations with an explicit `metricName` attribute are reported; a
//! bare `@Trace` has no stable name to look up counts for.

use std::path::{Path, PathBuf};
use std::time::Instant;

use globset::{Glob, GlobSet, GlobSetBuilder};
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;
use walkdir::WalkDir;

#[cfg(feature = "telemetry")]
use crate::telemetry::metrics::GLOBAL_METRICS;

use super::Trace;
use crate::error::ScanError;

/// Files scanned when no include patterns are configured.
pub const DEFAULT_INCLUDE: &[&str] = &["**/*.java"];

/// Directories never descended into.
const EXCLUDED_DIRS: &[&str] = &["target", "build", "out", "node_modules"];

static TRACE_ANNOTATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"@(?:com\.newrelic\.api\.agent\.)?Trace\s*\(((?:"(?:[^"\\]|\\.)*"|[^)"])*)\)"#)
        .expect("trace annotation pattern is valid")
});

static METRIC_NAME_ATTR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\bmetricName\s*=\s*"((?:[^"\\]|\\.)*)""#).expect("metricName pattern is valid")
});

/// Walks a project tree collecting named trace annotations.
pub struct TraceScanner {
    root: PathBuf,
    include: GlobSet,
}

impl TraceScanner {
    /// Scanner over `root` with the default include patterns.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, ScanError> {
        Self::with_patterns(root, DEFAULT_INCLUDE)
    }

    /// Scanner over `root` matching files against `patterns` (relative paths).
    pub fn with_patterns<S: AsRef<str>>(
        root: impl Into<PathBuf>,
        patterns: &[S],
    ) -> Result<Self, ScanError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(Glob::new(pattern.as_ref())?);
        }
        Ok(Self {
            root: root.into(),
            include: builder.build()?,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Scan every included file, in path order.
    pub fn scan(&self) -> Result<Vec<Trace>, ScanError> {
        let start = Instant::now();
        let mut traces = Vec::new();

        let walker = WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_excluded(e));

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = entry.path().strip_prefix(&self.root).unwrap_or(entry.path());
            if !self.include.is_match(relative) {
                continue;
            }

            let content = match std::fs::read_to_string(entry.path()) {
                Ok(content) => content,
                Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                    debug!(path = %entry.path().display(), "Skipping non-UTF-8 file");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            traces.extend(find_traces(&content, entry.path()));
        }

        #[cfg(feature = "telemetry")]
        GLOBAL_METRICS.record_operation("traces.scan", start.elapsed());

        debug!(
            root = %self.root.display(),
            traces = traces.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Trace scan complete"
        );

        Ok(traces)
    }
}

fn is_excluded(entry: &walkdir::DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    if name.starts_with('.') {
        return true;
    }
    entry.file_type().is_dir() && EXCLUDED_DIRS.contains(&name.as_ref())
}

/// Find named trace annotations in one file's content.
pub fn find_traces(content: &str, file: &Path) -> Vec<Trace> {
    TRACE_ANNOTATION
        .captures_iter(content)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let args = caps.get(1)?.as_str();
            let name = METRIC_NAME_ATTR.captures(args)?.get(1)?.as_str();
            let line = content[..whole.start()].matches('\n').count() + 1;
            Some(Trace::new(name, file, line))
        })
        .collect()
}
