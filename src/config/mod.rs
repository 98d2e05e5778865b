// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration module for trace-metrics.
//!
//! Handles loading, merging, and validation of preferences from multiple sources:
//! - Global config: ~/.trace-metrics/config.json
//! - Workspace config: .trace-metrics.json, .trace-metrics/config.json, or trace-metrics.config.json
//! - Local config: .trace-metrics.local.json (gitignored, for personal overrides)
//! - CLI options: command-line arguments
//!
//! Preferences are merged with precedence (CLI > local > workspace > global > defaults).
//! The API key is never read from a file; callers supply it when building a
//! [`crate::types::QueryConfig`].

mod loader;
mod merger;
mod types;

// Re-export public types
pub use loader::{
    find_workspace_root, get_example_config, get_global_config_dir, get_global_config_path,
    init_config, load_config_file, load_global_config, load_local_config, load_workspace_config,
    save_workspace_config, CONFIG_FILES, GLOBAL_CONFIG_DIR, GLOBAL_CONFIG_FILE, LOCAL_CONFIG_FILE,
};

pub use merger::{
    default_config, merge_config, merge_config_at, parse_num_days, parse_until_date, CliOptions,
};

pub use types::{DaysSetting, Preferences, PreferencesFile, DEFAULT_NUM_DAYS};

use crate::error::ConfigError;
use std::path::Path;

/// Load and merge all configuration sources for a workspace.
///
/// This is the main entry point for configuration loading.
pub fn load_config(
    workspace_root: &Path,
    cli_options: CliOptions,
) -> Result<Preferences, ConfigError> {
    let global = load_global_config()?;
    let workspace = load_workspace_config(workspace_root)?;
    let local = load_local_config(workspace_root)?;

    Ok(merge_config(global, workspace, local, cli_options))
}
