// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration merging and settings validation.
//!
//! Invalid values never fail a merge: like a settings dialog that refuses a
//! bad entry, each layer's bad value is dropped and the previous one kept.

use chrono::{Local, NaiveDate};
use tracing::warn;

use super::types::{Preferences, PreferencesFile};
use crate::client::ApiGeneration;

/// CLI options that can override configuration.
#[derive(Debug, Clone, Default)]
pub struct CliOptions {
    pub account_id: Option<String>,
    pub app_name: Option<String>,
    pub num_days: Option<String>,
    pub until_date: Option<String>,
    pub api_generation: Option<String>,
    pub api_base_url: Option<String>,
}

/// Default configuration values.
pub fn default_config() -> Preferences {
    Preferences::default()
}

/// Merge multiple configurations with precedence.
///
/// Precedence (highest to lowest):
/// 1. CLI options
/// 2. Local config (.trace-metrics.local.json)
/// 3. Workspace config (.trace-metrics.json)
/// 4. Global config (~/.trace-metrics/config.json)
/// 5. Default values
pub fn merge_config(
    global: Option<PreferencesFile>,
    workspace: Option<PreferencesFile>,
    local: Option<PreferencesFile>,
    cli: CliOptions,
) -> Preferences {
    merge_config_at(global, workspace, local, cli, Local::now().date_naive())
}

/// [`merge_config`] with an explicit "today" for the future-date check.
pub fn merge_config_at(
    global: Option<PreferencesFile>,
    workspace: Option<PreferencesFile>,
    local: Option<PreferencesFile>,
    cli: CliOptions,
    today: NaiveDate,
) -> Preferences {
    let mut result = default_config();

    for config in [global, workspace, local].into_iter().flatten() {
        apply_preferences_file(&mut result, &config, today);
    }

    apply_cli_options(&mut result, &cli, today);

    result
}

fn apply_preferences_file(result: &mut Preferences, config: &PreferencesFile, today: NaiveDate) {
    if let Some(ref account_id) = config.account_id {
        result.account_id = account_id.trim().to_string();
    }

    if let Some(ref app_name) = config.app_name {
        result.app_name = app_name.trim().to_string();
    }

    if let Some(ref num_days) = config.num_days {
        result.num_days = parse_num_days(&num_days.as_text(), result.num_days);
    }

    if let Some(ref until_date) = config.until_date {
        result.until_date = parse_until_date(until_date, today, result.until_date);
    }

    if let Some(ref generation) = config.api_generation {
        result.api_generation = parse_generation(generation, result.api_generation);
    }

    if config.api_base_url.is_some() {
        result.api_base_url = config.api_base_url.clone();
    }

    if let Some(ref include) = config.include {
        if !include.is_empty() {
            result.include = include.clone();
        }
    }
}

fn apply_cli_options(result: &mut Preferences, cli: &CliOptions, today: NaiveDate) {
    if let Some(ref account_id) = cli.account_id {
        result.account_id = account_id.trim().to_string();
    }

    if let Some(ref app_name) = cli.app_name {
        result.app_name = app_name.trim().to_string();
    }

    if let Some(ref num_days) = cli.num_days {
        result.num_days = parse_num_days(num_days, result.num_days);
    }

    if let Some(ref until_date) = cli.until_date {
        result.until_date = parse_until_date(until_date, today, result.until_date);
    }

    if let Some(ref generation) = cli.api_generation {
        result.api_generation = parse_generation(generation, result.api_generation);
    }

    if cli.api_base_url.is_some() {
        result.api_base_url = cli.api_base_url.clone();
    }
}

/// Parse a day count, keeping `previous` if the input is not a non-negative integer.
pub fn parse_num_days(input: &str, previous: u32) -> u32 {
    match input.trim().parse::<i64>() {
        Ok(n) if n >= 0 => u32::try_from(n).unwrap_or(previous),
        _ => {
            warn!(value = %input, "Ignoring invalid day count");
            previous
        }
    }
}

/// Parse an until-date, keeping `previous` if it is malformed or after `today`.
///
/// An empty string clears the date, switching back to a trailing window.
pub fn parse_until_date(
    input: &str,
    today: NaiveDate,
    previous: Option<NaiveDate>,
) -> Option<NaiveDate> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    match NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        Ok(date) if date <= today => Some(date),
        Ok(_) => {
            warn!(value = %input, "Ignoring until-date in the future");
            previous
        }
        Err(_) => {
            warn!(value = %input, "Ignoring malformed until-date");
            previous
        }
    }
}

fn parse_generation(input: &str, previous: ApiGeneration) -> ApiGeneration {
    input.parse().unwrap_or_else(|_| {
        warn!(value = %input, "Ignoring unknown API generation");
        previous
    })
}
