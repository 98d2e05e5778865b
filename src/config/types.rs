// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Configuration type definitions.
//!
//! Defines the structure of preference files and the resolved preferences,
//! supporting JSON and YAML formats. The API key is deliberately absent: it
//! never lives in a preference file.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::client::ApiGeneration;
use crate::traces::DEFAULT_INCLUDE;
use crate::types::QueryConfig;

/// Number of days queried when nothing else is configured.
pub const DEFAULT_NUM_DAYS: u32 = 1;

/// Preferences as written in a config file.
/// Can be defined in .trace-metrics.json or .trace-metrics/config.json in the project root.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferencesFile {
    /// New Relic account ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,

    /// Application name as reported to New Relic
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,

    /// Number of days to query (number or numeric string)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_days: Option<DaysSetting>,

    /// Last day of the window (YYYY-MM-DD); empty means "up to now"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub until_date: Option<String>,

    /// Remote API generation (insights, nerdgraph)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_generation: Option<String>,

    /// Custom API base URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_base_url: Option<String>,

    /// Glob patterns of source files scanned for traces
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,
}

/// A day count as users write it: `7` or `"7"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DaysSetting {
    Number(i64),
    Text(String),
}

impl DaysSetting {
    /// The raw value as text, for the settings-layer parser.
    pub fn as_text(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
        }
    }
}

/// Fully resolved preferences with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub account_id: String,
    pub app_name: String,
    pub num_days: u32,
    pub until_date: Option<NaiveDate>,
    pub api_generation: ApiGeneration,
    pub api_base_url: Option<String>,
    pub include: Vec<String>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            account_id: String::new(),
            app_name: String::new(),
            num_days: DEFAULT_NUM_DAYS,
            until_date: None,
            api_generation: ApiGeneration::default(),
            api_base_url: None,
            include: DEFAULT_INCLUDE.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Preferences {
    /// Build the immutable query configuration for one refresh.
    pub fn query_config(&self, api_key: impl Into<String>) -> QueryConfig {
        QueryConfig::new(
            self.account_id.clone(),
            api_key,
            self.app_name.clone(),
            self.num_days,
        )
        .with_until_date(self.until_date)
    }
}
