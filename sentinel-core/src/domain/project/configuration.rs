// src/domain/project/configuration.rs

use crate::domain::catalog::RuleCatalog;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How far the cleaner propagates foreign-key removals.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CascadeMode {
    /// One pass over the relationships, in declared order.
    #[default]
    SinglePass,
    /// Repeat the pass until no more rows are removed.
    FixedPoint,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProjectConfig {
    pub name: String,
    pub version: String,

    #[serde(rename = "config-paths", default = "default_config_paths")]
    pub config_paths: Vec<String>,

    /// Directory holding one `<table>.json` file per table.
    #[serde(rename = "data-path", default = "default_data_path")]
    pub data_path: String,

    #[serde(rename = "target-path", default = "default_target_path")]
    pub target_path: String,

    /// DuckDB file backing the uniqueness oracle and the durable sink.
    #[serde(default)]
    pub database: Option<String>,

    #[serde(rename = "oracle-timeout-ms", default = "default_oracle_timeout_ms")]
    pub oracle_timeout_ms: u64,

    #[serde(default)]
    pub cascade: CascadeMode,

    /// Tables the audit expects. Empty means "whatever the provider supplies".
    #[serde(rename = "expected-tables", default)]
    pub expected_tables: Vec<String>,

    /// Filled from `config/rules.yml`; the banking catalog otherwise.
    #[serde(skip)]
    pub rules: RuleCatalog,
}

impl ProjectConfig {
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_millis(self.oracle_timeout_ms)
    }
}

fn default_config_paths() -> Vec<String> {
    vec!["config".to_string()]
}
fn default_data_path() -> String {
    "data".to_string()
}
fn default_target_path() -> String {
    "target".to_string()
}
fn default_oracle_timeout_ms() -> u64 {
    5_000
}
