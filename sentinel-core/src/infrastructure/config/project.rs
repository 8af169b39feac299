// sentinel-core/src/infrastructure/config/project.rs

use anyhow::Context;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

use crate::domain::catalog::RuleCatalog;
use crate::domain::project::ProjectConfig;
use crate::infrastructure::error::InfrastructureError;

const MANIFEST_CANDIDATES: [&str; 2] = ["sentinel_project_conf.yaml", "sentinel.yaml"];
const RULES_FILE: &str = "rules.yml";

pub const TARGET_PATH_ENV: &str = "SENTINEL_TARGET_PATH";
pub const DB_PATH_ENV: &str = "SENTINEL_DB_PATH";

#[instrument(skip(project_dir))]
pub fn load_project_config(project_dir: &Path) -> Result<ProjectConfig, InfrastructureError> {
    let config_path = find_main_config(project_dir)?;
    info!(path = ?config_path, "Loading project manifest");

    let mut config: ProjectConfig = load_fragment(&config_path)?;

    // Satellite rules: a corrupt file stops everything, a missing one means banking.
    config.rules = match config.config_paths.first() {
        Some(folder) => load_rule_catalog(&project_dir.join(folder))?,
        None => RuleCatalog::banking(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    for filename in MANIFEST_CANDIDATES {
        let p = root.join(filename);
        if p.exists() {
            return Ok(p);
        }
    }
    Err(InfrastructureError::ConfigNotFound(format!(
        "No configuration file found in {:?}. Checked: {:?}",
        root, MANIFEST_CANDIDATES
    )))
}

/// Reads one typed YAML file.
fn load_fragment<T: DeserializeOwned>(path: &Path) -> Result<T, InfrastructureError> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {:?}", path))?;
    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse YAML at {:?}", path))
        .map_err(Into::into)
}

/// Loads `<config_dir>/rules.yml`, or the banking catalog when it is absent.
/// Only parsing happens here; validation belongs to rule compilation.
pub fn load_rule_catalog(config_dir: &Path) -> Result<RuleCatalog, InfrastructureError> {
    let rules_path = config_dir.join(RULES_FILE);
    if !rules_path.exists() {
        info!("  📚 No rules.yml found, using the built-in banking catalog");
        return Ok(RuleCatalog::banking());
    }
    let catalog: RuleCatalog = load_fragment(&rules_path)?;
    info!(
        formats = catalog.formats.len(),
        relationships = catalog.foreign_keys.len(),
        "  ✅ Rule catalog loaded"
    );
    Ok(catalog)
}

fn apply_env_overrides(config: &mut ProjectConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup(TARGET_PATH_ENV) {
        info!(old = ?config.target_path, new = ?val, "Overriding target path via ENV");
        config.target_path = val;
    }
    if let Some(val) = lookup(DB_PATH_ENV) {
        info!(old = ?config.database, new = ?val, "Overriding database via ENV");
        config.database = Some(val);
    }
}
