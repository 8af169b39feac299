// sentinel/src/commands/mod.rs

pub mod audit;
pub mod inspect;
pub mod rules;
pub mod run;

use anyhow::Context;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use sentinel_core::application::AuditReport;
use sentinel_core::application::report;
use sentinel_core::domain::ports::UniquenessOracle;
use sentinel_core::domain::project::ProjectConfig;
use sentinel_core::infrastructure::adapters::{DuckDbStore, JsonDirectoryProvider};
use sentinel_core::infrastructure::config::load_project_config;

use crate::cli::ReportFormat;

pub(crate) fn load_config(project_dir: &Path) -> anyhow::Result<ProjectConfig> {
    eprintln!("⚙️  Loading configuration...");
    let config = load_project_config(project_dir).with_context(|| {
        format!(
            "Failed to load project configuration from {:?}",
            project_dir
        )
    })?;
    eprintln!("   Project: {} (v{})", config.name, config.version);
    Ok(config)
}

pub(crate) fn json_provider(project_dir: &Path, config: &ProjectConfig) -> JsonDirectoryProvider {
    JsonDirectoryProvider::new(
        project_dir.join(&config.data_path),
        config.expected_tables.clone(),
        config.rules.column_types.clone(),
    )
}

/// Opens the configured DuckDB database. With `create` false a missing file
/// means "no committed data" rather than a fresh database.
pub(crate) fn open_store(
    project_dir: &Path,
    config: &ProjectConfig,
    create: bool,
) -> anyhow::Result<Option<DuckDbStore>> {
    let Some(database) = &config.database else {
        return Ok(None);
    };
    let db_path = project_dir.join(database);
    if !create && !db_path.exists() {
        info!(path = ?db_path, "No database yet, uniqueness checked within the dataset only");
        return Ok(None);
    }
    eprintln!("   Engine: DuckDB 🦆 ({})", db_path.display());
    let store = DuckDbStore::new(&db_path.to_string_lossy())
        .with_context(|| format!("Failed to initialize DuckDB at {:?}", db_path))?;
    Ok(Some(store))
}

pub(crate) fn as_oracle(store: &Option<DuckDbStore>) -> Option<Arc<dyn UniquenessOracle>> {
    store
        .clone()
        .map(|s| Arc::new(s) as Arc<dyn UniquenessOracle>)
}

/// The rendered report is the only thing written to stdout; progress goes to stderr.
pub(crate) fn print_report(report: &AuditReport, format: ReportFormat) -> anyhow::Result<()> {
    let rendered = match format {
        ReportFormat::Table => report::summary_table(report),
        ReportFormat::Json => report::to_json(report)?,
        ReportFormat::Log => report::to_detailed_log(report),
    };
    println!("\n{}", rendered);
    Ok(())
}
