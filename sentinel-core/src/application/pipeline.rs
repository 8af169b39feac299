// sentinel-core/src/application/pipeline.rs

use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::error::SentinelError;
use crate::ports::{DatasetProvider, DurableSink};

// Application Services
use crate::application::aggregate::aggregate_report;
use crate::application::audit::{AuditReport, run_audit};
use crate::application::clean::Cleaner;
use crate::application::report;

// Domain
use crate::domain::catalog::{DependencyGraph, ForeignKey};
use crate::domain::checks::{CheckStatus, RuleSet};
use crate::domain::dataset::Snapshot;
use crate::domain::ports::UniquenessOracle;
use crate::domain::project::ProjectConfig;

// Infrastructure
use crate::infrastructure::fs::atomic_write;

/// Outcome of persisting one cleaned table.
#[derive(Debug, Clone, Serialize)]
pub struct TableLoad {
    pub table: String,
    pub rows: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct RunResult {
    pub report: AuditReport,
    #[serde(skip)]
    pub cleaned: Snapshot,
    pub report_files: Vec<PathBuf>,
    pub loads: Vec<TableLoad>,
}

impl RunResult {
    pub fn all_loaded(&self) -> bool {
        self.loads.iter().all(|l| l.success)
    }
}

/// Keeps only the expected tables, warning about missing and unexpected ones.
/// An empty expectation keeps everything.
pub fn select_expected_tables(snapshot: &Snapshot, expected: &[String]) -> Snapshot {
    if expected.is_empty() {
        return snapshot.clone();
    }
    for name in expected {
        if snapshot.table(name).is_none() {
            warn!(table = %name, "⚠️ Expected table missing from dataset");
        }
    }
    for name in snapshot.table_names() {
        if !expected.contains(&name) {
            warn!(table = %name, "⚠️ Unexpected table ignored");
        }
    }
    snapshot.retain(|name| expected.iter().any(|e| e == name))
}

/// Load, validate the schema structure, then run every check.
/// Only an unreadable dataset or a malformed catalog aborts.
#[instrument(skip_all, fields(source = provider.source_name()))]
pub async fn audit_dataset(
    provider: &dyn DatasetProvider,
    oracle: Option<Arc<dyn UniquenessOracle>>,
    config: &ProjectConfig,
) -> Result<(Snapshot, AuditReport), SentinelError> {
    // Catalog first: a configuration error must stop us before any check runs.
    let rules = RuleSet::compile(&config.rules, oracle, config.oracle_timeout())?;

    eprintln!("📥 Loading dataset from {}...", provider.source_name());
    let loaded = provider.load().await?;
    let snapshot = select_expected_tables(&loaded, &config.expected_tables);
    eprintln!(
        "   {} tables, {} records",
        snapshot.table_names().len(),
        snapshot.total_records()
    );

    eprintln!("🔍 Running {} checks...", rules.len());
    let report = run_audit(&snapshot, &rules).await;
    for check in &report.checks {
        let icon = match check.status {
            CheckStatus::Pass => "✅",
            CheckStatus::Fail => "❌",
            CheckStatus::Skip => "⏭️ ",
        };
        eprintln!("   {} {} completed: {}", icon, check.check_id, check.status);
    }

    Ok((snapshot, report))
}

/// Full run: audit, aggregate, clean, write the reports and optionally persist.
pub async fn run_pipeline(
    provider: &dyn DatasetProvider,
    oracle: Option<Arc<dyn UniquenessOracle>>,
    sink: Option<&dyn DurableSink>,
    project_dir: &Path,
    config: &ProjectConfig,
) -> Result<RunResult, SentinelError> {
    eprintln!("🚀 Starting data quality pipeline...");
    let start_time = std::time::Instant::now();

    let (snapshot, report) = audit_dataset(provider, oracle, config).await?;

    eprintln!("🧮 Aggregating failures and cleaning...");
    let failing = aggregate_report(&report);
    let cleaner = Cleaner::new(config.rules.foreign_keys.clone(), config.cascade);
    let (cleaned, summary) = cleaner.clean(&snapshot, &failing);
    eprintln!(
        "   {} -> {} records ({:.2}% retained)",
        summary.total_original, summary.total_retained, summary.retained_percentage
    );
    let report = report.with_cleaning(summary);

    let target_dir = project_dir.join(&config.target_path);
    let report_files = write_reports(&target_dir, &report)?;

    let loads = match sink {
        Some(sink) => persist_cleaned(sink, &cleaned, &config.rules.foreign_keys).await?,
        None => vec![],
    };

    eprintln!(
        "🏁 Pipeline finished in {:.2?}: {}",
        start_time.elapsed(),
        report.overall_status
    );

    Ok(RunResult {
        report,
        cleaned,
        report_files,
        loads,
    })
}

/// Writes the JSON report, the detailed log and the summary table under
/// `<target>/reports/<YYYY-MM-DD>/`.
pub fn write_reports(target_dir: &Path, report: &AuditReport) -> Result<Vec<PathBuf>, SentinelError> {
    let now = Utc::now();
    let dir = target_dir
        .join("reports")
        .join(now.format("%Y-%m-%d").to_string());
    fs::create_dir_all(&dir)?;
    let stamp = now.format("%Y%m%d_%H%M%S");

    let files = [
        (format!("audit_report_{}.json", stamp), report::to_json(report)?),
        (
            format!("audit_log_{}.txt", stamp),
            report::to_detailed_log(report),
        ),
        (
            format!("audit_summary_{}.txt", stamp),
            report::summary_table(report),
        ),
    ];

    let mut written = Vec::with_capacity(files.len());
    for (name, content) in files {
        let path = dir.join(name);
        atomic_write(&path, content)?;
        info!(path = ?path, "Report written");
        written.push(path);
    }
    eprintln!("📝 Reports written to {}", dir.display());
    Ok(written)
}

/// Persists every cleaned table, parents before children. A failing table is
/// reported and the others still go through.
#[instrument(skip_all, fields(sink = sink.engine_name()))]
pub async fn persist_cleaned(
    sink: &dyn DurableSink,
    cleaned: &Snapshot,
    relationships: &[ForeignKey],
) -> Result<Vec<TableLoad>, SentinelError> {
    if cleaned.total_records() == 0 {
        warn!("⚠️ Cleaned dataset is empty, nothing persisted");
        return Ok(vec![]);
    }

    let order = DependencyGraph::flat_order(&cleaned.table_names(), relationships)?;
    let mut loads = Vec::new();
    for name in order {
        let Some(table) = cleaned.table(&name) else {
            continue;
        };
        let load = match sink.persist(table).await {
            Ok(()) => {
                eprintln!("   💾 {} ({} rows)", name, table.len());
                TableLoad {
                    table: name,
                    rows: table.len(),
                    success: true,
                    error: None,
                }
            }
            Err(e) => {
                eprintln!("   ❌ Failed to persist {}: {}", name, e);
                TableLoad {
                    table: name,
                    rows: table.len(),
                    success: false,
                    error: Some(e.to_string()),
                }
            }
        };
        loads.push(load);
    }
    Ok(loads)
}
