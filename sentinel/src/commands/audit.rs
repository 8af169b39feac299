// sentinel/src/commands/audit.rs
//
// USE CASE: audit only. Nothing is cleaned, written or persisted.

use std::path::PathBuf;

use sentinel_core::application::audit_dataset;

use super::{as_oracle, json_provider, load_config, open_store, print_report};
use crate::cli::ReportFormat;

pub async fn execute(project_dir: PathBuf, format: ReportFormat, strict: bool) -> anyhow::Result<()> {
    let config = load_config(&project_dir)?;
    let provider = json_provider(&project_dir, &config);
    let store = open_store(&project_dir, &config, false)?;

    let (_, report) = match audit_dataset(&provider, as_oracle(&store), &config).await {
        Ok(audited) => audited,
        Err(e) => {
            eprintln!("\n💥 CRITICAL AUDIT ERROR: {}", e);
            std::process::exit(1);
        }
    };

    print_report(&report, format)?;
    if strict && report.is_fail() {
        eprintln!(
            "\n❌ AUDIT FAILED. {}/{} checks failed.",
            report.failed_checks, report.total_checks
        );
        std::process::exit(1);
    }
    Ok(())
}
