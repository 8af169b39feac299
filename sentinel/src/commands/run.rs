// sentinel/src/commands/run.rs
//
// USE CASE: audit, clean, write the reports, optionally persist.

use std::path::PathBuf;

use sentinel_core::application::run_pipeline;
use sentinel_core::ports::DurableSink;

use super::{as_oracle, json_provider, load_config, open_store, print_report};
use crate::cli::ReportFormat;

pub async fn execute(
    project_dir: PathBuf,
    persist: bool,
    format: ReportFormat,
    strict: bool,
) -> anyhow::Result<()> {
    let start = std::time::Instant::now();

    let config = load_config(&project_dir)?;
    if persist && config.database.is_none() {
        anyhow::bail!("❌ --persist needs a `database` entry in the project configuration");
    }

    let provider = json_provider(&project_dir, &config);
    let store = open_store(&project_dir, &config, persist)?;
    let sink = if persist {
        store.as_ref().map(|s| s as &dyn DurableSink)
    } else {
        None
    };

    let result = run_pipeline(&provider, as_oracle(&store), sink, &project_dir, &config).await;

    match result {
        Ok(run_res) => {
            print_report(&run_res.report, format)?;
            if !run_res.all_loaded() {
                let failed = run_res.loads.iter().filter(|l| !l.success).count();
                eprintln!("\n❌ FAILURE. {} tables could not be persisted.", failed);
                std::process::exit(1);
            }
            if strict && run_res.report.is_fail() {
                eprintln!(
                    "\n❌ AUDIT FAILED. {}/{} checks failed.",
                    run_res.report.failed_checks, run_res.report.total_checks
                );
                std::process::exit(1);
            }
            eprintln!("\n✨ SUCCESS! Run finished in {:.2?}", start.elapsed());
        }
        Err(e) => {
            eprintln!("\n💥 CRITICAL PIPELINE ERROR: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
