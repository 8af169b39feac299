// sentinel/src/cli.rs
//
// Single source of truth for all CLI definitions (Clap structs).

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sentinel")]
#[command(about = "Relational data-quality audit and cleaning engine", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Which view of the audit report is printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Executive summary table
    Table,
    /// Machine-readable report
    Json,
    /// Detailed line-oriented log
    Log,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 🚀 Audits, cleans and writes the reports (optionally persists the cleaned data)
    Run {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Append the cleaned tables to the configured DuckDB database
        #[arg(long)]
        persist: bool,

        #[arg(long, value_enum, default_value = "table")]
        format: ReportFormat,

        /// Exit with code 1 when the audit fails
        #[arg(long)]
        strict: bool,
    },

    /// 🔍 Audits the dataset and prints the report, nothing is cleaned or written
    Audit {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        #[arg(long, value_enum, default_value = "table")]
        format: ReportFormat,

        /// Exit with code 1 when the audit fails
        #[arg(long)]
        strict: bool,
    },

    /// 📜 Lists the checks compiled from the rule catalog
    Rules {
        /// Project directory
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },

    /// 🦆 Inspects a persisted DuckDB table (schema + sample rows)
    Inspect {
        /// Path to the DuckDB database file
        #[arg(long, default_value = "sentinel.duckdb")]
        db_path: String,

        /// Table name to inspect
        #[arg(long, short)]
        table: String,

        /// Number of sample rows to display
        #[arg(long, default_value = "5")]
        limit: usize,
    },
}
