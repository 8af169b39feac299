// sentinel/src/main.rs

mod cli;
mod commands;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG=debug sentinel run ... to see the per-rule details.
    // Logs go to stderr so a JSON report on stdout stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            project_dir,
            persist,
            format,
            strict,
        } => commands::run::execute(project_dir, persist, format, strict).await,
        Commands::Audit {
            project_dir,
            format,
            strict,
        } => commands::audit::execute(project_dir, format, strict).await,
        Commands::Rules { project_dir } => commands::rules::execute(project_dir),
        Commands::Inspect {
            db_path,
            table,
            limit,
        } => commands::inspect::execute(db_path, table, limit),
    }
}
