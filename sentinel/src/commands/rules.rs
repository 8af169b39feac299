// sentinel/src/commands/rules.rs
//
// USE CASE: show what the catalog compiles to.

use anyhow::Context;
use std::path::PathBuf;

use sentinel_core::domain::checks::RuleSet;

use super::load_config;

pub fn execute(project_dir: PathBuf) -> anyhow::Result<()> {
    let config = load_config(&project_dir)?;
    let rules = RuleSet::compile(&config.rules, None, config.oracle_timeout())
        .context("Rule catalog is invalid")?;

    println!("\n📜 {} checks, in execution order:", rules.len());
    for entry in rules.entries() {
        println!(
            "   ➜ {}{}",
            entry.rule.id(),
            if entry.feeds_cleaning {
                ""
            } else {
                " (informational)"
            }
        );
        println!("     {}", entry.rule.requirement());
    }
    println!(
        "\n🔗 {} foreign keys, cascade mode: {:?}",
        config.rules.foreign_keys.len(),
        config.cascade
    );
    for fk in &config.rules.foreign_keys {
        println!("   ➜ {}", fk);
    }
    Ok(())
}
