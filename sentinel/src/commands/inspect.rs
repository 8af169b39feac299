// sentinel/src/commands/inspect.rs
//
// USE CASE: Inspect a persisted table (schema + sample rows).

use std::path::Path;

use sentinel_core::infrastructure::adapters::DuckDbStore;

pub fn execute(db_path: String, table: String, limit: usize) -> anyhow::Result<()> {
    if !Path::new(&db_path).exists() {
        anyhow::bail!(
            "❌ Database not found at: {}\n👉 Have you run 'sentinel run --persist'?",
            db_path
        );
    }

    let store = DuckDbStore::new(&db_path)?;
    let inspection = store.inspect(&table, limit)?;

    println!("\n🔍 Inspecting Table: '{}' ({} rows)", table, inspection.row_count);
    let columns: Vec<String> = inspection
        .columns
        .iter()
        .map(|c| format!("{} {}", c.name, c.data_type))
        .collect();
    println!("   Columns: [{}]", columns.join(", "));
    println!("   --- Rows (Limit {}) ---", limit);

    for row in &inspection.rows {
        let values: Vec<&str> = row.iter().map(|v| v.as_deref().unwrap_or("NULL")).collect();
        println!("   ➜ {}", values.join(" | "));
    }

    Ok(())
}
