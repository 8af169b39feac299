// sentinel-core/src/application/report.rs

// Every view below is derived from a single AuditReport; none keeps state of its own.

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, ContentArrangement, Table};
use std::fmt::Write;

use crate::application::audit::AuditReport;
use crate::application::clean::CleaningSummary;

/// Machine-readable view.
pub fn to_json(report: &AuditReport) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(report)
}

/// Line-oriented detailed log.
pub fn to_detailed_log(report: &AuditReport) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_log(&mut out, report);
    out
}

fn write_log(out: &mut String, report: &AuditReport) -> std::fmt::Result {
    writeln!(out, "=== DATA QUALITY AUDIT ===")?;
    writeln!(out, "Timestamp: {}", report.audit_timestamp.to_rfc3339())?;
    writeln!(out, "Overall status: {}", report.overall_status)?;
    writeln!(
        out,
        "Checks: {} total, {} passed, {} failed, {} skipped ({:.2}% pass rate)",
        report.total_checks,
        report.passed_checks,
        report.failed_checks,
        report.skipped_checks,
        report.pass_rate
    )?;
    writeln!(
        out,
        "Tables analyzed: {} ({} records)",
        report.tables_analyzed.join(", "),
        report.total_records_analyzed
    )?;

    for check in &report.checks {
        writeln!(out)?;
        writeln!(out, "[{}] {}", check.status, check.check_id)?;
        writeln!(out, "  Requirement: {}", check.requirement)?;
        if let Some(reason) = &check.skip_reason {
            writeln!(out, "  Skipped: {}", reason)?;
        }
        if let Some(error) = &check.error {
            writeln!(out, "  Error: {}", error)?;
        }
        if let Some(degraded) = &check.degraded {
            writeln!(out, "  Degraded: {}", degraded)?;
        }
        for issue in &check.issues {
            writeln!(out, "  - {}", issue.describe())?;
        }
        if !check.failing_rows.is_empty() {
            let per_table: Vec<String> = check
                .failing_rows
                .iter()
                .map(|(table, rows)| format!("{}={}", table, rows.len()))
                .collect();
            writeln!(
                out,
                "  Failing rows: {}{}",
                per_table.join(", "),
                if check.feeds_cleaning {
                    ""
                } else {
                    " (informational, not cleaned)"
                }
            )?;
        }
    }

    if let Some(cleaning) = &report.cleaning {
        writeln!(out)?;
        write_cleaning(out, cleaning)?;
    }
    Ok(())
}

fn write_cleaning(out: &mut String, cleaning: &CleaningSummary) -> std::fmt::Result {
    writeln!(out, "=== CLEANING ===")?;
    for (table, t) in &cleaning.tables {
        writeln!(
            out,
            "{}: {} -> {} (direct {}, cascade {}, {:.2}% retained)",
            table,
            t.original_count,
            t.final_count,
            t.directly_removed,
            t.cascade_removed,
            t.retained_percentage
        )?;
    }
    for stat in cleaning.cascades.iter().filter(|s| s.removed > 0) {
        writeln!(
            out,
            "Cascade {}: removed {} of {} (pass {})",
            stat.relationship, stat.removed, stat.original_count, stat.pass
        )?;
    }
    writeln!(
        out,
        "Total: {} -> {} records, {} removed ({:.2}% retained)",
        cleaning.total_original,
        cleaning.total_retained,
        cleaning.records_removed,
        cleaning.retained_percentage
    )
}

/// Executive summary, one row per check.
pub fn summary_table(report: &AuditReport) -> String {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Check", "Requirement", "Status", "Issues", "Violations"]);

    for check in &report.checks {
        table.add_row(vec![
            Cell::new(&check.check_id),
            Cell::new(&check.requirement),
            Cell::new(check.status.to_string()),
            Cell::new(check.issues.len()),
            Cell::new(check.violation_count()),
        ]);
    }

    format!(
        "{}\nOverall: {} ({}/{} passed)",
        table, report.overall_status, report.passed_checks, report.total_checks
    )
}
