//! Console display utilities for the mirrorsync CLI

use console::style;
use mirrorsync_sync::{CycleReport, Outcome, SchedulerSummary};
use std::time::Duration;

/// Display the outcome of a single cycle
pub fn display_cycle_report(report: &CycleReport, dry_run: bool) {
    println!();
    let title = if dry_run {
        "Sync Plan (dry run):"
    } else {
        "Sync Statistics:"
    };
    println!("{}", style(title).bold().underlined());

    println!("  Source files: {}", style(report.source_files).cyan());
    if dry_run {
        println!("  Planned operations: {}", style(report.dry_run()).yellow());
    } else {
        println!("  Files created: {}", style(report.created()).green());
        println!("  Files updated: {}", style(report.updated()).green());
        println!("  Files deleted: {}", style(report.deleted()).green());
        println!(
            "  Bytes copied: {}",
            style(format_bytes(report.bytes_copied)).green()
        );
    }
    if report.held() > 0 {
        println!("  Deletes held: {}", style(report.held()).yellow());
    }

    let failures = report.failure_count();
    println!(
        "  Errors: {}",
        if failures > 0 {
            style(failures).red()
        } else {
            style(failures).green()
        }
    );
    println!(
        "  Duration: {}",
        style(format_duration(report.duration)).blue()
    );

    for failure in &report.scan_failures {
        display_error(&failure.error.to_string());
    }
    for outcome in &report.outcomes {
        if let Outcome::Failed(error) = &outcome.outcome {
            display_error(&error.to_string());
        }
    }

    if report.is_clean() && !dry_run {
        display_success("Replica is in sync");
    } else if !report.is_clean() {
        display_warning("Some paths were not synchronized; they are retried on the next cycle");
    }
}

/// Display totals after the scheduler stopped
pub fn display_scheduler_summary(summary: &SchedulerSummary) {
    println!();
    println!("{}", style("Session Summary:").bold().underlined());
    println!("  Cycles: {}", style(summary.cycles).cyan());
    println!("  Files created: {}", style(summary.created).green());
    println!("  Files updated: {}", style(summary.updated).green());
    println!("  Files deleted: {}", style(summary.deleted).green());
    println!(
        "  Errors: {}",
        if summary.failures > 0 {
            style(summary.failures).red()
        } else {
            style(summary.failures).green()
        }
    );
    if summary.aborted_cycles > 0 {
        display_warning(&format!("{} cycles aborted", summary.aborted_cycles));
    }
    display_success("mirrorsync stopped");
}

/// Format bytes in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

/// Format duration in human-readable format
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{:.2}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}

/// Display a warning message with proper formatting
pub fn display_warning(message: &str) {
    println!("{} {}", style("⚠").yellow().bold(), style(message).yellow());
}

/// Display an error message with proper formatting
pub fn display_error(message: &str) {
    println!("{} {}", style("✗").red().bold(), style(message).red());
}

/// Display a success message with proper formatting
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green().bold(), style(message).green());
}

/// Display an info message with proper formatting
pub fn display_info(message: &str) {
    println!("{} {}", style("ℹ").blue().bold(), style(message).blue());
}
