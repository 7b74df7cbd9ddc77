//! Human-readable run output

use std::collections::BTreeMap;
use std::fmt::Write;
use std::time::Duration;

use hammer_core::{RunSummary, Tally};

/// Line printed once the workers are launched
pub fn render_banner(workers: usize, duration: Duration) -> String {
    format!(
        "Starting {} workers for {}...",
        workers,
        humantime::format_duration(duration)
    )
}

/// One line per worker, shown with `--verbose`
pub fn render_worker_line(tally: &Tally) -> String {
    let label = tally
        .worker_id
        .map(|id| format!("worker {id}: "))
        .unwrap_or_default();

    format!(
        "{}{} iterations with {} errors ({:.1}/s). responses: {}",
        label,
        tally.iterations,
        tally.errors,
        tally.iterations_per_second(),
        render_counts(&tally.status_counts)
    )
}

/// Final summary: totals line, then one line per status label
pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = format!(
        "did {} total runs with {} accumulated errors in {}",
        summary.total_iterations,
        summary.total_errors,
        humantime::format_duration(round_to_millis(summary.elapsed))
    );

    for (status, count) in &summary.status_totals {
        let _ = write!(out, "\n\t{count} {status}");
    }
    for (kind, count) in &summary.error_kinds {
        let _ = write!(out, "\n\t{count} {kind} failures");
    }

    out
}

fn render_counts(counts: &BTreeMap<String, u64>) -> String {
    let body = counts
        .iter()
        .map(|(status, count)| format!("{status}: {count}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{{{body}}}")
}

fn round_to_millis(duration: Duration) -> Duration {
    Duration::from_millis(duration.as_millis() as u64)
}
