//! Plain-text rendering for the terminal.

use std::fmt::Write;

use storage::dto::{assignment::RecalculationReport, results::ResultsBoard};
use storage::dto::results::format_clock;

/// One line per finisher: position, bib, name, category, time and gap.
pub fn results_table(board: &ResultsBoard) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Results for race {} ({})", board.race_id, board.category);

    if board.entries.is_empty() {
        out.push_str("No finishers yet\n");
        return out;
    }

    let _ = writeln!(
        out,
        "{:>4}  {:>6}  {:<30}  {:<24}  {:>13}  {:>13}",
        "POS", "BIB", "NAME", "CATEGORY", "TIME", "GAP"
    );
    for entry in &board.entries {
        let name = format!("{} {}", entry.first_name, entry.last_name);
        let gap = if entry.gap_ms == 0 {
            String::new()
        } else {
            format!("+{}", entry.gap)
        };
        let _ = writeln!(
            out,
            "{:>4}  {:>6}  {:<30}  {:<24}  {:>13}  {:>13}",
            entry.position,
            entry.bib_number.as_deref().unwrap_or("-"),
            name,
            entry.category_name.as_deref().unwrap_or("-"),
            format_clock(entry.elapsed_ms),
            gap
        );
    }

    out
}

/// Short human summary of a recalculation run.
pub fn recalculation_summary(report: &RecalculationReport) -> String {
    let mut out = String::new();
    let mode = if report.dry_run { " (dry run)" } else { "" };

    let _ = writeln!(out, "Category recalculation for race {}{}", report.race_id, mode);
    let _ = writeln!(out, "  examined:      {}", report.examined);
    let _ = writeln!(out, "  skipped:       {}", report.skipped);
    let _ = writeln!(out, "  unchanged:     {}", report.unchanged);
    if report.dry_run {
        let _ = writeln!(out, "  would update:  {}", report.pending.len());
    } else {
        let _ = writeln!(out, "  updated:       {}", report.updated);
    }
    let _ = writeln!(out, "  uncategorized: {}", report.uncategorized.len());
    let _ = writeln!(out, "  ambiguous:     {}", report.ambiguous.len());
    let _ = writeln!(out, "  failed:        {}", report.failures.len());

    for failure in &report.failures {
        let _ = writeln!(out, "    {}: {}", failure.participant_id, failure.error);
    }

    out
}
