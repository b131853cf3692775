//! Output Formatting
//!
//! One line per measured candidate, plus an optional speedup table that
//! follows the comparison-table layout of the terminal output.

use wasmbench_core::Value;

use crate::report::{BenchmarkReport, ReportEntry};

/// Render arguments as a comma-separated list
pub fn format_args_list(args: &[Value]) -> String {
    args.iter()
        .map(|a| a.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_values(values: &[Value]) -> String {
    match values {
        [] => "()".to_string(),
        [single] => single.to_string(),
        many => format!("({})", format_args_list(many)),
    }
}

/// Render one report line:
/// `<Label> <computation>(<args>) = <value> | Time: <ms> ms`
///
/// The duration is rounded to two decimals. With `show_cycles`, the cycle
/// delta is appended when the platform has a counter.
pub fn format_line(entry: &ReportEntry, show_cycles: bool) -> String {
    let mut line = format!(
        "{} {}({}) = {} | Time: {:.2} ms",
        entry.label,
        entry.computation,
        format_args_list(&entry.args),
        format_values(&entry.result.values),
        entry.result.elapsed_ms()
    );
    if show_cycles && entry.result.cycles > 0 {
        line.push_str(&format!(" | Cycles: {}", entry.result.cycles));
    }
    line
}

/// Render a speedup table relative to the report's baseline.
///
/// Speedup is `baseline time / candidate time`; entries are listed fastest
/// first. Returns an empty string for an empty report.
pub fn format_summary(report: &BenchmarkReport) -> String {
    let Some(baseline) = report.baseline() else {
        return String::new();
    };
    let baseline_ns = baseline.elapsed().as_nanos().max(1) as f64;

    let mut output = String::new();
    output.push_str(&format!("\nComparison vs {}\n", baseline.label));
    output.push_str(&"-".repeat(60));
    output.push('\n');

    let max_name_len = report
        .entries()
        .iter()
        .map(|e| e.label.len())
        .max()
        .unwrap_or(12)
        .max("Candidate".len());

    output.push_str(&format!(
        "  {:<width$}  {:>12}  {:>10}\n",
        "Candidate",
        "Time (ms)",
        "Speedup",
        width = max_name_len
    ));
    output.push_str(&format!("  {}\n", "-".repeat(max_name_len + 26)));

    let mut rows: Vec<(&ReportEntry, f64)> = report
        .entries()
        .iter()
        .map(|e| (e, baseline_ns / e.elapsed().as_nanos().max(1) as f64))
        .collect();
    rows.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));

    for (entry, speedup) in rows {
        let is_baseline = std::ptr::eq(entry, baseline);
        let baseline_marker = if is_baseline { " (baseline)" } else { "" };
        let speedup_str = if is_baseline {
            "1.00x".to_string()
        } else {
            format!("{:.2}x", speedup)
        };

        output.push_str(&format!(
            "  {:<width$}  {:>12.2}  {:>10}{}\n",
            entry.label,
            entry.result.elapsed_ms(),
            speedup_str,
            baseline_marker,
            width = max_name_len
        ));
    }

    if !report.values_agree() {
        output.push_str("\n  warning: candidates returned different values\n");
    }

    output
}
