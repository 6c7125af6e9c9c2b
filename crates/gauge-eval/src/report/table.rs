//! Plain-text summary of a consolidated report

use super::{ConsolidatedReport, SuiteReport};

/// Render the summary table printed at the end of a run
pub fn generate_table(report: &ConsolidatedReport) -> String {
    let mut output = String::new();

    output.push_str(&format!("\n{:=<70}\n", "= Benchmark Results "));
    output.push_str(&format!(
        "Model: {} | Finished: {}\n",
        report.model,
        report.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    output.push_str(&format!("{:-<70}\n", ""));
    output.push_str(&format!(
        "{:<22} {:<11} {:>8} {:>12} {:>13}\n",
        "Suite", "Status", "Pass@1", "Resolved", "Generated"
    ));
    output.push_str(&format!("{:-<70}\n", ""));

    if report.benchmarks.is_empty() {
        output.push_str("(no suites run)\n");
    }

    for (name, entry) in report.benchmarks.iter() {
        match entry {
            SuiteReport::Metrics(metrics) => {
                let pass = metrics
                    .pass_at_1
                    .map(|p| format!("{:.1}%", p * 100.0))
                    .unwrap_or_else(|| "-".to_string());
                let resolved = match (metrics.resolved, metrics.total) {
                    (Some(r), Some(t)) => format!("{}/{}", r, t),
                    _ => "-".to_string(),
                };
                let generated = metrics
                    .generation
                    .map(|g| format!("{}/{}", g.succeeded, g.total))
                    .unwrap_or_else(|| "-".to_string());

                output.push_str(&format!(
                    "{:<22} {:<11} {:>8} {:>12} {:>13}\n",
                    truncate(name, 22),
                    metrics.status.as_str(),
                    pass,
                    resolved,
                    generated
                ));
                if let Some(reason) = &metrics.reason {
                    output.push_str(&format!("  reason: {}\n", reason));
                }
                if let Some(error) = &metrics.error {
                    output.push_str(&format!("  error: {}\n", first_line(error)));
                }
            }
            SuiteReport::Error { error } => {
                output.push_str(&format!("{:<22} {:<11}\n", truncate(name, 22), "error"));
                output.push_str(&format!("  error: {}\n", first_line(error)));
            }
        }
    }

    output.push_str(&format!("{:=<70}\n", ""));
    output
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max - 1).collect();
        out.push('~');
        out
    }
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{EvaluationMetrics, GenerationStats};

    #[test]
    fn test_table_lists_each_suite() {
        let mut report = ConsolidatedReport::new("qwen-coder");
        report.benchmarks.insert(
            "swebench_lite",
            SuiteReport::Metrics(EvaluationMetrics::completed(3, 10).with_generation(
                GenerationStats {
                    total: 10,
                    succeeded: 10,
                    failed: 0,
                },
            )),
        );
        report
            .benchmarks
            .insert("broken", SuiteReport::error("Dataset error: no such file\ndetails"));

        let table = generate_table(&report);
        assert!(table.contains("Model: qwen-coder"));
        assert!(table.contains("30.0%"));
        assert!(table.contains("3/10"));
        assert!(table.contains("10/10"));
        assert!(table.contains("error: Dataset error: no such file"));
        assert!(!table.contains("details"));
    }

    #[test]
    fn test_empty_report() {
        let table = generate_table(&ConsolidatedReport::new("m"));
        assert!(table.contains("(no suites run)"));
    }

    #[test]
    fn test_truncate_long_names() {
        assert_eq!(truncate("short", 22), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd~");
    }
}
