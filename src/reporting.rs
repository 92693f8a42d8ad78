//! Reporting of test run results.
//!
//! Progress lines go through the log facade as the run proceeds; this module
//! prints the run's product afterwards: captured output of every failing
//! unit, then the closing summary. Results arrive sorted, so the report is
//! identical however the parallel run interleaved.

use crate::runner::{RunSummary, TestOutcome, TestResult};

const SEPARATOR_WIDTH: usize = 30;

/// Prints failure output and the closing summary, returning the aggregate.
///
/// In fail-fast mode there is no count summary; the run stopped early, so
/// totals would be misleading.
pub fn report_results(results: &[TestResult], fail_fast: bool) -> RunSummary {
    for result in results {
        match &result.outcome {
            TestOutcome::Passed => {
                if !result.stdout.trim().is_empty() {
                    log::debug!(
                        "stdout of {}:\n{}",
                        result.relative_path.display(),
                        result.stdout
                    );
                }
            }
            TestOutcome::Failed { code } => print_failure(result, *code),
            TestOutcome::TimedOut { limit } => {
                eprintln!(
                    "--- FAIL: {} (timed out after {}s, process killed) ---",
                    result.relative_path.display(),
                    limit.as_secs()
                );
                eprintln!("{}\n", "-".repeat(SEPARATOR_WIDTH));
            }
        }
    }

    let summary = RunSummary::from_results(results);
    if results.is_empty() {
        return summary;
    }

    if fail_fast {
        return summary;
    }

    if summary.all_passed() {
        println!(
            "\nSummary: All {} tests passed successfully!",
            summary.total
        );
    } else {
        eprintln!("\nSummary: {} test(s) failed:", summary.failed.len());
        for path in &summary.failed {
            eprintln!("  - {}", path.display());
        }
    }

    summary
}

fn print_failure(result: &TestResult, code: Option<i32>) {
    match code {
        Some(code) => eprintln!(
            "--- FAIL: {} (exit code {}) ---",
            result.relative_path.display(),
            code
        ),
        None => eprintln!(
            "--- FAIL: {} (terminated by signal) ---",
            result.relative_path.display()
        ),
    }
    eprintln!("\nSTDOUT:");
    eprintln!("{}", result.stdout);
    eprintln!("\nSTDERR:");
    eprintln!("{}", result.stderr);
    eprintln!("{}\n", "-".repeat(SEPARATOR_WIDTH));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn result(path: &str, outcome: TestOutcome) -> TestResult {
        TestResult {
            relative_path: PathBuf::from(path),
            outcome,
            stdout: "out".to_string(),
            stderr: "err".to_string(),
            duration: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_report_summary_mode() {
        let results = vec![
            result("a.py", TestOutcome::Passed),
            result("b.py", TestOutcome::Failed { code: Some(2) }),
        ];

        let summary = report_results(&results, false);
        assert_eq!(summary.total, 2);
        assert_eq!(summary.failed, vec![PathBuf::from("b.py")]);
    }

    #[test]
    fn test_report_fail_fast_mode() {
        let results = vec![result("b.py", TestOutcome::Failed { code: None })];

        let summary = report_results(&results, true);
        assert!(!summary.all_passed());
    }

    #[test]
    fn test_report_empty_run() {
        let summary = report_results(&[], false);
        assert_eq!(summary.total, 0);
        assert!(summary.all_passed());
    }
}
