use colored::Colorize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::batch::{LinkResult, OutcomeStatus, RunSummary};

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report file: {0}")]
    FileWrite(#[from] std::io::Error),
}

/// Output the run report to the terminal, and additionally to a markdown
/// file when a path is given.
#[instrument(skip(results, summary), fields(total = summary.total()))]
pub fn output(
    results: &[LinkResult],
    summary: &RunSummary,
    output_path: Option<&Path>,
) -> Result<(), ReportError> {
    debug!("writing report to terminal");
    print_terminal_report(results, summary);

    if let Some(path) = output_path {
        debug!(path = %path.display(), "writing report to file");
        write_markdown_report(results, summary, path)?;
    }
    Ok(())
}

/// Format and print the run report to the terminal with colors.
fn print_terminal_report(results: &[LinkResult], summary: &RunSummary) {
    println!();
    println!("═══ PR Creation Results ═══");
    println!();

    for result in results {
        println!("{:<10} {}", colorize_status(result.status), result.link);
        println!(
            "           PR: {} | Commits: {} | Files: {}",
            dash(result.pr_link.as_deref()),
            dash_display(result.commits),
            dash_display(result.files_changed),
        );
        if !result.reason.is_empty() {
            println!("           Reason: {}", result.reason);
        }
        println!();
    }

    println!("═══ Summary: {summary} ═══");
    println!();
}

/// Write the run report as a markdown table, mirroring the columns the
/// terminal report shows.
fn write_markdown_report(
    results: &[LinkResult],
    summary: &RunSummary,
    path: &Path,
) -> Result<(), ReportError> {
    let mut md = String::new();
    md.push_str("# PR Creation Results\n\n");
    md.push_str("| Compare Link | Result | PR Link | Commits | Files Changed | Reason |\n");
    md.push_str("|---|---|---|---|---|---|\n");

    for result in results {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} |\n",
            result.link,
            result.status,
            dash(result.pr_link.as_deref()),
            dash_display(result.commits),
            dash_display(result.files_changed),
            if result.reason.is_empty() { "-" } else { result.reason.as_str() },
        ));
    }

    md.push_str(&format!("\n**Summary:** {summary}\n"));

    std::fs::write(path, md)?;
    Ok(())
}

fn colorize_status(status: OutcomeStatus) -> colored::ColoredString {
    match status {
        OutcomeStatus::Created => "Created".green().bold(),
        OutcomeStatus::Duplicate => "Duplicate".yellow().bold(),
        OutcomeStatus::Skipped => "Skipped".cyan(),
        OutcomeStatus::Error => "Error".red().bold(),
    }
}

fn dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

fn dash_display<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::FilesChanged;

    fn sample_results() -> Vec<LinkResult> {
        vec![
            LinkResult {
                link: "https://github.com/org/repo/compare/main...a".to_string(),
                status: OutcomeStatus::Created,
                pr_link: Some("https://github.com/org/repo/pull/1".to_string()),
                commits: Some(3),
                files_changed: Some(FilesChanged::Truncated),
                reason: String::new(),
            },
            LinkResult::failure(
                "https://github.com/org/repo/compare/main...b",
                "Compare link not valid.",
            ),
        ]
    }

    fn sample_summary() -> RunSummary {
        let mut summary = RunSummary::default();
        summary.record(OutcomeStatus::Created);
        summary.record(OutcomeStatus::Error);
        summary
    }

    #[test]
    fn test_write_markdown_report() {
        let dir = std::env::temp_dir();
        let path = dir.join("pr_publisher_test_report.md");
        write_markdown_report(&sample_results(), &sample_summary(), &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("| Compare Link |"));
        assert!(content.contains("| Created |"));
        assert!(content.contains("https://github.com/org/repo/pull/1"));
        assert!(content.contains("| 300+ |"));
        assert!(content.contains("Compare link not valid."));
        assert!(content.contains("**Summary:** 1 Created, 0 Skipped, 0 Duplicate, 1 Error"));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_absent_fields_render_as_dash() {
        assert_eq!(dash(None), "-");
        assert_eq!(dash(Some("x")), "x");
        assert_eq!(dash_display::<u64>(None), "-");
        assert_eq!(dash_display(Some(FilesChanged::Exact(7))), "7");
    }

    #[test]
    fn test_terminal_report_does_not_panic() {
        print_terminal_report(&sample_results(), &sample_summary());
    }

    #[test]
    fn test_output_to_file() {
        let dir = std::env::temp_dir();
        let path = dir.join("pr_publisher_test_output.md");
        output(&sample_results(), &sample_summary(), Some(&path)).unwrap();
        assert!(path.exists());
        std::fs::remove_file(&path).ok();
    }
}
