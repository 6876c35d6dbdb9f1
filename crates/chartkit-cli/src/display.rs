//! Display formatting for check results
//!
//! Problems are collected into a [`CheckReport`], printed grouped by chart on
//! stderr, and turned into a [`CliError::CheckFailed`] when any were found.

use console::style;
use std::collections::BTreeMap;

use crate::error::{CliError, Result};

/// One problem found by a check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckIssue {
    /// Chart the problem belongs to; `None` for repository-wide problems
    pub chart: Option<String>,
    pub message: String,
    pub hint: Option<String>,
}

/// Problems found by one check
#[derive(Debug)]
pub struct CheckReport {
    title: String,
    issues: Vec<CheckIssue>,
}

impl CheckReport {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            issues: Vec::new(),
        }
    }

    /// Record a problem with a chart
    pub fn fail(&mut self, chart: &str, message: impl Into<String>) {
        self.issues.push(CheckIssue {
            chart: Some(chart.to_string()),
            message: message.into(),
            hint: None,
        });
    }

    /// Record a problem with a chart, with a hint on how to fix it
    pub fn fail_with_hint(&mut self, chart: &str, message: impl Into<String>, hint: impl Into<String>) {
        self.issues.push(CheckIssue {
            chart: Some(chart.to_string()),
            message: message.into(),
            hint: Some(hint.into()),
        });
    }

    /// Record a repository-wide problem
    pub fn fail_global(&mut self, message: impl Into<String>) {
        self.issues.push(CheckIssue {
            chart: None,
            message: message.into(),
            hint: None,
        });
    }

    pub fn issues(&self) -> &[CheckIssue] {
        &self.issues
    }

    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }

    /// Print the outcome and convert it into a command result
    pub fn finish(self, success: &str) -> Result<()> {
        if self.is_ok() {
            println!("{} {}", style("✓").green().bold(), success);
            return Ok(());
        }

        self.display();
        Err(CliError::check_failed(self.title, self.issues.len()))
    }

    /// Print problems grouped by chart
    fn display(&self) {
        let mut by_chart: BTreeMap<&str, Vec<&CheckIssue>> = BTreeMap::new();
        for issue in &self.issues {
            by_chart
                .entry(issue.chart.as_deref().unwrap_or(""))
                .or_default()
                .push(issue);
        }

        eprintln!("{} {}:", style("✗").red().bold(), self.title);
        for (chart, issues) in by_chart {
            let indent = if chart.is_empty() {
                "  "
            } else {
                eprintln!("  {}", style(chart).cyan().bold());
                "    "
            };

            for issue in issues {
                eprintln!("{}{} {}", indent, style("✗").red(), issue.message);
                if let Some(hint) = &issue.hint {
                    eprintln!("{}  {} {}", indent, style("hint:").blue(), hint);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exit_codes;

    #[test]
    fn test_empty_report_passes() {
        let report = CheckReport::new("Fixture check");
        assert!(report.is_ok());
        assert!(report.finish("All fixtures have goldens").is_ok());
    }

    #[test]
    fn test_failures_become_check_error() {
        let mut report = CheckReport::new("Fixture check");
        report.fail("web", "Missing golden file");
        report.fail_global("Fixtures directory missing");

        assert_eq!(report.issues().len(), 2);
        let err = report.finish("unused").unwrap_err();
        assert_eq!(err.exit_code(), exit_codes::ERROR);
        assert_eq!(err.to_string(), "Fixture check failed with 2 problem(s)");
    }
}
