use crate::analysis::{DeadCode, DeadCodeIssue, Severity};
use colored::Colorize;
use miette::Result;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Terminal reporter with colored output, grouped by file
pub struct TerminalReporter {
    show_codes: bool,
}

impl TerminalReporter {
    pub fn new() -> Self {
        Self { show_codes: true }
    }

    pub fn report(&self, dead_code: &[DeadCode]) -> Result<()> {
        if dead_code.is_empty() {
            println!("{}", "No dead code found!".green().bold());
            return Ok(());
        }

        let mut by_file: BTreeMap<PathBuf, Vec<&DeadCode>> = BTreeMap::new();
        for item in dead_code {
            by_file.entry(item.location.file.clone()).or_default().push(item);
        }

        println!();
        println!(
            "{}",
            format!("Found {} dead code issues:", dead_code.len())
                .yellow()
                .bold()
        );
        println!();

        for (file, items) in &by_file {
            println!("{}", file.display().to_string().cyan().bold());
            for item in items {
                self.print_item(item);
            }
            println!();
        }

        self.print_summary(dead_code);
        Ok(())
    }

    fn print_item(&self, item: &DeadCode) {
        let severity = match item.severity {
            Severity::Error => "error".red().bold(),
            Severity::Warning => "warning".yellow().bold(),
            Severity::Info => "info".blue().bold(),
        };
        let location = format!("{}:{}", item.location.line, item.location.column);
        let code = if self.show_codes {
            format!(" [{}]", item.issue.code().dimmed())
        } else {
            String::new()
        };

        println!("  {} {}{} {}", location.dimmed(), severity, code, item.message);
    }

    fn print_summary(&self, dead_code: &[DeadCode]) {
        let mut by_severity: BTreeMap<Severity, usize> = BTreeMap::new();
        let mut by_issue: BTreeMap<DeadCodeIssue, usize> = BTreeMap::new();
        for item in dead_code {
            *by_severity.entry(item.severity).or_default() += 1;
            *by_issue.entry(item.issue).or_default() += 1;
        }

        println!("{}", "─".repeat(60).dimmed());

        let severity_parts: Vec<String> = by_severity
            .iter()
            .rev()
            .map(|(severity, count)| match severity {
                Severity::Error => format!("{} errors", count).red().to_string(),
                Severity::Warning => format!("{} warnings", count).yellow().to_string(),
                Severity::Info => format!("{} info", count).blue().to_string(),
            })
            .collect();
        println!("Summary: {}", severity_parts.join(", "));

        for (issue, count) in &by_issue {
            println!("  {} {:?}: {}", issue.code().dimmed(), issue, count);
        }
        println!();
    }
}

impl Default for TerminalReporter {
    fn default() -> Self {
        Self::new()
    }
}
