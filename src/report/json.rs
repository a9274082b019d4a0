use crate::analysis::{DeadCode, Severity};
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::Serialize;
use std::path::PathBuf;

/// JSON reporter for programmatic output
pub struct JsonReporter {
    output_path: Option<PathBuf>,
}

impl JsonReporter {
    pub fn new(output_path: Option<PathBuf>) -> Self {
        Self { output_path }
    }

    pub fn report(&self, dead_code: &[DeadCode]) -> Result<()> {
        let json = render(dead_code)?;

        if let Some(path) = &self.output_path {
            std::fs::write(path, &json)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to write report to {}", path.display()))?;
            println!("Report written to: {}", path.display());
        } else {
            println!("{}", json);
        }

        Ok(())
    }
}

/// Serialize findings as the JSON report document.
pub(crate) fn render(dead_code: &[DeadCode]) -> Result<String> {
    serde_json::to_string_pretty(&JsonReport::from_dead_code(dead_code)).into_diagnostic()
}

#[derive(Serialize)]
struct JsonReport {
    version: &'static str,
    total_issues: usize,
    issues: Vec<JsonIssue>,
    summary: JsonSummary,
}

#[derive(Serialize)]
struct JsonIssue {
    code: &'static str,
    kind: &'static str,
    severity: &'static str,
    message: String,
    file: String,
    line: u32,
    column: u32,
    name: String,
    declaration_kind: Option<&'static str>,
}

#[derive(Serialize)]
struct JsonSummary {
    errors: usize,
    warnings: usize,
    infos: usize,
}

impl JsonReport {
    fn from_dead_code(dead_code: &[DeadCode]) -> Self {
        let count = |severity: Severity| dead_code.iter().filter(|d| d.severity == severity).count();

        let issues = dead_code
            .iter()
            .map(|dc| JsonIssue {
                code: dc.issue.code(),
                kind: issue_name(dc),
                severity: dc.severity.as_str(),
                message: dc.message.clone(),
                file: dc.location.file.to_string_lossy().to_string(),
                line: dc.location.line,
                column: dc.location.column,
                name: dc.name.clone(),
                declaration_kind: dc.kind.map(|k| k.display_name()),
            })
            .collect();

        Self {
            version: "1.0",
            total_issues: dead_code.len(),
            issues,
            summary: JsonSummary {
                errors: count(Severity::Error),
                warnings: count(Severity::Warning),
                infos: count(Severity::Info),
            },
        }
    }
}

fn issue_name(dc: &DeadCode) -> &'static str {
    use crate::analysis::DeadCodeIssue::*;
    match dc.issue {
        Unused => "unused",
        AssignOnly => "assign_only",
        UnusedParameter => "unused_parameter",
        UnusedImport => "unused_import",
        RedundantProtocol => "redundant_protocol",
        RedundantPublic => "redundant_public",
        RedundantInternal => "redundant_internal",
        RedundantFilePrivate => "redundant_fileprivate",
    }
}
