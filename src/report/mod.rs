mod json;
mod terminal;

pub use json::JsonReporter;
pub use terminal::TerminalReporter;

use crate::analysis::DeadCode;
use miette::Result;
use std::path::PathBuf;
use std::str::FromStr;

/// Output format for reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    #[default]
    Terminal,
    Json,
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "terminal" | "text" => Ok(ReportFormat::Terminal),
            "json" => Ok(ReportFormat::Json),
            other => Err(format!("unknown report format '{}'", other)),
        }
    }
}

/// Reporter for outputting dead code analysis results
pub struct Reporter {
    format: ReportFormat,
    output_path: Option<PathBuf>,
}

impl Reporter {
    pub fn new(format: ReportFormat, output_path: Option<PathBuf>) -> Self {
        Self { format, output_path }
    }

    /// Report the dead code findings
    pub fn report(&self, dead_code: &[DeadCode]) -> Result<()> {
        match self.format {
            ReportFormat::Terminal => TerminalReporter::new().report(dead_code),
            ReportFormat::Json => JsonReporter::new(self.output_path.clone()).report(dead_code),
        }
    }
}
