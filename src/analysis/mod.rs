pub mod detectors;
mod findings;
pub mod mutators;
mod pipeline;
mod reachability;

pub use findings::collect_findings;
pub use pipeline::Pipeline;
pub use reachability::UsedDeclarationMarker;

use crate::config::Config;
use crate::error::AnalysisError;
use crate::graph::{DeclarationKind, Graph, Location};
use serde::Serialize;

/// One pass of the analysis pipeline.
///
/// A mutator holds no state between runs: everything it learns is written
/// back into the graph, which is the only context passed between passes.
pub trait Mutator: Send + Sync {
    /// Name used in logs and error reports
    fn name(&self) -> &'static str;

    /// Read the graph and apply any number of adds, removes and marks
    fn mutate(&self, graph: &mut Graph, config: &Config) -> Result<(), AnalysisError>;
}

/// Represents a piece of dead code detected by analysis
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeadCode {
    /// Where the finding points
    pub location: Location,

    /// Declaration or module name
    pub name: String,

    /// Kind of the declaration; `None` for imports
    pub kind: Option<DeclarationKind>,

    /// The kind of dead code issue
    pub issue: DeadCodeIssue,

    /// Severity level
    pub severity: Severity,

    /// Additional context or suggestions
    pub message: String,
}

impl DeadCode {
    pub fn new(
        location: Location,
        name: impl Into<String>,
        kind: Option<DeclarationKind>,
        issue: DeadCodeIssue,
    ) -> Self {
        let name = name.into();
        let severity = issue.default_severity();
        let message = issue.default_message(kind, &name);

        Self {
            location,
            name,
            kind,
            issue,
            severity,
            message,
        }
    }

    pub fn with_message(mut self, message: String) -> Self {
        self.message = message;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }
}

/// Types of dead code issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeadCodeIssue {
    /// Declaration is never used
    Unused,

    /// Property is assigned but never read
    AssignOnly,

    /// Parameter is never used
    UnusedParameter,

    /// Import is never used
    UnusedImport,

    /// Protocol is conformed to but never used as a type
    RedundantProtocol,

    /// `public` is broader than needed
    RedundantPublic,

    /// `internal` is broader than needed
    RedundantInternal,

    /// `fileprivate` is broader than needed
    RedundantFilePrivate,
}

impl DeadCodeIssue {
    pub fn default_severity(&self) -> Severity {
        match self {
            DeadCodeIssue::Unused => Severity::Warning,
            DeadCodeIssue::AssignOnly => Severity::Warning,
            DeadCodeIssue::UnusedParameter => Severity::Info,
            DeadCodeIssue::UnusedImport => Severity::Info,
            DeadCodeIssue::RedundantProtocol => Severity::Warning,
            DeadCodeIssue::RedundantPublic => Severity::Info,
            DeadCodeIssue::RedundantInternal => Severity::Info,
            DeadCodeIssue::RedundantFilePrivate => Severity::Info,
        }
    }

    pub fn default_message(&self, kind: Option<DeclarationKind>, name: &str) -> String {
        let kind = kind.map(|k| k.display_name()).unwrap_or("declaration");
        match self {
            DeadCodeIssue::Unused => format!("{} '{}' is unused", kind, name),
            DeadCodeIssue::AssignOnly => {
                format!("{} '{}' is assigned, but never used", kind, name)
            }
            DeadCodeIssue::UnusedParameter => format!("Parameter '{}' is unused", name),
            DeadCodeIssue::UnusedImport => format!("Imported module '{}' is unused", name),
            DeadCodeIssue::RedundantProtocol => format!(
                "Protocol '{}' is redundant as it's never used as an existential type",
                name
            ),
            DeadCodeIssue::RedundantPublic => {
                format!("{} '{}' is declared public, but not used outside its module", kind, name)
            }
            DeadCodeIssue::RedundantInternal => {
                format!("{} '{}' is declared internal, but not used outside its file", kind, name)
            }
            DeadCodeIssue::RedundantFilePrivate => format!(
                "{} '{}' is declared fileprivate, but not used outside its declaring type",
                kind, name
            ),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            DeadCodeIssue::Unused => "SD001",
            DeadCodeIssue::AssignOnly => "SD002",
            DeadCodeIssue::UnusedParameter => "SD003",
            DeadCodeIssue::UnusedImport => "SD004",
            DeadCodeIssue::RedundantProtocol => "SD005",
            DeadCodeIssue::RedundantPublic => "SD006",
            DeadCodeIssue::RedundantInternal => "SD007",
            DeadCodeIssue::RedundantFilePrivate => "SD008",
        }
    }
}

/// Severity levels for dead code issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
