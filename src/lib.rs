//! swiftdeadcode - dead code analysis for Swift programs
//!
//! The library works on a declaration graph produced by an indexing front
//! end: declarations with their nesting, identifiers, accessibility and
//! attributes, and the references between them.
//!
//! # Architecture
//!
//! The analysis pipeline consists of:
//! 1. **Graph Building** - Merge per-file fragments into one [`Graph`]
//! 2. **Normalization** - Fold extensions, invert protocol conformances and
//!    add the edges the index leaves implicit
//! 3. **Retention** - Retain entry points the runtime discovers by itself
//! 4. **Reachability** - Mark everything reachable from a root as used
//! 5. **Refinement** - Redundant protocols, redundant accessibility, unused
//!    imports, unused parameters and assign-only properties
//! 6. **Reporting** - Output results in various formats

pub mod analysis;
pub mod config;
pub mod error;
pub mod graph;
pub mod report;

pub use analysis::{collect_findings, DeadCode, DeadCodeIssue, Mutator, Pipeline, Severity};
pub use config::Config;
pub use error::AnalysisError;
pub use graph::{Declaration, DeclarationKind, Graph, GraphBuilder, ParallelGraphBuilder, Reference};
pub use report::{ReportFormat, Reporter};
