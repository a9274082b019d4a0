//! Graph integrity errors raised by the analysis pipeline.
//!
//! Unresolved identifiers are not errors: a lookup miss means the target is
//! declared outside the analyzed program and callers handle the `None`.

use crate::graph::{DeclId, DeclarationKind, RefId};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum AnalysisError {
    #[error("extension kind '{0:?}' does not map to an extended type kind")]
    #[diagnostic(
        code(swiftdeadcode::graph::unmapped_extension),
        help("the front end must report extensions as extension_class, extension_struct, extension_enum or extension_protocol")
    )]
    UnmappedExtensionKind(DeclarationKind),

    #[error("declaration {0} is not present in the graph")]
    #[diagnostic(code(swiftdeadcode::graph::missing_declaration))]
    MissingDeclaration(DeclId),

    #[error("reference #{} is not present in the graph", .0.index())]
    #[diagnostic(code(swiftdeadcode::graph::missing_reference))]
    MissingReference(RefId),

    #[error("mutator '{mutator}' failed")]
    #[diagnostic(code(swiftdeadcode::pipeline::mutator))]
    Mutator {
        mutator: &'static str,
        #[source]
        source: Box<AnalysisError>,
    },
}
