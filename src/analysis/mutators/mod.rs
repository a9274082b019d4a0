// Structural normalization passes and retention rules.
// Each pass is independent; the pipeline decides the order.

mod accessibility_cascader;
mod accessors;
mod assets;
mod comment_commands;
mod configured;
mod conformance;
mod constructors;
mod enum_cases;
mod extension_folder;
mod frameworks;
mod language_features;
mod overrides;
mod protocol_extensions;

pub use accessibility_cascader::AccessibilityCascader;
pub use accessors::ComplexPropertyAccessorReferenceBuilder;
pub use assets::AssetReferenceRetainer;
pub use comment_commands::CommentCommandRetainer;
pub use configured::{ObjcAccessibleRetainer, PatternRetainer, PubliclyAccessibleRetainer};
pub use conformance::ProtocolConformanceReferenceBuilder;
pub use constructors::{
    DefaultConstructorReferenceBuilder, GenericTypeConstructorReferenceBuilder,
    StructImplicitInitializerReferenceBuilder,
};
pub use enum_cases::EnumCaseReferenceBuilder;
pub use extension_folder::ExtensionFolder;
pub use frameworks::{SwiftTestingRetainer, SwiftUiRetainer, XcTestRetainer};
pub use language_features::{
    DynamicMemberRetainer, EntryPointAttributeRetainer, PropertyWrapperRetainer,
    ResultBuilderRetainer, StringInterpolationRetainer,
};
pub use overrides::{ExternalOverrideRetainer, OverrideReferenceBuilder};
pub use protocol_extensions::ProtocolExtensionReferenceBuilder;

use crate::graph::{DeclId, Graph, Mark};
use tracing::debug;

/// Retain a declaration, logging why.
pub(crate) fn retain(graph: &mut Graph, id: DeclId, reason: &str) {
    if graph.is_retained(id) {
        return;
    }
    if let Some(decl) = graph.declaration(id) {
        debug!("Retaining {} ({})", decl.display(), reason);
    }
    graph.mark(id, Mark::Retained);
}
