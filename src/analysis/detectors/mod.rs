// Refinement analyses: passes that judge declarations rather than reshape
// the graph. Most run after reachability and read the used set.

mod assign_only;
mod redundant_accessibility;
mod redundant_protocol;
mod unused_import;
mod unused_param;

pub use assign_only::AssignOnlyPropertyReferenceEliminator;
pub use redundant_accessibility::{
    RedundantFilePrivateAccessibilityMarker, RedundantInternalAccessibilityMarker,
    RedundantPublicAccessibilityMarker,
};
pub use redundant_protocol::RedundantProtocolMarker;
pub use unused_import::UnusedImportMarker;
pub use unused_param::UnusedParameterRetainer;
