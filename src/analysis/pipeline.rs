use super::detectors::*;
use super::mutators::*;
use super::{Mutator, UsedDeclarationMarker};
use crate::config::Config;
use crate::error::AnalysisError;
use crate::graph::Graph;
use std::time::Instant;
use tracing::{debug, info};

/// An ordered list of mutators applied to one graph.
///
/// Order matters: later passes read edges and marks written by earlier ones.
/// The first failing pass aborts the run; nothing is rolled back.
pub struct Pipeline {
    mutators: Vec<Box<dyn Mutator>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self { mutators: Vec::new() }
    }

    /// Append a pass.
    pub fn with(mut self, mutator: impl Mutator + 'static) -> Self {
        self.mutators.push(Box::new(mutator));
        self
    }

    fn with_if(self, enabled: bool, mutator: impl Mutator + 'static) -> Self {
        if enabled {
            self.with(mutator)
        } else {
            self
        }
    }

    /// The full analysis. Structural passes always run; refinement passes
    /// follow the `detection` toggles.
    pub fn standard(config: &Config) -> Self {
        let detection = &config.detection;

        Self::new()
            .with_if(detection.unused_imports, UnusedImportMarker::new())
            .with(CommentCommandRetainer::new())
            .with(AccessibilityCascader::new())
            .with(ExtensionFolder::new())
            .with(ProtocolExtensionReferenceBuilder::new())
            .with(ProtocolConformanceReferenceBuilder::new())
            .with(OverrideReferenceBuilder::new())
            .with(ExternalOverrideRetainer::new())
            .with(EnumCaseReferenceBuilder::new())
            .with(DefaultConstructorReferenceBuilder::new())
            .with(StructImplicitInitializerReferenceBuilder::new())
            .with(GenericTypeConstructorReferenceBuilder::new())
            .with(ComplexPropertyAccessorReferenceBuilder::new())
            .with(DynamicMemberRetainer::new())
            .with(PropertyWrapperRetainer::new())
            .with(ResultBuilderRetainer::new())
            .with(StringInterpolationRetainer::new())
            .with(EntryPointAttributeRetainer::new())
            .with(SwiftUiRetainer::new())
            .with(XcTestRetainer::new())
            .with(SwiftTestingRetainer::new())
            .with(AssetReferenceRetainer::new())
            .with(PubliclyAccessibleRetainer::new())
            .with(ObjcAccessibleRetainer::new())
            .with(PatternRetainer::new())
            .with_if(detection.unused_parameters, UnusedParameterRetainer::new())
            .with_if(detection.assign_only_properties, AssignOnlyPropertyReferenceEliminator::new())
            .with(UsedDeclarationMarker::new())
            .with_if(detection.redundant_protocols, RedundantProtocolMarker::new())
            .with_if(detection.redundant_public, RedundantPublicAccessibilityMarker::new())
            .with_if(detection.redundant_internal, RedundantInternalAccessibilityMarker::new())
            .with_if(detection.redundant_fileprivate, RedundantFilePrivateAccessibilityMarker::new())
    }

    /// Pass names in execution order.
    pub fn names(&self) -> Vec<&'static str> {
        self.mutators.iter().map(|m| m.name()).collect()
    }

    /// Run every pass in order.
    pub fn run(&self, graph: &mut Graph, config: &Config) -> Result<(), AnalysisError> {
        info!(
            "Running {} passes over {} declarations and {} references",
            self.mutators.len(),
            graph.declaration_count(),
            graph.reference_count()
        );

        for mutator in &self.mutators {
            let start = Instant::now();
            mutator
                .mutate(graph, config)
                .map_err(|source| AnalysisError::Mutator {
                    mutator: mutator.name(),
                    source: Box::new(source),
                })?;
            debug!("{} finished in {:?}", mutator.name(), start.elapsed());
        }

        info!(
            "Analysis complete: {} used, {} ignored, {} retained",
            graph.used().len(),
            graph.ignored().len(),
            graph.retained().len()
        );
        Ok(())
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}
