use crate::analysis::Mutator;
use crate::config::Config;
use crate::error::AnalysisError;
use crate::graph::{DeclId, Graph, RefParent, Reference};

/// A property with at least one accessor written in source references all
/// of its accessors, so getter bodies and observers are followed whenever
/// the property is used.
pub struct ComplexPropertyAccessorReferenceBuilder;

impl ComplexPropertyAccessorReferenceBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ComplexPropertyAccessorReferenceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for ComplexPropertyAccessorReferenceBuilder {
    fn name(&self) -> &'static str {
        "ComplexPropertyAccessorReferenceBuilder"
    }

    fn mutate(&self, graph: &mut Graph, _config: &Config) -> Result<(), AnalysisError> {
        let properties: Vec<DeclId> = graph
            .declarations()
            .filter(|(_, d)| d.kind.is_property())
            .map(|(id, _)| id)
            .collect();

        for property in graph.sorted_declarations(properties) {
            let Some(decl) = graph.declaration(property) else {
                continue;
            };
            let accessors: Vec<_> = decl
                .declarations()
                .iter()
                .filter_map(|a| graph.declaration(*a))
                .filter(|a| a.kind.is_accessor())
                .collect();

            if !accessors.iter().any(|a| !a.is_implicit) {
                continue;
            }

            let references: Vec<Reference> = accessors
                .iter()
                .map(|a| Reference::new(a.kind, a.first_usr(), a.location.clone()).with_name(a.name()))
                .collect();
            for reference in references {
                graph.add_reference(reference, Some(RefParent::Declaration(property)));
            }
        }

        Ok(())
    }
}
