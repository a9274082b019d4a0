use crate::analysis::Mutator;
use crate::config::Config;
use crate::error::AnalysisError;
use crate::graph::{DeclId, DeclarationKind, Graph, Mark, RefId};
use tracing::{debug, info};

/// Finds stored properties that are written but never read.
///
/// Writes show up as references to the property's setter. When nothing reads
/// the property (no reference to the property itself or to a read accessor),
/// the write references are removed so reachability leaves the property
/// unused, and the property is recorded as assign-only.
pub struct AssignOnlyPropertyReferenceEliminator;

impl AssignOnlyPropertyReferenceEliminator {
    pub fn new() -> Self {
        Self
    }

    fn is_candidate(graph: &Graph, id: DeclId) -> bool {
        let Some(decl) = graph.declaration(id) else {
            return false;
        };

        let has_explicit_accessor = decl
            .declarations()
            .iter()
            .filter_map(|a| graph.declaration(*a))
            .any(|a| a.kind.is_accessor() && !a.is_implicit);
        let is_related_target = graph
            .references_to(id)
            .into_iter()
            .filter_map(|r| graph.reference(r))
            .any(|r| r.is_related);

        decl.kind.is_property()
            && !graph.is_retained(id)
            && decl.attributes.is_empty()
            && !decl.is_override()
            && !graph.is_protocol_member(id)
            && decl.related().is_empty()
            && !is_related_target
            && !has_explicit_accessor
    }

    /// Read and write references of a property.
    fn accesses(graph: &Graph, id: DeclId) -> (Vec<RefId>, Vec<RefId>) {
        let mut reads = graph.references_to(id);
        let mut writes = Vec::new();

        let accessors = graph
            .declaration(id)
            .map(|d| d.declarations().iter().copied().collect::<Vec<_>>())
            .unwrap_or_default();
        for accessor in accessors {
            let Some(kind) = graph.declaration(accessor).map(|a| a.kind) else {
                continue;
            };
            let references = graph.references_to(accessor);
            match kind {
                DeclarationKind::FunctionAccessorSetter => writes.extend(references),
                _ => reads.extend(references),
            }
        }

        (reads, writes)
    }
}

impl Default for AssignOnlyPropertyReferenceEliminator {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for AssignOnlyPropertyReferenceEliminator {
    fn name(&self) -> &'static str {
        "AssignOnlyPropertyReferenceEliminator"
    }

    fn mutate(&self, graph: &mut Graph, config: &Config) -> Result<(), AnalysisError> {
        if config.retain_assign_only_properties {
            return Ok(());
        }

        let properties: Vec<DeclId> = graph
            .declarations()
            .filter(|(_, d)| d.kind.is_property())
            .map(|(id, _)| id)
            .collect();

        let mut count = 0;
        for property in graph.sorted_declarations(properties) {
            if !Self::is_candidate(graph, property) {
                continue;
            }
            let (reads, writes) = Self::accesses(graph, property);
            if !reads.is_empty() || writes.is_empty() {
                continue;
            }

            if let Some(decl) = graph.declaration(property) {
                debug!("Assign-only property {}", decl.display());
            }
            for write in writes {
                graph.remove_reference(write);
            }
            graph.mark(property, Mark::AssignOnly);
            count += 1;
        }

        info!("Found {} assign-only properties", count);
        Ok(())
    }
}
