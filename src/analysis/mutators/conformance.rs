use crate::analysis::Mutator;
use crate::config::Config;
use crate::error::AnalysisError;
use crate::graph::{DeclId, DeclarationKind, Graph, RefId, RefParent, Reference};
use rayon::prelude::*;
use tracing::{debug, info};

/// Inverts conformance edges so that requirements reference their
/// implementations.
///
/// The index records `conformer -> requirement`; a call through the
/// protocol only references the requirement, so every implementation must be
/// reachable from it. Conformances satisfied by an inherited superclass
/// member get a synthetic edge first, chosen deterministically.
pub struct ProtocolConformanceReferenceBuilder;

/// `(requirement, implementation)` where the implementation lives in a
/// superclass of a conforming class.
type InheritedImplementation = (DeclId, DeclId);

impl ProtocolConformanceReferenceBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Scan every protocol for conforming classes that inherit, rather than
    /// declare, an implementation. Read-only, so it runs in parallel.
    fn inherited_implementations(&self, graph: &Graph) -> Vec<InheritedImplementation> {
        let protocols = graph.declarations_of_kind(DeclarationKind::Protocol);

        let mut found: Vec<InheritedImplementation> = protocols
            .par_iter()
            .flat_map_iter(|protocol| self.inherited_for_protocol(graph, *protocol))
            .collect();

        found.sort_by(|a, b| {
            let key = |pair: &InheritedImplementation| {
                (
                    graph.declaration(pair.0).map(|d| d.sort_key()),
                    graph.declaration(pair.1).map(|d| d.sort_key()),
                )
            };
            key(a).cmp(&key(b))
        });
        found.dedup();
        found
    }

    fn inherited_for_protocol(&self, graph: &Graph, protocol: DeclId) -> Vec<InheritedImplementation> {
        let Some(protocol_decl) = graph.declaration(protocol) else {
            return Vec::new();
        };
        let requirements = graph.sorted_declarations(protocol_decl.declarations().iter().copied());
        let mut found = Vec::new();

        for conformer in graph.conforming_declarations(protocol) {
            if graph.declaration(conformer).map(|d| d.kind) != Some(DeclarationKind::Class) {
                continue;
            }
            let superclasses = graph.superclasses(conformer);
            if superclasses.is_empty() {
                continue;
            }

            for requirement in &requirements {
                let Some(req) = graph.declaration(*requirement) else {
                    continue;
                };
                if !req.kind.is_protocol_member_conforming() {
                    continue;
                }
                if find_member(graph, conformer, req.name(), req.kind).is_some() {
                    continue;
                }
                let inherited = superclasses
                    .iter()
                    .find_map(|superclass| find_member(graph, *superclass, req.name(), req.kind));
                if let Some(implementation) = inherited {
                    found.push((*requirement, implementation));
                }
            }
        }

        found
    }
}

/// First member of `owner` in sort order matching a requirement's name and kind.
fn find_member(graph: &Graph, owner: DeclId, name: &str, kind: DeclarationKind) -> Option<DeclId> {
    let decl = graph.declaration(owner)?;
    graph
        .sorted_declarations(decl.declarations().iter().copied())
        .into_iter()
        .find(|member| {
            graph.declaration(*member).is_some_and(|m| {
                m.name() == name && (m.kind == kind || kind.equivalent_conforming_kinds().contains(&m.kind))
            })
        })
}

fn related_to(graph: &Graph, target: DeclId) -> Option<Reference> {
    let decl = graph.declaration(target)?;
    Some(
        Reference::related(decl.kind, decl.first_usr(), decl.location.clone()).with_name(decl.name()),
    )
}

impl Default for ProtocolConformanceReferenceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for ProtocolConformanceReferenceBuilder {
    fn name(&self) -> &'static str {
        "ProtocolConformanceReferenceBuilder"
    }

    fn mutate(&self, graph: &mut Graph, _config: &Config) -> Result<(), AnalysisError> {
        let mut synthetic = 0;

        for (requirement, implementation) in self.inherited_implementations(graph) {
            let Some(edge) = related_to(graph, implementation) else {
                continue;
            };
            debug!("Requirement satisfied by inherited member {}", edge.usr);
            graph.add_reference(edge, Some(RefParent::Declaration(requirement)));
            synthetic += 1;
        }

        let candidates: Vec<RefId> = graph
            .references()
            .filter(|(_, r)| r.is_related && r.kind.is_protocol_member_conforming())
            .map(|(id, _)| id)
            .collect();

        let mut inverted = 0;
        for reference_id in graph.sorted_references(candidates) {
            let Some(reference) = graph.reference(reference_id) else {
                continue;
            };
            let Some(requirement) = graph.declaration_with_usr(&reference.usr) else {
                continue;
            };
            // Also skips the inherited edges added above, which target class members.
            if !graph.is_protocol_member(requirement) {
                continue;
            }
            let Some(conformer) = graph.referencing_declaration(reference_id) else {
                continue;
            };
            if conformer == requirement || graph.is_protocol_member(conformer) {
                continue;
            }
            let Some(edge) = related_to(graph, conformer) else {
                continue;
            };
            graph.add_reference(edge, Some(RefParent::Declaration(requirement)));

            let is_default_implementation = graph
                .declaration(conformer)
                .and_then(|d| d.parent())
                .and_then(|p| graph.declaration(p))
                .is_some_and(|p| p.kind == DeclarationKind::ExtensionProtocol);
            if !is_default_implementation {
                graph.remove_reference(reference_id);
            }
            inverted += 1;
        }

        info!(
            "Inverted {} conformance edges, {} inherited implementations",
            inverted, synthetic
        );
        Ok(())
    }
}
