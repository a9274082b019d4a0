use super::Mutator;
use crate::config::Config;
use crate::error::AnalysisError;
use crate::graph::{DeclId, DeclarationKind, Graph, Mark, RefId};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::Dfs;
use std::collections::HashMap;
use tracing::{debug, info};

/// Mark-and-sweep over the reference graph.
///
/// Roots are the retained declarations plus the targets of every top-level
/// reference. Everything reachable from a root through ordinary or related
/// references is marked used. Unused declarations then have their unused
/// descendants ignored, so a dead type is reported once instead of once per
/// member.
pub struct UsedDeclarationMarker;

impl UsedDeclarationMarker {
    pub fn new() -> Self {
        Self
    }

    /// Drops requirement-to-conformer edges whose conformer lives inside a
    /// declaration that nothing references or retains.
    fn remove_erroneous_protocol_references(&self, graph: &mut Graph) {
        let members: Vec<DeclId> = graph
            .declarations()
            .filter(|(id, _)| graph.is_protocol_member(*id))
            .map(|(id, _)| id)
            .collect();

        let mut erroneous: Vec<RefId> = Vec::new();
        for member in graph.sorted_declarations(members) {
            let Some(decl) = graph.declaration(member) else {
                continue;
            };
            for related in graph.sorted_references(decl.related().iter().copied()) {
                let Some(reference) = graph.reference(related) else {
                    continue;
                };
                let conformers = graph.declarations_with_usr(&reference.usr);
                let dead_ancestor = conformers.iter().any(|conformer| {
                    graph
                        .ancestors(*conformer)
                        .into_iter()
                        .filter(|a| graph.declaration(*a).is_some_and(|d| d.kind != DeclarationKind::Protocol))
                        .any(|a| !graph.is_retained(a) && !graph.is_referenced(a))
                });
                if dead_ancestor {
                    erroneous.push(related);
                }
            }
        }

        debug!("Removing {} protocol references to unreachable conformers", erroneous.len());
        for reference in erroneous {
            graph.remove_reference(reference);
        }
    }

    /// Declarations reachable from a root.
    fn reachable(&self, graph: &Graph) -> Vec<DeclId> {
        let mut inner: DiGraph<Option<DeclId>, ()> = DiGraph::new();
        let root = inner.add_node(None);
        let mut nodes: HashMap<DeclId, NodeIndex> = HashMap::new();

        for (id, _) in graph.declarations() {
            nodes.insert(id, inner.add_node(Some(id)));
        }

        let targets = |reference: RefId| -> Vec<NodeIndex> {
            graph
                .reference(reference)
                .map(|r| graph.declarations_with_usr(&r.usr))
                .unwrap_or_default()
                .into_iter()
                .filter_map(|d| nodes.get(&d).copied())
                .collect()
        };

        let mut edges: Vec<(NodeIndex, NodeIndex)> = Vec::new();
        for (id, decl) in graph.declarations() {
            let source = nodes[&id];
            for reference in graph.references_from(id) {
                edges.extend(targets(reference).into_iter().map(|t| (source, t)));
            }
            // A reachable accessor keeps its property alive.
            if decl.kind.is_accessor() {
                if let Some(property) = decl.parent().and_then(|p| nodes.get(&p)) {
                    edges.push((source, *property));
                }
            }
        }
        for retained in graph.retained() {
            if let Some(node) = nodes.get(retained) {
                edges.push((root, *node));
            }
        }
        for reference in graph.root_references() {
            for nested in graph.reference_tree(*reference) {
                edges.extend(targets(nested).into_iter().map(|t| (root, t)));
            }
        }
        inner.extend_with_edges(edges);

        let mut reachable = Vec::new();
        let mut dfs = Dfs::new(&inner, root);
        while let Some(node) = dfs.next(&inner) {
            if let Some(Some(id)) = inner.node_weight(node) {
                reachable.push(*id);
            }
        }
        reachable
    }

    /// Ignore the unused descendants of each unused declaration.
    fn ignore_unused_descendants(&self, graph: &mut Graph) {
        let parents: Vec<DeclId> = graph
            .declarations()
            .filter(|(id, d)| {
                !graph.is_used(*id) && (!d.declarations().is_empty() || !d.unused_parameters().is_empty())
            })
            .map(|(id, _)| id)
            .collect();

        let mut ignored = Vec::new();
        for parent in graph.sorted_declarations(parents) {
            ignored.extend(graph.descendants(parent).into_iter().filter(|d| !graph.is_used(*d)));
        }
        for id in ignored {
            graph.mark(id, Mark::Ignored);
        }
    }
}

impl Default for UsedDeclarationMarker {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for UsedDeclarationMarker {
    fn name(&self) -> &'static str {
        "UsedDeclarationMarker"
    }

    fn mutate(&self, graph: &mut Graph, _config: &Config) -> Result<(), AnalysisError> {
        self.remove_erroneous_protocol_references(graph);

        let reachable = self.reachable(graph);
        for id in &reachable {
            graph.mark(*id, Mark::Used);
        }

        self.ignore_unused_descendants(graph);

        info!(
            "Marked {} of {} declarations used",
            graph.used().len(),
            graph.declaration_count()
        );
        Ok(())
    }
}
