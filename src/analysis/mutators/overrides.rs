use super::retain;
use crate::analysis::Mutator;
use crate::config::Config;
use crate::error::AnalysisError;
use crate::graph::{DeclId, Graph, RefParent, Reference};
use tracing::debug;

/// Structural edges of a member that point at functions or properties.
fn member_edges(graph: &Graph, id: DeclId) -> Vec<(String, Option<DeclId>)> {
    let Some(decl) = graph.declaration(id) else {
        return Vec::new();
    };
    graph
        .sorted_references(decl.related().iter().copied())
        .into_iter()
        .filter_map(|r| graph.reference(r))
        .filter(|r| r.kind.is_function() || r.kind.is_variable())
        .map(|r| (r.usr.clone(), graph.declaration_with_usr(&r.usr)))
        .collect()
}

/// Gives each local base member a structural edge to its overrides, so a call
/// through the base type keeps every override alive.
pub struct OverrideReferenceBuilder;

impl OverrideReferenceBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for OverrideReferenceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for OverrideReferenceBuilder {
    fn name(&self) -> &'static str {
        "OverrideReferenceBuilder"
    }

    fn mutate(&self, graph: &mut Graph, _config: &Config) -> Result<(), AnalysisError> {
        let overrides: Vec<DeclId> = graph
            .declarations()
            .filter(|(_, d)| d.is_override())
            .map(|(id, _)| id)
            .collect();

        for id in graph.sorted_declarations(overrides) {
            let Some(decl) = graph.declaration(id) else {
                continue;
            };
            let edge = Reference::related(decl.kind, decl.first_usr(), decl.location.clone())
                .with_name(decl.name());

            for (_, base) in member_edges(graph, id) {
                let Some(base) = base.filter(|b| *b != id && !graph.is_protocol_member(*b)) else {
                    continue;
                };
                debug!("Base member references override {}", edge.usr);
                graph.add_reference(edge.clone(), Some(RefParent::Declaration(base)));
            }
        }

        Ok(())
    }
}

/// Retains members that override or implement something declared outside
/// the program, since foreign code may call them through the base.
pub struct ExternalOverrideRetainer;

impl ExternalOverrideRetainer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ExternalOverrideRetainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for ExternalOverrideRetainer {
    fn name(&self) -> &'static str {
        "ExternalOverrideRetainer"
    }

    fn mutate(&self, graph: &mut Graph, _config: &Config) -> Result<(), AnalysisError> {
        let members: Vec<DeclId> = graph
            .declarations()
            .filter(|(_, d)| d.kind.is_function() || d.kind.is_variable())
            .map(|(id, _)| id)
            .collect();

        for id in graph.sorted_declarations(members) {
            let foreign = member_edges(graph, id)
                .into_iter()
                .find(|(_, target)| target.is_none());
            if let Some((usr, _)) = foreign {
                retain(graph, id, &format!("overrides or implements foreign {}", usr));
            }
        }

        Ok(())
    }
}
