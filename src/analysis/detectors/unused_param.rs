use crate::analysis::mutators::retain;
use crate::analysis::Mutator;
use crate::config::Config;
use crate::error::AnalysisError;
use crate::graph::{DeclId, Graph};
use petgraph::unionfind::UnionFind;
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

/// Retains unused parameters that cannot be removed independently.
///
/// Functions joined by structural edges (overrides, protocol requirements and
/// their implementations, default implementations) form a family that must
/// keep one signature. A parameter unused in one member is still needed when
/// another member uses it, and every parameter is needed when the family
/// reaches outside the program.
pub struct UnusedParameterRetainer;

/// One override/conformance family.
#[derive(Debug, Default)]
struct Family {
    members: Vec<DeclId>,
    has_external_base: bool,
    has_protocol_member: bool,
}

impl UnusedParameterRetainer {
    const DISCARD: &'static str = "_";

    pub fn new() -> Self {
        Self
    }

    fn families(graph: &Graph) -> Vec<Family> {
        let functions: Vec<DeclId> = graph
            .declarations()
            .filter(|(_, d)| d.kind.is_function() && !d.kind.is_accessor())
            .map(|(id, _)| id)
            .collect();
        let functions = graph.sorted_declarations(functions);
        let dense: HashMap<DeclId, usize> = functions.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let mut union = UnionFind::<usize>::new(functions.len());
        let mut external = vec![false; functions.len()];

        for (index, id) in functions.iter().enumerate() {
            let Some(decl) = graph.declaration(*id) else {
                continue;
            };
            for reference in decl.related().iter().filter_map(|r| graph.reference(*r)) {
                if !reference.kind.is_function() {
                    continue;
                }
                let targets = graph.declarations_with_usr(&reference.usr);
                if targets.is_empty() {
                    external[index] = true;
                }
                for target in targets.iter().filter_map(|t| dense.get(t)) {
                    union.union(index, *target);
                }
            }
        }

        let mut families: BTreeMap<usize, Family> = BTreeMap::new();
        for (index, root) in union.into_labeling().into_iter().enumerate() {
            let family = families.entry(root).or_default();
            let id = functions[index];
            family.members.push(id);
            family.has_external_base |= external[index];
            family.has_protocol_member |= graph.is_protocol_member(id);
        }

        families.into_values().collect()
    }

    fn parameter_names(graph: &Graph, function: DeclId) -> Vec<(DeclId, String)> {
        graph
            .declaration(function)
            .map(|decl| {
                decl.unused_parameters()
                    .iter()
                    .filter_map(|p| graph.declaration(*p).map(|param| (*p, param.name().to_string())))
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for UnusedParameterRetainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for UnusedParameterRetainer {
    fn name(&self) -> &'static str {
        "UnusedParameterRetainer"
    }

    fn mutate(&self, graph: &mut Graph, config: &Config) -> Result<(), AnalysisError> {
        let mut retained: Vec<(DeclId, &'static str)> = Vec::new();

        for family in Self::families(graph) {
            let retain_all = family.has_external_base
                || (config.retain_unused_protocol_func_params && family.has_protocol_member);

            for function in &family.members {
                let params = Self::parameter_names(graph, *function);
                if params.is_empty() {
                    continue;
                }

                if retain_all {
                    retained.extend(params.iter().map(|(p, _)| (*p, "signature shared with external base")));
                    continue;
                }
                if graph.is_protocol_member(*function) {
                    retained.extend(params.iter().map(|(p, _)| (*p, "protocol requirement")));
                    continue;
                }

                for (param, name) in params {
                    if name == Self::DISCARD {
                        retained.push((param, "discarded parameter"));
                        continue;
                    }
                    let used_by_sibling = family
                        .members
                        .iter()
                        .filter(|m| *m != function && !graph.is_protocol_member(**m))
                        .any(|m| !Self::parameter_names(graph, *m).iter().any(|(_, n)| *n == name));
                    if used_by_sibling {
                        retained.push((param, "used by an override or conformance"));
                    }
                }
            }
        }

        debug!("Retaining {} unused parameters", retained.len());
        for (param, reason) in retained {
            retain(graph, param, reason);
        }
        Ok(())
    }
}
