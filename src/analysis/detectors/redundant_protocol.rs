use crate::analysis::Mutator;
use crate::config::Config;
use crate::error::AnalysisError;
use crate::graph::{DeclId, DeclarationKind, Graph, Mark, RedundantProtocol, RefId, ReferenceRole};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Finds protocols that types conform to but that nothing ever uses as a
/// type, constraint or member lookup.
///
/// The protocol itself is reachable through its conformances, so it is
/// recorded as redundant rather than unused, and its members (plus the
/// unused members that implement them) are ignored instead of being reported
/// one by one.
pub struct RedundantProtocolMarker;

impl RedundantProtocolMarker {
    pub fn new() -> Self {
        Self
    }

    fn extension_members(graph: &Graph, protocol: DeclId) -> Vec<DeclId> {
        graph
            .protocol_extensions(protocol)
            .into_iter()
            .flat_map(|ext| graph.descendants(ext))
            .collect()
    }

    /// The conformance clauses naming `protocol`, or `None` when it is also
    /// referenced any other way.
    fn conformance_references(graph: &Graph, protocol: DeclId) -> Option<BTreeSet<RefId>> {
        let extensions: BTreeSet<DeclId> = graph.protocol_extensions(protocol).into_iter().collect();
        let mut conformances = BTreeSet::new();

        for id in graph.references_to(protocol) {
            let reference = graph.reference(id)?;
            let owner = graph.referencing_declaration(id);

            if reference.role == ReferenceRole::ExtendedType && owner.is_some_and(|o| extensions.contains(&o)) {
                continue;
            }
            if owner == Some(protocol) {
                continue;
            }
            if !(reference.is_related || reference.role.is_conformance()) {
                return None;
            }
            conformances.insert(id);
        }

        Some(conformances)
    }

    fn evaluate(graph: &Graph, protocol: DeclId) -> Option<RedundantProtocol> {
        let decl = graph.declaration(protocol)?;
        if !graph.is_used(protocol) || graph.is_retained(protocol) {
            return None;
        }

        let inherited: BTreeSet<RefId> = graph
            .inherited_type_references(protocol)
            .into_iter()
            .filter(|r| graph.reference(*r).is_some_and(|r| r.kind == DeclarationKind::Protocol))
            .collect();
        let inherits_foreign = inherited.iter().any(|r| {
            graph
                .reference(*r)
                .is_some_and(|r| graph.declarations_with_usr(&r.usr).is_empty())
        });
        if inherits_foreign {
            return None;
        }

        if decl.declarations().iter().any(|m| graph.is_used(*m)) {
            return None;
        }
        if Self::extension_members(graph, protocol).iter().any(|m| graph.is_used(*m)) {
            return None;
        }

        let references = Self::conformance_references(graph, protocol)?;
        Some(RedundantProtocol { references, inherited })
    }

    /// Members, default implementations and unused implementations of a
    /// redundant protocol.
    fn suppressed(graph: &Graph, protocol: DeclId) -> Vec<DeclId> {
        let mut suppressed = graph.descendants(protocol);
        suppressed.extend(Self::extension_members(graph, protocol));

        let members: Vec<DeclId> = graph
            .declaration(protocol)
            .map(|d| d.declarations().iter().copied().collect())
            .unwrap_or_default();
        for member in members {
            let Some(decl) = graph.declaration(member) else {
                continue;
            };
            let implementations = decl
                .related()
                .iter()
                .filter_map(|r| graph.reference(*r))
                .flat_map(|r| graph.declarations_with_usr(&r.usr));
            suppressed.extend(implementations.filter(|i| !graph.is_used(*i)));
        }

        suppressed
    }
}

impl Default for RedundantProtocolMarker {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for RedundantProtocolMarker {
    fn name(&self) -> &'static str {
        "RedundantProtocolMarker"
    }

    fn mutate(&self, graph: &mut Graph, _config: &Config) -> Result<(), AnalysisError> {
        let protocols = graph.declarations_of_kind(DeclarationKind::Protocol);

        let mut redundant = Vec::new();
        for protocol in graph.sorted_declarations(protocols) {
            if let Some(result) = Self::evaluate(graph, protocol) {
                redundant.push((protocol, result, Self::suppressed(graph, protocol)));
            }
        }

        info!("Found {} redundant protocols", redundant.len());
        for (protocol, result, suppressed) in redundant {
            if let Some(decl) = graph.declaration(protocol) {
                debug!("Redundant protocol {}", decl.display());
            }
            graph.mark_redundant_protocol(protocol, result);
            for id in suppressed {
                graph.mark(id, Mark::Ignored);
            }
        }
        Ok(())
    }
}
