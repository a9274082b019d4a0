use crate::analysis::Mutator;
use crate::config::Config;
use crate::error::AnalysisError;
use crate::graph::{DeclId, DeclarationKind, Graph, RefParent, Reference};
use tracing::debug;

/// Connects local protocols to their extensions.
///
/// The protocol references each of its extensions, and each requirement
/// gets a structural edge to the extension member that provides its default
/// implementation, so calling the requirement keeps the default alive.
pub struct ProtocolExtensionReferenceBuilder;

impl ProtocolExtensionReferenceBuilder {
    pub fn new() -> Self {
        Self
    }

    fn default_implementations(&self, graph: &Graph, protocol: DeclId, extension: DeclId) -> Vec<(DeclId, DeclId)> {
        let (Some(protocol_decl), Some(extension_decl)) =
            (graph.declaration(protocol), graph.declaration(extension))
        else {
            return Vec::new();
        };

        let mut pairs = Vec::new();
        for requirement in graph.sorted_declarations(protocol_decl.declarations().iter().copied()) {
            let Some(req) = graph.declaration(requirement) else {
                continue;
            };
            let implementation = graph
                .sorted_declarations(extension_decl.declarations().iter().copied())
                .into_iter()
                .find(|member| {
                    graph.declaration(*member).is_some_and(|m| {
                        m.name() == req.name()
                            && (m.kind == req.kind || req.kind.equivalent_conforming_kinds().contains(&m.kind))
                    })
                });
            if let Some(implementation) = implementation {
                pairs.push((requirement, implementation));
            }
        }
        pairs
    }
}

impl Default for ProtocolExtensionReferenceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for ProtocolExtensionReferenceBuilder {
    fn name(&self) -> &'static str {
        "ProtocolExtensionReferenceBuilder"
    }

    fn mutate(&self, graph: &mut Graph, _config: &Config) -> Result<(), AnalysisError> {
        for extension in graph.declarations_of_kind(DeclarationKind::ExtensionProtocol) {
            let Some(protocol) = graph.extended_declaration(extension)? else {
                continue;
            };

            let Some(ext) = graph.declaration(extension) else {
                continue;
            };
            let to_extension = Reference::new(ext.kind, ext.first_usr(), ext.location.clone())
                .with_name(ext.name());
            graph.add_reference(to_extension, Some(RefParent::Declaration(protocol)));

            for (requirement, implementation) in self.default_implementations(graph, protocol, extension) {
                let Some(member) = graph.declaration(implementation) else {
                    continue;
                };
                debug!("Default implementation {} for requirement", member.display());
                let edge = Reference::related(member.kind, member.first_usr(), member.location.clone())
                    .with_name(member.name());
                graph.add_reference(edge, Some(RefParent::Declaration(requirement)));
            }
        }

        Ok(())
    }
}
