use super::retain;
use crate::analysis::Mutator;
use crate::config::Config;
use crate::error::AnalysisError;
use crate::graph::{DeclId, DeclarationKind, Graph};
use tracing::{debug, info};

/// Folds extensions of types declared in the program into those types.
///
/// Members, references and structural edges move to the extended type and
/// the extension node is deleted. Protocol extensions stay separate so a
/// protocol's requirements remain distinguishable from its default
/// implementations. Extensions of foreign types cannot be folded and are
/// retained.
pub struct ExtensionFolder;

impl ExtensionFolder {
    pub fn new() -> Self {
        Self
    }

    fn fold(&self, graph: &mut Graph, extension: DeclId, target: DeclId) -> Result<(), AnalysisError> {
        // The extension's reference to its own type would become a self-reference.
        if let Some(extended) = graph.extended_type_reference(extension)? {
            graph.remove_reference(extended);
        }

        let decl = graph
            .declaration(extension)
            .ok_or(AnalysisError::MissingDeclaration(extension))?;
        let members: Vec<_> = decl.declarations().iter().copied().collect();
        let references: Vec<_> = decl
            .references()
            .iter()
            .chain(decl.related())
            .copied()
            .collect();

        for member in members {
            graph.move_declaration(member, target);
        }
        for reference in references {
            graph.move_reference(reference, target);
        }

        graph.mark_extension_folded(extension, target);
        graph.remove_declaration(extension);
        Ok(())
    }
}

impl Default for ExtensionFolder {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for ExtensionFolder {
    fn name(&self) -> &'static str {
        "ExtensionFolder"
    }

    fn mutate(&self, graph: &mut Graph, _config: &Config) -> Result<(), AnalysisError> {
        let mut folded = 0;

        for extension in graph.declarations_of_kinds(&DeclarationKind::EXTENSIONS) {
            let Some(kind) = graph.declaration(extension).map(|d| d.kind) else {
                continue;
            };
            let extended_kind = kind.extended_kind()?;

            match graph.extended_declaration(extension)? {
                None => retain(graph, extension, "extends a foreign type"),
                Some(_) if extended_kind == DeclarationKind::Protocol => {}
                Some(target) => {
                    if let Some(decl) = graph.declaration(extension) {
                        debug!("Folding {}", decl.display());
                    }
                    self.fold(graph, extension, target)?;
                    folded += 1;
                }
            }
        }

        info!("Folded {} extensions", folded);
        Ok(())
    }
}
