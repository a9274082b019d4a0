use super::retain;
use crate::analysis::Mutator;
use crate::config::Config;
use crate::error::AnalysisError;
use crate::graph::{AssetSource, DeclId, DeclarationKind, Graph};

/// Retains types named by storyboards, XIBs, Core Data models and property
/// lists. Interface files also connect to `@IBAction`, `@IBOutlet` and
/// `@IBInspectable` members of the classes they name.
pub struct AssetReferenceRetainer;

impl AssetReferenceRetainer {
    const INTERFACE_BUILDER_ATTRIBUTES: [&'static str; 4] =
        ["IBAction", "IBOutlet", "IBInspectable", "IBSegueAction"];

    pub fn new() -> Self {
        Self
    }
}

impl Default for AssetReferenceRetainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for AssetReferenceRetainer {
    fn name(&self) -> &'static str {
        "AssetReferenceRetainer"
    }

    fn mutate(&self, graph: &mut Graph, _config: &Config) -> Result<(), AnalysisError> {
        let mut retained: Vec<DeclId> = Vec::new();

        for asset in graph.asset_references() {
            let classes = graph
                .declarations_of_kinds(&[DeclarationKind::Class, DeclarationKind::Struct])
                .into_iter()
                .filter(|id| graph.declaration(*id).is_some_and(|d| d.name() == asset.name));

            for class in classes {
                retained.push(class);
                if asset.source != AssetSource::InterfaceBuilder {
                    continue;
                }
                if let Some(decl) = graph.declaration(class) {
                    retained.extend(decl.declarations().iter().copied().filter(|m| {
                        graph.declaration(*m).is_some_and(|member| {
                            Self::INTERFACE_BUILDER_ATTRIBUTES
                                .iter()
                                .any(|attribute| member.has_attribute(attribute))
                        })
                    }));
                }
            }
        }

        for id in graph.sorted_declarations(retained) {
            retain(graph, id, "referenced by an asset");
        }
        Ok(())
    }
}
