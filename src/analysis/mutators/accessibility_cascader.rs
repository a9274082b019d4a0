use crate::analysis::Mutator;
use crate::config::Config;
use crate::error::AnalysisError;
use crate::graph::{DeclarationKind, DeclaredAccessibility, Graph};

/// Members without written accessibility inherit it from an enclosing
/// extension that has one, e.g. every member of `public extension Foo`.
pub struct AccessibilityCascader;

impl AccessibilityCascader {
    pub fn new() -> Self {
        Self
    }
}

impl Default for AccessibilityCascader {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for AccessibilityCascader {
    fn name(&self) -> &'static str {
        "AccessibilityCascader"
    }

    fn mutate(&self, graph: &mut Graph, _config: &Config) -> Result<(), AnalysisError> {
        let mut updates = Vec::new();

        for extension in graph.declarations_of_kinds(&DeclarationKind::EXTENSIONS) {
            let Some(decl) = graph.declaration(extension) else {
                continue;
            };
            if !decl.accessibility.is_explicit {
                continue;
            }
            let value = decl.accessibility.value;

            for member in decl.declarations() {
                let inherits = graph
                    .declaration(*member)
                    .is_some_and(|m| !m.accessibility.is_explicit);
                if inherits {
                    updates.push((*member, value));
                }
            }
        }

        for (member, value) in updates {
            graph.set_accessibility(member, DeclaredAccessibility::implicit(value));
        }

        Ok(())
    }
}
