// Retention rules for framework hooks discovered at runtime.

use super::retain;
use crate::analysis::Mutator;
use crate::config::Config;
use crate::error::AnalysisError;
use crate::graph::{DeclId, DeclarationKind, Graph};

/// Whether `id` names any of `names` in its inheritance clause, or inherits
/// from a local class that does.
fn conforms_to_any(graph: &Graph, id: DeclId, names: &[&str]) -> bool {
    names.iter().any(|name| graph.inherits_from_named(id, name))
}

/// SwiftUI preview providers are instantiated by Xcode, never by the app.
pub struct SwiftUiRetainer;

impl SwiftUiRetainer {
    const PREVIEW_PROTOCOLS: [&'static str; 2] = ["PreviewProvider", "LibraryContentProvider"];

    pub fn new() -> Self {
        Self
    }
}

impl Default for SwiftUiRetainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for SwiftUiRetainer {
    fn name(&self) -> &'static str {
        "SwiftUiRetainer"
    }

    fn mutate(&self, graph: &mut Graph, config: &Config) -> Result<(), AnalysisError> {
        if !config.retain_swift_ui_previews {
            return Ok(());
        }

        let providers: Vec<DeclId> = graph
            .declarations_of_kinds(&[DeclarationKind::Struct, DeclarationKind::Class])
            .into_iter()
            .filter(|id| conforms_to_any(graph, *id, &Self::PREVIEW_PROTOCOLS))
            .collect();

        for id in providers {
            retain(graph, id, "SwiftUI preview provider");
        }
        Ok(())
    }
}

/// XCTest discovers test case classes and their `test*` methods by name.
pub struct XcTestRetainer;

impl XcTestRetainer {
    const LIFECYCLE_METHODS: [&'static str; 4] = ["setUp", "tearDown", "setUpWithError", "tearDownWithError"];

    pub fn new() -> Self {
        Self
    }

    fn is_test_hook(graph: &Graph, id: DeclId) -> bool {
        graph.declaration(id).is_some_and(|m| {
            if !m.kind.is_function() || m.kind.is_accessor() {
                return false;
            }
            let is_test = m.base_name().starts_with("test") && m.argument_labels().is_some_and(|l| l.is_empty());
            is_test || Self::LIFECYCLE_METHODS.contains(&m.base_name())
        })
    }
}

impl Default for XcTestRetainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for XcTestRetainer {
    fn name(&self) -> &'static str {
        "XcTestRetainer"
    }

    fn mutate(&self, graph: &mut Graph, config: &Config) -> Result<(), AnalysisError> {
        let bases: Vec<&str> = config
            .external_test_case_classes
            .iter()
            .map(String::as_str)
            .collect();

        let mut retained = Vec::new();
        for class in graph.declarations_of_kind(DeclarationKind::Class) {
            if !conforms_to_any(graph, class, &bases) {
                continue;
            }
            retained.push(class);
            if let Some(decl) = graph.declaration(class) {
                retained.extend(
                    decl.declarations()
                        .iter()
                        .copied()
                        .filter(|m| Self::is_test_hook(graph, *m)),
                );
            }
        }

        for id in graph.sorted_declarations(retained) {
            retain(graph, id, "XCTest case");
        }
        Ok(())
    }
}

/// Swift Testing discovers `@Test` functions and `@Suite` types.
pub struct SwiftTestingRetainer;

impl SwiftTestingRetainer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SwiftTestingRetainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for SwiftTestingRetainer {
    fn name(&self) -> &'static str {
        "SwiftTestingRetainer"
    }

    fn mutate(&self, graph: &mut Graph, _config: &Config) -> Result<(), AnalysisError> {
        let tests: Vec<DeclId> = graph
            .declarations()
            .filter(|(_, d)| d.has_attribute("Test") || d.has_attribute("Suite"))
            .map(|(id, _)| id)
            .collect();

        for id in graph.sorted_declarations(tests) {
            retain(graph, id, "Swift Testing");
        }
        Ok(())
    }
}
