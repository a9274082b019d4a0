// Retention rules switched on by configuration.

use super::retain;
use crate::analysis::Mutator;
use crate::config::Config;
use crate::error::AnalysisError;
use crate::graph::{DeclId, Graph};

/// With `retain_public`, public and open API is an entry point.
pub struct PubliclyAccessibleRetainer;

impl PubliclyAccessibleRetainer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PubliclyAccessibleRetainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for PubliclyAccessibleRetainer {
    fn name(&self) -> &'static str {
        "PubliclyAccessibleRetainer"
    }

    fn mutate(&self, graph: &mut Graph, config: &Config) -> Result<(), AnalysisError> {
        if !config.retain_public {
            return Ok(());
        }

        let public: Vec<DeclId> = graph
            .declarations()
            .filter(|(_, d)| d.accessibility.value.is_public_or_open())
            .map(|(id, _)| id)
            .collect();

        for id in graph.sorted_declarations(public) {
            retain(graph, id, "public API");
        }
        Ok(())
    }
}

/// With `retain_objc_accessible`, anything the Objective-C runtime can reach
/// is retained: `@objc` declarations and members of `@objcMembers` classes.
pub struct ObjcAccessibleRetainer;

impl ObjcAccessibleRetainer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ObjcAccessibleRetainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for ObjcAccessibleRetainer {
    fn name(&self) -> &'static str {
        "ObjcAccessibleRetainer"
    }

    fn mutate(&self, graph: &mut Graph, config: &Config) -> Result<(), AnalysisError> {
        if !config.retain_objc_accessible {
            return Ok(());
        }

        let mut accessible: Vec<DeclId> = Vec::new();
        for (id, decl) in graph.declarations() {
            if decl.is_objc_accessible || decl.has_attribute("objc") {
                accessible.push(id);
            }
            if decl.has_attribute("objcMembers") {
                accessible.push(id);
                accessible.extend(decl.declarations().iter().copied());
            }
        }

        for id in graph.sorted_declarations(accessible) {
            retain(graph, id, "Objective-C accessible");
        }
        Ok(())
    }
}

/// Retains declarations whose name matches a `retain_patterns` glob.
pub struct PatternRetainer;

impl PatternRetainer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PatternRetainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for PatternRetainer {
    fn name(&self) -> &'static str {
        "PatternRetainer"
    }

    fn mutate(&self, graph: &mut Graph, config: &Config) -> Result<(), AnalysisError> {
        if config.retain_patterns.is_empty() {
            return Ok(());
        }

        let matching: Vec<DeclId> = graph
            .declarations()
            .filter(|(_, d)| {
                !d.name().is_empty() && (config.should_retain(d.base_name()) || config.should_retain(d.name()))
            })
            .map(|(id, _)| id)
            .collect();

        for id in graph.sorted_declarations(matching) {
            retain(graph, id, "retain pattern");
        }
        Ok(())
    }
}
