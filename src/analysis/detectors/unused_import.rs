use crate::analysis::Mutator;
use crate::config::Config;
use crate::error::AnalysisError;
use crate::graph::{Graph, UnusedImport};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use tracing::{debug, info};

/// Finds import statements whose module contributes no referenced declaration
/// to the importing file.
///
/// Runs before any pass rewrites references, so it sees exactly what each
/// file refers to. Only modules that were themselves indexed can be judged;
/// imports of system frameworks are left alone.
pub struct UnusedImportMarker;

impl UnusedImportMarker {
    pub fn new() -> Self {
        Self
    }

    /// Modules whose declarations each file references.
    fn referenced_modules(graph: &Graph) -> BTreeMap<PathBuf, BTreeSet<String>> {
        let mut by_file: BTreeMap<PathBuf, BTreeSet<String>> = BTreeMap::new();

        for (_, reference) in graph.references() {
            let modules: BTreeSet<String> = graph
                .declarations_with_usr(&reference.usr)
                .into_iter()
                .filter_map(|id| graph.declaration(id))
                .flat_map(|decl| graph.modules_of_file(&decl.location.file))
                .collect();
            if modules.is_empty() {
                continue;
            }
            by_file
                .entry(reference.location.file.clone())
                .or_default()
                .extend(modules);
        }

        by_file
    }

    /// Module exports declared in metadata plus `@_exported` imports found
    /// in the files of each module.
    fn exports(graph: &Graph) -> BTreeMap<String, BTreeSet<String>> {
        let mut exports: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

        for module in graph.indexed_modules() {
            let exported: BTreeSet<String> = graph.exported_modules(&module).cloned().collect();
            exports.entry(module).or_default().extend(exported);
        }
        for file in graph.files() {
            for import in file.imports.iter().filter(|i| i.is_exported) {
                for module in &file.modules {
                    exports
                        .entry(module.clone())
                        .or_default()
                        .insert(import.module.clone());
                }
            }
        }

        exports
    }

    /// `module` and everything it re-exports, transitively.
    fn export_closure(exports: &BTreeMap<String, BTreeSet<String>>, module: &str) -> BTreeSet<String> {
        let mut closure = BTreeSet::from([module.to_string()]);
        let mut stack = vec![module.to_string()];

        while let Some(current) = stack.pop() {
            for exported in exports.get(&current).into_iter().flatten() {
                if closure.insert(exported.clone()) {
                    stack.push(exported.clone());
                }
            }
        }

        closure
    }
}

impl Default for UnusedImportMarker {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for UnusedImportMarker {
    fn name(&self) -> &'static str {
        "UnusedImportMarker"
    }

    fn mutate(&self, graph: &mut Graph, _config: &Config) -> Result<(), AnalysisError> {
        let indexed = graph.indexed_modules();
        let referenced = Self::referenced_modules(graph);
        let exports = Self::exports(graph);
        let none = BTreeSet::new();

        let mut unused = Vec::new();
        for file in graph.files() {
            let used_modules = referenced.get(&file.path).unwrap_or(&none);

            for import in &file.imports {
                if import.is_exported
                    || !indexed.contains(&import.module)
                    || file.modules.contains(&import.module)
                {
                    continue;
                }

                let closure = Self::export_closure(&exports, &import.module);
                if closure.is_disjoint(used_modules) {
                    debug!("Unused import of {} in {}", import.module, file.path.display());
                    unused.push(UnusedImport {
                        module: import.module.clone(),
                        location: file.import_location(import),
                    });
                }
            }
        }

        info!("Found {} unused imports", unused.len());
        for import in unused {
            graph.mark_unused_import(import);
        }
        Ok(())
    }
}
