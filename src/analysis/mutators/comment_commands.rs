use super::retain;
use crate::analysis::Mutator;
use crate::config::Config;
use crate::error::AnalysisError;
use crate::graph::{CommentCommand, DeclId, Graph, Mark};
use std::collections::BTreeSet;
use tracing::debug;

/// Applies `swiftdeadcode:ignore` directives.
///
/// `ignore` retains and suppresses a declaration and everything nested in
/// it, `ignore:all` at file level does so for every declaration in the file,
/// and `ignore:parameters a,b` retains the named unused parameters.
pub struct CommentCommandRetainer;

impl CommentCommandRetainer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CommentCommandRetainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for CommentCommandRetainer {
    fn name(&self) -> &'static str {
        "CommentCommandRetainer"
    }

    fn mutate(&self, graph: &mut Graph, _config: &Config) -> Result<(), AnalysisError> {
        let ignored_files: BTreeSet<_> = graph
            .files()
            .filter(|file| file.has_command(&CommentCommand::IgnoreAll))
            .map(|file| file.path.clone())
            .collect();

        let mut suppressed: BTreeSet<DeclId> = BTreeSet::new();
        let mut parameters: Vec<DeclId> = Vec::new();

        for (id, decl) in graph.declarations() {
            if ignored_files.contains(&decl.location.file)
                || decl.comment_commands.contains(&CommentCommand::Ignore)
            {
                suppressed.insert(id);
                suppressed.extend(graph.descendants(id));
            }

            for command in &decl.comment_commands {
                let CommentCommand::IgnoreParameters(names) = command else {
                    continue;
                };
                parameters.extend(decl.unused_parameters().iter().copied().filter(|param| {
                    graph
                        .declaration(*param)
                        .is_some_and(|p| names.iter().any(|name| name == p.name()))
                }));
            }
        }

        debug!(
            "Comment directives suppress {} declarations and {} parameters",
            suppressed.len(),
            parameters.len()
        );

        for id in suppressed {
            retain(graph, id, "ignore directive");
            graph.mark(id, Mark::Ignored);
        }
        for id in parameters {
            retain(graph, id, "ignore:parameters directive");
        }

        Ok(())
    }
}
