// Front-end graph document schema and sequential ingestion.

use super::{
    Accessibility, AssetReference, CommentCommand, DeclId, Declaration, DeclarationKind,
    DeclaredAccessibility, Graph, Location, RefId, RefParent, Reference, ReferenceRole, SourceFile,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// The complete front-end output for one analysis run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphInput {
    #[serde(default)]
    pub fragments: Vec<GraphFragment>,

    /// Module name to the modules it re-exports
    #[serde(default)]
    pub module_exports: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub asset_references: Vec<AssetReference>,
}

/// Declarations and top-level references of one source file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphFragment {
    pub file: SourceFile,

    #[serde(default)]
    pub declarations: Vec<DeclarationNode>,

    /// References with no enclosing declaration
    #[serde(default)]
    pub references: Vec<ReferenceNode>,
}

/// A declaration as emitted by the front end, with its subtree inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeclarationNode {
    pub kind: DeclarationKind,
    #[serde(default)]
    pub usrs: Vec<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Defaults to the fragment's file
    #[serde(default)]
    pub file: Option<PathBuf>,
    pub line: u32,
    #[serde(default = "default_column")]
    pub column: u32,

    #[serde(default)]
    pub accessibility: Option<Accessibility>,
    /// Defaults to true when `accessibility` is present
    #[serde(default)]
    pub accessibility_explicit: Option<bool>,

    #[serde(default)]
    pub attributes: Vec<String>,
    #[serde(default)]
    pub modifiers: Vec<String>,
    /// Raw comment bodies attached to the declaration
    #[serde(default)]
    pub comments: Vec<String>,
    #[serde(default)]
    pub is_implicit: bool,
    #[serde(default)]
    pub is_objc_accessible: bool,

    #[serde(default)]
    pub declarations: Vec<DeclarationNode>,
    #[serde(default)]
    pub unused_parameters: Vec<DeclarationNode>,
    #[serde(default)]
    pub references: Vec<ReferenceNode>,
    #[serde(default)]
    pub related: Vec<ReferenceNode>,
}

/// A reference as emitted by the front end. Whether it is related is
/// decided by the list it appears in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceNode {
    pub kind: DeclarationKind,
    pub usr: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub file: Option<PathBuf>,
    pub line: u32,
    #[serde(default = "default_column")]
    pub column: u32,
    #[serde(default)]
    pub role: ReferenceRole,
    /// References nested inside this one's expression
    #[serde(default)]
    pub references: Vec<ReferenceNode>,
}

fn default_column() -> u32 {
    1
}

/// A fragment converted to graph entities, ready to merge.
#[derive(Debug)]
pub(crate) struct PreparedFragment {
    file: SourceFile,
    declarations: Vec<PreparedDeclaration>,
    references: Vec<PreparedReference>,
}

#[derive(Debug)]
struct PreparedDeclaration {
    declaration: Declaration,
    declarations: Vec<PreparedDeclaration>,
    unused_parameters: Vec<PreparedDeclaration>,
    references: Vec<PreparedReference>,
}

#[derive(Debug)]
struct PreparedReference {
    reference: Reference,
    references: Vec<PreparedReference>,
}

impl PreparedFragment {
    pub(crate) fn declaration_count(&self) -> usize {
        fn count(decls: &[PreparedDeclaration]) -> usize {
            decls
                .iter()
                .map(|d| 1 + count(&d.declarations) + count(&d.unused_parameters))
                .sum()
        }
        count(&self.declarations)
    }
}

/// Convert a fragment into graph entities without touching the graph.
///
/// Nodes without an identifier are skipped with a warning.
pub(crate) fn prepare(fragment: GraphFragment) -> PreparedFragment {
    let GraphFragment {
        mut file,
        declarations,
        references,
    } = fragment;

    file.comment_commands = file
        .comments
        .iter()
        .filter_map(|c| CommentCommand::parse(c))
        .collect();

    let path = file.path.clone();
    let declarations = declarations
        .into_iter()
        .filter_map(|node| prepare_declaration(node, &path))
        .collect();
    let references = references
        .into_iter()
        .filter_map(|node| prepare_reference(node, &path, false))
        .collect();

    PreparedFragment {
        file,
        declarations,
        references,
    }
}

fn prepare_declaration(node: DeclarationNode, path: &Path) -> Option<PreparedDeclaration> {
    let file = node.file.unwrap_or_else(|| path.to_path_buf());
    let location = Location::new(file, node.line, node.column);

    let mut usrs = node.usrs.into_iter().filter(|u| !u.is_empty());
    let Some(first_usr) = usrs.next() else {
        warn!(
            "Skipping {} declaration without an identifier at {}",
            node.kind, location
        );
        return None;
    };

    let mut declaration = Declaration::new(node.kind, first_usr, location);
    declaration.usrs.extend(usrs);
    declaration.name = node.name;
    declaration.accessibility = match node.accessibility {
        Some(value) => DeclaredAccessibility {
            value,
            is_explicit: node.accessibility_explicit.unwrap_or(true),
        },
        None => DeclaredAccessibility::implicit(Accessibility::Internal),
    };
    declaration.attributes = node.attributes.into_iter().collect();
    declaration.modifiers = node.modifiers.into_iter().collect();
    declaration.comment_commands = node
        .comments
        .iter()
        .filter_map(|c| CommentCommand::parse(c))
        .collect();
    declaration.is_implicit = node.is_implicit;
    declaration.is_objc_accessible = node.is_objc_accessible;

    let references = node
        .references
        .into_iter()
        .filter_map(|r| prepare_reference(r, path, false))
        .chain(
            node.related
                .into_iter()
                .filter_map(|r| prepare_reference(r, path, true)),
        )
        .collect();

    Some(PreparedDeclaration {
        declaration,
        declarations: node
            .declarations
            .into_iter()
            .filter_map(|d| prepare_declaration(d, path))
            .collect(),
        unused_parameters: node
            .unused_parameters
            .into_iter()
            .filter_map(|d| prepare_declaration(d, path))
            .collect(),
        references,
    })
}

fn prepare_reference(node: ReferenceNode, path: &Path, is_related: bool) -> Option<PreparedReference> {
    let file = node.file.unwrap_or_else(|| path.to_path_buf());
    let location = Location::new(file, node.line, node.column);

    if node.usr.is_empty() {
        warn!("Skipping {} reference without an identifier at {}", node.kind, location);
        return None;
    }

    let mut reference = Reference::new(node.kind, node.usr, location)
        .with_role(node.role)
        .with_related(is_related);
    reference.name = node.name;

    Some(PreparedReference {
        reference,
        references: node
            .references
            .into_iter()
            .filter_map(|r| prepare_reference(r, path, false))
            .collect(),
    })
}

/// Merge a prepared fragment into the graph.
pub(crate) fn merge(graph: &mut Graph, prepared: PreparedFragment) {
    let PreparedFragment {
        file,
        declarations,
        references,
    } = prepared;

    graph.add_file(file);
    for declaration in declarations {
        merge_declaration(graph, declaration, None, false);
    }
    for reference in references {
        merge_reference(graph, reference, None);
    }
}

fn merge_declaration(
    graph: &mut Graph,
    prepared: PreparedDeclaration,
    parent: Option<DeclId>,
    is_parameter: bool,
) {
    let PreparedDeclaration {
        declaration,
        declarations,
        unused_parameters,
        references,
    } = prepared;

    let id = match unify_target(graph, &declaration) {
        Some(existing) => {
            debug!("Unifying partial definition of {}", declaration.display());
            unify(graph, existing, declaration);
            existing
        }
        None => match (parent, is_parameter) {
            (Some(function), true) => graph.add_unused_parameter(declaration, function),
            _ => graph.add_declaration(declaration, parent),
        },
    };

    for child in declarations {
        merge_declaration(graph, child, Some(id), false);
    }
    for param in unused_parameters {
        merge_declaration(graph, param, Some(id), true);
    }
    for reference in references {
        merge_reference(graph, reference, Some(RefParent::Declaration(id)));
    }
}

/// An existing declaration sharing an identifier, location and kind.
fn unify_target(graph: &Graph, declaration: &Declaration) -> Option<DeclId> {
    declaration.usrs.iter().find_map(|usr| {
        graph
            .declaration_with_usr(usr)
            .filter(|id| {
                graph.declaration(*id).is_some_and(|existing| {
                    existing.kind == declaration.kind && existing.location == declaration.location
                })
            })
    })
}

fn unify(graph: &mut Graph, existing: DeclId, incoming: Declaration) {
    for usr in incoming.usrs {
        graph.add_usr(existing, usr);
    }

    let Some(target) = graph.declaration_mut(existing) else {
        return;
    };
    target.attributes.extend(incoming.attributes);
    target.modifiers.extend(incoming.modifiers);
    for command in incoming.comment_commands {
        if !target.comment_commands.contains(&command) {
            target.comment_commands.push(command);
        }
    }
    if target.name.is_none() {
        target.name = incoming.name;
    }
    if !target.accessibility.is_explicit && incoming.accessibility.is_explicit {
        target.accessibility = incoming.accessibility;
    }
    target.is_implicit &= incoming.is_implicit;
    target.is_objc_accessible |= incoming.is_objc_accessible;
}

fn merge_reference(graph: &mut Graph, prepared: PreparedReference, parent: Option<RefParent>) -> RefId {
    let id = graph.add_reference(prepared.reference, parent);
    for nested in prepared.references {
        merge_reference(graph, nested, Some(RefParent::Reference(id)));
    }
    id
}

/// Builder for constructing the declaration graph one fragment at a time
pub struct GraphBuilder {
    /// The graph being built
    graph: Graph,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            graph: Graph::new(),
        }
    }

    /// Continue building on an existing graph
    pub fn from_graph(graph: Graph) -> Self {
        Self { graph }
    }

    /// Add one file's declarations and references to the graph
    pub fn add_fragment(&mut self, fragment: GraphFragment) -> &mut Self {
        debug!("Ingesting {}", fragment.file.path.display());
        let prepared = prepare(fragment);
        merge(&mut self.graph, prepared);
        self
    }

    /// Add module exports and asset references from a graph document
    pub fn add_metadata(
        &mut self,
        module_exports: BTreeMap<String, Vec<String>>,
        asset_references: Vec<AssetReference>,
    ) -> &mut Self {
        for (module, exported) in module_exports {
            for target in exported {
                self.graph.add_module_export(module.clone(), target);
            }
        }
        for asset in asset_references {
            self.graph.add_asset_reference(asset);
        }
        self
    }

    /// Add a complete graph document
    pub fn add_input(&mut self, input: GraphInput) -> &mut Self {
        for fragment in input.fragments {
            self.add_fragment(fragment);
        }
        self.add_metadata(input.module_exports, input.asset_references)
    }

    /// Build the final graph
    pub fn build(self) -> Graph {
        self.graph
    }
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
