// Explicit accessibility broader than actual usage requires.
//
// The three tiers share one shape: pick declarations explicitly written with
// the tier, look at where each one (or anything nested in it) is referenced
// from, and record the narrowest tier that would still compile. Unfolded
// extensions are never judged on their own; they follow the declaration they
// extend when both sit in the same scope.

use crate::analysis::mutators::PropertyWrapperRetainer;
use crate::analysis::Mutator;
use crate::config::Config;
use crate::error::AnalysisError;
use crate::graph::{Accessibility, DeclId, Graph, RedundantAccessibility, RefId};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// Declarations explicitly written with `tier` that are candidates for
/// narrowing, in sort order, with unfolded extensions split out.
fn candidates(graph: &Graph, tier: Accessibility) -> (Vec<DeclId>, Vec<DeclId>) {
    let ids: Vec<DeclId> = graph
        .declarations()
        .filter(|(id, d)| {
            d.accessibility.is_explicitly(tier)
                && !d.is_implicit
                && graph.is_used(*id)
                && !graph.is_retained(*id)
                && !graph.is_ignored(*id)
        })
        .map(|(id, _)| id)
        .collect();

    graph
        .sorted_declarations(ids)
        .into_iter()
        .partition(|id| graph.declaration(*id).is_some_and(|d| !d.kind.is_extension()))
}

/// References to a declaration, to anything nested in it and, for protocols,
/// to default implementations in its extensions.
fn usage_references(graph: &Graph, id: DeclId) -> Vec<RefId> {
    let mut targets = vec![id];
    targets.extend(graph.descendants(id));
    for extension in graph.protocol_extensions(id) {
        targets.extend(graph.descendants(extension));
    }

    let ids = targets.into_iter().flat_map(|t| graph.references_to(t));
    graph.sorted_references(ids)
}

fn is_property_wrapper_member(graph: &Graph, id: DeclId) -> bool {
    let Some(decl) = graph.declaration(id) else {
        return false;
    };
    let in_wrapper = decl
        .parent()
        .and_then(|p| graph.declaration(p))
        .is_some_and(|p| p.has_attribute("propertyWrapper"));
    in_wrapper && PropertyWrapperRetainer::is_special_member(decl)
}

/// Whether `id` implements a requirement of a protocol at least as accessible
/// as `tier`. A witness must be as visible as the conformance it satisfies,
/// and calls through the requirement never name it directly.
fn witnesses_requirement_at(graph: &Graph, id: DeclId, tier: Accessibility) -> bool {
    graph.references_to(id).into_iter().any(|r| {
        let is_related = graph.reference(r).is_some_and(|r| r.is_related);
        let Some(requirement) = graph.referencing_declaration(r).filter(|_| is_related) else {
            return false;
        };
        requirement != id
            && graph.is_protocol_member(requirement)
            && graph
                .declaration(requirement)
                .and_then(|d| d.parent())
                .and_then(|p| graph.declaration(p))
                .is_some_and(|protocol| protocol.accessibility.value >= tier)
    })
}

fn record(graph: &mut Graph, id: DeclId, declared: Accessibility, suggested: Accessibility) {
    let Some(decl) = graph.declaration(id) else {
        return;
    };
    debug!(
        "Redundant {} accessibility on {}, could be {}",
        declared.as_str(),
        decl.display(),
        suggested.as_str()
    );
    let file = decl.location.file.clone();
    let modules = graph.modules_of_file(&file);
    graph.mark_redundant_accessibility(
        id,
        RedundantAccessibility {
            declared,
            suggested,
            modules,
            file,
        },
    );
}

/// Marks each extension whose extended declaration was found redundant for
/// the same tier, when `same_scope` holds for the pair.
fn inherit_for_extensions(
    graph: &mut Graph,
    extensions: Vec<DeclId>,
    declared: Accessibility,
    same_scope: impl Fn(&Graph, DeclId, DeclId) -> bool,
) -> Result<usize, AnalysisError> {
    let mut inherited = Vec::new();
    for extension in extensions {
        let Some(extended) = graph.extended_declaration(extension)? else {
            continue;
        };
        let Some(result) = graph.redundant_accessibility().get(&extended) else {
            continue;
        };
        if result.declared == declared && same_scope(graph, extension, extended) {
            inherited.push((extension, result.suggested));
        }
    }

    let count = inherited.len();
    for (extension, suggested) in inherited {
        record(graph, extension, declared, suggested);
    }
    Ok(count)
}

fn same_file(graph: &Graph, a: DeclId, b: DeclId) -> bool {
    match (graph.declaration(a), graph.declaration(b)) {
        (Some(a), Some(b)) => a.location.file == b.location.file,
        _ => false,
    }
}

/// Whether every reference in `references` is made from inside the
/// top-level declaration enclosing `id`.
fn referenced_only_within_top_level(graph: &Graph, id: DeclId, references: &[RefId]) -> bool {
    let top = graph.top_level_ancestor(id);
    references.iter().all(|r| {
        graph
            .referencing_declaration(*r)
            .is_some_and(|owner| graph.top_level_ancestor(owner) == top)
    })
}

/// `public` declarations never used from another module.
pub struct RedundantPublicAccessibilityMarker;

impl RedundantPublicAccessibilityMarker {
    const INLINABLE_ATTRIBUTES: [&'static str; 2] = ["inlinable", "usableFromInline"];

    pub fn new() -> Self {
        Self
    }

    /// Whether a reference comes from outside the modules of `id`, without a
    /// `@testable` import of one of them.
    fn is_cross_module(graph: &Graph, id: DeclId, reference: RefId) -> bool {
        let (Some(decl), Some(reference)) = (graph.declaration(id), graph.reference(reference)) else {
            return false;
        };
        let declared_in = graph.modules_of_file(&decl.location.file);
        let referenced_from = graph.modules_of_file(&reference.location.file);
        if referenced_from.is_subset(&declared_in) {
            return false;
        }

        let testable = graph
            .file(&reference.location.file)
            .is_some_and(|file| declared_in.iter().any(|m| file.imports_testable(m)));
        !testable
    }

    fn is_referenced_cross_module(graph: &Graph, id: DeclId) -> bool {
        usage_references(graph, id)
            .into_iter()
            .any(|r| Self::is_cross_module(graph, id, r))
    }

    /// Whether an `@inlinable` body refers to it, which requires public or
    /// `@usableFromInline` visibility.
    fn has_inlinable_caller(graph: &Graph, id: DeclId) -> bool {
        graph.references_to(id).into_iter().any(|r| {
            let Some(owner) = graph.referencing_declaration(r) else {
                return false;
            };
            std::iter::once(owner)
                .chain(graph.ancestors(owner))
                .filter_map(|d| graph.declaration(d))
                .any(|d| Self::INLINABLE_ATTRIBUTES.iter().any(|a| d.has_attribute(a)))
        })
    }

    /// Whether it appears in the signature of public API that is exposed.
    fn is_in_exposed_signature(graph: &Graph, id: DeclId) -> bool {
        graph.references_to(id).into_iter().any(|r| {
            let is_signature = graph.reference(r).is_some_and(|r| r.role.is_signature());
            let Some(owner) = graph.referencing_declaration(r).filter(|_| is_signature) else {
                return false;
            };
            let public_owner = graph
                .declaration(owner)
                .is_some_and(|d| d.accessibility.value.is_public_or_open());
            public_owner
                && owner != id
                && (graph.is_retained(owner) || Self::is_referenced_cross_module(graph, owner))
        })
    }

    fn is_redundant(graph: &Graph, id: DeclId) -> bool {
        !Self::is_referenced_cross_module(graph, id)
            && !Self::has_inlinable_caller(graph, id)
            && !is_property_wrapper_member(graph, id)
            && !witnesses_requirement_at(graph, id, Accessibility::Public)
            && !Self::is_in_exposed_signature(graph, id)
    }
}

impl Default for RedundantPublicAccessibilityMarker {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for RedundantPublicAccessibilityMarker {
    fn name(&self) -> &'static str {
        "RedundantPublicAccessibilityMarker"
    }

    fn mutate(&self, graph: &mut Graph, config: &Config) -> Result<(), AnalysisError> {
        if config.retain_public {
            return Ok(());
        }

        let (declarations, extensions) = candidates(graph, Accessibility::Public);
        let redundant: Vec<DeclId> = declarations
            .into_iter()
            .filter(|id| Self::is_redundant(graph, *id))
            .collect();

        let mut count = redundant.len();
        for id in redundant {
            record(graph, id, Accessibility::Public, Accessibility::Internal);
        }
        count += inherit_for_extensions(graph, extensions, Accessibility::Public, |g, a, b| {
            let (Some(a), Some(b)) = (g.declaration(a), g.declaration(b)) else {
                return false;
            };
            g.modules_of_file(&a.location.file) == g.modules_of_file(&b.location.file)
        })?;

        info!("Found {} redundant public declarations", count);
        Ok(())
    }
}

/// `internal` declarations never used outside their file.
pub struct RedundantInternalAccessibilityMarker;

impl RedundantInternalAccessibilityMarker {
    pub fn new() -> Self {
        Self
    }

    /// The narrowest tier that fits, or `None` when another file needs it.
    fn suggestion(graph: &Graph, id: DeclId) -> Option<Accessibility> {
        let decl = graph.declaration(id)?;
        if is_property_wrapper_member(graph, id) || witnesses_requirement_at(graph, id, Accessibility::Internal) {
            return None;
        }

        let references = usage_references(graph, id);
        let from_other_file = references.iter().any(|r| {
            graph
                .reference(*r)
                .map_or(true, |r| r.location.file != decl.location.file)
        });
        if from_other_file {
            return None;
        }

        if referenced_only_within_top_level(graph, id, &references) {
            Some(Accessibility::Private)
        } else {
            Some(Accessibility::Fileprivate)
        }
    }
}

impl Default for RedundantInternalAccessibilityMarker {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for RedundantInternalAccessibilityMarker {
    fn name(&self) -> &'static str {
        "RedundantInternalAccessibilityMarker"
    }

    fn mutate(&self, graph: &mut Graph, _config: &Config) -> Result<(), AnalysisError> {
        let (declarations, extensions) = candidates(graph, Accessibility::Internal);
        let redundant: Vec<(DeclId, Accessibility)> = declarations
            .into_iter()
            .filter_map(|id| Self::suggestion(graph, id).map(|s| (id, s)))
            .collect();

        let mut count = redundant.len();
        for (id, suggested) in redundant {
            record(graph, id, Accessibility::Internal, suggested);
        }
        count += inherit_for_extensions(graph, extensions, Accessibility::Internal, same_file)?;

        info!("Found {} redundant internal declarations", count);
        Ok(())
    }
}

/// `fileprivate` declarations only used inside their own top-level type.
pub struct RedundantFilePrivateAccessibilityMarker;

impl RedundantFilePrivateAccessibilityMarker {
    pub fn new() -> Self {
        Self
    }

    fn is_redundant(graph: &Graph, id: DeclId) -> bool {
        if is_property_wrapper_member(graph, id) || witnesses_requirement_at(graph, id, Accessibility::Fileprivate) {
            return false;
        }
        let references = usage_references(graph, id);
        let owners: BTreeSet<Option<DeclId>> = references
            .iter()
            .map(|r| graph.referencing_declaration(*r))
            .collect();
        !owners.contains(&None) && referenced_only_within_top_level(graph, id, &references)
    }
}

impl Default for RedundantFilePrivateAccessibilityMarker {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for RedundantFilePrivateAccessibilityMarker {
    fn name(&self) -> &'static str {
        "RedundantFilePrivateAccessibilityMarker"
    }

    fn mutate(&self, graph: &mut Graph, _config: &Config) -> Result<(), AnalysisError> {
        let (declarations, extensions) = candidates(graph, Accessibility::Fileprivate);
        let redundant: Vec<DeclId> = declarations
            .into_iter()
            .filter(|id| Self::is_redundant(graph, *id))
            .collect();

        let mut count = redundant.len();
        for id in redundant {
            record(graph, id, Accessibility::Fileprivate, Accessibility::Private);
        }
        count += inherit_for_extensions(graph, extensions, Accessibility::Fileprivate, same_file)?;

        info!("Found {} redundant fileprivate declarations", count);
        Ok(())
    }
}
