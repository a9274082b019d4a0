use crate::analysis::Mutator;
use crate::config::Config;
use crate::error::AnalysisError;
use crate::graph::{DeclId, Declaration, DeclarationKind, Graph, RefParent, Reference};
use tracing::{debug, warn};

fn reference_to(decl: &Declaration) -> Reference {
    Reference::new(decl.kind, decl.first_usr(), decl.location.clone()).with_name(decl.name())
}

fn members_where(graph: &Graph, owner: DeclId, predicate: impl Fn(&Declaration) -> bool) -> Vec<DeclId> {
    let Some(decl) = graph.declaration(owner) else {
        return Vec::new();
    };
    let ids = decl
        .declarations()
        .iter()
        .copied()
        .filter(|id| graph.declaration(*id).is_some_and(&predicate));
    graph.sorted_declarations(ids)
}

fn add_references(graph: &mut Graph, from: DeclId, targets: &[DeclId]) {
    let references: Vec<Reference> = targets
        .iter()
        .filter_map(|t| graph.declaration(*t))
        .map(reference_to)
        .collect();
    for reference in references {
        graph.add_reference(reference, Some(RefParent::Declaration(from)));
    }
}

/// Types reference their parameterless constructors and destructor, which
/// the runtime invokes without a visible call site.
pub struct DefaultConstructorReferenceBuilder;

impl DefaultConstructorReferenceBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DefaultConstructorReferenceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for DefaultConstructorReferenceBuilder {
    fn name(&self) -> &'static str {
        "DefaultConstructorReferenceBuilder"
    }

    fn mutate(&self, graph: &mut Graph, _config: &Config) -> Result<(), AnalysisError> {
        for owner in graph.declarations_of_kinds(&[DeclarationKind::Class, DeclarationKind::Struct]) {
            let targets = members_where(graph, owner, |m| {
                (m.kind == DeclarationKind::FunctionConstructor && m.name() == "init()")
                    || m.kind == DeclarationKind::FunctionDestructor
            });
            add_references(graph, owner, &targets);
        }
        Ok(())
    }
}

/// A struct's synthesized memberwise initializer assigns the stored
/// properties named by its labels. It references their setters, so the
/// assignment counts as a write and not as a read.
pub struct StructImplicitInitializerReferenceBuilder;

impl StructImplicitInitializerReferenceBuilder {
    pub fn new() -> Self {
        Self
    }

    fn assigned_targets(&self, graph: &Graph, owner: DeclId, initializer: DeclId) -> Vec<DeclId> {
        let Some(init) = graph.declaration(initializer) else {
            return Vec::new();
        };
        let Some(labels) = init.argument_labels() else {
            warn!("Skipping initializer with malformed name {}", init.display());
            return Vec::new();
        };

        let mut targets = Vec::new();
        for label in labels {
            let property = members_where(graph, owner, |m| {
                m.kind == DeclarationKind::VarInstance && m.name() == label
            });
            let Some(property) = property.first().copied() else {
                continue;
            };
            let setter = members_where(graph, property, |m| m.kind == DeclarationKind::FunctionAccessorSetter);
            targets.push(setter.first().copied().unwrap_or(property));
        }
        targets
    }
}

impl Default for StructImplicitInitializerReferenceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for StructImplicitInitializerReferenceBuilder {
    fn name(&self) -> &'static str {
        "StructImplicitInitializerReferenceBuilder"
    }

    fn mutate(&self, graph: &mut Graph, _config: &Config) -> Result<(), AnalysisError> {
        for owner in graph.declarations_of_kind(DeclarationKind::Struct) {
            let initializers = members_where(graph, owner, |m| {
                m.kind == DeclarationKind::FunctionConstructor && m.is_implicit
            });
            for initializer in initializers {
                let targets = self.assigned_targets(graph, owner, initializer);
                debug!("Implicit initializer assigns {} properties", targets.len());
                add_references(graph, initializer, &targets);
            }
        }
        Ok(())
    }
}

/// Generic classes and structs reference their constructors: a call like
/// `Box<Int>(value)` is indexed against the type, not the initializer.
pub struct GenericTypeConstructorReferenceBuilder;

impl GenericTypeConstructorReferenceBuilder {
    pub fn new() -> Self {
        Self
    }
}

impl Default for GenericTypeConstructorReferenceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for GenericTypeConstructorReferenceBuilder {
    fn name(&self) -> &'static str {
        "GenericTypeConstructorReferenceBuilder"
    }

    fn mutate(&self, graph: &mut Graph, _config: &Config) -> Result<(), AnalysisError> {
        for owner in graph.declarations_of_kinds(&[DeclarationKind::Class, DeclarationKind::Struct]) {
            let is_generic = !members_where(graph, owner, |m| m.kind == DeclarationKind::GenericTypeParam).is_empty();
            if !is_generic {
                continue;
            }
            let constructors = members_where(graph, owner, |m| m.kind == DeclarationKind::FunctionConstructor);
            add_references(graph, owner, &constructors);
        }
        Ok(())
    }
}
