// Derived read-only queries over the declaration tree and inheritance edges.
// Every walk carries a visited set; inheritance data may contain cycles.

use super::{DeclId, DeclarationKind, Graph, RefId, ReferenceRole};
use crate::error::AnalysisError;
use std::collections::{BTreeSet, VecDeque};

impl Graph {
    /// Enclosing declarations, nearest first.
    pub fn ancestors(&self, id: DeclId) -> Vec<DeclId> {
        let mut out = Vec::new();
        let mut visited = BTreeSet::from([id]);
        let mut current = self.declaration(id).and_then(|d| d.parent());

        while let Some(parent) = current {
            if !visited.insert(parent) {
                break;
            }
            out.push(parent);
            current = self.declaration(parent).and_then(|d| d.parent());
        }

        out
    }

    /// The outermost enclosing declaration, or `id` itself for a root.
    pub fn top_level_ancestor(&self, id: DeclId) -> DeclId {
        self.ancestors(id).last().copied().unwrap_or(id)
    }

    /// Nested declarations and unused parameters, recursively, in sort order.
    pub fn descendants(&self, id: DeclId) -> Vec<DeclId> {
        let mut visited = BTreeSet::from([id]);
        let mut stack = vec![id];
        let mut out = Vec::new();

        while let Some(current) = stack.pop() {
            let Some(decl) = self.declaration(current) else {
                continue;
            };
            for child in decl.declarations().iter().chain(decl.unused_parameters()) {
                if visited.insert(*child) {
                    out.push(*child);
                    stack.push(*child);
                }
            }
        }

        self.sorted_declarations(out)
    }

    /// Whether `id` sits directly inside a protocol.
    pub fn is_protocol_member(&self, id: DeclId) -> bool {
        self.declaration(id)
            .and_then(|d| d.parent())
            .and_then(|p| self.declaration(p))
            .is_some_and(|p| p.kind == DeclarationKind::Protocol)
    }

    /// Inheritance-clause references of a type: structural edges to classes
    /// and protocols plus usage references tagged with an inheritance role.
    pub fn inherited_type_references(&self, id: DeclId) -> Vec<RefId> {
        let Some(decl) = self.declaration(id) else {
            return Vec::new();
        };

        let ids = decl
            .related()
            .iter()
            .chain(decl.references())
            .copied()
            .filter(|r| {
                self.reference(*r).is_some_and(|reference| {
                    matches!(
                        reference.kind,
                        DeclarationKind::Class | DeclarationKind::Protocol
                    ) && (reference.role.is_conformance()
                        || (reference.is_related && reference.role == ReferenceRole::Unknown))
                })
            });

        self.sorted_references(ids)
    }

    /// Direct superclasses declared in the graph.
    fn immediate_superclasses(&self, id: DeclId) -> Vec<DeclId> {
        let ids = self
            .inherited_type_references(id)
            .into_iter()
            .filter_map(|r| self.reference(r))
            .filter(|r| r.kind == DeclarationKind::Class)
            .filter_map(|r| self.explicit_declaration_with_usr(&r.usr))
            .filter(|d| *d != id);
        self.sorted_declarations(ids)
    }

    /// Superclass chain, nearest first.
    pub fn superclasses(&self, id: DeclId) -> Vec<DeclId> {
        let mut visited = BTreeSet::from([id]);
        let mut queue = VecDeque::from([id]);
        let mut out = Vec::new();

        while let Some(current) = queue.pop_front() {
            for superclass in self.immediate_superclasses(current) {
                if visited.insert(superclass) {
                    out.push(superclass);
                    queue.push_back(superclass);
                }
            }
        }

        out
    }

    /// Classes that name `id` in their inheritance clause.
    pub fn immediate_subclasses(&self, id: DeclId) -> Vec<DeclId> {
        let ids = self
            .references_to(id)
            .into_iter()
            .filter(|r| {
                self.reference(*r).is_some_and(|reference| {
                    reference.kind == DeclarationKind::Class
                        && (reference.is_related || reference.role.is_conformance())
                })
            })
            .filter_map(|r| self.referencing_declaration(r))
            .filter(|d| {
                *d != id
                    && self
                        .declaration(*d)
                        .is_some_and(|decl| decl.kind == DeclarationKind::Class)
            });
        self.sorted_declarations(ids)
    }

    /// Every transitive subclass.
    pub fn subclasses(&self, id: DeclId) -> Vec<DeclId> {
        let mut visited = BTreeSet::from([id]);
        let mut queue = VecDeque::from([id]);
        let mut out = Vec::new();

        while let Some(current) = queue.pop_front() {
            for subclass in self.immediate_subclasses(current) {
                if visited.insert(subclass) {
                    out.push(subclass);
                    queue.push_back(subclass);
                }
            }
        }

        self.sorted_declarations(out)
    }

    /// Whether any inheritance clause in the chain of `id` names a type
    /// called `name`, whether or not that type is declared in the graph.
    pub fn inherits_from_named(&self, id: DeclId, name: &str) -> bool {
        let mut chain = vec![id];
        chain.extend(self.superclasses(id));

        chain.into_iter().any(|class| {
            self.inherited_type_references(class)
                .into_iter()
                .filter_map(|r| self.reference(r))
                .any(|r| r.name() == name)
        })
    }

    /// The reference naming the type an extension extends.
    ///
    /// Prefers a reference tagged [`ReferenceRole::ExtendedType`], then one
    /// whose name matches the extension's name, then the first candidate of
    /// the extended kind in sort order.
    pub fn extended_type_reference(&self, extension: DeclId) -> Result<Option<RefId>, AnalysisError> {
        let decl = self
            .declaration(extension)
            .ok_or(AnalysisError::MissingDeclaration(extension))?;
        let extended_kind = decl.kind.extended_kind()?;

        let candidates = self.sorted_references(
            decl.references()
                .iter()
                .chain(decl.related())
                .copied()
                .filter(|r| self.reference(*r).is_some_and(|r| r.kind == extended_kind)),
        );

        let by_role = candidates.iter().copied().find(|r| {
            self.reference(*r)
                .is_some_and(|r| r.role == ReferenceRole::ExtendedType)
        });
        let by_name = || {
            candidates.iter().copied().find(|r| {
                self.reference(*r)
                    .is_some_and(|r| !r.name().is_empty() && r.name() == decl.name())
            })
        };

        Ok(by_role
            .or_else(by_name)
            .or_else(|| candidates.first().copied()))
    }

    /// The declaration an extension extends, when it is declared in the graph.
    pub fn extended_declaration(&self, extension: DeclId) -> Result<Option<DeclId>, AnalysisError> {
        let Some(reference) = self.extended_type_reference(extension)? else {
            return Ok(None);
        };
        let reference = self
            .reference(reference)
            .ok_or(AnalysisError::MissingReference(reference))?;

        Ok(self.explicit_declaration_with_usr(&reference.usr))
    }

    /// Declarations that name `protocol` in a conformance clause.
    pub fn conforming_declarations(&self, protocol: DeclId) -> Vec<DeclId> {
        let ids = self
            .references_to(protocol)
            .into_iter()
            .filter(|r| {
                self.reference(*r)
                    .is_some_and(|r| r.is_related || r.role.is_conformance())
            })
            .filter_map(|r| self.referencing_declaration(r))
            .filter(|d| {
                self.declaration(*d).is_some_and(|decl| {
                    decl.kind.is_concrete_type()
                        || decl.kind.is_extension()
                        || decl.kind == DeclarationKind::Protocol
                })
            })
            .filter(|d| *d != protocol);
        self.sorted_declarations(ids)
    }

    /// Protocol extensions of a protocol that are still separate nodes.
    pub fn protocol_extensions(&self, protocol: DeclId) -> Vec<DeclId> {
        let ids = self
            .declarations_of_kind(DeclarationKind::ExtensionProtocol)
            .into_iter()
            .filter(|ext| matches!(self.extended_declaration(*ext), Ok(Some(p)) if p == protocol));
        self.sorted_declarations(ids)
    }
}
