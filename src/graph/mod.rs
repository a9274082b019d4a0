// Graph store: arena-held declarations and references plus the indices and
// result sets the mutator pipeline reads and writes.

mod builder;
mod declaration;
mod kind;
mod parallel_builder;
pub mod reference;
mod source;
mod traversal;

pub use builder::{DeclarationNode, GraphBuilder, GraphFragment, GraphInput, ReferenceNode};
pub use declaration::{
    Accessibility, CommentCommand, DeclId, Declaration, DeclaredAccessibility, Location,
};
pub use kind::{DeclarationKind, KindFamily};
pub use parallel_builder::ParallelGraphBuilder;
pub use reference::{RefId, RefParent, Reference, ReferenceKey, ReferenceRole};
pub use source::{AssetReference, AssetSource, ImportStatement, SourceFile};

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Flags a declaration can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mark {
    /// Forced alive regardless of usage evidence
    Retained,
    /// Reachable from a root
    Used,
    /// Suppressed from reporting
    Ignored,
    /// Only ever written through its setter
    AssignOnly,
}

/// A protocol that is only ever conformed to, never used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedundantProtocol {
    /// Conformance clauses naming the protocol
    pub references: BTreeSet<RefId>,
    /// Protocols the redundant protocol inherits
    pub inherited: BTreeSet<RefId>,
}

/// An explicit accessibility tier broader than its usage requires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedundantAccessibility {
    pub declared: Accessibility,
    /// Narrowest tier that still satisfies every reference
    pub suggested: Accessibility,
    pub modules: BTreeSet<String>,
    pub file: PathBuf,
}

/// An import statement none of whose module's declarations are referenced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnusedImport {
    pub module: String,
    pub location: Location,
}

/// The declaration graph for one analysis run.
///
/// Mutation takes `&mut self`, so the borrow checker serializes writers.
/// Ingestion workers that run in parallel share the graph through a single
/// `Mutex` (see [`ParallelGraphBuilder`]); queries never lock.
#[derive(Debug, Default)]
pub struct Graph {
    declarations: Vec<Option<Declaration>>,
    references: Vec<Option<Reference>>,

    declarations_by_usr: HashMap<String, Vec<DeclId>>,
    declarations_by_kind: HashMap<DeclarationKind, BTreeSet<DeclId>>,
    references_by_usr: HashMap<String, BTreeSet<RefId>>,

    root_declarations: BTreeSet<DeclId>,
    root_references: BTreeSet<RefId>,

    retained: BTreeSet<DeclId>,
    used: BTreeSet<DeclId>,
    ignored: BTreeSet<DeclId>,
    assign_only: BTreeSet<DeclId>,

    folded_extensions: BTreeMap<DeclId, DeclId>,
    redundant_protocols: BTreeMap<DeclId, RedundantProtocol>,
    redundant_accessibility: BTreeMap<DeclId, RedundantAccessibility>,
    unused_imports: BTreeSet<UnusedImport>,

    files: BTreeMap<PathBuf, SourceFile>,
    module_exports: BTreeMap<String, BTreeSet<String>>,
    asset_references: BTreeSet<AssetReference>,
}

impl Graph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Files and module metadata
    // ------------------------------------------------------------------

    /// Register a source file. A file seen again (compiled into another
    /// module) has its modules and imports merged.
    pub fn add_file(&mut self, file: SourceFile) {
        match self.files.get_mut(&file.path) {
            Some(existing) => {
                existing.modules.extend(file.modules);
                for import in file.imports {
                    if !existing.imports.contains(&import) {
                        existing.imports.push(import);
                    }
                }
                for command in file.comment_commands {
                    if !existing.comment_commands.contains(&command) {
                        existing.comment_commands.push(command);
                    }
                }
            }
            None => {
                self.files.insert(file.path.clone(), file);
            }
        }
    }

    pub fn file(&self, path: &Path) -> Option<&SourceFile> {
        self.files.get(path)
    }

    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.values()
    }

    /// Modules a file is compiled into; empty for unknown files.
    pub fn modules_of_file(&self, path: &Path) -> BTreeSet<String> {
        self.files
            .get(path)
            .map(|file| file.modules.clone())
            .unwrap_or_default()
    }

    /// Every module with at least one indexed file.
    pub fn indexed_modules(&self) -> BTreeSet<String> {
        self.files
            .values()
            .flat_map(|file| file.modules.iter().cloned())
            .collect()
    }

    /// Record that `module` re-exports `exported` (`@_exported import`).
    pub fn add_module_export(&mut self, module: impl Into<String>, exported: impl Into<String>) {
        self.module_exports
            .entry(module.into())
            .or_default()
            .insert(exported.into());
    }

    /// Modules directly re-exported by `module`.
    pub fn exported_modules(&self, module: &str) -> impl Iterator<Item = &String> {
        self.module_exports.get(module).into_iter().flatten()
    }

    pub fn add_asset_reference(&mut self, reference: AssetReference) {
        self.asset_references.insert(reference);
    }

    pub fn asset_references(&self) -> &BTreeSet<AssetReference> {
        &self.asset_references
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    /// Add a declaration under `parent`, or as a root when `parent` is `None`.
    pub fn add_declaration(&mut self, mut decl: Declaration, parent: Option<DeclId>) -> DeclId {
        let id = DeclId(self.declarations.len() as u32);

        decl.parent = parent;
        decl.declarations.clear();
        decl.unused_parameters.clear();
        decl.references.clear();
        decl.related.clear();

        for usr in &decl.usrs {
            self.declarations_by_usr
                .entry(usr.clone())
                .or_default()
                .push(id);
        }
        self.declarations_by_kind
            .entry(decl.kind)
            .or_default()
            .insert(id);

        match parent.and_then(|p| self.declaration_mut(p)) {
            Some(parent_decl) => {
                parent_decl.declarations.insert(id);
            }
            None => {
                decl.parent = None;
                self.root_declarations.insert(id);
            }
        }

        self.declarations.push(Some(decl));
        id
    }

    /// Add a parameter the front end found unused in `function`'s own body.
    pub fn add_unused_parameter(&mut self, mut param: Declaration, function: DeclId) -> DeclId {
        param.kind = DeclarationKind::VarParameter;
        let id = self.add_declaration(param, Some(function));

        if let Some(function_decl) = self.declaration_mut(function) {
            function_decl.declarations.remove(&id);
            function_decl.unused_parameters.insert(id);
        }

        id
    }

    /// Give an existing declaration an additional identifier.
    pub(crate) fn add_usr(&mut self, id: DeclId, usr: String) {
        let Some(decl) = self.declaration_mut(id) else {
            return;
        };
        if decl.usrs.insert(usr.clone()) {
            self.declarations_by_usr.entry(usr).or_default().push(id);
        }
    }

    /// Remove a declaration, its nested declarations and every reference it owns.
    pub fn remove_declaration(&mut self, id: DeclId) {
        let Some(decl) = self.declarations.get_mut(id.index()).and_then(Option::take) else {
            return;
        };

        match decl.parent.and_then(|p| self.declaration_mut(p)) {
            Some(parent) => {
                parent.declarations.remove(&id);
                parent.unused_parameters.remove(&id);
            }
            None => {
                self.root_declarations.remove(&id);
            }
        }

        for usr in &decl.usrs {
            if let Some(ids) = self.declarations_by_usr.get_mut(usr) {
                ids.retain(|other| *other != id);
                if ids.is_empty() {
                    self.declarations_by_usr.remove(usr);
                }
            }
        }
        if let Some(ids) = self.declarations_by_kind.get_mut(&decl.kind) {
            ids.remove(&id);
        }

        self.retained.remove(&id);
        self.used.remove(&id);
        self.ignored.remove(&id);
        self.assign_only.remove(&id);

        for reference in decl.references.iter().chain(decl.related.iter()) {
            self.remove_reference(*reference);
        }
        for child in decl.declarations.iter().chain(decl.unused_parameters.iter()) {
            self.remove_declaration(*child);
        }
    }

    /// Reparent a declaration under `new_parent`.
    pub fn move_declaration(&mut self, id: DeclId, new_parent: DeclId) {
        let Some(old_parent) = self.declaration(id).map(|d| d.parent) else {
            return;
        };
        if self.declaration(new_parent).is_none() {
            return;
        }

        let was_parameter = match old_parent.and_then(|p| self.declaration_mut(p)) {
            Some(parent) => {
                parent.declarations.remove(&id);
                parent.unused_parameters.remove(&id)
            }
            None => {
                self.root_declarations.remove(&id);
                false
            }
        };

        if let Some(parent) = self.declaration_mut(new_parent) {
            if was_parameter {
                parent.unused_parameters.insert(id);
            } else {
                parent.declarations.insert(id);
            }
        }
        if let Some(decl) = self.declaration_mut(id) {
            decl.parent = Some(new_parent);
        }
    }

    /// Get a declaration by handle
    pub fn declaration(&self, id: DeclId) -> Option<&Declaration> {
        self.declarations.get(id.index()).and_then(Option::as_ref)
    }

    /// Mutable access for attribute updates. Callers must not change `kind`
    /// or `usrs`, which are indexed.
    pub(crate) fn declaration_mut(&mut self, id: DeclId) -> Option<&mut Declaration> {
        self.declarations.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Set the accessibility of a declaration.
    pub fn set_accessibility(&mut self, id: DeclId, accessibility: DeclaredAccessibility) {
        if let Some(decl) = self.declaration_mut(id) {
            decl.accessibility = accessibility;
        }
    }

    /// Get all declarations
    pub fn declarations(&self) -> impl Iterator<Item = (DeclId, &Declaration)> {
        self.declarations
            .iter()
            .enumerate()
            .filter_map(|(index, decl)| decl.as_ref().map(|d| (DeclId(index as u32), d)))
    }

    /// Get the number of declarations
    pub fn declaration_count(&self) -> usize {
        self.declarations.iter().filter(|d| d.is_some()).count()
    }

    /// Declarations of one kind, in deterministic order.
    pub fn declarations_of_kind(&self, kind: DeclarationKind) -> Vec<DeclId> {
        self.declarations_of_kinds(&[kind])
    }

    /// Declarations of any of the given kinds, in deterministic order.
    pub fn declarations_of_kinds(&self, kinds: &[DeclarationKind]) -> Vec<DeclId> {
        let ids = kinds
            .iter()
            .filter_map(|kind| self.declarations_by_kind.get(kind))
            .flatten()
            .copied();
        self.sorted_declarations(ids)
    }

    /// Declarations without a parent.
    pub fn root_declarations(&self) -> &BTreeSet<DeclId> {
        &self.root_declarations
    }

    /// Declaration for an identifier, explicit declarations first, ties
    /// broken by sort order rather than insertion order.
    pub fn declaration_with_usr(&self, usr: &str) -> Option<DeclId> {
        self.explicit_declaration_with_usr(usr).or_else(|| {
            let ids = self.declarations_by_usr.get(usr)?;
            self.sorted_declarations(ids.iter().copied()).into_iter().next()
        })
    }

    /// Every declaration carrying an identifier, in sort order.
    pub fn declarations_with_usr(&self, usr: &str) -> Vec<DeclId> {
        match self.declarations_by_usr.get(usr) {
            Some(ids) => self.sorted_declarations(ids.iter().copied()),
            None => Vec::new(),
        }
    }

    /// First non-implicit declaration for an identifier in sort order.
    pub fn explicit_declaration_with_usr(&self, usr: &str) -> Option<DeclId> {
        let ids = self.declarations_by_usr.get(usr)?;
        let explicit = ids
            .iter()
            .copied()
            .filter(|id| self.declaration(*id).is_some_and(|d| !d.is_implicit));
        self.sorted_declarations(explicit).into_iter().next()
    }

    /// Sort declaration handles by [`Declaration::sort_key`], dropping stale handles.
    pub fn sorted_declarations(&self, ids: impl IntoIterator<Item = DeclId>) -> Vec<DeclId> {
        let mut keyed: Vec<_> = ids
            .into_iter()
            .filter_map(|id| self.declaration(id).map(|d| (d.sort_key(), id)))
            .collect();
        keyed.sort();
        keyed.dedup_by(|a, b| a.1 == b.1);
        keyed.into_iter().map(|(_, id)| id).collect()
    }

    // ------------------------------------------------------------------
    // References
    // ------------------------------------------------------------------

    /// Add a reference owned by `parent`, or a root reference when `parent`
    /// is `None`. Adding a reference equal to one the parent already owns
    /// returns the existing handle.
    pub fn add_reference(&mut self, mut reference: Reference, parent: Option<RefParent>) -> RefId {
        let key = reference.key();
        if let Some(existing) = self.find_equal_reference(&key, parent) {
            return existing;
        }

        let id = RefId(self.references.len() as u32);
        reference.parent = parent;
        reference.references.clear();

        self.references_by_usr
            .entry(reference.usr.clone())
            .or_default()
            .insert(id);

        let is_related = reference.is_related;
        let attached = match parent {
            Some(RefParent::Declaration(decl_id)) => match self.declaration_mut(decl_id) {
                Some(decl) => {
                    if is_related {
                        decl.related.insert(id);
                    } else {
                        decl.references.insert(id);
                    }
                    true
                }
                None => false,
            },
            Some(RefParent::Reference(ref_id)) => match self.reference_mut(ref_id) {
                Some(parent_ref) => {
                    parent_ref.references.insert(id);
                    true
                }
                None => false,
            },
            None => false,
        };
        if !attached {
            reference.parent = None;
            self.root_references.insert(id);
        }

        self.references.push(Some(reference));
        id
    }

    fn find_equal_reference(&self, key: &ReferenceKey, parent: Option<RefParent>) -> Option<RefId> {
        self.references_by_usr
            .get(&key.usr)?
            .iter()
            .copied()
            .find(|id| {
                self.reference(*id)
                    .is_some_and(|r| r.parent == parent && r.key() == *key)
            })
    }

    /// Remove a reference and everything nested under it.
    pub fn remove_reference(&mut self, id: RefId) {
        let Some(reference) = self.references.get_mut(id.index()).and_then(Option::take) else {
            return;
        };

        match reference.parent {
            Some(RefParent::Declaration(decl_id)) => {
                if let Some(decl) = self.declaration_mut(decl_id) {
                    decl.references.remove(&id);
                    decl.related.remove(&id);
                }
            }
            Some(RefParent::Reference(ref_id)) => {
                if let Some(parent_ref) = self.reference_mut(ref_id) {
                    parent_ref.references.remove(&id);
                }
            }
            None => {
                self.root_references.remove(&id);
            }
        }

        if let Some(ids) = self.references_by_usr.get_mut(&reference.usr) {
            ids.remove(&id);
            if ids.is_empty() {
                self.references_by_usr.remove(&reference.usr);
            }
        }

        for nested in &reference.references {
            self.remove_reference(*nested);
        }
    }

    /// Reparent a reference under a declaration. If the new parent already
    /// owns an equal reference the moved one is dropped instead.
    pub fn move_reference(&mut self, id: RefId, new_parent: DeclId) {
        let Some(reference) = self.reference(id) else {
            return;
        };
        if self.declaration(new_parent).is_none() {
            return;
        }

        let key = reference.key();
        let old_parent = reference.parent;
        let is_related = reference.is_related;
        let target = Some(RefParent::Declaration(new_parent));

        if old_parent == target {
            return;
        }
        if self.find_equal_reference(&key, target).is_some() {
            self.remove_reference(id);
            return;
        }

        match old_parent {
            Some(RefParent::Declaration(decl_id)) => {
                if let Some(decl) = self.declaration_mut(decl_id) {
                    decl.references.remove(&id);
                    decl.related.remove(&id);
                }
            }
            Some(RefParent::Reference(ref_id)) => {
                if let Some(parent_ref) = self.reference_mut(ref_id) {
                    parent_ref.references.remove(&id);
                }
            }
            None => {
                self.root_references.remove(&id);
            }
        }

        if let Some(decl) = self.declaration_mut(new_parent) {
            if is_related {
                decl.related.insert(id);
            } else {
                decl.references.insert(id);
            }
        }
        if let Some(reference) = self.reference_mut(id) {
            reference.parent = target;
        }
    }

    /// Get a reference by handle
    pub fn reference(&self, id: RefId) -> Option<&Reference> {
        self.references.get(id.index()).and_then(Option::as_ref)
    }

    fn reference_mut(&mut self, id: RefId) -> Option<&mut Reference> {
        self.references.get_mut(id.index()).and_then(Option::as_mut)
    }

    /// Get all references
    pub fn references(&self) -> impl Iterator<Item = (RefId, &Reference)> {
        self.references
            .iter()
            .enumerate()
            .filter_map(|(index, r)| r.as_ref().map(|r| (RefId(index as u32), r)))
    }

    /// Get the number of references
    pub fn reference_count(&self) -> usize {
        self.references.iter().filter(|r| r.is_some()).count()
    }

    /// References without a parent: top-level usage.
    pub fn root_references(&self) -> &BTreeSet<RefId> {
        &self.root_references
    }

    /// All references to an identifier, in deterministic order.
    pub fn references_to_usr(&self, usr: &str) -> Vec<RefId> {
        let ids = self.references_by_usr.get(usr).into_iter().flatten().copied();
        self.sorted_references(ids)
    }

    /// All references to any identifier of a declaration.
    pub fn references_to(&self, id: DeclId) -> Vec<RefId> {
        let Some(decl) = self.declaration(id) else {
            return Vec::new();
        };
        let ids = decl
            .usrs
            .iter()
            .filter_map(|usr| self.references_by_usr.get(usr))
            .flatten()
            .copied();
        self.sorted_references(ids)
    }

    /// Check if a declaration is referenced by anything
    pub fn is_referenced(&self, id: DeclId) -> bool {
        self.declaration(id).is_some_and(|decl| {
            decl.usrs
                .iter()
                .any(|usr| self.references_by_usr.get(usr).is_some_and(|ids| !ids.is_empty()))
        })
    }

    /// Sort reference handles by location, dropping stale handles.
    pub fn sorted_references(&self, ids: impl IntoIterator<Item = RefId>) -> Vec<RefId> {
        let mut keyed: Vec<_> = ids
            .into_iter()
            .filter_map(|id| self.reference(id).map(|r| (r.sort_key(), id)))
            .collect();
        keyed.sort();
        keyed.dedup_by(|a, b| a.1 == b.1);
        keyed.into_iter().map(|(_, id)| id).collect()
    }

    /// The declaration that owns a reference, walking out of nested references.
    pub fn referencing_declaration(&self, id: RefId) -> Option<DeclId> {
        let mut current = id;
        let mut steps = 0;
        loop {
            match self.reference(current)?.parent? {
                RefParent::Declaration(decl_id) => return Some(decl_id),
                RefParent::Reference(parent) => current = parent,
            }
            steps += 1;
            if steps > self.references.len() {
                return None;
            }
        }
    }

    /// A reference followed by everything nested under it, depth first.
    pub fn reference_tree(&self, id: RefId) -> Vec<RefId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        let mut seen = BTreeSet::new();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            if let Some(reference) = self.reference(current) {
                out.push(current);
                stack.extend(reference.references.iter().rev().copied());
            }
        }
        out
    }

    /// Every reference a declaration makes, ordinary and related, including nested ones.
    pub fn references_from(&self, id: DeclId) -> Vec<RefId> {
        let Some(decl) = self.declaration(id) else {
            return Vec::new();
        };
        decl.references
            .iter()
            .chain(decl.related.iter())
            .flat_map(|r| self.reference_tree(*r))
            .collect()
    }

    // ------------------------------------------------------------------
    // Marks and results
    // ------------------------------------------------------------------

    pub fn mark(&mut self, id: DeclId, mark: Mark) {
        if self.declaration(id).is_none() {
            return;
        }
        let set = match mark {
            Mark::Retained => &mut self.retained,
            Mark::Used => &mut self.used,
            Mark::Ignored => &mut self.ignored,
            Mark::AssignOnly => &mut self.assign_only,
        };
        set.insert(id);
    }

    pub fn is_marked(&self, id: DeclId, mark: Mark) -> bool {
        match mark {
            Mark::Retained => self.retained.contains(&id),
            Mark::Used => self.used.contains(&id),
            Mark::Ignored => self.ignored.contains(&id),
            Mark::AssignOnly => self.assign_only.contains(&id),
        }
    }

    pub fn is_retained(&self, id: DeclId) -> bool {
        self.retained.contains(&id)
    }

    pub fn is_used(&self, id: DeclId) -> bool {
        self.used.contains(&id)
    }

    pub fn is_ignored(&self, id: DeclId) -> bool {
        self.ignored.contains(&id)
    }

    pub fn retained(&self) -> &BTreeSet<DeclId> {
        &self.retained
    }

    pub fn used(&self) -> &BTreeSet<DeclId> {
        &self.used
    }

    pub fn ignored(&self) -> &BTreeSet<DeclId> {
        &self.ignored
    }

    pub fn assign_only_properties(&self) -> &BTreeSet<DeclId> {
        &self.assign_only
    }

    /// `all − used − ignored`, in deterministic order.
    pub fn unused_declarations(&self) -> Vec<DeclId> {
        let ids = self
            .declarations()
            .map(|(id, _)| id)
            .filter(|id| !self.used.contains(id) && !self.ignored.contains(id));
        self.sorted_declarations(ids)
    }

    pub fn mark_extension_folded(&mut self, extension: DeclId, into: DeclId) {
        self.folded_extensions.insert(extension, into);
    }

    /// Removed extension handles and the declarations they were folded into.
    pub fn folded_extensions(&self) -> &BTreeMap<DeclId, DeclId> {
        &self.folded_extensions
    }

    pub fn mark_redundant_protocol(&mut self, id: DeclId, redundant: RedundantProtocol) {
        self.redundant_protocols.insert(id, redundant);
    }

    pub fn redundant_protocols(&self) -> &BTreeMap<DeclId, RedundantProtocol> {
        &self.redundant_protocols
    }

    pub fn mark_redundant_accessibility(&mut self, id: DeclId, redundant: RedundantAccessibility) {
        self.redundant_accessibility.insert(id, redundant);
    }

    pub fn redundant_accessibility(&self) -> &BTreeMap<DeclId, RedundantAccessibility> {
        &self.redundant_accessibility
    }

    /// Redundant accessibility results for one declared tier.
    pub fn redundant_accessibility_of(
        &self,
        declared: Accessibility,
    ) -> impl Iterator<Item = (&DeclId, &RedundantAccessibility)> {
        self.redundant_accessibility
            .iter()
            .filter(move |(_, r)| r.declared == declared)
    }

    pub fn mark_unused_import(&mut self, import: UnusedImport) {
        self.unused_imports.insert(import);
    }

    pub fn unused_imports(&self) -> &BTreeSet<UnusedImport> {
        &self.unused_imports
    }
}
