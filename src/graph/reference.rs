use super::{DeclId, DeclarationKind, Location};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Arena handle of a reference inside one [`Graph`](super::Graph).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RefId(pub(crate) u32);

impl RefId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Syntactic position of a usage reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceRole {
    /// No more specific role could be derived
    #[default]
    Unknown,

    /// Type annotation of a variable
    VarType,

    /// Return type of a function
    ReturnType,

    /// Type of a function parameter
    ParameterType,

    /// Generic parameter type, e.g. `T: Foo`
    GenericParameterType,

    /// Type named in a `where` clause
    GenericRequirementType,

    /// Superclass or conformed protocol in an inheritance clause
    InheritedType,

    /// Protocol named in another protocol's inheritance clause
    RefinedProtocolType,

    /// Function call used as a variable initializer
    VariableInitFunctionCall,

    /// Metatype passed as a function argument, e.g. `register(Foo.self)`
    FunctionCallMetatypeArgument,

    /// The type named by an extension
    ExtendedType,
}

impl ReferenceRole {
    /// Roles that appear in a declaration's public signature.
    pub fn is_signature(&self) -> bool {
        matches!(
            self,
            ReferenceRole::VarType
                | ReferenceRole::ReturnType
                | ReferenceRole::ParameterType
                | ReferenceRole::GenericParameterType
                | ReferenceRole::GenericRequirementType
                | ReferenceRole::InheritedType
                | ReferenceRole::RefinedProtocolType
        )
    }

    /// Roles that name a type in an inheritance or conformance clause.
    pub fn is_conformance(&self) -> bool {
        matches!(
            self,
            ReferenceRole::InheritedType | ReferenceRole::RefinedProtocolType
        )
    }
}

/// Owner of a reference: a declaration, or an enclosing reference for
/// references nested inside expressions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RefParent {
    Declaration(DeclId),
    Reference(RefId),
}

/// Identity of a reference; two references with equal keys are the same edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReferenceKey {
    pub usr: String,
    pub location: Location,
    pub is_related: bool,
}

/// A directed edge to the identifier of a declaration
#[derive(Debug, Clone)]
pub struct Reference {
    /// Kind of the referenced declaration
    pub kind: DeclarationKind,

    /// Identifier of the referenced declaration
    pub usr: String,

    /// Name used at the reference site
    pub name: Option<String>,

    /// Location where the reference occurs
    pub location: Location,

    pub role: ReferenceRole,

    /// Structural relation (inheritance, conformance, override) rather than usage
    pub is_related: bool,

    pub(crate) parent: Option<RefParent>,
    pub(crate) references: BTreeSet<RefId>,
}

impl Reference {
    pub fn new(kind: DeclarationKind, usr: impl Into<String>, location: Location) -> Self {
        Self {
            kind,
            usr: usr.into(),
            name: None,
            location,
            role: ReferenceRole::Unknown,
            is_related: false,
            parent: None,
            references: BTreeSet::new(),
        }
    }

    /// A structural reference.
    pub fn related(kind: DeclarationKind, usr: impl Into<String>, location: Location) -> Self {
        Self::new(kind, usr, location).with_related(true)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_role(mut self, role: ReferenceRole) -> Self {
        self.role = role;
        self
    }

    pub fn with_related(mut self, related: bool) -> Self {
        self.is_related = related;
        self
    }

    pub fn parent(&self) -> Option<RefParent> {
        self.parent
    }

    /// References nested under this one.
    pub fn references(&self) -> &BTreeSet<RefId> {
        &self.references
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    pub fn key(&self) -> ReferenceKey {
        ReferenceKey {
            usr: self.usr.clone(),
            location: self.location.clone(),
            is_related: self.is_related,
        }
    }

    /// Deterministic ordering independent of insertion order.
    pub fn sort_key(&self) -> (&Location, &str, bool) {
        (&self.location, self.usr.as_str(), self.is_related)
    }
}
