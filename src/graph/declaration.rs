use super::{DeclarationKind, RefId};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Arena handle of a declaration inside one [`Graph`](super::Graph).
///
/// Handles are assigned in insertion order, which is not deterministic when
/// fragments are merged in parallel. Never use them as a tie-break; sort by
/// [`Declaration::sort_key`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DeclId(pub(crate) u32);

impl DeclId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for DeclId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "decl#{}", self.0)
    }
}

/// Lexical accessibility tiers, narrowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Accessibility {
    Private,
    Fileprivate,
    #[default]
    Internal,
    Public,
    Open,
}

impl Accessibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Accessibility::Private => "private",
            Accessibility::Fileprivate => "fileprivate",
            Accessibility::Internal => "internal",
            Accessibility::Public => "public",
            Accessibility::Open => "open",
        }
    }

    pub fn is_public_or_open(&self) -> bool {
        matches!(self, Accessibility::Public | Accessibility::Open)
    }
}

impl std::fmt::Display for Accessibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Accessibility together with whether it was written in source or
/// inherited from an enclosing declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DeclaredAccessibility {
    pub value: Accessibility,
    pub is_explicit: bool,
}

impl DeclaredAccessibility {
    pub fn explicit(value: Accessibility) -> Self {
        Self {
            value,
            is_explicit: true,
        }
    }

    pub fn implicit(value: Accessibility) -> Self {
        Self {
            value,
            is_explicit: false,
        }
    }

    pub fn is_explicitly(&self, value: Accessibility) -> bool {
        self.is_explicit && self.value == value
    }
}

/// Location in source code
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    /// File path
    pub file: PathBuf,
    /// Line number (1-indexed)
    pub line: u32,
    /// Column number (1-indexed)
    pub column: u32,
}

impl Location {
    pub fn new(file: impl Into<PathBuf>, line: u32, column: u32) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// Directive embedded in a comment next to a declaration or at the top of a file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CommentCommand {
    /// Retain the declaration and everything nested in it.
    Ignore,
    /// Retain every declaration in the file.
    IgnoreAll,
    /// Retain the named parameters of a function.
    IgnoreParameters(Vec<String>),
}

fn directive_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*swiftdeadcode:ignore(?::(all)|:parameters\s+([\w\s,]+))?\s*$")
            .expect("directive pattern is valid")
    })
}

impl CommentCommand {
    /// Parse a raw comment body such as `swiftdeadcode:ignore:parameters a, b`.
    pub fn parse(comment: &str) -> Option<Self> {
        let captures = directive_pattern().captures(comment)?;

        if captures.get(1).is_some() {
            return Some(CommentCommand::IgnoreAll);
        }

        if let Some(params) = captures.get(2) {
            let names: Vec<String> = params
                .as_str()
                .split(',')
                .map(|p| p.trim().to_string())
                .filter(|p| !p.is_empty())
                .collect();
            return Some(CommentCommand::IgnoreParameters(names));
        }

        Some(CommentCommand::Ignore)
    }
}

/// A declaration in the analyzed program
#[derive(Debug, Clone)]
pub struct Declaration {
    /// Kind of declaration
    pub kind: DeclarationKind,

    /// Unique symbol identifiers; more than one when partial definitions were unified
    pub usrs: BTreeSet<String>,

    /// Name as written, e.g. `f(a:b:)` for functions
    pub name: Option<String>,

    /// Location in source code
    pub location: Location,

    pub accessibility: DeclaredAccessibility,

    /// Attributes without the `@`, e.g. `objc`, `main`, `propertyWrapper`
    pub attributes: BTreeSet<String>,

    /// Modifiers, e.g. `override`, `static`, `final`
    pub modifiers: BTreeSet<String>,

    pub comment_commands: Vec<CommentCommand>,

    /// Synthesized by the compiler rather than written in source
    pub is_implicit: bool,

    /// Callable from the Objective-C runtime
    pub is_objc_accessible: bool,

    pub(crate) parent: Option<DeclId>,
    pub(crate) declarations: BTreeSet<DeclId>,
    pub(crate) unused_parameters: BTreeSet<DeclId>,
    pub(crate) references: BTreeSet<RefId>,
    pub(crate) related: BTreeSet<RefId>,
}

impl Declaration {
    pub fn new(kind: DeclarationKind, usr: impl Into<String>, location: Location) -> Self {
        let mut usrs = BTreeSet::new();
        usrs.insert(usr.into());

        Self {
            kind,
            usrs,
            name: None,
            location,
            accessibility: DeclaredAccessibility::default(),
            attributes: BTreeSet::new(),
            modifiers: BTreeSet::new(),
            comment_commands: Vec::new(),
            is_implicit: false,
            is_objc_accessible: false,
            parent: None,
            declarations: BTreeSet::new(),
            unused_parameters: BTreeSet::new(),
            references: BTreeSet::new(),
            related: BTreeSet::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_accessibility(mut self, accessibility: DeclaredAccessibility) -> Self {
        self.accessibility = accessibility;
        self
    }

    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attributes.insert(attribute.into());
        self
    }

    pub fn with_modifier(mut self, modifier: impl Into<String>) -> Self {
        self.modifiers.insert(modifier.into());
        self
    }

    pub fn with_implicit(mut self, implicit: bool) -> Self {
        self.is_implicit = implicit;
        self
    }

    pub fn parent(&self) -> Option<DeclId> {
        self.parent
    }

    /// Nested member declarations.
    pub fn declarations(&self) -> &BTreeSet<DeclId> {
        &self.declarations
    }

    /// Parameters the front end found unused in this function's own body.
    pub fn unused_parameters(&self) -> &BTreeSet<DeclId> {
        &self.unused_parameters
    }

    /// Ordinary usage references made from this declaration.
    pub fn references(&self) -> &BTreeSet<RefId> {
        &self.references
    }

    /// Structural references: inheritance, conformance, override.
    pub fn related(&self) -> &BTreeSet<RefId> {
        &self.related
    }

    pub fn name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }

    /// Name without the argument label list, `f(a:b:)` becomes `f`.
    pub fn base_name(&self) -> &str {
        let name = self.name();
        name.split('(').next().unwrap_or(name)
    }

    /// Argument labels of a function name, `init(a:_:b:)` gives `["a", "_", "b"]`.
    ///
    /// Returns `None` when the name has no well-formed label list.
    pub fn argument_labels(&self) -> Option<Vec<&str>> {
        let name = self.name.as_deref()?;
        let open = name.find('(')?;
        let inner = name[open + 1..].strip_suffix(')')?;
        if inner.is_empty() {
            return Some(Vec::new());
        }
        let inner = inner.strip_suffix(':')?;
        Some(inner.split(':').collect())
    }

    pub fn has_attribute(&self, attribute: &str) -> bool {
        self.attributes.contains(attribute)
    }

    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers.contains(modifier)
    }

    pub fn is_override(&self) -> bool {
        self.has_modifier("override")
    }

    pub fn is_static(&self) -> bool {
        self.has_modifier("static")
            || self.has_modifier("class")
            || matches!(
                self.kind,
                DeclarationKind::FunctionMethodStatic
                    | DeclarationKind::FunctionMethodClass
                    | DeclarationKind::VarStatic
                    | DeclarationKind::VarClass
            )
    }

    pub fn first_usr(&self) -> &str {
        self.usrs.iter().next().map(String::as_str).unwrap_or("")
    }

    /// Deterministic ordering independent of insertion order.
    pub fn sort_key(&self) -> (&Location, DeclarationKind, &str, &str) {
        (&self.location, self.kind, self.name(), self.first_usr())
    }

    /// Get a display string for this declaration
    pub fn display(&self) -> String {
        format!(
            "{} {} ({})",
            self.kind.display_name(),
            self.name(),
            self.location
        )
    }
}
