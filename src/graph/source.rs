use super::{CommentCommand, Location};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// An `import` statement in a source file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ImportStatement {
    pub module: String,
    #[serde(default)]
    pub is_testable: bool,
    /// `@_exported import`: re-exports the module to importers of this one
    #[serde(default)]
    pub is_exported: bool,
    pub line: u32,
    #[serde(default = "default_column")]
    pub column: u32,
}

fn default_column() -> u32 {
    1
}

/// A source file and the compiled modules it belongs to.
///
/// The same file may be compiled into more than one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    pub path: PathBuf,
    pub modules: BTreeSet<String>,
    #[serde(default)]
    pub imports: Vec<ImportStatement>,
    /// File-level directives such as `swiftdeadcode:ignore:all`
    #[serde(default, skip_serializing)]
    pub comments: Vec<String>,
    #[serde(skip)]
    pub comment_commands: Vec<CommentCommand>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, module: impl Into<String>) -> Self {
        let mut modules = BTreeSet::new();
        modules.insert(module.into());
        Self {
            path: path.into(),
            modules,
            imports: Vec::new(),
            comments: Vec::new(),
            comment_commands: Vec::new(),
        }
    }

    pub fn import_location(&self, import: &ImportStatement) -> Location {
        Location::new(self.path.clone(), import.line, import.column)
    }

    /// Whether the file imports `module` with `@testable`.
    pub fn imports_testable(&self, module: &str) -> bool {
        self.imports
            .iter()
            .any(|import| import.is_testable && import.module == module)
    }

    pub fn has_command(&self, command: &CommentCommand) -> bool {
        self.comment_commands.contains(command)
    }
}

/// Where a non-code asset reference was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetSource {
    /// Storyboards and XIBs
    InterfaceBuilder,
    /// Core Data models
    DataModel,
    /// Info.plist entries such as principal classes
    PropertyList,
}

/// A declaration named by a non-code asset
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetReference {
    /// Type name as written in the asset
    pub name: String,
    pub source: AssetSource,
}
