// Retention rules for members the compiler or runtime calls by convention.

use super::retain;
use crate::analysis::Mutator;
use crate::config::Config;
use crate::error::AnalysisError;
use crate::graph::{DeclId, Declaration, DeclarationKind, Graph};

/// Members of types carrying `attribute` that satisfy `predicate`.
fn members_of_attributed_types(
    graph: &Graph,
    attribute: &str,
    predicate: impl Fn(&Declaration) -> bool,
) -> Vec<DeclId> {
    let types = graph
        .declarations()
        .filter(|(_, d)| d.kind.is_type() && d.has_attribute(attribute))
        .map(|(id, _)| id);

    let members = types.flat_map(|owner| {
        graph
            .declaration(owner)
            .map(|d| d.declarations().iter().copied().collect::<Vec<_>>())
            .unwrap_or_default()
    });
    let members: Vec<DeclId> = members
        .filter(|m| graph.declaration(*m).is_some_and(&predicate))
        .collect();

    graph.sorted_declarations(members)
}

fn declarations_where(graph: &Graph, predicate: impl Fn(&Declaration) -> bool) -> Vec<DeclId> {
    let ids: Vec<DeclId> = graph
        .declarations()
        .filter(|(_, d)| predicate(d))
        .map(|(id, _)| id)
        .collect();
    graph.sorted_declarations(ids)
}

/// `subscript(dynamicMember:)` is called through member syntax that the
/// index attributes to nothing.
pub struct DynamicMemberRetainer;

impl DynamicMemberRetainer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DynamicMemberRetainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for DynamicMemberRetainer {
    fn name(&self) -> &'static str {
        "DynamicMemberRetainer"
    }

    fn mutate(&self, graph: &mut Graph, _config: &Config) -> Result<(), AnalysisError> {
        let subscripts = declarations_where(graph, |d| {
            d.kind == DeclarationKind::FunctionSubscript && d.name().starts_with("subscript(dynamicMember:")
        });
        for id in subscripts {
            retain(graph, id, "dynamic member lookup");
        }
        Ok(())
    }
}

/// `wrappedValue`, `projectedValue` and `init(wrappedValue:)` of property
/// wrappers are invoked by wrapper syntax.
pub struct PropertyWrapperRetainer;

impl PropertyWrapperRetainer {
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn is_special_member(decl: &Declaration) -> bool {
        matches!(decl.name(), "wrappedValue" | "projectedValue")
            || decl.name().starts_with("init(wrappedValue:")
    }
}

impl Default for PropertyWrapperRetainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for PropertyWrapperRetainer {
    fn name(&self) -> &'static str {
        "PropertyWrapperRetainer"
    }

    fn mutate(&self, graph: &mut Graph, _config: &Config) -> Result<(), AnalysisError> {
        for id in members_of_attributed_types(graph, "propertyWrapper", Self::is_special_member) {
            retain(graph, id, "property wrapper member");
        }
        Ok(())
    }
}

/// Static `build*` methods of result builders are called by the transform
/// the compiler applies to builder closures.
pub struct ResultBuilderRetainer;

impl ResultBuilderRetainer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ResultBuilderRetainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for ResultBuilderRetainer {
    fn name(&self) -> &'static str {
        "ResultBuilderRetainer"
    }

    fn mutate(&self, graph: &mut Graph, _config: &Config) -> Result<(), AnalysisError> {
        let builders = members_of_attributed_types(graph, "resultBuilder", |m| {
            m.kind.is_function() && m.is_static() && m.base_name().starts_with("build")
        });
        for id in builders {
            retain(graph, id, "result builder method");
        }
        Ok(())
    }
}

/// `appendInterpolation` overloads are called from string literals.
pub struct StringInterpolationRetainer;

impl StringInterpolationRetainer {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StringInterpolationRetainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for StringInterpolationRetainer {
    fn name(&self) -> &'static str {
        "StringInterpolationRetainer"
    }

    fn mutate(&self, graph: &mut Graph, _config: &Config) -> Result<(), AnalysisError> {
        let methods = declarations_where(graph, |d| {
            d.kind == DeclarationKind::FunctionMethodInstance && d.base_name() == "appendInterpolation"
        });
        for id in methods {
            retain(graph, id, "string interpolation");
        }
        Ok(())
    }
}

/// Program entry points: `@main`, `@UIApplicationMain`, `@NSApplicationMain`.
pub struct EntryPointAttributeRetainer;

impl EntryPointAttributeRetainer {
    const ATTRIBUTES: [&'static str; 3] = ["main", "UIApplicationMain", "NSApplicationMain"];

    pub fn new() -> Self {
        Self
    }
}

impl Default for EntryPointAttributeRetainer {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for EntryPointAttributeRetainer {
    fn name(&self) -> &'static str {
        "EntryPointAttributeRetainer"
    }

    fn mutate(&self, graph: &mut Graph, _config: &Config) -> Result<(), AnalysisError> {
        let entry_points = declarations_where(graph, |d| {
            Self::ATTRIBUTES.iter().any(|attribute| d.has_attribute(attribute))
        });
        for id in entry_points {
            retain(graph, id, "entry point attribute");
        }
        Ok(())
    }
}
