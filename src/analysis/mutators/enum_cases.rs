use crate::analysis::Mutator;
use crate::config::Config;
use crate::error::AnalysisError;
use crate::graph::{DeclId, DeclarationKind, Graph, RefParent, Reference};
use tracing::debug;

/// Conformances whose synthesized code can produce any case: raw-value
/// initializers, `CodingKey` decoding and `CaseIterable.allCases`.
const CASE_PRODUCING_CONFORMANCES: &[&str] = &[
    "String",
    "Character",
    "Int",
    "Int8",
    "Int16",
    "Int32",
    "Int64",
    "UInt",
    "UInt8",
    "UInt16",
    "UInt32",
    "UInt64",
    "Float",
    "Double",
    "RawRepresentable",
    "CodingKey",
    "CaseIterable",
];

/// Makes raw-representable, `CodingKey` and `CaseIterable` enums reference
/// all of their cases.
pub struct EnumCaseReferenceBuilder;

impl EnumCaseReferenceBuilder {
    pub fn new() -> Self {
        Self
    }

    fn produces_cases(&self, graph: &Graph, id: DeclId) -> bool {
        let Some(decl) = graph.declaration(id) else {
            return false;
        };
        decl.references()
            .iter()
            .chain(decl.related())
            .filter_map(|r| graph.reference(*r))
            .filter(|r| r.is_related || r.role.is_conformance())
            .any(|r| CASE_PRODUCING_CONFORMANCES.contains(&r.name()))
    }
}

impl Default for EnumCaseReferenceBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Mutator for EnumCaseReferenceBuilder {
    fn name(&self) -> &'static str {
        "EnumCaseReferenceBuilder"
    }

    fn mutate(&self, graph: &mut Graph, _config: &Config) -> Result<(), AnalysisError> {
        for enumeration in graph.declarations_of_kind(DeclarationKind::Enum) {
            if !self.produces_cases(graph, enumeration) {
                continue;
            }

            let cases: Vec<Reference> = graph
                .declaration(enumeration)
                .map(|decl| {
                    decl.declarations()
                        .iter()
                        .filter_map(|c| graph.declaration(*c))
                        .filter(|c| c.kind == DeclarationKind::Enumelement)
                        .map(|c| {
                            Reference::new(c.kind, c.first_usr(), c.location.clone()).with_name(c.name())
                        })
                        .collect()
                })
                .unwrap_or_default();

            debug!("Enum references its {} cases", cases.len());
            for case in cases {
                graph.add_reference(case, Some(RefParent::Declaration(enumeration)));
            }
        }

        Ok(())
    }
}
