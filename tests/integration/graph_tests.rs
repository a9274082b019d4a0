//! Integration tests for graph ingestion and traversal
//!
//! Graph documents are built the way the front end emits them and loaded
//! through both builders.

use serde_json::json;
use std::path::Path;
use swiftdeadcode::graph::{
    AssetSource, DeclarationKind, Graph, GraphBuilder, GraphInput, ParallelGraphBuilder, ReferenceRole,
};

fn input(document: serde_json::Value) -> GraphInput {
    serde_json::from_value(document).unwrap()
}

fn build_sequential(document: serde_json::Value) -> Graph {
    let mut builder = GraphBuilder::new();
    builder.add_input(input(document));
    builder.build()
}

fn build_parallel(document: serde_json::Value) -> Graph {
    ParallelGraphBuilder::new().build(input(document))
}

fn hierarchy_document() -> serde_json::Value {
    json!({
        "fragments": [
            {
                "file": { "path": "Sources/App/Shapes.swift", "modules": ["App"] },
                "declarations": [
                    {
                        "kind": "protocol", "usrs": ["s:Drawable"], "name": "Drawable", "line": 1,
                        "declarations": [
                            { "kind": "function_method_instance", "usrs": ["s:Drawable.draw"], "name": "draw()", "line": 2 }
                        ]
                    },
                    {
                        "kind": "class", "usrs": ["s:Shape"], "name": "Shape", "line": 5,
                        "related": [
                            { "kind": "protocol", "usr": "s:Drawable", "name": "Drawable", "line": 5, "role": "inherited_type" }
                        ],
                        "declarations": [
                            { "kind": "function_method_instance", "usrs": ["s:Shape.draw"], "name": "draw()", "line": 6 }
                        ]
                    }
                ]
            },
            {
                "file": { "path": "Sources/App/Circle.swift", "modules": ["App"] },
                "declarations": [
                    {
                        "kind": "class", "usrs": ["s:Circle"], "name": "Circle", "line": 1,
                        "related": [
                            { "kind": "class", "usr": "s:Shape", "name": "Shape", "line": 1, "role": "inherited_type" }
                        ],
                        "declarations": [
                            {
                                "kind": "var_instance", "usrs": ["s:Circle.radius"], "name": "radius", "line": 2,
                                "declarations": [
                                    { "kind": "function_accessor_getter", "usrs": ["s:Circle.radius.get"], "line": 2, "is_implicit": true }
                                ]
                            }
                        ]
                    },
                    {
                        "kind": "class", "usrs": ["s:Ring"], "name": "Ring", "line": 10,
                        "related": [
                            { "kind": "class", "usr": "s:Circle", "name": "Circle", "line": 10, "role": "inherited_type" }
                        ]
                    }
                ]
            }
        ],
        "module_exports": { "App": ["AppCore"] },
        "asset_references": [
            { "name": "Circle", "source": "interface_builder" }
        ]
    })
}

// ============================================================================
// Ingestion
// ============================================================================

#[test]
fn test_builders_agree() {
    let sequential = build_sequential(hierarchy_document());
    let parallel = build_parallel(hierarchy_document());

    assert_eq!(sequential.declaration_count(), parallel.declaration_count());
    assert_eq!(sequential.reference_count(), parallel.reference_count());
    assert_eq!(sequential.declaration_count(), 8);

    for graph in [&sequential, &parallel] {
        let radius = graph.declaration_with_usr("s:Circle.radius").unwrap();
        let circle = graph.declaration_with_usr("s:Circle").unwrap();
        assert_eq!(graph.declaration(radius).unwrap().parent(), Some(circle));
    }
}

#[test]
fn test_metadata_is_loaded() {
    let graph = build_parallel(hierarchy_document());

    let exported: Vec<&String> = graph.exported_modules("App").collect();
    assert_eq!(exported, vec!["AppCore"]);

    let assets: Vec<_> = graph.asset_references().iter().collect();
    assert_eq!(assets.len(), 1);
    assert_eq!(assets[0].name, "Circle");
    assert_eq!(assets[0].source, AssetSource::InterfaceBuilder);

    assert!(graph.indexed_modules().contains("App"));
    assert_eq!(
        graph.modules_of_file(Path::new("Sources/App/Circle.swift")).len(),
        1
    );
}

#[test]
fn test_file_compiled_into_two_modules() {
    let fragment = |module: &str| {
        json!({
            "file": { "path": "Shared/Log.swift", "modules": [module] },
            "declarations": [{ "kind": "function_free", "usrs": ["s:log"], "name": "log(_:)", "line": 3 }]
        })
    };
    let graph = build_parallel(json!({ "fragments": [fragment("App"), fragment("Widget")] }));

    assert_eq!(graph.declaration_count(), 1);
    let modules = graph.modules_of_file(Path::new("Shared/Log.swift"));
    assert!(modules.contains("App") && modules.contains("Widget"));
}

#[test]
fn test_nodes_without_identifier_are_skipped() {
    let graph = build_parallel(json!({
        "fragments": [{
            "file": { "path": "A.swift", "modules": ["App"] },
            "declarations": [
                {
                    "kind": "struct", "usrs": ["s:A"], "name": "A", "line": 1,
                    "declarations": [{ "kind": "var_instance", "usrs": [""], "name": "broken", "line": 2 }],
                    "references": [{ "kind": "struct", "usr": "", "line": 3 }]
                }
            ]
        }]
    }));

    assert_eq!(graph.declaration_count(), 1);
    assert_eq!(graph.reference_count(), 0);
}

#[test]
fn test_declaration_defaults() {
    let graph = build_sequential(json!({
        "fragments": [{
            "file": { "path": "A.swift", "modules": ["App"] },
            "declarations": [
                { "kind": "struct", "usrs": ["s:A"], "name": "A", "line": 4 },
                { "kind": "struct", "usrs": ["s:B"], "name": "B", "line": 8, "column": 15, "accessibility": "public" },
                { "kind": "struct", "usrs": ["s:C"], "name": "C", "line": 9, "accessibility": "internal", "accessibility_explicit": false }
            ]
        }]
    }));

    let a = graph.declaration(graph.declaration_with_usr("s:A").unwrap()).unwrap();
    assert_eq!(a.location.column, 1);
    assert_eq!(a.accessibility.value.as_str(), "internal");
    assert!(!a.accessibility.is_explicit);

    let b = graph.declaration(graph.declaration_with_usr("s:B").unwrap()).unwrap();
    assert_eq!(b.location.column, 15);
    assert!(b.accessibility.is_explicit);

    let c = graph.declaration(graph.declaration_with_usr("s:C").unwrap()).unwrap();
    assert!(!c.accessibility.is_explicit);
}

// ============================================================================
// Traversal
// ============================================================================

#[test]
fn test_class_hierarchy_queries() {
    let graph = build_parallel(hierarchy_document());
    let shape = graph.declaration_with_usr("s:Shape").unwrap();
    let circle = graph.declaration_with_usr("s:Circle").unwrap();
    let ring = graph.declaration_with_usr("s:Ring").unwrap();

    assert_eq!(graph.superclasses(ring), vec![circle, shape]);
    assert_eq!(graph.subclasses(shape).len(), 2);
    assert!(graph.subclasses(shape).contains(&ring));
    assert!(graph.inherits_from_named(ring, "Shape"));
    assert!(!graph.inherits_from_named(shape, "Circle"));
}

#[test]
fn test_conformance_and_membership_queries() {
    let graph = build_parallel(hierarchy_document());
    let drawable = graph.declaration_with_usr("s:Drawable").unwrap();
    let requirement = graph.declaration_with_usr("s:Drawable.draw").unwrap();
    let shape = graph.declaration_with_usr("s:Shape").unwrap();
    let implementation = graph.declaration_with_usr("s:Shape.draw").unwrap();

    assert_eq!(graph.conforming_declarations(drawable), vec![shape]);
    assert!(graph.is_protocol_member(requirement));
    assert!(!graph.is_protocol_member(implementation));

    let inherited = graph.inherited_type_references(shape);
    assert_eq!(inherited.len(), 1);
    let reference = graph.reference(inherited[0]).unwrap();
    assert_eq!(reference.role, ReferenceRole::InheritedType);
    assert_eq!(graph.referencing_declaration(inherited[0]), Some(shape));
}

#[test]
fn test_ancestry_queries() {
    let graph = build_parallel(hierarchy_document());
    let circle = graph.declaration_with_usr("s:Circle").unwrap();
    let radius = graph.declaration_with_usr("s:Circle.radius").unwrap();
    let getter = graph.declaration_with_usr("s:Circle.radius.get").unwrap();

    assert_eq!(graph.ancestors(getter), vec![radius, circle]);
    assert_eq!(graph.top_level_ancestor(getter), circle);
    assert_eq!(graph.top_level_ancestor(circle), circle);

    let descendants = graph.descendants(circle);
    assert!(descendants.contains(&radius) && descendants.contains(&getter));
}

#[test]
fn test_remove_declaration_drops_subtree() {
    let mut graph = build_parallel(hierarchy_document());
    let circle = graph.declaration_with_usr("s:Circle").unwrap();
    let references = graph.reference_count();

    graph.remove_declaration(circle);

    assert!(graph.declaration_with_usr("s:Circle").is_none());
    assert!(graph.declaration_with_usr("s:Circle.radius").is_none());
    assert!(graph.declaration_with_usr("s:Circle.radius.get").is_none());
    // Circle's inheritance clause goes with it
    assert_eq!(graph.reference_count(), references - 1);
    assert_eq!(graph.declarations_of_kind(DeclarationKind::Class).len(), 2);
}
