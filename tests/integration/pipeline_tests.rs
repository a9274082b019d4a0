//! End-to-end tests of the standard pipeline
//!
//! Each test feeds a small graph document through ingestion, the full
//! mutator pipeline and finding collection.

use serde_json::json;
use swiftdeadcode::analysis::mutators::{ExtensionFolder, ProtocolConformanceReferenceBuilder};
use swiftdeadcode::analysis::{collect_findings, DeadCode, DeadCodeIssue, Pipeline};
use swiftdeadcode::config::Config;
use swiftdeadcode::graph::{Graph, GraphInput, Mark, ParallelGraphBuilder};
use swiftdeadcode::AnalysisError;

fn build(document: serde_json::Value) -> Graph {
    let input: GraphInput = serde_json::from_value(document).unwrap();
    ParallelGraphBuilder::new().build(input)
}

fn analyze_with(document: serde_json::Value, config: &Config) -> (Graph, Vec<DeadCode>) {
    let mut graph = build(document);
    Pipeline::standard(config).run(&mut graph, config).unwrap();
    let findings = collect_findings(&graph, config);
    (graph, findings)
}

fn analyze(document: serde_json::Value) -> (Graph, Vec<DeadCode>) {
    analyze_with(document, &Config::default())
}

/// Findings as `code:name`
fn summary(findings: &[DeadCode]) -> Vec<String> {
    findings
        .iter()
        .map(|f| format!("{}:{}", f.issue.code(), f.name))
        .collect()
}

fn main_file(references: serde_json::Value) -> serde_json::Value {
    json!({
        "file": { "path": "Sources/App/main.swift", "modules": ["App"] },
        "references": references
    })
}

// ============================================================================
// Redundant Protocols
// ============================================================================

fn redundant_protocol_document() -> serde_json::Value {
    json!({
        "fragments": [
            main_file(json!([{ "kind": "class", "usr": "s:C", "name": "C", "line": 1 }])),
            {
                "file": { "path": "Sources/App/P.swift", "modules": ["App"] },
                "declarations": [
                    {
                        "kind": "protocol", "usrs": ["s:P"], "name": "P", "line": 1,
                        "declarations": [
                            { "kind": "function_method_instance", "usrs": ["s:P.f"], "name": "f()", "line": 2 }
                        ]
                    },
                    {
                        "kind": "class", "usrs": ["s:C"], "name": "C", "line": 5,
                        "related": [
                            { "kind": "protocol", "usr": "s:P", "name": "P", "line": 5, "column": 10, "role": "inherited_type" }
                        ],
                        "declarations": [
                            {
                                "kind": "function_method_instance", "usrs": ["s:C.f"], "name": "f()", "line": 6,
                                "related": [
                                    { "kind": "function_method_instance", "usr": "s:P.f", "name": "f()", "line": 6 }
                                ]
                            }
                        ]
                    }
                ]
            }
        ]
    })
}

#[test]
fn test_protocol_only_conformed_to_is_redundant() {
    let (graph, findings) = analyze(redundant_protocol_document());

    let protocol = graph.declaration_with_usr("s:P").unwrap();
    let requirement = graph.declaration_with_usr("s:P.f").unwrap();
    let implementation = graph.declaration_with_usr("s:C.f").unwrap();

    assert!(graph.redundant_protocols().contains_key(&protocol));
    assert!(graph.is_ignored(requirement));
    assert!(graph.is_ignored(implementation));

    // Members are suppressed, only the protocol itself is reported
    assert_eq!(summary(&findings), vec!["SD005:P"]);
}

#[test]
fn test_protocol_used_as_type_is_not_redundant() {
    let mut document = redundant_protocol_document();
    document["fragments"][0]["references"]
        .as_array_mut()
        .unwrap()
        .push(json!({ "kind": "protocol", "usr": "s:P", "name": "P", "line": 2, "role": "var_type" }));

    let (graph, findings) = analyze(document);

    assert!(graph.redundant_protocols().is_empty());
    assert!(!summary(&findings).iter().any(|s| s.starts_with("SD005")));
}

#[test]
fn test_redundant_protocols_can_be_disabled() {
    let mut config = Config::default();
    config.detection.redundant_protocols = false;

    let (graph, _) = analyze_with(redundant_protocol_document(), &config);

    assert!(graph.redundant_protocols().is_empty());
}

// ============================================================================
// Overrides
// ============================================================================

#[test]
fn test_call_through_base_keeps_override() {
    let (graph, findings) = analyze(json!({
        "fragments": [
            main_file(json!([
                { "kind": "class", "usr": "s:Sub", "name": "Sub", "line": 1 },
                { "kind": "function_method_instance", "usr": "s:Base.f", "name": "f()", "line": 2 }
            ])),
            {
                "file": { "path": "Sources/App/Base.swift", "modules": ["App"] },
                "declarations": [
                    {
                        "kind": "class", "usrs": ["s:Base"], "name": "Base", "line": 1,
                        "declarations": [
                            { "kind": "function_method_instance", "usrs": ["s:Base.f"], "name": "f()", "line": 2 }
                        ]
                    },
                    {
                        "kind": "class", "usrs": ["s:Sub"], "name": "Sub", "line": 5,
                        "related": [
                            { "kind": "class", "usr": "s:Base", "name": "Base", "line": 5, "role": "inherited_type" }
                        ],
                        "declarations": [
                            {
                                "kind": "function_method_instance", "usrs": ["s:Sub.f"], "name": "f()", "line": 6,
                                "modifiers": ["override"],
                                "related": [
                                    { "kind": "function_method_instance", "usr": "s:Base.f", "name": "f()", "line": 6 }
                                ]
                            }
                        ]
                    }
                ]
            }
        ]
    }));

    for usr in ["s:Base", "s:Base.f", "s:Sub", "s:Sub.f"] {
        let id = graph.declaration_with_usr(usr).unwrap();
        assert!(graph.is_used(id), "{} should be used", usr);
    }
    assert!(findings.is_empty(), "{:?}", summary(&findings));
}

#[test]
fn test_override_of_foreign_member_is_retained() {
    let (graph, findings) = analyze(json!({
        "fragments": [{
            "file": { "path": "Sources/App/View.swift", "modules": ["App"] },
            "declarations": [{
                "kind": "class", "usrs": ["s:View"], "name": "View", "line": 1,
                "related": [
                    { "kind": "class", "usr": "c:objc(cs)UIView", "name": "UIView", "line": 1, "role": "inherited_type" }
                ],
                "declarations": [{
                    "kind": "function_method_instance", "usrs": ["s:View.layoutSubviews"], "name": "layoutSubviews()",
                    "line": 2, "modifiers": ["override"],
                    "related": [
                        { "kind": "function_method_instance", "usr": "c:objc(cs)UIView(im)layoutSubviews", "line": 2 }
                    ]
                }]
            }]
        }]
    }));

    let method = graph.declaration_with_usr("s:View.layoutSubviews").unwrap();
    assert!(graph.is_retained(method));
    assert!(graph.is_used(method));

    // Nothing instantiates the class itself
    assert_eq!(summary(&findings), vec!["SD001:View"]);
}

// ============================================================================
// Redundant Accessibility
// ============================================================================

fn file_private_document() -> serde_json::Value {
    json!({
        "fragments": [
            main_file(json!([
                { "kind": "struct", "usr": "s:A", "name": "A", "line": 1 },
                { "kind": "function_method_instance", "usr": "s:A.describe", "name": "describe()", "line": 2 },
                { "kind": "struct", "usr": "s:B", "name": "B", "line": 3 },
                { "kind": "function_method_instance", "usr": "s:B.read", "name": "read()", "line": 4 }
            ])),
            {
                "file": { "path": "Sources/App/Types.swift", "modules": ["App"] },
                "declarations": [
                    {
                        "kind": "struct", "usrs": ["s:A"], "name": "A", "line": 1,
                        "declarations": [
                            { "kind": "var_instance", "usrs": ["s:A.x"], "name": "x", "line": 2, "accessibility": "fileprivate" },
                            { "kind": "var_instance", "usrs": ["s:A.y"], "name": "y", "line": 3, "accessibility": "fileprivate" },
                            {
                                "kind": "function_method_instance", "usrs": ["s:A.describe"], "name": "describe()", "line": 4,
                                "references": [{ "kind": "var_instance", "usr": "s:A.y", "name": "y", "line": 5 }]
                            }
                        ]
                    },
                    {
                        "kind": "struct", "usrs": ["s:B"], "name": "B", "line": 10,
                        "declarations": [{
                            "kind": "function_method_instance", "usrs": ["s:B.read"], "name": "read()", "line": 11,
                            "references": [{ "kind": "var_instance", "usr": "s:A.x", "name": "x", "line": 12 }]
                        }]
                    }
                ]
            }
        ]
    })
}

#[test]
fn test_file_private_read_by_other_type_in_file_is_kept() {
    let (graph, findings) = analyze(file_private_document());

    let x = graph.declaration_with_usr("s:A.x").unwrap();
    assert!(graph.is_used(x));
    assert!(!graph.redundant_accessibility().contains_key(&x));
    assert!(!summary(&findings).contains(&"SD008:x".to_string()));
}

#[test]
fn test_file_private_used_only_by_its_type_could_be_private() {
    let (graph, findings) = analyze(file_private_document());

    let y = graph.declaration_with_usr("s:A.y").unwrap();
    let redundant = &graph.redundant_accessibility()[&y];
    assert_eq!(redundant.suggested.as_str(), "private");

    let finding = findings.iter().find(|f| f.name == "y").unwrap();
    assert_eq!(finding.issue, DeadCodeIssue::RedundantFilePrivate);
    assert!(finding.message.ends_with("it could be private"));
}

fn public_document() -> serde_json::Value {
    json!({
        "fragments": [
            main_file(json!([{ "kind": "function_free", "usr": "s:helper", "name": "helper()", "line": 1 }])),
            {
                "file": { "path": "Sources/App/Lib.swift", "modules": ["App"] },
                "declarations": [
                    { "kind": "function_free", "usrs": ["s:helper"], "name": "helper()", "line": 1, "accessibility": "public" },
                    { "kind": "function_free", "usrs": ["s:shared"], "name": "shared()", "line": 5, "accessibility": "public" }
                ]
            },
            {
                "file": {
                    "path": "Sources/Consumer/Use.swift", "modules": ["Consumer"],
                    "imports": [{ "module": "App", "line": 1 }]
                },
                "references": [{ "kind": "function_free", "usr": "s:shared", "name": "shared()", "line": 3 }]
            }
        ]
    })
}

#[test]
fn test_public_without_cross_module_caller_is_redundant() {
    let (_, findings) = analyze(public_document());
    let names = summary(&findings);

    assert!(names.contains(&"SD006:helper()".to_string()), "{:?}", names);
    assert!(!names.contains(&"SD006:shared()".to_string()), "{:?}", names);

    let helper = findings.iter().find(|f| f.name == "helper()").unwrap();
    assert!(helper.message.ends_with("it could be internal"));
}

#[test]
fn test_retain_public_disables_redundant_public() {
    let config = Config {
        retain_public: true,
        ..Config::default()
    };
    let (_, findings) = analyze_with(public_document(), &config);

    assert!(!summary(&findings).iter().any(|s| s.starts_with("SD006")));
}

fn witness_document(protocol_file: &str, protocol_module: &str, tier: &str) -> serde_json::Value {
    json!({
        "file": { "path": protocol_file, "modules": [protocol_module] },
        "declarations": [
            {
                "kind": "protocol", "usrs": ["s:P"], "name": "P", "line": 1, "accessibility": tier,
                "declarations": [
                    { "kind": "function_method_instance", "usrs": ["s:P.f"], "name": "f()", "line": 2 }
                ]
            },
            {
                "kind": "struct", "usrs": ["s:C"], "name": "C", "line": 5, "accessibility": tier,
                "related": [
                    { "kind": "protocol", "usr": "s:P", "name": "P", "line": 5, "column": 19, "role": "inherited_type" }
                ],
                "declarations": [
                    {
                        "kind": "function_method_instance", "usrs": ["s:C.f"], "name": "f()", "line": 6,
                        "accessibility": tier,
                        "related": [
                            { "kind": "function_method_instance", "usr": "s:P.f", "name": "f()", "line": 6 }
                        ]
                    }
                ]
            }
        ]
    })
}

#[test]
fn test_public_witness_called_through_protocol_from_other_module() {
    let (graph, findings) = analyze(json!({
        "fragments": [
            witness_document("Sources/Kit/P.swift", "Kit", "public"),
            {
                "file": {
                    "path": "Sources/App/main.swift", "modules": ["App"],
                    "imports": [{ "module": "Kit", "line": 1 }]
                },
                "references": [
                    { "kind": "protocol", "usr": "s:P", "name": "P", "line": 3, "role": "var_type" },
                    { "kind": "struct", "usr": "s:C", "name": "C", "line": 3 },
                    { "kind": "function_method_instance", "usr": "s:P.f", "name": "f()", "line": 4 }
                ]
            }
        ]
    }));

    let witness = graph.declaration_with_usr("s:C.f").unwrap();
    assert!(graph.is_used(witness));
    assert!(!graph.redundant_accessibility().contains_key(&witness));
    assert!(!summary(&findings).iter().any(|s| s.starts_with("SD006")), "{:?}", summary(&findings));
}

#[test]
fn test_internal_witness_called_in_its_own_file() {
    let mut shapes = witness_document("Sources/App/Shapes.swift", "App", "internal");
    shapes["declarations"].as_array_mut().unwrap().push(json!({
        "kind": "function_free", "usrs": ["s:render"], "name": "render()", "line": 10,
        "references": [
            { "kind": "protocol", "usr": "s:P", "name": "P", "line": 11, "role": "var_type" },
            { "kind": "struct", "usr": "s:C", "name": "C", "line": 11 },
            { "kind": "function_method_instance", "usr": "s:P.f", "name": "f()", "line": 12 }
        ]
    }));
    let (graph, findings) = analyze(json!({
        "fragments": [
            main_file(json!([{ "kind": "function_free", "usr": "s:render", "name": "render()", "line": 1 }])),
            shapes
        ]
    }));

    let witness = graph.declaration_with_usr("s:C.f").unwrap();
    assert!(graph.is_used(witness));
    assert!(!graph.redundant_accessibility().contains_key(&witness));
    assert!(!summary(&findings).contains(&"SD007:f()".to_string()), "{:?}", summary(&findings));
}

// ============================================================================
// Reachability
// ============================================================================

#[test]
fn test_live_requirement_does_not_keep_dead_conformer_alive() {
    let (graph, findings) = analyze(json!({
        "fragments": [
            main_file(json!([
                { "kind": "protocol", "usr": "s:P", "name": "P", "line": 1, "role": "var_type" },
                { "kind": "struct", "usr": "s:Live", "name": "Live", "line": 1 },
                { "kind": "function_method_instance", "usr": "s:P.f", "name": "f()", "line": 2 }
            ])),
            {
                "file": { "path": "Sources/App/P.swift", "modules": ["App"] },
                "declarations": [
                    {
                        "kind": "protocol", "usrs": ["s:P"], "name": "P", "line": 1,
                        "declarations": [
                            { "kind": "function_method_instance", "usrs": ["s:P.f"], "name": "f()", "line": 2 }
                        ]
                    },
                    {
                        "kind": "struct", "usrs": ["s:Live"], "name": "Live", "line": 5,
                        "related": [
                            { "kind": "protocol", "usr": "s:P", "name": "P", "line": 5, "column": 15, "role": "inherited_type" }
                        ],
                        "declarations": [
                            {
                                "kind": "function_method_instance", "usrs": ["s:Live.f"], "name": "f()", "line": 6,
                                "related": [
                                    { "kind": "function_method_instance", "usr": "s:P.f", "name": "f()", "line": 6 }
                                ]
                            }
                        ]
                    },
                    {
                        "kind": "struct", "usrs": ["s:Dead"], "name": "Dead", "line": 10,
                        "related": [
                            { "kind": "protocol", "usr": "s:P", "name": "P", "line": 10, "column": 15, "role": "inherited_type" }
                        ],
                        "declarations": [
                            {
                                "kind": "function_method_instance", "usrs": ["s:Dead.f"], "name": "f()", "line": 11,
                                "related": [
                                    { "kind": "function_method_instance", "usr": "s:P.f", "name": "f()", "line": 11 }
                                ]
                            }
                        ]
                    }
                ]
            }
        ]
    }));

    let live = graph.declaration_with_usr("s:Live.f").unwrap();
    let dead = graph.declaration_with_usr("s:Dead.f").unwrap();
    assert!(graph.is_used(live));
    assert!(!graph.is_used(dead));
    assert!(graph.is_ignored(dead));
    assert_eq!(summary(&findings), vec!["SD001:Dead"]);
}

// ============================================================================
// Assign-only Properties
// ============================================================================

fn stored_property(name: &str, line: u32) -> serde_json::Value {
    json!({
        "kind": "var_instance", "usrs": [format!("s:Point.{}", name)], "name": name, "line": line,
        "declarations": [
            { "kind": "function_accessor_getter", "usrs": [format!("s:Point.{}.get", name)], "line": line, "is_implicit": true },
            { "kind": "function_accessor_setter", "usrs": [format!("s:Point.{}.set", name)], "line": line, "is_implicit": true }
        ]
    })
}

fn point_document() -> serde_json::Value {
    json!({
        "fragments": [
            main_file(json!([
                { "kind": "struct", "usr": "s:Point", "name": "Point", "line": 1 },
                { "kind": "function_constructor", "usr": "s:Point.init", "name": "init(a:b:)", "line": 1 },
                { "kind": "var_instance", "usr": "s:Point.a", "name": "a", "line": 2 }
            ])),
            {
                "file": { "path": "Sources/App/Point.swift", "modules": ["App"] },
                "declarations": [{
                    "kind": "struct", "usrs": ["s:Point"], "name": "Point", "line": 1,
                    "declarations": [
                        stored_property("a", 2),
                        stored_property("b", 3),
                        { "kind": "function_constructor", "usrs": ["s:Point.init"], "name": "init(a:b:)", "line": 1, "is_implicit": true }
                    ]
                }]
            }
        ]
    })
}

#[test]
fn test_memberwise_initializer_writes_do_not_count_as_reads() {
    let (graph, findings) = analyze(point_document());

    let a = graph.declaration_with_usr("s:Point.a").unwrap();
    let b = graph.declaration_with_usr("s:Point.b").unwrap();
    let a_setter = graph.declaration_with_usr("s:Point.a.set").unwrap();

    assert!(graph.is_used(a));
    assert!(graph.is_used(a_setter));
    assert!(graph.is_marked(b, Mark::AssignOnly));
    assert!(!graph.is_used(b));

    assert_eq!(summary(&findings), vec!["SD002:b"]);
}

#[test]
fn test_retain_assign_only_properties() {
    let config = Config {
        retain_assign_only_properties: true,
        ..Config::default()
    };
    let (graph, findings) = analyze_with(point_document(), &config);

    let b = graph.declaration_with_usr("s:Point.b").unwrap();
    assert!(graph.is_used(b));
    assert!(findings.is_empty(), "{:?}", summary(&findings));
}

// ============================================================================
// Normalization
// ============================================================================

fn extension_document() -> serde_json::Value {
    json!({
        "fragments": [{
            "file": { "path": "Sources/App/S.swift", "modules": ["App"] },
            "declarations": [
                { "kind": "struct", "usrs": ["s:S"], "name": "S", "line": 1 },
                {
                    "kind": "extension_struct", "usrs": ["s:e:S"], "name": "S", "line": 5,
                    "references": [{ "kind": "struct", "usr": "s:S", "name": "S", "line": 5, "column": 11, "role": "extended_type" }],
                    "declarations": [{ "kind": "function_method_instance", "usrs": ["s:S.g"], "name": "g()", "line": 6 }]
                },
                {
                    "kind": "extension_class", "usrs": ["s:e:NSObject"], "name": "NSObject", "line": 10,
                    "references": [{ "kind": "class", "usr": "c:objc(cs)NSObject", "name": "NSObject", "line": 10, "role": "extended_type" }]
                }
            ]
        }]
    })
}

#[test]
fn test_extension_folding_is_idempotent() {
    let mut graph = build(extension_document());
    let config = Config::default();
    let pipeline = Pipeline::new().with(ExtensionFolder::new());

    pipeline.run(&mut graph, &config).unwrap();

    let s = graph.declaration_with_usr("s:S").unwrap();
    let g = graph.declaration_with_usr("s:S.g").unwrap();
    assert!(graph.declaration_with_usr("s:e:S").is_none());
    assert_eq!(graph.declaration(g).unwrap().parent(), Some(s));
    assert!(graph.is_retained(graph.declaration_with_usr("s:e:NSObject").unwrap()));

    let declarations = graph.declaration_count();
    let references = graph.reference_count();
    pipeline.run(&mut graph, &config).unwrap();

    assert_eq!(graph.declaration_count(), declarations);
    assert_eq!(graph.reference_count(), references);
    assert_eq!(graph.declaration(g).unwrap().parent(), Some(s));
}

#[test]
fn test_conformance_inversion_is_stable() {
    let mut graph = build(redundant_protocol_document());
    let config = Config::default();
    let pipeline = Pipeline::new().with(ProtocolConformanceReferenceBuilder::new());

    pipeline.run(&mut graph, &config).unwrap();

    let requirement = graph.declaration_with_usr("s:P.f").unwrap();
    let implementation = graph.declaration_with_usr("s:C.f").unwrap();
    assert!(graph.declaration(implementation).unwrap().related().is_empty());

    let edges: Vec<_> = graph
        .declaration(requirement)
        .unwrap()
        .related()
        .iter()
        .filter_map(|r| graph.reference(*r))
        .map(|r| r.usr.clone())
        .collect();
    assert_eq!(edges, vec!["s:C.f".to_string()]);

    let references = graph.reference_count();
    pipeline.run(&mut graph, &config).unwrap();
    assert_eq!(graph.reference_count(), references);
}

#[test]
fn test_unmapped_extension_aborts_with_pass_name() {
    let mut graph = build(json!({
        "fragments": [{
            "file": { "path": "Sources/App/X.swift", "modules": ["App"] },
            "declarations": [{ "kind": "extension", "usrs": ["s:e:X"], "name": "X", "line": 1 }]
        }]
    }));
    let config = Config::default();

    let error = Pipeline::standard(&config).run(&mut graph, &config).unwrap_err();

    match error {
        AnalysisError::Mutator { mutator, .. } => assert_eq!(mutator, "ExtensionFolder"),
        other => panic!("unexpected error: {}", other),
    }
}

// ============================================================================
// Directives and Determinism
// ============================================================================

#[test]
fn test_ignore_directive_and_show_ignored() {
    let document = json!({
        "fragments": [{
            "file": { "path": "Sources/App/Debug.swift", "modules": ["App"] },
            "declarations": [
                {
                    "kind": "function_free", "usrs": ["s:dump"], "name": "dump()", "line": 1,
                    "comments": ["swiftdeadcode:ignore"]
                },
                { "kind": "function_free", "usrs": ["s:trace"], "name": "trace()", "line": 5 }
            ]
        }]
    });

    let (_, findings) = analyze(document.clone());
    assert_eq!(summary(&findings), vec!["SD001:trace()"]);

    let mut config = Config::default();
    config.report.show_ignored = true;
    let (_, findings) = analyze_with(document, &config);

    let dump = findings.iter().find(|f| f.name == "dump()").unwrap();
    assert!(dump.message.ends_with("(ignored by directive)"));
    assert_eq!(dump.severity.as_str(), "info");
}

#[test]
fn test_findings_are_deterministic() {
    let document = json!({
        "fragments": [
            redundant_protocol_document()["fragments"][1].clone(),
            public_document()["fragments"][1].clone(),
            point_document()["fragments"][1].clone(),
            file_private_document()["fragments"][1].clone()
        ]
    });

    let (_, first) = analyze(document.clone());
    let (_, second) = analyze(document);

    assert!(!first.is_empty());
    assert_eq!(summary(&first), summary(&second));
    let locations: Vec<_> = first.iter().map(|f| f.location.clone()).collect();
    let mut sorted = locations.clone();
    sorted.sort();
    assert_eq!(locations, sorted);
}
