use super::{DeadCode, DeadCodeIssue, Severity};
use crate::config::Config;
use crate::graph::{Accessibility, DeclId, Declaration, DeclarationKind, Graph, Mark};
use tracing::info;

/// Kinds never reported as plain unused: their fate follows an enclosing
/// declaration or is covered by a dedicated analysis.
const UNREPORTED_KINDS: [DeclarationKind; 4] = [
    DeclarationKind::VarLocal,
    DeclarationKind::VarParameter,
    DeclarationKind::Module,
    DeclarationKind::GenericTypeParam,
];

fn is_reportable(graph: &Graph, id: DeclId, decl: &Declaration) -> bool {
    !decl.is_implicit
        && !decl.kind.is_accessor()
        && !decl.kind.is_extension()
        && !UNREPORTED_KINDS.contains(&decl.kind)
        && !graph.is_retained(id)
}

fn declaration_finding(decl: &Declaration, issue: DeadCodeIssue) -> DeadCode {
    DeadCode::new(decl.location.clone(), decl.name(), Some(decl.kind), issue)
}

fn unused_declarations(graph: &Graph, findings: &mut Vec<DeadCode>) {
    for id in graph.unused_declarations() {
        let Some(decl) = graph.declaration(id) else {
            continue;
        };
        if !is_reportable(graph, id, decl) {
            continue;
        }
        let issue = if graph.is_marked(id, Mark::AssignOnly) {
            DeadCodeIssue::AssignOnly
        } else {
            DeadCodeIssue::Unused
        };
        findings.push(declaration_finding(decl, issue));
    }
}

fn unused_parameters(graph: &Graph, findings: &mut Vec<DeadCode>) {
    let functions = graph
        .used()
        .iter()
        .copied()
        .filter(|id| !graph.is_ignored(*id));

    for function in functions {
        let Some(decl) = graph.declaration(function) else {
            continue;
        };
        for param in decl.unused_parameters() {
            if graph.is_retained(*param) || graph.is_ignored(*param) {
                continue;
            }
            let Some(param_decl) = graph.declaration(*param) else {
                continue;
            };
            let finding = declaration_finding(param_decl, DeadCodeIssue::UnusedParameter).with_message(format!(
                "Parameter '{}' of '{}' is unused",
                param_decl.name(),
                decl.name()
            ));
            findings.push(finding);
        }
    }
}

fn redundancies(graph: &Graph, findings: &mut Vec<DeadCode>) {
    for import in graph.unused_imports() {
        findings.push(DeadCode::new(
            import.location.clone(),
            import.module.clone(),
            None,
            DeadCodeIssue::UnusedImport,
        ));
    }

    for protocol in graph.redundant_protocols().keys() {
        if let Some(decl) = graph.declaration(*protocol) {
            findings.push(declaration_finding(decl, DeadCodeIssue::RedundantProtocol));
        }
    }

    for (id, redundant) in graph.redundant_accessibility() {
        let Some(decl) = graph.declaration(*id) else {
            continue;
        };
        let issue = match redundant.declared {
            Accessibility::Public => DeadCodeIssue::RedundantPublic,
            Accessibility::Internal => DeadCodeIssue::RedundantInternal,
            Accessibility::Fileprivate => DeadCodeIssue::RedundantFilePrivate,
            Accessibility::Private | Accessibility::Open => continue,
        };
        let finding = declaration_finding(decl, issue);
        let message = format!("{}; it could be {}", finding.message, redundant.suggested);
        findings.push(finding.with_message(message));
    }
}

/// Declarations suppressed by an ignore directive that nothing references.
fn suppressed_declarations(graph: &Graph, findings: &mut Vec<DeadCode>) {
    let suppressed = graph
        .ignored()
        .iter()
        .copied()
        .filter(|id| graph.is_retained(*id) && !graph.is_referenced(*id));

    for id in graph.sorted_declarations(suppressed) {
        let Some(decl) = graph.declaration(id) else {
            continue;
        };
        if decl.is_implicit || decl.kind.is_accessor() || UNREPORTED_KINDS.contains(&decl.kind) {
            continue;
        }
        let finding = declaration_finding(decl, DeadCodeIssue::Unused).with_severity(Severity::Info);
        let message = format!("{} (ignored by directive)", finding.message);
        findings.push(finding.with_message(message));
    }
}

/// Turns the marks a finished pipeline left on the graph into findings,
/// sorted by location.
pub fn collect_findings(graph: &Graph, config: &Config) -> Vec<DeadCode> {
    let mut findings = Vec::new();

    unused_declarations(graph, &mut findings);
    if config.detection.unused_parameters {
        unused_parameters(graph, &mut findings);
    }
    redundancies(graph, &mut findings);
    if config.report.show_ignored {
        suppressed_declarations(graph, &mut findings);
    }

    findings.retain(|f| !config.should_exclude(&f.location.file));
    findings.sort_by(|a, b| {
        (&a.location, a.issue.code(), &a.name).cmp(&(&b.location, b.issue.code(), &b.name))
    });

    info!("Collected {} findings", findings.len());
    findings
}
