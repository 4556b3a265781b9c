//! Terminal and JSON output.

use owo_colors::OwoColorize;
use serde_json::{Value, json};
use weft_common::{CollectingSink, Diagnostic, DiagnosticKind, DiagnosticSink, LogSink};
use weft_css::Stylesheet;
use weft_dom::{NodeId, NodeType};
use weft_layout::{DisplayList, Document, LayoutOutcome};

/// Logs every diagnostic and keeps a copy for the closing summary.
#[derive(Debug, Default)]
pub struct TeeSink {
    log: LogSink,
    /// Everything reported so far.
    pub collected: CollectingSink,
}

impl TeeSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl DiagnosticSink for TeeSink {
    fn report(&self, diagnostic: Diagnostic) {
        self.log.report(diagnostic.clone());
        self.collected.report(diagnostic);
    }
}

pub fn print_stylesheet(stylesheet: &Stylesheet) {
    println!("{} {}", "rules:".bold(), stylesheet.len());
    for rule in &stylesheet.rules {
        let selectors: Vec<String> = rule
            .selectors
            .iter()
            .map(|s| format!("{} {}", s.text.cyan(), format!("({})", s.specificity).dimmed()))
            .collect();
        println!("\n#{} {}", rule.order, selectors.join(", "));
        for property in &rule.properties {
            let important = if property.important {
                " !important".red().to_string()
            } else {
                String::new()
            };
            println!("    {}: {}{important}", property.name.green(), property.value);
        }
    }
}

pub fn stylesheet_json(stylesheet: &Stylesheet) -> Value {
    let rules: Vec<Value> = stylesheet
        .rules
        .iter()
        .map(|rule| {
            let selectors: Vec<Value> = rule
                .selectors
                .iter()
                .map(|s| json!({ "text": s.text, "specificity": s.specificity }))
                .collect();
            json!({
                "order": rule.order,
                "selectors": selectors,
                "properties": rule.properties,
            })
        })
        .collect();
    json!({ "rules": rules })
}

/// Every node under the root box in tree order, with its depth.
fn walk(document: &Document) -> Vec<(NodeId, usize)> {
    fn visit(document: &Document, node: NodeId, depth: usize, out: &mut Vec<(NodeId, usize)>) {
        out.push((node, depth));
        for &child in document.tree().children(node) {
            visit(document, child, depth + 1, out);
        }
    }
    let mut out = Vec::new();
    if let Some(root) = document.root() {
        visit(document, root, 0, &mut out);
    }
    out
}

fn label(document: &Document, node: NodeId) -> String {
    match document.tree().get(node).map(|n| &n.node_type) {
        Some(NodeType::Element(data)) => data.id().map_or_else(
            || format!("<{}>", data.tag_name),
            |id| format!("<{}#{id}>", data.tag_name),
        ),
        Some(NodeType::Text(text)) => {
            let preview: String = text.chars().take(30).collect();
            let suffix = if text.chars().count() > 30 { "..." } else { "" };
            format!("\"{}{suffix}\"", preview.replace('\n', "\\n"))
        }
        Some(NodeType::Break(kind)) => format!("break {kind:?}"),
        Some(NodeType::Marker(bullet)) => format!("marker {bullet:?}"),
        Some(NodeType::Replaced(data)) => format!("[{}]", data.kind),
        Some(NodeType::Document) | None => format!("{node:?}"),
    }
}

pub fn layout_json(document: &Document, outcome: &LayoutOutcome, list: &DisplayList) -> Value {
    let frames: Vec<Value> = walk(document)
        .into_iter()
        .filter_map(|(node, depth)| {
            let rect = document.absolute_rect(node).ok()?;
            Some(json!({
                "node": node,
                "depth": depth,
                "label": label(document, node),
                "rect": rect,
            }))
        })
        .collect();
    json!({
        "height": outcome.height,
        "needs_another_pass": outcome.needs_another_pass,
        "frames": frames,
        "display_list": list.commands(),
    })
}

pub fn print_layout(document: &Document, outcome: &LayoutOutcome, list: &DisplayList) {
    println!("{}", "=== Layout ===".bold());
    let pending = if outcome.needs_another_pass {
        " (replaced content still loading)".yellow().to_string()
    } else {
        String::new()
    };
    println!("height {:.1}{pending}", outcome.height);
    for (node, depth) in walk(document) {
        let indent = "  ".repeat(depth);
        let name = label(document, node);
        match document.absolute_rect(node) {
            Ok(r) => println!(
                "{indent}{} x={:.1} y={:.1} w={:.1} h={:.1}",
                name.cyan(),
                r.x,
                r.y,
                r.width,
                r.height
            ),
            Err(_) => println!("{indent}{} {}", name.cyan(), "(not laid out)".dimmed()),
        }
    }

    println!("\n{}", format!("=== Display list ({} commands) ===", list.len()).bold());
    for command in list.commands() {
        match serde_json::to_string(command) {
            Ok(line) => println!("  {line}"),
            Err(e) => log::warn!(target: "weft::cli", "cannot print {command:?}: {e}"),
        }
    }
}

pub fn print_diagnostics(diagnostics: &[Diagnostic]) {
    if diagnostics.is_empty() {
        return;
    }
    eprintln!("\n{}", format!("=== Diagnostics ({}) ===", diagnostics.len()).bold());
    for kind in [
        DiagnosticKind::AllocationFailure,
        DiagnosticKind::IterationBudgetExceeded,
        DiagnosticKind::ParseRecoverable,
        DiagnosticKind::Unsupported,
    ] {
        let count = diagnostics.iter().filter(|d| d.kind == kind).count();
        if count == 0 {
            continue;
        }
        let line = format!("{kind}: {count}");
        match kind {
            DiagnosticKind::AllocationFailure | DiagnosticKind::IterationBudgetExceeded => {
                eprintln!("  {}", line.red());
            }
            DiagnosticKind::ParseRecoverable => eprintln!("  {}", line.yellow()),
            DiagnosticKind::Unsupported => eprintln!("  {}", line.dimmed()),
        }
    }
}
