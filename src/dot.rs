//! Graphviz dot rendering of a genealogy graph.
//!
//! Output is byte-for-byte stable for a given graph: nodes and edges follow
//! the order of `Geneagraph::nodes`, and each record's advisors are emitted
//! once each in first-seen order.

use std::collections::HashSet;

use crate::graph::{Geneagraph, Record};

const INDENT: &str = "\n    ";

/// Escape characters that would end or break a quoted dot label.
fn escape_label(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// `name`, plus a second line of `institution (year)` when either is known.
fn node_label(record: &Record) -> String {
    let mut label = escape_label(&record.name);

    let mut details = Vec::with_capacity(2);
    if let Some(institution) = &record.institution {
        details.push(escape_label(institution));
    }
    if let Some(year) = record.year {
        details.push(format!("({year})"));
    }

    if !details.is_empty() {
        label.push_str("\\n");
        label.push_str(&details.join(" "));
    }
    label
}

fn node_statement(record: &Record) -> String {
    format!("{} [label=\"{}\"];", record.id, node_label(record))
}

/// One `advisor -> record` statement per distinct advisor.
fn edge_statements(record: &Record) -> impl Iterator<Item = String> + '_ {
    let mut seen = HashSet::new();
    record
        .advisors
        .iter()
        .filter(move |advisor| seen.insert(**advisor))
        .map(move |advisor| format!("{} -> {};", advisor, record.id))
}

/// Encode a graph as a dot digraph. Advisor ids missing from `nodes` still
/// produce edges; Graphviz renders them as bare nodes.
///
/// Names and institutions are escaped (`"` as `\"`, `\` as `\\`, newline as
/// `\n`) so each label stays a single quoted dot string. Labels containing
/// those characters therefore differ from a raw, unescaped rendering; all
/// other labels are emitted unchanged.
pub fn encode(graph: &Geneagraph) -> String {
    let nodes: Vec<String> = graph.nodes.records().map(node_statement).collect();
    let edges: Vec<String> = graph.nodes.records().flat_map(edge_statements).collect();

    format!(
        "digraph {{\n    node [shape=plaintext];\n    edge [style=bold];\n\n    {}\n\n    {}\n}}",
        nodes.join(INDENT),
        edges.join(INDENT)
    )
}
