//! DOT serialization for the flow graphs. Kept by hand because the output
//! vocabulary (filled terminator diamonds, dashed dead edges, the clustered
//! dead-code subgraph) goes beyond what stock exporters emit.

use crate::graphs::{DEAD_CLUSTER_COLOR, FlowGraph};
use petgraph::prelude::*;
use std::fmt::Write;

fn quote(label: &str) -> String {
    let mut out = String::with_capacity(label.len() + 2);
    out.push('"');
    for ch in label.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}

fn node_line(g: &FlowGraph, idx: NodeIndex, indent: &str, out: &mut String) {
    let node = &g[idx];
    let mut attrs = format!(
        "label={}, shape={}",
        quote(&node.label),
        node.shape.dot_name()
    );
    if let Some(fill) = node.fill() {
        let _ = write!(attrs, ", fillcolor=\"{fill}\", style=filled");
    }
    let _ = writeln!(out, "{indent}node{} [{attrs}];", idx.index());
}

/// Serialize one graph. `rankdir` is set for the SDG's left-to-right layout;
/// nodes flagged dead are grouped into the "Dead code" cluster.
pub fn to_dot(g: &FlowGraph, rankdir: Option<&str>) -> String {
    let mut out = String::from("digraph F {\n");
    if let Some(dir) = rankdir {
        let _ = writeln!(out, "    rankdir={dir};");
    }

    for idx in g.node_indices().filter(|&i| !g[i].dead) {
        node_line(g, idx, "    ", &mut out);
    }

    if g.node_indices().any(|i| g[i].dead) {
        out.push_str("    subgraph cluster_box {\n");
        out.push_str("        style=filled;\n");
        let _ = writeln!(out, "        color={DEAD_CLUSTER_COLOR};");
        out.push_str("        label=\"Dead code\";\n");
        for idx in g.node_indices().filter(|&i| g[i].dead) {
            node_line(g, idx, "        ", &mut out);
        }
        out.push_str("    }\n");
    }

    for edge in g.edge_references() {
        let mut attrs = Vec::new();
        if let Some(color) = edge.weight().color {
            attrs.push(format!("color={}", color.dot_name()));
        }
        if edge.weight().dashed {
            attrs.push("style=dashed".to_owned());
        }
        if let Some(label) = edge.weight().label {
            attrs.push(format!("label={}", quote(label)));
        }
        let _ = write!(
            out,
            "    node{} -> node{}",
            edge.source().index(),
            edge.target().index()
        );
        if attrs.is_empty() {
            out.push_str(";\n");
        } else {
            let _ = writeln!(out, " [{}];", attrs.join(", "));
        }
    }

    out.push_str("}\n");
    out
}

// -------------------------------------------------------------------------

#[cfg(test)]
use crate::graphs::{FlowEdge, FlowNode, NodeKind, NodeShape};

#[test]
fn nodes_and_edges_serialize_with_their_attributes() {
    let mut g = FlowGraph::new();
    let sig = g.add_node(FlowNode {
        label: "f()".into(),
        kind: NodeKind::Signature,
        shape: NodeShape::Oval,
        dead: false,
    });
    let ret = g.add_node(FlowNode {
        label: "return".into(),
        kind: NodeKind::Return,
        shape: NodeShape::Rectangle,
        dead: false,
    });
    g.add_edge(
        sig,
        ret,
        FlowEdge {
            color: Some(crate::graphs::EdgeColor::Green),
            dashed: false,
            label: None,
        },
    );

    let dot = to_dot(&g, None);
    assert!(dot.contains("node0 [label=\"f()\", shape=oval, fillcolor=\"#c8f771\", style=filled];"));
    assert!(
        dot.contains("node1 [label=\"return\", shape=rectangle, fillcolor=\"#e085dd\", style=filled];")
    );
    assert!(dot.contains("node0 -> node1 [color=green];"));
}

#[test]
fn dead_nodes_land_in_the_cluster() {
    let mut g = FlowGraph::new();
    g.add_node(FlowNode {
        label: "f()".into(),
        kind: NodeKind::Signature,
        shape: NodeShape::Oval,
        dead: false,
    });
    g.add_node(FlowNode {
        label: "write(1)".into(),
        kind: NodeKind::Statement,
        shape: NodeShape::Rectangle,
        dead: true,
    });

    let dot = to_dot(&g, Some("LR"));
    assert!(dot.contains("rankdir=LR;"));
    let cluster_start = dot.find("subgraph cluster_box").unwrap();
    assert!(dot.contains("label=\"Dead code\";"));
    assert!(dot.contains("color=lightgray;"));
    assert!(dot[cluster_start..].contains("write(1)"));
    assert!(!dot[..cluster_start].contains("write(1)"));
}

#[test]
fn quotes_in_labels_are_escaped() {
    let mut g = FlowGraph::new();
    g.add_node(FlowNode {
        label: "write(\"hi\")".into(),
        kind: NodeKind::Statement,
        shape: NodeShape::Rectangle,
        dead: false,
    });
    let dot = to_dot(&g, None);
    assert!(dot.contains(r#"label="write(\"hi\")""#));
}
