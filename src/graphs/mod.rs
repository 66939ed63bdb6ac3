//! Shared graph vocabulary for the two per-function graph builders. Both
//! produce a petgraph directed multigraph whose nodes and edges carry the
//! rendering attributes the DOT writer needs.

pub mod cfg;
pub mod dot;
pub mod render;
pub mod sdg;

use petgraph::prelude::*;

pub const SIGNATURE_FILL: &str = "#c8f771";
pub const RETURN_FILL: &str = "#e085dd";
pub const TERMINATOR_FILL: &str = "gray";
pub const DEAD_CLUSTER_COLOR: &str = "lightgray";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Function header, the entry of every graph.
    Signature,
    /// Plain statement.
    Statement,
    /// Branch or loop condition.
    Decision,
    /// Structural marker (`<end fn>`, `<end if>`, `<begin do-while>`, ...).
    Terminator,
    /// `return`, with or without a value.
    Return,
    /// Free-floating text such as the complexity note; never counted.
    Annotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeShape {
    Oval,
    Rectangle,
    Diamond,
    Plaintext,
}

impl NodeShape {
    pub fn dot_name(self) -> &'static str {
        match self {
            NodeShape::Oval => "oval",
            NodeShape::Rectangle => "rectangle",
            NodeShape::Diamond => "diamond",
            NodeShape::Plaintext => "plaintext",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeColor {
    Green,
    Red,
    Gray,
}

impl EdgeColor {
    pub fn dot_name(self) -> &'static str {
        match self {
            EdgeColor::Green => "green",
            EdgeColor::Red => "red",
            EdgeColor::Gray => "gray",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FlowNode {
    pub label: String,
    pub kind: NodeKind,
    pub shape: NodeShape,
    /// SDG only: membership in the "Dead code" cluster.
    pub dead: bool,
}

impl FlowNode {
    pub fn fill(&self) -> Option<&'static str> {
        match self.kind {
            NodeKind::Signature => Some(SIGNATURE_FILL),
            NodeKind::Return => Some(RETURN_FILL),
            NodeKind::Terminator => Some(TERMINATOR_FILL),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FlowEdge {
    pub color: Option<EdgeColor>,
    pub dashed: bool,
    pub label: Option<&'static str>,
}

pub type FlowGraph = Graph<FlowNode, FlowEdge>;

/// `E − N + 2` over the graph as built so far, annotations excluded.
pub fn mccabe_complexity(g: &FlowGraph) -> i64 {
    let nodes = g
        .node_indices()
        .filter(|&i| g[i].kind != NodeKind::Annotation)
        .count() as i64;
    g.edge_count() as i64 - nodes + 2
}

#[test]
fn complexity_ignores_annotation_nodes() {
    let mut g = FlowGraph::new();
    let a = g.add_node(FlowNode {
        label: "a".into(),
        kind: NodeKind::Signature,
        shape: NodeShape::Oval,
        dead: false,
    });
    let b = g.add_node(FlowNode {
        label: "b".into(),
        kind: NodeKind::Terminator,
        shape: NodeShape::Diamond,
        dead: false,
    });
    g.add_edge(a, b, FlowEdge::default());
    assert_eq!(mccabe_complexity(&g), 1);

    g.add_node(FlowNode {
        label: "McCabe's complexity: 1".into(),
        kind: NodeKind::Annotation,
        shape: NodeShape::Plaintext,
        dead: false,
    });
    assert_eq!(mccabe_complexity(&g), 1);
}
