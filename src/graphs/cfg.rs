//! Control-flow graph construction. The builder is a cursor machine walking
//! one function at a time: `parent` is the node the next emission hangs off,
//! `edge_color` the pending branch color, and `dead_edge` marks the edge
//! leaving a `return` as unreachable.

use crate::ast::{Construct, ControlFlow, Expr, FuncDefn, Instruction, Unit};
use crate::graphs::{
    EdgeColor, FlowEdge, FlowGraph, FlowNode, NodeKind, NodeShape, mccabe_complexity,
};
use indexmap::IndexMap;
use petgraph::prelude::*;
use tracing::debug;

/// One graph per function, in definition order.
pub fn build(unit: &Unit) -> IndexMap<String, FlowGraph> {
    let mut graphs = IndexMap::new();
    for construct in &unit.constructs {
        if let Construct::Func(f) = construct {
            graphs.insert(f.name.clone(), build_function(f));
        }
    }
    graphs
}

fn comma_join(args: &[Expr]) -> String {
    args.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn build_function(f: &FuncDefn) -> FlowGraph {
    let mut b = CfgBuilder {
        g: FlowGraph::new(),
        parent: None,
        edge_color: None,
        dead_edge: false,
    };

    let sig = b.add_node(f.signature(), NodeKind::Signature, NodeShape::Oval);
    b.parent = Some(sig);

    for inst in &f.body {
        b.visit_instruction(inst);
    }

    let end = b.add_node("<end fn>".to_owned(), NodeKind::Terminator, NodeShape::Diamond);
    b.link(end);

    // Counted before the annotation lands so the note never counts itself.
    let complexity = mccabe_complexity(&b.g);
    b.add_node(
        format!("McCabe's complexity: {complexity}"),
        NodeKind::Annotation,
        NodeShape::Plaintext,
    );

    debug!(
        target: "cfg",
        "fn {}: {} nodes, {} edges, complexity {}",
        f.name,
        b.g.node_count(),
        b.g.edge_count(),
        complexity
    );
    b.g
}

struct CfgBuilder {
    g: FlowGraph,
    parent: Option<NodeIndex>,
    edge_color: Option<EdgeColor>,
    dead_edge: bool,
}

impl CfgBuilder {
    fn add_node(&mut self, label: String, kind: NodeKind, shape: NodeShape) -> NodeIndex {
        self.g.add_node(FlowNode {
            label,
            kind,
            shape,
            dead: false,
        })
    }

    /// Wire `child` from the cursor, consuming the pending edge attributes.
    fn link(&mut self, child: NodeIndex) {
        let Some(parent) = self.parent else {
            return;
        };
        let edge = if self.dead_edge {
            FlowEdge {
                color: Some(EdgeColor::Gray),
                dashed: true,
                label: Some("dead code!"),
            }
        } else {
            FlowEdge {
                color: self.edge_color,
                dashed: false,
                label: None,
            }
        };
        debug!(target: "cfg", "edge {} -> {} ({:?})", parent.index(), child.index(), edge.color);
        self.g.add_edge(parent, child, edge);
        self.dead_edge = false;
    }

    fn statement(&mut self, label: String, shape: NodeShape) {
        let node = self.add_node(label, NodeKind::Statement, shape);
        self.link(node);
        self.edge_color = None;
        self.parent = Some(node);
    }

    fn visit_instruction(&mut self, inst: &Instruction) {
        match inst {
            Instruction::VarDefn(v) => {
                self.statement(format!("{} = {}", v.bind, v.init), NodeShape::Oval)
            }
            Instruction::Return(expr) => {
                let label = match expr {
                    Some(e) => format!("return {e}"),
                    None => "return".to_owned(),
                };
                let node = self.add_node(label, NodeKind::Return, NodeShape::Rectangle);
                self.link(node);
                self.edge_color = None;
                self.dead_edge = true;
                self.parent = Some(node);
            }
            Instruction::Write(args) => {
                self.statement(format!("write({})", comma_join(args)), NodeShape::Rectangle)
            }
            Instruction::Assign { name, index, value } => {
                let label = match index {
                    Some(i) => format!("{name}[{i}] = {value}"),
                    None => format!("{name} = {value}"),
                };
                self.statement(label, NodeShape::Rectangle)
            }
            // Standalone calls are not control transfers; they add nothing.
            Instruction::Call(_) => {}
            Instruction::Flow(flow) => self.visit_flow(flow),
        }
    }

    fn visit_flow(&mut self, flow: &ControlFlow) {
        match flow {
            ControlFlow::If {
                cond,
                body,
                elifs,
                else_body,
            } => {
                let decision = self.add_node(
                    format!("if({cond})"),
                    NodeKind::Decision,
                    NodeShape::Diamond,
                );
                self.link(decision);
                self.parent = Some(decision);
                self.edge_color = Some(EdgeColor::Green);
                for inst in body {
                    self.visit_instruction(inst);
                }

                let merge = self.add_node(
                    "<end if>".to_owned(),
                    NodeKind::Terminator,
                    NodeShape::Diamond,
                );
                self.link(merge);

                if elifs.is_empty() && else_body.is_none() {
                    self.edge_color = Some(EdgeColor::Red);
                    self.parent = Some(decision);
                    self.link(merge);
                } else {
                    let mut prev_decision = decision;
                    for arm in elifs {
                        self.edge_color = Some(EdgeColor::Red);
                        self.parent = Some(prev_decision);
                        let elif_decision = self.add_node(
                            format!("elif({})", arm.cond),
                            NodeKind::Decision,
                            NodeShape::Diamond,
                        );
                        self.link(elif_decision);
                        self.parent = Some(elif_decision);
                        self.edge_color = Some(EdgeColor::Green);
                        for inst in &arm.body {
                            self.visit_instruction(inst);
                        }
                        self.link(merge);
                        prev_decision = elif_decision;
                    }
                    if let Some(else_body) = else_body {
                        self.edge_color = Some(EdgeColor::Red);
                        self.parent = Some(prev_decision);
                        for inst in else_body {
                            self.visit_instruction(inst);
                        }
                        self.link(merge);
                    } else {
                        self.edge_color = Some(EdgeColor::Red);
                        self.parent = Some(prev_decision);
                        self.link(merge);
                    }
                }

                self.edge_color = None;
                self.parent = Some(merge);
            }
            ControlFlow::Unless { cond, body } => {
                // Mirrored single-arm if: red enters the body, green skips it.
                let decision = self.add_node(
                    format!("unless({cond})"),
                    NodeKind::Decision,
                    NodeShape::Diamond,
                );
                self.link(decision);
                self.parent = Some(decision);
                self.edge_color = Some(EdgeColor::Red);
                for inst in body {
                    self.visit_instruction(inst);
                }
                let merge = self.add_node(
                    "<end unless>".to_owned(),
                    NodeKind::Terminator,
                    NodeShape::Diamond,
                );
                self.link(merge);
                self.edge_color = Some(EdgeColor::Green);
                self.parent = Some(decision);
                self.link(merge);
                self.edge_color = None;
                self.parent = Some(merge);
            }
            ControlFlow::Case {
                scrutinee,
                arms,
                default,
            } => {
                let decision = self.add_node(
                    format!("case({scrutinee})"),
                    NodeKind::Decision,
                    NodeShape::Diamond,
                );
                self.link(decision);
                self.edge_color = None;
                let merge = self.add_node(
                    "<end case>".to_owned(),
                    NodeKind::Terminator,
                    NodeShape::Diamond,
                );
                for arm in arms {
                    self.parent = Some(decision);
                    let arm_decision = self.add_node(
                        format!("of({})", arm.label),
                        NodeKind::Decision,
                        NodeShape::Diamond,
                    );
                    self.link(arm_decision);
                    self.parent = Some(arm_decision);
                    for inst in &arm.body {
                        self.visit_instruction(inst);
                    }
                    self.link(merge);
                }
                self.parent = Some(decision);
                let default_decision =
                    self.add_node("default".to_owned(), NodeKind::Decision, NodeShape::Diamond);
                self.link(default_decision);
                self.parent = Some(default_decision);
                for inst in default {
                    self.visit_instruction(inst);
                }
                self.link(merge);
                self.edge_color = None;
                self.parent = Some(merge);
            }
            ControlFlow::While { cond, body } => {
                let decision = self.add_node(
                    format!("while({cond})"),
                    NodeKind::Decision,
                    NodeShape::Diamond,
                );
                self.link(decision);
                self.parent = Some(decision);
                self.edge_color = Some(EdgeColor::Green);
                for inst in body {
                    self.visit_instruction(inst);
                }
                // back edge into the loop header
                self.link(decision);

                let merge = self.add_node(
                    "<end while>".to_owned(),
                    NodeKind::Terminator,
                    NodeShape::Diamond,
                );
                self.parent = Some(decision);
                self.edge_color = Some(EdgeColor::Red);
                self.link(merge);
                self.edge_color = None;
                self.parent = Some(merge);
            }
            ControlFlow::DoWhile { body, cond } => {
                let begin = self.add_node(
                    "<begin do-while>".to_owned(),
                    NodeKind::Terminator,
                    NodeShape::Diamond,
                );
                self.link(begin);
                self.parent = Some(begin);
                for inst in body {
                    self.visit_instruction(inst);
                }
                let decision = self.add_node(
                    format!("while({cond})"),
                    NodeKind::Decision,
                    NodeShape::Diamond,
                );
                self.link(decision);
                self.parent = Some(decision);
                self.edge_color = Some(EdgeColor::Green);
                self.link(begin);
                // the red exit stays pending for whatever follows the loop
                self.edge_color = Some(EdgeColor::Red);
            }
            ControlFlow::For {
                var,
                iterable,
                body,
            } => {
                let decision = self.add_node(
                    format!("for({var} in {iterable})"),
                    NodeKind::Decision,
                    NodeShape::Diamond,
                );
                self.link(decision);
                self.parent = Some(decision);
                self.edge_color = Some(EdgeColor::Green);
                for inst in body {
                    self.visit_instruction(inst);
                }
                self.link(decision);

                let merge = self.add_node(
                    "<end for>".to_owned(),
                    NodeKind::Terminator,
                    NodeShape::Diamond,
                );
                self.parent = Some(decision);
                self.edge_color = Some(EdgeColor::Red);
                self.link(merge);
                self.edge_color = None;
                self.parent = Some(merge);
            }
        }
    }
}

// -------------------------------------------------------------------------

#[cfg(test)]
fn graphs_for(src: &str) -> IndexMap<String, FlowGraph> {
    build(&crate::parser::parse_unit(src).expect("source should parse"))
}

#[cfg(test)]
fn node_by_label(g: &FlowGraph, label: &str) -> NodeIndex {
    g.node_indices()
        .find(|&i| g[i].label == label)
        .unwrap_or_else(|| panic!("no node labeled '{label}'"))
}

#[cfg(test)]
fn edge_between<'a>(g: &'a FlowGraph, from: &str, to: &str) -> &'a FlowEdge {
    let (a, b) = (node_by_label(g, from), node_by_label(g, to));
    let edge = g
        .edges_connecting(a, b)
        .next()
        .unwrap_or_else(|| panic!("no edge '{from}' -> '{to}'"));
    edge.weight()
}

#[cfg(test)]
fn recorded_complexity(g: &FlowGraph) -> i64 {
    let note = g
        .node_indices()
        .find(|&i| g[i].kind == NodeKind::Annotation)
        .expect("complexity annotation");
    g[note]
        .label
        .strip_prefix("McCabe's complexity: ")
        .unwrap()
        .parse()
        .unwrap()
}

#[test]
fn straight_line_function_has_complexity_one() {
    let graphs = graphs_for("fn h(){ let a: array<int, 3> = {1,2,3}; a[0] = 9; }");
    let g = &graphs["h"];

    let kinds: Vec<_> = g.node_indices().map(|i| g[i].kind).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::Signature,
            NodeKind::Statement,
            NodeKind::Statement,
            NodeKind::Terminator,
            NodeKind::Annotation,
        ]
    );
    assert_eq!(recorded_complexity(g), 1);

    let sig = node_by_label(g, "h()");
    assert_eq!(g[sig].shape, NodeShape::Oval);
    assert!(g.edges_connecting(sig, node_by_label(g, "a: array<int, 3> = {1, 2, 3}")).next().is_some());
}

#[test]
fn return_inside_while_leaves_a_dead_edge() {
    let graphs = graphs_for("fn w(){ while(true){ return; write(1); } }");
    let g = &graphs["w"];

    let dead = edge_between(g, "return", "write(1)");
    assert!(dead.dashed);
    assert_eq!(dead.color, Some(EdgeColor::Gray));
    assert_eq!(dead.label, Some("dead code!"));

    // body falls back into the loop header, red edge exits it
    assert!(g.edges_connecting(node_by_label(g, "write(1)"), node_by_label(g, "while(true)")).next().is_some());
    let exit = edge_between(g, "while(true)", "<end while>");
    assert_eq!(exit.color, Some(EdgeColor::Red));
    assert_eq!(recorded_complexity(g), 2);
}

#[test]
fn for_loop_gets_green_entry_and_red_exit() {
    let graphs = graphs_for("fn e(){ for(x in {1,2,3}){ let y: int = x + 0; } }");
    let g = &graphs["e"];

    let entry = edge_between(g, "for(x in {1, 2, 3})", "y: int = x + 0");
    assert_eq!(entry.color, Some(EdgeColor::Green));
    let exit = edge_between(g, "for(x in {1, 2, 3})", "<end for>");
    assert_eq!(exit.color, Some(EdgeColor::Red));
}

#[test]
fn elif_chains_off_the_previous_decision_red_edge() {
    let graphs = graphs_for(
        "fn f(b: bool){ if(b){ write(1); } elif(!b){ write(2); } else { write(3); } }",
    );
    let g = &graphs["f"];

    assert_eq!(
        edge_between(g, "if(b)", "write(1)").color,
        Some(EdgeColor::Green)
    );
    assert_eq!(
        edge_between(g, "if(b)", "elif(!b)").color,
        Some(EdgeColor::Red)
    );
    assert_eq!(
        edge_between(g, "elif(!b)", "write(2)").color,
        Some(EdgeColor::Green)
    );
    assert_eq!(
        edge_between(g, "elif(!b)", "write(3)").color,
        Some(EdgeColor::Red)
    );
    // all three bodies converge on the merge diamond
    for label in ["write(1)", "write(2)", "write(3)"] {
        assert!(
            g.edges_connecting(node_by_label(g, label), node_by_label(g, "<end if>"))
                .next()
                .is_some(),
            "{label} must reach <end if>"
        );
    }
}

#[test]
fn unless_mirrors_a_single_arm_if() {
    let graphs = graphs_for("fn f(b: bool){ unless(b){ write(1); } }");
    let g = &graphs["f"];
    assert_eq!(
        edge_between(g, "unless(b)", "write(1)").color,
        Some(EdgeColor::Red)
    );
    assert_eq!(
        edge_between(g, "unless(b)", "<end unless>").color,
        Some(EdgeColor::Green)
    );
}

#[test]
fn case_arms_converge_on_the_end_case_diamond() {
    let graphs = graphs_for(
        r#"fn f(n: int){ case(n){ of(1){ write(1); } of(2){ } default { write(0); } } }"#,
    );
    let g = &graphs["f"];
    for arm in ["of(1)", "of(2)", "default"] {
        assert!(
            g.edges_connecting(node_by_label(g, "case(n)"), node_by_label(g, arm))
                .next()
                .is_some()
        );
    }
    assert!(g.edges_connecting(node_by_label(g, "write(1)"), node_by_label(g, "<end case>")).next().is_some());
    // empty arm connects its decision straight to the merge
    assert!(g.edges_connecting(node_by_label(g, "of(2)"), node_by_label(g, "<end case>")).next().is_some());
}

#[test]
fn do_while_loops_green_back_to_its_begin_marker() {
    let graphs = graphs_for("fn f(){ do { write(1); } while(true); write(2); }");
    let g = &graphs["f"];
    assert_eq!(
        edge_between(g, "while(true)", "<begin do-while>").color,
        Some(EdgeColor::Green)
    );
    // the pending red exit attaches to the statement after the loop
    assert_eq!(
        edge_between(g, "while(true)", "write(2)").color,
        Some(EdgeColor::Red)
    );
}

#[test]
fn standalone_calls_add_no_nodes() {
    let graphs = graphs_for("fn g(){} fn f(){ g(); write(1); }");
    let g = &graphs["f"];
    assert!(g.node_indices().all(|i| !g[i].label.starts_with("g(")));
}

#[test]
fn recorded_complexity_matches_the_formula() {
    let graphs = graphs_for(
        r#"
        fn f(n: int, b: bool) -> int {
            if(b){ write(1); } elif(!b){ write(2); } else { write(3); }
            while(n != 0){ n = n - 1; }
            case(n){ of(1){ } default { } }
            return n;
        }
        fn g(){ unless(false){ write(1); } }
        "#,
    );
    for (name, g) in &graphs {
        assert_eq!(
            recorded_complexity(g),
            mccabe_complexity(g),
            "complexity identity for fn {name}"
        );
    }
}
