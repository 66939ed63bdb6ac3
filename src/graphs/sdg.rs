//! Structural-dependency graph construction. Statements hang off their
//! enclosing structural node (the function signature or a decision diamond)
//! with plain edges. A `return` flips the builder into dead mode: every
//! later sibling of its lexical block lands in the "Dead code" cluster as a
//! disjoint node, and the flag is restored when the enclosing arm or loop
//! body ends.

use crate::ast::{Construct, ControlFlow, Expr, FuncDefn, Instruction, Unit};
use crate::graphs::{FlowEdge, FlowGraph, FlowNode, NodeKind, NodeShape, mccabe_complexity};
use indexmap::IndexMap;
use petgraph::prelude::*;
use tracing::debug;

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
    let mut b = SdgBuilder {
        g: FlowGraph::new(),
        parent: None,
        dead: false,
    };

    let sig = b.add_node(f.signature(), NodeKind::Signature, NodeShape::Oval);
    b.parent = Some(sig);

    for inst in &f.body {
        b.visit_instruction(inst);
    }

    b.dead = false;
    let complexity = mccabe_complexity(&b.g);
    b.add_node(
        format!("McCabe's complexity: {complexity}"),
        NodeKind::Annotation,
        NodeShape::Plaintext,
    );

    debug!(
        target: "sdg",
        "fn {}: {} nodes ({} dead), {} edges",
        f.name,
        b.g.node_count(),
        b.g.node_indices().filter(|&i| b.g[i].dead).count(),
        b.g.edge_count()
    );
    b.g
}

struct SdgBuilder {
    g: FlowGraph,
    parent: Option<NodeIndex>,
    dead: bool,
}

impl SdgBuilder {
    fn add_node(&mut self, label: String, kind: NodeKind, shape: NodeShape) -> NodeIndex {
        self.g.add_node(FlowNode {
            label,
            kind,
            shape,
            dead: self.dead,
        })
    }

    /// Structural link from the enclosing node. Dead nodes stay disjoint so
    /// the cluster renders as its own island.
    fn link(&mut self, child: NodeIndex) {
        if self.dead {
            return;
        }
        let Some(parent) = self.parent else {
            return;
        };
        self.g.add_edge(parent, child, FlowEdge::default());
    }

    fn statement(&mut self, label: String, shape: NodeShape) {
        let node = self.add_node(label, NodeKind::Statement, shape);
        self.link(node);
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
                self.dead = true;
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
            // Unlike the CFG, calls do appear as structural dependencies.
            Instruction::Call(call) => self.statement(call.to_string(), NodeShape::Oval),
            Instruction::Flow(flow) => self.visit_flow(flow),
        }
    }

    /// Emit a decision node and its arm body, restoring the cursor and the
    /// dead flag afterwards so a `return` inside the arm cannot leak out.
    fn arm(&mut self, label: String, body: &[Instruction], self_loop: bool) {
        let saved_parent = self.parent;
        let saved_dead = self.dead;

        let decision = self.add_node(label, NodeKind::Decision, NodeShape::Diamond);
        self.link(decision);
        self.parent = Some(decision);
        if self_loop && !self.dead {
            self.g.add_edge(decision, decision, FlowEdge::default());
        }
        for inst in body {
            self.visit_instruction(inst);
        }

        self.dead = saved_dead;
        self.parent = saved_parent;
    }

    fn visit_flow(&mut self, flow: &ControlFlow) {
        match flow {
            ControlFlow::If {
                cond,
                body,
                elifs,
                else_body,
            } => {
                self.arm(format!("if({cond})"), body, false);
                for elif in elifs {
                    self.arm(format!("elif({})", elif.cond), &elif.body, false);
                }
                if let Some(else_body) = else_body {
                    // no node of its own: the else statements hang off the
                    // enclosing structure directly
                    let saved_parent = self.parent;
                    let saved_dead = self.dead;
                    for inst in else_body {
                        self.visit_instruction(inst);
                    }
                    self.dead = saved_dead;
                    self.parent = saved_parent;
                }
            }
            ControlFlow::Unless { cond, body } => {
                self.arm(format!("unless({cond})"), body, false);
            }
            ControlFlow::Case {
                scrutinee,
                arms,
                default,
            } => {
                let saved_parent = self.parent;
                let saved_dead = self.dead;

                let decision = self.add_node(
                    format!("case({scrutinee})"),
                    NodeKind::Decision,
                    NodeShape::Diamond,
                );
                self.link(decision);
                for arm in arms {
                    self.parent = Some(decision);
                    self.arm(format!("of({})", arm.label), &arm.body, false);
                }
                self.parent = Some(decision);
                self.arm("default".to_owned(), default, false);

                self.dead = saved_dead;
                self.parent = saved_parent;
            }
            ControlFlow::While { cond, body } => {
                self.arm(format!("while({cond})"), body, true);
            }
            ControlFlow::DoWhile { body, cond } => {
                self.arm(format!("do-while({cond})"), body, true);
            }
            ControlFlow::For {
                var,
                iterable,
                body,
            } => {
                self.arm(format!("for({var} in {iterable})"), body, true);
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

#[test]
fn statements_hang_off_their_enclosing_structure() {
    let graphs = graphs_for("fn f(){ let a: int = 1; write(a); g(); } fn g(){}");
    let g = &graphs["f"];
    let sig = node_by_label(g, "f()");
    for label in ["a: int = 1", "write(a)", "g()"] {
        assert!(
            g.edges_connecting(sig, node_by_label(g, label)).next().is_some(),
            "{label} must hang off the signature"
        );
    }
}

#[test]
fn code_after_a_return_joins_the_dead_cluster() {
    let graphs = graphs_for("fn w(){ while(true){ return; write(1); } }");
    let g = &graphs["w"];

    let dead = node_by_label(g, "write(1)");
    assert!(g[dead].dead);
    // disjoint: no edges touch the dead node
    assert_eq!(g.edges_directed(dead, Incoming).count(), 0);
    assert_eq!(g.edges_directed(dead, Outgoing).count(), 0);

    let ret = node_by_label(g, "return");
    assert!(!g[ret].dead);
    assert!(g.edges_connecting(node_by_label(g, "while(true)"), ret).next().is_some());
}

#[test]
fn every_later_sibling_of_a_return_is_dead() {
    let graphs = graphs_for("fn f(){ return; write(1); write(2); write(3); }");
    let g = &graphs["f"];
    for label in ["write(1)", "write(2)", "write(3)"] {
        assert!(g[node_by_label(g, label)].dead, "{label} must be dead");
    }
}

#[test]
fn a_return_inside_an_arm_does_not_taint_the_enclosing_block() {
    let graphs = graphs_for("fn f(b: bool){ if(b){ return; } write(1); }");
    let g = &graphs["f"];
    assert!(!g[node_by_label(g, "write(1)")].dead);
    assert!(
        g.edges_connecting(node_by_label(g, "f(b: bool)"), node_by_label(g, "write(1)"))
            .next()
            .is_some()
    );
}

#[test]
fn nested_statements_after_a_return_are_dead_too() {
    let graphs = graphs_for("fn f(b: bool){ return; if(b){ write(1); } }");
    let g = &graphs["f"];
    assert!(g[node_by_label(g, "if(b)")].dead);
    assert!(g[node_by_label(g, "write(1)")].dead);
}

#[test]
fn loops_carry_a_structural_self_loop() {
    let graphs = graphs_for("fn f(n: int){ while(n == 0){ write(1); } }");
    let g = &graphs["f"];
    let header = node_by_label(g, "while(n == 0)");
    assert!(g.edges_connecting(header, header).next().is_some());
    assert!(g.edges_connecting(header, node_by_label(g, "write(1)")).next().is_some());
}

#[test]
fn edges_are_plain_structural_links() {
    let graphs = graphs_for("fn f(b: bool){ if(b){ return; } write(1); }");
    let g = &graphs["f"];
    for edge in g.edge_references() {
        assert_eq!(edge.weight().color, None);
        assert!(!edge.weight().dashed);
        assert!(edge.weight().label.is_none());
    }
}

#[test]
fn else_statements_attach_to_the_enclosing_structure() {
    let graphs = graphs_for("fn f(b: bool){ if(b){ write(1); } else { write(2); } }");
    let g = &graphs["f"];
    assert!(
        g.edges_connecting(node_by_label(g, "f(b: bool)"), node_by_label(g, "write(2)"))
            .next()
            .is_some()
    );
}
