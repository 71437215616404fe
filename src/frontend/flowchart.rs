//! Flowchart: control flow of each function as a Graphviz graph
//!
//! Functions are chained from a `Start` node to an `End` node in source
//! order. Conditions become diamonds, `if` branches rejoin at an invisible
//! merge point and loop bodies flow back to their condition. Labels reuse the
//! pseudocode printer, so they read exactly like `clens pseudo` output.

use std::fmt;

use log::debug;

use crate::frontend::ast::*;
use crate::frontend::pseudocode::Pseudocode;

/// Index of a node in [`Flowchart::nodes`]
pub type NodeId = usize;

/// What a node stands for; decides its Graphviz shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowNodeKind {
    /// `Start` or `End`
    Terminal,
    /// Function entry; `main` is drawn differently
    Function { main: bool },
    /// Branch or loop condition
    Decision,
    /// Invisible join after a branch or loop
    Merge,
    Statement,
    Declaration,
    Return,
}

impl FlowNodeKind {
    fn attributes(self) -> &'static str {
        match self {
            Self::Terminal => "shape=ellipse",
            Self::Function { main: true } => "shape=Mdiamond",
            Self::Function { main: false } => "shape=box style=filled fillcolor=lightgrey",
            Self::Decision => "shape=diamond",
            Self::Merge => "shape=point width=0.01 height=0.01",
            Self::Statement => "shape=box style=rounded",
            Self::Declaration => "shape=note",
            Self::Return => "shape=parallelogram style=filled fillcolor=lightblue",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowNode {
    pub label: String,
    pub kind: FlowNodeKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowEdge {
    pub from: NodeId,
    pub to: NodeId,
    pub label: Option<&'static str>,
}

/// A directed graph of flow nodes; `Display` writes it as DOT
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flowchart {
    nodes: Vec<FlowNode>,
    edges: Vec<FlowEdge>,
}

impl Flowchart {
    pub fn nodes(&self) -> &[FlowNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[FlowEdge] {
        &self.edges
    }

    /// First node with this label
    pub fn find(&self, label: &str) -> Option<NodeId> {
        self.nodes.iter().position(|n| n.label == label)
    }

    /// Labelled edges leaving `from`, in insertion order
    pub fn edges_from(&self, from: NodeId) -> impl Iterator<Item = &FlowEdge> {
        self.edges.iter().filter(move |e| e.from == from)
    }

    pub fn to_dot(&self) -> String {
        self.to_string()
    }
}

fn escape(label: &str) -> String {
    label.replace('"', "\\\"").replace('\n', "\\n")
}

impl fmt::Display for Flowchart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "// C Code Flowchart")?;
        writeln!(f, "strict digraph {{")?;
        writeln!(f, "  rankdir=TB")?;
        for (id, node) in self.nodes.iter().enumerate() {
            writeln!(
                f,
                "  node{} [label=\"{}\" {}]",
                id,
                escape(&node.label),
                node.kind.attributes()
            )?;
        }
        for edge in &self.edges {
            match edge.label {
                Some(label) => writeln!(f, "  node{} -> node{} [label=\"{}\"]", edge.from, edge.to, label)?,
                None => writeln!(f, "  node{} -> node{}", edge.from, edge.to)?,
            }
        }
        write!(f, "}}")
    }
}

/// Walks the tree keeping the node the next statement attaches to
struct Builder {
    chart: Flowchart,
    current: NodeId,
}

impl Builder {
    fn new() -> Self {
        let mut chart = Flowchart::default();
        chart.nodes.push(FlowNode {
            label: "Start".to_string(),
            kind: FlowNodeKind::Terminal,
        });
        Self { chart, current: 0 }
    }

    fn add_node(&mut self, label: impl Into<String>, kind: FlowNodeKind) -> NodeId {
        self.chart.nodes.push(FlowNode {
            label: label.into(),
            kind,
        });
        self.chart.nodes.len() - 1
    }

    fn add_edge(&mut self, from: NodeId, to: NodeId, label: Option<&'static str>) {
        let edge = FlowEdge { from, to, label };
        // Strict graphs keep one edge per pair
        if !self.chart.edges.iter().any(|e| e.from == from && e.to == to) {
            self.chart.edges.push(edge);
        }
    }

    /// Add a node after the current one and make it current
    fn then(&mut self, label: impl Into<String>, kind: FlowNodeKind) -> NodeId {
        let id = self.add_node(label, kind);
        self.add_edge(self.current, id, None);
        self.current = id;
        id
    }

    fn function(&mut self, func: &FunctionDeclaration) {
        let main = func.name == "main";
        self.then(format!("Function: {}()", func.name), FlowNodeKind::Function { main });
        self.block(&func.body);
    }

    fn block(&mut self, block: &CompoundStatement) {
        for stmt in &block.body {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Compound(block) => self.block(block),
            Stmt::Declaration(decl) => {
                self.then(decl.declarators(), FlowNodeKind::Declaration);
            }
            Stmt::Expression { expression, .. } => {
                self.then(expression.render(0), FlowNodeKind::Statement);
            }
            Stmt::Return { expression, .. } => {
                let label = match expression {
                    Some(expr) => format!("Return {}", expr.render(0)),
                    None => "Return".to_string(),
                };
                self.then(label, FlowNodeKind::Return);
            }
            Stmt::If { condition, then, else_branch, .. } => {
                let decision = self.then(format!("If ({})", condition.render(0)), FlowNodeKind::Decision);
                let merge = self.add_node(" ", FlowNodeKind::Merge);

                self.block(then);
                self.add_edge(self.current, merge, Some("True"));

                self.current = decision;
                if let Some(else_branch) = else_branch {
                    self.block(else_branch);
                }
                self.add_edge(self.current, merge, Some("False"));
                self.current = merge;
            }
            Stmt::While { condition, body, .. } => {
                let decision = self.then(format!("While ({})", condition.render(0)), FlowNodeKind::Decision);
                let exit = self.add_node("", FlowNodeKind::Merge);

                self.block(body);
                self.add_edge(self.current, decision, Some("Loop"));
                self.add_edge(decision, exit, Some("False"));
                self.current = exit;
            }
            Stmt::For { initialization, condition, increment, body, .. } => {
                match initialization {
                    Some(ForInit::Declaration(decl)) => {
                        self.then(decl.declarators(), FlowNodeKind::Declaration);
                    }
                    Some(ForInit::Expression(expr)) => {
                        self.then(expr.render(0), FlowNodeKind::Statement);
                    }
                    None => {}
                }
                let cond = condition.as_ref().map_or_else(|| "True".to_string(), |c| c.render(0));
                let decision = self.then(format!("For ({})", cond), FlowNodeKind::Decision);
                let exit = self.add_node("", FlowNodeKind::Merge);

                // The body ends at the increment, which leads back to the condition
                let step = match increment {
                    Some(expr) => {
                        let step = self.add_node(expr.render(0), FlowNodeKind::Statement);
                        self.add_edge(step, decision, None);
                        step
                    }
                    None => decision,
                };

                self.block(body);
                self.add_edge(self.current, step, Some("Loop"));
                self.add_edge(decision, exit, Some("False"));
                self.current = exit;
            }
            Stmt::Unsupported { .. } => {
                self.then(stmt.render(0), FlowNodeKind::Statement);
            }
        }
    }

    fn finish(mut self) -> Flowchart {
        let end = self.add_node("End", FlowNodeKind::Terminal);
        self.add_edge(self.current, end, None);
        self.chart
    }
}

/// Build the flowchart of every function in `program`
///
/// Preprocessor lines and global declarations are not part of any flow and
/// are skipped.
pub fn flowchart(program: &Program) -> Flowchart {
    let mut builder = Builder::new();
    for item in &program.body {
        if let Item::Function(func) = item {
            builder.function(func);
        }
    }
    let chart = builder.finish();
    debug!(
        "Flowchart: {} nodes, {} edges",
        chart.nodes.len(),
        chart.edges.len()
    );
    chart
}
