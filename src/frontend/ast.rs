//! Abstract Syntax Tree definitions for the C subset
//!
//! Every node owns its children, so the tree is acyclic and each child has
//! exactly one parent. Nodes serialize with a `"type"` tag carrying their
//! [`NodeKind`] name.

use std::fmt;

use serde::Serialize;

/// A complete program (compilation unit)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "Program")]
pub struct Program {
    pub body: Vec<Item>,
}

/// Top-level items
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Item {
    Preprocessor(PreprocessorDirective),
    Function(FunctionDeclaration),
    /// Global variable declaration
    Declaration(DeclarationStatement),
}

/// `#include ...` / `#define ...`, carried through verbatim
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "PreprocessorDirective")]
pub struct PreprocessorDirective {
    pub value: String,
    pub line: usize,
}

/// Function definition
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "FunctionDeclaration", rename_all = "camelCase")]
pub struct FunctionDeclaration {
    pub return_type: String,
    pub name: String,
    pub parameters: Vec<Parameter>,
    pub body: CompoundStatement,
    pub line: usize,
}

/// Function parameter
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename = "Parameter", rename_all = "camelCase")]
pub struct Parameter {
    pub param_type: String,
    pub param_name: String,
}

impl Parameter {
    pub fn new(param_type: impl Into<String>, param_name: impl Into<String>) -> Self {
        Self {
            param_type: param_type.into(),
            param_name: param_name.into(),
        }
    }
}

/// `{ ... }`
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(tag = "type", rename = "CompoundStatement")]
pub struct CompoundStatement {
    pub body: Vec<Stmt>,
}

/// `int a = 1, b;`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "DeclarationStatement", rename_all = "camelCase")]
pub struct DeclarationStatement {
    pub var_type: String,
    pub variables: Vec<VariableDeclarator>,
    pub line: usize,
}

/// One declared name inside a [`DeclarationStatement`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableDeclarator {
    pub name: String,
    pub initializer: Option<Expr>,
}

/// Initialization clause of a `for` loop
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ForInit {
    Declaration(DeclarationStatement),
    Expression(Expr),
}

/// Statement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Stmt {
    /// return [expr];
    #[serde(rename = "ReturnStatement")]
    Return { expression: Option<Expr>, line: usize },

    #[serde(rename = "IfStatement")]
    If {
        condition: Expr,
        then: CompoundStatement,
        #[serde(rename = "else")]
        else_branch: Option<CompoundStatement>,
        line: usize,
    },

    #[serde(rename = "ForStatement")]
    For {
        initialization: Option<ForInit>,
        condition: Option<Expr>,
        increment: Option<Expr>,
        body: CompoundStatement,
        line: usize,
    },

    #[serde(rename = "WhileStatement")]
    While {
        condition: Expr,
        body: CompoundStatement,
        line: usize,
    },

    /// Expression statement
    #[serde(rename = "ExpressionStatement")]
    Expression { expression: Expr, line: usize },

    /// Placeholder for constructs outside the subset, produced by AST
    /// builders other than the parser
    Unsupported { kind: String },

    // The wrapped structs carry their own tag
    #[serde(untagged)]
    Compound(CompoundStatement),

    #[serde(untagged)]
    Declaration(DeclarationStatement),
}

/// Expression
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum Expr {
    #[serde(rename = "AssignmentExpression")]
    Assignment {
        left: Box<Expr>,
        operator: String,
        right: Box<Expr>,
    },

    #[serde(rename = "BinaryExpression")]
    Binary {
        left: Box<Expr>,
        operator: String,
        right: Box<Expr>,
    },

    /// `++x`, `-x`, `!x`
    #[serde(rename = "PrefixExpression")]
    Prefix { operator: String, argument: Box<Expr> },

    /// `x++`, `x--`
    #[serde(rename = "PostfixExpression")]
    Postfix { operator: String, argument: Box<Expr> },

    /// Function call
    #[serde(rename = "CallExpression")]
    Call { callee: Box<Expr>, arguments: Vec<Expr> },

    Identifier { name: String },

    /// Number or string literal, kept as written
    Literal { value: String },

    /// Placeholder for constructs outside the subset
    Unsupported { kind: String },
}

impl Expr {
    pub fn identifier(name: impl Into<String>) -> Self {
        Expr::Identifier { name: name.into() }
    }

    pub fn literal(value: impl Into<String>) -> Self {
        Expr::Literal { value: value.into() }
    }
}

/// Kind tag of every AST node, as reported in diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Program,
    PreprocessorDirective,
    FunctionDeclaration,
    CompoundStatement,
    DeclarationStatement,
    ReturnStatement,
    IfStatement,
    ForStatement,
    WhileStatement,
    ExpressionStatement,
    AssignmentExpression,
    BinaryExpression,
    PrefixExpression,
    PostfixExpression,
    CallExpression,
    Identifier,
    Literal,
    Parameter,
    Unsupported,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Program => "Program",
            NodeKind::PreprocessorDirective => "PreprocessorDirective",
            NodeKind::FunctionDeclaration => "FunctionDeclaration",
            NodeKind::CompoundStatement => "CompoundStatement",
            NodeKind::DeclarationStatement => "DeclarationStatement",
            NodeKind::ReturnStatement => "ReturnStatement",
            NodeKind::IfStatement => "IfStatement",
            NodeKind::ForStatement => "ForStatement",
            NodeKind::WhileStatement => "WhileStatement",
            NodeKind::ExpressionStatement => "ExpressionStatement",
            NodeKind::AssignmentExpression => "AssignmentExpression",
            NodeKind::BinaryExpression => "BinaryExpression",
            NodeKind::PrefixExpression => "PrefixExpression",
            NodeKind::PostfixExpression => "PostfixExpression",
            NodeKind::CallExpression => "CallExpression",
            NodeKind::Identifier => "Identifier",
            NodeKind::Literal => "Literal",
            NodeKind::Parameter => "Parameter",
            NodeKind::Unsupported => "Unsupported",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Item {
    pub fn kind(&self) -> NodeKind {
        match self {
            Item::Preprocessor(_) => NodeKind::PreprocessorDirective,
            Item::Function(_) => NodeKind::FunctionDeclaration,
            Item::Declaration(_) => NodeKind::DeclarationStatement,
        }
    }
}

impl Stmt {
    pub fn kind(&self) -> NodeKind {
        match self {
            Stmt::Compound(_) => NodeKind::CompoundStatement,
            Stmt::Declaration(_) => NodeKind::DeclarationStatement,
            Stmt::Return { .. } => NodeKind::ReturnStatement,
            Stmt::If { .. } => NodeKind::IfStatement,
            Stmt::For { .. } => NodeKind::ForStatement,
            Stmt::While { .. } => NodeKind::WhileStatement,
            Stmt::Expression { .. } => NodeKind::ExpressionStatement,
            Stmt::Unsupported { .. } => NodeKind::Unsupported,
        }
    }
}

impl Expr {
    pub fn kind(&self) -> NodeKind {
        match self {
            Expr::Assignment { .. } => NodeKind::AssignmentExpression,
            Expr::Binary { .. } => NodeKind::BinaryExpression,
            Expr::Prefix { .. } => NodeKind::PrefixExpression,
            Expr::Postfix { .. } => NodeKind::PostfixExpression,
            Expr::Call { .. } => NodeKind::CallExpression,
            Expr::Identifier { .. } => NodeKind::Identifier,
            Expr::Literal { .. } => NodeKind::Literal,
            Expr::Unsupported { .. } => NodeKind::Unsupported,
        }
    }
}

// ==================== Node-kind walk ====================

/// Pre-order list of node kinds, used to compare tree shapes
pub fn node_kinds(program: &Program) -> Vec<NodeKind> {
    let mut kinds = vec![NodeKind::Program];
    for item in &program.body {
        match item {
            Item::Preprocessor(_) => kinds.push(NodeKind::PreprocessorDirective),
            Item::Function(func) => {
                kinds.push(NodeKind::FunctionDeclaration);
                kinds.extend(func.parameters.iter().map(|_| NodeKind::Parameter));
                compound_kinds(&func.body, &mut kinds);
            }
            Item::Declaration(decl) => declaration_kinds(decl, &mut kinds),
        }
    }
    kinds
}

fn compound_kinds(block: &CompoundStatement, kinds: &mut Vec<NodeKind>) {
    kinds.push(NodeKind::CompoundStatement);
    for stmt in &block.body {
        stmt_kinds(stmt, kinds);
    }
}

fn declaration_kinds(decl: &DeclarationStatement, kinds: &mut Vec<NodeKind>) {
    kinds.push(NodeKind::DeclarationStatement);
    for init in decl.variables.iter().filter_map(|v| v.initializer.as_ref()) {
        expr_kinds(init, kinds);
    }
}

fn stmt_kinds(stmt: &Stmt, kinds: &mut Vec<NodeKind>) {
    match stmt {
        Stmt::Compound(block) => compound_kinds(block, kinds),
        Stmt::Declaration(decl) => declaration_kinds(decl, kinds),
        Stmt::Return { expression, .. } => {
            kinds.push(NodeKind::ReturnStatement);
            if let Some(expr) = expression {
                expr_kinds(expr, kinds);
            }
        }
        Stmt::If { condition, then, else_branch, .. } => {
            kinds.push(NodeKind::IfStatement);
            expr_kinds(condition, kinds);
            compound_kinds(then, kinds);
            if let Some(else_branch) = else_branch {
                compound_kinds(else_branch, kinds);
            }
        }
        Stmt::For { initialization, condition, increment, body, .. } => {
            kinds.push(NodeKind::ForStatement);
            match initialization {
                Some(ForInit::Declaration(decl)) => declaration_kinds(decl, kinds),
                Some(ForInit::Expression(expr)) => expr_kinds(expr, kinds),
                None => {}
            }
            for expr in condition.iter().chain(increment.iter()) {
                expr_kinds(expr, kinds);
            }
            compound_kinds(body, kinds);
        }
        Stmt::While { condition, body, .. } => {
            kinds.push(NodeKind::WhileStatement);
            expr_kinds(condition, kinds);
            compound_kinds(body, kinds);
        }
        Stmt::Expression { expression, .. } => {
            kinds.push(NodeKind::ExpressionStatement);
            expr_kinds(expression, kinds);
        }
        Stmt::Unsupported { .. } => kinds.push(NodeKind::Unsupported),
    }
}

fn expr_kinds(expr: &Expr, kinds: &mut Vec<NodeKind>) {
    kinds.push(expr.kind());
    match expr {
        Expr::Assignment { left, right, .. } | Expr::Binary { left, right, .. } => {
            expr_kinds(left, kinds);
            expr_kinds(right, kinds);
        }
        Expr::Prefix { argument, .. } | Expr::Postfix { argument, .. } => {
            expr_kinds(argument, kinds)
        }
        Expr::Call { callee, arguments } => {
            expr_kinds(callee, kinds);
            for arg in arguments {
                expr_kinds(arg, kinds);
            }
        }
        Expr::Identifier { .. } | Expr::Literal { .. } | Expr::Unsupported { .. } => {}
    }
}
