//! Pseudocode generation
//!
//! Renders the AST back into indented, C-like text. Operators and literals are
//! reproduced verbatim and no parentheses are added, so grouping that relied
//! on parentheses in the source is not visible in the output.

use crate::frontend::ast::*;

/// Two spaces per nesting level
const INDENT: &str = "  ";

/// Render a node at the given nesting level
pub trait Pseudocode {
    fn render(&self, indent: usize) -> String;
}

fn pad(indent: usize) -> String {
    INDENT.repeat(indent)
}

/// `header {`, the body one level deeper, then `}` at `indent`
fn block(header: &str, body: &CompoundStatement, indent: usize) -> String {
    let pad = pad(indent);
    if body.body.is_empty() {
        return format!("{}{} {{\n{}}}", pad, header, pad);
    }
    format!("{}{} {{\n{}\n{}}}", pad, header, body.render(indent + 1), pad)
}

fn join<T: Pseudocode>(nodes: &[T], indent: usize, sep: &str) -> String {
    nodes
        .iter()
        .map(|n| n.render(indent))
        .collect::<Vec<_>>()
        .join(sep)
}

impl Pseudocode for Program {
    fn render(&self, indent: usize) -> String {
        join(&self.body, indent, "\n")
    }
}

impl Pseudocode for Item {
    fn render(&self, indent: usize) -> String {
        match self {
            Item::Preprocessor(directive) => format!("{}{}", pad(indent), directive.value),
            Item::Function(func) => func.render(indent),
            Item::Declaration(decl) => decl.render(indent),
        }
    }
}

impl Pseudocode for FunctionDeclaration {
    fn render(&self, indent: usize) -> String {
        let header = format!(
            "{} {}({})",
            self.return_type,
            self.name,
            join(&self.parameters, 0, ", ")
        );
        block(&header, &self.body, indent)
    }
}

impl Pseudocode for Parameter {
    fn render(&self, _indent: usize) -> String {
        format!("{} {}", self.param_type, self.param_name)
    }
}

/// Statements of the block, one per line, at `indent`
impl Pseudocode for CompoundStatement {
    fn render(&self, indent: usize) -> String {
        join(&self.body, indent, "\n")
    }
}

impl DeclarationStatement {
    /// `type a = 1, b` without indentation or the trailing `;`
    pub(crate) fn declarators(&self) -> String {
        let vars = self
            .variables
            .iter()
            .map(|v| match &v.initializer {
                Some(init) => format!("{} = {}", v.name, init.render(0)),
                None => v.name.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("{} {}", self.var_type, vars)
    }
}

impl Pseudocode for DeclarationStatement {
    fn render(&self, indent: usize) -> String {
        format!("{}{};", pad(indent), self.declarators())
    }
}

impl Pseudocode for Stmt {
    fn render(&self, indent: usize) -> String {
        match self {
            // A nested block keeps its braces
            Stmt::Compound(block) => {
                let pad = pad(indent);
                if block.body.is_empty() {
                    format!("{}{{\n{}}}", pad, pad)
                } else {
                    format!("{}{{\n{}\n{}}}", pad, block.render(indent + 1), pad)
                }
            }
            Stmt::Declaration(decl) => decl.render(indent),
            Stmt::Return { expression: Some(expr), .. } => {
                format!("{}return {};", pad(indent), expr.render(0))
            }
            Stmt::Return { expression: None, .. } => format!("{}return;", pad(indent)),
            Stmt::If { condition, then, else_branch, .. } => {
                let mut out = block(&format!("if ({})", condition.render(0)), then, indent);
                if let Some(else_branch) = else_branch {
                    // Joins as `} else {`
                    let tail = block("else", else_branch, indent);
                    out.push(' ');
                    out.push_str(tail.trim_start());
                }
                out
            }
            Stmt::For { initialization, condition, increment, body, .. } => {
                let init = match initialization {
                    Some(ForInit::Declaration(decl)) => decl.declarators(),
                    Some(ForInit::Expression(expr)) => expr.render(0),
                    None => String::new(),
                };
                let cond = condition.as_ref().map(|e| e.render(0)).unwrap_or_default();
                let incr = increment.as_ref().map(|e| e.render(0)).unwrap_or_default();
                block(&format!("for ({}; {}; {})", init, cond, incr), body, indent)
            }
            Stmt::While { condition, body, .. } => {
                block(&format!("while ({})", condition.render(0)), body, indent)
            }
            Stmt::Expression { expression, .. } => {
                format!("{}{};", pad(indent), expression.render(0))
            }
            Stmt::Unsupported { kind } => format!("{}[Unknown node type: {}]", pad(indent), kind),
        }
    }
}

/// Expressions render inline; `indent` only matters for placeholders
impl Pseudocode for Expr {
    fn render(&self, indent: usize) -> String {
        match self {
            Expr::Assignment { left, operator, right }
            | Expr::Binary { left, operator, right } => {
                format!("{} {} {}", left.render(0), operator, right.render(0))
            }
            Expr::Prefix { operator, argument } => {
                let argument = argument.render(0);
                // `- -x` must not print as `--x`
                let fuses = matches!(
                    (operator.chars().last(), argument.chars().next()),
                    (Some('+'), Some('+')) | (Some('-'), Some('-'))
                );
                if fuses {
                    format!("{} {}", operator, argument)
                } else {
                    format!("{}{}", operator, argument)
                }
            }
            Expr::Postfix { operator, argument } => format!("{}{}", argument.render(0), operator),
            Expr::Call { callee, arguments } => {
                format!("{}({})", callee.render(0), join(arguments, 0, ", "))
            }
            Expr::Identifier { name } => name.clone(),
            Expr::Literal { value } => value.clone(),
            Expr::Unsupported { kind } => format!("{}[Unknown node type: {}]", pad(indent), kind),
        }
    }
}

/// Render a whole program as pseudocode
pub fn render(program: &Program) -> String {
    program.render(0)
}
