//! clens - a teaching front end for a small C subset
//!
//! Source text flows through pure stages: tokens ([`tokenize`]), syntax
//! tree ([`parse`]), then diagnostics ([`analyze`]), pseudocode ([`render`])
//! or a Graphviz flowchart ([`flowchart`]). [`check_syntax`] is an
//! independent line-based lint run on the raw text.

pub mod feedback;
pub mod frontend;
pub mod stdlib;
pub mod utils;

pub use frontend::ast::{node_kinds, NodeKind, Program};
pub use frontend::flowchart::{flowchart, Flowchart};
pub use frontend::lexer::tokenize;
pub use frontend::parser::parse;
pub use frontend::pseudocode::render;
pub use frontend::semantic::{analyze, AnalysisResult, SemanticAnalyzer};
pub use frontend::syntax_check::{check_syntax, SyntaxIssue};
pub use frontend::token::{Token, TokenKind};
pub use utils::{Error, Result};
