//! Frontend module - Lexer, Pre-check, Parser, Semantic Analysis, Pseudocode, Flowchart

pub mod token;
pub mod lexer;
pub mod syntax_check;
pub mod ast;
pub mod parser;
pub mod semantic;
pub mod pseudocode;
pub mod flowchart;
