//! Token definitions for the C subset

use std::fmt;

use serde::Serialize;

/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// The lexeme exactly as it appeared in the source
    pub value: String,
    /// 1-based source line
    pub line: usize,
}

impl Token {
    pub fn new(kind: TokenKind, value: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            value: value.into(),
            line,
        }
    }

    /// Check whether this token has the given kind and text
    pub fn is(&self, kind: TokenKind, value: &str) -> bool {
        self.kind == kind && self.value == value
    }
}

/// Token kinds, in classification order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    /// Whole `#...` line
    Preprocessor,
    Keyword,
    Identifier,
    Number,
    StringLiteral,
    Operator,
    /// `;` `,` `.` `:`
    Separator,
    OpenParen,
    CloseParen,
    OpenBrace,
    CloseBrace,
    Comment,
    /// Anything the lexer could not classify
    Undefined,
}

impl TokenKind {
    /// Every kind, in declaration order
    pub const ALL: [TokenKind; 13] = [
        TokenKind::Preprocessor,
        TokenKind::Keyword,
        TokenKind::Identifier,
        TokenKind::Number,
        TokenKind::StringLiteral,
        TokenKind::Operator,
        TokenKind::Separator,
        TokenKind::OpenParen,
        TokenKind::CloseParen,
        TokenKind::OpenBrace,
        TokenKind::CloseBrace,
        TokenKind::Comment,
        TokenKind::Undefined,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Preprocessor => "PREPROCESSOR",
            TokenKind::Keyword => "KEYWORD",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::Number => "NUMBER",
            TokenKind::StringLiteral => "STRING_LITERAL",
            TokenKind::Operator => "OPERATOR",
            TokenKind::Separator => "SEPARATOR",
            TokenKind::OpenParen => "OPEN_PAREN",
            TokenKind::CloseParen => "CLOSE_PAREN",
            TokenKind::OpenBrace => "OPEN_BRACE",
            TokenKind::CloseBrace => "CLOSE_BRACE",
            TokenKind::Comment => "COMMENT",
            TokenKind::Undefined => "UNDEFINED",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reserved words of the subset
pub const KEYWORDS: [&str; 13] = [
    "int", "char", "float", "double", "if", "else", "for", "while", "return", "void", "include",
    "define", "printf",
];

/// Keywords that name a type in declarations and signatures
pub const TYPE_KEYWORDS: [&str; 5] = ["int", "char", "float", "double", "void"];

/// Three-character operators (checked first)
pub const OPERATORS_3: [&str; 2] = ["<<=", ">>="];

/// Two-character operators
pub const OPERATORS_2: [&str; 19] = [
    "==", "!=", "<=", ">=", "->", "&&", "||", "<<", ">>", "++", "--", "+=", "-=", "*=", "/=", "%=",
    "&=", "|=", "^=",
];

/// Single-character operators
pub const OPERATOR_CHARS: &str = "+-*/%=<>&^|!~";

/// Single-character separators
pub const SEPARATOR_CHARS: &str = ";,.:";

pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(&word)
}

pub fn is_type_keyword(word: &str) -> bool {
    TYPE_KEYWORDS.contains(&word)
}

/// Check if `text` is an operator of the subset
pub fn is_operator(text: &str) -> bool {
    match text.len() {
        3 => OPERATORS_3.contains(&text),
        2 => OPERATORS_2.contains(&text),
        1 => OPERATOR_CHARS.contains(text),
        _ => false,
    }
}

/// Binding power of a binary or assignment operator (for precedence climbing).
/// Returns None if not a binary operator
pub fn binary_precedence(op: &str) -> Option<u8> {
    match op {
        // Assignment (lowest)
        "=" | "+=" | "-=" | "*=" | "/=" | "%=" | "&=" | "|=" | "^=" | "<<=" | ">>=" => Some(1),

        "||" => Some(2),
        "&&" => Some(3),
        "|" => Some(4),
        "^" => Some(5),
        "&" => Some(6),

        // Equality
        "==" | "!=" => Some(7),

        // Comparison
        "<" | "<=" | ">" | ">=" => Some(8),

        // Shift
        "<<" | ">>" => Some(9),

        // Additive
        "+" | "-" => Some(10),

        // Multiplicative (highest for binary)
        "*" | "/" | "%" => Some(11),

        _ => None,
    }
}

pub fn is_assignment_operator(op: &str) -> bool {
    binary_precedence(op) == Some(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_table() {
        assert!(is_operator("=="));
        assert!(is_operator("^="));
        assert!(is_operator(">>="));
        assert!(is_operator("~"));
        assert!(!is_operator("=5"));
        assert!(!is_operator("= "));
        assert!(!is_operator("["));
    }

    #[test]
    fn test_precedence_order() {
        assert!(binary_precedence("*") > binary_precedence("+"));
        assert!(binary_precedence("+") > binary_precedence("<"));
        assert!(binary_precedence("&&") > binary_precedence("||"));
        assert!(is_assignment_operator("+="));
        assert!(!is_assignment_operator("=="));
        assert_eq!(binary_precedence("->"), None);
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(TokenKind::StringLiteral.to_string(), "STRING_LITERAL");
        assert_eq!(TokenKind::ALL.len(), 13);
        assert_eq!(TokenKind::ALL[12], TokenKind::Undefined);
    }
}
