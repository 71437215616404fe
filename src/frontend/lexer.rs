//! Lexer for the C subset
//!
//! Converts source code into a flat list of classified tokens. The lexer never
//! fails: anything it cannot classify becomes an `UNDEFINED` token so later
//! stages can still point at the offending line.

use std::collections::VecDeque;

use log::{debug, trace};

use crate::frontend::token::{self, Token, TokenKind};

/// Predicate deciding whether a lexeme belongs to a token kind
type Classifier = fn(&str) -> bool;

/// Word classifiers, tested top to bottom. The first match wins, so the
/// keyword entry must stay ahead of the identifier entry.
const CLASSIFIERS: [(TokenKind, Classifier); 12] = [
    (TokenKind::Preprocessor, is_preprocessor),
    (TokenKind::Keyword, token::is_keyword),
    (TokenKind::Identifier, is_identifier),
    (TokenKind::Number, is_number),
    (TokenKind::StringLiteral, is_string_literal),
    (TokenKind::Operator, token::is_operator),
    (TokenKind::Separator, is_separator),
    (TokenKind::OpenParen, |s| s == "("),
    (TokenKind::CloseParen, |s| s == ")"),
    (TokenKind::OpenBrace, |s| s == "{"),
    (TokenKind::CloseBrace, |s| s == "}"),
    (TokenKind::Comment, is_comment),
];

/// Classify a lexeme by the first matching entry of [`CLASSIFIERS`]
pub fn classify(lexeme: &str) -> TokenKind {
    CLASSIFIERS
        .iter()
        .find(|(_, matches)| matches(lexeme))
        .map(|(kind, _)| *kind)
        .unwrap_or(TokenKind::Undefined)
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_preprocessor(s: &str) -> bool {
    s.starts_with('#')
}

fn is_string_literal(s: &str) -> bool {
    s.len() >= 2 && s.starts_with('"') && s.ends_with('"')
}

fn is_separator(s: &str) -> bool {
    s.len() == 1 && token::SEPARATOR_CHARS.contains(s)
}

fn is_comment(s: &str) -> bool {
    s.starts_with("//") || s.starts_with("/*")
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => chars.all(is_word_char),
        _ => false,
    }
}

/// Hex (`0x1F`) or decimal with optional fraction and exponent (`1.5e-3`)
fn is_number(s: &str) -> bool {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return !hex.is_empty() && hex.chars().all(|c| c.is_ascii_hexdigit());
    }

    let bytes = s.as_bytes();
    let mut i = 0;
    let digits = |i: &mut usize| {
        let start = *i;
        while *i < bytes.len() && bytes[*i].is_ascii_digit() {
            *i += 1;
        }
        *i > start
    };

    if !digits(&mut i) {
        return false;
    }
    if i < bytes.len() && bytes[i] == b'.' {
        i += 1;
        if !digits(&mut i) {
            return false;
        }
    }
    if i < bytes.len() && matches!(bytes[i], b'e' | b'E') {
        i += 1;
        if i < bytes.len() && matches!(bytes[i], b'+' | b'-') {
            i += 1;
        }
        if !digits(&mut i) {
            return false;
        }
    }
    i == bytes.len()
}

/// A `/* ... */` comment lifted out of the source before line scanning
#[derive(Debug, Clone)]
struct BlockComment {
    line: usize,
    column: usize,
    text: String,
}

/// Blank out every block comment, keeping newlines so that line numbers and
/// columns of the remaining text are unchanged.
fn extract_block_comments(source: &str) -> (String, VecDeque<BlockComment>) {
    let chars: Vec<char> = source.chars().collect();
    let mut masked = String::with_capacity(source.len());
    let mut comments = VecDeque::new();
    let (mut line, mut column) = (1, 0);
    let mut i = 0;

    while i < chars.len() {
        if chars[i] == '/' && chars.get(i + 1) == Some(&'*') {
            let end = (i + 2..chars.len().saturating_sub(1))
                .find(|&j| chars[j] == '*' && chars[j + 1] == '/')
                .map(|j| j + 2);

            // An unterminated `/*` is left for the line scanner
            if let Some(end) = end {
                comments.push_back(BlockComment {
                    line,
                    column,
                    text: chars[i..end].iter().collect(),
                });
                for &c in &chars[i..end] {
                    if c == '\n' {
                        masked.push('\n');
                        line += 1;
                        column = 0;
                    } else {
                        masked.push(' ');
                        column += 1;
                    }
                }
                i = end;
                continue;
            }
        }

        let c = chars[i];
        masked.push(c);
        if c == '\n' {
            line += 1;
            column = 0;
        } else {
            column += 1;
        }
        i += 1;
    }

    (masked, comments)
}

/// The lexer state
pub struct Lexer {
    /// Source with block comments blanked out
    masked: String,
    /// Block comments not yet emitted, in source order
    comments: VecDeque<BlockComment>,
    /// Characters of the line being scanned
    chars: Vec<char>,
    /// Current position in the line
    pos: usize,
    /// 1-based line counter
    line: usize,
    tokens: Vec<Token>,
}

impl Lexer {
    /// Create a new lexer for the given source code
    pub fn new(source: &str) -> Self {
        let (masked, comments) = extract_block_comments(source);
        Self {
            masked,
            comments,
            chars: Vec::new(),
            pos: 0,
            line: 1,
            tokens: Vec::new(),
        }
    }

    /// Tokenize the entire source and return all tokens
    pub fn tokenize(mut self) -> Vec<Token> {
        let masked = std::mem::take(&mut self.masked);

        for (index, text) in masked.split('\n').enumerate() {
            self.line = index + 1;
            self.chars = text.chars().collect();
            self.pos = 0;
            self.scan_line(text);
            self.flush_comments(self.line, usize::MAX);
        }
        self.flush_comments(usize::MAX, usize::MAX);

        debug!(
            "Tokenized {} tokens over {} lines",
            self.tokens.len(),
            self.line
        );
        self.tokens
    }

    /// Emit pending block comments that start before `(line, column)`
    fn flush_comments(&mut self, line: usize, column: usize) {
        while let Some(comment) = self.comments.front() {
            if (comment.line, comment.column) >= (line, column) {
                break;
            }
            if let Some(comment) = self.comments.pop_front() {
                trace!("Block comment at line {}", comment.line);
                self.tokens
                    .push(Token::new(TokenKind::Comment, comment.text, comment.line));
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn slice(&self, start: usize, end: usize) -> String {
        self.chars[start..end.min(self.chars.len())].iter().collect()
    }

    /// Push a token that started at column `start`
    fn push(&mut self, kind: TokenKind, value: String, start: usize) {
        self.flush_comments(self.line, start);
        self.tokens.push(Token::new(kind, value, self.line));
    }

    fn scan_line(&mut self, text: &str) {
        // Preprocessor lines are kept whole
        if text.trim_start().starts_with('#') {
            let start = self.chars.iter().take_while(|c| c.is_whitespace()).count();
            self.push(TokenKind::Preprocessor, text.trim().to_string(), start);
            return;
        }

        while let Some(c) = self.peek() {
            let start = self.pos;

            if c.is_whitespace() {
                self.pos += 1;
                continue;
            }

            // Line comment runs to the end of the line
            if c == '/' && self.peek_at(1) == Some('/') {
                let comment = self.slice(start, self.chars.len());
                self.push(TokenKind::Comment, comment.trim_end().to_string(), start);
                self.pos = self.chars.len();
                break;
            }

            if c == '"' {
                self.read_string();
                continue;
            }

            if let Some(op) = self.match_operator() {
                self.pos += op.chars().count();
                self.push(TokenKind::Operator, op, start);
                continue;
            }

            let single = match c {
                '(' => Some(TokenKind::OpenParen),
                ')' => Some(TokenKind::CloseParen),
                '{' => Some(TokenKind::OpenBrace),
                '}' => Some(TokenKind::CloseBrace),
                c if token::SEPARATOR_CHARS.contains(c) => Some(TokenKind::Separator),
                _ => None,
            };
            if let Some(kind) = single {
                self.pos += 1;
                self.push(kind, c.to_string(), start);
                continue;
            }

            if is_word_char(c) {
                self.read_word();
                continue;
            }

            trace!("Unknown character {:?} at line {}", c, self.line);
            self.pos += 1;
            self.push(TokenKind::Undefined, c.to_string(), start);
        }
    }

    /// Greedy longest match against the operator tables
    fn match_operator(&self) -> Option<String> {
        (1..=3)
            .rev()
            .filter(|len| self.pos + len <= self.chars.len())
            .map(|len| self.slice(self.pos, self.pos + len))
            .find(|candidate| token::is_operator(candidate))
    }

    /// Read a string literal; a quote with no closing partner on the same
    /// line becomes a lone `UNDEFINED` token.
    fn read_string(&mut self) {
        let start = self.pos;
        let mut end = start + 1;

        let closed = loop {
            match self.chars.get(end) {
                None => break false,
                Some('"') => break true,
                Some('\\') if end + 1 < self.chars.len() => end += 2,
                Some('\\') => break false,
                Some(_) => end += 1,
            }
        };

        if closed {
            self.pos = end + 1;
            let literal = self.slice(start, self.pos);
            self.push(TokenKind::StringLiteral, literal, start);
        } else {
            self.pos = start + 1;
            self.push(TokenKind::Undefined, "\"".to_string(), start);
        }
    }

    /// Read a run of word characters and classify it
    fn read_word(&mut self) {
        let start = self.pos;
        self.consume_word_chars();

        // Decimal fraction and signed exponent are part of a number
        let leading_digits = self.chars[start..self.pos].iter().all(|c| c.is_ascii_digit());
        if leading_digits
            && self.peek() == Some('.')
            && self.peek_at(1).map_or(false, |c| c.is_ascii_digit())
        {
            self.pos += 1;
            self.consume_word_chars();
        }
        // Only a decimal mantissa takes an exponent; `0xE-1` is a subtraction
        let decimal_mantissa = self.chars[start..self.pos - 1]
            .iter()
            .all(|c| c.is_ascii_digit() || *c == '.');
        if self.pos - 1 > start
            && decimal_mantissa
            && matches!(self.chars[self.pos - 1], 'e' | 'E')
            && matches!(self.peek(), Some('+') | Some('-'))
            && self.peek_at(1).map_or(false, |c| c.is_ascii_digit())
        {
            self.pos += 1;
            self.consume_word_chars();
        }

        let lexeme = self.slice(start, self.pos);
        let kind = classify(&lexeme);
        self.push(kind, lexeme, start);
    }

    fn consume_word_chars(&mut self) {
        while self.peek().map_or(false, is_word_char) {
            self.pos += 1;
        }
    }
}

/// Tokenize `source` into classified tokens
pub fn tokenize(source: &str) -> Vec<Token> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn kinds_and_values(source: &str) -> Vec<(TokenKind, String)> {
        tokenize(source)
            .into_iter()
            .map(|t| (t.kind, t.value))
            .collect()
    }

    fn tok(kind: TokenKind, value: &str) -> (TokenKind, String) {
        (kind, value.to_string())
    }

    #[test]
    fn test_simple_declaration() {
        assert_eq!(
            kinds_and_values("int x = 5;"),
            vec![
                tok(TokenKind::Keyword, "int"),
                tok(TokenKind::Identifier, "x"),
                tok(TokenKind::Operator, "="),
                tok(TokenKind::Number, "5"),
                tok(TokenKind::Separator, ";"),
            ]
        );
    }

    #[test]
    fn test_two_char_operator_not_split() {
        assert_eq!(
            kinds_and_values("a==b"),
            vec![
                tok(TokenKind::Identifier, "a"),
                tok(TokenKind::Operator, "=="),
                tok(TokenKind::Identifier, "b"),
            ]
        );
        assert_eq!(
            kinds_and_values("p->q && i++ >>= 2"),
            vec![
                tok(TokenKind::Identifier, "p"),
                tok(TokenKind::Operator, "->"),
                tok(TokenKind::Identifier, "q"),
                tok(TokenKind::Operator, "&&"),
                tok(TokenKind::Identifier, "i"),
                tok(TokenKind::Operator, "++"),
                tok(TokenKind::Operator, ">>="),
                tok(TokenKind::Number, "2"),
            ]
        );
    }

    #[test]
    fn test_keywords_before_identifiers() {
        let tokens = tokenize("int integer printf return_value while");
        let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Keyword,
                TokenKind::Identifier,
                TokenKind::Keyword,
                TokenKind::Identifier,
                TokenKind::Keyword,
            ]
        );
    }

    #[test]
    fn test_classify_order() {
        assert_eq!(classify("double"), TokenKind::Keyword);
        assert_eq!(classify("_tmp1"), TokenKind::Identifier);
        assert_eq!(classify("0x1F"), TokenKind::Number);
        assert_eq!(classify("9abc"), TokenKind::Undefined);
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds_and_values("3.14 1.5e-3 0xFF 42"),
            vec![
                tok(TokenKind::Number, "3.14"),
                tok(TokenKind::Number, "1.5e-3"),
                tok(TokenKind::Number, "0xFF"),
                tok(TokenKind::Number, "42"),
            ]
        );
    }

    #[test]
    fn test_hex_ending_in_e_is_not_an_exponent() {
        assert_eq!(
            kinds_and_values("x = 0xE-1;"),
            vec![
                tok(TokenKind::Identifier, "x"),
                tok(TokenKind::Operator, "="),
                tok(TokenKind::Number, "0xE"),
                tok(TokenKind::Operator, "-"),
                tok(TokenKind::Number, "1"),
                tok(TokenKind::Separator, ";"),
            ]
        );
        assert_eq!(
            kinds_and_values("2e+8 0x1e+2"),
            vec![
                tok(TokenKind::Number, "2e+8"),
                tok(TokenKind::Number, "0x1e"),
                tok(TokenKind::Operator, "+"),
                tok(TokenKind::Number, "2"),
            ]
        );
    }

    #[test]
    fn test_strings() {
        assert_eq!(
            kinds_and_values(r#"printf("a \"b\"\n", x);"#),
            vec![
                tok(TokenKind::Keyword, "printf"),
                tok(TokenKind::OpenParen, "("),
                tok(TokenKind::StringLiteral, r#""a \"b\"\n""#),
                tok(TokenKind::Separator, ","),
                tok(TokenKind::Identifier, "x"),
                tok(TokenKind::CloseParen, ")"),
                tok(TokenKind::Separator, ";"),
            ]
        );
    }

    #[test]
    fn test_unterminated_string_is_undefined_quote() {
        assert_eq!(
            kinds_and_values("\"abc"),
            vec![
                tok(TokenKind::Undefined, "\""),
                tok(TokenKind::Identifier, "abc"),
            ]
        );
    }

    #[test]
    fn test_preprocessor_line_kept_whole() {
        let tokens = tokenize("  #include <stdio.h>\nint x;");
        assert_eq!(tokens[0], Token::new(TokenKind::Preprocessor, "#include <stdio.h>", 1));
        assert_eq!(tokens[1], Token::new(TokenKind::Keyword, "int", 2));
    }

    #[test]
    fn test_line_comment() {
        assert_eq!(
            kinds_and_values("x; // done here"),
            vec![
                tok(TokenKind::Identifier, "x"),
                tok(TokenKind::Separator, ";"),
                tok(TokenKind::Comment, "// done here"),
            ]
        );
    }

    #[test]
    fn test_block_comment_keeps_lines_in_sync() {
        let tokens = tokenize("/* one\n two\n three */\nint y;");
        assert_eq!(tokens[0], Token::new(TokenKind::Comment, "/* one\n two\n three */", 1));
        assert_eq!(tokens[1], Token::new(TokenKind::Keyword, "int", 4));
        assert_eq!(tokens[3].line, 4);
    }

    #[test]
    fn test_block_comment_interleaved_in_order() {
        let tokens = tokenize("int a; /* x */ int b;\n/* y */");
        let values: Vec<&str> = tokens.iter().map(|t| t.value.as_str()).collect();
        assert_eq!(values, vec!["int", "a", ";", "/* x */", "int", "b", ";", "/* y */"]);
        assert_eq!(tokens[7].line, 2);
    }

    #[test]
    fn test_unknown_characters() {
        assert_eq!(
            kinds_and_values("a[1] @"),
            vec![
                tok(TokenKind::Identifier, "a"),
                tok(TokenKind::Undefined, "["),
                tok(TokenKind::Number, "1"),
                tok(TokenKind::Undefined, "]"),
                tok(TokenKind::Undefined, "@"),
            ]
        );
    }

    #[test]
    fn test_lines_non_decreasing_and_bounded() {
        let source = "#include <stdio.h>\n/* a\nb */ int main() {\n  int x = 1; // c\n\n  return x;\n}\n";
        let physical = source.split('\n').count();
        let tokens = tokenize(source);
        assert!(!tokens.is_empty());
        for pair in tokens.windows(2) {
            assert!(pair[0].line <= pair[1].line);
        }
        assert!(tokens.iter().all(|t| t.line >= 1 && t.line <= physical));
    }

    #[test]
    fn test_empty_source() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("   \n\t\n").is_empty());
    }
}
