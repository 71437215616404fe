//! Parser for the C subset
//!
//! Recursive descent parser with precedence climbing for expressions.
//! Comment tokens are dropped before parsing; any grammar violation aborts
//! with an error naming the offending token and the expected construct.

use log::{debug, trace};

use crate::frontend::ast::*;
use crate::frontend::lexer;
use crate::frontend::token::{self, Token, TokenKind};
use crate::utils::{Error, Result};

const PREFIX_OPERATORS: [&str; 6] = ["++", "--", "-", "+", "!", "~"];
const POSTFIX_OPERATORS: [&str; 2] = ["++", "--"];

/// Deepest statement or expression nesting accepted; every later stage
/// walks the tree recursively
pub const MAX_NESTING_DEPTH: usize = 256;

/// The parser
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    /// Create a parser from pre-tokenized input
    pub fn new(tokens: &[Token]) -> Self {
        Self {
            tokens: tokens
                .iter()
                .filter(|t| t.kind != TokenKind::Comment)
                .cloned()
                .collect(),
            pos: 0,
            depth: 0,
        }
    }

    /// Tokenize `source` and create a parser over the result
    pub fn from_source(source: &str) -> Self {
        Self::new(&lexer::tokenize(source))
    }

    // ==================== Helper Methods ====================

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos + 1)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.current().cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn current_line(&self) -> usize {
        self.current()
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    /// Count one more nesting level, failing past [`MAX_NESTING_DEPTH`]
    fn descend(&mut self) -> Result<()> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(Error::NestingTooDeep {
                line: self.current_line(),
                limit: MAX_NESTING_DEPTH,
            });
        }
        self.depth += 1;
        Ok(())
    }

    /// Run `parse` one nesting level deeper
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let depth = self.depth;
        self.descend()?;
        let result = parse(self);
        self.depth = depth;
        result
    }

    fn check(&self, kind: TokenKind, value: &str) -> bool {
        self.current().map_or(false, |t| t.is(kind, value))
    }

    fn check_kind(&self, kind: TokenKind) -> bool {
        self.current().map_or(false, |t| t.kind == kind)
    }

    fn check_type_keyword(&self) -> bool {
        self.current()
            .map_or(false, |t| t.kind == TokenKind::Keyword && token::is_type_keyword(&t.value))
    }

    fn consume(&mut self, kind: TokenKind, value: &str) -> bool {
        if self.check(kind, value) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Build the error for the current position
    fn error(&self, expected: &str) -> Error {
        match self.current() {
            Some(token) => Error::UnexpectedToken {
                expected: expected.to_string(),
                token: token.clone(),
            },
            None => Error::UnexpectedEof {
                expected: expected.to_string(),
            },
        }
    }

    fn expect(&mut self, kind: TokenKind, value: &str) -> Result<Token> {
        if self.check(kind, value) {
            self.advance().ok_or_else(|| self.error(value))
        } else {
            Err(self.error(&format!("'{}'", value)))
        }
    }

    // ==================== Parsing Methods ====================

    /// Parse a complete program
    pub fn parse_program(&mut self) -> Result<Program> {
        let mut body = Vec::new();

        while let Some(token) = self.current() {
            if token.kind == TokenKind::Preprocessor {
                body.push(Item::Preprocessor(PreprocessorDirective {
                    value: token.value.clone(),
                    line: token.line,
                }));
                self.advance();
            } else {
                body.push(self.parse_external()?);
            }
        }

        debug!("Parsed {} top-level items", body.len());
        Ok(Program { body })
    }

    /// Parse a function definition or a global declaration
    fn parse_external(&mut self) -> Result<Item> {
        if !self.check_type_keyword() {
            return Err(self.error("function or variable declaration"));
        }

        let line = self.current_line();
        let ty = self.parse_type()?;
        let name = self.parse_ident()?;

        if self.consume(TokenKind::OpenParen, "(") {
            let parameters = self.parse_params()?;
            self.expect(TokenKind::CloseParen, ")")?;
            let body = self.parse_compound()?;
            trace!("Parsed function '{}' ({} params)", name, parameters.len());

            return Ok(Item::Function(FunctionDeclaration {
                return_type: ty,
                name,
                parameters,
                body,
                line,
            }));
        }

        let decl = self.parse_declarators(ty, name, line)?;
        self.expect(TokenKind::Separator, ";")?;
        Ok(Item::Declaration(decl))
    }

    fn parse_type(&mut self) -> Result<String> {
        if self.check_type_keyword() {
            if let Some(token) = self.advance() {
                return Ok(token.value);
            }
        }
        Err(self.error("type"))
    }

    fn parse_ident(&mut self) -> Result<String> {
        if self.check_kind(TokenKind::Identifier) {
            if let Some(token) = self.advance() {
                return Ok(token.value);
            }
        }
        Err(self.error("identifier"))
    }

    fn parse_params(&mut self) -> Result<Vec<Parameter>> {
        let mut params = Vec::new();

        // `f()` and `f(void)` both take no parameters
        if self.check(TokenKind::CloseParen, ")") {
            return Ok(params);
        }
        if self.check(TokenKind::Keyword, "void")
            && self.peek().map_or(false, |t| t.is(TokenKind::CloseParen, ")"))
        {
            self.advance();
            return Ok(params);
        }

        loop {
            let param_type = self.parse_type()?;
            let param_name = self.parse_ident()?;
            params.push(Parameter { param_type, param_name });
            if !self.consume(TokenKind::Separator, ",") {
                break;
            }
        }

        Ok(params)
    }

    fn parse_compound(&mut self) -> Result<CompoundStatement> {
        self.expect(TokenKind::OpenBrace, "{")?;

        let mut body = Vec::new();
        while !self.check(TokenKind::CloseBrace, "}") && !self.is_at_end() {
            if let Some(stmt) = self.parse_stmt()? {
                body.push(stmt);
            }
        }

        self.expect(TokenKind::CloseBrace, "}")?;
        Ok(CompoundStatement { body })
    }

    /// Body of `if`/`else`/`for`/`while`; a lone statement is wrapped in a block
    fn parse_body(&mut self) -> Result<CompoundStatement> {
        Ok(match self.parse_stmt()? {
            Some(Stmt::Compound(block)) => block,
            Some(stmt) => CompoundStatement { body: vec![stmt] },
            None => CompoundStatement::default(),
        })
    }

    /// Parse a statement; an empty `;` statement yields no node
    fn parse_stmt(&mut self) -> Result<Option<Stmt>> {
        self.nested(Self::parse_stmt_inner)
    }

    fn parse_stmt_inner(&mut self) -> Result<Option<Stmt>> {
        let Some(token) = self.current() else {
            return Err(self.error("statement"));
        };
        let (kind, value, line) = (token.kind, token.value.clone(), token.line);

        let stmt = match (kind, value.as_str()) {
            (TokenKind::Separator, ";") => {
                self.advance();
                return Ok(None);
            }
            (TokenKind::OpenBrace, _) => Stmt::Compound(self.parse_compound()?),
            (TokenKind::Keyword, "return") => self.parse_return_stmt()?,
            (TokenKind::Keyword, "if") => self.parse_if_stmt()?,
            (TokenKind::Keyword, "for") => self.parse_for_stmt()?,
            (TokenKind::Keyword, "while") => self.parse_while_stmt()?,
            (TokenKind::Keyword, ty) if token::is_type_keyword(ty) => {
                let decl = self.parse_declaration()?;
                self.expect(TokenKind::Separator, ";")?;
                Stmt::Declaration(decl)
            }
            _ => {
                let expression = self.parse_expr()?;
                self.expect(TokenKind::Separator, ";")?;
                Stmt::Expression { expression, line }
            }
        };

        Ok(Some(stmt))
    }

    /// `type name [= expr], ...` without the trailing `;`
    fn parse_declaration(&mut self) -> Result<DeclarationStatement> {
        let line = self.current_line();
        let ty = self.parse_type()?;
        let name = self.parse_ident()?;
        self.parse_declarators(ty, name, line)
    }

    fn parse_declarators(
        &mut self,
        var_type: String,
        first: String,
        line: usize,
    ) -> Result<DeclarationStatement> {
        let mut variables = Vec::new();
        let mut name = first;

        loop {
            let initializer = if self.consume(TokenKind::Operator, "=") {
                Some(self.parse_expr()?)
            } else {
                None
            };
            variables.push(VariableDeclarator { name, initializer });

            if !self.consume(TokenKind::Separator, ",") {
                break;
            }
            name = self.parse_ident()?;
        }

        Ok(DeclarationStatement {
            var_type,
            variables,
            line,
        })
    }

    fn parse_return_stmt(&mut self) -> Result<Stmt> {
        let line = self.current_line();
        self.expect(TokenKind::Keyword, "return")?;

        let expression = if self.check(TokenKind::Separator, ";") {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Separator, ";")?;

        Ok(Stmt::Return { expression, line })
    }

    fn parse_if_stmt(&mut self) -> Result<Stmt> {
        let line = self.current_line();
        self.expect(TokenKind::Keyword, "if")?;

        self.expect(TokenKind::OpenParen, "(")?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::CloseParen, ")")?;
        let then = self.parse_body()?;

        let else_branch = if self.consume(TokenKind::Keyword, "else") {
            Some(self.parse_body()?)
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then,
            else_branch,
            line,
        })
    }

    fn parse_for_stmt(&mut self) -> Result<Stmt> {
        let line = self.current_line();
        self.expect(TokenKind::Keyword, "for")?;
        self.expect(TokenKind::OpenParen, "(")?;

        let initialization = if self.check(TokenKind::Separator, ";") {
            None
        } else if self.check_type_keyword() {
            Some(ForInit::Declaration(self.parse_declaration()?))
        } else {
            Some(ForInit::Expression(self.parse_expr()?))
        };
        self.expect(TokenKind::Separator, ";")?;

        let condition = if self.check(TokenKind::Separator, ";") {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::Separator, ";")?;

        let increment = if self.check(TokenKind::CloseParen, ")") {
            None
        } else {
            Some(self.parse_expr()?)
        };
        self.expect(TokenKind::CloseParen, ")")?;

        let body = self.parse_body()?;

        Ok(Stmt::For {
            initialization,
            condition,
            increment,
            body,
            line,
        })
    }

    fn parse_while_stmt(&mut self) -> Result<Stmt> {
        let line = self.current_line();
        self.expect(TokenKind::Keyword, "while")?;

        self.expect(TokenKind::OpenParen, "(")?;
        let condition = self.parse_expr()?;
        self.expect(TokenKind::CloseParen, ")")?;
        let body = self.parse_body()?;

        Ok(Stmt::While {
            condition,
            body,
            line,
        })
    }

    // ==================== Expression Parsing ====================

    pub fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_expr_bp(0)
    }

    /// Parse expression with binding power (precedence climbing)
    fn parse_expr_bp(&mut self, min_bp: u8) -> Result<Expr> {
        let depth = self.depth;
        let mut left = self.parse_unary()?;

        loop {
            let Some(op_token) = self.current() else {
                break;
            };
            if op_token.kind != TokenKind::Operator {
                break;
            }
            let Some(bp) = token::binary_precedence(&op_token.value) else {
                break;
            };
            if bp < min_bp {
                break;
            }

            let operator = op_token.value.clone();
            self.advance();
            // A left-leaning chain deepens the tree without recursing here
            self.descend()?;

            // Right-associative for assignment
            let assignment = token::is_assignment_operator(&operator);
            let next_bp = if assignment { bp } else { bp + 1 };
            let right = Box::new(self.parse_expr_bp(next_bp)?);

            left = if assignment {
                Expr::Assignment {
                    left: Box::new(left),
                    operator,
                    right,
                }
            } else {
                Expr::Binary {
                    left: Box::new(left),
                    operator,
                    right,
                }
            };
        }

        self.depth = depth;
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        self.nested(Self::parse_unary_inner)
    }

    fn parse_unary_inner(&mut self) -> Result<Expr> {
        let prefix = self
            .current()
            .filter(|t| t.kind == TokenKind::Operator && PREFIX_OPERATORS.contains(&t.value.as_str()))
            .map(|t| t.value.clone());

        if let Some(operator) = prefix {
            self.advance();
            let argument = self.parse_unary()?;
            return Ok(Expr::Prefix {
                operator,
                argument: Box::new(argument),
            });
        }

        let primary = self.parse_primary()?;
        self.parse_postfix(primary)
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let Some(token) = self.current().cloned() else {
            return Err(self.error("expression"));
        };

        let expr = match token.kind {
            TokenKind::Identifier => Expr::Identifier { name: token.value },
            // `printf` is reserved by the lexer but called like any function
            TokenKind::Keyword if token.value == "printf" => Expr::Identifier { name: token.value },
            TokenKind::Number | TokenKind::StringLiteral => Expr::Literal { value: token.value },
            TokenKind::OpenParen => {
                self.advance();
                let inner = self.nested(Self::parse_expr)?;
                self.expect(TokenKind::CloseParen, ")")?;
                return Ok(inner);
            }
            _ => return Err(self.error("expression")),
        };

        self.advance();
        Ok(expr)
    }

    fn parse_postfix(&mut self, mut expr: Expr) -> Result<Expr> {
        let depth = self.depth;
        loop {
            if self.consume(TokenKind::OpenParen, "(") {
                self.descend()?;
                // Function call
                let mut arguments = Vec::new();
                while !self.check(TokenKind::CloseParen, ")") && !self.is_at_end() {
                    arguments.push(self.parse_expr()?);
                    if !self.consume(TokenKind::Separator, ",") {
                        break;
                    }
                }
                self.expect(TokenKind::CloseParen, ")")?;
                expr = Expr::Call {
                    callee: Box::new(expr),
                    arguments,
                };
                continue;
            }

            let postfix = self
                .current()
                .filter(|t| {
                    t.kind == TokenKind::Operator && POSTFIX_OPERATORS.contains(&t.value.as_str())
                })
                .map(|t| t.value.clone());

            match postfix {
                Some(operator) => {
                    self.advance();
                    self.descend()?;
                    expr = Expr::Postfix {
                        operator,
                        argument: Box::new(expr),
                    };
                }
                None => break,
            }
        }
        self.depth = depth;
        Ok(expr)
    }
}

/// Parse a token sequence into a [`Program`]
pub fn parse(tokens: &[Token]) -> Result<Program> {
    Parser::new(tokens).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Result<Program> {
        Parser::from_source(source).parse_program()
    }

    fn function(program: &Program, index: usize) -> &FunctionDeclaration {
        match &program.body[index] {
            Item::Function(func) => func,
            other => panic!("expected function, got {:?}", other.kind()),
        }
    }

    fn expr(source: &str) -> Expr {
        Parser::from_source(source).parse_expr().unwrap()
    }

    fn binary(left: Expr, operator: &str, right: Expr) -> Expr {
        Expr::Binary {
            left: Box::new(left),
            operator: operator.to_string(),
            right: Box::new(right),
        }
    }

    #[test]
    fn test_empty_program() {
        let program = parse("").unwrap();
        assert!(program.body.is_empty());
        let program = parse("// only a comment\n/* and another */").unwrap();
        assert!(program.body.is_empty());
    }

    #[test]
    fn test_empty_function() {
        let program = parse("int main() {}").unwrap();
        assert_eq!(program.body.len(), 1);
        let main = function(&program, 0);
        assert_eq!(main.return_type, "int");
        assert_eq!(main.name, "main");
        assert!(main.parameters.is_empty());
        assert!(main.body.body.is_empty());
    }

    #[test]
    fn test_function_with_params() {
        let program = parse("int add(int a, float b) { return a + b; }").unwrap();
        let add = function(&program, 0);
        assert_eq!(
            add.parameters,
            vec![Parameter::new("int", "a"), Parameter::new("float", "b")]
        );
        assert_eq!(
            add.body.body,
            vec![Stmt::Return {
                expression: Some(binary(Expr::identifier("a"), "+", Expr::identifier("b"))),
                line: 1,
            }]
        );
    }

    #[test]
    fn test_void_parameter_list() {
        let program = parse("void f(void) { return; }").unwrap();
        assert!(function(&program, 0).parameters.is_empty());
    }

    #[test]
    fn test_preprocessor_and_globals() {
        let program = parse("#include <stdio.h>\nint g = 1, h;\nint main() { return g; }").unwrap();
        let kinds: Vec<NodeKind> = program.body.iter().map(Item::kind).collect();
        assert_eq!(
            kinds,
            vec![
                NodeKind::PreprocessorDirective,
                NodeKind::DeclarationStatement,
                NodeKind::FunctionDeclaration,
            ]
        );
        match &program.body[1] {
            Item::Declaration(decl) => {
                assert_eq!(decl.var_type, "int");
                assert_eq!(decl.variables.len(), 2);
                assert_eq!(decl.variables[0].initializer, Some(Expr::literal("1")));
                assert_eq!(decl.variables[1].initializer, None);
                assert_eq!(decl.line, 2);
            }
            other => panic!("unexpected item {:?}", other.kind()),
        }
    }

    #[test]
    fn test_precedence() {
        assert_eq!(
            expr("a + b * c"),
            binary(
                Expr::identifier("a"),
                "+",
                binary(Expr::identifier("b"), "*", Expr::identifier("c"))
            )
        );
        assert_eq!(
            expr("(a + b) * c"),
            binary(
                binary(Expr::identifier("a"), "+", Expr::identifier("b")),
                "*",
                Expr::identifier("c")
            )
        );
        assert_eq!(
            expr("a - b - c"),
            binary(
                binary(Expr::identifier("a"), "-", Expr::identifier("b")),
                "-",
                Expr::identifier("c")
            )
        );
    }

    #[test]
    fn test_assignment_is_right_associative() {
        let parsed = expr("a = b += 1");
        assert_eq!(
            parsed,
            Expr::Assignment {
                left: Box::new(Expr::identifier("a")),
                operator: "=".to_string(),
                right: Box::new(Expr::Assignment {
                    left: Box::new(Expr::identifier("b")),
                    operator: "+=".to_string(),
                    right: Box::new(Expr::literal("1")),
                }),
            }
        );
    }

    #[test]
    fn test_prefix_postfix_and_calls() {
        assert_eq!(
            expr("++i"),
            Expr::Prefix {
                operator: "++".to_string(),
                argument: Box::new(Expr::identifier("i")),
            }
        );
        assert_eq!(
            expr("i--"),
            Expr::Postfix {
                operator: "--".to_string(),
                argument: Box::new(Expr::identifier("i")),
            }
        );
        assert_eq!(
            expr("printf(\"%d\", add(1, x))"),
            Expr::Call {
                callee: Box::new(Expr::identifier("printf")),
                arguments: vec![
                    Expr::literal("\"%d\""),
                    Expr::Call {
                        callee: Box::new(Expr::identifier("add")),
                        arguments: vec![Expr::literal("1"), Expr::identifier("x")],
                    },
                ],
            }
        );
    }

    #[test]
    fn test_if_else_wraps_single_statements() {
        let program = parse("int main() { if (x > 0) y = 1; else { y = 2; } return 0; }").unwrap();
        match &function(&program, 0).body.body[0] {
            Stmt::If { then, else_branch, .. } => {
                assert_eq!(then.body.len(), 1);
                assert_eq!(then.body[0].kind(), NodeKind::ExpressionStatement);
                assert_eq!(else_branch.as_ref().map(|b| b.body.len()), Some(1));
            }
            other => panic!("expected if, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_for_clauses() {
        let program = parse("int main() { for (int i = 0; i < 10; i++) { x += i; } for (;;) ; }").unwrap();
        let body = &function(&program, 0).body.body;
        match &body[0] {
            Stmt::For { initialization, condition, increment, body, .. } => {
                assert!(matches!(initialization, Some(ForInit::Declaration(d)) if d.variables[0].name == "i"));
                assert!(condition.is_some());
                assert!(matches!(increment, Some(Expr::Postfix { .. })));
                assert_eq!(body.body.len(), 1);
            }
            other => panic!("expected for, got {:?}", other.kind()),
        }
        match &body[1] {
            Stmt::For { initialization, condition, increment, body, .. } => {
                assert!(initialization.is_none());
                assert!(condition.is_none());
                assert!(increment.is_none());
                assert!(body.body.is_empty());
            }
            other => panic!("expected for, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_while() {
        let program = parse("int main() { while (n > 0) n--; return n; }").unwrap();
        assert_eq!(function(&program, 0).body.body[0].kind(), NodeKind::WhileStatement);
    }

    #[test]
    fn test_missing_semicolon_error() {
        let err = parse("int main() {\n  int x = 1\n  return x;\n}").unwrap_err();
        assert_eq!(err.expected(), Some("';'"));
        let token = err.token().unwrap();
        assert_eq!(token.value, "return");
        assert_eq!(token.line, 3);
    }

    #[test]
    fn test_unexpected_end_of_input() {
        let err = parse("int main() { return 0;").unwrap_err();
        assert_eq!(
            err,
            Error::UnexpectedEof {
                expected: "'}'".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_unknown_top_level() {
        let err = parse("x = 1;").unwrap_err();
        assert_eq!(err.expected(), Some("function or variable declaration"));
        let err = parse("int main() { a[0] = 1; }").unwrap_err();
        assert_eq!(err.token().map(|t| t.kind), Some(TokenKind::Undefined));
    }

    fn assert_too_deep(source: &str) {
        assert_eq!(
            parse(source).unwrap_err(),
            Error::NestingTooDeep {
                line: 1,
                limit: MAX_NESTING_DEPTH
            }
        );
    }

    #[test]
    fn test_deep_nesting_is_an_error() {
        let parens = format!("int f() {{ return {}1{}; }}", "(".repeat(10_000), ")".repeat(10_000));
        assert_too_deep(&parens);
        assert_too_deep(&format!("int f() {{ return {}x; }}", "- ".repeat(10_000)));
        assert_too_deep(&format!("void f() {{ {}{} }}", "{".repeat(10_000), "}".repeat(10_000)));
        assert_too_deep(&format!("int f() {{ return 1{}; }}", " + 1".repeat(10_000)));
        assert_too_deep(&format!("void f() {{ g{}; }}", "()".repeat(10_000)));
    }

    #[test]
    fn test_moderate_nesting_still_parses() {
        let parens = format!("int f() {{ return {}1{}; }}", "(".repeat(60), ")".repeat(60));
        assert_eq!(
            function(&parse(&parens).unwrap(), 0).body.body,
            vec![Stmt::Return {
                expression: Some(Expr::literal("1")),
                line: 1,
            }]
        );
        assert!(parse(&format!("void f() {{ {}{} }}", "{".repeat(100), "}".repeat(100))).is_ok());
        assert!(parse(&format!("int f() {{ return 1{}; }}", " + 1".repeat(200))).is_ok());
    }
}
