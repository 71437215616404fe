//! Semantic Analysis for the C subset
//!
//! Performs:
//! - Symbol table management (flat, scope-tagged)
//! - Duplicate and undeclared name detection
//! - Return statement checks against the enclosing function
//! - Call arity checks
//!
//! Analysis never fails. Every problem is recorded as an error or warning and
//! the walk carries on, so one run reports as much as possible.

use log::{debug, trace};
use serde::Serialize;

use crate::frontend::ast::*;
use crate::stdlib;

/// Scope tag of symbols declared outside any function
pub const GLOBAL_SCOPE: &str = "global";

// ==================== Symbol Table ====================

/// Kind of symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Function,
    Parameter,
    Variable,
}

impl SymbolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SymbolKind::Function => "function",
            SymbolKind::Parameter => "parameter",
            SymbolKind::Variable => "variable",
        }
    }
}

/// Symbol information
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Declared type, or return type for functions
    #[serde(rename = "type")]
    pub ty: String,
    pub parameters: Vec<Parameter>,
    pub variadic: bool,
    /// `global` or the name of the enclosing function
    pub scope: String,
}

impl Symbol {
    pub fn function(name: &str, ret: &str, parameters: Vec<Parameter>, variadic: bool) -> Self {
        Self {
            name: name.to_string(),
            kind: SymbolKind::Function,
            ty: ret.to_string(),
            parameters,
            variadic,
            scope: GLOBAL_SCOPE.to_string(),
        }
    }

    pub fn value(name: &str, kind: SymbolKind, ty: &str, scope: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            ty: ty.to_string(),
            parameters: Vec::new(),
            variadic: false,
            scope: scope.to_string(),
        }
    }
}

/// Flat symbol table in declaration order.
///
/// Scopes are tags, not frames: lookup returns the first symbol with the
/// name, wherever it was declared.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a symbol; duplicates are the caller's concern
    pub fn define(&mut self, symbol: Symbol) {
        trace!("Define {} '{}' in {}", symbol.kind.as_str(), symbol.name, symbol.scope);
        self.symbols.push(symbol);
    }

    /// Look up the first symbol with this name
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.symbols.iter().find(|s| s.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Symbol> {
        self.symbols.iter()
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn into_vec(self) -> Vec<Symbol> {
        self.symbols
    }
}

// ==================== Diagnostics ====================

/// An error or warning tied to the kind of node that caused it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub message: String,
    /// Node-kind tag, or `Unknown`
    pub node: String,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, node: Option<NodeKind>) -> Self {
        Self {
            message: message.into(),
            node: node.map_or("Unknown", |k| k.as_str()).to_string(),
        }
    }
}

/// Outcome of one analysis run
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub symbol_table: Vec<Symbol>,
    /// True iff no errors were recorded; warnings do not count
    pub is_valid: bool,
}

// ==================== Analysis Context ====================

/// The function whose body is being analyzed
#[derive(Debug, Clone, Copy)]
struct FunctionContext<'a> {
    name: &'a str,
    return_type: &'a str,
}

/// State threaded down the recursive walk; each nested construct gets its
/// own copy, so leaving it restores the caller's view automatically
#[derive(Debug, Clone, Copy, Default)]
struct Context<'a> {
    function: Option<FunctionContext<'a>>,
    in_loop: bool,
}

impl<'a> Context<'a> {
    fn scope(&self) -> &'a str {
        self.function.map_or(GLOBAL_SCOPE, |f| f.name)
    }

    fn enter_function(self, func: &'a FunctionDeclaration) -> Self {
        Self {
            function: Some(FunctionContext {
                name: &func.name,
                return_type: &func.return_type,
            }),
            ..self
        }
    }

    fn enter_loop(self) -> Self {
        Self { in_loop: true, ..self }
    }
}

// ==================== Semantic Analyzer ====================

/// Semantic analyzer
#[derive(Debug, Default)]
pub struct SemanticAnalyzer {
    symbols: SymbolTable,
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
}

impl SemanticAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register built-in functions
    fn register_builtins(&mut self) {
        for func in stdlib::standard_functions() {
            self.symbols.define(Symbol::function(
                func.name,
                func.ret_type,
                func.params,
                func.variadic,
            ));
        }
    }

    fn error(&mut self, message: impl Into<String>, node: NodeKind) {
        self.errors.push(Diagnostic::new(message, Some(node)));
    }

    fn warning(&mut self, message: impl Into<String>, node: NodeKind) {
        self.warnings.push(Diagnostic::new(message, Some(node)));
    }

    /// Analyze a program. All state from earlier runs is discarded first.
    pub fn analyze(&mut self, program: &Program) -> AnalysisResult {
        self.symbols = SymbolTable::new();
        self.errors.clear();
        self.warnings.clear();
        self.register_builtins();

        let ctx = Context::default();
        for item in &program.body {
            self.check_item(item, ctx);
        }

        let has_main = self
            .symbols
            .iter()
            .any(|s| s.name == "main" && s.kind == SymbolKind::Function);
        if !has_main {
            self.warning("Program should have a 'main' function", NodeKind::Program);
        }

        debug!(
            "Semantic analysis: {} errors, {} warnings, {} symbols",
            self.errors.len(),
            self.warnings.len(),
            self.symbols.len()
        );

        let errors = std::mem::take(&mut self.errors);
        AnalysisResult {
            is_valid: errors.is_empty(),
            errors,
            warnings: std::mem::take(&mut self.warnings),
            symbol_table: std::mem::take(&mut self.symbols).into_vec(),
        }
    }

    fn check_item<'a>(&mut self, item: &'a Item, ctx: Context<'a>) {
        match item {
            Item::Function(func) => self.check_function(func, ctx),
            Item::Declaration(decl) => self.check_declaration(decl, ctx),
            // Nothing to check
            Item::Preprocessor(_) => {}
        }
    }

    fn check_function<'a>(&mut self, func: &'a FunctionDeclaration, ctx: Context<'a>) {
        let existing = self.symbols.lookup(&func.name);
        if existing.map_or(false, |s| s.kind == SymbolKind::Function) {
            self.error(
                format!("Duplicate function declaration: '{}'", func.name),
                NodeKind::FunctionDeclaration,
            );
            return;
        }

        self.symbols.define(Symbol::function(
            &func.name,
            &func.return_type,
            func.parameters.clone(),
            false,
        ));

        // Add parameters to scope
        for param in &func.parameters {
            if self.symbols.contains(&param.param_name) {
                self.error(
                    format!("Duplicate parameter name: '{}'", param.param_name),
                    NodeKind::Parameter,
                );
            } else {
                self.symbols.define(Symbol::value(
                    &param.param_name,
                    SymbolKind::Parameter,
                    &param.param_type,
                    &func.name,
                ));
            }
        }

        self.check_block(&func.body, ctx.enter_function(func));
    }

    fn check_block<'a>(&mut self, block: &'a CompoundStatement, ctx: Context<'a>) {
        for stmt in &block.body {
            self.check_stmt(stmt, ctx);
        }
    }

    fn check_declaration<'a>(&mut self, decl: &'a DeclarationStatement, ctx: Context<'a>) {
        for var in &decl.variables {
            if self.symbols.contains(&var.name) {
                self.error(
                    format!("Duplicate variable declaration: '{}'", var.name),
                    NodeKind::DeclarationStatement,
                );
            } else {
                self.symbols.define(Symbol::value(
                    &var.name,
                    SymbolKind::Variable,
                    &decl.var_type,
                    ctx.scope(),
                ));
            }

            // Initializers are checked for names, never against the declared type
            if let Some(init) = &var.initializer {
                self.check_expr(init, ctx);
            }
        }
    }

    fn check_stmt<'a>(&mut self, stmt: &'a Stmt, ctx: Context<'a>) {
        match stmt {
            Stmt::Compound(block) => self.check_block(block, ctx),
            Stmt::Declaration(decl) => self.check_declaration(decl, ctx),
            Stmt::Return { expression, .. } => self.check_return(expression.as_ref(), ctx),
            Stmt::If { condition, then, else_branch, .. } => {
                self.check_expr(condition, ctx);
                self.check_block(then, ctx);
                if let Some(else_branch) = else_branch {
                    self.check_block(else_branch, ctx);
                }
            }
            Stmt::For { initialization, condition, increment, body, .. } => {
                trace!("Entering for loop (nested: {})", ctx.in_loop);
                let ctx = ctx.enter_loop();
                match initialization {
                    Some(ForInit::Declaration(decl)) => self.check_declaration(decl, ctx),
                    Some(ForInit::Expression(expr)) => self.check_expr(expr, ctx),
                    None => {}
                }
                for expr in condition.iter().chain(increment.iter()) {
                    self.check_expr(expr, ctx);
                }
                self.check_block(body, ctx);
            }
            Stmt::While { condition, body, .. } => {
                trace!("Entering while loop (nested: {})", ctx.in_loop);
                let ctx = ctx.enter_loop();
                self.check_expr(condition, ctx);
                self.check_block(body, ctx);
            }
            Stmt::Expression { expression, .. } => self.check_expr(expression, ctx),
            // Constructs outside the subset are skipped
            Stmt::Unsupported { kind } => trace!("Skipping unsupported statement {}", kind),
        }
    }

    fn check_return(&mut self, value: Option<&Expr>, ctx: Context<'_>) {
        let Some(func) = ctx.function else {
            self.error("Return statement outside of function", NodeKind::ReturnStatement);
            return;
        };

        match value {
            Some(expr) => {
                if func.return_type == "void" {
                    self.error(
                        "Void function should not return a value",
                        NodeKind::ReturnStatement,
                    );
                }
                self.check_expr(expr, ctx);
            }
            None if func.return_type != "void" => {
                self.error(
                    format!("Function '{}' should return a value", func.name),
                    NodeKind::ReturnStatement,
                );
            }
            None => {}
        }
    }

    fn check_expr(&mut self, expr: &Expr, ctx: Context<'_>) {
        match expr {
            Expr::Identifier { name } => {
                if !self.symbols.contains(name) {
                    self.error(
                        format!("Undeclared identifier '{}'", name),
                        NodeKind::Identifier,
                    );
                }
            }
            Expr::Assignment { left, right, .. } => {
                if let Expr::Identifier { name } = left.as_ref() {
                    if !self.symbols.contains(name) {
                        self.error(
                            format!("Undeclared variable '{}'", name),
                            NodeKind::Identifier,
                        );
                    }
                }
                self.check_expr(right, ctx);
            }
            Expr::Binary { left, right, .. } => {
                self.check_expr(left, ctx);
                self.check_expr(right, ctx);
            }
            Expr::Prefix { argument, .. } | Expr::Postfix { argument, .. } => {
                self.check_expr(argument, ctx)
            }
            Expr::Call { callee, arguments } => {
                self.check_call(callee, arguments);
                for arg in arguments {
                    self.check_expr(arg, ctx);
                }
            }
            // Literals need no checks; unknown constructs are skipped
            Expr::Literal { .. } | Expr::Unsupported { .. } => {}
        }
    }

    /// Check the callee and arity of a call; arguments are visited by the caller
    fn check_call(&mut self, callee: &Expr, arguments: &[Expr]) {
        let Expr::Identifier { name } = callee else {
            self.error("Expression is not callable", NodeKind::CallExpression);
            return;
        };

        let found = self
            .symbols
            .lookup(name)
            .map(|s| (s.kind, s.parameters.len(), s.variadic));

        let (expected, variadic) = match found {
            None => {
                self.error(
                    format!("Undeclared function '{}'", name),
                    NodeKind::CallExpression,
                );
                return;
            }
            Some((kind, _, _)) if kind != SymbolKind::Function => {
                self.error(
                    format!("'{}' is not a function", name),
                    NodeKind::CallExpression,
                );
                return;
            }
            Some((_, expected, variadic)) => (expected, variadic),
        };

        if !variadic && expected != arguments.len() {
            self.error(
                format!(
                    "Function '{}' expects {} arguments but got {}",
                    name,
                    expected,
                    arguments.len()
                ),
                NodeKind::CallExpression,
            );
        }
    }
}

/// Analyze `program` with a fresh analyzer
pub fn analyze(program: &Program) -> AnalysisResult {
    SemanticAnalyzer::new().analyze(program)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::parser::Parser;
    use pretty_assertions::assert_eq;

    fn analyze(source: &str) -> AnalysisResult {
        let program = Parser::from_source(source).parse_program().unwrap();
        SemanticAnalyzer::new().analyze(&program)
    }

    fn error_messages(result: &AnalysisResult) -> Vec<&str> {
        result.errors.iter().map(|d| d.message.as_str()).collect()
    }

    #[test]
    fn test_simple_function() {
        let result = analyze("int main() { return 0; }");
        assert!(result.is_valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
        assert_eq!(result.symbol_table.len(), 7);
        let main = &result.symbol_table[6];
        assert_eq!(main.name, "main");
        assert_eq!(main.kind, SymbolKind::Function);
        assert_eq!(main.ty, "int");
        assert_eq!(main.scope, GLOBAL_SCOPE);
    }

    #[test]
    fn test_builtins_seeded_first() {
        let result = analyze("");
        let names: Vec<&str> = result.symbol_table.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["printf", "scanf", "malloc", "free", "puts", "gets"]);
        assert!(result.symbol_table[0].variadic);
    }

    #[test]
    fn test_missing_main_is_only_a_warning() {
        let result = analyze("void helper() { }");
        assert!(result.is_valid);
        assert_eq!(
            result.warnings,
            vec![Diagnostic::new(
                "Program should have a 'main' function",
                Some(NodeKind::Program)
            )]
        );
    }

    #[test]
    fn test_undeclared_function() {
        let result = analyze("int main() { foo(); return 0; }");
        assert!(!result.is_valid);
        assert_eq!(error_messages(&result), vec!["Undeclared function 'foo'"]);
        assert_eq!(result.errors[0].node, "CallExpression");
    }

    #[test]
    fn test_duplicate_variable_not_registered() {
        let result = analyze("int main() { int x; int x; return 0; }");
        assert_eq!(error_messages(&result), vec!["Duplicate variable declaration: 'x'"]);
        let count = result.symbol_table.iter().filter(|s| s.name == "x").count();
        assert_eq!(count, 1);
        assert_eq!(result.symbol_table.last().map(|s| s.scope.as_str()), Some("main"));
    }

    #[test]
    fn test_return_checks() {
        assert_eq!(
            error_messages(&analyze("void f() { return 1; }")),
            vec!["Void function should not return a value"]
        );
        assert_eq!(
            error_messages(&analyze("int f() { return; }")),
            vec!["Function 'f' should return a value"]
        );
        assert!(analyze("int f() { return 1; }").is_valid);
        assert!(analyze("void f() { return; }").is_valid);
    }

    #[test]
    fn test_return_outside_function() {
        let program = Program {
            body: Vec::new(),
        };
        let mut analyzer = SemanticAnalyzer::new();
        analyzer.analyze(&program);
        analyzer.check_stmt(
            &Stmt::Return {
                expression: None,
                line: 1,
            },
            Context::default(),
        );
        assert_eq!(
            analyzer.errors,
            vec![Diagnostic::new(
                "Return statement outside of function",
                Some(NodeKind::ReturnStatement)
            )]
        );
    }

    #[test]
    fn test_undeclared_identifiers_keep_going() {
        let result = analyze("int main() { int y = a + b; c = y; return y; }");
        assert_eq!(
            error_messages(&result),
            vec![
                "Undeclared identifier 'a'",
                "Undeclared identifier 'b'",
                "Undeclared variable 'c'",
            ]
        );
    }

    #[test]
    fn test_call_arity() {
        let result = analyze(
            "int add(int a, int b) { return a + b; }\nint main() { printf(\"%d %d\", 1, 2); return add(1); }",
        );
        assert_eq!(
            error_messages(&result),
            vec!["Function 'add' expects 2 arguments but got 1"]
        );
    }

    #[test]
    fn test_call_arguments_visited_even_when_callee_unknown() {
        let result = analyze("int main() { missing(z); return 0; }");
        assert_eq!(
            error_messages(&result),
            vec!["Undeclared function 'missing'", "Undeclared identifier 'z'"]
        );
    }

    #[test]
    fn test_calling_a_variable() {
        let result = analyze("int main() { int v = 1; v(); return 0; }");
        assert_eq!(error_messages(&result), vec!["'v' is not a function"]);
    }

    #[test]
    fn test_duplicate_function_and_parameter() {
        let result = analyze("int f(int a, int a) { return a; }\nint f() { return 0; }\nint main() { return 0; }");
        assert_eq!(
            error_messages(&result),
            vec![
                "Duplicate parameter name: 'a'",
                "Duplicate function declaration: 'f'",
            ]
        );
        assert_eq!(result.errors[0].node, "Parameter");
    }

    #[test]
    fn test_flat_table_spans_functions() {
        // Names are not scoped per function
        let result = analyze("int f(int n) { return n; }\nint main() { int n = 2; return f(n); }");
        assert_eq!(error_messages(&result), vec!["Duplicate variable declaration: 'n'"]);
    }

    #[test]
    fn test_globals_and_loops() {
        let result = analyze(
            "int total = 0;\nint main() {\n  for (int i = 0; i < 3; i++) total += i;\n  while (total > 0) total--;\n  return total;\n}",
        );
        assert!(result.is_valid, "{:?}", result.errors);
        let total = result.symbol_table.iter().find(|s| s.name == "total").unwrap();
        assert_eq!(total.scope, GLOBAL_SCOPE);
        let i = result.symbol_table.iter().find(|s| s.name == "i").unwrap();
        assert_eq!(i.scope, "main");
    }

    #[test]
    fn test_loop_context_restored() {
        let ctx = Context::default();
        let inner = ctx.enter_loop();
        assert!(inner.in_loop);
        assert!(!ctx.in_loop);
        assert_eq!(ctx.scope(), GLOBAL_SCOPE);
    }

    #[test]
    fn test_state_reset_between_runs() {
        let program = Parser::from_source("int main() { int x; int x; return 0; }")
            .parse_program()
            .unwrap();
        let mut analyzer = SemanticAnalyzer::new();
        let first = analyzer.analyze(&program);
        let second = analyzer.analyze(&program);
        assert_eq!(first, second);
        assert_eq!(second.errors.len(), 1);
    }

    #[test]
    fn test_unsupported_nodes_are_skipped() {
        let program = Program {
            body: vec![Item::Function(FunctionDeclaration {
                return_type: "int".to_string(),
                name: "main".to_string(),
                parameters: Vec::new(),
                body: CompoundStatement {
                    body: vec![
                        Stmt::Unsupported {
                            kind: "SwitchStatement".to_string(),
                        },
                        Stmt::Expression {
                            expression: Expr::Unsupported {
                                kind: "MemberExpression".to_string(),
                            },
                            line: 1,
                        },
                        Stmt::Return {
                            expression: Some(Expr::literal("0")),
                            line: 1,
                        },
                    ],
                },
                line: 1,
            })],
        };
        assert!(SemanticAnalyzer::new().analyze(&program).is_valid);
    }
}
