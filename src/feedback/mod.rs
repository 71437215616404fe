//! Feedback Module
//!
//! Presentation of pipeline results:
//! - The three-section semantic report (errors, warnings, symbol table)
//! - Tokens grouped by kind for tabular display
//! - Syntax pre-check listings
//! - JSON output of tokens, AST and analysis results

use std::fmt;

use serde::Serialize;

use crate::frontend::semantic::{AnalysisResult, Diagnostic, Symbol, SymbolKind, GLOBAL_SCOPE};
use crate::frontend::syntax_check::SyntaxIssue;
use crate::frontend::token::{Token, TokenKind};
use crate::utils::Result;

// ==================== Semantic Report ====================

fn write_diagnostics(f: &mut impl fmt::Write, title: &str, items: &[Diagnostic]) -> fmt::Result {
    if items.is_empty() {
        return Ok(());
    }
    writeln!(f, "=== {} ===", title)?;
    for (i, item) in items.iter().enumerate() {
        writeln!(f, "{}. {} ({})", i + 1, item.message, item.node)?;
    }
    writeln!(f)
}

fn write_symbol(f: &mut impl fmt::Write, symbol: &Symbol) -> fmt::Result {
    write!(f, "{} {}: {}", symbol.kind.as_str(), symbol.name, symbol.ty)?;
    if symbol.scope != GLOBAL_SCOPE {
        write!(f, " (scope: {})", symbol.scope)?;
    }
    if symbol.kind == SymbolKind::Function && !symbol.parameters.is_empty() {
        let params = symbol
            .parameters
            .iter()
            .map(|p| format!("{} {}", p.param_type, p.param_name))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, " (params: {})", params)?;
    }
    if symbol.variadic {
        write!(f, " [variadic]")?;
    }
    writeln!(f)
}

impl fmt::Display for AnalysisResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_diagnostics(f, "ERRORS", &self.errors)?;
        write_diagnostics(f, "WARNINGS", &self.warnings)?;

        if self.errors.is_empty() && self.warnings.is_empty() {
            writeln!(f, "No semantic errors or warnings found.")?;
            writeln!(f)?;
        }

        writeln!(f, "=== SYMBOL TABLE ===")?;
        for symbol in &self.symbol_table {
            write_symbol(f, symbol)?;
        }
        Ok(())
    }
}

/// Format an analysis result as the plain-text report
pub fn format_report(result: &AnalysisResult) -> String {
    result.to_string()
}

// ==================== Token Groups ====================

/// All tokens of one kind, for one row of the token table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenGroup {
    pub kind: TokenKind,
    /// Display label; `UNDEFINED` is shown as `ERROR`
    pub label: &'static str,
    /// `value (Line N)` per token, in source order
    pub entries: Vec<String>,
}

impl fmt::Display for TokenGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.entries.join(", "))
    }
}

/// Group tokens by kind, in [`TokenKind::ALL`] order; kinds with no tokens
/// are left out
pub fn group_tokens(tokens: &[Token]) -> Vec<TokenGroup> {
    TokenKind::ALL
        .iter()
        .filter_map(|&kind| {
            let entries: Vec<String> = tokens
                .iter()
                .filter(|t| t.kind == kind)
                .map(|t| format!("{} (Line {})", t.value, t.line))
                .collect();
            if entries.is_empty() {
                return None;
            }
            let label = match kind {
                TokenKind::Undefined => "ERROR",
                other => other.as_str(),
            };
            Some(TokenGroup { kind, label, entries })
        })
        .collect()
}

/// One line per group, or `No tokens found`
pub fn format_token_groups(groups: &[TokenGroup]) -> String {
    if groups.is_empty() {
        return "No tokens found\n".to_string();
    }
    groups.iter().map(|g| format!("{}\n", g)).collect()
}

// ==================== Syntax Issues ====================

/// Listing shown instead of the semantic report when the pre-check fails
pub fn format_syntax_issues(issues: &[SyntaxIssue]) -> String {
    let lines = issues.iter().map(ToString::to_string).collect::<Vec<_>>();
    format!("=== SYNTAX ERRORS ===\n{}", lines.join("\n"))
}

// ==================== JSON Output ====================

/// Pretty-printed JSON for any pipeline output
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Compact JSON (for programmatic use)
pub fn to_json_compact<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}
