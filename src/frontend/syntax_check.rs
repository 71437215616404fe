//! Line-based syntax pre-check
//!
//! A fast heuristic pass over the raw source, run before the real parser.
//! It is a lint, not a proof: the missing-semicolon rule both over- and
//! under-reports (a brace on its own line after `int main()` is flagged, a
//! missing semicolon inside `for (...)` is not).

use std::fmt;

use log::debug;
use serde::Serialize;

/// Lines starting with these never need a trailing semicolon
const CONTROL_PREFIXES: [&str; 4] = ["for", "if", "while", "else"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum SyntaxIssue {
    MissingSemicolon { line: usize },
    UnmatchedClosing { line: usize, bracket: char },
    UnmatchedOpening { line: usize, bracket: char },
}

impl SyntaxIssue {
    pub fn line(&self) -> usize {
        match self {
            Self::MissingSemicolon { line }
            | Self::UnmatchedClosing { line, .. }
            | Self::UnmatchedOpening { line, .. } => *line,
        }
    }
}

impl fmt::Display for SyntaxIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSemicolon { line } => {
                write!(f, "Line {}: Possible missing semicolon.", line)
            }
            Self::UnmatchedClosing { line, bracket } => {
                write!(f, "Line {}: Unmatched closing '{}'.", line, bracket)
            }
            Self::UnmatchedOpening { line, bracket } => {
                write!(f, "Line {}: Unmatched opening '{}'.", line, bracket)
            }
        }
    }
}

fn needs_semicolon(trimmed: &str) -> bool {
    !trimmed.is_empty()
        && !trimmed.starts_with("//")
        && !trimmed.starts_with('#')
        && !trimmed.ends_with(';')
        && !trimmed.ends_with('}')
        && !trimmed.ends_with('{')
        && !trimmed.contains('{')
        && !CONTROL_PREFIXES.iter().any(|p| trimmed.starts_with(p))
        && !trimmed.contains("switch")
        && !trimmed.contains(':')
}

fn opening_for(close: char) -> char {
    match close {
        '}' => '{',
        ')' => '(',
        _ => '[',
    }
}

/// Run the heuristic checks over `source`
pub fn check_syntax(source: &str) -> Vec<SyntaxIssue> {
    let mut issues = Vec::new();
    let mut stack: Vec<(char, usize)> = Vec::new();

    for (index, text) in source.split('\n').enumerate() {
        let line = index + 1;

        if needs_semicolon(text.trim()) {
            issues.push(SyntaxIssue::MissingSemicolon { line });
        }

        for c in text.chars() {
            match c {
                '{' | '(' | '[' => stack.push((c, line)),
                '}' | ')' | ']' => match stack.pop() {
                    Some((open, _)) if open == opening_for(c) => {}
                    _ => issues.push(SyntaxIssue::UnmatchedClosing { line, bracket: c }),
                },
                _ => {}
            }
        }
    }

    issues.extend(
        stack
            .into_iter()
            .map(|(bracket, line)| SyntaxIssue::UnmatchedOpening { line, bracket }),
    );

    debug!("Syntax pre-check found {} issues", issues.len());
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn messages(source: &str) -> Vec<String> {
        check_syntax(source).iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_clean_program() {
        let source = "#include <stdio.h>\nint main() {\n  int x = 1; // one\n  if (x) {\n    x++;\n  }\n  return 0;\n}\n";
        assert!(check_syntax(source).is_empty());
    }

    #[test]
    fn test_missing_semicolon() {
        assert_eq!(
            messages("if (x) {\n  y = 1\n}"),
            vec!["Line 2: Possible missing semicolon."]
        );
    }

    #[test]
    fn test_unterminated_block() {
        assert_eq!(
            check_syntax("void f() {"),
            vec![SyntaxIssue::UnmatchedOpening { line: 1, bracket: '{' }]
        );
    }

    #[test]
    fn test_mismatched_closing() {
        assert_eq!(
            messages("int f() {\n  g(1];\n}"),
            vec!["Line 2: Unmatched closing ']'."]
        );
        // The mismatched close still consumed the '(' so the block closes cleanly
        assert_eq!(messages("int f() {\n  g(1]);\n}"), vec![
            "Line 2: Unmatched closing ']'.",
            "Line 2: Unmatched closing ')'.",
            "Line 3: Unmatched closing '}'.",
        ]);
    }

    #[test]
    fn test_stray_closing_and_leftovers_in_stack_order() {
        assert_eq!(
            messages(")\nint f() {\n  (;"),
            vec![
                "Line 1: Possible missing semicolon.",
                "Line 1: Unmatched closing ')'.",
                "Line 2: Unmatched opening '{'.",
                "Line 3: Unmatched opening '('.",
            ]
        );
    }

    #[test]
    fn test_heuristic_exemptions() {
        for line in ["// note", "#define N 10", "else", "while (x)", "label:", "switch (x)"] {
            assert!(!needs_semicolon(line), "{} should be exempt", line);
        }
        assert!(needs_semicolon("int main()"));
    }
}
