//! Formula lint
//!
//! Reports problems with stored definitions without blocking a save.

use std::fmt;

use lazy_regex::regex;
use weighbill_core::{ColumnKind, ColumnSchema};

use crate::reference::{code_text, references};
use crate::store::FormulaSet;

/// Functions a definition may call
pub const SUPPORTED_FUNCTIONS: &[&str] = &[
    "ROUND",
    "ROUNDUP",
    "ROUNDDOWN",
    "SUM",
    "MIN",
    "MAX",
    "ABS",
    "IF",
    "ROW",
];

/// What is wrong with a definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// The definition is keyed by a name not in the schema
    UnknownColumn,
    /// The definition is keyed by an input column
    NotFormulaColumn(ColumnKind),
    /// The expression references a name not in the schema
    UnknownReference(String),
    /// A `[` or `]` without its partner
    UnbalancedBrackets,
    /// A `(` or `)` without its partner
    UnbalancedParentheses,
    /// A call to a function outside [`SUPPORTED_FUNCTIONS`]
    UnsupportedFunction(String),
    /// The expression does not start with `=`
    MissingEquals,
}

/// A lint finding for one stored definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormulaIssue {
    /// Key of the definition
    pub column: String,
    /// Finding
    pub kind: IssueKind,
}

impl fmt::Display for FormulaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let column = &self.column;
        match &self.kind {
            IssueKind::UnknownColumn => {
                write!(f, "{column}: not a column in the schema, formula is never used")
            }
            IssueKind::NotFormulaColumn(kind) => write!(
                f,
                "{column}: is a {} input column, formula is never used",
                kind.as_str()
            ),
            IssueKind::UnknownReference(name) => {
                write!(f, "{column}: unknown column reference [{name}]")
            }
            IssueKind::UnbalancedBrackets => write!(f, "{column}: unbalanced brackets"),
            IssueKind::UnbalancedParentheses => write!(f, "{column}: unbalanced parentheses"),
            IssueKind::UnsupportedFunction(name) => {
                write!(f, "{column}: unsupported function {name}()")
            }
            IssueKind::MissingEquals => write!(f, "{column}: formula does not start with '='"),
        }
    }
}

/// Check every definition in `formulas` against `schema`
///
/// Blank expressions are only checked for their key.
pub fn lint(formulas: &FormulaSet, schema: &ColumnSchema) -> Vec<FormulaIssue> {
    let mut issues = Vec::new();

    for (column, definition) in formulas.iter() {
        let mut report = |kind| {
            issues.push(FormulaIssue {
                column: column.to_string(),
                kind,
            })
        };

        match schema.kind_of(column) {
            None => report(IssueKind::UnknownColumn),
            Some(ColumnKind::Formula) => {}
            Some(kind) => report(IssueKind::NotFormulaColumn(kind)),
        }

        let expression = definition.formula.as_str();
        if expression.trim().is_empty() {
            continue;
        }

        if !expression.trim_start().starts_with('=') {
            report(IssueKind::MissingEquals);
        }

        let mut seen: Vec<&str> = Vec::new();
        for name in references(expression) {
            if !schema.contains(name) && !seen.contains(&name) {
                seen.push(name);
                report(IssueKind::UnknownReference(name.to_string()));
            }
        }

        let code = code_text(expression);
        if code.contains(['[', ']']) {
            // Names in a broken reference would read as function calls
            report(IssueKind::UnbalancedBrackets);
            continue;
        }
        if !parentheses_balanced(&code) {
            report(IssueKind::UnbalancedParentheses);
        }

        let mut calls: Vec<String> = Vec::new();
        for caps in regex!(r"([A-Za-z_][A-Za-z0-9_.]*)\s*\(").captures_iter(&code) {
            let Some(name) = caps.get(1) else { continue };
            let upper = name.as_str().to_ascii_uppercase();
            if !SUPPORTED_FUNCTIONS.contains(&upper.as_str()) && !calls.contains(&upper) {
                report(IssueKind::UnsupportedFunction(upper.clone()));
                calls.push(upper);
            }
        }
    }

    issues
}

fn parentheses_balanced(code: &str) -> bool {
    let mut depth: i32 = 0;
    let mut in_string = false;
    for c in code.chars() {
        match c {
            '"' => in_string = !in_string,
            '(' if !in_string => depth += 1,
            ')' if !in_string => {
                depth -= 1;
                if depth < 0 {
                    return false;
                }
            }
            _ => {}
        }
    }
    depth == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn lint_one(column: &str, expression: &str) -> Vec<IssueKind> {
        let mut set = FormulaSet::new();
        set.set(column, expression);
        lint(&set, ColumnSchema::bill())
            .into_iter()
            .map(|i| i.kind)
            .collect()
    }

    #[test]
    fn test_defaults_only_flag_orphaned_key() {
        let issues = lint(&FormulaSet::defaults(), ColumnSchema::bill());
        assert_eq!(
            issues,
            vec![FormulaIssue {
                column: "Other Crs Amt".into(),
                kind: IssueKind::UnknownColumn,
            }]
        );
        assert_eq!(
            issues[0].to_string(),
            "Other Crs Amt: not a column in the schema, formula is never used"
        );
    }

    #[test]
    fn test_input_column_key() {
        assert_eq!(
            lint_one("Bags", "=1"),
            vec![IssueKind::NotFormulaColumn(ColumnKind::RowInput)]
        );
    }

    #[test]
    fn test_unknown_reference() {
        assert_eq!(
            lint_one("Shortage", "=[Bill Wt] - [Bill Wt] - [Bags]"),
            vec![IssueKind::UnknownReference("Bill Wt".into())]
        );
    }

    #[test]
    fn test_brackets_and_parentheses() {
        assert_eq!(
            lint_one("Shortage", "=[Bags] - [Bill Wt (Qtl)"),
            vec![IssueKind::UnbalancedBrackets]
        );
        assert_eq!(
            lint_one("Shortage", "=ROUND([Bags] * 2, 0"),
            vec![IssueKind::UnbalancedParentheses]
        );
        // Parentheses inside names and strings do not count
        assert!(lint_one("Moisture Cut", r#"=IF([Moist(%)] > 14, ")", 0)"#).is_empty());
    }

    #[test]
    fn test_functions() {
        assert!(lint_one("Shortage", "=round([Bags], 0) + MAX(1, ABS(-2))").is_empty());
        assert_eq!(
            lint_one("Shortage", "=VLOOKUP([Bags], 1) + vlookup(2)"),
            vec![IssueKind::UnsupportedFunction("VLOOKUP".into())]
        );
    }

    #[test]
    fn test_missing_equals_and_blank() {
        assert_eq!(lint_one("Shortage", "[Bags] * 2"), vec![IssueKind::MissingEquals]);
        assert!(lint_one("Shortage", "   ").is_empty());
    }
}
