//! Tagged-union AST for the template DSL.
//!
//! Every construct the extractor cares about is its own variant, so a walk
//! over `Node` is exhaustive and compiler-enforced.

/// Line range of a construct, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Span {
    pub start_line: u32,
    pub end_line: u32,
}

/// A lightly parsed expression: raw text plus the identifiers it references
/// and the filters applied to it. No evaluation, no type inference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub raw: String,
    pub idents: Vec<String>,
    pub filters: Vec<String>,
    pub line: u32,
}

/// Expression keywords and builtin names that are never free variables.
const KEYWORDS: &[&str] = &[
    "and", "or", "not", "in", "is", "if", "else", "true", "false", "none", "True", "False",
    "None", "loop",
];

impl Expr {
    /// Extract identifiers and filter names from raw expression text.
    ///
    /// String literals are skipped, names after `.` are attribute accesses,
    /// names after `|` are filters. Everything else that looks like an
    /// identifier and is not a keyword counts as a referenced name.
    pub fn parse(raw: &str, line: u32) -> Self {
        let mut idents = Vec::new();
        let mut filters = Vec::new();

        let chars: Vec<char> = raw.chars().collect();
        let mut prev_sig: Option<char> = None;
        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if c == '"' || c == '\'' {
                // skip string literal (no escape handling needed for analysis)
                i += 1;
                while i < chars.len() && chars[i] != c {
                    i += 1;
                }
                i += 1;
                prev_sig = Some(c);
                continue;
            }
            if c.is_alphabetic() || c == '_' {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || chars[i] == '_') {
                    i += 1;
                }
                let word: String = chars[start..i].iter().collect();
                match prev_sig {
                    Some('.') => {}
                    Some('|') => filters.push(word),
                    _ => {
                        if !KEYWORDS.contains(&word.as_str()) {
                            idents.push(word);
                        }
                    }
                }
                // marker so `.attr` after a name is treated as an access
                prev_sig = Some('\0');
                continue;
            }
            if !c.is_whitespace() {
                prev_sig = Some(c);
            }
            i += 1;
        }

        Self {
            raw: raw.to_string(),
            idents,
            filters,
            line,
        }
    }
}

/// One `if`/`elif` arm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfBranch {
    pub cond: Expr,
    pub body: Vec<Node>,
}

/// A parsed template node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// `{{ expr }}`
    Output(Expr),
    /// `{% if %}` with its `elif` arms and optional `else` body.
    If {
        branches: Vec<IfBranch>,
        else_body: Vec<Node>,
        line: u32,
    },
    /// `{% for targets in iter %}`; a `for`-`else` body is folded into `body`.
    For {
        targets: Vec<String>,
        iter: Expr,
        body: Vec<Node>,
        line: u32,
    },
    /// `{% block name %}`
    Block {
        name: String,
        body: Vec<Node>,
        line: u32,
    },
    /// `{% macro name(params) %}`; params kept as raw signature text.
    Macro {
        name: String,
        params: String,
        body: Vec<Node>,
        span: Span,
    },
    /// `{% include "target" %}`; `None` when the target is dynamic.
    Include { target: Option<String>, line: u32 },
    /// `{% extends "target" %}`; `None` when the target is dynamic.
    Extends { target: Option<String>, line: u32 },
    /// `{% set name = expr %}`
    Set {
        name: String,
        value: Expr,
        line: u32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idents_exclude_attributes_filters_and_literals() {
        let e = Expr::parse("user.name | upper | trim", 1);
        assert_eq!(e.idents, vec!["user"]);
        assert_eq!(e.filters, vec!["upper", "trim"]);

        let e = Expr::parse("greeting ~ \"world\" if polite else other", 1);
        assert_eq!(e.idents, vec!["greeting", "polite", "other"]);
    }

    #[test]
    fn keywords_are_not_variables() {
        let e = Expr::parse("x is not none and y or true", 1);
        assert_eq!(e.idents, vec!["x", "y"]);
    }

    #[test]
    fn filter_after_whitespace_is_still_a_filter() {
        let e = Expr::parse("items |   join", 1);
        assert_eq!(e.idents, vec!["items"]);
        assert_eq!(e.filters, vec!["join"]);
    }
}
