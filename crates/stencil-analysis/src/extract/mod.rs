//! Structural facts extraction: a scope-aware walk over a valid AST.
//!
//! Free variables are names referenced but not bound by an enclosing `for`
//! target, macro parameter, macro name, or a preceding `set`. This is
//! undeclared-name analysis only; no value or type inference happens here.

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::parser::{Expr, Node, Span};

/// A macro definition as seen by consumers of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MacroFacts {
    pub name: String,
    /// Raw parameter list text, exactly as written in the signature.
    pub params: String,
    pub body_span: Span,
}

/// Read-only structural facts for one template.
///
/// `variables` is a sorted set; blocks, macros and includes keep document
/// order. Dynamically computed include/extends targets are omitted, never
/// guessed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TemplateFacts {
    pub variables: BTreeSet<String>,
    pub blocks: Vec<String>,
    pub macros: Vec<MacroFacts>,
    pub includes: Vec<String>,
    pub extends: Option<String>,
}

/// Extract facts from a valid AST.
pub fn extract(ast: &[Node]) -> TemplateFacts {
    let mut facts = TemplateFacts::default();
    let mut scopes: Vec<FxHashSet<String>> = vec![FxHashSet::default()];
    walk(ast, &mut facts, &mut scopes);
    facts
}

fn walk(nodes: &[Node], facts: &mut TemplateFacts, scopes: &mut Vec<FxHashSet<String>>) {
    for node in nodes {
        match node {
            Node::Output(expr) => note_expr(expr, facts, scopes),
            Node::If {
                branches,
                else_body,
                ..
            } => {
                for branch in branches {
                    note_expr(&branch.cond, facts, scopes);
                    walk(&branch.body, facts, scopes);
                }
                walk(else_body, facts, scopes);
            }
            Node::For {
                targets,
                iter,
                body,
                ..
            } => {
                // the iterable is resolved in the enclosing scope
                note_expr(iter, facts, scopes);
                scopes.push(targets.iter().cloned().collect());
                walk(body, facts, scopes);
                scopes.pop();
            }
            Node::Block { name, body, .. } => {
                facts.blocks.push(name.clone());
                walk(body, facts, scopes);
            }
            Node::Macro {
                name,
                params,
                body,
                span,
            } => {
                if let Some(scope) = scopes.last_mut() {
                    scope.insert(name.clone());
                }
                facts.macros.push(MacroFacts {
                    name: name.clone(),
                    params: params.clone(),
                    body_span: *span,
                });
                scopes.push(param_names(params));
                walk(body, facts, scopes);
                scopes.pop();
            }
            Node::Include { target, .. } => {
                if let Some(target) = target {
                    facts.includes.push(target.clone());
                }
            }
            Node::Extends { target, .. } => {
                if let Some(target) = target {
                    facts.extends = Some(target.clone());
                }
            }
            Node::Set { name, value, .. } => {
                note_expr(value, facts, scopes);
                if let Some(scope) = scopes.last_mut() {
                    scope.insert(name.clone());
                }
            }
        }
    }
}

fn note_expr(expr: &Expr, facts: &mut TemplateFacts, scopes: &[FxHashSet<String>]) {
    for ident in &expr.idents {
        if !scopes.iter().any(|scope| scope.contains(ident)) {
            facts.variables.insert(ident.clone());
        }
    }
}

fn param_names(params: &str) -> FxHashSet<String> {
    params
        .split(',')
        .filter_map(|p| p.split('=').next())
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}
