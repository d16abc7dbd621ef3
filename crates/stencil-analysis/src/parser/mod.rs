//! Template DSL parser: delimiter lexer, tag-stack grammar, tagged-union AST.

pub mod ast;
pub mod grammar;
pub mod lexer;

pub use ast::{Expr, IfBranch, Node, Span};
pub use grammar::parse;

use stencil_core::errors::SyntaxError;

use crate::loader::TemplateSource;

/// A template after the parse phase: the source plus either an AST or the
/// syntax error that prevented one.
#[derive(Debug)]
pub struct ParsedTemplate {
    pub source: TemplateSource,
    pub ast: Option<Vec<Node>>,
    pub syntax_error: Option<SyntaxError>,
}

impl ParsedTemplate {
    pub fn parse(source: TemplateSource) -> Self {
        match grammar::parse(&source.content) {
            Ok(ast) => Self {
                source,
                ast: Some(ast),
                syntax_error: None,
            },
            Err(err) => Self {
                source,
                ast: None,
                syntax_error: Some(err),
            },
        }
    }

    pub fn syntax_valid(&self) -> bool {
        self.syntax_error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_and_invalid_round_trip() {
        let ok = ParsedTemplate::parse(TemplateSource::from_content("a.tmpl", "{{ x }}"));
        assert!(ok.syntax_valid());
        assert_eq!(ok.ast.as_ref().map(Vec::len), Some(1));

        let bad = ParsedTemplate::parse(TemplateSource::from_content("b.tmpl", "{% if x %}"));
        assert!(!bad.syntax_valid());
        assert!(bad.ast.is_none());
    }
}
