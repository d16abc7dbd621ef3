//! Recursive tag-stack parser: token stream in, `Node` tree or `SyntaxError` out.

use std::sync::LazyLock;
use std::vec::IntoIter;

use regex::Regex;
use stencil_core::errors::SyntaxError;

use super::ast::{Expr, IfBranch, Node, Span};
use super::lexer::{lex, Token};

static FOR_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^(.+?)\s+in\s+(.+)$").expect("static pattern"));
static MACRO_SIG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^(\w+)\s*\((.*)\)\s*$").expect("static pattern"));

/// Parse template source into an AST.
pub fn parse(src: &str) -> Result<Vec<Node>, SyntaxError> {
    let mut parser = Parser {
        tokens: lex(src)?.into_iter(),
        extends_seen: false,
        last_line: 1,
    };
    parser.parse_root()
}

/// An end tag (`elif`/`else`/`end*`) that closed a nested body.
struct Terminator {
    kw: String,
    rest: String,
    line: u32,
}

struct Parser {
    tokens: IntoIter<Token>,
    extends_seen: bool,
    last_line: u32,
}

impl Parser {
    fn parse_root(&mut self) -> Result<Vec<Node>, SyntaxError> {
        let mut nodes = Vec::new();
        while let Some(tok) = self.tokens.next() {
            self.last_line = tok.line();
            match tok {
                Token::Output { raw, line } => nodes.push(output_node(&raw, line)?),
                Token::Tag { raw, line } => {
                    let (kw, rest) = split_tag(&raw);
                    nodes.push(self.parse_tag(kw, rest, line)?);
                }
            }
        }
        Ok(nodes)
    }

    /// Parse a nested body until one of `until` closes it. Running out of
    /// tokens first is an unclosed-tag error naming `end_tag`.
    fn parse_until(
        &mut self,
        until: &[&str],
        end_tag: &str,
    ) -> Result<(Vec<Node>, Terminator), SyntaxError> {
        let mut nodes = Vec::new();
        while let Some(tok) = self.tokens.next() {
            self.last_line = tok.line();
            match tok {
                Token::Output { raw, line } => nodes.push(output_node(&raw, line)?),
                Token::Tag { raw, line } => {
                    let (kw, rest) = split_tag(&raw);
                    if until.contains(&kw) {
                        return Ok((
                            nodes,
                            Terminator {
                                kw: kw.to_string(),
                                rest: rest.to_string(),
                                line,
                            },
                        ));
                    }
                    nodes.push(self.parse_tag(kw, rest, line)?);
                }
            }
        }
        Err(SyntaxError::new(
            format!("unexpected end of template, missing '{{% {end_tag} %}}'"),
            self.last_line,
        ))
    }

    fn parse_tag(&mut self, kw: &str, rest: &str, line: u32) -> Result<Node, SyntaxError> {
        match kw {
            "if" => self.parse_if(rest, line),
            "for" => self.parse_for(rest, line),
            "block" => self.parse_block(rest, line),
            "macro" => self.parse_macro(rest, line),
            "include" => Ok(Node::Include {
                target: string_literal(rest),
                line,
            }),
            "extends" => {
                if self.extends_seen {
                    return Err(SyntaxError::new("multiple extends tags", line));
                }
                self.extends_seen = true;
                Ok(Node::Extends {
                    target: string_literal(rest),
                    line,
                })
            }
            "set" => parse_set(rest, line),
            "elif" | "else" | "endif" | "endfor" | "endblock" | "endmacro" => Err(
                SyntaxError::new(format!("unexpected '{{% {kw} %}}'"), line),
            ),
            other => Err(SyntaxError::new(format!("unknown tag '{other}'"), line)),
        }
    }

    fn parse_if(&mut self, rest: &str, line: u32) -> Result<Node, SyntaxError> {
        if rest.is_empty() {
            return Err(SyntaxError::new("if tag missing a condition", line));
        }
        let mut branches = Vec::new();
        let mut cond = Expr::parse(rest, line);
        loop {
            let (body, term) = self.parse_until(&["elif", "else", "endif"], "endif")?;
            branches.push(IfBranch { cond, body });
            match term.kw.as_str() {
                "elif" => {
                    if term.rest.is_empty() {
                        return Err(SyntaxError::new("elif tag missing a condition", term.line));
                    }
                    cond = Expr::parse(&term.rest, term.line);
                }
                "else" => {
                    let (else_body, _end) = self.parse_until(&["endif"], "endif")?;
                    return Ok(Node::If {
                        branches,
                        else_body,
                        line,
                    });
                }
                _ => {
                    return Ok(Node::If {
                        branches,
                        else_body: Vec::new(),
                        line,
                    })
                }
            }
        }
    }

    fn parse_for(&mut self, rest: &str, line: u32) -> Result<Node, SyntaxError> {
        let Some(caps) = FOR_HEAD.captures(rest) else {
            return Err(SyntaxError::new("malformed for tag, expected 'targets in iterable'", line));
        };
        let targets: Vec<String> = caps[1]
            .trim_matches(|c| c == '(' || c == ')')
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        if targets.is_empty() {
            return Err(SyntaxError::new("for tag has no loop target", line));
        }
        let iter = Expr::parse(&caps[2], line);

        let (mut body, term) = self.parse_until(&["else", "endfor"], "endfor")?;
        if term.kw == "else" {
            // for-else: the else body shares the loop's lexical position
            let (else_body, _end) = self.parse_until(&["endfor"], "endfor")?;
            body.extend(else_body);
        }
        Ok(Node::For {
            targets,
            iter,
            body,
            line,
        })
    }

    fn parse_block(&mut self, rest: &str, line: u32) -> Result<Node, SyntaxError> {
        let Some(name) = rest.split_whitespace().next() else {
            return Err(SyntaxError::new("block tag missing a name", line));
        };
        let name = name.to_string();
        let (body, end) = self.parse_until(&["endblock"], "endblock")?;
        if !end.rest.is_empty() && end.rest != name {
            return Err(SyntaxError::new(
                format!("mismatched endblock: expected '{name}', found '{}'", end.rest),
                end.line,
            ));
        }
        Ok(Node::Block { name, body, line })
    }

    fn parse_macro(&mut self, rest: &str, line: u32) -> Result<Node, SyntaxError> {
        let Some(caps) = MACRO_SIG.captures(rest) else {
            return Err(SyntaxError::new("malformed macro signature", line));
        };
        let name = caps[1].to_string();
        let params = caps[2].trim().to_string();
        let (body, end) = self.parse_until(&["endmacro"], "endmacro")?;
        Ok(Node::Macro {
            name,
            params,
            body,
            span: Span {
                start_line: line,
                end_line: end.line,
            },
        })
    }
}

fn output_node(raw: &str, line: u32) -> Result<Node, SyntaxError> {
    if raw.is_empty() {
        return Err(SyntaxError::new("empty output expression", line));
    }
    Ok(Node::Output(Expr::parse(raw, line)))
}

fn parse_set(rest: &str, line: u32) -> Result<Node, SyntaxError> {
    let Some((name, value)) = rest.split_once('=') else {
        return Err(SyntaxError::new("malformed set tag, expected 'name = expr'", line));
    };
    let name = name.trim();
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(SyntaxError::new("malformed set tag, expected 'name = expr'", line));
    }
    Ok(Node::Set {
        name: name.to_string(),
        value: Expr::parse(value.trim(), line),
        line,
    })
}

fn split_tag(raw: &str) -> (&str, &str) {
    match raw.split_once(char::is_whitespace) {
        Some((kw, rest)) => (kw, rest.trim()),
        None => (raw, ""),
    }
}

/// Extract a quoted literal target, or `None` when it is dynamic.
fn string_literal(rest: &str) -> Option<String> {
    let t = rest.trim();
    let mut chars = t.chars();
    let quote = chars.next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let inner: String = chars.take_while(|&c| c != quote).collect();
    // require the closing quote to actually be present
    if t[quote.len_utf8()..].contains(quote) && !inner.is_empty() {
        Some(inner)
    } else {
        None
    }
}
