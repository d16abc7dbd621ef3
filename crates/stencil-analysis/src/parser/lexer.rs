//! Delimiter lexer for the template DSL.
//!
//! Splits source text into `{{ }}` output and `{% %}` tag tokens. Comments
//! (`{# #}`) are validated for closure and dropped; plain text is skipped.

use stencil_core::errors::SyntaxError;

/// A lexical token carrying its raw inner text and starting line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Output { raw: String, line: u32 },
    Tag { raw: String, line: u32 },
}

impl Token {
    pub fn line(&self) -> u32 {
        match self {
            Self::Output { line, .. } | Self::Tag { line, .. } => *line,
        }
    }
}

/// Tokenize template source. Unclosed delimiters are syntax errors.
pub fn lex(src: &str) -> Result<Vec<Token>, SyntaxError> {
    let bytes = src.as_bytes();
    let mut tokens = Vec::new();
    let mut line: u32 = 1;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'{' && i + 1 < bytes.len() {
            let (closer, opener) = match bytes[i + 1] {
                b'{' => ("}}", "{{"),
                b'%' => ("%}", "{%"),
                b'#' => ("#}", "{#"),
                _ => {
                    i += 1;
                    continue;
                }
            };
            let start = i + 2;
            let Some(off) = src[start..].find(closer) else {
                return Err(SyntaxError::new(format!("unclosed '{opener}' delimiter"), line));
            };
            let inner = &src[start..start + off];
            let tok_line = line;
            line += inner.bytes().filter(|&b| b == b'\n').count() as u32;

            match opener {
                "{{" => tokens.push(Token::Output {
                    raw: inner.trim().to_string(),
                    line: tok_line,
                }),
                "{%" => tokens.push(Token::Tag {
                    // strip whitespace-control markers: {%- ... -%}
                    raw: inner.trim_matches('-').trim().to_string(),
                    line: tok_line,
                }),
                _ => {} // comment: validated, dropped
            }
            i = start + off + 2;
        } else {
            if bytes[i] == b'\n' {
                line += 1;
            }
            i += 1;
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outputs_tags_and_lines() {
        let toks = lex("hello\n{{ name }}\n{% if x %}{% endif %}").unwrap();
        assert_eq!(
            toks,
            vec![
                Token::Output { raw: "name".into(), line: 2 },
                Token::Tag { raw: "if x".into(), line: 3 },
                Token::Tag { raw: "endif".into(), line: 3 },
            ]
        );
    }

    #[test]
    fn comments_are_dropped_but_closed() {
        assert!(lex("{# note #}text").unwrap().is_empty());
        let err = lex("{# never closed").unwrap_err();
        assert!(err.message.contains("unclosed"));
        assert_eq!(err.line, 1);
    }

    #[test]
    fn whitespace_control_markers_are_stripped() {
        let toks = lex("{%- for i in xs -%}{%- endfor -%}").unwrap();
        assert_eq!(toks[0], Token::Tag { raw: "for i in xs".into(), line: 1 });
    }

    #[test]
    fn unclosed_output_reports_its_line() {
        let err = lex("a\nb\n{{ oops").unwrap_err();
        assert_eq!(err.line, 3);
    }

    #[test]
    fn lone_brace_is_plain_text() {
        assert!(lex("a { b } c").unwrap().is_empty());
    }
}
