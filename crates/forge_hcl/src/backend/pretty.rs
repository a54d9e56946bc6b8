//! Pretty-printer for token streams.
//!
//! Layout is derived from the tokens alone: indentation follows bracket
//! depth, and `=` signs are aligned across consecutive assignment lines at
//! the same depth unless an [`TokenKind::AlignBreak`] separates them.

use crate::syntax::display_width;

use super::tokens::{Token, TokenKind};

struct Line<'a> {
    tokens: Vec<&'a Token>,
    break_before: bool,
}

impl Line<'_> {
    fn is_assignment(&self) -> bool {
        self.tokens.len() >= 2
            && matches!(self.tokens[0].kind, TokenKind::Ident | TokenKind::QuotedLit)
            && self.tokens[1].kind == TokenKind::Equal
    }
}

/// Lay out `tokens` as text.
pub fn print(tokens: &[Token], indent_width: usize) -> String {
    let lines = split_lines(tokens);
    let indents = line_indents(&lines);
    let widths = key_widths(&lines, &indents);

    let mut out = String::new();
    for (i, line) in lines.iter().enumerate() {
        out.push_str(&" ".repeat(indents[i] * indent_width));
        render_line(&mut out, line, widths[i]);
        out.push('\n');
    }
    out
}

fn split_lines(tokens: &[Token]) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut current = Vec::new();
    let mut current_break = false;
    let mut pending_break = false;

    for token in tokens {
        match token.kind {
            TokenKind::AlignBreak => pending_break = true,
            TokenKind::Newline => {
                lines.push(Line {
                    tokens: std::mem::take(&mut current),
                    break_before: current_break,
                });
                current_break = false;
            }
            _ => {
                if current.is_empty() {
                    current_break = std::mem::take(&mut pending_break);
                }
                current.push(token);
            }
        }
    }
    if !current.is_empty() {
        lines.push(Line {
            tokens: current,
            break_before: current_break,
        });
    }
    lines
}

fn line_indents(lines: &[Line<'_>]) -> Vec<usize> {
    let mut depth = 0usize;
    let mut indents = Vec::with_capacity(lines.len());
    for line in lines {
        let leading_close = line.tokens.first().is_some_and(|t| t.kind.closes());
        indents.push(if leading_close {
            depth.saturating_sub(1)
        } else {
            depth
        });
        for token in &line.tokens {
            if token.kind.opens() {
                depth += 1;
            } else if token.kind.closes() {
                depth = depth.saturating_sub(1);
            }
        }
    }
    indents
}

/// Key column width for every assignment line; zero elsewhere.
fn key_widths(lines: &[Line<'_>], indents: &[usize]) -> Vec<usize> {
    let mut widths = vec![0; lines.len()];
    let mut run: Vec<usize> = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let assignment = line.is_assignment();
        let joins = assignment
            && !line.break_before
            && run.last().is_some_and(|&prev| prev + 1 == i && indents[prev] == indents[i]);
        if !joins {
            close_run(lines, &mut run, &mut widths);
        }
        if assignment {
            run.push(i);
        }
    }
    close_run(lines, &mut run, &mut widths);
    widths
}

fn close_run(lines: &[Line<'_>], run: &mut Vec<usize>, widths: &mut [usize]) {
    let width = run
        .iter()
        .map(|&i| display_width(&lines[i].tokens[0].text))
        .max()
        .unwrap_or(0);
    for i in run.drain(..) {
        widths[i] = width;
    }
}

fn render_line(out: &mut String, line: &Line<'_>, key_width: usize) {
    let assignment = line.is_assignment();
    for (i, token) in line.tokens.iter().enumerate() {
        if i == 1 && assignment {
            let key = display_width(&line.tokens[0].text);
            out.push_str(&" ".repeat(key_width - key + 1));
        } else if i > 0 && needs_space(line.tokens[i - 1].kind, token.kind) {
            out.push(' ');
        }
        out.push_str(&token.text);
    }
}

fn needs_space(prev: TokenKind, next: TokenKind) -> bool {
    !matches!(
        (prev, next),
        (_, TokenKind::Comma)
            | (TokenKind::OBrack, _)
            | (_, TokenKind::CBrack)
            | (TokenKind::OBrace, TokenKind::CBrace)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(kind: TokenKind, text: &str) -> Token {
        Token::new(kind, text)
    }

    fn nl() -> Token {
        t(TokenKind::Newline, "\n")
    }

    #[test]
    fn test_indentation_follows_depth() {
        let tokens = vec![
            t(TokenKind::Ident, "outer"),
            t(TokenKind::OBrace, "{"),
            nl(),
            t(TokenKind::Ident, "inner"),
            t(TokenKind::OBrace, "{"),
            nl(),
            t(TokenKind::CBrace, "}"),
            nl(),
            t(TokenKind::CBrace, "}"),
            nl(),
        ];
        assert_eq!(print(&tokens, 2), "outer {\n  inner {\n  }\n}\n");
    }

    #[test]
    fn test_alignment_and_break() {
        let tokens = vec![
            t(TokenKind::Ident, "source"),
            t(TokenKind::Equal, "="),
            t(TokenKind::QuotedLit, "\"x\""),
            nl(),
            t(TokenKind::Ident, "version"),
            t(TokenKind::Equal, "="),
            t(TokenKind::QuotedLit, "\"1\""),
            nl(),
            t(TokenKind::AlignBreak, ""),
            t(TokenKind::Ident, "name"),
            t(TokenKind::Equal, "="),
            t(TokenKind::Bool, "true"),
            nl(),
        ];
        assert_eq!(
            print(&tokens, 2),
            "source  = \"x\"\nversion = \"1\"\nname = true\n"
        );
    }

    #[test]
    fn test_inline_spacing() {
        let tokens = vec![
            t(TokenKind::Ident, "ids"),
            t(TokenKind::Equal, "="),
            t(TokenKind::OBrack, "["),
            t(TokenKind::OBrack, "["),
            t(TokenKind::Number, "1"),
            t(TokenKind::Comma, ","),
            t(TokenKind::Number, "2"),
            t(TokenKind::CBrack, "]"),
            t(TokenKind::Comma, ","),
            t(TokenKind::OBrace, "{"),
            t(TokenKind::CBrace, "}"),
            t(TokenKind::CBrack, "]"),
            nl(),
        ];
        assert_eq!(print(&tokens, 2), "ids = [[1, 2], {}]\n");
    }
}
