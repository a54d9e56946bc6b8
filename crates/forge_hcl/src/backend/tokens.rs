//! Token-sequence backend.
//!
//! Records a flat stream of tokens without any whitespace except explicit
//! newlines; layout is left entirely to [`super::pretty::print`].

use crate::encoder::Expr;
use crate::syntax::{is_identifier, quote};

use super::{pretty, Backend};

/// Token categories understood by the pretty-printer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Attribute name, block type or bare object key.
    Ident,
    /// Quoted string: literal value, block label or quoted key.
    QuotedLit,
    /// Verbatim expression text.
    Expression,
    Number,
    Bool,
    Equal,
    Comma,
    OBrace,
    CBrace,
    OBrack,
    CBrack,
    Newline,
    /// Zero-width marker that ends an alignment run.
    AlignBreak,
}

impl TokenKind {
    pub fn opens(&self) -> bool {
        matches!(self, TokenKind::OBrace | TokenKind::OBrack)
    }

    pub fn closes(&self) -> bool {
        matches!(self, TokenKind::CBrace | TokenKind::CBrack)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }

    fn punct(kind: TokenKind) -> Self {
        let text = match kind {
            TokenKind::Equal => "=",
            TokenKind::Comma => ",",
            TokenKind::OBrace => "{",
            TokenKind::CBrace => "}",
            TokenKind::OBrack => "[",
            TokenKind::CBrack => "]",
            TokenKind::Newline => "\n",
            _ => "",
        };
        Self::new(kind, text)
    }
}

/// Builds a token stream, rendered on [`Backend::finish`].
pub struct TokenBackend {
    tokens: Vec<Token>,
    indent_width: usize,
}

impl TokenBackend {
    pub fn new(indent_width: usize) -> Self {
        Self {
            tokens: Vec::new(),
            indent_width,
        }
    }

    /// Tokens recorded so far.
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    fn push(&mut self, kind: TokenKind) {
        self.tokens.push(Token::punct(kind));
    }

    fn push_key(&mut self, key: &str) {
        if is_identifier(key) {
            self.tokens.push(Token::new(TokenKind::Ident, key));
        } else {
            self.tokens.push(Token::new(TokenKind::QuotedLit, quote(key)));
        }
    }

    fn push_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(s) => self.tokens.push(Token::new(TokenKind::QuotedLit, quote(s))),
            Expr::Reference(s) => self.tokens.push(Token::new(TokenKind::Expression, s.as_str())),
            Expr::Number(s) => self.tokens.push(Token::new(TokenKind::Number, s.as_str())),
            Expr::Bool(b) => self.tokens.push(Token::new(TokenKind::Bool, b.to_string())),
            Expr::Tuple(items) if expr.is_inline() => {
                self.push(TokenKind::OBrack);
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        self.push(TokenKind::Comma);
                    }
                    self.push_expr(item);
                }
                self.push(TokenKind::CBrack);
            }
            Expr::Tuple(items) => {
                self.push(TokenKind::OBrack);
                self.push(TokenKind::Newline);
                for item in items {
                    self.push_expr(item);
                    self.push(TokenKind::Comma);
                    self.push(TokenKind::Newline);
                }
                self.push(TokenKind::CBrack);
            }
            Expr::Object(entries) => {
                self.push(TokenKind::OBrace);
                if !entries.is_empty() {
                    self.push(TokenKind::Newline);
                    for (key, value) in entries {
                        self.push_key(key);
                        self.push(TokenKind::Equal);
                        self.push_expr(value);
                        self.push(TokenKind::Newline);
                    }
                }
                self.push(TokenKind::CBrace);
            }
        }
    }
}

impl Backend for TokenBackend {
    fn open_block(&mut self, block_type: &str, labels: &[String]) {
        self.tokens.push(Token::new(TokenKind::Ident, block_type));
        for label in labels {
            self.tokens.push(Token::new(TokenKind::QuotedLit, quote(label)));
        }
        self.push(TokenKind::OBrace);
        self.push(TokenKind::Newline);
    }

    fn append_attribute(&mut self, name: &str, expr: &Expr) {
        self.tokens.push(Token::new(TokenKind::Ident, name));
        self.push(TokenKind::Equal);
        self.push_expr(expr);
        self.push(TokenKind::Newline);
    }

    fn break_alignment(&mut self) {
        self.push(TokenKind::AlignBreak);
    }

    fn close_block(&mut self) {
        self.push(TokenKind::CBrace);
        self.push(TokenKind::Newline);
    }

    fn finish(self: Box<Self>) -> String {
        pretty::print(&self.tokens, self.indent_width)
    }
}
