//! Emission backends.
//!
//! A backend receives ordered fragments and produces the final text. Two
//! implementations exist: [`TextBackend`] writes lines directly, while
//! [`TokenBackend`] records a token stream that [`pretty::print`] lays out.
//! Both share the layout rules and must agree byte for byte.

pub mod pretty;
pub mod text;
pub mod tokens;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::encoder::{Expr, Fragment};

pub use text::TextBackend;
pub use tokens::{Token, TokenBackend, TokenKind};

/// Sink for ordered fragments.
pub trait Backend {
    /// Open `block_type "label" ... {` and indent one level.
    fn open_block(&mut self, block_type: &str, labels: &[String]);

    /// Write `name = expr` at the current level.
    fn append_attribute(&mut self, name: &str, expr: &Expr);

    /// End the current run of `=`-aligned attributes.
    fn break_alignment(&mut self);

    /// Close the innermost open block.
    fn close_block(&mut self);

    /// Consume the backend and return the rendered text.
    fn finish(self: Box<Self>) -> String;

    /// Append one fragment, recursing into nested blocks.
    fn append_fragment(&mut self, fragment: &Fragment) {
        match fragment {
            Fragment::Attribute { name, expr } => self.append_attribute(name, expr),
            Fragment::Blocks { name, blocks } => {
                for block in blocks {
                    self.open_block(name, &block.labels);
                    for inner in &block.body {
                        self.append_fragment(inner);
                    }
                    self.close_block();
                }
            }
        }
    }
}

/// Selects the backend implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Text,
    Tokens,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Text => "text",
            BackendKind::Tokens => "tokens",
        }
    }

    pub fn all() -> Vec<Self> {
        vec![BackendKind::Text, BackendKind::Tokens]
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(BackendKind::Text),
            "tokens" | "token" => Ok(BackendKind::Tokens),
            other => Err(format!("unknown backend '{}', expected 'text' or 'tokens'", other)),
        }
    }
}

/// Create a backend of the given kind.
pub fn create_backend(kind: BackendKind, indent_width: usize) -> Box<dyn Backend> {
    match kind {
        BackendKind::Text => Box::new(TextBackend::new(indent_width)),
        BackendKind::Tokens => Box::new(TokenBackend::new(indent_width)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!("text".parse::<BackendKind>(), Ok(BackendKind::Text));
        assert_eq!("Tokens".parse::<BackendKind>(), Ok(BackendKind::Tokens));
        assert!("hclwrite".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_backend_kind_serde() {
        let kind: BackendKind = serde_yaml::from_str("tokens").unwrap();
        assert_eq!(kind, BackendKind::Tokens);
        assert_eq!(serde_yaml::to_string(&BackendKind::Text).unwrap().trim(), "text");
    }
}
