//! Literal/reference classification for string scalars.

/// Namespaces whose members are written as bare expressions.
pub const REFERENCE_NAMESPACES: &[&str] = &["var.", "module.", "data.", "local.", "resource."];

/// Outcome of classifying a string scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classified<'a> {
    /// Expression text to write unquoted.
    Reference(&'a str),
    /// Text to write as a quoted string.
    Literal(&'a str),
}

impl Classified<'_> {
    pub fn is_reference(&self) -> bool {
        matches!(self, Classified::Reference(_))
    }
}

/// Classify a string scalar.
///
/// Checked in order: a single `${...}` interpolation (delimiters stripped),
/// a known namespace prefix (kept verbatim), otherwise a literal.
pub fn classify(s: &str) -> Classified<'_> {
    if let Some(inner) = unwrap_interpolation(s) {
        return Classified::Reference(inner);
    }
    if REFERENCE_NAMESPACES.iter().any(|ns| s.starts_with(ns)) {
        return Classified::Reference(s);
    }
    Classified::Literal(s)
}

pub fn is_reference(s: &str) -> bool {
    classify(s).is_reference()
}

/// Whether every `{`, `[` and `(` in `expr` is closed in order.
///
/// Bracket characters inside quoted strings are ignored.
pub fn is_balanced(expr: &str) -> bool {
    let mut open = Vec::new();
    let mut chars = expr.chars();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            match c {
                '\\' => {
                    chars.next();
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' | '(' => open.push(c),
            '}' | ']' | ')' => {
                let expected = match c {
                    '}' => '{',
                    ']' => '[',
                    _ => '(',
                };
                if open.pop() != Some(expected) {
                    return false;
                }
            }
            _ => {}
        }
    }
    !in_string && open.is_empty()
}

fn unwrap_interpolation(s: &str) -> Option<&str> {
    let inner = s.strip_prefix("${")?.strip_suffix('}')?;
    // "${a}-${b}" is a template, not one wrapped expression
    if inner.trim().is_empty() || inner.contains("${") {
        return None;
    }
    Some(inner)
}
