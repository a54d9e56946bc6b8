//! Lexical helpers shared by the encoder and both backends.

use hcl_edit::parser::parse_body;
use hcl_edit::Ident;

use crate::error::{HclError, HclResult};

/// Check whether `s` can be written as a bare HCL identifier.
pub fn is_identifier(s: &str) -> bool {
    Ident::try_new(s).is_ok()
}

/// Parse rendered output as an HCL body.
pub fn validate_hcl(text: &str) -> HclResult<()> {
    parse_body(text)
        .map(|_| ())
        .map_err(|e| HclError::InvalidOutput(e.to_string()))
}

/// Render `s` as a quoted HCL string literal.
///
/// Template introducers are doubled (`${` becomes `$${`, `%{` becomes `%%{`)
/// so the literal never turns into an interpolation.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '$' | '%' if chars.peek() == Some(&'{') => {
                out.push(c);
                out.push(c);
            }
            c if c.is_control() => out.push_str(&format!("\\u{:04X}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Render an object key: bare when it is an identifier, quoted otherwise.
pub fn object_key(key: &str) -> String {
    if is_identifier(key) {
        key.to_string()
    } else {
        quote(key)
    }
}

/// Column width used when aligning `=` signs.
pub fn display_width(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hcl_edit::expr::Expression;

    #[test]
    fn test_identifiers() {
        assert!(is_identifier("function_name"));
        assert!(is_identifier("_private"));
        assert!(is_identifier("my-module_v2"));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier("kubernetes.io/role"));
        assert!(!is_identifier(""));
        assert!(is_identifier("größe"));
    }

    #[test]
    fn test_quoted_literal_parses_back() {
        let body = parse_body(&format!("a = {}\n", quote("say \"hi\"\tC:\\temp\n"))).unwrap();
        let attribute = body.get_attribute("a").unwrap();
        match &attribute.value {
            Expression::String(s) => assert_eq!(s.as_str(), "say \"hi\"\tC:\\temp\n"),
            other => panic!("expected a string, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_hcl() {
        assert!(validate_hcl("module \"a\" {\n  source = \"mod/a\"\n  arn    = var.a\n}\n").is_ok());

        let err = validate_hcl("module \"a\" {\n  arn = var.a}\n}\n").unwrap_err();
        assert!(matches!(err, HclError::InvalidOutput(_)));
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("plain"), "\"plain\"");
        assert_eq!(quote("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(quote("C:\\temp"), "\"C:\\\\temp\"");
        assert_eq!(quote("a\nb\tc"), "\"a\\nb\\tc\"");
        assert_eq!(quote("\u{1}"), "\"\\u0001\"");
    }

    #[test]
    fn test_quote_neutralizes_templates() {
        assert_eq!(quote("${var.x}"), "\"$${var.x}\"");
        assert_eq!(quote("%{ if x }"), "\"%%{ if x }\"");
        assert_eq!(quote("cost: $5 or 10%"), "\"cost: $5 or 10%\"");
    }

    #[test]
    fn test_object_key() {
        assert_eq!(object_key("Environment"), "Environment");
        assert_eq!(object_key("kubernetes.io/role"), "\"kubernetes.io/role\"");
    }

    #[test]
    fn test_display_width_counts_chars() {
        assert_eq!(display_width("\"é\""), 3);
    }
}
