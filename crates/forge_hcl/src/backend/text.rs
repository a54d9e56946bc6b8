//! Direct text backend with indentation tracking.

use crate::encoder::Expr;
use crate::syntax::{display_width, object_key, quote};

use super::Backend;

/// Writes lines straight into a string buffer.
///
/// Attributes are held in `pending` until their alignment run ends, then
/// written with their `=` signs lined up.
pub struct TextBackend {
    out: String,
    indent_width: usize,
    depth: usize,
    pending: Vec<(String, String)>,
}

impl TextBackend {
    pub fn new(indent_width: usize) -> Self {
        Self {
            out: String::new(),
            indent_width,
            depth: 0,
            pending: Vec::new(),
        }
    }

    fn indent(&self, depth: usize) -> String {
        " ".repeat(depth * self.indent_width)
    }

    fn flush(&mut self) {
        let pending = std::mem::take(&mut self.pending);
        let indent = self.indent(self.depth);
        write_run(&mut self.out, &indent, &pending);
    }

    fn render_expr(&self, expr: &Expr, depth: usize) -> String {
        match expr {
            Expr::Literal(s) => quote(s),
            Expr::Reference(s) | Expr::Number(s) => s.clone(),
            Expr::Bool(b) => b.to_string(),
            Expr::Tuple(items) if items.is_empty() => "[]".to_string(),
            Expr::Tuple(items) if expr.is_inline() => {
                let rendered: Vec<String> =
                    items.iter().map(|item| self.render_expr(item, depth)).collect();
                format!("[{}]", rendered.join(", "))
            }
            Expr::Tuple(items) => {
                let inner = self.indent(depth + 1);
                let mut s = String::from("[\n");
                for item in items {
                    s.push_str(&inner);
                    s.push_str(&self.render_expr(item, depth + 1));
                    s.push_str(",\n");
                }
                s.push_str(&self.indent(depth));
                s.push(']');
                s
            }
            Expr::Object(entries) if entries.is_empty() => "{}".to_string(),
            Expr::Object(entries) => {
                let inner = self.indent(depth + 1);
                let mut s = String::from("{\n");
                let mut run = Vec::new();
                for (key, value) in entries {
                    let rendered = self.render_expr(value, depth + 1);
                    let multiline = rendered.contains('\n');
                    run.push((object_key(key), rendered));
                    if multiline {
                        write_run(&mut s, &inner, &std::mem::take(&mut run));
                    }
                }
                write_run(&mut s, &inner, &run);
                s.push_str(&self.indent(depth));
                s.push('}');
                s
            }
        }
    }
}

/// Write `key = value` lines with aligned `=` signs.
fn write_run(out: &mut String, indent: &str, run: &[(String, String)]) {
    let width = run.iter().map(|(key, _)| display_width(key)).max().unwrap_or(0);
    for (key, value) in run {
        out.push_str(indent);
        out.push_str(key);
        out.push_str(&" ".repeat(width - display_width(key)));
        out.push_str(" = ");
        out.push_str(value);
        out.push('\n');
    }
}

impl Backend for TextBackend {
    fn open_block(&mut self, block_type: &str, labels: &[String]) {
        self.flush();
        let indent = self.indent(self.depth);
        self.out.push_str(&indent);
        self.out.push_str(block_type);
        for label in labels {
            self.out.push(' ');
            self.out.push_str(&quote(label));
        }
        self.out.push_str(" {\n");
        self.depth += 1;
    }

    fn append_attribute(&mut self, name: &str, expr: &Expr) {
        let rendered = self.render_expr(expr, self.depth);
        let multiline = rendered.contains('\n');
        self.pending.push((name.to_string(), rendered));
        if multiline {
            self.flush();
        }
    }

    fn break_alignment(&mut self) {
        self.flush();
    }

    fn close_block(&mut self) {
        self.flush();
        self.depth = self.depth.saturating_sub(1);
        let indent = self.indent(self.depth);
        self.out.push_str(&indent);
        self.out.push_str("}\n");
    }

    fn finish(mut self: Box<Self>) -> String {
        self.flush();
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_run() {
        let mut backend = Box::new(TextBackend::new(2));
        backend.open_block("module", &["queue".to_string()]);
        backend.append_attribute("name", &Expr::Literal("orders".into()));
        backend.append_attribute("delay_seconds", &Expr::Number("0".into()));
        backend.close_block();

        assert_eq!(
            backend.finish(),
            "module \"queue\" {\n  name          = \"orders\"\n  delay_seconds = 0\n}\n"
        );
    }

    #[test]
    fn test_multiline_attribute_ends_run() {
        let mut backend = Box::new(TextBackend::new(2));
        backend.append_attribute("a", &Expr::Bool(true));
        backend.append_attribute(
            "tags",
            &Expr::Object(vec![("Name".into(), Expr::Literal("x".into()))]),
        );
        backend.append_attribute("zz_long", &Expr::Bool(false));

        assert_eq!(
            backend.finish(),
            "a    = true\ntags = {\n  Name = \"x\"\n}\nzz_long = false\n"
        );
    }

    #[test]
    fn test_tuple_of_objects_is_multiline() {
        let mut backend = Box::new(TextBackend::new(2));
        backend.append_attribute(
            "rules",
            &Expr::Tuple(vec![
                Expr::Object(vec![("id".into(), Expr::Literal("expire".into()))]),
                Expr::Object(vec![]),
            ]),
        );

        assert_eq!(
            backend.finish(),
            "rules = [\n  {\n    id = \"expire\"\n  },\n  {},\n]\n"
        );
    }

    #[test]
    fn test_inline_tuple_and_quoted_keys() {
        let mut backend = Box::new(TextBackend::new(4));
        backend.open_block("locals", &[]);
        backend.append_attribute(
            "ids",
            &Expr::Tuple(vec![Expr::Literal("a".into()), Expr::Reference("var.b".into())]),
        );
        backend.append_attribute(
            "labels",
            &Expr::Object(vec![("kubernetes.io/role".into(), Expr::Literal("elb".into()))]),
        );
        backend.close_block();

        assert_eq!(
            backend.finish(),
            "locals {\n    ids    = [\"a\", var.b]\n    labels = {\n        \"kubernetes.io/role\" = \"elb\"\n    }\n}\n"
        );
    }
}
