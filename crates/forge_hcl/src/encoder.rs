//! Value encoding: walked fields to unordered fragments.

use std::collections::HashSet;

use crate::error::{FieldPath, HclError, HclResult};
use crate::reference::{classify, is_balanced, Classified};
use crate::syntax::is_identifier;
use crate::value::{EmissionKind, Number, Object, Value};
use crate::walker::{walk, Scope, WalkedField};

/// An encoded expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Unescaped text, written quoted.
    Literal(String),
    /// Expression text, written verbatim.
    Reference(String),
    /// Canonical numeric text.
    Number(String),
    Bool(bool),
    Tuple(Vec<Expr>),
    Object(Vec<(String, Expr)>),
}

impl Expr {
    /// Whether the expression renders on a single line.
    pub fn is_inline(&self) -> bool {
        match self {
            Expr::Tuple(items) => items.iter().all(Expr::is_inline),
            Expr::Object(entries) => entries.is_empty(),
            _ => true,
        }
    }
}

/// A nested block instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockFragment {
    pub labels: Vec<String>,
    pub body: Vec<Fragment>,
}

/// The encoded form of one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Attribute { name: String, expr: Expr },
    /// One or more blocks sharing a type name.
    Blocks { name: String, blocks: Vec<BlockFragment> },
}

impl Fragment {
    pub fn name(&self) -> &str {
        match self {
            Fragment::Attribute { name, .. } | Fragment::Blocks { name, .. } => name,
        }
    }

    pub fn kind(&self) -> EmissionKind {
        match self {
            Fragment::Attribute { .. } => EmissionKind::Attribute,
            Fragment::Blocks { .. } => EmissionKind::Block,
        }
    }
}

/// Encode walked fields into fragments, preserving declaration order.
pub fn encode_body(fields: &[WalkedField<'_>]) -> HclResult<Vec<Fragment>> {
    fields.iter().map(encode_field).collect()
}

/// Encode a single walked field according to its emission kind.
pub fn encode_field(field: &WalkedField<'_>) -> HclResult<Fragment> {
    match field.kind {
        EmissionKind::Attribute => Ok(Fragment::Attribute {
            name: field.name.to_string(),
            expr: encode_expr(field.value, &field.path)?,
        }),
        EmissionKind::Block => Ok(Fragment::Blocks {
            name: field.name.to_string(),
            blocks: encode_blocks(field.value, &field.path)?,
        }),
    }
}

/// Encode a value in expression position.
pub fn encode_expr(value: &Value, path: &FieldPath) -> HclResult<Expr> {
    match value {
        Value::String(s) => match classify(s) {
            Classified::Reference(expr) => reference(expr, path),
            Classified::Literal(text) => Ok(Expr::Literal(text.to_string())),
        },
        Value::Raw(expr) => reference(expr, path),
        Value::Number(n) => encode_number(n, path),
        Value::Bool(b) => Ok(Expr::Bool(*b)),
        Value::List(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| encode_expr(item, &path.index(i)))
            .collect::<HclResult<Vec<_>>>()
            .map(Expr::Tuple),
        Value::Map(entries) => {
            check_unique_keys(entries, path)?;
            entries
                .iter()
                .map(|(key, item)| Ok((key.clone(), encode_expr(item, &path.key(key))?)))
                .collect::<HclResult<Vec<_>>>()
                .map(Expr::Object)
        }
        Value::Object(object) => {
            let fields = walk(object, path, Scope::Nested)?;
            fields
                .iter()
                .map(|f| Ok((f.name.to_string(), encode_expr(f.value, &f.path)?)))
                .collect::<HclResult<Vec<_>>>()
                .map(Expr::Object)
        }
    }
}

fn reference(expr: &str, path: &FieldPath) -> HclResult<Expr> {
    if expr.trim().is_empty() {
        return Err(HclError::shape(path, "expression is empty"));
    }
    if expr.contains('\n') {
        return Err(HclError::shape(path, "expression must fit on one line"));
    }
    if !is_balanced(expr) {
        return Err(HclError::shape(
            path,
            format!("expression '{}' has unbalanced brackets or quotes", expr),
        ));
    }
    Ok(Expr::Reference(expr.to_string()))
}

fn encode_number(n: &Number, path: &FieldPath) -> HclResult<Expr> {
    n.canonical()
        .map(Expr::Number)
        .ok_or_else(|| HclError::shape(path, "number is not finite"))
}

/// Encode a value in block position.
///
/// Objects become one block, lists one block per element, maps one labelled
/// block per key.
pub fn encode_blocks(value: &Value, path: &FieldPath) -> HclResult<Vec<BlockFragment>> {
    match value {
        Value::Object(object) => Ok(vec![BlockFragment {
            labels: Vec::new(),
            body: encode_object_body(object, path)?,
        }]),
        Value::List(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let item_path = path.index(i);
                Ok(BlockFragment {
                    labels: Vec::new(),
                    body: encode_block_body(item, &item_path)?,
                })
            })
            .collect(),
        Value::Map(entries) => {
            check_unique_keys(entries, path)?;
            entries
                .iter()
                .map(|(label, item)| {
                    let item_path = path.key(label);
                    Ok(BlockFragment {
                        labels: vec![label.clone()],
                        body: encode_block_body(item, &item_path)?,
                    })
                })
                .collect()
        }
        other => Err(HclError::shape(
            path,
            format!("a {} cannot be emitted as a block", other.semantic_type()),
        )),
    }
}

fn encode_object_body(object: &Object, path: &FieldPath) -> HclResult<Vec<Fragment>> {
    let fields = walk(object, path, Scope::Nested)?;
    encode_body(&fields)
}

/// Body of one block instance: an object's fields, or a map's entries as
/// attributes.
fn encode_block_body(value: &Value, path: &FieldPath) -> HclResult<Vec<Fragment>> {
    match value {
        Value::Object(object) => encode_object_body(object, path),
        Value::Map(entries) => {
            check_unique_keys(entries, path)?;
            entries
                .iter()
                .map(|(key, item)| {
                    let item_path = path.key(key);
                    if !is_identifier(key) {
                        return Err(HclError::shape(
                            &item_path,
                            "block attribute names must be identifiers",
                        ));
                    }
                    Ok(Fragment::Attribute {
                        name: key.clone(),
                        expr: encode_expr(item, &item_path)?,
                    })
                })
                .collect()
        }
        other => Err(HclError::shape(
            path,
            format!("block body must be an object or map, found a {}", other.semantic_type()),
        )),
    }
}

fn check_unique_keys(entries: &[(String, Value)], path: &FieldPath) -> HclResult<()> {
    let mut seen = HashSet::new();
    for (key, _) in entries {
        if !seen.insert(key.as_str()) {
            return Err(HclError::shape(&path.key(key), "duplicate map key"));
        }
    }
    Ok(())
}
