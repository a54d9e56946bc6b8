//! Field enumeration over configuration values.

use std::collections::HashSet;

use tracing::trace;

use crate::error::{FieldPath, HclError, HclResult};
use crate::syntax::is_identifier;
use crate::value::{EmissionKind, Object, SemanticType, Value};

/// Output names carried by the module header rather than the body.
pub const RESERVED_HEADER_FIELDS: &[&str] = &["source", "version"];

/// Where an object sits in the configuration graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// The module body itself; reserved header fields are dropped.
    Root,
    Nested,
}

/// A set field, ready for encoding.
#[derive(Debug, Clone)]
pub struct WalkedField<'a> {
    pub name: &'a str,
    pub kind: EmissionKind,
    pub semantic_type: SemanticType,
    pub value: &'a Value,
    pub path: FieldPath,
}

/// Require `value` to be record-shaped.
pub fn expect_object<'a>(value: &'a Value, path: &FieldPath) -> HclResult<&'a Object> {
    match value {
        Value::Object(object) => Ok(object),
        other => Err(HclError::shape(
            path,
            format!("expected an object, found a {}", other.semantic_type()),
        )),
    }
}

/// Enumerate the emittable fields of `object` in declaration order.
///
/// Unset fields (absent, or zero-length list/map) are skipped. Field names
/// must be identifiers and unique within the object.
pub fn walk<'a>(object: &'a Object, path: &FieldPath, scope: Scope) -> HclResult<Vec<WalkedField<'a>>> {
    let mut seen = HashSet::new();
    let mut walked = Vec::with_capacity(object.len());

    for field in object.fields() {
        let field_path = path.field(&field.name);

        if !is_identifier(&field.name) {
            return Err(HclError::shape(
                &field_path,
                format!("'{}' is not a valid output name", field.name),
            ));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(HclError::shape(&field_path, "field declared more than once"));
        }
        if scope == Scope::Root && RESERVED_HEADER_FIELDS.contains(&field.name.as_str()) {
            trace!("Skipping reserved header field {}", field_path);
            continue;
        }

        let Some(value) = field.value.as_ref() else {
            continue;
        };
        if value.is_empty_collection() {
            continue;
        }

        walked.push(WalkedField {
            name: &field.name,
            kind: field.kind,
            semantic_type: value.semantic_type(),
            value,
            path: field_path,
        });
    }

    Ok(walked)
}

/// Walk the module body held in `value`.
pub fn walk_root(value: &Value) -> HclResult<Vec<WalkedField<'_>>> {
    let root = FieldPath::root();
    let object = expect_object(value, &root)?;
    walk(object, &root, Scope::Root)
}
