//! Conversion from parsed YAML and JSON data into [`Value`] trees.
//!
//! `null` converts to `None` (an unset field). Mapping keys must be strings,
//! and sequences may not contain `null`, since neither has an HCL form.

use crate::error::{FieldPath, HclError, HclResult};
use crate::value::{Number, Value};

/// Convert a YAML value found at `path`.
pub fn value_from_yaml(value: &serde_yaml::Value, path: &FieldPath) -> HclResult<Option<Value>> {
    use serde_yaml::Value as Yaml;

    let converted = match value {
        Yaml::Null => return Ok(None),
        Yaml::Bool(b) => Value::Bool(*b),
        Yaml::Number(n) => Value::Number(yaml_number(n, path)?),
        Yaml::String(s) => Value::String(s.clone()),
        Yaml::Sequence(items) => {
            let mut list = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let item_path = path.index(i);
                list.push(required(value_from_yaml(item, &item_path)?, &item_path)?);
            }
            Value::List(list)
        }
        Yaml::Mapping(mapping) => {
            let mut entries = Vec::with_capacity(mapping.len());
            for (key, item) in mapping {
                let key = yaml_key(key, path)?;
                let item_path = path.key(&key);
                if let Some(item) = value_from_yaml(item, &item_path)? {
                    entries.push((key, item));
                }
            }
            Value::Map(entries)
        }
        Yaml::Tagged(tagged) => {
            return Err(HclError::shape(
                path,
                format!("tagged value '{}' is not supported", tagged.tag),
            ))
        }
    };
    Ok(Some(converted))
}

/// Convert a JSON value found at `path`.
pub fn value_from_json(value: &serde_json::Value, path: &FieldPath) -> HclResult<Option<Value>> {
    use serde_json::Value as Json;

    let converted = match value {
        Json::Null => return Ok(None),
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => Value::Number(json_number(n, path)?),
        Json::String(s) => Value::String(s.clone()),
        Json::Array(items) => {
            let mut list = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let item_path = path.index(i);
                list.push(required(value_from_json(item, &item_path)?, &item_path)?);
            }
            Value::List(list)
        }
        Json::Object(map) => {
            let mut entries = Vec::with_capacity(map.len());
            for (key, item) in map {
                if let Some(item) = value_from_json(item, &path.key(key))? {
                    entries.push((key.clone(), item));
                }
            }
            Value::Map(entries)
        }
    };
    Ok(Some(converted))
}

/// Mapping key as a string; YAML allows any scalar or even collections.
pub(crate) fn yaml_key(key: &serde_yaml::Value, path: &FieldPath) -> HclResult<String> {
    match key {
        serde_yaml::Value::String(s) => Ok(s.clone()),
        other => Err(HclError::shape(
            path,
            format!("mapping keys must be strings, found {:?}", other),
        )),
    }
}

fn required(value: Option<Value>, path: &FieldPath) -> HclResult<Value> {
    value.ok_or_else(|| HclError::shape(path, "null is not allowed inside a list"))
}

fn yaml_number(n: &serde_yaml::Number, path: &FieldPath) -> HclResult<Number> {
    if let Some(i) = n.as_i64() {
        Ok(Number::Int(i))
    } else if let Some(u) = n.as_u64() {
        Ok(Number::UInt(u))
    } else {
        n.as_f64()
            .filter(|f| f.is_finite())
            .map(Number::Float)
            .ok_or_else(|| HclError::shape(path, format!("number {} is not finite", n)))
    }
}

fn json_number(n: &serde_json::Number, path: &FieldPath) -> HclResult<Number> {
    if let Some(i) = n.as_i64() {
        Ok(Number::Int(i))
    } else if let Some(u) = n.as_u64() {
        Ok(Number::UInt(u))
    } else {
        n.as_f64()
            .map(Number::Float)
            .ok_or_else(|| HclError::shape(path, format!("number {} is not representable", n)))
    }
}
