//! Declarative module documents.
//!
//! A document describes one module or a stack of modules in YAML (JSON is
//! accepted as well, being valid YAML):
//!
//! ```yaml
//! name: bucket
//! source: terraform-aws-modules/s3-bucket/aws
//! version: "~> 4.0"
//! attributes:
//!   bucket: my-bucket
//!   tags: { Team: data }
//! blocks:
//!   versioning:
//!     attributes: { enabled: true }
//! ```
//!
//! A stack wraps several of these in a `modules` list; each may name the
//! modules it follows in `depends_on`.
//!
//! A `blocks` entry is either one body (`attributes`/`blocks`), a list of
//! bodies for repeated blocks, or a mapping from label to body.

use serde::{Deserialize, Serialize};
use serde_yaml::Mapping;
use tracing::debug;

use crate::convert::{value_from_yaml, yaml_key};
use crate::error::{FieldPath, HclError, HclResult};
use crate::generator::ModuleHeader;
use crate::value::{EmissionKind, Field, Object, Value};

const BODY_KEYS: &[&str] = &["attributes", "blocks"];

/// One module declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleDocument {
    pub name: String,
    pub source: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub attributes: Mapping,
    #[serde(default)]
    pub blocks: Mapping,
    /// Local names of modules this one must follow.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
}

impl ModuleDocument {
    pub fn header(&self) -> ModuleHeader {
        let header = ModuleHeader::new(&self.name, &self.source);
        match &self.version {
            Some(version) => header.with_version(version),
            None => header,
        }
    }

    /// Convert the document body into an object.
    pub fn to_object(&self) -> HclResult<Object> {
        body_object(&self.attributes, &self.blocks, &FieldPath::root())
    }
}

/// Parse a module or stack document into its module declarations.
pub fn parse_documents(content: &str) -> HclResult<Vec<ModuleDocument>> {
    let mut document: serde_yaml::Value = serde_yaml::from_str(content)?;
    let modules = match document.get_mut("modules") {
        Some(modules) => serde_yaml::from_value(std::mem::take(modules))?,
        None => vec![serde_yaml::from_value(document)?],
    };
    debug!("Parsed {} module document(s)", modules.len());
    Ok(modules)
}

/// Parse a single-module JSON document.
pub fn parse_json_document(content: &str) -> HclResult<ModuleDocument> {
    Ok(serde_json::from_str(content)?)
}

fn body_object(attributes: &Mapping, blocks: &Mapping, path: &FieldPath) -> HclResult<Object> {
    let mut object = Object::new();

    for (key, value) in attributes {
        let name = yaml_key(key, path)?;
        let field_path = path.field(&name);
        object.push(Field {
            name,
            kind: EmissionKind::Attribute,
            value: value_from_yaml(value, &field_path)?,
        });
    }

    for (key, value) in blocks {
        let name = yaml_key(key, path)?;
        let field_path = path.field(&name);
        object.push(Field {
            name,
            kind: EmissionKind::Block,
            value: block_value(value, &field_path)?,
        });
    }

    Ok(object)
}

fn block_value(value: &serde_yaml::Value, path: &FieldPath) -> HclResult<Option<Value>> {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => Ok(None),
        Yaml::Mapping(mapping) if is_body(mapping) => Ok(Some(Value::Object(body(mapping, path)?))),
        Yaml::Sequence(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let item_path = path.index(i);
                match item {
                    Yaml::Mapping(mapping) if is_body(mapping) => {
                        Ok(Value::Object(body(mapping, &item_path)?))
                    }
                    _ => Err(HclError::shape(&item_path, "repeated block entries must be bodies")),
                }
            })
            .collect::<HclResult<Vec<_>>>()
            .map(|list| Some(Value::List(list))),
        Yaml::Mapping(mapping) => {
            let mut labelled = Vec::with_capacity(mapping.len());
            for (key, item) in mapping {
                let label = yaml_key(key, path)?;
                let item_path = path.key(&label);
                match item {
                    Yaml::Mapping(inner) if is_body(inner) => {
                        labelled.push((label, Value::Object(body(inner, &item_path)?)));
                    }
                    _ => return Err(HclError::shape(&item_path, "labelled blocks must be bodies")),
                }
            }
            Ok(Some(Value::Map(labelled)))
        }
        _ => Err(HclError::shape(
            path,
            "a block must be a body, a list of bodies or a mapping of labels to bodies",
        )),
    }
}

fn is_body(mapping: &Mapping) -> bool {
    mapping
        .keys()
        .all(|key| key.as_str().is_some_and(|k| BODY_KEYS.contains(&k)))
}

fn body(mapping: &Mapping, path: &FieldPath) -> HclResult<Object> {
    let section = |name: &str| -> HclResult<Mapping> {
        match mapping.get(name) {
            None | Some(serde_yaml::Value::Null) => Ok(Mapping::new()),
            Some(serde_yaml::Value::Mapping(inner)) => Ok(inner.clone()),
            Some(_) => Err(HclError::shape(
                &path.field(name),
                format!("'{}' must be a mapping", name),
            )),
        }
    };
    body_object(&section("attributes")?, &section("blocks")?, path)
}
