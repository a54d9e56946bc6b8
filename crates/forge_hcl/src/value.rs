//! Value model for configuration entities.
//!
//! A configuration value is an owned tree: [`Object`]s hold named [`Field`]s,
//! each carrying an optional [`Value`]. Typed module definitions describe
//! themselves through [`Configuration`] using the [`ObjectBuilder`].

use std::collections::{BTreeMap, HashMap};

/// How a field is written inside a block body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EmissionKind {
    /// `name = value`
    Attribute,
    /// `name { ... }`
    Block,
}

/// Broad shape of a value, used for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Scalar,
    List,
    Map,
    NestedObject,
}

impl SemanticType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SemanticType::Scalar => "scalar",
            SemanticType::List => "list",
            SemanticType::Map => "map",
            SemanticType::NestedObject => "object",
        }
    }
}

impl std::fmt::Display for SemanticType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Numeric scalar.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl Number {
    /// Canonical textual form, or `None` for NaN and infinities.
    ///
    /// Whole floats print without a fractional part and `-0.0` prints as `0`.
    pub fn canonical(&self) -> Option<String> {
        match *self {
            Number::Int(i) => Some(i.to_string()),
            Number::UInt(u) => Some(u.to_string()),
            Number::Float(f) if !f.is_finite() => None,
            Number::Float(f) if f == 0.0 => Some("0".to_string()),
            Number::Float(f) => Some(f.to_string()),
        }
    }
}

/// A field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// String scalar; classified as literal or reference at encode time.
    String(String),
    /// Expression text written verbatim, bypassing classification.
    Raw(String),
    Number(Number),
    Bool(bool),
    List(Vec<Value>),
    /// Entries in caller order; keys are sorted on output.
    Map(Vec<(String, Value)>),
    Object(Object),
}

impl Value {
    pub fn raw(expression: impl Into<String>) -> Self {
        Value::Raw(expression.into())
    }

    pub fn map<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn semantic_type(&self) -> SemanticType {
        match self {
            Value::String(_) | Value::Raw(_) | Value::Number(_) | Value::Bool(_) => {
                SemanticType::Scalar
            }
            Value::List(_) => SemanticType::List,
            Value::Map(_) => SemanticType::Map,
            Value::Object(_) => SemanticType::NestedObject,
        }
    }

    /// Zero-length lists and maps count as unset when used as a field value.
    pub fn is_empty_collection(&self) -> bool {
        match self {
            Value::List(items) => items.is_empty(),
            Value::Map(entries) => entries.is_empty(),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::String(s.clone())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(n: $t) -> Self {
                Value::Number(Number::Int(n as i64))
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for Value {
            fn from(n: $t) -> Self {
                Value::Number(Number::UInt(n as u64))
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64);
impl_from_unsigned!(u8, u16, u32, u64, usize);

impl From<f32> for Value {
    fn from(n: f32) -> Self {
        Value::Number(Number::Float(n as f64))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(Number::Float(n))
    }
}

impl From<Number> for Value {
    fn from(n: Number) -> Self {
        Value::Number(n)
    }
}

impl From<Object> for Value {
    fn from(o: Object) -> Self {
        Value::Object(o)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> From<BTreeMap<K, V>> for Value {
    fn from(entries: BTreeMap<K, V>) -> Self {
        Value::map(entries)
    }
}

impl<K: Into<String>, V: Into<Value>> From<HashMap<K, V>> for Value {
    fn from(entries: HashMap<K, V>) -> Self {
        Value::map(entries)
    }
}

/// One named member of an [`Object`].
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub kind: EmissionKind,
    /// `None` means unset.
    pub value: Option<Value>,
}

impl Field {
    pub fn attribute(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            kind: EmissionKind::Attribute,
            value: Some(value.into()),
        }
    }

    pub fn block(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            kind: EmissionKind::Block,
            value: Some(value.into()),
        }
    }

    pub fn unset(name: impl Into<String>, kind: EmissionKind) -> Self {
        Self {
            name: name.into(),
            kind,
            value: None,
        }
    }

    /// Whether the field participates in output.
    pub fn is_set(&self) -> bool {
        self.value
            .as_ref()
            .is_some_and(|value| !value.is_empty_collection())
    }
}

/// A record: an ordered list of declared fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Object {
    fields: Vec<Field>,
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> ObjectBuilder {
        ObjectBuilder::default()
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn push(&mut self, field: Field) {
        self.fields.push(field);
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Builder used by typed values to declare their fields.
#[derive(Debug, Default)]
pub struct ObjectBuilder {
    fields: Vec<Field>,
}

impl ObjectBuilder {
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push(Field::attribute(name, value));
        self
    }

    pub fn attr_opt<V: Into<Value>>(mut self, name: impl Into<String>, value: Option<V>) -> Self {
        self.fields.push(Field {
            name: name.into(),
            kind: EmissionKind::Attribute,
            value: value.map(Into::into),
        });
        self
    }

    pub fn block(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push(Field::block(name, value));
        self
    }

    pub fn block_opt<V: Into<Value>>(mut self, name: impl Into<String>, value: Option<V>) -> Self {
        self.fields.push(Field {
            name: name.into(),
            kind: EmissionKind::Block,
            value: value.map(Into::into),
        });
        self
    }

    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn build(self) -> Object {
        Object {
            fields: self.fields,
        }
    }
}

/// A typed value that can be emitted as an HCL body.
pub trait Configuration {
    /// Describe the value's fields.
    fn to_object(&self) -> Object;
}

impl Configuration for Object {
    fn to_object(&self) -> Object {
        self.clone()
    }
}
