//! Error types for HCL generation.

use std::fmt;

use thiserror::Error;

/// Result type alias for HCL operations.
pub type HclResult<T> = Result<T, HclError>;

/// Errors that can occur while generating HCL.
#[derive(Error, Debug)]
pub enum HclError {
    /// The input violates the structural contract of the encoder.
    #[error("Shape error at {path}: {message}")]
    Shape { path: FieldPath, message: String },

    #[error("Generated HCL does not parse: {0}")]
    InvalidOutput(String),

    #[error("Invalid generator configuration: {0}")]
    InvalidConfig(String),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl HclError {
    pub fn shape(path: &FieldPath, message: impl Into<String>) -> Self {
        HclError::Shape {
            path: path.clone(),
            message: message.into(),
        }
    }

    /// Whether this error is a structural defect in the input.
    pub fn is_shape_error(&self) -> bool {
        matches!(self, HclError::Shape { .. })
    }
}

/// One step in a [`FieldPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Field(String),
    Index(usize),
    Key(String),
}

/// Location of a value inside a configuration graph.
///
/// Rendered as `statements[0].principals` or `tags["Name"]`; the empty path
/// renders as `<root>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath {
    segments: Vec<PathSegment>,
}

impl FieldPath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn field(&self, name: &str) -> Self {
        self.with(PathSegment::Field(name.to_string()))
    }

    pub fn index(&self, index: usize) -> Self {
        self.with(PathSegment::Index(index))
    }

    pub fn key(&self, key: &str) -> Self {
        self.with(PathSegment::Key(key.to_string()))
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    fn with(&self, segment: PathSegment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return write!(f, "<root>");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => write!(f, "{}", name)?,
                PathSegment::Field(name) => write!(f, ".{}", name)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
                PathSegment::Key(key) => write!(f, "[{:?}]", key)?,
            }
        }
        Ok(())
    }
}
