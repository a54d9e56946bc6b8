//! Generator configuration.

use serde::{Deserialize, Serialize};

use crate::backend::BackendKind;
use crate::error::{HclError, HclResult};

/// Largest accepted indent width.
pub const MAX_INDENT_WIDTH: usize = 8;

/// Settings that affect rendering but never content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Backend used to assemble output.
    pub backend: BackendKind,
    /// Spaces per nesting level.
    pub indent_width: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Text,
            indent_width: 2,
        }
    }
}

impl GeneratorConfig {
    pub fn text() -> Self {
        Self::default()
    }

    pub fn tokens() -> Self {
        Self::default().with_backend(BackendKind::Tokens)
    }

    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_indent_width(mut self, width: usize) -> Self {
        self.indent_width = width;
        self
    }

    /// Parse and validate a YAML configuration document.
    pub fn from_yaml_str(content: &str) -> HclResult<Self> {
        let config: GeneratorConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> HclResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> HclResult<()> {
        if self.indent_width == 0 || self.indent_width > MAX_INDENT_WIDTH {
            return Err(HclError::InvalidConfig(format!(
                "indent_width must be between 1 and {}, got {}",
                MAX_INDENT_WIDTH, self.indent_width
            )));
        }
        Ok(())
    }
}
