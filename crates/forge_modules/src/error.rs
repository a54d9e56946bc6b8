//! Error types for module definitions.

use forge_hcl::HclError;
use thiserror::Error;

/// Result type alias for module operations.
pub type ModuleResult<T> = Result<T, ModuleError>;

/// Errors that can occur while validating or rendering modules.
#[derive(Error, Debug)]
pub enum ModuleError {
    #[error("Validation failed for {module}: {message}")]
    Validation { module: String, message: String },

    #[error("Duplicate module name: {0}")]
    DuplicateModule(String),

    #[error("Module {module} depends on unknown module {dependency}")]
    UnknownDependency { module: String, dependency: String },

    #[error("Dependency cycle: {0}")]
    DependencyCycle(String),

    #[error("Failed to generate config for {module}: {source}")]
    Generation {
        module: String,
        #[source]
        source: HclError,
    },
}

impl ModuleError {
    pub fn validation(module: &str, message: impl Into<String>) -> Self {
        ModuleError::Validation {
            module: module.to_string(),
            message: message.into(),
        }
    }

    /// The underlying generation error, if any.
    pub fn hcl_error(&self) -> Option<&HclError> {
        match self {
            ModuleError::Generation { source, .. } => Some(source),
            _ => None,
        }
    }
}
