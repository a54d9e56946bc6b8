//! The module abstraction shared by every catalogue entry.

use std::collections::BTreeMap;
use std::fmt;

use forge_hcl::{Configuration, HclGenerator, ModuleHeader, Object, Value};
use serde::{Deserialize, Serialize};

use crate::error::{ModuleError, ModuleResult};

/// A Terraform module call.
///
/// Implementors describe their body through [`Configuration`]; the header
/// (`source`, `version`) comes from the trait methods.
pub trait TerraformModule: Configuration + Send + Sync {
    /// Terraform local name (`module "<local_name>"`).
    fn local_name(&self) -> &str;

    fn source(&self) -> &str;

    fn version(&self) -> Option<&str>;

    fn header(&self) -> ModuleHeader {
        let header = ModuleHeader::new(self.local_name(), self.source());
        match self.version() {
            Some(version) => header.with_version(version),
            None => header,
        }
    }

    /// Check the configuration against the module's input constraints.
    fn validate(&self) -> ModuleResult<()> {
        Ok(())
    }

    /// Render the module block.
    fn to_hcl(&self, generator: &HclGenerator) -> ModuleResult<String> {
        generator
            .generate(&self.header(), self)
            .map_err(|source| ModuleError::Generation {
                module: self.local_name().to_string(),
                source,
            })
    }

    /// Reference to one of this module's outputs.
    fn output(&self, attribute: &str) -> ModuleOutput {
        ModuleOutput::new(self.local_name(), attribute)
    }
}

/// A reference to a module output, such as `module.orders.queue_arn`.
///
/// Converts into a [`Value`] that renders unquoted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModuleOutput {
    pub module: String,
    pub attribute: String,
}

impl ModuleOutput {
    pub fn new(module: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            attribute: attribute.into(),
        }
    }

    pub fn reference(&self) -> String {
        format!("module.{}.{}", self.module, self.attribute)
    }
}

impl fmt::Display for ModuleOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reference())
    }
}

impl From<ModuleOutput> for Value {
    fn from(output: ModuleOutput) -> Self {
        Value::raw(output.reference())
    }
}

impl From<&ModuleOutput> for Value {
    fn from(output: &ModuleOutput) -> Self {
        Value::raw(output.reference())
    }
}

/// A module with a free-form body, for sources without a typed definition.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseModule {
    local_name: String,
    source: String,
    version: Option<String>,
    body: Object,
}

impl BaseModule {
    pub fn new(local_name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            source: source.into(),
            version: None,
            body: Object::new(),
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    pub fn with_body(mut self, body: Object) -> Self {
        self.body = body;
        self
    }

    pub fn body(&self) -> &Object {
        &self.body
    }
}

impl Configuration for BaseModule {
    fn to_object(&self) -> Object {
        self.body.clone()
    }
}

impl TerraformModule for BaseModule {
    fn local_name(&self) -> &str {
        &self.local_name
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    fn validate(&self) -> ModuleResult<()> {
        if self.source.trim().is_empty() {
            return Err(ModuleError::validation(&self.local_name, "source must not be empty"));
        }
        Ok(())
    }
}

/// Keyed records as a module input map.
pub(crate) fn object_map<C: Configuration>(entries: &BTreeMap<String, C>) -> Value {
    Value::map(
        entries
            .iter()
            .map(|(key, entry)| (key.clone(), entry.to_object())),
    )
}

/// Check that an optional numeric input lies in `min..=max`.
pub(crate) fn check_range(
    module: &str,
    field: &str,
    value: Option<i64>,
    min: i64,
    max: i64,
) -> ModuleResult<()> {
    match value {
        Some(v) if v < min || v > max => Err(ModuleError::validation(
            module,
            format!("{} must be between {} and {}, got {}", field, min, max, v),
        )),
        _ => Ok(()),
    }
}

/// Check that an optional string input is one of `allowed`.
pub(crate) fn check_one_of(
    module: &str,
    field: &str,
    value: Option<&str>,
    allowed: &[&str],
) -> ModuleResult<()> {
    match value {
        Some(v) if !allowed.contains(&v) => Err(ModuleError::validation(
            module,
            format!("{} must be one of {}, got '{}'", field, allowed.join(", "), v),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_output_reference() {
        let output = ModuleOutput::new("orders", "queue_arn");
        assert_eq!(output.to_string(), "module.orders.queue_arn");
        assert_eq!(Value::from(&output), Value::raw("module.orders.queue_arn"));
    }

    #[test]
    fn test_base_module_header() {
        let module = BaseModule::new("vpc", "terraform-aws-modules/vpc/aws").with_version("~> 5.0");
        assert_eq!(
            module.header(),
            ModuleHeader::new("vpc", "terraform-aws-modules/vpc/aws").with_version("~> 5.0")
        );
        assert_eq!(module.output("vpc_id").reference(), "module.vpc.vpc_id");
    }

    #[test]
    fn test_base_module_requires_source() {
        let err = BaseModule::new("vpc", " ").validate().unwrap_err();
        assert_eq!(err.to_string(), "Validation failed for vpc: source must not be empty");
    }

    #[test]
    fn test_generation_error_names_module() {
        let module = BaseModule::new("vpc", "mod/vpc")
            .with_body(Object::builder().block("timeouts", "10m").build());
        let err = module.to_hcl(&HclGenerator::default()).unwrap_err();
        assert!(err.to_string().starts_with("Failed to generate config for vpc: Shape error at timeouts"));
        assert!(err.hcl_error().is_some_and(|e| e.is_shape_error()));
    }

    #[test]
    fn test_check_range() {
        assert!(check_range("q", "delay_seconds", None, 0, 900).is_ok());
        assert!(check_range("q", "delay_seconds", Some(900), 0, 900).is_ok());
        let err = check_range("q", "delay_seconds", Some(901), 0, 900).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed for q: delay_seconds must be between 0 and 900, got 901"
        );
    }

    #[test]
    fn test_check_one_of() {
        assert!(check_one_of("f", "package_type", Some("Zip"), &["Zip", "Image"]).is_ok());
        assert!(check_one_of("f", "package_type", Some("Jar"), &["Zip", "Image"]).is_err());
    }
}
