//! Module generation: walker, encoder, orderer and backend wired together.

use tracing::debug;

use crate::backend::create_backend;
use crate::config::GeneratorConfig;
use crate::encoder::{encode_body, Expr, Fragment};
use crate::error::{FieldPath, HclError, HclResult};
use crate::order::order;
use crate::syntax::is_identifier;
use crate::value::{Configuration, Object, Value};
use crate::walker::{expect_object, walk, Scope};

/// Block type of every generated declaration.
pub const MODULE_BLOCK: &str = "module";

/// The reserved values written in a module's header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleHeader {
    /// Terraform local name (`module "<local_name>"`).
    pub local_name: String,
    pub source: String,
    /// Omitted from output when `None` or empty.
    pub version: Option<String>,
}

impl ModuleHeader {
    pub fn new(local_name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            local_name: local_name.into(),
            source: source.into(),
            version: None,
        }
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    fn version(&self) -> Option<&str> {
        self.version.as_deref().filter(|v| !v.is_empty())
    }
}

/// Renders configuration values as `module` blocks.
///
/// Holds only its configuration; a generator can be shared freely between
/// threads and every call is independent.
#[derive(Debug, Clone, Default)]
pub struct HclGenerator {
    config: GeneratorConfig,
}

impl HclGenerator {
    pub fn new(config: GeneratorConfig) -> HclResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Render a typed configuration value.
    pub fn generate<C: Configuration + ?Sized>(&self, header: &ModuleHeader, value: &C) -> HclResult<String> {
        self.generate_object(header, &value.to_object())
    }

    /// Render an object as the body of a module block.
    pub fn generate_object(&self, header: &ModuleHeader, object: &Object) -> HclResult<String> {
        let body = encode_module_body(header, object)?;
        Ok(self.emit(header, &body))
    }

    /// Render a value that must be an object.
    pub fn generate_value(&self, header: &ModuleHeader, value: &Value) -> HclResult<String> {
        let object = expect_object(value, &FieldPath::root())?;
        self.generate_object(header, object)
    }

    fn emit(&self, header: &ModuleHeader, body: &[Fragment]) -> String {
        let mut backend = create_backend(self.config.backend, self.config.indent_width);

        backend.open_block(MODULE_BLOCK, &[header.local_name.clone()]);
        backend.append_attribute("source", &Expr::Literal(header.source.clone()));
        if let Some(version) = header.version() {
            backend.append_attribute("version", &Expr::Literal(version.to_string()));
        }
        backend.break_alignment();
        for fragment in body {
            backend.append_fragment(fragment);
        }
        backend.close_block();

        backend.finish()
    }
}

/// Walk, encode and order a module body.
///
/// Everything that can fail happens here, before any output is produced.
pub fn encode_module_body(header: &ModuleHeader, object: &Object) -> HclResult<Vec<Fragment>> {
    if !is_identifier(&header.local_name) {
        return Err(HclError::shape(
            &FieldPath::root(),
            format!("module name '{}' is not a valid identifier", header.local_name),
        ));
    }

    let fields = walk(object, &FieldPath::root(), Scope::Root)?;
    debug!(
        "Encoding module {} with {} set fields",
        header.local_name,
        fields.len()
    );
    let fragments = encode_body(&fields)?;
    Ok(order(fragments))
}

/// Render `value` with the default configuration.
pub fn to_hcl<C: Configuration + ?Sized>(
    local_name: &str,
    source: &str,
    version: &str,
    value: &C,
) -> HclResult<String> {
    let header = ModuleHeader::new(local_name, source).with_version(version);
    HclGenerator::default().generate(&header, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendKind;

    fn bucket() -> Object {
        Object::builder()
            .attr("owner", "${data.aws_caller_identity.current.account_id}")
            .attr("name", "my-bucket")
            .build()
    }

    #[test]
    fn test_header_without_version() {
        let header = ModuleHeader::new("bucket", "./modules/s3");
        let hcl = HclGenerator::default().generate(&header, &bucket()).unwrap();
        assert!(hcl.starts_with("module \"bucket\" {\n  source = \"./modules/s3\"\n  name "));
        assert!(!hcl.contains("version"));
    }

    #[test]
    fn test_empty_version_is_omitted() {
        let hcl = to_hcl("bucket", "mod/s3", "", &bucket()).unwrap();
        assert!(!hcl.contains("version"));
    }

    #[test]
    fn test_invalid_module_name() {
        let err = to_hcl("my bucket", "mod/s3", "1.0", &bucket()).unwrap_err();
        assert!(err.is_shape_error());
    }

    #[test]
    fn test_generate_value_requires_object() {
        let header = ModuleHeader::new("bucket", "mod/s3");
        let err = HclGenerator::default()
            .generate_value(&header, &Value::from(vec![1, 2]))
            .unwrap_err();
        assert!(err.to_string().contains("expected an object, found a list"));
    }

    #[test]
    fn test_new_validates_config() {
        assert!(HclGenerator::new(GeneratorConfig::default().with_indent_width(0)).is_err());
        let generator = HclGenerator::new(GeneratorConfig::tokens()).unwrap();
        assert_eq!(generator.config().backend, BackendKind::Tokens);
    }

    #[test]
    fn test_generator_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HclGenerator>();
        assert_send_sync::<Object>();
    }
}
