//! terraform-aws-modules/lambda/aws

use std::collections::BTreeMap;

use forge_hcl::{Configuration, Object};
use serde::{Deserialize, Serialize};

use crate::error::{ModuleError, ModuleResult};
use crate::module::{check_one_of, check_range, object_map, TerraformModule};
use crate::policy::{statement_map, PolicyStatement};

pub const LAMBDA_SOURCE: &str = "terraform-aws-modules/lambda/aws";
pub const LAMBDA_VERSION: &str = "~> 7.0";
const DEFAULT_LOCAL_NAME: &str = "lambda_function";
const MAX_LAYERS: usize = 5;

/// A Lambda function with its role, package and triggers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LambdaModule {
    pub local_name: Option<String>,
    pub source: String,
    pub version: Option<String>,

    pub create: Option<bool>,
    pub create_function: Option<bool>,
    pub create_package: Option<bool>,
    pub create_role: Option<bool>,
    pub region: Option<String>,
    pub tags: BTreeMap<String, String>,

    pub function_name: Option<String>,
    pub description: Option<String>,
    pub handler: Option<String>,
    pub runtime: Option<String>,
    pub lambda_role: Option<String>,
    pub memory_size: Option<i64>,
    pub timeout: Option<i64>,
    pub ephemeral_storage_size: Option<i64>,
    pub reserved_concurrent_executions: Option<i64>,
    pub publish: Option<bool>,

    pub package_type: Option<String>,
    pub image_uri: Option<String>,
    pub local_existing_package: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_key: Option<String>,
    pub architectures: Vec<String>,
    pub layers: Vec<String>,

    pub environment_variables: BTreeMap<String, String>,
    pub dead_letter_target_arn: Option<String>,
    pub kms_key_arn: Option<String>,

    pub vpc_subnet_ids: Vec<String>,
    pub vpc_security_group_ids: Vec<String>,

    pub tracing_mode: Option<String>,
    pub cloudwatch_logs_retention_in_days: Option<i64>,

    pub create_lambda_function_url: Option<bool>,
    pub authorization_type: Option<String>,
    pub cors: Option<CorsConfig>,

    pub maximum_event_age_in_seconds: Option<i64>,
    pub maximum_retry_attempts: Option<i64>,

    pub attach_policy_statements: Option<bool>,
    pub policy_statements: BTreeMap<String, PolicyStatement>,
    pub attach_cloudwatch_logs_policy: Option<bool>,
    pub attach_dead_letter_policy: Option<bool>,
    pub attach_network_policy: Option<bool>,
    pub attach_tracing_policy: Option<bool>,

    pub event_source_mapping: BTreeMap<String, EventSourceMapping>,
    pub allowed_triggers: BTreeMap<String, AllowedTrigger>,

    pub timeouts: BTreeMap<String, String>,
}

/// Function URL CORS settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub allow_credentials: Option<bool>,
    pub allow_headers: Vec<String>,
    pub allow_methods: Vec<String>,
    pub allow_origins: Vec<String>,
    pub expose_headers: Vec<String>,
    pub max_age: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventSourceMapping {
    pub event_source_arn: String,
    pub batch_size: Option<i64>,
    pub maximum_batching_window_in_seconds: Option<i64>,
    pub starting_position: Option<String>,
    pub enabled: Option<bool>,
}

/// A service allowed to invoke the function.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllowedTrigger {
    pub service: String,
    pub source_arn: Option<String>,
    pub principal: Option<String>,
}

impl LambdaModule {
    pub fn new(function_name: impl Into<String>) -> Self {
        Self {
            source: LAMBDA_SOURCE.to_string(),
            version: Some(LAMBDA_VERSION.to_string()),
            function_name: Some(function_name.into()),
            create: Some(true),
            create_function: Some(true),
            create_package: Some(true),
            create_role: Some(true),
            memory_size: Some(128),
            timeout: Some(3),
            ephemeral_storage_size: Some(512),
            package_type: Some("Zip".to_string()),
            attach_cloudwatch_logs_policy: Some(true),
            timeouts: ["create", "update", "delete"]
                .into_iter()
                .map(|op| (op.to_string(), "10m".to_string()))
                .collect(),
            ..Default::default()
        }
    }

    pub fn with_local_name(mut self, local_name: impl Into<String>) -> Self {
        self.local_name = Some(local_name.into());
        self
    }

    pub fn with_runtime(mut self, runtime: impl Into<String>, handler: impl Into<String>) -> Self {
        self.runtime = Some(runtime.into());
        self.handler = Some(handler.into());
        self
    }

    pub fn with_memory_and_timeout(mut self, memory_mb: i64, timeout_seconds: i64) -> Self {
        self.memory_size = Some(memory_mb);
        self.timeout = Some(timeout_seconds);
        self
    }

    pub fn with_vpc<S, G>(mut self, subnet_ids: S, security_group_ids: G) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        G: IntoIterator,
        G::Item: Into<String>,
    {
        self.vpc_subnet_ids = subnet_ids.into_iter().map(Into::into).collect();
        self.vpc_security_group_ids = security_group_ids.into_iter().map(Into::into).collect();
        self.attach_network_policy = Some(true);
        self
    }

    pub fn with_environment<I, K, V>(mut self, variables: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.environment_variables
            .extend(variables.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn with_tracing(mut self, mode: impl Into<String>) -> Self {
        self.tracing_mode = Some(mode.into());
        self.attach_tracing_policy = Some(true);
        self
    }

    pub fn with_layers<I, S>(mut self, layer_arns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.layers.extend(layer_arns.into_iter().map(Into::into));
        self
    }

    pub fn with_function_url(mut self, authorization_type: impl Into<String>, cors: Option<CorsConfig>) -> Self {
        self.create_lambda_function_url = Some(true);
        self.authorization_type = Some(authorization_type.into());
        self.cors = cors;
        self
    }

    pub fn with_dead_letter_queue(mut self, target_arn: impl Into<String>) -> Self {
        self.dead_letter_target_arn = Some(target_arn.into());
        self.attach_dead_letter_policy = Some(true);
        self
    }

    pub fn with_event_source_mapping(mut self, name: impl Into<String>, mapping: EventSourceMapping) -> Self {
        self.event_source_mapping.insert(name.into(), mapping);
        self
    }

    pub fn with_allowed_trigger(mut self, name: impl Into<String>, trigger: AllowedTrigger) -> Self {
        self.allowed_triggers.insert(name.into(), trigger);
        self
    }

    pub fn with_policy_statement(mut self, key: impl Into<String>, statement: PolicyStatement) -> Self {
        self.policy_statements.insert(key.into(), statement);
        self.attach_policy_statements = Some(true);
        self
    }

    pub fn with_tags<I, K, V>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.tags
            .extend(tags.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }
}

impl Configuration for LambdaModule {
    fn to_object(&self) -> Object {
        Object::builder()
            .attr_opt("create", self.create)
            .attr_opt("create_function", self.create_function)
            .attr_opt("create_package", self.create_package)
            .attr_opt("create_role", self.create_role)
            .attr_opt("region", self.region.as_deref())
            .attr("tags", self.tags.clone())
            .attr_opt("function_name", self.function_name.as_deref())
            .attr_opt("description", self.description.as_deref())
            .attr_opt("handler", self.handler.as_deref())
            .attr_opt("runtime", self.runtime.as_deref())
            .attr_opt("lambda_role", self.lambda_role.as_deref())
            .attr_opt("memory_size", self.memory_size)
            .attr_opt("timeout", self.timeout)
            .attr_opt("ephemeral_storage_size", self.ephemeral_storage_size)
            .attr_opt("reserved_concurrent_executions", self.reserved_concurrent_executions)
            .attr_opt("publish", self.publish)
            .attr_opt("package_type", self.package_type.as_deref())
            .attr_opt("image_uri", self.image_uri.as_deref())
            .attr_opt("local_existing_package", self.local_existing_package.as_deref())
            .attr_opt("s3_bucket", self.s3_bucket.as_deref())
            .attr_opt("s3_key", self.s3_key.as_deref())
            .attr("architectures", self.architectures.clone())
            .attr("layers", self.layers.clone())
            .attr("environment_variables", self.environment_variables.clone())
            .attr_opt("dead_letter_target_arn", self.dead_letter_target_arn.as_deref())
            .attr_opt("kms_key_arn", self.kms_key_arn.as_deref())
            .attr("vpc_subnet_ids", self.vpc_subnet_ids.clone())
            .attr("vpc_security_group_ids", self.vpc_security_group_ids.clone())
            .attr_opt("tracing_mode", self.tracing_mode.as_deref())
            .attr_opt(
                "cloudwatch_logs_retention_in_days",
                self.cloudwatch_logs_retention_in_days,
            )
            .attr_opt("create_lambda_function_url", self.create_lambda_function_url)
            .attr_opt("authorization_type", self.authorization_type.as_deref())
            .attr_opt("cors", self.cors.as_ref().map(CorsConfig::to_object))
            .attr_opt("maximum_event_age_in_seconds", self.maximum_event_age_in_seconds)
            .attr_opt("maximum_retry_attempts", self.maximum_retry_attempts)
            .attr_opt("attach_policy_statements", self.attach_policy_statements)
            .attr("policy_statements", statement_map(&self.policy_statements))
            .attr_opt("attach_cloudwatch_logs_policy", self.attach_cloudwatch_logs_policy)
            .attr_opt("attach_dead_letter_policy", self.attach_dead_letter_policy)
            .attr_opt("attach_network_policy", self.attach_network_policy)
            .attr_opt("attach_tracing_policy", self.attach_tracing_policy)
            .attr("event_source_mapping", object_map(&self.event_source_mapping))
            .attr("allowed_triggers", object_map(&self.allowed_triggers))
            .attr("timeouts", self.timeouts.clone())
            .build()
    }
}

impl Configuration for CorsConfig {
    fn to_object(&self) -> Object {
        Object::builder()
            .attr_opt("allow_credentials", self.allow_credentials)
            .attr("allow_headers", self.allow_headers.clone())
            .attr("allow_methods", self.allow_methods.clone())
            .attr("allow_origins", self.allow_origins.clone())
            .attr("expose_headers", self.expose_headers.clone())
            .attr_opt("max_age", self.max_age)
            .build()
    }
}

impl Configuration for EventSourceMapping {
    fn to_object(&self) -> Object {
        Object::builder()
            .attr("event_source_arn", self.event_source_arn.as_str())
            .attr_opt("batch_size", self.batch_size)
            .attr_opt(
                "maximum_batching_window_in_seconds",
                self.maximum_batching_window_in_seconds,
            )
            .attr_opt("starting_position", self.starting_position.as_deref())
            .attr_opt("enabled", self.enabled)
            .build()
    }
}

impl Configuration for AllowedTrigger {
    fn to_object(&self) -> Object {
        Object::builder()
            .attr("service", self.service.as_str())
            .attr_opt("source_arn", self.source_arn.as_deref())
            .attr_opt("principal", self.principal.as_deref())
            .build()
    }
}

impl TerraformModule for LambdaModule {
    fn local_name(&self) -> &str {
        self.local_name
            .as_deref()
            .or(self.function_name.as_deref())
            .unwrap_or(DEFAULT_LOCAL_NAME)
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    fn validate(&self) -> ModuleResult<()> {
        let module = self.local_name();

        check_range(module, "memory_size", self.memory_size, 128, 10240)?;
        check_range(module, "timeout", self.timeout, 1, 900)?;
        check_range(module, "ephemeral_storage_size", self.ephemeral_storage_size, 512, 10240)?;
        check_range(
            module,
            "maximum_event_age_in_seconds",
            self.maximum_event_age_in_seconds,
            60,
            21600,
        )?;
        check_range(module, "maximum_retry_attempts", self.maximum_retry_attempts, 0, 2)?;

        check_one_of(module, "package_type", self.package_type.as_deref(), &["Zip", "Image"])?;
        check_one_of(
            module,
            "tracing_mode",
            self.tracing_mode.as_deref(),
            &["Active", "PassThrough"],
        )?;
        check_one_of(
            module,
            "authorization_type",
            self.authorization_type.as_deref(),
            &["NONE", "AWS_IAM"],
        )?;
        for arch in &self.architectures {
            check_one_of(module, "architectures", Some(arch.as_str()), &["x86_64", "arm64"])?;
        }

        if self.package_type.as_deref() == Some("Image") && self.image_uri.is_none() {
            return Err(ModuleError::validation(
                module,
                "image_uri is required when package_type is Image",
            ));
        }
        if self.layers.len() > MAX_LAYERS {
            return Err(ModuleError::validation(
                module,
                format!("at most {} layers are allowed, got {}", MAX_LAYERS, self.layers.len()),
            ));
        }
        if self.vpc_subnet_ids.is_empty() != self.vpc_security_group_ids.is_empty() {
            return Err(ModuleError::validation(
                module,
                "vpc_subnet_ids and vpc_security_group_ids must be set together",
            ));
        }

        for (name, mapping) in &self.event_source_mapping {
            if mapping.event_source_arn.is_empty() {
                return Err(ModuleError::validation(
                    module,
                    format!("event source mapping '{}' has no event_source_arn", name),
                ));
            }
        }
        for (name, trigger) in &self.allowed_triggers {
            if trigger.service.is_empty() && trigger.principal.is_none() {
                return Err(ModuleError::validation(
                    module,
                    format!("allowed trigger '{}' needs a service or principal", name),
                ));
            }
        }
        for statement in self.policy_statements.values() {
            statement.validate(module)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_hcl::HclGenerator;

    #[test]
    fn test_defaults() {
        let function = LambdaModule::new("api");
        assert_eq!(function.local_name(), "api");
        assert_eq!(function.source(), LAMBDA_SOURCE);
        assert_eq!(function.version(), Some("~> 7.0"));
        assert_eq!(function.memory_size, Some(128));
        assert_eq!(function.timeout, Some(3));
        assert_eq!(function.package_type.as_deref(), Some("Zip"));
        assert_eq!(function.timeouts.get("delete").map(String::as_str), Some("10m"));
        assert!(function.validate().is_ok());
    }

    #[test]
    fn test_local_name_fallback() {
        let function = LambdaModule {
            function_name: None,
            ..LambdaModule::new("unused")
        };
        assert_eq!(function.local_name(), "lambda_function");
    }

    #[test]
    fn test_builders_attach_policies() {
        let function = LambdaModule::new("worker")
            .with_vpc(["subnet-1"], ["sg-1"])
            .with_tracing("Active")
            .with_dead_letter_queue("${module.dlq.queue_arn}");
        assert_eq!(function.attach_network_policy, Some(true));
        assert_eq!(function.attach_tracing_policy, Some(true));
        assert_eq!(function.attach_dead_letter_policy, Some(true));
        assert!(function.validate().is_ok());
    }

    #[test]
    fn test_render() {
        let function = LambdaModule {
            create: None,
            create_function: None,
            create_package: None,
            create_role: None,
            ephemeral_storage_size: None,
            attach_cloudwatch_logs_policy: None,
            package_type: None,
            ..LambdaModule::new("api")
        }
        .with_runtime("python3.13", "app.handler")
        .with_environment([("TABLE", "${module.table.name}")])
        .with_event_source_mapping(
            "orders",
            EventSourceMapping {
                event_source_arn: "${module.orders.queue_arn}".into(),
                batch_size: Some(10),
                ..Default::default()
            },
        );

        let hcl = function.to_hcl(&HclGenerator::default()).unwrap();
        let expected = r#"module "api" {
  source  = "terraform-aws-modules/lambda/aws"
  version = "~> 7.0"
  environment_variables = {
    TABLE = module.table.name
  }
  event_source_mapping = {
    orders = {
      batch_size       = 10
      event_source_arn = module.orders.queue_arn
    }
  }
  function_name = "api"
  handler       = "app.handler"
  memory_size   = 128
  runtime       = "python3.13"
  timeout       = 3
  timeouts      = {
    create = "10m"
    delete = "10m"
    update = "10m"
  }
}
"#;
        assert_eq!(hcl, expected);
    }

    #[test]
    fn test_range_validation() {
        let err = LambdaModule::new("big")
            .with_memory_and_timeout(20000, 30)
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("memory_size must be between 128 and 10240"));

        assert!(LambdaModule::new("slow").with_memory_and_timeout(256, 901).validate().is_err());
        assert!(LambdaModule::new("edge").with_memory_and_timeout(10240, 900).validate().is_ok());
    }

    #[test]
    fn test_image_requires_uri() {
        let function = LambdaModule {
            package_type: Some("Image".into()),
            ..LambdaModule::new("container")
        };
        assert!(function.validate().unwrap_err().to_string().contains("image_uri"));
    }

    #[test]
    fn test_layer_limit() {
        let function = LambdaModule::new("layered").with_layers((0..6).map(|i| format!("arn:layer:{}", i)));
        assert!(function.validate().unwrap_err().to_string().contains("at most 5 layers"));
    }

    #[test]
    fn test_vpc_requires_both_lists() {
        let function = LambdaModule::new("net").with_vpc(["subnet-1"], Vec::<String>::new());
        assert!(function.validate().is_err());
    }
}
