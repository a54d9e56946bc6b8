//! terraform-aws-modules/sqs/aws

use std::collections::BTreeMap;

use forge_hcl::{Configuration, Object};
use serde::{Deserialize, Serialize};

use crate::error::{ModuleError, ModuleResult};
use crate::module::{check_one_of, check_range, TerraformModule};
use crate::policy::{statement_map, PolicyStatement};

pub const SQS_SOURCE: &str = "terraform-aws-modules/sqs/aws";
pub const SQS_VERSION: &str = "~> 4.0";
const DEFAULT_LOCAL_NAME: &str = "sqs_queue";

/// An SQS queue with an optional dead letter queue.
///
/// [`SqsModule::new`] enables SSE, a DLQ and a redrive allow policy, with a
/// 30 second visibility timeout and four days of retention.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SqsModule {
    pub local_name: Option<String>,
    pub source: String,
    pub version: Option<String>,

    pub create: Option<bool>,
    pub name: Option<String>,
    pub use_name_prefix: Option<bool>,
    pub region: Option<String>,
    pub tags: BTreeMap<String, String>,

    pub fifo_queue: Option<bool>,
    pub content_based_deduplication: Option<bool>,
    pub deduplication_scope: Option<String>,
    pub fifo_throughput_limit: Option<String>,
    pub delay_seconds: Option<i64>,
    pub max_message_size: Option<i64>,
    pub message_retention_seconds: Option<i64>,
    pub receive_wait_time_seconds: Option<i64>,
    pub visibility_timeout_seconds: Option<i64>,

    pub kms_master_key_id: Option<String>,
    pub kms_data_key_reuse_period_seconds: Option<i64>,
    pub sqs_managed_sse_enabled: Option<bool>,

    pub create_queue_policy: Option<bool>,
    pub queue_policy_statements: BTreeMap<String, PolicyStatement>,

    pub create_dlq: Option<bool>,
    pub dlq_name: Option<String>,
    pub dlq_delay_seconds: Option<i64>,
    pub dlq_message_retention_seconds: Option<i64>,
    pub dlq_receive_wait_time_seconds: Option<i64>,
    pub dlq_visibility_timeout_seconds: Option<i64>,
    pub dlq_kms_master_key_id: Option<String>,
    pub dlq_sqs_managed_sse_enabled: Option<bool>,
    pub create_dlq_redrive_allow_policy: Option<bool>,
    pub dlq_tags: BTreeMap<String, String>,
}

impl SqsModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            source: SQS_SOURCE.to_string(),
            version: Some(SQS_VERSION.to_string()),
            name: Some(name.into()),
            visibility_timeout_seconds: Some(30),
            message_retention_seconds: Some(345_600),
            sqs_managed_sse_enabled: Some(true),
            create_dlq: Some(true),
            dlq_message_retention_seconds: Some(1_209_600),
            dlq_sqs_managed_sse_enabled: Some(true),
            create_dlq_redrive_allow_policy: Some(true),
            ..Default::default()
        }
    }

    pub fn with_local_name(mut self, local_name: impl Into<String>) -> Self {
        self.local_name = Some(local_name.into());
        self
    }

    pub fn with_fifo(mut self, content_based_deduplication: bool) -> Self {
        self.fifo_queue = Some(true);
        self.content_based_deduplication = Some(content_based_deduplication);
        self
    }

    /// Encrypt both queues with a KMS key instead of SQS-managed keys.
    pub fn with_encryption(mut self, kms_key_id: impl Into<String>) -> Self {
        let key = kms_key_id.into();
        self.kms_master_key_id = Some(key.clone());
        self.dlq_kms_master_key_id = Some(key);
        self.sqs_managed_sse_enabled = None;
        self.dlq_sqs_managed_sse_enabled = None;
        self
    }

    pub fn without_dlq(mut self) -> Self {
        self.create_dlq = Some(false);
        self.create_dlq_redrive_allow_policy = None;
        self
    }

    pub fn with_delay_seconds(mut self, seconds: i64) -> Self {
        self.delay_seconds = Some(seconds);
        self
    }

    pub fn with_visibility_timeout(mut self, seconds: i64) -> Self {
        self.visibility_timeout_seconds = Some(seconds);
        self
    }

    pub fn with_retention(mut self, seconds: i64) -> Self {
        self.message_retention_seconds = Some(seconds);
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

    /// Add a queue policy statement and enable the queue policy.
    pub fn with_policy_statement(mut self, key: impl Into<String>, statement: PolicyStatement) -> Self {
        self.create_queue_policy = Some(true);
        self.queue_policy_statements.insert(key.into(), statement);
        self
    }
}

impl Configuration for SqsModule {
    fn to_object(&self) -> Object {
        Object::builder()
            .attr_opt("create", self.create)
            .attr_opt("name", self.name.as_deref())
            .attr_opt("use_name_prefix", self.use_name_prefix)
            .attr_opt("region", self.region.as_deref())
            .attr("tags", self.tags.clone())
            .attr_opt("fifo_queue", self.fifo_queue)
            .attr_opt("content_based_deduplication", self.content_based_deduplication)
            .attr_opt("deduplication_scope", self.deduplication_scope.as_deref())
            .attr_opt("fifo_throughput_limit", self.fifo_throughput_limit.as_deref())
            .attr_opt("delay_seconds", self.delay_seconds)
            .attr_opt("max_message_size", self.max_message_size)
            .attr_opt("message_retention_seconds", self.message_retention_seconds)
            .attr_opt("receive_wait_time_seconds", self.receive_wait_time_seconds)
            .attr_opt("visibility_timeout_seconds", self.visibility_timeout_seconds)
            .attr_opt("kms_master_key_id", self.kms_master_key_id.as_deref())
            .attr_opt(
                "kms_data_key_reuse_period_seconds",
                self.kms_data_key_reuse_period_seconds,
            )
            .attr_opt("sqs_managed_sse_enabled", self.sqs_managed_sse_enabled)
            .attr_opt("create_queue_policy", self.create_queue_policy)
            .attr("queue_policy_statements", statement_map(&self.queue_policy_statements))
            .attr_opt("create_dlq", self.create_dlq)
            .attr_opt("dlq_name", self.dlq_name.as_deref())
            .attr_opt("dlq_delay_seconds", self.dlq_delay_seconds)
            .attr_opt("dlq_message_retention_seconds", self.dlq_message_retention_seconds)
            .attr_opt("dlq_receive_wait_time_seconds", self.dlq_receive_wait_time_seconds)
            .attr_opt("dlq_visibility_timeout_seconds", self.dlq_visibility_timeout_seconds)
            .attr_opt("dlq_kms_master_key_id", self.dlq_kms_master_key_id.as_deref())
            .attr_opt("dlq_sqs_managed_sse_enabled", self.dlq_sqs_managed_sse_enabled)
            .attr_opt("create_dlq_redrive_allow_policy", self.create_dlq_redrive_allow_policy)
            .attr("dlq_tags", self.dlq_tags.clone())
            .build()
    }
}

impl TerraformModule for SqsModule {
    fn local_name(&self) -> &str {
        self.local_name
            .as_deref()
            .or(self.name.as_deref())
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

        check_range(module, "delay_seconds", self.delay_seconds, 0, 900)?;
        check_range(module, "max_message_size", self.max_message_size, 1024, 1_048_576)?;
        check_range(module, "message_retention_seconds", self.message_retention_seconds, 60, 1_209_600)?;
        check_range(module, "receive_wait_time_seconds", self.receive_wait_time_seconds, 0, 20)?;
        check_range(module, "visibility_timeout_seconds", self.visibility_timeout_seconds, 0, 43_200)?;
        check_range(
            module,
            "kms_data_key_reuse_period_seconds",
            self.kms_data_key_reuse_period_seconds,
            60,
            86_400,
        )?;
        check_range(module, "dlq_delay_seconds", self.dlq_delay_seconds, 0, 900)?;
        check_range(
            module,
            "dlq_message_retention_seconds",
            self.dlq_message_retention_seconds,
            60,
            1_209_600,
        )?;
        check_range(module, "dlq_receive_wait_time_seconds", self.dlq_receive_wait_time_seconds, 0, 20)?;
        check_range(
            module,
            "dlq_visibility_timeout_seconds",
            self.dlq_visibility_timeout_seconds,
            0,
            43_200,
        )?;

        check_one_of(
            module,
            "deduplication_scope",
            self.deduplication_scope.as_deref(),
            &["messageGroup", "queue"],
        )?;
        check_one_of(
            module,
            "fifo_throughput_limit",
            self.fifo_throughput_limit.as_deref(),
            &["perQueue", "perMessageGroupId"],
        )?;

        let fifo = self.fifo_queue == Some(true);
        if !fifo
            && (self.content_based_deduplication == Some(true)
                || self.deduplication_scope.is_some()
                || self.fifo_throughput_limit.is_some())
        {
            return Err(ModuleError::validation(
                module,
                "FIFO settings require fifo_queue = true",
            ));
        }

        for statement in self.queue_policy_statements.values() {
            statement.validate(module)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_hcl::{HclGenerator, Value};

    #[test]
    fn test_defaults() {
        let queue = SqsModule::new("orders");
        assert_eq!(queue.local_name(), "orders");
        assert_eq!(queue.source(), SQS_SOURCE);
        assert_eq!(queue.version(), Some("~> 4.0"));
        assert_eq!(queue.visibility_timeout_seconds, Some(30));
        assert_eq!(queue.message_retention_seconds, Some(345_600));
        assert_eq!(queue.dlq_message_retention_seconds, Some(1_209_600));
        assert_eq!(queue.create_dlq, Some(true));
        assert!(queue.validate().is_ok());
    }

    #[test]
    fn test_local_name_fallbacks() {
        assert_eq!(SqsModule::default().local_name(), "sqs_queue");
        assert_eq!(
            SqsModule::new("orders.fifo").with_local_name("orders").local_name(),
            "orders"
        );
    }

    #[test]
    fn test_render() {
        let queue = SqsModule::new("orders")
            .without_dlq()
            .with_tags([("Team", "payments")]);
        let hcl = queue.to_hcl(&HclGenerator::default()).unwrap();

        let expected = r#"module "orders" {
  source  = "terraform-aws-modules/sqs/aws"
  version = "~> 4.0"
  create_dlq                    = false
  dlq_message_retention_seconds = 1209600
  dlq_sqs_managed_sse_enabled   = true
  message_retention_seconds     = 345600
  name                          = "orders"
  sqs_managed_sse_enabled       = true
  tags                          = {
    Team = "payments"
  }
  visibility_timeout_seconds = 30
}
"#;
        assert_eq!(hcl, expected);
    }

    #[test]
    fn test_fifo_with_encryption() {
        let queue = SqsModule::new("events")
            .with_fifo(true)
            .with_encryption("alias/sqs");
        let object = queue.to_object();
        assert_eq!(object.get("fifo_queue").unwrap().value, Some(Value::from(true)));
        assert!(!object.get("sqs_managed_sse_enabled").unwrap().is_set());
        assert_eq!(
            object.get("dlq_kms_master_key_id").unwrap().value,
            Some(Value::from("alias/sqs"))
        );
        assert!(queue.validate().is_ok());
    }

    #[test]
    fn test_range_validation() {
        let err = SqsModule::new("q").with_delay_seconds(901).validate().unwrap_err();
        assert!(err.to_string().contains("delay_seconds must be between 0 and 900"));

        assert!(SqsModule::new("q").with_retention(59).validate().is_err());
        assert!(SqsModule::new("q").with_visibility_timeout(43_201).validate().is_err());

        let queue = SqsModule {
            max_message_size: Some(512),
            ..SqsModule::new("q")
        };
        assert!(queue.validate().is_err());
    }

    #[test]
    fn test_fifo_settings_require_fifo_queue() {
        let queue = SqsModule {
            content_based_deduplication: Some(true),
            ..SqsModule::new("q")
        };
        assert!(queue.validate().unwrap_err().to_string().contains("fifo_queue"));

        let scope = SqsModule {
            deduplication_scope: Some("global".into()),
            ..SqsModule::new("q").with_fifo(false)
        };
        assert!(scope.validate().is_err());
    }

    #[test]
    fn test_policy_statements_validated() {
        let queue = SqsModule::new("q").with_policy_statement("empty", PolicyStatement::default());
        assert_eq!(queue.create_queue_policy, Some(true));
        assert!(queue.validate().is_err());
    }
}
