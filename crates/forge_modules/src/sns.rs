//! terraform-aws-modules/sns/aws

use std::collections::BTreeMap;

use forge_hcl::{Configuration, Object};
use serde::{Deserialize, Serialize};

use crate::error::{ModuleError, ModuleResult};
use crate::module::{check_one_of, check_range, object_map, TerraformModule};
use crate::policy::{statement_map, PolicyStatement};

pub const SNS_SOURCE: &str = "terraform-aws-modules/sns/aws";
pub const SNS_VERSION: &str = "~> 6.0";
const DEFAULT_LOCAL_NAME: &str = "sns_topic";

const PROTOCOLS: &[&str] = &[
    "application",
    "email",
    "email-json",
    "firehose",
    "http",
    "https",
    "lambda",
    "sms",
    "sqs",
];

/// An SNS topic with its policy and subscriptions.
///
/// [`SnsModule::new`] creates the topic, the default topic policy and any
/// declared subscriptions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnsModule {
    pub local_name: Option<String>,
    pub source: String,
    pub version: Option<String>,

    pub create: Option<bool>,
    pub region: Option<String>,
    pub tags: BTreeMap<String, String>,

    pub name: Option<String>,
    pub use_name_prefix: Option<bool>,
    pub display_name: Option<String>,
    pub fifo_topic: Option<bool>,
    pub content_based_deduplication: Option<bool>,
    pub fifo_throughput_scope: Option<String>,
    pub archive_policy: Option<String>,

    pub delivery_policy: Option<String>,
    pub tracing_config: Option<String>,
    pub signature_version: Option<i64>,
    pub kms_master_key_id: Option<String>,

    pub application_feedback: Option<FeedbackConfig>,
    pub firehose_feedback: Option<FeedbackConfig>,
    pub http_feedback: Option<FeedbackConfig>,
    pub lambda_feedback: Option<FeedbackConfig>,
    pub sqs_feedback: Option<FeedbackConfig>,

    pub create_topic_policy: Option<bool>,
    pub topic_policy: Option<String>,
    pub enable_default_topic_policy: Option<bool>,
    pub source_topic_policy_documents: Vec<String>,
    pub override_topic_policy_documents: Vec<String>,
    pub topic_policy_statements: BTreeMap<String, PolicyStatement>,

    pub create_subscription: Option<bool>,
    pub subscriptions: BTreeMap<String, Subscription>,

    pub data_protection_policy: Option<String>,
}

/// Delivery status logging for one protocol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub failure_role_arn: Option<String>,
    pub success_role_arn: Option<String>,
    pub success_sample_rate: Option<i64>,
}

/// One topic subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Subscription {
    pub protocol: String,
    pub endpoint: String,
    pub confirmation_timeout_in_minutes: Option<i64>,
    pub delivery_policy: Option<String>,
    pub endpoint_auto_confirms: Option<bool>,
    pub filter_policy: Option<String>,
    pub filter_policy_scope: Option<String>,
    pub raw_message_delivery: Option<bool>,
    pub redrive_policy: Option<String>,
    pub replay_policy: Option<String>,
    pub subscription_role_arn: Option<String>,
}

impl Subscription {
    pub fn new(protocol: impl Into<String>, endpoint: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            endpoint: endpoint.into(),
            ..Default::default()
        }
    }

    pub fn with_filter_policy(mut self, policy: impl Into<String>, scope: impl Into<String>) -> Self {
        self.filter_policy = Some(policy.into());
        self.filter_policy_scope = Some(scope.into());
        self
    }

    fn validate(&self, module: &str, key: &str) -> ModuleResult<()> {
        if self.endpoint.is_empty() {
            return Err(ModuleError::validation(
                module,
                format!("subscription {} has no endpoint", key),
            ));
        }
        check_one_of(module, "protocol", Some(self.protocol.as_str()), PROTOCOLS)?;
        check_one_of(
            module,
            "filter_policy_scope",
            self.filter_policy_scope.as_deref(),
            &["MessageAttributes", "MessageBody"],
        )?;
        if self.raw_message_delivery == Some(true)
            && !matches!(self.protocol.as_str(), "sqs" | "http" | "https" | "firehose")
        {
            return Err(ModuleError::validation(
                module,
                format!("subscription {} cannot use raw delivery over {}", key, self.protocol),
            ));
        }
        Ok(())
    }
}

impl SnsModule {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            source: SNS_SOURCE.to_string(),
            version: Some(SNS_VERSION.to_string()),
            name: Some(name.into()),
            create: Some(true),
            create_topic_policy: Some(true),
            enable_default_topic_policy: Some(true),
            create_subscription: Some(true),
            ..Default::default()
        }
    }

    pub fn with_local_name(mut self, local_name: impl Into<String>) -> Self {
        self.local_name = Some(local_name.into());
        self
    }

    pub fn with_fifo(mut self, content_based_deduplication: bool) -> Self {
        self.fifo_topic = Some(true);
        self.content_based_deduplication = Some(content_based_deduplication);
        self
    }

    pub fn with_encryption(mut self, kms_key_id: impl Into<String>) -> Self {
        self.kms_master_key_id = Some(kms_key_id.into());
        self
    }

    pub fn with_subscription(mut self, key: impl Into<String>, subscription: Subscription) -> Self {
        self.subscriptions.insert(key.into(), subscription);
        self
    }

    pub fn with_lambda_subscription(self, key: impl Into<String>, function_arn: impl Into<String>) -> Self {
        self.with_subscription(key, Subscription::new("lambda", function_arn))
    }

    pub fn with_sqs_subscription(
        self,
        key: impl Into<String>,
        queue_arn: impl Into<String>,
        raw_message_delivery: bool,
    ) -> Self {
        let subscription = Subscription {
            raw_message_delivery: Some(raw_message_delivery),
            ..Subscription::new("sqs", queue_arn)
        };
        self.with_subscription(key, subscription)
    }

    /// Add a topic policy statement and enable the topic policy.
    pub fn with_policy_statement(mut self, key: impl Into<String>, statement: PolicyStatement) -> Self {
        self.create_topic_policy = Some(true);
        self.topic_policy_statements.insert(key.into(), statement);
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

    fn feedback(&self) -> [(&'static str, Option<&FeedbackConfig>); 5] {
        [
            ("application_feedback", self.application_feedback.as_ref()),
            ("firehose_feedback", self.firehose_feedback.as_ref()),
            ("http_feedback", self.http_feedback.as_ref()),
            ("lambda_feedback", self.lambda_feedback.as_ref()),
            ("sqs_feedback", self.sqs_feedback.as_ref()),
        ]
    }
}

impl Configuration for FeedbackConfig {
    fn to_object(&self) -> Object {
        Object::builder()
            .attr_opt("failure_role_arn", self.failure_role_arn.as_deref())
            .attr_opt("success_role_arn", self.success_role_arn.as_deref())
            .attr_opt("success_sample_rate", self.success_sample_rate)
            .build()
    }
}

impl Configuration for Subscription {
    fn to_object(&self) -> Object {
        Object::builder()
            .attr("protocol", self.protocol.as_str())
            .attr("endpoint", self.endpoint.as_str())
            .attr_opt(
                "confirmation_timeout_in_minutes",
                self.confirmation_timeout_in_minutes,
            )
            .attr_opt("delivery_policy", self.delivery_policy.as_deref())
            .attr_opt("endpoint_auto_confirms", self.endpoint_auto_confirms)
            .attr_opt("filter_policy", self.filter_policy.as_deref())
            .attr_opt("filter_policy_scope", self.filter_policy_scope.as_deref())
            .attr_opt("raw_message_delivery", self.raw_message_delivery)
            .attr_opt("redrive_policy", self.redrive_policy.as_deref())
            .attr_opt("replay_policy", self.replay_policy.as_deref())
            .attr_opt("subscription_role_arn", self.subscription_role_arn.as_deref())
            .build()
    }
}

impl Configuration for SnsModule {
    fn to_object(&self) -> Object {
        let mut builder = Object::builder()
            .attr_opt("create", self.create)
            .attr_opt("region", self.region.as_deref())
            .attr("tags", self.tags.clone())
            .attr_opt("name", self.name.as_deref())
            .attr_opt("use_name_prefix", self.use_name_prefix)
            .attr_opt("display_name", self.display_name.as_deref())
            .attr_opt("fifo_topic", self.fifo_topic)
            .attr_opt("content_based_deduplication", self.content_based_deduplication)
            .attr_opt("fifo_throughput_scope", self.fifo_throughput_scope.as_deref())
            .attr_opt("archive_policy", self.archive_policy.as_deref())
            .attr_opt("delivery_policy", self.delivery_policy.as_deref())
            .attr_opt("tracing_config", self.tracing_config.as_deref())
            .attr_opt("signature_version", self.signature_version)
            .attr_opt("kms_master_key_id", self.kms_master_key_id.as_deref());

        for (name, feedback) in self.feedback() {
            builder = builder.attr_opt(name, feedback.map(Configuration::to_object));
        }

        builder
            .attr_opt("create_topic_policy", self.create_topic_policy)
            .attr_opt("topic_policy", self.topic_policy.as_deref())
            .attr_opt("enable_default_topic_policy", self.enable_default_topic_policy)
            .attr(
                "source_topic_policy_documents",
                self.source_topic_policy_documents.clone(),
            )
            .attr(
                "override_topic_policy_documents",
                self.override_topic_policy_documents.clone(),
            )
            .attr("topic_policy_statements", statement_map(&self.topic_policy_statements))
            .attr_opt("create_subscription", self.create_subscription)
            .attr("subscriptions", object_map(&self.subscriptions))
            .attr_opt("data_protection_policy", self.data_protection_policy.as_deref())
            .build()
    }
}

impl TerraformModule for SnsModule {
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

        check_one_of(
            module,
            "fifo_throughput_scope",
            self.fifo_throughput_scope.as_deref(),
            &["Topic", "MessageGroup"],
        )?;
        check_one_of(
            module,
            "tracing_config",
            self.tracing_config.as_deref(),
            &["PassThrough", "Active"],
        )?;
        check_range(module, "signature_version", self.signature_version, 1, 2)?;

        let fifo = self.fifo_topic == Some(true);
        if !fifo
            && (self.content_based_deduplication == Some(true)
                || self.fifo_throughput_scope.is_some()
                || self.archive_policy.is_some())
        {
            return Err(ModuleError::validation(
                module,
                "FIFO settings require fifo_topic = true",
            ));
        }
        if fifo && self.use_name_prefix != Some(true) {
            if let Some(name) = self.name.as_deref() {
                if !name.ends_with(".fifo") {
                    return Err(ModuleError::validation(
                        module,
                        format!("FIFO topic name '{}' must end with .fifo", name),
                    ));
                }
            }
        }

        for (name, feedback) in self.feedback() {
            if let Some(feedback) = feedback {
                check_range(
                    module,
                    &format!("{}.success_sample_rate", name),
                    feedback.success_sample_rate,
                    0,
                    100,
                )?;
            }
        }
        for (key, subscription) in &self.subscriptions {
            subscription.validate(module, key)?;
        }
        for statement in self.topic_policy_statements.values() {
            statement.validate(module)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_hcl::HclGenerator;
    use pretty_assertions::assert_eq;

    use crate::policy::Principal;

    #[test]
    fn test_defaults() {
        let topic = SnsModule::new("alerts");
        assert_eq!(topic.local_name(), "alerts");
        assert_eq!(topic.version(), Some("~> 6.0"));
        assert_eq!(topic.create_topic_policy, Some(true));
        assert_eq!(topic.enable_default_topic_policy, Some(true));
        assert!(topic.validate().is_ok());
        assert_eq!(SnsModule::default().local_name(), "sns_topic");
    }

    #[test]
    fn test_render_with_subscription() {
        let topic = SnsModule::new("alerts")
            .with_lambda_subscription("worker", "${module.worker.lambda_function_arn}");
        let hcl = topic.to_hcl(&HclGenerator::default()).unwrap();

        let expected = r#"module "alerts" {
  source  = "terraform-aws-modules/sns/aws"
  version = "~> 6.0"
  create                      = true
  create_subscription         = true
  create_topic_policy         = true
  enable_default_topic_policy = true
  name                        = "alerts"
  subscriptions               = {
    worker = {
      endpoint = module.worker.lambda_function_arn
      protocol = "lambda"
    }
  }
}
"#;
        assert_eq!(hcl, expected);
    }

    #[test]
    fn test_policy_statement_renders_principals_as_object_lists() {
        let topic = SnsModule::new("alerts").with_policy_statement(
            "events",
            PolicyStatement::allow(["sns:Publish"]).with_principal(Principal::service("events.amazonaws.com")),
        );
        let hcl = topic.to_hcl(&HclGenerator::default()).unwrap();
        assert!(hcl.contains(
            "      principals = [\n        {\n          identifiers = [\"events.amazonaws.com\"]\n"
        ));
    }

    #[test]
    fn test_fifo_name() {
        let topic = SnsModule::new("orders").with_local_name("orders").with_fifo(true);
        assert!(topic.validate().unwrap_err().to_string().contains(".fifo"));

        let topic = SnsModule::new("orders.fifo").with_local_name("orders").with_fifo(true);
        assert!(topic.validate().is_ok());

        let not_fifo = SnsModule {
            content_based_deduplication: Some(true),
            ..SnsModule::new("orders")
        };
        assert!(not_fifo.validate().is_err());
    }

    #[test]
    fn test_subscription_validation() {
        let bad_protocol = SnsModule::new("alerts").with_subscription("pager", Subscription::new("pager", "x"));
        assert!(bad_protocol.validate().unwrap_err().to_string().contains("protocol"));

        let no_endpoint = SnsModule::new("alerts").with_subscription("q", Subscription::new("sqs", ""));
        assert!(no_endpoint.validate().is_err());

        let raw_lambda = SnsModule::new("alerts").with_subscription(
            "fn",
            Subscription {
                raw_message_delivery: Some(true),
                ..Subscription::new("lambda", "arn:aws:lambda:eu-west-1:123:function:f")
            },
        );
        assert!(raw_lambda.validate().is_err());

        let raw_sqs = SnsModule::new("alerts").with_sqs_subscription("q", "${module.q.queue_arn}", true);
        assert!(raw_sqs.validate().is_ok());
    }

    #[test]
    fn test_feedback_sample_rate() {
        let topic = SnsModule {
            sqs_feedback: Some(FeedbackConfig {
                success_sample_rate: Some(101),
                ..Default::default()
            }),
            ..SnsModule::new("alerts")
        };
        let err = topic.validate().unwrap_err();
        assert!(err.to_string().contains("sqs_feedback.success_sample_rate"));
    }
}
