//! Integration tests for typed modules and stacks.

use forge_hcl::{validate_hcl, GeneratorConfig, HclGenerator};
use forge_modules::{
    DynamoDbModule, EventSourceMapping, LambdaModule, ModuleError, PolicyStatement, Principal,
    S3BucketModule, SnsModule, SqsModule, Stack, TerraformModule,
};
use pretty_assertions::assert_eq;

fn order_pipeline() -> Stack {
    let uploads = S3BucketModule::new("order-uploads").with_local_name("uploads");
    let queue = SqsModule::new("orders").with_policy_statement(
        "uploads",
        PolicyStatement::allow(["sqs:SendMessage"])
            .with_principal(Principal::service("s3.amazonaws.com"))
            .with_resources(["*"]),
    );
    let worker = LambdaModule::new("order-worker")
        .with_local_name("worker")
        .with_runtime("python3.13", "worker.handler")
        .with_environment([("BUCKET", uploads.output("s3_bucket_id").to_string())])
        .with_event_source_mapping(
            "orders",
            EventSourceMapping {
                event_source_arn: queue.output("queue_arn").to_string(),
                batch_size: Some(10),
                ..Default::default()
            },
        );

    Stack::new("orders")
        .with_module(worker)
        .with_module(queue)
        .with_module(uploads)
        .with_dependency("worker", "orders")
        .with_dependency("worker", "uploads")
        .with_dependency("orders", "uploads")
}

#[test]
fn test_stack_validates_and_orders() {
    let stack = order_pipeline();
    stack.validate().unwrap();
    assert_eq!(stack.deployment_order().unwrap(), vec!["uploads", "orders", "worker"]);
}

#[test]
fn test_stack_renders_cross_module_references() {
    let hcl = order_pipeline().to_hcl(&HclGenerator::default()).unwrap();

    assert!(hcl.starts_with("module \"worker\" {\n"));
    assert!(hcl.contains("\n}\n\nmodule \"orders\" {\n"));
    assert!(hcl.contains("\n}\n\nmodule \"uploads\" {\n"));
    assert!(hcl.contains("BUCKET = module.uploads.s3_bucket_id"));
    assert!(hcl.contains("event_source_arn = module.orders.queue_arn"));
    assert!(!hcl.contains("\"module."));
    assert!(hcl.ends_with("}\n"));
}

#[test]
fn test_stack_backends_agree() {
    let stack = order_pipeline();
    let text = stack
        .to_hcl(&HclGenerator::new(GeneratorConfig::text()).unwrap())
        .unwrap();
    let tokens = stack
        .to_hcl(&HclGenerator::new(GeneratorConfig::tokens()).unwrap())
        .unwrap();
    assert_eq!(text, tokens);
}

#[test]
fn test_rendering_is_repeatable() {
    let generator = HclGenerator::default();
    let first = order_pipeline().to_hcl(&generator).unwrap();
    let second = order_pipeline().to_hcl(&generator).unwrap();
    assert_eq!(first, second);
}

fn fan_out() -> Stack {
    let table = DynamoDbModule::new("orders")
        .with_hash_key("pk", "S")
        .with_streams("NEW_IMAGE");
    let queue = SqsModule::new("billing");
    let topic = SnsModule::new("order-events")
        .with_local_name("events")
        .with_sqs_subscription("billing", queue.output("queue_arn").to_string(), true);
    let projector = LambdaModule::new("projector")
        .with_runtime("python3.13", "projector.handler")
        .with_environment([("TOPIC_ARN", topic.output("topic_arn").to_string())])
        .with_event_source_mapping(
            "table",
            EventSourceMapping {
                event_source_arn: table.output("dynamodb_table_stream_arn").to_string(),
                starting_position: Some("LATEST".into()),
                ..Default::default()
            },
        );

    Stack::new("fan-out")
        .with_module(projector)
        .with_module(topic)
        .with_module(queue)
        .with_module(table)
        .with_dependency("projector", "orders")
        .with_dependency("projector", "events")
        .with_dependency("events", "billing")
}

#[test]
fn test_fan_out_stack() {
    let stack = fan_out();
    stack.validate().unwrap();
    assert_eq!(
        stack.deployment_order().unwrap(),
        vec!["orders", "billing", "events", "projector"]
    );

    let hcl = stack.to_hcl(&HclGenerator::default()).unwrap();
    assert!(hcl.contains("event_source_arn  = module.orders.dynamodb_table_stream_arn"));
    assert!(hcl.contains("TOPIC_ARN = module.events.topic_arn"));
    assert!(hcl.contains("endpoint             = module.billing.queue_arn"));
    validate_hcl(&hcl).unwrap();
}

#[test]
fn test_rendered_stack_parses_as_hcl() {
    let hcl = order_pipeline().to_hcl(&HclGenerator::default()).unwrap();
    validate_hcl(&hcl).unwrap();
}

#[test]
fn test_validation_error_surfaces_from_stack() {
    let stack = Stack::new("bad")
        .with_module(SqsModule::new("slow").with_delay_seconds(1000));
    let err = stack.validate().unwrap_err();
    assert!(matches!(err, ModuleError::Validation { ref module, .. } if module == "slow"));
    assert!(err.to_string().contains("delay_seconds must be between 0 and 900"));
}

#[test]
fn test_module_from_yaml() {
    let yaml = r#"
local_name: events
source: terraform-aws-modules/sqs/aws
version: "~> 4.0"
name: events.fifo
fifo_queue: true
content_based_deduplication: true
visibility_timeout_seconds: 60
tags:
  Env: prod
"#;
    let queue: SqsModule = serde_yaml::from_str(yaml).unwrap();
    queue.validate().unwrap();

    let hcl = queue.to_hcl(&HclGenerator::default()).unwrap();
    let expected = r#"module "events" {
  source  = "terraform-aws-modules/sqs/aws"
  version = "~> 4.0"
  content_based_deduplication = true
  fifo_queue                  = true
  name                        = "events.fifo"
  tags                        = {
    Env = "prod"
  }
  visibility_timeout_seconds = 60
}
"#;
    assert_eq!(hcl, expected);
}

#[test]
fn test_lambda_from_json_like_yaml() {
    let yaml = r#"{"source": "terraform-aws-modules/lambda/aws", "function_name": "api", "memory_size": 64}"#;
    let function: LambdaModule = serde_yaml::from_str(yaml).unwrap();
    assert_eq!(function.local_name(), "api");
    assert!(function.version().is_none());
    assert!(function.validate().is_err());
}
