//! # forge_modules
//!
//! Typed definitions for common terraform-aws-modules, rendered through
//! [`forge_hcl`].
//!
//! ## Features
//!
//! - SQS queues, SNS topics, S3 buckets, DynamoDB tables and Lambda
//!   functions with secure defaults
//! - Input range and enum validation before rendering
//! - Shared IAM policy statements
//! - Stacks with dependency checks and a deployment order
//!
//! ## Example
//!
//! ```rust
//! use forge_hcl::HclGenerator;
//! use forge_modules::{LambdaModule, SqsModule, Stack, TerraformModule};
//!
//! let queue = SqsModule::new("orders");
//! let worker = LambdaModule::new("worker")
//!     .with_runtime("python3.13", "app.handler")
//!     .with_environment([("QUEUE_URL", queue.output("queue_url").to_string())]);
//!
//! let stack = Stack::new("orders")
//!     .with_module(queue)
//!     .with_module(worker)
//!     .with_dependency("worker", "orders");
//!
//! stack.validate().unwrap();
//! let hcl = stack.to_hcl(&HclGenerator::default()).unwrap();
//! assert!(hcl.contains("QUEUE_URL = module.orders.queue_url"));
//! ```

pub mod dynamodb;
pub mod error;
pub mod lambda;
pub mod module;
pub mod policy;
pub mod s3;
pub mod sns;
pub mod sqs;
pub mod stack;

pub use dynamodb::{DynamoDbModule, GlobalSecondaryIndex, LocalSecondaryIndex, ReplicaRegion, TableAttribute};
pub use error::{ModuleError, ModuleResult};
pub use lambda::{AllowedTrigger, CorsConfig, EventSourceMapping, LambdaModule};
pub use module::{BaseModule, ModuleOutput, TerraformModule};
pub use policy::{statement_map, Condition, PolicyStatement, Principal};
pub use s3::{CorsRule, LifecycleRule, Logging, S3BucketModule, ServerSideEncryption, Transition, Versioning, Website};
pub use sns::{FeedbackConfig, SnsModule, Subscription};
pub use sqs::SqsModule;
pub use stack::Stack;
