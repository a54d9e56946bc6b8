//! terraform-aws-modules/s3-bucket/aws

use std::collections::BTreeMap;
use std::sync::LazyLock;

use forge_hcl::{Configuration, Object, Value};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ModuleError, ModuleResult};
use crate::module::{check_one_of, check_range, TerraformModule};

pub const S3_SOURCE: &str = "terraform-aws-modules/s3-bucket/aws";
pub const S3_VERSION: &str = "~> 4.0";
const DEFAULT_LOCAL_NAME: &str = "s3_bucket";

static BUCKET_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-z0-9][a-z0-9.-]{1,61}[a-z0-9]$").expect("bucket name pattern is valid")
});

/// An S3 bucket.
///
/// [`S3BucketModule::new`] blocks all public access, enforces bucket owner
/// object ownership and enables versioning with AES256 encryption.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct S3BucketModule {
    pub local_name: Option<String>,
    pub source: String,
    pub version: Option<String>,

    pub create_bucket: Option<bool>,
    pub bucket: Option<String>,
    pub bucket_prefix: Option<String>,
    pub region: Option<String>,
    pub acl: Option<String>,
    pub force_destroy: Option<bool>,
    pub expected_bucket_owner: Option<String>,
    pub tags: BTreeMap<String, String>,

    pub block_public_acls: Option<bool>,
    pub block_public_policy: Option<bool>,
    pub ignore_public_acls: Option<bool>,
    pub restrict_public_buckets: Option<bool>,
    pub control_object_ownership: Option<bool>,
    pub object_ownership: Option<String>,

    pub attach_policy: Option<bool>,
    pub policy: Option<String>,
    pub attach_deny_insecure_transport_policy: Option<bool>,
    pub attach_require_latest_tls_policy: Option<bool>,

    pub versioning: Option<Versioning>,
    pub server_side_encryption: Option<ServerSideEncryption>,
    pub website: Option<Website>,
    pub logging: Option<Logging>,
    pub cors_rule: Vec<CorsRule>,
    pub lifecycle_rule: Vec<LifecycleRule>,

    pub object_lock_enabled: Option<bool>,
    pub acceleration_status: Option<String>,
    pub request_payer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Versioning {
    pub enabled: bool,
    #[serde(default)]
    pub mfa_delete: Option<bool>,
}

/// Default encryption rule for new objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerSideEncryption {
    pub sse_algorithm: String,
    #[serde(default)]
    pub kms_master_key_id: Option<String>,
    #[serde(default)]
    pub bucket_key_enabled: Option<bool>,
}

impl ServerSideEncryption {
    pub fn aes256() -> Self {
        Self {
            sse_algorithm: "AES256".to_string(),
            kms_master_key_id: None,
            bucket_key_enabled: None,
        }
    }

    pub fn kms(key_arn: impl Into<String>) -> Self {
        Self {
            sse_algorithm: "aws:kms".to_string(),
            kms_master_key_id: Some(key_arn.into()),
            bucket_key_enabled: Some(true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Website {
    pub index_document: String,
    pub error_document: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Logging {
    pub target_bucket: String,
    pub target_prefix: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsRule {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub expose_headers: Vec<String>,
    pub max_age_seconds: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleRule {
    pub id: String,
    pub enabled: bool,
    pub prefix: Option<String>,
    pub expiration_days: Option<i64>,
    pub noncurrent_version_expiration_days: Option<i64>,
    pub transitions: Vec<Transition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub days: i64,
    pub storage_class: String,
}

impl S3BucketModule {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            source: S3_SOURCE.to_string(),
            version: Some(S3_VERSION.to_string()),
            bucket: Some(bucket.into()),
            create_bucket: Some(true),
            block_public_acls: Some(true),
            block_public_policy: Some(true),
            ignore_public_acls: Some(true),
            restrict_public_buckets: Some(true),
            object_ownership: Some("BucketOwnerEnforced".to_string()),
            versioning: Some(Versioning {
                enabled: true,
                mfa_delete: None,
            }),
            server_side_encryption: Some(ServerSideEncryption::aes256()),
            ..Default::default()
        }
    }

    pub fn with_local_name(mut self, local_name: impl Into<String>) -> Self {
        self.local_name = Some(local_name.into());
        self
    }

    pub fn with_versioning(mut self, enabled: bool) -> Self {
        self.versioning = Some(Versioning {
            enabled,
            mfa_delete: None,
        });
        self
    }

    pub fn with_encryption(mut self, kms_key_arn: impl Into<String>) -> Self {
        self.server_side_encryption = Some(ServerSideEncryption::kms(kms_key_arn));
        self
    }

    /// Lift every public access block.
    pub fn with_public_access(mut self) -> Self {
        self.block_public_acls = Some(false);
        self.block_public_policy = Some(false);
        self.ignore_public_acls = Some(false);
        self.restrict_public_buckets = Some(false);
        self
    }

    pub fn with_website(mut self, index_document: impl Into<String>, error_document: impl Into<String>) -> Self {
        self.website = Some(Website {
            index_document: index_document.into(),
            error_document: Some(error_document.into()),
        });
        self
    }

    pub fn with_logging(mut self, target_bucket: impl Into<String>, target_prefix: impl Into<String>) -> Self {
        self.logging = Some(Logging {
            target_bucket: target_bucket.into(),
            target_prefix: Some(target_prefix.into()),
        });
        self
    }

    pub fn with_cors_rule(mut self, rule: CorsRule) -> Self {
        self.cors_rule.push(rule);
        self
    }

    pub fn with_lifecycle_rule(mut self, rule: LifecycleRule) -> Self {
        self.lifecycle_rule.push(rule);
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

impl Configuration for S3BucketModule {
    fn to_object(&self) -> Object {
        Object::builder()
            .attr_opt("create_bucket", self.create_bucket)
            .attr_opt("bucket", self.bucket.as_deref())
            .attr_opt("bucket_prefix", self.bucket_prefix.as_deref())
            .attr_opt("region", self.region.as_deref())
            .attr_opt("acl", self.acl.as_deref())
            .attr_opt("force_destroy", self.force_destroy)
            .attr_opt("expected_bucket_owner", self.expected_bucket_owner.as_deref())
            .attr("tags", self.tags.clone())
            .attr_opt("block_public_acls", self.block_public_acls)
            .attr_opt("block_public_policy", self.block_public_policy)
            .attr_opt("ignore_public_acls", self.ignore_public_acls)
            .attr_opt("restrict_public_buckets", self.restrict_public_buckets)
            .attr_opt("control_object_ownership", self.control_object_ownership)
            .attr_opt("object_ownership", self.object_ownership.as_deref())
            .attr_opt("attach_policy", self.attach_policy)
            .attr_opt("policy", self.policy.as_deref())
            .attr_opt(
                "attach_deny_insecure_transport_policy",
                self.attach_deny_insecure_transport_policy,
            )
            .attr_opt("attach_require_latest_tls_policy", self.attach_require_latest_tls_policy)
            .attr_opt("versioning", self.versioning.as_ref().map(Versioning::to_object))
            .attr_opt(
                "server_side_encryption_configuration",
                self.server_side_encryption.as_ref().map(ServerSideEncryption::to_object),
            )
            .attr_opt("website", self.website.as_ref().map(Website::to_object))
            .attr_opt("logging", self.logging.as_ref().map(Logging::to_object))
            .attr("cors_rule", objects(&self.cors_rule))
            .attr("lifecycle_rule", objects(&self.lifecycle_rule))
            .attr_opt("object_lock_enabled", self.object_lock_enabled)
            .attr_opt("acceleration_status", self.acceleration_status.as_deref())
            .attr_opt("request_payer", self.request_payer.as_deref())
            .build()
    }
}

fn objects<C: Configuration>(items: &[C]) -> Value {
    Value::List(items.iter().map(|item| Value::Object(item.to_object())).collect())
}

impl Configuration for Versioning {
    fn to_object(&self) -> Object {
        Object::builder()
            .attr("enabled", self.enabled)
            .attr_opt("mfa_delete", self.mfa_delete)
            .build()
    }
}

impl Configuration for ServerSideEncryption {
    fn to_object(&self) -> Object {
        let default = Object::builder()
            .attr("sse_algorithm", self.sse_algorithm.as_str())
            .attr_opt("kms_master_key_id", self.kms_master_key_id.as_deref())
            .build();
        let rule = Object::builder()
            .attr("apply_server_side_encryption_by_default", default)
            .attr_opt("bucket_key_enabled", self.bucket_key_enabled)
            .build();
        Object::builder().attr("rule", rule).build()
    }
}

impl Configuration for Website {
    fn to_object(&self) -> Object {
        Object::builder()
            .attr("index_document", self.index_document.as_str())
            .attr_opt("error_document", self.error_document.as_deref())
            .build()
    }
}

impl Configuration for Logging {
    fn to_object(&self) -> Object {
        Object::builder()
            .attr("target_bucket", self.target_bucket.as_str())
            .attr_opt("target_prefix", self.target_prefix.as_deref())
            .build()
    }
}

impl Configuration for CorsRule {
    fn to_object(&self) -> Object {
        Object::builder()
            .attr("allowed_origins", self.allowed_origins.clone())
            .attr("allowed_methods", self.allowed_methods.clone())
            .attr("allowed_headers", self.allowed_headers.clone())
            .attr("expose_headers", self.expose_headers.clone())
            .attr_opt("max_age_seconds", self.max_age_seconds)
            .build()
    }
}

impl Configuration for LifecycleRule {
    fn to_object(&self) -> Object {
        let transitions: Vec<Value> = self
            .transitions
            .iter()
            .map(|t| {
                Value::Object(
                    Object::builder()
                        .attr("days", t.days)
                        .attr("storage_class", t.storage_class.as_str())
                        .build(),
                )
            })
            .collect();

        Object::builder()
            .attr("id", self.id.as_str())
            .attr("enabled", self.enabled)
            .attr_opt(
                "filter",
                self.prefix
                    .as_deref()
                    .map(|prefix| Object::builder().attr("prefix", prefix).build()),
            )
            .attr_opt(
                "expiration",
                self.expiration_days
                    .map(|days| Object::builder().attr("days", days).build()),
            )
            .attr_opt(
                "noncurrent_version_expiration",
                self.noncurrent_version_expiration_days
                    .map(|days| Object::builder().attr("days", days).build()),
            )
            .attr("transition", transitions)
            .build()
    }
}

impl TerraformModule for S3BucketModule {
    fn local_name(&self) -> &str {
        self.local_name
            .as_deref()
            .or(self.bucket.as_deref())
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

        if self.bucket.is_some() && self.bucket_prefix.is_some() {
            return Err(ModuleError::validation(
                module,
                "bucket and bucket_prefix are mutually exclusive",
            ));
        }
        if let Some(bucket) = self.bucket.as_deref() {
            if !BUCKET_NAME.is_match(bucket) || bucket.contains("..") {
                return Err(ModuleError::validation(
                    module,
                    format!("'{}' is not a valid bucket name", bucket),
                ));
            }
        }
        if self.acl.is_some() && self.object_ownership.as_deref() == Some("BucketOwnerEnforced") {
            return Err(ModuleError::validation(
                module,
                "acl cannot be set while object_ownership is BucketOwnerEnforced",
            ));
        }

        check_one_of(
            module,
            "object_ownership",
            self.object_ownership.as_deref(),
            &["BucketOwnerEnforced", "BucketOwnerPreferred", "ObjectWriter"],
        )?;
        check_one_of(
            module,
            "acceleration_status",
            self.acceleration_status.as_deref(),
            &["Enabled", "Suspended"],
        )?;
        check_one_of(
            module,
            "request_payer",
            self.request_payer.as_deref(),
            &["BucketOwner", "Requester"],
        )?;

        for rule in &self.cors_rule {
            if rule.allowed_origins.is_empty() || rule.allowed_methods.is_empty() {
                return Err(ModuleError::validation(
                    module,
                    "cors rules need allowed_origins and allowed_methods",
                ));
            }
            check_range(module, "max_age_seconds", rule.max_age_seconds, 0, i64::MAX)?;
        }
        for rule in &self.lifecycle_rule {
            if rule.id.is_empty() {
                return Err(ModuleError::validation(module, "lifecycle rules need an id"));
            }
            check_range(module, "expiration_days", rule.expiration_days, 1, i64::MAX)?;
            for transition in &rule.transitions {
                check_range(module, "transition days", Some(transition.days), 0, i64::MAX)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge_hcl::HclGenerator;

    #[test]
    fn test_secure_defaults() {
        let bucket = S3BucketModule::new("my-data-bucket");
        assert_eq!(bucket.local_name(), "my-data-bucket");
        assert_eq!(bucket.block_public_acls, Some(true));
        assert_eq!(bucket.restrict_public_buckets, Some(true));
        assert_eq!(bucket.object_ownership.as_deref(), Some("BucketOwnerEnforced"));
        assert_eq!(bucket.server_side_encryption, Some(ServerSideEncryption::aes256()));
        assert!(bucket.validate().is_ok());
    }

    #[test]
    fn test_render_defaults() {
        let hcl = S3BucketModule::new("logs")
            .to_hcl(&HclGenerator::default())
            .unwrap();

        let expected = r#"module "logs" {
  source  = "terraform-aws-modules/s3-bucket/aws"
  version = "~> 4.0"
  block_public_acls                    = true
  block_public_policy                  = true
  bucket                               = "logs"
  create_bucket                        = true
  ignore_public_acls                   = true
  object_ownership                     = "BucketOwnerEnforced"
  restrict_public_buckets              = true
  server_side_encryption_configuration = {
    rule = {
      apply_server_side_encryption_by_default = {
        sse_algorithm = "AES256"
      }
    }
  }
  versioning = {
    enabled = true
  }
}
"#;
        assert_eq!(hcl, expected);
    }

    #[test]
    fn test_kms_encryption() {
        let object = S3BucketModule::new("b1b").with_encryption("${aws_kms_key.s3.arn}").to_object();
        let Some(Value::Object(sse)) = object.get("server_side_encryption_configuration").unwrap().value.clone() else {
            panic!("expected an object");
        };
        let hcl = forge_hcl::to_hcl("b", "m", "", &sse).unwrap();
        assert!(hcl.contains("kms_master_key_id = aws_kms_key.s3.arn"));
        assert!(hcl.contains("    bucket_key_enabled = true\n"));
    }

    #[test]
    fn test_lifecycle_rule_shape() {
        let rule = LifecycleRule {
            id: "archive".into(),
            enabled: true,
            expiration_days: Some(365),
            transitions: vec![Transition {
                days: 30,
                storage_class: "GLACIER".into(),
            }],
            ..Default::default()
        };
        let object = rule.to_object();
        assert!(!object.get("filter").unwrap().is_set());
        assert!(object.get("transition").unwrap().is_set());
    }

    #[test]
    fn test_bucket_name_validation() {
        assert!(S3BucketModule::new("ab").validate().is_err());
        assert!(S3BucketModule::new("My_Bucket").validate().is_err());
        assert!(S3BucketModule::new("a..b").validate().is_err());
        assert!(S3BucketModule::new("logs.example.com")
            .with_local_name("logs")
            .validate()
            .is_ok());
    }

    #[test]
    fn test_conflicting_settings() {
        let both = S3BucketModule {
            bucket_prefix: Some("tmp-".into()),
            ..S3BucketModule::new("tmp-bucket")
        };
        assert!(both.validate().unwrap_err().to_string().contains("mutually exclusive"));

        let acl = S3BucketModule {
            acl: Some("private".into()),
            ..S3BucketModule::new("acl-bucket")
        };
        assert!(acl.validate().unwrap_err().to_string().contains("BucketOwnerEnforced"));

        let acl_writer = S3BucketModule {
            acl: Some("private".into()),
            object_ownership: Some("ObjectWriter".into()),
            ..S3BucketModule::new("acl-bucket")
        };
        assert!(acl_writer.validate().is_ok());
    }

    #[test]
    fn test_cors_requires_origins() {
        let bucket = S3BucketModule::new("site-bucket").with_cors_rule(CorsRule {
            allowed_methods: vec!["GET".into()],
            ..Default::default()
        });
        assert!(bucket.validate().is_err());
    }
}
