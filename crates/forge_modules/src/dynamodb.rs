//! terraform-aws-modules/dynamodb-table/aws

use std::collections::BTreeMap;

use forge_hcl::{Configuration, Object, Value};
use serde::{Deserialize, Serialize};

use crate::error::{ModuleError, ModuleResult};
use crate::module::{check_one_of, check_range, TerraformModule};

pub const DYNAMODB_SOURCE: &str = "terraform-aws-modules/dynamodb-table/aws";
pub const DYNAMODB_VERSION: &str = "~> 4.0";
const DEFAULT_LOCAL_NAME: &str = "dynamodb_table";

const PROJECTIONS: &[&str] = &["ALL", "KEYS_ONLY", "INCLUDE"];

/// A DynamoDB table.
///
/// [`DynamoDbModule::new`] selects on-demand billing with point-in-time
/// recovery, encryption at rest and deletion protection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamoDbModule {
    pub local_name: Option<String>,
    pub source: String,
    pub version: Option<String>,

    pub create_table: Option<bool>,
    pub region: Option<String>,
    pub tags: BTreeMap<String, String>,

    pub name: Option<String>,
    pub billing_mode: Option<String>,
    pub table_class: Option<String>,
    pub deletion_protection_enabled: Option<bool>,

    pub attributes: Vec<TableAttribute>,
    pub hash_key: Option<String>,
    pub range_key: Option<String>,

    pub read_capacity: Option<i64>,
    pub write_capacity: Option<i64>,
    pub autoscaling_enabled: Option<bool>,
    pub autoscaling_read: BTreeMap<String, String>,
    pub autoscaling_write: BTreeMap<String, String>,

    pub global_secondary_indexes: Vec<GlobalSecondaryIndex>,
    pub local_secondary_indexes: Vec<LocalSecondaryIndex>,

    pub stream_enabled: Option<bool>,
    pub stream_view_type: Option<String>,

    pub point_in_time_recovery_enabled: Option<bool>,
    pub point_in_time_recovery_period_in_days: Option<i64>,

    pub ttl_enabled: Option<bool>,
    pub ttl_attribute_name: Option<String>,

    pub server_side_encryption_enabled: Option<bool>,
    pub server_side_encryption_kms_key_arn: Option<String>,

    pub replica_regions: Vec<ReplicaRegion>,
    pub resource_policy: Option<String>,
    pub timeouts: BTreeMap<String, String>,
}

/// A key attribute definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableAttribute {
    pub name: String,
    #[serde(rename = "type")]
    pub attribute_type: String,
}

impl TableAttribute {
    pub fn new(name: impl Into<String>, attribute_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attribute_type: attribute_type.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSecondaryIndex {
    pub name: String,
    pub hash_key: String,
    pub range_key: Option<String>,
    pub projection_type: String,
    pub non_key_attributes: Vec<String>,
    pub read_capacity: Option<i64>,
    pub write_capacity: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalSecondaryIndex {
    pub name: String,
    pub range_key: String,
    pub projection_type: String,
    pub non_key_attributes: Vec<String>,
}

/// A global table replica.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplicaRegion {
    pub region_name: String,
    pub kms_key_arn: Option<String>,
    pub propagate_tags: Option<bool>,
    pub point_in_time_recovery: Option<bool>,
}

impl DynamoDbModule {
    pub fn new(name: impl Into<String>) -> Self {
        let timeouts = [("create", "10m"), ("update", "60m"), ("delete", "10m")]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        Self {
            source: DYNAMODB_SOURCE.to_string(),
            version: Some(DYNAMODB_VERSION.to_string()),
            name: Some(name.into()),
            create_table: Some(true),
            billing_mode: Some("PAY_PER_REQUEST".to_string()),
            point_in_time_recovery_enabled: Some(true),
            server_side_encryption_enabled: Some(true),
            deletion_protection_enabled: Some(true),
            timeouts,
            ..Default::default()
        }
    }

    pub fn with_local_name(mut self, local_name: impl Into<String>) -> Self {
        self.local_name = Some(local_name.into());
        self
    }

    /// Set the partition key and declare its attribute.
    pub fn with_hash_key(mut self, name: impl Into<String>, attribute_type: impl Into<String>) -> Self {
        let name = name.into();
        self.declare(&name, attribute_type.into());
        self.hash_key = Some(name);
        self
    }

    /// Set the sort key and declare its attribute.
    pub fn with_range_key(mut self, name: impl Into<String>, attribute_type: impl Into<String>) -> Self {
        let name = name.into();
        self.declare(&name, attribute_type.into());
        self.range_key = Some(name);
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, attribute_type: impl Into<String>) -> Self {
        self.declare(&name.into(), attribute_type.into());
        self
    }

    pub fn with_streams(mut self, view_type: impl Into<String>) -> Self {
        self.stream_enabled = Some(true);
        self.stream_view_type = Some(view_type.into());
        self
    }

    pub fn with_gsi(mut self, index: GlobalSecondaryIndex) -> Self {
        self.global_secondary_indexes.push(index);
        self
    }

    pub fn with_ttl(mut self, attribute_name: impl Into<String>) -> Self {
        self.ttl_enabled = Some(true);
        self.ttl_attribute_name = Some(attribute_name.into());
        self
    }

    pub fn with_encryption(mut self, kms_key_arn: impl Into<String>) -> Self {
        self.server_side_encryption_enabled = Some(true);
        self.server_side_encryption_kms_key_arn = Some(kms_key_arn.into());
        self
    }

    pub fn with_provisioned(mut self, read_capacity: i64, write_capacity: i64) -> Self {
        self.billing_mode = Some("PROVISIONED".to_string());
        self.read_capacity = Some(read_capacity);
        self.write_capacity = Some(write_capacity);
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

    fn declare(&mut self, name: &str, attribute_type: String) {
        match self.attributes.iter_mut().find(|a| a.name == name) {
            Some(existing) => existing.attribute_type = attribute_type,
            None => self.attributes.push(TableAttribute::new(name, attribute_type)),
        }
    }

    fn is_declared(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a.name == name)
    }

    fn require_declared(&self, module: &str, role: &str, key: &str) -> ModuleResult<()> {
        if self.is_declared(key) {
            Ok(())
        } else {
            Err(ModuleError::validation(
                module,
                format!("{} '{}' is not a declared attribute", role, key),
            ))
        }
    }
}

impl Configuration for TableAttribute {
    fn to_object(&self) -> Object {
        Object::builder()
            .attr("name", self.name.as_str())
            .attr("type", self.attribute_type.as_str())
            .build()
    }
}

impl Configuration for GlobalSecondaryIndex {
    fn to_object(&self) -> Object {
        Object::builder()
            .attr("name", self.name.as_str())
            .attr("hash_key", self.hash_key.as_str())
            .attr_opt("range_key", self.range_key.as_deref())
            .attr("projection_type", self.projection_type.as_str())
            .attr("non_key_attributes", self.non_key_attributes.clone())
            .attr_opt("read_capacity", self.read_capacity)
            .attr_opt("write_capacity", self.write_capacity)
            .build()
    }
}

impl Configuration for LocalSecondaryIndex {
    fn to_object(&self) -> Object {
        Object::builder()
            .attr("name", self.name.as_str())
            .attr("range_key", self.range_key.as_str())
            .attr("projection_type", self.projection_type.as_str())
            .attr("non_key_attributes", self.non_key_attributes.clone())
            .build()
    }
}

impl Configuration for ReplicaRegion {
    fn to_object(&self) -> Object {
        Object::builder()
            .attr("region_name", self.region_name.as_str())
            .attr_opt("kms_key_arn", self.kms_key_arn.as_deref())
            .attr_opt("propagate_tags", self.propagate_tags)
            .attr_opt("point_in_time_recovery", self.point_in_time_recovery)
            .build()
    }
}

fn object_list<C: Configuration>(items: &[C]) -> Value {
    Value::List(items.iter().map(|item| Value::Object(item.to_object())).collect())
}

impl Configuration for DynamoDbModule {
    fn to_object(&self) -> Object {
        Object::builder()
            .attr_opt("create_table", self.create_table)
            .attr_opt("region", self.region.as_deref())
            .attr("tags", self.tags.clone())
            .attr_opt("name", self.name.as_deref())
            .attr_opt("billing_mode", self.billing_mode.as_deref())
            .attr_opt("table_class", self.table_class.as_deref())
            .attr_opt("deletion_protection_enabled", self.deletion_protection_enabled)
            .attr("attributes", object_list(&self.attributes))
            .attr_opt("hash_key", self.hash_key.as_deref())
            .attr_opt("range_key", self.range_key.as_deref())
            .attr_opt("read_capacity", self.read_capacity)
            .attr_opt("write_capacity", self.write_capacity)
            .attr_opt("autoscaling_enabled", self.autoscaling_enabled)
            .attr("autoscaling_read", self.autoscaling_read.clone())
            .attr("autoscaling_write", self.autoscaling_write.clone())
            .attr("global_secondary_indexes", object_list(&self.global_secondary_indexes))
            .attr("local_secondary_indexes", object_list(&self.local_secondary_indexes))
            .attr_opt("stream_enabled", self.stream_enabled)
            .attr_opt("stream_view_type", self.stream_view_type.as_deref())
            .attr_opt("point_in_time_recovery_enabled", self.point_in_time_recovery_enabled)
            .attr_opt(
                "point_in_time_recovery_period_in_days",
                self.point_in_time_recovery_period_in_days,
            )
            .attr_opt("ttl_enabled", self.ttl_enabled)
            .attr_opt("ttl_attribute_name", self.ttl_attribute_name.as_deref())
            .attr_opt("server_side_encryption_enabled", self.server_side_encryption_enabled)
            .attr_opt(
                "server_side_encryption_kms_key_arn",
                self.server_side_encryption_kms_key_arn.as_deref(),
            )
            .attr("replica_regions", object_list(&self.replica_regions))
            .attr_opt("resource_policy", self.resource_policy.as_deref())
            .attr("timeouts", self.timeouts.clone())
            .build()
    }
}

impl TerraformModule for DynamoDbModule {
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
            "billing_mode",
            self.billing_mode.as_deref(),
            &["PROVISIONED", "PAY_PER_REQUEST"],
        )?;
        check_one_of(
            module,
            "table_class",
            self.table_class.as_deref(),
            &["STANDARD", "STANDARD_INFREQUENT_ACCESS"],
        )?;
        check_one_of(
            module,
            "stream_view_type",
            self.stream_view_type.as_deref(),
            &["KEYS_ONLY", "NEW_IMAGE", "OLD_IMAGE", "NEW_AND_OLD_IMAGES"],
        )?;
        check_range(
            module,
            "point_in_time_recovery_period_in_days",
            self.point_in_time_recovery_period_in_days,
            1,
            35,
        )?;

        for attribute in &self.attributes {
            check_one_of(
                module,
                &format!("attribute {} type", attribute.name),
                Some(attribute.attribute_type.as_str()),
                &["S", "N", "B"],
            )?;
        }

        let hash_key = self
            .hash_key
            .as_deref()
            .ok_or_else(|| ModuleError::validation(module, "hash_key is required"))?;
        self.require_declared(module, "hash_key", hash_key)?;
        if let Some(range_key) = self.range_key.as_deref() {
            self.require_declared(module, "range_key", range_key)?;
        }

        match self.billing_mode.as_deref() {
            Some("PROVISIONED") => {
                if self.read_capacity.is_none() || self.write_capacity.is_none() {
                    return Err(ModuleError::validation(
                        module,
                        "PROVISIONED billing requires read_capacity and write_capacity",
                    ));
                }
                check_range(module, "read_capacity", self.read_capacity, 1, 40_000)?;
                check_range(module, "write_capacity", self.write_capacity, 1, 40_000)?;
            }
            _ => {
                if self.read_capacity.is_some() || self.write_capacity.is_some() {
                    return Err(ModuleError::validation(
                        module,
                        "capacity settings require PROVISIONED billing",
                    ));
                }
            }
        }

        if self.stream_view_type.is_some() && self.stream_enabled != Some(true) {
            return Err(ModuleError::validation(
                module,
                "stream_view_type requires stream_enabled = true",
            ));
        }
        if self.ttl_enabled == Some(true) && self.ttl_attribute_name.is_none() {
            return Err(ModuleError::validation(
                module,
                "ttl_enabled requires ttl_attribute_name",
            ));
        }
        if self.server_side_encryption_kms_key_arn.is_some()
            && self.server_side_encryption_enabled != Some(true)
        {
            return Err(ModuleError::validation(
                module,
                "server_side_encryption_kms_key_arn requires server_side_encryption_enabled = true",
            ));
        }

        for index in &self.global_secondary_indexes {
            self.require_declared(module, &format!("index {} hash_key", index.name), &index.hash_key)?;
            if let Some(range_key) = index.range_key.as_deref() {
                self.require_declared(module, &format!("index {} range_key", index.name), range_key)?;
            }
            check_projection(module, &index.name, &index.projection_type, &index.non_key_attributes)?;
        }
        for index in &self.local_secondary_indexes {
            self.require_declared(module, &format!("index {} range_key", index.name), &index.range_key)?;
            check_projection(module, &index.name, &index.projection_type, &index.non_key_attributes)?;
        }
        if !self.replica_regions.is_empty() && self.stream_enabled != Some(true) {
            return Err(ModuleError::validation(
                module,
                "replica_regions require stream_enabled = true",
            ));
        }
        Ok(())
    }
}

fn check_projection(module: &str, index: &str, projection: &str, non_key: &[String]) -> ModuleResult<()> {
    check_one_of(
        module,
        &format!("index {} projection_type", index),
        Some(projection),
        PROJECTIONS,
    )?;
    if (projection == "INCLUDE") != !non_key.is_empty() {
        return Err(ModuleError::validation(
            module,
            format!("index {}: non_key_attributes go with INCLUDE projections only", index),
        ));
    }
    Ok(())
}
