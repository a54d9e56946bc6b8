//! IAM policy statements shared by queue, topic and function modules.

use std::collections::BTreeMap;

use forge_hcl::{Configuration, Object, Value};
use serde::{Deserialize, Serialize};

use crate::error::{ModuleError, ModuleResult};

/// One IAM policy statement.
///
/// Principals and conditions are declared as blocks; inside a module input
/// map they render as nested object lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyStatement {
    pub sid: Option<String>,
    pub effect: Option<String>,
    pub actions: Vec<String>,
    pub not_actions: Vec<String>,
    pub resources: Vec<String>,
    pub not_resources: Vec<String>,
    pub principals: Vec<Principal>,
    pub not_principals: Vec<Principal>,
    pub conditions: Vec<Condition>,
}

impl PolicyStatement {
    pub fn allow<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            effect: Some("Allow".to_string()),
            actions: actions.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn deny<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            effect: Some("Deny".to_string()),
            ..Self::allow(actions)
        }
    }

    pub fn with_sid(mut self, sid: impl Into<String>) -> Self {
        self.sid = Some(sid.into());
        self
    }

    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources.extend(resources.into_iter().map(Into::into));
        self
    }

    pub fn with_principal(mut self, principal: Principal) -> Self {
        self.principals.push(principal);
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Check the statement on behalf of `module`.
    pub fn validate(&self, module: &str) -> ModuleResult<()> {
        if let Some(effect) = self.effect.as_deref() {
            if effect != "Allow" && effect != "Deny" {
                return Err(ModuleError::validation(
                    module,
                    format!("policy effect must be Allow or Deny, got '{}'", effect),
                ));
            }
        }
        if self.actions.is_empty() && self.not_actions.is_empty() {
            return Err(ModuleError::validation(
                module,
                "policy statement needs actions or not_actions",
            ));
        }
        for principal in self.principals.iter().chain(&self.not_principals) {
            if principal.identifiers.is_empty() {
                return Err(ModuleError::validation(
                    module,
                    format!("principal of type {} has no identifiers", principal.principal_type),
                ));
            }
        }
        Ok(())
    }
}

impl Configuration for PolicyStatement {
    fn to_object(&self) -> Object {
        Object::builder()
            .attr_opt("sid", self.sid.as_deref())
            .attr_opt("effect", self.effect.as_deref())
            .attr("actions", self.actions.clone())
            .attr("not_actions", self.not_actions.clone())
            .attr("resources", self.resources.clone())
            .attr("not_resources", self.not_resources.clone())
            .block("principals", self.principals.clone())
            .block("not_principals", self.not_principals.clone())
            .block("condition", self.conditions.clone())
            .build()
    }
}

impl From<PolicyStatement> for Value {
    fn from(statement: PolicyStatement) -> Self {
        Value::Object(statement.to_object())
    }
}

/// Keyed statements as a module input map.
pub fn statement_map(statements: &BTreeMap<String, PolicyStatement>) -> Value {
    Value::map(
        statements
            .iter()
            .map(|(key, statement)| (key.clone(), statement.clone())),
    )
}

/// An IAM principal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    #[serde(rename = "type")]
    pub principal_type: String,
    pub identifiers: Vec<String>,
}

impl Principal {
    pub fn new<I, S>(principal_type: impl Into<String>, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            principal_type: principal_type.into(),
            identifiers: identifiers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn aws<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("AWS", identifiers)
    }

    pub fn service(service: impl Into<String>) -> Self {
        Self::new("Service", [service.into()])
    }
}

impl Configuration for Principal {
    fn to_object(&self) -> Object {
        Object::builder()
            .attr("type", self.principal_type.as_str())
            .attr("identifiers", self.identifiers.clone())
            .build()
    }
}

impl From<Principal> for Value {
    fn from(principal: Principal) -> Self {
        Value::Object(principal.to_object())
    }
}

/// An IAM condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub test: String,
    pub variable: String,
    pub values: Vec<String>,
}

impl Condition {
    pub fn new<I, S>(test: impl Into<String>, variable: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            test: test.into(),
            variable: variable.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl Configuration for Condition {
    fn to_object(&self) -> Object {
        Object::builder()
            .attr("test", self.test.as_str())
            .attr("variable", self.variable.as_str())
            .attr("values", self.values.clone())
            .build()
    }
}

impl From<Condition> for Value {
    fn from(condition: Condition) -> Self {
        Value::Object(condition.to_object())
    }
}
