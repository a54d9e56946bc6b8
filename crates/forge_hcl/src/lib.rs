//! # forge_hcl
//!
//! Deterministic HCL generation for Terraform `module` blocks.
//!
//! A configuration value is described as a tree of [`Value`]s whose records
//! ([`Object`]) declare, per field, whether it renders as an attribute or as
//! a nested block. Generation walks the set fields, classifies strings as
//! literals or references, encodes every field, orders the result and hands
//! it to one of two interchangeable backends.
//!
//! ## Features
//!
//! - Omission of unset fields and empty collections
//! - `${...}` and `var.`/`module.`/`data.`/`local.`/`resource.` references emitted unquoted
//! - Canonical ordering, so equal values always render the same bytes
//! - Text and token backends with identical output
//! - YAML/JSON module documents
//!
//! ## Example
//!
//! ```rust
//! use forge_hcl::{to_hcl, Object};
//!
//! let bucket = Object::builder()
//!     .attr("name", "my-bucket")
//!     .attr("owner", "${data.aws_caller_identity.current.account_id}")
//!     .build();
//!
//! let hcl = to_hcl("bucket", "mod/s3", "1.0", &bucket).unwrap();
//! assert!(hcl.contains("owner = data.aws_caller_identity.current.account_id"));
//! ```

pub mod backend;
pub mod config;
pub mod convert;
pub mod document;
pub mod encoder;
pub mod error;
pub mod generator;
pub mod order;
pub mod reference;
pub mod syntax;
pub mod value;
pub mod walker;

pub use backend::{create_backend, Backend, BackendKind, TextBackend, TokenBackend};
pub use config::GeneratorConfig;
pub use convert::{value_from_json, value_from_yaml};
pub use document::{parse_documents, parse_json_document, ModuleDocument};
pub use encoder::{BlockFragment, Expr, Fragment};
pub use error::{FieldPath, HclError, HclResult, PathSegment};
pub use generator::{encode_module_body, to_hcl, HclGenerator, ModuleHeader};
pub use reference::{classify, is_balanced, is_reference, Classified};
pub use syntax::{is_identifier, validate_hcl};
pub use value::{Configuration, EmissionKind, Field, Number, Object, ObjectBuilder, SemanticType, Value};
