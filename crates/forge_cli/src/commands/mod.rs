//! CLI command definitions.
//!
//! Each subcommand reads a module or stack document and renders it through
//! the HCL generator.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::debug;

use forge_hcl::{parse_documents, BackendKind, GeneratorConfig};
use forge_modules::{BaseModule, Stack};

pub mod check;
pub mod render;

/// forge - deterministic HCL for Terraform modules
#[derive(Parser)]
#[command(name = "forge")]
#[command(version, about = "forge - deterministic HCL for Terraform modules")]
#[command(long_about = r#"
forge renders declarative module documents (YAML or JSON) into Terraform
`module` blocks. Output is byte-for-byte stable for equal input.

COMMANDS:
  render  → Render a module or stack document to HCL
  check   → Render with both backends and compare the results

EXIT CODES:
  0 - Success
  1 - General error
  2 - Invalid arguments
  3 - Validation failure
  4 - Shape error
"#)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Render a module or stack document to HCL
    Render(render::RenderArgs),

    /// Check that both backends render a document identically
    Check(check::CheckArgs),
}

/// Generator settings shared by commands.
#[derive(Args, Debug, Clone, Default)]
pub struct GeneratorArgs {
    /// Generator config file (YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Spaces per nesting level
    #[arg(long, env = "FORGE_INDENT")]
    pub indent: Option<usize>,
}

impl GeneratorArgs {
    /// Resolve the config file plus command line overrides.
    pub fn resolve(&self, backend: Option<BackendKind>) -> Result<GeneratorConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let content = read_input(path)?;
                GeneratorConfig::from_yaml_str(&content)
                    .with_context(|| format!("Invalid generator config {}", path.display()))?
            }
            None => GeneratorConfig::default(),
        };

        if let Some(backend) = backend {
            config.backend = backend;
        }
        if let Some(indent) = self.indent {
            config.indent_width = indent;
        }
        config.validate()?;

        debug!(backend = config.backend.as_str(), indent = config.indent_width, "Resolved generator config");
        Ok(config)
    }
}

pub(crate) fn read_input(path: &Path) -> Result<String> {
    if !path.exists() {
        anyhow::bail!("Input file not found: {}", path.display());
    }
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// Load a module or stack document into a validated stack.
pub(crate) fn load_stack(path: &Path) -> Result<Stack> {
    let content = read_input(path)?;
    let documents = parse_documents(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    let name = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stack".to_string());
    let mut stack = Stack::new(name);

    for document in documents {
        let body = document.to_object()?;
        let mut module = BaseModule::new(&document.name, &document.source).with_body(body);
        if let Some(version) = &document.version {
            module = module.with_version(version);
        }
        for dependency in &document.depends_on {
            stack.add_dependency(&document.name, dependency);
        }
        stack.add_module(module);
    }

    stack.validate()?;
    Ok(stack)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_temp(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_resolve_defaults() {
        let config = GeneratorArgs::default().resolve(None).unwrap();
        assert_eq!(config, GeneratorConfig::default());
    }

    #[test]
    fn test_resolve_overrides_config_file() {
        let file = write_temp("backend: tokens\nindent_width: 4\n");
        let args = GeneratorArgs {
            config: Some(file.path().to_path_buf()),
            indent: Some(3),
        };
        let config = args.resolve(None).unwrap();
        assert_eq!(config.backend, BackendKind::Tokens);
        assert_eq!(config.indent_width, 3);

        let config = args.resolve(Some(BackendKind::Text)).unwrap();
        assert_eq!(config.backend, BackendKind::Text);
    }

    #[test]
    fn test_resolve_rejects_bad_indent() {
        let args = GeneratorArgs {
            config: None,
            indent: Some(0),
        };
        assert!(args.resolve(None).is_err());
    }

    #[test]
    fn test_load_stack_with_dependencies() {
        let file = write_temp(
            r#"
modules:
  - name: api
    source: mod/api
    depends_on: [queue]
  - name: queue
    source: mod/queue
    version: "1.0"
"#,
        );
        let stack = load_stack(file.path()).unwrap();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.deployment_order().unwrap(), vec!["queue", "api"]);
    }

    #[test]
    fn test_load_stack_unknown_dependency() {
        let file = write_temp("modules:\n  - name: api\n    source: mod/api\n    depends_on: [db]\n");
        let err = load_stack(file.path()).unwrap_err();
        assert!(err.to_string().contains("unknown module db"));
    }

    #[test]
    fn test_missing_input() {
        let err = load_stack(Path::new("/nonexistent/forge.yaml")).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
