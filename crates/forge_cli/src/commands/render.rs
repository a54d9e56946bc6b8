//! Render command - Write HCL for a module or stack document.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use forge_hcl::{BackendKind, HclGenerator};

use super::{load_stack, GeneratorArgs};

#[derive(Args)]
pub struct RenderArgs {
    /// Module or stack document (YAML or JSON)
    pub input: PathBuf,

    /// Backend used to assemble output (text or tokens)
    #[arg(short, long, env = "FORGE_BACKEND")]
    pub backend: Option<BackendKind>,

    #[command(flatten)]
    pub generator: GeneratorArgs,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn execute(args: RenderArgs) -> Result<()> {
    let hcl = render(&args)?;

    match &args.output {
        Some(path) => {
            fs::write(path, &hcl).with_context(|| format!("Failed to write {}", path.display()))?;
            info!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(hcl.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

fn render(args: &RenderArgs) -> Result<String> {
    let config = args.generator.resolve(args.backend)?;
    let stack = load_stack(&args.input)?;
    info!(
        "Rendering {} module(s) from {} with the {} backend",
        stack.len(),
        args.input.display(),
        config.backend
    );

    let generator = HclGenerator::new(config)?;
    Ok(stack.to_hcl(&generator)?)
}
