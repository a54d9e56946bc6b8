//! Check command - Compare the text and token backends on a document.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use thiserror::Error;
use tracing::info;

use forge_hcl::{validate_hcl, BackendKind, HclGenerator};

use super::{load_stack, GeneratorArgs};

#[derive(Args)]
pub struct CheckArgs {
    /// Module or stack document (YAML or JSON)
    pub input: PathBuf,

    #[command(flatten)]
    pub generator: GeneratorArgs,
}

/// The backends rendered different bytes.
#[derive(Error, Debug)]
#[error("Backends disagree at line {line}: text {text:?}, tokens {tokens:?}")]
pub struct BackendMismatch {
    pub line: usize,
    pub text: String,
    pub tokens: String,
}

pub fn execute(args: CheckArgs) -> Result<()> {
    let stack = load_stack(&args.input)?;

    let mut outputs = Vec::new();
    for backend in BackendKind::all() {
        let config = args.generator.resolve(Some(backend))?;
        let generator = HclGenerator::new(config)?;
        outputs.push(stack.to_hcl(&generator)?);
    }
    compare(&outputs[0], &outputs[1])?;
    validate_hcl(&outputs[0])?;

    info!("{} module(s) render identically with both backends", stack.len());
    println!("OK: {}", args.input.display());
    Ok(())
}

/// Compare two renderings, reporting the first line that differs.
fn compare(text: &str, tokens: &str) -> Result<(), BackendMismatch> {
    if text == tokens {
        return Ok(());
    }

    let mut text_lines = text.split_inclusive('\n');
    let mut token_lines = tokens.split_inclusive('\n');
    let mut line = 1;
    loop {
        match (text_lines.next(), token_lines.next()) {
            (Some(a), Some(b)) if a == b => line += 1,
            (a, b) => {
                return Err(BackendMismatch {
                    line,
                    text: a.unwrap_or_default().to_string(),
                    tokens: b.unwrap_or_default().to_string(),
                })
            }
        }
    }
}
