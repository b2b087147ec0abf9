//! Command implementations.

use std::fs;
use std::io::{self, Write};

use anyhow::{Context, Result};
use morph_compiler::{RenderOptions, ScriptBuilder};
use morph_model::Task;
use tracing::info;

use crate::cli::CompileArgs;

pub fn run_compile(args: &CompileArgs) -> Result<()> {
    let raw = fs::read_to_string(&args.task)
        .with_context(|| format!("failed to read task file {}", args.task.display()))?;
    let task: Task = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse task file {}", args.task.display()))?;
    info!(task = %task.id, mappings = task.job.mappings.len(), "compiling task");

    let script = ScriptBuilder::compile(&task)
        .with_context(|| format!("failed to compile task '{}'", task.id))?;
    let options = RenderOptions {
        indent: !args.compact,
        encoding: args.encoding.into(),
    };
    let document = script
        .render(&options)
        .context("failed to render the compiled script")?;

    match &args.output {
        Some(path) => {
            fs::write(path, document)
                .with_context(|| format!("failed to write script to {}", path.display()))?;
            info!(path = %path.display(), "script written");
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(document.as_bytes())?;
            stdout.write_all(b"\n")?;
        }
    }
    Ok(())
}
