//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use morph_compiler::Encoding;

#[derive(Parser)]
#[command(
    name = "morphc",
    version,
    about = "Compile mapping tasks into transformation pipeline scripts",
    long_about = "Compile a declarative mapping task (JSON) into an executable\n\
                  pipeline script for the streaming-transformation engine."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for info, -vv for debug, -q for silence).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Compile a task file into a script.
    Compile(CompileArgs),
}

#[derive(Parser)]
pub struct CompileArgs {
    /// Path to the task JSON file.
    #[arg(value_name = "TASK")]
    pub task: PathBuf,

    /// Write the script to a file instead of stdout.
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Emit the script without indentation.
    #[arg(long = "compact")]
    pub compact: bool,

    /// Character encoding declared by the generated script.
    #[arg(long = "encoding", value_enum, default_value = "utf-8")]
    pub encoding: EncodingArg,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI encoding choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum EncodingArg {
    #[value(name = "utf-8")]
    Utf8,
    #[value(name = "iso-8859-1")]
    Latin1,
    #[value(name = "utf-16")]
    Utf16,
}

impl From<EncodingArg> for Encoding {
    fn from(arg: EncodingArg) -> Self {
        match arg {
            EncodingArg::Utf8 => Encoding::Utf8,
            EncodingArg::Latin1 => Encoding::Latin1,
            EncodingArg::Utf16 => Encoding::Utf16,
        }
    }
}
