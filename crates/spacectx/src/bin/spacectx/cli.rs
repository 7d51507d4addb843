//! spacectx cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

/// Generates spacelift contexts from terraform outputs and resolves tfvars files against them
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; spacectx ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[clap(flatten)]
    pub logging: LoggingArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Parser, Debug)]
pub struct LoggingArgs {
    /// Log level used unless SPACECTX_LOG is set
    #[arg(long, global(true), default_value_t)]
    pub log_level: LogLevel,

    /// Enable verbose debug logs (same as --log-level debug)
    #[arg(long, global(true))]
    pub debug: bool,
}

impl LoggingArgs {
    pub fn level(&self) -> LogLevel {
        if self.debug {
            LogLevel::Debug
        } else {
            self.log_level
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Default, Debug)]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => f.write_str("error"),
            LogLevel::Warn => f.write_str("warn"),
            LogLevel::Info => f.write_str("info"),
            LogLevel::Debug => f.write_str("debug"),
            LogLevel::Trace => f.write_str("trace"),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate spacelift context resources from the outputs in tf files
    ///
    /// By default all tf files in the current folder are used.
    Generate(GenerateCommand),

    /// Replace context references in a tfvars file with values from context files
    ///
    /// Context files are read from the source folder. Writes to stdout unless an output file is given.
    Process(ProcessCommand),

    /// Print the merged values of a context for debugging
    Inspect(InspectCommand),
}

#[derive(Parser, Debug)]
pub struct GenerateCommand {
    /// tf file or directory of tf files to read outputs from
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Name of context to create, defaults to the spacelift stack id
    #[arg(short = 'n', long = "name", env = "TF_VAR_spacelift_stack_id")]
    pub name: Option<String>,

    /// Name of output file to create
    #[arg(short = 'o', long = "output", default_value = spacectx::DEFAULT_OUTPUT_FILE)]
    pub output: PathBuf,

    /// Version constraint (~> VERSION) for the spacelift provider requirement
    #[arg(long, default_value = spacectx::DEFAULT_PROVIDER_VERSION)]
    pub provider_version: String,
}

#[derive(Parser, Debug)]
pub struct ProcessCommand {
    /// tfvars file to process
    pub file: PathBuf,

    /// File to write processed result to. Writes to stdout if not set
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    #[clap(flatten)]
    pub source: SourceArgs,

    /// Exit successfully even if processing failed
    #[arg(long = "ignore-errors")]
    pub ignore_errors: bool,
}

#[derive(Parser, Debug)]
pub struct InspectCommand {
    /// Name of the context
    pub name: String,

    #[clap(flatten)]
    pub source: SourceArgs,

    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(Parser, Debug)]
pub struct SourceArgs {
    /// Folder to read context files from
    #[arg(short = 's', long = "source-folder", default_value = ".")]
    pub folder: PathBuf,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    Json,
    #[default]
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}
