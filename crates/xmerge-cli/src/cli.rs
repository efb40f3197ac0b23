use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use xmerge_tree::WriteOptions;

#[derive(Parser)]
#[command(
    name = "xmerge",
    about = "Merge filled-in XML documents into canonical templates",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,

    /// Spaces per indentation level in written XML
    #[arg(long, global = true, default_value = "2")]
    pub indent: usize,

    /// Write XML nodes verbatim instead of re-indenting
    #[arg(long, global = true, conflicts_with = "indent")]
    pub no_indent: bool,
}

impl Cli {
    pub fn write_options(&self) -> WriteOptions {
        let width = if self.no_indent { 0 } else { self.indent };
        WriteOptions::default().with_indent(width)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Merge one source document into a template
    Merge(MergeArgs),
    /// Merge every XML file in a directory into a template
    Batch(BatchArgs),
    /// Derive a whitelist from marker comments in a template
    Discover(DiscoverArgs),
    /// Validate a whitelist configuration
    CheckConfig(CheckConfigArgs),
}

#[derive(Args)]
pub struct MergeArgs {
    #[arg(short, long)]
    pub config: PathBuf,
    #[arg(short, long)]
    pub template: PathBuf,
    #[arg(short, long)]
    pub source: PathBuf,
    /// Write here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// Print a diff of template against result
    #[arg(long)]
    pub diff: bool,
}

#[derive(Args)]
pub struct BatchArgs {
    #[arg(short, long)]
    pub config: PathBuf,
    #[arg(short, long)]
    pub template: PathBuf,
    #[arg(short, long)]
    pub sources: PathBuf,
    #[arg(short, long)]
    pub output: PathBuf,
    /// Concurrent merges (defaults to the CPU count)
    #[arg(short, long)]
    pub jobs: Option<usize>,
    #[arg(long)]
    pub timeout_secs: Option<u64>,
    #[arg(long, default_value = xmerge_batch::DEFAULT_PREFIX)]
    pub prefix: String,
    #[arg(short, long)]
    pub recursive: bool,
}

#[derive(Args)]
pub struct DiscoverArgs {
    #[arg(short, long)]
    pub template: PathBuf,
    /// Marker text to look for (repeatable; replaces the defaults)
    #[arg(short, long = "marker")]
    pub markers: Vec<String>,
    /// Also list leaf tags as flat-repeat
    #[arg(long)]
    pub flat: bool,
}

#[derive(Args)]
pub struct CheckConfigArgs {
    #[arg(short, long)]
    pub config: PathBuf,
    #[arg(short, long)]
    pub template: Option<PathBuf>,
}
