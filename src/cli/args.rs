//! CLI argument definitions using clap derive

use crate::config::Mode;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// iconpack - Icon asset pipeline
///
/// Finds the icons your components reference, optimizes or rasterizes each
/// one once, and generates a module holding them all.
#[derive(Parser, Debug)]
#[command(name = "iconpack")]
#[command(author, version, about = "Icon asset pipeline", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "ICONPACK_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate the icon module for a set of source files
    Compile(CompileArgs),

    /// List icon keys referenced by source files
    Scan(ScanArgs),

    /// Show configuration
    Config(ConfigArgs),
}

/// Arguments for the compile command
#[derive(Parser, Debug)]
pub struct CompileArgs {
    /// Source files or directories to scan for icon tags
    pub files: Vec<PathBuf>,

    /// Extra icon keys to include (repeatable)
    #[arg(short, long = "key")]
    pub keys: Vec<String>,

    /// Output mode: vector or raster
    #[arg(short, long, value_parser = parse_mode)]
    pub mode: Option<Mode>,

    /// Project icon directory, searched before the default icons
    #[arg(short, long)]
    pub source_dir: Option<PathBuf>,

    /// Write the module here instead of stdout
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Fail if any icon cannot be packed
    #[arg(long)]
    pub strict: bool,

    /// Skip the on-disk transform cache
    #[arg(long)]
    pub no_cache: bool,
}

/// Arguments for the scan command
#[derive(Parser, Debug)]
pub struct ScanArgs {
    /// Source files or directories to scan
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show effective configuration
    Show,

    /// Show which configuration file is in use
    Path,
}

fn parse_mode(s: &str) -> Result<Mode, String> {
    s.parse().map_err(|e: crate::error::IconpackError| e.to_string())
}
