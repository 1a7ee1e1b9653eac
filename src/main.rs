//! iconpack - Icon asset pipeline
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use iconpack::cli::{self, Cli, Commands};
use iconpack::config::Config;
use iconpack::error::{IconpackError, IconpackResult};
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> IconpackResult<()> {
    let cli = Cli::parse();

    let cwd = std::env::current_dir().map_err(|e| IconpackError::io("getting current directory", e))?;
    let (config, source) = cli::load_config(cli.config.as_deref(), &cwd).await?;

    init_logging(cli.verbose, &config);
    debug!("Configuration source: {:?}", source);

    match cli.command {
        Commands::Compile(args) => cli::commands::compile(args, &config).await,
        Commands::Scan(args) => cli::commands::scan(args, &config).await,
        Commands::Config(args) => cli::commands::config(args, &config, &source).await,
    }
}

/// Initialize logging: 0 = warn, 1 = info, 2+ = debug
///
/// Logs go to stderr; stdout carries command output such as the module.
fn init_logging(verbose: u8, config: &Config) {
    let level = verbose.max(u8::from(config.general.verbose));
    let filter = match level {
        0 => EnvFilter::new("iconpack=warn"),
        1 => EnvFilter::new("iconpack=info"),
        _ => EnvFilter::new("iconpack=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.without_time().init();
    }
}
