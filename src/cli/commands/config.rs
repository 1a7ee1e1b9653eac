//! Config command - show effective configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::cli::ConfigSource;
use crate::config::{Config, ConfigManager};
use crate::error::IconpackResult;

/// Execute the config command
pub async fn execute(args: ConfigArgs, config: &Config, source: &ConfigSource) -> IconpackResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => show_path(source),
    }
    Ok(())
}

fn show_config(config: &Config) -> IconpackResult<()> {
    let toml = toml::to_string_pretty(config)?;
    println!("{}", toml);
    Ok(())
}

fn show_path(source: &ConfigSource) {
    match source.path() {
        Some(path) => println!("{}", path.display()),
        // Nothing loaded yet; point at where a user config would go
        None => println!("{}", ConfigManager::default_config_path().display()),
    }
}
