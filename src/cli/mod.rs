//! Command-line interface

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};

use crate::config::{Config, ConfigManager};
use crate::error::{IconpackError, IconpackResult};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// `--config` / `ICONPACK_CONFIG`
    Explicit(PathBuf),
    /// `iconpack.toml` found from the working directory upwards
    Local(PathBuf),
    /// User-level config file
    User(PathBuf),
    /// No file; built-in defaults
    Defaults,
}

impl ConfigSource {
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Explicit(p) | Self::Local(p) | Self::User(p) => Some(p),
            Self::Defaults => None,
        }
    }
}

/// Load configuration for a CLI run
///
/// Lookup order: explicit path, local `iconpack.toml` (searched upwards from
/// `cwd`), user config file, defaults. Only the first file found is read.
pub async fn load_config(
    explicit: Option<&Path>,
    cwd: &Path,
) -> IconpackResult<(Config, ConfigSource)> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(IconpackError::ConfigNotFound(path.to_path_buf()));
        }
        let config = ConfigManager::with_path(path.to_path_buf())
            .load_from_file(path)
            .await?;
        return Ok((config, ConfigSource::Explicit(path.to_path_buf())));
    }

    if let Some(local) = ConfigManager::find_local_config(cwd) {
        debug!("Found local config: {}", local.display());
        let config = ConfigManager::with_path(local.clone())
            .load_from_file(&local)
            .await?;
        return Ok((config, ConfigSource::Local(local)));
    }

    let manager = ConfigManager::new();
    if manager.path().is_file() {
        let config = manager.load().await?;
        return Ok((config, ConfigSource::User(manager.path().to_path_buf())));
    }

    debug!("No config file found, using defaults");
    Ok((Config::default(), ConfigSource::Defaults))
}

/// Expand `inputs` into the list of source files to scan
///
/// Files are taken as given. Directories are walked recursively, keeping
/// files whose extension is in `extensions`; each directory's entries are
/// sorted so repeated runs scan in the same order. `node_modules` and
/// hidden directories are skipped.
pub async fn collect_sources(
    inputs: &[PathBuf],
    extensions: &[String],
) -> IconpackResult<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        let metadata = tokio::fs::metadata(input)
            .await
            .map_err(|e| IconpackError::io(format!("reading {}", input.display()), e))?;
        if !metadata.is_dir() {
            files.push(input.clone());
            continue;
        }

        let mut pending = vec![input.clone()];
        while let Some(dir) = pending.pop() {
            let mut entries = Vec::new();
            let mut read_dir = tokio::fs::read_dir(&dir)
                .await
                .map_err(|e| IconpackError::io(format!("listing {}", dir.display()), e))?;
            while let Some(entry) = read_dir
                .next_entry()
                .await
                .map_err(|e| IconpackError::io(format!("listing {}", dir.display()), e))?
            {
                entries.push(entry.path());
            }
            entries.sort();

            let mut subdirs = Vec::new();
            for path in entries {
                if path.is_dir() {
                    if !is_skipped_dir(&path) {
                        subdirs.push(path);
                    }
                } else if has_extension(&path, extensions) {
                    files.push(path);
                }
            }
            // Stack: push in reverse so the first subdirectory is walked next
            pending.extend(subdirs.into_iter().rev());
        }
    }

    Ok(files)
}

fn is_skipped_dir(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n == "node_modules" || n.starts_with('.'))
        .unwrap_or(false)
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|x| x.trim_start_matches('.') == e))
        .unwrap_or(false)
}
