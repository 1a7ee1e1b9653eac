//! Compile command - generate the icon module

use crate::cli::args::CompileArgs;
use crate::cli::collect_sources;
use crate::config::Config;
use crate::error::{IconpackError, IconpackResult};
use crate::pipeline::Pipeline;
use crate::tracker::Tracker;
use console::style;
use tokio::fs;
use tracing::{debug, info};

/// Execute the compile command
pub async fn execute(args: CompileArgs, config: &Config) -> IconpackResult<()> {
    let config = apply_overrides(config, &args);

    let tracker = Tracker::new(&config.tracking)?;
    let pipeline = Pipeline::new(&config).await?;

    let files = collect_sources(&args.files, &config.tracking.extensions).await?;
    for file in &files {
        let keys = tracker.scan_file(file).await?;
        let added = pipeline.register_all(keys);
        debug!("{}: {} new icon(s)", file.display(), added);
    }
    pipeline.register_all(args.keys.iter().cloned());

    let output = pipeline.compile().await?;

    for warning in &output.warnings {
        eprintln!("{} {}", style("warning:").yellow().bold(), warning);
    }

    match args.out {
        Some(ref path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).await.map_err(|e| {
                    IconpackError::io(format!("creating {}", parent.display()), e)
                })?;
            }
            fs::write(path, &output.source)
                .await
                .map_err(|e| IconpackError::io(format!("writing {}", path.display()), e))?;
            info!("Wrote {}", path.display());
        }
        None => print!("{}", output.source),
    }

    let stats = pipeline.stats();
    debug!(
        "Cache hits: {}, misses: {}, transforms: {}",
        stats.hits, stats.misses, stats.transforms
    );

    Ok(())
}

/// Layer command-line flags over the loaded configuration
fn apply_overrides(config: &Config, args: &CompileArgs) -> Config {
    let mut config = config.clone();
    if let Some(mode) = args.mode {
        config.mode = mode;
    }
    if let Some(ref dir) = args.source_dir {
        config.resolve.source_dir = Some(dir.clone());
    }
    if args.strict {
        config.general.strict = true;
    }
    if args.no_cache {
        config.cache.enabled = false;
    }
    config
}
