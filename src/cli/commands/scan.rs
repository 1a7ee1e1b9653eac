//! Scan command - list referenced icon keys

use crate::cli::args::ScanArgs;
use crate::cli::collect_sources;
use crate::config::Config;
use crate::error::IconpackResult;
use crate::tracker::Tracker;
use indexmap::IndexSet;

/// Execute the scan command
pub async fn execute(args: ScanArgs, config: &Config) -> IconpackResult<()> {
    let tracker = Tracker::new(&config.tracking)?;
    let files = collect_sources(&args.files, &config.tracking.extensions).await?;

    let mut keys = IndexSet::new();
    for file in &files {
        keys.extend(tracker.scan_file(file).await?);
    }

    for key in keys {
        println!("{}", key);
    }
    Ok(())
}
