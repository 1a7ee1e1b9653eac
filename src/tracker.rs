//! Icon reference tracker
//!
//! Finds icon keys in component source by matching opening tags such as
//! `<Icon uri="ui/close" />` or `<Icon uri={"ui/close"} />`. Values given
//! as any other expression cannot be known ahead of time and are skipped.

use crate::config::TrackingConfig;
use crate::error::{IconpackError, IconpackResult};
use crate::pipeline::Pipeline;
use indexmap::IndexSet;
use regex::Regex;
use std::path::Path;
use tracing::debug;

/// Extracts icon keys from source text
#[derive(Debug, Clone)]
pub struct Tracker {
    pattern: Regex,
}

impl Tracker {
    /// Build a matcher for the configured tag names and attribute
    pub fn new(config: &TrackingConfig) -> IconpackResult<Self> {
        if config.tag_names.is_empty() {
            return Err(IconpackError::ConfigInvalid {
                path: "<config>".into(),
                reason: "tracking.tag_names must name at least one tag".to_string(),
            });
        }

        let tags = config
            .tag_names
            .iter()
            .map(|t| regex::escape(t))
            .collect::<Vec<_>>()
            .join("|");
        let attribute = regex::escape(&config.attribute);

        let pattern = format!(
            r#"<(?:{tags})(?:\s[^>]*?)?\s{attribute}\s*=\s*(?:"([^"]*)"|'([^']*)'|\{{\s*"([^"]*)"\s*\}}|\{{\s*'([^']*)'\s*\}})"#
        );
        let pattern = Regex::new(&pattern)
            .map_err(|e| IconpackError::Internal(format!("invalid tracker pattern: {}", e)))?;

        Ok(Self { pattern })
    }

    /// Icon keys referenced in `source`, first-seen order, no duplicates
    pub fn scan(&self, source: &str) -> Vec<String> {
        let mut keys = IndexSet::new();
        for captures in self.pattern.captures_iter(source) {
            let value = (1..=4).find_map(|i| captures.get(i));
            if let Some(value) = value {
                let key = value.as_str().trim();
                if !key.is_empty() {
                    keys.insert(key.to_string());
                }
            }
        }
        keys.into_iter().collect()
    }

    /// Read and scan one file
    pub async fn scan_file(&self, path: &Path) -> IconpackResult<Vec<String>> {
        let source = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| IconpackError::io(format!("reading {}", path.display()), e))?;
        let keys = self.scan(&source);
        debug!("{}: {} icon reference(s)", path.display(), keys.len());
        Ok(keys)
    }

    /// Scan `source` and register every key with `pipeline`
    ///
    /// Returns how many keys were new to the pipeline.
    pub fn track(&self, source: &str, pipeline: &Pipeline) -> usize {
        pipeline.register_all(self.scan(source))
    }
}
