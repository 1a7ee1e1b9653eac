//! Build pipeline
//!
//! One `Pipeline` is created per build and shared (by reference or `Arc`)
//! between the source tracker that registers icon keys and the build-tool
//! adapter that asks for the generated module.
//!
//! `compile()` fans the pending keys out to resolve + transform tasks,
//! joins them, writes results back in one place, then emits the module in
//! registration order.

use crate::cache::ContentCache;
use crate::config::{Config, Mode};
use crate::emit;
use crate::error::{IconpackError, IconpackResult, KeyFailure};
use crate::registry::{FailureKind, RecordError, ResourceSet};
use crate::resolve::{ResolvedSource, Resolver};
use crate::transform::{
    PngQuant, Quantizer, Rasterizer, RsvgConvert, TransformEngine, TransformResult, TransformStats,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// A per-icon problem reported by `compile()`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileWarning {
    pub key: String,
    pub kind: FailureKind,
    pub message: String,
}

impl fmt::Display for CompileWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.key, self.kind, self.message)
    }
}

/// Result of a successful compile
#[derive(Debug, Clone)]
pub struct CompileOutput {
    /// Generated module source
    pub source: String,
    /// Icons left out of the module, in registration order
    pub warnings: Vec<CompileWarning>,
}

/// Raster backends to use instead of the configured programs
pub struct RasterBackends {
    pub rasterizer: Arc<dyn Rasterizer>,
    pub quantizer: Option<Arc<dyn Quantizer>>,
}

/// Per-build coordinator owning the icon registry
pub struct Pipeline {
    mode: Mode,
    strict: bool,
    concurrency: usize,
    resolver: Arc<Resolver>,
    engine: Arc<TransformEngine>,
    resources: Mutex<ResourceSet>,
    compile_lock: tokio::sync::Mutex<()>,
}

type Outcome = IconpackResult<(ResolvedSource, TransformResult)>;

impl Pipeline {
    /// Build a pipeline from validated configuration
    ///
    /// In raster mode the configured programs are probed here, so a missing
    /// rasterizer fails the build up front instead of at the first compile.
    pub async fn new(config: &Config) -> IconpackResult<Self> {
        let backends = match config.mode {
            Mode::Vector => None,
            Mode::Raster => Some(RasterBackends {
                rasterizer: Arc::new(RsvgConvert::new(config.raster.rasterizer.clone())),
                quantizer: Some(Arc::new(PngQuant::new(config.raster.quantizer.clone()))),
            }),
        };
        Self::with_backends(config, backends).await
    }

    /// Build a pipeline with explicit raster backends
    ///
    /// `backends` is ignored in vector mode and required in raster mode.
    pub async fn with_backends(
        config: &Config,
        backends: Option<RasterBackends>,
    ) -> IconpackResult<Self> {
        validate(config)?;

        let backends = match (config.mode, backends) {
            (Mode::Vector, _) => None,
            (Mode::Raster, Some(backends)) => Some(check_raster_backends(config, backends).await?),
            (Mode::Raster, None) => {
                return Err(IconpackError::Internal(
                    "raster mode requires raster backends".to_string(),
                ))
            }
        };

        let cache = if config.cache.enabled {
            let dir = config.cache.resolved_dir();
            match ContentCache::open(dir).await {
                Ok(cache) => Some(cache),
                Err(e) => {
                    warn!("Transform cache unavailable, continuing without it: {}", e);
                    None
                }
            }
        } else {
            debug!("Transform cache disabled");
            None
        };

        let engine = match backends {
            None => TransformEngine::vector(config.vector.clone(), cache)?,
            Some(backends) => TransformEngine::raster(
                config.raster.clone(),
                cache,
                backends.rasterizer,
                backends.quantizer,
            )?,
        };

        info!(
            "Icon pipeline ready (mode: {}, concurrency: {})",
            config.mode, config.pipeline.concurrency
        );

        Ok(Self {
            mode: config.mode,
            strict: config.general.strict,
            concurrency: config.pipeline.concurrency,
            resolver: Arc::new(Resolver::from_config(&config.resolve)),
            engine: Arc::new(engine),
            resources: Mutex::new(ResourceSet::new()),
            compile_lock: tokio::sync::Mutex::new(()),
        })
    }

    fn resources(&self) -> MutexGuard<'_, ResourceSet> {
        // No code panics while holding the lock; recover the data regardless
        self.resources
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Output mode of this pipeline
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Record a referenced icon; returns whether it was new
    pub fn register(&self, key: impl Into<String>) -> bool {
        let key = key.into();
        let added = self.resources().register(key.clone());
        if added {
            debug!("Registered icon {}", key);
        }
        added
    }

    /// Record several icons; returns how many were new
    pub fn register_all<I, S>(&self, keys: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut resources = self.resources();
        let mut added = 0;
        for key in keys {
            if resources.register(key) {
                added += 1;
            }
        }
        added
    }

    /// Registered keys in registration order
    pub fn keys(&self) -> Vec<String> {
        self.resources().keys().map(str::to_string).collect()
    }

    /// Engine cache/transform counters
    pub fn stats(&self) -> TransformStats {
        self.engine.stats()
    }

    /// Resolve, transform and emit every registered icon
    ///
    /// Icons that fail are left out of the module and reported as warnings;
    /// in strict mode any such failure fails the compile instead. A
    /// generation failure always fails the compile.
    pub async fn compile(&self) -> IconpackResult<CompileOutput> {
        let _compiling = self.compile_lock.lock().await;

        let pending = self.resources().pending_keys();
        if !pending.is_empty() {
            debug!("Processing {} icon(s)", pending.len());
            let outcomes = self.process(pending).await;
            self.store(outcomes);
        }

        let resources = self.resources();
        let warnings: Vec<CompileWarning> = resources
            .failed()
            .into_iter()
            .filter_map(|record| {
                record.error.as_ref().map(|error| CompileWarning {
                    key: record.key.clone(),
                    kind: error.kind,
                    message: error.message.clone(),
                })
            })
            .collect();

        for warning in &warnings {
            warn!("Skipping icon {}", warning);
        }

        if self.strict && !warnings.is_empty() {
            return Err(IconpackError::CompileFailed {
                failures: warnings
                    .iter()
                    .map(|w| KeyFailure {
                        key: w.key.clone(),
                        cause: w.message.clone(),
                    })
                    .collect(),
            });
        }

        let completed = resources.completed();
        let source = emit::emit(&completed, self.mode)?;
        info!(
            "Compiled {} icon(s), skipped {}",
            completed.len(),
            warnings.len()
        );

        Ok(CompileOutput { source, warnings })
    }

    /// Run resolve + transform for `keys`, at most `concurrency` at a time
    ///
    /// Tasks live in a `JoinSet`: dropping the compile future aborts the
    /// ones still running. Completion order is irrelevant; outcomes are
    /// keyed by icon.
    async fn process(&self, keys: Vec<String>) -> HashMap<String, Outcome> {
        let permits = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();
        let mut task_keys = HashMap::with_capacity(keys.len());

        for key in keys {
            let permits = permits.clone();
            let resolver = self.resolver.clone();
            let engine = self.engine.clone();
            let task_key = key.clone();

            let handle = tasks.spawn(async move {
                let outcome = match permits.acquire_owned().await {
                    Ok(_permit) => resolve_and_transform(&resolver, &engine, &task_key).await,
                    Err(_) => Err(IconpackError::Internal("task limiter closed".to_string())),
                };
                (task_key, outcome)
            });
            task_keys.insert(handle.id(), key);
        }

        let mut outcomes = HashMap::with_capacity(task_keys.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((key, outcome)) => {
                    outcomes.insert(key, outcome);
                }
                Err(join_error) => {
                    let Some(key) = task_keys.get(&join_error.id()) else {
                        warn!("Lost track of a failed icon task: {}", join_error);
                        continue;
                    };
                    outcomes.insert(
                        key.clone(),
                        Err(IconpackError::transform(format!(
                            "transform task failed: {}",
                            join_error
                        ))),
                    );
                }
            }
        }
        outcomes
    }

    /// Write task outcomes back into the registry
    fn store(&self, outcomes: HashMap<String, Outcome>) {
        let mut resources = self.resources();
        for (key, outcome) in outcomes {
            match outcome {
                Ok((source, result)) => {
                    resources.record_success(&key, source.bytes, source.path, result);
                }
                Err(e) => {
                    debug!("Icon {} failed: {}", key, e);
                    resources.record_failure(&key, RecordError::from(&e));
                }
            }
        }
    }
}

/// Probe raster backends before any icon is processed
///
/// A missing rasterizer is fatal. A missing quantizer is dropped with a
/// warning, and icons are embedded unquantized.
async fn check_raster_backends(
    config: &Config,
    backends: RasterBackends,
) -> IconpackResult<RasterBackends> {
    if !backends.rasterizer.is_available().await {
        return Err(IconpackError::MissingRequiredDependency {
            name: backends.rasterizer.name().to_string(),
            hint: "Raster mode needs it to render icons.".to_string(),
        });
    }

    let quantizer = match backends.quantizer {
        Some(quantizer) if config.raster.quantize => {
            if quantizer.is_available().await {
                Some(quantizer)
            } else {
                let err = IconpackError::MissingOptionalDependency {
                    name: quantizer.name().to_string(),
                };
                warn!("{}; bitmaps will not be quantized", err);
                None
            }
        }
        Some(_) => None,
        None => {
            if config.raster.quantize {
                warn!("No quantizer configured; bitmaps will not be quantized");
            }
            None
        }
    };

    Ok(RasterBackends {
        rasterizer: backends.rasterizer,
        quantizer,
    })
}

fn validate(config: &Config) -> IconpackResult<()> {
    config
        .validate()
        .map_err(|reason| IconpackError::ConfigInvalid {
            path: "<config>".into(),
            reason,
        })
}

async fn resolve_and_transform(
    resolver: &Resolver,
    engine: &TransformEngine,
    key: &str,
) -> Outcome {
    let source = resolver.resolve(key).await?;
    let result = engine.transform(&source.bytes).await.map_err(|e| match e {
        IconpackError::Transform { reason } => IconpackError::Transform {
            reason: format!("{}: {}", source.path.display(), reason),
        },
        other => other,
    })?;
    Ok((source, result))
}
