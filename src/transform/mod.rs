//! Icon transforms
//!
//! Turns raw SVG bytes into what gets embedded in the generated module:
//! - vector mode: optimized inner markup plus the root `viewBox`
//! - raster mode: a base64-encoded PNG
//!
//! Every transform is looked up in the content cache first, keyed by the
//! source bytes and the mode's parameter set.

pub mod optimize;
pub mod raster;

pub use optimize::{extract_view_box, strip_outer_tag, SvgOptimizer};
pub use raster::{program_available, PngQuant, Quantizer, Rasterizer, RsvgConvert};

use crate::cache::{ContentCache, Fingerprint};
use crate::config::{Mode, RasterParams, VectorParams};
use crate::error::{IconpackError, IconpackResult};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Output of one transform; the shape is fixed by the pipeline mode
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransformResult {
    Vector {
        /// Optimized markup with the outer `<svg>` tag removed
        markup: String,
        /// Root `viewBox`, if the source had one
        view_box: Option<String>,
    },
    Raster {
        /// Base64 of the final PNG
        base64: String,
    },
}

impl TransformResult {
    /// Mode this result belongs to
    pub fn mode(&self) -> Mode {
        match self {
            Self::Vector { .. } => Mode::Vector,
            Self::Raster { .. } => Mode::Raster,
        }
    }
}

/// Parameters of one mode, as fed into cache fingerprints
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformParams {
    Vector(VectorParams),
    Raster(RasterParams),
}

impl TransformParams {
    pub fn mode(&self) -> Mode {
        match self {
            Self::Vector(_) => Mode::Vector,
            Self::Raster(_) => Mode::Raster,
        }
    }

    /// Stable identifier of the mode and its parameters
    ///
    /// Any parameter change yields a different identifier and therefore a
    /// different fingerprint for the same source.
    pub fn identifier(&self) -> IconpackResult<String> {
        let params = match self {
            Self::Vector(p) => serde_json::to_string(p)?,
            Self::Raster(p) => serde_json::to_string(&RasterIdentity::from(p))?,
        };
        Ok(format!(
            "iconpack/{}/{}/{}",
            env!("CARGO_PKG_VERSION"),
            self.mode(),
            params
        ))
    }
}

/// The raster parameters that affect output bytes
///
/// Program names are left out: swapping a binary for an equivalent one
/// must not invalidate every cached bitmap.
#[derive(Serialize)]
struct RasterIdentity<'a> {
    width: u32,
    density: u32,
    background: &'a str,
    quantize: bool,
    quality_min: u8,
    quality_max: u8,
}

impl<'a> From<&'a RasterParams> for RasterIdentity<'a> {
    fn from(p: &'a RasterParams) -> Self {
        Self {
            width: p.width,
            density: p.density,
            background: &p.background,
            quantize: p.quantize,
            quality_min: p.quality_min,
            quality_max: p.quality_max,
        }
    }
}

/// Counters for cache effectiveness
#[derive(Debug, Default)]
struct Counters {
    hits: AtomicUsize,
    misses: AtomicUsize,
    transforms: AtomicUsize,
}

/// Snapshot of engine counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransformStats {
    /// Results served from the content cache
    pub hits: usize,
    /// Cache lookups that found nothing usable
    pub misses: usize,
    /// Optimizer/rasterizer runs
    pub transforms: usize,
}

/// Runs transforms for one pipeline, consulting the content cache
pub struct TransformEngine {
    params: TransformParams,
    identifier: String,
    cache: Option<ContentCache>,
    rasterizer: Option<Arc<dyn Rasterizer>>,
    quantizer: Option<Arc<dyn Quantizer>>,
    counters: Counters,
}

impl TransformEngine {
    /// Vector-mode engine
    pub fn vector(params: VectorParams, cache: Option<ContentCache>) -> IconpackResult<Self> {
        Self::build(TransformParams::Vector(params), cache, None, None)
    }

    /// Raster-mode engine
    ///
    /// `quantizer` is `None` when quantization is disabled or unavailable.
    pub fn raster(
        params: RasterParams,
        cache: Option<ContentCache>,
        rasterizer: Arc<dyn Rasterizer>,
        quantizer: Option<Arc<dyn Quantizer>>,
    ) -> IconpackResult<Self> {
        Self::build(
            TransformParams::Raster(params),
            cache,
            Some(rasterizer),
            quantizer,
        )
    }

    fn build(
        params: TransformParams,
        cache: Option<ContentCache>,
        rasterizer: Option<Arc<dyn Rasterizer>>,
        quantizer: Option<Arc<dyn Quantizer>>,
    ) -> IconpackResult<Self> {
        let identifier = params.identifier()?;
        Ok(Self {
            params,
            identifier,
            cache,
            rasterizer,
            quantizer,
            counters: Counters::default(),
        })
    }

    /// Mode of every result this engine produces
    pub fn mode(&self) -> Mode {
        self.params.mode()
    }

    /// Cache-busting identifier of the engine's parameters
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Transform `source`, serving from the cache when possible
    ///
    /// A failed cache write is logged; the in-memory result is still
    /// returned.
    pub async fn transform(&self, source: &[u8]) -> IconpackResult<TransformResult> {
        let fingerprint = Fingerprint::compute(source, &self.identifier);

        if let Some(ref cache) = self.cache {
            match cache.get::<TransformResult>(&fingerprint).await {
                Some(result) if result.mode() == self.mode() => {
                    self.counters.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(result);
                }
                Some(_) => debug!("Cache entry {} has the wrong shape", fingerprint),
                None => {}
            }
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
        }

        self.counters.transforms.fetch_add(1, Ordering::Relaxed);
        let (result, complete) = match &self.params {
            TransformParams::Vector(params) => (self.run_vector(source, params).await?, true),
            TransformParams::Raster(params) => self.run_raster(source, params).await?,
        };

        // A degraded result does not match its fingerprint's parameters
        if !complete {
            debug!("Not caching degraded result for {}", fingerprint);
        } else if let Some(ref cache) = self.cache {
            if let Err(e) = cache.put(&fingerprint, &result).await {
                warn!("Failed to cache transform result: {}", e);
            }
        }

        Ok(result)
    }

    /// Counter snapshot
    pub fn stats(&self) -> TransformStats {
        TransformStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            transforms: self.counters.transforms.load(Ordering::Relaxed),
        }
    }

    async fn run_vector(
        &self,
        source: &[u8],
        params: &VectorParams,
    ) -> IconpackResult<TransformResult> {
        let markup = std::str::from_utf8(source)
            .map_err(|e| IconpackError::transform(format!("source is not UTF-8: {}", e)))?
            .to_string();
        let optimizer = SvgOptimizer::new(params.clone());

        // Regex passes are CPU-bound; keep them off the I/O workers
        tokio::task::spawn_blocking(move || -> IconpackResult<TransformResult> {
            let optimized = optimizer.optimize(&markup)?;
            let view_box = extract_view_box(&optimized);
            Ok(TransformResult::Vector {
                markup: strip_outer_tag(&optimized),
                view_box,
            })
        })
        .await
        .map_err(|e| IconpackError::Internal(format!("optimizer task: {}", e)))?
    }

    /// Rasterize and, when configured, quantize `source`
    ///
    /// The flag is false when quantization was requested but did not run.
    async fn run_raster(
        &self,
        source: &[u8],
        params: &RasterParams,
    ) -> IconpackResult<(TransformResult, bool)> {
        let rasterizer = self
            .rasterizer
            .as_ref()
            .ok_or_else(|| IconpackError::Internal("raster engine without rasterizer".into()))?;

        let mut png = rasterizer.rasterize(source, params).await?;
        let mut complete = true;

        if params.quantize {
            match self.quantizer {
                Some(ref quantizer) => match quantizer.quantize(&png, params).await {
                    Ok(smaller) => png = smaller,
                    Err(e) => {
                        warn!(
                            "{} failed, embedding unquantized bitmap: {}",
                            quantizer.name(),
                            e
                        );
                        complete = false;
                    }
                },
                None => complete = false,
            }
        }

        let result = TransformResult::Raster {
            base64: BASE64.encode(&png),
        };
        Ok((result, complete))
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{FakeQuantizer, FakeRasterizer};
    use super::*;
    use tempfile::TempDir;

    const ICON: &[u8] =
        br#"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24" viewBox="0 0 24 24"><path d="M1 1h22"/></svg>"#;

    #[tokio::test]
    async fn vector_transform_keeps_view_box_and_strips_wrapper() {
        let engine = TransformEngine::vector(VectorParams::default(), None).unwrap();
        let result = engine.transform(ICON).await.unwrap();

        assert_eq!(
            result,
            TransformResult::Vector {
                markup: r#"<path d="M1 1h22"/>"#.to_string(),
                view_box: Some("0 0 24 24".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn missing_view_box_is_not_an_error() {
        let engine = TransformEngine::vector(VectorParams::default(), None).unwrap();
        let result = engine.transform(b"<svg><circle r=\"2\"/></svg>").await.unwrap();

        match result {
            TransformResult::Vector { view_box, markup } => {
                assert_eq!(view_box, None);
                assert_eq!(markup, r#"<circle r="2"/>"#);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn malformed_source_is_transform_error() {
        let engine = TransformEngine::vector(VectorParams::default(), None).unwrap();

        let not_svg = engine.transform(b"hello").await.unwrap_err();
        assert!(matches!(not_svg, IconpackError::Transform { .. }));

        let not_utf8 = engine.transform(&[0xff, 0xfe, 0x00]).await.unwrap_err();
        assert!(matches!(not_utf8, IconpackError::Transform { .. }));
    }

    #[tokio::test]
    async fn second_engine_served_from_cache() {
        let temp = TempDir::new().unwrap();

        let first = TransformEngine::vector(
            VectorParams::default(),
            Some(ContentCache::open(temp.path()).await.unwrap()),
        )
        .unwrap();
        let a = first.transform(ICON).await.unwrap();
        assert_eq!(first.stats().transforms, 1);

        let second = TransformEngine::vector(
            VectorParams::default(),
            Some(ContentCache::open(temp.path()).await.unwrap()),
        )
        .unwrap();
        let b = second.transform(ICON).await.unwrap();

        assert_eq!(a, b);
        assert_eq!(
            second.stats(),
            TransformStats {
                hits: 1,
                misses: 0,
                transforms: 0
            }
        );
    }

    #[tokio::test]
    async fn parameter_change_misses_cache() {
        let temp = TempDir::new().unwrap();
        let cache = ContentCache::open(temp.path()).await.unwrap();

        let keep = TransformEngine::vector(VectorParams::default(), Some(cache.clone())).unwrap();
        keep.transform(ICON).await.unwrap();

        let drop_view_box = VectorParams {
            remove_view_box: true,
            ..VectorParams::default()
        };
        let other = TransformEngine::vector(drop_view_box, Some(cache)).unwrap();
        let result = other.transform(ICON).await.unwrap();

        assert_eq!(other.stats().transforms, 1);
        assert!(matches!(result, TransformResult::Vector { view_box: None, .. }));
    }

    #[tokio::test]
    async fn raster_rasterizes_once_across_instances() {
        let temp = TempDir::new().unwrap();
        let rasterizer = Arc::new(FakeRasterizer::new());
        let params = RasterParams {
            quantize: false,
            ..RasterParams::default()
        };

        for _ in 0..2 {
            let engine = TransformEngine::raster(
                params.clone(),
                Some(ContentCache::open(temp.path()).await.unwrap()),
                rasterizer.clone(),
                None,
            )
            .unwrap();
            let result = engine.transform(ICON).await.unwrap();
            let TransformResult::Raster { base64 } = result else {
                panic!("expected raster result");
            };
            let png = BASE64.decode(base64).unwrap();
            assert!(png.starts_with(b"PNG64:<svg"));
        }

        assert_eq!(rasterizer.calls(), 1);
    }

    #[tokio::test]
    async fn quantizer_output_is_embedded() {
        let quantizer = Arc::new(FakeQuantizer::new(false));
        let engine = TransformEngine::raster(
            RasterParams::default(),
            None,
            Arc::new(FakeRasterizer::new()),
            Some(quantizer.clone()),
        )
        .unwrap();

        let result = engine.transform(ICON).await.unwrap();
        assert_eq!(
            result,
            TransformResult::Raster {
                base64: BASE64.encode(b"PNG6")
            }
        );
        assert_eq!(quantizer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failing_quantizer_falls_back_to_bitmap() {
        let engine = TransformEngine::raster(
            RasterParams::default(),
            None,
            Arc::new(FakeRasterizer::new()),
            Some(Arc::new(FakeQuantizer::new(true))),
        )
        .unwrap();

        let result = engine.transform(ICON).await.unwrap();
        let TransformResult::Raster { base64 } = result else {
            panic!("expected raster result");
        };
        assert!(BASE64.decode(base64).unwrap().starts_with(b"PNG64:"));
    }

    #[tokio::test]
    async fn unquantized_fallback_not_cached() {
        let temp = TempDir::new().unwrap();
        let rasterizer = Arc::new(FakeRasterizer::new());

        let without = TransformEngine::raster(
            RasterParams::default(),
            Some(ContentCache::open(temp.path()).await.unwrap()),
            rasterizer.clone(),
            None,
        )
        .unwrap();
        let degraded = without.transform(ICON).await.unwrap();

        let quantizer = Arc::new(FakeQuantizer::new(false));
        let with = TransformEngine::raster(
            RasterParams::default(),
            Some(ContentCache::open(temp.path()).await.unwrap()),
            rasterizer.clone(),
            Some(quantizer.clone()),
        )
        .unwrap();
        let quantized = with.transform(ICON).await.unwrap();

        assert_ne!(degraded, quantized);
        assert_eq!(quantizer.calls.load(Ordering::SeqCst), 1);
        assert_eq!(with.stats().hits, 0);
        assert_eq!(rasterizer.calls(), 2);

        // The complete result is cached for later runs
        let again = TransformEngine::raster(
            RasterParams::default(),
            Some(ContentCache::open(temp.path()).await.unwrap()),
            rasterizer.clone(),
            Some(quantizer.clone()),
        )
        .unwrap();
        assert_eq!(again.transform(ICON).await.unwrap(), quantized);
        assert_eq!(again.stats().hits, 1);
    }

    #[tokio::test]
    async fn failed_quantization_not_cached() {
        let temp = TempDir::new().unwrap();
        let cache = ContentCache::open(temp.path()).await.unwrap();
        let engine = TransformEngine::raster(
            RasterParams::default(),
            Some(cache.clone()),
            Arc::new(FakeRasterizer::new()),
            Some(Arc::new(FakeQuantizer::new(true))),
        )
        .unwrap();

        engine.transform(ICON).await.unwrap();

        let fingerprint = Fingerprint::compute(ICON, engine.identifier());
        assert!(cache.get::<TransformResult>(&fingerprint).await.is_none());
    }

    #[tokio::test]
    async fn rasterizer_failure_is_transform_error() {
        let engine = TransformEngine::raster(
            RasterParams::default(),
            None,
            Arc::new(FakeRasterizer::new()),
            None,
        )
        .unwrap();

        let err = engine.transform(b"garbage").await.unwrap_err();
        assert!(matches!(err, IconpackError::Transform { .. }));
    }

    #[tokio::test]
    async fn corrupt_entry_recomputed_and_healed() {
        let temp = TempDir::new().unwrap();
        let cache = ContentCache::open(temp.path()).await.unwrap();
        let engine = TransformEngine::vector(VectorParams::default(), Some(cache.clone())).unwrap();

        let fingerprint = Fingerprint::compute(ICON, engine.identifier());
        std::fs::write(cache.entry_path(&fingerprint), b"\x1f\x8bnot really gzip").unwrap();

        engine.transform(ICON).await.unwrap();
        assert_eq!(engine.stats().misses, 1);
        assert_eq!(engine.stats().transforms, 1);

        let healed: TransformResult = cache.get(&fingerprint).await.unwrap();
        assert_eq!(healed.mode(), Mode::Vector);
    }

    #[test]
    fn identifier_changes_with_params() {
        let a = TransformParams::Vector(VectorParams::default())
            .identifier()
            .unwrap();
        let b = TransformParams::Vector(VectorParams {
            collapse_whitespace: false,
            ..VectorParams::default()
        })
        .identifier()
        .unwrap();
        assert_ne!(a, b);
        assert!(a.contains("/vector/"));
    }

    #[test]
    fn raster_identifier_ignores_program_names() {
        let a = TransformParams::Raster(RasterParams::default())
            .identifier()
            .unwrap();
        let b = TransformParams::Raster(RasterParams {
            rasterizer: "/opt/bin/rsvg-convert".to_string(),
            ..RasterParams::default()
        })
        .identifier()
        .unwrap();
        assert_eq!(a, b);
    }
}
