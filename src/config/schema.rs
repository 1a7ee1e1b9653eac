//! Configuration schema for iconpack
//!
//! Configuration is read from `iconpack.toml` in the project (or any parent
//! directory), falling back to `~/.config/iconpack/config.toml`.

use crate::error::IconpackError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Output mode shared by every icon in a build
    pub mode: Mode,

    /// General settings
    pub general: GeneralConfig,

    /// Source tag tracking
    pub tracking: TrackingConfig,

    /// Icon search roots
    pub resolve: ResolveConfig,

    /// Vector optimizer plugins
    pub vector: VectorParams,

    /// Rasterization settings
    pub raster: RasterParams,

    /// Transform result cache
    pub cache: CacheConfig,

    /// Compile fan-out settings
    pub pipeline: PipelineConfig,
}

/// Pipeline-wide output mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Embed optimized SVG markup
    #[default]
    Vector,
    /// Embed a base64-encoded PNG
    Raster,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Vector => "vector",
            Self::Raster => "raster",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Mode {
    type Err = IconpackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vector" | "svg" => Ok(Self::Vector),
            "raster" | "png" => Ok(Self::Raster),
            other => Err(IconpackError::UnsupportedMode(other.to_string())),
        }
    }
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,

    /// Fail the whole compile when any icon fails
    pub strict: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
            strict: false,
        }
    }
}

/// Which tags and attribute mark an icon reference in source files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackingConfig {
    /// JSX tag names to pick up
    pub tag_names: Vec<String>,

    /// Attribute holding the icon key
    pub attribute: String,

    /// File extensions scanned when a directory is given
    pub extensions: Vec<String>,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            tag_names: vec!["Icon".to_string()],
            attribute: "uri".to_string(),
            extensions: vec![
                "js".to_string(),
                "jsx".to_string(),
                "ts".to_string(),
                "tsx".to_string(),
            ],
        }
    }
}

/// Search roots for icon sources
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolveConfig {
    /// Project icon directory, checked first
    pub source_dir: Option<PathBuf>,

    /// Default icon directory, checked last; the icons built into
    /// iconpack are used when unset
    pub fallback_dir: Option<PathBuf>,

    /// Extension appended to a key to form a file name
    pub extension: String,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            source_dir: None,
            fallback_dir: None,
            extension: "svg".to_string(),
        }
    }
}

/// Vector optimizer plugin toggles
///
/// The defaults keep the `viewBox` attribute: dropping it breaks
/// proportional scaling of the embedded icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorParams {
    pub remove_xml_declaration: bool,
    pub remove_doctype: bool,
    pub remove_comments: bool,
    pub remove_metadata: bool,
    pub remove_title: bool,
    pub remove_desc: bool,
    /// Inkscape/Sodipodi elements, attributes and namespace declarations
    pub remove_editor_data: bool,
    /// Empty `<g>` groups
    pub remove_empty_containers: bool,
    pub remove_empty_attrs: bool,
    pub remove_view_box: bool,
    /// Root `width`/`height`, only when a `viewBox` is present
    pub remove_dimensions: bool,
    pub collapse_whitespace: bool,
}

impl Default for VectorParams {
    fn default() -> Self {
        Self {
            remove_xml_declaration: true,
            remove_doctype: true,
            remove_comments: true,
            remove_metadata: true,
            remove_title: true,
            remove_desc: true,
            remove_editor_data: true,
            remove_empty_containers: true,
            remove_empty_attrs: false,
            remove_view_box: false,
            remove_dimensions: true,
            collapse_whitespace: true,
        }
    }
}

/// Rasterization and quantization settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterParams {
    /// Target bitmap width in pixels
    pub width: u32,

    /// Rendering density in DPI
    pub density: u32,

    /// Background color (any CSS color the rasterizer accepts)
    pub background: String,

    /// Run the lossy quantization pass
    pub quantize: bool,

    /// Quantizer quality floor (0-100)
    pub quality_min: u8,

    /// Quantizer quality target (0-100)
    pub quality_max: u8,

    /// Rasterizer program
    pub rasterizer: String,

    /// Quantizer program
    pub quantizer: String,
}

impl Default for RasterParams {
    fn default() -> Self {
        Self {
            width: 64,
            density: 96,
            background: "transparent".to_string(),
            quantize: true,
            quality_min: 65,
            quality_max: 80,
            rasterizer: "rsvg-convert".to_string(),
            quantizer: "pngquant".to_string(),
        }
    }
}

/// Transform result cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Persist transform results between runs
    pub enabled: bool,

    /// Cache directory (default: `<tmp>/iconpack-cache`)
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            dir: None,
        }
    }
}

impl CacheConfig {
    /// Effective cache directory
    pub fn resolved_dir(&self) -> PathBuf {
        self.dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("iconpack-cache"))
    }
}

/// Compile fan-out settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Maximum icons resolved and transformed at once
    pub concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { concurrency: 8 }
    }
}

impl Config {
    /// Check values that deserialize fine but cannot work
    ///
    /// Returns the reason for the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.tracking.tag_names.is_empty() {
            return Err("tracking.tag_names must name at least one tag".to_string());
        }
        if self.tracking.tag_names.iter().any(|t| t.trim().is_empty()) {
            return Err("tracking.tag_names must not contain empty names".to_string());
        }
        if self.tracking.attribute.trim().is_empty() {
            return Err("tracking.attribute must not be empty".to_string());
        }
        if self.resolve.extension.trim().is_empty() {
            return Err("resolve.extension must not be empty".to_string());
        }
        if self.pipeline.concurrency == 0 {
            return Err("pipeline.concurrency must be at least 1".to_string());
        }
        if !matches!(self.general.log_format.as_str(), "text" | "json") {
            return Err(format!(
                "general.log_format must be \"text\" or \"json\", got \"{}\"",
                self.general.log_format
            ));
        }
        if self.mode == Mode::Raster {
            let raster = &self.raster;
            if raster.width == 0 {
                return Err("raster.width must be at least 1".to_string());
            }
            if raster.density == 0 {
                return Err("raster.density must be at least 1".to_string());
            }
            if raster.quality_max > 100 || raster.quality_min > raster.quality_max {
                return Err(format!(
                    "raster quality range {}-{} is invalid",
                    raster.quality_min, raster.quality_max
                ));
            }
            if raster.rasterizer.trim().is_empty() {
                return Err("raster.rasterizer must name a program".to_string());
            }
        }
        Ok(())
    }
}
