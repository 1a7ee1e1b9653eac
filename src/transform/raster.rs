//! Rasterizer and quantizer backends
//!
//! Provides traits for turning SVG bytes into PNG bytes, implemented by
//! external programs driven over stdin/stdout:
//! - `rsvg-convert` (librsvg) renders the bitmap
//! - `pngquant` optionally shrinks it with lossy palette quantization

use crate::config::RasterParams;
use crate::error::{IconpackError, IconpackResult};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Exit code pngquant uses when it cannot reach the minimum quality
const PNGQUANT_QUALITY_TOO_LOW: i32 = 99;

/// Renders SVG source to a PNG bitmap
#[async_trait]
pub trait Rasterizer: Send + Sync {
    /// Check if the backend can run on this system
    async fn is_available(&self) -> bool;

    /// Render `svg` at the configured width/density/background
    async fn rasterize(&self, svg: &[u8], params: &RasterParams) -> IconpackResult<Vec<u8>>;

    /// Program or backend name for diagnostics
    fn name(&self) -> &str;
}

/// Lossy PNG size reduction
#[async_trait]
pub trait Quantizer: Send + Sync {
    /// Check if the backend can run on this system
    async fn is_available(&self) -> bool;

    /// Quantize `png`, returning the smaller bitmap
    async fn quantize(&self, png: &[u8], params: &RasterParams) -> IconpackResult<Vec<u8>>;

    /// Program or backend name for diagnostics
    fn name(&self) -> &str;
}

/// Rasterizer backed by `rsvg-convert` (or a compatible program)
pub struct RsvgConvert {
    program: String,
}

impl RsvgConvert {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    fn args(params: &RasterParams) -> Vec<String> {
        vec![
            "--format".to_string(),
            "png".to_string(),
            "--width".to_string(),
            params.width.to_string(),
            "--keep-aspect-ratio".to_string(),
            "--dpi-x".to_string(),
            params.density.to_string(),
            "--dpi-y".to_string(),
            params.density.to_string(),
            "--background-color".to_string(),
            params.background.clone(),
        ]
    }
}

#[async_trait]
impl Rasterizer for RsvgConvert {
    async fn is_available(&self) -> bool {
        program_available(&self.program).await
    }

    async fn rasterize(&self, svg: &[u8], params: &RasterParams) -> IconpackResult<Vec<u8>> {
        let args = Self::args(params);
        let output = run_filter(&self.program, &args, svg).await?;

        if !output.status.success() {
            return Err(IconpackError::transform(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        if output.stdout.is_empty() {
            return Err(IconpackError::transform(format!(
                "{} produced no output",
                self.program
            )));
        }
        Ok(output.stdout)
    }

    fn name(&self) -> &str {
        &self.program
    }
}

/// Quantizer backed by `pngquant`
pub struct PngQuant {
    program: String,
}

impl PngQuant {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl Quantizer for PngQuant {
    async fn is_available(&self) -> bool {
        program_available(&self.program).await
    }

    async fn quantize(&self, png: &[u8], params: &RasterParams) -> IconpackResult<Vec<u8>> {
        let args = vec![
            format!("--quality={}-{}", params.quality_min, params.quality_max),
            "--strip".to_string(),
            "-".to_string(),
        ];
        let output = run_filter(&self.program, &args, png).await?;

        match output.status.code() {
            Some(0) if !output.stdout.is_empty() => Ok(output.stdout),
            Some(PNGQUANT_QUALITY_TOO_LOW) => Err(IconpackError::transform(format!(
                "{} could not reach quality {}",
                self.program, params.quality_min
            ))),
            _ => Err(IconpackError::transform(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            ))),
        }
    }

    fn name(&self) -> &str {
        &self.program
    }
}

/// Check if `program --version` runs successfully
pub async fn program_available(program: &str) -> bool {
    Command::new(program)
        .arg("--version")
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Pipe `input` through `program args...` and collect its output
///
/// stdin is fed from a separate task so a program that starts writing
/// before it has read everything cannot deadlock against us.
async fn run_filter(
    program: &str,
    args: &[String],
    input: &[u8],
) -> IconpackResult<std::process::Output> {
    debug!("Executing: {} {:?}", program, args);

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| IconpackError::command_failed(program, e))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| IconpackError::Internal(format!("{} stdin not piped", program)))?;
    let input = input.to_vec();
    let writer = tokio::spawn(async move {
        let result = stdin.write_all(&input).await;
        drop(stdin);
        result
    });

    let output = child
        .wait_with_output()
        .await
        .map_err(|e| IconpackError::command_failed(program, e))?;

    match writer.await {
        Ok(Ok(())) => {}
        // A filter may exit early on bad input; its status tells the story
        Ok(Err(e)) => debug!("{} closed stdin early: {}", program, e),
        Err(e) => return Err(IconpackError::Internal(format!("stdin writer: {}", e))),
    }

    Ok(output)
}
