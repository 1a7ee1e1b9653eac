//! iconpack - Icon asset pipeline
//!
//! Collects the icons a program references, transforms each one (SVG
//! optimization or rasterization) at most once per distinct content, and
//! generates a deterministic module embedding them for the final bundle.

pub mod bundle;
pub mod cache;
pub mod cli;
pub mod config;
pub mod emit;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod resolve;
pub mod tracker;
pub mod transform;

pub use config::{Config, Mode};
pub use error::{IconpackError, IconpackResult};
pub use pipeline::{CompileOutput, CompileWarning, Pipeline};
pub use tracker::Tracker;
